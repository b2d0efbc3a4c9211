//! Domain drafts produced by operator capabilities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title and writing instructions for one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionInstructions {
    pub title: String,
    pub instructions: String,
}

/// A section of the planned text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSection {
    pub content: String,
    pub creation_instructions: SectionInstructions,
}

/// Ordered sections a piece of writing must follow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingStructureDraft {
    pub id: String,
    pub approved: bool,
    pub sections: Vec<TextSection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WritingStructureDraft {
    /// New unapproved draft stamped with the current time
    pub fn new(id: impl Into<String>, sections: Vec<TextSection>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            approved: false,
            sections,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn titles(&self) -> Vec<&str> {
        self.sections
            .iter()
            .map(|s| s.creation_instructions.title.as_str())
            .collect()
    }
}

/// How deep research should go below the root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    #[default]
    Shallow,
    Intermediate,
    Deep,
    Extreme,
}

/// A node in a knowledge tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeNode {
    pub id: String,
    pub name: String,
    pub details: String,
    #[serde(default)]
    pub children: Vec<KnowledgeNode>,
}

/// Research outline for a user query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeTreeDraft {
    pub id: String,
    pub user_query: String,
    pub target_depth: AnalysisDepth,
    pub approved: bool,
    pub root: KnowledgeNode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeTreeDraft {
    /// Tree holding only the root node for `query`
    pub fn root_only(id: impl Into<String>, query: impl Into<String>) -> Self {
        let id = id.into();
        let query = query.into();
        let now = Utc::now();
        Self {
            root: KnowledgeNode {
                id: format!("{}-root", id),
                name: query.clone(),
                details: String::new(),
                children: Vec::new(),
            },
            id,
            user_query: query,
            target_depth: AnalysisDepth::default(),
            approved: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Whatever a capability returned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Draft {
    WritingStructure(WritingStructureDraft),
    KnowledgeTree(KnowledgeTreeDraft),
}

impl Draft {
    pub fn id(&self) -> &str {
        match self {
            Draft::WritingStructure(draft) => &draft.id,
            Draft::KnowledgeTree(draft) => &draft.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writing_structure_serializes_camel_case() {
        let draft = WritingStructureDraft::new(
            "ws-1",
            vec![TextSection {
                content: "Bees matter.".to_string(),
                creation_instructions: SectionInstructions {
                    title: "Intro".to_string(),
                    instructions: "Set the scene".to_string(),
                },
            }],
        );

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["sections"][0]["creationInstructions"]["title"], "Intro");
        assert!(json.get("createdAt").is_some());
        assert_eq!(draft.titles(), vec!["Intro"]);
        assert!(!draft.approved);
    }

    #[test]
    fn test_root_only_tree() {
        let tree = KnowledgeTreeDraft::root_only("kt-1", "history of bees");
        assert_eq!(tree.root.name, "history of bees");
        assert_eq!(tree.root.id, "kt-1-root");
        assert!(tree.root.children.is_empty());
        assert_eq!(tree.target_depth, AnalysisDepth::Shallow);
    }

    #[test]
    fn test_draft_id() {
        let draft = Draft::KnowledgeTree(KnowledgeTreeDraft::root_only("kt-9", "q"));
        assert_eq!(draft.id(), "kt-9");
    }
}

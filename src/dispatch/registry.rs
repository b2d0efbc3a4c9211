//! Capability registry - maps tool names to operator capabilities

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use super::drafts::Draft;
use super::operator::{Operator, OperatorError};
use crate::parsing::FieldKind;

/// Future returned by a capability invocation
pub type CapabilityFuture = BoxFuture<'static, Result<Draft, OperatorError>>;

type Invoke = Arc<dyn Fn(Arc<dyn Operator>, Value) -> CapabilityFuture + Send + Sync>;

/// A named operator capability taking a single argument
#[derive(Clone)]
pub struct Capability {
    pub name: String,
    pub description: String,
    /// Argument key the capability requires
    pub parameter: String,
    /// Expected kind of that argument
    pub kind: FieldKind,
    invoke: Invoke,
}

impl Capability {
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameter: impl Into<String>,
        kind: FieldKind,
        invoke: F,
    ) -> Self
    where
        F: Fn(Arc<dyn Operator>, Value) -> CapabilityFuture + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameter: parameter.into(),
            kind,
            invoke: Arc::new(invoke),
        }
    }

    /// Capability whose argument is a string
    pub fn text<F>(name: impl Into<String>, description: impl Into<String>, parameter: impl Into<String>, invoke: F) -> Self
    where
        F: Fn(Arc<dyn Operator>, String) -> CapabilityFuture + Send + Sync + 'static,
    {
        Self::new(name, description, parameter, FieldKind::String, move |operator, value| {
            let text = value.as_str().unwrap_or_default().to_string();
            invoke(operator, text)
        })
    }

    /// Run the capability with an argument that already passed validation
    pub fn invoke(&self, operator: Arc<dyn Operator>, argument: Value) -> CapabilityFuture {
        (self.invoke)(operator, argument)
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name)
            .field("parameter", &self.parameter)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Closed set of capabilities tool calls may name
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Capability>,
}

impl CapabilityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the writing-structure and knowledge-tree capabilities
    pub fn standard() -> Self {
        let mut registry = Self::new();

        registry.register(Capability::text(
            "getWritingStructure",
            "Propose a structural outline for the piece of writing the user wants",
            "requestWithContext",
            |operator, request| async move { operator.get_writing_structure(&request).await.map(Draft::WritingStructure) }.boxed(),
        ));

        registry.register(Capability::text(
            "getKnowledgeTree",
            "Propose a research outline for the topic the user wants covered",
            "request",
            |operator, request| async move { operator.get_knowledge_tree(&request).await.map(Draft::KnowledgeTree) }.boxed(),
        ));

        registry
    }

    /// Add or replace a capability
    pub fn register(&mut self, capability: Capability) {
        self.capabilities.insert(capability.name.clone(), capability);
    }

    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.capabilities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.capabilities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// One line per capability, for listing tools in a system prompt
    pub fn describe(&self) -> String {
        self.names()
            .into_iter()
            .filter_map(|name| self.get(name))
            .map(|c| format!("- {}({}: {}): {}", c.name, c.parameter, c.kind, c.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{KnowledgeTreeDraft, MockOperator};

    #[test]
    fn test_standard_registry() {
        let registry = CapabilityRegistry::standard();
        assert_eq!(registry.names(), vec!["getKnowledgeTree", "getWritingStructure"]);
        assert_eq!(registry.get("getWritingStructure").unwrap().parameter, "requestWithContext");
        assert_eq!(registry.get("getKnowledgeTree").unwrap().parameter, "request");
        assert!(!registry.contains("unknownTool"));
    }

    #[test]
    fn test_describe_lists_signatures() {
        let description = CapabilityRegistry::standard().describe();
        assert!(description.contains("- getKnowledgeTree(request: string)"));
        assert!(description.contains("- getWritingStructure(requestWithContext: string)"));
    }

    #[tokio::test]
    async fn test_register_custom_capability() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Capability::text("research", "Look something up", "topic", |operator, topic| {
            async move { operator.get_knowledge_tree(&topic).await.map(Draft::KnowledgeTree) }.boxed()
        }));

        let operator = Arc::new(MockOperator::new());
        let capability = registry.get("research").unwrap();
        let draft = capability
            .invoke(operator.clone(), Value::String("bees".to_string()))
            .await
            .unwrap();

        assert!(matches!(draft, Draft::KnowledgeTree(KnowledgeTreeDraft { ref user_query, .. }) if user_query == "bees"));
        assert_eq!(operator.count("getKnowledgeTree"), 1);
    }
}

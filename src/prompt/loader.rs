//! Prompt Loader - Load and cache YAML prompt files from a directory
//!
//! A prompt file carries either a single `template` or a map of named
//! `templates` (one per task kind), plus descriptive metadata.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{QuillError, Result};

/// Contents of one prompt file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PromptFile {
    pub id: String,
    pub version: String,
    pub description: String,
    pub template: Option<String>,
    pub templates: HashMap<String, String>,
    pub required_variables: Vec<String>,
    pub optional_variables: Vec<String>,
}

impl PromptFile {
    /// The single top-level template
    pub fn template(&self) -> Result<&str> {
        self.template
            .as_deref()
            .ok_or_else(|| QuillError::Prompt(format!("prompt '{}' has no top-level template", self.id)))
    }

    /// A named template, e.g. `creation` or `iteration`
    pub fn named(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }
}

/// Loads and caches prompt files from a directory
pub struct PromptLoader {
    /// Base directory containing `<name>.yaml` files
    prompts_dir: PathBuf,
    /// In-memory cache of parsed prompt files
    cache: RwLock<HashMap<String, Arc<PromptFile>>>,
}

impl PromptLoader {
    pub fn new(prompts_dir: impl AsRef<Path>) -> Self {
        Self {
            prompts_dir: prompts_dir.as_ref().to_path_buf(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Load a prompt file from disk and cache it
    pub fn load(&self, name: &str) -> Result<Arc<PromptFile>> {
        if let Some(cached) = self.cached(name) {
            return Ok(cached);
        }

        let path = self.prompt_path(name);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            QuillError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to load prompt '{}' from {:?}: {}", name, path, e),
            ))
        })?;
        let prompt: PromptFile = serde_yaml::from_str(&content)?;
        let prompt = Arc::new(prompt);

        let mut cache = self
            .cache
            .write()
            .map_err(|e| QuillError::Prompt(format!("Failed to acquire write lock: {}", e)))?;
        cache.insert(name.to_string(), Arc::clone(&prompt));
        log::debug!("Loaded prompt '{}' from {}", name, path.display());

        Ok(prompt)
    }

    /// Load a prompt file and return its top-level template text
    pub fn load_template(&self, name: &str) -> Result<String> {
        Ok(self.load(name)?.template()?.to_string())
    }

    fn cached(&self, name: &str) -> Option<Arc<PromptFile>> {
        let cache = self.cache.read().ok()?;
        cache.get(name).cloned()
    }

    fn prompt_path(&self, name: &str) -> PathBuf {
        self.prompts_dir.join(format!("{}.yaml", name))
    }

    /// List all prompt names available in the directory, sorted
    pub fn list_available(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.prompts_dir).map_err(|e| {
            QuillError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read prompts directory {:?}: {}", self.prompts_dir, e),
            ))
        })?;

        let mut prompts = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml")
                && let Some(stem) = path.file_stem()
                && let Some(name) = stem.to_str()
            {
                prompts.push(name.to_string());
            }
        }

        prompts.sort();
        Ok(prompts)
    }

    pub fn prompts_dir(&self) -> &Path {
        &self.prompts_dir
    }
}

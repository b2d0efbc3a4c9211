//! LLM Provider Layer - the boundary to a language model backend
//!
//! This module provides:
//! - Message types for conversation history
//! - Provider trait for model calls
//! - OpenAiProvider implementation
//! - TimeoutProvider and MockProvider wrappers

pub mod openai;
pub mod provider;
pub mod types;

pub use openai::{DEFAULT_API_KEY_ENV, OpenAiConfig, OpenAiProvider, Usage};
pub use provider::{MockProvider, Provider, ProviderCall, ProviderError, TimeoutProvider};
pub use types::{Message, Role, render_history};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        let _role = Role::User;
        let _config = OpenAiConfig::default();
        let _mock = MockProvider::new();
    }
}

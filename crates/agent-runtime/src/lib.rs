//! # agent-runtime
//!
//! Runtime providers for the crypto analyst.
//!
//! ## Providers
//!
//! - **OpenAI** (default): any OpenAI-compatible chat-completions endpoint
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::openai::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env()?;
//! let resolver = TieredResolver::standard(Some(Arc::new(provider)), market, persona, &config);
//! ```

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use agent_core::{AgentError, LlmProvider, Message, Result, Role};

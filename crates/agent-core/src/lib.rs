//! # agent-core
//!
//! Provider-agnostic LLM abstraction used by the crypto analyst.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  crypto-analyst                       │
//! │   ┌────────────────┐       ┌──────────────────────┐   │
//! │   │ Tiered resolver│──────▶│   LlmProvider        │   │
//! │   │ (tier 1)       │       │   (Strategy)         │   │
//! │   └────────────────┘       └──────────────────────┘   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between OpenAI-compatible
//! endpoints or test doubles without changing the resolver.

pub mod provider;
pub mod message;
pub mod error;

pub use error::{AgentError, Result};
pub use message::{Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider};

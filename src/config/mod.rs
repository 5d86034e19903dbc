// src/config/mod.rs
pub mod completion;
pub mod sources;

pub use completion::{CompletionConfig, DEFAULT_MAX_TOKENS};
pub use sources::SourcesConfig;

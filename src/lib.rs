//! # textsummary
//!
//! Summarise text, documents and webpages with an Azure OpenAI deployment.
//!
//! ## Features
//!
//! - **Any input**: plain text, DOCX and PDF files, a URL, or an interactive prompt
//! - **Tiered models**: a standard and a premium deployment, each with its own pricing
//! - **Statistics**: token usage, tokens per word, cost and request time

pub mod app;
pub mod client;
pub mod completion;
pub mod config;
pub mod document;
pub mod report;
pub mod source;
pub mod stats;

pub use app::{Summariser, SummariserError};
pub use client::{AzureOpenAiClient, CompletionClient, CompletionError};
pub use completion::{CompletionRequest, CompletionResult, Message, Role, Usage};
pub use config::{ConfigError, Flags, ModelTier, RunConfig, Settings};
pub use source::{ConsolePrompt, InputAcquirer, InputError, InputSource, Prompt, ReaderPrompt};
pub use stats::{Pricing, StatsReport};

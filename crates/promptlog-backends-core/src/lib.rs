//! Chat model traits and message types for promptlog.
//!
//! This crate defines the provider-agnostic surface that chat-completion
//! clients implement, and that decorators such as the auditing interceptor
//! wrap without knowing which provider sits underneath.

#![warn(missing_docs)]

mod message;
mod model;
mod result;

pub use message::{ContentPart, ImageUrl, Message, MessageContent, Role};
pub use model::{ChatModel, OutputFormat};
pub use result::{InvocationResult, Usage};

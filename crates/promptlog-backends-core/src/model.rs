//! The chat model trait.

use crate::{InvocationResult, Message};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Request for structured output matching a JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFormat {
    /// Schema name reported to the provider.
    pub name: String,
    /// JSON schema the completion must satisfy.
    pub schema: serde_json::Value,
    /// Ask the provider to enforce the schema strictly.
    #[serde(default)]
    pub strict: bool,
}

impl OutputFormat {
    /// Create a strict output format.
    pub fn new(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            schema,
            strict: true,
        }
    }
}

/// A chat-completion client.
///
/// Implementations own their transport, retries and timeouts. `Completion`
/// is the provider-specific shape of a successful answer; it must be
/// serializable so that observers can record it.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Completion payload produced on success.
    type Completion: Serialize + fmt::Debug + Send + Sync;
    /// Error produced when the call fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send `messages` to the model.
    async fn invoke(
        &self,
        messages: &[Message],
        output_format: Option<&OutputFormat>,
    ) -> Result<InvocationResult<Self::Completion>, Self::Error>;

    /// Provider identifier (`openai`, `anthropic`, ...).
    fn provider(&self) -> &str;

    /// Model identifier sent to the provider.
    fn model(&self) -> &str;

    /// Display name; defaults to the model identifier.
    fn name(&self) -> &str {
        self.model()
    }

    /// Model name used for bookkeeping; defaults to the model identifier.
    fn model_name(&self) -> &str {
        self.model()
    }
}

#[async_trait]
impl<M: ChatModel + ?Sized> ChatModel for Arc<M> {
    type Completion = M::Completion;
    type Error = M::Error;

    async fn invoke(
        &self,
        messages: &[Message],
        output_format: Option<&OutputFormat>,
    ) -> Result<InvocationResult<Self::Completion>, Self::Error> {
        (**self).invoke(messages, output_format).await
    }

    fn provider(&self) -> &str {
        (**self).provider()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

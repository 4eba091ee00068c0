//! Test utilities for promptlog crates.

use async_trait::async_trait;
use parking_lot::Mutex;
use promptlog_backends_core::{ChatModel, InvocationResult, Message, OutputFormat, Usage};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Creates a temporary file with given content.
pub fn temp_file(content: &str) -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join("test_file");
    std::fs::write(&path, content).expect("Failed to write temp file");
    (dir, path)
}

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err and return the error.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}

/// Errors produced by [`ScriptedModel`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptedError {
    /// A scripted provider failure.
    #[error("provider error: {0}")]
    Provider(String),
    /// The model was called more often than it was scripted for.
    #[error("no scripted response left")]
    Exhausted,
}

/// Arguments a [`ScriptedModel`] was called with.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub output_format: Option<OutputFormat>,
}

type Scripted<C> = Result<InvocationResult<C>, ScriptedError>;

/// A [`ChatModel`] that replays queued responses in order and records every call.
pub struct ScriptedModel<C = String> {
    provider: String,
    model: String,
    script: Mutex<VecDeque<Scripted<C>>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
}

impl<C> ScriptedModel<C> {
    /// A model with an empty script.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            provider: "scripted".to_string(),
            model: model.into(),
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Set the provider identifier.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful answer without usage.
    pub fn reply(self, completion: C) -> Self {
        self.push(Ok(InvocationResult::new(completion)))
    }

    /// Queue a successful answer with usage.
    pub fn reply_with_usage(self, completion: C, usage: Usage) -> Self {
        self.push(Ok(InvocationResult::new(completion).with_usage(usage)))
    }

    /// Queue a provider failure.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(Err(ScriptedError::Provider(message.into())))
    }

    fn push(self, entry: Scripted<C>) -> Self {
        self.script.lock().push_back(entry);
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

impl<C> fmt::Debug for ScriptedModel<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedModel")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("remaining", &self.remaining())
            .finish()
    }
}

#[async_trait]
impl<C> ChatModel for ScriptedModel<C>
where
    C: Serialize + fmt::Debug + Send + Sync,
{
    type Completion = C;
    type Error = ScriptedError;

    async fn invoke(
        &self,
        messages: &[Message],
        output_format: Option<&OutputFormat>,
    ) -> Result<InvocationResult<C>, ScriptedError> {
        self.calls.lock().push(RecordedCall {
            messages: messages.to_vec(),
            output_format: output_format.cloned(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().pop_front();
        next.unwrap_or(Err(ScriptedError::Exhausted))
    }

    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }
}

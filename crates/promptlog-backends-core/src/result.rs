//! Invocation results and token usage.

use serde::{Deserialize, Serialize};

/// Token accounting reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u64,
    /// Tokens generated in the completion.
    pub completion_tokens: u64,
    /// Sum reported by the provider.
    pub total_tokens: u64,
    /// Prompt tokens served from the provider's cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_cached_tokens: Option<u64>,
    /// Prompt tokens written to the provider's cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_cache_creation_tokens: Option<u64>,
}

impl Usage {
    /// Usage with prompt and completion counts; the total is derived.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            prompt_cached_tokens: None,
            prompt_cache_creation_tokens: None,
        }
    }
}

/// Successful answer from a chat model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult<C> {
    /// Provider-specific completion content.
    pub completion: C,
    /// Token usage, when the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl<C> InvocationResult<C> {
    /// A result without usage information.
    pub fn new(completion: C) -> Self {
        Self {
            completion,
            usage: None,
        }
    }

    /// Attach usage information.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

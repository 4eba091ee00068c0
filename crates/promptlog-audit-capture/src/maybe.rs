//! Configuration-driven wrapping.

use crate::dir::LogDirProvider;
use crate::interceptor::AuditingInterceptor;
use async_trait::async_trait;
use promptlog_backends_core::{ChatModel, InvocationResult, Message, OutputFormat};
use promptlog_common_config::CallLogConfig;

/// A model that is audited only when call logging is enabled.
#[derive(Debug)]
pub enum MaybeAudited<M> {
    /// Call logging disabled; calls go straight to the model.
    Plain(M),
    /// Call logging enabled.
    Audited(AuditingInterceptor<M>),
}

impl<M> MaybeAudited<M> {
    /// Wrap `model` when `config.enabled` is set.
    pub fn wrap(model: M, config: &CallLogConfig, log_dir: impl LogDirProvider + 'static) -> Self {
        if config.enabled {
            tracing::info!(dirname = %config.dirname, "llm call logging enabled");
            Self::Audited(AuditingInterceptor::new(model, log_dir))
        } else {
            Self::Plain(model)
        }
    }

    /// Whether calls are being recorded.
    pub fn is_audited(&self) -> bool {
        matches!(self, Self::Audited(_))
    }

    /// The underlying model.
    pub fn inner(&self) -> &M {
        match self {
            Self::Plain(model) => model,
            Self::Audited(interceptor) => interceptor.inner(),
        }
    }
}

#[async_trait]
impl<M: ChatModel> ChatModel for MaybeAudited<M> {
    type Completion = M::Completion;
    type Error = M::Error;

    async fn invoke(
        &self,
        messages: &[Message],
        output_format: Option<&OutputFormat>,
    ) -> Result<InvocationResult<Self::Completion>, Self::Error> {
        match self {
            Self::Plain(model) => model.invoke(messages, output_format).await,
            Self::Audited(interceptor) => interceptor.invoke(messages, output_format).await,
        }
    }

    fn provider(&self) -> &str {
        self.inner().provider()
    }

    fn model(&self) -> &str {
        self.inner().model()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn model_name(&self) -> &str {
        self.inner().model_name()
    }
}

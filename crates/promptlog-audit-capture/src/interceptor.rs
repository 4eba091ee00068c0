//! The auditing decorator.

use crate::artifact;
use crate::convert::to_jsonable;
use crate::dir::LogDirProvider;
use crate::error::CaptureError;
use crate::fingerprint::{fingerprint_request, serialize_messages};
use crate::sanitize::redact_options;
use async_trait::async_trait;
use promptlog_audit_types::{LogRecord, Timestamp};
use promptlog_backends_core::{ChatModel, InvocationResult, Message, OutputFormat};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use promptlog_common_log::spans::{llm_call_span, persist_span};
use tracing::{debug, warn, Instrument};

/// Callback receiving logging-path failures.
///
/// A panic inside the hook is caught and logged (unless the build aborts on panic).
pub type PersistFailureHook = Arc<dyn Fn(&CaptureError) + Send + Sync + 'static>;

/// Wraps a [`ChatModel`] and writes one audit artifact per call.
///
/// The wrapped model sees exactly the arguments the caller passed, and the
/// caller gets back exactly what the wrapped model returned, error or not.
/// Artifact writing is best effort: failures are reported through `tracing`
/// and the optional failure hook, never through the call result.
///
/// Members of the wrapped model that are not part of [`ChatModel`] are
/// reachable through `Deref`.
pub struct AuditingInterceptor<M> {
    inner: M,
    log_dir: Arc<dyn LogDirProvider>,
    call_options: Map<String, Value>,
    on_persist_failure: Option<PersistFailureHook>,
}

impl<M: fmt::Debug> fmt::Debug for AuditingInterceptor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditingInterceptor")
            .field("inner", &self.inner)
            .field("call_options", &redact_options(&self.call_options))
            .field("failure_hook", &self.on_persist_failure.is_some())
            .finish()
    }
}

impl<M> AuditingInterceptor<M> {
    /// Wrap `inner`, writing artifacts wherever `log_dir` points at call time.
    pub fn new(inner: M, log_dir: impl LogDirProvider + 'static) -> Self {
        Self::with_shared_dir(inner, Arc::new(log_dir))
    }

    /// Wrap `inner` with an already shared directory provider.
    pub fn with_shared_dir(inner: M, log_dir: Arc<dyn LogDirProvider>) -> Self {
        Self {
            inner,
            log_dir,
            call_options: Map::new(),
            on_persist_failure: None,
        }
    }

    /// Record options the wrapped client applies on every call.
    ///
    /// They are part of the fingerprint and of the logged request; credential
    /// values are redacted in both.
    pub fn with_call_options(mut self, options: Map<String, Value>) -> Self {
        self.call_options = options;
        self
    }

    /// Receive every logging failure in addition to the `tracing` warning.
    pub fn with_failure_hook(mut self, hook: PersistFailureHook) -> Self {
        self.on_persist_failure = Some(hook);
        self
    }

    /// The wrapped model.
    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Unwrap, discarding the auditing layer.
    pub fn into_inner(self) -> M {
        self.inner
    }

    /// Directory the next artifact would be written to.
    pub fn current_log_dir(&self) -> PathBuf {
        self.log_dir.resolve()
    }

    async fn record(&self, record: LogRecord) {
        let dir = self.log_dir.resolve();
        let span = persist_span(&dir.display().to_string());
        match artifact::persist(&dir, &record).instrument(span).await {
            Ok(path) => debug!(path = %path.display(), "llm call recorded"),
            Err(err) => {
                warn!(error = %err, dir = %dir.display(), "failed to record llm call");
                if let Some(hook) = &self.on_persist_failure {
                    // a panicking hook must not replace the call's outcome
                    if panic::catch_unwind(AssertUnwindSafe(|| hook(&err))).is_err() {
                        warn!("persist failure hook panicked");
                    }
                }
            }
        }
    }
}

impl<M> Deref for AuditingInterceptor<M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.inner
    }
}

#[async_trait]
impl<M: ChatModel> ChatModel for AuditingInterceptor<M> {
    type Completion = M::Completion;
    type Error = M::Error;

    async fn invoke(
        &self,
        messages: &[Message],
        output_format: Option<&OutputFormat>,
    ) -> Result<InvocationResult<Self::Completion>, Self::Error> {
        let started_at = Timestamp::now();
        let model = self.inner.model_name().to_string();
        let logged_messages = serialize_messages(messages);
        let kwargs = redact_options(&self.call_options);
        let fingerprint = fingerprint_request(&model, &logged_messages, &kwargs);

        let span = llm_call_span(&model, fingerprint.short());
        let outcome = self
            .inner
            .invoke(messages, output_format)
            .instrument(span.clone())
            .await;
        let ended_at = Timestamp::now();

        let builder = LogRecord::builder(fingerprint, model)
            .messages(logged_messages)
            .kwargs(kwargs)
            .started_at(started_at)
            .ended_at(ended_at);
        let record = match &outcome {
            Ok(result) => builder
                .usage(result.usage.as_ref().map(|u| to_jsonable(u).into_value()))
                .content(Some(to_jsonable(&result.completion).into_value()))
                .build(),
            Err(err) => builder.error(err.to_string()).build(),
        };

        self.record(record).instrument(span).await;
        outcome
    }

    fn provider(&self) -> &str {
        self.inner.provider()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

//! Wraps a local echo model and prints the artifacts it leaves behind.
//!
//! ```text
//! PROMPTLOG_LLM_CALL_LOGS=true cargo run -p promptlog-audit-capture --example audited_echo
//! ```

use async_trait::async_trait;
use promptlog_audit_capture::{ArtifactReader, ChatModel, LogDirProvider, MaybeAudited, SessionLogDir};
use promptlog_backends_core::{InvocationResult, Message, OutputFormat, Usage};
use promptlog_common_config::{ConfigLoader, Environment};
use promptlog_common_log::LogConfig;
use serde::Serialize;
use std::convert::Infallible;

#[derive(Debug, Serialize)]
struct Echo {
    text: String,
}

struct EchoModel;

#[async_trait]
impl ChatModel for EchoModel {
    type Completion = Echo;
    type Error = Infallible;

    async fn invoke(
        &self,
        messages: &[Message],
        _output_format: Option<&OutputFormat>,
    ) -> Result<InvocationResult<Echo>, Infallible> {
        let text = messages.last().map(Message::text).unwrap_or_default();
        let tokens = text.split_whitespace().count() as u64;
        Ok(InvocationResult::new(Echo { text }).with_usage(Usage::new(tokens, tokens)))
    }

    fn provider(&self) -> &str {
        "local"
    }

    fn model(&self) -> &str {
        "echo-1"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    Environment::init()?;
    promptlog_common_log::init(LogConfig::from_env())?;

    let config = ConfigLoader::default().load_call_logs()?;
    let session = SessionLogDir::new(std::env::temp_dir().join("promptlog-demo"), &config.dirname);
    let model = MaybeAudited::wrap(EchoModel, &config, session.clone());

    let reply = model
        .invoke(
            &[
                Message::system("Repeat the user."),
                Message::user("hello from promptlog"),
            ],
            None,
        )
        .await?;
    println!("reply: {}", reply.completion.text);

    if !model.is_audited() {
        println!("call logging disabled; set PROMPTLOG_LLM_CALL_LOGS=true to record calls");
        return Ok(());
    }

    for path in ArtifactReader::list(session.resolve())? {
        let record = ArtifactReader::read_record(&path)?;
        println!(
            "{} ({} ms)",
            path.display(),
            record.response.duration_ms.unwrap_or_default()
        );
    }
    Ok(())
}

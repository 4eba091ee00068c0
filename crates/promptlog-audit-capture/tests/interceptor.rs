use promptlog_audit_capture::{
    fingerprint_request, serialize_messages, ArtifactReader, AuditingInterceptor, CaptureError,
    ChatModel, FixedLogDir, LogRecord, Outcome, PersistFailureHook, SessionLogDir, REDACTED,
};
use promptlog_backends_core::{ContentPart, Message, OutputFormat, Role, Usage};
use promptlog_test_utils::{assert_err, assert_ok, temp_dir, ScriptedError, ScriptedModel};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn artifacts(dir: &Path) -> Vec<PathBuf> {
    ArtifactReader::list(dir).unwrap()
}

fn only_artifact(dir: &Path) -> (String, LogRecord) {
    let paths = artifacts(dir);
    assert_eq!(paths.len(), 1, "expected exactly one artifact, found {paths:?}");
    let text = std::fs::read_to_string(&paths[0]).unwrap();
    let record = ArtifactReader::read_record(&paths[0]).unwrap();
    (text, record)
}

fn options(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn test_successful_call_is_recorded_and_returned_unchanged() {
    promptlog_common_log::init_for_tests();
    let dir = temp_dir();
    let model = ScriptedModel::new("gpt-test").reply("hi there".to_string());
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(dir.path()));

    let messages = [Message::user("hello")];
    let result = assert_ok!(audited.invoke(&messages, None).await);
    assert_eq!(result.completion, "hi there");
    assert!(result.usage.is_none());

    let (text, record) = only_artifact(dir.path());
    assert!(text.starts_with("# LLM Call\n- model: gpt-test\n"));

    assert_eq!(record.model, "gpt-test");
    assert_eq!(record.request.messages[0]["role"], "user");
    assert_eq!(record.request.messages[0]["content"], "hello");
    assert!(record.request.kwargs.is_empty());
    assert_eq!(record.response.content, Some(json!("hi there")));
    assert_eq!(record.response.error, None);
    assert_eq!(record.outcome(), Outcome::Success);
    assert!(record.ended_at() >= record.started_at());

    let expected = fingerprint_request("gpt-test", &serialize_messages(&messages), &Map::new());
    assert_eq!(record.fingerprint, expected);
}

#[tokio::test]
async fn test_artifact_name_layout() {
    let dir = temp_dir();
    let model = ScriptedModel::new("openai/gpt-test").reply("ok".to_string());
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(dir.path()));
    audited.invoke(&[Message::user("hello")], None).await.unwrap();

    let paths = artifacts(dir.path());
    let name = paths[0].file_name().unwrap().to_string_lossy().into_owned();
    let record = ArtifactReader::read_record(&paths[0]).unwrap();

    // 20250101-120000-123-openai_gpt-test-xxxxxxxx.md
    let (stamp, rest) = name.split_at(19);
    assert!(stamp
        .chars()
        .enumerate()
        .all(|(i, c)| if i == 8 || i == 15 { c == '-' } else { c.is_ascii_digit() }));
    assert_eq!(rest, format!("-openai_gpt-test-{}.md", record.fingerprint.short()));
}

#[tokio::test]
async fn test_usage_is_recorded() {
    let dir = temp_dir();
    let model = ScriptedModel::new("gpt-test").reply_with_usage("ok".to_string(), Usage::new(12, 3));
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(dir.path()));

    let result = audited.invoke(&[Message::user("count")], None).await.unwrap();
    assert_eq!(result.usage, Some(Usage::new(12, 3)));

    let (_, record) = only_artifact(dir.path());
    let usage = record.response.usage.unwrap();
    assert_eq!(usage["prompt_tokens"], 12);
    assert_eq!(usage["completion_tokens"], 3);
    assert_eq!(usage["total_tokens"], 15);
}

#[tokio::test]
async fn test_failed_call_is_recorded_and_error_returned_unchanged() {
    let dir = temp_dir();
    let model = ScriptedModel::<String>::new("gpt-test").fail("rate limited");
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(dir.path()));

    let err = assert_err!(audited.invoke(&[Message::user("hello")], None).await);
    assert_eq!(err, ScriptedError::Provider("rate limited".into()));

    let (text, record) = only_artifact(dir.path());
    assert_eq!(record.response.error.as_deref(), Some("provider error: rate limited"));
    assert!(record.response.content.is_none());
    assert!(record.response.usage.is_none());
    assert!(record.outcome().is_failure());
    assert_eq!(record.response.duration_ms, None);
    assert!(!text.contains("- duration_ms:"));
    assert!(text.contains("\"duration_ms\": null"));
    assert!(text.contains("\"content\": null"));
    assert!(text.contains("\"usage\": null"));
}

#[tokio::test]
async fn test_each_call_writes_exactly_one_artifact() {
    let dir = temp_dir();
    let model = ScriptedModel::new("gpt-test")
        .reply("one".to_string())
        .fail("two")
        .reply("three".to_string());
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(dir.path()));

    for expected in 1..=3 {
        let _ = audited.invoke(&[Message::user("again")], None).await;
        assert_eq!(artifacts(dir.path()).len(), expected);
    }
}

#[tokio::test]
async fn test_inner_model_sees_original_arguments() {
    let dir = temp_dir();
    let model = ScriptedModel::new("vision").reply("a cat".to_string());
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(dir.path()))
        .with_call_options(options(&[("api_key", json!("sk-secret"))]));

    let messages = vec![Message::with_parts(
        Role::User,
        vec![
            ContentPart::text("what is this?"),
            ContentPart::image("data:image/png;base64,AAAA"),
        ],
    )];
    let format = OutputFormat::new("answer", json!({ "type": "object" }));
    audited.invoke(&messages, Some(&format)).await.unwrap();

    let calls = audited.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].messages, messages);
    assert!(calls[0].messages[0].has_image());
    assert_eq!(calls[0].output_format.as_ref(), Some(&format));
}

#[tokio::test]
async fn test_image_payloads_never_reach_disk() {
    let dir = temp_dir();
    let model = ScriptedModel::new("vision").reply("a cat".to_string());
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(dir.path()));

    let messages = [Message::with_parts(
        Role::User,
        vec![
            ContentPart::text("what is this?"),
            ContentPart::image("data:image/png;base64,AAAA"),
        ],
    )];
    audited.invoke(&messages, None).await.unwrap();

    let (text, record) = only_artifact(dir.path());
    assert!(!text.contains("base64,AAAA"));
    assert!(!text.contains("\"image_url\":"));
    assert_eq!(
        record.request.messages[0]["content"],
        json!([{ "type": "text", "text": "what is this?" }, { "type": "image_url" }])
    );
}

#[tokio::test]
async fn test_call_options_are_redacted_on_disk() {
    let dir = temp_dir();
    let model = ScriptedModel::new("gpt-test").reply("ok".to_string());
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(dir.path())).with_call_options(
        options(&[
            ("api_key", json!("sk-secret")),
            ("Authorization", json!("Bearer xyz")),
            ("temperature", json!(0.2)),
        ]),
    );

    audited.invoke(&[Message::user("hello")], None).await.unwrap();

    let (text, record) = only_artifact(dir.path());
    assert!(!text.contains("sk-secret"));
    assert!(!text.contains("Bearer xyz"));
    assert_eq!(record.request.kwargs["api_key"], REDACTED);
    assert_eq!(record.request.kwargs["Authorization"], REDACTED);
    assert_eq!(record.request.kwargs["temperature"], json!(0.2));
    assert!(!format!("{audited:?}").contains("sk-secret"));
}

#[tokio::test]
async fn test_identical_requests_share_a_fingerprint() {
    let dir = temp_dir();
    let model = ScriptedModel::new("gpt-test")
        .reply("a".to_string())
        .reply("b".to_string())
        .reply("c".to_string());
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(dir.path()));

    audited.invoke(&[Message::user("same")], None).await.unwrap();
    audited.invoke(&[Message::user("same")], None).await.unwrap();
    audited.invoke(&[Message::user("different")], None).await.unwrap();

    let records: Vec<LogRecord> = artifacts(dir.path())
        .iter()
        .map(|p| ArtifactReader::read_record(p).unwrap())
        .collect();
    assert_eq!(records.len(), 3);

    let same: Vec<_> = records
        .iter()
        .filter(|r| r.request.messages[0]["content"] == "same")
        .collect();
    let different = records
        .iter()
        .find(|r| r.request.messages[0]["content"] == "different")
        .unwrap();
    assert_eq!(same.len(), 2);
    assert_eq!(same[0].fingerprint, same[1].fingerprint);
    assert_ne!(same[0].fingerprint, different.fingerprint);
}

#[tokio::test]
async fn test_fingerprint_ignores_option_insertion_order() {
    let dir = temp_dir();
    let first = AuditingInterceptor::new(
        ScriptedModel::new("gpt-test").reply("x".to_string()),
        FixedLogDir::new(dir.path().join("first")),
    )
    .with_call_options(options(&[("temperature", json!(0)), ("seed", json!(7))]));
    let second = AuditingInterceptor::new(
        ScriptedModel::new("gpt-test").reply("y".to_string()),
        FixedLogDir::new(dir.path().join("second")),
    )
    .with_call_options(options(&[("seed", json!(7)), ("temperature", json!(0))]));

    first.invoke(&[Message::user("q")], None).await.unwrap();
    second.invoke(&[Message::user("q")], None).await.unwrap();

    let (_, a) = only_artifact(&dir.path().join("first"));
    let (_, b) = only_artifact(&dir.path().join("second"));
    assert_eq!(a.fingerprint, b.fingerprint);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_calls_never_overwrite() {
    let dir = temp_dir();
    let mut model = ScriptedModel::new("gpt-test").with_delay(Duration::from_millis(5));
    for _ in 0..16 {
        model = model.reply("same answer".to_string());
    }
    let audited = Arc::new(AuditingInterceptor::new(model, FixedLogDir::new(dir.path())));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let audited = Arc::clone(&audited);
            tokio::spawn(async move { audited.invoke(&[Message::user("same")], None).await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().completion, "same answer");
    }

    let paths = artifacts(dir.path());
    assert_eq!(paths.len(), 16);
    for path in &paths {
        let record = ArtifactReader::read_record(path).unwrap();
        assert_eq!(record.response.content, Some(json!("same answer")));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_calls_each_get_an_artifact() {
    let dir = temp_dir();
    let mut model = ScriptedModel::new("gpt-test");
    for _ in 0..8 {
        model = model.reply("ok".to_string());
    }
    let audited = Arc::new(AuditingInterceptor::new(model, FixedLogDir::new(dir.path())));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let audited = Arc::clone(&audited);
            tokio::spawn(async move {
                audited
                    .invoke(&[Message::user(format!("question {i}"))], None)
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut contents: Vec<String> = artifacts(dir.path())
        .iter()
        .map(|p| {
            let record = ArtifactReader::read_record(p).unwrap();
            record.request.messages[0]["content"].as_str().unwrap().to_string()
        })
        .collect();
    contents.sort();
    let mut expected: Vec<String> = (0..8).map(|i| format!("question {i}")).collect();
    expected.sort();
    assert_eq!(contents, expected);
}

#[tokio::test]
async fn test_unwritable_directory_does_not_change_the_outcome() {
    let dir = temp_dir();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let failures = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&failures);
    let hook: PersistFailureHook = Arc::new(move |err: &CaptureError| {
        assert!(matches!(err, CaptureError::CreateDir { .. }));
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let model = ScriptedModel::new("gpt-test")
        .reply("still here".to_string())
        .fail("upstream down");
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(blocker.join("logs")))
        .with_failure_hook(hook);

    let ok = assert_ok!(audited.invoke(&[Message::user("hello")], None).await);
    assert_eq!(ok.completion, "still here");
    let err = assert_err!(audited.invoke(&[Message::user("hello")], None).await);
    assert_eq!(err, ScriptedError::Provider("upstream down".into()));

    assert_eq!(failures.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_log_dir_is_resolved_per_call() {
    let dir = temp_dir();
    let session = SessionLogDir::new(dir.path().join("session-a"), "llm_logs");
    let model = ScriptedModel::new("gpt-test")
        .reply("a".to_string())
        .reply("b".to_string());
    let audited = AuditingInterceptor::new(model, session.clone());

    audited.invoke(&[Message::user("first")], None).await.unwrap();
    session.set_root(dir.path().join("session-b"));
    assert_eq!(audited.current_log_dir(), dir.path().join("session-b").join("llm_logs"));
    audited.invoke(&[Message::user("second")], None).await.unwrap();

    let (_, a) = only_artifact(&dir.path().join("session-a").join("llm_logs"));
    let (_, b) = only_artifact(&dir.path().join("session-b").join("llm_logs"));
    assert_eq!(a.response.content, Some(json!("a")));
    assert_eq!(b.response.content, Some(json!("b")));
}

#[tokio::test]
async fn test_closure_log_dir_provider() {
    let dir = temp_dir();
    let root = dir.path().to_path_buf();
    let model = ScriptedModel::new("gpt-test").reply("ok".to_string());
    let audited = AuditingInterceptor::new(model, move || root.join("from-closure"));

    audited.invoke(&[Message::user("hello")], None).await.unwrap();
    only_artifact(&dir.path().join("from-closure"));
}

#[tokio::test]
async fn test_identity_and_proxy_members() {
    let dir = temp_dir();
    let model = ScriptedModel::new("gpt-test")
        .with_provider("openai")
        .reply("ok".to_string());
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(dir.path()));

    assert_eq!(audited.provider(), "openai");
    assert_eq!(audited.model(), "gpt-test");
    assert_eq!(audited.name(), "gpt-test");
    assert_eq!(audited.model_name(), "gpt-test");

    // inherent ScriptedModel methods through Deref
    assert_eq!(audited.remaining(), 1);
    audited.invoke(&[Message::user("hello")], None).await.unwrap();
    assert_eq!(audited.call_count(), 1);
    assert_eq!(audited.remaining(), 0);

    let inner = audited.into_inner();
    assert_eq!(inner.call_count(), 1);
}

#[derive(Debug, Serialize)]
struct Answer {
    verdict: String,
    confidence: f32,
}

#[tokio::test]
async fn test_structured_completion_is_recorded_as_json() {
    let dir = temp_dir();
    let model = ScriptedModel::new("gpt-test").reply(Answer {
        verdict: "yes".into(),
        confidence: 0.5,
    });
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(dir.path()));

    let result = audited.invoke(&[Message::user("well?")], None).await.unwrap();
    assert_eq!(result.completion.verdict, "yes");

    let (_, record) = only_artifact(dir.path());
    assert_eq!(record.response.content, Some(json!({ "verdict": "yes", "confidence": 0.5 })));
}

#[derive(Debug)]
struct Opaque(u8);

impl Serialize for Opaque {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("not serializable"))
    }
}

#[tokio::test]
async fn test_unserializable_completion_falls_back_to_debug() {
    let dir = temp_dir();
    let model = ScriptedModel::new("gpt-test").reply(Opaque(7));
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(dir.path()));

    let result = audited.invoke(&[Message::user("hello")], None).await.unwrap();
    assert_eq!(result.completion.0, 7);

    let (_, record) = only_artifact(dir.path());
    assert_eq!(record.response.content, Some(json!("Opaque(7)")));
}

#[tokio::test]
async fn test_panicking_failure_hook_does_not_change_the_outcome() {
    let dir = temp_dir();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let hook: PersistFailureHook = Arc::new(|_err: &CaptureError| panic!("hook exploded"));
    let model = ScriptedModel::new("gpt-test")
        .reply("still here".to_string())
        .fail("upstream down");
    let audited = AuditingInterceptor::new(model, FixedLogDir::new(blocker.join("logs")))
        .with_failure_hook(hook);

    let ok = assert_ok!(audited.invoke(&[Message::user("hello")], None).await);
    assert_eq!(ok.completion, "still here");
    let err = assert_err!(audited.invoke(&[Message::user("hello")], None).await);
    assert_eq!(err, ScriptedError::Provider("upstream down".into()));
}

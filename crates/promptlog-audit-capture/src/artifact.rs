//! Markdown audit artifacts: rendering, naming, writing and reading back.

use crate::error::CaptureError;
use promptlog_audit_types::{Fingerprint, LogRecord, RequestSection, ResponseSection};
use promptlog_common_core::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Extension of every artifact.
pub const ARTIFACT_EXTENSION: &str = "md";

/// Attempts at finding a free name before giving up.
const MAX_NAME_ATTEMPTS: u32 = 1000;

const REQUEST_HEADING: &str = "## Request";
const RESPONSE_HEADING: &str = "## Response";
const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Render a record as a Markdown document.
pub fn render(record: &LogRecord) -> std::result::Result<String, CaptureError> {
    let mut lines = vec![
        "# LLM Call".to_string(),
        format!("- model: {}", header_safe(&record.model)),
        format!("- cache_key: {}", record.fingerprint),
        format!("- start: {}", record.started_at()),
        format!("- end: {}", record.ended_at()),
    ];
    if let Some(duration) = record.response.duration_ms {
        lines.push(format!("- duration_ms: {duration}"));
    }
    lines.push(String::new());
    lines.push(REQUEST_HEADING.to_string());
    lines.push(JSON_FENCE.to_string());
    lines.push(serde_json::to_string_pretty(&record.request)?);
    lines.push(FENCE.to_string());
    lines.push(String::new());
    lines.push(RESPONSE_HEADING.to_string());
    lines.push(JSON_FENCE.to_string());
    lines.push(serde_json::to_string_pretty(&record.response)?);
    lines.push(FENCE.to_string());
    lines.push(String::new());
    Ok(lines.join("\n"))
}

// Header values are single lines; the exact model is kept in the request block.
fn header_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_control() {
                c.escape_default().collect()
            } else {
                c.to_string()
            }
        })
        .collect()
}

/// Make a model identifier safe to embed in a file name.
pub fn filename_safe_model(model: &str) -> String {
    let cleaned: String = model
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// `<stamp>-<model>-<fingerprint8>`, without extension.
pub fn artifact_base_name(record: &LogRecord) -> String {
    format!(
        "{}-{}-{}",
        record.ended_at().to_file_stamp(),
        filename_safe_model(&record.model),
        record.fingerprint.short()
    )
}

/// Write `record` into `dir`, creating the directory if needed.
///
/// Files are opened with create-new semantics; when the base name is taken a
/// `-<n>` suffix is appended, so concurrent writers never clobber each other.
pub async fn persist(dir: &Path, record: &LogRecord) -> std::result::Result<PathBuf, CaptureError> {
    let document = render(record)?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| CaptureError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

    let base = artifact_base_name(record);
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = if attempt == 0 {
            format!("{base}.{ARTIFACT_EXTENSION}")
        } else {
            format!("{base}-{attempt}.{ARTIFACT_EXTENSION}")
        };
        let path = dir.join(name);

        let file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(CaptureError::Write { path, source }),
        };

        return match write_or_discard(file, &path, &document).await {
            Ok(()) => Ok(path),
            Err(source) => Err(CaptureError::Write { path, source }),
        };
    }

    Err(CaptureError::NameExhausted {
        base,
        attempts: MAX_NAME_ATTEMPTS,
    })
}

async fn write_document<W: AsyncWrite + Unpin>(writer: &mut W, document: &str) -> std::io::Result<()> {
    writer.write_all(document.as_bytes()).await?;
    writer.flush().await
}

// A partially written artifact is removed so readers never see a truncated file.
async fn write_or_discard<W: AsyncWrite + Unpin>(
    mut writer: W,
    path: &Path,
    document: &str,
) -> std::io::Result<()> {
    let written = write_document(&mut writer, document).await;
    drop(writer);
    if written.is_err() {
        if let Err(err) = tokio::fs::remove_file(path).await {
            tracing::warn!(error = %err, path = %path.display(), "failed to remove partial artifact");
        }
    }
    written
}

/// Ordering key for artifact paths: `(base name, collision counter)`.
///
/// `<base>.md` is counter 0 and `<base>-<n>.md` is counter `n`. The counter is
/// compared numerically, so `-10` sorts after `-9` and every suffixed file
/// sorts after its unsuffixed original.
fn artifact_sort_key(path: &Path) -> (String, u32) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Some((base, suffix)) = stem.rsplit_once('-') {
        // the fingerprint segment is always 8 characters; counters stay shorter
        if !suffix.is_empty() && suffix.len() < 8 && suffix.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(counter) = suffix.parse() {
                return (base.to_string(), counter);
            }
        }
    }
    (stem, 0)
}

/// Reads artifacts written by [`persist`].
pub struct ArtifactReader;

impl ArtifactReader {
    /// Artifact paths in `dir`, oldest first.
    ///
    /// A missing directory yields an empty list.
    pub fn list(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXTENSION) {
                paths.push(path);
            }
        }
        // file names start with a sortable timestamp
        paths.sort_by_cached_key(|path| artifact_sort_key(path));
        Ok(paths)
    }

    /// Parse one artifact back into a record.
    pub fn read_record(path: impl AsRef<Path>) -> Result<LogRecord> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse(path, &text)
    }

    /// Parse artifact text. `path` is only used in error messages.
    pub fn parse(path: &Path, text: &str) -> Result<LogRecord> {
        if header_value(text, "model").is_none() {
            return Err(Error::malformed(path, "missing model header"));
        }
        let fingerprint = header_value(text, "cache_key")
            .ok_or_else(|| Error::malformed(path, "missing cache_key header"))?
            .parse::<Fingerprint>()
            .map_err(|e| Error::malformed(path, format!("bad cache_key: {e}")))?;

        let request: RequestSection = serde_json::from_str(
            json_block(text, REQUEST_HEADING)
                .ok_or_else(|| Error::malformed(path, "missing request block"))?,
        )?;
        let response: ResponseSection = serde_json::from_str(
            json_block(text, RESPONSE_HEADING)
                .ok_or_else(|| Error::malformed(path, "missing response block"))?,
        )?;

        Ok(LogRecord {
            fingerprint,
            model: request.model.clone(),
            request,
            response,
        })
    }
}

fn header_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let prefix = format!("- {key}: ");
    text.lines()
        .take_while(|line| *line != REQUEST_HEADING)
        .find_map(|line| line.strip_prefix(prefix.as_str()))
}

// Pretty JSON never holds a raw newline inside a string, so a heading on its
// own line can only be the real section marker.
fn json_block<'a>(text: &'a str, heading: &str) -> Option<&'a str> {
    let marker = format!("\n{heading}\n{JSON_FENCE}\n");
    let body = &text[text.find(&marker)? + marker.len()..];
    let close = body.find(&format!("\n{FENCE}"))?;
    Some(&body[..close])
}

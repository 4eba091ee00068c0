//! Where artifacts go.

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolves the directory for the next artifact.
///
/// Called once per invocation and never cached, so the destination may change
/// between calls.
pub trait LogDirProvider: Send + Sync {
    /// Directory to write into. Need not exist yet.
    fn resolve(&self) -> PathBuf;
}

impl<F> LogDirProvider for F
where
    F: Fn() -> PathBuf + Send + Sync,
{
    fn resolve(&self) -> PathBuf {
        self()
    }
}

/// Always the same directory.
#[derive(Debug, Clone)]
pub struct FixedLogDir(PathBuf);

impl FixedLogDir {
    /// Create a provider for `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self(dir.into())
    }
}

impl LogDirProvider for FixedLogDir {
    fn resolve(&self) -> PathBuf {
        self.0.clone()
    }
}

/// `<session root>/<dirname>`, where the session root can be switched at runtime.
///
/// Clones share the same root, so a session manager can hold one handle and
/// the interceptor another.
#[derive(Debug, Clone)]
pub struct SessionLogDir {
    root: Arc<RwLock<PathBuf>>,
    dirname: String,
}

impl SessionLogDir {
    /// Start with `root` as the active session directory.
    pub fn new(root: impl Into<PathBuf>, dirname: impl Into<String>) -> Self {
        Self {
            root: Arc::new(RwLock::new(root.into())),
            dirname: dirname.into(),
        }
    }

    /// Point subsequent calls at a new session directory.
    pub fn set_root(&self, root: impl Into<PathBuf>) {
        *self.root.write() = root.into();
    }

    /// Currently active session directory.
    pub fn root(&self) -> PathBuf {
        self.root.read().clone()
    }

    /// Sub-directory name under each session root.
    pub fn dirname(&self) -> &str {
        &self.dirname
    }
}

impl LogDirProvider for SessionLogDir {
    fn resolve(&self) -> PathBuf {
        self.root.read().join(&self.dirname)
    }
}

//! Target resolution and remote checkouts
//!
//! A target is either a local directory or something that looks like a Git
//! URL. Remote targets are shallow-cloned with the `git` executable into a
//! temporary directory owned by [`RemoteCheckout`]; dropping the checkout
//! removes the directory, on success, on error and during unwinding.
//!
//! A live checkout directory is also registered process-wide so the handler
//! from [`install_interrupt_cleanup`] can remove it when the run is killed by
//! SIGINT, SIGTERM or SIGHUP, where no destructor runs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, warn};

/// Prefix for temporary clone directories
pub const CHECKOUT_PREFIX: &str = "token-counter-";

/// Exit status after an interrupt, matching the shell convention for SIGINT
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Temporary directories of checkouts that are still alive
static LIVE_CHECKOUTS: Lazy<Mutex<Vec<PathBuf>>> = Lazy::new(|| Mutex::new(Vec::new()));

const URL_SCHEMES: &[&str] = &["http://", "https://", "git://", "ssh://", "file://"];

/// scp-like syntax: user@host:path
static SCP_LIKE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.-]+@[\w.-]+:\S+$").expect("Invalid SCP_LIKE_RE regex"));

/// Fatal setup errors for a target
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("git executable not found on PATH")]
    GitUnavailable,

    #[error("failed to run git: {0}")]
    GitSpawn(#[source] std::io::Error),

    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("git clone of {url} failed: {stderr}")]
    CloneFailed { url: String, stderr: String },
}

/// What the user asked to analyze
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Local(PathBuf),
    Remote(String),
}

/// Whether a target string should be cloned rather than read from disk
pub fn looks_like_remote(target: &str) -> bool {
    let lower = target.to_lowercase();
    URL_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
        || SCP_LIKE_RE.is_match(target)
        || lower.ends_with(".git")
}

/// Decide whether a target is a local directory or a repository URL.
///
/// An existing directory always wins, even when its name ends in `.git`.
pub fn resolve_target(raw: &str) -> Result<Target, TargetError> {
    let path = Path::new(raw);
    if path.is_dir() {
        return Ok(Target::Local(path.to_path_buf()));
    }
    if looks_like_remote(raw) {
        return Ok(Target::Remote(raw.to_string()));
    }
    if path.exists() {
        return Err(TargetError::NotADirectory(path.to_path_buf()));
    }
    Err(TargetError::NotFound(path.to_path_buf()))
}

fn live_checkouts() -> MutexGuard<'static, Vec<PathBuf>> {
    // The list stays valid even if a holder panicked
    LIVE_CHECKOUTS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Remove the given directories, returning how many were deleted
fn remove_dirs(paths: &[PathBuf]) -> usize {
    paths
        .iter()
        .filter(|path| fs::remove_dir_all(path).is_ok())
        .count()
}

/// Install a SIGINT/SIGTERM/SIGHUP handler that deletes live checkouts and
/// exits with [`INTERRUPTED_EXIT_CODE`].
///
/// Call once per process.
pub fn install_interrupt_cleanup() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        let removed = remove_dirs(&live_checkouts());
        warn!(removed, "Interrupted, temporary clones removed");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
}

/// Keeps a directory in [`LIVE_CHECKOUTS`] for as long as it exists
#[derive(Debug)]
struct Registration(PathBuf);

impl Registration {
    fn new(path: &Path) -> Self {
        live_checkouts().push(path.to_path_buf());
        Self(path.to_path_buf())
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        live_checkouts().retain(|path| path != &self.0);
    }
}

/// A registered temporary directory.
///
/// Fields drop in order, so the directory is deleted before it leaves the
/// registry and an interrupt in between cannot leak it.
#[derive(Debug)]
struct ScratchDir {
    dir: TempDir,
    _registration: Registration,
}

impl ScratchDir {
    fn new_in(parent: &Path) -> Result<Self, TargetError> {
        let dir = tempfile::Builder::new()
            .prefix(CHECKOUT_PREFIX)
            .tempdir_in(parent)
            .map_err(TargetError::TempDir)?;
        let registration = Registration::new(dir.path());
        Ok(Self {
            dir,
            _registration: registration,
        })
    }
}

/// A shallow clone living in a temporary directory
#[derive(Debug)]
pub struct RemoteCheckout {
    scratch: ScratchDir,
    root: PathBuf,
}

impl RemoteCheckout {
    /// Clone `url` under the system temp directory
    pub fn clone(url: &str) -> Result<Self, TargetError> {
        Self::clone_in(url, &std::env::temp_dir())
    }

    /// Clone `url` into a fresh temporary directory under `parent`.
    ///
    /// On failure the temporary directory is already gone when this returns.
    pub fn clone_in(url: &str, parent: &Path) -> Result<Self, TargetError> {
        let scratch = ScratchDir::new_in(parent)?;
        let root = scratch.dir.path().join("repo");

        debug!(url, dest = %root.display(), "Running git clone");
        let output = Command::new("git")
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--quiet")
            .arg("--")
            .arg(url)
            .arg(&root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TargetError::GitUnavailable
                } else {
                    TargetError::GitSpawn(e)
                }
            })?;

        if !output.status.success() {
            return Err(TargetError::CloneFailed {
                url: url.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(Self { scratch, root })
    }

    /// Working copy root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The temporary directory removed on drop
    pub fn temp_path(&self) -> &Path {
        self.scratch.dir.path()
    }
}

/// Check whether git can be run
#[cfg(test)]
pub(crate) fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .current_dir(dir)
            .args([
                "-c",
                "user.name=Test",
                "-c",
                "user.email=test@example.com",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .output()
            .unwrap()
            .status;
        assert!(status.success(), "git {:?} failed", args);
    }

    fn file_url(path: &Path) -> String {
        format!("file://{}", path.display())
    }

    #[test]
    fn test_looks_like_remote() {
        assert!(looks_like_remote("https://github.com/owner/repo"));
        assert!(looks_like_remote("HTTP://example.com/repo"));
        assert!(looks_like_remote("git://example.com/repo.git"));
        assert!(looks_like_remote("ssh://git@example.com/repo"));
        assert!(looks_like_remote("git@github.com:owner/repo.git"));
        assert!(looks_like_remote("git@github.com:owner/repo"));
        assert!(looks_like_remote("some/path/repo.git"));
        assert!(looks_like_remote("file:///tmp/repo"));

        assert!(!looks_like_remote("./src"));
        assert!(!looks_like_remote("/home/user/project"));
        assert!(!looks_like_remote("C:\\projects\\thing"));
    }

    #[test]
    fn test_resolve_local_dir() {
        let temp = tempdir().unwrap();
        let target = resolve_target(temp.path().to_str().unwrap()).unwrap();
        assert_eq!(target, Target::Local(temp.path().to_path_buf()));
    }

    #[test]
    fn test_resolve_local_dir_named_like_repo() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("mirror.git");
        fs::create_dir(&dir).unwrap();

        let target = resolve_target(dir.to_str().unwrap()).unwrap();
        assert_eq!(target, Target::Local(dir));
    }

    #[test]
    fn test_resolve_remote() {
        let target = resolve_target("https://github.com/owner/repo").unwrap();
        assert_eq!(
            target,
            Target::Remote("https://github.com/owner/repo".to_string())
        );
    }

    #[test]
    fn test_resolve_missing_path() {
        let err = resolve_target("/nonexistent/project/dir").unwrap_err();
        assert!(matches!(err, TargetError::NotFound(_)));
    }

    #[test]
    fn test_resolve_file_is_not_a_directory() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("main.py");
        fs::write(&file, "print(1)").unwrap();

        let err = resolve_target(file.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, TargetError::NotADirectory(_)));
    }

    fn is_live(path: &Path) -> bool {
        live_checkouts().iter().any(|p| p == path)
    }

    #[test]
    fn test_scratch_dir_is_registered_while_alive() {
        let parent = tempdir().unwrap();
        let scratch = ScratchDir::new_in(parent.path()).unwrap();
        let path = scratch.dir.path().to_path_buf();

        assert!(path.is_dir());
        assert!(is_live(&path));

        drop(scratch);
        assert!(!path.exists());
        assert!(!is_live(&path));
    }

    #[test]
    fn test_interrupt_cleanup_removes_registered_dir() {
        let parent = tempdir().unwrap();
        let scratch = ScratchDir::new_in(parent.path()).unwrap();
        let path = scratch.dir.path().to_path_buf();
        fs::create_dir_all(path.join("repo/src")).unwrap();
        fs::write(path.join("repo/src/main.py"), "print(1)\n").unwrap();

        assert_eq!(remove_dirs(&[path.clone()]), 1);
        assert!(!path.exists());
        assert_eq!(remove_dirs(&[path.clone()]), 0);

        // Dropping after the handler already removed the directory is harmless
        drop(scratch);
        assert!(!is_live(&path));
    }

    #[test]
    fn test_failed_clone_leaves_no_temp_dir() {
        if !git_available() {
            return;
        }
        let parent = tempdir().unwrap();
        let missing = parent.path().join("does-not-exist");

        let err = RemoteCheckout::clone_in(&file_url(&missing), parent.path()).unwrap_err();
        assert!(matches!(err, TargetError::CloneFailed { .. }));
        assert!(!live_checkouts().iter().any(|p| p.starts_with(parent.path())));

        let leftovers: Vec<_> = fs::read_dir(parent.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(CHECKOUT_PREFIX))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_clone_and_cleanup_on_drop() {
        if !git_available() {
            return;
        }
        let source = tempdir().unwrap();
        git(source.path(), &["init", "--quiet"]);
        fs::write(source.path().join("main.py"), "print('hello')\n").unwrap();
        git(source.path(), &["add", "main.py"]);
        git(source.path(), &["commit", "--quiet", "-m", "init"]);

        let parent = tempdir().unwrap();
        let checkout = RemoteCheckout::clone_in(&file_url(source.path()), parent.path()).unwrap();
        let temp_path = checkout.temp_path().to_path_buf();

        assert!(checkout.root().join("main.py").is_file());
        assert!(temp_path.starts_with(parent.path()));
        assert!(is_live(&temp_path));

        drop(checkout);
        assert!(!temp_path.exists());
        assert!(!is_live(&temp_path));
    }
}

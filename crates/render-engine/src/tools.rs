//! External tool resolution and invocation helpers.
//!
//! Resolution order for ffmpeg/ffprobe:
//! 1) Environment variable override (`REELCUT_FFMPEG_PATH`, `REELCUT_FFPROBE_PATH`)
//! 2) PATH lookup by bare name

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use reelcut_common::error::{ReelcutError, ReelcutResult};

fn resolve_tool(env_key: &str, default_name: &str) -> PathBuf {
    if let Ok(value) = std::env::var(env_key) {
        let path = PathBuf::from(&value);
        if path.exists() {
            return path;
        }
        tracing::warn!(env_key, path = %value, "Tool override does not exist, falling back to PATH");
    }
    PathBuf::from(default_name)
}

/// Path to the ffmpeg binary.
pub fn ffmpeg_path() -> PathBuf {
    resolve_tool("REELCUT_FFMPEG_PATH", "ffmpeg")
}

/// Path to the ffprobe binary.
pub fn ffprobe_path() -> PathBuf {
    resolve_tool("REELCUT_FFPROBE_PATH", "ffprobe")
}

/// `path` made absolute against the current directory.
pub fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Cannot resolve current directory");
            path.to_path_buf()
        }
    }
}

/// Whether a tool runs and reports its version.
pub fn is_tool_available(tool: &Path) -> bool {
    Command::new(tool)
        .arg("-version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Run ffmpeg to completion, turning a non-zero exit into an error built by
/// `make_error` from ffmpeg's stderr.
pub fn run_ffmpeg<I, S>(args: I, make_error: fn(String) -> ReelcutError) -> ReelcutResult<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
    tracing::debug!(args = ?args, "Running ffmpeg");

    let output = Command::new(ffmpeg_path())
        .args(&args)
        .output()
        .map_err(|e| make_error(format!("failed to start ffmpeg: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(make_error(format!(
            "ffmpeg exited with {}: {}",
            output.status, detail
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_unavailable() {
        assert!(!is_tool_available(Path::new(
            "reelcut-definitely-not-a-real-binary"
        )));
    }

    #[test]
    fn test_absolute_path() {
        assert_eq!(absolute_path(Path::new("/tmp/x")), PathBuf::from("/tmp/x"));
        let resolved = absolute_path(Path::new("processing/clips"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("processing/clips"));
    }

    #[test]
    fn test_default_tool_names() {
        if std::env::var("REELCUT_FFMPEG_PATH").is_err() {
            assert_eq!(ffmpeg_path(), PathBuf::from("ffmpeg"));
        }
    }
}

//! Highlight compilation: extract each buffered span and concatenate.
//!
//! Intermediate clips live in a per-job scratch directory that is removed
//! on every exit path. The reel is written to a hidden partial file next to
//! the destination and renamed into place only after concatenation
//! succeeds, so a failed run never leaves a file at the output path.

use std::path::{Path, PathBuf};

use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_media_model::segment::BufferedSegment;
use reelcut_media_model::video::VideoSource;

use crate::toolchain::MediaToolchain;
use crate::tools::absolute_path;

/// Longest accepted job id.
pub const MAX_JOB_ID_LEN: usize = 128;

/// Reject job ids that could escape the per-job scratch namespace.
///
/// A job id becomes a single directory and file-name component, so only
/// ASCII letters, digits, `-` and `_` are accepted.
pub fn validate_job_id(job_id: &str) -> ReelcutResult<()> {
    let well_formed = !job_id.is_empty()
        && job_id.len() <= MAX_JOB_ID_LEN
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(ReelcutError::validation(format!(
            "invalid job id {job_id:?}: use 1-{MAX_JOB_ID_LEN} characters from [A-Za-z0-9_-]"
        )))
    }
}

/// Per-job scratch directory, removed on drop.
#[derive(Debug)]
pub struct ScratchDir {
    root: PathBuf,
    clips: PathBuf,
}

impl ScratchDir {
    /// Create `<work_dir>/<job_id>/clips`. Paths are absolute so clip
    /// lists stay valid whatever directory ffmpeg resolves them from.
    pub fn create(work_dir: &Path, job_id: &str) -> ReelcutResult<Self> {
        validate_job_id(job_id)?;
        let root = absolute_path(work_dir).join(job_id);
        let clips = root.join("clips");
        std::fs::create_dir_all(&clips)?;
        Ok(Self { root, clips })
    }

    pub fn clips_dir(&self) -> &Path {
        &self.clips
    }

    pub fn clip_path(&self, index: usize) -> PathBuf {
        self.clips.join(format!("clip_{index:04}.mp4"))
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_dir_all(&self.root) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.root.display(), error = %err, "Failed to remove scratch directory");
            }
        }
    }
}

/// Output being written; deleted on drop unless committed.
#[derive(Debug)]
pub struct PartialOutput {
    partial: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl PartialOutput {
    pub fn new(target: &Path, job_id: &str) -> Self {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "highlights.mp4".to_string());
        let partial = target.with_file_name(format!(".{name}.{job_id}.partial"));
        Self {
            partial,
            target: target.to_path_buf(),
            committed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.partial
    }

    /// Move the finished file to its destination.
    pub fn commit(mut self) -> ReelcutResult<PathBuf> {
        if !self.partial.exists() {
            return Err(ReelcutError::compilation(format!(
                "concatenation produced no file at {}",
                self.partial.display()
            )));
        }
        std::fs::rename(&self.partial, &self.target)?;
        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for PartialOutput {
    fn drop(&mut self) {
        if !self.committed && self.partial.exists() {
            let _ = std::fs::remove_file(&self.partial);
        }
    }
}

fn with_context(err: ReelcutError, context: String) -> ReelcutError {
    match err {
        ReelcutError::Compilation { message } => {
            ReelcutError::compilation(format!("{context}: {message}"))
        }
        other => ReelcutError::compilation(format!("{context}: {other}")),
    }
}

/// Cut `segments` out of `source` and join them into `output_path`.
///
/// `segments` must be non-empty, ascending, and disjoint.
pub fn compile_highlights<T: MediaToolchain + ?Sized>(
    toolchain: &T,
    source: &VideoSource,
    segments: &[BufferedSegment],
    output_path: &Path,
    work_dir: &Path,
    job_id: &str,
) -> ReelcutResult<PathBuf> {
    if segments.is_empty() {
        return Err(ReelcutError::compilation("no segments to compile"));
    }
    validate_job_id(job_id)?;

    let started = std::time::Instant::now();
    let scratch = ScratchDir::create(work_dir, job_id)
        .map_err(|e| with_context(e, "creating scratch directory".to_string()))?;
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| with_context(e.into(), "creating output directory".to_string()))?;
    }

    let mut clips = Vec::with_capacity(segments.len());
    for (index, span) in segments.iter().enumerate() {
        let clip = scratch.clip_path(index);
        toolchain.extract_clip(source, span, &clip).map_err(|e| {
            with_context(
                e,
                format!(
                    "extracting clip {index} ({:.3}s-{:.3}s)",
                    span.start_secs, span.end_secs
                ),
            )
        })?;
        tracing::debug!(index, start = span.start_secs, end = span.end_secs, "Extracted clip");
        clips.push(clip);
    }

    let partial = PartialOutput::new(output_path, job_id);
    toolchain
        .concat_clips(&clips, partial.path())
        .map_err(|e| with_context(e, format!("concatenating {} clips", clips.len())))?;
    let output = partial
        .commit()
        .map_err(|e| with_context(e, "finalizing output".to_string()))?;

    tracing::info!(
        output = %output.display(),
        clips = clips.len(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Highlight reel compiled"
    );
    Ok(output)
}

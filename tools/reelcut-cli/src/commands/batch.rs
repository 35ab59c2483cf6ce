//! Process several videos concurrently.
//!
//! Each video is an independent job with its own job id, scratch space, and
//! output file. The blocking pipeline runs on tokio's blocking pool, bounded
//! by a semaphore.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use reelcut_common::config::AppConfig;
use reelcut_media_model::result::{Outcome, ProcessingResult, StatusCallback, StatusUpdate};
use tokio::sync::Semaphore;

use super::process::{new_job_id, process_video};

/// Output path for `video` inside `out_dir`.
pub fn output_path_for(video: &Path, out_dir: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    out_dir.join(format!("{stem}_highlights.mp4"))
}

/// Output paths for every video, suffixing `_2`, `_3`, ... when stems repeat
/// so that no two jobs write the same file.
pub fn plan_output_paths(videos: &[PathBuf], out_dir: &Path) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    videos
        .iter()
        .map(|video| {
            let base = output_path_for(video, out_dir);
            let mut candidate = base.clone();
            let mut n = 2;
            while !taken.insert(candidate.clone()) {
                let stem = base
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                candidate = out_dir.join(format!("{stem}_{n}.mp4"));
                n += 1;
            }
            candidate
        })
        .collect()
}

pub async fn run(
    config: AppConfig,
    videos: Vec<PathBuf>,
    out_dir: Option<PathBuf>,
    jobs: usize,
    json: bool,
) -> anyhow::Result<()> {
    let out_dir = out_dir.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let jobs = jobs.max(1);
    tracing::info!(videos = videos.len(), jobs, out_dir = %out_dir.display(), "Starting batch");

    let config = Arc::new(config);
    let semaphore = Arc::new(Semaphore::new(jobs));
    let outputs = plan_output_paths(&videos, &out_dir);
    let mut handles = Vec::with_capacity(videos.len());

    for (video, output) in videos.into_iter().zip(outputs) {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .context("Job semaphore closed")?;
        let config = Arc::clone(&config);
        let job_id = new_job_id();

        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let label = video.display().to_string();
            let status: StatusCallback = Box::new(move |update: StatusUpdate| {
                eprintln!("  [{label}] {}", update.message);
            });
            process_video(&config, &video, &output, &job_id, Some(&status))
        }));
    }

    let mut results: Vec<ProcessingResult> = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.context("Batch job panicked")?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_batch_summary(&results);
    }

    let failed = results.iter().filter(|r| !r.succeeded).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} videos failed", results.len());
    }
    Ok(())
}

fn print_batch_summary(results: &[ProcessingResult]) {
    println!();
    println!("Batch results");
    println!("{}", "=".repeat(50));
    for result in results {
        let line = match result.outcome {
            Outcome::Compiled => format!(
                "[OK]      {} ({} segments)",
                result.output_path.display(),
                result.segments.len()
            ),
            Outcome::NoSegments => format!("[EMPTY]   {} (no moving people)", result.job_id),
            _ => format!(
                "[FAILED]  {}: {}",
                result.job_id,
                result.failure_reason.as_deref().unwrap_or("unknown error")
            ),
        };
        println!("{line}");
    }
}

//! Streaming frame decode through an ffmpeg rawvideo pipe.
//!
//! Frames are read one at a time from ffmpeg's stdout as packed RGB24, so
//! memory use stays at a single frame regardless of video length.

use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_media_model::video::{VideoFrame, VideoSource};

use crate::tools::ffmpeg_path;

/// ffmpeg arguments that decode `input` to RGB24 on stdout.
pub fn build_decode_args(input: &Path) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-nostdin".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgb24".to_string(),
        "pipe:1".to_string(),
    ]
}

/// Iterator over decoded frames of one video.
pub struct FrameReader {
    child: Option<Child>,
    stdout: Option<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    fps: f64,
    frame_len: usize,
    next_index: u64,
    finished: bool,
}

impl FrameReader {
    /// Start decoding `source`.
    pub fn spawn(source: &VideoSource) -> ReelcutResult<Self> {
        let frame_len = source.rgb_frame_len();
        if frame_len == 0 {
            return Err(ReelcutError::decode(format!(
                "cannot decode {} at {}x{}",
                source.path.display(),
                source.width,
                source.height
            )));
        }

        let args = build_decode_args(&source.path);
        tracing::debug!(args = ?args, "Starting frame decoder");
        let mut child = Command::new(ffmpeg_path())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReelcutError::decode(format!("failed to start ffmpeg: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelcutError::decode("failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelcutError::decode("failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once its stderr pipe fills up.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        Ok(Self {
            child: Some(child),
            stdout: Some(BufReader::with_capacity(frame_len.min(1 << 22), stdout)),
            stderr_task: Some(stderr_task),
            width: source.width,
            height: source.height,
            fps: source.fps,
            frame_len,
            next_index: 0,
            finished: false,
        })
    }

    /// Fill `buf` completely. Returns the number of bytes read, which is
    /// short only at end of stream.
    fn read_frame(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(filled)
    }

    /// Wait for ffmpeg and report a failed exit.
    fn finish(&mut self) -> ReelcutResult<()> {
        self.finished = true;
        self.stdout = None;

        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| ReelcutError::decode(format!("failed to wait on ffmpeg: {e}")))?;
        let stderr_output = self
            .stderr_task
            .take()
            .map(|task| {
                task.join()
                    .unwrap_or_else(|_| "<failed to join stderr reader>".to_string())
            })
            .unwrap_or_default();

        if !status.success() {
            return Err(ReelcutError::decode(format!(
                "ffmpeg decode failed after {} frames (status {}): {}",
                self.next_index,
                status,
                stderr_output.trim()
            )));
        }

        tracing::debug!(frames = self.next_index, "Frame decoder finished");
        Ok(())
    }
}

impl Iterator for FrameReader {
    type Item = ReelcutResult<VideoFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let reader = self.stdout.as_mut()?;

        let mut data = vec![0u8; self.frame_len];
        let filled = match Self::read_frame(reader, &mut data) {
            Ok(filled) => filled,
            Err(err) => {
                let _ = self.finish();
                return Some(Err(ReelcutError::decode(format!(
                    "failed reading frame {}: {err}",
                    self.next_index
                ))));
            }
        };

        if filled < self.frame_len {
            if filled > 0 {
                tracing::warn!(
                    frame = self.next_index,
                    bytes = filled,
                    expected = self.frame_len,
                    "Dropping truncated trailing frame"
                );
            }
            return self.finish().err().map(Err);
        }

        let index = self.next_index;
        self.next_index += 1;
        Some(Ok(VideoFrame {
            index,
            timestamp_secs: index as f64 / self.fps,
            width: self.width,
            height: self.height,
            data,
        }))
    }
}

impl Drop for FrameReader {
    fn drop(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(task) = self.stderr_task.take() {
            let _ = task.join();
        }
    }
}

//! Pose estimation through an external sidecar process.
//!
//! Wire protocol, one exchange per frame:
//!
//! ```text
//! -> {"index":12,"width":1280,"height":720,"format":"rgb24","bytes":2764800}\n
//! -> <bytes of packed RGB24 pixels>
//! <- {"landmarks":[[0.51,0.32,-0.1], ...]}\n
//! ```
//!
//! An empty or null `landmarks` means no person was found.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use reelcut_common::config::PoseSidecarConfig;
use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_media_model::pose::{Landmark, PoseDetection};
use reelcut_media_model::video::VideoFrame;
use reelcut_processing_core::PoseEstimator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct FrameHeader<'a> {
    index: u64,
    width: u32,
    height: u32,
    format: &'a str,
    bytes: usize,
}

#[derive(Debug, Deserialize)]
struct SidecarReply {
    #[serde(default)]
    landmarks: Option<Vec<Vec<f64>>>,
}

/// Parse one reply line into a detection.
pub fn parse_reply(line: &str) -> ReelcutResult<PoseDetection> {
    let reply: SidecarReply = serde_json::from_str(line.trim())
        .map_err(|e| ReelcutError::pose(format!("malformed sidecar reply: {e}")))?;

    let landmarks = reply
        .landmarks
        .unwrap_or_default()
        .into_iter()
        .filter(|coords| coords.len() >= 2)
        .map(|coords| Landmark::new(coords[0], coords[1], coords.get(2).copied().unwrap_or(0.0)))
        .collect();

    Ok(PoseDetection::from_landmarks(landmarks))
}

/// [`PoseEstimator`] backed by a long-lived child process.
pub struct SidecarPoseEstimator {
    command: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    exited: bool,
}

impl SidecarPoseEstimator {
    /// Spawn `command` with `args`.
    pub fn spawn(command: &str, args: &[String]) -> ReelcutResult<Self> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| ReelcutError::pose(format!("failed to start pose sidecar `{command}`: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelcutError::pose("failed to capture sidecar stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelcutError::pose("failed to capture sidecar stdout"))?;

        tracing::info!(command, pid = child.id(), "Pose sidecar started");
        Ok(Self {
            command: command.to_string(),
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            exited: false,
        })
    }

    /// Spawn the sidecar described by the configuration.
    pub fn from_config(config: &PoseSidecarConfig) -> ReelcutResult<Self> {
        let command = config
            .command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                ReelcutError::config("no pose sidecar configured (set pose.command or --pose-command)")
            })?;
        Self::spawn(command, &config.args)
    }

    /// Whether the sidecar has gone away.
    pub fn has_exited(&self) -> bool {
        self.exited
    }

    fn exchange(&mut self, frame: &VideoFrame) -> ReelcutResult<PoseDetection> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ReelcutError::pose("sidecar stdin closed"))?;

        let header = FrameHeader {
            index: frame.index,
            width: frame.width,
            height: frame.height,
            format: "rgb24",
            bytes: frame.data.len(),
        };
        let mut line = serde_json::to_vec(&header)?;
        line.push(b'\n');
        stdin.write_all(&line)?;
        stdin.write_all(&frame.data)?;
        stdin.flush()?;

        let mut reply = String::new();
        if self.stdout.read_line(&mut reply)? == 0 {
            return Err(ReelcutError::pose("sidecar closed its output"));
        }
        parse_reply(&reply)
    }

    fn mark_exited(&mut self, err: &ReelcutError) {
        self.exited = true;
        self.stdin = None;
        let status = self
            .child
            .try_wait()
            .ok()
            .flatten()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        tracing::warn!(
            command = %self.command,
            status = %status,
            error = %err,
            "Pose sidecar stopped responding, remaining frames count as empty"
        );
    }

    fn looks_dead(&mut self, err: &ReelcutError) -> bool {
        let pipe_closed = match err {
            ReelcutError::Io(io) => matches!(
                io.kind(),
                std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::UnexpectedEof
            ),
            ReelcutError::Pose { message } => message.contains("closed"),
            _ => false,
        };
        pipe_closed || matches!(self.child.try_wait(), Ok(Some(_)))
    }
}

impl PoseEstimator for SidecarPoseEstimator {
    fn estimate(&mut self, frame: &VideoFrame) -> ReelcutResult<PoseDetection> {
        if self.exited {
            return Ok(PoseDetection::NotFound);
        }

        match self.exchange(frame) {
            Ok(detection) => Ok(detection),
            Err(err) => {
                if self.looks_dead(&err) {
                    self.mark_exited(&err);
                }
                Err(err)
            }
        }
    }
}

impl Drop for SidecarPoseEstimator {
    fn drop(&mut self) {
        self.stdin = None;
        if matches!(self.child.try_wait(), Ok(None)) {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: u64) -> VideoFrame {
        VideoFrame {
            index,
            timestamp_secs: index as f64 / 30.0,
            width: 2,
            height: 1,
            data: vec![7; 6],
        }
    }

    #[test]
    fn test_parse_reply_with_landmarks() {
        let detection = parse_reply(r#"{"landmarks":[[0.1,0.2,0.3],[0.4,0.5]]}"#).unwrap();
        let landmarks = detection.landmarks().unwrap();
        assert_eq!(landmarks.len(), 2);
        assert_eq!(landmarks[1], Landmark::new(0.4, 0.5, 0.0));
    }

    #[test]
    fn test_parse_reply_null_or_empty_is_not_found() {
        assert_eq!(parse_reply(r#"{"landmarks":null}"#).unwrap(), PoseDetection::NotFound);
        assert_eq!(parse_reply(r#"{"landmarks":[]}"#).unwrap(), PoseDetection::NotFound);
        assert_eq!(parse_reply("{}").unwrap(), PoseDetection::NotFound);
    }

    #[test]
    fn test_parse_reply_rejects_garbage() {
        assert!(matches!(
            parse_reply("not json"),
            Err(ReelcutError::Pose { .. })
        ));
    }

    #[test]
    fn test_missing_command_is_config_error() {
        let err = SidecarPoseEstimator::from_config(&PoseSidecarConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ReelcutError::Config { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_sidecar_round_trip() {
        let script = r#"while IFS= read -r header; do
  n=$(printf '%s' "$header" | sed 's/.*"bytes":\([0-9]*\).*/\1/')
  head -c "$n" > /dev/null
  echo '{"landmarks":[[0.25,0.5,0.0]]}'
done"#;
        let mut sidecar =
            SidecarPoseEstimator::spawn("sh", &["-c".to_string(), script.to_string()]).unwrap();
        for index in 0..3 {
            let detection = sidecar.estimate(&frame(index)).unwrap();
            assert_eq!(
                detection.landmarks().unwrap(),
                &[Landmark::new(0.25, 0.5, 0.0)]
            );
        }
        assert!(!sidecar.has_exited());
    }

    #[cfg(unix)]
    #[test]
    fn test_exited_sidecar_reports_once_then_not_found() {
        let mut sidecar = SidecarPoseEstimator::spawn("sh", &["-c".to_string(), "exit 0".to_string()]).unwrap();
        assert!(sidecar.estimate(&frame(0)).is_err());
        assert!(sidecar.has_exited());
        assert_eq!(sidecar.estimate(&frame(1)).unwrap(), PoseDetection::NotFound);
    }
}

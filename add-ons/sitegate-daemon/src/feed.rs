//! Detection feed from the external perception sidecar.
//!
//! The detector/tracker stack runs out of process and writes one JSON
//! `DetectionFrame` per line on this daemon's stdin. `StdinFeed` plays the
//! video-source role (a line is a "frame"); `JsonPerception` plays the
//! inference role (decoding the line). EOF, a read error, or no line within
//! the frame deadline all surface as `None`, which the supervisor resolves
//! to the fail-safe path rather than a silent unbounded retry.

use async_trait::async_trait;
use sitegate_core::ports::{Frame, Perception, PerceptionError, VideoSource};
use sitegate_core::DetectionFrame;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::timeout;
use tracing::warn;

fn now_unix() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

pub struct StdinFeed {
    lines: Lines<BufReader<Stdin>>,
    /// Longest a cycle will wait for the sidecar before declaring it down.
    read_deadline: Duration,
}

impl StdinFeed {
    pub fn new(read_deadline: Duration) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            read_deadline,
        }
    }
}

#[async_trait]
impl VideoSource for StdinFeed {
    async fn read(&mut self) -> Option<Frame> {
        loop {
            match timeout(self.read_deadline, self.lines.next_line()).await {
                Ok(Ok(Some(line))) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    return Some(Frame {
                        captured_at: now_unix(),
                        payload: line.into_bytes(),
                    });
                }
                Ok(Ok(None)) => {
                    warn!("detection feed closed (EOF)");
                    return None;
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "detection feed read failed");
                    return None;
                }
                Err(_) => {
                    warn!(
                        deadline_ms = self.read_deadline.as_millis() as u64,
                        "no frame within deadline"
                    );
                    return None;
                }
            }
        }
    }
}

/// Decodes a feed line into a `DetectionFrame`. A malformed line is a
/// perception error for that cycle, not a crash.
pub struct JsonPerception;

#[async_trait]
impl Perception for JsonPerception {
    async fn predict(&self, frame: &Frame) -> Result<DetectionFrame, PerceptionError> {
        let mut detections: DetectionFrame = serde_json::from_slice(&frame.payload)
            .map_err(|e| PerceptionError::Decode(e.to_string()))?;
        if detections.ts <= 0.0 {
            detections.ts = frame.captured_at;
        }
        Ok(detections)
    }
}

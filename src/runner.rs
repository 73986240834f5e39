//! Job runner that replays a recorded Renovate log.
//!
//! The recording is newline-delimited JSON, one log message per line, as
//! Renovate writes with `LOG_FORMAT=json`.

use crate::model::LogMessage;
use crate::traits::{JobRunner, RunHandle, RunRequest, RunStream, RunnerError, StreamError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

pub struct ReplayRunner {
    path: PathBuf,
    channel_capacity: usize,
    delay: Duration,
}

impl ReplayRunner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            channel_capacity: 64,
            delay: Duration::ZERO,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Pause between replayed lines, to mimic a live job.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Stops the reader task when closed.
struct ReplayHandle {
    reader: JoinHandle<()>,
}

impl RunHandle for ReplayHandle {
    fn close(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl JobRunner for ReplayRunner {
    fn name(&self) -> &str {
        "replay"
    }

    #[instrument(skip(self, request))]
    async fn run(&self, request: RunRequest) -> Result<RunStream, RunnerError> {
        let file = tokio::fs::File::open(&self.path).await?;
        info!(
            path = %self.path.display(),
            repository = %request.repository_url,
            "Replaying recorded run"
        );

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let delay = self.delay;
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(file).lines();
            let mut line_no = 0usize;
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(Err(StreamError::Failed(e.to_string()))).await;
                        return;
                    }
                };
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }

                let event = serde_json::from_str::<LogMessage>(&line).map_err(|e| {
                    warn!(line = line_no, error = %e, "Unreadable log line");
                    StreamError::Failed(format!("line {line_no}: {e}"))
                });
                let failed = event.is_err();
                if tx.send(event).await.is_err() || failed {
                    return;
                }

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            debug!(lines = line_no, "Replay finished");
        });

        Ok(RunStream {
            handle: Box::new(ReplayHandle { reader }),
            messages: rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_log(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("replay_{}_{}.ndjson", name, std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    fn request() -> RunRequest {
        RunRequest {
            token: "ghp_secret".to_string(),
            repository_url: "https://github.com/owner/repo".to_string(),
            config: json!({}),
        }
    }

    #[tokio::test]
    async fn test_replays_lines_then_completes() {
        let path = temp_log("ok", "{\"msg\":\"one\"}\n\n{\"msg\":\"two\",\"level\":40}\n");
        let mut stream = ReplayRunner::new(&path).run(request()).await.unwrap();

        let first = stream.messages.recv().await.unwrap().unwrap();
        let second = stream.messages.recv().await.unwrap().unwrap();
        assert_eq!(first.text(), "one");
        assert_eq!(second.text(), "two");
        assert!(stream.messages.recv().await.is_none());

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_bad_line_fails_stream() {
        let path = temp_log("bad", "{\"msg\":\"one\"}\nnot json\n{\"msg\":\"never\"}\n");
        let mut stream = ReplayRunner::new(&path).run(request()).await.unwrap();

        assert!(stream.messages.recv().await.unwrap().is_ok());
        let err = stream.messages.recv().await.unwrap().unwrap_err();
        assert!(matches!(err, StreamError::Failed(ref m) if m.starts_with("line 2:")));
        assert!(stream.messages.recv().await.is_none());

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_runner_error() {
        let result = ReplayRunner::new("/nonexistent/renovate.ndjson")
            .run(request())
            .await;
        assert!(matches!(result, Err(RunnerError::IoError(_))));
    }

    #[tokio::test]
    async fn test_close_stops_reader() {
        let path = temp_log("slow", "{\"msg\":\"one\"}\n{\"msg\":\"two\"}\n{\"msg\":\"three\"}\n");
        let mut stream = ReplayRunner::new(&path)
            .with_delay(Duration::from_secs(30))
            .run(request())
            .await
            .unwrap();

        assert!(stream.messages.recv().await.unwrap().is_ok());
        stream.handle.close();
        assert!(stream.messages.recv().await.is_none());

        std::fs::remove_file(path).ok();
    }
}

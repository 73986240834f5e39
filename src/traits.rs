use crate::model::LogMessage;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Failure reported by a live log stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("{0}")]
    Failed(String),
    #[error("Unknown error")]
    Unknown,
}

/// Failure to start a job at all.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to start job: {0}")]
    Launch(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One item of a live log stream. The stream completes when the channel
/// closes.
pub type StreamEvent = Result<LogMessage, StreamError>;

/// What the job runner needs to start a run.
#[derive(Clone)]
pub struct RunRequest {
    pub token: String,
    pub repository_url: String,
    pub config: Value,
}

impl std::fmt::Debug for RunRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunRequest")
            .field("token", &"<redacted>")
            .field("repository_url", &self.repository_url)
            .field("config", &self.config)
            .finish()
    }
}

/// Cancels a running job.
pub trait RunHandle: Send {
    fn close(&mut self);
}

/// A started job: its cancel handle and its live messages.
pub struct RunStream {
    pub handle: Box<dyn RunHandle>,
    pub messages: mpsc::Receiver<StreamEvent>,
}

impl std::fmt::Debug for RunStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunStream").finish_non_exhaustive()
    }
}

#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Returns the runner identifier used in logs (e.g., "replay").
    fn name(&self) -> &str;

    /// Starts a dependency-update job and returns its live stream.
    async fn run(&self, request: RunRequest) -> Result<RunStream, RunnerError>;
}

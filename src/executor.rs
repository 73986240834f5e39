use crate::config::PlaygroundConfig;
use crate::model::{Dependency, LogEntry};
use crate::session::SessionState;
use crate::traits::{JobRunner, RunHandle, RunRequest, StreamEvent};
use crate::validate::{FormErrors, RunForm};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

#[derive(Error, Debug)]
pub enum PlaygroundError {
    #[error(transparent)]
    InvalidForm(#[from] FormErrors),
}

/// How a start request ended. Failures after validation are reported in the
/// log view, not as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    ConfigRejected,
    LaunchFailed,
}

/// Point-in-time copy of what the session displays.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub logs: Vec<LogEntry>,
    pub dependencies: Vec<Dependency>,
    pub running: bool,
}

struct ActiveRun {
    handle: Box<dyn RunHandle>,
    consumer: Option<JoinHandle<()>>,
}

/// Session controller: owns one job runner and at most one live run.
///
/// Starting a run always tears down the previous one first: its handle is
/// closed and its consumer task aborted, exactly once.
pub struct Playground<R>
where
    R: JobRunner,
{
    runner: R,
    config: PlaygroundConfig,
    state: Arc<Mutex<SessionState>>,
    active: Option<ActiveRun>,
}

impl<R> Playground<R>
where
    R: JobRunner,
{
    pub fn new(runner: R, config: PlaygroundConfig) -> Self {
        let state = SessionState::new(config.default_datasource.clone(), config.scroll_threshold_px);
        Self {
            runner,
            config,
            state: Arc::new(Mutex::new(state)),
            active: None,
        }
    }

    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }

    /// Validates the form and, if it passes, launches a run.
    ///
    /// # Errors
    ///
    /// Returns [`PlaygroundError::InvalidForm`] without touching the current
    /// session when any field fails validation.
    pub async fn start(&mut self, form: &RunForm) -> Result<StartOutcome, PlaygroundError> {
        form.validate()?;
        Ok(self
            .launch(&form.repository_url, &form.token, &form.config_text)
            .await)
    }

    /// Tears down any previous run, resets the session and starts a new job.
    ///
    /// A config that is not valid JSON, or a runner that cannot start, is
    /// reported as a single error entry and leaves the session idle.
    #[instrument(skip(self, token, config_text))]
    pub async fn launch(
        &mut self,
        repository_url: &str,
        token: &str,
        config_text: &str,
    ) -> StartOutcome {
        self.stop();

        let generation = {
            let mut state = self.state.lock();
            let generation = state.reset();
            state.set_running(true);
            generation
        };

        let config = match serde_json::from_str::<serde_json::Value>(config_text) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Rejected Renovate config");
                let mut state = self.state.lock();
                state.push_error(format!("Error parsing Renovate config: {e}"));
                state.set_running(false);
                return StartOutcome::ConfigRejected;
            }
        };

        let request = RunRequest {
            token: token.to_string(),
            repository_url: repository_url.to_string(),
            config,
        };

        let stream = match self.runner.run(request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Job runner failed to start");
                let mut state = self.state.lock();
                state.push_error(format!("Error: {e}"));
                state.set_running(false);
                return StartOutcome::LaunchFailed;
            }
        };

        info!(generation, runner = self.runner.name(), "Run started");
        let consumer = tokio::spawn(consume(
            Arc::clone(&self.state),
            generation,
            stream.messages,
        ));
        self.active = Some(ActiveRun {
            handle: stream.handle,
            consumer: Some(consumer),
        });
        StartOutcome::Started
    }

    /// Closes the active run's handle, drops its subscription and marks the
    /// session idle.
    pub fn stop(&mut self) {
        if let Some(mut run) = self.active.take() {
            if let Some(consumer) = run.consumer.take() {
                consumer.abort();
            }
            run.handle.close();
            debug!("Previous run torn down");
        }
        self.state.lock().set_running(false);
    }

    /// Waits until the active run's stream finishes.
    ///
    /// The consumer stays owned by the active run while waiting, so dropping
    /// this future early still leaves it to [`stop`](Self::stop).
    pub async fn wait(&mut self) {
        let Some(consumer) = self.active.as_mut().and_then(|run| run.consumer.as_mut()) else {
            return;
        };
        let result = consumer.await;
        if let Some(run) = self.active.as_mut() {
            run.consumer = None;
        }
        if let Err(e) = result {
            if !e.is_cancelled() {
                warn!(error = %e, "Log consumer task failed");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().is_running()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        SessionSnapshot {
            logs: state.logs().to_vec(),
            dependencies: state.dependencies().to_vec(),
            running: state.is_running(),
        }
    }

    /// Feeds the log view's scroll position to the auto-scroll tracker.
    pub fn report_scroll(&self, scroll_top: u32, client_height: u32, scroll_height: u32) {
        self.state
            .lock()
            .scroll_mut()
            .on_scroll(scroll_top, client_height, scroll_height);
    }

    pub fn should_auto_scroll(&self) -> bool {
        self.state.lock().should_auto_scroll()
    }
}

impl<R> Drop for Playground<R>
where
    R: JobRunner,
{
    fn drop(&mut self) {
        self.stop();
    }
}

/// Drains one run's stream into the shared state, one message at a time.
async fn consume(
    state: Arc<Mutex<SessionState>>,
    generation: u64,
    mut messages: mpsc::Receiver<StreamEvent>,
) {
    while let Some(event) = messages.recv().await {
        match event {
            Ok(message) => {
                if !state.lock().apply_message(generation, message) {
                    return;
                }
            }
            Err(e) => {
                warn!(error = %e, "Log stream failed");
                state.lock().apply_error(generation, &e);
                return;
            }
        }
    }
    info!(generation, "Log stream completed");
    state.lock().apply_complete(generation);
}

//! Session controller - engine lifetime, streaming and the shutdown sequence

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use contracts::{ContractError, EngineResources, FrameSource, ShutdownToken, TrackingEngine};
use ingestion::{FrameGrabber, IngestionMetrics, IngestionSnapshot, Subscription, SubscriptionConfig};
use tracing::{error, info, instrument, warn};

use crate::error::{Result, SessionError};
use crate::output::{self, OutputFileSet, DEFAULT_OUTPUT_ROOT};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Streaming,
    Stopping,
    Exporting,
    Terminated,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Streaming => "streaming",
            Self::Stopping => "stopping",
            Self::Exporting => "exporting",
            Self::Terminated => "terminated",
        }
    }

    /// Position in the lifecycle
    pub fn index(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Files the engine is loaded from
    pub resources: EngineResources,

    /// Base directory for output sessions
    pub output_root: PathBuf,

    pub subscription: SubscriptionConfig,
}

impl SessionConfig {
    pub fn new(resources: EngineResources) -> Self {
        Self {
            resources,
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            subscription: SubscriptionConfig::default(),
        }
    }
}

/// Result of a completed session
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub files: OutputFileSet,
    pub ingestion: IngestionSnapshot,
    pub streaming_duration: Duration,
}

/// Owns the engine for the whole session and drives
/// `Idle -> Streaming -> Stopping -> Exporting -> Terminated`.
///
/// The subscription's adapter only holds a weak handle; it is released
/// in `stop` before the engine is shut down.
pub struct SessionController<E: TrackingEngine + 'static> {
    config: SessionConfig,
    state: SessionState,
    engine: Option<Arc<E>>,
    subscription: Option<Subscription>,
    metrics: Arc<IngestionMetrics>,
    ingestion: IngestionSnapshot,
    streaming_since: Option<Instant>,
    streaming_duration: Duration,
}

impl<E: TrackingEngine + 'static> SessionController<E> {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            engine: None,
            subscription: None,
            metrics: Arc::new(IngestionMetrics::new()),
            ingestion: IngestionSnapshot::default(),
            streaming_since: None,
            streaming_duration: Duration::ZERO,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn engine(&self) -> Option<&Arc<E>> {
        self.engine.as_ref()
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    fn transition(&mut self, from: SessionState, to: SessionState) -> Result<()> {
        if self.state != from {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.enter(to);
        Ok(())
    }

    fn enter(&mut self, to: SessionState) {
        info!(from = %self.state, to = %to, "session state changed");
        self.state = to;
        observability::record_session_state(to.as_str(), to.index());
    }

    /// Load the engine and subscribe the frame grabber to `source`
    ///
    /// # Errors
    /// `EngineLoad` if the loader fails, `Subscribe` if the delivery thread
    /// cannot be started. Both leave the controller `Terminated`.
    #[instrument(name = "session_start", skip_all, fields(topic = %self.config.subscription.topic))]
    pub fn start<L>(&mut self, loader: L, source: Box<dyn FrameSource>) -> Result<()>
    where
        L: FnOnce(&EngineResources) -> std::result::Result<E, ContractError>,
    {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: SessionState::Streaming,
            });
        }

        let engine = match loader(&self.config.resources) {
            Ok(engine) => Arc::new(engine),
            Err(e) => {
                error!(error = %e, "failed to load engine");
                self.enter(SessionState::Terminated);
                return Err(SessionError::EngineLoad(e));
            }
        };

        let grabber = FrameGrabber::new(&engine, self.metrics.clone());
        let subscription = match Subscription::subscribe(
            self.config.subscription.clone(),
            source,
            grabber,
            self.metrics.clone(),
        ) {
            Ok(subscription) => subscription,
            Err(e) => {
                error!(error = %e, "failed to subscribe");
                engine.shutdown();
                self.enter(SessionState::Terminated);
                return Err(e.into());
            }
        };

        self.engine = Some(engine);
        self.subscription = Some(subscription);
        self.streaming_since = Some(Instant::now());
        self.transition(SessionState::Idle, SessionState::Streaming)
    }

    /// Wait until a signal, a transport stop request or the timeout cancels `token`
    pub async fn wait_for_shutdown(&self, token: &ShutdownToken) {
        info!("streaming, waiting for shutdown request");
        token.cancelled().await;
        info!("shutdown requested");
    }

    /// Unsubscribe, then stop the engine and wait for its threads
    #[instrument(name = "session_stop", skip_all)]
    pub fn stop(&mut self) -> Result<IngestionSnapshot> {
        self.transition(SessionState::Streaming, SessionState::Stopping)?;
        let started = Instant::now();

        if let Some(since) = self.streaming_since.take() {
            self.streaming_duration = since.elapsed();
        }

        // delivery has ceased and the adapter's engine handle is gone after this
        if let Some(subscription) = self.subscription.take() {
            self.ingestion = subscription.unsubscribe();
        }

        if let Some(engine) = &self.engine {
            engine.shutdown();
        }

        observability::record_phase_duration_ms("stop", started.elapsed().as_secs_f64() * 1000.0);
        info!(
            streaming_secs = self.streaming_duration.as_secs_f64(),
            delivered = self.ingestion.delivered,
            "engine stopped"
        );
        Ok(self.ingestion)
    }

    /// Create the timestamped session directory and its artifacts
    ///
    /// On failure the controller is `Terminated` and export is skipped.
    #[instrument(name = "session_prepare_output", skip_all, fields(root = %self.config.output_root.display()))]
    pub fn prepare_output(&mut self, now: &DateTime<Local>) -> Result<OutputFileSet> {
        if self.state != SessionState::Stopping {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: SessionState::Exporting,
            });
        }
        let started = Instant::now();

        match output::prepare(&self.config.output_root, now) {
            Ok(files) => {
                observability::record_phase_duration_ms(
                    "prepare",
                    started.elapsed().as_secs_f64() * 1000.0,
                );
                self.enter(SessionState::Exporting);
                Ok(files)
            }
            Err(e) => {
                warn!("output preparation failed, export skipped");
                self.enter(SessionState::Terminated);
                Err(e)
            }
        }
    }

    /// Ask the engine to write its three artifacts
    ///
    /// Engine-reported failures are logged; they do not fail the session.
    #[instrument(name = "session_export", skip_all)]
    pub fn export(&mut self, files: &OutputFileSet) -> Result<()> {
        if self.state != SessionState::Exporting {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: SessionState::Terminated,
            });
        }
        let started = Instant::now();

        if let Some(engine) = &self.engine {
            let report = |artifact: &'static str,
                          path: &Path,
                          result: std::result::Result<(), ContractError>| {
                observability::record_export(artifact, result.is_ok());
                if let Err(e) = result {
                    error!(artifact, path = %path.display(), error = %e, "export failed");
                }
            };
            report(
                "trajectory",
                &files.trajectory,
                engine.save_keyframe_trajectory(&files.trajectory),
            );
            report(
                "images",
                &files.images,
                engine.save_keypoints_and_map_points(&files.images),
            );
            report("points", &files.points, engine.save_point_cloud(&files.points));
        }

        observability::record_phase_duration_ms("export", started.elapsed().as_secs_f64() * 1000.0);
        self.transition(SessionState::Exporting, SessionState::Terminated)
    }

    /// Run a whole session: start, stream until `token` is cancelled, then
    /// stop, prepare the output directory and export
    ///
    /// The blocking shutdown sequence runs on the blocking thread pool.
    pub async fn run<L>(
        mut self,
        loader: L,
        source: Box<dyn FrameSource>,
        token: ShutdownToken,
    ) -> Result<SessionReport>
    where
        L: FnOnce(&EngineResources) -> std::result::Result<E, ContractError>,
    {
        self.start(loader, source)?;
        self.wait_for_shutdown(&token).await;

        tokio::task::spawn_blocking(move || {
            let ingestion = self.stop()?;
            let files = self.prepare_output(&Local::now())?;
            self.export(&files)?;
            Ok(SessionReport {
                files,
                ingestion,
                streaming_duration: self.streaming_duration,
            })
        })
        .await?
    }
}

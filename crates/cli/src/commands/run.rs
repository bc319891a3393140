//! Session command implementation.

use std::time::Duration;

use contracts::{EngineResources, ShutdownToken};
use engine::{RecordingConfig, RecordingEngine};
use ingestion::{MockFrameConfig, MockFrameSource, SubscriptionConfig};
use session::{SessionConfig, SessionController, SessionReport};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::error::Result;

/// Run one session until a signal, the timeout or the camera ends the stream
pub async fn run_session(cli: &Cli) -> Result<SessionReport> {
    let resources = EngineResources::new(&cli.vocabulary, &cli.settings);
    info!(
        vocabulary = %resources.vocabulary.display(),
        settings = %resources.settings.display(),
        topic = %cli.topic,
        output_dir = %cli.output_dir.display(),
        "Starting session"
    );

    let token = ShutdownToken::new();
    spawn_shutdown_triggers(&token, cli.timeout);

    let camera = MockFrameConfig {
        topic: cli.topic.clone(),
        frequency_hz: cli.fps,
        width: cli.width,
        height: cli.height,
        max_frames: (cli.max_frames != 0).then_some(cli.max_frames),
        ..Default::default()
    };
    info!(
        fps = camera.frequency_hz,
        width = camera.width,
        height = camera.height,
        "Running with mock camera"
    );
    let source = MockFrameSource::new(camera).with_stop_request(token.clone());

    let config = SessionConfig {
        resources,
        output_root: cli.output_dir.clone(),
        subscription: SubscriptionConfig::new(&cli.topic, 1),
    };
    let engine_config = RecordingConfig {
        keyframe_interval: cli.keyframe_interval,
    };

    let report = SessionController::new(config)
        .run(
            move |resources| RecordingEngine::load(resources, engine_config),
            Box::new(source),
            token,
        )
        .await?;

    info!(
        received = report.ingestion.received,
        delivered = report.ingestion.delivered,
        streaming_secs = report.streaming_duration.as_secs_f64(),
        "Session completed successfully"
    );
    print_summary(&report);

    Ok(report)
}

/// Cancel `token` on Ctrl+C, SIGTERM or after `timeout_secs` (0 = never)
fn spawn_shutdown_triggers(token: &ShutdownToken, timeout_secs: u64) {
    tokio::spawn({
        let token = token.clone();
        async move {
            setup_shutdown_signal().await;
            warn!("Received shutdown signal, stopping session...");
            token.cancel();
        }
    });

    if timeout_secs > 0 {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
            info!(timeout_secs, "Timeout reached, stopping session...");
            token.cancel();
        });
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print session summary
fn print_summary(report: &SessionReport) {
    let ingestion = &report.ingestion;
    println!("\n=== Session Summary ===\n");
    println!("Streaming: {:.2}s", report.streaming_duration.as_secs_f64());
    println!("Frames:");
    println!("  Received:          {}", ingestion.received);
    println!("  Replaced in queue: {}", ingestion.replaced);
    println!("  Delivered:         {}", ingestion.delivered);
    println!("  Conversion errors: {}", ingestion.conversion_errors);
    println!("  Tracked / lost:    {} / {}", ingestion.tracked, ingestion.lost);
    println!("\nOutput:");
    for path in report.files.iter() {
        println!("  - {}", path.display());
    }
    println!();
}

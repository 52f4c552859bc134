//! CLI entrypoint for research-beacon
//!
//! Wires the layers together: configuration, the HTTP gateway, the
//! WebSocket push channel, the session controller, and the console
//! presenter.

use anyhow::{Context, Result};
use beacon_application::{BackendGateway, ControllerState, SessionController, TrackerEvent};
use beacon_domain::project_history;
use beacon_infrastructure::{ConfigLoader, FileConfig, HttpBackendGateway, WebSocketPushChannel};
use beacon_presentation::{Cli, Command, ConsolePresenter, render_history};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|err| anyhow::anyhow!("failed to load configuration: {}", err))?
    };

    let gateway = Arc::new(
        HttpBackendGateway::new(&config.backend.base_url, config.backend.request_timeout())
            .context("failed to build HTTP client")?,
    );

    match &cli.command {
        Command::Run { query, .. } => {
            let options = cli.command.start_options();
            let query = query.clone();
            track_session(gateway, &config, &cli, |controller| async move {
                let mut controller = controller;
                controller.start(&query, options).await?;
                Ok(controller)
            })
            .await
        }
        Command::Resume { session_id } => {
            let session_id = session_id.clone();
            track_session(gateway, &config, &cli, |controller| async move {
                let mut controller = controller;
                controller.resume(&session_id).await?;
                Ok(controller)
            })
            .await
        }
        Command::History { page, limit } => {
            let limit = limit.unwrap_or(config.tracker.history_page_size);
            let history = gateway
                .list_history(*page, limit)
                .await
                .context("failed to fetch history")?;
            render_history(&project_history(&history));
            Ok(())
        }
        Command::Cancel { session_id } => {
            gateway
                .cancel_session(session_id)
                .await
                .context("cancel request failed")?;
            println!("cancellation requested for {}", session_id);
            Ok(())
        }
    }
}

type Controller = SessionController<HttpBackendGateway, WebSocketPushChannel>;

/// Build a controller, attach it with `attach`, then drive it to a terminal
/// outcome while rendering events and honoring Ctrl-C as cooperative cancel.
async fn track_session<F, Fut>(
    gateway: Arc<HttpBackendGateway>,
    config: &FileConfig,
    cli: &Cli,
    attach: F,
) -> Result<()>
where
    F: FnOnce(Controller) -> Fut,
    Fut: Future<Output = Result<Controller, beacon_application::ControllerError>>,
{
    let push = Arc::new(WebSocketPushChannel::new(config.backend.websocket_base()));
    let (tx, mut rx) = mpsc::unbounded_channel::<TrackerEvent>();

    let controller = SessionController::new(gateway, push, tx)
        .with_poll_interval(config.tracker.poll_interval());

    let quiet = cli.quiet;
    let verbose = cli.verbose > 0;
    let renderer = tokio::spawn(async move {
        let mut presenter = ConsolePresenter::new()
            .with_progress(!quiet)
            .with_verbose(verbose);
        while let Some(event) = rx.recv().await {
            presenter.handle(&event);
        }
    });

    let mut controller = attach(controller).await.context("failed to attach")?;

    if controller.state() != ControllerState::Terminated {
        let cancel = controller.cancel_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("cancellation requested");
                cancel.cancel();
            }
        });

        controller
            .run_until_terminal()
            .await
            .context("session tracking ended unexpectedly")?;
    }

    // Dropping the controller closes the event stream so the renderer drains
    // and exits.
    drop(controller);
    let _ = renderer.await;
    Ok(())
}

//! callbell CLI entry point.
//!
//! Provides `start`, `check`, and `send-test` subcommands for running the
//! notifier, validating a configuration, or posting a test message.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use callbell::config::{load_config, resolve_config_path, BellConfig};
use callbell::esl::{EslConnection, SUBSCRIBED_EVENTS};
use callbell::listener::Listener;
use callbell::logging;
use callbell::router::{Notification, Router, Target};
use callbell::webhook::{Notifier, WebhookNotifier};

/// callbell: call-state notifications for chat.
#[derive(Parser)]
#[command(name = "callbell", version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, short, global = true, env = "CALLBELL_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Connect to the switch and post notifications until the stream ends.
    Start,
    /// Validate the configuration and exit.
    Check {
        /// Also authenticate against the event socket.
        #[arg(long)]
        connect: bool,
    },
    /// Post a test notification through the webhook.
    SendTest {
        /// Extension whose chat user should receive the message.
        #[arg(long)]
        to: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    load_dotenv()?;

    let config_path = resolve_config_path(cli.config.as_deref())?;
    let config = load_config(&config_path)?;

    match cli.command {
        Command::Start => handle_start(&config, &config_path).await,
        Command::Check { connect } => handle_check(&config, &config_path, connect).await,
        Command::SendTest { to } => handle_send_test(&config, to.as_deref()).await,
    }
}

/// Load a `.env` from the working directory if one exists.
fn load_dotenv() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).context("failed to load .env"),
    }
}

/// Run the notifier until the event stream ends.
async fn handle_start(config: &BellConfig, config_path: &Path) -> anyhow::Result<()> {
    let _logging_guard = match &config.logging.dir {
        Some(dir) => Some(logging::init_production(dir, &config.logging.level)?),
        None => {
            logging::init_cli(&config.logging.level);
            None
        }
    };

    info!(
        config = %config_path.display(),
        extensions = config.extensions.len(),
        "callbell starting"
    );
    if !config.notify.notify_caller {
        info!("caller notifications disabled");
    }

    let notifier = build_notifier(config)?;
    let router = Router::new(config.directory(), config.routing_options());

    let mut conn = connect(config).await?;
    conn.subscribe(config.esl.format, SUBSCRIBED_EVENTS)
        .await
        .context("event subscription failed")?;

    let listener = Listener::new(router, notifier);
    listener
        .run(&mut conn)
        .await
        .context("event stream failed")?;

    info!("callbell stopped");
    Ok(())
}

/// Validate the configuration and optionally test the event socket login.
async fn handle_check(
    config: &BellConfig,
    config_path: &Path,
    connect_esl: bool,
) -> anyhow::Result<()> {
    logging::init_cli(&config.logging.level);

    let options = config.routing_options();
    info!(
        config = %config_path.display(),
        esl = %format!("{}:{}", config.esl.host, config.esl.port),
        format = config.esl.format.as_str(),
        extensions = config.extensions.len(),
        notify_caller = options.notify_caller,
        panel = ?options.panel,
        "configuration valid"
    );

    if connect_esl {
        let conn = connect(config).await?;
        info!(addr = conn.addr(), "event socket login ok");
        if let Err(e) = conn.disconnect().await {
            warn!(error = %e, "event socket did not close cleanly");
        }
    }

    Ok(())
}

/// Post a single test notification.
async fn handle_send_test(config: &BellConfig, extension: Option<&str>) -> anyhow::Result<()> {
    logging::init_cli(&config.logging.level);

    let target = match extension {
        Some(ext) => {
            let user = config
                .directory()
                .lookup(ext)
                .map(str::to_owned)
                .ok_or_else(|| anyhow::anyhow!("extension {ext} is not in [extensions]"))?;
            Target::User(user)
        }
        None => Target::Default,
    };

    let notification = Notification {
        target,
        text: format!(
            ":bell: ***Test Notification***\n\t\tcallbell {} is able to post here",
            env!("CARGO_PKG_VERSION")
        ),
    };

    build_notifier(config)?
        .notify(&notification)
        .await
        .context("test notification was not delivered")?;

    info!(destination = ?notification.target, "test notification delivered");
    Ok(())
}

fn build_notifier(config: &BellConfig) -> anyhow::Result<WebhookNotifier> {
    WebhookNotifier::new(
        config.webhook.url.clone(),
        config.webhook.icon.clone(),
        config.webhook.username.clone(),
        Duration::from_secs(config.webhook.timeout_secs),
    )
    .context("failed to build webhook client")
}

async fn connect(config: &BellConfig) -> anyhow::Result<EslConnection> {
    let password = config.esl.resolve_password()?;
    EslConnection::connect(
        &config.esl.host,
        config.esl.port,
        &password,
        Duration::from_secs(config.esl.connect_timeout_secs),
    )
    .await
    .with_context(|| {
        format!(
            "could not connect to event socket at {}:{}",
            config.esl.host, config.esl.port
        )
    })
}

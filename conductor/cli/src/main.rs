//! chat-stream - Terminal Front End for the Chat Conductor
//!
//! Sends messages to the streaming chat service and prints the reply as it
//! arrives.
//!
//! # Usage
//!
//! ```bash
//! # One exchange
//! chat-stream "What should I learn to become a backend engineer?"
//!
//! # Interactive: one exchange per line read from stdin
//! chat-stream
//!
//! # Different service, whole replies only
//! chat-stream --endpoint http://chat.internal:9000 --no-stream "Hello"
//!
//! # Verbose logging (to stderr)
//! RUST_LOG=debug chat-stream "Hello"
//! ```
//!
//! # Signals
//!
//! - `SIGINT` (Ctrl-C): Abandon the reply in flight; exits when idle

mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use chat_conductor::{
    load_config, load_config_from_path, ChatTransport, ChatUpdate, Conductor, ConfigOverrides,
    HttpTransport, RejectReason, SessionOutcome,
};

use render::TerminalRenderer;

/// chat-stream - Talk to the streaming chat service from a terminal
#[derive(Parser, Debug)]
#[command(name = "chat-stream")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base URL of the chat service
    #[arg(short = 'e', long, value_name = "URL")]
    endpoint: Option<String>,

    /// User id sent with every message
    #[arg(short = 'u', long, value_name = "ID")]
    user_id: Option<String>,

    /// Timeout in seconds for non-streaming and health requests
    #[arg(short = 't', long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "CHAT_CONDUCTOR_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Wait for the whole reply instead of streaming it
    #[arg(long)]
    no_stream: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "CHAT_CONDUCTOR_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Message to send; lines are read from stdin when omitted
    message: Vec<String>,
}

/// Initialize logging with the specified level
///
/// Logs go to stderr so they never interleave with the rendered reply.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "chat_stream={level},chat_conductor={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Print updates until the Conductor goes away
async fn render_updates(mut rx: mpsc::Receiver<ChatUpdate>) -> std::io::Result<()> {
    let mut renderer = TerminalRenderer::new();
    let mut stdout = tokio::io::stdout();

    while let Some(update) = rx.recv().await {
        if let Some(text) = renderer.render(&update) {
            stdout.write_all(text.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

/// Run one exchange; Ctrl-C abandons it
async fn exchange<T: ChatTransport>(
    conductor: &mut Conductor<T>,
    text: &str,
    no_stream: bool,
) -> Result<SessionOutcome, RejectReason> {
    let cancel = conductor.cancel_handle();

    let session = async {
        if no_stream {
            conductor.send_without_streaming(text).await
        } else {
            conductor.send_message(text).await
        }
    };
    tokio::pin!(session);

    tokio::select! {
        result = &mut session => result,
        _ = signal::ctrl_c() => {
            info!("Interrupted, abandoning reply");
            cancel.cancel();
            session.await
        }
    }
}

/// Log an exchange's outcome; a failure sticks for the exit code
fn record_outcome(outcome: &SessionOutcome, failed: &mut bool) {
    *failed |= matches!(outcome, SessionOutcome::Failed { .. });

    match outcome {
        SessionOutcome::Completed { stats, .. } => {
            debug!(chunks = stats.chunks, bytes = stats.bytes, "Exchange completed");
        }
        SessionOutcome::Failed { error } => warn!(error = %error, "Exchange failed"),
        SessionOutcome::Abandoned { .. } => info!("Exchange abandoned"),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logging(&args.log_level);

    // Configuration: file / environment, then command line
    let mut config = match args.config {
        Some(ref path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(ref url) = args.endpoint {
        overrides = overrides.with_base_url(url.clone());
    }
    if let Some(ref user_id) = args.user_id {
        overrides = overrides.with_user_id(user_id.clone());
    }
    if let Some(secs) = args.timeout {
        overrides = overrides.with_request_timeout_secs(secs);
    }
    overrides
        .apply(&mut config)
        .context("Invalid command-line options")?;

    info!(
        source = %config.source(),
        base_url = %config.base_url,
        "Configuration loaded"
    );

    let transport = HttpTransport::from_config(&config).context("Failed to create HTTP client")?;
    let (tx, rx) = mpsc::channel(config.update_channel_capacity);
    let mut conductor = Conductor::new(transport, config, tx);

    let renderer = tokio::spawn(render_updates(rx));

    conductor.start().await;

    let mut failed = false;

    if args.message.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line.context("Failed to read stdin")?,
                _ = signal::ctrl_c() => None,
            };
            let Some(line) = line else { break };

            match exchange(&mut conductor, &line, args.no_stream).await {
                Ok(outcome) => record_outcome(&outcome, &mut failed),
                Err(RejectReason::EmptyInput) => {}
                Err(reason) => warn!(%reason, "Message not sent"),
            }
        }
    } else {
        let text = args.message.join(" ");
        match exchange(&mut conductor, &text, args.no_stream).await {
            Ok(outcome) => record_outcome(&outcome, &mut failed),
            Err(reason) => anyhow::bail!("Message not sent: {reason}"),
        }
    }

    // Closing the update channel lets the renderer finish
    drop(conductor);
    renderer.await.context("Renderer task panicked")??;

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

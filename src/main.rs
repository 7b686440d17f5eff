use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use time::OffsetDateTime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transcribe_stream::{
    ClientConfig,
    adapters::{WavFileCapture, WebSocketConnector},
    core::session::{ChannelObserver, ObserverEvent, SessionRunner},
    core::signer::{presign_url, redact_query},
};

/// Real-time speech-to-text client for Amazon Transcribe Streaming
#[derive(Parser, Debug)]
#[command(name = "transcribe-stream")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a presigned streaming URL
    Sign,

    /// Stream a WAV file and print transcripts
    Stream {
        /// WAV file to transcribe
        #[arg(short = 'w', long = "wav", value_name = "FILE")]
        wav: PathBuf,

        /// Length of each audio chunk in milliseconds
        #[arg(long = "chunk-ms", default_value_t = 100)]
        chunk_ms: u64,

        /// Send audio as fast as possible instead of in real time
        #[arg(long = "fast")]
        fast: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Must be installed before the first TLS handshake
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = cli.config {
        info!("Loading configuration from {}", config_path.display());
        ClientConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ClientConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    match cli.command {
        Commands::Sign => sign(&config),
        Commands::Stream {
            wav,
            chunk_ms,
            fast,
        } => stream(&config, wav, Duration::from_millis(chunk_ms.max(1)), fast).await,
    }
}

fn sign(config: &ClientConfig) -> anyhow::Result<()> {
    let session_config = config.session_config();
    let url = presign_url(
        &session_config.signable_request(),
        &config.credentials(),
        OffsetDateTime::now_utc(),
    )?;

    info!(
        "Signed {} for {} s",
        redact_query(&url),
        session_config.expires_seconds
    );
    println!("{url}");
    Ok(())
}

async fn stream(
    config: &ClientConfig,
    wav: PathBuf,
    chunk_duration: Duration,
    fast: bool,
) -> anyhow::Result<()> {
    let session_config = config.session_config();
    info!(
        "Transcribing {} as {} at {} Hz via {}",
        wav.display(),
        session_config.language_code,
        session_config.sample_rate,
        session_config.host()
    );

    let capture = WavFileCapture::new(wav)
        .with_chunk_duration(chunk_duration)
        .with_realtime(!fast);
    let (observer, mut results) = ChannelObserver::new();
    let runner = SessionRunner::new(
        session_config,
        config.credentials(),
        WebSocketConnector::new(),
        capture,
        observer,
    );

    let handle = runner.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, finishing stream");
            handle.stop();
        }
    });

    let printer = tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        let mut error = None;
        let mut normal = false;

        while let Some(event) = results.recv().await {
            match event {
                ObserverEvent::Result { text, is_partial } => {
                    if is_partial {
                        let _ = write!(stdout, "\r\x1b[2K{text}");
                    } else {
                        let _ = writeln!(stdout, "\r\x1b[2K{text}");
                    }
                    let _ = stdout.flush();
                }
                ObserverEvent::Error(message) => {
                    warn!("Stream error: {message}");
                    error = Some(message);
                }
                ObserverEvent::Closed { normal: closed_normally } => {
                    normal = closed_normally;
                    break;
                }
            }
        }
        let _ = writeln!(stdout);
        (normal, error)
    });

    let session = runner.run().await;
    // Dropping the session drops the observer and ends the printer loop.
    let frames_sent = session.audio_frames_sent();
    let final_state = session.state();
    drop(session);

    let (normal, error) = printer
        .await
        .map_err(|e| anyhow!("Result printer failed: {e}"))?;

    info!("Session {final_state} after {frames_sent} audio frames");

    match error {
        Some(message) => Err(anyhow!(message)),
        None if !normal => Err(anyhow!("Stream closed abnormally")),
        None => Ok(()),
    }
}

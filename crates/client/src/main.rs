//! `vidgen` -- generate a video through the edge server.
//!
//! Submits a prompt (and optionally a reference image), waits for the job
//! to finish and saves every produced video into the output directory.
//! Ctrl-C stops the wait.
//!
//! # Environment variables
//!
//! | Variable            | Required | Default                 | Description                  |
//! |---------------------|----------|-------------------------|------------------------------|
//! | `VIDGEN_SERVER_URL` | no       | `http://localhost:3000` | Edge server base URL         |
//! | `RUST_LOG`          | no       | `vidgen_client=info`    | Log filter                   |

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidgen_core::classify::ErrorKind;
use vidgen_core::generation::{mime_type_for_path, GenerationRequest, ReferenceImage};
use vidgen_core::polling::{DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};

use vidgen_client::api::RelayClient;
use vidgen_client::config::ClientConfig;
use vidgen_client::error::ClientError;
use vidgen_client::pipeline::{generate_video, RunConfig};
use vidgen_client::poller::PollConfig;

#[derive(Debug, Parser)]
#[command(name = "vidgen", about = "Generate a video from a text prompt")]
struct Cli {
    /// Text describing the video.
    #[arg(long)]
    prompt: String,

    /// Reference image that seeds the generation.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Directory the videos are written to.
    #[arg(long, default_value = ".")]
    output: PathBuf,

    /// Edge server base URL; overrides `VIDGEN_SERVER_URL`.
    #[arg(long)]
    server: Option<String>,

    /// Seconds between status checks.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    poll_interval_secs: u64,

    /// Status checks before giving up.
    #[arg(long, default_value_t = DEFAULT_MAX_POLL_ATTEMPTS)]
    max_attempts: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidgen_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match cli.server {
        Some(url) => ClientConfig::new(url),
        None => ClientConfig::from_env(),
    };

    let mut request = GenerationRequest::new(cli.prompt);
    if let Some(path) = &cli.image {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        request = request.with_reference_image(ReferenceImage::from_bytes(
            &bytes,
            mime_type_for_path(path),
        ));
    }

    let run_config = RunConfig {
        output_dir: cli.output,
        poll: PollConfig {
            interval: Duration::from_secs(cli.poll_interval_secs),
            max_attempts: cli.max_attempts,
            ..PollConfig::default()
        },
    };

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, cancelling");
            token.cancel();
        }
    });

    tracing::info!(server = %config.server_url, "Starting generation");
    let client = RelayClient::new(&config);
    let report = generate_video(&client, &request, &run_config, &cancel).await?;

    for artifact in &report.saved {
        println!("{}", artifact.path.display());
    }
    for (index, err) in &report.failed {
        eprintln!("Video {index} could not be downloaded: {}", err.friendly_message());
    }
    tracing::info!(
        operation = %report.operation_name,
        poll_attempts = report.poll_attempts,
        saved = report.saved.len(),
        failed = report.failed.len(),
        "Generation complete",
    );
    Ok(())
}

fn report(err: &anyhow::Error) {
    let Some(client_err) = err.downcast_ref::<ClientError>() else {
        eprintln!("Error: {err:#}");
        return;
    };
    let classified = client_err.classify();
    match classified.kind {
        ErrorKind::QuotaExceeded => {
            eprintln!("Quota exceeded: {}", classified.message);
            eprintln!("Please try again later.");
        }
        _ => eprintln!("Error: {}", classified.message),
    }
}

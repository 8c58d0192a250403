mod display;
mod state;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ctfsync_core::challenges_schema;
use ctfsync_provider::config::DEFAULT_TIMEOUT_SECS;
use ctfsync_provider::snapshot::DEFAULT_CONCURRENCY;
use ctfsync_provider::{ChallengeRead, ChallengeResource, ProviderConfig, ReadContext};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::display::{log_diagnostic, print_challenge_card, print_schema};
use crate::state::StateFile;

#[derive(Parser)]
#[command(name = "ctfsync", version, about = "Read the challenge catalog of a CTFd instance")]
struct Cli {
    /// CTFd instance root URL.
    #[arg(long, env = "CTFD_URL", global = true)]
    url: Option<String>,

    /// Admin API token.
    #[arg(long, env = "CTFD_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Admin session cookie, as an alternative to an API token.
    #[arg(long, env = "CTFD_SESSION", hide_env_values = true, global = true)]
    session: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "CTFSYNC_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout_secs: u64,

    /// Challenges hydrated in parallel.
    #[arg(long, env = "CTFSYNC_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY, global = true)]
    concurrency: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read every challenge.
    Challenges {
        /// Write the snapshot to this state file.
        #[arg(long)]
        state: Option<PathBuf>,
        /// Print JSON instead of cards.
        #[arg(long)]
        json: bool,
        /// On Ctrl-C, still print the challenges read so far.
        #[arg(long)]
        partial_on_cancel: bool,
    },
    /// Read a single challenge.
    Challenge {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Print the declared challenge schema.
    Schema,
}

impl Cli {
    fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            url: self.url.clone(),
            api_key: self.api_key.clone(),
            session: self.session.clone(),
            timeout_secs: self.timeout_secs,
            concurrency: self.concurrency,
        }
    }
}

/// A read context cancelled by Ctrl-C.
fn interruptible_context() -> ReadContext {
    let (ctx, cancel) = ReadContext::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling read");
            cancel.cancel();
        }
    });
    ctx
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("ctfsync v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Command::Challenges {
            state,
            json,
            partial_on_cancel,
        } => {
            let source = cli
                .provider_config()
                .data_source()
                .context("configuring the CTFd provider")?
                .partial_on_cancel(*partial_on_cancel);
            let read = source.read(&interruptible_context()).await;
            for diag in &read.diagnostics {
                log_diagnostic(diag);
            }

            if let Some(snapshot) = &read.snapshot {
                if *json {
                    println!("{}", serde_json::to_string_pretty(snapshot)?);
                } else {
                    for challenge in &snapshot.challenges {
                        print_challenge_card(challenge);
                    }
                }
                info!(
                    challenges = snapshot.challenges.len(),
                    diagnostics = read.diagnostics.len(),
                    "catalog read complete"
                );

                if let Some(path) = state {
                    if read.diagnostics.has_fatal() {
                        warn!(path = %path.display(), "read incomplete, state file left untouched");
                    } else {
                        StateFile::new(snapshot.clone(), read.diagnostics.clone())
                            .write(path)
                            .with_context(|| format!("writing state to {}", path.display()))?;
                        info!(path = %path.display(), "state written");
                    }
                }
            }

            if read.diagnostics.has_fatal() {
                anyhow::bail!("challenge catalog read failed");
            }
        }
        Command::Challenge { id, json } => {
            let id = match ChallengeResource::parse_import_id(id) {
                Ok(id) => id,
                Err(diag) => {
                    log_diagnostic(&diag);
                    anyhow::bail!("{}", diag.detail);
                }
            };
            let resource = cli
                .provider_config()
                .resource()
                .context("configuring the CTFd provider")?;

            match resource.read(&interruptible_context(), id).await {
                ChallengeRead::Found {
                    challenge,
                    diagnostics,
                } => {
                    for diag in &diagnostics {
                        log_diagnostic(diag);
                    }
                    if *json {
                        println!("{}", serde_json::to_string_pretty(&challenge)?);
                    } else {
                        print_challenge_card(&challenge);
                    }
                }
                ChallengeRead::Removed => {
                    warn!(challenge = %id, "challenge does not exist on the CTFd instance");
                }
                ChallengeRead::Cancelled(diagnostics) => {
                    for diag in &diagnostics {
                        log_diagnostic(diag);
                    }
                    anyhow::bail!("read of challenge {id} cancelled");
                }
            }
        }
        Command::Schema => print_schema(&challenges_schema()),
    }

    Ok(())
}

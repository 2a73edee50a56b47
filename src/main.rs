//! LLM Gateway
//!
//! Command-line front end for the multi-provider text-generation gateway.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use llm_gateway::{
    config::{LogFormat, Settings},
    services::{backend_pool::ProcessEnv, Gateway, GenerateRequest, HealthSnapshot, ProviderRegistry},
    GatewayError,
};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// LLM Gateway
///
/// Routes text-generation requests across pooled provider credentials.
#[derive(Parser, Debug)]
#[command(name = "llm-gateway")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error (overrides LOG_LEVEL env var)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format (overrides LOG_FORMAT env var)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the credential health snapshot
    Status {
        /// Emit the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate text for one prompt
    Generate {
        #[arg(short, long)]
        prompt: String,

        /// System instruction
        #[arg(short, long)]
        system: Option<String>,

        #[arg(long)]
        max_tokens: Option<u32>,

        #[arg(long)]
        temperature: Option<f32>,

        /// Whole-call deadline in seconds (overrides LLM_GENERATE_DEADLINE_SECS)
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration first (before logging, so we can use log_level)
    let mut settings = Settings::load()?;

    // Override settings with CLI arguments
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    if let Some(log_format) = args.log_format {
        settings.log_format = log_format;
    }

    init_tracing(&settings.log_level, settings.log_format);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        log_format = %settings.log_format,
        deadline_secs = settings.timeouts.generate_deadline.as_secs(),
        "Starting gateway"
    );

    let gateway = Gateway::from_env(
        ProviderRegistry::builtin(),
        &ProcessEnv,
        settings.pool_config(),
        &settings.timeout_config(),
    )
    .context("Failed to build HTTP client")?;

    match args.command {
        Command::Status { json } => {
            let snapshot = gateway.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_snapshot(&snapshot);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Generate {
            prompt,
            system,
            max_tokens,
            temperature,
            deadline_secs,
        } => {
            let mut request = GenerateRequest::new(prompt);
            if let Some(system) = system {
                request = request.with_system(system);
            }
            if let Some(max_tokens) = max_tokens {
                request = request.with_max_tokens(max_tokens);
            }
            if let Some(temperature) = temperature {
                request = request.with_temperature(temperature);
            }
            if let Some(secs) = deadline_secs {
                request = request.with_deadline(Duration::from_secs(secs));
            }

            match gateway.generate(&request).await {
                Ok(generation) => {
                    tracing::info!(
                        provider = %generation.provider,
                        model = %generation.model,
                        attempts = generation.attempts,
                        "Generation complete"
                    );
                    println!("{}", generation.text);
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    print_failure(&err, &gateway);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn print_snapshot(snapshot: &HealthSnapshot) {
    println!("Credential health at {}", snapshot.taken_at.to_rfc3339());
    if snapshot.providers.is_empty() {
        println!("  (no credentials configured)");
        return;
    }
    for (provider, health) in &snapshot.providers {
        println!(
            "  {:<12} total={:<3} available={:<3} disabled={}",
            provider, health.total, health.available, health.disabled
        );
    }
    println!(
        "  {:<12} total={:<3} available={}",
        "all",
        snapshot.total(),
        snapshot.available()
    );
}

fn print_failure(err: &GatewayError, gateway: &Gateway) {
    eprintln!("error: {}", err);
    for attempt in err.attempts() {
        eprintln!("  - {}", attempt);
    }
    if err.is_not_configured() {
        let expected: Vec<String> = gateway
            .registry()
            .all()
            .iter()
            .flat_map(|d| d.expected_vars())
            .collect();
        eprintln!("hint: set one of {}", expected.join(", "));
    }
}

/// Initialize tracing subscriber with the specified log level and format.
/// Logs go to stderr so generated text on stdout stays clean.
fn init_tracing(log_level: &str, format: LogFormat) {
    // Build filter from RUST_LOG env var or use provided log level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let console_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(console_layer).init();
}

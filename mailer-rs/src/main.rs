//! mailer-rs command line
//!
//! ```bash
//! # Run the HTTP API
//! mailer-rs --config mailer.toml serve
//!
//! # Render a template for one recipient without sending
//! mailer-rs preview --template welcome.json --recipient ann.json
//!
//! # Send a template to every recipient in a JSON array
//! mailer-rs send --template welcome.json --recipients staff.json --campaign q3-awareness
//!
//! # Check SMTP connectivity and credentials
//! mailer-rs verify
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mailer_rs::api::ApiServer;
use mailer_rs::config::{Config, LoggingConfig};
use mailer_rs::dispatch::dispatch_batch;
use mailer_rs::sender::{CampaignSender, SenderIdentity};
use mailer_rs::templates::{Campaign, EmailTemplate, Recipient, TemplateRenderer};
use mailer_rs::tracking::new_tracking_id;
use mailer_rs::transport::build_transport;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_CONFIG_PATH: &str = "mailer.toml";

#[derive(Parser)]
#[command(name = "mailer-rs")]
#[command(about = "Render and send tracked campaign mail", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./mailer.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve,
    /// Render a template for one recipient and print it as JSON
    Preview {
        /// Template JSON file
        #[arg(short, long)]
        template: PathBuf,
        /// Recipient JSON file
        #[arg(short, long)]
        recipient: PathBuf,
        /// Tracking id to embed (random when omitted)
        #[arg(long)]
        tracking_id: Option<String>,
    },
    /// Send a template to every recipient in a JSON array
    Send {
        /// Template JSON file
        #[arg(short, long)]
        template: PathBuf,
        /// Recipients JSON file (array)
        #[arg(short, long)]
        recipients: PathBuf,
        /// Campaign identifier
        #[arg(long)]
        campaign: String,
        /// Campaign display name
        #[arg(long)]
        campaign_name: Option<String>,
    },
    /// Check that the configured transport is reachable
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, source) = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);
    info!("Configuration loaded from {}", source);

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Preview {
            template,
            recipient,
            tracking_id,
        } => preview(&config, &template, &recipient, tracking_id),
        Commands::Send {
            template,
            recipients,
            campaign,
            campaign_name,
        } => {
            let campaign = Campaign {
                id: campaign,
                name: campaign_name,
            };
            send(&config, &template, &recipients, &campaign).await
        }
        Commands::Verify => verify(&config).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<(Config, String)> {
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    let path = path.or_else(|| default_path.exists().then_some(default_path));

    match path {
        Some(path) => {
            let config = Config::load(Some(path))
                .with_context(|| format!("Failed to load {}", path.display()))?;
            Ok((config, path.display().to_string()))
        }
        None => Ok((Config::development(), "development defaults".to_string())),
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn campaign_sender(config: &Config) -> Result<CampaignSender> {
    let transport = build_transport(&config.transport)?;
    Ok(CampaignSender::new(
        transport,
        SenderIdentity::from(&config.sender),
    ))
}

async fn serve(config: Config) -> Result<()> {
    let sender = campaign_sender(&config)?;
    let server = ApiServer::new(
        sender,
        config.server.base_url.clone(),
        config.dispatch.concurrency,
        config.server.listen_addr.clone(),
    );

    server.run().await?;
    Ok(())
}

fn preview(
    config: &Config,
    template: &Path,
    recipient: &Path,
    tracking_id: Option<String>,
) -> Result<()> {
    let template: EmailTemplate = read_json(template)?;
    let recipient: Recipient = read_json(recipient)?;
    let tracking_id = tracking_id.unwrap_or_else(new_tracking_id);

    let email = TemplateRenderer::render_email(
        &template,
        &recipient,
        &Campaign::new("preview"),
        &tracking_id,
        &config.server.base_url,
    );
    let unresolved = TemplateRenderer::unresolved_placeholders(&template, &recipient);

    let output = serde_json::json!({
        "trackingId": tracking_id,
        "email": email,
        "unresolved": unresolved,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    if !unresolved.is_empty() {
        eprintln!("Unresolved placeholders: {}", unresolved.join(", "));
    }

    Ok(())
}

async fn send(
    config: &Config,
    template: &Path,
    recipients: &Path,
    campaign: &Campaign,
) -> Result<()> {
    let template: EmailTemplate = read_json(template)?;
    let recipients: Vec<Recipient> = read_json(recipients)?;
    let sender = campaign_sender(config)?;

    let summary = dispatch_batch(
        &sender,
        &template,
        campaign,
        &recipients,
        &config.server.base_url,
        config.dispatch.concurrency,
    )
    .await;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.failed > 0 {
        eprintln!("{} of {} sends failed", summary.failed, summary.total);
        std::process::exit(2);
    }

    Ok(())
}

async fn verify(config: &Config) -> Result<()> {
    let transport = build_transport(&config.transport)?;

    match transport.verify().await {
        Ok(()) => {
            println!("✓ Transport {} is ready", transport.provider());
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: transport {} failed verification: {}", transport.provider(), e);
            std::process::exit(1);
        }
    }
}

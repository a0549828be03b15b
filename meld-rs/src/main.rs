use anyhow::Context;
use clap::{Parser, Subcommand};
use meld_rs::composer::{EmailComposer, MeldEnvironment};
use meld_rs::config::{Config, LoggingConfig};
use meld_rs::payload::Payload;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meld-rs", about = "Render and send templated emails")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the composed RFC 5322 message
    Render {
        template: String,
        #[command(flatten)]
        args: ComposeArgs,
    },
    /// Compose and deliver over SMTP
    Send {
        template: String,
        #[command(flatten)]
        args: ComposeArgs,
    },
    /// Re-parse templates into the meld store
    Refresh { templates: Vec<String> },
    /// List cached melds
    List,
}

#[derive(clap::Args)]
struct ComposeArgs {
    /// JSON object with template variables
    #[arg(short, long)]
    payload: Option<PathBuf>,
    /// Recipient address (repeatable)
    #[arg(long = "to")]
    to: Vec<String>,
    /// Sender address, defaults to `default_from_email`
    #[arg(long)]
    from: Option<String>,
    /// Re-parse the template before rendering
    #[arg(long)]
    force: bool,
    /// Return the HTML fragment without the base layout
    #[arg(long)]
    no_layout: bool,
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

fn read_payload(path: Option<&Path>) -> anyhow::Result<Payload> {
    let Some(path) = path else {
        return Ok(Payload::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading payload {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing payload {}", path.display()))
}

async fn compose(
    env: MeldEnvironment,
    template: String,
    args: &ComposeArgs,
    deliver: bool,
) -> anyhow::Result<()> {
    let composer = EmailComposer::new(template, env)?.use_base_template(!args.no_layout);
    let payload = read_payload(args.payload.as_deref())?;
    let email = composer.bind(payload, None, args.force).await?;

    if deliver {
        let sent = email.send(&args.to, args.from.as_deref()).await?;
        info!("Delivered {} message(s)", sent);
    } else {
        let message = email.prepare(&args.to, args.from.as_deref())?;
        let raw = message.to_rfc5322()?;
        println!("{}", String::from_utf8_lossy(&raw));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        Config::from_file(&cli.config)?
    } else {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        config
    };
    init_logging(&config.logging);

    info!("Configuration loaded");
    info!("  Template dirs: {:?}", config.templates.dirs);
    info!("  Database: {}", config.storage.database_url);

    let env = MeldEnvironment::from_config(&config).await?;

    match cli.command {
        Command::Render { template, args } => compose(env, template, &args, false).await?,
        Command::Send { template, args } => compose(env, template, &args, true).await?,
        Command::Refresh { templates } => {
            for template in templates {
                let meld = env.resolver.resolve(&template, true).await?;
                println!("{}\t{}\t{}", meld.identifier, meld.kind, meld.subject);
            }
        }
        Command::List => {
            for meld in env.resolver.store().list().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    meld.identifier,
                    meld.kind,
                    meld.updated_at.to_rfc3339(),
                    meld.subject
                );
            }
        }
    }

    Ok(())
}

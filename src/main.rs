use anyhow::{Context, Result};
use clap::Parser;
use name_keeper::config::PersistenceBackend;
use name_keeper::{standard_skill, SkillConfig};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serve one request envelope and print the response envelope
#[derive(Parser)]
#[command(name = "name-keeper")]
#[command(about = "Voice skill backend that remembers the user's name")]
struct Args {
    /// TOML configuration file
    #[arg(short = 'c', long, env = "NAME_KEEPER_CONFIG")]
    config: Option<PathBuf>,

    /// Directory with the `<locale>.json` prompt tables
    #[arg(short = 'l', long)]
    languages: Option<PathBuf>,

    /// Root directory of the file backend
    #[arg(short = 'd', long)]
    data_dir: Option<PathBuf>,

    /// Keep persistent attributes in memory only
    #[arg(long)]
    memory: bool,

    /// Pretty-print the response
    #[arg(short = 'p', long)]
    pretty: bool,

    /// Request envelope JSON; read from stdin when omitted
    request: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the response
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "name_keeper=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SkillConfig::load(path)?,
        None => SkillConfig::default(),
    }
    .apply_env(|key| std::env::var(key).ok())?;

    if let Some(dir) = args.languages {
        config = config.with_languages_dir(dir);
    }
    if let Some(dir) = args.data_dir {
        config = config.with_data_dir(dir);
    }
    if args.memory {
        config = config.with_backend(PersistenceBackend::Memory);
    }
    config.validate()?;

    info!("Languages from {}", config.languages_dir.display());
    let skill = standard_skill(&config);

    let body = match &args.request {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request '{}'", path.display()))?,
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("Failed to read request from stdin")?;
            body
        }
    };

    let output = if args.pretty {
        skill.invoke_json_pretty(&body)?
    } else {
        skill.invoke_json(&body)?
    };
    println!("{}", output);

    Ok(())
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use cyber_shield_analysis_contract::present_risk;
use cyber_shield_app::{AppConfig, analyze_scam_risk, app_version, build_classifier, logging};
use cyber_shield_store::{DEFAULT_RECENT_LIMIT, MemoryStore, Scam, ScamStore, TrendingFilter};
use tokio::io::AsyncReadExt;

#[derive(Parser, Debug)]
#[command(name = "cyber-shield", version = app_version(), about = "Community scam reports and AI risk checks")]
struct Cli {
    /// TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a message for scam risk.
    Check(CheckArgs),
    /// Browse reported scams from a seed file.
    Scams {
        #[command(subcommand)]
        command: ScamsCommand,
    },
    /// Print the effective configuration.
    Config,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Message text. Read from stdin when neither this nor --file is given.
    text: Option<String>,
    /// Read the message from a file.
    #[arg(long, conflicts_with = "text")]
    file: Option<PathBuf>,
    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum ScamsCommand {
    /// Trending reports, newest first.
    Trending {
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value = "all")]
        country: String,
        #[arg(long = "type", default_value = "all")]
        scam_type: String,
        /// Platform category, or a brand name to look for in descriptions.
        #[arg(long, default_value = "all")]
        platform: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Most recent reports.
    Recent {
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    if let Err(error) = logging::init_tracing(&config.logging) {
        eprintln!("failed to install tracing subscriber: {error}");
    }

    match cli.command {
        Command::Check(args) => run_check(&config, args).await,
        Command::Scams { command } => run_scams(command),
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            let key_state = if config.api_key(|key| std::env::var(key).ok()).is_some() {
                "set"
            } else {
                "unset"
            };
            println!("# {} is {key_state}", config.provider.api_key_env);
            Ok(())
        }
    }
}

async fn run_check(config: &AppConfig, args: CheckArgs) -> anyhow::Result<()> {
    let text = match (args.text, args.file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("failed to read stdin")?;
            buffer
        }
    };

    let classifier = build_classifier(config, config.api_key(|key| std::env::var(key).ok()))?;
    let result = match analyze_scam_risk(&classifier, &text).await {
        Ok(result) => result,
        Err(error) => {
            eprintln!("{}", error.user_message());
            return Err(error.into());
        }
    };

    let presentation = present_risk(&result);
    if args.json {
        let mut encoded = serde_json::to_value(&result)?;
        encoded["band"] = serde_json::Value::from(presentation.band.as_str());
        println!("{}", serde_json::to_string_pretty(&encoded)?);
    } else {
        println!("{} ({})", presentation.title, presentation.band);
        println!();
        println!("{}", presentation.summary);
    }
    Ok(())
}

fn run_scams(command: ScamsCommand) -> anyhow::Result<()> {
    let scams = match command {
        ScamsCommand::Trending {
            data,
            country,
            scam_type,
            platform,
            limit,
        } => load_store(&data)?.trending_scams(&TrendingFilter {
            country,
            scam_type,
            platform,
            limit,
        })?,
        ScamsCommand::Recent { data, limit } => load_store(&data)?.recent_scams(limit)?,
    };

    for scam in &scams {
        print_scam(scam);
    }
    Ok(())
}

fn load_store(path: &Path) -> anyhow::Result<MemoryStore> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read data {}", path.display()))?;
    MemoryStore::from_json_str(&raw)
        .with_context(|| format!("failed to load data {}", path.display()))
}

fn print_scam(scam: &Scam) {
    println!(
        "{}\t{}\t{}\t{}\t{}",
        scam.id,
        scam.scam_type.label(),
        scam.platform.label(),
        scam.country,
        scam.title
    );
}

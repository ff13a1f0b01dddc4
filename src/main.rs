use clap::Parser;
use mbs_tagger::cli::commands::{Cli, Commands};
use mbs_tagger::config::TaggerConfig;
use mbs_tagger::domain::entities::pool::PoolAttributes;
use mbs_tagger::domain::ports::pool_repository::TagSelection;
use mbs_tagger::MbsTagger;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match TaggerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let tagger = match MbsTagger::new(config) {
        Ok(tagger) => tagger,
        Err(e) => {
            eprintln!("Error initializing mbs-tagger: {e}");
            std::process::exit(1);
        }
    };

    let result = run_command(tagger, cli.command).await;
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(tagger: MbsTagger, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Tag {
            batch_size,
            limit,
            rate,
            stale,
            conforming_limit,
        } => {
            let mut options = tagger.run_options();
            options.batch_size = batch_size;
            options.limit = limit;
            options.rate_override = rate;
            if stale {
                options.selection = TagSelection::Stale;
            }
            if let Some(cl) = conforming_limit {
                options.conforming_limit = cl;
            }

            let report = tagger.tag(&options).await?;
            println!("Tagged {} pools", report.tagged);
        }
        Commands::Score { json, rate } => {
            let pool: PoolAttributes = serde_json::from_str(&json)?;
            let tags = tagger.score(&pool, rate).await?;
            println!("{}", serde_json::to_string_pretty(&tags)?);
        }
        Commands::AddPool { json } => {
            let pool: PoolAttributes = serde_json::from_str(&json)?;
            tagger.add_pool(&pool)?;
            println!("Stored pool {}", pool.pool_id);
        }
        Commands::Show { pool_id } => {
            let record = tagger.show(&pool_id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Stats => {
            let stats = tagger.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}

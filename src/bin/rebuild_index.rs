use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use health_assistant::config::{AppConfig, Credentials, DEFAULT_CONFIG_PATH};
use health_assistant::{rebuild_banner, rebuild_index, rebuild_summary};
use std::path::PathBuf;

/// Rebuild the vector index after adding PDFs or changing chunking settings.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[arg(short, long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = AppConfig::load(&args.config)?;
    let credentials = Credentials::from_env().with_openai_override(args.api_key);

    println!("{}", rebuild_banner(&config));
    let chunks = rebuild_index(&config, &credentials).await?;
    println!("{}", rebuild_summary(chunks));
    Ok(())
}

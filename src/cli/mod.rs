use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::core::{ExtractorEngine, ParseResult, ReqwestFetcher};
use crate::extractors::DouyinExtractor;

#[derive(Parser)]
#[command(name = "douyin-nowm")]
#[command(about = "Resolve Douyin share links into watermark-free media URLs")]
#[command(version)]
pub struct Cli {
    /// Share page URL to resolve
    #[arg(value_name = "URL")]
    pub url: String,

    /// TOML file with transport and sandbox settings
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the result as JSON instead of one URL per line
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let fetcher = Arc::new(ReqwestFetcher::new(&config)?);

        let mut engine = ExtractorEngine::new();
        engine.register_extractor(Box::new(DouyinExtractor::new(fetcher, &config)));

        let result = engine.extract(&self.url).await?;
        println!("{}", render(&result, self.json)?);
        eprintln!("X-Media-Type: {}", result.kind());

        Ok(())
    }
}

/// Same body the HTTP front end serves: one URL per line.
pub fn render(result: &ParseResult, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(result)?);
    }
    Ok(result.urls().join("\n"))
}

// src/main.rs
// =============================================================================
// This is the entry point of the mirror-spider CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging
// 3. Dispatch to the subcommand handler
// 4. Exit with proper code (0 = success, 2 = error)
//
// Ctrl-C stops the crawl gracefully: workers finish the page in hand, and if
// checkpointing is enabled a final checkpoint is written so `--resume` can
// continue later.
// =============================================================================

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use mirror_spider::crawl::{CrawlStats, Crawler};
use mirror_spider::extract::FileMailLog;
use mirror_spider::fetch::{CredentialProvider, HttpFetcher, NoCredentials, StaticCredentials};
use mirror_spider::{logging, CrawlConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    match cli.command {
        Commands::Crawl { options, resume, json } => {
            handle_crawl(options.resolve()?, resume, json).await
        }
        Commands::SaveConfig { output, options } => handle_save_config(&output, options.resolve()?),
    }
}

// Handles the 'crawl' subcommand
async fn handle_crawl(config: CrawlConfig, resume: bool, json: bool) -> Result<i32> {
    println!("🕷️  Mirroring {} into {}", config.seed, config.mirror_root.display());
    if config.max_depth > 0 {
        println!("📊 Max crawl depth: {}", config.max_depth);
    }

    let credentials: Arc<dyn CredentialProvider> = match config.credentials() {
        Some(credentials) => Arc::new(StaticCredentials::new(credentials)),
        None => Arc::new(NoCredentials),
    };
    let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout(), credentials)?;
    let mail_log = FileMailLog::new(&config.mail_log_path);
    let checkpointing = config.checkpoint_interval().is_some();

    let crawler = Arc::new(Crawler::new(config, Arc::new(fetcher), Arc::new(mail_log))?);

    if resume {
        if crawler.restore_from_checkpoint().await? {
            info!(pending = crawler.queue().size(), "resumed from checkpoint");
        } else {
            info!("no checkpoint found, starting from the seed");
        }
    }

    let interrupt = {
        let crawler = Arc::clone(&crawler);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted, stopping workers");
                crawler.stop();
            }
        })
    };

    let outcome = crawler.run().await;
    interrupt.abort();
    let stats = outcome?;

    if crawler.stop_requested() && checkpointing {
        match crawler.checkpoint_now().await {
            Ok(()) => info!(
                path = %crawler.config().checkpoint_path.display(),
                "final checkpoint written"
            ),
            Err(e) => warn!(error = %e, "failed to write final checkpoint"),
        }
    }

    print_stats(&stats, json)?;
    Ok(0)
}

// Handles the 'save-config' subcommand
fn handle_save_config(output: &Path, config: CrawlConfig) -> Result<i32> {
    config.validate()?;
    config.save(output)?;
    println!("💾 Configuration written to {}", output.display());
    Ok(0)
}

// Prints the final statistics either as a summary or JSON
fn print_stats(stats: &CrawlStats, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    println!();
    println!("📊 Summary:");
    println!("   ⬇️  Downloaded: {}", stats.fetched);
    println!("   ♻️  Reused from disk: {}", stats.reused);
    println!("   💾 Written: {}", stats.stored);
    println!("   ❌ Failed: {}", stats.failed);
    if stats.pending + stats.in_flight > 0 {
        println!("   ⏸️  Left unvisited: {}", stats.pending + stats.in_flight);
    }
    Ok(())
}

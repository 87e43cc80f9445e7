use std::path::Path;

use crate::app::{AppContext, Result};
use crate::domain::PageTarget;
use crate::runner::{self, PostSource};
use crate::scraper::BlockOutcome;

pub async fn run(ctx: &AppContext, accounts: &Path) -> Result<()> {
    let targets = PageTarget::load_all(accounts)?;

    if targets.is_empty() {
        println!("No pages in {}", accounts.display());
        return Ok(());
    }

    println!("Processing {} pages...", targets.len());
    let runs = ctx.runner.run_all(targets).await;

    let mut fresh = 0;
    let mut cached = 0;
    let mut missing = 0;

    for run in &runs {
        match run.source {
            PostSource::Fresh => {
                fresh += 1;
                println!("  {}: {} fresh posts", run.target.name, run.posts);
            }
            PostSource::Cache => {
                cached += 1;
                println!("  {}: {} cached posts", run.target.name, run.posts);
            }
            PostSource::Unavailable => {
                missing += 1;
                eprintln!("  {}: no data (scrape failed and no cache)", run.target.name);
            }
        }
        if run.source != PostSource::Unavailable && !run.feed_written {
            eprintln!("  {}: feed could not be written", run.target.name);
        }
    }

    println!(
        "Run complete: {} fresh, {} from cache, {} without data",
        fresh, cached, missing
    );
    Ok(())
}

pub async fn render(ctx: &AppContext, accounts: &Path) -> Result<()> {
    let targets = PageTarget::load_all(accounts)?;

    for target in targets {
        let posts = match ctx.store.load_posts(&target) {
            Ok(posts) => posts,
            Err(e) => {
                eprintln!("  {}: cache unreadable: {}", target.name, e);
                continue;
            }
        };

        if posts.is_empty() {
            println!("  {}: no cached posts", target.name);
            continue;
        }

        if runner::emit(&ctx.emitter, &ctx.config.output.feeds_dir, &target, &posts).await {
            println!(
                "  {}: {} posts -> {}",
                target.name,
                posts.len(),
                target.feed_path(&ctx.config.output.feeds_dir).display()
            );
        }
    }

    Ok(())
}

pub async fn scrape(ctx: &AppContext, name: &str, url: &str) -> Result<()> {
    let target = PageTarget::from_name(name, url);
    let report = ctx.scraper.scrape(&target).await?;

    println!("{}", serde_json::to_string_pretty(&report.posts)?);
    eprintln!(
        "{} posts ({} comments skipped, {} blocks failed)",
        report.posts.len(),
        report.count(&BlockOutcome::Comment),
        report
            .blocks
            .iter()
            .filter(|b| matches!(b, BlockOutcome::Failed(_)))
            .count()
    );
    Ok(())
}

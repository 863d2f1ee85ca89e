//! Subcommand execution

use crate::cli::{AddArgs, Cli, Command, DeleteArgs, ListArgs, fqdn};
use anyhow::{Context, Result};
use futures::StreamExt;
use ptrsync_core::traits::RecordSet;
use ptrsync_core::{
    ChangeOrchestrator, ChangeOutcome, RecordPages, ReverseZonesConfig, ZoneProvider, ZoneResolver,
};
use ptrsync_provider_route53::Route53Provider;
use tracing::info;

pub async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Add(args) => add(cli, args).await,
        Command::Delete(args) => delete(cli, args).await,
        Command::List(args) => {
            let provider = Route53Provider::new(cli.route53_settings()).await;
            list(&provider, args).await
        }
    }
}

async fn add(cli: &Cli, args: &AddArgs) -> Result<()> {
    let request = args.to_request()?;
    let provider = Route53Provider::new(cli.route53_settings()).await;
    let orchestrator = orchestrator(cli, &provider).await?;

    let outcome = orchestrator.apply(&request).await?;
    print_outcome(&outcome, cli.dryrun);
    Ok(())
}

async fn delete(cli: &Cli, args: &DeleteArgs) -> Result<()> {
    let provider = Route53Provider::new(cli.route53_settings()).await;
    let orchestrator = orchestrator(cli, &provider).await?;

    let outcome = orchestrator
        .delete_host(&fqdn(&args.hostname), &args.zone)
        .await?;
    print_outcome(&outcome, cli.dryrun);
    Ok(())
}

async fn orchestrator<'a>(
    cli: &Cli,
    provider: &'a dyn ZoneProvider,
) -> Result<ChangeOrchestrator<'a>> {
    let config = ReverseZonesConfig::load(&cli.conf)
        .await
        .with_context(|| format!("loading {}", cli.conf.display()))?;
    info!(
        "Loaded {} reverse zone(s) from {}",
        config.reverse_hosted_zones.len(),
        cli.conf.display()
    );

    Ok(ChangeOrchestrator::from_config(provider, &config).await?)
}

async fn list(provider: &dyn ZoneProvider, args: &ListArgs) -> Result<()> {
    let zone_id = ZoneResolver::new(provider).resolve(&args.zone).await?;

    let mut pages = RecordPages::new(provider, zone_id);
    if let Some(page_size) = args.page_size {
        pages = pages.with_page_size(page_size);
    }

    let mut pages = std::pin::pin!(pages.into_stream());
    while let Some(page) = pages.next().await {
        for record in page?.records {
            if args.json {
                println!("{}", serde_json::to_string(&record)?);
            } else {
                println!("{}", format_record(&record));
            }
        }
    }
    Ok(())
}

fn print_outcome(outcome: &ChangeOutcome, dry_run: bool) {
    let prefix = if dry_run { "[DRY-RUN] " } else { "" };
    for change in &outcome.applied {
        println!(
            "{prefix}{}\t{}\t{}",
            change.action,
            change.zone_id,
            format_record(&change.record)
        );
    }
}

/// `TYPE<TAB>NAME<TAB>VALUE...`
fn format_record(record: &RecordSet) -> String {
    let mut line = format!("{}\t{}", record.record_type, record.name);
    for value in &record.values {
        line.push('\t');
        line.push_str(value);
    }
    line
}

//! Assembles the pricing pipeline's collaborators from configuration and
//! drives a job's rows through the scheduler.

use crate::cli::Cli;
use anyhow::{Context, Result};
use pricing_core::{
    batch_plan, default_categories, Categorizer, Error as CoreError, PipelineCaches, PricingConfig,
    PricingPipeline, PricingResult, Row, Scheduler, Status,
};
use pricing_cache::ResultStore;
use pricing_llm::{AnthropicConfig, AnthropicProvider, LlmRouter};
use pricing_search::{QueryBuilder, SerpApiConfig, SerpApiProvider, UrlResolver};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run one pricing job end-to-end, per the CLI arguments.
///
/// A config/credentials problem is surfaced as a typed [`pricing_core::Error`]
/// wrapped in the returned [`anyhow::Error`]'s chain, so `main` can map it to
/// the exit codes spec §6.3 requires. A SIGINT during the run stops the
/// scheduler from dequeuing further batches (spec §4.10); rows already in
/// flight finish and are still written out before the cancelled error
/// propagates.
pub async fn run(cli: Cli) -> Result<()> {
    let config = PricingConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let trust = config.trust.to_policy();
    let query_builder = QueryBuilder::new();
    let resolver = UrlResolver::new();
    let retry_policy = config.retry.to_policy();

    let mut llm_router = LlmRouter::new("anthropic");
    let mut anthropic_config = AnthropicConfig::new(config.llm.api_key.clone());
    if let Some(base_url) = &config.llm.base_url {
        anthropic_config.base_url = base_url.clone();
    }
    let anthropic = AnthropicProvider::new(anthropic_config).context("building Anthropic provider")?;
    llm_router.register("anthropic", Arc::new(anthropic));

    let mut serpapi_config = SerpApiConfig::new(config.search.api_key.clone());
    if let Some(base_url) = &config.search.base_url {
        serpapi_config.base_url = base_url.clone();
    }
    let search_provider = SerpApiProvider::new(serpapi_config).context("building SerpApi provider")?;

    let categories =
        if config.categories.is_empty() { default_categories() } else { config.categories.clone() };
    let categorizer = Categorizer::new(&categories, Some(&llm_router));

    let caches = PipelineCaches::new(config.cache.to_cache_config());

    let pipeline = PricingPipeline::new(
        &trust,
        &query_builder,
        &search_provider,
        &resolver,
        &retry_policy,
        &llm_router,
        &categorizer,
        &caches,
        config.tolerance_pct,
        config.fallback_tolerance_pct,
        config.scheduler.provider_concurrency,
    );

    let rows = read_rows(&cli)?;
    let total = rows.len();
    let job_id = cli.job_id.clone().unwrap_or_else(|| format!("job-{total}-rows"));
    let (batch_size, concurrency) = batch_plan(total, &config.scheduler);
    info!(job_id, total, batch_size, concurrency, "starting pricing run");

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("received interrupt, finishing in-flight rows and stopping further dispatch");
            ctrl_c_cancel.cancel();
        }
    });

    let scheduler = Scheduler::new(config.scheduler);
    let results = scheduler
        .run(
            rows,
            |row: Row| pipeline.run_row(row),
            |result: &PricingResult| result.status == Status::Estimated,
            |progress| {
                if progress.processed % 50 == 0 || progress.processed == progress.total {
                    info!(processed = progress.processed, total = progress.total, "pricing progress");
                }
            },
            cancel.clone(),
        )
        .await;

    let was_cancelled = cancel.is_cancelled() && results.len() < total;

    let result_store: ResultStore<PricingResult> = ResultStore::new();
    result_store.put(job_id.clone(), results).await;
    let stored_results =
        result_store.get(&job_id).await.context("reading back just-stored job results")?;

    write_results(&cli, &stored_results)?;
    info!(job_id, priced = stored_results.len(), cancelled = was_cancelled, "pricing run complete");

    if was_cancelled {
        return Err(CoreError::Cancelled.into());
    }
    Ok(())
}

fn read_rows(cli: &Cli) -> Result<Vec<Row>> {
    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => {
            Box::new(std::io::BufReader::new(std::fs::File::open(path).context("opening input file")?))
        }
        None => Box::new(std::io::BufReader::new(std::io::stdin())),
    };

    reader
        .lines()
        .enumerate()
        .filter(|(_, line)| line.as_ref().is_ok_and(|l| !l.trim().is_empty()))
        .map(|(idx, line)| {
            let line = line.context("reading input line")?;
            serde_json::from_str(&line).with_context(|| format!("parsing row at line {}", idx + 1))
        })
        .collect()
}

fn write_results(cli: &Cli, results: &[PricingResult]) -> Result<()> {
    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(std::fs::File::create(path).context("creating output file")?),
        None => Box::new(std::io::stdout()),
    };

    for result in results {
        let line = serde_json::to_string(result).context("serializing result")?;
        writeln!(writer, "{line}").context("writing result")?;
    }
    Ok(())
}

use crate::api::ImmichApi;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::executor::{RequestExecutor, RetryPolicy};
use crate::fetcher::AssetFetcher;
use crate::grouping::group_by_base_name;
use crate::ordering::{OrderedStack, StackOrderer};
use crate::progress::Progress;
use crate::submitter::{StackSubmitter, SubmitOptions};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub directories: usize,
    pub assets: usize,
    pub eligible: usize,
    pub stacks: usize,
    pub stacks_created: usize,
    pub metadata_updates: usize,
    pub dry_run: bool,
}

/// Scans `root` on the server and stacks sibling files that share a base name.
pub async fn run(
    config: &AppConfig,
    api: Arc<dyn ImmichApi>,
    progress: Arc<dyn Progress>,
    root: &str,
) -> Result<RunSummary, AppError> {
    log::info!("Starting autostack run for {}", root);

    let policy = RetryPolicy {
        max_retries: config.max_retries,
        base_delay: config.retry_base_delay(),
    };
    let executor = Arc::new(RequestExecutor::new(
        config.max_concurrency,
        policy,
        progress.clone(),
    )?);
    let fetcher = AssetFetcher::new(api.clone(), executor.clone());

    let mut summary = RunSummary {
        dry_run: config.dry_run,
        ..Default::default()
    };

    let directories = fetcher.resolve_directories(root, config.recursive).await?;
    summary.directories = directories.len();

    let assets = fetcher.fetch_assets(&directories).await?;
    summary.assets = assets.len();
    if assets.is_empty() {
        progress.line(&format!("❌ No assets found in {}", root));
        return Ok(summary);
    }

    let details = fetcher.fetch_unstacked_details(&assets).await?;
    summary.eligible = details.len();
    if details.is_empty() {
        progress.line(&format!("❌ No un-stacked assets found in {}", root));
        return Ok(summary);
    }

    if config.dry_run {
        progress.line("⭐⭐⭐ DRY RUN CHANGES ⭐⭐⭐");
    }

    let orderer = StackOrderer::new(root, config.raw_extensions.clone());
    let stacks: Vec<OrderedStack> = group_by_base_name(details, config.base_name_rule)
        .into_iter()
        .map(|group| orderer.order(group))
        .collect();
    summary.stacks = stacks.len();
    if stacks.is_empty() {
        progress.line(&format!("❌ No stackable assets found in {}", root));
        return Ok(summary);
    }

    let submitter = StackSubmitter::new(
        api,
        executor,
        progress,
        SubmitOptions {
            dry_run: config.dry_run,
            copy_metadata: config.copy_metadata,
            retry_mutations: config.retry_mutations,
        },
    );
    let report = submitter.submit_all(&stacks).await?;
    summary.stacks_created = report.stacks_created;
    summary.metadata_updates = report.metadata_updates;

    log::info!("Autostack run finished: {:?}", summary);
    Ok(summary)
}

use crate::api::ImmichApi;
use crate::asset::{Asset, AssetDetail};
use crate::error::AppError;
use crate::executor::RequestExecutor;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Pulls asset listings and details through the shared request executor.
pub struct AssetFetcher {
    api: Arc<dyn ImmichApi>,
    executor: Arc<RequestExecutor>,
}

impl AssetFetcher {
    pub fn new(api: Arc<dyn ImmichApi>, executor: Arc<RequestExecutor>) -> Self {
        Self { api, executor }
    }

    /// Directories to scan. Recursive mode asks the server for every known
    /// folder and keeps those at or beneath `root`.
    pub async fn resolve_directories(&self, root: &str, recursive: bool) -> Result<Vec<String>, AppError> {
        if !recursive {
            return Ok(vec![root.to_string()]);
        }

        let api = self.api.clone();
        let paths = self
            .executor
            .execute("GET /api/view/folder/unique-paths", || api.unique_paths())
            .await;
        let paths = match paths {
            Err(AppError::Decode { url, source }) => {
                log::warn!("Ignoring malformed folder list from {}: {}", url, source);
                Vec::new()
            }
            other => other?,
        };

        if paths.is_empty() {
            log::debug!("Server returned no folders, scanning {} only", root);
            return Ok(vec![root.to_string()]);
        }

        let directories = directories_beneath(root, paths);
        log::info!("Resolved {} directories beneath {}", directories.len(), root);
        Ok(directories)
    }

    /// One throttled listing per directory. All listings must succeed.
    pub async fn fetch_assets(&self, directories: &[String]) -> Result<Vec<Asset>, AppError> {
        log::info!("Listing assets in {} directories", directories.len());
        let listings = self
            .fan_out(directories.to_vec(), |api, executor, directory| async move {
                let label = format!("GET /api/view/folder?path={}", directory);
                let result = executor
                    .execute_throttled(&label, || api.list_folder(&directory))
                    .await;
                no_data_on_malformed(result, Vec::new())
            })
            .await?;

        let assets: Vec<Asset> = listings.into_iter().flatten().collect();
        log::info!("Found {} assets", assets.len());
        Ok(assets)
    }

    /// One throttled detail lookup per asset. Missing details are dropped and
    /// assets that already belong to a stack are filtered out.
    pub async fn fetch_unstacked_details(&self, assets: &[Asset]) -> Result<Vec<AssetDetail>, AppError> {
        let ids: Vec<String> = assets.iter().map(|a| a.id.clone()).collect();
        log::info!("Fetching details for {} assets", ids.len());

        let details = self
            .fan_out(ids, |api, executor, id| async move {
                let label = format!("GET /api/assets/{}", id);
                let result = executor
                    .execute_throttled(&label, || api.asset_detail(&id))
                    .await;
                no_data_on_malformed(result, None)
            })
            .await?;

        let total = details.len();
        let found: Vec<AssetDetail> = details.into_iter().flatten().collect();
        if found.len() < total {
            log::debug!("{} assets returned no detail", total - found.len());
        }

        let unstacked: Vec<AssetDetail> = found.into_iter().filter(|d| !d.is_stacked()).collect();
        log::info!("{} assets are not stacked yet", unstacked.len());
        Ok(unstacked)
    }

    /// Spawns one task per input and collects results by input position.
    /// The first failure aborts the remaining tasks.
    async fn fan_out<I, T, F, Fut>(&self, inputs: Vec<I>, task: F) -> Result<Vec<T>, AppError>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(Arc<dyn ImmichApi>, Arc<RequestExecutor>, I) -> Fut,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        let mut slots: Vec<Option<T>> = (0..inputs.len()).map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for (position, input) in inputs.into_iter().enumerate() {
            let fut = task(self.api.clone(), self.executor.clone(), input);
            tasks.spawn(async move { (position, fut.await) });
        }

        while let Some(joined) = tasks.join_next().await {
            let (position, result) = joined?;
            slots[position] = Some(result?);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

fn no_data_on_malformed<T>(result: Result<T, AppError>, empty: T) -> Result<T, AppError> {
    match result {
        Err(AppError::Decode { url, source }) => {
            log::warn!("Treating malformed response from {} as empty: {}", url, source);
            Ok(empty)
        }
        other => other,
    }
}

/// Keeps `paths` that are `root` or lie beneath it. When `root` is absolute,
/// relative server paths are made absolute first.
pub fn directories_beneath(root: &str, paths: Vec<String>) -> Vec<String> {
    let absolute = root.starts_with('/');
    let root_path = Path::new(root);

    paths
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(|p| {
            if absolute && !p.starts_with('/') {
                format!("/{}", p)
            } else {
                p
            }
        })
        .filter(|p| Path::new(p).starts_with(root_path))
        .collect()
}

use crate::asset::{Asset, AssetDetail, CreateStack, UpdateAsset};
use crate::error::AppError;
use async_trait::async_trait;

/// Remote photo-management endpoints consumed by an autostack run.
#[async_trait]
pub trait ImmichApi: Send + Sync {
    async fn list_folder(&self, path: &str) -> Result<Vec<Asset>, AppError>;
    async fn unique_paths(&self) -> Result<Vec<String>, AppError>;
    async fn asset_detail(&self, id: &str) -> Result<Option<AssetDetail>, AppError>;
    async fn create_stack(&self, request: &CreateStack) -> Result<(), AppError>;
    async fn update_asset(&self, id: &str, update: &UpdateAsset) -> Result<(), AppError>;
}

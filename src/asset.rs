// src/asset.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExifInfo {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub original_file_name: String,
    pub original_path: String,
    pub local_date_time: DateTime<Utc>,
    #[serde(default)]
    pub exif_info: Option<ExifInfo>,
}

impl Asset {
    /// File name without its final extension.
    pub fn file_stem(&self) -> &str {
        Path::new(&self.original_file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.original_file_name)
    }

    /// Lowercased extension including the leading dot, or an empty string.
    pub fn extension(&self) -> String {
        Path::new(&self.original_file_name)
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.exif_info.as_ref().and_then(|e| e.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.exif_info.as_ref().and_then(|e| e.longitude)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StackRef {
    pub id: String,
    #[serde(default)]
    pub primary_asset_id: Option<String>,
    #[serde(default)]
    pub asset_count: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetDetail {
    #[serde(flatten)]
    pub asset: Asset,
    #[serde(default)]
    pub stack: Option<StackRef>,
}

impl AssetDetail {
    pub fn is_stacked(&self) -> bool {
        self.stack.is_some()
    }
}

impl std::ops::Deref for AssetDetail {
    type Target = Asset;

    fn deref(&self) -> &Asset {
        &self.asset
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateStack {
    pub asset_ids: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAsset {
    pub date_time_original: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl UpdateAsset {
    /// Capture metadata copied from `source`.
    pub fn copied_from(source: &Asset) -> Self {
        Self {
            date_time_original: source.local_date_time,
            latitude: source.latitude(),
            longitude: source.longitude(),
        }
    }
}

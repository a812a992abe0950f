use crate::asset::{Asset, AssetDetail};
use crate::grouping::Group;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

/// Ranks files for stack order. RAW captures come first and act as the
/// metadata source for their siblings.
#[derive(Debug, Clone)]
pub struct StackOrderer {
    root: String,
    raw_extensions: HashSet<String>,
}

impl StackOrderer {
    pub fn new(root: impl Into<String>, raw_extensions: HashSet<String>) -> Self {
        Self {
            root: root.into(),
            raw_extensions,
        }
    }

    /// 0 for RAW files, 1 for everything else.
    pub fn file_type_priority(&self, asset: &Asset) -> u8 {
        if self.raw_extensions.contains(&asset.extension()) {
            0
        } else {
            1
        }
    }

    /// Containing directory of `asset` relative to the scan root.
    pub fn relative_directory(&self, asset: &Asset) -> String {
        let path = Path::new(&asset.original_path);
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn compare(&self, a: &Asset, b: &Asset) -> Ordering {
        self.file_type_priority(a)
            .cmp(&self.file_type_priority(b))
            .then_with(|| self.relative_directory(b).cmp(&self.relative_directory(a)))
            .then_with(|| a.file_stem().cmp(b.file_stem()))
    }

    /// Sorts a group into canonical stack order. Position 0 is the primary asset.
    pub fn order(&self, group: Group) -> OrderedStack {
        let mut members = group.members;
        members.sort_by(|a, b| self.compare(a, b));

        let metadata_source = members
            .iter()
            .rposition(|m| self.file_type_priority(m) == 0);

        OrderedStack {
            base_name: group.base_name,
            members,
            metadata_source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderedStack {
    pub base_name: String,
    members: Vec<AssetDetail>,
    metadata_source: Option<usize>,
}

impl OrderedStack {
    /// Members in canonical stack order. Read-only so the metadata source
    /// index stays valid.
    pub fn members(&self) -> &[AssetDetail] {
        &self.members
    }

    /// The last RAW member in sort order, if any.
    pub fn metadata_source(&self) -> Option<&AssetDetail> {
        self.metadata_source.map(|i| &self.members[i])
    }

    pub fn asset_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.members
            .iter()
            .map(|m| m.original_file_name.as_str())
            .collect()
    }
}

use crate::asset::AssetDetail;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

lazy_static! {
    static ref LETTERS: Regex = Regex::new(r"^(?P<base>[A-Za-z]+_[0-9]+)(?:[_-].*)?$").unwrap();
    static ref LETTERS_UNDERSCORE: Regex =
        Regex::new(r"^(?P<base>[A-Za-z_]+_[0-9]+)(?:[_-].*)?$").unwrap();
}

/// Matching rule used to collapse sibling edits onto one grouping key.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BaseNameRule {
    /// `IMG_1234`, `IMG_1234_a`, `IMG_1234-edit` all map to `IMG_1234`.
    #[default]
    Letters,
    /// Like `Letters` but the prefix may contain underscores (`MY_TRIP_0001`).
    LettersUnderscore,
}

impl BaseNameRule {
    fn pattern(self) -> &'static Regex {
        match self {
            BaseNameRule::Letters => &*LETTERS,
            BaseNameRule::LettersUnderscore => &*LETTERS_UNDERSCORE,
        }
    }

    /// Grouping key for `file_name`: the extension is stripped, then the
    /// anchored pattern is tried. Without a match the stripped name itself is the key.
    pub fn base_name(self, file_name: &str) -> String {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);

        match self.pattern().captures(stem).and_then(|c| c.name("base")) {
            Some(base) => base.as_str().to_string(),
            None => stem.to_string(),
        }
    }
}

/// Grouping key under the canonical rule.
pub fn extract_base_name(file_name: &str) -> String {
    BaseNameRule::Letters.base_name(file_name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub base_name: String,
    pub members: Vec<AssetDetail>,
}

/// Partitions assets by base name, keeping only groups with two or more
/// members. Groups come out in first-seen key order; members keep listing order.
/// Assets that already belong to a stack are skipped.
pub fn group_by_base_name(details: Vec<AssetDetail>, rule: BaseNameRule) -> Vec<Group> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for detail in details {
        if detail.is_stacked() {
            log::debug!("Skipping already stacked asset {}", detail.original_file_name);
            continue;
        }
        let key = rule.base_name(&detail.original_file_name);
        log::trace!("Base name of {} is {}", detail.original_file_name, key);
        match index.get(&key).copied() {
            Some(i) => groups[i].members.push(detail),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    base_name: key,
                    members: vec![detail],
                });
            }
        }
    }

    groups.retain(|g| g.members.len() > 1);
    log::debug!("Found {} stackable groups", groups.len());
    groups
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::asset::{Asset, StackRef};
    use chrono::{TimeZone, Utc};

    pub(crate) fn detail(id: &str, path: &str) -> AssetDetail {
        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        AssetDetail {
            asset: Asset {
                id: id.into(),
                original_file_name: file_name,
                original_path: path.into(),
                local_date_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
                exif_info: None,
            },
            stack: None,
        }
    }

    #[test]
    fn base_name_examples() {
        assert_eq!(extract_base_name("IMG_1234.cr2"), "IMG_1234");
        assert_eq!(extract_base_name("IMG_1234_a.jpg"), "IMG_1234");
        assert_eq!(extract_base_name("IMG_1234-edit.jpg"), "IMG_1234");
        assert_eq!(extract_base_name("randomfile.jpg"), "randomfile");
    }

    #[test]
    fn base_name_is_anchored() {
        assert_eq!(extract_base_name("xIMG_1234.jpg"), "xIMG_1234");
        assert_eq!(extract_base_name("IMG_1234x.jpg"), "IMG_1234x");
        assert_eq!(extract_base_name("1IMG_1234.jpg"), "1IMG_1234");
        assert_eq!(extract_base_name("IMG_1234"), "IMG_1234");
        assert_eq!(extract_base_name(""), "");
    }

    #[test]
    fn base_name_only_strips_last_extension() {
        assert_eq!(extract_base_name("IMG_1234.jpg.xmp"), "IMG_1234.jpg");
        assert_eq!(extract_base_name("IMG_1234_a.edited.jpg"), "IMG_1234");
    }

    #[test]
    fn rules_differ_on_underscored_prefixes() {
        assert_eq!(BaseNameRule::Letters.base_name("MY_TRIP_0001_a.jpg"), "MY_TRIP_0001_a");
        assert_eq!(
            BaseNameRule::LettersUnderscore.base_name("MY_TRIP_0001_a.jpg"),
            "MY_TRIP_0001"
        );
    }

    #[test]
    fn singletons_are_dropped() {
        let groups = group_by_base_name(
            vec![
                detail("1", "d/IMG_1.cr2"),
                detail("2", "d/IMG_1_a.jpg"),
                detail("3", "d/IMG_2.jpg"),
            ],
            BaseNameRule::Letters,
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].base_name, "IMG_1");
        let ids: Vec<&str> = groups[0].members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn groups_follow_first_seen_order_and_are_case_sensitive() {
        let groups = group_by_base_name(
            vec![
                detail("1", "IMG_9.jpg"),
                detail("2", "IMG_1.jpg"),
                detail("3", "img_9.jpg"),
                detail("4", "IMG_1.cr2"),
                detail("5", "IMG_9.cr3"),
            ],
            BaseNameRule::Letters,
        );
        let keys: Vec<&str> = groups.iter().map(|g| g.base_name.as_str()).collect();
        assert_eq!(keys, vec!["IMG_9", "IMG_1"]);
        assert_eq!(groups[0].members.len(), 2);
    }

    #[test]
    fn stacked_assets_never_join_a_group() {
        let mut stacked = detail("2", "IMG_1.jpg");
        stacked.stack = Some(StackRef {
            id: "s".into(),
            primary_asset_id: None,
            asset_count: None,
        });
        let groups = group_by_base_name(
            vec![detail("1", "IMG_1.cr2"), stacked],
            BaseNameRule::Letters,
        );
        assert!(groups.is_empty());
    }
}

//! Checks the `productIds` / `topicIds` indices against the folders on disk
//! and rebuilds them when they have drifted.

use hub_common::{Group, Product};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::{error, info};

use super::document;
use super::{checked, ContentStore};
use crate::error::StoreResult;

/// Differences between one index and the folders it should mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDrift {
    /// Indexed ids with no folder.
    pub missing_on_disk: Vec<String>,
    /// Folders with no index entry.
    pub unindexed: Vec<String>,
    /// Ids indexed more than once.
    pub duplicates: Vec<String>,
}

impl IndexDrift {
    pub fn compute(index: &[String], on_disk: &[String]) -> Self {
        let disk: HashSet<&str> = on_disk.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        let mut drift = IndexDrift::default();

        for id in index {
            if !seen.insert(id.as_str()) {
                if !drift.duplicates.contains(id) {
                    drift.duplicates.push(id.clone());
                }
            } else if !disk.contains(id.as_str()) {
                drift.missing_on_disk.push(id.clone());
            }
        }
        drift.unindexed = on_disk
            .iter()
            .filter(|f| !seen.contains(f.as_str()))
            .cloned()
            .collect();
        drift
    }

    pub fn is_clean(&self) -> bool {
        self.missing_on_disk.is_empty() && self.unindexed.is_empty() && self.duplicates.is_empty()
    }
}

/// Keeps indexed ids that still exist (first occurrence, current order), then
/// appends unindexed folders in name order.
pub fn rebuild_index(index: &[String], on_disk: &[String]) -> Vec<String> {
    let disk: HashSet<&str> = on_disk.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut rebuilt: Vec<String> = index
        .iter()
        .filter(|id| disk.contains(id.as_str()) && seen.insert(id.as_str()))
        .cloned()
        .collect();
    rebuilt.extend(on_disk.iter().filter(|f| !seen.contains(f.as_str())).cloned());
    rebuilt
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    pub group: String,
    pub product_ids: IndexDrift,
    /// Drifted `topicIds`, keyed by product folder. Clean products are omitted.
    pub topic_ids: BTreeMap<String, IndexDrift>,
}

impl IndexReport {
    pub fn is_clean(&self) -> bool {
        self.product_ids.is_clean() && self.topic_ids.is_empty()
    }
}

impl ContentStore {
    pub fn verify_group(&self, group: &str) -> StoreResult<IndexReport> {
        let group = checked("group", group)?;
        let group_doc = self.get_group(group)?;
        let product_folders = document::list_subdirs(&self.layout.products_dir(group))?;

        let mut report = IndexReport {
            group: group.to_string(),
            product_ids: IndexDrift::compute(&group_doc.product_ids, &product_folders),
            topic_ids: BTreeMap::new(),
        };

        for folder in &product_folders {
            let product: Product = match document::read(&self.layout.product_config(group, folder)) {
                Ok(product) => product,
                Err(e) => {
                    error!(group, product = %folder, error = %e, "cannot verify product");
                    continue;
                }
            };
            let topic_folders = document::list_subdirs(&self.layout.topics_dir(group, folder))?;
            let drift = IndexDrift::compute(&product.topic_ids, &topic_folders);
            if !drift.is_clean() {
                report.topic_ids.insert(folder.clone(), drift);
            }
        }
        Ok(report)
    }

    /// Rebuilds every drifted index of `group` from the directory listing.
    ///
    /// Returns the report taken before repairing. Clean documents are not rewritten.
    pub fn repair_group(&self, group: &str) -> StoreResult<IndexReport> {
        let report = self.verify_group(group)?;
        let group = checked("group", group)?;

        if !report.product_ids.is_clean() {
            let path = self.layout.group_config(group);
            let mut group_doc: Group = document::read(&path)?;
            let folders = document::list_subdirs(&self.layout.products_dir(group))?;
            group_doc.product_ids = rebuild_index(&group_doc.product_ids, &folders);
            document::write_with_single_backup(&path, &group_doc)?;
            info!(group, products = group_doc.product_ids.len(), "rebuilt productIds");
        }

        for product in report.topic_ids.keys() {
            let path = self.layout.product_config(group, product);
            let mut config: Map<String, Value> = document::read(&path)?;
            let indexed: Vec<String> = config
                .get("topicIds")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default();
            let folders = document::list_subdirs(&self.layout.topics_dir(group, product))?;
            let rebuilt = rebuild_index(&indexed, &folders);
            info!(group, product = %product, topics = rebuilt.len(), "rebuilt topicIds");
            config.insert("topicIds".to_string(), Value::from(rebuilt));
            document::write(&path, &config)?;
        }

        Ok(report)
    }

    /// Verifies every group folder under the content root. Groups that cannot
    /// be read are logged and left out of the result.
    pub fn verify_all(&self) -> StoreResult<Vec<IndexReport>> {
        let groups = document::list_subdirs(&self.layout.groups_dir())?;
        Ok(groups
            .iter()
            .filter_map(|group| match self.verify_group(group) {
                Ok(report) => Some(report),
                Err(e) => {
                    error!(group = %group, error = %e, "cannot verify group");
                    None
                }
            })
            .collect())
    }
}

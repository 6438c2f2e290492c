pub mod aggregate;
pub mod document;
pub mod groups;
pub mod paths;
pub mod products;
pub mod repair;
pub mod topics;

use hub_common::is_safe_folder_id;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::error::{StoreError, StoreResult};
pub use paths::{ContentLayout, GroupDocument};

/// The hierarchical content store rooted at one content directory.
///
/// Directory presence is authoritative; `productIds` and `topicIds` are
/// indices kept in step with it by every structural operation here.
#[derive(Debug, Clone)]
pub struct ContentStore {
    layout: ContentLayout,
    default_group: String,
}

/// A document together with the folder it lives in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Located<T> {
    pub folder_id: String,
    #[serde(flatten)]
    pub doc: T,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>, default_group: impl Into<String>) -> Self {
        Self {
            layout: ContentLayout::new(root),
            default_group: default_group.into(),
        }
    }

    pub fn layout(&self) -> &ContentLayout {
        &self.layout
    }

    pub fn default_group(&self) -> &str {
        &self.default_group
    }
}

/// Rejects ids from request paths that could escape the content tree.
pub(crate) fn checked<'a>(kind: &str, id: &'a str) -> StoreResult<&'a str> {
    if is_safe_folder_id(id) {
        Ok(id)
    } else {
        Err(StoreError::Validation(format!("invalid {kind} id {id:?}")))
    }
}

/// Replaces a path-based not-found message with a domain one.
pub(crate) fn labelled<T>(result: StoreResult<T>, label: impl FnOnce() -> String) -> StoreResult<T> {
    result.map_err(|e| match e {
        StoreError::NotFound(_) => StoreError::NotFound(label()),
        other => other,
    })
}

/// Converts request JSON into a typed document, reporting shape errors as validation failures.
pub(crate) fn typed<T: DeserializeOwned>(value: Value, what: &str) -> StoreResult<T> {
    serde_json::from_value(value).map_err(|e| StoreError::Validation(format!("invalid {what}: {e}")))
}

/// Reads a required, non-empty string field from a request body.
pub(crate) fn required_str<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

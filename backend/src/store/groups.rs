use hub_common::{slug, Announcement, Group, Incident};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use tracing::{error, info};

use super::document;
use super::{checked, labelled, required_str, typed, ContentStore, GroupDocument, Located};
use crate::error::{StoreError, StoreResult};

impl ContentStore {
    /// Every readable group, in folder order. Unreadable configs are logged and skipped.
    pub fn list_groups(&self) -> StoreResult<Vec<Located<Group>>> {
        let mut groups = Vec::new();
        for folder in document::list_subdirs(&self.layout.groups_dir())? {
            match document::read::<Group>(&self.layout.group_config(&folder)) {
                Ok(doc) => groups.push(Located { folder_id: folder, doc }),
                Err(e) => error!(group = %folder, error = %e, "skipping unreadable group"),
            }
        }
        Ok(groups)
    }

    pub fn get_group(&self, group: &str) -> StoreResult<Group> {
        let group = checked("group", group)?;
        labelled(document::read(&self.layout.group_config(group)), || {
            format!("group {group}")
        })
    }

    /// Creates a group folder with its config and empty group documents.
    pub fn create_group(&self, draft: Value) -> StoreResult<Located<Group>> {
        let (Some(id), Some(_)) = (required_str(&draft, "id"), required_str(&draft, "name")) else {
            return Err(StoreError::Validation("group id and name are required".into()));
        };
        let folder = slug(id);
        if folder.is_empty() {
            return Err(StoreError::Validation(format!("group id {id:?} has no usable characters")));
        }
        let dir = self.layout.group_dir(&folder);
        if dir.exists() {
            return Err(StoreError::Conflict(format!("group {folder} already exists")));
        }

        let mut group: Group = typed(draft, "group")?;
        group.product_ids.clear();
        self.validate_countries(&folder, &group)?;

        document::write(&self.layout.group_config(&folder), &group)?;
        let products_dir = self.layout.products_dir(&folder);
        fs::create_dir_all(&products_dir).map_err(|e| StoreError::io(&products_dir, e))?;
        for doc in GroupDocument::ALL {
            document::create_if_absent(&self.layout.group_document(&folder, doc), &doc.empty_value())?;
        }

        info!(group = %folder, "created group");
        Ok(Located { folder_id: folder, doc: group })
    }

    /// Shallow-merges `patch` into the group config.
    pub fn update_group(&self, group: &str, patch: Value) -> StoreResult<Group> {
        let group = checked("group", group)?;
        let path = self.layout.group_config(group);
        let existing: Value = labelled(document::read(&path), || format!("group {group}"))?;
        let merged = document::shallow_merge(existing, patch)?;
        let parsed: Group = typed(merged.clone(), "group")?;
        self.validate_countries(group, &parsed)?;
        document::write(&path, &merged)?;
        Ok(parsed)
    }

    /// Country codes are unique across all groups and each group has at most one default.
    fn validate_countries(&self, folder: &str, group: &Group) -> StoreResult<()> {
        let mut seen = HashSet::new();
        for country in &group.countries {
            let code = country.code.trim().to_ascii_lowercase();
            if code.is_empty() {
                return Err(StoreError::Validation("country code must not be empty".into()));
            }
            if !seen.insert(code) {
                return Err(StoreError::Validation(format!(
                    "country {} is listed twice",
                    country.code
                )));
            }
        }
        if group.countries.iter().filter(|c| c.default).count() > 1 {
            return Err(StoreError::Validation("only one country may be the default".into()));
        }

        for other in self.list_groups()? {
            if other.folder_id == folder {
                continue;
            }
            if let Some(country) = group.countries.iter().find(|c| other.doc.has_country(&c.code)) {
                return Err(StoreError::Conflict(format!(
                    "country {} already belongs to group {}",
                    country.code, other.folder_id
                )));
            }
        }
        Ok(())
    }

    /// Reads a group-scoped document; a missing file reads as empty.
    pub fn read_group_document(&self, group: &str, doc: GroupDocument) -> StoreResult<Value> {
        let group = self.require_group(group)?;
        document::read_or(&self.layout.group_document(group, doc), doc.empty_value())
    }

    pub fn write_group_document(&self, group: &str, doc: GroupDocument, value: Value) -> StoreResult<Value> {
        let group = self.require_group(group)?;
        match doc {
            GroupDocument::Contact if !value.is_object() => {
                return Err(StoreError::Validation("contact must be a JSON object".into()));
            }
            GroupDocument::Incidents => {
                typed::<Vec<Incident>>(value.clone(), "incidents")?;
            }
            GroupDocument::Popups | GroupDocument::Banners => {
                typed::<Vec<Announcement>>(value.clone(), doc.file_name())?;
            }
            GroupDocument::Contact => {}
        }
        document::write(&self.layout.group_document(group, doc), &value)?;
        Ok(value)
    }

    pub(crate) fn require_group<'a>(&self, group: &'a str) -> StoreResult<&'a str> {
        let group = checked("group", group)?;
        if self.layout.group_config(group).is_file() {
            Ok(group)
        } else {
            Err(StoreError::NotFound(format!("group {group}")))
        }
    }
}

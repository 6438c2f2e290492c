use hub_common::{slug, Group, Product, ReleaseNote, DEFAULT_PERSONAS};
use serde_json::Value;
use std::fs;
use tracing::{error, info, warn};

use super::document;
use super::{checked, labelled, required_str, typed, ContentStore, Located};
use crate::error::{StoreError, StoreResult};

impl ContentStore {
    /// Creates a product under `group` and appends it to the group's `productIds`.
    ///
    /// Steps run in order without rollback: product folder, config, `topics/`,
    /// `release-notes.json`, then the group index.
    pub fn create_product(&self, group: &str, draft: Value) -> StoreResult<Located<Product>> {
        let group = checked("group", group)?;
        let (Some(id), Some(_)) = (required_str(&draft, "id"), required_str(&draft, "name")) else {
            return Err(StoreError::Validation("product id and name are required".into()));
        };
        let folder = slug(id);
        if folder.is_empty() {
            return Err(StoreError::Validation(format!("product id {id:?} has no usable characters")));
        }

        let group_path = self.layout.group_config(group);
        let mut group_doc: Group = labelled(document::read(&group_path), || format!("group {group}"))?;

        let dir = self.layout.product_dir(group, &folder);
        if dir.exists() {
            return Err(StoreError::Conflict(format!("product {folder} already exists")));
        }

        let personas_given = draft.get("personas").is_some();
        let mut product: Product = typed(draft, "product")?;
        if !personas_given {
            product.personas = DEFAULT_PERSONAS.iter().map(|p| p.to_string()).collect();
        }
        product.topic_ids.clear();

        let topics_dir = self.layout.topics_dir(group, &folder);
        fs::create_dir_all(&topics_dir).map_err(|e| StoreError::io(&topics_dir, e))?;
        document::write(&self.layout.product_config(group, &folder), &product)?;
        document::write(&self.layout.release_notes(group, &folder), &Vec::<ReleaseNote>::new())?;

        if !group_doc.product_ids.contains(&folder) {
            group_doc.product_ids.push(folder.clone());
            document::write_with_single_backup(&group_path, &group_doc)?;
        }

        info!(group, product = %folder, "created product");
        Ok(Located { folder_id: folder, doc: product })
    }

    pub fn get_product(&self, group: &str, product: &str) -> StoreResult<Product> {
        let group = checked("group", group)?;
        let product = checked("product", product)?;
        labelled(document::read(&self.layout.product_config(group, product)), || {
            format!("product {product}")
        })
    }

    /// `{...existing, ...patch}` on the product config. Arrays in `patch` replace stored ones.
    pub fn update_product(&self, group: &str, product: &str, patch: Value) -> StoreResult<Product> {
        let group = checked("group", group)?;
        let product = checked("product", product)?;
        let path = self.layout.product_config(group, product);
        let existing: Value = labelled(document::read(&path), || format!("product {product}"))?;

        let merged = document::shallow_merge(existing, patch)?;
        let parsed: Product = typed(merged.clone(), "product")?;
        document::write(&path, &merged)?;

        info!(group, product, "updated product");
        Ok(parsed)
    }

    /// Removes the product folder and its index entry. Succeeds when already gone.
    pub fn delete_product(&self, group: &str, product: &str) -> StoreResult<()> {
        let group = checked("group", group)?;
        let product = checked("product", product)?;

        document::remove_dir_all_if_exists(&self.layout.product_dir(group, product))?;

        let group_path = self.layout.group_config(group);
        let mut group_doc: Group = match document::read(&group_path) {
            Ok(doc) => doc,
            Err(StoreError::NotFound(_)) => {
                warn!(group, product, "deleted product of a group without config");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let before = group_doc.product_ids.len();
        group_doc.product_ids.retain(|id| id != product);
        if group_doc.product_ids.len() != before {
            document::write_with_single_backup(&group_path, &group_doc)?;
        }

        info!(group, product, "deleted product");
        Ok(())
    }

    /// Products in `productIds` order. Unreadable ones are logged and skipped.
    pub fn list_products(&self, group: &str) -> StoreResult<Vec<Located<Product>>> {
        let group_doc = self.get_group(group)?;
        Ok(self.load_products(group, &group_doc))
    }

    pub(crate) fn load_products(&self, group: &str, group_doc: &Group) -> Vec<Located<Product>> {
        let mut products = Vec::with_capacity(group_doc.product_ids.len());
        for folder in &group_doc.product_ids {
            match self.get_product(group, folder) {
                Ok(doc) => products.push(Located {
                    folder_id: folder.clone(),
                    doc,
                }),
                Err(e) => error!(group, product = %folder, error = %e, "skipping unreadable product"),
            }
        }
        products
    }

    pub fn get_release_notes(&self, group: &str, product: &str) -> StoreResult<Vec<ReleaseNote>> {
        let dir = self.require_product(group, product)?;
        document::read_or(&dir.join(super::paths::RELEASE_NOTES_FILE), Vec::new())
    }

    pub fn put_release_notes(
        &self,
        group: &str,
        product: &str,
        notes: Vec<ReleaseNote>,
    ) -> StoreResult<Vec<ReleaseNote>> {
        let dir = self.require_product(group, product)?;
        document::write(&dir.join(super::paths::RELEASE_NOTES_FILE), &notes)?;
        Ok(notes)
    }

    pub(crate) fn require_product(&self, group: &str, product: &str) -> StoreResult<std::path::PathBuf> {
        let group = checked("group", group)?;
        let product = checked("product", product)?;
        if self.layout.product_config(group, product).is_file() {
            Ok(self.layout.product_dir(group, product))
        } else {
            Err(StoreError::NotFound(format!("product {product}")))
        }
    }
}

use hub_common::{slug, Article, Product, Topic, TopicEntry};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use tracing::{error, info};

use super::document;
use super::{checked, labelled, ContentStore};
use crate::error::{StoreError, StoreResult};

impl ContentStore {
    /// Synchronises the product's topic folders with `entries`.
    ///
    /// Only entries tagged with this product's `id` take part. Folders whose
    /// slug is not desired are removed with their articles; desired topics get
    /// their config rewritten and an empty `articles.json` if they had none;
    /// finally `topicIds` is replaced by the desired slugs in input order.
    /// There is no rollback: a failure part-way leaves the folders and the
    /// index out of step until the next reconcile or repair.
    pub fn reconcile_topics(
        &self,
        group: &str,
        product: &str,
        entries: Vec<TopicEntry>,
    ) -> StoreResult<Vec<TopicEntry>> {
        let group = checked("group", group)?;
        let product = checked("product", product)?;
        let config_path = self.layout.product_config(group, product);
        let mut product_doc: Map<String, Value> =
            labelled(document::read(&config_path), || format!("product {product}"))?;
        let product_id = product_doc
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or(product)
            .to_string();

        let desired: Vec<TopicEntry> = entries
            .into_iter()
            .filter(|e| e.product_id.as_deref() == Some(product_id.as_str()))
            .collect();
        let desired_slugs = desired
            .iter()
            .map(|e| {
                let folder = slug(&e.topic.id);
                if folder.is_empty() {
                    Err(StoreError::Validation(format!(
                        "topic id {:?} has no usable characters",
                        e.topic.id
                    )))
                } else {
                    Ok(folder)
                }
            })
            .collect::<StoreResult<Vec<String>>>()?;

        let topics_dir = self.layout.topics_dir(group, product);
        fs::create_dir_all(&topics_dir).map_err(|e| StoreError::io(&topics_dir, e))?;
        let existing = document::list_subdirs(&topics_dir)?;

        let keep: HashSet<&str> = desired_slugs.iter().map(String::as_str).collect();
        for folder in existing.iter().filter(|f| !keep.contains(f.as_str())) {
            document::remove_dir_all_if_exists(&topics_dir.join(folder))?;
            info!(group, product, topic = %folder, "removed topic");
        }

        for (entry, folder) in desired.iter().zip(&desired_slugs) {
            document::write(&self.layout.topic_config(group, product, folder), &entry.topic)?;
            document::create_if_absent(
                &self.layout.articles(group, product, folder),
                &Vec::<Article>::new(),
            )?;
        }

        product_doc.insert("topicIds".to_string(), Value::from(desired_slugs.clone()));
        document::write(&config_path, &product_doc)?;

        info!(group, product, topics = desired_slugs.len(), "reconciled topics");
        Ok(desired)
    }

    /// Topics in `topicIds` order, tagged with the product id.
    pub fn list_topics(&self, group: &str, product: &str) -> StoreResult<Vec<TopicEntry>> {
        let product_doc = self.get_product(group, product)?;
        Ok(self
            .load_topics(group, product, &product_doc)
            .into_iter()
            .map(|(_, topic)| TopicEntry {
                product_id: Some(product_doc.id.clone()),
                topic,
            })
            .collect())
    }

    /// Reads every indexed topic of a product. Unreadable ones are logged and skipped.
    pub(crate) fn load_topics(&self, group: &str, product: &str, product_doc: &Product) -> Vec<(String, Topic)> {
        let mut topics = Vec::with_capacity(product_doc.topic_ids.len());
        for folder in &product_doc.topic_ids {
            match self.get_topic(group, product, folder) {
                Ok(topic) => topics.push((folder.clone(), topic)),
                Err(e) => error!(group, product, topic = %folder, error = %e, "skipping unreadable topic"),
            }
        }
        topics
    }

    pub fn get_topic(&self, group: &str, product: &str, topic: &str) -> StoreResult<Topic> {
        let group = checked("group", group)?;
        let product = checked("product", product)?;
        let topic = checked("topic", topic)?;
        labelled(document::read(&self.layout.topic_config(group, product, topic)), || {
            format!("topic {topic}")
        })
    }

    pub fn get_articles(&self, group: &str, product: &str, topic: &str) -> StoreResult<Vec<Article>> {
        self.require_topic(group, product, topic)?;
        document::read_or(&self.layout.articles(group, product, topic), Vec::new())
    }

    pub fn put_articles(
        &self,
        group: &str,
        product: &str,
        topic: &str,
        articles: Vec<Article>,
    ) -> StoreResult<Vec<Article>> {
        self.require_topic(group, product, topic)?;
        document::write(&self.layout.articles(group, product, topic), &articles)?;
        Ok(articles)
    }

    fn require_topic(&self, group: &str, product: &str, topic: &str) -> StoreResult<()> {
        let group = checked("group", group)?;
        let product = checked("product", product)?;
        let topic = checked("topic", topic)?;
        if self.layout.topic_dir(group, product, topic).is_dir() {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("topic {topic}")))
        }
    }
}

//! Country-resolved reads composed from many documents.
//!
//! Fan-out reads never fail because one child is missing or corrupt: the
//! child is logged and left out of the result.

use hub_common::{
    filter_for_country, resolve_article, sort_newest_first, Announcement, ArticleView, Group,
    Incident, Product, Regional, ReleaseNote, Topic,
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{error, warn};

use super::document;
use super::{checked, ContentStore, GroupDocument, Located};
use crate::error::{StoreError, StoreResult};

/// `{topicFolder: [articles]}`
pub type TopicArticles = BTreeMap<String, Vec<ArticleView>>;
/// `{productFolder: {topicFolder: [articles]}}`
pub type ArticleIndex = BTreeMap<String, TopicArticles>;

/// Where on the public site announcements are being requested for.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Placement {
    pub product: Option<String>,
    pub topic: Option<String>,
    pub page: Option<String>,
}

impl ContentStore {
    /// The first group (folder order) listing `code`, else the configured default group.
    pub fn group_for_country(&self, code: &str) -> StoreResult<Located<Group>> {
        if let Some(found) = self
            .list_groups()?
            .into_iter()
            .find(|g| g.doc.has_country(code))
        {
            return Ok(found);
        }

        warn!(country = code, fallback = %self.default_group, "no group lists country; using default group");
        let doc = self.get_group(&self.default_group)?;
        Ok(Located {
            folder_id: self.default_group.clone(),
            doc,
        })
    }

    pub fn products_for_country(&self, code: &str) -> StoreResult<Vec<Located<Product>>> {
        let group = self.group_for_country(code)?;
        Ok(self.visible_products(&group, code))
    }

    pub fn product_for_country(&self, code: &str, product: &str) -> StoreResult<Product> {
        let product = checked("product", product)?;
        self.products_for_country(code)?
            .into_iter()
            .find(|p| p.folder_id == product)
            .map(|p| p.doc)
            .ok_or_else(|| StoreError::NotFound(format!("product {product}")))
    }

    /// `{productFolder: [topics]}` for every product visible in the country.
    pub fn topics_for_country(&self, code: &str) -> StoreResult<BTreeMap<String, Vec<Topic>>> {
        let group = self.group_for_country(code)?;
        let mut out = BTreeMap::new();
        for product in self.visible_products(&group, code) {
            let topics = self.visible_topics(&group.folder_id, &product, code);
            out.insert(product.folder_id, topics.into_iter().map(|(_, t)| t).collect());
        }
        Ok(out)
    }

    pub fn product_topics_for_country(&self, code: &str, product: &str) -> StoreResult<Vec<Topic>> {
        let group = self.group_for_country(code)?;
        let product = self.visible_product(&group, code, product)?;
        Ok(self
            .visible_topics(&group.folder_id, &product, code)
            .into_iter()
            .map(|(_, t)| t)
            .collect())
    }

    pub fn articles_for_country(&self, code: &str) -> StoreResult<ArticleIndex> {
        let group = self.group_for_country(code)?;
        let mut out = ArticleIndex::new();
        for product in self.visible_products(&group, code) {
            let topics = self.visible_topics(&group.folder_id, &product, code);
            let articles = self.articles_by_topic(&group.folder_id, &product.folder_id, &topics, Some(code));
            out.insert(product.folder_id, articles);
        }
        Ok(out)
    }

    pub fn topic_articles_for_country(
        &self,
        code: &str,
        product: &str,
        topic: &str,
    ) -> StoreResult<Vec<ArticleView>> {
        let topic = checked("topic", topic)?;
        let group = self.group_for_country(code)?;
        let product = self.visible_product(&group, code, product)?;
        let topics = self.visible_topics(&group.folder_id, &product, code);
        if !topics.iter().any(|(folder, _)| folder == topic) {
            return Err(StoreError::NotFound(format!("topic {topic}")));
        }
        let mut articles = self.articles_by_topic(
            &group.folder_id,
            &product.folder_id,
            &topics,
            Some(code),
        );
        Ok(articles.remove(topic).unwrap_or_default())
    }

    /// Every article of one product, unfiltered, keyed `{product: {topic: [...]}}`.
    pub fn product_articles(&self, group: &str, product: &str) -> StoreResult<ArticleIndex> {
        let product_doc = self.get_product(group, product)?;
        let topics = self.load_topics(group, product, &product_doc);
        let mut out = ArticleIndex::new();
        out.insert(
            product.to_string(),
            self.articles_by_topic(group, product, &topics, None),
        );
        Ok(out)
    }

    /// `{productFolder: [notes]}` newest first; products without matching notes are left out.
    pub fn release_notes_for_country(&self, code: &str) -> StoreResult<BTreeMap<String, Vec<ReleaseNote>>> {
        let group = self.group_for_country(code)?;
        let mut out = BTreeMap::new();
        for product in self.visible_products(&group, code) {
            let notes = match self.get_release_notes(&group.folder_id, &product.folder_id) {
                Ok(notes) => notes,
                Err(e) => {
                    error!(product = %product.folder_id, error = %e, "skipping unreadable release notes");
                    continue;
                }
            };
            let mut notes = filter_for_country(notes, code);
            if notes.is_empty() {
                continue;
            }
            sort_newest_first(&mut notes);
            out.insert(product.folder_id, notes);
        }
        Ok(out)
    }

    pub fn incidents_for_country(&self, code: &str) -> StoreResult<Vec<Incident>> {
        let group = self.group_for_country(code)?;
        let incidents: Vec<Incident> = self.group_list(&group.folder_id, GroupDocument::Incidents)?;
        Ok(filter_for_country(incidents, code))
    }

    /// Active popups or banners for the country that apply to `placement`.
    pub fn announcements_for_country(
        &self,
        code: &str,
        doc: GroupDocument,
        placement: &Placement,
    ) -> StoreResult<Vec<Announcement>> {
        let group = self.group_for_country(code)?;
        let items: Vec<Announcement> = self.group_list(&group.folder_id, doc)?;
        Ok(items
            .into_iter()
            .filter(|a| a.active && a.available_in(code))
            .filter(|a| {
                a.scope.applies_to(
                    placement.product.as_deref(),
                    placement.topic.as_deref(),
                    placement.page.as_deref(),
                )
            })
            .collect())
    }

    pub fn contact_for_country(&self, code: &str) -> StoreResult<Value> {
        let group = self.group_for_country(code)?;
        self.read_group_document(&group.folder_id, GroupDocument::Contact)
    }

    fn group_list<T: serde::de::DeserializeOwned>(&self, group: &str, doc: GroupDocument) -> StoreResult<Vec<T>> {
        document::read_or(&self.layout.group_document(group, doc), Vec::new())
    }

    fn visible_products(&self, group: &Located<Group>, code: &str) -> Vec<Located<Product>> {
        self.load_products(&group.folder_id, &group.doc)
            .into_iter()
            .filter(|p| p.doc.available_in(code))
            .collect()
    }

    fn visible_product(&self, group: &Located<Group>, code: &str, product: &str) -> StoreResult<Located<Product>> {
        let product = checked("product", product)?;
        if !group.doc.product_ids.iter().any(|id| id == product) {
            return Err(StoreError::NotFound(format!("product {product}")));
        }
        let doc = self.get_product(&group.folder_id, product)?;
        if !doc.available_in(code) {
            return Err(StoreError::NotFound(format!("product {product}")));
        }
        Ok(Located {
            folder_id: product.to_string(),
            doc,
        })
    }

    fn visible_topics(&self, group: &str, product: &Located<Product>, code: &str) -> Vec<(String, Topic)> {
        self.load_topics(group, &product.folder_id, &product.doc)
            .into_iter()
            .filter(|(_, t)| t.available_in(code))
            .collect()
    }

    /// Articles of each topic, optionally country-filtered, with subtopics
    /// resolved against `topics`.
    fn articles_by_topic(
        &self,
        group: &str,
        product: &str,
        topics: &[(String, Topic)],
        code: Option<&str>,
    ) -> TopicArticles {
        let known: Vec<Topic> = topics.iter().map(|(_, t)| t.clone()).collect();
        let mut out = TopicArticles::new();
        for (folder, _) in topics {
            let articles = match self.get_articles(group, product, folder) {
                Ok(articles) => articles,
                Err(e) => {
                    error!(product, topic = %folder, error = %e, "skipping unreadable articles");
                    continue;
                }
            };
            let articles = match code {
                Some(code) => filter_for_country(articles, code),
                None => articles,
            };
            let views = articles.iter().map(|a| resolve_article(a, &known)).collect();
            out.insert(folder.clone(), views);
        }
        out
    }
}

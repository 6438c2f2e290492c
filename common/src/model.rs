use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::country::Regional;

/// Top-level region bundling countries, products and shared content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub countries: Vec<Country>,
    /// Folder slugs of the products under this group, in display order.
    pub product_ids: Vec<String>,
    pub personas: Vec<Persona>,
    pub navigation: Navigation,
    pub quick_access_cards: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Group {
    pub fn has_country(&self, code: &str) -> bool {
        self.countries
            .iter()
            .any(|c| c.code.eq_ignore_ascii_case(code.trim()))
    }

    pub fn default_country(&self) -> Option<&Country> {
        self.countries.iter().find(|c| c.default)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Country {
    pub code: String,
    pub name: String,
    pub language: String,
    pub currency: String,
    pub currency_symbol: String,
    pub date_format: String,
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Persona {
    pub id: String,
    pub label: String,
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Navigation {
    pub main: Vec<NavItem>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavItem {
    pub label: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    #[default]
    Cloud,
    Desktop,
}

pub const DEFAULT_PERSONAS: [&str; 2] = ["customer", "accountant"];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ProductType,
    pub personas: Vec<String>,
    pub categories: Vec<String>,
    pub countries: Vec<String>,
    pub icon: String,
    #[serde(rename = "knowledgebase_collection")]
    pub knowledgebase_collection: String,
    /// Folder slugs of the topics under this product, in display order.
    pub topic_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Regional for Product {
    fn countries(&self) -> Option<&[String]> {
        Some(&self.countries)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_topic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_on_product_landing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Regional for Topic {
    fn countries(&self) -> Option<&[String]> {
        self.countries.as_deref()
    }
}

/// A topic as exchanged with the admin UI: tagged with the owning product's id.
///
/// `productId` is never written to disk; nesting under the product folder implies it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(flatten)]
    pub topic: Topic,
}

/// Body of the bulk topic endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportHubs {
    #[serde(default)]
    pub support_hubs: Vec<TopicEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleType {
    #[default]
    Article,
    Subtopic,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ArticleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Regional for Article {
    fn countries(&self) -> Option<&[String]> {
        self.countries.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseNote {
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Regional for ReleaseNote {
    fn countries(&self) -> Option<&[String]> {
        self.countries.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Incident {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Regional for Incident {
    fn countries(&self) -> Option<&[String]> {
        self.countries.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    #[default]
    Global,
    Product,
    Page,
    Topic,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scope {
    #[serde(rename = "type")]
    pub kind: ScopeKind,
    pub product_ids: Vec<String>,
    pub page_ids: Vec<String>,
    pub topic_ids: Vec<String>,
}

impl Scope {
    /// Whether a record with this scope shows on the given location.
    ///
    /// Non-global scopes need the matching id to be supplied and listed.
    pub fn applies_to(&self, product: Option<&str>, topic: Option<&str>, page: Option<&str>) -> bool {
        let listed = |ids: &[String], wanted: Option<&str>| {
            wanted.is_some_and(|w| ids.iter().any(|id| id == w))
        };
        match self.kind {
            ScopeKind::Global => true,
            ScopeKind::Product => listed(&self.product_ids, product),
            ScopeKind::Topic => listed(&self.topic_ids, topic),
            ScopeKind::Page => listed(&self.page_ids, page),
        }
    }
}

/// A banner or popup shown on the public site.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Announcement {
    pub id: String,
    pub active: bool,
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Regional for Announcement {
    fn countries(&self) -> Option<&[String]> {
        self.countries.as_deref()
    }
}

pub type Popup = Announcement;
pub type Banner = Announcement;

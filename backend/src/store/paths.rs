use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";
pub const ARTICLES_FILE: &str = "articles.json";
pub const RELEASE_NOTES_FILE: &str = "release-notes.json";

/// Group-scoped documents stored beside a group's config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDocument {
    Incidents,
    Popups,
    Banners,
    Contact,
}

impl GroupDocument {
    pub const ALL: [GroupDocument; 4] = [
        GroupDocument::Incidents,
        GroupDocument::Popups,
        GroupDocument::Banners,
        GroupDocument::Contact,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            GroupDocument::Incidents => "incidents.json",
            GroupDocument::Popups => "popups.json",
            GroupDocument::Banners => "banners.json",
            GroupDocument::Contact => "contact.json",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|doc| doc.file_name().trim_end_matches(".json") == name)
    }

    /// Value written when the document is scaffolded or missing.
    pub fn empty_value(self) -> serde_json::Value {
        match self {
            GroupDocument::Contact => serde_json::json!({}),
            _ => serde_json::json!([]),
        }
    }
}

/// Maps positions in the content tree to paths under the content root.
///
/// `groups/<g>/config.json`
/// `groups/<g>/products/<p>/{config.json, release-notes.json}`
/// `groups/<g>/products/<p>/topics/<t>/{config.json, articles.json}`
#[derive(Debug, Clone)]
pub struct ContentLayout {
    root: PathBuf,
}

impl ContentLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn groups_dir(&self) -> PathBuf {
        self.root.join("groups")
    }

    pub fn group_dir(&self, group: &str) -> PathBuf {
        self.groups_dir().join(group)
    }

    pub fn group_config(&self, group: &str) -> PathBuf {
        self.group_dir(group).join(CONFIG_FILE)
    }

    pub fn group_document(&self, group: &str, doc: GroupDocument) -> PathBuf {
        self.group_dir(group).join(doc.file_name())
    }

    pub fn products_dir(&self, group: &str) -> PathBuf {
        self.group_dir(group).join("products")
    }

    pub fn product_dir(&self, group: &str, product: &str) -> PathBuf {
        self.products_dir(group).join(product)
    }

    pub fn product_config(&self, group: &str, product: &str) -> PathBuf {
        self.product_dir(group, product).join(CONFIG_FILE)
    }

    pub fn release_notes(&self, group: &str, product: &str) -> PathBuf {
        self.product_dir(group, product).join(RELEASE_NOTES_FILE)
    }

    pub fn topics_dir(&self, group: &str, product: &str) -> PathBuf {
        self.product_dir(group, product).join("topics")
    }

    pub fn topic_dir(&self, group: &str, product: &str, topic: &str) -> PathBuf {
        self.topics_dir(group, product).join(topic)
    }

    pub fn topic_config(&self, group: &str, product: &str, topic: &str) -> PathBuf {
        self.topic_dir(group, product, topic).join(CONFIG_FILE)
    }

    pub fn articles(&self, group: &str, product: &str, topic: &str) -> PathBuf {
        self.topic_dir(group, product, topic).join(ARTICLES_FILE)
    }
}

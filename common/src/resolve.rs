use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::{Article, ArticleType, ReleaseNote, Topic};

/// Where an article's display fields came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Own,
    Inherited,
    NotFound,
}

/// An article ready for display, with subtopic references resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ArticleType,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
    pub resolution: Resolution,
}

/// Resolves display fields for an article.
///
/// A subtopic missing its title or description takes them from the topic
/// with the same id. When no such topic is among `topics` the view is marked
/// [`Resolution::NotFound`] and keeps whatever fields the article has.
pub fn resolve_article(article: &Article, topics: &[Topic]) -> ArticleView {
    let mut view = ArticleView {
        id: article.id.clone(),
        kind: article.kind,
        title: article.title.clone(),
        description: article.description.clone(),
        countries: article.countries.clone(),
        resolution: Resolution::Own,
    };

    let complete = article.title.is_some() && article.description.is_some();
    if article.kind != ArticleType::Subtopic || complete {
        return view;
    }

    match topics.iter().find(|t| t.id == article.id) {
        Some(topic) => {
            view.title.get_or_insert_with(|| topic.title.clone());
            view.description.get_or_insert_with(|| topic.description.clone());
            view.resolution = Resolution::Inherited;
        }
        None => view.resolution = Resolution::NotFound,
    }
    view
}

impl ReleaseNote {
    /// Parses `date` as `YYYY-MM-DD` or RFC 3339.
    pub fn published_at(&self) -> Option<NaiveDateTime> {
        let raw = self.date.trim();
        if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return day.and_hms_opt(0, 0, 0);
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.naive_utc())
    }
}

/// Sorts newest first. Notes with unparseable dates go last, keeping their order.
pub fn sort_newest_first(notes: &mut [ReleaseNote]) {
    notes.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
}

pub mod auth;
pub mod country;
pub mod model;
pub mod resolve;
pub mod slug;

pub use country::{filter_for_country, Regional};
pub use model::*;
pub use resolve::{resolve_article, sort_newest_first, ArticleView, Resolution};
pub use slug::{is_safe_folder_id, slug};

//! Resource services: free async functions over a `DatabaseConnection`.

pub mod audit;
pub mod bracket;
pub mod bulk;
pub mod district;
pub mod download;
pub mod media;
pub mod member;
pub mod news;
pub mod player;
pub mod system;
pub mod tournament;
pub mod user;

/// Trims and drops empty optional strings coming from forms.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

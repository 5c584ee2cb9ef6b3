pub mod errors;
pub mod validation;
pub mod db;
pub mod district;
pub mod member;
pub mod player;
pub mod achievement;
pub mod tournament;
pub mod tournament_registration;
pub mod news_article;
pub mod media_item;
pub mod download;
pub mod user;
pub mod user_role;
pub mod user_credentials;
pub mod audit_log;

#[cfg(test)]
mod tests;

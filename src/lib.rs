pub mod catalog;
pub mod config;
pub mod db;
pub mod filter;
pub mod import;
pub mod labels;
pub mod lists;
pub mod nav;
pub mod poster;
pub mod prompt;
pub mod selection;
pub mod session;
pub mod stats;

/// Application name for XDG paths
pub const APP_NAME: &str = "shelfmark";

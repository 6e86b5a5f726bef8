//! gymfuel - workout logging, macro tracking, food lookup and exercise image mapping

pub mod catalog;
pub mod config;
pub mod db;
pub mod images;
pub mod nutrition;
pub mod workout;

pub use config::Config;
pub use db::Database;

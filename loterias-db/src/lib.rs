pub mod config;
pub mod db;
pub mod models;

pub use rusqlite;

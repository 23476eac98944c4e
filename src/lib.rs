pub mod api;
pub mod catalog;
pub mod cli;
pub mod db;
pub mod models;

pub use db::Database;

//! SQLite backend for the canteen engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;

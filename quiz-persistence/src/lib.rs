pub mod connection;
pub mod entities;
pub mod repositories;
pub mod sql_store;

pub use sql_store::SqlStore;

pub mod connection;
pub mod migrations;
pub mod subscription_operations;

pub use connection::{open_database, open_in_memory};

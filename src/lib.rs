pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod shared;

pub use shared::errors::{AppError, AppResult};

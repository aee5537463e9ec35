//! HTTP layer: page routes, CSV download and the JSON API

pub mod compression;
pub mod error;
pub mod handler;
pub mod pages;
pub mod server;

pub use error::AppError;
pub use server::{build_router, AppState, HttpServer};

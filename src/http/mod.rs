//! HTTP server, request helpers and response shapes.

pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};

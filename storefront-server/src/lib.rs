//! `storefront-server` answers shoppers' questions over HTTP.
//! It ingests the store's knowledge base at startup and serves `POST /chat/`
//! through the `storefront-rag` pipeline.

pub mod config;
pub mod error;
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorBody, ServerError};
pub use server::{AppState, ChatRequest, ChatResponse, app_router, bootstrap, build_state, run_server};

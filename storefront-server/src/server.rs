use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::{Deserialize, Serialize};
use storefront_rag::{
    EmbeddingProvider, Generator, OpenAIEmbeddingProvider, RagPipeline, RecursiveChunker,
    TextLoader, TogetherGenerator, VectorIndex, indexer,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{
    config::ServerConfig,
    error::{ApiError, ServerError},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Shared, read-only request state. Built once by [`bootstrap`] or [`build_state`].
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").field("indexed_chunks", &self.pipeline.index().len()).finish()
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    // `/chat` is served too so clients that omit the trailing slash keep working.
    Router::new()
        .route("/chat/", post(chat))
        .route("/chat", post(chat))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Construct the hosted collaborators from `config` and ingest the knowledge base.
pub async fn bootstrap(config: &ServerConfig) -> Result<AppState, ServerError> {
    let mut embedder =
        OpenAIEmbeddingProvider::new(config.embedding.api_key.clone().unwrap_or_default())?;
    if let Some(model) = &config.embedding.model {
        embedder = embedder.with_model(model);
    }
    if let Some(base_url) = &config.embedding.base_url {
        embedder = embedder.with_base_url(base_url);
    }

    let mut generator = TogetherGenerator::new(config.llm.api_key.clone())?;
    if let Some(model) = &config.llm.model {
        generator = generator.with_model(model);
    }
    if let Some(max_tokens) = config.llm.max_tokens {
        generator = generator.with_max_tokens(max_tokens);
    }
    if let Some(base_url) = &config.llm.base_url {
        generator = generator.with_base_url(base_url);
    }

    build_state(config, Arc::new(embedder), Arc::new(generator)).await
}

/// Load the knowledge base, build the index, and assemble the pipeline around
/// the given collaborators.
///
/// A knowledge base that fails to load leaves the index empty unless
/// `require_knowledge_base` is set, in which case the error is returned.
pub async fn build_state(
    config: &ServerConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn Generator>,
) -> Result<AppState, ServerError> {
    let documents = match TextLoader::new(&config.knowledge_base_path).load() {
        Ok(documents) => documents,
        Err(e) if config.require_knowledge_base => return Err(e.into()),
        Err(e) => {
            error!(error = %e, "error loading knowledge base");
            warn!("serving with an empty knowledge base; every reply will lack context");
            Vec::new()
        }
    };

    let chunker = RecursiveChunker::from_config(&config.rag);
    let index = indexer::ingest(&documents, &chunker, embedder.as_ref()).await?;

    let pipeline = RagPipeline::builder()
        .config(config.rag.clone())
        .embedding_provider(embedder)
        .index(Arc::new(index))
        .generator(generator)
        .build()?;

    Ok(AppState { pipeline: Arc::new(pipeline) })
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = bootstrap(&config).await?;
    let app = app_router(state);
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| "invalid host/port for storefront server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("storefront-server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    if request.message.trim().is_empty() {
        return Err(ApiError::invalid_request("message must not be empty"));
    }

    info!(message_len = request.message.len(), "received chat message");

    let answer = state.pipeline.answer(&request.message).await?;
    info!(sources = ?answer.sources, reply_len = answer.reply.len(), "sending reply");

    Ok(Json(ChatResponse { reply: answer.reply }))
}

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use storefront_rag::{
    EmbeddingProvider, Generator, NO_CONTEXT_PLACEHOLDER, RagError, VectorIndex,
};
use storefront_server::{
    ChatResponse, ErrorBody, ServerConfig, ServerError, app_router, build_state,
};

const DIM: usize = 16;

struct HashEmbedder;

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> storefront_rag::Result<Vec<f32>> {
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; DIM];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

#[derive(Default)]
struct ScriptedGenerator {
    prompts: Mutex<Vec<String>>,
    failure: Option<String>,
}

impl ScriptedGenerator {
    fn failing(message: &str) -> Self {
        Self { prompts: Mutex::new(Vec::new()), failure: Some(message.to_string()) }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn complete(&self, prompt: &str) -> storefront_rag::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.failure {
            Some(message) => Err(RagError::Generation {
                provider: "Scripted".into(),
                message: message.clone(),
            }),
            None => Ok("We accept returns within 30 days of purchase.".to_string()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn knowledge_base(name: &str, contents: Option<&str>) -> PathBuf {
    let path = std::env::temp_dir()
        .join(format!("storefront-server-{}-{name}.txt", std::process::id()));
    match contents {
        Some(text) => std::fs::write(&path, text).expect("write knowledge base"),
        None => {
            let _ = std::fs::remove_file(&path);
        }
    }
    path
}

fn test_config(knowledge_base_path: PathBuf) -> ServerConfig {
    let mut config = ServerConfig::new("test-llm-key");
    config.knowledge_base_path = knowledge_base_path;
    config
}

async fn spawn_server(
    config: &ServerConfig,
    generator: Arc<ScriptedGenerator>,
) -> (String, tokio::task::JoinHandle<()>) {
    let state = build_state(config, Arc::new(HashEmbedder), generator)
        .await
        .expect("build state");
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

#[tokio::test]
async fn answers_from_single_sentence_knowledge_base() {
    let path = knowledge_base(
        "single",
        Some("Returns are accepted within 30 days of purchase."),
    );
    let generator = Arc::new(ScriptedGenerator::default());
    let (base, handle) = spawn_server(&test_config(path), generator.clone()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/chat/", base))
        .json(&json!({ "message": "What is your return policy?" }))
        .send()
        .await
        .expect("chat response");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: ChatResponse = response.json().await.expect("reply json");
    assert_eq!(body.reply, "We accept returns within 30 days of purchase.");

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Context: Returns are accepted within 30 days of purchase.\n"));
    assert!(prompts[0].contains("User: What is your return policy?\n"));

    handle.abort();
}

#[tokio::test]
async fn missing_knowledge_base_still_replies_with_placeholder_context() {
    let path = knowledge_base("missing", None);
    let generator = Arc::new(ScriptedGenerator::default());
    let (base, handle) = spawn_server(&test_config(path), generator.clone()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/chat/", base))
        .json(&json!({ "message": "Do you ship to Mexico?" }))
        .send()
        .await
        .expect("chat response");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.expect("reply json");
    assert!(body.get("reply").and_then(Value::as_str).is_some());
    assert!(generator.prompts()[0].contains("Context: No relevant context found.\n"));

    handle.abort();
}

#[tokio::test]
async fn missing_message_field_is_rejected_before_the_pipeline() {
    let path = knowledge_base("validation", Some("Shipping is free over $50."));
    let generator = Arc::new(ScriptedGenerator::default());
    let (base, handle) = spawn_server(&test_config(path), generator.clone()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/chat/", base))
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .expect("chat response");

    assert!(response.status().is_client_error());
    let body: ErrorBody = response.json().await.expect("error json");
    assert_eq!(body.kind, "invalid_request");
    assert!(body.detail.contains("message"), "unexpected detail: {}", body.detail);

    let response = client
        .post(format!("{}/chat/", base))
        .json(&json!({ "message": "   " }))
        .send()
        .await
        .expect("chat response");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    assert!(generator.prompts().is_empty());

    handle.abort();
}

#[tokio::test]
async fn generator_failure_is_500_with_detail_and_no_reply() {
    let path = knowledge_base("failure", Some("Returns are accepted within 30 days of purchase."));
    let generator = Arc::new(ScriptedGenerator::failing("upstream model unavailable"));
    let (base, handle) = spawn_server(&test_config(path), generator).await;

    let response = reqwest::Client::new()
        .post(format!("{}/chat/", base))
        .json(&json!({ "message": "What is your return policy?" }))
        .send()
        .await
        .expect("chat response");

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.expect("error json");
    let detail = body.get("detail").and_then(Value::as_str).expect("detail field");
    assert!(detail.contains("upstream model unavailable"));
    assert_eq!(body.get("kind").and_then(Value::as_str), Some("generation"));
    assert!(body.get("reply").is_none());

    handle.abort();
}

#[tokio::test]
async fn route_without_trailing_slash_is_served() {
    let path = knowledge_base("slash", Some("Support is open Monday to Friday."));
    let (base, handle) =
        spawn_server(&test_config(path), Arc::new(ScriptedGenerator::default())).await;

    let response = reqwest::Client::new()
        .post(format!("{}/chat", base))
        .json(&json!({ "message": "When is support open?" }))
        .send()
        .await
        .expect("chat response");
    assert!(response.status().is_success());

    handle.abort();
}

#[tokio::test]
async fn required_knowledge_base_failure_aborts_startup() {
    let mut config = test_config(knowledge_base("required", None));
    config.require_knowledge_base = true;

    let err = build_state(&config, Arc::new(HashEmbedder), Arc::new(ScriptedGenerator::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, ServerError::Rag(RagError::Loader { .. })));
}

#[tokio::test]
async fn bundled_knowledge_base_is_indexed() {
    let mut config = ServerConfig::new("test-llm-key");
    config.require_knowledge_base = true;

    let generator = Arc::new(ScriptedGenerator::default());
    let state = build_state(&config, Arc::new(HashEmbedder), generator.clone())
        .await
        .expect("bundled knowledge base loads");
    assert!(state.pipeline.index().len() > 1);

    state.pipeline.answer("Who runs this store?").await.expect("answer");
    assert!(!generator.prompts()[0].contains(NO_CONTEXT_PLACEHOLDER));
}

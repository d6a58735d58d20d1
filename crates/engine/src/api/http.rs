//! HTTP routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use lootforge_domain::{DomainError, GenerationRequest, ItemCategory, TableMode};
use lootforge_shared::{
    ErrorCode, ErrorResponse, GenerateItemRequest, GenerateTableRequest, ItemResponse,
    TableResponse,
};

use crate::app::App;
use crate::use_cases::generation::GenerationError;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/items", post(generate_item))
        .route("/api/tables", post(generate_table))
}

async fn health() -> &'static str {
    "OK"
}

async fn generate_item(
    State(app): State<Arc<App>>,
    Json(body): Json<GenerateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let category = body
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::parse::<ItemCategory>)
        .transpose()?;
    let request = GenerationRequest::new(body.prompt)?
        .with_category_hint(category)
        .with_forced_name(body.name);

    let stored = app.use_cases.generation.item.execute(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ItemResponse {
            id: *stored.id.as_uuid(),
            record: stored.record,
        }),
    ))
}

async fn generate_table(
    State(app): State<Arc<App>>,
    Json(body): Json<GenerateTableRequest>,
) -> Result<(StatusCode, Json<TableResponse>), ApiError> {
    let mode = body.mode.as_deref().map(TableMode::from_loose);
    let generated = app
        .use_cases
        .generation
        .table
        .execute(&body.prompt, mode)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TableResponse {
            id: *generated.table.id.as_uuid(),
            name: generated.table.table.name,
            formula: generated.table.table.formula,
            description: generated.table.table.description,
            mode: generated.mode,
            results: generated.results,
        }),
    ))
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(ErrorCode::ValidationError, msg)),
            )
                .into_response(),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(ErrorCode::InternalError, "Internal error")),
                )
                    .into_response()
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::EmptyPrompt => ApiError::BadRequest(e.to_string()),
            GenerationError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Ports;
    use crate::infrastructure::clock::{FixedRandom, SystemClock};
    use crate::infrastructure::config::PipelineConfig;
    use crate::infrastructure::ports::{MockAssetStorePort, MockDocumentStorePort, StoreError};
    use crate::test_fixtures::completions::IRON_SWORD_ITEM;
    use crate::test_fixtures::llm_mocks::ScriptedLlm;
    use axum::body::Body;
    use axum::http::Request;
    use lootforge_domain::{RecordId, StoredItem, StoredTable, TableId};
    use tower::ServiceExt;

    fn router(llm: ScriptedLlm, documents: MockDocumentStorePort) -> Router {
        let ports = Ports {
            llm: Arc::new(llm),
            image_gen: None,
            assets: Arc::new(MockAssetStorePort::new()),
            documents: Arc::new(documents),
            clock: Arc::new(SystemClock::new()),
            random: Arc::new(FixedRandom::new(1, false)),
        };
        let app = Arc::new(App::with_ports(ports, &PipelineConfig::default()));
        routes().with_state(app)
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn test_health() {
        let response = router(ScriptedLlm::empty(), MockDocumentStorePort::new())
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_blank_item_prompt_is_validation_error() {
        let response = router(ScriptedLlm::empty(), MockDocumentStorePort::new())
            .oneshot(post("/api/items", r#"{"prompt": "   "}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_category_is_validation_error() {
        let response = router(ScriptedLlm::empty(), MockDocumentStorePort::new())
            .oneshot(post(
                "/api/items",
                r#"{"prompt": "a sword", "category": "vehicle"}"#,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_item_created() {
        let llm = ScriptedLlm::routed(vec![
            ("short item name", "Iron Blade"),
            ("single, consistent DnD 5e item", IRON_SWORD_ITEM),
        ]);
        let mut documents = MockDocumentStorePort::new();
        documents.expect_create_item().times(1).returning(|record| {
            Ok(StoredItem {
                id: RecordId::new(),
                record,
            })
        });

        let response = router(llm, documents)
            .oneshot(post("/api/items", r#"{"prompt": "a simple iron sword"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["record"]["name"], "Iron Blade Sword");
        assert_eq!(body["record"]["category"], "weapon");
        assert_eq!(body["record"]["details"]["weaponType"], "simpleM");
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_error() {
        let mut documents = MockDocumentStorePort::new();
        documents
            .expect_create_table()
            .returning(|_| Err(StoreError::write("create_table", "read-only")));

        let response = router(ScriptedLlm::empty(), documents)
            .oneshot(post("/api/tables", r#"{"prompt": "forest encounters"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_table_created_with_mode() {
        let llm = ScriptedLlm::routed(vec![(
            "roll table",
            r#"{"name": "Forest", "formula": "1d4", "entries": [{"text": "Wolves"}]}"#,
        )]);
        let mut documents = MockDocumentStorePort::new();
        documents.expect_create_table().times(1).returning(|table| {
            Ok(StoredTable {
                id: TableId::new(),
                table,
            })
        });
        documents
            .expect_create_table_results()
            .times(1)
            .returning(|_, _| Ok(()));

        let response = router(llm, documents)
            .oneshot(post(
                "/api/tables",
                r#"{"prompt": "forest encounters", "mode": "generic"}"#,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["name"], "Forest");
        assert_eq!(body["mode"], "generic");
        assert_eq!(body["results"][0]["text"], "Wolves");
    }
}

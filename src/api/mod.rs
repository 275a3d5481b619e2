//! HTTP 接入层（feature `http`）
//!
//! 所有路由共享一个 `Arc<Orchestrator>`；边界 / 校验错误返回 400，记忆服务错误返回 500，
//! 错误体统一为 `{"detail": ...}`。

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::a2a::{fetch_limit, SendRequest};
use crate::agent::Orchestrator;
use crate::context::context_json_schema;
use crate::core::{MemoryError, SendError, StepError, StepOutcome, StepRequest};

/// 接口错误：状态码 + detail
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: Value,
}

impl ApiError {
    fn bad_request(detail: Value) -> Self {
        Self { status: StatusCode::BAD_REQUEST, detail }
    }

    fn internal(detail: Value) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, detail }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<SendError> for ApiError {
    fn from(e: SendError) -> Self {
        Self::bad_request(Value::String(e.to_string()))
    }
}

impl From<MemoryError> for ApiError {
    fn from(e: MemoryError) -> Self {
        Self::internal(json!({ "memory_error": e.to_string() }))
    }
}

impl From<StepError> for ApiError {
    fn from(e: StepError) -> Self {
        match e {
            StepError::Context(v) => Self::bad_request(json!({ "mcp_validation_error": v.to_string() })),
            StepError::Action(v) => Self::bad_request(json!({ "action_validation_error": v.to_string() })),
            StepError::Planner(msg) => Self::internal(json!({ "planner_error": msg })),
        }
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

/// 构建路由
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/mcp/schema", get(mcp_schema))
        .route("/state", get(get_state))
        .route("/step", post(step))
        .route("/a2a/send", post(a2a_send))
        .route("/a2a/inbox", get(a2a_inbox))
        .route("/memory/add", post(memory_add))
        .route("/memory/add_batch", post(memory_add_batch))
        .route("/memory/query", post(memory_query))
        .route("/memory/collections", get(memory_collections))
        .route("/memory/stats", get(memory_stats))
        .route("/memory/collection", delete(memory_drop_collection))
        .with_state(orchestrator)
}

async fn health() -> Json<Value> {
    let ts = chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0;
    Json(json!({ "status": "ok", "ts": ts }))
}

async fn mcp_schema() -> Json<Value> {
    Json(context_json_schema())
}

#[derive(Deserialize)]
struct AgentQuery {
    #[serde(default = "default_agent_id")]
    agent_id: String,
}

fn default_agent_id() -> String {
    "A".to_string()
}

fn default_goal() -> String {
    "demo".to_string()
}

/// GET /state?agent_id=A：最近一次 step 的快照
async fn get_state(
    State(orch): State<Arc<Orchestrator>>,
    Query(q): Query<AgentQuery>,
) -> Json<Value> {
    match orch.last_snapshot(&q.agent_id).await {
        Some(snap) => Json(json!({ "ok": true, "agent_id": q.agent_id, "state": snap })),
        None => Json(json!({
            "ok": false,
            "agent_id": q.agent_id,
            "state": null,
            "note": "no snapshot yet",
        })),
    }
}

#[derive(Deserialize)]
struct StepBody {
    #[serde(default = "default_goal")]
    goal: String,
    #[serde(default = "default_agent_id")]
    agent_id: String,
}

impl Default for StepBody {
    fn default() -> Self {
        Self {
            goal: default_goal(),
            agent_id: default_agent_id(),
        }
    }
}

#[derive(Deserialize, Default)]
struct StepQuery {
    #[serde(default)]
    execute: bool,
    #[serde(default)]
    use_memory: bool,
    mem_collection: Option<String>,
}

/// POST /step?execute=&use_memory=&mem_collection=
async fn step(
    State(orch): State<Arc<Orchestrator>>,
    Query(q): Query<StepQuery>,
    body: Option<Json<StepBody>>,
) -> Result<Json<StepOutcome>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let mut req = StepRequest::new(body.agent_id, body.goal);
    if q.use_memory {
        req = req.with_memory(q.mem_collection);
    }
    if q.execute {
        req = req.with_execute();
    }
    Ok(Json(orch.step(req).await?))
}

/// POST /a2a/send
async fn a2a_send(
    State(orch): State<Arc<Orchestrator>>,
    Json(body): Json<SendRequest>,
) -> ApiResult {
    let message = orch.send_request(body).await?;
    Ok(Json(json!({ "ok": true, "message": message.to_wire() })))
}

#[derive(Deserialize)]
struct InboxQuery {
    agent_id: String,
    max: Option<i64>,
}

/// GET /a2a/inbox?agent_id=&max=：取出并移除，FIFO
async fn a2a_inbox(
    State(orch): State<Arc<Orchestrator>>,
    Query(q): Query<InboxQuery>,
) -> Json<Value> {
    let messages: Vec<Value> = orch
        .fetch_inbox(&q.agent_id, fetch_limit(q.max))
        .await
        .iter()
        .map(|m| m.to_wire())
        .collect();
    Json(json!({ "receiver": q.agent_id, "messages": messages }))
}

fn default_kind() -> String {
    "note".to_string()
}

#[derive(Deserialize)]
struct MemoryAddBody {
    text: String,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
    collection: Option<String>,
}

async fn memory_add(
    State(orch): State<Arc<Orchestrator>>,
    Json(body): Json<MemoryAddBody>,
) -> ApiResult {
    let id = orch
        .memory_add(
            &body.text,
            &body.kind,
            body.metadata.unwrap_or_default(),
            body.collection.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "ok": true, "id": id })))
}

#[derive(Deserialize)]
struct MemoryAddBatchBody {
    texts: Vec<String>,
    #[serde(default = "default_kind")]
    kind: String,
    metadatas: Option<Vec<Map<String, Value>>>,
    collection: Option<String>,
}

async fn memory_add_batch(
    State(orch): State<Arc<Orchestrator>>,
    Json(body): Json<MemoryAddBatchBody>,
) -> ApiResult {
    let ids = orch
        .memory_add_batch(&body.texts, &body.kind, body.metadatas, body.collection.as_deref())
        .await?;
    Ok(Json(json!({ "ok": true, "ids": ids })))
}

fn default_top_k() -> usize {
    3
}

#[derive(Deserialize)]
struct MemoryQueryBody {
    query: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
    collection: Option<String>,
}

async fn memory_query(
    State(orch): State<Arc<Orchestrator>>,
    Json(body): Json<MemoryQueryBody>,
) -> ApiResult {
    let items = orch
        .memory_query(&body.query, body.top_k, body.collection.as_deref())
        .await?;
    Ok(Json(json!({ "ok": true, "items": items })))
}

async fn memory_collections(State(orch): State<Arc<Orchestrator>>) -> Json<Value> {
    Json(json!({ "ok": true, "collections": orch.memory_collections().await }))
}

#[derive(Deserialize)]
struct CollectionQuery {
    collection: Option<String>,
}

async fn memory_stats(
    State(orch): State<Arc<Orchestrator>>,
    Query(q): Query<CollectionQuery>,
) -> Json<Value> {
    let stats = orch.memory_stats(q.collection.as_deref()).await;
    Json(json!({ "ok": true, "stats": stats }))
}

/// DELETE /memory/collection?collection=：collection 必填
async fn memory_drop_collection(
    State(orch): State<Arc<Orchestrator>>,
    Query(q): Query<CollectionQuery>,
) -> ApiResult {
    let Some(collection) = q.collection.filter(|c| !c.is_empty()) else {
        return Err(ApiError::bad_request(Value::String("collection is required".to_string())));
    };
    let ok = orch.memory_drop(Some(&collection)).await;
    Ok(Json(json!({ "ok": ok, "dropped": collection })))
}

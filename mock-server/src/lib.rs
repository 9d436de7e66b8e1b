use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Bearer token accepted by `app()`.
pub const DEFAULT_TOKEN: &str = "test-token";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub text: String,
}

#[derive(Deserialize)]
pub struct CreateNote {
    pub text: String,
}

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub message: Option<String>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Note>>>;

#[derive(Clone)]
pub struct AppState {
    token: Arc<str>,
    notes: Db,
}

type Rejection = (StatusCode, String);

pub fn app() -> Router {
    app_with_token(DEFAULT_TOKEN)
}

pub fn app_with_token(token: &str) -> Router {
    let state = AppState {
        token: Arc::from(token),
        notes: Arc::new(RwLock::new(HashMap::new())),
    };
    Router::new()
        .route("/greeting", get(greeting))
        .route("/echo", any(echo))
        .route("/status/{code}", get(status))
        .route("/shapes", get(shapes))
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/{id}", get(get_note).delete(delete_note))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn greeting() -> &'static str {
    "hello"
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Echo> {
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    Json(Echo {
        method: method.to_string(),
        authorization: header_text(header::AUTHORIZATION),
        content_type: header_text(header::CONTENT_TYPE),
        body,
    })
}

/// Reply with `code`, using `?message=` (or the canonical reason) as body.
async fn status(Path(code): Path<u16>, Query(query): Query<StatusQuery>) -> Rejection {
    let Ok(status) = StatusCode::from_u16(code) else {
        return (StatusCode::BAD_REQUEST, format!("invalid status code {code}"));
    };
    let message = query
        .message
        .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
    (status, message)
}

/// A mixed list of shapes, each tagged with its concrete type.
async fn shapes() -> Json<Value> {
    Json(json!([
        { "$type": "circle", "radius": 1.5 },
        { "$type": "square", "side": 2.0 },
    ]))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Rejection> {
    let expected = format!("Bearer {}", state.token);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        Some(_) => Err((StatusCode::UNAUTHORIZED, "invalid bearer token".to_string())),
        None => Err((StatusCode::UNAUTHORIZED, "missing bearer token".to_string())),
    }
}

async fn list_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Note>>, Rejection> {
    authorize(&state, &headers)?;
    let notes = state.notes.read().await;
    Ok(Json(notes.values().cloned().collect()))
}

async fn create_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<Note>), Rejection> {
    authorize(&state, &headers)?;
    let input: CreateNote = serde_json::from_str(&body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid note: {e}")))?;
    let note = Note {
        id: Uuid::new_v4(),
        text: input.text,
    };
    state.notes.write().await.insert(note.id, note.clone());
    Ok((StatusCode::CREATED, Json(note)))
}

async fn get_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, Rejection> {
    authorize(&state, &headers)?;
    let notes = state.notes.read().await;
    notes
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("note {id} not found")))
}

async fn delete_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Rejection> {
    authorize(&state, &headers)?;
    let mut notes = state.notes.write().await;
    notes
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("note {id} not found")))
}

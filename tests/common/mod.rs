#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const PASSWORD: &str = "secreto";

/// What the stub saw for one request.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SeenPart {
    pub name: String,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Default)]
pub struct StubState {
    pub jobs: Vec<JsonValue>,
    pub applications: Vec<JsonValue>,
    pub cvs: Vec<(String, Bytes)>,
    pub next_id: u64,
    pub seen: Vec<Seen>,
    pub parts: Vec<SeenPart>,
}

pub type Shared = Arc<Mutex<StubState>>;

pub struct StubApi {
    pub base_url: String,
    pub state: Shared,
    server: JoinHandle<()>,
}

impl Drop for StubApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl StubApi {
    pub fn seen(&self) -> Vec<Seen> {
        self.state.lock().unwrap().seen.clone()
    }

    pub fn seen_paths(&self) -> Vec<String> {
        self.seen().into_iter().map(|s| s.path).collect()
    }

    pub fn clear_seen(&self) {
        self.state.lock().unwrap().seen.clear();
    }

    pub fn parts(&self) -> Vec<SeenPart> {
        self.state.lock().unwrap().parts.clone()
    }

    pub fn seed_job(&self, title: &str, status: &str, creator_email: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.jobs.push(json!({
            "id": id,
            "title": title,
            "department": "Logística y Distribución",
            "location": "Lima - Callao (Centro de Distribución)",
            "type": "Tiempo completo",
            "description": format!("Puesto de {}", title),
            "status": status,
            "createdBy": { "email": creator_email },
            "createdAt": "2024-06-01T09:00:00"
        }));
        id
    }
}

/// Users the stub knows: (email, id, role).
const USERS: [(&str, u64, &str); 3] = [
    ("candidate@sodimac.pe", 5, "candidate"),
    ("manager@sodimac.pe", 6, "manager"),
    ("hr@sodimac.pe", 7, "hr"),
];

fn user_for_token(headers: &HeaderMap) -> Option<(&'static str, u64, &'static str)> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer token-")?
        .to_string();
    USERS.into_iter().find(|(_, _, role)| *role == token)
}

fn record(state: &Shared, method: &str, path: String, headers: &HeaderMap) {
    let value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.lock().unwrap().seen.push(Seen {
        method: method.to_string(),
        path,
        authorization: value(header::AUTHORIZATION),
        content_type: value(header::CONTENT_TYPE),
    });
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Token inválido").into_response()
}

async fn login(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<JsonValue>) -> Response {
    record(&state, "POST", "/auth/login".into(), &headers);
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match USERS.into_iter().find(|(e, _, _)| *e == email) {
        Some((_, id, role)) if password == PASSWORD => Json(json!({
            "accessToken": format!("token-{}", role),
            "userId": id,
            "username": email.split('@').next().unwrap_or_default(),
            "role": role
        }))
        .into_response(),
        _ => (StatusCode::UNAUTHORIZED, "Credenciales inválidas").into_response(),
    }
}

async fn register(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "POST", "/auth/register".into(), &headers);
    "Usuario registrado exitosamente".into_response()
}

async fn list_jobs(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/jobs".into(), &headers);
    let jobs = state.lock().unwrap().jobs.clone();
    Json(JsonValue::Array(jobs)).into_response()
}

async fn create_job(State(state): State<Shared>, headers: HeaderMap, Json(mut body): Json<JsonValue>) -> Response {
    record(&state, "POST", "/jobs".into(), &headers);
    let Some((email, id, role)) = user_for_token(&headers) else {
        return unauthorized();
    };
    if role == "candidate" {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }
    let mut state = state.lock().unwrap();
    state.next_id += 1;
    body["id"] = json!(state.next_id);
    body["createdBy"] = json!({ "id": id, "username": role, "email": email });
    body["createdAt"] = json!("2024-06-02T10:00:00Z");
    state.jobs.push(body.clone());
    Json(body).into_response()
}

async fn update_job_status(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> Response {
    record(&state, "PUT", format!("/jobs/{}/status", id), &headers);
    if user_for_token(&headers).map(|(_, _, role)| role) != Some("hr") {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    match state.jobs.iter_mut().find(|job| job["id"] == json!(id)) {
        Some(job) => {
            job["status"] = body["status"].clone();
            Json(job.clone()).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn all_applications(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/applications".into(), &headers);
    match user_for_token(&headers) {
        Some((_, _, "manager" | "hr")) => {
            Json(JsonValue::Array(state.lock().unwrap().applications.clone())).into_response()
        }
        _ => unauthorized(),
    }
}

async fn candidate_applications(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    record(&state, "GET", format!("/applications/candidate/{}", id), &headers);
    if user_for_token(&headers).is_none() {
        return unauthorized();
    }
    let apps: Vec<JsonValue> = state
        .lock()
        .unwrap()
        .applications
        .iter()
        .filter(|app| app["candidate"]["id"] == json!(id))
        .cloned()
        .collect();
    Json(JsonValue::Array(apps)).into_response()
}

async fn apply(
    State(state): State<Shared>,
    Path(job_id): Path<u64>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    record(&state, "POST", format!("/applications/{}", job_id), &headers);
    let Some((email, candidate_id, "candidate")) = user_for_token(&headers) else {
        return unauthorized();
    };

    let mut application = JsonValue::Null;
    let mut cv: Option<(String, Bytes)> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let part = SeenPart {
            name: field.name().unwrap_or_default().to_string(),
            content_type: field.content_type().map(str::to_string),
            file_name: field.file_name().map(str::to_string),
        };
        let bytes = field.bytes().await.unwrap_or_default();
        match part.name.as_str() {
            "application" => application = serde_json::from_slice(&bytes).unwrap_or_default(),
            "cvFile" => cv = part.file_name.clone().map(|name| (name, bytes)),
            _ => {}
        }
        state.lock().unwrap().parts.push(part);
    }

    let mut state = state.lock().unwrap();
    let duplicate = state.applications.iter().any(|app| {
        app["job"]["id"] == json!(job_id) && app["candidate"]["id"] == json!(candidate_id)
    });
    if duplicate {
        return (StatusCode::CONFLICT, "Ya postulaste a este trabajo").into_response();
    }
    let Some(job) = state.jobs.iter().find(|job| job["id"] == json!(job_id)).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    state.next_id += 1;
    let cv_file_name = cv.as_ref().map(|(name, _)| name.clone());
    let created = json!({
        "id": state.next_id,
        "job": { "id": job_id, "title": job["title"], "department": job["department"] },
        "candidate": { "id": candidate_id, "username": "candidate", "email": email },
        "coverLetter": application["coverLetter"],
        "experience": application["experience"],
        "skills": application["skills"],
        "cvFileName": cv_file_name,
        "appliedAt": "2024-06-03T12:00:00Z",
        "status": "submitted",
        "messages": []
    });
    if let Some(cv) = cv {
        state.cvs.push(cv);
    }
    state.applications.push(created.clone());
    Json(created).into_response()
}

async fn update_application(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> Response {
    record(&state, "PUT", format!("/applications/{}", id), &headers);
    if !matches!(user_for_token(&headers), Some((_, _, "manager" | "hr"))) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    let Some(index) = state.applications.iter().position(|app| app["id"] == json!(id)) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    state.next_id += 1;
    let message_id = state.next_id;
    let app = &mut state.applications[index];
    app["status"] = body["status"].clone();
    if let Some(text) = body["message"].as_str() {
        if let Some(messages) = app["messages"].as_array_mut() {
            messages.push(json!({
                "id": message_id,
                "text": text,
                "createdAt": "2024-06-04T15:30:00Z"
            }));
        }
    }
    Json(app.clone()).into_response()
}

async fn download_cv(State(state): State<Shared>, Path(name): Path<String>, headers: HeaderMap) -> Response {
    record(&state, "GET", format!("/files/cvs/{}", name), &headers);
    if user_for_token(&headers).is_none() {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    match state.cvs.iter().find(|(file, _)| *file == name) {
        Some((_, bytes)) => (
            [(header::CONTENT_TYPE, "application/pdf")],
            bytes.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn plain(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/plain".into(), &headers);
    "pong".into_response()
}

async fn missing(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/missing".into(), &headers);
    StatusCode::NOT_FOUND.into_response()
}

pub fn router(state: Shared) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:id/status", put(update_job_status))
        .route("/applications", get(all_applications))
        .route("/applications/candidate/:id", get(candidate_applications))
        .route("/applications/:id", post(apply).put(update_application))
        .route("/files/cvs/:name", get(download_cv))
        .route("/plain", get(plain))
        .route("/missing", get(missing))
        .with_state(state)
}

pub async fn spawn_stub() -> StubApi {
    let state: Shared = Arc::new(Mutex::new(StubState::default()));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub api");
    let addr = listener.local_addr().expect("stub address");
    let app = Router::new().nest("/api", router(state.clone()));
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub api");
    });
    StubApi {
        base_url: format!("http://{}/api", addr),
        state,
        server,
    }
}

/// An address nothing listens on.
pub async fn closed_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    listener.local_addr().expect("address")
}

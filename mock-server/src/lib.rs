use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const NIXZD_PREFIX: &str = "/api/nixzd/v11";
pub const ISAC_PREFIX: &str = "/g3";

/// Document served by `handover.json` unless a test registers others.
pub const SAMPLE_DOCUMENT_OID: &str = "1.2.203.27283933.9";

/// A request as the gateway received it.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn form(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(&self.body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    pub fn form_value(&self, key: &str) -> Option<String> {
        self.form().into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Default)]
struct Inner {
    requests: Vec<Recorded>,
    documents: HashMap<String, Vec<u8>>,
    inbox: VecDeque<(String, Vec<u8>)>,
    overrides: HashMap<String, (StatusCode, String)>,
}

/// Shared gateway state. Clones share the same store.
#[derive(Clone)]
pub struct Gateway {
    authorization: String,
    inner: Arc<Mutex<Inner>>,
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new("amis", "amis")
    }
}

impl Gateway {
    pub fn new(login: &str, password: &str) -> Self {
        let gateway = Self {
            authorization: format!("Basic {}", STANDARD.encode(format!("{login}:{password}"))),
            inner: Arc::default(),
        };
        gateway.add_document(SAMPLE_DOCUMENT_OID, b"hello".to_vec());
        gateway
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_document(&self, oid: &str, content: Vec<u8>) {
        self.lock().documents.insert(oid.to_string(), content);
    }

    pub fn push_inbox(&self, content_type: &str, content: Vec<u8>) {
        self.lock().inbox.push_back((content_type.to_string(), content));
    }

    /// Answer every request to `path` with a fixed status and body.
    pub fn override_response(&self, path: &str, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.lock()
            .overrides
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<Recorded> {
        self.lock().requests.last().cloned()
    }
}

pub fn app(gateway: Gateway) -> Router {
    let nixzd = Router::new()
        .route("/sayHello", post(say_hello))
        .route("/getPsExists.xml", post(ps_exists))
        .route("/getPs.cda", post(ps_cda));

    let isac = Router::new()
        .route("/app.json", post(app_info))
        .route("/nodeconfig.json", post(node_config))
        .route("/nodestatus.json", post(node_status))
        .route("/confedit/provider.json", post(provider))
        .route("/prodsys/get.json", post(prodsys))
        .route("/ec.json", post(emergency_summary))
        .route("/DocumentView.json", post(document_view))
        .route("/survey.json", post(survey))
        .route("/handover.json", post(handover))
        .route("/msgstore/senddoc.json", post(send_document))
        .route("/msgstore/download", post(download))
        .route("/beds.json", post(beds))
        .route("/rescnotif.json", post(rescue_notifications));

    Router::new()
        .nest(NIXZD_PREFIX, nixzd)
        .nest(ISAC_PREFIX, isac)
        .layer(middleware::from_fn_with_state(gateway.clone(), gatekeeper))
        .with_state(gateway)
}

pub async fn run(listener: TcpListener, gateway: Gateway) -> Result<(), std::io::Error> {
    axum::serve(listener, app(gateway)).await
}

/// Record the request, enforce basic auth, apply overrides.
async fn gatekeeper(State(gateway): State<Gateway>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    let path = parts.uri.path().to_string();
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    tracing::debug!(%path, len = bytes.len(), "request");

    gateway.lock().requests.push(Recorded {
        path: path.clone(),
        content_type,
        body: bytes.to_vec(),
    });

    let authorized = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == gateway.authorization);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let forced = gateway.lock().overrides.get(&path).cloned();
    if let Some((status, body)) = forced {
        return (status, body).into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

type FormParams = Form<HashMap<String, String>>;

fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or("")
}

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

// --- NIXZD ---

async fn say_hello() -> &'static str {
    "Hello, this is NIXZD v11"
}

async fn ps_exists(Form(params): FormParams) -> Response {
    xml(format!(
        concat!(
            "<psExistsResponse requestId=\"{}\">",
            "<patient idType=\"{}\" idValue=\"{}\"/>",
            "<purposeOfUse>{}</purposeOfUse><found>true</found>",
            "</psExistsResponse>",
        ),
        param(&params, "requestId"),
        param(&params, "idType"),
        param(&params, "idValue"),
        param(&params, "purposeOfUse"),
    ))
}

async fn ps_cda(Form(params): FormParams) -> Response {
    xml(format!(
        concat!(
            "<ClinicalDocument xmlns=\"urn:hl7-org:v3\">",
            "<id root=\"{}\" extension=\"{}\"/><code code=\"{}\"/>",
            "<recordTarget><patientRole><id extension=\"{}\"/></patientRole></recordTarget>",
            "</ClinicalDocument>",
        ),
        param(&params, "cdaOid"),
        param(&params, "cdaId"),
        param(&params, "cdaType"),
        param(&params, "idValue"),
    ))
}

// --- ISAC ---

async fn app_info(Form(params): FormParams) -> Json<Value> {
    Json(json!({
        "application": "ISAC",
        "version": "4.01.00",
        "user": params.get("username"),
    }))
}

async fn node_config() -> Json<Value> {
    Json(json!({
        "node": "ISAC-MOCK",
        "oid": "1.2.203.27283933",
        "peers": ["1.2.203.1", "1.2.203.2"],
    }))
}

async fn node_status() -> Json<Value> {
    Json(json!({"node": "ISAC-MOCK", "status": "UP", "queues": {"in": 0, "out": 2}}))
}

async fn provider() -> Json<Value> {
    Json(json!({"icz": "27283933", "name": "Test HCP", "address": {"city": "Praha"}}))
}

async fn prodsys() -> Json<Value> {
    Json(json!({"system": "AMIS*H", "vendor": "ICZ", "connected": true}))
}

async fn emergency_summary(Form(params): FormParams) -> Json<Value> {
    Json(json!({
        "rc": param(&params, "rc"),
        "firstname": params.get("firstname"),
        "lastname": params.get("lastname"),
        "bloodGroup": "A+",
        "allergies": ["penicillin"],
    }))
}

async fn document_view(Form(params): FormParams) -> Json<Value> {
    Json(json!({
        "icz": param(&params, "icz"),
        "eventId": param(&params, "eventId"),
        "documents": [{"docoid": SAMPLE_DOCUMENT_OID, "title": "Discharge report"}],
    }))
}

async fn survey(Json(params): Json<Map<String, Value>>) -> Json<Value> {
    Json(json!({
        "rc": params.get("rc"),
        "from": params.get("from"),
        "to": params.get("to"),
        "documents": [{"orgoid": "1.2.203.27283933", "docoid": SAMPLE_DOCUMENT_OID}],
    }))
}

async fn handover(
    State(gateway): State<Gateway>,
    Json(params): Json<Map<String, Value>>,
) -> Response {
    let docoid = params.get("docoid").and_then(Value::as_str).unwrap_or("");
    let document = gateway.lock().documents.get(docoid).cloned();
    match document {
        Some(content) => Json(json!({
            "docoid": docoid,
            "bodytype": params.get("bodytype"),
            "body": STANDARD.encode(content),
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("document {docoid} not found")})),
        )
            .into_response(),
    }
}

async fn send_document(
    State(gateway): State<Gateway>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let size = body.len();
    gateway.push_inbox(&content_type, body.to_vec());
    Json(json!({
        "messageId": Uuid::new_v4(),
        "contentType": content_type,
        "size": size,
    }))
}

async fn download(State(gateway): State<Gateway>) -> Response {
    let next = gateway.lock().inbox.pop_front();
    match next {
        Some((content_type, content)) => {
            ([(header::CONTENT_TYPE, content_type)], content).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn beds(Form(params): FormParams) -> Json<Value> {
    Json(json!({
        "user": params.get("username"),
        "beds": [{"department": "ICU", "free": 2}, {"department": "Surgery", "free": 5}],
    }))
}

async fn rescue_notifications(Form(params): FormParams) -> Json<Value> {
    Json(json!({
        "period": params.get("period"),
        "status": params.get("status"),
        "notifications": [],
    }))
}

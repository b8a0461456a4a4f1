use crate::clients::ClientDirectory;
use crate::counterparty::CounterpartyLookup;
use crate::format::{self, V1Record};
use crate::provider::DeliveryProvider;
use axum::{
    extract::Path,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use hyper::Server;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

const DEFAULT_TIMEZONE: &str = "Etc/UTC";

/// Shared handler state: the delivery search facade plus the two client
/// side surfaces.
pub struct AppState {
    pub provider: DeliveryProvider,
    pub directory: ClientDirectory,
    pub counterparty: CounterpartyLookup,
}

/// Body of the two delivery search endpoints.
#[derive(Debug, Deserialize)]
pub struct DeliveryRequest {
    pub client: Option<String>,
    pub timezone: Option<String>,
    pub search_params: Option<HashMap<String, String>>,
    /// v1 only; defaults to CSV output when absent.
    pub csv: Option<CsvFlag>,
}

/// Some callers send the CSV switch as a string instead of a bool; the
/// tolerant reading is kept for them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CsvFlag {
    Flag(bool),
    Text(String),
}

impl CsvFlag {
    fn as_bool(&self) -> bool {
        match self {
            CsvFlag::Flag(value) => *value,
            CsvFlag::Text(text) => {
                matches!(text.trim().to_lowercase().as_str(), "" | "yes" | "true")
            }
        }
    }
}

impl DeliveryRequest {
    fn timezone(&self) -> String {
        self.timezone
            .clone()
            .filter(|tz| !tz.is_empty())
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string())
    }

    fn wants_csv(&self) -> bool {
        self.csv.as_ref().map(CsvFlag::as_bool).unwrap_or(true)
    }
}

fn result_message(status: StatusCode, text: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "result": text.into() }))).into_response()
}

fn csv_response(status: StatusCode, records: &[V1Record]) -> Response {
    let body = format::to_csv(records);
    (status, [(header::CONTENT_TYPE, "text/csv")], body).into_response()
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "delivery-provider",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn get_clients(Extension(state): Extension<Arc<AppState>>) -> Response {
    match state.directory.get_clients().await {
        Ok(codes) if codes.is_empty() => result_message(StatusCode::NOT_FOUND, "Client not found"),
        Ok(codes) => (StatusCode::OK, Json(codes)).into_response(),
        Err(error) => result_message(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    }
}

async fn client_lang(
    Extension(state): Extension<Arc<AppState>>,
    Json(codes): Json<Vec<String>>,
) -> Response {
    match state.directory.get_client_lang_list(&codes).await {
        Ok(langs) if langs.is_empty() => result_message(StatusCode::NOT_FOUND, "Client not found"),
        Ok(langs) => (StatusCode::OK, Json(langs)).into_response(),
        Err(error) => result_message(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    }
}

async fn get_client_data(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.directory.get_client_data(id).await {
        Ok(Some(data)) => (StatusCode::OK, Json(data)).into_response(),
        Ok(None) => result_message(
            StatusCode::NOT_FOUND,
            format!("Client not found (id=[{id}])"),
        ),
        Err(error) => result_message(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    }
}

async fn deliveries(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<DeliveryRequest>,
) -> Response {
    let Some(client) = request.client.as_deref().filter(|client| !client.is_empty()) else {
        return result_message(StatusCode::BAD_REQUEST, "Client code must be specified");
    };
    let search_params = request.search_params.clone().unwrap_or_default();

    match state
        .provider
        .get_deliveries(client, &search_params, &request.timezone())
        .await
    {
        Ok(records) if records.is_empty() => result_message(
            StatusCode::NOT_FOUND,
            format!("No deliveries found for client {client}"),
        ),
        Ok(records) if request.wants_csv() => csv_response(StatusCode::CREATED, &records),
        Ok(records) => (StatusCode::CREATED, Json(records)).into_response(),
        Err(error) => result_message(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    }
}

async fn deliveries_v2(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<DeliveryRequest>,
) -> Response {
    let Some(client) = request.client.as_deref().filter(|client| !client.is_empty()) else {
        return result_message(StatusCode::BAD_REQUEST, "Client code must be specified");
    };
    let search_params = request.search_params.clone().unwrap_or_default();

    match state
        .provider
        .get_deliveries_v2(client, &search_params, &request.timezone())
        .await
    {
        Ok(records) if records.is_empty() => result_message(
            StatusCode::NOT_FOUND,
            format!("No deliveries found for client {client}"),
        ),
        Ok(records) => (StatusCode::CREATED, Json(records)).into_response(),
        Err(error) => result_message(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    }
}

async fn client_counterparty(
    Extension(state): Extension<Arc<AppState>>,
    Path(code): Path<String>,
) -> Response {
    match state.counterparty.lookup(&code) {
        Ok(label) => (StatusCode::OK, Json(HashMap::from([(code, label)]))).into_response(),
        Err(error) => result_message(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    }
}

/// Create the HTTP server with all routes
pub fn create_server(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/clients", get(get_clients))
        .route("/client_lang", post(client_lang))
        .route("/get_client_data/:id", get(get_client_data))
        .route("/deliveries", post(deliveries))
        .route("/v2/deliveries", post(deliveries_v2))
        .route("/client_counterparty/:code", get(client_counterparty))
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    state: Arc<AppState>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("HTTP server running on http://localhost:{port}");
    println!("Health check: http://localhost:{port}/health");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}

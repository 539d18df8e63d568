//! In-memory stand-in for the Pwinty REST API.
//!
//! Implements just enough of the order and photo endpoints for the client's
//! integration tests and for local experiments: form-encoded POST bodies,
//! camelCase JSON responses, merchant header authentication and the order
//! status rules the real service enforces.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

pub const MERCHANT_ID_HEADER: &str = "X-Pwinty-MerchantId";
pub const API_KEY_HEADER: &str = "X-Pwinty-REST-API-Key";

const SIZINGS: [&str; 3] = ["Crop", "ShrinkToFit", "ShrinkToExactFit"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    pub is_valid: bool,
    pub general_errors: Vec<String>,
    pub recipient_name: String,
    pub address1: String,
    pub address2: String,
    pub address_town_or_city: String,
    pub state_or_county: String,
    pub postal_or_zip_code: String,
    pub country: String,
    pub status: String,
    pub photos: Vec<Photo>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: u64,
    #[serde(rename = "type")]
    pub photo_type: String,
    pub url: String,
    pub status: String,
    pub copies: i64,
    pub sizing: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOrder {
    pub recipient_name: String,
    pub address1: String,
    pub address2: String,
    pub address_town_or_city: String,
    pub state_or_county: String,
    pub postal_or_zip_code: String,
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub id: u64,
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPhoto {
    pub order_id: u64,
    #[serde(rename = "type")]
    pub photo_type: String,
    #[serde(default)]
    pub url: String,
    pub copies: i64,
    pub sizing: String,
}

/// Merchant credentials the server accepts.
#[derive(Clone, Debug)]
pub struct MerchantCredentials {
    pub merchant_id: String,
    pub api_key: String,
}

impl Default for MerchantCredentials {
    fn default() -> Self {
        Self {
            merchant_id: "test-merchant".to_string(),
            api_key: "test-key".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    orders: HashMap<u64, Order>,
    last_order_id: u64,
    last_photo_id: u64,
}

#[derive(Clone)]
pub struct AppState {
    credentials: Arc<MerchantCredentials>,
    store: Arc<RwLock<Store>>,
}

pub fn app() -> Router {
    app_with_credentials(MerchantCredentials::default())
}

pub fn app_with_credentials(credentials: MerchantCredentials) -> Router {
    let state = AppState {
        credentials: Arc::new(credentials),
        store: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route("/Orders", get(get_order).post(create_order))
        .route("/Orders/Status", post(update_status))
        .route("/Orders/SubmissionStatus", get(submission_status))
        .route("/Photos", post(add_photo))
        .layer(middleware::from_fn_with_state(state.clone(), require_credentials))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_credentials(
    listener: TcpListener,
    credentials: MerchantCredentials,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_credentials(credentials)).await
}

/// Validation messages for a new order, in field order.
pub fn validation_errors(input: &CreateOrder) -> Vec<String> {
    [
        ("RecipientName", &input.recipient_name),
        ("Address1", &input.address1),
        ("AddressTownOrCity", &input.address_town_or_city),
        ("StateOrCounty", &input.state_or_county),
        ("PostalOrZipCode", &input.postal_or_zip_code),
        ("Country", &input.country),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| format!("{field} is required"))
    .collect()
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "errorMessage": message }))).into_response()
}

async fn require_credentials(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    // The header borrow must end before the request moves into `next`.
    let authorized = {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
        };
        header(MERCHANT_ID_HEADER) == Some(state.credentials.merchant_id.as_str())
            && header(API_KEY_HEADER) == Some(state.credentials.api_key.as_str())
    };
    if !authorized {
        tracing::warn!(path = %request.uri().path(), "rejected request with bad credentials");
        return api_error(StatusCode::UNAUTHORIZED, "Invalid merchant id or API key");
    }
    next.run(request).await
}

async fn get_order(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Order>, Response> {
    let store = state.store.read().await;
    store
        .orders
        .get(&query.id)
        .cloned()
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Order not found"))
}

async fn submission_status(
    state: State<AppState>,
    query: Query<OrderQuery>,
) -> Result<Json<Order>, Response> {
    get_order(state, query).await
}

async fn create_order(
    State(state): State<AppState>,
    Form(input): Form<CreateOrder>,
) -> Json<Order> {
    let general_errors = validation_errors(&input);
    let mut store = state.store.write().await;
    store.last_order_id += 1;
    let order = Order {
        id: store.last_order_id,
        is_valid: general_errors.is_empty(),
        general_errors,
        recipient_name: input.recipient_name,
        address1: input.address1,
        address2: input.address2,
        address_town_or_city: input.address_town_or_city,
        state_or_county: input.state_or_county,
        postal_or_zip_code: input.postal_or_zip_code,
        country: input.country,
        status: "NotYetSubmitted".to_string(),
        photos: Vec::new(),
    };
    store.orders.insert(order.id, order.clone());
    tracing::info!(order_id = order.id, is_valid = order.is_valid, "order created");
    Json(order)
}

async fn update_status(
    State(state): State<AppState>,
    Form(input): Form<StatusUpdate>,
) -> Result<StatusCode, Response> {
    let mut store = state.store.write().await;
    let order = store
        .orders
        .get_mut(&input.id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Order not found"))?;

    match (order.status.as_str(), input.status.as_str()) {
        ("NotYetSubmitted", "Submitted") => {
            if !order.is_valid {
                return Err(api_error(StatusCode::BAD_REQUEST, "Order is not valid"));
            }
            if order.photos.is_empty() {
                return Err(api_error(StatusCode::BAD_REQUEST, "Order has no photos"));
            }
        }
        ("NotYetSubmitted" | "Submitted", "Cancelled") => {}
        (from, to) => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                &format!("Cannot change order status from {from} to {to}"),
            ));
        }
    }

    tracing::info!(order_id = order.id, from = %order.status, to = %input.status, "order status changed");
    order.status = input.status;
    Ok(StatusCode::OK)
}

async fn add_photo(
    State(state): State<AppState>,
    Form(input): Form<AddPhoto>,
) -> Result<Json<Photo>, Response> {
    if input.copies < 1 {
        return Err(api_error(StatusCode::BAD_REQUEST, "Copies must be at least 1"));
    }
    if !SIZINGS.contains(&input.sizing.as_str()) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            &format!("Unknown sizing {}", input.sizing),
        ));
    }

    let mut guard = state.store.write().await;
    let store = &mut *guard;
    let order = store
        .orders
        .get_mut(&input.order_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Order not found"))?;
    if order.status != "NotYetSubmitted" {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Photos can only be added before submission",
        ));
    }
    store.last_photo_id += 1;

    let status = if input.url.is_empty() {
        "AwaitingUrlOrData"
    } else {
        "NotYetDownloaded"
    };
    let photo = Photo {
        id: store.last_photo_id,
        photo_type: input.photo_type,
        url: input.url,
        status: status.to_string(),
        copies: input.copies,
        sizing: input.sizing,
        errors: Vec::new(),
        warnings: Vec::new(),
    };
    order.photos.push(photo.clone());
    tracing::info!(order_id = order.id, photo_id = photo.id, "photo added");
    Ok(Json(photo))
}

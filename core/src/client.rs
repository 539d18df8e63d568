//! Request builder, response parser and executor for the Pwinty API.
//!
//! # Design
//! `PwintyClient` holds immutable configuration: the base URL, merchant
//! credentials and a shared `Transport`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`. The executing methods (`get_order`,
//! `create_order`, ...) glue the two together with exactly one round trip
//! through the transport. There is no retry, caching or pagination; every
//! call re-fetches from the service.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::form_urlencoded;

use crate::error::ApiError;
use crate::http::{default_transport, HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::types::{NewOrder, NewPhoto, Order, OrderStatus, Photo};

/// Base URL of the live service.
pub const PRODUCTION_URL: &str = "https://api.pwinty.com";
/// Base URL of the sandbox service.
pub const SANDBOX_URL: &str = "https://sandbox.pwinty.com";

pub const MERCHANT_ID_HEADER: &str = "X-Pwinty-MerchantId";
pub const API_KEY_HEADER: &str = "X-Pwinty-REST-API-Key";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Which deployment of the API to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Production,
    Sandbox,
    /// Any other base URL, e.g. a local mock. A trailing `/` is ignored.
    Custom(String),
}

impl Endpoint {
    pub fn base_url(&self) -> &str {
        match self {
            Endpoint::Production => PRODUCTION_URL,
            Endpoint::Sandbox => SANDBOX_URL,
            Endpoint::Custom(url) => url.trim_end_matches('/'),
        }
    }
}

/// Merchant identifier and REST API key sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    merchant_id: String,
    api_key: String,
}

impl Credentials {
    pub fn new(merchant_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            api_key: api_key.into(),
        }
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("merchant_id", &self.merchant_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Synchronous client for the Pwinty print-fulfillment API.
///
/// Cheap to clone; clones share the transport. Configuration cannot change
/// after construction, so one instance may serve concurrent callers as long
/// as the transport itself is thread-safe.
#[derive(Debug, Clone)]
pub struct PwintyClient {
    base_url: String,
    credentials: Credentials,
    transport: Arc<dyn Transport>,
}

impl PwintyClient {
    /// Build a client that uses the process-wide default transport.
    pub fn new(credentials: Credentials, endpoint: Endpoint) -> Self {
        Self::with_transport(credentials, endpoint, default_transport())
    }

    pub fn with_transport(
        credentials: Credentials,
        endpoint: Endpoint,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: endpoint.base_url().to_string(),
            credentials,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Fetch an order, including its photos.
    #[instrument(skip(self))]
    pub fn get_order(&self, id: i64) -> Result<Order, ApiError> {
        let request = self.build_get_order(id)?;
        self.parse_order(self.send(&request)?)
    }

    /// Create an order. Missing or rejected shipping details do not fail the
    /// call; inspect `is_valid` and `general_errors` on the returned order.
    #[instrument(skip(self, input), fields(country = %input.country))]
    pub fn create_order(&self, input: &NewOrder) -> Result<Order, ApiError> {
        let request = self.build_create_order(input);
        let order = self.parse_order(self.send(&request)?)?;
        if !order.is_valid {
            debug!(order_id = order.id, errors = ?order.general_errors, "order failed validation");
        }
        Ok(order)
    }

    /// Ask the service to move an order to `status` (`Submitted` or
    /// `Cancelled`). A rejected transition surfaces as `ApiError::HttpError`.
    #[instrument(skip(self, status), fields(status = %status))]
    pub fn set_order_status(&self, id: i64, status: OrderStatus) -> Result<(), ApiError> {
        let request = self.build_set_order_status(id, &status)?;
        self.parse_set_order_status(self.send(&request)?)
    }

    /// Fetch an order as seen by the submission stage.
    #[instrument(skip(self))]
    pub fn submission_status(&self, id: i64) -> Result<Order, ApiError> {
        let request = self.build_submission_status(id)?;
        self.parse_order(self.send(&request)?)
    }

    /// Attach a photo to an order by URL. The service downloads the image
    /// later, so the returned photo usually starts as `NotYetDownloaded`.
    #[instrument(skip(self, input), fields(order_id = input.order_id, sizing = %input.sizing))]
    pub fn add_photo(&self, input: &NewPhoto) -> Result<Photo, ApiError> {
        let request = self.build_add_photo(input)?;
        let photo = self.parse_photo(self.send(&request)?)?;
        if !photo.errors.is_empty() || !photo.warnings.is_empty() {
            debug!(
                photo_id = photo.id,
                errors = ?photo.errors,
                warnings = ?photo.warnings,
                "photo reported diagnostics"
            );
        }
        Ok(photo)
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_get_order(&self, id: i64) -> Result<HttpRequest, ApiError> {
        let id = positive("id", id)?;
        Ok(self.get_request("/Orders", &[("id", id.to_string().as_str())]))
    }

    pub fn build_create_order(&self, input: &NewOrder) -> HttpRequest {
        let mut fields = vec![
            ("recipientName", input.recipient_name.as_str()),
            ("address1", input.address1.as_str()),
        ];
        if let Some(address2) = &input.address2 {
            fields.push(("address2", address2.as_str()));
        }
        fields.extend([
            ("addressTownOrCity", input.address_town_or_city.as_str()),
            ("stateOrCounty", input.state_or_county.as_str()),
            ("postalOrZipCode", input.postal_or_zip_code.as_str()),
            ("country", input.country.as_str()),
        ]);
        self.form_request("/Orders", &fields)
    }

    pub fn build_set_order_status(
        &self,
        id: i64,
        status: &OrderStatus,
    ) -> Result<HttpRequest, ApiError> {
        let id = positive("id", id)?.to_string();
        Ok(self.form_request(
            "/Orders/Status",
            &[("id", id.as_str()), ("status", status.as_str())],
        ))
    }

    pub fn build_submission_status(&self, id: i64) -> Result<HttpRequest, ApiError> {
        let id = positive("id", id)?;
        Ok(self.get_request(
            "/Orders/SubmissionStatus",
            &[("id", id.to_string().as_str())],
        ))
    }

    pub fn build_add_photo(&self, input: &NewPhoto) -> Result<HttpRequest, ApiError> {
        let order_id = positive("orderId", input.order_id)?.to_string();
        let copies = positive("copies", input.copies)?.to_string();
        Ok(self.form_request(
            "/Photos",
            &[
                ("orderId", order_id.as_str()),
                ("type", input.photo_type.as_str()),
                ("url", input.url.as_str()),
                ("copies", copies.as_str()),
                ("sizing", input.sizing.as_str()),
            ],
        ))
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    /// Decode the response of Get Order, Create Order or Get Submission Status.
    pub fn parse_order(&self, response: HttpResponse) -> Result<Order, ApiError> {
        decode(response)
    }

    pub fn parse_photo(&self, response: HttpResponse) -> Result<Photo, ApiError> {
        decode(response)
    }

    /// The status endpoint's body carries nothing the caller needs, so only
    /// the HTTP status is checked.
    pub fn parse_set_order_status(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.execute(request).inspect_err(|e| {
            warn!(method = %request.method, url = %request.url, error = %e, "request failed");
        })?;
        debug!(status = response.status, bytes = response.body.len(), "received response");
        Ok(response)
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        vec![
            (
                MERCHANT_ID_HEADER.to_string(),
                self.credentials.merchant_id.clone(),
            ),
            (API_KEY_HEADER.to_string(), self.credentials.api_key.clone()),
        ]
    }

    fn get_request(&self, path: &str, query: &[(&str, &str)]) -> HttpRequest {
        let mut url = format!("{}{path}", self.base_url);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&encode_pairs(query));
        }
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: self.auth_headers(),
            body: None,
        }
    }

    fn form_request(&self, path: &str, fields: &[(&str, &str)]) -> HttpRequest {
        let mut headers = vec![("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string())];
        headers.extend(self.auth_headers());
        HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{path}", self.base_url),
            headers,
            body: Some(encode_pairs(fields)),
        }
    }
}

fn encode_pairs(pairs: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn positive(name: &str, value: i64) -> Result<i64, ApiError> {
    if value <= 0 {
        return Err(ApiError::InvalidArgument(format!("{name} must be positive")));
    }
    Ok(value)
}

fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    Ok(serde_json::from_slice(&response.body)?)
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    let body = String::from_utf8_lossy(&response.body).into_owned();
    warn!(status = response.status, body = %body, "unexpected response status");
    Err(ApiError::HttpError {
        status: response.status,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PhotoStatus, PhotoType, Sizing};

    fn client() -> PwintyClient {
        PwintyClient::new(
            Credentials::new("merchant-1", "key-1"),
            Endpoint::Custom("http://localhost:3000".to_string()),
        )
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn status(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn new_order() -> NewOrder {
        NewOrder {
            recipient_name: "Jane Doe".to_string(),
            address1: "1 Main St".to_string(),
            address2: None,
            address_town_or_city: "Springfield".to_string(),
            state_or_county: "IL".to_string(),
            postal_or_zip_code: "62701".to_string(),
            country: "US".to_string(),
        }
    }

    #[test]
    fn endpoints_resolve_to_known_urls() {
        assert_eq!(Endpoint::Production.base_url(), "https://api.pwinty.com");
        assert_eq!(Endpoint::Sandbox.base_url(), "https://sandbox.pwinty.com");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = PwintyClient::new(
            Credentials::new("m", "k"),
            Endpoint::Custom("http://localhost:3000/".to_string()),
        );
        let req = client.build_get_order(1).unwrap();
        assert_eq!(req.url, "http://localhost:3000/Orders?id=1");
    }

    #[test]
    fn build_get_order_produces_correct_request() {
        let req = client().build_get_order(42).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/Orders?id=42");
        assert!(req.body.is_none());
        assert_eq!(req.header(MERCHANT_ID_HEADER), Some("merchant-1"));
        assert_eq!(req.header(API_KEY_HEADER), Some("key-1"));
        assert_eq!(req.header("Content-Type"), None);
    }

    #[test]
    fn build_submission_status_produces_correct_request() {
        let req = client().build_submission_status(1234567).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "http://localhost:3000/Orders/SubmissionStatus?id=1234567"
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn build_create_order_produces_form_body() {
        let req = client().build_create_order(&new_order());
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/Orders");
        assert_eq!(
            req.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(
            req.body.as_deref(),
            Some(
                "recipientName=Jane+Doe&address1=1+Main+St&addressTownOrCity=Springfield\
                 &stateOrCounty=IL&postalOrZipCode=62701&country=US"
            )
        );
    }

    #[test]
    fn build_create_order_includes_address2_when_present() {
        let mut input = new_order();
        input.address2 = Some("Apt 4 & 5".to_string());
        let req = client().build_create_order(&input);
        let body = req.body.unwrap();
        assert!(body.contains("&address2=Apt+4+%26+5&"));
    }

    #[test]
    fn build_set_order_status_renders_decimal_id() {
        let req = client()
            .build_set_order_status(65, &OrderStatus::Submitted)
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/Orders/Status");
        assert_eq!(req.body.as_deref(), Some("id=65&status=Submitted"));
        assert_eq!(req.header(API_KEY_HEADER), Some("key-1"));
    }

    #[test]
    fn build_add_photo_encodes_all_fields() {
        let input = NewPhoto {
            order_id: 10,
            photo_type: PhotoType::from("4x6"),
            url: "https://img.example.com/a.jpg?w=1".to_string(),
            copies: 3,
            sizing: Sizing::Crop,
        };
        let req = client().build_add_photo(&input).unwrap();
        assert_eq!(req.url, "http://localhost:3000/Photos");
        assert_eq!(
            req.body.as_deref(),
            Some(
                "orderId=10&type=4x6&url=https%3A%2F%2Fimg.example.com%2Fa.jpg%3Fw%3D1\
                 &copies=3&sizing=Crop"
            )
        );
    }

    #[test]
    fn negative_ids_and_copies_are_rejected() {
        let c = client();
        assert!(matches!(c.build_get_order(-3), Err(ApiError::InvalidArgument(_))));
        let input = NewPhoto {
            order_id: 1,
            photo_type: PhotoType::from("4x6"),
            url: "https://img.example.com/a.jpg".to_string(),
            copies: -1,
            sizing: Sizing::Crop,
        };
        assert!(matches!(
            c.build_add_photo(&input),
            Err(ApiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn parse_order_tolerates_null_scalars() {
        let order = client()
            .parse_order(ok(r#"{"id":null,"isValid":null,"generalErrors":["x"]}"#))
            .unwrap();
        assert_eq!(order.id, 0);
        assert!(!order.is_valid);
        let photo = client().parse_photo(ok(r#"{"id":1,"copies":null}"#)).unwrap();
        assert_eq!(photo.copies, 0);
    }

    #[test]
    fn zero_ids_and_copies_are_rejected() {
        let c = client();
        assert!(matches!(c.build_get_order(0), Err(ApiError::InvalidArgument(_))));
        assert!(matches!(
            c.build_submission_status(0),
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(matches!(
            c.build_set_order_status(0, &OrderStatus::Cancelled),
            Err(ApiError::InvalidArgument(_))
        ));
        let input = NewPhoto {
            order_id: 1,
            photo_type: PhotoType::from("4x6"),
            url: "https://img.example.com/a.jpg".to_string(),
            copies: 0,
            sizing: Sizing::Crop,
        };
        assert!(matches!(
            c.build_add_photo(&input),
            Err(ApiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn parse_order_success() {
        let order = client()
            .parse_order(ok(r#"{"id":42,"isValid":true,"status":"Submitted","photos":[]}"#))
            .unwrap();
        assert_eq!(order.id, 42);
        assert!(order.is_valid);
        assert_eq!(order.status, Some(OrderStatus::Submitted));
        assert!(order.photos.is_empty());
    }

    #[test]
    fn parse_order_keeps_in_band_validation_errors() {
        let order = client()
            .parse_order(ok(r#"{"isValid":false,"generalErrors":["Address1 is required"]}"#))
            .unwrap();
        assert!(!order.is_valid);
        assert_eq!(order.general_errors, vec!["Address1 is required".to_string()]);
    }

    #[test]
    fn parse_order_not_found() {
        let err = client().parse_order(status(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_order_bad_json() {
        let err = client().parse_order(ok("not json")).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_order_empty_body_is_a_decode_error() {
        let err = client().parse_order(ok("")).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_photo_success() {
        let photo = client()
            .parse_photo(ok(
                r#"{"id":5,"type":"4x6","url":"https://img/a.jpg","status":"NotYetDownloaded","copies":3,"sizing":"Crop"}"#,
            ))
            .unwrap();
        assert_eq!(photo.id, 5);
        assert_eq!(photo.copies, 3);
        assert_eq!(photo.sizing, Some(Sizing::Crop));
        assert_eq!(photo.status, Some(PhotoStatus::NotYetDownloaded));
    }

    #[test]
    fn parse_photo_wrong_status() {
        let err = client()
            .parse_photo(status(500, "internal error"))
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
    }

    #[test]
    fn parse_set_order_status_accepts_empty_body() {
        assert!(client().parse_set_order_status(ok("")).is_ok());
    }

    #[test]
    fn parse_set_order_status_surfaces_rejection() {
        let err = client()
            .parse_set_order_status(status(
                400,
                r#"{"errorMessage":"Order cannot be submitted"}"#,
            ))
            .unwrap_err();
        match err {
            ApiError::HttpError { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("cannot be submitted"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn credentials_debug_hides_api_key() {
        let rendered = format!("{:?}", Credentials::new("merchant-1", "secret-key"));
        assert!(rendered.contains("merchant-1"));
        assert!(!rendered.contains("secret-key"));
    }
}

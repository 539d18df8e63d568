//! Synchronous client for the Pwinty print-fulfillment API.
//!
//! # Overview
//! Five operations map one-to-one onto remote endpoints: fetch an order,
//! create an order, request an order status change, fetch submission status,
//! and attach a photo by URL. Every request carries the merchant id and API
//! key headers; every JSON response is decoded into a plain `Order` or
//! `Photo` snapshot.
//!
//! # Design
//! - `PwintyClient` is immutable: base URL, credentials and a shared
//!   `Transport`. Clones are cheap and safe to use from several threads.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so callers can also run the I/O
//!   themselves.
//! - Clients built with `PwintyClient::new` share one lazily created
//!   `UreqTransport`.
//! - Validation problems reported by the service are data, not errors:
//!   check `Order::is_valid` and friends.
//!
//! ```rust,no_run
//! use pwinty_core::{Credentials, Endpoint, NewPhoto, OrderStatus, PwintyClient, Sizing};
//!
//! # fn main() -> Result<(), pwinty_core::ApiError> {
//! let client = PwintyClient::new(Credentials::new("merchant", "key"), Endpoint::Sandbox);
//! let order = client.get_order(42)?;
//! client.add_photo(&NewPhoto {
//!     order_id: order.id,
//!     photo_type: "4x6".into(),
//!     url: "https://example.com/cat.jpg".to_string(),
//!     copies: 2,
//!     sizing: Sizing::Crop,
//! })?;
//! client.set_order_status(order.id, OrderStatus::Submitted)?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod types;

pub use client::{Credentials, Endpoint, PwintyClient, PRODUCTION_URL, SANDBOX_URL};
pub use error::ApiError;
pub use http::{
    default_transport, HttpMethod, HttpRequest, HttpResponse, Transport, TransportConfig,
    UreqTransport,
};
pub use types::{
    NewOrder, NewPhoto, Order, OrderStatus, Photo, PhotoStatus, PhotoType, Sizing,
};

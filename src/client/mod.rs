//! Authenticated client for the e-invoicing web service.
//!
//! Every request is an [`OutboundRequest`]: the caller's `apiUuid`, the
//! JSON payload, and an HMAC [`fingerprint`](crate::core::digest) of that
//! payload keyed by the client id and secret. Webhook callbacks carry the
//! same kind of fingerprint and are verified before their payload is read.
//!
//! HTTP is not part of this crate: plug an implementation of [`Transport`]
//! into [`Client`].
//!
//! ```rust
//! use efatture::client::{Client, ClientConfig, Credentials, OutboundRequest, Transport};
//! use efatture::EfattureError;
//!
//! struct Echo;
//!
//! impl Transport for Echo {
//!     fn send(&self, _command: &str, _request: &OutboundRequest) -> Result<String, EfattureError> {
//!         Ok(r#"{"success":true,"data":{"id":1}}"#.to_string())
//!     }
//! }
//!
//! let client = Client::new(ClientConfig::new(Credentials::new("uuid", "secret")), Echo);
//! let data = client.execute("users", serde_json::json!({"kind": "cf"})).unwrap();
//! assert_eq!(data["id"], 1);
//! ```

mod api;
mod config;
mod request;
mod webhook;

pub use api::{Client, PLACEHOLDER_SDI_ID, UserKind};
pub use config::{ClientConfig, Credentials, DEFAULT_MAX_SIGNED_SIZE};
pub use request::{
    BulkRequest, INPUT_MASSIVO_NAMESPACE, InvoicesBulkRequest, ListRequest, OutboundRequest,
    RICHIESTA_NAMESPACE, ReceiptSource, ReceiptsBulkRequest, ReceivedInvoicesBy, SortDirection,
    Transport, parse_response,
};
pub use webhook::{CallbackEvent, SdiNotification, WebhookKind};

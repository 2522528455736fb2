//! # efatture
//!
//! Italian e-invoicing library for the Sistema di Interscambio (SdI):
//! path-addressable FatturaPA documents, canonical element ordering, offline
//! SdI validation, signed invoice ingestion and an HMAC-authenticated client
//! envelope.
//!
//! All amounts are compared as [`rust_decimal::Decimal`], never as floats.
//!
//! ## Quick Start
//!
//! ```rust
//! use efatture::fatturapa::{InvoiceData, NATURA_MISSING_AT_ZERO_RATE};
//!
//! let mut invoice = InvoiceData::builder().build().unwrap();
//! invoice
//!     .set("FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee[1]/AliquotaIVA", "0.00")
//!     .unwrap();
//! assert_eq!(invoice.versione().as_deref(), Some("FPR12"));
//! assert_eq!(
//!     invoice.count("FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee").unwrap(),
//!     1
//! );
//!
//! let errors = invoice.errors().unwrap();
//! assert!(errors.contains(NATURA_MISSING_AT_ZERO_RATE));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | always | Path documents, ordering maps, validator chain, XSD subset, digest |
//! | `fatturapa` (default) | Invoices, outcome notifications, SdI business rules |
//! | `signed` | CAdES-BES / XAdES-BES signed invoice ingestion |
//! | `client` | Web-service request envelope, responses and webhooks |
//! | `all` | Everything |

pub mod core;

#[cfg(feature = "fatturapa")]
pub mod fatturapa;

#[cfg(feature = "signed")]
pub mod signed;

#[cfg(feature = "client")]
pub mod client;

// Re-export core types at crate root for convenience
pub use crate::core::*;

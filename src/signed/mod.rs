//! Signed invoice ingestion.
//!
//! The SdI accepts two signature envelopes:
//!
//! | Method | File | Plain content |
//! |--------|------|---------------|
//! | CAdES-BES | `.xml.p7m` | DER PKCS#7 wrapping the XML; opened by a [`CadesExtractor`] |
//! | XAdES-BES | `.xml` | the XML itself with an embedded `ds:Signature`, stripped in-process |
//!
//! Signatures are opened, not verified: certificate checks belong to the SdI.

mod cades;
mod method;
mod reader;

pub use cades::{CadesExtractor, OpensslExtractor};
pub use method::SigningMethod;
pub use reader::{SignedInvoice, is_xades_signed, strip_xades_signature};

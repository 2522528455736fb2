//! Path-addressable XML documents, schema ordering, validation chains and
//! the HMAC digest.
//!
//! Everything here is independent of any particular document family; the
//! FatturaPA specifics live in [`crate::fatturapa`].

mod countries;
mod digest;
mod document;
mod error;
mod node;
mod ordering;
mod path;
mod schema;
mod validation;
pub mod xml_utils;

pub use countries::*;
pub use digest::*;
pub use document::*;
pub use error::*;
pub use node::*;
pub use ordering::*;
pub use path::*;
pub use schema::*;
pub use validation::*;

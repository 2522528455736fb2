//! FatturaPA documents for the Italian Sistema di Interscambio (SdI).
//!
//! Three document variants are provided on top of [`XmlDocument`](crate::core::XmlDocument):
//!
//! - [`InvoiceData`]: ordinary (FPA12 / FPR12) and simplified (FSM10) invoices
//! - [`OutcomeNotification`]: the `NotificaEsitoCommittente` message a
//!   recipient sends back to accept or reject an invoice
//! - [`VatSettlement`]: the quarterly periodic VAT settlement return
//!   (`Fornitura`, IVP18) filed with the Agenzia delle Entrate
//!
//! Validation is split into [`BusinessRuleValidator`] (the SdI `004xx`
//! checks that can be evaluated offline) and [`DateSanityValidator`].

mod codes;
mod dates;
mod invoice;
pub mod maps;
mod notification;
mod rules;
mod settlement;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{EfattureError, SchemaOrderingMap};

pub use codes::*;
pub use dates::*;
pub use invoice::*;
pub use notification::*;
pub use rules::*;
pub use settlement::*;

/// Namespace of ordinary invoices (FPA12, FPR12).
pub const FATTURE_V12_NAMESPACE: &str = "http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2";
/// Namespace of simplified invoices (FSM10).
pub const FATTURE_V10_NAMESPACE: &str = "http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.0";
/// Namespace of SdI messages.
pub const MESSAGGI_NAMESPACE: &str = "http://www.fatturapa.gov.it/sdi/messaggi/v1.0";
/// Namespace of periodic VAT settlements.
pub const IVP_NAMESPACE: &str = "urn:www.agenziaentrate.gov.it:specificheTecniche:sco:ivp";
/// XML-DSig namespace (`ds:Signature`).
pub const XMLDSIG_NAMESPACE: &str = "http://www.w3.org/2000/09/xmldsig#";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// `FormatoTrasmissione` code, mirrored in the root `versione` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransmissionFormat {
    /// Invoice to a public administration (B2G).
    #[serde(rename = "FPA12")]
    Fpa12,
    /// Invoice between private parties (B2B / B2C).
    #[serde(rename = "FPR12")]
    Fpr12,
    /// Simplified invoice.
    #[serde(rename = "FSM10")]
    Fsm10,
}

impl TransmissionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fpa12 => "FPA12",
            Self::Fpr12 => "FPR12",
            Self::Fsm10 => "FSM10",
        }
    }

    pub fn family(&self) -> InvoiceFamily {
        match self {
            Self::Fpa12 | Self::Fpr12 => InvoiceFamily::Ordinary,
            Self::Fsm10 => InvoiceFamily::Simplified,
        }
    }
}

impl fmt::Display for TransmissionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransmissionFormat {
    type Err = EfattureError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FPA12" => Ok(Self::Fpa12),
            "FPR12" => Ok(Self::Fpr12),
            "FSM10" => Ok(Self::Fsm10),
            _ => Err(EfattureError::InvalidArgument(format!(
                "transmission format must be 'FPA12', 'FPR12' or 'FSM10', got '{s}'"
            ))),
        }
    }
}

/// Ordinary invoices and simplified invoices use different schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoiceFamily {
    Ordinary,
    Simplified,
}

impl InvoiceFamily {
    /// Root element local name.
    pub fn root_tag(&self) -> &'static str {
        match self {
            Self::Ordinary => "FatturaElettronica",
            Self::Simplified => "FatturaElettronicaSemplificata",
        }
    }

    /// Root element name as written, with the `p:` prefix.
    pub fn qualified_root(&self) -> &'static str {
        match self {
            Self::Ordinary => "p:FatturaElettronica",
            Self::Simplified => "p:FatturaElettronicaSemplificata",
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Ordinary => FATTURE_V12_NAMESPACE,
            Self::Simplified => FATTURE_V10_NAMESPACE,
        }
    }

    /// The canonical element order for this family.
    pub fn ordering_map(&self) -> &'static SchemaOrderingMap {
        match self {
            Self::Ordinary => maps::ordinary(),
            Self::Simplified => maps::simplified(),
        }
    }

    /// Family whose root has local name `tag` in `namespace`.
    pub fn from_root(tag: &str, namespace: Option<&str>) -> Option<Self> {
        [Self::Ordinary, Self::Simplified]
            .into_iter()
            .find(|f| f.root_tag() == tag && namespace.is_none_or(|ns| ns == f.namespace()))
    }
}

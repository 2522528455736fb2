use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::EfattureError;

/// Event announced by a webhook callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookKind {
    /// An invoice was sent to the SdI.
    WebhookInvioFattura,
    /// A notification was sent to the SdI.
    WebhookInvioNotifica,
    /// An invoice was received from the SdI.
    WebhookRiceviFattura,
    /// A notification was received from the SdI.
    WebhookRiceviNotifica,
}

impl WebhookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebhookInvioFattura => "webhook_invio_fattura",
            Self::WebhookInvioNotifica => "webhook_invio_notifica",
            Self::WebhookRiceviFattura => "webhook_ricevi_fattura",
            Self::WebhookRiceviNotifica => "webhook_ricevi_notifica",
        }
    }

    /// Whether the event concerns an SdI notification rather than an invoice.
    pub fn is_notification(&self) -> bool {
        matches!(self, Self::WebhookInvioNotifica | Self::WebhookRiceviNotifica)
    }
}

impl fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookKind {
    type Err = EfattureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "webhook_invio_fattura" => Ok(Self::WebhookInvioFattura),
            "webhook_invio_notifica" => Ok(Self::WebhookInvioNotifica),
            "webhook_ricevi_fattura" => Ok(Self::WebhookRiceviFattura),
            "webhook_ricevi_notifica" => Ok(Self::WebhookRiceviNotifica),
            _ => Err(EfattureError::Protocol(format!("unknown webhook kind '{s}'"))),
        }
    }
}

/// Kind of SdI notification file, named after its root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SdiNotification {
    /// Delivery receipt (`RC`).
    RicevutaConsegna,
    /// Failed delivery (`MC`).
    NotificaMancataConsegna,
    /// Rejection (`NS`).
    NotificaScarto,
    /// Recipient outcome (`NE`).
    NotificaEsito,
    /// No outcome within the deadline (`DT`).
    NotificaDecorrenzaTermini,
    /// Transmitted but undeliverable (`AT`).
    AttestazioneTrasmissioneFattura,
}

impl SdiNotification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RicevutaConsegna => "RicevutaConsegna",
            Self::NotificaMancataConsegna => "NotificaMancataConsegna",
            Self::NotificaScarto => "NotificaScarto",
            Self::NotificaEsito => "NotificaEsito",
            Self::NotificaDecorrenzaTermini => "NotificaDecorrenzaTermini",
            Self::AttestazioneTrasmissioneFattura => "AttestazioneTrasmissioneFattura",
        }
    }

    /// Whether the invoice reached its recipient.
    pub fn is_delivered(&self) -> bool {
        matches!(
            self,
            Self::RicevutaConsegna | Self::NotificaEsito | Self::NotificaDecorrenzaTermini
        )
    }
}

impl fmt::Display for SdiNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SdiNotification {
    type Err = EfattureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RicevutaConsegna" => Ok(Self::RicevutaConsegna),
            "NotificaMancataConsegna" => Ok(Self::NotificaMancataConsegna),
            "NotificaScarto" => Ok(Self::NotificaScarto),
            "NotificaEsito" => Ok(Self::NotificaEsito),
            "NotificaDecorrenzaTermini" => Ok(Self::NotificaDecorrenzaTermini),
            "AttestazioneTrasmissioneFattura" => Ok(Self::AttestazioneTrasmissioneFattura),
            _ => Err(EfattureError::Protocol(format!("unknown SdI notification '{s}'"))),
        }
    }
}

/// A verified webhook callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackEvent {
    pub webhook_kind: WebhookKind,
    pub sdi_invoice_file_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdi_notification_file_id: Option<u64>,
}

impl CallbackEvent {
    /// Read the event fields from an already verified payload.
    ///
    /// Ids may arrive as numbers or numeric strings; a missing or
    /// non-positive invoice id is a [`EfattureError::Protocol`] error.
    pub(crate) fn from_payload(payload: &Value) -> Result<Self, EfattureError> {
        let webhook_kind = payload
            .get("webhookKind")
            .and_then(Value::as_str)
            .ok_or_else(|| EfattureError::Protocol("missing 'webhookKind'".into()))?
            .parse()?;

        let sdi_invoice_file_id = positive_id(payload.get("sdiInvoiceFileId"))
            .ok_or_else(|| EfattureError::Protocol("invalid payload received".into()))?;
        let sdi_notification_file_id = positive_id(payload.get("sdiNotificationFileId"));

        Ok(Self {
            webhook_kind,
            sdi_invoice_file_id,
            sdi_notification_file_id,
        })
    }
}

/// Integer value of `value`, accepting leading digits of a string, if positive.
fn positive_id(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().filter(|id| *id > 0),
        Value::String(s) => {
            let s = s.trim();
            let digits = s.strip_prefix('+').unwrap_or(s);
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            digits[..end].parse::<u64>().ok().filter(|id| *id > 0)
        }
        _ => None,
    }
}

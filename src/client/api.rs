use std::fmt;
use std::str::FromStr;

use serde_json::{Value, json};
use tracing::debug;

use super::request::{ListRequest, OutboundRequest, Transport, parse_response};
use super::webhook::CallbackEvent;
use super::ClientConfig;
use crate::core::{EfattureError, Payload, Signer, ValidationError, normalize_country_code};
use crate::fatturapa::{InvoiceData, OutcomeNotification, SIZE_EXCEEDED};
use crate::signed::{SignedInvoice, SigningMethod};

/// `IdentificativoSdI` written into outgoing notifications; the service
/// replaces it with the real one.
pub const PLACEHOLDER_SDI_ID: &str = "111";

const MAX_USER_CODE_LEN: usize = 28;
const TRANSMISSION: &str = "FatturaElettronicaHeader/DatiTrasmissione";

/// Kind of fiscal code a user is registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserKind {
    /// Codice fiscale.
    Cf,
    /// Partita IVA.
    Piva,
}

impl UserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cf => "cf",
            Self::Piva => "piva",
        }
    }
}

impl fmt::Display for UserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserKind {
    type Err = EfattureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cf" => Ok(Self::Cf),
            "piva" => Ok(Self::Piva),
            _ => Err(EfattureError::InvalidArgument(format!(
                "user kind must be 'cf' or 'piva', got '{s}'"
            ))),
        }
    }
}

/// Web-service client.
///
/// Each operation validates its document, builds the payload, signs it and
/// hands it to the [`Transport`]. Responses are unwrapped with
/// [`parse_response`].
pub struct Client<T> {
    config: ClientConfig,
    signer: Signer,
    transport: T,
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Client<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        let signer = config.credentials.signer();
        Self {
            config,
            signer,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sign `payload` into a request.
    pub fn request(&self, payload: Value) -> Result<OutboundRequest, EfattureError> {
        let fingerprint = self.signer.sign(&Payload::Structured(payload.clone()))?;
        Ok(OutboundRequest {
            api_uuid: self.signer.client_id().to_string(),
            fingerprint,
            payload,
        })
    }

    /// Sign `payload`, send it to `command` and unwrap the response data.
    pub fn execute(&self, command: &str, payload: Value) -> Result<Value, EfattureError> {
        let command = command.to_ascii_lowercase();
        let request = self.request(payload)?;
        debug!(command = %command, api_uuid = %request.api_uuid, "sending request");
        let body = self.transport.send(&command, &request)?;
        parse_response(&body)
    }

    /// Start a paged listing of `command` (`invoices`, `notifications`, ...).
    pub fn list(&self, command: &str) -> ListRequest<'_, T> {
        ListRequest::new(self, command)
    }

    /// Send an unsigned invoice; the service signs it on the sender's behalf.
    ///
    /// The transmitter fields are filled with the placeholders the service
    /// expects (`IT`, 28 zeros, 10 zeros) before validation.
    pub fn send_invoice(&self, invoice: &mut InvoiceData) -> Result<Value, EfattureError> {
        invoice
            .set(&format!("{TRANSMISSION}/IdTrasmittente/IdPaese"), "IT")?
            .set(&format!("{TRANSMISSION}/IdTrasmittente/IdCodice"), "0".repeat(28))?
            .set(&format!("{TRANSMISSION}/ProgressivoInvio"), "0".repeat(10))?;
        invoice.validate()?;

        let invoice_xml = invoice.save_xml(false)?;
        self.execute("invoices", json!({ "invoiceXml": invoice_xml }))
    }

    /// Upload an invoice the sender signed.
    ///
    /// XAdES files travel as text. CAdES envelopes are DER, so they are sent
    /// hex-encoded.
    pub fn upload_signed_invoice(&self, signed: &mut SignedInvoice) -> Result<Value, EfattureError> {
        signed.invoice_mut().validate()?;

        let content = signed.signed_content();
        if content.len() > self.config.max_signed_size {
            return Err(ValidationError::new(
                SIZE_EXCEEDED,
                format!(
                    "signed invoice is {} bytes, more than the {} allowed",
                    content.len(),
                    self.config.max_signed_size
                ),
            )
            .into());
        }

        let signed_xml = match signed.method() {
            SigningMethod::XadesBes => String::from_utf8(content.to_vec()).map_err(|e| {
                EfattureError::InvalidArgument(format!("XAdES-BES file is not UTF-8: {e}"))
            })?,
            SigningMethod::CadesBes => hex::encode(content),
        };
        self.execute(
            "files",
            json!({
                "signingMethod": signed.method().as_str(),
                "signedInvoiceXml": signed_xml,
            }),
        )
    }

    /// Send the recipient's outcome for a received invoice file.
    pub fn send_outcome(
        &self,
        sdi_invoice_file_id: u64,
        notification: &mut OutcomeNotification,
    ) -> Result<Value, EfattureError> {
        notification.set_identificativo_sdi(PLACEHOLDER_SDI_ID)?;
        notification.validate()?;

        let xml = notification.save_xml(false)?;
        self.execute(
            "notifications",
            json!({
                "sdiInvoiceFileId": sdi_invoice_file_id.to_string(),
                "notificaEsitoXml": xml,
            }),
        )
    }

    /// Enable or disable sending and receiving for a fiscal code.
    pub fn set_user(
        &self,
        kind: UserKind,
        id_paese: &str,
        codice: &str,
        receives: bool,
        transmits: bool,
    ) -> Result<Value, EfattureError> {
        let id_paese = normalize_country_code(id_paese).ok_or_else(|| {
            EfattureError::InvalidArgument(format!(
                "'{id_paese}' is not a valid ISO 3166 country code"
            ))
        })?;

        let codice = codice.trim().to_lowercase();
        if codice.is_empty() {
            return Err(EfattureError::InvalidArgument("field 'codice' is empty".into()));
        }
        if codice.chars().count() > MAX_USER_CODE_LEN {
            return Err(EfattureError::InvalidArgument(format!(
                "field 'codice' is longer than {MAX_USER_CODE_LEN} characters"
            )));
        }

        let flag = |b: bool| if b { "1" } else { "0" };
        self.execute(
            "users",
            json!({
                "kind": kind.as_str(),
                "idPaese": id_paese,
                "codice": codice,
                "receives": flag(receives),
                "transmits": flag(transmits),
            }),
        )
    }

    /// Verify a webhook callback and read its event.
    ///
    /// The fingerprint is checked before anything in the payload is read.
    pub fn parse_callback(&self, fingerprint: &str, payload: &Value) -> Result<CallbackEvent, EfattureError> {
        if fingerprint.trim().is_empty() {
            return Err(EfattureError::InvalidArgument("callback fingerprint is empty".into()));
        }
        let empty = match payload {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        if empty {
            return Err(EfattureError::InvalidArgument("callback payload is empty".into()));
        }

        self.signer
            .verify(&Payload::Structured(payload.clone()), fingerprint)?;
        CallbackEvent::from_payload(payload)
    }
}

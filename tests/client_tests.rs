#![cfg(feature = "client")]

use std::cell::RefCell;

use efatture::client::*;
use efatture::core::*;
use efatture::fatturapa::*;
use efatture::signed::*;
use serde_json::{Value, json};

const CLIENT_ID: &str = "0f4e6a1c-93b2-4d0e-9a57-1c2b3d4e5f60";
const SECRET: &str = "s3cr3t-k3y";
const OK: &str = r#"{"success": true, "data": {"id": 7}}"#;
const TRANSMISSION: &str = "FatturaElettronicaHeader/DatiTrasmissione";

/// Records every request and answers with a canned body.
struct Recorder {
    response: String,
    sent: RefCell<Vec<(String, OutboundRequest)>>,
}

impl Recorder {
    fn answering(response: &str) -> Self {
        Self {
            response: response.to_string(),
            sent: RefCell::new(Vec::new()),
        }
    }

    fn last(&self) -> (String, OutboundRequest) {
        self.sent.borrow().last().cloned().expect("nothing was sent")
    }

    fn count(&self) -> usize {
        self.sent.borrow().len()
    }
}

impl Transport for Recorder {
    fn send(&self, command: &str, request: &OutboundRequest) -> Result<String, EfattureError> {
        self.sent
            .borrow_mut()
            .push((command.to_string(), request.clone()));
        Ok(self.response.clone())
    }
}

fn client_with(config: ClientConfig, response: &str) -> Client<Recorder> {
    Client::new(config, Recorder::answering(response))
}

fn client() -> Client<Recorder> {
    client_with(ClientConfig::new(Credentials::new(CLIENT_ID, SECRET)), OK)
}

fn fingerprint_of(payload: &Value) -> String {
    digest(CLIENT_ID, SECRET, &Payload::Structured(payload.clone())).unwrap()
}

fn valid_invoice() -> InvoiceData {
    let mut invoice = InvoiceData::builder().build().unwrap();
    let entries = [
        (format!("{TRANSMISSION}/CodiceDestinatario"), "ABC123"),
        (
            "FatturaElettronicaHeader/CessionarioCommittente/DatiAnagrafici/CodiceFiscale".to_string(),
            "RSSMRA80A01H501U",
        ),
        (
            "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/Numero".to_string(),
            "2024/15",
        ),
        (
            "FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee/PrezzoUnitario".to_string(),
            "10.00",
        ),
        (
            "FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee/PrezzoTotale".to_string(),
            "10.00",
        ),
        (
            "FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee/AliquotaIVA".to_string(),
            "22.00",
        ),
        (
            "FatturaElettronicaBody/DatiBeniServizi/DatiRiepilogo/AliquotaIVA".to_string(),
            "22.00",
        ),
        (
            "FatturaElettronicaBody/DatiBeniServizi/DatiRiepilogo/ImponibileImporto".to_string(),
            "10.00",
        ),
        (
            "FatturaElettronicaBody/DatiBeniServizi/DatiRiepilogo/Imposta".to_string(),
            "2.20",
        ),
    ];
    for (path, value) in &entries {
        invoice.set(path, value).unwrap();
    }
    invoice
}

fn signed_xades() -> SignedInvoice {
    let mut invoice = valid_invoice();
    let xml = invoice.save_xml(false).unwrap();
    let signature = format!(
        r#"<ds:Signature xmlns:ds="{XMLDSIG_NAMESPACE}"><ds:SignedInfo/><ds:SignatureValue>QUJD</ds:SignatureValue></ds:Signature>"#
    );
    let close = "</p:FatturaElettronica>";
    let signed = xml.replacen(close, &format!("{signature}{close}"), 1);
    SignedInvoice::read(signed.as_bytes(), SigningMethod::XadesBes, &OpensslExtractor::new()).unwrap()
}

struct Fixed(Vec<u8>);

impl CadesExtractor for Fixed {
    fn extract(&self, _signed: &[u8]) -> Result<Vec<u8>, EfattureError> {
        Ok(self.0.clone())
    }
}

// --- Envelope ---

#[test]
fn execute_signs_payload_and_lowercases_command() {
    let client = client();
    let payload = json!({"filters": {"unread": true}, "page": 1});
    let data = client.execute("Invoices", payload.clone()).unwrap();
    assert_eq!(data, json!({"id": 7}));

    let (command, request) = client.transport().last();
    assert_eq!(command, "invoices");
    assert_eq!(request.api_uuid, CLIENT_ID);
    assert_eq!(request.payload, payload);
    assert_eq!(request.fingerprint, fingerprint_of(&payload));
}

#[test]
fn api_errors_surface_code_and_message() {
    let client = client_with(
        ClientConfig::new(Credentials::new(CLIENT_ID, SECRET)),
        r#"{"success": false, "errorCode": "SYS_00004", "errorMessage": "Authentication error"}"#,
    );
    let err = client.execute("users", json!({"kind": "cf"})).unwrap_err();
    assert_eq!(err.code(), Some("SYS_00004"));
    assert!(err.to_string().contains("Authentication error"));

    let client = client_with(ClientConfig::new(Credentials::new(CLIENT_ID, SECRET)), "<html>");
    assert!(matches!(
        client.execute("users", json!({})),
        Err(EfattureError::Protocol(_))
    ));
}

// --- Invoices ---

#[test]
fn send_invoice_fills_transmitter_placeholders() {
    let client = client();
    let mut invoice = valid_invoice();
    client.send_invoice(&mut invoice).unwrap();

    assert_eq!(invoice.id_paese().as_deref(), Some("IT"));
    assert_eq!(invoice.id_codice(), Some("0".repeat(28)));
    assert_eq!(invoice.progressivo_invio(), Some("0".repeat(10)));

    let (command, request) = client.transport().last();
    assert_eq!(command, "invoices");
    let xml = request.payload["invoiceXml"].as_str().unwrap();
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("<CodiceDestinatario>ABC123</CodiceDestinatario>"));
    assert_eq!(request.fingerprint, fingerprint_of(&request.payload));
}

#[test]
fn invalid_invoice_is_not_sent() {
    let client = client();
    let mut invoice = valid_invoice();
    invoice
        .set("FatturaElettronicaBody/DatiBeniServizi/DatiRiepilogo/Imposta", "5.00")
        .unwrap();

    let err = client.send_invoice(&mut invoice).unwrap_err();
    assert_eq!(err.code(), Some(TAX_MISCALCULATED));
    assert_eq!(client.transport().count(), 0);
}

// --- Signed uploads ---

#[test]
fn xades_upload_sends_xml_text() {
    let client = client();
    let mut signed = signed_xades();
    client.upload_signed_invoice(&mut signed).unwrap();

    let (command, request) = client.transport().last();
    assert_eq!(command, "files");
    assert_eq!(request.payload["signingMethod"], "XAdES-BES");
    let sent = request.payload["signedInvoiceXml"].as_str().unwrap();
    assert_eq!(sent.as_bytes(), signed.signed_content());
    assert!(sent.contains("ds:Signature"));
}

#[test]
fn cades_upload_sends_hex() {
    let client = client();
    let mut plain = valid_invoice();
    let xml = plain.save_xml(false).unwrap();
    let envelope = b"\x30\x80\x06\x09envelope".to_vec();
    let mut signed =
        SignedInvoice::read(&envelope, SigningMethod::CadesBes, &Fixed(xml.into_bytes())).unwrap();

    client.upload_signed_invoice(&mut signed).unwrap();
    let (_, request) = client.transport().last();
    assert_eq!(request.payload["signingMethod"], "CAdES-BES");
    assert_eq!(request.payload["signedInvoiceXml"], hex::encode(&envelope));
}

#[test]
fn oversized_upload_is_rejected() {
    let client = client_with(
        ClientConfig::new(Credentials::new(CLIENT_ID, SECRET)).max_signed_size(10),
        OK,
    );
    let mut signed = signed_xades();
    let err = client.upload_signed_invoice(&mut signed).unwrap_err();
    assert_eq!(err.code(), Some(SIZE_EXCEEDED));
    assert_eq!(client.transport().count(), 0);
}

// --- Outcome notifications ---

#[test]
fn send_outcome_uses_placeholder_sdi_id() {
    let client = client();
    let mut notification = OutcomeNotification::new();
    notification
        .set_esito(OutcomeCode::Ec02)
        .unwrap()
        .set_descrizione("Importi errati")
        .unwrap()
        .set_riferimento_fattura("2024/15", 2024, 1)
        .unwrap();

    client.send_outcome(42, &mut notification).unwrap();
    assert_eq!(notification.identificativo_sdi().as_deref(), Some(PLACEHOLDER_SDI_ID));

    let (command, request) = client.transport().last();
    assert_eq!(command, "notifications");
    assert_eq!(request.payload["sdiInvoiceFileId"], "42");
    let xml = request.payload["notificaEsitoXml"].as_str().unwrap();
    assert!(xml.contains("<IdentificativoSdI>111</IdentificativoSdI>"));
    assert!(xml.contains("<Esito>EC02</Esito>"));
}

// --- Users ---

#[test]
fn set_user_normalizes_fields() {
    let client = client();
    client
        .set_user(UserKind::Piva, "it", "  01234567890ABC ", true, false)
        .unwrap();

    let (command, request) = client.transport().last();
    assert_eq!(command, "users");
    assert_eq!(
        request.payload,
        json!({
            "kind": "piva",
            "idPaese": "IT",
            "codice": "01234567890abc",
            "receives": "1",
            "transmits": "0",
        })
    );
}

#[test]
fn set_user_rejects_bad_arguments() {
    let client = client();
    let too_long = "9".repeat(29);
    for (paese, codice) in [("XX", "123"), ("IT", "   "), ("IT", too_long.as_str())] {
        assert!(
            matches!(
                client.set_user(UserKind::Cf, paese, codice, true, true),
                Err(EfattureError::InvalidArgument(_))
            ),
            "{paese}/{codice}"
        );
    }
    assert_eq!(client.transport().count(), 0);
    client
        .set_user(UserKind::Cf, "IT", &"9".repeat(28), false, true)
        .unwrap();
}

// --- Callbacks ---

#[test]
fn callback_with_valid_fingerprint() {
    let client = client();
    let payload = json!({
        "webhookKind": "webhook_ricevi_notifica",
        "sdiInvoiceFileId": 1234,
        "sdiNotificationFileId": "5678",
    });
    let fingerprint = fingerprint_of(&payload).to_uppercase();

    let event = client.parse_callback(&fingerprint, &payload).unwrap();
    assert_eq!(event.webhook_kind, WebhookKind::WebhookRiceviNotifica);
    assert_eq!(event.sdi_invoice_file_id, 1234);
    assert_eq!(event.sdi_notification_file_id, Some(5678));
}

#[test]
fn callback_with_wrong_fingerprint_is_rejected() {
    let client = client();
    let payload = json!({"webhookKind": "webhook_invio_fattura", "sdiInvoiceFileId": 9});
    let forged = digest(CLIENT_ID, "other-secret", &Payload::Structured(payload.clone())).unwrap();
    assert!(matches!(
        client.parse_callback(&forged, &payload),
        Err(EfattureError::Authentication(_))
    ));
}

#[test]
fn callback_requires_fingerprint_and_payload() {
    let client = client();
    let payload = json!({"webhookKind": "webhook_invio_fattura", "sdiInvoiceFileId": 9});
    assert!(matches!(
        client.parse_callback("  ", &payload),
        Err(EfattureError::InvalidArgument(_))
    ));
    for empty in [Value::Null, json!({})] {
        assert!(matches!(
            client.parse_callback("abc", &empty),
            Err(EfattureError::InvalidArgument(_))
        ));
    }
}

// --- Listings ---

#[test]
fn list_sends_default_paging() {
    let client = client();
    client.list("Notifications").get().unwrap();

    let (command, request) = client.transport().last();
    assert_eq!(command, "notifications");
    assert_eq!(
        request.payload,
        json!({"filters": [], "order": [], "page": 1, "per_page": 10, "search": ""})
    );
    assert_eq!(request.fingerprint, fingerprint_of(&request.payload));
}

#[test]
fn list_carries_filters_order_and_search() {
    let client = client();
    let data = client
        .list("invoices")
        .page(3)
        .per_page(50)
        .order_by("created_at", SortDirection::Desc)
        .order_by("id", SortDirection::Asc)
        .filter_by("unread", true)
        .filter_by("kind", "sent")
        .filter_by("unread", false)
        .search("ACME")
        .get()
        .unwrap();
    assert_eq!(data, json!({"id": 7}));

    let (_, request) = client.transport().last();
    assert_eq!(
        request.payload,
        json!({
            "filters": {
                "unread": {"name": "unread", "value": false},
                "kind": {"name": "kind", "value": "sent"},
            },
            "order": [
                {"column": "created_at", "dir": "desc"},
                {"column": "id", "dir": "asc"},
            ],
            "page": 3,
            "per_page": 50,
            "search": "ACME",
        })
    );
    let fields = request.form_fields();
    assert!(fields.contains(&("payload[order][0][dir]".to_string(), "desc".to_string())));
    assert!(fields.contains(&("payload[filters][unread][value]".to_string(), "0".to_string())));
}

#[test]
fn list_params_override_defaults() {
    let client = client();
    let listing = client.list("invoices").page(2).param("page", 9).param("year", 2024);
    assert_eq!(listing.payload()["page"], 9);
    assert_eq!(listing.payload()["year"], 2024);
    assert_eq!(client.transport().count(), 0);
}

// --- Bulk requests ---

#[test]
fn invoices_bulk_request_envelope() {
    use base64::Engine;

    let day = |d| chrono::NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
    let at = day(31).and_hms_opt(23, 59, 0).unwrap();
    let request = InvoicesBulkRequest::new()
        .partita_iva("01234567890")
        .flusso("SDI")
        .issued(day(1), day(31))
        .at_disposal(day(1), day(15));

    let xml = request.to_xml(at).unwrap();
    let root = xml_utils::read_document(&xml).unwrap();
    assert_eq!(root.local_name(), "FileRichiesta");
    assert_eq!(root.namespace(), Some(RICHIESTA_NAMESPACE));

    let doc = XmlDocument::new(root);
    assert_eq!(doc.get("TipoRichiesta").unwrap().as_deref(), Some("FATT"));
    assert_eq!(doc.get("NomeFile").unwrap().as_deref(), Some("FATT_01234567890_20240131235900.xml.p7m"));

    let encoded = doc.get("File").unwrap().unwrap();
    let decoded = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
    let inner = XmlDocument::new(xml_utils::read_document(std::str::from_utf8(&decoded).unwrap()).unwrap());
    assert_eq!(inner.root().namespace(), Some(INPUT_MASSIVO_NAMESPACE));
    assert_eq!(inner.get("TipoRichiesta/Fatture/ElencoPiva/Piva").unwrap().as_deref(), Some("01234567890"));
    assert_eq!(inner.get("TipoRichiesta/Fatture/FattureEmesse/Flusso/Tutte").unwrap().as_deref(), Some("SDI"));
    assert_eq!(
        inner
            .get("TipoRichiesta/Fatture/FattureFEDisposizione/DataEmissione/A")
            .unwrap()
            .as_deref(),
        Some("2024-01-15")
    );
    assert!(!inner.has("TipoRichiesta/Fatture/FattureRicevute").unwrap());
}

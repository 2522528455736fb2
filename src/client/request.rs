use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::api::Client;
use crate::core::xml_utils::write_document;
use crate::core::{EfattureError, Element};
use crate::fatturapa::XSI_NAMESPACE;

/// Delivers a request to the service and returns the raw response body.
///
/// `command` is the lower-case endpoint name (`invoices`, `files`,
/// `notifications`, `users`). Implementations should return the body even
/// for non-2xx statuses: error details travel in it.
pub trait Transport {
    fn send(&self, command: &str, request: &OutboundRequest) -> Result<String, EfattureError>;
}

/// A signed request, ready for the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundRequest {
    pub api_uuid: String,
    pub fingerprint: String,
    pub payload: Value,
}

impl OutboundRequest {
    /// `application/x-www-form-urlencoded` fields: `apiUuid`, `fingerprint`
    /// and the payload flattened into bracketed keys (`payload[invoiceXml]`,
    /// `payload[filters][0]`). Booleans become `1`/`0`; nulls are skipped.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("apiUuid".to_string(), self.api_uuid.clone()),
            ("fingerprint".to_string(), self.fingerprint.clone()),
        ];
        flatten("payload", &self.payload, &mut fields);
        fields
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((prefix.to_string(), if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((prefix.to_string(), n.to_string())),
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten(&format!("{prefix}[{i}]"), item, out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                flatten(&format!("{prefix}[{k}]"), v, out);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Paged listings
// ---------------------------------------------------------------------------

/// Sort direction of an [`ListRequest::order_by`] column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A paged, filtered, searchable listing, sent with [`get`](Self::get).
///
/// The payload carries `page` (default 1), `per_page` (default 10), `order`,
/// `filters` and `search`. Keys added with [`param`](Self::param) override
/// those of the same name.
#[derive(Debug)]
pub struct ListRequest<'c, T> {
    client: &'c Client<T>,
    command: String,
    page: u32,
    per_page: u32,
    order: Vec<(String, SortDirection)>,
    filters: Vec<(String, Value)>,
    search: String,
    params: Map<String, Value>,
}

impl<'c, T: Transport> ListRequest<'c, T> {
    pub(crate) fn new(client: &'c Client<T>, command: &str) -> Self {
        Self {
            client,
            command: command.to_string(),
            page: 1,
            per_page: 10,
            order: Vec::new(),
            filters: Vec::new(),
            search: String::new(),
            params: Map::new(),
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Add a sort column; columns apply in the order they are added.
    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order.push((column.to_string(), direction));
        self
    }

    /// Filter on `name`. A second filter with the same name replaces the first.
    pub fn filter_by(mut self, name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.filters.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.filters.push((name.to_string(), value)),
        }
        self
    }

    pub fn search(mut self, text: &str) -> Self {
        self.search = text.to_string();
        self
    }

    /// Extra payload key.
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// The payload [`get`](Self::get) sends.
    pub fn payload(&self) -> Value {
        // No filters travel as an empty list, like an empty associative array.
        let filters = if self.filters.is_empty() {
            Value::Array(Vec::new())
        } else {
            Value::Object(
                self.filters
                    .iter()
                    .map(|(name, value)| {
                        (name.clone(), serde_json::json!({"name": name, "value": value}))
                    })
                    .collect(),
            )
        };
        let order = self
            .order
            .iter()
            .map(|(column, dir)| serde_json::json!({"column": column, "dir": dir.as_str()}))
            .collect();

        let mut payload = Map::new();
        payload.insert("filters".into(), filters);
        payload.insert("order".into(), Value::Array(order));
        payload.insert("page".into(), self.page.into());
        payload.insert("per_page".into(), self.per_page.into());
        payload.insert("search".into(), Value::String(self.search.clone()));
        for (key, value) in &self.params {
            payload.insert(key.clone(), value.clone());
        }
        Value::Object(payload)
    }

    /// Send the listing and unwrap the response data.
    pub fn get(self) -> Result<Value, EfattureError> {
        debug!(command = %self.command, page = self.page, per_page = self.per_page, "listing");
        self.client.execute(&self.command, self.payload())
    }
}

// ---------------------------------------------------------------------------
// Bulk download requests
// ---------------------------------------------------------------------------

/// Namespace of the `FileRichiesta` envelope.
pub const RICHIESTA_NAMESPACE: &str =
    "http://ivaservizi.agenziaentrate.gov.it/docs/xsd/ServiziMassivi/input/RichiestaServiziMassivi/v1.0";
/// Namespace of the `InputMassivo` document inside the envelope.
pub const INPUT_MASSIVO_NAMESPACE: &str = "http://www.sogei.it/InputPubblico";

/// A bulk download request for the Agenzia delle Entrate "servizi massivi".
///
/// Implementors describe the `InputMassivo` document; the provided methods
/// wrap it, base64-encoded, in a `FileRichiesta` envelope and name the file
/// `<KIND>_<PIVA>_<yyyymmddhhmmss>.xml.p7m`.
pub trait BulkRequest {
    /// `FATT` or `CORR`.
    fn kind(&self) -> &'static str;

    /// Upper-cased VAT number the request is about.
    fn piva(&self) -> Option<&str>;

    /// Caller data that travels beside the request.
    fn extra(&self) -> &Map<String, Value>;

    /// Contents of `TipoRichiesta` in the inner document.
    fn request_body(&self) -> Result<Element, EfattureError>;

    fn file_name(&self, at: NaiveDateTime) -> Result<String, EfattureError> {
        let piva = self
            .piva()
            .ok_or_else(|| EfattureError::InvalidArgument("empty 'ElencoPiva/Piva' field".into()))?;
        Ok(format!("{}_{piva}_{}.xml.p7m", self.kind(), at.format("%Y%m%d%H%M%S")))
    }

    /// The `InputMassivo` document.
    fn input_xml(&self) -> Result<String, EfattureError> {
        let root = Element::new("ns1:InputMassivo")
            .with_namespace(INPUT_MASSIVO_NAMESPACE)
            .with_attribute("xsi:schemaLocation", format!("{INPUT_MASSIVO_NAMESPACE} untitled.xsd"))
            .with_attribute("xmlns:ns1", INPUT_MASSIVO_NAMESPACE)
            .with_attribute("xmlns:xsi", XSI_NAMESPACE);
        write_document(&node(root, vec![ns1("TipoRichiesta", vec![self.request_body()?])]), true)
    }

    /// The complete `FileRichiesta` envelope, named for `at`.
    fn to_xml(&self, at: NaiveDateTime) -> Result<String, EfattureError> {
        let file_name = self.file_name(at)?;
        let file = STANDARD.encode(self.input_xml()?);
        let root = Element::new("ns1:FileRichiesta")
            .with_namespace(RICHIESTA_NAMESPACE)
            .with_attribute("xmlns:ns1", RICHIESTA_NAMESPACE)
            .with_attribute("xmlns:xsi", XSI_NAMESPACE)
            .with_attribute(
                "xsi:schemaLocation",
                format!("{RICHIESTA_NAMESPACE} RichiestaServiziMassivi_v1.0.xsd"),
            )
            .with_attribute("versione", "1.0");
        let envelope = node(
            root,
            vec![
                leaf("TipoRichiesta", self.kind()),
                leaf("NomeFile", &file_name),
                leaf("File", &file),
            ],
        );
        debug!(kind = self.kind(), file = %file_name, "built bulk request");
        write_document(&envelope, true)
    }
}

fn leaf(name: &str, text: &str) -> Element {
    let mut e = Element::new(name);
    e.set_text(text);
    e
}

fn node(mut parent: Element, children: Vec<Element>) -> Element {
    for child in children {
        parent.push_child(child);
    }
    parent
}

fn ns1(name: &str, children: Vec<Element>) -> Element {
    node(Element::new(format!("ns1:{name}")), children)
}

fn ns1_leaf(name: &str, text: &str) -> Element {
    leaf(&format!("ns1:{name}"), text)
}

fn period(name: &str, (from, to): (NaiveDate, NaiveDate)) -> Element {
    ns1(
        name,
        vec![
            ns1_leaf("Da", &from.format("%Y-%m-%d").to_string()),
            ns1_leaf("A", &to.format("%Y-%m-%d").to_string()),
        ],
    )
}

fn normalized_piva(piva: &str) -> Option<String> {
    let piva = piva.trim();
    (!piva.is_empty()).then(|| piva.to_uppercase())
}

/// Which date bounds a search over received invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceivedInvoicesBy {
    /// `DataEmissione`
    IssueDate,
    /// `DataRicezione`
    ReceiptDate,
}

/// Bulk download of invoices (`FATT`).
///
/// Each search section is included only when its period is set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InvoicesBulkRequest {
    piva: Option<String>,
    punctual: bool,
    flusso: Option<String>,
    issued: Option<(NaiveDate, NaiveDate)>,
    at_disposal: Option<(NaiveDate, NaiveDate)>,
    received: Option<(ReceivedInvoicesBy, NaiveDate, NaiveDate)>,
    extra: Map<String, Value>,
}

impl InvoicesBulkRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partita_iva(mut self, piva: &str) -> Self {
        self.piva = normalized_piva(piva);
        self
    }

    /// `TipoRicerca` `PUNTUALE`.
    pub fn punctual_search(mut self) -> Self {
        self.punctual = true;
        self
    }

    /// `TipoRicerca` `COMPLETA`, the default.
    pub fn complete_search(mut self) -> Self {
        self.punctual = false;
        self
    }

    /// `Flusso/Tutte` value; `ALL` unless set.
    pub fn flusso(mut self, flusso: &str) -> Self {
        self.flusso = Some(flusso.to_string());
        self
    }

    /// Invoices issued (`FattureEmesse`) between `from` and `to`.
    pub fn issued(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.issued = Some((from, to));
        self
    }

    /// Invoices at the recipient's disposal (`FattureFEDisposizione`).
    pub fn at_disposal(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.at_disposal = Some((from, to));
        self
    }

    /// Invoices received (`FattureRicevute`), bounded by issue or receipt
    /// date. The two bounds are exclusive; the last call wins.
    pub fn received(mut self, by: ReceivedInvoicesBy, from: NaiveDate, to: NaiveDate) -> Self {
        self.received = Some((by, from, to));
        self
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    fn flusso_value(&self) -> &str {
        self.flusso.as_deref().unwrap_or("ALL")
    }
}

impl BulkRequest for InvoicesBulkRequest {
    fn kind(&self) -> &'static str {
        "FATT"
    }

    fn piva(&self) -> Option<&str> {
        self.piva.as_deref()
    }

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn request_body(&self) -> Result<Element, EfattureError> {
        let piva = self
            .piva
            .as_deref()
            .ok_or_else(|| EfattureError::InvalidArgument("empty 'ElencoPiva/Piva' field".into()))?;
        let flusso = || ns1("Flusso", vec![ns1_leaf("Tutte", self.flusso_value())]);

        let mut items = vec![
            ns1_leaf("Richiesta", "FATT"),
            ns1("ElencoPiva", vec![ns1_leaf("Piva", piva)]),
            ns1_leaf("TipoRicerca", if self.punctual { "PUNTUALE" } else { "COMPLETA" }),
        ];
        if let Some(issued) = self.issued {
            items.push(ns1(
                "FattureEmesse",
                vec![period("DataEmissione", issued), flusso(), ns1_leaf("Ruolo", "CEDENTE")],
            ));
        }
        if let Some(at_disposal) = self.at_disposal {
            items.push(ns1(
                "FattureFEDisposizione",
                vec![period("DataEmissione", at_disposal), ns1_leaf("Ruolo", "CESSIONARIO")],
            ));
        }
        if let Some((by, from, to)) = self.received {
            let bound = match by {
                ReceivedInvoicesBy::IssueDate => "DataEmissione",
                ReceivedInvoicesBy::ReceiptDate => "DataRicezione",
            };
            items.push(ns1(
                "FattureRicevute",
                vec![period(bound, (from, to)), flusso(), ns1_leaf("Ruolo", "CESSIONARIO")],
            ));
        }
        Ok(ns1("Fatture", items))
    }
}

/// `TipoCorrispettivo` of a receipts request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ReceiptSource {
    /// Registratori telematici.
    #[default]
    #[serde(rename = "RT")]
    Rt,
    /// Multicassa.
    #[serde(rename = "MC")]
    Mc,
    /// Distributori automatici.
    #[serde(rename = "DA")]
    Da,
    /// Dati contabili.
    #[serde(rename = "DC")]
    Dc,
    /// Registratore di cassa.
    #[serde(rename = "RC")]
    Rc,
}

impl ReceiptSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rt => "RT",
            Self::Mc => "MC",
            Self::Da => "DA",
            Self::Dc => "DC",
            Self::Rc => "RC",
        }
    }
}

/// Bulk download of daily receipts (`CORR`). The survey period is required.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReceiptsBulkRequest {
    piva: Option<String>,
    source: ReceiptSource,
    surveyed: Option<(NaiveDate, NaiveDate)>,
    extra: Map<String, Value>,
}

impl ReceiptsBulkRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partita_iva(mut self, piva: &str) -> Self {
        self.piva = normalized_piva(piva);
        self
    }

    pub fn source(mut self, source: ReceiptSource) -> Self {
        self.source = source;
        self
    }

    /// `DataRilevazione` between `from` and `to`.
    pub fn surveyed(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.surveyed = Some((from, to));
        self
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }
}

impl BulkRequest for ReceiptsBulkRequest {
    fn kind(&self) -> &'static str {
        "CORR"
    }

    fn piva(&self) -> Option<&str> {
        self.piva.as_deref()
    }

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn request_body(&self) -> Result<Element, EfattureError> {
        let piva = self
            .piva
            .as_deref()
            .ok_or_else(|| EfattureError::InvalidArgument("empty 'ElencoPiva/Piva' field".into()))?;
        let surveyed = self
            .surveyed
            .ok_or_else(|| EfattureError::InvalidArgument("empty 'DataRilevazione' period".into()))?;
        Ok(ns1(
            "Corrispettivi",
            vec![
                ns1_leaf("Richiesta", "CORR"),
                period("DataRilevazione", surveyed),
                ns1("ElencoPiva", vec![ns1_leaf("Piva", piva)]),
                ns1_leaf("TipoCorrispettivo", self.source.as_str()),
            ],
        ))
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Unwrap a service response: `data` on success, otherwise
/// [`EfattureError::Api`] with the reported code and message. A body that
/// does not follow that shape is a [`EfattureError::Protocol`] error.
pub fn parse_response(body: &str) -> Result<Value, EfattureError> {
    let mut json: Value = serde_json::from_str(body)
        .map_err(|e| EfattureError::Protocol(format!("unable to parse response: {e}")))?;

    let success = json
        .get("success")
        .filter(|v| !v.is_null())
        .ok_or_else(|| EfattureError::Protocol("missing 'success' attribute".into()))?;

    if truthy(success) {
        return match json.get_mut("data").map(Value::take) {
            Some(Value::Null) | None => {
                Err(EfattureError::Protocol("missing 'data' attribute".into()))
            }
            Some(data) => Ok(data),
        };
    }

    let code = json
        .get("errorCode")
        .and_then(scalar)
        .ok_or_else(|| EfattureError::Protocol("missing 'errorCode' attribute".into()))?;
    let message = json
        .get("errorMessage")
        .and_then(scalar)
        .ok_or_else(|| EfattureError::Protocol("missing 'errorMessage' attribute".into()))?;
    Err(EfattureError::Api { code, message })
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
        Value::Null => false,
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_returns_data() {
        let data = parse_response(r#"{"success": true, "data": {"sdiInvoiceFileId": 42}}"#).unwrap();
        assert_eq!(data, json!({"sdiInvoiceFileId": 42}));
    }

    #[test]
    fn failure_is_api_error() {
        let err = parse_response(
            r#"{"success": false, "errorCode": "SYS_00004", "errorMessage": "Authentication error"}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EfattureError::Api { ref code, ref message }
                if code == "SYS_00004" && message == "Authentication error"
        ));
    }

    #[test]
    fn malformed_responses_are_protocol_errors() {
        for body in [
            "not json",
            r#"{"data": {}}"#,
            r#"{"success": true}"#,
            r#"{"success": 0, "errorMessage": "x"}"#,
            r#"{"success": false, "errorCode": 5}"#,
        ] {
            assert!(
                matches!(parse_response(body), Err(EfattureError::Protocol(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn form_fields_flatten_payload() {
        let request = OutboundRequest {
            api_uuid: "uuid".into(),
            fingerprint: "f".into(),
            payload: json!({"invoiceXml": "<x/>", "receives": true, "order": [{"dir": "asc"}], "none": null}),
        };
        let fields = request.form_fields();
        assert_eq!(fields[0], ("apiUuid".to_string(), "uuid".to_string()));
        assert!(fields.contains(&("payload[invoiceXml]".to_string(), "<x/>".to_string())));
        assert!(fields.contains(&("payload[receives]".to_string(), "1".to_string())));
        assert!(fields.contains(&("payload[order][0][dir]".to_string(), "asc".to_string())));
        assert!(!fields.iter().any(|(k, _)| k == "payload[none]"));
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at() -> NaiveDateTime {
        date(2024, 3, 5).and_hms_opt(14, 7, 9).unwrap()
    }

    #[test]
    fn bulk_file_names_carry_kind_piva_and_time() {
        let fatt = InvoicesBulkRequest::new().partita_iva(" it01234567890 ");
        assert_eq!(fatt.piva(), Some("IT01234567890"));
        assert_eq!(
            fatt.file_name(at()).unwrap(),
            "FATT_IT01234567890_20240305140709.xml.p7m"
        );
        let corr = ReceiptsBulkRequest::new().partita_iva("01234567890");
        assert_eq!(
            corr.file_name(at()).unwrap(),
            "CORR_01234567890_20240305140709.xml.p7m"
        );
    }

    #[test]
    fn bulk_request_without_piva_is_rejected() {
        let request = InvoicesBulkRequest::new().partita_iva("   ");
        assert!(matches!(
            request.file_name(at()),
            Err(EfattureError::InvalidArgument(_))
        ));
        assert!(matches!(request.to_xml(at()), Err(EfattureError::InvalidArgument(_))));
    }

    #[test]
    fn invoices_request_lists_only_requested_sections() {
        let xml = InvoicesBulkRequest::new()
            .partita_iva("01234567890")
            .issued(date(2024, 1, 1), date(2024, 1, 31))
            .input_xml()
            .unwrap();
        assert!(xml.contains("<ns1:Richiesta>FATT</ns1:Richiesta>"));
        assert!(xml.contains("<ns1:TipoRicerca>COMPLETA</ns1:TipoRicerca>"));
        assert!(xml.contains("<ns1:Da>2024-01-01</ns1:Da>"));
        assert!(xml.contains("<ns1:Tutte>ALL</ns1:Tutte>"));
        assert!(xml.contains("<ns1:Ruolo>CEDENTE</ns1:Ruolo>"));
        assert!(!xml.contains("FattureRicevute"));
        assert!(!xml.contains("FattureFEDisposizione"));
    }

    #[test]
    fn received_invoices_use_one_date_bound() {
        let xml = InvoicesBulkRequest::new()
            .partita_iva("01234567890")
            .punctual_search()
            .received(ReceivedInvoicesBy::IssueDate, date(2024, 1, 1), date(2024, 1, 31))
            .received(ReceivedInvoicesBy::ReceiptDate, date(2024, 2, 1), date(2024, 2, 29))
            .input_xml()
            .unwrap();
        assert!(xml.contains("<ns1:TipoRicerca>PUNTUALE</ns1:TipoRicerca>"));
        assert!(xml.contains("<ns1:DataRicezione>"));
        assert!(!xml.contains("<ns1:DataEmissione>"));
        assert!(xml.contains("<ns1:Ruolo>CESSIONARIO</ns1:Ruolo>"));
    }

    #[test]
    fn receipts_request_needs_a_survey_period() {
        let request = ReceiptsBulkRequest::new()
            .partita_iva("01234567890")
            .source(ReceiptSource::Da);
        assert!(matches!(request.input_xml(), Err(EfattureError::InvalidArgument(_))));

        let xml = request
            .surveyed(date(2024, 1, 1), date(2024, 1, 31))
            .input_xml()
            .unwrap();
        assert!(xml.contains("<ns1:Richiesta>CORR</ns1:Richiesta>"));
        assert!(xml.contains("<ns1:TipoCorrispettivo>DA</ns1:TipoCorrispettivo>"));
        assert!(xml.contains("<ns1:A>2024-01-31</ns1:A>"));
    }

    #[test]
    fn envelope_embeds_inner_document_as_base64() {
        let request = ReceiptsBulkRequest::new()
            .partita_iva("01234567890")
            .surveyed(date(2024, 1, 1), date(2024, 1, 31));
        let xml = request.to_xml(at()).unwrap();
        assert!(xml.contains("<TipoRichiesta>CORR</TipoRichiesta>"));
        assert!(xml.contains("<NomeFile>CORR_01234567890_20240305140709.xml.p7m</NomeFile>"));
        assert!(xml.contains(r#"versione="1.0""#));

        let start = xml.find("<File>").unwrap() + "<File>".len();
        let end = xml.find("</File>").unwrap();
        let inner = STANDARD.decode(&xml[start..end]).unwrap();
        assert_eq!(String::from_utf8(inner).unwrap(), request.input_xml().unwrap());
    }
}

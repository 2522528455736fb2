use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::{BusinessRuleValidator, DateSanityValidator, InvoiceFamily, TransmissionFormat};
use crate::core::{
    DocumentValidator, EfattureError, Element, OrderingOutcome, SchemaValidator, StructuralSchema,
    ValidationReport, ValidatorChain, XmlDocument, parse_path,
};

const TRANSMISSION: &str = "FatturaElettronicaHeader/DatiTrasmissione";
const FORMAT_PATH: [&str; 3] = [
    "FatturaElettronicaHeader",
    "DatiTrasmissione",
    "FormatoTrasmissione",
];

/// VAT number and tax code of a party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiscalIdentity {
    pub id_paese: Option<String>,
    pub id_codice: Option<String>,
    pub codice_fiscale: Option<String>,
}

/// A FatturaPA invoice, ordinary or simplified.
///
/// The family is fixed by the root element at construction. The transmission
/// format lives in two places, the root `versione` attribute and
/// `DatiTrasmissione/FormatoTrasmissione`; every write path through this type
/// keeps them equal.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceData {
    doc: XmlDocument,
    family: InvoiceFamily,
}

/// Configures the validators attached to an [`InvoiceData`].
///
/// Ordinary invoices always get the [`BusinessRuleValidator`], which also
/// runs the schema check when a schema is given; simplified invoices are
/// checked against the schema only. [`today`](Self::today) adds the
/// [`DateSanityValidator`] to ordinary invoices.
#[derive(Default)]
pub struct InvoiceDataBuilder {
    format: Option<TransmissionFormat>,
    schema: Option<Arc<StructuralSchema>>,
    today: Option<NaiveDate>,
    extra: Vec<Arc<dyn DocumentValidator>>,
}

impl fmt::Debug for InvoiceDataBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvoiceDataBuilder")
            .field("format", &self.format)
            .field("schema", &self.schema.is_some())
            .field("today", &self.today)
            .field("extra", &self.extra.iter().map(|v| v.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl InvoiceDataBuilder {
    /// Format of a new invoice; defaults to FPR12. When parsing, the
    /// document's family must match it.
    pub fn format(mut self, format: TransmissionFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn schema(mut self, schema: Arc<StructuralSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Run `validator` after the built-in ones.
    pub fn validator(mut self, validator: impl DocumentValidator + 'static) -> Self {
        self.extra.push(Arc::new(validator));
        self
    }

    /// An empty invoice of the configured format.
    pub fn build(self) -> Result<InvoiceData, EfattureError> {
        let format = self.format.unwrap_or(TransmissionFormat::Fpr12);
        let family = format.family();
        let root = Element::new(family.qualified_root())
            .with_namespace(family.namespace())
            .with_attribute("xmlns:p", family.namespace());
        let doc = XmlDocument::new(root).with_validators(self.chain(family));

        let mut invoice = InvoiceData { doc, family };
        invoice.set_format(format)?;
        Ok(invoice)
    }

    pub fn parse(self, xml: &str) -> Result<InvoiceData, EfattureError> {
        self.finish(XmlDocument::parse(xml)?)
    }

    /// Like [`parse`](Self::parse), for raw file content.
    pub fn parse_bytes(self, bytes: &[u8]) -> Result<InvoiceData, EfattureError> {
        self.finish(XmlDocument::from_bytes(bytes)?)
    }

    fn finish(self, doc: XmlDocument) -> Result<InvoiceData, EfattureError> {
        let root = doc.root();
        let family = InvoiceFamily::from_root(root.local_name(), root.namespace()).ok_or_else(
            || {
                EfattureError::InvalidArgument(format!(
                    "<{}> ({}) is not a FatturaPA invoice root",
                    root.name(),
                    root.namespace().unwrap_or("no namespace")
                ))
            },
        )?;
        if let Some(format) = self.format.filter(|f| f.family() != family) {
            return Err(EfattureError::InvalidArgument(format!(
                "expected a {format} invoice, found <{}>",
                root.name()
            )));
        }
        let doc = doc.with_validators(self.chain(family));
        Ok(InvoiceData { doc, family })
    }

    fn chain(&self, family: InvoiceFamily) -> ValidatorChain {
        let mut chain = ValidatorChain::builder();
        match family {
            InvoiceFamily::Ordinary => {
                let mut rules = BusinessRuleValidator::new();
                if let Some(schema) = &self.schema {
                    rules = rules.with_schema(Arc::clone(schema));
                }
                chain = chain.with(rules);
                if let Some(today) = self.today {
                    chain = chain.with(DateSanityValidator::new(today));
                }
            }
            InvoiceFamily::Simplified => {
                if let Some(schema) = &self.schema {
                    chain = chain.with(SchemaValidator::new(Arc::clone(schema)));
                }
            }
        }
        for validator in &self.extra {
            chain = chain.with_shared(Arc::clone(validator));
        }
        chain.build()
    }
}

impl InvoiceData {
    pub fn builder() -> InvoiceDataBuilder {
        InvoiceDataBuilder::default()
    }

    /// Parse an invoice with the default validators.
    pub fn parse(xml: &str) -> Result<Self, EfattureError> {
        Self::builder().parse(xml)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EfattureError> {
        Self::builder().parse_bytes(bytes)
    }

    pub fn family(&self) -> InvoiceFamily {
        self.family
    }

    pub fn document(&self) -> &XmlDocument {
        &self.doc
    }

    pub fn into_document(self) -> XmlDocument {
        self.doc
    }

    // Paths below are constants, so resolution cannot fail.
    fn field(&self, path: &str) -> Option<String> {
        self.doc.get(path).ok().flatten()
    }

    // ---- format ----------------------------------------------------------

    /// Set the transmission format in both the root attribute and the header.
    pub fn set_format(&mut self, format: TransmissionFormat) -> Result<&mut Self, EfattureError> {
        if format.family() != self.family {
            return Err(EfattureError::InvalidArgument(format!(
                "format {format} cannot be used on <{}>",
                self.doc.root().name()
            )));
        }
        let root = self.doc.root_tag().to_string();
        self.doc.set_attribute(&root, "versione", format.as_str())?;
        self.doc.set(&FORMAT_PATH.join("/"), format.as_str())?;
        debug!(format = %format, "set transmission format");
        Ok(self)
    }

    /// String form of [`set_format`](Self::set_format); case-insensitive.
    pub fn set_formato_trasmissione(&mut self, format: &str) -> Result<&mut Self, EfattureError> {
        self.set_format(format.parse()?)
    }

    /// The header's format, if present and known.
    pub fn format(&self) -> Option<TransmissionFormat> {
        self.formato_trasmissione()?.parse().ok()
    }

    /// Raw `FormatoTrasmissione`, upper-cased.
    pub fn formato_trasmissione(&self) -> Option<String> {
        self.field(&FORMAT_PATH.join("/"))
            .map(|f| f.to_ascii_uppercase())
    }

    /// The root `versione` attribute.
    pub fn versione(&self) -> Option<String> {
        self.doc.root().attribute("versione").map(str::to_string)
    }

    // ---- document access -------------------------------------------------

    pub fn get(&self, path: &str) -> Result<Option<String>, EfattureError> {
        self.doc.get(path)
    }

    pub fn has(&self, path: &str) -> Result<bool, EfattureError> {
        self.doc.has(path)
    }

    pub fn count(&self, path: &str) -> Result<usize, EfattureError> {
        self.doc.count(path)
    }

    /// Write `value` at `path`. `FormatoTrasmissione` goes through
    /// [`set_formato_trasmissione`](Self::set_formato_trasmissione).
    pub fn set(&mut self, path: &str, value: impl AsRef<str>) -> Result<&mut Self, EfattureError> {
        if self.is_format_path(path)? {
            return self.set_formato_trasmissione(value.as_ref());
        }
        self.doc.set(path, value)?;
        Ok(self)
    }

    pub fn attribute(&self, path: &str, name: &str) -> Result<Option<String>, EfattureError> {
        self.doc.attribute(path, name)
    }

    /// Set an attribute. The root `versione` goes through
    /// [`set_formato_trasmissione`](Self::set_formato_trasmissione).
    pub fn set_attribute(
        &mut self,
        path: &str,
        name: &str,
        value: impl AsRef<str>,
    ) -> Result<&mut Self, EfattureError> {
        if name == "versione" && parse_path(path, self.doc.root_tag())?.is_empty() {
            return self.set_formato_trasmissione(value.as_ref());
        }
        self.doc.set_attribute(path, name, value)?;
        Ok(self)
    }

    /// Remove the element at `path`. The format leaf and its ancestors
    /// cannot be removed.
    pub fn remove(&mut self, path: &str) -> Result<bool, EfattureError> {
        let segments = parse_path(path, self.doc.root_tag())?;
        let guards_format = !segments.is_empty()
            && segments.len() <= FORMAT_PATH.len()
            && segments
                .iter()
                .zip(FORMAT_PATH)
                .all(|(s, tag)| s.tag == tag && s.index == 1);
        if guards_format {
            return Err(EfattureError::InvalidArgument(format!(
                "'{path}' holds FormatoTrasmissione and cannot be removed"
            )));
        }
        self.doc.remove(path)
    }

    fn is_format_path(&self, path: &str) -> Result<bool, EfattureError> {
        let segments = parse_path(path, self.doc.root_tag())?;
        Ok(segments.len() == FORMAT_PATH.len()
            && segments
                .iter()
                .zip(FORMAT_PATH)
                .all(|(s, tag)| s.tag == tag && s.index == 1))
    }

    pub fn children_paths(&self, path: &str) -> Result<Vec<String>, EfattureError> {
        self.doc.children_paths(path)
    }

    pub fn to_array(&self) -> Vec<(String, String)> {
        self.doc.to_array()
    }

    // ---- header accessors ------------------------------------------------

    pub fn id_paese(&self) -> Option<String> {
        self.field(&format!("{TRANSMISSION}/IdTrasmittente/IdPaese"))
    }

    pub fn id_codice(&self) -> Option<String> {
        self.field(&format!("{TRANSMISSION}/IdTrasmittente/IdCodice"))
    }

    /// `IdPaese` followed by `IdCodice`, when both are present.
    pub fn trasmittente(&self) -> Option<String> {
        Some(self.id_paese()? + &self.id_codice()?)
    }

    pub fn progressivo_invio(&self) -> Option<String> {
        self.field(&format!("{TRANSMISSION}/ProgressivoInvio"))
    }

    pub fn codice_destinatario(&self) -> Option<String> {
        self.field(&format!("{TRANSMISSION}/CodiceDestinatario"))
    }

    pub fn pec_destinatario(&self) -> Option<String> {
        self.field(&format!("{TRANSMISSION}/PECDestinatario"))
    }

    /// Seller identity. Simplified invoices keep it directly under
    /// `CedentePrestatore`.
    pub fn cedente_prestatore(&self) -> FiscalIdentity {
        let base = match self.family {
            InvoiceFamily::Ordinary => "FatturaElettronicaHeader/CedentePrestatore/DatiAnagrafici",
            InvoiceFamily::Simplified => "FatturaElettronicaHeader/CedentePrestatore",
        };
        self.identity(base)
    }

    /// Buyer identity. Simplified invoices keep it under
    /// `IdentificativiFiscali`.
    pub fn cessionario_committente(&self) -> FiscalIdentity {
        let base = match self.family {
            InvoiceFamily::Ordinary => {
                "FatturaElettronicaHeader/CessionarioCommittente/DatiAnagrafici"
            }
            InvoiceFamily::Simplified => {
                "FatturaElettronicaHeader/CessionarioCommittente/IdentificativiFiscali"
            }
        };
        self.identity(base)
    }

    fn identity(&self, base: &str) -> FiscalIdentity {
        FiscalIdentity {
            id_paese: self.field(&format!("{base}/IdFiscaleIVA/IdPaese")),
            id_codice: self.field(&format!("{base}/IdFiscaleIVA/IdCodice")),
            codice_fiscale: self.field(&format!("{base}/CodiceFiscale")),
        }
    }

    /// Number of `FatturaElettronicaBody` blocks (one per invoice in a batch).
    pub fn body_count(&self) -> usize {
        self.doc.count("FatturaElettronicaBody").unwrap_or(0)
    }

    /// SdI file name stem: upper-cased `IdPaese` + `IdCodice`, then `suffix`.
    pub fn generate_file_name(&self, suffix: &str) -> Result<String, EfattureError> {
        let id_paese = self.id_paese().ok_or_else(|| {
            EfattureError::InvalidArgument("empty 'DatiTrasmissione/IdTrasmittente/IdPaese' field".into())
        })?;
        let id_codice = self.id_codice().ok_or_else(|| {
            EfattureError::InvalidArgument("empty 'DatiTrasmissione/IdTrasmittente/IdCodice' field".into())
        })?;
        Ok(format!("{}{suffix}", (id_paese + &id_codice).to_uppercase()))
    }

    // ---- lifecycle -------------------------------------------------------

    /// Put every element in schema order and drop empty ones. Leaves the
    /// family's map does not know are dropped and reported.
    pub fn normalize(&mut self) -> Result<OrderingOutcome, EfattureError> {
        let outcome = self.family.ordering_map().order_tags(&mut self.doc)?;
        self.doc.normalize();
        Ok(outcome)
    }

    /// See [`XmlDocument::fingerprint`].
    pub fn fingerprint(&mut self) -> Result<String, EfattureError> {
        self.doc.fingerprint()
    }

    /// Serialize as is.
    pub fn to_xml_string(&self, pretty: bool) -> Result<String, EfattureError> {
        self.doc.to_xml_string(pretty)
    }

    /// Normalize, then serialize.
    pub fn save_xml(&mut self, pretty: bool) -> Result<String, EfattureError> {
        self.normalize()?;
        self.doc.to_xml_string(pretty)
    }

    pub fn errors(&self) -> Result<ValidationReport, EfattureError> {
        self.doc.errors()
    }

    /// Normalize, then fail with the first validation error.
    pub fn validate(&mut self) -> Result<(), EfattureError> {
        self.normalize()?;
        self.doc.validate()
    }
}

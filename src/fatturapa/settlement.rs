use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use super::{IVP_NAMESPACE, XMLDSIG_NAMESPACE, maps};
use crate::core::{
    DocumentValidator, EfattureError, Element, OrderingOutcome, SchemaValidator, StructuralSchema,
    ValidationReport, ValidatorChain, XmlDocument,
};

const ROOT: &str = "Fornitura";
const CODICE_FISCALE: &str = "Comunicazione/Frontespizio/CodiceFiscale";
const COMUNICAZIONE: &str = "Comunicazione";

/// `Fornitura`: the quarterly periodic VAT settlement return (IVP18).
///
/// Amounts are written with a decimal comma, flags as `1`/`0` and dates as
/// `ddmmyyyy`, the way the return's schema spells them.
#[derive(Debug, Clone, PartialEq)]
pub struct VatSettlement {
    doc: XmlDocument,
}

#[derive(Default)]
pub struct VatSettlementBuilder {
    schema: Option<Arc<StructuralSchema>>,
    extra: Vec<Arc<dyn DocumentValidator>>,
}

impl fmt::Debug for VatSettlementBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VatSettlementBuilder")
            .field("schema", &self.schema.is_some())
            .field("extra", &self.extra.len())
            .finish()
    }
}

impl VatSettlementBuilder {
    /// Validate against `comunicazioneIvp`.
    pub fn schema(mut self, schema: Arc<StructuralSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn validator(mut self, validator: impl DocumentValidator + 'static) -> Self {
        self.extra.push(Arc::new(validator));
        self
    }

    pub fn build(self) -> VatSettlement {
        let root = Element::new(ROOT)
            .with_namespace(IVP_NAMESPACE)
            .with_attribute("xmlns", IVP_NAMESPACE)
            .with_attribute("xmlns:ds", XMLDSIG_NAMESPACE);
        VatSettlement {
            doc: XmlDocument::new(root).with_validators(self.chain()),
        }
    }

    /// Parse a return. The IVP namespace may be the default one or bound to
    /// a prefix; either way the result uses it as the default namespace.
    pub fn parse(self, xml: &str) -> Result<VatSettlement, EfattureError> {
        let (root, _) = XmlDocument::parse(xml)?.into_parts();
        if root.namespace() != Some(IVP_NAMESPACE) {
            return Err(EfattureError::InvalidArgument(format!(
                "settlement root uses namespace '{}'",
                root.namespace().unwrap_or_default()
            )));
        }
        if root.local_name() != ROOT {
            return Err(EfattureError::InvalidArgument(format!(
                "settlement root is <{}>, not <{ROOT}>",
                root.name()
            )));
        }
        let prefixed = root.name() != ROOT;
        let mut root = unprefix(root);
        root.set_attribute("xmlns", IVP_NAMESPACE);
        if prefixed {
            debug!("moved settlement namespace to the default binding");
        }
        Ok(VatSettlement {
            doc: XmlDocument::new(root).with_validators(self.chain()),
        })
    }

    fn chain(&self) -> ValidatorChain {
        let mut chain = ValidatorChain::builder();
        if let Some(schema) = &self.schema {
            chain = chain.with(SchemaValidator::new(Arc::clone(schema)));
        }
        for validator in &self.extra {
            chain = chain.with_shared(Arc::clone(validator));
        }
        chain.build()
    }
}

/// Strip the prefix of every element in the IVP namespace, together with the
/// declarations binding a prefix to it.
fn unprefix(mut element: Element) -> Element {
    let name = if element.namespace() == Some(IVP_NAMESPACE) {
        element.local_name().to_string()
    } else {
        element.name().to_string()
    };
    let mut out = Element::new(name);
    if let Some(namespace) = element.namespace() {
        out = out.with_namespace(namespace);
    }
    for (key, value) in element.attributes() {
        if key.starts_with("xmlns") && value == IVP_NAMESPACE {
            continue;
        }
        out.set_attribute(key.as_str(), value.as_str());
    }
    out.set_text(element.text());
    for child in element.take_children() {
        out.push_child(unprefix(child));
    }
    out
}

impl Default for VatSettlement {
    fn default() -> Self {
        Self::new()
    }
}

impl VatSettlement {
    pub fn builder() -> VatSettlementBuilder {
        VatSettlementBuilder::default()
    }

    /// An empty return without validators.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn parse(xml: &str) -> Result<Self, EfattureError> {
        Self::builder().parse(xml)
    }

    pub fn document(&self) -> &XmlDocument {
        &self.doc
    }

    pub fn into_document(self) -> XmlDocument {
        self.doc
    }

    pub fn get(&self, path: &str) -> Result<Option<String>, EfattureError> {
        self.doc.get(path)
    }

    pub fn has(&self, path: &str) -> Result<bool, EfattureError> {
        self.doc.has(path)
    }

    pub fn set(&mut self, path: &str, value: impl AsRef<str>) -> Result<&mut Self, EfattureError> {
        self.doc.set(path, value)?;
        Ok(self)
    }

    pub fn remove(&mut self, path: &str) -> Result<bool, EfattureError> {
        self.doc.remove(path)
    }

    /// Amount rounded half away from zero to two places, decimal comma.
    pub fn set_amount(&mut self, path: &str, value: Decimal) -> Result<&mut Self, EfattureError> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        self.set(path, format!("{rounded:.2}").replace('.', ","))
    }

    pub fn set_flag(&mut self, path: &str, value: bool) -> Result<&mut Self, EfattureError> {
        self.set(path, if value { "1" } else { "0" })
    }

    pub fn set_date(&mut self, path: &str, value: NaiveDate) -> Result<&mut Self, EfattureError> {
        self.set(path, value.format("%d%m%Y").to_string())
    }

    /// `Frontespizio/CodiceFiscale`: the taxpayer the return is about.
    pub fn codice_fiscale(&self) -> Option<String> {
        self.doc.get(CODICE_FISCALE).ok().flatten()
    }

    /// `IT` + upper-cased taxpayer code + `_LI` + `suffix`.
    pub fn generate_file_name(&self, suffix: &str) -> Result<String, EfattureError> {
        let codice = self.codice_fiscale().ok_or_else(|| {
            EfattureError::InvalidArgument(format!("empty '{CODICE_FISCALE}' field"))
        })?;
        Ok(format!("IT{}_LI{suffix}", codice.to_uppercase()))
    }

    /// Put elements in IVP18 order and drop empty ones. The `identificativo`
    /// attribute of `Comunicazione` is carried over.
    pub fn normalize(&mut self) -> Result<OrderingOutcome, EfattureError> {
        let identificativo = self.doc.attribute(COMUNICAZIONE, "identificativo")?;
        let outcome = maps::settlement().order_tags(&mut self.doc)?;
        if let Some(id) = identificativo {
            if self.doc.retrieve_node(COMUNICAZIONE)?.is_some() {
                self.doc.set_attribute(COMUNICAZIONE, "identificativo", id)?;
            }
        }
        self.doc.normalize();
        Ok(outcome)
    }

    pub fn fingerprint(&mut self) -> Result<String, EfattureError> {
        self.doc.fingerprint()
    }

    pub fn to_xml_string(&self, pretty: bool) -> Result<String, EfattureError> {
        self.doc.to_xml_string(pretty)
    }

    pub fn save_xml(&mut self, pretty: bool) -> Result<String, EfattureError> {
        self.normalize()?;
        self.doc.to_xml_string(pretty)
    }

    pub fn errors(&self) -> Result<ValidationReport, EfattureError> {
        self.doc.errors()
    }

    pub fn validate(&mut self) -> Result<(), EfattureError> {
        self.normalize()?;
        self.doc.validate()
    }
}

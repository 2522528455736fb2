use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{MESSAGGI_NAMESPACE, XMLDSIG_NAMESPACE, XSI_NAMESPACE, maps};
use crate::core::{
    DocumentValidator, EfattureError, Element, OrderingOutcome, SchemaValidator, StructuralSchema,
    ValidationReport, ValidatorChain, XmlDocument,
};

const ROOT: &str = "NotificaEsitoCommittente";
const SCHEMA_LOCATION: &str = "http://www.fatturapa.gov.it/sdi/messaggi/v1.0 MessaggiTypes_v1.0.xsd";

/// Recipient's verdict on an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeCode {
    /// Accepted.
    #[serde(rename = "EC01")]
    Ec01,
    /// Rejected.
    #[serde(rename = "EC02")]
    Ec02,
}

impl OutcomeCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ec01 => "EC01",
            Self::Ec02 => "EC02",
        }
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeCode {
    type Err = EfattureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EC01" => Ok(Self::Ec01),
            "EC02" => Ok(Self::Ec02),
            _ => Err(EfattureError::InvalidArgument(format!(
                "outcome must be 'EC01' or 'EC02', got '{s}'"
            ))),
        }
    }
}

/// `NotificaEsitoCommittente`: the message a recipient sends through the SdI
/// to accept or reject a received invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeNotification {
    doc: XmlDocument,
}

#[derive(Default)]
pub struct OutcomeNotificationBuilder {
    schema: Option<Arc<StructuralSchema>>,
    extra: Vec<Arc<dyn DocumentValidator>>,
}

impl fmt::Debug for OutcomeNotificationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomeNotificationBuilder")
            .field("schema", &self.schema.is_some())
            .field("extra", &self.extra.len())
            .finish()
    }
}

impl OutcomeNotificationBuilder {
    /// Validate against `MessaggiTypes`.
    pub fn schema(mut self, schema: Arc<StructuralSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn validator(mut self, validator: impl DocumentValidator + 'static) -> Self {
        self.extra.push(Arc::new(validator));
        self
    }

    pub fn build(self) -> OutcomeNotification {
        let root = Element::new(format!("types:{ROOT}"))
            .with_namespace(MESSAGGI_NAMESPACE)
            .with_attribute("xmlns:types", MESSAGGI_NAMESPACE)
            .with_attribute("xmlns:ds", XMLDSIG_NAMESPACE)
            .with_attribute("xmlns:xsi", XSI_NAMESPACE)
            .with_attribute("versione", "1.0")
            .with_attribute("xsi:schemaLocation", SCHEMA_LOCATION);
        OutcomeNotification {
            doc: XmlDocument::new(root).with_validators(self.chain()),
        }
    }

    /// Parse a notification, checking the root's local name and namespace.
    pub fn parse(self, xml: &str) -> Result<OutcomeNotification, EfattureError> {
        let doc = XmlDocument::parse(xml)?;
        let root = doc.root();
        if root.namespace() != Some(MESSAGGI_NAMESPACE) {
            return Err(EfattureError::InvalidArgument(format!(
                "outcome notification root uses namespace '{}'",
                root.namespace().unwrap_or_default()
            )));
        }
        if root.local_name() != ROOT {
            return Err(EfattureError::InvalidArgument(format!(
                "outcome notification root is <{}>, not <{ROOT}>",
                root.name()
            )));
        }
        Ok(OutcomeNotification {
            doc: doc.with_validators(self.chain()),
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

impl Default for OutcomeNotification {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeNotification {
    pub fn builder() -> OutcomeNotificationBuilder {
        OutcomeNotificationBuilder::default()
    }

    /// An empty notification without validators.
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

    fn field(&self, path: &str) -> Option<String> {
        self.doc.get(path).ok().flatten()
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

    pub fn set_identificativo_sdi(&mut self, id: &str) -> Result<&mut Self, EfattureError> {
        self.set("IdentificativoSdI", id)
    }

    /// Reference the rejected or accepted invoice within its file.
    /// `posizione` is the 1-based body index in a batch.
    pub fn set_riferimento_fattura(
        &mut self,
        numero: &str,
        anno: i32,
        posizione: u32,
    ) -> Result<&mut Self, EfattureError> {
        self.set("RiferimentoFattura/NumeroFattura", numero)?
            .set("RiferimentoFattura/AnnoFattura", anno.to_string())?
            .set("RiferimentoFattura/PosizioneFattura", posizione.to_string())
    }

    pub fn set_esito(&mut self, esito: OutcomeCode) -> Result<&mut Self, EfattureError> {
        self.set("Esito", esito.as_str())
    }

    pub fn set_descrizione(&mut self, descrizione: &str) -> Result<&mut Self, EfattureError> {
        self.set("Descrizione", descrizione)
    }

    pub fn set_message_id_committente(&mut self, id: &str) -> Result<&mut Self, EfattureError> {
        self.set("MessageIdCommittente", id)
    }

    pub fn identificativo_sdi(&self) -> Option<String> {
        self.field("IdentificativoSdI")
    }

    /// `Esito`, if present and one of the two known codes.
    pub fn esito(&self) -> Option<OutcomeCode> {
        self.field("Esito")?.parse().ok()
    }

    pub fn descrizione(&self) -> Option<String> {
        self.field("Descrizione")
    }

    pub fn message_id_committente(&self) -> Option<String> {
        self.field("MessageIdCommittente")
    }

    /// Put elements in `MessaggiTypes` order and drop empty ones.
    pub fn normalize(&mut self) -> Result<OrderingOutcome, EfattureError> {
        let outcome = maps::notification().order_tags(&mut self.doc)?;
        self.doc.normalize();
        Ok(outcome)
    }

    pub fn fingerprint(&mut self) -> Result<String, EfattureError> {
        self.doc.fingerprint()
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

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> OutcomeNotification {
        let mut n = OutcomeNotification::new();
        n.set_message_id_committente("MSG-1")
            .unwrap()
            .set_esito(OutcomeCode::Ec02)
            .unwrap()
            .set_riferimento_fattura("FT/12", 2024, 1)
            .unwrap()
            .set_identificativo_sdi("111")
            .unwrap();
        n
    }

    #[test]
    fn root_carries_messaging_bindings() {
        let n = OutcomeNotification::new();
        let root = n.document().root();
        assert_eq!(root.name(), "types:NotificaEsitoCommittente");
        assert_eq!(root.attribute("versione"), Some("1.0"));
        assert_eq!(root.attribute("xmlns:ds"), Some(XMLDSIG_NAMESPACE));
        assert_eq!(root.attribute("xsi:schemaLocation"), Some(SCHEMA_LOCATION));
    }

    #[test]
    fn setters_and_getters() {
        let n = filled();
        assert_eq!(n.esito(), Some(OutcomeCode::Ec02));
        assert_eq!(n.identificativo_sdi().as_deref(), Some("111"));
        assert_eq!(n.get("RiferimentoFattura/AnnoFattura").unwrap().as_deref(), Some("2024"));
        assert_eq!(n.message_id_committente().as_deref(), Some("MSG-1"));
    }

    #[test]
    fn normalize_applies_message_order() {
        let mut n = filled();
        let outcome = n.normalize().unwrap();
        assert!(outcome.dropped.is_empty());
        let order: Vec<String> = n.document().root().children().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(
            order,
            vec!["IdentificativoSdI", "RiferimentoFattura", "Esito", "MessageIdCommittente"]
        );
    }

    #[test]
    fn save_and_parse_round_trip() {
        let mut n = filled();
        let xml = n.save_xml(false).unwrap();
        let mut parsed = OutcomeNotification::parse(&xml).unwrap();
        assert_eq!(parsed.esito(), Some(OutcomeCode::Ec02));
        assert_eq!(parsed.fingerprint().unwrap(), n.fingerprint().unwrap());
    }

    #[test]
    fn parse_checks_root() {
        let wrong_ns = r#"<types:NotificaEsitoCommittente xmlns:types="urn:other"/>"#;
        assert!(matches!(
            OutcomeNotification::parse(wrong_ns),
            Err(EfattureError::InvalidArgument(_))
        ));
        let wrong_name = format!(r#"<types:NotificaScarto xmlns:types="{MESSAGGI_NAMESPACE}"/>"#);
        assert!(matches!(
            OutcomeNotification::parse(&wrong_name),
            Err(EfattureError::InvalidArgument(_))
        ));
    }

    #[test]
    fn outcome_codes() {
        assert_eq!("ec01".parse::<OutcomeCode>().unwrap(), OutcomeCode::Ec01);
        assert!("EC03".parse::<OutcomeCode>().is_err());
        assert_eq!(OutcomeCode::Ec02.to_string(), "EC02");
    }
}

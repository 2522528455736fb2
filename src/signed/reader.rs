use sha2::{Digest, Sha256};
use tracing::debug;

use super::{CadesExtractor, SigningMethod};
use crate::core::{EfattureError, Element, XmlDocument};
use crate::fatturapa::{InvoiceData, InvoiceDataBuilder, XMLDSIG_NAMESPACE};

/// A signed invoice opened into its plain XML.
#[derive(Debug, Clone)]
pub struct SignedInvoice {
    method: SigningMethod,
    signed: Vec<u8>,
    plain: Vec<u8>,
    invoice: InvoiceData,
    signed_fingerprint: String,
    fingerprint: String,
}

impl SignedInvoice {
    /// Open `signed` with the default invoice validators.
    ///
    /// CAdES envelopes go through `extractor`; XAdES files are parsed and
    /// every `ds:Signature` element is removed.
    pub fn read(
        signed: &[u8],
        method: SigningMethod,
        extractor: &dyn CadesExtractor,
    ) -> Result<Self, EfattureError> {
        Self::read_with(signed, method, extractor, InvoiceData::builder())
    }

    /// Like [`read`](Self::read), attaching the validators configured on
    /// `builder`.
    pub fn read_with(
        signed: &[u8],
        method: SigningMethod,
        extractor: &dyn CadesExtractor,
        builder: InvoiceDataBuilder,
    ) -> Result<Self, EfattureError> {
        let plain = match method {
            SigningMethod::CadesBes => extractor.extract(signed)?,
            SigningMethod::XadesBes => strip_xades_signature(signed)?,
        };
        if plain.iter().all(u8::is_ascii_whitespace) {
            return Err(EfattureError::Signature(format!("invalid {method} file: no content")));
        }

        let mut invoice = builder.parse_bytes(&plain)?;
        let fingerprint = invoice.fingerprint()?;
        let signed_fingerprint = hex::encode(Sha256::digest(signed.to_ascii_lowercase()));
        debug!(%method, signed = signed.len(), plain = plain.len(), "opened signed invoice");

        Ok(Self {
            method,
            signed: signed.to_vec(),
            plain,
            invoice,
            signed_fingerprint,
            fingerprint,
        })
    }

    pub fn method(&self) -> SigningMethod {
        self.method
    }

    /// The file as received.
    pub fn signed_content(&self) -> &[u8] {
        &self.signed
    }

    /// The XML inside the envelope.
    pub fn plain_content(&self) -> &[u8] {
        &self.plain
    }

    pub fn invoice(&self) -> &InvoiceData {
        &self.invoice
    }

    pub fn invoice_mut(&mut self) -> &mut InvoiceData {
        &mut self.invoice
    }

    pub fn into_invoice(self) -> InvoiceData {
        self.invoice
    }

    /// SHA-256 of the ASCII-lower-cased signed bytes, hex encoded.
    pub fn signed_fingerprint(&self) -> &str {
        &self.signed_fingerprint
    }

    /// [`XmlDocument::fingerprint`] of the plain invoice.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Whether `content` parses as XML holding at least one `ds:Signature`.
pub fn is_xades_signed(content: &[u8]) -> bool {
    XmlDocument::from_bytes(content)
        .map(|doc| count_signatures(doc.root()) > 0)
        .unwrap_or(false)
}

/// Remove every XML-DSig `Signature` element and serialize what is left.
/// A document without one is not a XAdES file.
pub fn strip_xades_signature(content: &[u8]) -> Result<Vec<u8>, EfattureError> {
    let doc = XmlDocument::from_bytes(content)
        .map_err(|e| EfattureError::Signature(format!("invalid XAdES-BES file: {e}")))?;
    let (mut root, _) = doc.into_parts();

    let removed = remove_signatures(&mut root);
    if removed == 0 {
        return Err(EfattureError::Signature(
            "invalid XAdES-BES file: no ds:Signature element".into(),
        ));
    }
    debug!(removed, "stripped XAdES signatures");
    Ok(XmlDocument::new(root).to_xml_string(false)?.into_bytes())
}

fn is_signature(element: &Element) -> bool {
    element.local_name() == "Signature" && element.namespace() == Some(XMLDSIG_NAMESPACE)
}

fn count_signatures(element: &Element) -> usize {
    element
        .children()
        .iter()
        .map(|c| usize::from(is_signature(c)) + count_signatures(c))
        .sum()
}

fn remove_signatures(element: &mut Element) -> usize {
    let children = element.children_mut();
    let before = children.len();
    children.retain(|c| !is_signature(c));
    let mut removed = before - children.len();
    for child in children.iter_mut() {
        removed += remove_signatures(child);
    }
    removed
}

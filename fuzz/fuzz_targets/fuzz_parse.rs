#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Errors are fine, panics are bugs.
    if let Ok(mut doc) = efatture::XmlDocument::from_bytes(data) {
        let _ = doc.fingerprint();
        let _ = doc.to_xml_string(true);
    }
    if let Ok(mut invoice) = efatture::fatturapa::InvoiceData::from_bytes(data) {
        let _ = invoice.errors();
        let _ = invoice.save_xml(false);
    }
});

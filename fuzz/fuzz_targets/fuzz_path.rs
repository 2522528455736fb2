#![no_main]

use efatture::{Element, XmlDocument, format_path, parse_path};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(path) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(segments) = parse_path(path, "Root") else {
        return;
    };
    // A parsed path must survive formatting.
    let formatted = format_path("Root", &segments);
    assert_eq!(parse_path(&formatted, "Root").ok().as_ref(), Some(&segments));

    // Writes pad missing siblings; keep them small.
    if segments.iter().any(|s| s.index > 64) {
        return;
    }
    let mut doc = XmlDocument::new(Element::new("Root"));
    if doc.set(path, "v").is_ok() {
        let _ = doc.get(path);
        let _ = doc.count(path);
        let _ = doc.remove(path);
    }
});

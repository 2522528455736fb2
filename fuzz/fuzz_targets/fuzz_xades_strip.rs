#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if efatture::signed::is_xades_signed(data) {
        let _ = efatture::signed::strip_xades_signature(data);
    }
});

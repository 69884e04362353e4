#![no_main]
use libfuzzer_sys::fuzz_target;
use tfci_core::changes::parse_changes;
use tfci_core::changes::parser::clean_token;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        for item in parse_changes(s) {
            let item = item.as_str();
            assert!(!item.is_empty());
            assert!(!item.contains(','));
            assert_eq!(item, item.trim());
        }
        let _ = clean_token(s);
    }
});

#![no_main]
use libfuzzer_sys::fuzz_target;
use tfci_core::changes::classifier::{is_excluded, is_module_change};
use tfci_core::platform::PathUtil;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = PathUtil::components(s).count();
        let _ = PathUtil::basename(s);
        let dir = PathUtil::dirname(s);
        let dir = PathUtil::strip_current_dir(dir);
        let truncated = PathUtil::truncate_at_component(dir, "tests");
        assert!(dir.starts_with(truncated));
        let _ = is_module_change(truncated);
        let _ = is_excluded(truncated);
    }
});

#![no_main]
use libfuzzer_sys::fuzz_target;
use tfci_core::output::json_format::safe_output_escape;
use tfci_core::output::report::{escape_markdown_code, ReportSection, RunLink};
use tfci_core::output::writer::render_output;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let escaped = safe_output_escape(s);
        assert!(!escaped.contains(['\n', '\r']));
        let _ = escape_markdown_code(s);

        let link = RunLink {
            run_id: 1,
            url: "https://github.com/o/r/actions/runs/1".to_string(),
        };
        let section = ReportSection::from_content(s.to_string(), &link);
        assert_eq!(section.raw, s);

        // Values carrying the heredoc delimiter line are rejected, never emitted
        let _ = render_output("changes", s);
    }
});

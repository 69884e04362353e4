//! GitHub Actions workflow commands (`::warning::`, `::group::`, ...)

use super::json_format::safe_output_escape;
use crate::types::Diagnostic;
use std::io::{self, Write};

/// Writes workflow commands to the job log
pub struct WorkflowCommands<W: Write> {
    out: W,
}

impl WorkflowCommands<io::Stdout> {
    /// Commands on the process stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> WorkflowCommands<W> {
    /// Wrap any writer
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    /// `::warning::` annotation
    pub fn warning(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "::warning::{}", safe_output_escape(message))
    }

    /// `::error::` annotation
    pub fn error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "::error::{}", safe_output_escape(message))
    }

    /// Plain log line
    pub fn info(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message)
    }

    /// Collapsible log section holding `body` verbatim
    pub fn group(&mut self, title: &str, body: &str) -> io::Result<()> {
        writeln!(self.out, "::group::{}", safe_output_escape(title))?;
        if !body.is_empty() {
            self.out.write_all(body.as_bytes())?;
            if !body.ends_with('\n') {
                writeln!(self.out)?;
            }
        }
        writeln!(self.out, "::endgroup::")
    }

    /// One annotation per diagnostic
    pub fn diagnostics(&mut self, diagnostics: &[Diagnostic]) -> io::Result<()> {
        for d in diagnostics {
            self.warning(&d.message)?;
        }
        Ok(())
    }

    /// Flush the writer
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiagnosticCategory;

    fn render(f: impl FnOnce(&mut WorkflowCommands<Vec<u8>>) -> io::Result<()>) -> String {
        let mut cmds = WorkflowCommands::new(Vec::new());
        f(&mut cmds).unwrap();
        String::from_utf8(cmds.into_inner()).unwrap()
    }

    #[test]
    fn test_annotations_are_escaped() {
        assert_eq!(
            render(|c| c.warning("50% done\nnext")),
            "::warning::50%25 done%0Anext\n"
        );
        assert_eq!(
            render(|c| c.error("Terraform Plan failed")),
            "::error::Terraform Plan failed\n"
        );
    }

    #[test]
    fn test_group() {
        assert_eq!(
            render(|c| c.group("📖 Plan Output", "line1\nline2")),
            "::group::📖 Plan Output\nline1\nline2\n::endgroup::\n"
        );
        assert_eq!(
            render(|c| c.group("empty", "")),
            "::group::empty\n::endgroup::\n"
        );
    }

    #[test]
    fn test_diagnostics() {
        let out = render(|c| {
            c.diagnostics(&[
                Diagnostic::soft_error(DiagnosticCategory::MissingPath, "gone"),
                Diagnostic::warning(DiagnosticCategory::ChangeParse, "empty"),
            ])
        });
        assert_eq!(out, "::warning::gone\n::warning::empty\n");
    }
}

//! Step output writer for `$GITHUB_OUTPUT`

use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Heredoc delimiter for multi-line values
pub const DELIMITER: &str = "TFCI_EOF";

/// Where step outputs go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    /// Append to the `$GITHUB_OUTPUT` file
    File(PathBuf),
    /// Print `name=value` lines (local runs)
    Stdout,
}

/// Step output writer
#[derive(Debug, Clone)]
pub struct OutputWriter {
    sink: OutputSink,
}

impl OutputWriter {
    /// Use `$GITHUB_OUTPUT`, falling back to stdout when it is unset
    pub fn from_env() -> Self {
        match std::env::var("GITHUB_OUTPUT") {
            Ok(path) if !path.is_empty() => Self::to_file(path),
            _ => {
                tracing::warn!("GITHUB_OUTPUT not set, falling back to stdout");
                Self::stdout()
            }
        }
    }

    /// Append to a specific file
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            sink: OutputSink::File(path.into()),
        }
    }

    /// Print to stdout
    pub fn stdout() -> Self {
        Self {
            sink: OutputSink::Stdout,
        }
    }

    /// Set one step output
    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        let rendered = render_output(name, value)?;
        match &self.sink {
            OutputSink::File(path) => append(path, &rendered),
            OutputSink::Stdout => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                lock.write_all(rendered.as_bytes())?;
                Ok(())
            }
        }
    }
}

fn append(path: &Path, rendered: &str) -> Result<()> {
    let mut f = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| {
            Error::Config(format!(
                "cannot open GITHUB_OUTPUT ({}): {}",
                path.display(),
                e
            ))
        })?;
    f.write_all(rendered.as_bytes())?;
    Ok(())
}

/// Render an output line, switching to heredoc syntax for multi-line values
pub fn render_output(name: &str, value: &str) -> Result<String> {
    if name.is_empty() || name.contains(['=', '\n', '\r']) {
        return Err(Error::Config(format!("invalid output name: {:?}", name)));
    }

    if !value.contains(['\n', '\r']) {
        return Ok(format!("{}={}\n", name, value));
    }

    if value.lines().any(|line| line == DELIMITER) {
        return Err(Error::Config(format!(
            "output {} contains the heredoc delimiter",
            name
        )));
    }
    Ok(format!("{name}<<{DELIMITER}\n{value}\n{DELIMITER}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_single_line() {
        assert_eq!(
            render_output("should_run", "true").unwrap(),
            "should_run=true\n"
        );
    }

    #[test]
    fn test_render_multi_line() {
        assert_eq!(
            render_output("body", "a\nb").unwrap(),
            "body<<TFCI_EOF\na\nb\nTFCI_EOF\n"
        );
    }

    #[test]
    fn test_render_rejects_delimiter_and_bad_names() {
        assert!(render_output("body", "a\nTFCI_EOF\nb").is_err());
        assert!(render_output("", "x").is_err());
        assert!(render_output("a=b", "x").is_err());
    }

    #[test]
    fn test_write_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "existing=1\n").unwrap();

        let writer = OutputWriter::to_file(&path);
        writer.set("should_run", "false").unwrap();
        writer
            .set("changes", r#"[{"path":"foo","name":"foo"}]"#)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "existing=1\nshould_run=false\nchanges=[{\"path\":\"foo\",\"name\":\"foo\"}]\n"
        );
    }

    #[test]
    fn test_write_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new_output");
        OutputWriter::to_file(&path).set("x", "1").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x=1\n");
    }

    #[test]
    fn test_write_to_unopenable_path_fails() {
        let dir = TempDir::new().unwrap();
        let err = OutputWriter::to_file(dir.path()).set("x", "1").unwrap_err();
        assert!(err.message().contains("GITHUB_OUTPUT"));
    }
}

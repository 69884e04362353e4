//! Terraform run report rendering
//!
//! Builds the Markdown body posted as a pull request comment or scheduled
//! failure issue from step outcomes and the captured Terraform output files.

use crate::context::Context;
use crate::file_ops::FileOps;
use crate::types::{Diagnostic, DiagnosticCategory, EventName, ReportInputs, UNKNOWN};
use std::fmt::Write as _;
use std::path::Path;

/// Captured output longer than this (in characters, after escaping) is cut
pub const MAX_SECTION_CHARS: usize = 20_000;

/// Shown in place of content that could not be read
pub const UNREADABLE_PLACEHOLDER: &str = "File could not be read";

/// Prefix of scheduled failure issues
const ISSUE_HEADER: &str = "\n> [!NOTE]\n> This issue was automatically created by the GitHub Actions workflow.\n\n";

/// Escape backslashes and backticks for embedding in a fenced code block
pub fn escape_markdown_code(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 16);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            c => out.push(c),
        }
    }
    out
}

/// Link to the workflow run, used in truncation notes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLink {
    /// Numeric run id
    pub run_id: u64,
    /// Browser URL of the run
    pub url: String,
}

impl RunLink {
    /// Link for the current run
    pub fn for_context(ctx: &Context) -> Self {
        Self {
            run_id: ctx.run_id,
            url: ctx.run_url(),
        }
    }

    fn markdown(&self) -> String {
        format!("[{}]({})", self.run_id, self.url)
    }
}

/// One captured output stream, ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    /// File content as read (logged to the job output)
    pub raw: String,
    /// Escaped and possibly truncated text for the code block
    pub rendered: String,
    /// Whether `rendered` was cut
    pub truncated: bool,
    /// Line shown under the block (truncation or read error), may be empty
    pub note: String,
}

impl ReportSection {
    /// Build from file content
    pub fn from_content(raw: String, link: &RunLink) -> Self {
        let escaped = escape_markdown_code(&raw);
        let truncated = escaped.chars().count() > MAX_SECTION_CHARS;

        let (rendered, note) = if truncated {
            let mut cut: String = escaped.chars().take(MAX_SECTION_CHARS).collect();
            cut.push_str(" ...");
            let note = format!(
                "Output is too long and was truncated. You can read full output in the {} workflow run.",
                link.markdown()
            );
            (cut, note)
        } else {
            (escaped, String::new())
        };

        Self {
            raw,
            rendered,
            truncated,
            note,
        }
    }

    /// Placeholder for a file that exists but could not be read
    pub fn unreadable(file: &str, error: &std::io::Error) -> Self {
        Self {
            raw: String::new(),
            rendered: UNREADABLE_PLACEHOLDER.to_string(),
            truncated: false,
            note: format!("Error reading {}: {}", file, error),
        }
    }

    /// Read `file` relative to the working directory
    ///
    /// Missing files are empty sections; other read errors produce the
    /// placeholder plus a diagnostic.
    pub fn load(
        files: &FileOps,
        file: &str,
        link: &RunLink,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        match files.read_optional(Path::new(file)) {
            Ok(content) => Self::from_content(content, link),
            Err(e) => {
                tracing::warn!(file, error = %e, "failed to read output file");
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCategory::OutputFileRead,
                    format!("Failed to read file {}: {}", file, e),
                ));
                Self::unreadable(file, &e)
            }
        }
    }
}

#[inline]
fn outcome_icon(outcome: &str) -> &'static str {
    if outcome == "success" {
        "✅"
    } else {
        "🛑"
    }
}

/// A rendered report for one Terraform working directory
#[derive(Debug, Clone)]
pub struct TerraformReport {
    inputs: ReportInputs,
    event: EventName,
    pusher: String,
    workflow: String,
    link: RunLink,
    validate_stdout: ReportSection,
    validate_stderr: ReportSection,
    plan: ReportSection,
    plan_stdout: ReportSection,
    plan_stderr: ReportSection,
    test_stdout: ReportSection,
    test_stderr: ReportSection,
    diagnostics: Vec<Diagnostic>,
}

impl TerraformReport {
    /// Read every captured output file below `inputs.workdir`
    pub fn load(inputs: ReportInputs, ctx: &Context) -> Self {
        let files = FileOps::new(&inputs.workdir);
        let link = RunLink::for_context(ctx);
        let mut diagnostics = Vec::new();

        let mut section =
            |file: &str| ReportSection::load(&files, file, &link, &mut diagnostics);
        let validate_stdout = section(&inputs.validate_stdout_file);
        let validate_stderr = section(&inputs.validate_stderr_file);
        let plan = section(&inputs.plan_file);
        let plan_stdout = section(&inputs.plan_stdout_file);
        let plan_stderr = section(&inputs.plan_stderr_file);
        let test_stdout = section(&inputs.test_stdout_file);
        let test_stderr = section(&inputs.test_stderr_file);

        let pusher = if ctx.event_name.is_pull_request() {
            ctx.actor.clone()
        } else {
            inputs.owner.clone().unwrap_or_default()
        };

        Self {
            event: ctx.event_name.clone(),
            pusher,
            workflow: ctx.workflow.clone(),
            link,
            validate_stdout,
            validate_stderr,
            plan,
            plan_stdout,
            plan_stderr,
            test_stdout,
            test_stderr,
            diagnostics,
            inputs,
        }
    }

    /// Inputs the report was built from
    pub fn inputs(&self) -> &ReportInputs {
        &self.inputs
    }

    /// Problems reading output files
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// User named in the footer
    pub fn pusher(&self) -> &str {
        &self.pusher
    }

    /// `terraform plan` exited with 1
    pub fn plan_failed(&self) -> bool {
        self.inputs.plan_exit_code == "1"
    }

    /// `terraform test` exited with 1
    pub fn test_failed(&self) -> bool {
        self.inputs.test_exit_code == "1"
    }

    /// Whether `terraform test` ran at all
    pub fn test_ran(&self) -> bool {
        self.inputs.test_exit_code != UNKNOWN
    }

    /// Failure messages for the final step status, plan first
    pub fn failures(&self) -> Vec<&'static str> {
        let mut failures = Vec::new();
        if self.plan_failed() {
            failures.push("Terraform Plan failed");
        }
        if self.test_failed() {
            failures.push("Terraform Test failed");
        }
        failures
    }

    /// Exit code for the report step
    ///
    /// A failed plan or test fails the step even when the report was posted;
    /// a report that could not be posted fails it on its own.
    pub fn exit_code(&self, published: bool) -> i32 {
        if self.plan_failed() || self.test_failed() || !published {
            1
        } else {
            0
        }
    }

    /// Text identifying this working directory's comment
    pub fn workdir_marker(&self) -> String {
        format!("Working Directory: `{}`", self.inputs.workdir)
    }

    /// Title of the scheduled failure issue
    pub fn issue_title(&self) -> String {
        format!(
            "[bug] E2E Terraform Test Failure in `{}`",
            self.inputs.workdir
        )
    }

    /// Issue body: note header followed by the report
    pub fn issue_body(&self) -> String {
        let mut out = String::from(ISSUE_HEADER);
        out.push_str(&self.body());
        out
    }

    /// Sections echoed to the job log after posting
    pub fn log_groups(&self) -> Vec<(&'static str, &str)> {
        let mut groups = vec![
            ("📖 Plan Output", self.plan.raw.as_str()),
            ("📖 Plan Error", self.plan_stderr.raw.as_str()),
        ];
        if self.test_ran() {
            groups.push(("🧪 Test Output", self.test_stdout.raw.as_str()));
            groups.push(("🧪 Test Error", self.test_stderr.raw.as_str()));
        }
        groups
    }

    /// Comment body
    pub fn body(&self) -> String {
        let i = &self.inputs;
        let mut out = String::with_capacity(4096);

        let summary = if self.plan_failed() || self.test_failed() {
            format!("An error occurred during the tests for `{}` ❌", i.workdir)
        } else {
            format!("All tests passed successfully for `{}` ✅", i.workdir)
        };

        let _ = write!(
            out,
            "\n{summary}\n\n**Workflow Run:** {run}\n\n",
            run = self.link.markdown()
        );
        let _ = write!(
            out,
            "#### 🔢 Terraform Version and Platform: `{}/{}`\n\n",
            i.tf_version, i.tf_platform
        );
        let _ = write!(
            out,
            "#### 🖌 Terraform Format and Style: `{} {}`\n\n",
            i.fmt_outcome,
            outcome_icon(&i.fmt_outcome)
        );
        let _ = write!(
            out,
            "#### ⚙️ Terraform Initialization: `{} {}`\n\n",
            i.init_outcome,
            outcome_icon(&i.init_outcome)
        );
        let _ = write!(
            out,
            "#### 🤖 Terraform Validation: `{} {}`\n\n",
            i.validate_outcome,
            outcome_icon(&i.validate_outcome)
        );
        push_details(&mut out, "Show Output", &self.validate_stdout);
        out.push('\n');
        push_details(&mut out, "Show Error", &self.validate_stderr);

        let _ = write!(
            out,
            "\n#### 🩺 Terraform Plan Exit Code: `{}`\n\n",
            i.plan_exit_code
        );
        push_details(&mut out, "Show Output", &self.plan_stdout);
        out.push('\n');
        push_details(&mut out, "Show Error", &self.plan_stderr);

        let _ = write!(
            out,
            "\n#### 📖 Terraform Plan: `{} {}`\n\n",
            i.plan_outcome,
            outcome_icon(&i.plan_outcome)
        );
        push_details(&mut out, "Show Output", &self.plan);
        out.push('\n');

        if self.test_ran() {
            let _ = write!(
                out,
                "\n#### 🩺 Terraform Test Exit Code: `{}`\n\n",
                i.test_exit_code
            );
            push_details(&mut out, "Show Error", &self.test_stderr);
            let _ = write!(
                out,
                "\n#### 🧪 Terraform Test: `{} {}`\n\n",
                i.test_outcome,
                outcome_icon(&i.test_outcome)
            );
            push_details(&mut out, "Show Output", &self.test_stdout);
        }

        let _ = writeln!(
            out,
            "\n\n*Pusher: @{}, Action: `{}`, {}, Workflow: `{}`*",
            self.pusher,
            self.event,
            self.workdir_marker(),
            self.workflow
        );
        out
    }
}

fn push_details(out: &mut String, summary: &str, section: &ReportSection) {
    let _ = write!(
        out,
        "<details><summary>{}</summary>\n\n```text\n{}\n```\n\n</details>\n\n{}\n",
        summary, section.rendered, section.note
    );
}

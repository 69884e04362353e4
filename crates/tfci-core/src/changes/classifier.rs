//! Test target classification
//!
//! Maps changed files (or directories) to the Terraform root configuration
//! directories whose tests must run:
//! - file paths are reduced to their containing directory
//! - anything below a `tests` directory counts for the root above it
//! - `modules/` directories are never targets themselves; a change under
//!   `modules/` instead selects every first-level directory of the
//!   configuration root
//!
//! Items that do not exist on disk are skipped with a diagnostic rather than
//! failing the run.

use super::parser::{parse_changes, ChangeItem};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::file_ops::{FileOps, PathKind};
use crate::output::json_format::format_targets;
use crate::platform::PathUtil;
use crate::types::{ClassifierConfig, Diagnostic, DiagnosticCategory, EventName, TestTarget};
use std::collections::BTreeSet;

/// Terraform source file extension
const TF_EXTENSION: &str = ".tf";

/// How change items are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeMode {
    /// Items are changed files
    Files,
    /// Items are directories (manual dispatch with an explicit list)
    Directories,
}

impl ChangeMode {
    /// Directory mode only for `workflow_dispatch` whose `tf_dirs` input is not `*`
    pub fn for_context(ctx: &Context) -> Self {
        if ctx.event_name == EventName::WorkflowDispatch
            && ctx.payload.input("tf_dirs").as_deref() != Some("*")
        {
            ChangeMode::Directories
        } else {
            ChangeMode::Files
        }
    }

    /// Directory an item stands for, before any disk lookup
    #[inline]
    fn directory_of<'p>(&self, item: &'p str) -> &'p str {
        match self {
            ChangeMode::Files => PathUtil::dirname(item),
            ChangeMode::Directories => item,
        }
    }
}

/// Classifier result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Sorted, deduplicated targets
    pub targets: Vec<TestTarget>,
    /// Items that were skipped, and why
    pub diagnostics: Vec<Diagnostic>,
}

impl Classification {
    /// Compact JSON array of `{path, name}`
    pub fn to_json(&self) -> String {
        format_targets(&self.targets)
    }

    /// Target paths, in order
    pub fn paths(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.path.as_str()).collect()
    }
}

/// Whether a directory lives under the shared `modules/` tree
#[inline]
pub fn is_module_change(dir: &str) -> bool {
    dir.starts_with("modules/") || dir.starts_with("./modules/")
}

/// Directories that can never be test targets
#[inline]
pub fn is_excluded(dir: &str) -> bool {
    dir.is_empty() || dir == "." || PathUtil::has_component(dir, "modules")
}

/// Build a target from a directory path
#[inline]
pub fn target_for(path: String) -> TestTarget {
    let name = PathUtil::basename(&path).to_string();
    TestTarget { path, name }
}

/// Maps change lists to test targets
pub struct PathClassifier<'a> {
    config: &'a ClassifierConfig,
    files: FileOps,
}

impl<'a> PathClassifier<'a> {
    /// Create a classifier resolving paths against `config.base_dir`
    pub fn new(config: &'a ClassifierConfig) -> Self {
        Self {
            config,
            files: FileOps::new(config.base_dir.clone()),
        }
    }

    /// Classify a raw comma-separated change list for the given run
    ///
    /// Blank input is not an error and yields no targets.
    pub fn classify(&self, changes: &str, ctx: &Context) -> Result<Classification> {
        if changes.trim().is_empty() {
            return Ok(Classification::default());
        }

        if ctx.event_name.as_str().is_empty() {
            return Err(Error::Config(
                "GitHub context is missing or invalid".to_string(),
            ));
        }

        let mode = ChangeMode::for_context(ctx);
        let items = parse_changes(changes);
        if items.is_empty() {
            return Ok(Classification {
                targets: Vec::new(),
                diagnostics: vec![Diagnostic::warning(
                    DiagnosticCategory::ChangeParse,
                    "No valid items found after parsing changes input",
                )],
            });
        }

        tracing::debug!(items = items.len(), ?mode, "classifying changes");
        self.classify_items(&items, mode)
    }

    /// Classify already parsed items
    pub fn classify_items(
        &self,
        items: &[ChangeItem<'_>],
        mode: ChangeMode,
    ) -> Result<Classification> {
        let mut dirs: BTreeSet<String> = BTreeSet::new();
        let mut diagnostics = Vec::new();

        if items
            .iter()
            .any(|item| is_module_change(mode.directory_of(item.as_str())))
        {
            let roots = self.root_configurations()?;
            tracing::info!(
                src_core = %self.config.src_core,
                count = roots.len(),
                "module change detected, selecting all root configurations"
            );
            dirs.extend(roots);
        }

        for item in items {
            match self.normalize(*item, mode) {
                Ok(Some(dir)) => {
                    dirs.insert(dir);
                }
                Ok(None) => {}
                Err(diagnostic) => {
                    tracing::debug!(item = %item, message = %diagnostic.message, "skipping item");
                    diagnostics.push(diagnostic);
                }
            }
        }

        let targets: Vec<TestTarget> = dirs
            .into_iter()
            .filter(|dir| !is_excluded(dir))
            .map(target_for)
            .collect();

        Ok(Classification {
            targets,
            diagnostics,
        })
    }

    /// Reduce one item to a candidate directory
    ///
    /// `Ok(None)` means the item is valid but not a target (root, modules).
    fn normalize(
        &self,
        item: ChangeItem<'_>,
        mode: ChangeMode,
    ) -> std::result::Result<Option<String>, Diagnostic> {
        let raw = item.as_str();
        let dir = match mode {
            ChangeMode::Files => PathUtil::dirname(raw),
            ChangeMode::Directories if raw.ends_with(TF_EXTENSION) || self.files.is_file(raw) => {
                PathUtil::dirname(raw)
            }
            ChangeMode::Directories => raw,
        };

        let dir = PathUtil::strip_current_dir(dir);
        let dir = if dir.len() > 1 {
            dir.trim_end_matches('/')
        } else {
            dir
        };

        match self.files.path_kind(dir) {
            PathKind::Directory => {}
            PathKind::Missing => {
                return Err(Diagnostic::soft_error(
                    DiagnosticCategory::MissingPath,
                    format!(
                        "Failed to process item \"{}\": File does not exist: {}",
                        item, dir
                    ),
                ));
            }
            PathKind::File => {
                return Err(Diagnostic::soft_error(
                    DiagnosticCategory::NotADirectory,
                    format!("Failed to process item \"{}\": Not a directory: {}", item, dir),
                ));
            }
        }

        let dir = PathUtil::truncate_at_component(dir, "tests");
        if is_excluded(dir) {
            return Ok(None);
        }
        Ok(Some(dir.to_string()))
    }

    /// `{src_core}/{name}` for every first-level directory of the root
    fn root_configurations(&self) -> Result<Vec<String>> {
        let root = self.config.src_core.trim();
        let root = PathUtil::strip_current_dir(if root.len() > 1 {
            root.trim_end_matches('/')
        } else {
            root
        });

        let names = match self.files.list_subdirectories(root)? {
            Some(names) => names,
            None => {
                tracing::warn!(src_core = %root, "configuration root does not exist");
                return Ok(Vec::new());
            }
        };

        Ok(names
            .into_iter()
            .map(|name| {
                if root.is_empty() || root == "." {
                    name
                } else {
                    format!("{}/{}", root, name)
                }
            })
            .collect())
    }
}

//! Points where the pipeline hands control to a human.
//!
//! Both suspension points block until the operator finishes and report how
//! to resume: [Resumption::Continue] or [Resumption::Abort].

use crate::error::{Result, UpdaterError};
use crate::process::CommandRunner;
use crate::ui;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::env;
use std::fs;
use std::path::Path;

/// How the pipeline resumes after the operator hands control back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resumption {
    Continue,
    Abort,
}

pub trait Operator {
    /// Review the changelog draft at `draft`. Edits are saved in place.
    fn review_changelog(&self, draft: &Path) -> Result<Resumption>;

    /// Fix a failed build in `workdir`. `Continue` means "build again".
    fn fix_build(&self, workdir: &Path, log_tail: &str) -> Result<Resumption>;
}

/// Pick the editor: configured, then `$VISUAL`, then `$EDITOR`, then `vi`.
pub fn resolve_editor(
    configured: Option<&str>,
    visual: Option<&str>,
    editor: Option<&str>,
) -> String {
    [configured, visual, editor]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|e| !e.is_empty())
        .unwrap_or("vi")
        .to_string()
}

/// Operator at an interactive terminal: an editor for review, a shell for fixes.
#[derive(Debug, Clone)]
pub struct TerminalOperator {
    editor: String,
    shell: String,
    runner: CommandRunner,
}

impl TerminalOperator {
    pub fn new(configured_editor: Option<&str>) -> Self {
        let visual = env::var("VISUAL").ok();
        let editor = env::var("EDITOR").ok();
        let shell = env::var("SHELL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "/bin/sh".to_string());
        TerminalOperator {
            editor: resolve_editor(configured_editor, visual.as_deref(), editor.as_deref()),
            shell,
            runner: CommandRunner::default(),
        }
    }

    pub fn editor(&self) -> &str {
        &self.editor
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Operator for TerminalOperator {
    fn review_changelog(&self, draft: &Path) -> Result<Resumption> {
        // Editors like "code --wait" carry their own arguments
        let mut words = self.editor.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| UpdaterError::config("Editor command is empty"))?;
        let mut args: Vec<String> = words.map(str::to_string).collect();
        args.push(draft.to_string_lossy().into_owned());

        let status = self.runner.run_interactive(program, &args, None)?;
        if status.success() {
            Ok(Resumption::Continue)
        } else {
            Ok(Resumption::Abort)
        }
    }

    fn fix_build(&self, workdir: &Path, log_tail: &str) -> Result<Resumption> {
        ui::display_build_failure(log_tail);
        ui::display_status(&format!(
            "Starting {} in {}. Exit 0 to rebuild, non-zero to abort.",
            self.shell,
            workdir.display()
        ));
        let status = self
            .runner
            .run_interactive(&self.shell, &[] as &[&str], Some(workdir))?;
        if status.success() {
            Ok(Resumption::Continue)
        } else {
            Ok(Resumption::Abort)
        }
    }
}

/// Pre-programmed operator for tests.
///
/// Reviews continue and optionally append text to the draft. Fix-up answers
/// are taken from a queue; once it is empty the operator aborts.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    review: Option<Resumption>,
    append: Option<String>,
    fixes: RefCell<VecDeque<Resumption>>,
    drafts: RefCell<Vec<String>>,
    log_tails: RefCell<Vec<String>>,
}

impl ScriptedOperator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_review(mut self, resumption: Resumption) -> Self {
        self.review = Some(resumption);
        self
    }

    /// Text added at the end of every draft during review
    pub fn appending(mut self, text: impl Into<String>) -> Self {
        self.append = Some(text.into());
        self
    }

    pub fn push_fix(&self, resumption: Resumption) {
        self.fixes.borrow_mut().push_back(resumption);
    }

    /// Draft contents as they were handed over for review
    pub fn drafts(&self) -> Vec<String> {
        self.drafts.borrow().clone()
    }

    pub fn log_tails(&self) -> Vec<String> {
        self.log_tails.borrow().clone()
    }
}

impl Operator for ScriptedOperator {
    fn review_changelog(&self, draft: &Path) -> Result<Resumption> {
        let mut text = fs::read_to_string(draft)?;
        self.drafts.borrow_mut().push(text.clone());
        if let Some(extra) = &self.append {
            text.push_str(extra);
            fs::write(draft, text)?;
        }
        Ok(self.review.unwrap_or(Resumption::Continue))
    }

    fn fix_build(&self, _workdir: &Path, log_tail: &str) -> Result<Resumption> {
        self.log_tails.borrow_mut().push(log_tail.to_string());
        Ok(self
            .fixes
            .borrow_mut()
            .pop_front()
            .unwrap_or(Resumption::Abort))
    }
}

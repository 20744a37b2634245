//! Commit message to `.changes` entry conversion.
//!
//! Upstream release commits, as `git show` prints them, read
//!
//! ```text
//! talloc: version 2.3.1
//!
//!     * Fix leak in talloc_free (bug 14291)
//!
//! Signed-off-by: Someone <someone@samba.org>
//! ```
//!
//! which becomes
//!
//! ```text
//! - Update to 2.3.1
//!   + Fix leak in talloc_free (bso#14291)
//! ```

use crate::domain::version::{compare, Version};
use crate::error::{Result, UpdaterError};
use chrono::{DateTime, Utc};
use regex::{Captures, Regex};

/// Separator line that opens every block in a `.changes` file.
pub const BLOCK_SEPARATOR: &str =
    "-------------------------------------------------------------------";

/// Header timestamp layout used by `osc vc`.
const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S UTC %Y";

/// The line used for a release without a resolvable commit message.
pub fn update_line(version: &Version) -> String {
    format!("- Update to {}", version)
}

/// Changelog text contributed by one upstream release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub version: Version,
    pub lines: Vec<String>,
}

impl ChangelogEntry {
    /// Placeholder entry for an untagged release.
    pub fn synthetic(version: Version) -> Self {
        ChangelogEntry {
            version,
            lines: vec![update_line(&version)],
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Where the text of a [ChangelogEntry] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    /// Formatted from the tagged release commit
    Release,
    /// No tag for the version
    Untagged,
    /// The release commit had nothing left after formatting
    EmptyMessage,
}

/// Line filter turning a raw commit log into changelog lines.
#[derive(Debug, Clone)]
pub struct ChangelogFormatter {
    header: Regex,
    trailer: Option<Regex>,
    bug_url: Regex,
    bug_paren: Regex,
    bug_trailer: Regex,
}

impl ChangelogFormatter {
    /// Build a formatter for a bug tracker host and a set of trailer tokens
    /// (matched case-insensitively, with or without a `(<id>)` qualifier).
    pub fn new(bug_tracker_host: &str, trailer_tokens: &[String]) -> Result<Self> {
        let header = compile(r"^(?:commit [0-9a-f]{40}|Author:\s.*|Date:\s.*)\s*$")?;

        let trailer = if trailer_tokens.is_empty() {
            None
        } else {
            let alternation = trailer_tokens
                .iter()
                .map(|token| regex::escape(token.trim()))
                .collect::<Vec<_>>()
                .join("|");
            Some(compile(&format!(
                r"(?i)^\s*(?:{})(?:\([^)]*\))?\s*:",
                alternation
            ))?)
        };

        let url = format!(
            r"https?://{}/show_bug\.cgi\?id=(\d+)",
            regex::escape(bug_tracker_host)
        );
        let bug_url = compile(&format!(r"\({url}\)|{url}", url = url))?;
        let bug_paren = compile(r"(?i)\(bug\s*#?\s*(\d+)\)")?;
        let bug_trailer = compile(r"^\s*BUG:\s*(.*)$")?;

        Ok(ChangelogFormatter {
            header,
            trailer,
            bug_url,
            bug_paren,
            bug_trailer,
        })
    }

    /// Clean a raw commit log into changelog lines.
    pub fn format(&self, raw: &str, package: &str, version: &Version) -> Vec<String> {
        let announcement = format!("{}: version {}", package, version);
        let mut lines: Vec<String> = Vec::new();

        for line in raw.lines() {
            if line.trim().is_empty() || self.header.is_match(line) {
                continue;
            }
            if let Some(trailer) = &self.trailer {
                if trailer.is_match(line) {
                    continue;
                }
            }

            let line = self.rewrite_bug_references(line);
            let mut line = normalize_indent(&line);
            if line.trim() == announcement {
                line = update_line(version);
            }

            if let Some(caps) = self.bug_trailer.captures(&line) {
                let reference = caps[1].trim();
                if reference.is_empty() {
                    continue;
                }
                match lines.last_mut() {
                    Some(previous) => {
                        previous.push_str("; ");
                        previous.push_str(reference);
                    }
                    None => lines.push(reference.to_string()),
                }
                continue;
            }

            lines.push(line.trim_end().to_string());
        }

        lines
    }

    /// Entry for one candidate version; `raw` is `None` when no tag resolved.
    ///
    /// Falls back to the synthetic line when nothing survives formatting.
    pub fn entry(
        &self,
        raw: Option<&str>,
        package: &str,
        version: Version,
    ) -> (ChangelogEntry, EntryOrigin) {
        match raw {
            Some(raw) => {
                let lines = self.format(raw, package, &version);
                if lines.is_empty() {
                    (ChangelogEntry::synthetic(version), EntryOrigin::EmptyMessage)
                } else {
                    (ChangelogEntry { version, lines }, EntryOrigin::Release)
                }
            }
            None => (ChangelogEntry::synthetic(version), EntryOrigin::Untagged),
        }
    }

    fn rewrite_bug_references(&self, line: &str) -> String {
        let line = self.bug_url.replace_all(line, |caps: &Captures| {
            let id = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            format!("(bso#{})", id)
        });
        self.bug_paren
            .replace_all(&line, "(bso#$1)")
            .into_owned()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| UpdaterError::config(format!("Invalid changelog pattern: {}", e)))
}

/// Map upstream's nested bullets onto the `.changes` convention.
///
/// Only an exact four-space `* ` bullet or an exact six-space continuation
/// is rewritten, so deeper indentation passes through and the output
/// formats to itself.
fn normalize_indent(line: &str) -> String {
    if let Some(rest) = line.strip_prefix("    * ") {
        return format!("  + {}", rest);
    }
    match line.strip_prefix("      ") {
        Some(rest) if starts_content(rest) && !rest.starts_with("* ") => {
            format!("    {}", rest)
        }
        _ => line.to_string(),
    }
}

fn starts_content(rest: &str) -> bool {
    rest.chars().next().map_or(false, |c| !c.is_whitespace())
}

/// One aggregated, reviewable changelog block for a package update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogBlock {
    pub timestamp: DateTime<Utc>,
    pub identity: String,
    entries: Vec<ChangelogEntry>,
}

impl ChangelogBlock {
    /// Entries are reordered newest first.
    pub fn new(
        timestamp: DateTime<Utc>,
        identity: impl Into<String>,
        mut entries: Vec<ChangelogEntry>,
    ) -> Self {
        entries.sort_by(|a, b| compare(&b.version, &a.version));
        ChangelogBlock {
            timestamp,
            identity: identity.into(),
            entries,
        }
    }

    pub fn entries(&self) -> &[ChangelogEntry] {
        &self.entries
    }

    pub fn header(&self) -> String {
        format!(
            "{}\n{} - {}",
            BLOCK_SEPARATOR,
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.identity
        )
    }

    /// Text ready to be prepended to a `.changes` file.
    pub fn render(&self) -> String {
        let body = self
            .entries
            .iter()
            .map(ChangelogEntry::text)
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("{}\n\n{}\n\n", self.header(), body)
    }
}

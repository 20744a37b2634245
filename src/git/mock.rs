use crate::domain::TagRef;
use crate::error::{Result, UpdaterError};
use crate::git::{matches_pattern, SourceControl};
use std::collections::HashMap;

/// Mock upstream repository for testing without network or git operations
pub struct MockSourceControl {
    refs: Vec<TagRef>,
    commits: HashMap<String, String>,
    files: HashMap<(String, String), String>,
}

impl MockSourceControl {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockSourceControl {
            refs: Vec::new(),
            commits: HashMap::new(),
            files: HashMap::new(),
        }
    }

    /// Add a lightweight tag pointing straight at a commit
    pub fn add_tag(&mut self, name: &str, commit: &str) {
        self.refs
            .push(TagRef::new(format!("refs/tags/{}", name), commit));
    }

    /// Add an annotated tag: the tag object plus its peeled commit
    pub fn add_annotated_tag(&mut self, name: &str, tag_object: &str, commit: &str) {
        self.refs
            .push(TagRef::new(format!("refs/tags/{}", name), tag_object));
        self.refs
            .push(TagRef::new(format!("refs/tags/{}^{{}}", name), commit));
    }

    /// Register the rendered log text for a commit
    pub fn add_commit(&mut self, id: &str, text: impl Into<String>) {
        self.commits.insert(id.to_string(), text.into());
    }

    /// Register file contents at a reference
    pub fn add_file(&mut self, reference: &str, path: &str, content: impl Into<String>) {
        self.files
            .insert((reference.to_string(), path.to_string()), content.into());
    }
}

impl Default for MockSourceControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceControl for MockSourceControl {
    fn list_tag_refs(&self, pattern: &str) -> Result<Vec<TagRef>> {
        Ok(self
            .refs
            .iter()
            .filter(|r| matches_pattern(r.short_name(), pattern))
            .cloned()
            .collect())
    }

    fn show_commit(&self, id: &str) -> Result<String> {
        self.commits
            .get(id)
            .cloned()
            .ok_or_else(|| UpdaterError::command(format!("git show {}", id), "unknown revision"))
    }

    fn read_file(&self, reference: &str, path: &str) -> Result<Option<String>> {
        Ok(self
            .files
            .get(&(reference.to_string(), path.to_string()))
            .cloned())
    }
}

use crate::error::{Result, UpdaterError};
use crate::upstream::ReleaseIndex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

/// In-memory release index for tests
#[derive(Default)]
pub struct StaticReleaseIndex {
    listings: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    downloads: RefCell<Vec<String>>,
}

impl StaticReleaseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for the listing at `path`
    pub fn add_listing(&mut self, path: impl Into<String>, html: impl Into<String>) {
        self.listings
            .insert(path.into().trim_matches('/').to_string(), html.into());
    }

    /// Serve `content` for the file at `path`
    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files
            .insert(path.into().trim_matches('/').to_string(), content.into());
    }

    /// Paths downloaded so far, in order
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.borrow().clone()
    }
}

fn not_found(path: &str) -> UpdaterError {
    UpdaterError::from(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("404 Not Found: {}", path),
    ))
}

impl ReleaseIndex for StaticReleaseIndex {
    fn listing(&self, path: &str) -> Result<String> {
        self.listings
            .get(path.trim_matches('/'))
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    fn download(&self, path: &str, dest: &Path) -> Result<()> {
        let key = path.trim_matches('/');
        let content = self.files.get(key).ok_or_else(|| not_found(path))?;
        std::fs::write(dest, content)?;
        self.downloads.borrow_mut().push(key.to_string());
        Ok(())
    }
}

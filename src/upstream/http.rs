use crate::error::Result;
use crate::upstream::ReleaseIndex;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Release index served over HTTP(S), e.g. `https://download.samba.org/pub`
pub struct HttpReleaseIndex {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpReleaseIndex {
    /// Create a client for `base_url`. `timeout` of `None` waits indefinitely.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("samba-updater/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(HttpReleaseIndex {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// Join a base URL and a relative path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl ReleaseIndex for HttpReleaseIndex {
    fn listing(&self, path: &str) -> Result<String> {
        let url = self.url(&format!("{}/", path.trim_end_matches('/')));
        tracing::debug!(%url, "fetching release index");
        let body = self.client.get(&url).send()?.error_for_status()?.text()?;
        Ok(body)
    }

    fn download(&self, path: &str, dest: &Path) -> Result<()> {
        let url = self.url(path);
        tracing::info!(%url, dest = %dest.display(), "downloading");
        let mut response = self.client.get(&url).send()?.error_for_status()?;
        let mut file = File::create(dest)?;
        response.copy_to(&mut file)?;
        Ok(())
    }
}

use crate::domain::TagRef;
use crate::error::{Result, UpdaterError};
use crate::git::{matches_pattern, SourceControl};
use chrono::{DateTime, FixedOffset};
use git2::{AutotagOption, Direction, ErrorCode, FetchOptions, Oid, Remote, Repository};
use std::fs;
use std::path::Path;

const REMOTE_BRANCH_PREFIX: &str = "refs/remotes/upstream/";

/// Bare local mirror of the upstream repository.
///
/// Tag listings always come from the live remote; commits and trees are
/// fetched into the mirror on demand so repeated runs stay incremental.
pub struct Git2Mirror {
    repo: Repository,
    url: String,
}

impl Git2Mirror {
    /// Open the mirror at `path`, initialising an empty bare repository if needed
    pub fn open<P: AsRef<Path>>(path: P, url: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let repo = if path.join("HEAD").exists() {
            Repository::open_bare(path)?
        } else {
            fs::create_dir_all(path)?;
            Repository::init_bare(path)?
        };
        Ok(Git2Mirror {
            repo,
            url: url.into(),
        })
    }

    /// Create from an existing git2::Repository
    pub fn from_git2(repo: Repository, url: impl Into<String>) -> Self {
        Git2Mirror {
            repo,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Every reference the remote advertises, like `git ls-remote <url>`
    fn remote_refs(&self) -> Result<Vec<TagRef>> {
        let mut remote = Remote::create_detached(self.url.as_str())?;
        remote.connect(Direction::Fetch)?;
        let refs: Vec<TagRef> = remote
            .list()?
            .iter()
            .map(|head| TagRef::new(head.name(), head.oid().to_string()))
            .collect();
        remote.disconnect()?;
        Ok(refs)
    }

    fn fetch(&self, refspecs: &[String]) -> Result<()> {
        if refspecs.is_empty() {
            return Ok(());
        }
        tracing::debug!(url = %self.url, ?refspecs, "fetching into mirror");
        let mut remote = self.repo.remote_anonymous(&self.url)?;
        let mut options = FetchOptions::new();
        options.download_tags(AutotagOption::None);
        remote.fetch(refspecs, Some(&mut options), None)?;
        Ok(())
    }

    /// Fetch a branch or tag into the mirror and return the local ref name
    fn fetch_reference(&self, reference: &str) -> Result<String> {
        let branch = format!("refs/heads/{}", reference);
        let tag = format!("refs/tags/{}", reference);

        let refs = self.remote_refs()?;
        let local = if refs.iter().any(|r| r.name == branch) {
            self.fetch(&[format!(
                "+{}:{}{}",
                branch, REMOTE_BRANCH_PREFIX, reference
            )])?;
            format!("{}{}", REMOTE_BRANCH_PREFIX, reference)
        } else if refs.iter().any(|r| r.name == tag) {
            self.fetch(&[format!("+{}:{}", tag, tag)])?;
            tag
        } else {
            return Err(UpdaterError::config(format!(
                "Reference '{}' does not exist in {}",
                reference, self.url
            )));
        };
        Ok(local)
    }
}

impl SourceControl for Git2Mirror {
    fn list_tag_refs(&self, pattern: &str) -> Result<Vec<TagRef>> {
        let tags: Vec<TagRef> = self
            .remote_refs()?
            .into_iter()
            .filter(|r| r.name.starts_with("refs/tags/"))
            .filter(|r| matches_pattern(r.short_name(), pattern))
            .collect();

        // Bring the matching tags (and the commits behind them) into the mirror
        let refspecs: Vec<String> = tags
            .iter()
            .filter(|r| !r.is_peeled())
            .map(|r| format!("+{}:{}", r.name, r.name))
            .collect();
        self.fetch(&refspecs)?;

        tracing::debug!(pattern, count = tags.len(), "listed upstream tags");
        Ok(tags)
    }

    fn show_commit(&self, id: &str) -> Result<String> {
        let oid = Oid::from_str(id)?;
        let commit = self.repo.find_commit(oid).map_err(|e| {
            UpdaterError::command(format!("git show {}", id), e.message().to_string())
        })?;

        let author = commit.author();
        let when = commit.time();
        let date = FixedOffset::east_opt(when.offset_minutes() * 60)
            .zip(DateTime::from_timestamp(when.seconds(), 0))
            .map(|(offset, utc)| {
                utc.with_timezone(&offset)
                    .format("%a %b %e %H:%M:%S %Y %z")
                    .to_string()
            })
            .unwrap_or_else(|| when.seconds().to_string());

        Ok(format!(
            "commit {}\nAuthor: {} <{}>\nDate:   {}\n\n{}",
            commit.id(),
            author.name().unwrap_or("unknown"),
            author.email().unwrap_or(""),
            date,
            indent_message(commit.message().unwrap_or(""))
        ))
    }

    fn read_file(&self, reference: &str, path: &str) -> Result<Option<String>> {
        let local = self.fetch_reference(reference)?;
        let commit = self.repo.find_reference(&local)?.peel_to_commit()?;
        let tree = commit.tree()?;

        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let blob = entry.to_object(&self.repo)?.peel_to_blob()?;
        Ok(Some(String::from_utf8_lossy(blob.content()).into_owned()))
    }
}

/// Message body as `git show` prints it: four spaces before every
/// non-empty line.
fn indent_message(message: &str) -> String {
    message
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("    {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

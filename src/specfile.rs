use crate::domain::Version;
use crate::error::{Result, UpdaterError};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Locate the RPM spec file of `package` in a checkout.
///
/// `<package>.spec` wins; otherwise the first spec file by name, skipping
/// `*-man.spec` helpers.
pub fn find_spec_file(dir: &Path, package: &str) -> Result<PathBuf> {
    let preferred = dir.join(format!("{}.spec", package));
    if preferred.is_file() {
        return Ok(preferred);
    }

    let mut specs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(".spec") && !n.ends_with("-man.spec"))
                .unwrap_or(false)
        })
        .collect();
    specs.sort();

    specs.into_iter().next().ok_or_else(|| {
        UpdaterError::parse(format!("No spec file for {} in {}", package, dir.display()))
    })
}

/// Value of the `Version:` tag.
pub fn read_version(spec: &str) -> Result<Version> {
    let re = version_line()?;
    let caps = re
        .captures(spec)
        .ok_or_else(|| UpdaterError::parse("Spec file has no Version: tag"))?;
    Version::parse(&caps[2])
}

/// Replace the `Version:` value, but only where it is exactly `old`.
///
/// A spec where no `Version:` line reads `old` is a parse error, since
/// committing it would ship the stale version.
pub fn patch_version(spec: &str, old: &Version, new: &Version) -> Result<String> {
    let re = version_line()?;
    let old = old.to_string();
    let new = new.to_string();
    let mut replaced = 0;
    let patched = re
        .replace_all(spec, |caps: &regex::Captures| {
            if caps[2] == old {
                replaced += 1;
                format!("{}{}{}", &caps[1], new, &caps[3])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned();

    if replaced == 0 {
        return Err(UpdaterError::parse(format!(
            "No Version: line reads {} exactly; cannot update to {}",
            old, new
        )));
    }
    Ok(patched)
}

/// Point `%define`/`%global <package>_version` at `version`.
///
/// Dashes in package names become underscores in macro names.
pub fn patch_define(spec: &str, package: &str, version: &Version) -> Result<String> {
    let name = regex::escape(&package.replace('-', "_"));
    let re = Regex::new(&format!(
        r"(?m)^(%(?:define|global)\s+{}_version\s+)\S+([ \t]*)$",
        name
    ))
    .map_err(|e| UpdaterError::parse(e.to_string()))?;
    Ok(re
        .replace_all(spec, format!("${{1}}{}${{2}}", version).as_str())
        .into_owned())
}

fn version_line() -> Result<Regex> {
    Regex::new(r"(?m)^(Version:[ \t]*)(\S+)([ \t]*)$")
        .map_err(|e| UpdaterError::parse(e.to_string()))
}

/// Prepend a reviewed block to a `.changes` file, creating it if needed.
pub fn prepend_changes(path: &Path, block: &str) -> Result<()> {
    let existing = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };
    let mut text = block.to_string();
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&existing);
    fs::write(path, text)?;
    Ok(())
}

/// Release files of `version` present in the checkout, e.g. `talloc-2.3.0.tar.gz`.
pub fn release_files(dir: &Path, package: &str, version: &Version) -> Result<Vec<String>> {
    let prefix = format!("{}-{}.tar", package, version);
    let mut files: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name == &prefix || name.starts_with(&format!("{}.", prefix)))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = "\
Name:           ldb
Version:        2.1.1
Release:        0
%define talloc_version 2.3.0
%global tevent_version 0.10.1
Source0:        https://download.samba.org/pub/ldb/ldb-%{version}.tar.gz
";

    #[test]
    fn test_read_version() {
        assert_eq!(read_version(SPEC).unwrap(), Version::new(2, 1, 1));
        assert!(read_version("Name: ldb\n").unwrap_err().is_fatal());
        assert!(read_version("Version: 2.1\n").is_err());
    }

    #[test]
    fn test_patch_version_exact_match() {
        let patched =
            patch_version(SPEC, &Version::new(2, 1, 1), &Version::new(2, 1, 3)).unwrap();
        assert!(patched.contains("Version:        2.1.3\n"));
        assert!(patched.contains("Release:        0\n"));

    }

    #[test]
    fn test_patch_version_rejects_textual_mismatch() {
        let err = patch_version(SPEC, &Version::new(2, 0, 0), &Version::new(2, 1, 3)).unwrap_err();
        assert!(err.is_fatal());

        // Parses as 2.3.1 but does not read "2.3.1"
        let spec = "Name: talloc\nVersion: 2.03.1\n";
        assert_eq!(read_version(spec).unwrap(), Version::new(2, 3, 1));
        let err = patch_version(spec, &Version::new(2, 3, 1), &Version::new(2, 3, 2)).unwrap_err();
        assert!(err.to_string().contains("2.3.1"));
    }

    #[test]
    fn test_patch_define_and_global() {
        let spec = patch_define(SPEC, "talloc", &Version::new(2, 3, 1)).unwrap();
        let spec = patch_define(&spec, "tevent", &Version::new(0, 10, 2)).unwrap();
        assert!(spec.contains("%define talloc_version 2.3.1\n"));
        assert!(spec.contains("%global tevent_version 0.10.2\n"));
        assert!(spec.contains("Version:        2.1.1\n"));
    }

    #[test]
    fn test_patch_define_maps_dashes() {
        let spec = "%define samba_client_version 4.12.0\n";
        let patched = patch_define(spec, "samba-client", &Version::new(4, 12, 1)).unwrap();
        assert_eq!(patched, "%define samba_client_version 4.12.1\n");
    }

    #[test]
    fn test_find_spec_file_prefers_package_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a-helper.spec"), "").unwrap();
        fs::write(dir.path().join("samba.spec"), "").unwrap();
        fs::write(dir.path().join("samba-man.spec"), "").unwrap();

        let found = find_spec_file(dir.path(), "samba").unwrap();
        assert_eq!(found.file_name().unwrap(), "samba.spec");
    }

    #[test]
    fn test_find_spec_file_skips_man() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("samba-man.spec"), "").unwrap();
        fs::write(dir.path().join("samba-client.spec"), "").unwrap();

        let found = find_spec_file(dir.path(), "samba").unwrap();
        assert_eq!(found.file_name().unwrap(), "samba-client.spec");
    }

    #[test]
    fn test_find_spec_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("samba-man.spec"), "").unwrap();
        assert!(find_spec_file(dir.path(), "samba").is_err());
    }

    #[test]
    fn test_prepend_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talloc.changes");
        prepend_changes(&path, "new block\n\n").unwrap();
        prepend_changes(&path, "newer block\n\n").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "newer block\n\nnew block\n\n"
        );
    }

    #[test]
    fn test_release_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "talloc-2.3.0.tar.gz",
            "talloc-2.3.0.tar.asc",
            "talloc-2.3.01.tar.gz",
            "talloc.spec",
            "tdb-2.3.0.tar.gz",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let files = release_files(dir.path(), "talloc", &Version::new(2, 3, 0)).unwrap();
        assert_eq!(files, vec!["talloc-2.3.0.tar.asc", "talloc-2.3.0.tar.gz"]);
    }
}

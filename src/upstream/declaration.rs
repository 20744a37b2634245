use crate::domain::Version;
use crate::error::{Result, UpdaterError};
use regex::Regex;

/// How a package declares its version inside the upstream source tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationFormat {
    /// waf build script: `VERSION = '2.3.1'`
    Wscript,
    /// Samba's top-level `VERSION` file with `SAMBA_VERSION_*` assignments
    SambaVersionFile,
}

impl DeclarationFormat {
    pub fn for_path(path: &str) -> Self {
        if path.rsplit('/').next() == Some("wscript") {
            DeclarationFormat::Wscript
        } else {
            DeclarationFormat::SambaVersionFile
        }
    }
}

/// Read the declared version out of a declaration file's text.
pub fn parse_declaration(format: DeclarationFormat, text: &str) -> Result<Version> {
    match format {
        DeclarationFormat::Wscript => {
            let re = pattern(r#"(?m)^VERSION\s*=\s*['"]([^'"]+)['"]"#)?;
            let caps = re.captures(text).ok_or_else(|| {
                UpdaterError::parse("No VERSION assignment found in wscript")
            })?;
            Version::parse(caps[1].trim())
        }
        DeclarationFormat::SambaVersionFile => {
            let major = samba_component(text, "MAJOR")?;
            let minor = samba_component(text, "MINOR")?;
            let release = samba_component(text, "RELEASE")?;
            Version::parse(&format!("{}.{}.{}", major, minor, release))
        }
    }
}

fn samba_component(text: &str, name: &str) -> Result<String> {
    let re = pattern(&format!(r"(?m)^SAMBA_VERSION_{}=(\S+)", name))?;
    re.captures(text)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            UpdaterError::parse(format!("SAMBA_VERSION_{} missing from VERSION file", name))
        })
}

fn pattern(re: &str) -> Result<Regex> {
    Regex::new(re).map_err(|e| UpdaterError::config(format!("Invalid pattern: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_for_path() {
        assert_eq!(
            DeclarationFormat::for_path("lib/talloc/wscript"),
            DeclarationFormat::Wscript
        );
        assert_eq!(
            DeclarationFormat::for_path("VERSION"),
            DeclarationFormat::SambaVersionFile
        );
    }

    #[test]
    fn test_parse_wscript() {
        let text = "#!/usr/bin/env python\n\nAPPNAME = 'talloc'\nVERSION = '2.3.1'\n\nimport os\n";
        assert_eq!(
            parse_declaration(DeclarationFormat::Wscript, text).unwrap(),
            Version::new(2, 3, 1)
        );
    }

    #[test]
    fn test_parse_wscript_double_quotes() {
        let text = "VERSION = \"1.4.3\"\n";
        assert_eq!(
            parse_declaration(DeclarationFormat::Wscript, text).unwrap(),
            Version::new(1, 4, 3)
        );
    }

    #[test]
    fn test_wscript_ignores_indented_assignments() {
        let text = "def f():\n    VERSION = '9.9.9'\nVERSION = '0.10.2'\n";
        assert_eq!(
            parse_declaration(DeclarationFormat::Wscript, text).unwrap(),
            Version::new(0, 10, 2)
        );
    }

    #[test]
    fn test_missing_wscript_version_is_parse_error() {
        let err = parse_declaration(DeclarationFormat::Wscript, "APPNAME = 'x'\n").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_parse_samba_version_file() {
        let text = "########################################################\n# SAMBA Version                                        #\nSAMBA_VERSION_MAJOR=4\nSAMBA_VERSION_MINOR=12\nSAMBA_VERSION_RELEASE=3\n\nSAMBA_VERSION_IS_GIT_SNAPSHOT=no\n";
        assert_eq!(
            parse_declaration(DeclarationFormat::SambaVersionFile, text).unwrap(),
            Version::new(4, 12, 3)
        );
    }

    #[test]
    fn test_incomplete_samba_version_file() {
        let text = "SAMBA_VERSION_MAJOR=4\nSAMBA_VERSION_MINOR=12\n";
        let err = parse_declaration(DeclarationFormat::SambaVersionFile, text).unwrap_err();
        assert!(err.to_string().contains("RELEASE"));
    }
}

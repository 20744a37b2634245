//! Release signature verification
//!
//! Samba signs the uncompressed tarball, so the downloaded `.tar.gz` is
//! expanded to `.tar` first and `gpg --verify` is run against that.

use crate::error::{Result, UpdaterError};
use crate::process::CommandRunner;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

/// Checks a detached signature over a file
pub trait SignatureVerifier {
    /// Verify `signature` over `data`, optionally against a package keyring.
    fn verify(&self, data: &Path, signature: &Path, keyring: Option<&Path>) -> Result<()>;
}

/// Verifier shelling out to `gpg`
#[derive(Debug, Clone)]
pub struct GpgVerifier {
    program: String,
    runner: CommandRunner,
}

impl GpgVerifier {
    pub fn new(runner: CommandRunner) -> Self {
        GpgVerifier {
            program: "gpg".to_string(),
            runner,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for GpgVerifier {
    fn default() -> Self {
        Self::new(CommandRunner::default())
    }
}

impl SignatureVerifier for GpgVerifier {
    fn verify(&self, data: &Path, signature: &Path, keyring: Option<&Path>) -> Result<()> {
        let mut args: Vec<String> = Vec::new();
        if let Some(keyring) = keyring {
            args.push("--no-default-keyring".to_string());
            args.push("--keyring".to_string());
            args.push(keyring.to_string_lossy().into_owned());
        }
        args.push("--verify".to_string());
        args.push(signature.to_string_lossy().into_owned());
        args.push(data.to_string_lossy().into_owned());

        // gpg reports on stderr even when the signature is good
        let output = self.runner.run(&self.program, &args, None)?;
        if !output.success() {
            return Err(UpdaterError::verification(
                signature.display().to_string(),
                output.diagnostic().to_string(),
            ));
        }
        tracing::debug!(file = %data.display(), "signature ok");
        Ok(())
    }
}

/// Accepts every signature
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptingVerifier;

impl SignatureVerifier for AcceptingVerifier {
    fn verify(&self, _data: &Path, _signature: &Path, _keyring: Option<&Path>) -> Result<()> {
        Ok(())
    }
}

/// Rejects every signature
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectingVerifier;

impl SignatureVerifier for RejectingVerifier {
    fn verify(&self, _data: &Path, signature: &Path, _keyring: Option<&Path>) -> Result<()> {
        Err(UpdaterError::verification(
            signature.display().to_string(),
            "BAD signature",
        ))
    }
}

/// Decompress a gzip file.
pub fn gunzip(src: &Path, dest: &Path) -> Result<()> {
    let mut decoder = GzDecoder::new(BufReader::new(File::open(src)?));
    let mut out = BufWriter::new(File::create(dest)?);
    io::copy(&mut decoder, &mut out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs;
    use std::io::Write;

    #[test]
    fn test_gunzip() {
        let dir = tempfile::tempdir().unwrap();
        let gz = dir.path().join("talloc-2.3.1.tar.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(b"tar payload").unwrap();
        encoder.finish().unwrap();

        let tar = dir.path().join("talloc-2.3.1.tar");
        gunzip(&gz, &tar).unwrap();
        assert_eq!(fs::read(&tar).unwrap(), b"tar payload");
    }

    #[test]
    fn test_gunzip_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let gz = dir.path().join("broken.tar.gz");
        fs::write(&gz, "this is not gzip").unwrap();
        assert!(gunzip(&gz, &dir.path().join("broken.tar")).is_err());
    }

    #[test]
    fn test_doubles() {
        let p = Path::new("talloc-2.3.1.tar");
        let s = Path::new("talloc-2.3.1.tar.asc");
        assert!(AcceptingVerifier.verify(p, s, None).is_ok());
        let err = RejectingVerifier.verify(p, s, None).unwrap_err();
        assert!(matches!(err, UpdaterError::Verification { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_gpg_failure_is_verification_error() {
        let verifier = GpgVerifier::default().with_program("false");
        let dir = tempfile::tempdir().unwrap();
        let err = verifier
            .verify(&dir.path().join("a.tar"), &dir.path().join("a.tar.asc"), None)
            .unwrap_err();
        assert!(matches!(err, UpdaterError::Verification { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_gpg_success_ignores_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("gpg");
        fs::write(&script, "#!/bin/sh\necho 'gpg: Good signature' >&2\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let verifier = GpgVerifier::default().with_program(script.to_string_lossy());

        let keyring = dir.path().join("talloc.keyring");
        assert!(verifier
            .verify(&dir.path().join("a.tar"), &dir.path().join("a.tar.asc"), Some(&keyring))
            .is_ok());
    }
}

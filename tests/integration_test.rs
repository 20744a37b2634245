// tests/integration_test.rs
use std::process::Command;

fn updater() -> Command {
    Command::new(env!("CARGO_BIN_EXE_samba-updater"))
}

#[test]
fn test_samba_updater_help() {
    let output = updater()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("samba-updater"));
    assert!(stdout.contains("--apiurl"));
    assert!(stdout.contains("--dry-run"));
    assert!(stdout.contains("PROJECT"));
}

#[test]
fn test_samba_updater_version() {
    let output = updater()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_project_is_usage_error() {
    let output = updater().output().expect("Failed to execute command");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unknown_package_is_rejected() {
    let output = updater()
        .args([
            "--config",
            "tests/fixtures/config_custom.toml",
            "network:samba:STABLE",
            "openssl",
        ])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("openssl"));
}

#[test]
fn test_unreadable_config_is_rejected() {
    let output = updater()
        .args(["--config", "/nonexistent/samba-updater.toml", "network:samba:STABLE"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Error loading config"));
}

#[test]
fn test_config_loading_through_library() {
    use samba_updater::config::load_config;
    use std::path::Path;

    let config = load_config(Some(Path::new("tests/fixtures/config_custom.toml")))
        .expect("Should load fixture config");
    let names: Vec<&str> = config.packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["tdb", "samba"]);
}

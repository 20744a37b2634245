//! Pure formatting functions for UI output.
//!
//! Everything here prints and returns; nothing reads from the terminal.

use crate::boundary::BoundaryWarning;
use crate::cli::orchestration::{PackageOutcome, RunReport};
use crate::domain::Version;
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the operator.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Announce the start of one package's update.
pub fn display_package_header(package: &str) {
    println!("\n{}", style(format!("==> {}", package)).bold());
}

/// Show the packaged version, the ceiling and the versions that will be adopted.
pub fn display_candidates(
    package: &str,
    current: &Version,
    ceiling: &Version,
    candidates: &[Version],
) {
    println!(
        "  {} {} -> {}",
        style(package).cyan(),
        style(current).red(),
        style(ceiling).green()
    );
    let listed: Vec<String> = candidates.iter().map(Version::to_string).collect();
    println!("  Releases: {}", listed.join(", "));
}

/// Print a rendered changelog block (dry run or before review).
pub fn display_changelog(text: &str) {
    println!("\n{}", style("Changelog:").underlined());
    for line in text.lines() {
        println!("  {}", line);
    }
}

/// Show the tail of a failed build log.
pub fn display_build_failure(log_tail: &str) {
    eprintln!("{}", style("Build failed; last lines of the log:").red().bold());
    for line in log_tail.lines() {
        eprintln!("  {}", style(line).dim());
    }
}

/// One line per package plus a closing verdict.
pub fn display_run_summary(report: &RunReport) {
    println!("\n{}", style("Summary:").bold());
    for (package, outcome) in report.outcomes() {
        let (mark, text) = match outcome {
            PackageOutcome::Updated(v) => (style("✓").green(), format!("updated to {}", v)),
            PackageOutcome::DryRun(v) => (style("·").cyan(), format!("would update to {}", v)),
            PackageOutcome::NoUpdate => (style("·").dim(), "up to date".to_string()),
            PackageOutcome::Failed(reason) => (style("✗").red(), format!("failed: {}", reason)),
        };
        println!("  {} {:<10} {}", mark, package, text);
    }
    if report.aborted() {
        println!("  {}", style("Run aborted").red().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_error() {
        // Visual verification test - output is printed to stderr
        display_error("test error");
    }

    #[test]
    fn test_display_status_and_success() {
        display_status("test status");
        display_success("test success");
    }

    #[test]
    fn test_display_changelog() {
        display_changelog("- Update to 2.3.1\n  + Fix leak (bso#1)");
    }
}

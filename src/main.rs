use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use samba_updater::cli::{UpdateOptions, Updater};
use samba_updater::config::{self, Config};
use samba_updater::domain::ChangelogFormatter;
use samba_updater::git::Git2Mirror;
use samba_updater::obs::OscClient;
use samba_updater::operator::TerminalOperator;
use samba_updater::process::CommandRunner;
use samba_updater::ui;
use samba_updater::upstream::HttpReleaseIndex;
use samba_updater::verify::GpgVerifier;

#[derive(clap::Parser)]
#[command(
    name = "samba-updater",
    version,
    about = "Update the Samba packages of a build-service project to the latest upstream releases",
    long_about = "Branches each package into your home project, checks it out, \
                  builds a changelog from the upstream release commits, fetches and \
                  verifies the new sources, test builds and commits."
)]
struct Args {
    #[arg(help = "Build-service project to branch the packages from")]
    project: String,

    #[arg(help = "Packages to update, in this order (default: all configured)")]
    packages: Vec<String>,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short = 'A', long = "apiurl", help = "Build-service API URL or alias")]
    apiurl: Option<String>,

    #[arg(long, help = "Build-service login (default: ask the server)")]
    user: Option<String>,

    #[arg(long, help = "Upstream branch or tag that declares the target versions")]
    source_ref: Option<String>,

    #[arg(
        short,
        long,
        help = "Place package checkouts in this directory instead of a temp directory"
    )]
    output_dir: Option<PathBuf>,

    #[arg(long, help = "Print the changelog that would be written and stop")]
    dry_run: bool,

    #[arg(long, help = "Stop at the first package that fails")]
    fail_fast: bool,

    #[arg(short, long, help = "Show debug diagnostics")]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => apply_overrides(cfg, &args),
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    let packages = match config.select_packages(&args.packages) {
        Ok(packages) => packages,
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    };

    let runner = CommandRunner::with_timeout_secs(config.behavior.command_timeout_secs);
    let build_runner = CommandRunner::with_timeout_secs(config.build.timeout_secs);

    let mirror_dir = config.upstream.mirror_dir();
    ui::display_status(&format!("Using upstream mirror {}", mirror_dir.display()));
    let scm = Git2Mirror::open(&mirror_dir, &config.upstream.git_url)
        .with_context(|| format!("Cannot open upstream mirror at {}", mirror_dir.display()))?;

    let index = HttpReleaseIndex::new(
        &config.upstream.release_index_url,
        config.behavior.command_timeout_secs.map(Duration::from_secs),
    )?;
    let build_service = OscClient::new(
        &config.api_url,
        &config.build.repository,
        &config.build.arch,
    )
    .with_runners(runner.clone(), build_runner);
    let verifier = GpgVerifier::new(runner);
    let operator = TerminalOperator::new(config.behavior.editor.as_deref());
    let formatter = ChangelogFormatter::new(
        &config.upstream.bug_tracker_host,
        &config.changelog.trailer_tokens,
    )?;

    let options = UpdateOptions {
        project: args.project.clone(),
        user: config.user.clone(),
        email: config.email.clone(),
        source_ref: config.upstream.source_ref.clone(),
        output_dir: args.output_dir.clone(),
        dry_run: args.dry_run,
        fail_fast: config.behavior.fail_fast,
    };

    let updater = Updater::new(
        &scm,
        &index,
        &build_service,
        &verifier,
        &operator,
        formatter,
        options,
    );
    let report = updater.run(&packages)?;

    ui::display_run_summary(&report);
    if !report.success() {
        std::process::exit(1);
    }
    Ok(())
}

/// `--verbose` raises the default filter; `RUST_LOG` wins over both.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_overrides(mut config: Config, args: &Args) -> Config {
    if let Some(api) = &args.apiurl {
        config.api_url = api.clone();
    }
    if let Some(user) = &args.user {
        config.user = Some(user.clone());
    }
    if let Some(reference) = &args.source_ref {
        config.upstream.source_ref = reference.clone();
    }
    if args.fail_fast {
        config.behavior.fail_fast = true;
    }
    config
}

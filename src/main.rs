//! `release-workspace` CLI entrypoint.
//!
//! Wires the production collaborators (git CLI, object storage, SPDX
//! downloader, tar.gz extractor) into the stage and release pipelines.

use camino::Utf8Path;
use clap::Parser;
use release_workspace::cli::{Cli, Command};
use release_workspace::config::{Config, ConfigError};
use release_workspace::exec::SystemCommandExecutor;
use release_workspace::license::{SpdxDownloaderFactory, UreqClient};
use release_workspace::object::object_store_for;
use release_workspace::{
    GitCli, TarGzExtractor, WorkspaceError, WorkspaceReleaser, WorkspaceStager, logging,
};
use std::io::Write;

/// Failure of a CLI run.
#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    if let Err(err) = logging::init(cli.verbose, cli.quiet) {
        write_stderr_line(&mut stderr, format!("failed to install logger: {err}"));
    }
    let run_result = run(&cli);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let config = Config::load(cli.config.as_deref())?;
    let executor = SystemCommandExecutor::new(config.command_timeout());
    let git = GitCli::new(&executor, &config.repository.remote);

    match &cli.command {
        Command::Stage { directory } => run_stage(&config, &git, directory),
        Command::Release {
            directory,
            build_version,
            bucket,
        } => {
            let store = object_store_for(bucket, &executor);
            let extractor = TarGzExtractor;
            let mut releaser = WorkspaceReleaser::new(
                config.repository.clone(),
                config.staging.clone(),
                &git,
                &*store,
                &extractor,
            );
            if let Some(root) = &config.temp_root {
                releaser = releaser.with_temp_root(root.as_std_path());
            }
            let report = releaser.prepare_release(directory, build_version, bucket)?;
            log::info!(
                "Release workspace ready: {} extracted to {}",
                report.archive_key,
                report.extracted_to
            );
            Ok(())
        }
    }
}

fn run_stage(config: &Config, git: &GitCli<'_>, directory: &Utf8Path) -> Result<(), RunError> {
    let factory = SpdxDownloaderFactory::new(UreqClient);
    let stager = WorkspaceStager::new(
        config.repository.clone(),
        config.licenses.clone(),
        git,
        &factory,
    );
    let report = stager.prepare_stage(directory)?;
    log::info!(
        "Stage workspace ready at {} with {} cached licenses",
        report.checkout.root(),
        report.licenses
    );
    Ok(())
}

fn exit_code_for_run_result(result: Result<(), RunError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            // Error messages already embed their cause.
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

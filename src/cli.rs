//! CLI argument definitions for the `release-workspace` binary.
//!
//! Kept separate from the entrypoint so argument parsing can be unit tested.

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand};

/// Prepare source workspaces for the stage and release phases.
#[derive(Parser, Debug)]
#[command(name = "release-workspace")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Clone the sources and prewarm the license cache:\n",
    "    $ release-workspace stage --directory /work/src/k8s.io/kubernetes\n\n",
    "  Unpack staged sources and authenticate the push remote:\n",
    "    $ GITHUB_TOKEN=... release-workspace release \\\n",
    "        --directory /work/src/k8s.io/kubernetes \\\n",
    "        --build-version v1.30.0 --bucket gs://release-bucket\n",
))]
pub struct Cli {
    /// Configuration file [default: platform config directory].
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeat for more detail).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Phase to prepare.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Clone the source checkout and prewarm the license cache.
    Stage {
        /// Workspace directory that holds (or will hold) the checkout.
        #[arg(short, long, value_name = "DIR")]
        directory: Utf8PathBuf,
    },

    /// Extract staged sources and re-authenticate the checkout's remote.
    Release {
        /// Workspace directory that holds the checkout.
        #[arg(short, long, value_name = "DIR")]
        directory: Utf8PathBuf,

        /// Build version whose staged sources are fetched.
        #[arg(long, value_name = "VERSION")]
        build_version: String,

        /// Bucket holding staged builds (`gs://...`, bare name, or local path).
        #[arg(long, value_name = "BUCKET")]
        bucket: String,
    },
}

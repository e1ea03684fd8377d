use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pbipgen",
    about = "Generate Power BI project variants from a template and a CSV of parameters",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate one project per data row
    Generate {
        /// Template folder, or a template name under templates/
        #[arg(short, long)]
        template: String,

        /// Parameter configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Parameter values, one row per project (CSV)
        #[arg(short, long)]
        data: PathBuf,

        /// Where generated projects go
        #[arg(short, long = "output-dir")]
        output_dir: Option<PathBuf>,

        /// Show detailed progress
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check a template, config and data file without generating anything
    Validate {
        #[arg(short, long)]
        template: String,

        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the parameters a template defines
    Params {
        /// Template folder, or a template name under templates/
        template: String,
    },

    /// List templates, configs and data files in a workspace
    List {
        /// Workspace root (default: current directory)
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

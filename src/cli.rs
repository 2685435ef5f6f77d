use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "gitdrop")]
#[command(about = "Host files in a GitHub repository", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Personal access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the account the token belongs to
    Whoami,
    /// List folders
    Folders {
        /// Only show folders whose name contains this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Create a folder
    CreateFolder { name: String },
    /// Delete a folder and everything in it
    DeleteFolder { name: String },
    /// List files in a folder (the default folder if omitted)
    Files { folder: Option<String> },
    /// Upload files into a folder
    Upload {
        folder: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete a file
    DeleteFile {
        folder: String,
        name: String,
        /// Version token (sha) from the file listing
        sha: String,
    },
    /// Print the public URL of a file
    Url { folder: String, name: String },
}

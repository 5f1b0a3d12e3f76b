use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "voxsync")]
#[command(about = "Pull transcribed voice uploads into a markdown vault")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with an emailed one-time code
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Run a single sync pass
    Sync,
    /// Sync on a schedule until interrupted, prompting for login when needed
    Watch,
    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Request a one-time code for an email address
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
    },
    /// Exchange the emailed code for a session token
    Verify {
        /// Code from the email
        #[arg(long, value_name = "CODE")]
        code: String,
    },
    /// Show whether a session token is stored
    Status,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the settings file (tokens redacted)
    Show,
    /// Change a single setting
    Set {
        #[arg(value_enum)]
        key: SettingKey,
        value: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SettingKey {
    BaseUrl,
    VaultPath,
    CombinedNotePath,
    CreateSeparateNotes,
    SyncInterval,
    RequestTimeout,
}

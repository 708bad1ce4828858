use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slidecast")]
#[command(author, version, about)]
#[command(long_about = "A slide deck player.\n\n\
    Reads slides from a JSON or YAML file and presents them with transitions,\n\
    thumbnails, speaker notes and optional narration.\n\n\
    Examples:\n  \
    slidecast slides.json              Launch presentation (fullscreen)\n  \
    slidecast slides.json --windowed   Launch in a window\n  \
    slidecast check slides.json        List slides and missing assets")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Slide file to present (.json, .yaml or .yml)
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Launch in a window instead of fullscreen
    #[arg(long, global = false)]
    pub windowed: bool,

    /// Start on a specific slide (1-indexed)
    #[arg(long, global = false)]
    pub slide: Option<usize>,

    /// Keep preferences in memory only for this run
    #[arg(long, global = false)]
    pub ephemeral: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List a deck's slides and report missing assets
    Check {
        /// Slide file to check
        file: PathBuf,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. defaults.asset_dir, defaults.language)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    /// Log filter for `-v`/`-q`, used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }

    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Check { file }) => {
                if !file.exists() {
                    anyhow::bail!("File not found: {}", file.display());
                }
                crate::commands::check::run(&file)
            }
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                println!("slidecast {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            None => {
                if let Some(file) = self.file {
                    if !file.exists() {
                        anyhow::bail!("File not found: {}", file.display());
                    }
                    crate::app::run(file, self.windowed, self.slide, self.ephemeral)
                } else {
                    use clap::CommandFactory;
                    let mut cmd = Self::command();
                    cmd.print_help()?;
                    println!();
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_presentation_flags() {
        let cli = Cli::parse_from(["slidecast", "deck.json", "--windowed", "--slide", "4"]);
        assert_eq!(cli.file, Some(PathBuf::from("deck.json")));
        assert!(cli.windowed);
        assert_eq!(cli.slide, Some(4));
        assert!(!cli.ephemeral);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_subcommand() {
        let cli = Cli::parse_from(["slidecast", "config", "set", "defaults.language", "de-DE"]);
        match cli.command {
            Some(Commands::Config {
                command: ConfigCommands::Set { key, value },
            }) => {
                assert_eq!(key, "defaults.language");
                assert_eq!(value, "de-DE");
            }
            _ => panic!("expected config set"),
        }
    }

    #[test]
    fn test_log_level() {
        assert_eq!(Cli::parse_from(["slidecast"]).log_level(), "warn");
        assert_eq!(Cli::parse_from(["slidecast", "-v"]).log_level(), "debug");
        assert_eq!(Cli::parse_from(["slidecast", "-vv"]).log_level(), "trace");
        assert_eq!(Cli::parse_from(["slidecast", "-q", "-vv"]).log_level(), "error");
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

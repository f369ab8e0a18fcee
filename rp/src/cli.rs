//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// romplan - structured plan generation
#[derive(Parser)]
#[command(
    name = "rp",
    about = "Turn a free-text need into a phased execution plan",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a plan for a need and record the request
    Generate {
        /// What the plan should achieve
        need: String,

        /// Reference to an uploaded file that accompanies the need
        #[arg(short, long)]
        file: Option<String>,

        /// User id (defaults to $USER)
        #[arg(short, long)]
        user: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the fallback plan for a need without calling any backend
    Fallback {
        need: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// List a user's requests, newest first
    Requests {
        /// User id (defaults to $USER)
        #[arg(short, long)]
        user: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one request and its plan
    Show {
        /// Request id
        id: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Replace a complete request's plan with an edited JSON plan
    Edit {
        /// Request id
        id: String,

        /// File with the edited plan; reads stdin when absent
        path: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Extract JSON from raw model text (file or stdin)
    Extract {
        /// File with model output; reads stdin when absent
        path: Option<PathBuf>,

        /// Look for a JSON array instead of a plan object
        #[arg(long)]
        array: bool,
    },
}

/// Output format for plan and request commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

/// User id from the flag, else `$USER`, else "local"
pub fn resolve_user(flag: Option<&str>) -> String {
    debug!(?flag, "resolve_user: called");
    flag.map(str::to_string)
        .or_else(|| std::env::var("USER").ok())
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| "local".to_string())
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("romplan")
        .join("logs")
        .join("romplan.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_generate() {
        let cli = Cli::parse_from(["rp", "generate", "Grow my B2B sales pipeline", "--file", "leads.csv"]);
        match cli.command {
            Command::Generate {
                need,
                file,
                user,
                format,
            } => {
                assert_eq!(need, "Grow my B2B sales pipeline");
                assert_eq!(file.as_deref(), Some("leads.csv"));
                assert!(user.is_none());
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_fallback_json() {
        let cli = Cli::parse_from(["rp", "fallback", "Hire", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Command::Fallback {
                format: OutputFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn test_cli_parse_extract_array() {
        let cli = Cli::parse_from(["rp", "extract", "--array"]);
        assert!(matches!(cli.command, Command::Extract { path: None, array: true }));
    }

    #[test]
    fn test_cli_parse_edit() {
        let cli = Cli::parse_from(["rp", "edit", "0192abc", "plan.json", "--format", "json"]);
        match cli.command {
            Command::Edit { id, path, format } => {
                assert_eq!(id, "0192abc");
                assert_eq!(path, Some(PathBuf::from("plan.json")));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["rp", "requests", "--log-level", "debug", "-c", "rp.yml"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("rp.yml")));
    }

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["rp"]).is_err());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_resolve_user_prefers_flag() {
        assert_eq!(resolve_user(Some("alice")), "alice");
        assert!(!resolve_user(None).is_empty());
    }
}

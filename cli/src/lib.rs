//! `hrlog`: append records to handlereg log files from the shell

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use handlereg::logman::{FixedLogDir, LogConfig, LogError, LogManager, Severity};

/// Write records to named log files
#[derive(Parser, Debug)]
#[command(name = "hrlog", version, about)]
pub struct Cli {
    /// Log directory; defaults to $HANDLEREG_LOG_DIR
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Longest line of a wrapped message, in characters
    #[arg(long, global = true)]
    pub width: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Append one record to a log
    Write {
        name: String,

        /// Error, warning, status, info or debug (or E/W/S/I/D)
        #[arg(short, long, default_value = "info")]
        severity: Severity,

        /// Open the log for the whole run instead of just for the record
        #[arg(long)]
        keep_open: bool,

        /// Message words; none writes an empty record
        message: Vec<String>,
    },
    /// Print the path of a log file
    Path { name: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Log(#[from] LogError),

    #[error("output: {0}")]
    Output(#[from] std::io::Error),
}

impl Cli {
    /// Log settings from the environment, overridden by the flags
    #[must_use]
    pub fn config(&self) -> LogConfig {
        let mut config = LogConfig::from_env();
        if let Some(dir) = &self.dir {
            config.dir = Box::new(FixedLogDir(dir.clone()));
        }
        if let Some(width) = self.width {
            config = config.line_width(width);
        }
        config
    }
}

/// Execute the parsed command, printing any result to `out`
///
/// # Errors
/// Log manager failures, or failing to write to `out`.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<(), CliError> {
    let logs = LogManager::new(cli.config());
    match &cli.command {
        Command::Write {
            name,
            severity,
            keep_open,
            message,
        } => {
            let text = message.join(" ");
            let text = (!message.is_empty()).then_some(text.as_str());
            if *keep_open {
                logs.open(name, logs.config().default_mode)?;
                logs.write(name, *severity, text)?;
            } else {
                logs.write_with_autoopen(name, *severity, text)?;
            }
            tracing::debug!(log = %name, %severity, "record written");
            logs.close_all()?;
        }
        Command::Path { name } => {
            let path = logs.resolve_path(name)?;
            writeln!(out, "{}", path.display())?;
        }
    }
    Ok(())
}

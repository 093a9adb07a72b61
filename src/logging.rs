//! Process logger configured from [`LoggingConfig`].
use std::fs::OpenOptions;
use std::io::Write;

use env_logger::{Builder, Env, Target};

use crate::models::config::LoggingConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("logging output is `file` but no output_file is set")]
    MissingOutputFile,
    #[error("failed to open log file {path}")]
    OpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("logger already initialized")]
    AlreadyInitialized(#[from] log::SetLoggerError),
}

/// Where log lines are written, resolved from `output`/`output_file`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    /// Also used for an empty or unknown `output`.
    Stderr,
    File(String),
}

impl LogOutput {
    pub fn from_config(config: &LoggingConfig) -> Result<Self, LoggingError> {
        match config.output.as_str() {
            "stdout" => Ok(Self::Stdout),
            "file" if config.output_file.is_empty() => Err(LoggingError::MissingOutputFile),
            "file" => Ok(Self::File(config.output_file.clone())),
            _ => Ok(Self::Stderr),
        }
    }

    fn target(&self) -> Result<Target, LoggingError> {
        match self {
            Self::Stdout => Ok(Target::Stdout),
            Self::Stderr => Ok(Target::Stderr),
            Self::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| LoggingError::OpenFile {
                        path: path.clone(),
                        source,
                    })?;
                Ok(Target::Pipe(Box::new(file)))
            }
        }
    }
}

/// Build an `env_logger` builder for the given settings. `RUST_LOG` still
/// takes precedence over `level`.
pub fn builder(config: &LoggingConfig) -> Result<Builder, LoggingError> {
    let level = if config.level.is_empty() {
        "info"
    } else {
        config.level.as_str()
    };
    let mut builder = Builder::from_env(Env::default().default_filter_or(level));
    builder.target(LogOutput::from_config(config)?.target()?);

    if config.format == "json" {
        let version = config.version;
        builder.format(move |buf, record| {
            let line = serde_json::json!({
                "time": buf.timestamp().to_string(),
                "level": record.level().as_str(),
                "target": record.target(),
                "msg": record.args().to_string(),
                "version": version,
            });
            writeln!(buf, "{line}")
        });
    }

    Ok(builder)
}

pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    builder(config)?.try_init()?;
    Ok(())
}

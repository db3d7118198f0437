use crate::artifact::CodeUsage;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Reading {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Writing {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parsing config file {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    #[error("No configuration found for server {}", _0)]
    UnknownServer(String),

    /// Uploading an empty bundle would wipe the branch.
    #[error("No modules found in {}", _0.display())]
    EmptyBundle(PathBuf),

    #[error("Text module {} is not valid UTF-8", path.display())]
    NotUtf8 {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Code size limit exceeded: {}", _0)]
    SizeLimitExceeded(CodeUsage),

    #[error("Writing upload payload to {}", path.display())]
    Payload {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}

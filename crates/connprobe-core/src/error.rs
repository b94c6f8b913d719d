use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Config file not found at {}", .0.display())]
    ConfigMissing(PathBuf),

    #[error("Cannot read config file {}: {source}", path.display())]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing required MongoDB connection parameters: {}", missing.join(", "))]
    RequiredFieldsMissing { missing: Vec<String> },

    #[error("Connection failed: {0}")]
    ConnectivityFailure(#[source] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigurationInvalid(#[source] anyhow::Error),

    #[error("Authentication failed: {0}")]
    AuthenticationFailure(#[source] anyhow::Error),

    #[error("Unexpected error: {0}")]
    UnexpectedFailure(#[source] anyhow::Error),
}

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Category a terminal error is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    MissingFile,
    UnreadableFile,
    MissingFields,
    Connectivity,
    Configuration,
    Authentication,
    Unexpected,
}

impl Diagnosis {
    /// Likely causes shown to the operator, most common first.
    pub fn causes(&self) -> &'static [&'static str] {
        match self {
            Self::MissingFile => &[
                "Run the probe from the directory that holds your .env file",
                "Pass the file explicitly with --env-file",
            ],
            Self::UnreadableFile => &[
                "Check the file permissions",
                "Make sure the path points to a regular text file",
            ],
            Self::MissingFields => &[
                "Set MONGODB_URI, or",
                "Set MONGODB_USERNAME, MONGODB_PASSWORD and MONGODB_CLUSTER_HOST",
            ],
            Self::Connectivity => &[
                "Check your internet connection",
                "Verify MongoDB cluster is running",
                "Check firewall settings and the cluster IP access list",
            ],
            Self::Configuration => &[
                "Invalid connection string format",
                "Wrong cluster hostname",
            ],
            Self::Authentication => &[
                "Wrong username or password",
                "User doesn't have required permissions",
                "Database name is incorrect",
            ],
            Self::Unexpected => &[
                "Driver and server versions may be incompatible",
                "The server may have returned a transient error; try again",
            ],
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFile => write!(f, "missing config file"),
            Self::UnreadableFile => write!(f, "unreadable config file"),
            Self::MissingFields => write!(f, "missing connection fields"),
            Self::Connectivity => write!(f, "connectivity"),
            Self::Configuration => write!(f, "configuration"),
            Self::Authentication => write!(f, "authentication"),
            Self::Unexpected => write!(f, "unexpected"),
        }
    }
}

impl ProbeError {
    pub fn diagnosis(&self) -> Diagnosis {
        match self {
            Self::ConfigMissing(_) => Diagnosis::MissingFile,
            Self::ConfigUnreadable { .. } => Diagnosis::UnreadableFile,
            Self::RequiredFieldsMissing { .. } => Diagnosis::MissingFields,
            Self::ConnectivityFailure(_) => Diagnosis::Connectivity,
            Self::ConfigurationInvalid(_) => Diagnosis::Configuration,
            Self::AuthenticationFailure(_) => Diagnosis::Authentication,
            Self::UnexpectedFailure(_) => Diagnosis::Unexpected,
        }
    }
}

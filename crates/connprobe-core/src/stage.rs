use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProbeError;

/// Steps of a probe run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStage {
    Building,
    Connecting,
    ServerCheck,
    DbAccess,
    WriteProbe,
    ReadProbe,
    DeleteProbe,
    Success,
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => write!(f, "building"),
            Self::Connecting => write!(f, "connecting"),
            Self::ServerCheck => write!(f, "server-check"),
            Self::DbAccess => write!(f, "db-access"),
            Self::WriteProbe => write!(f, "write-probe"),
            Self::ReadProbe => write!(f, "read-probe"),
            Self::DeleteProbe => write!(f, "delete-probe"),
            Self::Success => write!(f, "success"),
        }
    }
}

/// Terminal failure of a run, tagged with the stage it stopped at.
#[derive(Debug)]
pub struct ProbeFailure {
    pub stage: ProbeStage,
    pub error: ProbeError,
}

impl ProbeFailure {
    pub fn new(stage: ProbeStage, error: ProbeError) -> Self {
        Self { stage, error }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (during {})", self.error, self.stage)
    }
}

impl std::error::Error for ProbeFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Errors raised before any connection attempt belong to `Building`.
impl From<ProbeError> for ProbeFailure {
    fn from(error: ProbeError) -> Self {
        Self::new(ProbeStage::Building, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered() {
        assert!(ProbeStage::Building < ProbeStage::Connecting);
        assert!(ProbeStage::ReadProbe < ProbeStage::DeleteProbe);
        assert_eq!(ProbeStage::ServerCheck.to_string(), "server-check");
    }

    #[test]
    fn failure_display_names_stage() {
        let failure = ProbeFailure::new(
            ProbeStage::Connecting,
            ProbeError::ConnectivityFailure(anyhow::anyhow!("no servers")),
        );
        assert_eq!(
            failure.to_string(),
            "Connection failed: no servers (during connecting)"
        );
    }
}

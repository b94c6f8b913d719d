use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::descriptor::UriSource;
use crate::stage::ProbeStage;

/// Record of a single probe stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: ProbeStage,
    pub success: bool,
    #[serde(serialize_with = "as_millis")]
    pub duration: Duration,
    pub note: Option<String>,
}

/// Summary of a successful probe run.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub run_id: Uuid,
    pub masked_uri: String,
    pub source: UriSource,
    pub database: String,
    pub collection: String,

    pub server_version: String,
    pub collections: Vec<String>,
    pub probe_id: Option<String>,
    /// False when the inserted document could not be read back.
    pub read_back: bool,

    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(serialize_with = "as_millis")]
    pub total_duration: Duration,

    pub stages: Vec<StageRecord>,
}

fn as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else {
        format!("{}.{}s", d.as_secs(), d.subsec_millis() / 100)
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bar = "=".repeat(72);
        let thin = "-".repeat(72);

        writeln!(f, "\n{bar}")?;
        writeln!(f, "  CONNECTION PROBE REPORT")?;
        writeln!(f, "{bar}\n")?;

        writeln!(f, "  Run:        {}", self.run_id)?;
        writeln!(f, "  URI:        {}", self.masked_uri)?;
        writeln!(f, "  Source:     {}", self.source)?;
        writeln!(f, "  Database:   {}", self.database)?;
        writeln!(f, "  Collection: {}", self.collection)?;
        writeln!(f, "  Server:     {}", self.server_version)?;

        writeln!(f, "\n{thin}")?;
        writeln!(f, "  COLLECTIONS ({})", self.collections.len())?;
        writeln!(f, "{thin}\n")?;
        if self.collections.is_empty() {
            writeln!(f, "  (none)")?;
        } else {
            for name in &self.collections {
                writeln!(f, "  {name}")?;
            }
        }

        writeln!(f, "\n{thin}")?;
        writeln!(f, "  STAGES ({})", self.stages.len())?;
        writeln!(f, "{thin}\n")?;
        writeln!(
            f,
            "  {:<4} {:<15} {:<10} {}",
            "#", "STAGE", "RESULT", "DURATION"
        )?;
        for (i, s) in self.stages.iter().enumerate() {
            let result = if s.success { "OK" } else { "WARN" };
            writeln!(
                f,
                "  {:<4} {:<15} {:<10} {}",
                i + 1,
                s.stage.to_string(),
                result,
                format_duration(s.duration)
            )?;
            if let Some(ref note) = s.note {
                writeln!(f, "       -> {note}")?;
            }
        }

        writeln!(f, "\n{thin}")?;
        writeln!(f, "  TIMELINE")?;
        writeln!(f, "{thin}\n")?;
        writeln!(
            f,
            "  Started:    {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(
            f,
            "  Completed:  {}",
            self.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "  Total:      {}", format_duration(self.total_duration))?;

        writeln!(f, "\n{bar}")?;

        Ok(())
    }
}

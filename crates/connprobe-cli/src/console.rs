use async_trait::async_trait;
use serde_json::json;

use connprobe_core::descriptor::REQUIRED_FIELDS;
use connprobe_core::error::ProbeError;
use connprobe_core::event::{EventSink, ProbeEvent};
use connprobe_core::stage::{ProbeFailure, ProbeStage};

/// Prints human-readable progress lines to stdout.
pub struct ConsoleEventSink;

#[async_trait]
impl EventSink for ConsoleEventSink {
    async fn emit(&self, event: ProbeEvent) {
        if let Some(line) = render(&event) {
            println!("{line}");
        }
    }
}

pub fn render(event: &ProbeEvent) -> Option<String> {
    let line = match event {
        ProbeEvent::StageEntered { stage } => match stage {
            ProbeStage::Connecting => "\n🔌 Attempting to connect to MongoDB...".to_string(),
            ProbeStage::ServerCheck => "📡 Testing server connection...".to_string(),
            ProbeStage::WriteProbe => "\n🧪 Testing database operations...".to_string(),
            _ => return None,
        },
        ProbeEvent::ServerInfo { version } => {
            format!("✅ Successfully connected to MongoDB!\n📋 Server version: {version}")
        }
        ProbeEvent::CollectionsListed {
            database,
            collections,
        } => format!(
            "\n📁 Testing database access: {database}\n📄 Found {} collections: {:?}",
            collections.len(),
            collections
        ),
        ProbeEvent::ProbeInserted { id } => {
            format!("✅ Insert test successful. Document ID: {id}")
        }
        ProbeEvent::ProbeRead { document, .. } => {
            format!("✅ Read test successful. Found document: {document}")
        }
        ProbeEvent::ProbeNotFound { id } => {
            format!("⚠️  Read test: document {id} not found")
        }
        ProbeEvent::ProbeDeleted { .. } => "✅ Delete test successful.".to_string(),
        ProbeEvent::Completed { .. } => {
            "\n🎉 All tests passed! MongoDB connection is working correctly.".to_string()
        }
        ProbeEvent::Started { .. } | ProbeEvent::Failed { .. } => return None,
    };
    Some(line)
}

/// Diagnosis block for a failed run: the error, a field checklist when
/// fields are missing, then the likely causes.
pub fn failure_lines(failure: &ProbeFailure) -> Vec<String> {
    let mut lines = vec![format!("❌ {}", failure.error)];

    if let ProbeError::RequiredFieldsMissing { missing } = &failure.error {
        for key in REQUIRED_FIELDS {
            let mark = if missing.iter().any(|m| m == key) {
                "❌"
            } else {
                "✅"
            };
            lines.push(format!("   - {key}: {mark}"));
        }
    }

    lines.push("💡 Possible issues:".to_string());
    for cause in failure.error.diagnosis().causes() {
        lines.push(format!("   - {cause}"));
    }
    lines
}

pub fn failure_json(failure: &ProbeFailure) -> serde_json::Value {
    let diagnosis = failure.error.diagnosis();
    json!({
        "status": "failed",
        "stage": failure.stage,
        "diagnosis": diagnosis,
        "error": failure.error.to_string(),
        "causes": diagnosis.causes(),
    })
}

pub fn print_failure(failure: &ProbeFailure, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&failure_json(failure))?);
    } else {
        for line in failure_lines(failure) {
            println!("{line}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use connprobe_core::error::Diagnosis;

    #[test]
    fn missing_fields_show_checklist() {
        let failure = ProbeFailure::from(ProbeError::RequiredFieldsMissing {
            missing: vec!["MONGODB_PASSWORD".into()],
        });
        let lines = failure_lines(&failure);
        assert!(lines[0].contains("MONGODB_PASSWORD"));
        assert_eq!(lines[1], "   - MONGODB_USERNAME: ✅");
        assert_eq!(lines[2], "   - MONGODB_PASSWORD: ❌");
        assert_eq!(lines[3], "   - MONGODB_CLUSTER_HOST: ✅");
        assert_eq!(lines[4], "💡 Possible issues:");
    }

    #[test]
    fn connectivity_failure_lists_causes() {
        let failure = ProbeFailure::new(
            ProbeStage::ServerCheck,
            ProbeError::ConnectivityFailure(anyhow::anyhow!("Server selection timeout")),
        );
        let lines = failure_lines(&failure);
        assert!(lines[0].starts_with("❌ Connection failed"));
        for cause in Diagnosis::Connectivity.causes() {
            assert!(lines.iter().any(|l| l.ends_with(cause)));
        }
    }

    #[test]
    fn failure_json_carries_category() {
        let failure = ProbeFailure::new(
            ProbeStage::WriteProbe,
            ProbeError::AuthenticationFailure(anyhow::anyhow!("not authorized")),
        );
        let value = failure_json(&failure);
        assert_eq!(value["status"], "failed");
        assert_eq!(value["stage"], "write_probe");
        assert_eq!(value["diagnosis"], "authentication");
        assert!(value["causes"].as_array().is_some_and(|c| !c.is_empty()));
    }

    #[test]
    fn quiet_events_render_nothing() {
        assert!(render(&ProbeEvent::StageEntered {
            stage: ProbeStage::ReadProbe
        })
        .is_none());
        let line = render(&ProbeEvent::ProbeNotFound { id: "abc".into() }).unwrap();
        assert!(line.contains("abc"));
    }
}

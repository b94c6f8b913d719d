use std::future::IntoFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::Client;
use uuid::Uuid;

use connprobe_core::descriptor::ConnectionDescriptor;
use connprobe_core::event::{EventSink, ProbeEvent};
use connprobe_core::prober::Prober;
use connprobe_core::report::{ProbeReport, StageRecord};
use connprobe_core::stage::{ProbeFailure, ProbeStage};

use crate::classify::classify;

pub const DEFAULT_COLLECTION: &str = "connection_test";
pub const DEFAULT_SERVER_SELECTION_TIMEOUT: Duration = Duration::from_millis(5000);
/// Timestamp stored in every probe document.
pub const PROBE_TIMESTAMP: &str = "2024-01-01";

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub collection: String,
    pub server_selection_timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            server_selection_timeout: DEFAULT_SERVER_SELECTION_TIMEOUT,
        }
    }
}

pub fn probe_document() -> Document {
    doc! { "test": true, "timestamp": PROBE_TIMESTAMP }
}

fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

/// True only when the read-back returned the document that was inserted.
pub fn read_back_matches(found: Option<&Document>, id: &Bson) -> bool {
    found.is_some_and(|document| document.get("_id") == Some(id))
}

/// Downgrade the latest stage record after an empty read-back.
fn mark_not_found(stages: &mut [StageRecord]) {
    if let Some(record) = stages.last_mut() {
        record.success = false;
        record.note = Some("probe document not found".into());
    }
}

pub struct MongoProber {
    descriptor: ConnectionDescriptor,
    settings: ProbeSettings,
    event_sinks: Vec<Arc<dyn EventSink>>,
}

impl MongoProber {
    pub fn new(descriptor: ConnectionDescriptor, settings: ProbeSettings) -> Self {
        Self {
            descriptor,
            settings,
            event_sinks: Vec::new(),
        }
    }

    pub fn add_event_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.event_sinks.push(sink);
    }

    async fn emit(&self, event: ProbeEvent) {
        for sink in &self.event_sinks {
            sink.emit(event.clone()).await;
        }
    }

    /// Run one stage: announce it, time it, and classify any driver error.
    async fn step<T, F>(
        &self,
        stage: ProbeStage,
        stages: &mut Vec<StageRecord>,
        action: F,
    ) -> Result<T, ProbeFailure>
    where
        F: IntoFuture<Output = mongodb::error::Result<T>>,
    {
        self.emit(ProbeEvent::StageEntered { stage }).await;
        let start = Instant::now();
        let result = action.await;
        let duration = start.elapsed();

        match result {
            Ok(value) => {
                tracing::debug!(%stage, ?duration, "Probe stage complete");
                stages.push(StageRecord {
                    stage,
                    success: true,
                    duration,
                    note: None,
                });
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(%stage, error = %e, "Probe stage failed");
                Err(ProbeFailure::new(stage, classify(e)))
            }
        }
    }

    async fn probe(&self, run_id: Uuid) -> Result<ProbeReport, ProbeFailure> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut stages = Vec::new();

        let client = self
            .step(ProbeStage::Connecting, &mut stages, async {
                let mut options = ClientOptions::parse(self.descriptor.uri.as_str()).await?;
                options.server_selection_timeout = Some(self.settings.server_selection_timeout);
                Client::with_options(options)
            })
            .await?;

        let admin = client.database("admin");
        let info = self
            .step(
                ProbeStage::ServerCheck,
                &mut stages,
                admin.run_command(doc! { "buildInfo": 1 }),
            )
            .await?;
        let server_version = info.get_str("version").unwrap_or("Unknown").to_string();
        tracing::info!(version = %server_version, "Connected to MongoDB");
        self.emit(ProbeEvent::ServerInfo {
            version: server_version.clone(),
        })
        .await;

        let db = client.database(&self.descriptor.database);
        let collections = self
            .step(ProbeStage::DbAccess, &mut stages, db.list_collection_names())
            .await?;
        self.emit(ProbeEvent::CollectionsListed {
            database: self.descriptor.database.clone(),
            collections: collections.clone(),
        })
        .await;

        let coll = db.collection::<Document>(&self.settings.collection);
        let inserted = self
            .step(
                ProbeStage::WriteProbe,
                &mut stages,
                coll.insert_one(probe_document()),
            )
            .await?;
        let id = inserted.inserted_id;
        let probe_id = id_to_string(&id);
        self.emit(ProbeEvent::ProbeInserted {
            id: probe_id.clone(),
        })
        .await;

        let found = self
            .step(
                ProbeStage::ReadProbe,
                &mut stages,
                coll.find_one(doc! { "_id": id.clone() }),
            )
            .await?;
        let read_back = read_back_matches(found.as_ref(), &id);
        if let Some(document) = found.filter(|_| read_back) {
            self.emit(ProbeEvent::ProbeRead {
                id: probe_id.clone(),
                document: document.to_string(),
            })
            .await;
        } else {
            // Not fatal: the delete below still runs.
            tracing::warn!(id = %probe_id, "Probe document not found on read-back");
            mark_not_found(&mut stages);
            self.emit(ProbeEvent::ProbeNotFound {
                id: probe_id.clone(),
            })
            .await;
        }

        let deleted = self
            .step(
                ProbeStage::DeleteProbe,
                &mut stages,
                coll.delete_one(doc! { "_id": id.clone() }),
            )
            .await?;
        self.emit(ProbeEvent::ProbeDeleted {
            id: probe_id.clone(),
            deleted: deleted.deleted_count,
        })
        .await;

        self.emit(ProbeEvent::StageEntered {
            stage: ProbeStage::Success,
        })
        .await;
        let start = Instant::now();
        client.shutdown().await;
        stages.push(StageRecord {
            stage: ProbeStage::Success,
            success: true,
            duration: start.elapsed(),
            note: None,
        });

        Ok(ProbeReport {
            run_id,
            masked_uri: self.descriptor.masked_uri(),
            source: self.descriptor.source,
            database: self.descriptor.database.clone(),
            collection: self.settings.collection.clone(),
            server_version,
            collections,
            probe_id: Some(probe_id),
            read_back,
            started_at,
            completed_at: Utc::now(),
            total_duration: clock.elapsed(),
            stages,
        })
    }
}

#[async_trait]
impl Prober for MongoProber {
    fn name(&self) -> &str {
        "mongodb"
    }

    async fn run(&self) -> Result<ProbeReport, ProbeFailure> {
        let run_id = Uuid::new_v4();
        self.emit(ProbeEvent::Started {
            run_id,
            at: Utc::now(),
        })
        .await;
        tracing::info!(
            %run_id,
            uri = %self.descriptor.masked_uri(),
            database = %self.descriptor.database,
            timeout = ?self.settings.server_selection_timeout,
            "Starting connection probe"
        );

        match self.probe(run_id).await {
            Ok(report) => {
                self.emit(ProbeEvent::Completed {
                    run_id,
                    at: report.completed_at,
                })
                .await;
                Ok(report)
            }
            Err(failure) => {
                self.emit(ProbeEvent::Failed {
                    run_id,
                    stage: failure.stage,
                    diagnosis: failure.error.diagnosis(),
                    error: failure.error.to_string(),
                })
                .await;
                Err(failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connprobe_core::descriptor::UriSource;
    use connprobe_core::error::Diagnosis;
    use connprobe_core::event::ChannelEventSink;
    use mongodb::bson::oid::ObjectId;

    fn descriptor(uri: &str) -> ConnectionDescriptor {
        ConnectionDescriptor {
            uri: uri.to_string(),
            source: UriSource::Direct,
            database: "connprobe_test".to_string(),
        }
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ProbeEvent>) -> Vec<ProbeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn probe_document_is_fixed() {
        let doc = probe_document();
        assert!(doc.get_bool("test").unwrap());
        assert_eq!(doc.get_str("timestamp").unwrap(), "2024-01-01");
        assert!(!doc.contains_key("_id"));
    }

    #[test]
    fn default_settings() {
        let settings = ProbeSettings::default();
        assert_eq!(settings.collection, "connection_test");
        assert_eq!(settings.server_selection_timeout, Duration::from_millis(5000));
    }

    fn record(stage: ProbeStage) -> StageRecord {
        StageRecord {
            stage,
            success: true,
            duration: Duration::from_millis(3),
            note: None,
        }
    }

    #[test]
    fn read_back_matches_inserted_id() {
        let id = Bson::ObjectId(ObjectId::new());
        let mut found = probe_document();
        found.insert("_id", id.clone());
        assert!(read_back_matches(Some(&found), &id));
    }

    #[test]
    fn read_back_absent_is_not_a_match() {
        let id = Bson::ObjectId(ObjectId::new());
        assert!(!read_back_matches(None, &id));
    }

    #[test]
    fn read_back_with_other_id_is_not_a_match() {
        let id = Bson::ObjectId(ObjectId::new());
        let mut found = probe_document();
        found.insert("_id", ObjectId::new());
        assert!(!read_back_matches(Some(&found), &id));

        let without_id = probe_document();
        assert!(!read_back_matches(Some(&without_id), &id));
    }

    #[test]
    fn missing_read_back_downgrades_only_the_latest_stage() {
        let mut stages = vec![record(ProbeStage::WriteProbe), record(ProbeStage::ReadProbe)];
        mark_not_found(&mut stages);

        assert!(stages[0].success);
        assert_eq!(stages[0].note, None);
        assert!(!stages[1].success);
        assert_eq!(stages[1].note.as_deref(), Some("probe document not found"));

        let mut empty: Vec<StageRecord> = Vec::new();
        mark_not_found(&mut empty);
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn unreachable_server_fails_with_connectivity() {
        let settings = ProbeSettings {
            server_selection_timeout: Duration::from_millis(300),
            ..ProbeSettings::default()
        };
        let uri = "mongodb://127.0.0.1:1/?directConnection=true";
        let mut prober = MongoProber::new(descriptor(uri), settings);
        let (sink, mut rx) = ChannelEventSink::new();
        prober.add_event_sink(Arc::new(sink));

        let failure = prober.run().await.unwrap_err();
        assert_eq!(failure.stage, ProbeStage::ServerCheck);
        assert_eq!(failure.error.diagnosis(), Diagnosis::Connectivity);

        let events = drain(&mut rx);
        assert!(matches!(events.first(), Some(ProbeEvent::Started { .. })));
        assert!(matches!(
            events.last(),
            Some(ProbeEvent::Failed {
                diagnosis: Diagnosis::Connectivity,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn malformed_uri_fails_while_connecting() {
        let prober = MongoProber::new(descriptor("mongo://nowhere"), ProbeSettings::default());
        let failure = prober.run().await.unwrap_err();
        assert_eq!(failure.stage, ProbeStage::Connecting);
        assert_eq!(failure.error.diagnosis(), Diagnosis::Configuration);
    }

    #[tokio::test]
    #[ignore = "needs CONNPROBE_TEST_URI"]
    async fn full_run_against_live_server() {
        let uri = std::env::var("CONNPROBE_TEST_URI").expect("CONNPROBE_TEST_URI is not set");
        let mut prober = MongoProber::new(descriptor(&uri), ProbeSettings::default());
        let (sink, mut rx) = ChannelEventSink::new();
        prober.add_event_sink(Arc::new(sink));

        let report = prober.run().await.unwrap();
        assert!(report.read_back);
        assert_eq!(report.stages.last().map(|s| s.stage), Some(ProbeStage::Success));

        let events = drain(&mut rx);
        let inserted = events.iter().find_map(|e| match e {
            ProbeEvent::ProbeInserted { id } => Some(id.clone()),
            _ => None,
        });
        let read = events.iter().find_map(|e| match e {
            ProbeEvent::ProbeRead { id, .. } => Some(id.clone()),
            _ => None,
        });
        assert!(inserted.is_some());
        assert_eq!(inserted, read);
        assert!(events
            .iter()
            .any(|e| matches!(e, ProbeEvent::ProbeDeleted { deleted: 1, .. })));
    }
}

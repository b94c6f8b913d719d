use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Diagnosis;
use crate::stage::ProbeStage;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProbeEvent {
    Started {
        run_id: Uuid,
        at: DateTime<Utc>,
    },
    StageEntered {
        stage: ProbeStage,
    },
    ServerInfo {
        version: String,
    },
    CollectionsListed {
        database: String,
        collections: Vec<String>,
    },
    ProbeInserted {
        id: String,
    },
    ProbeRead {
        id: String,
        document: String,
    },
    /// Read-back came back empty. The run continues.
    ProbeNotFound {
        id: String,
    },
    ProbeDeleted {
        id: String,
        deleted: u64,
    },
    Completed {
        run_id: Uuid,
        at: DateTime<Utc>,
    },
    Failed {
        run_id: Uuid,
        stage: ProbeStage,
        diagnosis: Diagnosis,
        error: String,
    },
}

/// Sink for probe events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: ProbeEvent);
}

/// Channel-based event sink that forwards events to a receiver.
pub struct ChannelEventSink {
    tx: tokio::sync::mpsc::UnboundedSender<ProbeEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<ProbeEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelEventSink {
    async fn emit(&self, event: ProbeEvent) {
        let _ = self.tx.send(event);
    }
}

/// Simple tracing-based event sink.
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: ProbeEvent) {
        tracing::debug!(?event, "probe_event");
    }
}

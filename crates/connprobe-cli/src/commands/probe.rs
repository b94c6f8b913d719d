use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use serde_json::json;

use connprobe_core::descriptor::{ConnectionDescriptor, UriSource};
use connprobe_core::env_file::EnvConfig;
use connprobe_core::event::TracingEventSink;
use connprobe_core::prober::Prober;
use connprobe_core::stage::ProbeFailure;
use connprobe_mongo::prober::{DEFAULT_COLLECTION, DEFAULT_SERVER_SELECTION_TIMEOUT};
use connprobe_mongo::{MongoProber, ProbeSettings};

use crate::console::{print_failure, ConsoleEventSink};

#[derive(Args)]
pub struct ProbeArgs {
    /// Server selection timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_SERVER_SELECTION_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,
    /// Collection the probe document is written to and removed from
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,
    /// Print the full stage report after a successful run
    #[arg(long)]
    pub report: bool,
    /// Print the outcome as JSON instead of progress lines
    #[arg(long, conflicts_with = "report")]
    pub json: bool,
}

impl ProbeArgs {
    fn settings(&self) -> ProbeSettings {
        ProbeSettings {
            collection: self.collection.clone(),
            server_selection_timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Process exit status for a finished run; every failure category maps to 1.
pub fn exit_code<T>(outcome: &Result<T, ProbeFailure>) -> i32 {
    match outcome {
        Ok(_) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}

/// Load the env file and resolve the connection string. No network access.
pub fn resolve(env_file: &Path) -> Result<ConnectionDescriptor, ProbeFailure> {
    let env = EnvConfig::load(env_file)?;
    let descriptor = ConnectionDescriptor::resolve(&env)?;
    Ok(descriptor)
}

fn announce(descriptor: &ConnectionDescriptor) {
    match descriptor.source {
        UriSource::Direct => {
            println!("✅ Found MONGODB_URI in env file");
            println!("🔗 URI (masked): {}", descriptor.masked_uri());
        }
        UriSource::Composed => println!("✅ Built MongoDB URI from components"),
    }
}

pub async fn execute(env_file: &Path, args: ProbeArgs) -> anyhow::Result<i32> {
    if !args.json {
        println!("🔍 Testing MongoDB Connection...");
        println!("{}", "=".repeat(50));
    }

    let descriptor = match resolve(env_file) {
        Ok(descriptor) => descriptor,
        Err(failure) => {
            tracing::error!(stage = %failure.stage, error = %failure.error, "Probe setup failed");
            print_failure(&failure, args.json)?;
            return Ok(EXIT_FAILURE);
        }
    };
    if !args.json {
        announce(&descriptor);
    }

    let mut prober = MongoProber::new(descriptor, args.settings());
    prober.add_event_sink(Arc::new(TracingEventSink));
    if !args.json {
        prober.add_event_sink(Arc::new(ConsoleEventSink));
    }

    let outcome = prober.run().await;
    match &outcome {
        Ok(report) => {
            tracing::info!(
                run_id = %report.run_id,
                read_back = report.read_back,
                "Connection probe passed"
            );
            if args.json {
                let value = json!({ "status": "ok", "report": report });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else if args.report {
                println!("{report}");
            }
        }
        Err(failure) => {
            tracing::error!(
                prober = prober.name(),
                stage = %failure.stage,
                diagnosis = %failure.error.diagnosis(),
                "Connection probe failed"
            );
            print_failure(failure, args.json)?;
        }
    }
    Ok(exit_code(&outcome))
}

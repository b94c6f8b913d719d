use std::path::Path;

use clap::Args;

use connprobe_core::descriptor::UriSource;

use crate::commands::probe::{resolve, EXIT_FAILURE, EXIT_SUCCESS};
use crate::console::print_failure;

#[derive(Args)]
pub struct ValidateArgs {
    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(env_file: &Path, args: ValidateArgs) -> anyhow::Result<i32> {
    if !args.json {
        println!("Validating {}...", env_file.display());
    }

    match resolve(env_file) {
        Ok(descriptor) => {
            if args.json {
                let value = serde_json::json!({
                    "status": "ok",
                    "source": descriptor.source,
                    "masked_uri": descriptor.masked_uri(),
                    "database": descriptor.database,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                let source = match descriptor.source {
                    UriSource::Direct => "MONGODB_URI",
                    UriSource::Composed => "composed from fields",
                };
                println!("  Env file:  OK");
                println!("  Source:    {source}");
                println!("  URI:       {}", descriptor.masked_uri());
                println!("  Database:  {}", descriptor.database);
                println!("\nValidation PASSED");
            }
            Ok(EXIT_SUCCESS)
        }
        Err(failure) => {
            if !args.json {
                println!("\nValidation FAILED");
            }
            print_failure(&failure, args.json)?;
            Ok(EXIT_FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn resolvable_file_passes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "MONGODB_URI=mongodb://localhost:27017").unwrap();

        let code = execute(file.path(), ValidateArgs { json: true }).await.unwrap();
        assert_eq!(code, EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let code = execute(&dir.path().join(".env"), ValidateArgs { json: true })
            .await
            .unwrap();
        assert_eq!(code, EXIT_FAILURE);
    }
}

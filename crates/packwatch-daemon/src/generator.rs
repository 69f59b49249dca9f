//! Minimal scaffold pack writer
//!
//! The full template renderer that produces orchestrator job files is a
//! separate concern; the daemon ships this scaffold implementation of the
//! [`PackGenerator`] contract so watch mode has a concrete generator. It
//! resolves each tuple into a pack directory and writes a `pack.json`
//! manifest with everything the renderer would consume.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use packwatch_types::{Package, ServerRecord};
use packwatch_watcher::{GenerateError, GenerateOptions, OutputKind, PackGenerator};
use serde::Serialize;
use std::path::PathBuf;

/// Resolved manifest written into every scaffolded pack
#[derive(Debug, Serialize)]
struct PackManifest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    version: &'a str,
    package_type: &'a str,
    package_identifier: &'a str,
    package_version: &'a str,
    transport: &'a str,
    generated_at: DateTime<Utc>,
}

/// Scaffold [`PackGenerator`] writing one directory per generated tuple
#[derive(Debug, Default)]
pub struct PackWriter;

impl PackWriter {
    pub fn new() -> Self {
        Self
    }

    /// The directory a tuple resolves to under the output root
    ///
    /// Distinct (server, package) pairs map to distinct directories, so
    /// concurrent generation never shares a path.
    fn pack_dir(
        namespace: &str,
        name: &str,
        version: &str,
        package: &Package,
        transport: &str,
        options: &GenerateOptions,
    ) -> PathBuf {
        options
            .output_dir
            .join(namespace)
            .join(name)
            .join(version)
            .join(format!("{}-{}", package.registry_type, transport))
    }
}

#[async_trait]
impl PackGenerator for PackWriter {
    async fn generate(
        &self,
        server: &ServerRecord,
        package: &Package,
        transport: &str,
        options: &GenerateOptions,
    ) -> Result<(), GenerateError> {
        if options.output != OutputKind::Directory {
            return Err(GenerateError::Unsupported(
                "archive output requires the full pack renderer".to_string(),
            ));
        }

        let name = server
            .parsed_name()
            .map_err(|e| GenerateError::Other(anyhow::Error::new(e)))?;
        let pack_dir = Self::pack_dir(
            &name.namespace,
            &name.name,
            &server.version,
            package,
            transport,
            options,
        );

        if pack_dir.exists() && !options.force {
            return Err(GenerateError::AlreadyExists { path: pack_dir });
        }

        if options.dry_run {
            tracing::info!(pack = %pack_dir.display(), "Dry run, skipping pack write");
            return Ok(());
        }

        let manifest = PackManifest {
            name: &server.name,
            description: server.description.as_deref(),
            version: &server.version,
            package_type: &package.registry_type,
            package_identifier: &package.identifier,
            package_version: &package.version,
            transport,
            generated_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| GenerateError::Other(anyhow::Error::new(e)))?;

        tokio::fs::create_dir_all(&pack_dir).await?;
        tokio::fs::write(pack_dir.join("pack.json"), json).await?;

        tracing::debug!(pack = %pack_dir.display(), "Wrote pack scaffold");
        Ok(())
    }
}

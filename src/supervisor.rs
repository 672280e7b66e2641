//! The supervisor handle: lifecycle, configuration, and data reset for one
//! server install.
//!
//! A [`Supervisor`] is bound at construction to an install path and a
//! declared server version. Lifecycle calls go through the
//! [`ProcessController`]; configuration calls go through the
//! [`VersionAdapter`] and [`ConfigStore`]; `start`/`restart` additionally
//! block on the [`ReadinessProbe`] before reporting success.
//!
//! One handle supervises one install. Calls on the same handle are not
//! serialized internally; invoking `start` and `clean` concurrently is a
//! race the caller must prevent.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::probe::ReadinessProbe;
use crate::process::{ProcessController, Subcommand, detect_helper};
use crate::properties::ConfigStore;
use crate::version::{self, DEFAULT_HOST, DEFAULT_PORT, VersionAdapter};

/// The server's HTTP endpoint, derived from current config values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Base URL, `http://<host>:<port>`.
    pub server: String,
    /// Path of the data API under the base URL.
    pub endpoint: String,
}

/// Supervises one externally installed Neo4j server.
pub struct Supervisor {
    install: PathBuf,
    controller: ProcessController,
    store: ConfigStore,
    adapter: Box<dyn VersionAdapter>,
    probe: ReadinessProbe,
}

impl Supervisor {
    /// Bind a supervisor to an install directory and declared version.
    ///
    /// The config file path and key mapping are fixed here from the
    /// version, and the reattachment helper is probed for exactly once.
    ///
    /// # Errors
    ///
    /// Fails when `version` is not valid semver.
    pub fn new(install: impl Into<PathBuf>, server_version: &str) -> Result<Self> {
        let install = install.into();
        let adapter = version::adapter_for(server_version)?;
        let store = ConfigStore::new(install.join(adapter.config_file()));
        let helper = detect_helper();
        if let Some(helper) = &helper {
            debug!(helper = %helper.display(), "Using reattachment helper");
        }
        let controller = ProcessController::new(install.join("bin").join("neo4j"), helper);

        Ok(Self {
            install,
            controller,
            store,
            adapter,
            probe: ReadinessProbe::default(),
        })
    }

    /// Replace the readiness polling policy.
    pub fn with_probe(mut self, probe: ReadinessProbe) -> Self {
        self.probe = probe;
        self
    }

    /// The supervised install directory.
    pub fn install_path(&self) -> &Path {
        &self.install
    }

    /// Start the server and wait until it accepts HTTP connections.
    ///
    /// Returns the control binary's captured output.
    pub async fn start(&self) -> Result<String> {
        info!(install = %self.install.display(), "Starting server");
        let output = self.controller.run(Subcommand::Start).await?;
        let endpoint = self.endpoint().await?;
        self.probe.wait(&endpoint).await?;
        Ok(output)
    }

    /// Stop the server.
    pub async fn stop(&self) -> Result<String> {
        info!(install = %self.install.display(), "Stopping server");
        self.controller.run(Subcommand::Stop).await
    }

    /// Restart the server and wait until it accepts HTTP connections.
    pub async fn restart(&self) -> Result<String> {
        info!(install = %self.install.display(), "Restarting server");
        let output = self.controller.run(Subcommand::Restart).await?;
        let endpoint = self.endpoint().await?;
        self.probe.wait(&endpoint).await?;
        Ok(output)
    }

    /// Whether the server daemon is currently running. Never cached.
    pub async fn running(&self) -> Result<bool> {
        self.controller.running().await
    }

    /// The daemon's pid, or `None` when status reports no pid.
    pub async fn pid(&self) -> Result<Option<u32>> {
        self.controller.pid().await
    }

    /// Read a raw config value.
    pub async fn config(&self, key: &str) -> Result<String> {
        self.store.get(key).await
    }

    /// Write a raw config value.
    pub async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.store.set(key, value).await
    }

    /// Delete a raw config key; a no-op when absent.
    pub async fn delete_config(&self, key: &str) -> Result<()> {
        self.store.delete(key).await
    }

    /// The configured HTTP host, if any.
    pub async fn host(&self) -> Result<Option<String>> {
        self.adapter.host(&self.store).await
    }

    /// Set the HTTP host.
    pub async fn set_host(&self, host: &str) -> Result<()> {
        self.adapter.set_host(&self.store, host).await
    }

    /// The configured HTTP port, if any.
    pub async fn port(&self) -> Result<Option<String>> {
        self.adapter.port(&self.store).await
    }

    /// Set the HTTP port.
    pub async fn set_port(&self, port: &str) -> Result<()> {
        self.adapter.set_port(&self.store, port).await
    }

    /// Absolute path of the server's data directory.
    pub async fn data_dir(&self) -> Result<PathBuf> {
        self.adapter.data_dir(&self.store, &self.install).await
    }

    /// Derive the HTTP endpoint from current config values.
    ///
    /// Missing keys fall back to defaults; only I/O errors propagate.
    pub async fn endpoint(&self) -> Result<Endpoint> {
        let host = self
            .adapter
            .host(&self.store)
            .await?
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = self
            .adapter
            .port(&self.store)
            .await?
            .unwrap_or_else(|| DEFAULT_PORT.to_string());
        let path = self.adapter.data_api_path(&self.store).await?;

        Ok(Endpoint {
            server: format!("http://{host}:{port}"),
            endpoint: path,
        })
    }

    /// Destructively reset the server's data directory.
    ///
    /// Stops the server first when it was running, wipes and recreates the
    /// data directory, then restarts only if it was running before. The
    /// observed run state before and after the call is identical, and the
    /// data directory always exists (empty) afterwards.
    ///
    /// # Errors
    ///
    /// Any step's failure aborts the remainder of the sequence: a failed
    /// `stop` leaves the data untouched, a failed wipe leaves the server
    /// stopped.
    pub async fn clean(&self) -> Result<()> {
        let was_running = self.running().await?;
        if was_running {
            self.stop().await?;
        }

        let data_dir = self.data_dir().await?;
        info!(data_dir = %data_dir.display(), was_running, "Wiping data directory");

        match tokio::fs::remove_dir_all(&data_dir).await {
            Ok(()) => {}
            // A missing data directory is already clean.
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(Error::filesystem(&data_dir, err)),
        }
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|err| Error::filesystem(&data_dir, err))?;

        if was_running {
            self.start().await?;
        }
        Ok(())
    }
}

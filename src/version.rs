//! Version-specific mapping of logical settings onto physical config keys.
//!
//! Neo4j changed its configuration layout at 3.0.0: the "server properties"
//! file became the unified `neo4j.conf`, the independent address/port keys
//! were packed into a single `host:port` value, and the database location
//! moved from one key to a computed `<data>/databases/<name>` path. The
//! [`VersionAdapter`] trait hides that split behind one interface; the
//! concrete variant is selected once at handle construction, so no caller
//! ever compares versions again.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use semver::Version;

use crate::error::Result;
use crate::properties::ConfigStore;

/// Host assumed when no address key is set.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Port assumed when no port key is set.
pub const DEFAULT_PORT: &str = "7474";
/// Data API path assumed when no key is set (and fixed for 3.0+).
pub const DEFAULT_DATA_API_PATH: &str = "/db/data";

// Pre-3.0 "server properties" keys.
const LEGACY_CONFIG_FILE: &str = "conf/neo4j-server.properties";
const LEGACY_HOST_KEY: &str = "org.neo4j.server.webserver.address";
const LEGACY_PORT_KEY: &str = "org.neo4j.server.webserver.port";
const LEGACY_DATA_KEY: &str = "org.neo4j.server.database.location";
const LEGACY_DATA_API_KEY: &str = "org.neo4j.server.webadmin.data.uri";
const LEGACY_DEFAULT_DATA_DIR: &str = "data/graph.db";

// 3.0+ unified config keys.
const UNIFIED_CONFIG_FILE: &str = "conf/neo4j.conf";
const UNIFIED_ADDRESS_KEY: &str = "dbms.connector.http.address";
const UNIFIED_DATA_DIR_KEY: &str = "dbms.directories.data";
const UNIFIED_ACTIVE_DB_KEY: &str = "dbms.active_database";
const UNIFIED_DEFAULT_DATA_DIR: &str = "data";
const UNIFIED_DEFAULT_ACTIVE_DB: &str = "graph.db";

/// Logical-to-physical config mapping for one major config layout.
///
/// Getters return `Ok(None)` when the backing key is merely absent; only
/// structural I/O errors propagate.
#[async_trait]
pub trait VersionAdapter: Send + Sync {
    /// Config file path relative to the install directory.
    fn config_file(&self) -> &'static str;

    /// The configured HTTP host, if any.
    async fn host(&self, store: &ConfigStore) -> Result<Option<String>>;

    /// Set the HTTP host. For packed layouts this first resolves the
    /// current port so the write recombines both halves; a failed read
    /// aborts the write.
    async fn set_host(&self, store: &ConfigStore, host: &str) -> Result<()>;

    /// The configured HTTP port, if any.
    async fn port(&self, store: &ConfigStore) -> Result<Option<String>>;

    /// Set the HTTP port; the packed-layout caveat of [`set_host`]
    /// applies symmetrically.
    ///
    /// [`set_host`]: VersionAdapter::set_host
    async fn set_port(&self, store: &ConfigStore, port: &str) -> Result<()>;

    /// Absolute path of the server's data directory.
    async fn data_dir(&self, store: &ConfigStore, install: &Path) -> Result<PathBuf>;

    /// Path of the HTTP data API, with the version default applied.
    async fn data_api_path(&self, store: &ConfigStore) -> Result<String>;
}

/// Select the adapter for a declared server version.
///
/// # Errors
///
/// Returns [`Error::Version`](crate::Error::Version) when the version
/// string is not valid semver.
pub fn adapter_for(version: &str) -> Result<Box<dyn VersionAdapter>> {
    let version = Version::parse(version)?;
    if version >= Version::new(3, 0, 0) {
        Ok(Box::new(UnifiedAdapter))
    } else {
        Ok(Box::new(LegacyAdapter))
    }
}

/// Pre-3.0 layout: independent keys in `neo4j-server.properties`.
pub struct LegacyAdapter;

#[async_trait]
impl VersionAdapter for LegacyAdapter {
    fn config_file(&self) -> &'static str {
        LEGACY_CONFIG_FILE
    }

    async fn host(&self, store: &ConfigStore) -> Result<Option<String>> {
        read_optional(store, LEGACY_HOST_KEY).await
    }

    async fn set_host(&self, store: &ConfigStore, host: &str) -> Result<()> {
        store.set(LEGACY_HOST_KEY, host).await
    }

    async fn port(&self, store: &ConfigStore) -> Result<Option<String>> {
        read_optional(store, LEGACY_PORT_KEY).await
    }

    async fn set_port(&self, store: &ConfigStore, port: &str) -> Result<()> {
        store.set(LEGACY_PORT_KEY, port).await
    }

    async fn data_dir(&self, store: &ConfigStore, install: &Path) -> Result<PathBuf> {
        // Single key holding a path relative to the install directory.
        let location = store.get_or(LEGACY_DATA_KEY, LEGACY_DEFAULT_DATA_DIR).await?;
        Ok(install.join(location))
    }

    async fn data_api_path(&self, store: &ConfigStore) -> Result<String> {
        store.get_or(LEGACY_DATA_API_KEY, DEFAULT_DATA_API_PATH).await
    }
}

/// 3.0+ layout: packed `host:port` address in `neo4j.conf`, computed
/// data directory.
pub struct UnifiedAdapter;

impl UnifiedAdapter {
    /// Split the packed address into its halves: index 0 is the host,
    /// index 1 the port. A value without `:` counts as host only.
    async fn packed(store: &ConfigStore) -> Result<Option<(String, Option<String>)>> {
        let Some(raw) = read_optional(store, UNIFIED_ADDRESS_KEY).await? else {
            return Ok(None);
        };
        Ok(Some(match raw.split_once(':') {
            Some((host, port)) => (host.to_string(), Some(port.to_string())),
            None => (raw, None),
        }))
    }
}

#[async_trait]
impl VersionAdapter for UnifiedAdapter {
    fn config_file(&self) -> &'static str {
        UNIFIED_CONFIG_FILE
    }

    async fn host(&self, store: &ConfigStore) -> Result<Option<String>> {
        Ok(Self::packed(store).await?.map(|(host, _)| host))
    }

    async fn set_host(&self, store: &ConfigStore, host: &str) -> Result<()> {
        // Resolve the other half before writing; an I/O failure here must
        // leave the packed value untouched.
        let port = self
            .port(store)
            .await?
            .unwrap_or_else(|| DEFAULT_PORT.to_string());
        store.set(UNIFIED_ADDRESS_KEY, &format!("{host}:{port}")).await
    }

    async fn port(&self, store: &ConfigStore) -> Result<Option<String>> {
        Ok(Self::packed(store).await?.and_then(|(_, port)| port))
    }

    async fn set_port(&self, store: &ConfigStore, port: &str) -> Result<()> {
        let host = self
            .host(store)
            .await?
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        store.set(UNIFIED_ADDRESS_KEY, &format!("{host}:{port}")).await
    }

    async fn data_dir(&self, store: &ConfigStore, install: &Path) -> Result<PathBuf> {
        let data = store
            .get_or(UNIFIED_DATA_DIR_KEY, UNIFIED_DEFAULT_DATA_DIR)
            .await?;
        let active = store
            .get_or(UNIFIED_ACTIVE_DB_KEY, UNIFIED_DEFAULT_ACTIVE_DB)
            .await?;
        Ok(install.join(data).join("databases").join(active))
    }

    async fn data_api_path(&self, _store: &ConfigStore) -> Result<String> {
        // No such key exists in the unified layout.
        Ok(DEFAULT_DATA_API_PATH.to_string())
    }
}

async fn read_optional(store: &ConfigStore, key: &str) -> Result<Option<String>> {
    match store.get(key).await {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_key_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with(content: &str) -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config");
        tokio::fs::write(&path, content).await.unwrap();
        (dir, ConfigStore::new(path))
    }

    #[test]
    fn adapter_selection_follows_semver_threshold() {
        assert_eq!(
            adapter_for("2.3.12").unwrap().config_file(),
            LEGACY_CONFIG_FILE
        );
        assert_eq!(
            adapter_for("3.0.0").unwrap().config_file(),
            UNIFIED_CONFIG_FILE
        );
        assert_eq!(
            adapter_for("3.5.14").unwrap().config_file(),
            UNIFIED_CONFIG_FILE
        );
        assert!(adapter_for("three-ish").is_err());
    }

    #[tokio::test]
    async fn legacy_host_and_port_are_independent_keys() {
        let (_dir, store) = store_with(
            "org.neo4j.server.webserver.address=10.1.1.1\n\
             org.neo4j.server.webserver.port=7979\n",
        )
        .await;
        let adapter = LegacyAdapter;

        assert_eq!(adapter.host(&store).await.unwrap().unwrap(), "10.1.1.1");
        assert_eq!(adapter.port(&store).await.unwrap().unwrap(), "7979");

        adapter.set_port(&store, "8080").await.unwrap();
        assert_eq!(
            store.get("org.neo4j.server.webserver.port").await.unwrap(),
            "8080"
        );
        // The address key is untouched by a port write.
        assert_eq!(adapter.host(&store).await.unwrap().unwrap(), "10.1.1.1");
    }

    #[tokio::test]
    async fn legacy_data_dir_joins_relative_location() {
        let (_dir, store) =
            store_with("org.neo4j.server.database.location=data/test.db\n").await;
        let adapter = LegacyAdapter;

        let dir = adapter
            .data_dir(&store, Path::new("/opt/neo4j"))
            .await
            .unwrap();
        assert_eq!(dir, Path::new("/opt/neo4j/data/test.db"));
    }

    #[tokio::test]
    async fn packed_address_splits_host_then_port() {
        let (_dir, store) = store_with("dbms.connector.http.address=0.0.0.0:7688\n").await;
        let adapter = UnifiedAdapter;

        assert_eq!(adapter.host(&store).await.unwrap().unwrap(), "0.0.0.0");
        assert_eq!(adapter.port(&store).await.unwrap().unwrap(), "7688");
    }

    #[tokio::test]
    async fn setting_host_preserves_existing_port() {
        let (_dir, store) = store_with("dbms.connector.http.address=localhost:7688\n").await;
        let adapter = UnifiedAdapter;

        adapter.set_host(&store, "10.0.0.1").await.unwrap();
        assert_eq!(
            store.get("dbms.connector.http.address").await.unwrap(),
            "10.0.0.1:7688"
        );
        assert_eq!(adapter.host(&store).await.unwrap().unwrap(), "10.0.0.1");
        assert_eq!(adapter.port(&store).await.unwrap().unwrap(), "7688");
    }

    #[tokio::test]
    async fn setting_port_preserves_existing_host() {
        let (_dir, store) = store_with("dbms.connector.http.address=10.0.0.1:7474\n").await;
        let adapter = UnifiedAdapter;

        adapter.set_port(&store, "9999").await.unwrap();
        assert_eq!(
            store.get("dbms.connector.http.address").await.unwrap(),
            "10.0.0.1:9999"
        );
    }

    #[tokio::test]
    async fn setting_half_of_absent_address_uses_defaults() {
        let (_dir, store) = store_with("").await;
        let adapter = UnifiedAdapter;

        adapter.set_host(&store, "10.0.0.1").await.unwrap();
        assert_eq!(
            store.get("dbms.connector.http.address").await.unwrap(),
            "10.0.0.1:7474"
        );
    }

    #[tokio::test]
    async fn unified_data_dir_is_computed() {
        let (_dir, store) = store_with("").await;
        let adapter = UnifiedAdapter;

        let dir = adapter
            .data_dir(&store, Path::new("/opt/neo4j"))
            .await
            .unwrap();
        assert_eq!(dir, Path::new("/opt/neo4j/data/databases/graph.db"));

        let (_dir2, store) = store_with(
            "dbms.directories.data=var/data\ndbms.active_database=movies.db\n",
        )
        .await;
        let dir = adapter
            .data_dir(&store, Path::new("/opt/neo4j"))
            .await
            .unwrap();
        assert_eq!(dir, Path::new("/opt/neo4j/var/data/databases/movies.db"));
    }

    #[tokio::test]
    async fn unified_data_api_path_is_fixed() {
        let (_dir, store) = store_with("").await;
        assert_eq!(
            UnifiedAdapter.data_api_path(&store).await.unwrap(),
            "/db/data"
        );
    }
}

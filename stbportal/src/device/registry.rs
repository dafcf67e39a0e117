use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use super::identity::{DeviceIdentity, is_valid_mac, normalize};

/// Stored registration for one device, keyed by its normalized address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Original address, uppercased, colons kept.
    pub mac: String,
    pub registered: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("registry file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Invalid MAC address format")]
    InvalidMac,
    #[error("failed to store device: {0}")]
    Store(#[from] RegistryError),
}

/**
    Durable key/value store of registered devices.

    The portal only ever reads from it; writes come from the registration
    endpoint and the `register` command.
*/
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn lookup(&self, normalized: &str) -> Result<Option<DeviceRecord>, RegistryError>;

    /// Insert or overwrite the record stored under `normalized`.
    async fn put(&self, normalized: &str, record: DeviceRecord) -> Result<(), RegistryError>;

    /// Short label for logs and the index route.
    fn describe(&self) -> String;
}

/**
    Whether the handshake should treat the device as authorized.

    Fails open: no registry, no identity, or a broken backend all count as
    known. Only a successful lookup that finds nothing denies the device.
*/
pub async fn is_known(
    registry: Option<&dyn DeviceRegistry>,
    identity: Option<&DeviceIdentity>,
) -> bool {
    let (Some(registry), Some(identity)) = (registry, identity) else {
        return true;
    };

    match registry.lookup(&identity.normalized).await {
        Ok(record) => record.is_some(),
        Err(e) => {
            tracing::warn!(
                mac = %identity.normalized,
                error = %e,
                "Registry lookup failed, assuming device is known"
            );
            true
        }
    }
}

/**
    Validate and store a device address.

    Re-registering an address overwrites the previous record. Without a
    registry the address is still validated and acknowledged, just not kept.
*/
pub async fn register_device(
    registry: Option<&dyn DeviceRegistry>,
    raw: &str,
) -> Result<DeviceRecord, RegistrationError> {
    if !is_valid_mac(raw) {
        return Err(RegistrationError::InvalidMac);
    }

    let record = DeviceRecord {
        mac: raw.to_uppercase(),
        registered: crate::util::time::now(),
    };

    match registry {
        Some(registry) => {
            registry.put(&normalize(raw), record.clone()).await?;
            tracing::info!(mac = %record.mac, "Device registered");
        }
        None => {
            tracing::debug!(mac = %record.mac, "No registry configured, registration not stored");
        }
    }

    Ok(record)
}

// ── In-memory store ──────────────────────────────────────────────────

/// Volatile registry, lost on restart.
#[derive(Default)]
pub struct MemoryRegistry {
    records: RwLock<HashMap<String, DeviceRecord>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl DeviceRegistry for MemoryRegistry {
    async fn lookup(&self, normalized: &str) -> Result<Option<DeviceRecord>, RegistryError> {
        Ok(self.records.read().await.get(normalized).cloned())
    }

    async fn put(&self, normalized: &str, record: DeviceRecord) -> Result<(), RegistryError> {
        self.records
            .write()
            .await
            .insert(normalized.to_string(), record);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ── JSON file store ──────────────────────────────────────────────────

/// Size and modification time, used to notice writes by other processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
}

struct Loaded {
    records: HashMap<String, DeviceRecord>,
    stamp: Option<FileStamp>,
}

/**
    Registry persisted as a single JSON object mapping normalized address to
    record. The whole file is rewritten on every put, through a temp file and
    a rename so readers never see a partial document.

    The file may be shared with other processes (a running server and the
    `register` command). Lookups reload it when its stamp changes, and puts
    merge into the current on-disk contents rather than the cached copy.
*/
pub struct FileRegistry {
    path: PathBuf,
    loaded: RwLock<Loaded>,
}

impl FileRegistry {
    /// Load the registry at `path`. A missing file is an empty registry.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let loaded = load(&path).await?;

        tracing::debug!(path = %path.display(), devices = loaded.records.len(), "Loaded device registry");

        Ok(Self {
            path,
            loaded: RwLock::new(loaded),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &HashMap<String, DeviceRecord>) -> Result<(), RegistryError> {
        let data = serde_json::to_vec_pretty(records)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

async fn stamp(path: &Path) -> Result<Option<FileStamp>, RegistryError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(Some(FileStamp {
            modified: meta.modified()?,
            len: meta.len(),
        })),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn load(path: &Path) -> Result<Loaded, RegistryError> {
    let stamp = stamp(path).await?;
    let records = match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => HashMap::new(),
        Ok(bytes) => serde_json::from_slice(&bytes)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
        Err(e) => return Err(e.into()),
    };
    Ok(Loaded { records, stamp })
}

#[async_trait]
impl DeviceRegistry for FileRegistry {
    async fn lookup(&self, normalized: &str) -> Result<Option<DeviceRecord>, RegistryError> {
        let on_disk = stamp(&self.path).await?;
        {
            let loaded = self.loaded.read().await;
            if loaded.stamp == on_disk {
                return Ok(loaded.records.get(normalized).cloned());
            }
        }

        let mut loaded = self.loaded.write().await;
        if loaded.stamp != on_disk {
            *loaded = load(&self.path).await?;
            tracing::debug!(path = %self.path.display(), devices = loaded.records.len(), "Reloaded device registry");
        }
        Ok(loaded.records.get(normalized).cloned())
    }

    async fn put(&self, normalized: &str, record: DeviceRecord) -> Result<(), RegistryError> {
        // Held across the write so concurrent puts land in order.
        let mut loaded = self.loaded.write().await;
        let mut current = load(&self.path).await?;
        current.records.insert(normalized.to_string(), record);
        self.persist(&current.records).await?;
        current.stamp = stamp(&self.path).await?;
        *loaded = current;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Backend whose every call fails.
    pub struct UnavailableRegistry;

    fn refused() -> RegistryError {
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused").into()
    }

    #[async_trait]
    impl DeviceRegistry for UnavailableRegistry {
        async fn lookup(&self, _normalized: &str) -> Result<Option<DeviceRecord>, RegistryError> {
            Err(refused())
        }

        async fn put(&self, _normalized: &str, _record: DeviceRecord) -> Result<(), RegistryError> {
            Err(refused())
        }

        fn describe(&self) -> String {
            "unavailable".to_string()
        }
    }
}

use crate::domain::model::{Area, InfrastructureSnapshot};
use crate::domain::ports::{AreaRepository, SnapshotRepository};
use crate::utils::error::{LocalityError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Areas and snapshots held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    areas: RwLock<BTreeMap<u64, Area>>,
    snapshots: RwLock<BTreeMap<u64, InfrastructureSnapshot>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_areas(areas: Vec<Area>) -> Self {
        Self {
            areas: RwLock::new(areas.into_iter().map(|a| (a.id, a)).collect()),
            snapshots: RwLock::new(BTreeMap::new()),
        }
    }

    /// Replaces any area with the same id.
    pub async fn reseed_area(&self, area: Area) {
        self.areas.write().await.insert(area.id, area);
    }
}

impl SnapshotRepository for InMemoryStore {
    async fn get(&self, area_id: u64) -> Result<Option<InfrastructureSnapshot>> {
        Ok(self.snapshots.read().await.get(&area_id).copied())
    }

    async fn upsert(&self, area_id: u64, snapshot: &InfrastructureSnapshot) -> Result<()> {
        self.snapshots.write().await.insert(area_id, *snapshot);
        Ok(())
    }

    async fn create(&self, area_id: u64, snapshot: &InfrastructureSnapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        if snapshots.contains_key(&area_id) {
            return Err(LocalityError::SnapshotExists { area_id });
        }
        snapshots.insert(area_id, *snapshot);
        Ok(())
    }
}

impl AreaRepository for InMemoryStore {
    async fn get_area(&self, area_id: u64) -> Result<Option<Area>> {
        Ok(self.areas.read().await.get(&area_id).cloned())
    }

    async fn list_areas(&self) -> Result<Vec<Area>> {
        Ok(self.areas.read().await.values().cloned().collect())
    }
}

/// Snapshots persisted as one JSON document, keyed by area id.
///
/// The document is loaded once on open and rewritten in full on every write
/// (temp file + rename). The in-memory view only changes once the write lands.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    snapshots: RwLock<BTreeMap<u64, InfrastructureSnapshot>>,
}

impl JsonFileStore {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshots = match tokio::fs::read(&path).await {
            Ok(data) if data.is_empty() => BTreeMap::new(),
            Ok(data) => serde_json::from_slice(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            "Opened snapshot store {} with {} entries",
            path.display(),
            snapshots.len()
        );

        Ok(Self {
            path,
            snapshots: RwLock::new(snapshots),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, snapshots: &BTreeMap<u64, InfrastructureSnapshot>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let data = serde_json::to_vec_pretty(snapshots)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!("Wrote {} bytes to {}", data.len(), self.path.display());
        Ok(())
    }
}

impl SnapshotRepository for JsonFileStore {
    async fn get(&self, area_id: u64) -> Result<Option<InfrastructureSnapshot>> {
        Ok(self.snapshots.read().await.get(&area_id).copied())
    }

    async fn upsert(&self, area_id: u64, snapshot: &InfrastructureSnapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        let mut next = snapshots.clone();
        next.insert(area_id, *snapshot);
        self.persist(&next).await?;
        *snapshots = next;
        Ok(())
    }

    async fn create(&self, area_id: u64, snapshot: &InfrastructureSnapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        if snapshots.contains_key(&area_id) {
            return Err(LocalityError::SnapshotExists { area_id });
        }
        let mut next = snapshots.clone();
        next.insert(area_id, *snapshot);
        self.persist(&next).await?;
        *snapshots = next;
        Ok(())
    }
}

/// Snapshot backend chosen from configuration at startup.
#[derive(Debug)]
pub enum SnapshotStore {
    Memory(InMemoryStore),
    File(JsonFileStore),
}

impl SnapshotStore {
    /// A JSON file store when a path is given, process memory otherwise.
    pub async fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Ok(SnapshotStore::File(JsonFileStore::open(path).await?)),
            None => Ok(SnapshotStore::Memory(InMemoryStore::new())),
        }
    }
}

impl SnapshotRepository for SnapshotStore {
    async fn get(&self, area_id: u64) -> Result<Option<InfrastructureSnapshot>> {
        match self {
            SnapshotStore::Memory(store) => store.get(area_id).await,
            SnapshotStore::File(store) => store.get(area_id).await,
        }
    }

    async fn upsert(&self, area_id: u64, snapshot: &InfrastructureSnapshot) -> Result<()> {
        match self {
            SnapshotStore::Memory(store) => store.upsert(area_id, snapshot).await,
            SnapshotStore::File(store) => store.upsert(area_id, snapshot).await,
        }
    }

    async fn create(&self, area_id: u64, snapshot: &InfrastructureSnapshot) -> Result<()> {
        match self {
            SnapshotStore::Memory(store) => store.create(area_id, snapshot).await,
            SnapshotStore::File(store) => store.create(area_id, snapshot).await,
        }
    }
}

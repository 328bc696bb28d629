//! Read access to the fact table.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{dedup_by_id, FactFile, JsonlReader, JsonlWriter, StorageConfig, StorageError};
use crate::models::{GameSession, Player, Tenant, TenantId};

/// Read-only view of game sessions and the profiles joined onto rollups.
///
/// Implementations must tolerate concurrent readers; nothing in the
/// aggregation path mutates the store.
pub trait FactStore: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Every session row, duplicates removed.
    fn sessions(&self) -> Result<Vec<GameSession>, StorageError>;

    /// Registered tenants.
    fn tenants(&self) -> Result<Vec<Tenant>, StorageError>;

    /// Player profiles.
    fn players(&self) -> Result<Vec<Player>, StorageError>;

    /// Session rows of a single tenant.
    fn tenant_sessions(&self, tenant: &TenantId) -> Result<Vec<GameSession>, StorageError> {
        let mut rows = self.sessions()?;
        rows.retain(|s| &s.tenant_id == tenant);
        Ok(rows)
    }
}

/// Fact store backed by the JSONL files of a data directory.
#[derive(Debug, Clone)]
pub struct JsonlFactStore {
    config: StorageConfig,
}

impl JsonlFactStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// A missing facts directory means the store is not mounted, which is
    /// different from a store with no rows.
    fn ensure_reachable(&self) -> Result<(), StorageError> {
        let dir = self.config.facts_dir();
        if dir.is_dir() {
            Ok(())
        } else {
            warn!("Fact store directory {:?} is not reachable", dir);
            Err(StorageError::Unavailable(format!(
                "facts directory {} not found",
                dir.display()
            )))
        }
    }

    fn read<T: serde::de::DeserializeOwned>(&self, file: FactFile) -> Result<Vec<T>, StorageError> {
        self.ensure_reachable()?;
        JsonlReader::<T>::for_fact(&self.config, file)
            .read_all()
            .map_err(unavailable)
    }

    /// Append new sessions. Rows whose id already exists are skipped.
    pub fn append_sessions(&self, sessions: &[GameSession]) -> Result<usize, StorageError> {
        self.append_new(FactFile::Sessions, sessions, |s| s.id.as_str())
    }

    /// Append tenants not registered yet.
    pub fn append_tenants(&self, tenants: &[Tenant]) -> Result<usize, StorageError> {
        self.append_new(FactFile::Tenants, tenants, |t| t.id.as_str())
    }

    /// Append player profiles not stored yet.
    pub fn append_players(&self, players: &[Player]) -> Result<usize, StorageError> {
        self.append_new(FactFile::Players, players, |p| p.id.as_str())
    }

    /// Append the rows of `incoming` whose id is neither stored nor repeated
    /// earlier in the batch.
    fn append_new<T, F>(
        &self,
        file: FactFile,
        incoming: &[T],
        id: F,
    ) -> Result<usize, StorageError>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: Fn(&T) -> &str,
    {
        let existing = JsonlReader::<T>::for_fact(&self.config, file).read_all()?;
        let existing = dedup_by_id(existing, &id);
        let stored = existing.len();

        let combined: Vec<T> = existing.into_iter().chain(incoming.iter().cloned()).collect();
        let fresh: Vec<T> = dedup_by_id(combined, &id).split_off(stored);

        if fresh.len() < incoming.len() {
            debug!(
                file = file.filename(),
                skipped = incoming.len() - fresh.len(),
                "Skipping rows already stored"
            );
        }
        JsonlWriter::for_fact(&self.config, file).append_batch(&fresh)
    }
}

fn unavailable(err: StorageError) -> StorageError {
    match err {
        StorageError::Io(e) => StorageError::Unavailable(e.to_string()),
        other => other,
    }
}

impl FactStore for JsonlFactStore {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn sessions(&self) -> Result<Vec<GameSession>, StorageError> {
        let rows: Vec<GameSession> = self.read(FactFile::Sessions)?;
        let rows = dedup_by_id(rows, |s| s.id.as_str());
        debug!("Loaded {} session rows", rows.len());
        Ok(rows)
    }

    fn tenants(&self) -> Result<Vec<Tenant>, StorageError> {
        self.read(FactFile::Tenants)
    }

    fn players(&self) -> Result<Vec<Player>, StorageError> {
        self.read(FactFile::Players)
    }

    fn tenant_sessions(&self, tenant: &TenantId) -> Result<Vec<GameSession>, StorageError> {
        self.ensure_reachable()?;
        let rows = JsonlReader::<GameSession>::for_fact(&self.config, FactFile::Sessions)
            .read_where(|s| &s.tenant_id == tenant)
            .map_err(unavailable)?;
        Ok(dedup_by_id(rows, |s| s.id.as_str()))
    }
}

/// In-memory fact store. Can be switched offline to simulate an outage.
#[derive(Debug, Default)]
pub struct MemoryFactStore {
    sessions: RwLock<Vec<GameSession>>,
    tenants: RwLock<Vec<Tenant>>,
    players: RwLock<Vec<Player>>,
    offline: AtomicBool,
}

impl MemoryFactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(sessions: Vec<GameSession>) -> Self {
        let store = Self::new();
        if let Ok(mut guard) = store.sessions.write() {
            *guard = sessions;
        }
        store
    }

    pub fn push_session(&self, session: GameSession) -> Result<(), StorageError> {
        self.sessions.write().map_err(poisoned)?.push(session);
        Ok(())
    }

    pub fn push_tenant(&self, tenant: Tenant) -> Result<(), StorageError> {
        self.tenants.write().map_err(poisoned)?.push(tenant);
        Ok(())
    }

    pub fn push_player(&self, player: Player) -> Result<(), StorageError> {
        self.players.write().map_err(poisoned)?.push(player);
        Ok(())
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StorageError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

fn poisoned<E>(_: E) -> StorageError {
    StorageError::Unavailable("store lock poisoned".to_string())
}

impl FactStore for MemoryFactStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn sessions(&self) -> Result<Vec<GameSession>, StorageError> {
        self.check_online()?;
        let rows = self.sessions.read().map_err(poisoned)?.clone();
        Ok(dedup_by_id(rows, |s| s.id.as_str()))
    }

    fn tenants(&self) -> Result<Vec<Tenant>, StorageError> {
        self.check_online()?;
        Ok(self.tenants.read().map_err(poisoned)?.clone())
    }

    fn players(&self) -> Result<Vec<Player>, StorageError> {
        self.check_online()?;
        Ok(self.players.read().map_err(poisoned)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session(tenant: &str, player: &str, score: u64) -> GameSession {
        GameSession::new(tenant, "Trivia", "quiz", player, score, false)
    }

    #[test]
    fn test_jsonl_store_missing_dir_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonlFactStore::new(StorageConfig::new(temp_dir.path().join("nope")));
        assert!(matches!(store.sessions(), Err(StorageError::Unavailable(_))));
        assert!(matches!(store.tenants(), Err(StorageError::Unavailable(_))));
    }

    #[test]
    fn test_jsonl_store_empty_dir_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        std::fs::create_dir_all(config.facts_dir()).unwrap();
        let store = JsonlFactStore::new(config);
        assert!(store.sessions().unwrap().is_empty());
        assert!(store.players().unwrap().is_empty());
    }

    #[test]
    fn test_append_sessions_skips_known_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonlFactStore::new(StorageConfig::new(temp_dir.path().to_path_buf()));

        let a = session("acme", "p1", 10);
        let b = session("acme", "p2", 20);
        assert_eq!(store.append_sessions(&[a.clone(), b.clone()]).unwrap(), 2);
        assert_eq!(store.append_sessions(&[a, b.clone(), b]).unwrap(), 0);
        assert_eq!(store.sessions().unwrap().len(), 2);
    }

    #[test]
    fn test_reimporting_profiles_adds_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        let store = JsonlFactStore::new(config.clone());

        let tenants = vec![Tenant::new("acme", "Acme"), Tenant::new("globex", "Globex")];
        let players = vec![Player::new("p1", "Alex"), Player::new("p1", "Alex again")];

        assert_eq!(store.append_tenants(&tenants).unwrap(), 2);
        assert_eq!(store.append_players(&players).unwrap(), 1);
        assert_eq!(store.append_tenants(&tenants).unwrap(), 0);
        assert_eq!(store.append_players(&players).unwrap(), 0);

        let rows = JsonlReader::<Tenant>::for_fact(&config, FactFile::Tenants)
            .count()
            .unwrap();
        assert_eq!(rows, 2);
        let players = store.players().unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].display_name, "Alex");

        assert_eq!(store.append_tenants(&[Tenant::new("initech", "Initech")]).unwrap(), 1);
        assert_eq!(store.tenants().unwrap().len(), 3);
    }

    #[test]
    fn test_jsonl_store_dedups_on_read() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        let row = session("acme", "p1", 10);
        JsonlWriter::for_fact(&config, FactFile::Sessions)
            .write_all(&[row.clone(), row])
            .unwrap();

        let store = JsonlFactStore::new(config);
        assert_eq!(store.sessions().unwrap().len(), 1);
    }

    #[test]
    fn test_tenant_sessions_filters_by_tenant() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonlFactStore::new(StorageConfig::new(temp_dir.path().to_path_buf()));
        store
            .append_sessions(&[
                session("acme", "p1", 10),
                session("globex", "p1", 10),
                session("acme", "p2", 5),
            ])
            .unwrap();

        let acme = store.tenant_sessions(&TenantId::from("acme")).unwrap();
        assert_eq!(acme.len(), 2);
        assert!(acme.iter().all(|s| s.tenant_id.as_str() == "acme"));
    }

    #[test]
    fn test_memory_store_offline_toggle() {
        let store = MemoryFactStore::with_sessions(vec![session("acme", "p1", 1)]);
        assert_eq!(store.sessions().unwrap().len(), 1);

        store.set_offline(true);
        assert!(matches!(store.sessions(), Err(StorageError::Unavailable(_))));
        assert!(matches!(
            store.tenant_sessions(&TenantId::from("acme")),
            Err(StorageError::Unavailable(_))
        ));

        store.set_offline(false);
        store.push_session(session("acme", "p2", 2)).unwrap();
        assert_eq!(store.sessions().unwrap().len(), 2);
    }
}

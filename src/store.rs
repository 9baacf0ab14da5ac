//! In-process ledger state with snapshot persistence.
//!
//! All records live in one [`LedgerData`] guarded by a `tokio::sync::RwLock`.
//! Every successful write is persisted as a whole snapshot through a
//! [`SnapshotSink`] before the lock is released.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::budget::Budget;
use crate::error::{LedgerError, LedgerResult};
use crate::expense::{Expense, ExpenseTemplate};
use crate::ledger::UserProfile;
use crate::vault::{Invitation, MemberRole, Vault, VaultMember};

/// Every persisted record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerData {
    #[serde(default)]
    pub users: HashMap<String, UserProfile>,
    #[serde(default)]
    pub vaults: HashMap<Uuid, Vault>,
    #[serde(default)]
    pub members: HashMap<Uuid, VaultMember>,
    #[serde(default)]
    pub invitations: HashMap<Uuid, Invitation>,
    #[serde(default)]
    pub templates: HashMap<Uuid, ExpenseTemplate>,
    #[serde(default)]
    pub expenses: HashMap<Uuid, Expense>,
    #[serde(default)]
    pub budgets: HashMap<Uuid, Budget>,
}

impl LedgerData {
    /// A vault that has not been deleted.
    pub fn vault(&self, vault_id: Uuid) -> Option<&Vault> {
        self.vaults.get(&vault_id).filter(|v| !v.audit.is_deleted())
    }

    /// The membership record of `user_id` in `vault_id`, whatever its status.
    pub fn membership(&self, vault_id: Uuid, user_id: &str) -> Option<&VaultMember> {
        self.members
            .values()
            .find(|m| m.vault_id == vault_id && m.user_id == user_id && m.deleted_at.is_none())
    }

    pub fn membership_mut(&mut self, vault_id: Uuid, user_id: &str) -> Option<&mut VaultMember> {
        self.members
            .values_mut()
            .find(|m| m.vault_id == vault_id && m.user_id == user_id && m.deleted_at.is_none())
    }

    /// Role of an active member in a live vault.
    pub fn role_of(&self, vault_id: Uuid, user_id: &str) -> Option<MemberRole> {
        self.vault(vault_id)?;
        self.membership(vault_id, user_id)
            .filter(|m| m.is_active())
            .map(|m| m.role)
    }

    pub fn active_members(&self, vault_id: Uuid) -> impl Iterator<Item = &VaultMember> + '_ {
        self.members
            .values()
            .filter(move |m| m.vault_id == vault_id && m.is_active())
    }

    /// Live expenses of a vault.
    pub fn vault_expenses(&self, vault_id: Uuid) -> Vec<&Expense> {
        self.expenses
            .values()
            .filter(|e| e.vault_id == vault_id && !e.audit.is_deleted())
            .collect()
    }

    pub fn display_name(&self, vault_id: Uuid, user_id: &str) -> Option<&str> {
        self.membership(vault_id, user_id)
            .map(|m| m.display_name.as_str())
    }
}

/// Where snapshots go.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// The last saved snapshot, if there is one.
    async fn load(&self) -> LedgerResult<Option<LedgerData>>;

    async fn save(&self, data: &LedgerData) -> LedgerResult<()>;
}

/// Pretty-printed JSON file, replaced atomically on every save.
#[derive(Debug)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `{data_dir}/ledger.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("ledger.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotSink for JsonFileSink {
    async fn load(&self) -> LedgerResult<Option<LedgerData>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = tokio::fs::read_to_string(&self.path).await?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    async fn save(&self, data: &LedgerData) -> LedgerResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!("Saved ledger snapshot to {}", self.path.display());
        Ok(())
    }
}

/// Keeps the last snapshot in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    snapshot: Arc<Mutex<Option<LedgerData>>>,
    saves: Arc<AtomicUsize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots saved so far.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Option<LedgerData> {
        self.snapshot.lock().ok().and_then(|s| s.clone())
    }
}

#[async_trait]
impl SnapshotSink for MemorySink {
    async fn load(&self) -> LedgerResult<Option<LedgerData>> {
        Ok(self.snapshot())
    }

    async fn save(&self, data: &LedgerData) -> LedgerResult<()> {
        let mut slot = self
            .snapshot
            .lock()
            .map_err(|_| LedgerError::Storage("memory snapshot lock poisoned".into()))?;
        *slot = Some(data.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct LedgerStore {
    data: RwLock<LedgerData>,
    sink: Box<dyn SnapshotSink>,
}

impl LedgerStore {
    /// Open a store, loading the sink's last snapshot.
    ///
    /// A missing or unreadable snapshot starts an empty ledger; an unreadable
    /// file is left in place until the next successful write replaces it.
    pub async fn open(sink: Box<dyn SnapshotSink>) -> Self {
        let data = match sink.load().await {
            Ok(Some(data)) => {
                tracing::info!(
                    "Loaded ledger snapshot ({} vaults, {} expenses)",
                    data.vaults.len(),
                    data.expenses.len()
                );
                data
            }
            Ok(None) => {
                tracing::info!("No ledger snapshot found, starting empty");
                LedgerData::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load ledger snapshot: {}, starting empty", e);
                LedgerData::default()
            }
        };
        Self {
            data: RwLock::new(data),
            sink,
        }
    }

    pub async fn in_memory() -> Self {
        Self::open(Box::new(MemorySink::new())).await
    }

    pub async fn read<R>(&self, f: impl FnOnce(&LedgerData) -> R) -> R {
        let data = self.data.read().await;
        f(&data)
    }

    /// Run `f` against a working copy and commit it only if `f` succeeds and
    /// the snapshot was saved. Either way the live state is never half-updated.
    ///
    /// Each call clones the whole `LedgerData` and serializes it in full, so
    /// the cost of a write grows with the ledger. Callers that may have
    /// nothing to change (such as `upsert_profile`) check under `read` first.
    pub async fn write<R>(
        &self,
        f: impl FnOnce(&mut LedgerData) -> LedgerResult<R>,
    ) -> LedgerResult<R> {
        let mut data = self.data.write().await;
        let mut working = data.clone();
        let result = f(&mut working)?;
        if let Err(e) = self.sink.save(&working).await {
            tracing::warn!("Failed to persist ledger snapshot: {}", e);
            return Err(e);
        }
        *data = working;
        Ok(result)
    }
}

/// Shared store wrapped in Arc for concurrent access.
pub type SharedLedgerStore = Arc<LedgerStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::IconType;
    use chrono::Utc;
    use tokio_test::assert_ok;

    fn vault(name: &str) -> Vault {
        Vault {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            color: "#3B82F6".into(),
            icon: None,
            icon_type: IconType::Emoji,
            is_public: false,
            audit: crate::audit::Audit::initial("alice", Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_failed_write_changes_nothing() {
        let sink = MemorySink::new();
        let store = LedgerStore::open(Box::new(sink.clone())).await;

        let result: LedgerResult<()> = store
            .write(|data| {
                let v = vault("Home");
                data.vaults.insert(v.id, v);
                Err(LedgerError::invalid("nope"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.read(|d| d.vaults.len()).await, 0);
        assert_eq!(sink.saves(), 0);

        assert_ok!(
            store
                .write(|data| {
                    let v = vault("Home");
                    data.vaults.insert(v.id, v);
                    Ok(())
                })
                .await
        );
        assert_eq!(store.read(|d| d.vaults.len()).await, 1);
        assert_eq!(sink.saves(), 1);
    }

    #[tokio::test]
    async fn test_file_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::open(Box::new(JsonFileSink::in_dir(dir.path()))).await;
        let id = assert_ok!(
            store
                .write(|data| {
                    let v = vault("Cabin");
                    let id = v.id;
                    data.vaults.insert(id, v);
                    Ok(id)
                })
                .await
        );

        let reopened = LedgerStore::open(Box::new(JsonFileSink::in_dir(dir.path()))).await;
        let name = reopened
            .read(|d| d.vault(id).map(|v| v.name.clone()))
            .await;
        assert_eq!(name.as_deref(), Some("Cabin"));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::in_dir(dir.path());
        std::fs::write(sink.path(), "{ not json").unwrap();

        let store = LedgerStore::open(Box::new(sink)).await;
        assert_eq!(store.read(|d| d.vaults.len()).await, 0);
        // Left untouched until something is written.
        let contents = std::fs::read_to_string(dir.path().join("ledger.json")).unwrap();
        assert_eq!(contents, "{ not json");
    }

    #[test]
    fn test_role_of_ignores_pending_and_deleted() {
        let mut data = LedgerData::default();
        let v = vault("Home");
        let vault_id = v.id;
        data.vaults.insert(vault_id, v);

        let owner = VaultMember::owner(vault_id, "alice", "Alice", Utc::now());
        data.members.insert(owner.id, owner);
        let mut pending = VaultMember::owner(vault_id, "bob", "Bob", Utc::now());
        pending.role = MemberRole::Member;
        pending.status = crate::vault::MemberStatus::Pending;
        data.members.insert(pending.id, pending);

        assert_eq!(data.role_of(vault_id, "alice"), Some(MemberRole::Owner));
        assert_eq!(data.role_of(vault_id, "bob"), None);

        if let Some(v) = data.vaults.get_mut(&vault_id) {
            v.audit.soft_delete("alice", Utc::now());
        }
        assert_eq!(data.role_of(vault_id, "alice"), None);
    }
}

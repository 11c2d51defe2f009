//! Name → descriptor registry.
//!
//! Build tooling refers to staging repositories by a logical name (the name
//! of the configured repository manager). The registry remembers which remote
//! repository each name resolved to so profile and repository discovery run
//! once per name.
//!
//! Each name owns a `OnceCell`; concurrent first lookups share the single
//! in-flight resolution. [`DescriptorRegistry::invalidate`] detaches the cell,
//! so a resolution that was already running finishes for its own caller but
//! can never repopulate the registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::descriptor::StagingRepositoryDescriptor;
use crate::error::Result;

/// Resolves a logical repository name to a remote repository.
#[async_trait]
pub trait DescriptorResolver: Send + Sync {
    /// Looks up or creates the repository for `name`.
    async fn resolve(&self, name: &str) -> Result<StagingRepositoryDescriptor>;
}

type Slot = Arc<OnceCell<StagingRepositoryDescriptor>>;

/// Cache of resolved staging repository descriptors, keyed by logical name.
pub struct DescriptorRegistry {
    resolver: Arc<dyn DescriptorResolver>,
    entries: Mutex<HashMap<String, Slot>>,
}

impl std::fmt::Debug for DescriptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorRegistry")
            .field("entries", &self.entries.lock().len())
            .finish_non_exhaustive()
    }
}

impl DescriptorRegistry {
    /// Creates an empty registry backed by `resolver`.
    pub fn new(resolver: Arc<dyn DescriptorResolver>) -> Self {
        Self {
            resolver,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the descriptor for `name`, resolving it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's error; nothing is cached in that case.
    pub async fn get(&self, name: &str) -> Result<StagingRepositoryDescriptor> {
        let slot = self.slot(name);

        if let Some(descriptor) = slot.get() {
            tracing::debug!(name, repository_id = %descriptor.repository_id, "Registry hit");
            return Ok(descriptor.clone());
        }

        let resolved = slot
            .get_or_try_init(|| async {
                tracing::debug!(name, "Resolving staging repository");
                self.resolver.resolve(name).await
            })
            .await;

        match resolved {
            Ok(descriptor) => Ok(descriptor.clone()),
            Err(err) => {
                self.discard_empty(name, &slot);
                Err(err)
            }
        }
    }

    /// Returns the cached descriptor without resolving.
    pub fn peek(&self, name: &str) -> Option<StagingRepositoryDescriptor> {
        self.entries
            .lock()
            .get(name)
            .and_then(|slot| slot.get().cloned())
    }

    /// Records a descriptor resolved elsewhere, replacing any previous entry.
    pub fn insert(&self, name: impl Into<String>, descriptor: StagingRepositoryDescriptor) {
        let slot = Arc::new(OnceCell::new_with(Some(descriptor)));
        self.entries.lock().insert(name.into(), slot);
    }

    /// Forgets the descriptor for `name`; the next [`get`](Self::get) resolves again.
    ///
    /// Returns the descriptor that was cached, if any.
    pub fn invalidate(&self, name: &str) -> Option<StagingRepositoryDescriptor> {
        let removed = self.entries.lock().remove(name)?;
        let descriptor = removed.get().cloned();
        tracing::debug!(
            name,
            repository_id = ?descriptor.as_ref().map(|d| &d.repository_id),
            "Invalidated registry entry"
        );
        descriptor
    }

    /// Forgets every name resolved to `repository_id`.
    ///
    /// Used once a repository is released or dropped: the names that pointed
    /// at it must resolve afresh. Resolutions still in flight are detached as
    /// well, since they may yet land on `repository_id`. Returns the names
    /// that were removed.
    pub fn invalidate_repository(&self, repository_id: &str) -> Vec<String> {
        let mut entries = self.entries.lock();
        let names: Vec<String> = entries
            .iter()
            .filter(|(_, slot)| {
                slot.get()
                    .is_none_or(|descriptor| descriptor.repository_id == repository_id)
            })
            .map(|(name, _)| name.clone())
            .collect();

        for name in &names {
            entries.remove(name);
        }
        drop(entries);

        if !names.is_empty() {
            tracing::debug!(repository_id, ?names, "Invalidated registry entries");
        }
        names
    }

    fn slot(&self, name: &str) -> Slot {
        let mut entries = self.entries.lock();
        Arc::clone(entries.entry(name.to_string()).or_default())
    }

    /// Removes the slot for `name` if it is still `slot` and still empty.
    fn discard_empty(&self, name: &str, slot: &Slot) {
        let mut entries = self.entries.lock();
        if entries
            .get(name)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized())
        {
            entries.remove(name);
        }
    }
}

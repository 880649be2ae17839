//! Snapshot transactions over a shared group.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::group::Group;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// State of a write transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    Aborted,
}

#[derive(Debug)]
struct Shared {
    config: Config,
    /// Latest committed state.
    current: RwLock<Arc<Group>>,
    /// Id of the active writer, if any.
    writer: Mutex<Option<u64>>,
    next_txid: AtomicU64,
    version: AtomicU64,
}

/// A group shared between transactions.
///
/// Readers see an immutable snapshot of the last commit. At most one write
/// transaction exists at a time; it works on a private copy that replaces
/// the committed state on commit and is discarded on rollback.
#[derive(Debug, Clone)]
pub struct SharedGroup {
    shared: Arc<Shared>,
}

impl SharedGroup {
    /// Opens an empty shared group.
    #[must_use]
    pub fn open(config: Config) -> Self {
        let group = Group::new(config.max_tables);
        Self {
            shared: Arc::new(Shared {
                config,
                current: RwLock::new(Arc::new(group)),
                writer: Mutex::new(None),
                next_txid: AtomicU64::new(1),
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Opens an empty shared group with default configuration.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::open(Config::default())
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Returns the number of commits so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.version.load(Ordering::SeqCst)
    }

    /// Returns the latest committed state.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Group> {
        Arc::clone(&self.shared.current.read())
    }

    /// Returns true while a write transaction is active.
    #[must_use]
    pub fn is_writing(&self) -> bool {
        self.shared.writer.lock().is_some()
    }

    /// Begins a read transaction on the latest committed state.
    pub fn begin_read(&self) -> ReadTransaction {
        let id = self.shared.next_txid.fetch_add(1, Ordering::SeqCst);
        let group = self.snapshot();
        let version = self.version();
        debug!(txid = id, version, "begin read transaction");
        ReadTransaction { id, group, version }
    }

    /// Begins the single write transaction.
    ///
    /// Fails with [`CoreError::WriteInProgress`] instead of blocking when
    /// another writer is active.
    pub fn begin_write(&self) -> CoreResult<WriteTransaction> {
        if self.shared.config.read_only {
            return Err(CoreError::ReadOnly);
        }
        let mut writer = self.shared.writer.lock();
        if writer.is_some() {
            return Err(CoreError::WriteInProgress);
        }
        let id = self.shared.next_txid.fetch_add(1, Ordering::SeqCst);
        *writer = Some(id);
        drop(writer);

        let group = Group::clone(&self.snapshot());
        debug!(txid = id, "begin write transaction");
        Ok(WriteTransaction {
            shared: Arc::clone(&self.shared),
            id,
            group,
            state: TransactionState::Active,
        })
    }
}

/// A read-only view of one committed state.
#[derive(Debug, Clone)]
pub struct ReadTransaction {
    id: u64,
    group: Arc<Group>,
    version: u64,
}

impl ReadTransaction {
    /// Returns the transaction id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the commit version this snapshot reflects.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the snapshot.
    #[must_use]
    pub fn group(&self) -> &Group {
        &self.group
    }
}

/// The active write transaction.
///
/// Dropping an active transaction rolls it back.
#[derive(Debug)]
pub struct WriteTransaction {
    shared: Arc<Shared>,
    id: u64,
    group: Group,
    state: TransactionState,
}

impl WriteTransaction {
    /// Returns the transaction id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns the working copy.
    #[must_use]
    pub fn group(&self) -> &Group {
        &self.group
    }

    /// Returns the working copy for mutation.
    pub fn group_mut(&mut self) -> CoreResult<&mut Group> {
        self.ensure_active()?;
        Ok(&mut self.group)
    }

    /// Publishes the working copy and returns the new commit version.
    pub fn commit(mut self) -> CoreResult<u64> {
        self.ensure_active()?;
        let group = std::mem::take(&mut self.group);
        *self.shared.current.write() = Arc::new(group);
        let version = self.shared.version.fetch_add(1, Ordering::SeqCst) + 1;
        self.finish(TransactionState::Committed);
        debug!(txid = self.id, version, "committed write transaction");
        Ok(version)
    }

    /// Discards the working copy.
    pub fn rollback(mut self) -> CoreResult<()> {
        self.ensure_active()?;
        self.finish(TransactionState::Aborted);
        debug!(txid = self.id, "rolled back write transaction");
        Ok(())
    }

    fn finish(&mut self, state: TransactionState) {
        self.state = state;
        let mut writer = self.shared.writer.lock();
        if *writer == Some(self.id) {
            *writer = None;
        }
    }

    fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::Aborted => {
                Err(CoreError::invalid_operation("transaction already aborted"))
            }
        }
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        if self.state == TransactionState::Active {
            debug!(txid = self.id, "dropping active write transaction");
            self.finish(TransactionState::Aborted);
        }
    }
}

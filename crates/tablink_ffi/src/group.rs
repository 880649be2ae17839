//! Group FFI functions: lifecycle, transactions and table lookup.

use crate::call::{out, status, text_arg};
use crate::error::{FfiError, FfiResult, TlResult};
use crate::handles::{registry, Access, Handle, Object, TableRef, NULL_HANDLE};
use crate::types::TlConfig;
use std::ops::Deref;
use std::sync::Arc;
use tablink_core::{
    Config, CoreError, Group, ObjectStore, ReadTransaction, SharedGroup, TableSource,
    WriteTransaction,
};

enum Txn {
    Idle,
    Read(ReadTransaction),
    Write(WriteTransaction),
}

/// A shared group plus the transaction the boundary currently holds on it.
pub(crate) struct GroupState {
    shared: SharedGroup,
    txn: Txn,
}

/// The group state a call reads from.
pub(crate) enum Source<'a> {
    Borrowed(&'a Group),
    Snapshot(Arc<Group>),
}

impl Deref for Source<'_> {
    type Target = Group;

    fn deref(&self) -> &Group {
        match self {
            Self::Borrowed(group) => group,
            Self::Snapshot(group) => group,
        }
    }
}

impl GroupState {
    pub fn open(config: Config) -> Self {
        Self {
            shared: SharedGroup::open(config),
            txn: Txn::Idle,
        }
    }

    /// Reads see the open transaction's state, or the last commit when idle.
    pub fn source(&self) -> Source<'_> {
        match &self.txn {
            Txn::Idle => Source::Snapshot(self.shared.snapshot()),
            Txn::Read(read) => Source::Borrowed(read.group()),
            Txn::Write(write) => Source::Borrowed(write.group()),
        }
    }

    pub fn access(&self) -> Access {
        match &self.txn {
            Txn::Write(write) => Access::Write(write.id()),
            Txn::Idle | Txn::Read(_) => Access::ReadOnly,
        }
    }

    pub fn writable(&mut self) -> FfiResult<&mut Group> {
        match &mut self.txn {
            Txn::Write(write) => Ok(write.group_mut()?),
            Txn::Idle | Txn::Read(_) => Err(FfiError::ReadOnly(
                "group has no open write transaction",
            )),
        }
    }

    /// Like [`writable`](Self::writable), but only for write transaction `txid`.
    pub fn writable_by(&mut self, txid: u64) -> FfiResult<&mut Group> {
        match &mut self.txn {
            Txn::Write(write) if write.id() == txid => Ok(write.group_mut()?),
            Txn::Write(_) => Err(FfiError::ReadOnly(
                "table handle belongs to an earlier write transaction",
            )),
            Txn::Idle | Txn::Read(_) => Err(FfiError::ReadOnly(
                "group has no open write transaction",
            )),
        }
    }

    pub fn begin_read(&mut self) -> FfiResult<()> {
        self.ensure_idle()?;
        self.txn = Txn::Read(self.shared.begin_read());
        Ok(())
    }

    pub fn begin_write(&mut self) -> FfiResult<()> {
        self.ensure_idle()?;
        self.txn = Txn::Write(self.shared.begin_write()?);
        Ok(())
    }

    /// Ends the open transaction, publishing it if it is a write.
    pub fn commit(&mut self) -> FfiResult<u64> {
        match std::mem::replace(&mut self.txn, Txn::Idle) {
            Txn::Write(write) => Ok(write.commit()?),
            Txn::Read(read) => Ok(read.version()),
            Txn::Idle => Err(FfiError::invalid_state("no open transaction")),
        }
    }

    /// Ends the open transaction, discarding writes.
    pub fn rollback(&mut self) -> FfiResult<()> {
        match std::mem::replace(&mut self.txn, Txn::Idle) {
            Txn::Write(write) => Ok(write.rollback()?),
            Txn::Read(_) => Ok(()),
            Txn::Idle => Err(FfiError::invalid_state("no open transaction")),
        }
    }

    fn ensure_idle(&self) -> FfiResult<()> {
        match self.txn {
            Txn::Idle => Ok(()),
            Txn::Read(_) | Txn::Write(_) => Err(FfiError::invalid_state(
                "a transaction is already open on this group",
            )),
        }
    }
}

/// Opens an empty in-memory group.
///
/// # Arguments
///
/// * `config` - Configuration, or null for defaults
/// * `out_group` - Output for the group handle (caller owns it)
///
/// # Returns
///
/// `TlResult::Ok` on success, error code otherwise.
///
/// # Safety
///
/// - `config` must be null or point to a valid `TlConfig`
/// - `out_group` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn tl_group_open(config: *const TlConfig, out_group: *mut Handle) -> TlResult {
    status(|| {
        let out_group = out(out_group, "out_group")?;
        *out_group = NULL_HANDLE;
        let config = config.as_ref().cloned().unwrap_or_default().to_config();
        *out_group = registry().insert(Object::Group(GroupState::open(config)));
        Ok(())
    })
}

/// Destroys a group, rolling back any open write transaction.
///
/// Table, query and view handles derived from it become invalid but must
/// still be destroyed.
#[no_mangle]
pub extern "C" fn tl_group_destroy(group: Handle) -> TlResult {
    status(|| registry().remove_group(group))
}

/// Opens a read transaction. Tables obtained inside it are read-only.
#[no_mangle]
pub extern "C" fn tl_group_begin_read(group: Handle) -> TlResult {
    status(|| registry().group_mut(group)?.begin_read())
}

/// Opens the group's single write transaction.
///
/// # Returns
///
/// `TlResult::ReadOnly` if the group was opened read-only,
/// `TlResult::InvalidState` if a transaction is already open.
#[no_mangle]
pub extern "C" fn tl_group_begin_write(group: Handle) -> TlResult {
    status(|| registry().group_mut(group)?.begin_write())
}

/// Commits the open transaction.
///
/// # Arguments
///
/// * `group` - The group handle
/// * `out_version` - Output for the committed version, or null
///
/// # Safety
///
/// `out_version` must be null or a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_group_commit(group: Handle, out_version: *mut u64) -> TlResult {
    status(|| {
        let version = registry().group_mut(group)?.commit()?;
        if let Some(out_version) = out_version.as_mut() {
            *out_version = version;
        }
        Ok(())
    })
}

/// Rolls back the open transaction.
#[no_mangle]
pub extern "C" fn tl_group_rollback(group: Handle) -> TlResult {
    status(|| registry().group_mut(group)?.rollback())
}

/// Adds an empty table. Requires a write transaction.
///
/// # Arguments
///
/// * `group` - The group handle
/// * `name` / `name_len` - UTF-16 table name
/// * `out_table` - Output for a table handle that can write until the
///   current write transaction ends (caller owns it)
///
/// # Safety
///
/// - `name` must point to `name_len` units
/// - `out_table` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn tl_group_add_table(
    group: Handle,
    name: *const u16,
    name_len: usize,
    out_table: *mut Handle,
) -> TlResult {
    status(|| {
        let out_table = out(out_table, "out_table")?;
        *out_table = NULL_HANDLE;
        let name = text_arg(name, name_len, "name")?;
        let mut registry = registry();
        let state = registry.group_mut(group)?;
        let table = state.writable()?.add_table(name)?;
        let access = state.access();
        *out_table = registry.insert(Object::Table(TableRef {
            group,
            table,
            access,
        }));
        Ok(())
    })
}

/// Finds a table by name.
///
/// The handle can write only inside the write transaction open at this call,
/// if any. Returns `TlResult::OutOfRange` if no table has that name.
///
/// # Safety
///
/// - `name` must point to `name_len` units
/// - `out_table` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn tl_group_get_table(
    group: Handle,
    name: *const u16,
    name_len: usize,
    out_table: *mut Handle,
) -> TlResult {
    status(|| {
        let out_table = out(out_table, "out_table")?;
        *out_table = NULL_HANDLE;
        let name = text_arg(name, name_len, "name")?;
        let mut registry = registry();
        let state = registry.group(group)?;
        let table = state
            .source()
            .find_table(&name)
            .ok_or(CoreError::TableNotFound { name })?;
        let access = state.access();
        *out_table = registry.insert(Object::Table(TableRef {
            group,
            table,
            access,
        }));
        Ok(())
    })
}

/// Returns the number of tables.
///
/// # Safety
///
/// `out_count` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_group_table_count(group: Handle, out_count: *mut usize) -> TlResult {
    status(|| {
        let out_count = out(out_count, "out_count")?;
        *out_count = registry().group(group)?.source().table_count();
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn transaction_lifecycle() {
        unsafe {
            let mut group = NULL_HANDLE;
            assert_eq!(tl_group_open(std::ptr::null(), &mut group), TlResult::Ok);

            assert_eq!(tl_group_commit(group, std::ptr::null_mut()), TlResult::InvalidState);
            assert_eq!(tl_group_begin_write(group), TlResult::Ok);
            assert_eq!(tl_group_begin_read(group), TlResult::InvalidState);

            let name = units("class_Dog");
            let mut table = NULL_HANDLE;
            assert_eq!(
                tl_group_add_table(group, name.as_ptr(), name.len(), &mut table),
                TlResult::Ok
            );
            let mut version = 0;
            assert_eq!(tl_group_commit(group, &mut version), TlResult::Ok);
            assert_eq!(version, 1);

            let mut count = 0;
            tl_group_table_count(group, &mut count);
            assert_eq!(count, 1);

            assert_eq!(tl_group_destroy(group), TlResult::Ok);
            assert_eq!(tl_group_destroy(group), TlResult::InvalidHandle);
            crate::table::tl_table_destroy(table);
        }
    }

    #[test]
    fn rollback_discards_tables() {
        unsafe {
            let mut group = NULL_HANDLE;
            tl_group_open(std::ptr::null(), &mut group);
            tl_group_begin_write(group);
            let name = units("scratch");
            let mut table = NULL_HANDLE;
            tl_group_add_table(group, name.as_ptr(), name.len(), &mut table);
            assert_eq!(tl_group_rollback(group), TlResult::Ok);

            let mut found = NULL_HANDLE;
            assert_eq!(
                tl_group_get_table(group, name.as_ptr(), name.len(), &mut found),
                TlResult::OutOfRange
            );
            assert_eq!(found, NULL_HANDLE);
            crate::table::tl_table_destroy(table);
            tl_group_destroy(group);
        }
    }

    #[test]
    fn read_only_config_refuses_writers() {
        unsafe {
            let config = TlConfig {
                read_only: true,
                max_tables: 0,
            };
            let mut group = NULL_HANDLE;
            tl_group_open(&config, &mut group);
            assert_eq!(tl_group_begin_write(group), TlResult::ReadOnly);
            assert_eq!(tl_group_begin_read(group), TlResult::Ok);

            let name = units("t");
            let mut table = NULL_HANDLE;
            assert_eq!(
                tl_group_add_table(group, name.as_ptr(), name.len(), &mut table),
                TlResult::ReadOnly
            );
            assert_eq!(table, NULL_HANDLE);
            tl_group_destroy(group);
        }
    }

    #[test]
    fn null_out_pointer() {
        unsafe {
            assert_eq!(
                tl_group_open(std::ptr::null(), std::ptr::null_mut()),
                TlResult::NullPointer
            );
        }
    }
}

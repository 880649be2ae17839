//! Process-wide registry of boundary handles.
//!
//! A handle packs a slot index (low 32 bits, offset by one so zero is never
//! issued) and the slot's generation (high 32 bits). Destroying a handle
//! bumps the generation, so stale copies fail with `InvalidHandle` instead of
//! reaching a reused slot.

use crate::error::{FfiError, FfiResult};
use crate::group::GroupState;
use parking_lot::{Mutex, MutexGuard};
use std::sync::LazyLock;
use tablink_core::{Group, TableId};
use tablink_query::{Query, TableView};
use tracing::trace;

/// An opaque handle value.
pub type Handle = u64;

/// Never issued; out-parameters receive it on failure.
pub const NULL_HANDLE: Handle = 0;

const GROUP: &str = "group";
const TABLE: &str = "table";
const QUERY: &str = "query";
const VIEW: &str = "view";

/// What a table handle may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Reads only; obtained outside a write transaction.
    ReadOnly,
    /// Reads, and writes while the write transaction with this id is open.
    Write(u64),
}

/// A table addressed through its owning group.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableRef {
    pub group: Handle,
    pub table: TableId,
    pub access: Access,
}

pub(crate) struct QueryRef {
    pub group: Handle,
    pub query: Query,
}

pub(crate) struct ViewRef {
    pub group: Handle,
    pub view: TableView,
}

pub(crate) enum Object {
    Group(GroupState),
    Table(TableRef),
    Query(QueryRef),
    View(ViewRef),
}

impl Object {
    fn kind(&self) -> &'static str {
        match self {
            Self::Group(_) => GROUP,
            Self::Table(_) => TABLE,
            Self::Query(_) => QUERY,
            Self::View(_) => VIEW,
        }
    }

    fn owner(&self) -> Option<Handle> {
        match self {
            Self::Group(_) => None,
            Self::Table(t) => Some(t.group),
            Self::Query(q) => Some(q.group),
            Self::View(v) => Some(v.group),
        }
    }
}

struct Slot {
    generation: u32,
    object: Option<Object>,
}

#[derive(Default)]
pub(crate) struct Registry {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

static REGISTRY: LazyLock<Mutex<Registry>> = LazyLock::new(|| Mutex::new(Registry::default()));

/// Locks the process-wide registry.
pub(crate) fn registry() -> MutexGuard<'static, Registry> {
    REGISTRY.lock()
}

impl Registry {
    pub fn insert(&mut self, object: Object) -> Handle {
        let kind = object.kind();
        let index = self.free.pop().unwrap_or_else(|| {
            self.slots.push(Slot {
                generation: 1,
                object: None,
            });
            self.slots.len() - 1
        });
        let slot = &mut self.slots[index];
        slot.object = Some(object);
        let handle = (u64::from(slot.generation) << 32) | (index as u64 + 1);
        trace!(handle, kind, "created handle");
        handle
    }

    pub fn remove(&mut self, handle: Handle, expected: &'static str) -> FfiResult<Object> {
        let index = self.index_of(handle, expected)?;
        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1).max(1);
        self.free.push(index);
        trace!(handle, kind = expected, "destroyed handle");
        slot.object
            .take()
            .ok_or_else(|| FfiError::invalid_handle(handle, expected))
    }

    pub fn remove_group(&mut self, handle: Handle) -> FfiResult<()> {
        self.remove(handle, GROUP).map(drop)
    }

    pub fn remove_table(&mut self, handle: Handle) -> FfiResult<()> {
        self.remove(handle, TABLE).map(drop)
    }

    pub fn remove_query(&mut self, handle: Handle) -> FfiResult<()> {
        self.remove(handle, QUERY).map(drop)
    }

    pub fn remove_view(&mut self, handle: Handle) -> FfiResult<()> {
        self.remove(handle, VIEW).map(drop)
    }

    /// Returns true if `handle` is live and, for dependents, its group is too.
    pub fn is_live(&self, handle: Handle) -> bool {
        let Some(object) = self.lookup(handle) else {
            return false;
        };
        object.owner().map_or(true, |group| self.lookup(group).is_some())
    }

    /// Returns the number of live handles.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.object.is_some()).count()
    }

    pub fn group(&self, handle: Handle) -> FfiResult<&GroupState> {
        match self.get(handle, GROUP)? {
            Object::Group(group) => Ok(group),
            _ => Err(FfiError::invalid_handle(handle, GROUP)),
        }
    }

    pub fn group_mut(&mut self, handle: Handle) -> FfiResult<&mut GroupState> {
        let index = self.index_of(handle, GROUP)?;
        match self.slots[index].object.as_mut() {
            Some(Object::Group(group)) => Ok(group),
            _ => Err(FfiError::invalid_handle(handle, GROUP)),
        }
    }

    pub fn table(&self, handle: Handle) -> FfiResult<TableRef> {
        match self.get(handle, TABLE)? {
            Object::Table(table) => Ok(*table),
            _ => Err(FfiError::invalid_handle(handle, TABLE)),
        }
    }

    /// Runs `f` against a table's current source.
    pub fn with_table<R>(
        &self,
        handle: Handle,
        f: impl FnOnce(TableId, &Group) -> FfiResult<R>,
    ) -> FfiResult<R> {
        let table = self.table(handle)?;
        let source = self.group(table.group)?.source();
        f(table.table, &source)
    }

    /// Runs `f` against a table's writable group.
    pub fn with_table_mut<R>(
        &mut self,
        handle: Handle,
        f: impl FnOnce(TableId, &mut Group) -> FfiResult<R>,
    ) -> FfiResult<R> {
        let table = self.table(handle)?;
        let Access::Write(txid) = table.access else {
            return Err(FfiError::ReadOnly(
                "table handle was obtained outside a write transaction",
            ));
        };
        let group = self.group_mut(table.group)?.writable_by(txid)?;
        f(table.table, group)
    }

    /// Runs `f` against a query and its group's current source.
    pub fn with_query<R>(
        &mut self,
        handle: Handle,
        f: impl FnOnce(&mut Query, &Group) -> FfiResult<R>,
    ) -> FfiResult<R> {
        let (object, group) = self.with_owner(handle, QUERY)?;
        match object {
            Object::Query(query) => f(&mut query.query, &group.source()),
            _ => Err(FfiError::invalid_handle(handle, QUERY)),
        }
    }

    /// Runs `f` against a view and its group's current source.
    pub fn with_view<R>(
        &mut self,
        handle: Handle,
        f: impl FnOnce(&mut TableView, &Group) -> FfiResult<R>,
    ) -> FfiResult<R> {
        let (object, group) = self.with_owner(handle, VIEW)?;
        match object {
            Object::View(view) => f(&mut view.view, &group.source()),
            _ => Err(FfiError::invalid_handle(handle, VIEW)),
        }
    }

    /// Returns the group owning a query.
    pub fn query_group(&self, handle: Handle) -> FfiResult<Handle> {
        self.get(handle, QUERY)?
            .owner()
            .ok_or_else(|| FfiError::invalid_handle(handle, QUERY))
    }

    fn with_owner(
        &mut self,
        handle: Handle,
        expected: &'static str,
    ) -> FfiResult<(&mut Object, &GroupState)> {
        let child = self.index_of(handle, expected)?;
        let owner = self.slots[child]
            .object
            .as_ref()
            .and_then(Object::owner)
            .ok_or_else(|| FfiError::invalid_handle(handle, expected))?;
        let parent = self.index_of(owner, GROUP)?;
        let (child_slot, parent_slot) = two_mut(&mut self.slots, child, parent);
        match (child_slot.object.as_mut(), parent_slot.object.as_ref()) {
            (Some(object), Some(Object::Group(group))) => Ok((object, group)),
            _ => Err(FfiError::invalid_handle(handle, expected)),
        }
    }

    fn lookup(&self, handle: Handle) -> Option<&Object> {
        let index = usize::try_from(handle & 0xffff_ffff).ok()?.checked_sub(1)?;
        let slot = self.slots.get(index)?;
        if u64::from(slot.generation) != handle >> 32 {
            return None;
        }
        slot.object.as_ref()
    }

    fn get(&self, handle: Handle, expected: &'static str) -> FfiResult<&Object> {
        self.lookup(handle)
            .filter(|object| object.kind() == expected)
            .ok_or_else(|| FfiError::invalid_handle(handle, expected))
    }

    fn index_of(&self, handle: Handle, expected: &'static str) -> FfiResult<usize> {
        self.get(handle, expected)?;
        Ok((handle & 0xffff_ffff) as usize - 1)
    }
}

fn two_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

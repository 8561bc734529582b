//! Object registry
//!
//! Arena from opaque [`Handle`] to the [`HostValue`] a proxy stands for.
//! Slots only grow: a handle stays valid for as long as the registry lives
//! and is never reused. There is no per-object removal; entries are released
//! when the registry itself is dropped.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::error::{BridgeError, BridgeResult};
use crate::host::HostValue;

static NEXT_REGISTRY_ID: AtomicU32 = AtomicU32::new(1);

/// Opaque token identifying a registered host value
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    registry: u32,
    slot: u64,
}

impl Handle {
    /// Id of the registry that issued this handle
    #[inline]
    pub fn registry_id(self) -> u32 {
        self.registry
    }

    /// Slot index within the issuing registry
    #[inline]
    pub fn slot(self) -> u64 {
        self.slot
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}:{})", self.registry, self.slot)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.registry, self.slot)
    }
}

/// Handle-addressed store of proxied host values
pub struct ObjectRegistry {
    id: u32,
    entries: RwLock<Vec<HostValue>>,
}

impl ObjectRegistry {
    /// Create an empty registry with a process-unique id
    pub fn new() -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Process-unique id of this registry
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Store a value and return a fresh handle for it
    pub fn add(&self, value: HostValue) -> Handle {
        let mut entries = self.entries.write();
        let handle = Handle {
            registry: self.id,
            slot: entries.len() as u64,
        };
        trace!(target: "hostlink::registry", %handle, kind = value.type_name(), "registered value");
        entries.push(value);
        handle
    }

    /// Look up a registered value
    pub fn get(&self, handle: Handle) -> BridgeResult<HostValue> {
        if handle.registry != self.id {
            return Err(BridgeError::UnexpectedPointer { handle });
        }
        let entries = self.entries.read();
        usize::try_from(handle.slot)
            .ok()
            .and_then(|slot| entries.get(slot))
            .cloned()
            .ok_or(BridgeError::UnexpectedPointer { handle })
    }

    /// Check whether `handle` resolves in this registry
    pub fn contains(&self, handle: Handle) -> bool {
        handle.registry == self.id
            && usize::try_from(handle.slot).is_ok_and(|slot| slot < self.entries.read().len())
    }

    /// Number of registered values
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if nothing has been registered yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("id", &self.id)
            .field("len", &self.len())
            .finish()
    }
}

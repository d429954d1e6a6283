/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Monotonic rollback index bookkeeping for verified boot.

--*/

use vboot_error::{VbootError, VbootResult};

/// Which stored rollback index a version belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackRole {
    Firmware,
    Kernel,
}

/// A rollback version: the signing key version is the high half so a key
/// rotation dominates any data version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct RollbackVersion {
    pub key_version: u16,
    pub data_version: u16,
}

impl RollbackVersion {
    pub fn logical(&self) -> u32 {
        (u32::from(self.key_version) << 16) | u32::from(self.data_version)
    }

    pub fn from_logical(logical: u32) -> Self {
        Self {
            key_version: (logical >> 16) as u16,
            data_version: logical as u16,
        }
    }
}

/// Backing store for the rollback indices.
///
/// Writes are monotonic per role and refused after the store is locked for
/// the boot. The lock is irrevocable for the life of the store.
pub trait RollbackIndexStore {
    fn get_stored_version(&self, role: RollbackRole) -> VbootResult<RollbackVersion>;

    fn set_stored_version(
        &mut self,
        role: RollbackRole,
        version: RollbackVersion,
    ) -> VbootResult<()>;

    fn lock_versions_for_this_boot(&mut self) -> VbootResult<()>;
}

/// In-memory store, for hosts and tests.
#[derive(Default)]
pub struct MemoryRollbackStore {
    firmware: RollbackVersion,
    kernel: RollbackVersion,
    locked: bool,
}

impl MemoryRollbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with stored versions, as after previous boots.
    pub fn with_versions(firmware: RollbackVersion, kernel: RollbackVersion) -> Self {
        Self {
            firmware,
            kernel,
            locked: false,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn slot_mut(&mut self, role: RollbackRole) -> &mut RollbackVersion {
        match role {
            RollbackRole::Firmware => &mut self.firmware,
            RollbackRole::Kernel => &mut self.kernel,
        }
    }
}

impl RollbackIndexStore for MemoryRollbackStore {
    fn get_stored_version(&self, role: RollbackRole) -> VbootResult<RollbackVersion> {
        Ok(match role {
            RollbackRole::Firmware => self.firmware,
            RollbackRole::Kernel => self.kernel,
        })
    }

    fn set_stored_version(
        &mut self,
        role: RollbackRole,
        version: RollbackVersion,
    ) -> VbootResult<()> {
        if self.locked {
            return Err(VbootError::ROLLBACK_STORE_LOCKED);
        }
        let slot = self.slot_mut(role);
        if version.logical() < slot.logical() {
            return Err(VbootError::ROLLBACK_VERSION_TOO_LOW);
        }
        *slot = version;
        Ok(())
    }

    fn lock_versions_for_this_boot(&mut self) -> VbootResult<()> {
        // Idempotent; locking twice is not an error.
        self.locked = true;
        Ok(())
    }
}

/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    A/B boot target selection for verified boot.

--*/

use vboot_crypto::{DigestEngine, RsaPublicKey, RsaVerifier};
use vboot_error::VbootResult;
use vboot_image_verify::{
    firmware_logical_version, kernel_logical_version, logical_firmware_version,
    logical_kernel_version, ImageVerifier, TrustAnchorPolicy,
};
use vboot_rollback::{RollbackIndexStore, RollbackRole, RollbackVersion};

/// Outcome of A/B selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootTarget {
    A,
    B,
    Recovery,
}

/// A/B boot driver.
///
/// Slot priority is fixed, A before B; the driver recovers only by falling
/// to the other candidate or to `Recovery`, never by relaxing a check.
pub struct BootDriver<Env: DigestEngine + RsaVerifier> {
    verifier: ImageVerifier<Env>,
}

impl<Env: DigestEngine + RsaVerifier> BootDriver<Env> {
    pub fn new(env: Env) -> Self {
        Self {
            verifier: ImageVerifier::new(env),
        }
    }

    /// Choose a firmware slot. The root trust anchor is always enforced
    /// for firmware.
    pub fn select_firmware<S: RollbackIndexStore>(
        &self,
        store: &mut S,
        root_key: &RsaPublicKey,
        slot_a: &[u8],
        slot_b: &[u8],
    ) -> VbootResult<BootTarget> {
        self.select_slot(
            store,
            RollbackRole::Firmware,
            logical_firmware_version,
            |blob| {
                self.verifier
                    .verify_firmware(root_key, blob, TrustAnchorPolicy::Enforce)
                    .map(|info| firmware_logical_version(&info))
            },
            slot_a,
            slot_b,
        )
    }

    /// Choose a kernel slot, anchored on the firmware signing key.
    pub fn select_kernel<S: RollbackIndexStore>(
        &self,
        store: &mut S,
        firmware_key: &RsaPublicKey,
        slot_a: &[u8],
        slot_b: &[u8],
        policy: TrustAnchorPolicy,
    ) -> VbootResult<BootTarget> {
        self.select_slot(
            store,
            RollbackRole::Kernel,
            logical_kernel_version,
            |blob| {
                self.verifier
                    .verify_kernel(firmware_key, blob, policy)
                    .map(|info| kernel_logical_version(&info))
            },
            slot_a,
            slot_b,
        )
    }

    fn select_slot<S: RollbackIndexStore>(
        &self,
        store: &mut S,
        role: RollbackRole,
        fast_version: fn(&[u8]) -> u32,
        verify: impl Fn(&[u8]) -> VbootResult<u32>,
        slot_a: &[u8],
        slot_b: &[u8],
    ) -> VbootResult<BootTarget> {
        // Fast-path versions are untrusted; they only order rollback
        // comparisons. Decisions use the version a verification returned.
        let version_a = fast_version(slot_a);
        let version_b = fast_version(slot_b);
        let stored = store.get_stored_version(role)?.logical();

        let verified_a = verify(slot_a).ok();

        // If B claims to be newer than the store, verify it now so the
        // stored version can advance. Advance at most to the lower of the
        // two slot versions; a still-valid older copy must never start
        // counting as a rollback.
        let mut verified_b = None;
        let mut checked_b = false;
        if version_b > stored {
            verified_b = verify(slot_b).ok();
            checked_b = true;
            if verified_b.is_some() {
                let advance = version_a.min(version_b);
                if advance > stored {
                    store.set_stored_version(role, RollbackVersion::from_logical(advance))?;
                }
            }
        }

        store.lock_versions_for_this_boot()?;
        let stored = store.get_stored_version(role)?.logical();

        if let Some(version) = verified_a {
            if version >= stored {
                return Ok(BootTarget::A);
            }
        }
        if !checked_b {
            verified_b = verify(slot_b).ok();
        }
        if let Some(version) = verified_b {
            if version >= stored {
                return Ok(BootTarget::B);
            }
        }
        Ok(BootTarget::Recovery)
    }
}

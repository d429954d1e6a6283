/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Chained-trust verification for verified boot images.

--*/

mod verifier;

pub use verifier::{firmware_logical_version, kernel_logical_version, ImageVerifier};

use vboot_crypto::{SignatureAlgorithm, ROOT_SIGNATURE_ALGORITHM};
use vboot_image_types::{FirmwareImage, KernelImage, IMAGE_MAGIC_SIZE};

/// Whether the trust-anchor (key) signature is checked.
///
/// `Bypass` skips only that one check; header structure, the checksum, and
/// the remaining signatures are always enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustAnchorPolicy {
    Enforce,
    Bypass,
}

/// Versions and sizes extracted from a firmware image that verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVerificationInfo {
    pub firmware_len: u64,
    pub key_version: u16,
    pub firmware_version: u16,
}

/// Versions, sizes and bootloader addresses extracted from a kernel image
/// that verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelVerificationInfo {
    pub kernel_len: u64,
    pub key_version: u16,
    pub kernel_version: u16,
    pub bootloader_load_addr: u64,
    pub bootloader_entry_addr: u64,
}

/// Combine the two rollback version halves into one ordered value.
pub fn logical_version(key_version: u16, data_version: u16) -> u32 {
    (u32::from(key_version) << 16) | u32::from(data_version)
}

fn read_u16_at(blob: &[u8], offset: usize) -> Option<u16> {
    let bytes = blob.get(offset..offset + 2)?;
    Some(u16::from_ne_bytes([bytes[0], bytes[1]]))
}

/// Logical rollback version of a firmware blob, read at fixed offsets
/// without verifying anything.
///
/// Returns 0 for a blob too short or with an out-of-range algorithm id, so
/// a garbage blob sorts below every stored version. Only usable for
/// rollback ordering; never a substitute for verification.
pub fn logical_firmware_version(blob: &[u8]) -> u32 {
    let Some(alg_id) = read_u16_at(blob, IMAGE_MAGIC_SIZE + 2) else {
        return 0;
    };
    let Ok(algorithm) = SignatureAlgorithm::from_u16(alg_id) else {
        return 0;
    };
    let Some(key_version) = read_u16_at(blob, IMAGE_MAGIC_SIZE + 4) else {
        return 0;
    };
    let version_offset = IMAGE_MAGIC_SIZE
        + FirmwareImage::expected_header_len(algorithm)
        + ROOT_SIGNATURE_ALGORITHM.siglen();
    let Some(firmware_version) = read_u16_at(blob, version_offset) else {
        return 0;
    };
    logical_version(key_version, firmware_version)
}

/// Kernel counterpart of [`logical_firmware_version`].
pub fn logical_kernel_version(blob: &[u8]) -> u32 {
    let Some(falg_id) = read_u16_at(blob, IMAGE_MAGIC_SIZE + 4) else {
        return 0;
    };
    let Some(kalg_id) = read_u16_at(blob, IMAGE_MAGIC_SIZE + 6) else {
        return 0;
    };
    let (Ok(falg), Ok(kalg)) = (
        SignatureAlgorithm::from_u16(falg_id),
        SignatureAlgorithm::from_u16(kalg_id),
    ) else {
        return 0;
    };
    let Some(key_version) = read_u16_at(blob, IMAGE_MAGIC_SIZE + 8) else {
        return 0;
    };
    let version_offset =
        IMAGE_MAGIC_SIZE + KernelImage::expected_header_len(kalg) + falg.siglen();
    let Some(kernel_version) = read_u16_at(blob, version_offset) else {
        return 0;
    };
    logical_version(key_version, kernel_version)
}

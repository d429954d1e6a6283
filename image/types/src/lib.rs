/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains data structures for the verified boot image formats.

--*/

mod firmware;
mod kernel;

pub use firmware::FirmwareImage;
pub use kernel::KernelImage;

/// Magic bytes shared by the firmware and kernel image formats.
pub const IMAGE_MAGIC: &[u8; IMAGE_MAGIC_SIZE] = b"CHROMEOS";
pub const IMAGE_MAGIC_SIZE: usize = 8;

/// Header checksum is always SHA-512, independent of the signing algorithm.
pub const HEADER_CHECKSUM_BYTE_SIZE: usize = 64;

/// Firmware preamble: firmware_version (u16) + firmware_len (u64).
pub const FIRMWARE_PREAMBLE_BYTE_SIZE: usize = 10;

/// Kernel config: kernel_version (u16) + kernel_len (u64) +
/// bootloader_load_addr (u64) + bootloader_entry_addr (u64).
pub const KERNEL_CONFIG_BYTE_SIZE: usize = 26;

/// Current kernel key header version.
pub const KERNEL_HEADER_VERSION: u16 = 1;

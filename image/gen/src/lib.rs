/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains data structures for the verified boot image generator.

--*/

mod generator;

pub use generator::ImageGenerator;

use vboot_crypto::{DigestAlgorithm, RsaPublicKey, SignatureAlgorithm};

/// Image Generator Crypto Trait
///
/// Host-side signing primitives. The private key representation belongs to
/// the backend.
pub trait ImageGeneratorCrypto {
    type PrivKey;

    /// Calculate a message digest
    fn digest(&self, data: &[u8], algorithm: DigestAlgorithm) -> anyhow::Result<Vec<u8>>;

    /// Produce a PKCS#1 v1.5 signature over a precomputed digest
    fn rsa_sign(
        &self,
        digest: &[u8],
        priv_key: &Self::PrivKey,
        algorithm: SignatureAlgorithm,
    ) -> anyhow::Result<Vec<u8>>;

    /// Pre-processed public half of a private key
    fn public_key(&self, priv_key: &Self::PrivKey) -> anyhow::Result<RsaPublicKey>;
}

/// Firmware Image Generator Configuration
pub struct FirmwareGeneratorConfig<'a, C: ImageGeneratorCrypto> {
    pub sign_algorithm: SignatureAlgorithm,

    pub key_version: u16,

    pub firmware_version: u16,

    /// Root key that signs the key header. `None` leaves the key signature
    /// zeroed, for images verified with the trust anchor bypassed.
    pub root_key: Option<&'a C::PrivKey>,

    /// Firmware signing key embedded in the header.
    pub signing_key: &'a C::PrivKey,

    pub data: &'a [u8],
}

/// Kernel Image Generator Configuration
pub struct KernelGeneratorConfig<'a, C: ImageGeneratorCrypto> {
    pub firmware_sign_algorithm: SignatureAlgorithm,

    pub kernel_sign_algorithm: SignatureAlgorithm,

    pub key_version: u16,

    pub kernel_version: u16,

    pub bootloader_load_addr: u64,

    pub bootloader_entry_addr: u64,

    /// Firmware key that signs the kernel key header. `None` leaves the
    /// key signature zeroed.
    pub firmware_key: Option<&'a C::PrivKey>,

    /// Kernel signing key embedded in the header.
    pub signing_key: &'a C::PrivKey,

    pub data: &'a [u8],
}

/*++

Licensed under the Apache-2.0 license.

File Name:

    verifier.rs

Abstract:

    This file is the main implementation of the verified boot image verifier.

--*/

use crate::{
    logical_version, FirmwareVerificationInfo, KernelVerificationInfo, TrustAnchorPolicy,
};
use vboot_crypto::{DigestContext, DigestEngine, RsaPublicKey, RsaVerifier, ROOT_SIGNATURE_ALGORITHM};
use vboot_error::{VbootError, VbootResult};
use vboot_image_types::{FirmwareImage, KernelImage};

/// Image Verifier
///
/// Walks the chain of trust of one image in a single deterministic pass:
/// key header first, then the version preamble, then the payload. The first
/// failed check wins; nothing is retried or relaxed.
pub struct ImageVerifier<Env: DigestEngine + RsaVerifier> {
    /// Verification Environment
    env: Env,
}

impl<Env: DigestEngine + RsaVerifier> ImageVerifier<Env> {
    /// Create a new instance of `ImageVerifier`
    ///
    /// # Arguments
    ///
    /// * `env` - Environment supplying the digest and RSA primitives
    pub fn new(env: Env) -> Self {
        Self { env }
    }

    /// Verify a serialized firmware image against a root public key.
    ///
    /// # Arguments
    ///
    /// * `root_key` - Trust anchor; signs the key header with the fixed
    ///   root signing algorithm
    /// * `blob`     - Serialized image
    /// * `policy`   - Whether the trust-anchor signature is enforced
    pub fn verify_firmware(
        &self,
        root_key: &RsaPublicKey,
        blob: &[u8],
        policy: TrustAnchorPolicy,
    ) -> VbootResult<FirmwareVerificationInfo> {
        let image = FirmwareImage::parse(&self.env, blob)?;
        self.verify_firmware_image(root_key, &image, policy)
    }

    /// Verify an already-parsed firmware image.
    pub fn verify_firmware_image(
        &self,
        root_key: &RsaPublicKey,
        image: &FirmwareImage,
        policy: TrustAnchorPolicy,
    ) -> VbootResult<FirmwareVerificationInfo> {
        let header = image.header_bytes();
        if policy == TrustAnchorPolicy::Enforce {
            let digest = self
                .env
                .digest_buffer(&header, ROOT_SIGNATURE_ALGORITHM.digest_algorithm());
            if !self.env.rsa_verify(
                root_key,
                &image.key_signature,
                &digest,
                ROOT_SIGNATURE_ALGORITHM,
            )? {
                return Err(VbootError::VERIFY_KEY_SIGNATURE_FAILED);
            }
        }

        // From here on the header-embedded key is trusted (or deliberately
        // bypassed) and signs everything else.
        let algorithm = image.sign_algorithm;
        let preamble = image.preamble_bytes();

        let digest = self.env.digest_buffer(&preamble, algorithm.digest_algorithm());
        if !self
            .env
            .rsa_verify(&image.signing_key, &image.preamble_signature, &digest, algorithm)?
        {
            return Err(VbootError::VERIFY_PREAMBLE_SIGNATURE_FAILED);
        }

        // The payload signature covers preamble ++ payload, binding the
        // payload to its version so it cannot be spliced under another
        // preamble.
        let mut ctx = self.env.digest_init(algorithm.digest_algorithm());
        ctx.update(&preamble);
        ctx.update(&image.data);
        let digest = ctx.finish();
        if !self
            .env
            .rsa_verify(&image.signing_key, &image.firmware_signature, &digest, algorithm)?
        {
            return Err(VbootError::VERIFY_PAYLOAD_SIGNATURE_FAILED);
        }

        Ok(FirmwareVerificationInfo {
            firmware_len: image.firmware_len,
            key_version: image.key_version,
            firmware_version: image.firmware_version,
        })
    }

    /// Verify a serialized kernel image against the firmware signing key
    /// that anchors it.
    ///
    /// The extra hop below the root: the kernel key header is signed by the
    /// firmware key using the algorithm the header records for it.
    pub fn verify_kernel(
        &self,
        firmware_key: &RsaPublicKey,
        blob: &[u8],
        policy: TrustAnchorPolicy,
    ) -> VbootResult<KernelVerificationInfo> {
        let image = KernelImage::parse(&self.env, blob)?;
        self.verify_kernel_image(firmware_key, &image, policy)
    }

    /// Verify an already-parsed kernel image.
    pub fn verify_kernel_image(
        &self,
        firmware_key: &RsaPublicKey,
        image: &KernelImage,
        policy: TrustAnchorPolicy,
    ) -> VbootResult<KernelVerificationInfo> {
        let header = image.header_bytes();
        if policy == TrustAnchorPolicy::Enforce {
            let falg = image.firmware_sign_algorithm;
            let digest = self.env.digest_buffer(&header, falg.digest_algorithm());
            if !self
                .env
                .rsa_verify(firmware_key, &image.key_signature, &digest, falg)?
            {
                return Err(VbootError::VERIFY_KEY_SIGNATURE_FAILED);
            }
        }

        let algorithm = image.kernel_sign_algorithm;
        let config = image.config_bytes();

        let digest = self.env.digest_buffer(&config, algorithm.digest_algorithm());
        if !self
            .env
            .rsa_verify(&image.signing_key, &image.config_signature, &digest, algorithm)?
        {
            return Err(VbootError::VERIFY_PREAMBLE_SIGNATURE_FAILED);
        }

        // Kernel payload signatures cover the payload alone; the config is
        // bound only by its own signature.
        let digest = self
            .env
            .digest_buffer(&image.data, algorithm.digest_algorithm());
        if !self
            .env
            .rsa_verify(&image.signing_key, &image.kernel_signature, &digest, algorithm)?
        {
            return Err(VbootError::VERIFY_PAYLOAD_SIGNATURE_FAILED);
        }

        Ok(KernelVerificationInfo {
            kernel_len: image.kernel_len,
            key_version: image.key_version,
            kernel_version: image.kernel_version,
            bootloader_load_addr: image.bootloader_load_addr,
            bootloader_entry_addr: image.bootloader_entry_addr,
        })
    }
}

/// Logical rollback version of a firmware info record.
pub fn firmware_logical_version(info: &FirmwareVerificationInfo) -> u32 {
    logical_version(info.key_version, info.firmware_version)
}

/// Logical rollback version of a kernel info record.
pub fn kernel_logical_version(info: &KernelVerificationInfo) -> u32 {
    logical_version(info.key_version, info.kernel_version)
}

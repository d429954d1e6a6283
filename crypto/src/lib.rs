/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Algorithm identifiers and crypto primitive contracts for verified boot.

    The digest and RSA primitives themselves are supplied by a backend
    implementing the traits below; this crate only fixes the call contract
    and the pre-processed public key format.

--*/

mod algorithm;
mod cursor;
mod pubkey;

pub use algorithm::{DigestAlgorithm, SignatureAlgorithm, ROOT_SIGNATURE_ALGORITHM};
pub use cursor::Cursor;
pub use pubkey::RsaPublicKey;

use vboot_error::VbootResult;

/// Incremental digest computation.
pub trait DigestContext {
    fn update(&mut self, data: &[u8]);

    fn finish(self) -> Vec<u8>;
}

/// Message digest engine.
///
/// Algorithm selection is by enum, so an out-of-range id is unrepresentable
/// here; untrusted ids are rejected earlier by
/// [`SignatureAlgorithm::from_u16`].
pub trait DigestEngine {
    type Context: DigestContext;

    fn digest_init(&self, algorithm: DigestAlgorithm) -> Self::Context;

    /// One-shot digest of a buffer.
    fn digest_buffer(&self, data: &[u8], algorithm: DigestAlgorithm) -> Vec<u8> {
        let mut ctx = self.digest_init(algorithm);
        ctx.update(data);
        ctx.finish()
    }
}

/// RSA PKCS#1 v1.5 signature check over a precomputed digest.
pub trait RsaVerifier {
    /// Returns `Ok(false)` when the signature does not check out, including
    /// a signature or key whose length disagrees with `algorithm`. `Err` is
    /// reserved for backend faults.
    fn rsa_verify(
        &self,
        key: &RsaPublicKey,
        signature: &[u8],
        digest: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> VbootResult<bool>;
}

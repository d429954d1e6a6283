/*++

Licensed under the Apache-2.0 license.

File Name:

    algorithm.rs

Abstract:

    Signature and digest algorithm identifiers.

--*/

use vboot_error::{VbootError, VbootResult};

/// Algorithm used for the root-of-trust (key block) signature.
pub const ROOT_SIGNATURE_ALGORITHM: SignatureAlgorithm = SignatureAlgorithm::Rsa8192Sha512;

/// Message digest algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    /// Digest size in bytes.
    pub fn digest_size(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha512 => 64,
        }
    }
}

/// Signature algorithm: an RSA key size class paired with a digest.
///
/// The wire ids 0..=11 match the original signing tools; id 11
/// (RSA-8192/SHA-512) is reserved for root-of-trust operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SignatureAlgorithm {
    Rsa1024Sha1 = 0,
    Rsa1024Sha256 = 1,
    Rsa1024Sha512 = 2,
    Rsa2048Sha1 = 3,
    Rsa2048Sha256 = 4,
    Rsa2048Sha512 = 5,
    Rsa4096Sha1 = 6,
    Rsa4096Sha256 = 7,
    Rsa4096Sha512 = 8,
    Rsa8192Sha1 = 9,
    Rsa8192Sha256 = 10,
    Rsa8192Sha512 = 11,
}

impl SignatureAlgorithm {
    /// Parse a wire algorithm id.
    pub fn from_u16(id: u16) -> VbootResult<Self> {
        match id {
            0 => Ok(SignatureAlgorithm::Rsa1024Sha1),
            1 => Ok(SignatureAlgorithm::Rsa1024Sha256),
            2 => Ok(SignatureAlgorithm::Rsa1024Sha512),
            3 => Ok(SignatureAlgorithm::Rsa2048Sha1),
            4 => Ok(SignatureAlgorithm::Rsa2048Sha256),
            5 => Ok(SignatureAlgorithm::Rsa2048Sha512),
            6 => Ok(SignatureAlgorithm::Rsa4096Sha1),
            7 => Ok(SignatureAlgorithm::Rsa4096Sha256),
            8 => Ok(SignatureAlgorithm::Rsa4096Sha512),
            9 => Ok(SignatureAlgorithm::Rsa8192Sha1),
            10 => Ok(SignatureAlgorithm::Rsa8192Sha256),
            11 => Ok(SignatureAlgorithm::Rsa8192Sha512),
            _ => Err(VbootError::IMAGE_UNSUPPORTED_ALGORITHM),
        }
    }

    pub fn to_u16(self) -> u16 {
        self as u16
    }

    /// RSA modulus size in bytes.
    pub fn key_len_bytes(self) -> usize {
        match self {
            SignatureAlgorithm::Rsa1024Sha1
            | SignatureAlgorithm::Rsa1024Sha256
            | SignatureAlgorithm::Rsa1024Sha512 => 128,
            SignatureAlgorithm::Rsa2048Sha1
            | SignatureAlgorithm::Rsa2048Sha256
            | SignatureAlgorithm::Rsa2048Sha512 => 256,
            SignatureAlgorithm::Rsa4096Sha1
            | SignatureAlgorithm::Rsa4096Sha256
            | SignatureAlgorithm::Rsa4096Sha512 => 512,
            SignatureAlgorithm::Rsa8192Sha1
            | SignatureAlgorithm::Rsa8192Sha256
            | SignatureAlgorithm::Rsa8192Sha512 => 1024,
        }
    }

    /// Signature size in bytes. Equal to the modulus size.
    pub fn siglen(self) -> usize {
        self.key_len_bytes()
    }

    pub fn digest_algorithm(self) -> DigestAlgorithm {
        match self {
            SignatureAlgorithm::Rsa1024Sha1
            | SignatureAlgorithm::Rsa2048Sha1
            | SignatureAlgorithm::Rsa4096Sha1
            | SignatureAlgorithm::Rsa8192Sha1 => DigestAlgorithm::Sha1,
            SignatureAlgorithm::Rsa1024Sha256
            | SignatureAlgorithm::Rsa2048Sha256
            | SignatureAlgorithm::Rsa4096Sha256
            | SignatureAlgorithm::Rsa8192Sha256 => DigestAlgorithm::Sha256,
            SignatureAlgorithm::Rsa1024Sha512
            | SignatureAlgorithm::Rsa2048Sha512
            | SignatureAlgorithm::Rsa4096Sha512
            | SignatureAlgorithm::Rsa8192Sha512 => DigestAlgorithm::Sha512,
        }
    }

    /// Size in bytes of the pre-processed public key for this algorithm:
    /// modulus and Montgomery R^2 arrays plus the word count and n0inv
    /// fields.
    pub fn processed_key_size(self) -> usize {
        2 * self.key_len_bytes() + 2 * core::mem::size_of::<u32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_ids_round_trip() {
        for id in 0u16..=11 {
            let alg = SignatureAlgorithm::from_u16(id).unwrap();
            assert_eq!(alg.to_u16(), id);
        }
        assert_eq!(
            SignatureAlgorithm::from_u16(12).err(),
            Some(VbootError::IMAGE_UNSUPPORTED_ALGORITHM)
        );
        assert_eq!(
            SignatureAlgorithm::from_u16(u16::MAX).err(),
            Some(VbootError::IMAGE_UNSUPPORTED_ALGORITHM)
        );
    }

    #[test]
    fn test_key_and_signature_sizes() {
        assert_eq!(SignatureAlgorithm::Rsa1024Sha1.key_len_bytes(), 128);
        assert_eq!(SignatureAlgorithm::Rsa2048Sha256.key_len_bytes(), 256);
        assert_eq!(SignatureAlgorithm::Rsa4096Sha512.key_len_bytes(), 512);
        assert_eq!(SignatureAlgorithm::Rsa8192Sha512.key_len_bytes(), 1024);
        assert_eq!(SignatureAlgorithm::Rsa8192Sha512.siglen(), 1024);
        assert_eq!(
            SignatureAlgorithm::Rsa1024Sha256.processed_key_size(),
            2 * 128 + 8
        );
    }

    #[test]
    fn test_root_algorithm_is_rsa8192_sha512() {
        assert_eq!(ROOT_SIGNATURE_ALGORITHM.to_u16(), 11);
        assert_eq!(
            ROOT_SIGNATURE_ALGORITHM.digest_algorithm(),
            DigestAlgorithm::Sha512
        );
    }

    #[test]
    fn test_digest_sizes() {
        assert_eq!(DigestAlgorithm::Sha1.digest_size(), 20);
        assert_eq!(DigestAlgorithm::Sha256.digest_size(), 32);
        assert_eq!(DigestAlgorithm::Sha512.digest_size(), 64);
    }
}

/*++

Licensed under the Apache-2.0 license.

File Name:

    pubkey.rs

Abstract:

    Pre-processed RSA public key and its binary codec.

--*/

use crate::Cursor;
use vboot_error::{VbootError, VbootResult};
use zerocopy::AsBytes;

/// Pre-processed RSA public key.
///
/// Wire form: word count (u32), Montgomery n0inv (u32), modulus words,
/// then the Montgomery R^2 words. Words are u32 with word 0 holding the
/// least significant bits of the value. The public exponent is fixed at
/// 65537 and not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    /// -1 / modulus[0] mod 2^32.
    pub n0inv: u32,

    /// RSA modulus.
    pub modulus: Vec<u32>,

    /// R^2 mod n, where R = 2^(modulus bits).
    pub rr: Vec<u32>,
}

impl RsaPublicKey {
    /// Modulus size in bytes.
    pub fn key_len_bytes(&self) -> usize {
        self.modulus.len() * core::mem::size_of::<u32>()
    }

    /// Parse the pre-processed key form.
    ///
    /// The buffer must hold exactly one key; callers slice it out of the
    /// surrounding image using `SignatureAlgorithm::processed_key_size`,
    /// so leftover or missing bytes indicate a malformed image.
    pub fn parse(buf: &[u8]) -> VbootResult<Self> {
        let mut st = Cursor::new(buf);
        let word_count: u32 = st.read()?;
        // Validate the declared length before allocating for it.
        let expected = 8u64 + 8 * u64::from(word_count);
        if expected != buf.len() as u64 {
            return Err(VbootError::IMAGE_TRUNCATED_OR_OVERRUN_BUFFER);
        }
        let n0inv: u32 = st.read()?;
        let mut modulus = Vec::with_capacity(word_count as usize);
        for _ in 0..word_count {
            modulus.push(st.read::<u32>()?);
        }
        let mut rr = Vec::with_capacity(word_count as usize);
        for _ in 0..word_count {
            rr.push(st.read::<u32>()?);
        }
        if !st.is_empty() {
            return Err(VbootError::IMAGE_TRUNCATED_OR_OVERRUN_BUFFER);
        }
        Ok(Self { n0inv, modulus, rr })
    }

    /// Serialize to the pre-processed key form. Mirrors [`Self::parse`]
    /// field for field.
    pub fn serialize(&self) -> Vec<u8> {
        let word_count = self.modulus.len() as u32;
        let mut out = Vec::with_capacity(8 + 8 * self.modulus.len());
        out.extend_from_slice(word_count.as_bytes());
        out.extend_from_slice(self.n0inv.as_bytes());
        for word in &self.modulus {
            out.extend_from_slice(word.as_bytes());
        }
        for word in &self.rr {
            out.extend_from_slice(word.as_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> RsaPublicKey {
        RsaPublicKey {
            n0inv: 0xDEAD_BEEF,
            modulus: (0..32).collect(),
            rr: (100..132).collect(),
        }
    }

    #[test]
    fn test_round_trip() {
        let key = test_key();
        let buf = key.serialize();
        assert_eq!(buf.len(), 8 + 2 * 32 * 4);
        assert_eq!(RsaPublicKey::parse(&buf).unwrap(), key);
    }

    #[test]
    fn test_truncated_key_fails() {
        let buf = test_key().serialize();
        assert_eq!(
            RsaPublicKey::parse(&buf[..buf.len() - 1]).err(),
            Some(VbootError::IMAGE_TRUNCATED_OR_OVERRUN_BUFFER)
        );
    }

    #[test]
    fn test_trailing_bytes_fail() {
        let mut buf = test_key().serialize();
        buf.push(0);
        assert_eq!(
            RsaPublicKey::parse(&buf).err(),
            Some(VbootError::IMAGE_TRUNCATED_OR_OVERRUN_BUFFER)
        );
    }

    #[test]
    fn test_huge_word_count_rejected_without_alloc() {
        let mut buf = u32::MAX.as_bytes().to_vec();
        buf.extend_from_slice(&[0u8; 12]);
        assert_eq!(
            RsaPublicKey::parse(&buf).err(),
            Some(VbootError::IMAGE_TRUNCATED_OR_OVERRUN_BUFFER)
        );
    }
}

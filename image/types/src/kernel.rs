/*++

Licensed under the Apache-2.0 license.

File Name:

    kernel.rs

Abstract:

    Kernel image structure and its bit-exact binary codec.

--*/

use core::fmt;

use vboot_crypto::{Cursor, DigestAlgorithm, DigestEngine, RsaPublicKey, SignatureAlgorithm};
use vboot_error::{VbootError, VbootResult};
use zerocopy::AsBytes;

use crate::{HEADER_CHECKSUM_BYTE_SIZE, IMAGE_MAGIC, IMAGE_MAGIC_SIZE, KERNEL_CONFIG_BYTE_SIZE};

/// In-memory form of a verified boot kernel image.
///
/// Wire layout (native byte order, no padding):
/// magic ‖ header_version ‖ header_len ‖ firmware_sign_algorithm ‖
/// kernel_sign_algorithm ‖ kernel_key_version ‖ kernel_sign_key ‖
/// header_checksum ‖ kernel_key_signature ‖ kernel_version ‖ kernel_len ‖
/// bootloader_load_addr ‖ bootloader_entry_addr ‖ config_signature ‖
/// kernel_signature ‖ kernel_data.
///
/// Unlike firmware, the header is authenticated by the firmware signing
/// key (an extra trust hop below the root), and the payload signature
/// covers the payload alone rather than config ++ payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelImage {
    pub header_version: u16,

    /// Byte length of the header fields through the checksum.
    pub header_len: u16,

    /// Algorithm of the firmware signing key that authenticates this
    /// header; also sizes `key_signature`.
    pub firmware_sign_algorithm: SignatureAlgorithm,

    /// Algorithm of the embedded kernel signing key; covers the config
    /// and payload signatures.
    pub kernel_sign_algorithm: SignatureAlgorithm,

    /// Key version half of the rollback logical version.
    pub key_version: u16,

    /// Pre-processed public half of the kernel signing key.
    pub signing_key: RsaPublicKey,

    /// SHA-512 of the header bytes preceding this field.
    pub header_checksum: [u8; HEADER_CHECKSUM_BYTE_SIZE],

    /// Firmware key signature over the full header bytes.
    pub key_signature: Vec<u8>,

    /// Kernel version half of the rollback logical version.
    pub kernel_version: u16,

    /// Declared payload length. Always equals `data.len()` after a
    /// successful parse.
    pub kernel_len: u64,

    pub bootloader_load_addr: u64,

    pub bootloader_entry_addr: u64,

    /// Signature over the config bytes, by the embedded signing key.
    pub config_signature: Vec<u8>,

    /// Signature over the payload bytes alone, by the embedded signing
    /// key.
    pub kernel_signature: Vec<u8>,

    /// Payload.
    pub data: Vec<u8>,
}

impl KernelImage {
    /// Header length implied by the kernel signing algorithm's processed
    /// key size.
    pub fn expected_header_len(kernel_algorithm: SignatureAlgorithm) -> usize {
        // header_version + header_len + firmware_sign_algorithm +
        // kernel_sign_algorithm + kernel_key_version
        2 + 2 + 2 + 2 + 2 + kernel_algorithm.processed_key_size() + HEADER_CHECKSUM_BYTE_SIZE
    }

    /// Parse an image blob. Same structural guarantees as
    /// [`crate::FirmwareImage::parse`].
    pub fn parse<E: DigestEngine>(env: &E, buf: &[u8]) -> VbootResult<Self> {
        let mut st = Cursor::new(buf);

        let magic = st.take(IMAGE_MAGIC_SIZE)?;
        if magic != IMAGE_MAGIC {
            return Err(VbootError::IMAGE_WRONG_MAGIC);
        }

        let header_version: u16 = st.read()?;
        let header_len: u16 = st.read()?;
        let firmware_sign_algorithm = SignatureAlgorithm::from_u16(st.read()?)?;
        let kernel_sign_algorithm = SignatureAlgorithm::from_u16(st.read()?)?;
        if header_len as usize != Self::expected_header_len(kernel_sign_algorithm) {
            return Err(VbootError::IMAGE_INVALID_HEADER_LENGTH);
        }

        let key_version: u16 = st.read()?;
        let signing_key =
            RsaPublicKey::parse(st.take(kernel_sign_algorithm.processed_key_size())?)?;
        let mut header_checksum = [0u8; HEADER_CHECKSUM_BYTE_SIZE];
        header_checksum.copy_from_slice(st.take(HEADER_CHECKSUM_BYTE_SIZE)?);

        let checked_len = header_len as usize - HEADER_CHECKSUM_BYTE_SIZE;
        let computed = env.digest_buffer(
            &buf[IMAGE_MAGIC_SIZE..IMAGE_MAGIC_SIZE + checked_len],
            DigestAlgorithm::Sha512,
        );
        if computed != header_checksum {
            return Err(VbootError::IMAGE_HEADER_CHECKSUM_MISMATCH);
        }

        let key_signature = st.take(firmware_sign_algorithm.siglen())?.to_vec();

        let kernel_version: u16 = st.read()?;
        let kernel_len: u64 = st.read()?;
        let bootloader_load_addr: u64 = st.read()?;
        let bootloader_entry_addr: u64 = st.read()?;
        let config_signature = st.take(kernel_sign_algorithm.siglen())?.to_vec();
        let kernel_signature = st.take(kernel_sign_algorithm.siglen())?.to_vec();

        let data_len = usize::try_from(kernel_len)
            .map_err(|_| VbootError::IMAGE_TRUNCATED_OR_OVERRUN_BUFFER)?;
        let data = st.take(data_len)?.to_vec();
        if !st.is_empty() {
            return Err(VbootError::IMAGE_TRUNCATED_OR_OVERRUN_BUFFER);
        }

        Ok(Self {
            header_version,
            header_len,
            firmware_sign_algorithm,
            kernel_sign_algorithm,
            key_version,
            signing_key,
            header_checksum,
            key_signature,
            kernel_version,
            kernel_len,
            bootloader_load_addr,
            bootloader_entry_addr,
            config_signature,
            kernel_signature,
            data,
        })
    }

    /// The exact header bytes covered by the key signature.
    pub fn header_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header_len as usize);
        out.extend_from_slice(self.header_version.as_bytes());
        out.extend_from_slice(self.header_len.as_bytes());
        out.extend_from_slice(self.firmware_sign_algorithm.to_u16().as_bytes());
        out.extend_from_slice(self.kernel_sign_algorithm.to_u16().as_bytes());
        out.extend_from_slice(self.key_version.as_bytes());
        out.extend_from_slice(&self.signing_key.serialize());
        out.extend_from_slice(&self.header_checksum);
        out
    }

    /// The exact config bytes covered by the config signature.
    pub fn config_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(KERNEL_CONFIG_BYTE_SIZE);
        out.extend_from_slice(self.kernel_version.as_bytes());
        out.extend_from_slice(self.kernel_len.as_bytes());
        out.extend_from_slice(self.bootloader_load_addr.as_bytes());
        out.extend_from_slice(self.bootloader_entry_addr.as_bytes());
        out
    }

    /// Serialize the full image. Mirrors [`Self::parse`] field for field.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = self.serialize_vblock();
        out.extend_from_slice(&self.data);
        out
    }

    /// Serialize only the verification block: everything except the
    /// payload bytes.
    pub fn serialize_vblock(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(IMAGE_MAGIC);
        out.extend_from_slice(&self.header_bytes());
        out.extend_from_slice(&self.key_signature);
        out.extend_from_slice(&self.config_bytes());
        out.extend_from_slice(&self.config_signature);
        out.extend_from_slice(&self.kernel_signature);
        out
    }

    /// Size in bytes of everything preceding the payload, computed from
    /// the algorithm ids recorded in `blob` without parsing the rest.
    pub fn vblock_header_size(blob: &[u8]) -> VbootResult<u64> {
        if blob.len() < IMAGE_MAGIC_SIZE {
            return Err(VbootError::IMAGE_TRUNCATED_OR_OVERRUN_BUFFER);
        }
        if &blob[..IMAGE_MAGIC_SIZE] != IMAGE_MAGIC {
            return Err(VbootError::IMAGE_WRONG_MAGIC);
        }
        let algorithms_offset = IMAGE_MAGIC_SIZE + 2 + 2;
        let falg_bytes = blob
            .get(algorithms_offset..algorithms_offset + 4)
            .ok_or(VbootError::IMAGE_TRUNCATED_OR_OVERRUN_BUFFER)?;
        let falg =
            SignatureAlgorithm::from_u16(u16::from_ne_bytes([falg_bytes[0], falg_bytes[1]]))?;
        let kalg =
            SignatureAlgorithm::from_u16(u16::from_ne_bytes([falg_bytes[2], falg_bytes[3]]))?;
        Ok((IMAGE_MAGIC_SIZE
            + Self::expected_header_len(kalg)
            + falg.siglen()
            + KERNEL_CONFIG_BYTE_SIZE
            + 2 * kalg.siglen()) as u64)
    }
}

impl fmt::Display for KernelImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Header Version = {}", self.header_version)?;
        writeln!(f, "Header Length = {}", self.header_len)?;
        writeln!(
            f,
            "Firmware Signature Algorithm = {:?}",
            self.firmware_sign_algorithm
        )?;
        writeln!(
            f,
            "Kernel Signature Algorithm = {:?}",
            self.kernel_sign_algorithm
        )?;
        writeln!(f, "Kernel Key Version = {}", self.key_version)?;
        writeln!(f, "Kernel Version = {}", self.kernel_version)?;
        writeln!(f, "Kernel Length = {}", self.kernel_len)?;
        writeln!(f, "Bootloader Load Address = {:#x}", self.bootloader_load_addr)?;
        writeln!(
            f,
            "Bootloader Entry Address = {:#x}",
            self.bootloader_entry_addr
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::tests::{test_signing_key, TestEnv};
    use crate::KERNEL_HEADER_VERSION;

    fn test_image(env: &TestEnv) -> KernelImage {
        let falg = SignatureAlgorithm::Rsa2048Sha256;
        let kalg = SignatureAlgorithm::Rsa1024Sha512;
        let mut image = KernelImage {
            header_version: KERNEL_HEADER_VERSION,
            header_len: KernelImage::expected_header_len(kalg) as u16,
            firmware_sign_algorithm: falg,
            kernel_sign_algorithm: kalg,
            key_version: 2,
            signing_key: test_signing_key(kalg),
            header_checksum: [0u8; HEADER_CHECKSUM_BYTE_SIZE],
            key_signature: vec![0x11; falg.siglen()],
            kernel_version: 9,
            kernel_len: 7,
            bootloader_load_addr: 0x10_0000,
            bootloader_entry_addr: 0x10_0040,
            config_signature: vec![0x22; kalg.siglen()],
            kernel_signature: vec![0x33; kalg.siglen()],
            data: b"vmlinuz".to_vec(),
        };
        let header = image.header_bytes();
        let checksum = env.digest_buffer(
            &header[..header.len() - HEADER_CHECKSUM_BYTE_SIZE],
            DigestAlgorithm::Sha512,
        );
        image.header_checksum.copy_from_slice(&checksum);
        image
    }

    #[test]
    fn test_round_trip() {
        let env = TestEnv;
        let image = test_image(&env);
        let blob = image.serialize();
        let parsed = KernelImage::parse(&env, &blob).unwrap();
        assert_eq!(parsed, image);
    }

    #[test]
    fn test_wrong_magic() {
        let env = TestEnv;
        let mut blob = test_image(&env).serialize();
        blob[7] ^= 0xFF;
        assert_eq!(
            KernelImage::parse(&env, &blob).err(),
            Some(VbootError::IMAGE_WRONG_MAGIC)
        );
    }

    #[test]
    fn test_bad_header_len() {
        let env = TestEnv;
        let mut image = test_image(&env);
        image.header_len -= 2;
        assert_eq!(
            KernelImage::parse(&env, &image.serialize()).err(),
            Some(VbootError::IMAGE_INVALID_HEADER_LENGTH)
        );
    }

    #[test]
    fn test_header_checksum_detects_signing_key_tamper() {
        let env = TestEnv;
        let mut blob = test_image(&env).serialize();
        // Offset 18 is the first byte of the embedded signing key.
        blob[18] ^= 0x80;
        assert_eq!(
            KernelImage::parse(&env, &blob).err(),
            Some(VbootError::IMAGE_HEADER_CHECKSUM_MISMATCH)
        );
    }

    #[test]
    fn test_vblock_header_size() {
        let env = TestEnv;
        let image = test_image(&env);
        let blob = image.serialize();
        assert_eq!(
            KernelImage::vblock_header_size(&blob).unwrap(),
            image.serialize_vblock().len() as u64
        );
        assert_eq!(
            KernelImage::vblock_header_size(b"BADMAGIC").err(),
            Some(VbootError::IMAGE_WRONG_MAGIC)
        );
    }
}

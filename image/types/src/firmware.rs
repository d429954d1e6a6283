/*++

Licensed under the Apache-2.0 license.

File Name:

    firmware.rs

Abstract:

    Firmware image structure and its bit-exact binary codec.

--*/

use core::fmt;

use vboot_crypto::{
    Cursor, DigestAlgorithm, DigestEngine, RsaPublicKey, SignatureAlgorithm,
    ROOT_SIGNATURE_ALGORITHM,
};
use vboot_error::{VbootError, VbootResult};
use zerocopy::AsBytes;

use crate::{FIRMWARE_PREAMBLE_BYTE_SIZE, HEADER_CHECKSUM_BYTE_SIZE, IMAGE_MAGIC, IMAGE_MAGIC_SIZE};

/// In-memory form of a verified boot firmware image.
///
/// Wire layout (native byte order, no padding):
/// magic ‖ header_len ‖ firmware_sign_algorithm ‖ firmware_key_version ‖
/// firmware_sign_key ‖ header_checksum ‖ firmware_key_signature ‖
/// firmware_version ‖ firmware_len ‖ preamble_signature ‖
/// firmware_signature ‖ firmware_data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareImage {
    /// Byte length of the header: the fixed fields through the checksum,
    /// including the variable-length signing key.
    pub header_len: u16,

    /// Algorithm of the embedded signing key; covers the preamble and
    /// payload signatures. The key signature itself always uses the root
    /// signing algorithm.
    pub sign_algorithm: SignatureAlgorithm,

    /// Key version half of the rollback logical version.
    pub key_version: u16,

    /// Pre-processed public half of the firmware signing key.
    pub signing_key: RsaPublicKey,

    /// SHA-512 of the header bytes preceding this field.
    pub header_checksum: [u8; HEADER_CHECKSUM_BYTE_SIZE],

    /// Root key signature over the full header bytes. Fixed width: the
    /// root signing algorithm's signature size.
    pub key_signature: Vec<u8>,

    /// Firmware version half of the rollback logical version.
    pub firmware_version: u16,

    /// Declared payload length. Always equals `data.len()` after a
    /// successful parse.
    pub firmware_len: u64,

    /// Signature over the preamble bytes, by the embedded signing key.
    pub preamble_signature: Vec<u8>,

    /// Signature over preamble ++ payload, by the embedded signing key.
    /// The preamble is covered deliberately, so a payload cannot be
    /// spliced under a different preamble.
    pub firmware_signature: Vec<u8>,

    /// Payload.
    pub data: Vec<u8>,
}

impl FirmwareImage {
    /// Header length implied by the signing algorithm's processed key size.
    pub fn expected_header_len(algorithm: SignatureAlgorithm) -> usize {
        // header_len + firmware_sign_algorithm + firmware_key_version
        2 + 2 + 2 + algorithm.processed_key_size() + HEADER_CHECKSUM_BYTE_SIZE
    }

    /// Parse an image blob.
    ///
    /// Validates the magic, the header length, the header checksum, and
    /// every section length; the blob must be consumed exactly. Signature
    /// checks are the verification engine's job.
    pub fn parse<E: DigestEngine>(env: &E, buf: &[u8]) -> VbootResult<Self> {
        let mut st = Cursor::new(buf);

        let magic = st.take(IMAGE_MAGIC_SIZE)?;
        if magic != IMAGE_MAGIC {
            return Err(VbootError::IMAGE_WRONG_MAGIC);
        }

        let header_len: u16 = st.read()?;
        let sign_algorithm = SignatureAlgorithm::from_u16(st.read()?)?;
        if header_len as usize != Self::expected_header_len(sign_algorithm) {
            return Err(VbootError::IMAGE_INVALID_HEADER_LENGTH);
        }

        let key_version: u16 = st.read()?;
        let signing_key = RsaPublicKey::parse(st.take(sign_algorithm.processed_key_size())?)?;
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

        let key_signature = st.take(ROOT_SIGNATURE_ALGORITHM.siglen())?.to_vec();

        let firmware_version: u16 = st.read()?;
        let firmware_len: u64 = st.read()?;
        let preamble_signature = st.take(sign_algorithm.siglen())?.to_vec();
        let firmware_signature = st.take(sign_algorithm.siglen())?.to_vec();

        let data_len = usize::try_from(firmware_len)
            .map_err(|_| VbootError::IMAGE_TRUNCATED_OR_OVERRUN_BUFFER)?;
        let data = st.take(data_len)?.to_vec();
        if !st.is_empty() {
            return Err(VbootError::IMAGE_TRUNCATED_OR_OVERRUN_BUFFER);
        }

        Ok(Self {
            header_len,
            sign_algorithm,
            key_version,
            signing_key,
            header_checksum,
            key_signature,
            firmware_version,
            firmware_len,
            preamble_signature,
            firmware_signature,
            data,
        })
    }

    /// The exact header bytes covered by the key signature. The checksum
    /// covers these minus the trailing checksum field itself.
    pub fn header_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header_len as usize);
        out.extend_from_slice(self.header_len.as_bytes());
        out.extend_from_slice(self.sign_algorithm.to_u16().as_bytes());
        out.extend_from_slice(self.key_version.as_bytes());
        out.extend_from_slice(&self.signing_key.serialize());
        out.extend_from_slice(&self.header_checksum);
        out
    }

    /// The exact preamble bytes covered by the preamble and payload
    /// signatures.
    pub fn preamble_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FIRMWARE_PREAMBLE_BYTE_SIZE);
        out.extend_from_slice(self.firmware_version.as_bytes());
        out.extend_from_slice(self.firmware_len.as_bytes());
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
        out.extend_from_slice(&self.preamble_bytes());
        out.extend_from_slice(&self.preamble_signature);
        out.extend_from_slice(&self.firmware_signature);
        out
    }
}

impl fmt::Display for FirmwareImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Header Length = {}", self.header_len)?;
        writeln!(f, "Firmware Signature Algorithm = {:?}", self.sign_algorithm)?;
        writeln!(f, "Firmware Key Version = {}", self.key_version)?;
        writeln!(f, "Firmware Version = {}", self.firmware_version)?;
        writeln!(f, "Firmware Length = {}", self.firmware_len)
    }
}

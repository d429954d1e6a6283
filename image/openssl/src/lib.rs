/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains openssl-backed crypto needed to generate and verify images.

--*/

use std::path::Path;

use anyhow::{anyhow, Context};
use openssl::bn::{BigNum, BigNumContext};
use openssl::pkey::{HasPublic, Private, Public};
use openssl::rsa::{Padding, Rsa};
use openssl::sha::{Sha1, Sha256, Sha512};
use vboot_crypto::{
    DigestAlgorithm, DigestContext, DigestEngine, RsaPublicKey, RsaVerifier, SignatureAlgorithm,
};
use vboot_error::{VbootError, VbootResult};
use vboot_image_gen::ImageGeneratorCrypto;

/// PKCS#1 v1.5 DigestInfo prefixes; signature payload = prefix ++ digest.
const SHA1_DIGEST_INFO: &[u8] = &[
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14,
];
const SHA256_DIGEST_INFO: &[u8] = &[
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01,
    0x05, 0x00, 0x04, 0x20,
];
const SHA512_DIGEST_INFO: &[u8] = &[
    0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03,
    0x05, 0x00, 0x04, 0x40,
];

fn digest_info_prefix(algorithm: DigestAlgorithm) -> &'static [u8] {
    match algorithm {
        DigestAlgorithm::Sha1 => SHA1_DIGEST_INFO,
        DigestAlgorithm::Sha256 => SHA256_DIGEST_INFO,
        DigestAlgorithm::Sha512 => SHA512_DIGEST_INFO,
    }
}

#[derive(Default)]
pub struct OsslCrypto {}

pub enum OsslDigest {
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl DigestContext for OsslDigest {
    fn update(&mut self, data: &[u8]) {
        match self {
            OsslDigest::Sha1(ctx) => ctx.update(data),
            OsslDigest::Sha256(ctx) => ctx.update(data),
            OsslDigest::Sha512(ctx) => ctx.update(data),
        }
    }

    fn finish(self) -> Vec<u8> {
        match self {
            OsslDigest::Sha1(ctx) => ctx.finish().to_vec(),
            OsslDigest::Sha256(ctx) => ctx.finish().to_vec(),
            OsslDigest::Sha512(ctx) => ctx.finish().to_vec(),
        }
    }
}

impl DigestEngine for OsslCrypto {
    type Context = OsslDigest;

    fn digest_init(&self, algorithm: DigestAlgorithm) -> OsslDigest {
        match algorithm {
            DigestAlgorithm::Sha1 => OsslDigest::Sha1(Sha1::new()),
            DigestAlgorithm::Sha256 => OsslDigest::Sha256(Sha256::new()),
            DigestAlgorithm::Sha512 => OsslDigest::Sha512(Sha512::new()),
        }
    }
}

impl RsaVerifier for OsslCrypto {
    /// Raw public-key operation on the signature, then a byte-for-byte
    /// comparison against the expected DigestInfo encoding.
    fn rsa_verify(
        &self,
        key: &RsaPublicKey,
        signature: &[u8],
        digest: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> VbootResult<bool> {
        if signature.len() != algorithm.siglen()
            || key.key_len_bytes() != algorithm.key_len_bytes()
            || digest.len() != algorithm.digest_algorithm().digest_size()
        {
            return Ok(false);
        }
        let rsa = rsa_from_processed(key).map_err(|_| VbootError::CRYPTO_FAILURE)?;
        let mut decrypted = vec![0u8; rsa.size() as usize];
        // A padding failure here is a bad signature, not a backend fault.
        let len = match rsa.public_decrypt(signature, &mut decrypted, Padding::PKCS1) {
            Ok(len) => len,
            Err(_) => return Ok(false),
        };
        let mut expected = digest_info_prefix(algorithm.digest_algorithm()).to_vec();
        expected.extend_from_slice(digest);
        Ok(decrypted[..len] == expected[..])
    }
}

impl ImageGeneratorCrypto for OsslCrypto {
    type PrivKey = Rsa<Private>;

    fn digest(&self, data: &[u8], algorithm: DigestAlgorithm) -> anyhow::Result<Vec<u8>> {
        Ok(self.digest_buffer(data, algorithm))
    }

    fn rsa_sign(
        &self,
        digest: &[u8],
        priv_key: &Rsa<Private>,
        algorithm: SignatureAlgorithm,
    ) -> anyhow::Result<Vec<u8>> {
        if priv_key.size() as usize != algorithm.key_len_bytes() {
            return Err(anyhow!(
                "Signing key is {} bytes; algorithm {:?} needs {}",
                priv_key.size(),
                algorithm,
                algorithm.key_len_bytes()
            ));
        }
        let mut payload = digest_info_prefix(algorithm.digest_algorithm()).to_vec();
        payload.extend_from_slice(digest);
        let mut signature = vec![0u8; priv_key.size() as usize];
        let len = priv_key.private_encrypt(&payload, &mut signature, Padding::PKCS1)?;
        signature.truncate(len);
        Ok(signature)
    }

    fn public_key(&self, priv_key: &Rsa<Private>) -> anyhow::Result<RsaPublicKey> {
        rsa_public_key(priv_key)
    }
}

/// Compute the pre-processed public key form of an RSA key: the modulus as
/// little-endian-significance words, the Montgomery constant n0inv and
/// R^2 mod n.
pub fn rsa_public_key<T: HasPublic>(key: &Rsa<T>) -> anyhow::Result<RsaPublicKey> {
    let key_bytes = key.size() as usize;
    let word_count = key_bytes / 4;

    let modulus = le_words(&key.n().to_vec(), word_count)
        .ok_or_else(|| anyhow!("RSA modulus wider than the key size"))?;

    // rr = 2^(2 * keybits) mod n
    let mut ctx = BigNumContext::new()?;
    let mut shifted = BigNum::new()?;
    shifted.set_bit((2 * key_bytes * 8) as i32)?;
    let mut rr_bn = BigNum::new()?;
    rr_bn.nnmod(&shifted, key.n(), &mut ctx)?;
    let rr = le_words(&rr_bn.to_vec(), word_count)
        .ok_or_else(|| anyhow!("R^2 wider than the key size"))?;

    Ok(RsaPublicKey {
        n0inv: mont_n0inv(modulus[0]),
        modulus,
        rr,
    })
}

/// Read an RSA private key from a PEM file
pub fn rsa_priv_key_from_pem(path: &Path) -> anyhow::Result<Rsa<Private>> {
    let key_bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read private key PEM file {}", path.display()))?;
    Ok(Rsa::private_key_from_pem(&key_bytes)?)
}

/// Read an RSA public key from a PEM file in pre-processed form
pub fn rsa_pub_key_from_pem(path: &Path) -> anyhow::Result<RsaPublicKey> {
    let key_bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read public key PEM file {}", path.display()))?;
    let key = Rsa::public_key_from_pem(&key_bytes)?;
    rsa_public_key(&key)
}

/// Rebuild an openssl public key from the pre-processed form. The exponent
/// is the fixed 65537 the format implies.
fn rsa_from_processed(key: &RsaPublicKey) -> Result<Rsa<Public>, openssl::error::ErrorStack> {
    let mut be_bytes = Vec::with_capacity(key.key_len_bytes());
    for word in key.modulus.iter().rev() {
        be_bytes.extend_from_slice(&word.to_be_bytes());
    }
    let n = BigNum::from_slice(&be_bytes)?;
    let e = BigNum::from_u32(65537)?;
    Rsa::from_public_components(n, e)
}

/// Big-endian magnitude bytes to fixed-width words, word 0 least
/// significant. `None` when the value does not fit.
fn le_words(be_bytes: &[u8], word_count: usize) -> Option<Vec<u32>> {
    if be_bytes.len() > word_count * 4 {
        return None;
    }
    let mut padded = vec![0u8; word_count * 4 - be_bytes.len()];
    padded.extend_from_slice(be_bytes);
    Some(
        padded
            .rchunks(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

/// -1 / n0 mod 2^32, by Newton iteration on the odd low modulus word.
fn mont_n0inv(n0: u32) -> u32 {
    let mut inv = n0;
    for _ in 0..5 {
        inv = inv.wrapping_mul(2u32.wrapping_sub(n0.wrapping_mul(inv)));
    }
    inv.wrapping_neg()
}

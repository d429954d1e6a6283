/*++

Licensed under the Apache-2.0 license.

File Name:

    verify_images.rs

Abstract:

    End-to-end verification tests over really-signed images.

--*/

use std::sync::OnceLock;

use openssl::pkey::Private;
use openssl::rsa::Rsa;
use vboot_crypto::{RsaPublicKey, SignatureAlgorithm, ROOT_SIGNATURE_ALGORITHM};
use vboot_error::VbootError;
use vboot_image_gen::{FirmwareGeneratorConfig, ImageGenerator, KernelGeneratorConfig};
use vboot_image_openssl::{rsa_public_key, OsslCrypto};
use vboot_image_types::{FirmwareImage, KernelImage, IMAGE_MAGIC_SIZE};
use vboot_image_verify::{ImageVerifier, TrustAnchorPolicy};

/// Root keys are RSA-8192 and expensive to generate; share one per test
/// binary.
fn root_key() -> &'static (Rsa<Private>, RsaPublicKey) {
    static ROOT: OnceLock<(Rsa<Private>, RsaPublicKey)> = OnceLock::new();
    ROOT.get_or_init(|| {
        let key = Rsa::generate(8192).unwrap();
        let public = rsa_public_key(&key).unwrap();
        (key, public)
    })
}

fn signing_key() -> &'static (Rsa<Private>, RsaPublicKey) {
    static SIGNING: OnceLock<(Rsa<Private>, RsaPublicKey)> = OnceLock::new();
    SIGNING.get_or_init(|| {
        let key = Rsa::generate(1024).unwrap();
        let public = rsa_public_key(&key).unwrap();
        (key, public)
    })
}

fn generate_firmware(key_version: u16, firmware_version: u16, data: &[u8]) -> FirmwareImage {
    let generator = ImageGenerator::new(OsslCrypto::default());
    generator
        .generate_firmware(&FirmwareGeneratorConfig {
            sign_algorithm: SignatureAlgorithm::Rsa1024Sha256,
            key_version,
            firmware_version,
            root_key: Some(&root_key().0),
            signing_key: &signing_key().0,
            data,
        })
        .unwrap()
}

fn generate_kernel(key_version: u16, kernel_version: u16, data: &[u8]) -> KernelImage {
    let generator = ImageGenerator::new(OsslCrypto::default());
    generator
        .generate_kernel(&KernelGeneratorConfig {
            firmware_sign_algorithm: SignatureAlgorithm::Rsa1024Sha256,
            kernel_sign_algorithm: SignatureAlgorithm::Rsa1024Sha512,
            key_version,
            kernel_version,
            bootloader_load_addr: 0x0010_0000,
            bootloader_entry_addr: 0x0010_0040,
            firmware_key: Some(&signing_key().0),
            signing_key: &signing_key().0,
            data,
        })
        .unwrap()
}

#[test]
fn test_firmware_end_to_end() {
    let image = generate_firmware(1, 1, &[0x46u8; 1000]);
    let blob = image.serialize();
    let verifier = ImageVerifier::new(OsslCrypto::default());

    let info = verifier
        .verify_firmware(&root_key().1, &blob, TrustAnchorPolicy::Enforce)
        .unwrap();
    assert_eq!(info.key_version, 1);
    assert_eq!(info.firmware_version, 1);
    assert_eq!(info.firmware_len, 1000);

    // Rewrite firmware_version to 0 in the serialized preamble, leaving
    // the now-stale preamble signature in place.
    let version_offset = IMAGE_MAGIC_SIZE
        + FirmwareImage::expected_header_len(SignatureAlgorithm::Rsa1024Sha256)
        + ROOT_SIGNATURE_ALGORITHM.siglen();
    let mut rolled_back = blob.clone();
    rolled_back[version_offset..version_offset + 2].copy_from_slice(&0u16.to_ne_bytes());
    assert_eq!(
        verifier
            .verify_firmware(&root_key().1, &rolled_back, TrustAnchorPolicy::Enforce)
            .err(),
        Some(VbootError::VERIFY_PREAMBLE_SIGNATURE_FAILED)
    );
}

#[test]
fn test_firmware_round_trip() {
    let image = generate_firmware(2, 3, b"payload bytes");
    let env = OsslCrypto::default();
    let parsed = FirmwareImage::parse(&env, &image.serialize()).unwrap();
    assert_eq!(parsed, image);
}

#[test]
fn test_firmware_key_signature_corruption() {
    let mut image = generate_firmware(1, 1, b"data");
    image.key_signature[100] ^= 0xFF;
    let blob = image.serialize();
    let verifier = ImageVerifier::new(OsslCrypto::default());
    assert_eq!(
        verifier
            .verify_firmware(&root_key().1, &blob, TrustAnchorPolicy::Enforce)
            .err(),
        Some(VbootError::VERIFY_KEY_SIGNATURE_FAILED)
    );
    // Dev-mode bypass ignores the trust anchor but nothing else.
    assert!(verifier
        .verify_firmware(&root_key().1, &blob, TrustAnchorPolicy::Bypass)
        .is_ok());
}

#[test]
fn test_firmware_payload_tamper() {
    let mut image = generate_firmware(1, 1, b"payload");
    image.data[3] ^= 0x20;
    let verifier = ImageVerifier::new(OsslCrypto::default());
    assert_eq!(
        verifier
            .verify_firmware(
                &root_key().1,
                &image.serialize(),
                TrustAnchorPolicy::Enforce
            )
            .err(),
        Some(VbootError::VERIFY_PAYLOAD_SIGNATURE_FAILED)
    );
}

#[test]
fn test_firmware_header_tamper_detected_under_bypass() {
    let image = generate_firmware(1, 1, b"payload");
    let mut blob = image.serialize();
    // key_version field, covered by the header checksum.
    blob[IMAGE_MAGIC_SIZE + 4] ^= 0x01;
    let verifier = ImageVerifier::new(OsslCrypto::default());
    assert_eq!(
        verifier
            .verify_firmware(&root_key().1, &blob, TrustAnchorPolicy::Bypass)
            .err(),
        Some(VbootError::IMAGE_HEADER_CHECKSUM_MISMATCH)
    );
}

#[test]
fn test_firmware_payload_splice_rejected() {
    let source = generate_firmware(1, 1, b"same payload");
    let mut target = generate_firmware(1, 2, b"same payload");
    target.firmware_signature = source.firmware_signature.clone();
    target.data = source.data.clone();
    let verifier = ImageVerifier::new(OsslCrypto::default());
    assert_eq!(
        verifier
            .verify_firmware(
                &root_key().1,
                &target.serialize(),
                TrustAnchorPolicy::Enforce
            )
            .err(),
        Some(VbootError::VERIFY_PAYLOAD_SIGNATURE_FAILED)
    );
}

#[test]
fn test_kernel_end_to_end() {
    let image = generate_kernel(2, 5, b"kernel payload");
    let blob = image.serialize();
    let verifier = ImageVerifier::new(OsslCrypto::default());
    let info = verifier
        .verify_kernel(&signing_key().1, &blob, TrustAnchorPolicy::Enforce)
        .unwrap();
    assert_eq!(info.key_version, 2);
    assert_eq!(info.kernel_version, 5);
    assert_eq!(info.kernel_len, 14);
    assert_eq!(info.bootloader_load_addr, 0x0010_0000);

    let parsed = KernelImage::parse(&OsslCrypto::default(), &blob).unwrap();
    assert_eq!(parsed, image);
}

#[test]
fn test_kernel_wrong_anchor_key() {
    let image = generate_kernel(1, 1, b"kernel");
    let other = Rsa::generate(1024).unwrap();
    let other_public = rsa_public_key(&other).unwrap();
    let verifier = ImageVerifier::new(OsslCrypto::default());
    assert_eq!(
        verifier
            .verify_kernel(&other_public, &image.serialize(), TrustAnchorPolicy::Enforce)
            .err(),
        Some(VbootError::VERIFY_KEY_SIGNATURE_FAILED)
    );
}

#[test]
fn test_kernel_config_tamper() {
    let mut image = generate_kernel(1, 1, b"kernel");
    image.bootloader_load_addr ^= 0x1000;
    let verifier = ImageVerifier::new(OsslCrypto::default());
    assert_eq!(
        verifier
            .verify_kernel(
                &signing_key().1,
                &image.serialize(),
                TrustAnchorPolicy::Enforce
            )
            .err(),
        Some(VbootError::VERIFY_PREAMBLE_SIGNATURE_FAILED)
    );
}

#[test]
fn test_kernel_payload_tamper() {
    let mut image = generate_kernel(1, 1, b"kernel");
    image.data[0] ^= 0x01;
    let verifier = ImageVerifier::new(OsslCrypto::default());
    assert_eq!(
        verifier
            .verify_kernel(
                &signing_key().1,
                &image.serialize(),
                TrustAnchorPolicy::Enforce
            )
            .err(),
        Some(VbootError::VERIFY_PAYLOAD_SIGNATURE_FAILED)
    );
}

#[test]
fn test_logical_versions_from_blobs() {
    let firmware = generate_firmware(3, 7, b"fw");
    assert_eq!(
        vboot_image_verify::logical_firmware_version(&firmware.serialize()),
        0x0003_0007
    );
    let kernel = generate_kernel(4, 9, b"krn");
    assert_eq!(
        vboot_image_verify::logical_kernel_version(&kernel.serialize()),
        0x0004_0009
    );
}

/*++

Licensed under the Apache-2.0 license.

File Name:

    generator.rs

Abstract:

    Verified boot image generator.

--*/

use vboot_crypto::{DigestAlgorithm, SignatureAlgorithm, ROOT_SIGNATURE_ALGORITHM};
use vboot_image_types::{
    FirmwareImage, KernelImage, HEADER_CHECKSUM_BYTE_SIZE, KERNEL_HEADER_VERSION,
};

use crate::{FirmwareGeneratorConfig, ImageGeneratorCrypto, KernelGeneratorConfig};

/// Image generator
pub struct ImageGenerator<Crypto: ImageGeneratorCrypto> {
    crypto: Crypto,
}

impl<Crypto: ImageGeneratorCrypto> ImageGenerator<Crypto> {
    /// Create an instance of `ImageGenerator`
    pub fn new(crypto: Crypto) -> Self {
        Self { crypto }
    }

    /// Generate a fully signed firmware image
    ///
    /// # Arguments
    ///
    /// * `config` - Image generator configuration
    pub fn generate_firmware(
        &self,
        config: &FirmwareGeneratorConfig<Crypto>,
    ) -> anyhow::Result<FirmwareImage> {
        let algorithm = config.sign_algorithm;
        let signing_pub_key = self.crypto.public_key(config.signing_key)?;

        let mut image = FirmwareImage {
            header_len: FirmwareImage::expected_header_len(algorithm) as u16,
            sign_algorithm: algorithm,
            key_version: config.key_version,
            signing_key: signing_pub_key,
            header_checksum: [0u8; HEADER_CHECKSUM_BYTE_SIZE],
            key_signature: vec![0u8; ROOT_SIGNATURE_ALGORITHM.siglen()],
            firmware_version: config.firmware_version,
            firmware_len: config.data.len() as u64,
            preamble_signature: vec![0u8; algorithm.siglen()],
            firmware_signature: vec![0u8; algorithm.siglen()],
            data: config.data.to_vec(),
        };

        let header = image.header_bytes();
        self.checksum_header(&mut image.header_checksum, &header)?;

        // The key signature covers the finished header, checksum included.
        if let Some(root_key) = config.root_key {
            let digest = self.crypto.digest(
                &image.header_bytes(),
                ROOT_SIGNATURE_ALGORITHM.digest_algorithm(),
            )?;
            image.key_signature =
                self.crypto
                    .rsa_sign(&digest, root_key, ROOT_SIGNATURE_ALGORITHM)?;
        }

        let preamble = image.preamble_bytes();
        image.preamble_signature =
            self.sign(&preamble, config.signing_key, algorithm)?;

        // Payload signature covers preamble ++ payload.
        let mut signed = preamble;
        signed.extend_from_slice(&image.data);
        image.firmware_signature = self.sign(&signed, config.signing_key, algorithm)?;

        Ok(image)
    }

    /// Generate a fully signed kernel image
    pub fn generate_kernel(
        &self,
        config: &KernelGeneratorConfig<Crypto>,
    ) -> anyhow::Result<KernelImage> {
        let falg = config.firmware_sign_algorithm;
        let kalg = config.kernel_sign_algorithm;
        let signing_pub_key = self.crypto.public_key(config.signing_key)?;

        let mut image = KernelImage {
            header_version: KERNEL_HEADER_VERSION,
            header_len: KernelImage::expected_header_len(kalg) as u16,
            firmware_sign_algorithm: falg,
            kernel_sign_algorithm: kalg,
            key_version: config.key_version,
            signing_key: signing_pub_key,
            header_checksum: [0u8; HEADER_CHECKSUM_BYTE_SIZE],
            key_signature: vec![0u8; falg.siglen()],
            kernel_version: config.kernel_version,
            kernel_len: config.data.len() as u64,
            bootloader_load_addr: config.bootloader_load_addr,
            bootloader_entry_addr: config.bootloader_entry_addr,
            config_signature: vec![0u8; kalg.siglen()],
            kernel_signature: vec![0u8; kalg.siglen()],
            data: config.data.to_vec(),
        };

        let header = image.header_bytes();
        self.checksum_header(&mut image.header_checksum, &header)?;

        if let Some(firmware_key) = config.firmware_key {
            image.key_signature = self.sign(&image.header_bytes(), firmware_key, falg)?;
        }

        image.config_signature = self.sign(&image.config_bytes(), config.signing_key, kalg)?;

        // Kernel payload signature covers the payload alone.
        image.kernel_signature = self.sign(&image.data, config.signing_key, kalg)?;

        Ok(image)
    }

    fn checksum_header(
        &self,
        checksum: &mut [u8; HEADER_CHECKSUM_BYTE_SIZE],
        header: &[u8],
    ) -> anyhow::Result<()> {
        let digest = self.crypto.digest(
            &header[..header.len() - HEADER_CHECKSUM_BYTE_SIZE],
            DigestAlgorithm::Sha512,
        )?;
        checksum.copy_from_slice(&digest);
        Ok(())
    }

    fn sign(
        &self,
        data: &[u8],
        priv_key: &Crypto::PrivKey,
        algorithm: SignatureAlgorithm,
    ) -> anyhow::Result<Vec<u8>> {
        let digest = self.crypto.digest(data, algorithm.digest_algorithm())?;
        self.crypto.rsa_sign(&digest, priv_key, algorithm)
    }
}

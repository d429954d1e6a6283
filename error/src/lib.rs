/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains the error codes shared by the verified boot crates.

--*/
#![cfg_attr(not(feature = "std"), no_std)]

use core::fmt;
use core::num::NonZeroU32;

/// Verified boot error code.
///
/// Every failure in the trust chain resolves to one of these codes; parsing
/// and verification never recover silently.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VbootError(pub NonZeroU32);

pub type VbootResult<T> = Result<T, VbootError>;

/// Macro to define error constants ensuring uniqueness.
///
/// Takes a list of (name, value, description) tuples and generates a
/// constant for each code plus a test-only table used to assert that no
/// two codes collide.
macro_rules! define_error_constants {
    ($(($name:ident, $value:expr, $desc:expr)),* $(,)?) => {
        $(
            #[doc = $desc]
            pub const $name: VbootError = VbootError::new_const($value);
        )*

        fn describe(err: VbootError) -> &'static str {
            match err.0.get() {
                $($value => $desc,)*
                _ => "Unknown error.",
            }
        }

        #[cfg(test)]
        fn all_constants() -> &'static [(&'static str, u32)] {
            &[$((stringify!($name), $value),)*]
        }
    };
}

impl VbootError {
    /// Create an error code; intended for const contexts only, so that a
    /// zero value is a compile-time failure rather than a runtime panic.
    const fn new_const(val: u32) -> Self {
        match NonZeroU32::new(val) {
            Some(val) => Self(val),
            None => panic!("VbootError cannot be 0"),
        }
    }

    define_error_constants![
        (IMAGE_WRONG_MAGIC, 0x0001_0001, "Wrong image magic."),
        (IMAGE_INVALID_HEADER_LENGTH, 0x0001_0002, "Invalid header length."),
        (
            IMAGE_HEADER_CHECKSUM_MISMATCH,
            0x0001_0003,
            "Invalid header checksum."
        ),
        (
            IMAGE_UNSUPPORTED_ALGORITHM,
            0x0001_0004,
            "Invalid verification algorithm."
        ),
        (
            IMAGE_TRUNCATED_OR_OVERRUN_BUFFER,
            0x0001_0005,
            "Buffer underrun or overrun."
        ),
        (
            VERIFY_KEY_SIGNATURE_FAILED,
            0x0002_0001,
            "Key signature failed."
        ),
        (
            VERIFY_PREAMBLE_SIGNATURE_FAILED,
            0x0002_0002,
            "Preamble signature failed."
        ),
        (
            VERIFY_PAYLOAD_SIGNATURE_FAILED,
            0x0002_0003,
            "Payload signature failed."
        ),
        (
            ROLLBACK_VERSION_TOO_LOW,
            0x0003_0001,
            "Version rollback detected."
        ),
        (ROLLBACK_STORE_LOCKED, 0x0003_0002, "Rollback store locked."),
        (CRYPTO_FAILURE, 0x0004_0001, "Crypto backend failure."),
    ];
}

impl fmt::Display for VbootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(VbootError::describe(*self))
    }
}

impl From<VbootError> for u32 {
    fn from(err: VbootError) -> u32 {
        err.0.get()
    }
}

impl TryFrom<u32> for VbootError {
    type Error = ();

    fn try_from(val: u32) -> Result<Self, Self::Error> {
        match NonZeroU32::new(val) {
            Some(val) => Ok(Self(val)),
            None => Err(()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for VbootError {}

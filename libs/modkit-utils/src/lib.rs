//! Small shared utilities used by the device registry crates.
#![forbid(unsafe_code)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[cfg(feature = "humantime-serde")]
pub mod humantime_serde;
mod secret_string;

pub use secret_string::SecretString;

//! Random `DeviceID` attribute for the generated keybox.
//!
//! The identifier is decorative: it is not derived from the key material and has
//! no cryptographic meaning.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEVICE_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
pub const DEVICE_ID_MIN_LEN: usize = 2;
pub const DEVICE_ID_MAX_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Fresh identifier from the thread-local RNG
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Length uniform in `[DEVICE_ID_MIN_LEN, DEVICE_ID_MAX_LEN]`, each character
    /// uniform over [`DEVICE_ID_CHARSET`].
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let len = rng.gen_range(DEVICE_ID_MIN_LEN..=DEVICE_ID_MAX_LEN);
        let id = (0..len)
            .filter_map(|_| DEVICE_ID_CHARSET.choose(rng).copied())
            .map(char::from)
            .collect();
        Self(id)
    }

    /// Accept an existing identifier if it fits the generated shape.
    #[cfg(test)]
    pub(crate) fn parse(candidate: &str) -> Option<Self> {
        Self::is_well_formed(candidate).then(|| Self(candidate.to_string()))
    }

    /// Whether `candidate` could have come out of [`DeviceId::generate`].
    pub fn is_well_formed(candidate: &str) -> bool {
        (DEVICE_ID_MIN_LEN..=DEVICE_ID_MAX_LEN).contains(&candidate.len())
            && candidate.bytes().all(|b| DEVICE_ID_CHARSET.contains(&b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// 🆔 Identity Assigner - Stable 8-digit athlete id
//
// identity_id(name, year) = SHA-256("{name}_{year}") as a big-endian integer,
// mod 10^8, zero-padded to 8 digits. Same inputs give the same id on every
// run and every machine, which makes it usable as the join key for the
// link table.
//
// 8 decimal digits is a small space: collisions become likely past roughly
// 12-14k distinct identities (see `collision_probability`). Accepted; the
// format stays at 8 digits.

use sha2::{Digest, Sha256};

/// Size of the identity space (8 decimal digits)
pub const IDENTITY_SPACE: u64 = 100_000_000;

/// Width of the zero-padded identifier
pub const IDENTITY_WIDTH: usize = 8;

/// Hash input: "{name}_{year}", missing year renders as empty
pub fn identity_key(name: &str, year_of_birth: Option<i32>) -> String {
    match year_of_birth {
        Some(year) => format!("{}_{}", name, year),
        None => format!("{}_", name),
    }
}

pub fn identity_id(name: &str, year_of_birth: Option<i32>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity_key(name, year_of_birth).as_bytes());
    let digest = hasher.finalize();

    // Big-endian digest mod 10^8, one byte at a time
    let value = digest
        .iter()
        .fold(0u64, |acc, byte| (acc * 256 + *byte as u64) % IDENTITY_SPACE);

    format!("{:0width$}", value, width = IDENTITY_WIDTH)
}

/// Birthday bound: chance that at least two of `identities` ids collide
pub fn collision_probability(identities: u64) -> f64 {
    let n = identities as f64;
    1.0 - (-(n * (n - 1.0)) / (2.0 * IDENTITY_SPACE as f64)).exp()
}

// ============================================================================
// TESTS
// ============================================================================

//! Movie key hash functions.
//!
//! Keys are derived from the asset name and a per asset version seed
//! published with every release. Two incompatible hash generations exist;
//! the seed itself tells which one applies.

use serde::{Deserialize, Serialize};

/// Every derived key is reduced modulo this value. Seeds at or above it
/// belong to [`Generation::B`].
pub const KEY_MODULUS: u64 = 72_043_514_036_987_937;

/// Seeds of [`Generation::B`] carry the release generation above this factor.
pub const GENERATION_FACTOR: u64 = 10_000_000_000_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Generation {
    A,
    B,
}

impl Generation {
    pub fn of(seed: u64) -> Self {
        if seed < KEY_MODULUS { Self::A } else { Self::B }
    }
}

/// Kind of movie an asset name refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    #[default]
    Video,
    LoopCg,
}

impl AssetKind {
    /// Leading characters of the name ignored by [`Generation::B`].
    pub fn stripped(&self) -> usize {
        match self {
            Self::Video => 0,
            Self::LoopCg => 7,
        }
    }
}

/// Parameters of one derivation besides the name and seed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Context {
    pub kind: AssetKind,
    /// Release generation from a version table. When `None` it is taken from
    /// the seed.
    pub release_generation: Option<u64>,
}

impl Context {
    pub fn new(kind: AssetKind) -> Self {
        Self {
            kind,
            release_generation: None,
        }
    }

    pub fn release_generation(mut self, generation: u64) -> Self {
        self.release_generation = Some(generation);
        self
    }
}

/// Derives the key of `name`. The result is always below [`KEY_MODULUS`].
pub fn derive(name: &str, seed: u64, context: &Context) -> u64 {
    match Generation::of(seed) {
        Generation::A => seed.wrapping_add(fold(name.as_bytes(), 11)) % KEY_MODULUS,
        Generation::B => {
            let generation = context
                .release_generation
                .unwrap_or(seed / GENERATION_FACTOR);
            let mut chars = name.chars().skip(context.kind.stripped()).collect::<Vec<_>>();

            if !chars.is_empty() {
                let rotation = (generation % chars.len() as u64) as usize;
                chars.rotate_left(rotation);
            }

            let rotated = chars.into_iter().collect::<String>();
            (seed % GENERATION_FACTOR).wrapping_add(fold(rotated.as_bytes(), 7)) % KEY_MODULUS
        }
    }
}

fn fold(bytes: &[u8], multiplier: u64) -> u64 {
    bytes
        .iter()
        .fold(0u64, |hash, &byte| hash.wrapping_mul(multiplier).wrapping_add(byte as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_a_known_value() {
        assert_eq!(fold(b"abc", 11), 12914);
        assert_eq!(derive("abc", 100, &Context::default()), 13014);
    }

    #[test]
    fn test_generation_boundary() {
        assert_eq!(Generation::of(KEY_MODULUS - 1), Generation::A);
        assert_eq!(Generation::of(KEY_MODULUS), Generation::B);
    }

    #[test]
    fn test_generation_a_wraps_before_reduction() {
        let seed = KEY_MODULUS - 1;
        let expected = (seed + fold(b"CS_Test", 11)) % KEY_MODULUS;
        assert_eq!(derive("CS_Test", seed, &Context::default()), expected);
    }

    #[test]
    fn test_generation_b_rotates_by_generation() {
        // generation 8, per release seed 5
        let seed = 8 * GENERATION_FACTOR + 5;
        assert_eq!(Generation::of(seed), Generation::B);

        // 8 % 3 == 2, "abc" -> "cab"
        let expected = 5 + fold(b"cab", 7);
        assert_eq!(derive("abc", seed, &Context::default()), expected);
    }

    #[test]
    fn test_generation_b_strips_loop_cg_prefix() {
        let seed = 9 * GENERATION_FACTOR + 1000;

        // "LoopCG_" is stripped, 9 % 4 == 1, "Sky1" -> "ky1S"
        let expected = 1000 + fold(b"ky1S", 7);
        assert_eq!(
            derive("LoopCG_Sky1", seed, &Context::new(AssetKind::LoopCg)),
            expected
        );
    }

    #[test]
    fn test_generation_b_table_generation() {
        let seed = 8 * GENERATION_FACTOR + 5;
        let context = Context::default().release_generation(1);

        // 1 % 3 == 1, "abc" -> "bca"
        assert_eq!(derive("abc", seed, &context), 5 + fold(b"bca", 7));
    }

    #[test]
    fn test_generation_b_empty_remainder() {
        let seed = 8 * GENERATION_FACTOR + 5;
        assert_eq!(derive("LoopCG", seed, &Context::new(AssetKind::LoopCg)), 5);
    }

    #[test]
    fn test_derive_is_pure() {
        let context = Context::new(AssetKind::LoopCg);
        for seed in [0, 100, KEY_MODULUS - 1, KEY_MODULUS, u64::MAX] {
            let first = derive("Video_Intro_01", seed, &context);
            assert_eq!(first, derive("Video_Intro_01", seed, &context));
            assert!(first < KEY_MODULUS);
        }
    }
}

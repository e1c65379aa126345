//! Memorable video passwords.

use std::sync::LazyLock;

use rand::Rng;
use rand::seq::SliceRandom;

/// Number of words in a passphrase.
pub const WORD_COUNT: usize = 4;

const SEPARATOR: &str = "_";

/// Word list, one lowercase word per line.
static WORDS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    include_str!("words.txt")
        .lines()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .collect()
});

/// Generates a passphrase from the thread-local CSPRNG.
pub fn generate() -> String {
    generate_with(&mut rand::thread_rng())
}

/// Generates a passphrase from `rng`, e.g. `maple_orbit_lantern_fjord`.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..WORD_COUNT)
        .filter_map(|_| WORDS.choose(&mut *rng).copied())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

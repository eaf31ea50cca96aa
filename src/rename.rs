//! Collision-free substitute name generation and application.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, trace};

use crate::classify::occurrence_is_safe;
use crate::errors::{ObfuscateError, Result};
use crate::names;
use crate::options::ObfuscationLevel;
use crate::token::{Token, TokenKind};

/// First character of a generated name: never a digit.
const START_ALPHABET: &[u8] = b"lIoO_";
/// Remaining characters: visually ambiguous letters, digits, underscore.
const TAIL_ALPHABET: &[u8] = b"lIoO01_";

/// Fresh random candidates per length before the length widens by one.
const ATTEMPTS_PER_LENGTH: u32 = 40;

/// Widening past this length is a fatal `NamespaceExhausted`.
const NAME_LENGTH_CEILING: usize = 64;

/// One-to-one mapping from original identifier to generated substitute,
/// scoped to a single obfuscation run.
#[derive(Debug, Default)]
pub struct RenameMap {
    map: HashMap<String, String>,
}

impl RenameMap {
    /// Generate a substitute for each renameable name. Candidates colliding
    /// with already-assigned names, the protected set, or the keyword table
    /// are rejected and regenerated.
    pub fn build(
        renameable: &HashSet<String>,
        protected: &HashSet<String>,
        level: ObfuscationLevel,
        rng: &mut StdRng,
    ) -> Result<Self> {
        // Sorted order keeps generation deterministic under a fixed seed.
        let mut originals: Vec<&String> = renameable.iter().collect();
        originals.sort();

        let mut map = HashMap::with_capacity(originals.len());
        let mut used: HashSet<String> = HashSet::with_capacity(originals.len());
        let (min_len, max_len) = level.name_length_range();

        for original in originals {
            let substitute = fresh_name(rng, min_len, max_len, |candidate| {
                !used.contains(candidate)
                    && !protected.contains(candidate)
                    && !names::is_keyword(candidate)
                    && !names::is_builtin(candidate)
            })?;
            trace!(original = %original, substitute = %substitute, "assigned substitute");
            used.insert(substitute.clone());
            map.insert(original.clone(), substitute);
        }

        debug!(count = map.len(), "built rename map");
        Ok(Self { map })
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.map.get(original).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Rewrite identifier tokens whose text is in the map domain. Each
    /// occurrence is re-validated against its context neighbors before the
    /// substitution is attached.
    pub fn apply(&self, tokens: &mut [Token]) -> usize {
        let mut substitutions: Vec<(usize, String)> = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            if token.kind != TokenKind::Identifier {
                continue;
            }
            let Some(substitute) = self.get(&token.text) else {
                continue;
            };
            if !occurrence_is_safe(tokens, i) {
                // Whole-name classification should have caught this; the
                // occurrence-level guard keeps the output safe regardless.
                debug!(name = %token.text, index = i, "skipping unsafe occurrence");
                continue;
            }
            substitutions.push((i, substitute.to_string()));
        }
        let count = substitutions.len();
        for (i, substitute) in substitutions {
            tokens[i].replacement = Some(substitute);
        }
        count
    }
}

/// Generate a candidate of the requested length from the ambiguous alphabet,
/// retrying on collision. Attempts per length are bounded; on exhaustion the
/// length widens by one until the hard ceiling.
fn fresh_name(
    rng: &mut StdRng,
    min_len: usize,
    max_len: usize,
    mut is_free: impl FnMut(&str) -> bool,
) -> Result<String> {
    let mut length = rng.random_range(min_len..=max_len);
    loop {
        for _ in 0..ATTEMPTS_PER_LENGTH {
            let candidate = random_name(rng, length);
            if is_free(&candidate) {
                return Ok(candidate);
            }
        }
        length += 1;
        if length > NAME_LENGTH_CEILING {
            return Err(ObfuscateError::NamespaceExhausted { length });
        }
    }
}

fn random_name(rng: &mut StdRng, length: usize) -> String {
    let mut name = String::with_capacity(length);
    name.push(START_ALPHABET[rng.random_range(0..START_ALPHABET.len())] as char);
    for _ in 1..length {
        name.push(TAIL_ALPHABET[rng.random_range(0..TAIL_ALPHABET.len())] as char);
    }
    name
}

//! Pipeline coordinator: sequences the passes and rebuilds source text.
//!
//! All per-run state (rename map, used names, keys, literal dedup) is owned
//! by the run object, so concurrent runs never interfere. Randomness comes
//! from an injected generator; `with_seed` makes a run fully deterministic.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::classify::classify;
use crate::encrypt::{encrypt_literals, EncryptionScheme};
use crate::errors::{ObfuscateError, Result};
use crate::lexer::tokenize;
use crate::options::ObfuscationOptions;
use crate::rename::RenameMap;
use crate::token::{render, TokenKind};

/// Collaborator seam for cosmetic passes layered after the core stages.
///
/// Implementations receive well-formed rewritten source and may only insert
/// text between statement boundaries; they must not alter tokens the core
/// emitted.
pub trait CosmeticPass {
    fn name(&self) -> &'static str;
    fn apply(
        &self,
        source: &str,
        options: &ObfuscationOptions,
        rng: &mut StdRng,
    ) -> Result<String>;
}

/// Counters reported after a run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunStats {
    pub renamed_identifiers: usize,
    pub encrypted_strings: usize,
}

/// One obfuscation run: options, the injected randomness source, and any
/// registered cosmetic passes.
pub struct ObfuscationRun {
    options: ObfuscationOptions,
    rng: StdRng,
    cosmetic: Vec<Box<dyn CosmeticPass>>,
    stats: RunStats,
}

impl ObfuscationRun {
    pub fn new(options: ObfuscationOptions) -> Self {
        Self::with_rng(options, StdRng::from_os_rng())
    }

    /// Deterministic run for tests and reproducible builds.
    pub fn with_seed(options: ObfuscationOptions, seed: u64) -> Self {
        Self::with_rng(options, StdRng::seed_from_u64(seed))
    }

    fn with_rng(options: ObfuscationOptions, rng: StdRng) -> Self {
        Self {
            options,
            rng,
            cosmetic: Vec::new(),
            stats: RunStats::default(),
        }
    }

    pub fn push_cosmetic(&mut self, pass: Box<dyn CosmeticPass>) {
        self.cosmetic.push(pass);
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Fixed stage order: string encryption, then identifier renaming, then
    /// cosmetic passes. A failed run returns no output text at all.
    pub fn obfuscate(&mut self, source: &str) -> Result<String> {
        if source.trim().is_empty() {
            return Err(ObfuscateError::EmptyInput);
        }
        self.stats = RunStats::default();

        let mut text = source.to_string();
        if self.options.encrypt_strings {
            text = self.encrypt_stage(&text);
        }
        if self.options.rename_variables {
            text = self.rename_stage(&text)?;
        }
        for i in 0..self.cosmetic.len() {
            let stage = self.cosmetic[i].name();
            text = self.cosmetic[i]
                .apply(&text, &self.options, &mut self.rng)
                .map_err(|e| ObfuscateError::StageFailure {
                    stage,
                    message: e.to_string(),
                })?;
        }

        info!(
            renamed = self.stats.renamed_identifiers,
            encrypted = self.stats.encrypted_strings,
            "obfuscation complete"
        );
        Ok(text)
    }

    /// Stage 1: replace every string literal with an indexed lookup into the
    /// generated decoder table. Runs before renaming so literal content is
    /// never touched by identifier substitution.
    fn encrypt_stage(&mut self, source: &str) -> String {
        let mut tokens = tokenize(source);
        if !tokens.iter().any(|t| t.kind == TokenKind::Str) {
            debug!("no string literals; encryption stage is a no-op");
            return source.to_string();
        }
        let scheme = EncryptionScheme::for_level(self.options.level, &mut self.rng);
        let (entries, header) = encrypt_literals(&mut tokens, &scheme);
        self.stats.encrypted_strings = entries.len();
        debug!(
            layers = scheme.layer_count(),
            entries = entries.len(),
            "encryption stage complete"
        );
        let mut out = header;
        out.push_str(&render(&tokens));
        out
    }

    /// Stage 2: whole-name classification, map construction, and guarded
    /// per-occurrence substitution.
    fn rename_stage(&mut self, source: &str) -> Result<String> {
        let mut tokens = tokenize(source);
        let classes = classify(&tokens);
        let map = RenameMap::build(
            &classes.renameable,
            &classes.protected,
            self.options.level,
            &mut self.rng,
        )?;
        let substituted = map.apply(&mut tokens);
        self.stats.renamed_identifiers = map.len();
        debug!(
            names = map.len(),
            occurrences = substituted,
            "rename stage complete"
        );
        Ok(render(&tokens))
    }
}

/// Single entry point with OS-seeded randomness.
pub fn obfuscate(source: &str, options: &ObfuscationOptions) -> Result<String> {
    ObfuscationRun::new(options.clone()).obfuscate(source)
}

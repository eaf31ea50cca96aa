use luacloak::encrypt::{xor_cycle, EncryptionScheme};
use luacloak::names;
use luacloak::token::{next_significant, prev_significant, reconstruct};
use luacloak::{
    classify, tokenize, ObfuscationLevel, ObfuscationOptions, ObfuscationRun, RenameMap,
    TokenKind,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

// Property test configuration
const PROPTEST_CASES: u32 = 200;

// Strategy for identifiers that are neither keywords nor builtins
fn ident_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}"
        .prop_filter("keyword or builtin", |name| {
            !names::is_keyword(name) && !names::is_builtin(name)
        })
}

// Strategy for small Lua-like programs exercising every protecting context
fn lua_program_strategy() -> impl Strategy<Value = String> {
    let statement = (
        ident_strategy(),
        ident_strategy(),
        ident_strategy(),
        0u32..1000,
    )
        .prop_flat_map(|(a, b, c, n)| {
            prop_oneof![
                Just(format!("local {a} = {n}")),
                Just(format!("local {a} = {b}")),
                Just(format!("print({a})")),
                Just(format!("{a}.{b} = {c}")),
                Just(format!("{a}:{b}()")),
                Just(format!("local {a} = {{{b} = {n}}}")),
                Just(format!("local {a} = \"{c}\"")),
                Just(format!("-- {a} comment")),
            ]
        });
    prop::collection::vec(statement, 1..12).prop_map(|stmts| stmts.join("\n"))
}

fn levels() -> impl Strategy<Value = ObfuscationLevel> {
    prop_oneof![
        Just(ObfuscationLevel::Low),
        Just(ObfuscationLevel::Medium),
        Just(ObfuscationLevel::High),
    ]
}

#[cfg(test)]
mod tokenizer_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

        #[test]
        fn prop_reconstruction_is_lossless(source in any::<String>()) {
            let tokens = tokenize(&source);
            prop_assert_eq!(reconstruct(&tokens), source);
        }

        #[test]
        fn prop_tokenization_is_idempotent(source in any::<String>()) {
            let first = tokenize(&source);
            let second = tokenize(&reconstruct(&first));
            prop_assert_eq!(first.len(), second.len());
            for (a, b) in first.iter().zip(second.iter()) {
                prop_assert_eq!(a.kind, b.kind);
                prop_assert_eq!(&a.text, &b.text);
            }
        }

        #[test]
        fn prop_tokens_are_contiguous(source in lua_program_strategy()) {
            let tokens = tokenize(&source);
            let mut cursor = 0;
            for token in &tokens {
                prop_assert_eq!(token.start, cursor, "gap or overlap at {}", cursor);
                prop_assert_eq!(token.end - token.start, token.text.len());
                cursor = token.end;
            }
            prop_assert_eq!(cursor, source.len());
        }
    }
}

#[cfg(test)]
mod cipher_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

        #[test]
        fn prop_xor_round_trip(
            data in prop::collection::vec(any::<u8>(), 0..512),
            key in prop::collection::vec(any::<u8>(), 1..32),
        ) {
            prop_assert_eq!(xor_cycle(&xor_cycle(&data, &key), &key), data);
        }

        #[test]
        fn prop_scheme_round_trip(
            plaintext in any::<String>(),
            level in levels(),
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let scheme = EncryptionScheme::for_level(level, &mut rng);
            let ciphertext = scheme.encrypt(&plaintext);
            prop_assert_eq!(scheme.decrypt(&ciphertext), plaintext.as_bytes());
        }

        #[test]
        fn prop_ciphertext_is_printable_ascii(
            plaintext in any::<String>(),
            level in levels(),
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let scheme = EncryptionScheme::for_level(level, &mut rng);
            let ciphertext = scheme.encrypt(&plaintext);
            prop_assert!(ciphertext.bytes().all(|b| (0x20..0x7f).contains(&b)));
            // Embeddable in a quoted Lua literal without further escaping.
            prop_assert!(!ciphertext.contains('"'));
        }
    }
}

#[cfg(test)]
mod rename_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

        #[test]
        fn prop_map_image_is_distinct_and_keyword_free(
            source in lua_program_strategy(),
            level in levels(),
            seed in any::<u64>(),
        ) {
            let tokens = tokenize(&source);
            let classes = classify(&tokens);
            let mut rng = StdRng::seed_from_u64(seed);
            let map = RenameMap::build(&classes.renameable, &classes.protected, level, &mut rng)
                .unwrap();

            let mut image = HashSet::new();
            for original in &classes.renameable {
                let substitute = map.get(original).unwrap();
                prop_assert!(image.insert(substitute.to_string()), "duplicate {}", substitute);
                prop_assert!(!names::is_keyword(substitute));
                prop_assert!(!names::is_builtin(substitute));
                prop_assert!(!classes.protected.contains(substitute));
            }
        }

        #[test]
        fn prop_renamed_output_never_touches_member_position(
            source in lua_program_strategy(),
            seed in any::<u64>(),
        ) {
            let input_names: HashSet<String> = tokenize(&source)
                .into_iter()
                .filter(|t| t.kind == TokenKind::Identifier)
                .map(|t| t.text)
                .collect();

            let options = ObfuscationOptions {
                rename_variables: true,
                encrypt_strings: false,
                level: ObfuscationLevel::Low,
            };
            let out = ObfuscationRun::with_seed(options, seed).obfuscate(&source).unwrap();
            let tokens = tokenize(&out);

            for (i, token) in tokens.iter().enumerate() {
                if token.kind != TokenKind::Identifier || input_names.contains(&token.text) {
                    continue;
                }
                let prev = prev_significant(&tokens, i).map(|p| tokens[p].text.as_str());
                let next = next_significant(&tokens, i).map(|n| tokens[n].text.as_str());
                prop_assert!(!matches!(prev, Some(".") | Some(":")));
                prop_assert!(next != Some(":"));
            }
        }

        #[test]
        fn prop_obfuscated_output_retokenizes_losslessly(
            source in lua_program_strategy(),
            level in levels(),
            seed in any::<u64>(),
        ) {
            let options = ObfuscationOptions {
                rename_variables: true,
                encrypt_strings: true,
                level,
            };
            let out = ObfuscationRun::with_seed(options, seed).obfuscate(&source).unwrap();
            prop_assert_eq!(reconstruct(&tokenize(&out)), out);
        }
    }
}

use std::collections::HashSet;

use luacloak::names;
use luacloak::token::{next_significant, prev_significant};
use luacloak::{
    tokenize, ObfuscateError, ObfuscationLevel, ObfuscationOptions, ObfuscationRun, TokenKind,
};

fn opts(rename: bool, encrypt: bool, level: ObfuscationLevel) -> ObfuscationOptions {
    ObfuscationOptions {
        rename_variables: rename,
        encrypt_strings: encrypt,
        level,
    }
}

fn identifiers(source: &str) -> Vec<String> {
    tokenize(source)
        .into_iter()
        .filter(|t| t.kind == TokenKind::Identifier)
        .map(|t| t.text)
        .collect()
}

#[test]
fn scenario_a_rename_only() {
    let source = "local Foo = 5\nprint(Foo)";
    let mut run = ObfuscationRun::with_seed(opts(true, false, ObfuscationLevel::Low), 11);
    let out = run.obfuscate(source).unwrap();

    assert!(out.contains("local "), "keyword must survive");
    assert!(out.contains("print"), "builtin must survive");
    assert!(!out.contains("Foo"), "original name must be gone");

    let renamed: Vec<String> = identifiers(&out)
        .into_iter()
        .filter(|name| !names::is_builtin(name))
        .collect();
    assert_eq!(renamed.len(), 2, "both occurrences rewritten");
    assert_eq!(renamed[0], renamed[1], "occurrences rename identically");
    assert!(!names::is_keyword(&renamed[0]));
    assert_eq!(run.stats().renamed_identifiers, 1);
}

#[test]
fn scenario_b_method_name_is_never_renamed() {
    let source = "obj:Method()";
    let mut run = ObfuscationRun::with_seed(opts(true, false, ObfuscationLevel::Low), 5);
    let out = run.obfuscate(source).unwrap();
    assert!(out.contains(":Method()"));
    // `obj` precedes `:`, so the conservative classifier keeps it too.
    assert_eq!(out, source);
}

#[test]
fn scenario_c_bare_table_key_is_never_renamed() {
    let source = "local t = {Name = \"x\"}";
    let mut run = ObfuscationRun::with_seed(opts(true, false, ObfuscationLevel::Low), 5);
    let out = run.obfuscate(source).unwrap();
    assert!(out.contains("Name ="), "bare key must survive");
    assert!(!identifiers(&out).contains(&"t".to_string()), "`t` renamed");
}

#[test]
fn scenario_d_duplicate_literals_share_one_entry() {
    let source = "print(\"hello\")\nwarn(\"hello\")";
    let mut run = ObfuscationRun::with_seed(opts(false, true, ObfuscationLevel::Low), 9);
    let out = run.obfuscate(source).unwrap();

    assert_eq!(run.stats().encrypted_strings, 1);
    assert_eq!(out.matches("[1] = ").count(), 1, "exactly one table entry");
    assert!(!out.contains("[2] = "));
    assert_eq!(
        out.matches("(__strings[1])").count(),
        2,
        "both occurrences use the same indexed lookup"
    );
    assert!(!out.contains("\"hello\""), "plaintext must be gone");
}

#[test]
fn scenario_e_empty_input_is_rejected() {
    let mut run = ObfuscationRun::with_seed(ObfuscationOptions::default(), 1);
    assert!(matches!(run.obfuscate(""), Err(ObfuscateError::EmptyInput)));
}

#[test]
fn encrypted_output_carries_key_decoder_and_table_before_the_program() {
    let source = "local msg = \"secret\"\nprint(msg)";
    let mut run = ObfuscationRun::with_seed(opts(false, true, ObfuscationLevel::Medium), 21);
    let out = run.obfuscate(source).unwrap();

    let key_at = out.find("local _k1").expect("key declaration");
    let decoder_at = out.find("local function _d1").expect("decoder function");
    let table_at = out.find("local __strings").expect("literal table");
    let program_at = out.find("local msg").expect("rewritten program");
    assert!(key_at < decoder_at && decoder_at < table_at && table_at < program_at);
}

#[test]
fn high_level_emits_two_nested_decode_layers() {
    let source = "return \"layered\"";
    let mut run = ObfuscationRun::with_seed(opts(false, true, ObfuscationLevel::High), 33);
    let out = run.obfuscate(source).unwrap();
    assert!(out.contains("local _k2"));
    assert!(out.contains("_d1(_d2(\""));
    assert!(out.contains("local _a1"), "private alphabet for the inner layer");
}

#[test]
fn full_pipeline_renames_decoder_scaffolding_too() {
    let source = "local msg = \"secret\"\nprint(msg)";
    let mut run = ObfuscationRun::with_seed(opts(true, true, ObfuscationLevel::Low), 2);
    let out = run.obfuscate(source).unwrap();

    // The encryption stage runs first, so `_k1`, `_d1` and `__strings` are
    // ordinary locals renamed uniformly by stage 2.
    assert!(!out.contains("__strings"));
    assert!(!out.contains("_d1"));
    assert!(!out.contains("\"secret\""));
    // Builtins the decoder leans on survive renaming.
    for name in ["string", "table", "bit32", "char", "byte", "concat", "bxor"] {
        assert!(out.contains(name), "{name} must survive");
    }
}

#[test]
fn renamed_output_satisfies_the_context_safety_property() {
    let source = "local handler = {}\nfunction handler.run(job)\n    return job.Name\nend\nlocal x = handler\nprint(x:tostringy())\n";
    let input_names: HashSet<String> = identifiers(source).into_iter().collect();

    let mut run = ObfuscationRun::with_seed(opts(true, false, ObfuscationLevel::Medium), 17);
    let out = run.obfuscate(source).unwrap();
    let tokens = tokenize(&out);

    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Identifier || input_names.contains(&token.text) {
            continue;
        }
        // A generated name: its context must never be member/method position.
        let prev = prev_significant(&tokens, i).map(|p| tokens[p].text.as_str());
        let next = next_significant(&tokens, i).map(|n| tokens[n].text.as_str());
        assert!(
            !matches!(prev, Some(".") | Some(":")),
            "generated name {} sits after {:?}",
            token.text,
            prev
        );
        assert_ne!(next, Some(":"), "generated name {} sits before `:`", token.text);
    }
}

#[test]
fn independent_runs_share_no_state() {
    let source = "local alpha = \"one\"\nlocal beta = \"two\"\nprint(alpha, beta)";
    let options = opts(true, true, ObfuscationLevel::Medium);
    let out_a = ObfuscationRun::with_seed(options.clone(), 1)
        .obfuscate(source)
        .unwrap();
    let out_b = ObfuscationRun::with_seed(options.clone(), 1)
        .obfuscate(source)
        .unwrap();
    let out_c = ObfuscationRun::with_seed(options, 2).obfuscate(source).unwrap();
    assert_eq!(out_a, out_b, "same seed, same output");
    assert_ne!(out_a, out_c, "different seed, different names and keys");
}

#[test]
fn comments_and_whitespace_are_preserved_verbatim() {
    let source = "-- header comment\nlocal value = 1  -- trailing\n\n--[[ block ]]\nreturn value\n";
    let mut run = ObfuscationRun::with_seed(opts(true, false, ObfuscationLevel::Low), 4);
    let out = run.obfuscate(source).unwrap();
    assert!(out.contains("-- header comment"));
    assert!(out.contains("-- trailing"));
    assert!(out.contains("--[[ block ]]"));
    assert!(out.contains("\n\n"));
}

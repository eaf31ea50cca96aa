//! String-literal encryption: stream-XOR cipher, printable ciphertext
//! encodings, and emission of the matching Luau runtime decoder.
//!
//! The build-side encoder and the emitted decoder are two halves of one wire
//! format: every byte written here must be reconstructed exactly by the
//! generated Luau code. `EncryptionScheme::decrypt` mirrors the runtime
//! decode chain so the pairing is provable without running Lua.

use std::collections::HashMap;
use std::fmt::Write as _;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::options::ObfuscationLevel;
use crate::token::{Token, TokenKind};

pub const DEFAULT_KEY_LENGTH: usize = 16;

/// Generated table holding the decoded literals at run time.
pub const STRING_TABLE_NAME: &str = "__strings";

const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Base alphabet shuffled per run into a private 64-character alphabet.
/// None of these characters needs escaping inside a Lua string literal.
const BASE_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Padding sentinel for partial final groups; never a member of the alphabet.
const PAD: u8 = b'=';

/// Printable representation of one ciphertext layer.
///
/// The escape encodings are undone by the Lua *parser* when the literal is
/// read, so their runtime decoder is XOR-only; the alphabet encoding is
/// undone at run time by an inverse-lookup loop in the emitted decoder.
#[derive(Debug, Clone)]
pub enum Encoding {
    HexEscape,
    DecimalEscape,
    Alphabet([u8; 64]),
}

/// How the layer key lands in the generated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEmbedding {
    /// A plain string constant.
    Literal,
    /// Rebuilt at run time from per-character `string.char` stores, so no
    /// single greppable key string exists in the output.
    Constructed,
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub key: Vec<u8>,
    pub encoding: Encoding,
    pub embedding: KeyEmbedding,
}

/// {originalValue, printable ciphertext, stable 1-based table position}.
#[derive(Debug, Clone)]
pub struct StringTableEntry {
    pub plaintext: String,
    pub ciphertext: String,
    pub index: usize,
}

/// One or more cipher+encoding layers; layer 0 is applied to the plaintext
/// first and therefore decoded last.
#[derive(Debug, Clone)]
pub struct EncryptionScheme {
    layers: Vec<Layer>,
}

impl EncryptionScheme {
    pub fn new(layers: Vec<Layer>) -> Self {
        // The Lua parser only unescapes the outermost literal, so every
        // inner layer must use a runtime-invertible encoding.
        debug_assert!(layers
            .iter()
            .rev()
            .skip(1)
            .all(|layer| matches!(layer.encoding, Encoding::Alphabet(_))));
        Self { layers }
    }

    /// Level profile: low = hex escapes with a literal key; medium = hex
    /// escapes with a constructed key; high = a private-alphabet layer under
    /// a decimal-escape layer, independent constructed keys.
    pub fn for_level(level: ObfuscationLevel, rng: &mut StdRng) -> Self {
        let layers = match level {
            ObfuscationLevel::Low => vec![Layer {
                key: generate_key(rng, DEFAULT_KEY_LENGTH),
                encoding: Encoding::HexEscape,
                embedding: KeyEmbedding::Literal,
            }],
            ObfuscationLevel::Medium => vec![Layer {
                key: generate_key(rng, DEFAULT_KEY_LENGTH),
                encoding: Encoding::HexEscape,
                embedding: KeyEmbedding::Constructed,
            }],
            ObfuscationLevel::High => vec![
                Layer {
                    key: generate_key(rng, DEFAULT_KEY_LENGTH),
                    encoding: Encoding::Alphabet(shuffled_alphabet(rng)),
                    embedding: KeyEmbedding::Constructed,
                },
                Layer {
                    key: generate_key(rng, DEFAULT_KEY_LENGTH),
                    encoding: Encoding::DecimalEscape,
                    embedding: KeyEmbedding::Constructed,
                },
            ],
        };
        Self::new(layers)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Apply every layer in order: XOR with the layer key, then encode to
    /// the layer's printable form.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut data = plaintext.as_bytes().to_vec();
        for layer in &self.layers {
            data = xor_cycle(&data, &layer.key);
            data = layer.encoding.encode(&data).into_bytes();
        }
        // Every encoding emits ASCII.
        String::from_utf8_lossy(&data).into_owned()
    }

    /// Mirror of the emitted runtime decode chain, in strictly reverse layer
    /// order. `decrypt(encrypt(s)) == s` for any plaintext and key set.
    pub fn decrypt(&self, ciphertext: &str) -> Vec<u8> {
        let mut data = ciphertext.as_bytes().to_vec();
        for layer in self.layers.iter().rev() {
            data = layer.encoding.decode(&data);
            data = xor_cycle(&data, &layer.key);
        }
        data
    }

    /// Decoder expression for one table entry. Calls nest so the outermost
    /// layer's decoder runs first: `_d1(_d2("…"))` for two layers.
    pub fn entry_expression(&self, ciphertext: &str) -> String {
        let mut expr = format!("\"{ciphertext}\"");
        for i in (0..self.layers.len()).rev() {
            expr = format!("_d{}({})", i + 1, expr);
        }
        expr
    }

    /// Stand-alone decoder expression for a single literal.
    pub fn inline_expression(&self, plaintext: &str) -> String {
        self.entry_expression(&self.encrypt(plaintext))
    }

    /// Self-contained Luau source: key material, per-layer decoders, and the
    /// encrypted string table.
    pub fn decoder_source(&self, entries: &[StringTableEntry]) -> String {
        let mut out = String::new();
        for (i, layer) in self.layers.iter().enumerate() {
            emit_key(&mut out, layer, i + 1);
            emit_decoder(&mut out, layer, i + 1);
        }
        let _ = writeln!(out, "local {STRING_TABLE_NAME} = {{");
        for entry in entries {
            let _ = writeln!(
                out,
                "    [{}] = {},",
                entry.index,
                self.entry_expression(&entry.ciphertext)
            );
        }
        out.push_str("}\n\n");
        out
    }
}

/// Deduplicate, encrypt, and rewrite every string-literal token in place.
/// Duplicate literal values share one table entry and one decode call.
/// Returns the table entries and the decoder/table source to prepend.
pub fn encrypt_literals(
    tokens: &mut [Token],
    scheme: &EncryptionScheme,
) -> (Vec<StringTableEntry>, String) {
    let mut entries: Vec<StringTableEntry> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();

    for token in tokens.iter_mut() {
        if token.kind != TokenKind::Str {
            continue;
        }
        let Some(plaintext) = token.decoded.clone() else {
            continue;
        };
        let index = *index_of.entry(plaintext.clone()).or_insert_with(|| {
            let index = entries.len() + 1;
            entries.push(StringTableEntry {
                ciphertext: scheme.encrypt(&plaintext),
                plaintext,
                index,
            });
            index
        });
        // Parenthesized so call-sugar forms (`f "x"`) survive as calls.
        token.replacement = Some(format!("({STRING_TABLE_NAME}[{index}])"));
    }

    debug!(distinct = entries.len(), "encrypted string literals");
    let source = scheme.decoder_source(&entries);
    (entries, source)
}

/// Stream XOR: each byte against the key cycled by index. Symmetric — the
/// same operation decrypts.
pub fn xor_cycle(data: &[u8], key: &[u8]) -> Vec<u8> {
    debug_assert!(!key.is_empty());
    data.iter()
        .enumerate()
        .map(|(i, b)| b ^ key[i % key.len()])
        .collect()
}

/// Printable key bytes drawn from the run RNG.
pub fn generate_key(rng: &mut StdRng, length: usize) -> Vec<u8> {
    (0..length)
        .map(|_| KEY_ALPHABET[rng.random_range(0..KEY_ALPHABET.len())])
        .collect()
}

fn shuffled_alphabet(rng: &mut StdRng) -> [u8; 64] {
    let mut alphabet = *BASE_ALPHABET;
    alphabet.shuffle(rng);
    alphabet
}

impl Encoding {
    fn encode(&self, data: &[u8]) -> String {
        match self {
            Encoding::HexEscape => {
                let mut out = String::with_capacity(data.len() * 4);
                for b in data {
                    out.push_str("\\x");
                    out.push_str(&hex::encode([*b]));
                }
                out
            }
            Encoding::DecimalEscape => {
                // Always three digits, so a following digit can never extend
                // the escape when Lua parses it.
                let mut out = String::with_capacity(data.len() * 4);
                for b in data {
                    let _ = write!(out, "\\{b:03}");
                }
                out
            }
            Encoding::Alphabet(alphabet) => alphabet_encode(alphabet, data),
        }
    }

    fn decode(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Encoding::HexEscape | Encoding::DecimalEscape => resolve_byte_escapes(data),
            Encoding::Alphabet(alphabet) => alphabet_decode(alphabet, data),
        }
    }
}

/// 4 encoded characters per 3 bytes, `=`-padded for partial final groups.
fn alphabet_encode(alphabet: &[u8; 64], data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let b0 = u32::from(chunk[0]);
        let b1 = chunk.get(1).copied().map(u32::from);
        let b2 = chunk.get(2).copied().map(u32::from);
        out.push(alphabet[(b0 >> 2) as usize] as char);
        out.push(alphabet[(((b0 & 0x3) << 4) | (b1.unwrap_or(0) >> 4)) as usize] as char);
        match b1 {
            Some(b1) => {
                out.push(alphabet[(((b1 & 0xF) << 2) | (b2.unwrap_or(0) >> 6)) as usize] as char);
                match b2 {
                    Some(b2) => out.push(alphabet[(b2 & 0x3F) as usize] as char),
                    None => out.push(PAD as char),
                }
            }
            None => {
                out.push(PAD as char);
                out.push(PAD as char);
            }
        }
    }
    out
}

/// Inverse of [`alphabet_encode`]: consumes 4 encoded characters per group,
/// recovering up to 3 bytes, honoring the padding sentinel.
fn alphabet_decode(alphabet: &[u8; 64], data: &[u8]) -> Vec<u8> {
    let mut inverse = [255u8; 256];
    for (i, &c) in alphabet.iter().enumerate() {
        inverse[c as usize] = i as u8;
    }
    let sextet = |group: &[u8], i: usize| -> Option<u32> {
        let c = *group.get(i)?;
        (c != PAD && inverse[c as usize] != 255).then(|| u32::from(inverse[c as usize]))
    };
    let mut out = Vec::with_capacity(data.len() / 4 * 3);
    for group in data.chunks(4) {
        let (Some(c1), Some(c2)) = (sextet(group, 0), sextet(group, 1)) else {
            continue;
        };
        out.push(((c1 << 2) | (c2 >> 4)) as u8);
        if let Some(c3) = sextet(group, 2) {
            out.push((((c2 & 0xF) << 4) | (c3 >> 2)) as u8);
            if let Some(c4) = sextet(group, 3) {
                out.push((((c3 & 0x3) << 6) | c4) as u8);
            }
        }
    }
    out
}

/// Undo the `\xHH` / `\DDD` escapes the Lua parser would resolve. Escapes
/// are always emitted fixed-width: two hex digits or three decimal digits.
fn resolve_byte_escapes(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 4);
    let mut i = 0;
    while i < data.len() {
        if data[i] == b'\\' && i + 1 < data.len() {
            if data[i + 1] == b'x' && i + 3 < data.len() {
                out.push(hex_value(data[i + 2]) * 16 + hex_value(data[i + 3]));
                i += 4;
                continue;
            }
            if data[i + 1].is_ascii_digit() {
                let mut value: u32 = 0;
                let mut j = i + 1;
                while j < data.len() && j < i + 4 && data[j].is_ascii_digit() {
                    value = value * 10 + u32::from(data[j] - b'0');
                    j += 1;
                }
                out.push(value as u8);
                i = j;
                continue;
            }
        }
        out.push(data[i]);
        i += 1;
    }
    out
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}

fn emit_key(out: &mut String, layer: &Layer, index: usize) {
    match layer.embedding {
        KeyEmbedding::Literal => {
            let _ = writeln!(
                out,
                "local _k{index} = \"{}\"",
                String::from_utf8_lossy(&layer.key)
            );
        }
        KeyEmbedding::Constructed => {
            let _ = writeln!(out, "local _k{index} = (function()");
            out.push_str("    local _t = {}\n");
            for (i, byte) in layer.key.iter().enumerate() {
                let _ = writeln!(out, "    _t[{}] = string.char(0x{byte:02x})", i + 1);
            }
            out.push_str("    return table.concat(_t)\nend)()\n");
        }
    }
}

fn emit_decoder(out: &mut String, layer: &Layer, index: usize) {
    match &layer.encoding {
        // The parser already unescaped the bytes; undo the key cycling only.
        Encoding::HexEscape | Encoding::DecimalEscape => {
            let _ = writeln!(
                out,
                "local function _d{index}(_s)\n\
                 \x20   local _r = {{}}\n\
                 \x20   for _i = 1, #_s do\n\
                 \x20       local _c = string.byte(_s, _i)\n\
                 \x20       local _kc = string.byte(_k{index}, ((_i - 1) % #_k{index}) + 1)\n\
                 \x20       _r[_i] = string.char(bit32.bxor(_c, _kc))\n\
                 \x20   end\n\
                 \x20   return table.concat(_r)\n\
                 end"
            );
        }
        Encoding::Alphabet(alphabet) => {
            let alphabet_str = String::from_utf8_lossy(&alphabet[..]);
            let _ = writeln!(out, "local _a{index} = \"{alphabet_str}\"");
            let _ = writeln!(
                out,
                "local _m{index} = {{}}\n\
                 for _i = 1, #_a{index} do\n\
                 \x20   _m{index}[string.sub(_a{index}, _i, _i)] = _i - 1\n\
                 end"
            );
            let _ = writeln!(
                out,
                "local function _d{index}(_s)\n\
                 \x20   local _b = {{}}\n\
                 \x20   local _i = 1\n\
                 \x20   while _i <= #_s do\n\
                 \x20       local _c1 = _m{index}[string.sub(_s, _i, _i)] or 0\n\
                 \x20       local _c2 = _m{index}[string.sub(_s, _i + 1, _i + 1)] or 0\n\
                 \x20       local _p3 = string.sub(_s, _i + 2, _i + 2)\n\
                 \x20       local _p4 = string.sub(_s, _i + 3, _i + 3)\n\
                 \x20       _b[#_b + 1] = _c1 * 4 + math.floor(_c2 / 16)\n\
                 \x20       if _p3 ~= \"=\" and _p3 ~= \"\" then\n\
                 \x20           local _c3 = _m{index}[_p3] or 0\n\
                 \x20           _b[#_b + 1] = (_c2 % 16) * 16 + math.floor(_c3 / 4)\n\
                 \x20           if _p4 ~= \"=\" and _p4 ~= \"\" then\n\
                 \x20               local _c4 = _m{index}[_p4] or 0\n\
                 \x20               _b[#_b + 1] = (_c3 % 4) * 64 + _c4\n\
                 \x20           end\n\
                 \x20       end\n\
                 \x20       _i = _i + 4\n\
                 \x20   end\n\
                 \x20   local _r = {{}}\n\
                 \x20   for _i = 1, #_b do\n\
                 \x20       local _kc = string.byte(_k{index}, ((_i - 1) % #_k{index}) + 1)\n\
                 \x20       _r[_i] = string.char(bit32.bxor(_b[_i], _kc))\n\
                 \x20   end\n\
                 \x20   return table.concat(_r)\n\
                 end"
            );
        }
    }
}

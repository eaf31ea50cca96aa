//! luacloak: Luau/Lua source obfuscation library.
//!
//! The core is a lexical safe-rewrite pipeline: a lossless tokenizer, an
//! identifier-safety classifier, a collision-free rename engine, and a
//! string-literal encryption scheme whose emitted Luau decoder exactly
//! reverses the build-side encoding. The output re-tokenizes to an
//! equivalent program.
//!
//! ```
//! use luacloak::{obfuscate, ObfuscationOptions};
//!
//! let out = obfuscate("local greeting = \"hello\"\nprint(greeting)",
//!     &ObfuscationOptions::default()).unwrap();
//! assert!(!out.contains("hello"));
//! ```

pub mod classify;
pub mod encrypt;
pub mod errors;
pub mod lexer;
pub mod logging;
pub mod names;
pub mod options;
pub mod pipeline;
pub mod rename;
pub mod token;

// Re-exports
pub use classify::{classify, Classification};
pub use encrypt::{encrypt_literals, EncryptionScheme, StringTableEntry};
pub use errors::{ObfuscateError, Result};
pub use lexer::tokenize;
pub use options::{ObfuscationLevel, ObfuscationOptions};
pub use pipeline::{obfuscate, CosmeticPass, ObfuscationRun, RunStats};
pub use rename::RenameMap;
pub use token::{Token, TokenKind};

//! # Introduction
//!
//! Sable is a statically typed, C-like language. This crate is its front
//! end: it turns `.sbl` source text into tokens and then into an abstract
//! syntax tree.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Tokens → Parser → AST → JSON
//! ```
//!
//! 1. [`tokenize`] scans the whole source in one pass, including string
//!    interpolation (`"$name"` and `"${expr}"`).
//! 2. [`parse_module`] builds a [`parser::ast::Module`] by recursive
//!    descent. Nodes borrow the tokens they were built from.
//! 3. [`parser::ast::Module::to_json`] renders the structured form used for
//!    golden files.
//!
//! Both stages fail fast on the first error and report its line and column.
//!
//! ```
//! let tokens = sable::tokenize("var x: int = 1 + 2;").unwrap();
//! let module = sable::parse_module(&tokens).unwrap();
//! assert_eq!(module.len(), 1);
//! ```

pub mod parser;

pub use parser::{parse_module, tokenize, SyntaxError};

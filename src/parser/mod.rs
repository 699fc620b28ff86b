//! Sable source code front end
//!
//! This module transforms Sable source text into an Abstract Syntax Tree (AST):
//! - [`token`]: token model and keyword table
//! - [`lexer`]: tokenization (source text → tokens), including string
//!   interpolation
//! - [`parse`]: the [`Parser`] and its helpers (tokens → AST)
//! - [`ast`]: AST node definitions and the structured JSON form
//!
//! The grammar areas are split over `declarations`, `statements`,
//! `expressions` and `types`, each adding an `impl Parser` block.
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with a precedence ladder for
//! expressions and bounded lookahead for statement disambiguation.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;
pub mod token;
mod types;

use thiserror::Error;

pub use ast::{Module, SourceLocation};
pub use lexer::{tokenize, LexError, Lexer};
pub use parse::{parse_module, ParseError, Parser};
pub use token::{Literal, Token, TokenKind};

/// Failure from either stage of the front end.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    pub fn location(&self) -> SourceLocation {
        match self {
            SyntaxError::Lex(e) => e.location(),
            SyntaxError::Parse(e) => e.location(),
        }
    }
}

//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, cursor helpers, bounded lookahead, the
//!   generic delimited-list routine
//! - `declarations`: imports, interfaces, classes, structs, unions, enums,
//!   constructors, destructors, functions and variables
//! - `statements`: statement dispatch and control flow
//! - `expressions`: the precedence ladder, postfix chains, literals and
//!   string interpolation
//! - `types`: type annotations, templates and meta-annotations
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.
//!
//! The parser never owns its tokens: it walks a borrowed slice with a
//! monotonically increasing cursor, and every node it returns borrows from
//! that slice.

use crate::parser::ast::*;
use crate::parser::token::{Literal, Token, TokenKind};
use log::{debug, trace};
use thiserror::Error;

/// Deepest nesting of statements, expressions and types the parser will
/// descend into before giving up with [`ParseError::NestingTooDeep`].
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// No grammar alternative matches the current token.
    #[error("Unexpected {found} at {location}, expected {expected}")]
    UnexpectedToken {
        found: TokenKind,
        lexeme: String,
        expected: String,
        location: SourceLocation,
    },

    /// A specific token was required here.
    #[error("Expected {expected} {context}, found {found} at {location}")]
    ExpectedToken {
        expected: TokenKind,
        found: TokenKind,
        lexeme: String,
        context: &'static str,
        location: SourceLocation,
    },

    #[error("Invalid assignment target at {location}")]
    InvalidAssignmentTarget { location: SourceLocation },

    #[error("Duplicate {member} in '{type_name}' at {location}")]
    DuplicateDeclaration {
        member: &'static str,
        type_name: String,
        location: SourceLocation,
    },

    #[error("Malformed string interpolation at {location}: {reason}")]
    MalformedInterpolation {
        reason: &'static str,
        location: SourceLocation,
    },

    #[error("Nesting deeper than {limit} levels at {location}")]
    NestingTooDeep { limit: usize, location: SourceLocation },
}

impl ParseError {
    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::UnexpectedToken { location, .. }
            | ParseError::ExpectedToken { location, .. }
            | ParseError::InvalidAssignmentTarget { location }
            | ParseError::DuplicateDeclaration { location, .. }
            | ParseError::MalformedInterpolation { location, .. }
            | ParseError::NestingTooDeep { location, .. } => *location,
        }
    }
}

/// Parse a whole token stream into a [`Module`].
pub fn parse_module(tokens: &[Token]) -> Result<Module<'_>, ParseError> {
    Parser::new(tokens).parse_module()
}

/// Stands in for the end-of-input token when a hand-built slice lacks one.
static END_OF_INPUT: Token = Token {
    kind: TokenKind::EndOfInput,
    lexeme: String::new(),
    literal: Literal::None,
    line: 0,
    column: 0,
};

/// Recursive descent parser for Sable
pub struct Parser<'a> {
    pub(crate) tokens: &'a [Token],
    pub(crate) position: usize,
    /// Statements, expressions and types currently being parsed.
    pub(crate) depth: usize,
    /// Type-argument lists open around the current type.
    pub(crate) type_depth: usize,
    /// Set when the first half of a `>>` has closed an inner type-argument
    /// list and the enclosing list still owes the second half.
    pub(crate) split_shift: bool,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
            type_depth: 0,
            split_shift: false,
        }
    }

    /// Parse the entire module (top-level statements until end of input)
    pub fn parse_module(&mut self) -> Result<Module<'a>, ParseError> {
        let mut module = Module::new();

        while !self.is_at_end() {
            let stmt = self.parse_statement()?;
            trace!("parsed top-level {} at {}", stmt.kind_name(), stmt.location());
            module.statements.push(stmt);
        }

        debug!(
            "parsed {} top-level statements from {} tokens",
            module.len(),
            self.tokens.len()
        );
        Ok(module)
    }

    // ===== Helper methods =====

    /// Run `parse` one nesting level deeper.
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
                location: self.peek().location(),
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    pub(crate) fn peek(&self) -> &'a Token {
        self.tokens.get(self.position).unwrap_or(&END_OF_INPUT)
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> &'a Token {
        self.tokens.get(self.position + n).unwrap_or(&END_OF_INPUT)
    }

    pub(crate) fn previous(&self) -> &'a Token {
        self.position
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .unwrap_or(&END_OF_INPUT)
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::EndOfInput
    }

    pub(crate) fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(crate) fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.peek().kind)
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn match_any(&mut self, kinds: &[TokenKind]) -> Option<&'a Token> {
        if self.check_any(kinds) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Does any of `kinds` occur within the next `n` tokens after the
    /// current one? Nothing is consumed.
    pub(crate) fn occurs_within(&self, kinds: &[TokenKind], n: usize) -> bool {
        (1..=n).any(|offset| kinds.contains(&self.peek_ahead(offset).kind))
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    pub(crate) fn expect_token(
        &mut self,
        kind: TokenKind,
        context: &'static str,
    ) -> Result<&'a Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.expected(kind, context))
        }
    }

    pub(crate) fn expect_identifier(&mut self, context: &'static str) -> Result<&'a Token, ParseError> {
        self.expect_token(TokenKind::Identifier, context)
    }

    pub(crate) fn expect_semicolon(&mut self, context: &'static str) -> Result<&'a Token, ParseError> {
        self.expect_token(TokenKind::Semicolon, context)
    }

    /// Consume one of `kinds`, or fail with [`ParseError::UnexpectedToken`].
    pub(crate) fn expect_one_of(
        &mut self,
        kinds: &[TokenKind],
        expected: &str,
    ) -> Result<&'a Token, ParseError> {
        self.match_any(kinds).ok_or_else(|| self.unexpected(expected))
    }

    pub(crate) fn expected(&self, kind: TokenKind, context: &'static str) -> ParseError {
        let found = self.peek();
        ParseError::ExpectedToken {
            expected: kind,
            found: found.kind,
            lexeme: found.lexeme.clone(),
            context,
            location: found.location(),
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        Self::unexpected_at(self.peek(), expected)
    }

    pub(crate) fn unexpected_at(token: &Token, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            found: token.kind,
            lexeme: token.lexeme.clone(),
            expected: expected.to_string(),
            location: token.location(),
        }
    }

    /// Generic delimited list.
    ///
    /// Consumes one of `open` (skipped when `open` is empty), then elements
    /// parsed by `element` until one of `close` is reached, then the closer.
    /// With a separator, elements must be separated by it and one trailing
    /// separator is accepted; without one, elements simply follow each other.
    pub(crate) fn parse_list<T>(
        &mut self,
        open: &[TokenKind],
        close: &[TokenKind],
        separator: Option<TokenKind>,
        mut element: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        if let Some(&first) = open.first() {
            if self.match_any(open).is_none() {
                return Err(self.expected(first, "to open list"));
            }
        }

        let mut items = Vec::new();
        while !self.check_any(close) && !self.is_at_end() {
            items.push(element(&mut *self)?);

            if let Some(sep) = separator {
                if !self.match_token(sep) {
                    break;
                }
            }
        }

        match close.first() {
            Some(&closer) if self.match_any(close).is_none() => {
                Err(self.expected(closer, "to close list"))
            }
            _ => Ok(items),
        }
    }
}

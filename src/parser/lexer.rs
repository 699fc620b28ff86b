//! Lexer (tokenizer) for Sable source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! The scan is a single forward pass; the only re-entrant step is expression
//! interpolation inside string literals (`"a ${b + c} d"`), where the lexer
//! calls back into its own token dispatch until the interpolation's braces
//! balance. Tokens produced there are interleaved into the same output
//! stream, bracketed by interpolation marker tokens.

use super::ast::SourceLocation;
use super::token::{keyword, Literal, Token, TokenKind};
use log::debug;
use thiserror::Error;

/// Deepest allowed nesting of `${ ... }` inside string literals.
pub const MAX_INTERPOLATION_DEPTH: usize = 32;

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Unexpected character '{character}' at {location}")]
    UnexpectedCharacter {
        character: char,
        location: SourceLocation,
    },

    #[error("Unterminated {what} starting at {location}")]
    UnterminatedLiteral {
        what: &'static str,
        location: SourceLocation,
    },

    #[error("String interpolation nested too deeply at {location}")]
    InterpolationTooDeep { location: SourceLocation },
}

impl LexError {
    pub fn location(&self) -> SourceLocation {
        match self {
            LexError::UnexpectedCharacter { location, .. }
            | LexError::UnterminatedLiteral { location, .. }
            | LexError::InterpolationTooDeep { location } => *location,
        }
    }
}

/// Tokenize `source` in one pass.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

/// Lexer for Sable source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    interpolation_depth: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            interpolation_depth: 0,
        }
    }

    /// Tokenize the entire input. The result always ends with exactly one
    /// [`TokenKind::EndOfInput`] token.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                let loc = self.current_location();
                self.tokens.push(Token::new(TokenKind::EndOfInput, "", loc));
                break;
            }

            self.scan_token()?;
        }

        debug!(
            "tokenized {} characters into {} tokens",
            self.input.len(),
            self.tokens.len()
        );
        Ok(std::mem::take(&mut self.tokens))
    }

    /// Scan one token (or, for strings, one run of fragment/marker tokens)
    /// starting at the current position.
    fn scan_token(&mut self) -> Result<(), LexError> {
        let start = self.current_location();
        let start_pos = self.position;
        let Some(ch) = self.advance() else {
            return Ok(());
        };

        let kind = match ch {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Question,

            '+' => self.double_token(
                TokenKind::Plus,
                &[('+', TokenKind::PlusPlus), ('=', TokenKind::PlusEqual)],
            ),
            '-' => self.double_token(
                TokenKind::Minus,
                &[
                    ('-', TokenKind::MinusMinus),
                    ('=', TokenKind::MinusEqual),
                    ('>', TokenKind::Arrow),
                ],
            ),
            '*' => self.double_token(TokenKind::Star, &[('=', TokenKind::StarEqual)]),
            // Comments were already consumed by `skip_whitespace_and_comments`
            '/' => self.double_token(TokenKind::Slash, &[('=', TokenKind::SlashEqual)]),
            '%' => self.double_token(TokenKind::Percent, &[('=', TokenKind::PercentEqual)]),
            '!' => self.double_token(TokenKind::Bang, &[('=', TokenKind::BangEqual)]),
            '=' => self.double_token(
                TokenKind::Equal,
                &[('=', TokenKind::EqualEqual), ('>', TokenKind::FatArrow)],
            ),
            '<' => self.double_token(
                TokenKind::Less,
                &[('=', TokenKind::LessEqual), ('<', TokenKind::LessLess)],
            ),
            '>' => self.double_token(
                TokenKind::Greater,
                &[('=', TokenKind::GreaterEqual), ('>', TokenKind::GreaterGreater)],
            ),
            '&' => self.double_token(
                TokenKind::Ampersand,
                &[
                    ('&', TokenKind::AmpersandAmpersand),
                    ('=', TokenKind::AmpersandEqual),
                ],
            ),
            '|' => self.double_token(
                TokenKind::Pipe,
                &[('|', TokenKind::PipePipe), ('=', TokenKind::PipeEqual)],
            ),
            '^' => self.double_token(TokenKind::Caret, &[('=', TokenKind::CaretEqual)]),

            '"' => return self.scan_string(start),
            '@' => return self.scan_annotation(start, start_pos),
            c if c.is_ascii_digit() => return self.scan_number(start, start_pos),
            c if is_identifier_start(c) => return self.scan_identifier(start, start_pos),

            other => {
                return Err(LexError::UnexpectedCharacter {
                    character: other,
                    location: start,
                })
            }
        };

        self.push_token(kind, start_pos, start);
        Ok(())
    }

    /// Try each two-character extension registered for a lead character,
    /// falling back to the single-character kind.
    fn double_token(&mut self, single: TokenKind, extensions: &[(char, TokenKind)]) -> TokenKind {
        for &(next, kind) in extensions {
            if self.peek() == Some(next) {
                self.advance();
                return kind;
            }
        }
        single
    }

    /// Numeric literal: `digits ('.' digits)?`. A trailing '.' without a
    /// digit after it is left for the next token.
    fn scan_number(&mut self, start: SourceLocation, start_pos: usize) -> Result<(), LexError> {
        self.consume_digits();

        if self.peek() == Some('.') && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // '.'
            self.consume_digits();
        }

        let lexeme = self.slice_from(start_pos);
        let value = lexeme
            .parse::<f64>()
            .map_err(|_| LexError::UnexpectedCharacter {
                character: self.input[start_pos],
                location: start,
            })?;

        self.tokens
            .push(Token::new(TokenKind::Number, lexeme, start).with_literal(Literal::Number(value)));
        Ok(())
    }

    fn consume_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Identifier or keyword; the first character is already consumed.
    fn scan_identifier(&mut self, start: SourceLocation, start_pos: usize) -> Result<(), LexError> {
        while self.peek().is_some_and(is_identifier_continue) {
            self.advance();
        }

        let lexeme = self.slice_from(start_pos);
        let kind = keyword(&lexeme).unwrap_or(TokenKind::Identifier);
        self.tokens.push(Token::new(kind, lexeme, start));
        Ok(())
    }

    /// `@name` becomes a single annotation token.
    fn scan_annotation(&mut self, start: SourceLocation, start_pos: usize) -> Result<(), LexError> {
        if !self.peek().is_some_and(is_identifier_start) {
            return Err(LexError::UnexpectedCharacter {
                character: '@',
                location: start,
            });
        }
        while self.peek().is_some_and(is_identifier_continue) {
            self.advance();
        }

        self.push_token(TokenKind::Annotation, start_pos, start);
        Ok(())
    }

    /// String literal, possibly interpolated. The opening quote is already
    /// consumed.
    ///
    /// Without interpolation this yields one [`TokenKind::String`] token.
    /// With interpolation it yields a fragment-start, then for every
    /// interpolation its marker and payload tokens followed by either a
    /// fragment (more interpolations follow) or the closing fragment-end.
    fn scan_string(&mut self, start: SourceLocation) -> Result<(), LexError> {
        let mut segment = String::new();
        let mut segment_start = self.current_location();
        let mut interpolated = false;

        loop {
            let Some(ch) = self.peek() else {
                return Err(LexError::UnterminatedLiteral {
                    what: "string literal",
                    location: start,
                });
            };

            match ch {
                '"' => {
                    self.advance();
                    if interpolated {
                        self.push_fragment(TokenKind::FragmentEnd, segment, segment_start);
                    } else {
                        let value = unescape(&segment);
                        let lexeme = format!("\"{}\"", segment);
                        self.tokens.push(
                            Token::new(TokenKind::String, lexeme, start)
                                .with_literal(Literal::Text(value)),
                        );
                    }
                    return Ok(());
                }
                '\\' => {
                    // Keep the escape raw; it is resolved per fragment.
                    self.advance();
                    segment.push('\\');
                    let Some(escaped) = self.advance() else {
                        return Err(LexError::UnterminatedLiteral {
                            what: "string literal",
                            location: start,
                        });
                    };
                    segment.push(escaped);
                }
                '$' => {
                    let kind = if interpolated {
                        TokenKind::Fragment
                    } else {
                        TokenKind::FragmentStart
                    };
                    self.push_fragment(kind, std::mem::take(&mut segment), segment_start);
                    interpolated = true;

                    self.scan_interpolation(start)?;
                    segment_start = self.current_location();
                }
                _ => {
                    self.advance();
                    segment.push(ch);
                }
            }
        }
    }

    /// Scan the interpolation that starts at the current `$`.
    fn scan_interpolation(&mut self, string_start: SourceLocation) -> Result<(), LexError> {
        let marker = self.current_location();
        let marker_pos = self.position;
        self.advance(); // '$'

        if self.peek() == Some('{') {
            self.advance();
            self.push_token(TokenKind::ExpressionInterpolationStart, marker_pos, marker);
            return self.scan_embedded_expression(marker);
        }

        self.push_token(TokenKind::IdentifierInterpolation, marker_pos, marker);

        let ident_start = self.current_location();
        let ident_pos = self.position;
        match self.advance() {
            Some(c) if is_identifier_start(c) => self.scan_identifier(ident_start, ident_pos),
            Some(c) => Err(LexError::UnexpectedCharacter {
                character: c,
                location: ident_start,
            }),
            None => Err(LexError::UnterminatedLiteral {
                what: "string literal",
                location: string_start,
            }),
        }
    }

    /// Re-enter the token scanner for the body of `${ ... }` until the brace
    /// that closes the interpolation. Nested strings recurse through
    /// `scan_token`, bounded by [`MAX_INTERPOLATION_DEPTH`].
    fn scan_embedded_expression(&mut self, opened_at: SourceLocation) -> Result<(), LexError> {
        if self.interpolation_depth >= MAX_INTERPOLATION_DEPTH {
            return Err(LexError::InterpolationTooDeep { location: opened_at });
        }
        self.interpolation_depth += 1;

        let mut braces = 1usize;
        loop {
            self.skip_whitespace_and_comments()?;

            match self.peek() {
                None => {
                    return Err(LexError::UnterminatedLiteral {
                        what: "string interpolation",
                        location: opened_at,
                    })
                }
                Some('}') if braces == 1 => {
                    let loc = self.current_location();
                    let pos = self.position;
                    self.advance();
                    self.push_token(TokenKind::ExpressionInterpolationEnd, pos, loc);
                    break;
                }
                Some('{') => braces += 1,
                Some('}') => braces -= 1,
                Some(_) => {}
            }

            self.scan_token()?;
        }

        self.interpolation_depth -= 1;
        Ok(())
    }

    fn push_fragment(&mut self, kind: TokenKind, raw: String, location: SourceLocation) {
        let value = unescape(&raw);
        self.tokens
            .push(Token::new(kind, raw, location).with_literal(Literal::Text(value)));
    }

    fn push_token(&mut self, kind: TokenKind, start_pos: usize, location: SourceLocation) {
        let lexeme = self.slice_from(start_pos);
        self.tokens.push(Token::new(kind, lexeme, location));
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip block comment (/* ... */). Not nesting: the first `*/` closes it.
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance(); // skip '*'
                self.advance(); // skip '/'
                return Ok(());
            }
            self.advance();
        }

        Err(LexError::UnterminatedLiteral {
            what: "block comment",
            location: start_loc,
        })
    }

    fn slice_from(&self, start_pos: usize) -> String {
        self.input[start_pos..self.position].iter().collect()
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Resolve escape sequences. Unknown escapes yield the escaped character.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = tokenize("fn main() { return 0; }").unwrap();

        assert_eq!(tokens[0].kind, TokenKind::Fn);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].lexeme, "main");
        assert_eq!(tokens[2].kind, TokenKind::LeftParen);
        assert_eq!(tokens[3].kind, TokenKind::RightParen);
        assert_eq!(tokens[4].kind, TokenKind::LeftBrace);
        assert_eq!(tokens[5].kind, TokenKind::Return);
        assert_eq!(tokens[6].kind, TokenKind::Number);
        assert_eq!(tokens[6].literal, Literal::Number(0.0));
        assert_eq!(tokens[7].kind, TokenKind::Semicolon);
        assert_eq!(tokens[8].kind, TokenKind::RightBrace);
        assert_eq!(tokens[9].kind, TokenKind::EndOfInput);
        assert_eq!(tokens.len(), 10);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("++ -- += -= -> == != => && || <= << >= >> &= |= ^= ^"),
            vec![
                TokenKind::PlusPlus,
                TokenKind::MinusMinus,
                TokenKind::PlusEqual,
                TokenKind::MinusEqual,
                TokenKind::Arrow,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::FatArrow,
                TokenKind::AmpersandAmpersand,
                TokenKind::PipePipe,
                TokenKind::LessEqual,
                TokenKind::LessLess,
                TokenKind::GreaterEqual,
                TokenKind::GreaterGreater,
                TokenKind::AmpersandEqual,
                TokenKind::PipeEqual,
                TokenKind::CaretEqual,
                TokenKind::Caret,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_comments() {
        let tokens = tokenize("var x; // comment\nvar y; /* block\ncomment */ var z;").unwrap();

        assert_eq!(tokens[0].kind, TokenKind::Var);
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[3].kind, TokenKind::Var);
        assert_eq!(tokens[4].lexeme, "y");
        assert_eq!(tokens[4].line, 2);
        assert_eq!(tokens[7].lexeme, "z");
        assert_eq!(tokens[7].line, 3);
    }

    #[test]
    fn test_block_comment_does_not_nest() {
        // The first '*/' closes the comment, leaving "c */" behind.
        let tokens = tokenize("/* a /* b */ c */").unwrap();
        assert_eq!(tokens[0].lexeme, "c");
        assert_eq!(tokens[1].kind, TokenKind::Star);
        assert_eq!(tokens[2].kind, TokenKind::Slash);
    }

    #[test]
    fn test_string_literal() {
        let tokens = tokenize(r#""hello\nworld \"q\" \\ \x""#).unwrap();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(
            tokens[0].literal.as_text(),
            Some("hello\nworld \"q\" \\ x")
        );
    }

    #[test]
    fn test_number_trailing_dot() {
        let tokens = tokenize("2.5 7.").unwrap();
        assert_eq!(tokens[0].literal, Literal::Number(2.5));
        assert_eq!(tokens[1].literal, Literal::Number(7.0));
        assert_eq!(tokens[1].lexeme, "7");
        assert_eq!(tokens[2].kind, TokenKind::Dot);
    }

    #[test]
    fn test_annotation() {
        let tokens = tokenize("[@unsafe, @pure_fn]").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Annotation);
        assert_eq!(tokens[1].lexeme, "@unsafe");
        assert_eq!(tokens[3].lexeme, "@pure_fn");
    }

    #[test]
    fn test_expression_interpolation() {
        let tokens = tokenize(r#""Sum: ${1 + 2}""#).unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();

        assert_eq!(
            kinds,
            vec![
                TokenKind::FragmentStart,
                TokenKind::ExpressionInterpolationStart,
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::ExpressionInterpolationEnd,
                TokenKind::FragmentEnd,
                TokenKind::EndOfInput,
            ]
        );
        assert_eq!(tokens[0].literal.as_text(), Some("Sum: "));
        assert_eq!(tokens[6].literal.as_text(), Some(""));
    }

    #[test]
    fn test_identifier_interpolation() {
        let kinds = kinds(r#""Hi $name and $other!""#);
        assert_eq!(
            kinds,
            vec![
                TokenKind::FragmentStart,
                TokenKind::IdentifierInterpolation,
                TokenKind::Identifier,
                TokenKind::Fragment,
                TokenKind::IdentifierInterpolation,
                TokenKind::Identifier,
                TokenKind::FragmentEnd,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_escaped_dollar_is_literal() {
        let tokens = tokenize(r#""cost: \$5""#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].literal.as_text(), Some("cost: $5"));
    }

    #[test]
    fn test_interpolation_braces_balance() {
        let kinds = kinds(r#""${ f({}) }""#);
        assert_eq!(kinds[1], TokenKind::ExpressionInterpolationStart);
        assert_eq!(kinds[4], TokenKind::LeftBrace);
        assert_eq!(kinds[5], TokenKind::RightBrace);
        assert_eq!(kinds[6], TokenKind::RightParen);
        assert_eq!(kinds[7], TokenKind::ExpressionInterpolationEnd);
        assert_eq!(kinds[8], TokenKind::FragmentEnd);
    }

    #[test]
    fn test_nested_interpolation_depth_limit() {
        fn nest(depth: usize) -> String {
            if depth == 0 {
                "1".to_string()
            } else {
                format!("\"${{{}}}\"", nest(depth - 1))
            }
        }

        assert!(tokenize(&nest(MAX_INTERPOLATION_DEPTH)).is_ok());
        assert!(matches!(
            tokenize(&nest(MAX_INTERPOLATION_DEPTH + 1)),
            Err(LexError::InterpolationTooDeep { .. })
        ));
    }

    #[test]
    fn test_unterminated_literals() {
        assert!(matches!(
            tokenize("\"abc"),
            Err(LexError::UnterminatedLiteral { what: "string literal", .. })
        ));
        assert!(matches!(
            tokenize("x /* never closed"),
            Err(LexError::UnterminatedLiteral { what: "block comment", .. })
        ));
        assert!(matches!(
            tokenize("\"${ 1 + "),
            Err(LexError::UnterminatedLiteral { .. })
        ));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("var a = 1;\nvar b = #;").unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                character: '#',
                location: SourceLocation::new(2, 9),
            }
        );
    }
}

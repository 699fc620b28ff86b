//! Token model shared by the lexer and the parser
//!
//! A [`Token`] is created once by the lexer and never mutated afterwards.
//! AST nodes hold `&Token` references back into the token buffer so that
//! diagnostics can point at the exact source position.

use super::ast::SourceLocation;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Every token kind the lexer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Punctuation
    LeftParen,    // (
    RightParen,   // )
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,
    Dot,          // .
    Semicolon,    // ;
    Colon,        // :
    Question,     // ?

    // Operators with optional second-character extensions
    Plus,               // +
    PlusPlus,           // ++
    PlusEqual,          // +=
    Minus,              // -
    MinusMinus,         // --
    MinusEqual,         // -=
    Arrow,              // ->
    Star,               // *
    StarEqual,          // *=
    Slash,              // /
    SlashEqual,         // /=
    Percent,            // %
    PercentEqual,       // %=
    Bang,               // !
    BangEqual,          // !=
    Equal,              // =
    EqualEqual,         // ==
    FatArrow,           // =>
    Less,               // <
    LessEqual,          // <=
    LessLess,           // <<
    Greater,            // >
    GreaterEqual,       // >=
    GreaterGreater,     // >>
    Ampersand,          // &
    AmpersandAmpersand, // &&
    AmpersandEqual,     // &=
    Pipe,               // |
    PipePipe,           // ||
    PipeEqual,          // |=
    Caret,              // ^
    CaretEqual,         // ^=

    // Literals
    Identifier,
    Number,
    String,
    Annotation,

    // String interpolation
    FragmentStart,
    Fragment,
    FragmentEnd,
    IdentifierInterpolation,
    ExpressionInterpolationStart,
    ExpressionInterpolationEnd,

    // Import / export
    Import,
    Export,
    From,
    As,

    // Control flow
    If,
    Else,
    Switch,
    Case,
    Default,
    While,
    Do,
    For,
    Break,
    Continue,
    Return,

    // Storage specifiers
    Static,
    Extern,

    // Mutability specifiers
    Const,
    Var,

    // Execution-model specifiers
    Inline,
    Async,

    // Structure
    Fn,
    Interface,
    Impl,
    Class,
    Partial,
    Struct,
    Union,
    Enum,
    Constructor,
    Destructor,
    Template,

    // Memory management
    New,
    Delete,

    EndOfInput,
}

/// Reserved words. This table is the only place a keyword is defined.
const KEYWORD_TABLE: &[(&str, TokenKind)] = &[
    ("import", TokenKind::Import),
    ("export", TokenKind::Export),
    ("from", TokenKind::From),
    ("as", TokenKind::As),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("switch", TokenKind::Switch),
    ("case", TokenKind::Case),
    ("default", TokenKind::Default),
    ("while", TokenKind::While),
    ("do", TokenKind::Do),
    ("for", TokenKind::For),
    ("break", TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("return", TokenKind::Return),
    ("static", TokenKind::Static),
    ("extern", TokenKind::Extern),
    ("const", TokenKind::Const),
    ("var", TokenKind::Var),
    ("inline", TokenKind::Inline),
    ("async", TokenKind::Async),
    ("fn", TokenKind::Fn),
    ("interface", TokenKind::Interface),
    ("impl", TokenKind::Impl),
    ("class", TokenKind::Class),
    ("partial", TokenKind::Partial),
    ("struct", TokenKind::Struct),
    ("union", TokenKind::Union),
    ("enum", TokenKind::Enum),
    ("constructor", TokenKind::Constructor),
    ("destructor", TokenKind::Destructor),
    ("template", TokenKind::Template),
    ("new", TokenKind::New),
    ("delete", TokenKind::Delete),
];

/// Look up `text` in the keyword table.
pub fn keyword(text: &str) -> Option<TokenKind> {
    static KEYWORDS: OnceLock<FxHashMap<&'static str, TokenKind>> = OnceLock::new();
    KEYWORDS
        .get_or_init(|| KEYWORD_TABLE.iter().copied().collect())
        .get(text)
        .copied()
}

impl TokenKind {
    /// `static` / `extern`: legal before both functions and variables.
    pub fn is_storage_specifier(self) -> bool {
        matches!(self, TokenKind::Static | TokenKind::Extern)
    }

    pub fn is_mutability_specifier(self) -> bool {
        matches!(self, TokenKind::Const | TokenKind::Var)
    }

    pub fn is_execution_specifier(self) -> bool {
        matches!(self, TokenKind::Inline | TokenKind::Async)
    }

    pub fn is_assignment_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Equal
                | TokenKind::PlusEqual
                | TokenKind::MinusEqual
                | TokenKind::StarEqual
                | TokenKind::SlashEqual
                | TokenKind::PercentEqual
                | TokenKind::AmpersandEqual
                | TokenKind::PipeEqual
                | TokenKind::CaretEqual
        )
    }

    pub fn is_keyword(self) -> bool {
        KEYWORD_TABLE.iter().any(|(_, kind)| *kind == self)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((text, _)) = KEYWORD_TABLE.iter().find(|(_, kind)| kind == self) {
            return write!(f, "'{}'", text);
        }
        let text = match self {
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Question => "'?'",
            TokenKind::Plus => "'+'",
            TokenKind::PlusPlus => "'++'",
            TokenKind::PlusEqual => "'+='",
            TokenKind::Minus => "'-'",
            TokenKind::MinusMinus => "'--'",
            TokenKind::MinusEqual => "'-='",
            TokenKind::Arrow => "'->'",
            TokenKind::Star => "'*'",
            TokenKind::StarEqual => "'*='",
            TokenKind::Slash => "'/'",
            TokenKind::SlashEqual => "'/='",
            TokenKind::Percent => "'%'",
            TokenKind::PercentEqual => "'%='",
            TokenKind::Bang => "'!'",
            TokenKind::BangEqual => "'!='",
            TokenKind::Equal => "'='",
            TokenKind::EqualEqual => "'=='",
            TokenKind::FatArrow => "'=>'",
            TokenKind::Less => "'<'",
            TokenKind::LessEqual => "'<='",
            TokenKind::LessLess => "'<<'",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::GreaterGreater => "'>>'",
            TokenKind::Ampersand => "'&'",
            TokenKind::AmpersandAmpersand => "'&&'",
            TokenKind::AmpersandEqual => "'&='",
            TokenKind::Pipe => "'|'",
            TokenKind::PipePipe => "'||'",
            TokenKind::PipeEqual => "'|='",
            TokenKind::Caret => "'^'",
            TokenKind::CaretEqual => "'^='",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number literal",
            TokenKind::String => "string literal",
            TokenKind::Annotation => "annotation",
            TokenKind::FragmentStart => "start of interpolated string",
            TokenKind::Fragment => "string fragment",
            TokenKind::FragmentEnd => "end of interpolated string",
            TokenKind::IdentifierInterpolation => "'$'",
            TokenKind::ExpressionInterpolationStart => "'${'",
            TokenKind::ExpressionInterpolationEnd => "end of '${...}'",
            TokenKind::EndOfInput => "end of input",
            _ => "keyword",
        };
        f.write_str(text)
    }
}

/// Literal payload of a token.
///
/// Only number and string-like tokens carry a value; every other token
/// has [`Literal::None`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum Literal {
    #[default]
    None,
    Number(f64),
    Text(String),
}

impl Literal {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Literal::Number(n) => Some(*n),
            Literal::Text(_) | Literal::None => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Literal::Text(s) => Some(s),
            Literal::Number(_) | Literal::None => None,
        }
    }
}

/// A single lexical unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Literal,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            literal: Literal::None,
            line: location.line,
            column: location.column,
        }
    }

    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = literal;
        self
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier => write!(f, "identifier '{}'", self.lexeme),
            TokenKind::Number => write!(f, "number literal {}", self.lexeme),
            TokenKind::String => write!(f, "string literal {}", self.lexeme),
            TokenKind::Annotation => write!(f, "annotation '{}'", self.lexeme),
            kind => write!(f, "{}", kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(keyword("fn"), Some(TokenKind::Fn));
        assert_eq!(keyword("destructor"), Some(TokenKind::Destructor));
        assert_eq!(keyword("Fn"), None);
        assert_eq!(keyword("main"), None);
    }

    #[test]
    fn test_specifier_classes() {
        assert!(TokenKind::Static.is_storage_specifier());
        assert!(TokenKind::Var.is_mutability_specifier());
        assert!(TokenKind::Inline.is_execution_specifier());
        assert!(!TokenKind::Fn.is_storage_specifier());
        assert!(TokenKind::PercentEqual.is_assignment_operator());
        assert!(!TokenKind::EqualEqual.is_assignment_operator());
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenKind::RightParen.to_string(), "')'");
        assert_eq!(TokenKind::Class.to_string(), "'class'");
        assert_eq!(TokenKind::EndOfInput.to_string(), "end of input");

        let tok = Token::new(TokenKind::Identifier, "foo", SourceLocation::new(1, 1));
        assert_eq!(tok.to_string(), "identifier 'foo'");
    }
}

//! Type annotation parsing
//!
//! Also home to the two declaration decorations, `template<...>` and
//! `[@meta, ...]`, since both are small bracketed lists parsed ahead of
//! the declaration they attach to.
//!
//! # Grammar
//!
//! ```text
//! type     ::= atomic | "[" type ";" expr "]" | "(" type ("," type)* ")"
//!            | "fn" "(" (type ("," type)*)? ")" "->" type
//! atomic   ::= IDENT ("<" type ("," type)* ">")? "*"?
//! template ::= "template" "<" IDENT ("," IDENT)* ">"
//! meta     ::= "[" ANNOTATION ("," ANNOTATION)* "]"
//! ```

use crate::parser::ast::*;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::token::TokenKind;

impl<'a> Parser<'a> {
    /// Parse a type annotation
    pub(crate) fn parse_type(&mut self) -> Result<TypeAnnotation<'a>, ParseError> {
        self.nested(Self::parse_type_kind)
    }

    fn parse_type_kind(&mut self) -> Result<TypeAnnotation<'a>, ParseError> {
        match self.peek().kind {
            TokenKind::Identifier => Ok(TypeAnnotation::Atomic(self.parse_atomic_type(true)?)),
            TokenKind::LeftBracket => {
                let open = self.advance();
                let element = self.parse_type()?;
                self.expect_semicolon("between array element type and size")?;
                // The size expression sits outside any type-argument list.
                let enclosing = std::mem::take(&mut self.type_depth);
                let size = self.parse_expression();
                self.type_depth = enclosing;
                let size = size?;
                self.expect_token(TokenKind::RightBracket, "after array size")?;

                Ok(TypeAnnotation::Array(ArrayType {
                    open,
                    element: Box::new(element),
                    size: Box::new(size),
                }))
            }
            TokenKind::LeftParen => {
                let open = self.peek();
                let elements = self.parse_list(
                    &[TokenKind::LeftParen],
                    &[TokenKind::RightParen],
                    Some(TokenKind::Comma),
                    Self::parse_type,
                )?;
                Ok(TypeAnnotation::Tuple(TupleType { open, elements }))
            }
            TokenKind::Fn => {
                let keyword = self.advance();
                let parameters = self.parse_list(
                    &[TokenKind::LeftParen],
                    &[TokenKind::RightParen],
                    Some(TokenKind::Comma),
                    Self::parse_type,
                )?;
                self.expect_token(TokenKind::Arrow, "before function return type")?;
                let return_type = self.parse_type()?;

                Ok(TypeAnnotation::Function(FunctionType {
                    keyword,
                    parameters,
                    return_type: Box::new(return_type),
                }))
            }
            _ => Err(self.unexpected("type")),
        }
    }

    /// `Name<Args>*`. `new` expressions pass `allow_pointer = false` so a
    /// following `*` stays a multiplication.
    pub(crate) fn parse_atomic_type(&mut self, allow_pointer: bool) -> Result<AtomicType<'a>, ParseError> {
        let name = self.expect_identifier("as type name")?;

        let mut arguments = Vec::new();
        if self.match_token(TokenKind::Less) {
            self.type_depth += 1;
            let closed = self.parse_type_arguments(&mut arguments);
            self.type_depth -= 1;
            closed?;
        }

        let pointer = allow_pointer && self.match_token(TokenKind::Star);

        Ok(AtomicType {
            name,
            arguments,
            pointer,
        })
    }

    /// `T, U>` after the opening `<`.
    fn parse_type_arguments(&mut self, arguments: &mut Vec<TypeAnnotation<'a>>) -> Result<(), ParseError> {
        loop {
            arguments.push(self.parse_type()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        self.expect_closing_angle()
    }

    /// Close a type-argument list. A `>>` token closes two nested lists:
    /// the inner call leaves it in place and marks it half used, the
    /// enclosing call consumes it. With no enclosing list open, `>>` is
    /// not a closer.
    fn expect_closing_angle(&mut self) -> Result<(), ParseError> {
        if self.split_shift {
            self.split_shift = false;
            self.advance();
            return Ok(());
        }
        if self.match_token(TokenKind::Greater) {
            return Ok(());
        }
        if self.type_depth > 1 && self.check(TokenKind::GreaterGreater) {
            self.split_shift = true;
            return Ok(());
        }
        Err(self.expected(TokenKind::Greater, "to close type arguments"))
    }

    /// Parameter: `name: Type`
    pub(crate) fn parse_parameter(&mut self) -> Result<Parameter<'a>, ParseError> {
        let name = self.expect_identifier("as parameter name")?;
        self.expect_token(TokenKind::Colon, "after parameter name")?;
        let type_annotation = self.parse_type()?;

        Ok(Parameter {
            name,
            type_annotation,
        })
    }

    /// Parse parameter list: (name: Type, name: Type, ...)
    pub(crate) fn parse_parameters(&mut self) -> Result<Vec<Parameter<'a>>, ParseError> {
        self.parse_list(
            &[TokenKind::LeftParen],
            &[TokenKind::RightParen],
            Some(TokenKind::Comma),
            Self::parse_parameter,
        )
    }

    /// Optional `template<T, U>` prefix.
    pub(crate) fn parse_template(&mut self) -> Result<Option<Template<'a>>, ParseError> {
        if !self.check(TokenKind::Template) {
            return Ok(None);
        }
        let keyword = self.advance();
        let parameters = self.parse_list(
            &[TokenKind::Less],
            &[TokenKind::Greater],
            Some(TokenKind::Comma),
            |p| p.expect_identifier("as template parameter"),
        )?;

        Ok(Some(Template {
            keyword,
            parameters,
        }))
    }

    /// Optional `[@a, @b]` prefix. Only a `[` directly followed by an
    /// annotation starts one; any other `[` is left for an array literal.
    pub(crate) fn parse_meta_annotations(&mut self) -> Result<Option<MetaAnnotations<'a>>, ParseError> {
        if !self.starts_meta_annotations() {
            return Ok(None);
        }
        let open = self.peek();
        let annotations = self.parse_list(
            &[TokenKind::LeftBracket],
            &[TokenKind::RightBracket],
            Some(TokenKind::Comma),
            |p| p.expect_token(TokenKind::Annotation, "in annotation list"),
        )?;

        Ok(Some(MetaAnnotations { open, annotations }))
    }

    pub(crate) fn starts_meta_annotations(&self) -> bool {
        self.check(TokenKind::LeftBracket) && self.peek_ahead(1).kind == TokenKind::Annotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    fn parse_type_of(source: &str) -> String {
        let tokens = tokenize(source).unwrap();
        let mut parser = Parser::new(&tokens);
        let ty = parser.parse_type().unwrap();
        assert!(parser.is_at_end(), "type did not consume all input");
        describe(&ty)
    }

    // Compact rendering to keep expectations readable.
    fn describe(ty: &TypeAnnotation) -> String {
        match ty {
            TypeAnnotation::Atomic(t) => {
                let mut s = t.name.lexeme.clone();
                if !t.arguments.is_empty() {
                    let args: Vec<_> = t.arguments.iter().map(describe).collect();
                    s.push_str(&format!("<{}>", args.join(",")));
                }
                if t.pointer {
                    s.push('*');
                }
                s
            }
            TypeAnnotation::Array(t) => format!("[{};_]", describe(&t.element)),
            TypeAnnotation::Tuple(t) => {
                let els: Vec<_> = t.elements.iter().map(describe).collect();
                format!("({})", els.join(","))
            }
            TypeAnnotation::Function(t) => {
                let ps: Vec<_> = t.parameters.iter().map(describe).collect();
                format!("fn({})->{}", ps.join(","), describe(&t.return_type))
            }
        }
    }

    #[test]
    fn test_atomic_types() {
        assert_eq!(parse_type_of("int"), "int");
        assert_eq!(parse_type_of("Node*"), "Node*");
        assert_eq!(parse_type_of("Map<string, int>"), "Map<string,int>");
    }

    #[test]
    fn test_nested_generic_closer_is_split() {
        assert_eq!(parse_type_of("Map<K, Vec<V>>"), "Map<K,Vec<V>>");
        assert_eq!(parse_type_of("Vec<Vec<int>>*"), "Vec<Vec<int>>*");
    }

    #[test]
    fn test_shift_outside_enclosing_list_is_not_a_closer() {
        let tokens = tokenize("Vec<int>> 2").unwrap();
        let mut parser = Parser::new(&tokens);
        let err = parser.parse_type().unwrap_err();
        assert!(matches!(
            err,
            ParseError::ExpectedToken {
                expected: TokenKind::Greater,
                found: TokenKind::GreaterGreater,
                ..
            }
        ));
        assert!(!parser.split_shift);

        // Same shape inside an array size: the size expression starts afresh.
        let tokens = tokenize("Vec<[int; new Vec<int>> 2]>").unwrap();
        assert!(Parser::new(&tokens).parse_type().is_err());
        assert_eq!(parse_type_of("Vec<[int; n >> 2]>"), "Vec<[int;_]>");
    }

    #[test]
    fn test_split_closer_through_function_type() {
        assert_eq!(parse_type_of("Vec<fn() -> Vec<int>>"), "Vec<fn()->Vec<int>>");
        assert_eq!(parse_type_of("A<B<C<D>>>>"), "A<B<C<D>>>>");
    }

    #[test]
    fn test_type_location() {
        let tokens = tokenize("  fn(int) -> [int; 2]").unwrap();
        let ty = Parser::new(&tokens).parse_type().unwrap();
        assert_eq!(ty.location(), SourceLocation::new(1, 3));

        let TypeAnnotation::Function(function) = &ty else {
            panic!("Expected function type, got {:?}", ty);
        };
        assert_eq!(function.return_type.location(), SourceLocation::new(1, 14));
    }

    #[test]
    fn test_compound_types() {
        assert_eq!(parse_type_of("[int; 4]"), "[int;_]");
        assert_eq!(parse_type_of("(int, string)"), "(int,string)");
        assert_eq!(parse_type_of("fn(int, int) -> bool"), "fn(int,int)->bool");
        assert_eq!(parse_type_of("fn() -> [Node*; n]"), "fn()->[Node*;_]");
    }

    #[test]
    fn test_missing_type() {
        let tokens = tokenize(";").unwrap();
        let err = Parser::new(&tokens).parse_type().unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken {
                found: TokenKind::Semicolon,
                ..
            }
        ));
    }
}

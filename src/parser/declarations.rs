//! Declaration parsing implementation
//!
//! This module handles parsing of every declaration form:
//!
//! - Module plumbing: `import`, `from ... import`, `export`
//! - Type definitions: `interface`, `impl ... for`, `class`, `struct`,
//!   `union`, `enum`
//! - Members: constructors, destructors, functions and variables
//!
//! # Grammar
//!
//! ```text
//! declaration  ::= import | from_import | export | interface | impl
//!                | class | struct | union | enum | constructor
//!                | destructor | function | variable
//! function     ::= storage? exec? "fn" IDENT "(" params ")" ("->" type)? block
//! variable     ::= storage? ("const" | "var") IDENT (":" type)? ("=" expr)? ";"
//! member       ::= variable | function | constructor | destructor | union
//! ```
//!
//! A storage specifier (`static`, `extern`) may start either a function or
//! a variable. The choice is made with bounded lookahead: `fn` within the
//! next two tokens selects a function, a mutability specifier in the next
//! token selects a variable, anything else is an error. Top-level
//! declarations and type members share this rule.

use crate::parser::ast::*;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::token::{Token, TokenKind};

impl<'a> Parser<'a> {
    /// Parse a declaration, with any decorations already consumed.
    pub(crate) fn parse_declaration(
        &mut self,
        meta: Option<MetaAnnotations<'a>>,
        template: Option<Template<'a>>,
    ) -> Result<Stmt<'a>, ParseError> {
        match self.peek().kind {
            TokenKind::Import | TokenKind::From | TokenKind::Export if meta.is_some() || template.is_some() => {
                Err(self.unexpected("declaration after meta-annotations or template"))
            }
            TokenKind::Import => Ok(Stmt::Import(self.parse_import()?)),
            TokenKind::From => Ok(Stmt::FromImport(self.parse_from_import()?)),
            TokenKind::Export => Ok(Stmt::Export(self.parse_export()?)),
            TokenKind::Interface => Ok(Stmt::Interface(self.parse_interface(meta, template)?)),
            TokenKind::Partial | TokenKind::Class => Ok(Stmt::Class(self.parse_class(meta, template)?)),
            TokenKind::Struct => Ok(Stmt::Struct(self.parse_struct(meta, template)?)),
            TokenKind::Fn | TokenKind::Inline | TokenKind::Async => {
                Ok(Stmt::Function(self.parse_function(meta, template)?))
            }
            TokenKind::Static | TokenKind::Extern if self.storage_introduces_function()? => {
                Ok(Stmt::Function(self.parse_function(meta, template)?))
            }
            _ if template.is_some() => {
                Err(self.unexpected("class, struct, interface or function after template parameters"))
            }
            TokenKind::Impl => Ok(Stmt::Implementation(self.parse_implementation(meta)?)),
            TokenKind::Union => Ok(Stmt::Union(self.parse_union(meta)?)),
            TokenKind::Enum => Ok(Stmt::Enum(self.parse_enum(meta)?)),
            TokenKind::Constructor => Ok(Stmt::Constructor(self.parse_constructor(meta)?)),
            TokenKind::Destructor => Ok(Stmt::Destructor(self.parse_destructor(meta)?)),
            TokenKind::Static | TokenKind::Extern | TokenKind::Const | TokenKind::Var => {
                Ok(Stmt::Variable(self.parse_variable(meta)?))
            }
            _ => Err(self.unexpected("declaration")),
        }
    }

    /// With a storage specifier under the cursor, decide between a function
    /// (`true`) and a variable (`false`) without consuming anything.
    pub(crate) fn storage_introduces_function(&self) -> Result<bool, ParseError> {
        if self.occurs_within(&[TokenKind::Fn], 2) {
            Ok(true)
        } else if self.occurs_within(&[TokenKind::Const, TokenKind::Var], 1) {
            Ok(false)
        } else {
            Err(Self::unexpected_at(
                self.peek_ahead(1),
                "'fn' or mutability specifier after storage specifier",
            ))
        }
    }

    // ===== Module plumbing =====

    fn parse_module_path(&mut self) -> Result<Vec<&'a Token>, ParseError> {
        let mut path = vec![self.expect_identifier("in module path")?];
        while self.match_token(TokenKind::Dot) {
            path.push(self.expect_identifier("in module path")?);
        }
        Ok(path)
    }

    fn parse_alias(&mut self) -> Result<Option<&'a Token>, ParseError> {
        if self.match_token(TokenKind::As) {
            Ok(Some(self.expect_identifier("after 'as'")?))
        } else {
            Ok(None)
        }
    }

    /// import a.b.c (as d)?;
    fn parse_import(&mut self) -> Result<ImportStmt<'a>, ParseError> {
        let keyword = self.advance();
        let path = self.parse_module_path()?;
        let alias = self.parse_alias()?;
        self.expect_semicolon("after import")?;

        Ok(ImportStmt { keyword, path, alias })
    }

    /// from a.b import x, y as z;
    fn parse_from_import(&mut self) -> Result<FromImportStmt<'a>, ParseError> {
        let keyword = self.advance();
        let path = self.parse_module_path()?;
        self.expect_token(TokenKind::Import, "after module path")?;

        let symbols = self.parse_list(&[], &[TokenKind::Semicolon], Some(TokenKind::Comma), |p| {
            let name = p.expect_identifier("as imported symbol")?;
            let alias = p.parse_alias()?;
            Ok(ImportedSymbol { name, alias })
        })?;
        if symbols.is_empty() {
            return Err(Self::unexpected_at(self.previous(), "imported symbol"));
        }

        Ok(FromImportStmt {
            keyword,
            path,
            symbols,
        })
    }

    fn parse_export(&mut self) -> Result<ExportStmt<'a>, ParseError> {
        let keyword = self.advance();
        let start = self.peek();
        let declaration = self.parse_statement()?;

        let exportable = matches!(
            declaration,
            Stmt::Interface(_)
                | Stmt::Implementation(_)
                | Stmt::Class(_)
                | Stmt::Struct(_)
                | Stmt::Union(_)
                | Stmt::Enum(_)
                | Stmt::Function(_)
                | Stmt::Variable(_)
        );
        if !exportable {
            return Err(Self::unexpected_at(start, "declaration after 'export'"));
        }

        Ok(ExportStmt {
            keyword,
            declaration: Box::new(declaration),
        })
    }

    // ===== Type definitions =====

    fn parse_interface(
        &mut self,
        meta: Option<MetaAnnotations<'a>>,
        template: Option<Template<'a>>,
    ) -> Result<InterfaceDecl<'a>, ParseError> {
        self.advance();
        let name = self.expect_identifier("as interface name")?;
        let methods = self.parse_list(
            &[TokenKind::LeftBrace],
            &[TokenKind::RightBrace],
            None,
            Self::parse_function_signature,
        )?;

        Ok(InterfaceDecl {
            meta,
            template,
            name,
            methods,
        })
    }

    /// fn name(params) (-> type)?;
    fn parse_function_signature(&mut self) -> Result<FunctionSignature<'a>, ParseError> {
        let meta = self.parse_meta_annotations()?;
        self.expect_token(TokenKind::Fn, "to start method signature")?;
        let name = self.expect_identifier("as method name")?;
        let parameters = self.parse_parameters()?;
        let return_type = self.parse_return_type()?;
        self.expect_semicolon("after method signature")?;

        Ok(FunctionSignature {
            meta,
            name,
            parameters,
            return_type,
        })
    }

    /// impl Interface for Type { fn ... }
    fn parse_implementation(&mut self, meta: Option<MetaAnnotations<'a>>) -> Result<ImplementationDecl<'a>, ParseError> {
        self.advance();
        let interface = self.expect_identifier("as interface name")?;
        self.expect_token(TokenKind::For, "after interface name")?;
        let target = self.expect_identifier("as implementing type")?;

        let methods = self.parse_list(&[TokenKind::LeftBrace], &[TokenKind::RightBrace], None, |p| {
            let meta = p.parse_meta_annotations()?;
            let template = p.parse_template()?;
            p.parse_function(meta, template)
        })?;

        Ok(ImplementationDecl {
            meta,
            interface,
            target,
            methods,
        })
    }

    fn parse_class(
        &mut self,
        meta: Option<MetaAnnotations<'a>>,
        template: Option<Template<'a>>,
    ) -> Result<ClassDecl<'a>, ParseError> {
        let partial = self.match_token(TokenKind::Partial);
        self.expect_token(TokenKind::Class, "after 'partial'")?;
        let name = self.expect_identifier("as class name")?;
        let body = self.parse_type_body(name)?;

        Ok(ClassDecl {
            meta,
            template,
            partial,
            name,
            body,
        })
    }

    fn parse_struct(
        &mut self,
        meta: Option<MetaAnnotations<'a>>,
        template: Option<Template<'a>>,
    ) -> Result<StructDecl<'a>, ParseError> {
        self.advance();
        let name = self.expect_identifier("as struct name")?;
        let body = self.parse_type_body(name)?;

        Ok(StructDecl {
            meta,
            template,
            name,
            body,
        })
    }

    /// Class/struct body: fields, methods, nested unions, at most one
    /// constructor and at most one destructor, in any order.
    fn parse_type_body(&mut self, type_name: &'a Token) -> Result<TypeBody<'a>, ParseError> {
        self.expect_token(TokenKind::LeftBrace, "to open type body")?;
        let mut body = TypeBody::default();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let meta = self.parse_meta_annotations()?;
            let template = self.parse_template()?;

            let is_method = match self.peek().kind {
                TokenKind::Fn | TokenKind::Inline | TokenKind::Async => true,
                TokenKind::Static | TokenKind::Extern => self.storage_introduces_function()?,
                _ => false,
            };
            if is_method {
                body.methods.push(self.parse_function(meta, template)?);
                continue;
            }
            if template.is_some() {
                return Err(self.unexpected("method after template parameters"));
            }

            match self.peek().kind {
                TokenKind::Static | TokenKind::Extern | TokenKind::Const | TokenKind::Var => {
                    body.fields.push(self.parse_variable(meta)?);
                }
                TokenKind::Union => body.unions.push(self.parse_union(meta)?),
                TokenKind::Constructor => {
                    let constructor = self.parse_constructor(meta)?;
                    if body.constructor.is_some() {
                        return Err(Self::duplicate("constructor", type_name, constructor.keyword));
                    }
                    body.constructor = Some(constructor);
                }
                TokenKind::Destructor => {
                    let destructor = self.parse_destructor(meta)?;
                    if body.destructor.is_some() {
                        return Err(Self::duplicate("destructor", type_name, destructor.keyword));
                    }
                    body.destructor = Some(destructor);
                }
                _ => {
                    return Err(self.unexpected("field, method, constructor, destructor or union"));
                }
            }
        }

        self.expect_token(TokenKind::RightBrace, "to close type body")?;
        Ok(body)
    }

    fn duplicate(member: &'static str, type_name: &Token, at: &Token) -> ParseError {
        ParseError::DuplicateDeclaration {
            member,
            type_name: type_name.lexeme.clone(),
            location: at.location(),
        }
    }

    /// union Name { field: Type; ... }
    fn parse_union(&mut self, meta: Option<MetaAnnotations<'a>>) -> Result<UnionDecl<'a>, ParseError> {
        self.advance();
        let name = self.expect_identifier("as union name")?;
        let fields = self.parse_list(&[TokenKind::LeftBrace], &[TokenKind::RightBrace], None, |p| {
            let name = p.expect_identifier("as union field name")?;
            p.expect_token(TokenKind::Colon, "after union field name")?;
            let type_annotation = p.parse_type()?;
            p.expect_semicolon("after union field")?;
            Ok(UnionField {
                name,
                type_annotation,
            })
        })?;

        Ok(UnionDecl { meta, name, fields })
    }

    /// enum Name { A, B = expr, ... }
    fn parse_enum(&mut self, meta: Option<MetaAnnotations<'a>>) -> Result<EnumDecl<'a>, ParseError> {
        self.advance();
        let name = self.expect_identifier("as enum name")?;
        let variants = self.parse_list(
            &[TokenKind::LeftBrace],
            &[TokenKind::RightBrace],
            Some(TokenKind::Comma),
            |p| {
                let name = p.expect_identifier("as enum variant")?;
                let value = if p.match_token(TokenKind::Equal) {
                    Some(p.parse_expression()?)
                } else {
                    None
                };
                Ok(EnumVariant { name, value })
            },
        )?;

        Ok(EnumDecl { meta, name, variants })
    }

    /// constructor(params) : a = x, b = y { ... }
    fn parse_constructor(&mut self, meta: Option<MetaAnnotations<'a>>) -> Result<ConstructorDecl<'a>, ParseError> {
        let keyword = self.advance();
        let parameters = self.parse_parameters()?;

        let mut initializers = Vec::new();
        if self.match_token(TokenKind::Colon) {
            loop {
                let start = self.peek();
                let initializer = self.parse_expression()?;
                if !matches!(initializer, Expr::Assignment(_)) {
                    return Err(Self::unexpected_at(start, "member initializer assignment"));
                }
                initializers.push(initializer);

                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }

        let body = self.parse_block()?;

        Ok(ConstructorDecl {
            meta,
            keyword,
            parameters,
            initializers,
            body,
        })
    }

    fn parse_destructor(&mut self, meta: Option<MetaAnnotations<'a>>) -> Result<DestructorDecl<'a>, ParseError> {
        let keyword = self.advance();
        self.expect_token(TokenKind::LeftParen, "after 'destructor'")?;
        self.expect_token(TokenKind::RightParen, "in destructor parameter list")?;
        let body = self.parse_block()?;

        Ok(DestructorDecl { meta, keyword, body })
    }

    // ===== Functions and variables =====

    /// Parse function definition
    pub(crate) fn parse_function(
        &mut self,
        meta: Option<MetaAnnotations<'a>>,
        template: Option<Template<'a>>,
    ) -> Result<FunctionDecl<'a>, ParseError> {
        let storage = self.match_any(&[TokenKind::Static, TokenKind::Extern]);
        let execution = self.match_any(&[TokenKind::Inline, TokenKind::Async]);
        self.expect_token(TokenKind::Fn, "to start function declaration")?;
        let name = self.expect_identifier("as function name")?;
        let parameters = self.parse_parameters()?;
        let return_type = self.parse_return_type()?;
        let body = self.parse_block()?;

        Ok(FunctionDecl {
            meta,
            template,
            storage,
            execution,
            name,
            parameters,
            return_type,
            body,
        })
    }

    pub(crate) fn parse_return_type(&mut self) -> Result<Option<TypeAnnotation<'a>>, ParseError> {
        if self.match_token(TokenKind::Arrow) {
            Ok(Some(self.parse_type()?))
        } else {
            Ok(None)
        }
    }

    /// Parse variable declaration: [storage] const|var name [: Type] [= init];
    pub(crate) fn parse_variable(&mut self, meta: Option<MetaAnnotations<'a>>) -> Result<VariableDecl<'a>, ParseError> {
        let storage = self.match_any(&[TokenKind::Static, TokenKind::Extern]);
        let mutability = self.expect_one_of(&[TokenKind::Const, TokenKind::Var], "'const' or 'var'")?;
        let name = self.expect_identifier("as variable name")?;

        let type_annotation = if self.match_token(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let initializer = if self.match_token(TokenKind::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_semicolon("after variable declaration")?;

        Ok(VariableDecl {
            meta,
            storage,
            mutability,
            name,
            type_annotation,
            initializer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;
    use crate::parser::parse::parse_module;

    fn parse_err(source: &str) -> ParseError {
        let tokens = tokenize(source).unwrap();
        parse_module(&tokens).unwrap_err()
    }

    #[test]
    fn test_storage_specifier_disambiguation() {
        let tokens = tokenize("static fn f() {} static inline fn g() {} extern const x: int;").unwrap();
        let module = parse_module(&tokens).unwrap();

        assert!(matches!(&module.statements[0], Stmt::Function(f) if f.storage.is_some() && f.execution.is_none()));
        assert!(matches!(&module.statements[1], Stmt::Function(f) if f.execution.map(|t| t.kind) == Some(TokenKind::Inline)));
        assert!(matches!(&module.statements[2], Stmt::Variable(v) if v.is_const() && v.storage.is_some()));

        let err = parse_err("static x = 1;");
        match err {
            ParseError::UnexpectedToken { found, lexeme, .. } => {
                assert_eq!(found, TokenKind::Identifier);
                assert_eq!(lexeme, "x");
            }
            other => panic!("Expected UnexpectedToken, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_destructor() {
        let err = parse_err("struct S { destructor() {} var a: int; destructor() {} }");
        assert_eq!(
            err,
            ParseError::DuplicateDeclaration {
                member: "destructor",
                type_name: "S".to_string(),
                location: SourceLocation::new(1, 40),
            }
        );
    }

    #[test]
    fn test_type_body_members() {
        let source = "class Point {
            var x: int;
            static const origin: Point* = 0;
            constructor(x: int) : this.x = x {}
            fn length() -> int { return x; }
            static fn make() -> Point* { return new Point(0); }
            union Raw { bits: int; }
        }";
        let tokens = tokenize(source).unwrap();
        let module = parse_module(&tokens).unwrap();

        match &module.statements[0] {
            Stmt::Class(class) => {
                assert_eq!(class.body.fields.len(), 2);
                assert_eq!(class.body.methods.len(), 2);
                assert_eq!(class.body.unions.len(), 1);
                assert!(class.body.destructor.is_none());
                let ctor = class.body.constructor.as_ref().unwrap();
                assert_eq!(ctor.initializers.len(), 1);
            }
            other => panic!("Expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_constructor_initializer_must_assign() {
        let err = parse_err("class C { constructor() : x + 1 {} }");
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { ref expected, .. } if expected == "member initializer assignment"
        ));
    }

    #[test]
    fn test_template_only_on_generic_declarations() {
        let err = parse_err("template<T> enum E { A }");
        assert!(matches!(err, ParseError::UnexpectedToken { found: TokenKind::Enum, .. }));

        let tokens = tokenize("template<T> fn id(x: T) -> T { return x; }").unwrap();
        let module = parse_module(&tokens).unwrap();
        assert!(matches!(&module.statements[0], Stmt::Function(f) if f.template.is_some()));
    }

    #[test]
    fn test_export_requires_declaration() {
        let err = parse_err("export x = 1;");
        assert!(matches!(err, ParseError::UnexpectedToken { found: TokenKind::Identifier, .. }));
    }

    #[test]
    fn test_from_import_requires_symbol() {
        let err = parse_err("from std.io import ;");
        assert!(matches!(err, ParseError::UnexpectedToken { found: TokenKind::Semicolon, .. }));
    }
}

//! Statement parsing implementation
//!
//! This module handles statement dispatch and control flow:
//!
//! - Decorated declarations: `[@meta]` and `template<...>` prefixes
//! - Control flow: `if`/`else if`/`else`, `switch`, `while`, `do-while`, `for`
//! - Jump statements: `return`, `break`, `continue`
//! - Blocks: `{ ... }`
//! - Expression statements
//!
//! Declarations themselves live in `declarations`.
//!
//! # Grammar
//!
//! ```text
//! statement ::= meta? template? declaration | if_stmt | switch_stmt
//!             | while_stmt | do_while_stmt | for_stmt | return_stmt
//!             | break_stmt | continue_stmt | block | expr_stmt
//! ```

use crate::parser::ast::*;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::token::TokenKind;

impl<'a> Parser<'a> {
    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt<'a>, ParseError> {
        self.nested(Self::dispatch_statement)
    }

    fn dispatch_statement(&mut self) -> Result<Stmt<'a>, ParseError> {
        let meta = self.parse_meta_annotations()?;
        let template = self.parse_template()?;
        if meta.is_some() || template.is_some() {
            return self.parse_declaration(meta, template);
        }

        match self.peek().kind {
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => {
                let keyword = self.advance();
                self.expect_semicolon("after 'break'")?;
                Ok(Stmt::Break(BreakStmt { keyword }))
            }
            TokenKind::Continue => {
                let keyword = self.advance();
                self.expect_semicolon("after 'continue'")?;
                Ok(Stmt::Continue(ContinueStmt { keyword }))
            }
            // `fn name(...)` declares; `fn(...)` starts a lambda
            TokenKind::Fn if self.peek_ahead(1).kind == TokenKind::Identifier => {
                self.parse_declaration(None, None)
            }
            kind if Self::starts_declaration(kind) => self.parse_declaration(None, None),
            _ => self.parse_expression_statement(),
        }
    }

    fn starts_declaration(kind: TokenKind) -> bool {
        kind.is_storage_specifier()
            || kind.is_mutability_specifier()
            || kind.is_execution_specifier()
            || matches!(
                kind,
                TokenKind::Import
                    | TokenKind::From
                    | TokenKind::Export
                    | TokenKind::Interface
                    | TokenKind::Impl
                    | TokenKind::Partial
                    | TokenKind::Class
                    | TokenKind::Struct
                    | TokenKind::Union
                    | TokenKind::Enum
                    | TokenKind::Constructor
                    | TokenKind::Destructor
            )
    }

    /// Parse a braced block
    pub(crate) fn parse_block(&mut self) -> Result<BlockStmt<'a>, ParseError> {
        if !self.check(TokenKind::LeftBrace) {
            return Err(self.expected(TokenKind::LeftBrace, "to open block"));
        }
        let open = self.peek();
        let statements = self.parse_list(
            &[TokenKind::LeftBrace],
            &[TokenKind::RightBrace],
            None,
            Self::parse_statement,
        )?;

        Ok(BlockStmt { open, statements })
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt<'a>, ParseError> {
        let expression = self.parse_expression()?;
        self.expect_semicolon("after expression")?;
        Ok(Stmt::Expression(ExpressionStmt { expression }))
    }

    /// Parse return statement
    fn parse_return_statement(&mut self) -> Result<Stmt<'a>, ParseError> {
        let keyword = self.advance();

        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon("after return value")?;

        Ok(Stmt::Return(ReturnStmt { keyword, value }))
    }

    /// Parenthesized condition shared by `if`, `while`, `switch` and `do-while`.
    fn parse_condition(&mut self, after: &'static str, close: &'static str) -> Result<Expr<'a>, ParseError> {
        self.expect_token(TokenKind::LeftParen, after)?;
        let condition = self.parse_expression()?;
        self.expect_token(TokenKind::RightParen, close)?;
        Ok(condition)
    }

    /// Parse if statement, folding `else if` chains into one node
    fn parse_if_statement(&mut self) -> Result<Stmt<'a>, ParseError> {
        let keyword = self.advance();
        let mut branches = Vec::new();
        let mut otherwise = None;

        loop {
            let condition = self.parse_condition("after 'if'", "after if condition")?;
            let body = Box::new(self.parse_statement()?);
            branches.push(ConditionalBranch { condition, body });

            if !self.check(TokenKind::Else) {
                break;
            }
            if self.occurs_within(&[TokenKind::If], 1) {
                self.advance();
                self.advance();
                continue;
            }
            self.advance();
            otherwise = Some(Box::new(self.parse_statement()?));
            break;
        }

        Ok(Stmt::If(IfStmt {
            keyword,
            branches,
            otherwise,
        }))
    }

    /// Parse while statement
    fn parse_while_statement(&mut self) -> Result<Stmt<'a>, ParseError> {
        let keyword = self.advance();
        let condition = self.parse_condition("after 'while'", "after while condition")?;
        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::While(WhileStmt {
            keyword,
            condition,
            body,
        }))
    }

    /// Parse do-while statement
    fn parse_do_while_statement(&mut self) -> Result<Stmt<'a>, ParseError> {
        let keyword = self.advance();
        let body = Box::new(self.parse_statement()?);

        self.expect_token(TokenKind::While, "after do body")?;
        let condition = self.parse_condition("after 'while'", "after do-while condition")?;
        self.expect_semicolon("after do-while")?;

        Ok(Stmt::DoWhile(DoWhileStmt {
            keyword,
            body,
            condition,
        }))
    }

    /// Parse for statement
    fn parse_for_statement(&mut self) -> Result<Stmt<'a>, ParseError> {
        let keyword = self.advance();
        self.expect_token(TokenKind::LeftParen, "after 'for'")?;

        // Init (optional); a declaration or expression statement eats its own ';'
        let initializer = if self.match_token(TokenKind::Semicolon) {
            None
        } else if self.peek().kind.is_mutability_specifier() || self.peek().kind.is_storage_specifier() {
            Some(Box::new(Stmt::Variable(self.parse_variable(None)?)))
        } else {
            let expression = self.parse_expression()?;
            self.expect_semicolon("after for initializer")?;
            Some(Box::new(Stmt::Expression(ExpressionStmt { expression })))
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon("after for condition")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_token(TokenKind::RightParen, "after for clauses")?;

        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::For(ForStmt {
            keyword,
            initializer,
            condition,
            increment,
            body,
        }))
    }

    /// Parse switch statement
    fn parse_switch_statement(&mut self) -> Result<Stmt<'a>, ParseError> {
        let keyword = self.advance();
        let subject = self.parse_condition("after 'switch'", "after switch expression")?;
        self.expect_token(TokenKind::LeftBrace, "before switch body")?;

        let mut cases = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if self.check(TokenKind::Case) {
                let keyword = self.advance();
                let value = self.parse_expression()?;
                self.expect_token(TokenKind::Colon, "after case value")?;
                let body = self.parse_case_body()?;
                cases.push(SwitchCase::Case { keyword, value, body });
            } else if self.check(TokenKind::Default) {
                let keyword = self.advance();
                self.expect_token(TokenKind::Colon, "after 'default'")?;
                let body = self.parse_case_body()?;
                cases.push(SwitchCase::Default { keyword, body });
            } else {
                return Err(self.unexpected("'case' or 'default' in switch body"));
            }
        }

        self.expect_token(TokenKind::RightBrace, "after switch body")?;

        Ok(Stmt::Switch(SwitchStmt {
            keyword,
            subject,
            cases,
        }))
    }

    fn parse_case_body(&mut self) -> Result<Vec<Stmt<'a>>, ParseError> {
        let mut statements = Vec::new();
        while !self.check_any(&[TokenKind::Case, TokenKind::Default, TokenKind::RightBrace]) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;
    use crate::parser::parse::parse_module;

    fn with_statement<R>(source: &str, check: impl FnOnce(&Stmt) -> R) -> R {
        let tokens = tokenize(source).unwrap();
        let module = parse_module(&tokens).unwrap();
        assert_eq!(module.len(), 1, "expected exactly one statement");
        check(&module.statements[0])
    }

    #[test]
    fn test_else_if_chain_is_flattened() {
        with_statement("if (a) x; else if (b) y; else if (c) z; else w;", |stmt| match stmt {
            Stmt::If(s) => {
                assert_eq!(s.branches.len(), 3);
                assert!(s.otherwise.is_some());
            }
            other => panic!("Expected if statement, got {:?}", other),
        });
    }

    #[test]
    fn test_else_binds_to_nearest_if() {
        with_statement("if (a) if (b) x; else y;", |stmt| match stmt {
            Stmt::If(outer) => {
                assert!(outer.otherwise.is_none());
                assert!(matches!(&*outer.branches[0].body, Stmt::If(inner) if inner.otherwise.is_some()));
            }
            other => panic!("Expected if statement, got {:?}", other),
        });
    }

    #[test]
    fn test_for_clauses() {
        with_statement("for (var i = 0; i < 10; i++) {}", |stmt| match stmt {
            Stmt::For(s) => {
                assert!(matches!(s.initializer.as_deref(), Some(Stmt::Variable(_))));
                assert!(s.condition.is_some());
                assert!(s.increment.is_some());
            }
            other => panic!("Expected for statement, got {:?}", other),
        });

        with_statement("for (;;) break;", |stmt| match stmt {
            Stmt::For(s) => {
                assert!(s.initializer.is_none());
                assert!(s.condition.is_none());
                assert!(s.increment.is_none());
                assert!(matches!(*s.body, Stmt::Break(_)));
            }
            other => panic!("Expected for statement, got {:?}", other),
        });
    }

    #[test]
    fn test_switch_cases() {
        with_statement("switch (x) { case 1: a(); b(); case 2: default: c(); }", |stmt| match stmt {
            Stmt::Switch(s) => {
                assert_eq!(s.cases.len(), 3);
                assert!(matches!(&s.cases[0], SwitchCase::Case { body, .. } if body.len() == 2));
                assert!(matches!(&s.cases[1], SwitchCase::Case { body, .. } if body.is_empty()));
                assert!(matches!(&s.cases[2], SwitchCase::Default { body, .. } if body.len() == 1));
            }
            other => panic!("Expected switch statement, got {:?}", other),
        });
    }

    #[test]
    fn test_do_while_requires_semicolon() {
        let tokens = tokenize("do { x++; } while (x < 3)").unwrap();
        let err = parse_module(&tokens).unwrap_err();
        assert!(matches!(
            err,
            ParseError::ExpectedToken {
                expected: TokenKind::Semicolon,
                found: TokenKind::EndOfInput,
                ..
            }
        ));
    }

    #[test]
    fn test_fn_without_name_is_lambda_statement() {
        with_statement("fn(x: int) => x;", |stmt| match stmt {
            Stmt::Expression(ExpressionStmt {
                expression: Expr::Lambda(_),
            }) => {}
            other => panic!("Expected lambda expression statement, got {:?}", other),
        });
    }
}

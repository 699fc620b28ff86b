//! Expression parsing implementation
//!
//! This module handles parsing of expressions using a precedence ladder
//! of mutually recursive functions, tightest binding innermost.
//!
//! # Supported Expressions
//!
//! - Lambdas: `fn(x: int) -> int => x * 2`, `fn() { ... }`
//! - Ternary `? :` and assignment (`=` and compound forms)
//! - Binary operators: logical, bitwise, comparison, shift, arithmetic
//! - Unary operators: `&`, `*`, `-`, `!`, `++`, `--`, `delete`
//! - Postfix: `.name`, `.0`, `[]`, `()`, `++`, `--`
//! - Literals: numbers, strings, interpolated strings, arrays, tuples
//! - Allocation: `new T(args)`, `new T[count]`
//!
//! # Precedence
//!
//! Lowest to highest:
//!
//! ```text
//! lambda → ternary → assignment → || → && → | → ^ → & → == != →
//! < <= > >= → << >> → + - → * / % → prefix unary → postfix → primary
//! ```
//!
//! Binary levels are left-associative. Ternary and assignment nest to the
//! right.

use crate::parser::ast::*;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::token::{Token, TokenKind};

type Level<'a> = fn(&mut Parser<'a>) -> Result<Expr<'a>, ParseError>;

impl<'a> Parser<'a> {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr<'a>, ParseError> {
        self.nested(|parser| {
            if parser.starts_lambda() {
                parser.parse_lambda()
            } else {
                parser.parse_ternary()
            }
        })
    }

    fn starts_lambda(&self) -> bool {
        self.check(TokenKind::Fn) && self.peek_ahead(1).kind == TokenKind::LeftParen
    }

    /// fn(params) (-> type)? (=> expr | block)
    fn parse_lambda(&mut self) -> Result<Expr<'a>, ParseError> {
        let keyword = self.advance();
        let parameters = self.parse_parameters()?;
        let return_type = self.parse_return_type()?;

        let body = if self.match_token(TokenKind::FatArrow) {
            LambdaBody::Expression(Box::new(self.parse_expression()?))
        } else if self.check(TokenKind::LeftBrace) {
            LambdaBody::Block(self.parse_block()?)
        } else {
            return Err(self.unexpected("'=>' or block after lambda parameters"));
        };

        Ok(Expr::Lambda(LambdaExpr {
            keyword,
            parameters,
            return_type,
            body,
        }))
    }

    /// Parse ternary: condition ? then : else
    fn parse_ternary(&mut self) -> Result<Expr<'a>, ParseError> {
        let condition = self.parse_assignment()?;

        let Some(question) = self.match_any(&[TokenKind::Question]) else {
            return Ok(condition);
        };
        let then_branch = self.parse_ternary()?;
        self.expect_token(TokenKind::Colon, "between ternary branches")?;
        let else_branch = self.parse_ternary()?;

        Ok(Expr::Ternary(TernaryExpr {
            condition: Box::new(condition),
            question,
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }))
    }

    /// Parse assignment (right-associative). The target is validated once
    /// the right-hand side has been parsed.
    fn parse_assignment(&mut self) -> Result<Expr<'a>, ParseError> {
        let target = self.parse_logical_or()?;

        if !self.peek().kind.is_assignment_operator() {
            return Ok(target);
        }
        let operator = self.advance();
        let value = self.parse_expression()?;

        if !target.is_assignable() {
            return Err(ParseError::InvalidAssignmentTarget {
                location: target.location(),
            });
        }

        Ok(Expr::Assignment(AssignmentExpr {
            target: Box::new(target),
            operator,
            value: Box::new(value),
        }))
    }

    /// One left-associative binary level.
    fn parse_binary_level(&mut self, operators: &[TokenKind], next: Level<'a>) -> Result<Expr<'a>, ParseError> {
        let mut left = next(self)?;

        while let Some(operator) = self.match_any(operators) {
            let right = next(self)?;
            left = Expr::Binary(BinaryExpr {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_logical_or(&mut self) -> Result<Expr<'a>, ParseError> {
        self.parse_binary_level(&[TokenKind::PipePipe], Self::parse_logical_and)
    }

    fn parse_logical_and(&mut self) -> Result<Expr<'a>, ParseError> {
        self.parse_binary_level(&[TokenKind::AmpersandAmpersand], Self::parse_bitwise_or)
    }

    fn parse_bitwise_or(&mut self) -> Result<Expr<'a>, ParseError> {
        self.parse_binary_level(&[TokenKind::Pipe], Self::parse_bitwise_xor)
    }

    fn parse_bitwise_xor(&mut self) -> Result<Expr<'a>, ParseError> {
        self.parse_binary_level(&[TokenKind::Caret], Self::parse_bitwise_and)
    }

    fn parse_bitwise_and(&mut self) -> Result<Expr<'a>, ParseError> {
        self.parse_binary_level(&[TokenKind::Ampersand], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Expr<'a>, ParseError> {
        self.parse_binary_level(&[TokenKind::EqualEqual, TokenKind::BangEqual], Self::parse_relational)
    }

    fn parse_relational(&mut self) -> Result<Expr<'a>, ParseError> {
        self.parse_binary_level(
            &[
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
            ],
            Self::parse_shift,
        )
    }

    fn parse_shift(&mut self) -> Result<Expr<'a>, ParseError> {
        self.parse_binary_level(&[TokenKind::LessLess, TokenKind::GreaterGreater], Self::parse_additive)
    }

    fn parse_additive(&mut self) -> Result<Expr<'a>, ParseError> {
        self.parse_binary_level(&[TokenKind::Plus, TokenKind::Minus], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr<'a>, ParseError> {
        self.parse_binary_level(
            &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
            Self::parse_unary,
        )
    }

    /// Parse prefix operators, applied right to left
    fn parse_unary(&mut self) -> Result<Expr<'a>, ParseError> {
        const PREFIX: &[TokenKind] = &[
            TokenKind::Ampersand,
            TokenKind::Star,
            TokenKind::Minus,
            TokenKind::Bang,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
        ];

        if let Some(operator) = self.match_any(PREFIX) {
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::Unary(UnaryExpr {
                operator,
                operand: Box::new(operand),
            }));
        }

        if let Some(keyword) = self.match_any(&[TokenKind::Delete]) {
            let target = self.nested(Self::parse_unary)?;
            return Ok(Expr::Deallocation(DeallocationExpr {
                keyword,
                target: Box::new(target),
            }));
        }

        self.parse_postfix()
    }

    /// Parse postfix chain: member, tuple access, index, call, `++`, `--`
    fn parse_postfix(&mut self) -> Result<Expr<'a>, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    if self.check(TokenKind::Number) {
                        let token = self.advance();
                        expr = Self::tuple_access(expr, token)?;
                    } else {
                        let property = self.expect_identifier("after '.'")?;
                        expr = Expr::Member(MemberExpr {
                            object: Box::new(expr),
                            property,
                        });
                    }
                }
                TokenKind::LeftBracket => {
                    let open = self.advance();
                    let index = self.parse_expression()?;
                    self.expect_token(TokenKind::RightBracket, "after index")?;
                    expr = Expr::Index(IndexExpr {
                        object: Box::new(expr),
                        open,
                        index: Box::new(index),
                    });
                }
                TokenKind::LeftParen => {
                    let open = self.peek();
                    let arguments = self.parse_arguments()?;
                    expr = Expr::Call(CallExpr {
                        callee: Box::new(expr),
                        open,
                        arguments,
                    });
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let operator = self.advance();
                    expr = Expr::Postfix(PostfixExpr {
                        operand: Box::new(expr),
                        operator,
                    });
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// `t.0` or `t.0.1`; the latter arrives as the single number `0.1`.
    fn tuple_access(mut tuple: Expr<'a>, token: &'a Token) -> Result<Expr<'a>, ParseError> {
        for part in token.lexeme.split('.') {
            let index = part
                .parse::<usize>()
                .map_err(|_| Self::unexpected_at(token, "tuple index"))?;
            tuple = Expr::TupleAccess(TupleAccessExpr {
                tuple: Box::new(tuple),
                token,
                index,
            });
        }
        Ok(tuple)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr<'a>>, ParseError> {
        self.parse_list(
            &[TokenKind::LeftParen],
            &[TokenKind::RightParen],
            Some(TokenKind::Comma),
            Self::parse_expression,
        )
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> Result<Expr<'a>, ParseError> {
        let token = self.peek();

        match token.kind {
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Identifier(Identifier { token }))
            }
            TokenKind::Number => {
                self.advance();
                let value = match token.literal.as_number() {
                    Some(value) => value,
                    None => token
                        .lexeme
                        .parse::<f64>()
                        .map_err(|_| Self::unexpected_at(token, "number literal"))?,
                };
                Ok(Expr::Number(NumberLiteral { token, value }))
            }
            TokenKind::String => {
                self.advance();
                Ok(Expr::String(StringLiteral {
                    token,
                    value: token.literal.as_text().unwrap_or_default(),
                }))
            }
            TokenKind::FragmentStart => self.parse_interpolation(),
            TokenKind::LeftBracket => {
                let elements = self.parse_list(
                    &[TokenKind::LeftBracket],
                    &[TokenKind::RightBracket],
                    Some(TokenKind::Comma),
                    Self::parse_expression,
                )?;
                Ok(Expr::Array(ArrayLiteral { open: token, elements }))
            }
            TokenKind::LeftParen => self.parse_parenthesized(),
            TokenKind::New => self.parse_allocation(),
            TokenKind::Fn if self.starts_lambda() => self.parse_lambda(),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Grouping `(e)`, tuple `(a, b)` / `(a,)`, or empty tuple `()`
    fn parse_parenthesized(&mut self) -> Result<Expr<'a>, ParseError> {
        let open = self.advance();

        if self.match_token(TokenKind::RightParen) {
            return Ok(Expr::Tuple(TupleLiteral {
                open,
                elements: Vec::new(),
            }));
        }

        let first = self.parse_expression()?;

        if self.match_token(TokenKind::Comma) {
            let mut elements = vec![first];
            elements.extend(self.parse_list(
                &[],
                &[TokenKind::RightParen],
                Some(TokenKind::Comma),
                Self::parse_expression,
            )?);
            return Ok(Expr::Tuple(TupleLiteral { open, elements }));
        }

        self.expect_token(TokenKind::RightParen, "after grouped expression")?;
        Ok(Expr::Grouping(GroupingExpr {
            open,
            expression: Box::new(first),
        }))
    }

    /// new Type, new Type(args), new Type[count]
    fn parse_allocation(&mut self) -> Result<Expr<'a>, ParseError> {
        let keyword = self.advance();
        let type_annotation = TypeAnnotation::Atomic(self.parse_atomic_type(false)?);

        let mut arguments = None;
        let mut count = None;
        if self.check(TokenKind::LeftParen) {
            arguments = Some(self.parse_arguments()?);
        } else if self.match_token(TokenKind::LeftBracket) {
            count = Some(Box::new(self.parse_expression()?));
            self.expect_token(TokenKind::RightBracket, "after allocation count")?;
        }

        Ok(Expr::Allocation(AllocationExpr {
            keyword,
            type_annotation,
            arguments,
            count,
        }))
    }

    /// Assemble an interpolated string from fragment, marker and payload
    /// tokens. Every fragment is kept, including empty ones.
    fn parse_interpolation(&mut self) -> Result<Expr<'a>, ParseError> {
        let start = self.advance();
        let mut parts = vec![Self::fragment(start)];
        let mut interpolations = 0usize;

        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Fragment => {
                    self.advance();
                    parts.push(Self::fragment(token));
                }
                TokenKind::IdentifierInterpolation => {
                    self.advance();
                    let name = self.expect_identifier("after '$' in string")?;
                    parts.push(Expr::Identifier(Identifier { token: name }));
                    interpolations += 1;
                }
                TokenKind::ExpressionInterpolationStart => {
                    self.advance();
                    let expression = self.parse_expression()?;
                    if !self.match_token(TokenKind::ExpressionInterpolationEnd) {
                        return Err(ParseError::MalformedInterpolation {
                            reason: "'${' is not closed after its expression",
                            location: self.current_location(),
                        });
                    }
                    parts.push(expression);
                    interpolations += 1;
                }
                TokenKind::FragmentEnd => {
                    self.advance();
                    parts.push(Self::fragment(token));
                    break;
                }
                _ => {
                    return Err(ParseError::MalformedInterpolation {
                        reason: "missing end of interpolated string",
                        location: token.location(),
                    });
                }
            }
        }

        if interpolations == 0 {
            return Err(ParseError::MalformedInterpolation {
                reason: "interpolated string has no interpolation",
                location: start.location(),
            });
        }

        Ok(Expr::Interpolation(InterpolationExpr { start, parts }))
    }

    fn fragment(token: &'a Token) -> Expr<'a> {
        Expr::StringFragment(StringFragment {
            token,
            value: token.literal.as_text().unwrap_or_default(),
        })
    }
}

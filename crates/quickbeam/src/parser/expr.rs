//! Expression parsing

use super::Parser;
use crate::ast::{BinaryOp, Expr, Literal, PathSegment, Place, PlaceRoot, UnaryOp};
use crate::error::ParseError;
use crate::lexer::TokenKind;
use crate::span::Span;
use crate::stack::ensure_sufficient_stack;

impl<'t> Parser<'t> {
    /// Parse an expression.
    ///
    /// An expression is `copy <place>`, a unary operator applied to an
    /// operand, or an operand optionally followed by exactly one binary
    /// operator and a second operand. Operands must not themselves be
    /// operator expressions unless parenthesized.
    pub(super) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        ensure_sufficient_stack(|| self.parse_expr_inner())
    }

    fn parse_expr_inner(&mut self) -> Result<Expr, ParseError> {
        let lhs_bare = self.at_prefix_operator();
        let lhs = self.parse_operand()?;
        let Some(op) = self.peek_binary_op() else {
            return Ok(lhs);
        };
        self.pos += 1;
        self.skip_newlines();
        let rhs_bare = self.at_prefix_operator();
        let rhs = self.parse_operand()?;

        let span = lhs.span().to(rhs.span());
        let expr = Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            span,
        };

        if let Expr::Binary { lhs, rhs, .. } = &expr {
            if lhs_bare {
                return Err(unparenthesized(lhs, &expr));
            }
            if rhs_bare {
                return Err(unparenthesized(rhs, &expr));
            }
        }

        // `a + b + c`: parse the rest so the suggestion covers the whole chain
        if let Some(next) = self.peek_binary_op() {
            self.pos += 1;
            self.skip_newlines();
            let rest = self.parse_operand()?;
            let nested = expr.clone();
            let span = expr.span().to(rest.span());
            let whole = Expr::Binary {
                op: next,
                lhs: Box::new(expr),
                rhs: Box::new(rest),
                span,
            };
            return Err(unparenthesized(&nested, &whole));
        }

        Ok(expr)
    }

    /// Whether the next token starts an unparenthesized prefix expression.
    fn at_prefix_operator(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(TokenKind::Minus) | Some(TokenKind::Bang) | Some(TokenKind::Copy)
        )
    }

    /// Parse a prefix expression or a postfix chain.
    fn parse_operand(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Minus) | Some(TokenKind::Bang) => self.parse_unary(),
            Some(TokenKind::Copy) => self.parse_copy(),
            _ => self.parse_postfix(),
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.bump() else {
            return Err(self.unexpected("expression"));
        };
        let op = match token.kind {
            TokenKind::Bang => UnaryOp::Not,
            _ => UnaryOp::Neg,
        };
        let bare = self.at_prefix_operator();
        let operand = ensure_sufficient_stack(|| self.parse_operand())?;
        let span = token.span.to(operand.span());
        let expr = Expr::Unary {
            op,
            operand: Box::new(operand),
            span,
        };

        if bare {
            if let Expr::Unary { operand, .. } = &expr {
                return Err(unparenthesized(operand, &expr));
            }
        }
        Ok(expr)
    }

    fn parse_copy(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek_span();
        self.pos += 1;
        let place = self.parse_place("variable, `this` or field path after `copy`")?;
        let span = start.to(place.span);
        Ok(Expr::Copy { place, span })
    }

    /// Parse `name` or `this` followed by `.field` and `[index]` segments.
    pub(super) fn parse_place(&mut self, expected: &str) -> Result<Place, ParseError> {
        let root = match self.peek_kind() {
            Some(TokenKind::Ident(_)) => PlaceRoot::Ident(self.expect_ident(expected)?),
            Some(TokenKind::This) => {
                self.pos += 1;
                PlaceRoot::This(self.prev_span())
            }
            _ => return Err(self.unexpected(expected)),
        };

        let start = root.span();
        let mut end = start;
        let mut path = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::Dot) => {
                    self.pos += 1;
                    let field = self.expect_ident("field name after `.`")?;
                    end = field.span;
                    path.push(PathSegment::Field(field));
                }
                Some(TokenKind::LBracket) => {
                    let (index, span) = self.parse_index()?;
                    end = span;
                    path.push(PathSegment::Index { index, span });
                }
                Some(TokenKind::Newline)
                    if self.peek_past_newlines() == Some(&TokenKind::Dot) =>
                {
                    self.skip_newlines()
                }
                _ => break,
            }
        }

        Ok(Place {
            root,
            path,
            span: start.to(end),
        })
    }

    /// Parse a primary followed by any `.field`, `[index]` and `(args)`
    /// suffixes. Only `.` and `(` may start a continuation line.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::Dot) => {
                    self.pos += 1;
                    let field = self.expect_ident("field name after `.`")?;
                    let span = expr.span().to(field.span);
                    expr = Expr::Field {
                        object: Box::new(expr),
                        field,
                        span,
                    };
                }
                Some(TokenKind::LBracket) => {
                    let (index, close) = self.parse_index()?;
                    let span = expr.span().to(close);
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                Some(TokenKind::LParen) => {
                    let (args, close) = self.parse_args()?;
                    let span = expr.span().to(close);
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        span,
                    };
                }
                Some(TokenKind::Newline)
                    if matches!(
                        self.peek_past_newlines(),
                        Some(TokenKind::Dot) | Some(TokenKind::LParen)
                    ) =>
                {
                    self.skip_newlines()
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Parse `(arg, ...)`, returning the arguments and the span of `)`.
    fn parse_args(&mut self) -> Result<(Vec<Expr>, Span), ParseError> {
        let open = self.expect(&TokenKind::LParen, "`(`")?.span;
        self.delimited('(', open, |p| {
            let mut args = Vec::new();
            loop {
                p.skip_newlines();
                if p.at(&TokenKind::RParen) {
                    break;
                }
                args.push(p.parse_expr()?);
                p.skip_newlines();
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            let close = p.expect(&TokenKind::RParen, "`,` or `)`")?.span;
            Ok((args, close))
        })
    }

    /// Parse `[index]`, returning the index and the span from `[` to `]`.
    fn parse_index(&mut self) -> Result<(Expr, Span), ParseError> {
        let open = self.expect(&TokenKind::LBracket, "`[`")?.span;
        self.delimited('[', open, |p| {
            p.skip_newlines();
            let index = p.parse_expr()?;
            p.skip_newlines();
            let close = p.expect(&TokenKind::RBracket, "`]`")?.span;
            Ok((index, open.to(close)))
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("expression"));
        };
        let span = token.span;
        let literal = |value| Expr::Literal { value, span };

        let expr = match &token.kind {
            TokenKind::Number(n) => literal(Literal::Number(*n)),
            TokenKind::Str(s) => literal(Literal::Str(s.as_str().into())),
            TokenKind::True => literal(Literal::Bool(true)),
            TokenKind::False => literal(Literal::Bool(false)),
            TokenKind::Nil => literal(Literal::Nil),
            TokenKind::Ident(_) => return self.expect_ident("expression").map(Expr::Ident),
            TokenKind::This => Expr::This(span),
            TokenKind::LParen => {
                self.pos += 1;
                return self.delimited('(', span, |p| {
                    p.skip_newlines();
                    let inner = p.parse_expr()?;
                    p.skip_newlines();
                    p.expect(&TokenKind::RParen, "`)`")?;
                    Ok(inner)
                });
            }
            TokenKind::LBrace => return self.parse_object(),
            TokenKind::LBracket => return self.parse_list(),
            _ => return Err(self.unexpected("expression")),
        };
        self.pos += 1;
        Ok(expr)
    }

    /// Parse `{ name: value, ... }`.
    fn parse_object(&mut self) -> Result<Expr, ParseError> {
        let open = self.expect(&TokenKind::LBrace, "`{`")?.span;
        self.delimited('{', open, |p| {
            let mut fields = Vec::new();
            loop {
                p.skip_newlines();
                if p.at(&TokenKind::RBrace) {
                    break;
                }
                let name = p.expect_ident("field name")?;
                p.expect(&TokenKind::Colon, "`:`")?;
                p.skip_newlines();
                let value = p.parse_expr()?;
                fields.push((name, value));
                p.skip_newlines();
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            let close = p.expect(&TokenKind::RBrace, "`,` or `}`")?.span;
            Ok(Expr::Object {
                fields,
                span: open.to(close),
            })
        })
    }

    /// Parse `[item, ...]`.
    fn parse_list(&mut self) -> Result<Expr, ParseError> {
        let open = self.expect(&TokenKind::LBracket, "`[`")?.span;
        self.delimited('[', open, |p| {
            let mut items = Vec::new();
            loop {
                p.skip_newlines();
                if p.at(&TokenKind::RBracket) {
                    break;
                }
                items.push(p.parse_expr()?);
                p.skip_newlines();
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            let close = p.expect(&TokenKind::RBracket, "`,` or `]`")?.span;
            Ok(Expr::List {
                items,
                span: open.to(close),
            })
        })
    }

    fn peek_binary_op(&self) -> Option<BinaryOp> {
        Some(match self.peek_kind()? {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GtEq => BinaryOp::Ge,
            TokenKind::And => BinaryOp::And,
            TokenKind::Or => BinaryOp::Or,
            _ => return None,
        })
    }
}

fn unparenthesized(nested: &Expr, whole: &Expr) -> ParseError {
    let kind = match nested {
        Expr::Binary { .. } => "binary",
        Expr::Unary { .. } => "unary",
        _ => "copy",
    };
    ParseError::Unparenthesized {
        kind,
        nested: nested.to_string(),
        suggestion: whole.to_string(),
        span: nested.span(),
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::error::ParseError;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn parse_expr_src(src: &str) -> Result<Expr, ParseError> {
        let mut program = parse(&tokenize(src).expect("lex failed"))?;
        match program.stmts.pop() {
            Some(Stmt::Expr(expr)) => Ok(expr),
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parenthesized_copy_is_an_operand() {
        let expr = parse_expr_src("(copy x) + 1").unwrap();
        assert_eq!(expr.to_string(), "(copy x) + 1");
    }

    #[test]
    fn test_bare_copy_operand_rejected() {
        let err = parse_expr_src("copy x + 1").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Unparenthesized { kind: "copy", ref suggestion, .. } if suggestion == "(copy x) + 1"
        ));
    }

    #[test]
    fn test_bare_unary_operand_rejected() {
        let err = parse_expr_src("a * -b").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Unparenthesized { kind: "unary", ref suggestion, .. } if suggestion == "a * (-b)"
        ));
    }

    #[test]
    fn test_double_negation_needs_parentheses() {
        assert!(parse_expr_src("- -a").is_err());
        assert!(parse_expr_src("-(-a)").is_ok());
    }

    #[test]
    fn test_call_chain_continues_across_newline() {
        let expr = parse_expr_src("make()\n  .first\n  .second()").unwrap();
        assert_eq!(expr.to_string(), "make().first.second()");
    }

    #[test]
    fn test_argument_list_continues_across_newline() {
        let expr = parse_expr_src("f\n(7)").unwrap();
        assert!(matches!(expr, Expr::Call { ref args, .. } if args.len() == 1));
        assert_eq!(expr.to_string(), "f(7)");
    }

    #[test]
    fn test_index_does_not_continue_across_newline() {
        let program = parse(&tokenize("xs\n[1]").unwrap()).unwrap();
        assert_eq!(program.stmts.len(), 2);
        assert!(matches!(program.stmts[1], Stmt::Expr(Expr::List { .. })));
    }

    #[test]
    fn test_list_literal_and_index() {
        let expr = parse_expr_src("[1, \"two\",\n  [3]][0]").unwrap();
        let Expr::Index { object, .. } = &expr else {
            panic!("expected index, got {:?}", expr);
        };
        assert!(matches!(object.as_ref(), Expr::List { items, .. } if items.len() == 3));
        assert_eq!(expr.to_string(), "[1, \"two\", [3]][0]");
    }

    #[test]
    fn test_copy_of_indexed_place() {
        let expr = parse_expr_src("copy grid[(copy i) + 1].cells").unwrap();
        assert_eq!(expr.to_string(), "copy grid[(copy i) + 1].cells");
    }
}

//! Statement and declaration parsing

use std::rc::Rc;

use super::Parser;
use crate::ast::{
    Block, ClassDecl, FieldDecl, FunctionDecl, FunctionKind, Grade, Ident, IfStmt, LetStmt, Param,
    SetStmt, Stmt, WhileStmt,
};
use crate::error::ParseError;
use crate::lexer::TokenKind;
use crate::span::Span;
use crate::stack::ensure_sufficient_stack;

impl<'t> Parser<'t> {
    /// Parse one statement, including its terminator.
    pub(super) fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("statement"));
        };

        match token.kind {
            TokenKind::Let | TokenKind::Var => {
                let stmt = self.parse_let()?;
                self.expect_stmt_end()?;
                Ok(Stmt::Let(stmt))
            }
            TokenKind::Set => {
                let stmt = self.parse_set()?;
                self.expect_stmt_end()?;
                Ok(Stmt::Set(stmt))
            }
            TokenKind::Function => Ok(Stmt::Function(Rc::new(self.parse_function()?))),
            TokenKind::Class => Ok(Stmt::Class(Rc::new(self.parse_class()?))),
            TokenKind::If => self.parse_if().map(Stmt::If),
            TokenKind::While => self.parse_while().map(Stmt::While),
            TokenKind::Return => {
                self.pos += 1;
                let value = if self.at_stmt_end() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let span = value
                    .as_ref()
                    .map_or(token.span, |v| token.span.to(v.span()));
                self.expect_stmt_end()?;
                Ok(Stmt::Return { value, span })
            }
            TokenKind::Break => {
                self.pos += 1;
                self.expect_stmt_end()?;
                Ok(Stmt::Break(token.span))
            }
            TokenKind::Continue => {
                self.pos += 1;
                self.expect_stmt_end()?;
                Ok(Stmt::Continue(token.span))
            }
            TokenKind::Delete => {
                self.pos += 1;
                let name = self.expect_ident("variable name after `delete`")?;
                let span = token.span.to(name.span);
                self.expect_stmt_end()?;
                Ok(Stmt::Delete { name, span })
            }
            TokenKind::Print => {
                self.pos += 1;
                let value = self.parse_expr()?;
                let span = token.span.to(value.span());
                self.expect_stmt_end()?;
                Ok(Stmt::Print { value, span })
            }
            TokenKind::Else => Err(ParseError::DanglingElse { span: token.span }),
            _ => {
                let expr = self.parse_expr()?;
                self.expect_stmt_end()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn at_stmt_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            None | Some(TokenKind::Newline) | Some(TokenKind::Semicolon) | Some(TokenKind::RBrace)
        )
    }

    /// Consume a newline or `;`; a `}` or end of input also ends a statement.
    fn expect_stmt_end(&mut self) -> Result<(), ParseError> {
        match self.peek_kind() {
            None | Some(TokenKind::RBrace) => Ok(()),
            Some(TokenKind::Newline) | Some(TokenKind::Semicolon) => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.unexpected("newline or `;`")),
        }
    }

    /// `let`/`var` keyword plus optional `mut`.
    fn parse_grade(&mut self) -> Grade {
        let mut grade = Grade::empty();
        if self.eat(&TokenKind::Var) {
            grade |= Grade::REASSIGN;
        } else {
            self.eat(&TokenKind::Let);
        }
        if self.eat(&TokenKind::Mut) {
            grade |= Grade::MUTATE;
        }
        grade
    }

    fn parse_let(&mut self) -> Result<LetStmt, ParseError> {
        let start = self.peek_span();
        let is_let = self.at(&TokenKind::Let);
        let grade = self.parse_grade();
        let name = self.expect_ident("variable name")?;

        let init = if self.eat(&TokenKind::Assign) {
            self.skip_newlines();
            Some(self.parse_expr()?)
        } else if is_let {
            return Err(self.unexpected("`=` (a `let` binding needs a value)"));
        } else {
            None
        };

        let end = init.as_ref().map_or(name.span, |e| e.span());
        Ok(LetStmt {
            grade,
            name,
            init,
            span: start.to(end),
        })
    }

    fn parse_set(&mut self) -> Result<SetStmt, ParseError> {
        let start = self.peek_span();
        self.pos += 1;

        let target = match self.peek_kind() {
            Some(TokenKind::Ident(_)) | Some(TokenKind::This) => {
                self.parse_place("assignment target")?
            }
            _ => {
                return Err(ParseError::InvalidAssignTarget {
                    span: self.peek_span(),
                })
            }
        };

        if !self.eat(&TokenKind::Assign) {
            if self.at(&TokenKind::LParen) {
                return Err(ParseError::InvalidAssignTarget {
                    span: target.span.to(self.peek_span()),
                });
            }
            return Err(self.unexpected("`=`"));
        }
        self.skip_newlines();
        let value = self.parse_expr()?;
        let span = start.to(value.span());
        Ok(SetStmt {
            target,
            value,
            span,
        })
    }

    fn parse_if(&mut self) -> Result<IfStmt, ParseError> {
        let start = self.peek_span();
        self.pos += 1;

        let mut branches = Vec::new();
        let mut otherwise = None;
        loop {
            let cond = self.parse_expr()?;
            let body = self.parse_block()?;
            branches.push((cond, body));

            // `else` only continues the chain on the same line as `}`
            if !self.eat(&TokenKind::Else) {
                break;
            }
            if self.eat(&TokenKind::If) {
                continue;
            }
            otherwise = Some(self.parse_block()?);
            break;
        }

        let end = otherwise
            .as_ref()
            .or_else(|| branches.last().map(|(_, body)| body))
            .map_or(start, |body| body.span);
        Ok(IfStmt {
            branches,
            otherwise,
            span: start.to(end),
        })
    }

    fn parse_while(&mut self) -> Result<WhileStmt, ParseError> {
        let start = self.peek_span();
        self.pos += 1;
        let cond = self.parse_expr()?;
        let body = self.parse_block()?;
        let span = start.to(body.span);
        Ok(WhileStmt { cond, body, span })
    }

    /// Parse `{ stmt* }`.
    pub(super) fn parse_block(&mut self) -> Result<Block, ParseError> {
        ensure_sufficient_stack(|| self.parse_block_inner())
    }

    fn parse_block_inner(&mut self) -> Result<Block, ParseError> {
        let open = self.expect(&TokenKind::LBrace, "`{`")?.span;
        self.delimited('{', open, |p| {
            let mut stmts = Vec::new();
            loop {
                p.skip_separators();
                if p.at(&TokenKind::RBrace) || p.at_eof() {
                    break;
                }
                stmts.push(p.parse_stmt()?);
            }
            let close = p.expect(&TokenKind::RBrace, "`}`")?.span;
            Ok(Block {
                stmts,
                span: open.to(close),
            })
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Functions and Classes
    // ═══════════════════════════════════════════════════════════════════

    fn parse_function(&mut self) -> Result<FunctionDecl, ParseError> {
        let start = self.peek_span();
        self.pos += 1;
        let name = self.expect_ident("function name")?;
        self.parse_function_rest(name, FunctionKind::Function, start)
    }

    /// Parameters and body of a function whose name is already parsed.
    fn parse_function_rest(
        &mut self,
        name: Ident,
        kind: FunctionKind,
        start: Span,
    ) -> Result<FunctionDecl, ParseError> {
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        let span = start.to(body.span);
        Ok(FunctionDecl {
            name,
            params,
            body,
            kind,
            span,
        })
    }

    /// Parse `([var] [mut] name, ...)`.
    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        let open = self.expect(&TokenKind::LParen, "`(`")?.span;
        self.delimited('(', open, |p| {
            let mut params = Vec::new();
            loop {
                p.skip_newlines();
                if p.at(&TokenKind::RParen) {
                    break;
                }
                let grade = p.parse_grade();
                let name = p.expect_ident("parameter name")?;
                params.push(Param { name, grade });
                p.skip_newlines();
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            p.expect(&TokenKind::RParen, "`,` or `)`")?;
            Ok(params)
        })
    }

    fn parse_class(&mut self) -> Result<ClassDecl, ParseError> {
        let start = self.peek_span();
        self.pos += 1;
        let name = self.expect_ident("class name")?;
        let open = self.expect(&TokenKind::LBrace, "`{`")?.span;

        let mut fields = Vec::new();
        let mut constructor: Option<Rc<FunctionDecl>> = None;
        let mut methods = Vec::new();

        let close = self.delimited('{', open, |p| {
            loop {
                p.skip_separators();
                let Some(token) = p.peek() else {
                    return Err(p.unexpected("field, constructor or method"));
                };

                match &token.kind {
                    TokenKind::RBrace => break,
                    TokenKind::Let | TokenKind::Var => {
                        let grade = p.parse_grade();
                        let field = p.expect_ident("field name")?;
                        fields.push(FieldDecl { name: field, grade });
                        p.expect_stmt_end()?;
                    }
                    TokenKind::Constructor => {
                        p.pos += 1;
                        let ctor_name = Ident::new("constructor", token.span);
                        let decl =
                            p.parse_function_rest(ctor_name, FunctionKind::Constructor, token.span)?;
                        if let Some(previous) = &constructor {
                            return Err(ParseError::DuplicateConstructor {
                                class: name.name.clone(),
                                span: token.span,
                                previous: previous.span,
                            });
                        }
                        constructor = Some(Rc::new(decl));
                    }
                    TokenKind::Mut => {
                        p.pos += 1;
                        let method = p.expect_ident("method name after `mut`")?;
                        let decl =
                            p.parse_function_rest(method, FunctionKind::MutMethod, token.span)?;
                        methods.push(Rc::new(decl));
                    }
                    TokenKind::Ident(_) => {
                        let method = p.expect_ident("method name")?;
                        let decl =
                            p.parse_function_rest(method, FunctionKind::Method, token.span)?;
                        methods.push(Rc::new(decl));
                    }
                    _ => return Err(p.unexpected("field, constructor or method")),
                }
            }
            Ok(p.expect(&TokenKind::RBrace, "`}`")?.span)
        })?;

        Ok(ClassDecl {
            name,
            fields,
            constructor,
            methods,
            span: start.to(close),
        })
    }
}

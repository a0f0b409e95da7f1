use crate::ast::{Expr, Node, NodeKind, Template};
use crate::error::{Error, ErrorCode};
use crate::expr;
use crate::lexer::{is_ident_continue, is_ident_start};
use crate::span::TextSpan;
use crate::token::{Token, TokenKind};

const MAX_DEPTH: usize = 128;

pub fn parse(tokens: &[Token]) -> Result<Template, Error> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let nodes = parser.parse_nodes(false)?;
    Ok(Template { nodes })
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn parse_nodes(&mut self, stop_at_rbrace: bool) -> Result<Vec<Node>, Error> {
        let mut nodes = Vec::new();
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::RBrace if stop_at_rbrace => break,
                TokenKind::Text => {
                    let token = self.bump();
                    nodes.push(Node {
                        kind: NodeKind::Text(token.text.clone()),
                        span: token.span,
                    });
                }
                TokenKind::AtIdent => {
                    let token = self.bump();
                    nodes.push(Node {
                        kind: NodeKind::Ident(token.text.clone()),
                        span: token.span,
                    });
                }
                TokenKind::AtExpr => {
                    let token = self.bump();
                    let parsed =
                        expr::parse_expr(&token.text).map_err(|err| err.with_span(token.span))?;
                    nodes.push(Node {
                        kind: NodeKind::Expr(parsed),
                        span: token.span,
                    });
                }
                TokenKind::AtIf => nodes.push(self.parse_if()?),
                TokenKind::AtFor => nodes.push(self.parse_for()?),
                // stray structural tokens outside a construct are skipped
                TokenKind::LBrace | TokenKind::RBrace | TokenKind::Else => {
                    self.bump();
                }
            }
        }
        Ok(nodes)
    }

    fn parse_if(&mut self) -> Result<Node, Error> {
        let token = self.bump();
        let span = token.span;
        self.enter(span)?;
        let cond = expr::parse_expr(&token.text).map_err(|err| err.with_span(span))?;
        self.expect_lbrace(ErrorCode::IfMissingLBrace, span, "@if")?;
        let then = self.parse_nodes(true)?;
        self.expect_rbrace(ErrorCode::IfMissingRBrace, span, "@if")?;
        let or_else = self.parse_else_branch(span)?;
        self.leave();
        Ok(Node {
            kind: NodeKind::If {
                cond,
                then,
                or_else,
            },
            span,
        })
    }

    fn parse_for(&mut self) -> Result<Node, Error> {
        let token = self.bump();
        let span = token.span;
        self.enter(span)?;
        let header = parse_for_header(&token.text, span)?;
        self.expect_lbrace(ErrorCode::ForMissingLBrace, span, "@for")?;
        let body = self.parse_nodes(true)?;
        self.expect_rbrace(ErrorCode::ForMissingRBrace, span, "@for")?;
        let or_else = self.parse_else_branch(span)?;
        self.leave();
        Ok(Node {
            kind: NodeKind::For {
                item: header.item,
                index: header.index,
                seq: header.seq,
                body,
                or_else,
            },
            span,
        })
    }

    /// Optional else-branch after a closed block. A whitespace-only text
    /// token directly before `else` is block syntax and is absorbed with it;
    /// without a following `else` it stays ordinary content.
    fn parse_else_branch(&mut self, owner: TextSpan) -> Result<Vec<Node>, Error> {
        let ws_before = matches!(
            self.peek(),
            Some(t) if t.kind == TokenKind::Text && t.text.chars().all(char::is_whitespace)
        );
        let else_index = if ws_before { 1 } else { 0 };
        let has_else = matches!(
            self.peek_at(else_index),
            Some(t) if t.kind == TokenKind::Else
        );
        if !has_else {
            return Ok(Vec::new());
        }
        if ws_before {
            self.bump();
        }
        self.bump();
        if matches!(self.peek(), Some(t) if t.kind == TokenKind::AtIf) {
            // `@elif` chain: the nested if is the entire else-sequence
            return Ok(vec![self.parse_if()?]);
        }
        self.expect_lbrace(ErrorCode::ElseMissingLBrace, owner, "else")?;
        let nodes = self.parse_nodes(true)?;
        self.expect_rbrace(ErrorCode::ElseMissingRBrace, owner, "else")?;
        Ok(nodes)
    }

    fn expect_lbrace(
        &mut self,
        code: ErrorCode,
        span: TextSpan,
        what: &str,
    ) -> Result<(), Error> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::LBrace => {
                self.bump();
                Ok(())
            }
            _ => Err(Error::new(
                code,
                span,
                format!("expected '{{' to open the {what} block"),
            )),
        }
    }

    fn expect_rbrace(
        &mut self,
        code: ErrorCode,
        span: TextSpan,
        what: &str,
    ) -> Result<(), Error> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::RBrace => {
                self.bump();
                Ok(())
            }
            _ => Err(Error::new(
                code,
                span,
                format!("expected '}}' to close the {what} block"),
            )),
        }
    }

    fn enter(&mut self, span: TextSpan) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::new(
                ErrorCode::NestingDepth,
                span,
                "template nesting is too deep",
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + n)
    }

    fn bump(&mut self) -> &'a Token {
        let token = &self.tokens[self.pos];
        self.pos += 1;
        token
    }
}

struct ForHeader {
    item: String,
    index: Option<String>,
    seq: Expr,
}

/// Parses `item[, index] in expr` from a `@for(...)` token's payload.
/// All failures span the whole token.
fn parse_for_header(text: &str, span: TextSpan) -> Result<ForHeader, Error> {
    let mut cursor = HeaderCursor { src: text, pos: 0 };
    cursor.skip_ws();
    let item = cursor.scan_ident().ok_or_else(|| {
        Error::new(
            ErrorCode::ForItemIdent,
            span,
            "expected loop variable name in @for header",
        )
    })?;
    cursor.skip_ws();
    let index = if cursor.eat(',') {
        cursor.skip_ws();
        let name = cursor.scan_ident().ok_or_else(|| {
            Error::new(
                ErrorCode::ForIndexIdent,
                span,
                "expected index variable name after ',' in @for header",
            )
        })?;
        cursor.skip_ws();
        Some(name)
    } else {
        None
    };
    match cursor.scan_ident() {
        Some(word) if word == "in" => {}
        _ => {
            return Err(Error::new(
                ErrorCode::ForMissingIn,
                span,
                "expected 'in' in @for header",
            ));
        }
    }
    let rest = &text[cursor.pos..];
    if rest.trim().is_empty() {
        return Err(Error::new(
            ErrorCode::ForMissingExpr,
            span,
            "expected sequence expression in @for header",
        ));
    }
    let seq = expr::parse_expr(rest).map_err(|err| err.with_span(span))?;
    Ok(ForHeader { item, index, seq })
}

struct HeaderCursor<'a> {
    src: &'a str,
    pos: usize,
}

impl HeaderCursor<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            if let Some(c) = self.peek() {
                self.pos += c.len_utf8();
            }
        }
    }

    fn scan_ident(&mut self) -> Option<String> {
        match self.peek() {
            Some(c) if is_ident_start(c) => {}
            _ => return None,
        }
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.pos += 1;
        }
        Some(self.src[start..self.pos].to_string())
    }
}

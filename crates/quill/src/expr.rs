use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{Error, ErrorCode};
use crate::lexer::{is_ident_continue, is_ident_start};
use crate::span::TextSpan;

const MAX_DEPTH: usize = 128;

/// Parses one fully-consumed expression from a bare substring. Error spans
/// are relative to that substring; the template parser remaps them to the
/// enclosing token.
pub fn parse_expr(text: &str) -> Result<Expr, Error> {
    let mut parser = ExprParser::new(text);
    parser.skip_ws();
    if parser.at_end() {
        return Err(Error::new(
            ErrorCode::ExprEmpty,
            TextSpan::at(0),
            "expression is empty",
        ));
    }
    let expr = parser.parse_or()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(Error::new(
            ErrorCode::ExprTrailing,
            TextSpan::new(parser.pos, text.len() - parser.pos),
            "unexpected trailing input after expression",
        ));
    }
    Ok(expr)
}

struct ExprParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> ExprParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    fn parse_or(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_and()?;
        loop {
            self.skip_ws();
            if self.eat_str("||") {
                let right = self.parse_and()?;
                expr = Expr::Binary(BinaryOp::Or, Box::new(expr), Box::new(right));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_eq()?;
        loop {
            self.skip_ws();
            if self.eat_str("&&") {
                let right = self.parse_eq()?;
                expr = Expr::Binary(BinaryOp::And, Box::new(expr), Box::new(right));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_eq(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_rel()?;
        loop {
            self.skip_ws();
            let op = if self.eat_str("==") {
                BinaryOp::Eq
            } else if self.eat_str("!=") {
                BinaryOp::NotEq
            } else {
                break;
            };
            let right = self.parse_rel()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn parse_rel(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_add()?;
        loop {
            self.skip_ws();
            let op = if self.eat_str("<=") {
                BinaryOp::LtEq
            } else if self.eat_str(">=") {
                BinaryOp::GtEq
            } else if self.eat('<') {
                BinaryOp::Lt
            } else if self.eat('>') {
                BinaryOp::Gt
            } else {
                break;
            };
            let right = self.parse_add()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn parse_add(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_mul()?;
        loop {
            self.skip_ws();
            let op = if self.eat('+') {
                BinaryOp::Add
            } else if self.eat('-') {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.parse_mul()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn parse_mul(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_unary()?;
        loop {
            self.skip_ws();
            let op = if self.eat('*') {
                BinaryOp::Mul
            } else if self.eat('/') {
                BinaryOp::Div
            } else if self.eat('%') {
                BinaryOp::Mod
            } else {
                break;
            };
            let right = self.parse_unary()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        self.skip_ws();
        if self.eat('!') {
            self.enter()?;
            let operand = self.parse_unary()?;
            self.leave();
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        if self.eat('-') {
            self.enter()?;
            let operand = self.parse_unary()?;
            self.leave();
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, Error> {
        self.skip_ws();
        let prim_start = self.pos;
        let (mut expr, mut bare_number) = self.parse_primary()?;
        loop {
            self.skip_ws();
            if self.peek() != Some('.') {
                break;
            }
            let dot_pos = self.pos;
            self.bump();
            self.skip_ws();
            match self.peek() {
                Some(c) if is_ident_start(c) => {
                    let name = self.scan_ident();
                    expr = Expr::Member(Box::new(expr), name);
                    bare_number = false;
                }
                other => {
                    if bare_number {
                        // a dot with no member name after a bare numeral is a
                        // malformed number literal, spanning back to its digits
                        return Err(Error::new(
                            ErrorCode::NumberFormat,
                            TextSpan::new(prim_start, dot_pos + 1 - prim_start),
                            "malformed number literal",
                        ));
                    }
                    let span = match other {
                        Some(c) => TextSpan::new(self.pos, c.len_utf8()),
                        None => TextSpan::at(self.pos),
                    };
                    return Err(Error::new(
                        ErrorCode::MemberName,
                        span,
                        "expected member name after '.'",
                    ));
                }
            }
        }
        Ok(expr)
    }

    /// Returns the parsed primary plus whether it was a bare number literal
    /// (needed to disambiguate `12.` from member access).
    fn parse_primary(&mut self) -> Result<(Expr, bool), Error> {
        self.skip_ws();
        match self.peek() {
            None => Err(Error::new(
                ErrorCode::UnexpectedChar,
                TextSpan::at(self.pos),
                "expected expression",
            )),
            Some('(') => {
                self.enter()?;
                self.bump();
                let expr = self.parse_or()?;
                self.skip_ws();
                match self.peek() {
                    Some(')') => {
                        self.bump();
                        self.leave();
                        Ok((expr, false))
                    }
                    Some(c) => Err(Error::new(
                        ErrorCode::MissingRParen,
                        TextSpan::new(self.pos, c.len_utf8()),
                        "expected ')'",
                    )),
                    None => Err(Error::new(
                        ErrorCode::MissingRParen,
                        TextSpan::at(self.pos),
                        "expected ')'",
                    )),
                }
            }
            Some('"') => self.parse_string().map(|expr| (expr, false)),
            Some(c) if c.is_ascii_digit() => self.parse_number().map(|expr| (expr, true)),
            Some(c) if is_ident_start(c) => {
                let name = self.scan_ident();
                let expr = match name.as_str() {
                    "true" => Expr::Boolean(true),
                    "false" => Expr::Boolean(false),
                    _ => Expr::Ident(name),
                };
                Ok((expr, false))
            }
            Some(c) => Err(Error::new(
                ErrorCode::UnexpectedChar,
                TextSpan::new(self.pos, c.len_utf8()),
                format!("unexpected character '{c}' in expression"),
            )),
        }
    }

    fn parse_number(&mut self) -> Result<Expr, Error> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') {
            let after_dot = self.src[self.pos + 1..].chars().next();
            if matches!(after_dot, Some(c) if c.is_ascii_digit()) {
                self.bump();
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        let literal = &self.src[start..self.pos];
        Ok(Expr::Number(literal.parse().unwrap_or(0.0)))
    }

    fn parse_string(&mut self) -> Result<Expr, Error> {
        let quote_pos = self.pos;
        if !self.eat('"') {
            return Err(Error::new(
                ErrorCode::StringStart,
                TextSpan::at(self.pos),
                "expected '\"' to start a string literal",
            ));
        }
        let mut out = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(Error::new(
                        ErrorCode::StringUnterminated,
                        TextSpan::new(quote_pos, self.src.len() - quote_pos),
                        "unterminated string literal",
                    ));
                }
                Some('"') => {
                    self.bump();
                    return Ok(Expr::Str(out));
                }
                Some('\\') => {
                    let escape_pos = self.pos;
                    self.bump();
                    match self.peek() {
                        None => {
                            return Err(Error::new(
                                ErrorCode::StringUnterminated,
                                TextSpan::new(quote_pos, self.src.len() - quote_pos),
                                "unterminated string literal",
                            ));
                        }
                        Some(c) => {
                            self.bump();
                            match c {
                                '"' => out.push('"'),
                                '\\' => out.push('\\'),
                                'n' => out.push('\n'),
                                'r' => out.push('\r'),
                                't' => out.push('\t'),
                                other => {
                                    return Err(Error::new(
                                        ErrorCode::StringEscape,
                                        TextSpan::new(escape_pos, 1 + other.len_utf8()),
                                        format!("unsupported escape '\\{other}'"),
                                    ));
                                }
                            }
                        }
                    }
                }
                Some(c) => {
                    self.bump();
                    out.push(c);
                }
            }
        }
    }

    fn scan_ident(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn enter(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::new(
                ErrorCode::NestingDepth,
                TextSpan::at(self.pos),
                "expression nesting is too deep",
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.src[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }
}

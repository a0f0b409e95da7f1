use std::collections::HashMap;
use std::fmt;

use quill_rt::log;
use quill_rt::value::NUMBER_EPSILON;

use crate::ast::{BinaryOp, UnaryOp};
use crate::lexer::{self, is_ident_continue, is_ident_start};
use crate::token::{Token, TokenKind};

/// String-keyed, string-valued view over an arbitrary host model. Dotted
/// paths are handed to `get` whole; values are parsed back into numbers and
/// booleans on the fly during evaluation.
pub trait Model {
    fn get(&self, path: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct MapModel {
    values: HashMap<String, String>,
}

impl MapModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(path.into(), value.into());
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<String>) {
        self.values.insert(path.into(), value.into());
    }
}

impl From<HashMap<String, String>> for MapModel {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl Model for MapModel {
    fn get(&self, path: &str) -> Option<String> {
        self.values.get(path).cloned()
    }
}

/// The adapter keeps its simpler error philosophy: a message, no code, no
/// span. It never shares the core taxonomy.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelError(pub String);

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ModelError {}

fn fail<T>(message: impl Into<String>) -> Result<T, ModelError> {
    Err(ModelError(message.into()))
}

/// Renders a template against a string model. Reuses the surface syntax
/// (same lexer) but parses expressions with the adapter's own grammar.
pub fn render_model(text: &str, model: &dyn Model) -> Result<String, ModelError> {
    let tokens =
        lexer::lex(text).map_err(|err| ModelError(format!("template error: {err}")))?;
    let mut parser = ModelParser {
        tokens: &tokens,
        pos: 0,
    };
    let nodes = parser.parse_nodes(false)?;
    let scope = ModelScope {
        model,
        aliases: HashMap::new(),
        locals: HashMap::new(),
    };
    let mut out = String::new();
    render_nodes(&nodes, &scope, &mut out)?;
    Ok(out)
}

#[derive(Clone, Debug, PartialEq)]
enum MExpr {
    Number(f64),
    Str(String),
    Boolean(bool),
    Path(String),
    Unary(UnaryOp, Box<MExpr>),
    Binary(BinaryOp, Box<MExpr>, Box<MExpr>),
}

#[derive(Clone, Debug)]
enum MNode {
    Text(String),
    Interp(MExpr),
    If {
        cond: MExpr,
        then: Vec<MNode>,
        or_else: Vec<MNode>,
    },
    For {
        item: String,
        index: Option<String>,
        path: String,
        body: Vec<MNode>,
        or_else: Vec<MNode>,
    },
}

struct ModelParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl ModelParser<'_> {
    fn parse_nodes(&mut self, stop_at_rbrace: bool) -> Result<Vec<MNode>, ModelError> {
        let mut nodes = Vec::new();
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::RBrace if stop_at_rbrace => break,
                TokenKind::Text => {
                    let token = self.bump();
                    nodes.push(MNode::Text(token.text.clone()));
                }
                TokenKind::AtIdent => {
                    let token = self.bump();
                    nodes.push(MNode::Interp(MExpr::Path(token.text.clone())));
                }
                TokenKind::AtExpr => {
                    let token = self.bump();
                    nodes.push(MNode::Interp(parse_model_expr(&token.text)?));
                }
                TokenKind::AtIf => nodes.push(self.parse_if()?),
                TokenKind::AtFor => nodes.push(self.parse_for()?),
                TokenKind::LBrace | TokenKind::RBrace | TokenKind::Else => {
                    self.bump();
                }
            }
        }
        Ok(nodes)
    }

    fn parse_if(&mut self) -> Result<MNode, ModelError> {
        let token = self.bump();
        let cond = parse_model_expr(&token.text)?;
        self.expect_lbrace("@if")?;
        let then = self.parse_nodes(true)?;
        self.expect_rbrace("@if")?;
        let or_else = self.parse_else_branch()?;
        Ok(MNode::If {
            cond,
            then,
            or_else,
        })
    }

    fn parse_for(&mut self) -> Result<MNode, ModelError> {
        let token = self.bump();
        let (item, index, path) = parse_model_for_header(&token.text)?;
        self.expect_lbrace("@for")?;
        let body = self.parse_nodes(true)?;
        self.expect_rbrace("@for")?;
        let or_else = self.parse_else_branch()?;
        Ok(MNode::For {
            item,
            index,
            path,
            body,
            or_else,
        })
    }

    fn parse_else_branch(&mut self) -> Result<Vec<MNode>, ModelError> {
        let ws_before = matches!(
            self.peek(),
            Some(t) if t.kind == TokenKind::Text && t.text.chars().all(char::is_whitespace)
        );
        let else_index = if ws_before { 1 } else { 0 };
        let has_else = matches!(
            self.tokens.get(self.pos + else_index),
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
            return Ok(vec![self.parse_if()?]);
        }
        self.expect_lbrace("else")?;
        let nodes = self.parse_nodes(true)?;
        self.expect_rbrace("else")?;
        Ok(nodes)
    }

    fn expect_lbrace(&mut self, what: &str) -> Result<(), ModelError> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::LBrace => {
                self.bump();
                Ok(())
            }
            _ => fail(format!("expected '{{' to open the {what} block")),
        }
    }

    fn expect_rbrace(&mut self, what: &str) -> Result<(), ModelError> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::RBrace => {
                self.bump();
                Ok(())
            }
            _ => fail(format!("expected '}}' to close the {what} block")),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> &Token {
        let token = &self.tokens[self.pos];
        self.pos += 1;
        token
    }
}

fn parse_model_for_header(text: &str) -> Result<(String, Option<String>, String), ModelError> {
    let mut parser = MParser { src: text, pos: 0 };
    parser.skip_ws();
    let item = parser
        .scan_plain_ident()
        .ok_or_else(|| ModelError("expected loop variable name in @for header".to_string()))?;
    parser.skip_ws();
    let index = if parser.eat(',') {
        parser.skip_ws();
        let name = parser.scan_plain_ident().ok_or_else(|| {
            ModelError("expected index variable name in @for header".to_string())
        })?;
        parser.skip_ws();
        Some(name)
    } else {
        None
    };
    match parser.scan_plain_ident() {
        Some(word) if word == "in" => {}
        _ => return fail("expected 'in' in @for header"),
    }
    parser.skip_ws();
    let path = parser
        .scan_path()
        .ok_or_else(|| ModelError("expected a model path after 'in'".to_string()))?;
    parser.skip_ws();
    if !parser.at_end() {
        return fail("unexpected input after @for header");
    }
    Ok((item, index, path))
}

// --- expression grammar (scientific-notation numbers, whole-path idents) ---

fn parse_model_expr(text: &str) -> Result<MExpr, ModelError> {
    let mut parser = MParser { src: text, pos: 0 };
    parser.skip_ws();
    if parser.at_end() {
        return fail("empty expression");
    }
    let expr = parser.parse_or()?;
    parser.skip_ws();
    if !parser.at_end() {
        return fail(format!(
            "unexpected input '{}' after expression",
            &text[parser.pos..]
        ));
    }
    Ok(expr)
}

struct MParser<'a> {
    src: &'a str,
    pos: usize,
}

impl MParser<'_> {
    fn parse_or(&mut self) -> Result<MExpr, ModelError> {
        let mut expr = self.parse_and()?;
        loop {
            self.skip_ws();
            if self.eat_str("||") {
                let right = self.parse_and()?;
                expr = MExpr::Binary(BinaryOp::Or, Box::new(expr), Box::new(right));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<MExpr, ModelError> {
        let mut expr = self.parse_eq()?;
        loop {
            self.skip_ws();
            if self.eat_str("&&") {
                let right = self.parse_eq()?;
                expr = MExpr::Binary(BinaryOp::And, Box::new(expr), Box::new(right));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_eq(&mut self) -> Result<MExpr, ModelError> {
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
            expr = MExpr::Binary(op, Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn parse_rel(&mut self) -> Result<MExpr, ModelError> {
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
            expr = MExpr::Binary(op, Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn parse_add(&mut self) -> Result<MExpr, ModelError> {
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
            expr = MExpr::Binary(op, Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn parse_mul(&mut self) -> Result<MExpr, ModelError> {
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
            expr = MExpr::Binary(op, Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<MExpr, ModelError> {
        self.skip_ws();
        if self.eat('!') {
            let operand = self.parse_unary()?;
            return Ok(MExpr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        if self.eat('-') {
            let operand = self.parse_unary()?;
            return Ok(MExpr::Unary(UnaryOp::Neg, Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<MExpr, ModelError> {
        self.skip_ws();
        match self.peek() {
            None => fail("expected expression"),
            Some('(') => {
                self.bump();
                let expr = self.parse_or()?;
                self.skip_ws();
                if !self.eat(')') {
                    return fail("expected ')'");
                }
                Ok(expr)
            }
            Some('"') => self.parse_string(),
            Some(c) if c.is_ascii_digit() => self.parse_number(),
            Some(c) if is_ident_start(c) => {
                let path = self.scan_path().unwrap_or_default();
                match path.as_str() {
                    "true" => Ok(MExpr::Boolean(true)),
                    "false" => Ok(MExpr::Boolean(false)),
                    _ => Ok(MExpr::Path(path)),
                }
            }
            Some(c) => fail(format!("unexpected character '{c}' in expression")),
        }
    }

    fn parse_number(&mut self) -> Result<MExpr, ModelError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') {
            let after = self.src[self.pos + 1..].chars().next();
            if matches!(after, Some(c) if c.is_ascii_digit()) {
                self.bump();
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            // exponent only counts when digits follow
            let mark = self.pos;
            self.bump();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.bump();
            }
            if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
            } else {
                self.pos = mark;
            }
        }
        let literal = &self.src[start..self.pos];
        literal
            .parse()
            .map(MExpr::Number)
            .map_err(|_| ModelError(format!("invalid number '{literal}'")))
    }

    fn parse_string(&mut self) -> Result<MExpr, ModelError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return fail("unterminated string literal"),
                Some('"') => {
                    self.bump();
                    return Ok(MExpr::Str(out));
                }
                Some('\\') => {
                    self.bump();
                    match self.peek() {
                        None => return fail("unterminated string literal"),
                        Some(c) => {
                            self.bump();
                            match c {
                                '"' => out.push('"'),
                                '\\' => out.push('\\'),
                                'n' => out.push('\n'),
                                'r' => out.push('\r'),
                                't' => out.push('\t'),
                                other => return fail(format!("unsupported escape '\\{other}'")),
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

    fn scan_plain_ident(&mut self) -> Option<String> {
        match self.peek() {
            Some(c) if is_ident_start(c) => {}
            _ => return None,
        }
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.bump();
        }
        Some(self.src[start..self.pos].to_string())
    }

    fn scan_path(&mut self) -> Option<String> {
        match self.peek() {
            Some(c) if is_ident_start(c) => {}
            _ => return None,
        }
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_ident_continue(c) || c == '.') {
            self.bump();
        }
        Some(self.src[start..self.pos].to_string())
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

// --- evaluation over on-the-fly parsed strings ---

#[derive(Clone, Debug)]
enum MValue {
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl MValue {
    fn render(&self) -> String {
        match self {
            MValue::Text(v) => v.clone(),
            MValue::Number(v) => v.to_string(),
            MValue::Boolean(v) => v.to_string(),
        }
    }

    fn to_number(&self) -> Result<f64, ModelError> {
        match self {
            MValue::Number(v) => Ok(*v),
            MValue::Text(v) => v
                .trim()
                .parse()
                .map_err(|_| ModelError(format!("'{v}' is not a number"))),
            MValue::Boolean(_) => fail("a boolean is not a number"),
        }
    }

    fn to_bool(&self) -> Result<bool, ModelError> {
        match self {
            MValue::Boolean(v) => Ok(*v),
            MValue::Text(v) => match v.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => fail(format!("'{other}' is not a boolean")),
            },
            MValue::Number(_) => fail("a number is not a boolean"),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            MValue::Number(v) => Some(*v),
            MValue::Text(v) => v.trim().parse().ok(),
            MValue::Boolean(_) => None,
        }
    }
}

struct ModelScope<'a> {
    model: &'a dyn Model,
    aliases: HashMap<String, String>,
    locals: HashMap<String, String>,
}

impl ModelScope<'_> {
    /// Rewrites a leading loop-variable alias into its element path.
    fn expand(&self, path: &str) -> String {
        match path.split_once('.') {
            Some((head, rest)) => match self.aliases.get(head) {
                Some(prefix) => format!("{prefix}.{rest}"),
                None => path.to_string(),
            },
            None => self
                .aliases
                .get(path)
                .cloned()
                .unwrap_or_else(|| path.to_string()),
        }
    }

    fn lookup(&self, path: &str) -> Option<String> {
        if let Some(local) = self.locals.get(path) {
            return Some(local.clone());
        }
        self.model.get(&self.expand(path))
    }
}

fn eval_expr(expr: &MExpr, scope: &ModelScope<'_>) -> Result<MValue, ModelError> {
    match expr {
        MExpr::Number(v) => Ok(MValue::Number(*v)),
        MExpr::Str(v) => Ok(MValue::Text(v.clone())),
        MExpr::Boolean(v) => Ok(MValue::Boolean(*v)),
        MExpr::Path(path) => scope.lookup(path).map(MValue::Text).ok_or_else(|| {
            log::warn(&format!("model lookup miss: {path}"));
            ModelError(format!("unknown value '{path}'"))
        }),
        MExpr::Unary(op, operand) => {
            let value = eval_expr(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(MValue::Boolean(!value.to_bool()?)),
                UnaryOp::Neg => Ok(MValue::Number(-value.to_number()?)),
            }
        }
        MExpr::Binary(op, left, right) => {
            let left = eval_expr(left, scope)?;
            let right = eval_expr(right, scope)?;
            eval_binary(*op, left, right)
        }
    }
}

fn eval_binary(op: BinaryOp, left: MValue, right: MValue) -> Result<MValue, ModelError> {
    match op {
        BinaryOp::Add => match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => Ok(MValue::Number(a + b)),
            _ => Ok(MValue::Text(format!("{}{}", left.render(), right.render()))),
        },
        BinaryOp::Sub => Ok(MValue::Number(left.to_number()? - right.to_number()?)),
        BinaryOp::Mul => Ok(MValue::Number(left.to_number()? * right.to_number()?)),
        BinaryOp::Div => {
            let divisor = right.to_number()?;
            if divisor.abs() < NUMBER_EPSILON {
                return fail("division by zero");
            }
            Ok(MValue::Number(left.to_number()? / divisor))
        }
        BinaryOp::Mod => {
            let divisor = right.to_number()?;
            if divisor.abs() < NUMBER_EPSILON {
                return fail("modulo by zero");
            }
            Ok(MValue::Number(left.to_number()? % divisor))
        }
        BinaryOp::Eq | BinaryOp::NotEq => {
            let equal = match (left.as_number(), right.as_number()) {
                (Some(a), Some(b)) => (a - b).abs() < NUMBER_EPSILON,
                _ => left.render() == right.render(),
            };
            Ok(MValue::Boolean(if op == BinaryOp::Eq { equal } else { !equal }))
        }
        BinaryOp::Lt => Ok(MValue::Boolean(left.to_number()? < right.to_number()?)),
        BinaryOp::LtEq => Ok(MValue::Boolean(left.to_number()? <= right.to_number()?)),
        BinaryOp::Gt => Ok(MValue::Boolean(left.to_number()? > right.to_number()?)),
        BinaryOp::GtEq => Ok(MValue::Boolean(left.to_number()? >= right.to_number()?)),
        BinaryOp::And => Ok(MValue::Boolean(left.to_bool()? && right.to_bool()?)),
        BinaryOp::Or => Ok(MValue::Boolean(left.to_bool()? || right.to_bool()?)),
    }
}

fn render_nodes(
    nodes: &[MNode],
    scope: &ModelScope<'_>,
    out: &mut String,
) -> Result<(), ModelError> {
    for node in nodes {
        match node {
            MNode::Text(content) => out.push_str(content),
            MNode::Interp(expr) => out.push_str(&eval_expr(expr, scope)?.render()),
            MNode::If {
                cond,
                then,
                or_else,
            } => {
                if eval_expr(cond, scope)?.to_bool()? {
                    render_nodes(then, scope, out)?;
                } else {
                    render_nodes(or_else, scope, out)?;
                }
            }
            MNode::For {
                item,
                index,
                path,
                body,
                or_else,
            } => {
                let base = scope.expand(path);
                let mut position = 0usize;
                loop {
                    let element = format!("{base}.{position}");
                    if scope.model.get(&element).is_none() {
                        break;
                    }
                    let mut inner = ModelScope {
                        model: scope.model,
                        aliases: scope.aliases.clone(),
                        locals: scope.locals.clone(),
                    };
                    inner.aliases.insert(item.clone(), element);
                    if let Some(index_name) = index {
                        inner.locals.insert(index_name.clone(), position.to_string());
                    }
                    render_nodes(body, &inner, out)?;
                    position += 1;
                }
                if position == 0 {
                    render_nodes(or_else, scope, out)?;
                }
            }
        }
    }
    Ok(())
}

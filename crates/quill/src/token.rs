use serde::{Deserialize, Serialize};

use crate::span::TextSpan;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Text,
    AtIdent,
    AtExpr,
    AtIf,
    AtFor,
    Else,
    LBrace,
    RBrace,
}

/// For `AtIdent`/`AtExpr`/`AtIf`/`AtFor`, `text` is the inner payload and
/// `span` covers the full source extent including delimiters. For `Text`,
/// `text` is the decoded content (`@@` contributes a single `@`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: TextSpan,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: TextSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn bare(kind: TokenKind, span: TextSpan) -> Self {
        Self {
            kind,
            text: String::new(),
            span,
        }
    }
}

use crate::error::{Error, ErrorCode};
use crate::span::TextSpan;
use crate::token::{Token, TokenKind};

/// Splits template text into a flat token stream. Total over any input;
/// the only failures are unterminated `@(`/`@if(`/`@for(` constructs.
pub fn lex(text: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut run = TextRun::new();
    let mut i = 0usize;

    while i < text.len() {
        let ch = text[i..].chars().next().unwrap();

        if ch == '@' {
            if text[i + 1..].starts_with('@') {
                // escaped '@': two source chars, one content char
                run.push('@', i, 2);
                i += 2;
                continue;
            }
            match text[i + 1..].chars().next() {
                Some('(') => {
                    let body_start = i + 2;
                    let close = match scan_balanced(text, body_start) {
                        Some(close) => close,
                        None => {
                            return Err(Error::new(
                                ErrorCode::UnterminatedExpr,
                                TextSpan::new(i, text.len() - i),
                                "unterminated '@(' expression",
                            ));
                        }
                    };
                    run.flush(&mut tokens);
                    tokens.push(Token::new(
                        TokenKind::AtExpr,
                        &text[body_start..close],
                        TextSpan::new(i, close + 1 - i),
                    ));
                    i = close + 1;
                }
                Some(c) if is_ident_start(c) => {
                    let ident_start = i + 1;
                    let mut j = ident_start + c.len_utf8();
                    while j < text.len() {
                        let c2 = text[j..].chars().next().unwrap();
                        if is_ident_continue(c2) {
                            j += c2.len_utf8();
                        } else {
                            break;
                        }
                    }
                    let word = &text[ident_start..j];
                    let keyword_form =
                        matches!(word, "if" | "for" | "elif") && text[j..].starts_with('(');
                    if keyword_form {
                        let body_start = j + 1;
                        let close = match scan_balanced(text, body_start) {
                            Some(close) => close,
                            None => {
                                let code = if word == "for" {
                                    ErrorCode::UnterminatedFor
                                } else {
                                    ErrorCode::UnterminatedIf
                                };
                                return Err(Error::new(
                                    code,
                                    TextSpan::new(i, text.len() - i),
                                    format!("unterminated '@{word}(' construct"),
                                ));
                            }
                        };
                        run.flush(&mut tokens);
                        let span = TextSpan::new(i, close + 1 - i);
                        let inner = &text[body_start..close];
                        match word {
                            "if" => tokens.push(Token::new(TokenKind::AtIf, inner, span)),
                            "for" => tokens.push(Token::new(TokenKind::AtFor, inner, span)),
                            _ => {
                                // `@elif(c)` is lexically `else` followed by `@if(c)`
                                tokens.push(Token::bare(
                                    TokenKind::Else,
                                    TextSpan::new(i, j - i),
                                ));
                                tokens.push(Token::new(TokenKind::AtIf, inner, span));
                            }
                        }
                        i = close + 1;
                    } else {
                        run.flush(&mut tokens);
                        tokens.push(Token::new(
                            TokenKind::AtIdent,
                            word,
                            TextSpan::new(i, j - i),
                        ));
                        i = j;
                    }
                }
                _ => {
                    // a lone '@' stays literal
                    run.push('@', i, 1);
                    i += 1;
                }
            }
            continue;
        }

        if ch == '{' {
            run.flush(&mut tokens);
            tokens.push(Token::bare(TokenKind::LBrace, TextSpan::new(i, 1)));
            i += 1;
            continue;
        }
        if ch == '}' {
            run.flush(&mut tokens);
            tokens.push(Token::bare(TokenKind::RBrace, TextSpan::new(i, 1)));
            i += 1;
            continue;
        }

        if ch == 'e' && at_word_start(text, i) && text[i..].starts_with("else") {
            let after = i + 4;
            let bounded = match text[after..].chars().next() {
                Some(c) => !is_ident_continue(c),
                None => true,
            };
            if bounded {
                let mut j = after;
                while j < text.len() {
                    let c = text[j..].chars().next().unwrap();
                    if c.is_whitespace() {
                        j += c.len_utf8();
                    } else {
                        break;
                    }
                }
                if text[j..].starts_with('{') {
                    run.flush(&mut tokens);
                    tokens.push(Token::bare(TokenKind::Else, TextSpan::new(i, 4)));
                    // whitespace up to '{' belongs to the block syntax
                    i = j;
                    continue;
                }
            }
        }

        run.push(ch, i, ch.len_utf8());
        i += ch.len_utf8();
    }

    run.flush(&mut tokens);
    Ok(tokens)
}

struct TextRun {
    content: String,
    start: usize,
    length: usize,
}

impl TextRun {
    fn new() -> Self {
        Self {
            content: String::new(),
            start: 0,
            length: 0,
        }
    }

    fn push(&mut self, ch: char, offset: usize, raw_len: usize) {
        if self.length == 0 {
            self.start = offset;
        }
        self.content.push(ch);
        self.length += raw_len;
    }

    fn flush(&mut self, tokens: &mut Vec<Token>) {
        if self.length == 0 {
            return;
        }
        let span = TextSpan::new(self.start, self.length);
        tokens.push(Token::new(
            TokenKind::Text,
            std::mem::take(&mut self.content),
            span,
        ));
        self.length = 0;
    }
}

/// Finds the `)` matching an already-consumed `(`, starting at `start`.
/// A `)` inside an unescaped double-quoted string does not close.
fn scan_balanced(text: &str, start: usize) -> Option<usize> {
    let mut depth = 1i32;
    let mut in_string = false;
    let mut escape = false;
    let mut k = start;
    while k < text.len() {
        let ch = text[k..].chars().next().unwrap();
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
        } else if ch == '(' {
            depth += 1;
        } else if ch == ')' {
            depth -= 1;
            if depth == 0 {
                return Some(k);
            }
        }
        k += ch.len_utf8();
    }
    None
}

fn at_word_start(text: &str, i: usize) -> bool {
    match text[..i].chars().next_back() {
        Some(prev) => !is_ident_continue(prev),
        None => true,
    }
}

pub(crate) fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

pub(crate) fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

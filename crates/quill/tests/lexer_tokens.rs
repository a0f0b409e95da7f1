use quill::lex;
use quill::{ErrorCode, TokenKind};

fn summarize(text: &str) -> Vec<(TokenKind, String, usize, usize)> {
    lex(text)
        .expect("expected lex success")
        .into_iter()
        .map(|t| (t.kind, t.text, t.span.offset, t.span.length))
        .collect()
}

#[test]
fn empty_input_yields_no_tokens() {
    assert!(lex("").unwrap().is_empty());
}

#[test]
fn plain_text_is_a_single_token() {
    assert_eq!(
        summarize("hello world"),
        vec![(TokenKind::Text, "hello world".to_string(), 0, 11)]
    );
}

#[test]
fn escaped_at_collapses_into_the_text_run() {
    // two source chars, one content char, still one token
    assert_eq!(
        summarize("mail@@host"),
        vec![(TokenKind::Text, "mail@host".to_string(), 0, 10)]
    );
}

#[test]
fn lone_at_is_literal() {
    assert_eq!(
        summarize("1 @ 2"),
        vec![(TokenKind::Text, "1 @ 2".to_string(), 0, 5)]
    );
}

#[test]
fn identifier_interpolation_spans_at_and_name() {
    assert_eq!(
        summarize("hi @name!"),
        vec![
            (TokenKind::Text, "hi ".to_string(), 0, 3),
            (TokenKind::AtIdent, "name".to_string(), 3, 5),
            (TokenKind::Text, "!".to_string(), 8, 1),
        ]
    );
}

#[test]
fn expression_token_keeps_inner_payload_and_full_span() {
    assert_eq!(
        summarize("@(1+2)"),
        vec![(TokenKind::AtExpr, "1+2".to_string(), 0, 6)]
    );
}

#[test]
fn paren_inside_string_does_not_close_the_expression() {
    assert_eq!(
        summarize(r#"@("(")"#),
        vec![(TokenKind::AtExpr, "\"(\"".to_string(), 0, 6)]
    );
}

#[test]
fn escaped_quote_inside_string_keeps_scanning() {
    assert_eq!(
        summarize(r#"@("a\")")"#),
        vec![(TokenKind::AtExpr, r#""a\")""#.to_string(), 0, 9)]
    );
}

#[test]
fn nested_parens_balance() {
    assert_eq!(
        summarize("@((1+2)*3)"),
        vec![(TokenKind::AtExpr, "(1+2)*3".to_string(), 0, 10)]
    );
}

#[test]
fn if_token_carries_condition_source() {
    assert_eq!(
        summarize("@if(x > 1){y}"),
        vec![
            (TokenKind::AtIf, "x > 1".to_string(), 0, 10),
            (TokenKind::LBrace, String::new(), 10, 1),
            (TokenKind::Text, "y".to_string(), 11, 1),
            (TokenKind::RBrace, String::new(), 12, 1),
        ]
    );
}

#[test]
fn for_token_carries_raw_header() {
    assert_eq!(
        summarize("@for(item, i in items){}"),
        vec![
            (TokenKind::AtFor, "item, i in items".to_string(), 0, 22),
            (TokenKind::LBrace, String::new(), 22, 1),
            (TokenKind::RBrace, String::new(), 23, 1),
        ]
    );
}

#[test]
fn else_requires_a_following_brace() {
    assert_eq!(
        summarize("}else{"),
        vec![
            (TokenKind::RBrace, String::new(), 0, 1),
            (TokenKind::Else, String::new(), 1, 4),
            (TokenKind::LBrace, String::new(), 5, 1),
        ]
    );
    // no brace after: ordinary prose
    assert_eq!(
        summarize("or else what"),
        vec![(TokenKind::Text, "or else what".to_string(), 0, 12)]
    );
}

#[test]
fn else_consumes_whitespace_before_its_brace() {
    assert_eq!(
        summarize("else   {x}"),
        vec![
            (TokenKind::Else, String::new(), 0, 4),
            (TokenKind::LBrace, String::new(), 7, 1),
            (TokenKind::Text, "x".to_string(), 8, 1),
            (TokenKind::RBrace, String::new(), 9, 1),
        ]
    );
}

#[test]
fn else_inside_a_word_is_text() {
    assert_eq!(
        summarize("elsewhere {"),
        vec![
            (TokenKind::Text, "elsewhere ".to_string(), 0, 10),
            (TokenKind::LBrace, String::new(), 10, 1),
        ]
    );
}

#[test]
fn elif_desugars_to_else_plus_if() {
    assert_eq!(
        summarize("@elif(x){y}"),
        vec![
            (TokenKind::Else, String::new(), 0, 5),
            (TokenKind::AtIf, "x".to_string(), 0, 8),
            (TokenKind::LBrace, String::new(), 8, 1),
            (TokenKind::Text, "y".to_string(), 9, 1),
            (TokenKind::RBrace, String::new(), 10, 1),
        ]
    );
}

#[test]
fn keyword_without_paren_is_an_identifier() {
    assert_eq!(
        summarize("@if done"),
        vec![
            (TokenKind::AtIdent, "if".to_string(), 0, 3),
            (TokenKind::Text, " done".to_string(), 3, 5),
        ]
    );
}

#[test]
fn unterminated_constructs_report_their_opening() {
    let err = lex("text @(1 + 2").unwrap_err();
    assert_eq!(err.code, ErrorCode::UnterminatedExpr);
    assert_eq!((err.span.offset, err.span.length), (5, 7));

    let err = lex("@if(x").unwrap_err();
    assert_eq!(err.code, ErrorCode::UnterminatedIf);
    assert_eq!((err.span.offset, err.span.length), (0, 5));

    let err = lex("@for(x in xs").unwrap_err();
    assert_eq!(err.code, ErrorCode::UnterminatedFor);
    assert_eq!((err.span.offset, err.span.length), (0, 12));

    let err = lex(r#"@(")"#).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnterminatedExpr);
}

#[test]
fn lexing_is_deterministic() {
    let text = "a @name @if(x){@(1+2)}else{b} @@";
    assert_eq!(lex(text).unwrap(), lex(text).unwrap());
}

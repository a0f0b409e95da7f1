use quill::parse_expr;
use quill::{BinaryOp, Expr, UnaryOp};

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary(op, Box::new(left), Box::new(right))
}

fn num(v: f64) -> Expr {
    Expr::Number(v)
}

#[test]
fn equality_is_left_associative() {
    assert_eq!(
        parse_expr("1 == 2 == 3").unwrap(),
        binary(BinaryOp::Eq, binary(BinaryOp::Eq, num(1.0), num(2.0)), num(3.0))
    );
}

#[test]
fn multiplicative_chain_is_left_associative() {
    assert_eq!(
        parse_expr("2*3/4%5").unwrap(),
        binary(
            BinaryOp::Mod,
            binary(BinaryOp::Div, binary(BinaryOp::Mul, num(2.0), num(3.0)), num(4.0)),
            num(5.0)
        )
    );
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(
        parse_expr("1 + 2 * 3").unwrap(),
        binary(BinaryOp::Add, num(1.0), binary(BinaryOp::Mul, num(2.0), num(3.0)))
    );
}

#[test]
fn parens_override_precedence() {
    assert_eq!(
        parse_expr("(1 + 2) * 3").unwrap(),
        binary(BinaryOp::Mul, binary(BinaryOp::Add, num(1.0), num(2.0)), num(3.0))
    );
}

#[test]
fn relational_binds_tighter_than_boolean() {
    assert_eq!(
        parse_expr("a < b && c >= d").unwrap(),
        binary(
            BinaryOp::And,
            binary(
                BinaryOp::Lt,
                Expr::Ident("a".to_string()),
                Expr::Ident("b".to_string())
            ),
            binary(
                BinaryOp::GtEq,
                Expr::Ident("c".to_string()),
                Expr::Ident("d".to_string())
            ),
        )
    );
}

#[test]
fn unary_operators_nest() {
    assert_eq!(
        parse_expr("!ok").unwrap(),
        Expr::Unary(UnaryOp::Not, Box::new(Expr::Ident("ok".to_string())))
    );
    assert_eq!(
        parse_expr("--2").unwrap(),
        Expr::Unary(
            UnaryOp::Neg,
            Box::new(Expr::Unary(UnaryOp::Neg, Box::new(num(2.0))))
        )
    );
}

#[test]
fn member_chains_fold_left() {
    assert_eq!(
        parse_expr("a.b.c").unwrap(),
        Expr::Member(
            Box::new(Expr::Member(
                Box::new(Expr::Ident("a".to_string())),
                "b".to_string()
            )),
            "c".to_string()
        )
    );
}

#[test]
fn keyword_literals_need_word_boundaries() {
    assert_eq!(parse_expr("true").unwrap(), Expr::Boolean(true));
    assert_eq!(parse_expr("false").unwrap(), Expr::Boolean(false));
    assert_eq!(
        parse_expr("trueish").unwrap(),
        Expr::Ident("trueish".to_string())
    );
}

#[test]
fn number_literals_parse_with_fractions() {
    assert_eq!(parse_expr("12").unwrap(), num(12.0));
    assert_eq!(parse_expr("12.5").unwrap(), num(12.5));
    assert_eq!(parse_expr("0.25").unwrap(), num(0.25));
}

#[test]
fn member_access_on_a_number_literal_parses() {
    // `12.abs` is member access at parse time; typing is the evaluator's job
    assert_eq!(
        parse_expr("12.abs").unwrap(),
        Expr::Member(Box::new(num(12.0)), "abs".to_string())
    );
}

#[test]
fn string_literals_decode_escapes() {
    assert_eq!(
        parse_expr(r#""a\nb\t\"c\"""#).unwrap(),
        Expr::Str("a\nb\t\"c\"".to_string())
    );
}

#[test]
fn whitespace_everywhere_is_tolerated() {
    assert_eq!(
        parse_expr("  1  +  2  ").unwrap(),
        binary(BinaryOp::Add, num(1.0), num(2.0))
    );
}

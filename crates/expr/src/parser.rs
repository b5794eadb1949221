//! Hand-written recursive descent parser for the routing expression
//! language.
//!
//! Uses `nom` for low-level token recognition and implements precedence
//! climbing manually. The output is the [`Expr`] AST.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{opt, recognize},
    multi::separated_list0,
    sequence::{delimited, tuple},
};

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::ExprError;

/// Parse a complete expression string into an [`Expr`].
///
/// Returns [`ExprError::InvalidExpression`] when the input is empty, cannot
/// be parsed, or has trailing tokens.
pub fn parse_expr(input: &str) -> Result<Expr, ExprError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ExprError::InvalidExpression("empty expression".to_owned()));
    }
    let (rest, expr) = parse_ternary(input)
        .map_err(|e| ExprError::InvalidExpression(format!("parse error: {e}")))?;
    let rest = rest.trim();
    if !rest.is_empty() {
        return Err(ExprError::InvalidExpression(format!(
            "unexpected trailing input: {rest:?}"
        )));
    }
    Ok(expr)
}

// ---------------------------------------------------------------------------
// Whitespace helper
// ---------------------------------------------------------------------------

/// Consume optional whitespace around a parser.
fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

// ---------------------------------------------------------------------------
// Atoms
// ---------------------------------------------------------------------------

/// Parse an atom: literal, identifier, parenthesised expression, or list.
fn parse_atom(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;
    alt((
        parse_null,
        parse_bool,
        parse_number,
        parse_string_literal,
        parse_list_literal,
        parse_paren,
        parse_function_or_ident,
    ))(input)
}

/// Reject keyword matches that are a prefix of a longer identifier.
fn ident_boundary<'a>(
    rest: &'a str,
    input: &'a str,
) -> Result<(), nom::Err<nom::error::Error<&'a str>>> {
    if rest
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
    {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }
    Ok(())
}

/// Parse the `null` keyword.
fn parse_null(input: &str) -> IResult<&str, Expr> {
    let (rest, _) = tag("null")(input)?;
    ident_boundary(rest, input)?;
    Ok((rest, Expr::Null))
}

/// Parse boolean literals `true` and `false`.
fn parse_bool(input: &str) -> IResult<&str, Expr> {
    let (rest, word) = alt((tag("true"), tag("false")))(input)?;
    ident_boundary(rest, input)?;
    Ok((rest, Expr::Bool(word == "true")))
}

/// Parse an unsigned number literal (integer or float). A leading `-` is
/// handled at the unary-expression level so that `5 - 3` parses as a binary
/// subtraction.
fn parse_number(input: &str) -> IResult<&str, Expr> {
    let (rest, num_str) = recognize(tuple((
        take_while1(|c: char| c.is_ascii_digit()),
        opt(tuple((
            char('.'),
            take_while1(|c: char| c.is_ascii_digit()),
        ))),
    )))(input)?;

    if num_str.contains('.') {
        let f: f64 = num_str.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Float))
        })?;
        Ok((rest, Expr::Float(f)))
    } else {
        let i: i64 = num_str.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        Ok((rest, Expr::Int(i)))
    }
}

/// Parse a double-quoted string literal with `\n`, `\t`, `\\`, `\"` escapes.
fn parse_string_literal(input: &str) -> IResult<&str, Expr> {
    let (input, _) = char('"')(input)?;
    let mut result = String::new();
    let mut chars = input.chars();
    let mut consumed = 0;
    loop {
        match chars.next() {
            Some('"') => {
                consumed += 1;
                return Ok((&input[consumed..], Expr::String(result)));
            }
            Some('\\') => {
                consumed += 1;
                match chars.next() {
                    Some('n') => {
                        result.push('\n');
                        consumed += 1;
                    }
                    Some('t') => {
                        result.push('\t');
                        consumed += 1;
                    }
                    Some('\\') => {
                        result.push('\\');
                        consumed += 1;
                    }
                    Some('"') => {
                        result.push('"');
                        consumed += 1;
                    }
                    Some(c) => {
                        result.push('\\');
                        result.push(c);
                        consumed += c.len_utf8();
                    }
                    None => {
                        return Err(nom::Err::Error(nom::error::Error::new(
                            input,
                            nom::error::ErrorKind::Char,
                        )));
                    }
                }
            }
            Some(c) => {
                result.push(c);
                consumed += c.len_utf8();
            }
            None => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Char,
                )));
            }
        }
    }
}

/// Parse a list literal: `[expr, expr, ...]`.
fn parse_list_literal(input: &str) -> IResult<&str, Expr> {
    let (input, _) = char('[')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, items) = separated_list0(ws(char(',')), parse_ternary)(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(']')(input)?;
    Ok((input, Expr::List(items)))
}

/// Parse a parenthesised expression.
fn parse_paren(input: &str) -> IResult<&str, Expr> {
    let (input, _) = char('(')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, expr) = parse_ternary(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, expr))
}

/// Parse a bare identifier matching `[a-zA-Z_][a-zA-Z0-9_]*`.
fn parse_ident_str(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    )))(input)
}

/// Parse a function call or a plain identifier.
fn parse_function_or_ident(input: &str) -> IResult<&str, Expr> {
    let (rest, ident) = parse_ident_str(input)?;
    let (after_ws, _) = multispace0(rest)?;

    if after_ws.starts_with('(') {
        let (rest2, _) = char('(')(after_ws)?;
        let (rest2, _) = multispace0(rest2)?;
        let (rest2, args) = separated_list0(ws(char(',')), parse_ternary)(rest2)?;
        let (rest2, _) = multispace0(rest2)?;
        let (rest2, _) = char(')')(rest2)?;
        return Ok((rest2, Expr::Call(ident.to_owned(), args)));
    }

    Ok((rest, Expr::Ident(ident.to_owned())))
}

// ---------------------------------------------------------------------------
// Postfix: field access, index access, method calls
// ---------------------------------------------------------------------------

/// Parse postfix operations: `.field`, `[index]`, `.method(args)`.
fn parse_postfix(input: &str) -> IResult<&str, Expr> {
    let (mut input, mut expr) = parse_atom(input)?;

    loop {
        let (next, _) = multispace0(input)?;

        if let Ok((rest, _)) = char::<&str, nom::error::Error<&str>>('.')(next) {
            let (rest, _) = multispace0(rest)?;
            let (rest, field) = parse_ident_str(rest)?;
            let (after_ws, _) = multispace0(rest)?;

            if after_ws.starts_with('(') {
                let (rest2, _) = char('(')(after_ws)?;
                let (rest2, _) = multispace0(rest2)?;
                let (rest2, args) = separated_list0(ws(char(',')), parse_ternary)(rest2)?;
                let (rest2, _) = multispace0(rest2)?;
                let (rest2, _) = char(')')(rest2)?;

                expr = lower_method_call(expr, field, args);
                input = rest2;
                continue;
            }

            expr = Expr::Field(Box::new(expr), field.to_owned());
            input = rest;
            continue;
        }

        if let Ok((rest, _)) = char::<&str, nom::error::Error<&str>>('[')(next) {
            let (rest, _) = multispace0(rest)?;
            let (rest, index_expr) = parse_ternary(rest)?;
            let (rest, _) = multispace0(rest)?;
            let (rest, _) = char(']')(rest)?;
            expr = Expr::Index(Box::new(expr), Box::new(index_expr));
            input = rest;
            continue;
        }

        input = next;
        break;
    }

    Ok((input, expr))
}

/// Lower a method call into the AST.
///
/// The string predicates become binary operators; any other method becomes
/// a builtin call with the receiver prepended, so `alert_labels.hasLabel`
/// style chaining works for every builtin.
fn lower_method_call(receiver: Expr, method: &str, mut args: Vec<Expr>) -> Expr {
    match (method, args.len()) {
        ("contains", 1) => Expr::Binary(
            BinaryOp::Contains,
            Box::new(receiver),
            Box::new(args.remove(0)),
        ),
        ("startsWith", 1) => Expr::Binary(
            BinaryOp::StartsWith,
            Box::new(receiver),
            Box::new(args.remove(0)),
        ),
        ("endsWith", 1) => Expr::Binary(
            BinaryOp::EndsWith,
            Box::new(receiver),
            Box::new(args.remove(0)),
        ),
        ("matches", 1) => Expr::Binary(
            BinaryOp::Matches,
            Box::new(receiver),
            Box::new(args.remove(0)),
        ),
        _ => {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(receiver);
            full.append(&mut args);
            Expr::Call(method.to_owned(), full)
        }
    }
}

// ---------------------------------------------------------------------------
// Precedence climbing
// ---------------------------------------------------------------------------

/// Parse unary expressions: `!expr`, `-expr`.
fn parse_unary(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;
    if let Ok((rest, _)) = char::<&str, nom::error::Error<&str>>('!')(input) {
        // Do not consume `!=` here.
        if !rest.starts_with('=') {
            let (rest, inner) = parse_unary(rest)?;
            return Ok((rest, Expr::Unary(UnaryOp::Not, Box::new(inner))));
        }
    }
    if let Ok((rest, _)) = char::<&str, nom::error::Error<&str>>('-')(input) {
        let (rest, inner) = parse_unary(rest)?;
        return Ok((rest, Expr::Unary(UnaryOp::Neg, Box::new(inner))));
    }
    parse_postfix(input)
}

/// Parse multiplicative expressions: `* / %`.
fn parse_multiplicative(input: &str) -> IResult<&str, Expr> {
    let (mut input, mut expr) = parse_unary(input)?;
    loop {
        let (next, _) = multispace0(input)?;
        let op = if next.starts_with('*') {
            BinaryOp::Mul
        } else if next.starts_with('/') {
            BinaryOp::Div
        } else if next.starts_with('%') {
            BinaryOp::Mod
        } else {
            break;
        };
        let (rest, rhs) = parse_unary(&next[1..])?;
        expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        input = rest;
    }
    Ok((input, expr))
}

/// Parse additive expressions: `+ -`.
fn parse_additive(input: &str) -> IResult<&str, Expr> {
    let (mut input, mut expr) = parse_multiplicative(input)?;
    loop {
        let (next, _) = multispace0(input)?;
        let op = if next.starts_with('+') {
            BinaryOp::Add
        } else if next.starts_with('-') {
            BinaryOp::Sub
        } else {
            break;
        };
        let (rest, rhs) = parse_multiplicative(&next[1..])?;
        expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        input = rest;
    }
    Ok((input, expr))
}

/// Parse comparison expressions, including the `in` membership test.
fn parse_comparison(input: &str) -> IResult<&str, Expr> {
    let (input, lhs) = parse_additive(input)?;
    let (next, _) = multispace0(input)?;

    let (op, len) = if next.starts_with("==") {
        (BinaryOp::Eq, 2)
    } else if next.starts_with("!=") {
        (BinaryOp::Ne, 2)
    } else if next.starts_with("<=") {
        (BinaryOp::Le, 2)
    } else if next.starts_with(">=") {
        (BinaryOp::Ge, 2)
    } else if next.starts_with('<') {
        (BinaryOp::Lt, 1)
    } else if next.starts_with('>') {
        (BinaryOp::Gt, 1)
    } else if let Some(rest) = next.strip_prefix("in") {
        if ident_boundary(rest, next).is_ok() {
            let (rest, rhs) = parse_additive(rest)?;
            return Ok((rest, Expr::Binary(BinaryOp::In, Box::new(lhs), Box::new(rhs))));
        }
        return Ok((input, lhs));
    } else {
        return Ok((input, lhs));
    };

    let (rest, rhs) = parse_additive(&next[len..])?;
    Ok((rest, Expr::Binary(op, Box::new(lhs), Box::new(rhs))))
}

/// Parse logical AND chains.
fn parse_and(input: &str) -> IResult<&str, Expr> {
    let (mut input, mut expr) = parse_comparison(input)?;
    loop {
        let (next, _) = multispace0(input)?;
        let Some(rest) = next.strip_prefix("&&") else {
            break;
        };
        let (rest, rhs) = parse_comparison(rest)?;
        expr = Expr::Binary(BinaryOp::And, Box::new(expr), Box::new(rhs));
        input = rest;
    }
    Ok((input, expr))
}

/// Parse logical OR chains.
fn parse_or(input: &str) -> IResult<&str, Expr> {
    let (mut input, mut expr) = parse_and(input)?;
    loop {
        let (next, _) = multispace0(input)?;
        let Some(rest) = next.strip_prefix("||") else {
            break;
        };
        let (rest, rhs) = parse_and(rest)?;
        expr = Expr::Binary(BinaryOp::Or, Box::new(expr), Box::new(rhs));
        input = rest;
    }
    Ok((input, expr))
}

/// Parse a ternary conditional, the lowest-precedence form.
fn parse_ternary(input: &str) -> IResult<&str, Expr> {
    let (input, cond) = parse_or(input)?;
    let (next, _) = multispace0(input)?;

    let Some(rest) = next.strip_prefix('?') else {
        return Ok((input, cond));
    };
    let (rest, then_branch) = parse_ternary(rest)?;
    let (rest, _) = ws(char(':'))(rest)?;
    let (rest, else_branch) = parse_ternary(rest)?;
    Ok((
        rest,
        Expr::Ternary(
            Box::new(cond),
            Box::new(then_branch),
            Box::new(else_branch),
        ),
    ))
}

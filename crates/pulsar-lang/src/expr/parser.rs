use winnow::ascii::multispace0;
use winnow::combinator::{alt, cut_err, opt, separated};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{literal, take_while};

use crate::ast::{ArithOp, CmpOp, Expr};

// ---------------------------------------------------------------------------
// Public entry
// ---------------------------------------------------------------------------

/// Parse a complete expression string, requiring all input to be consumed.
pub fn parse_expr(src: &str) -> Result<Expr, String> {
    let mut input = src;
    ws_skip.parse_next(&mut input).ok();
    let expr = expr
        .parse_next(&mut input)
        .map_err(|e| render_error(src, input, &e))?;
    ws_skip.parse_next(&mut input).ok();
    if !input.is_empty() {
        return Err(format!(
            "unexpected trailing input at offset {}: {:?}",
            src.len() - input.len(),
            truncated(input)
        ));
    }
    Ok(expr)
}

fn render_error(src: &str, rest: &str, e: &ErrMode<ContextError>) -> String {
    let offset = src.len().saturating_sub(rest.len());
    match e {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => {
            format!("invalid expression at offset {offset}: {ctx}")
        }
        _ => format!("invalid expression at offset {offset}"),
    }
}

fn truncated(s: &str) -> &str {
    let end = s
        .char_indices()
        .take(16)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &s[..end]
}

// ---------------------------------------------------------------------------
// Grammar (lowest to highest precedence)
// ---------------------------------------------------------------------------

/// `expr = add_expr [cmp_op add_expr]`
///
/// At most one comparison may appear at a given nesting level; `a > b > c`
/// is rejected as trailing input.
fn expr(input: &mut &str) -> ModalResult<Expr> {
    let left = add_expr.parse_next(input)?;
    ws_skip.parse_next(input)?;
    if let Some(op) = opt(cmp_op).parse_next(input)? {
        ws_skip.parse_next(input)?;
        let right = cut_err(add_expr).parse_next(input)?;
        return Ok(Expr::Cmp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        });
    }
    Ok(left)
}

fn cmp_op(input: &mut &str) -> ModalResult<CmpOp> {
    alt((
        literal("==").value(CmpOp::Eq),
        literal("!=").value(CmpOp::Ne),
        literal("<=").value(CmpOp::Le),
        literal(">=").value(CmpOp::Ge),
        literal("<").value(CmpOp::Lt),
        literal(">").value(CmpOp::Gt),
        // `=` as a synonym for `==`, but not the first half of `=>`.
        eq_synonym.value(CmpOp::Eq),
    ))
    .parse_next(input)
}

fn eq_synonym(input: &mut &str) -> ModalResult<()> {
    let saved = *input;
    literal("=").parse_next(input)?;
    if input.starts_with(['=', '>', '<']) {
        *input = saved;
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    Ok(())
}

/// `add_expr = mul_expr { ("+" | "-") mul_expr }`
fn add_expr(input: &mut &str) -> ModalResult<Expr> {
    let mut left = mul_expr.parse_next(input)?;
    loop {
        ws_skip.parse_next(input)?;
        let op = opt(alt((
            literal("+").value(ArithOp::Add),
            literal("-").value(ArithOp::Sub),
        )))
        .parse_next(input)?;
        if let Some(op) = op {
            ws_skip.parse_next(input)?;
            let right = cut_err(mul_expr).parse_next(input)?;
            left = Expr::Arith {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        } else {
            break;
        }
    }
    Ok(left)
}

/// `mul_expr = unary_expr { ("*" | "/") unary_expr }`
fn mul_expr(input: &mut &str) -> ModalResult<Expr> {
    let mut left = unary_expr.parse_next(input)?;
    loop {
        ws_skip.parse_next(input)?;
        let op = opt(alt((
            literal("*").value(ArithOp::Mul),
            literal("/").value(ArithOp::Div),
        )))
        .parse_next(input)?;
        if let Some(op) = op {
            ws_skip.parse_next(input)?;
            let right = cut_err(unary_expr).parse_next(input)?;
            left = Expr::Arith {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        } else {
            break;
        }
    }
    Ok(left)
}

/// `unary_expr = ["-"] primary`
fn unary_expr(input: &mut &str) -> ModalResult<Expr> {
    if opt(literal("-")).parse_next(input)?.is_some() {
        ws_skip.parse_next(input)?;
        let inner = cut_err(primary).parse_next(input)?;
        Ok(Expr::Neg(Box::new(inner)))
    } else {
        primary.parse_next(input)
    }
}

// ---------------------------------------------------------------------------
// Primary
// ---------------------------------------------------------------------------

fn primary(input: &mut &str) -> ModalResult<Expr> {
    alt((number_literal.map(Expr::Number), paren_expr, ident_primary))
        .context(StrContext::Expected(StrContextValue::Description(
            "number, sensor, function call, or parenthesized expression",
        )))
        .parse_next(input)
}

fn paren_expr(input: &mut &str) -> ModalResult<Expr> {
    literal("(").parse_next(input)?;
    ws_skip.parse_next(input)?;
    let inner = cut_err(expr).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(")"))
        .context(StrContext::Expected(StrContextValue::Description(
            "closing parenthesis",
        )))
        .parse_next(input)?;
    Ok(inner)
}

/// Ident-based primary: function call when followed by `(`, otherwise a
/// sensor reference. Allow-list membership is checked by `analyze`, which
/// can name the offending function in its report.
fn ident_primary(input: &mut &str) -> ModalResult<Expr> {
    let name = ident.parse_next(input)?;
    ws_skip.parse_next(input)?;

    if opt(literal("(")).parse_next(input)?.is_some() {
        ws_skip.parse_next(input)?;
        let args: Vec<Expr> = separated(
            1..,
            (ws_skip, expr, ws_skip).map(|(_, e, _)| e),
            literal(","),
        )
        .parse_next(input)?;
        cut_err(literal(")"))
            .context(StrContext::Expected(StrContextValue::Description(
                "closing parenthesis after function arguments",
            )))
            .parse_next(input)?;
        return Ok(Expr::Func {
            name: name.to_string(),
            args,
        });
    }

    Ok(Expr::Sensor(name.to_string()))
}

// ---------------------------------------------------------------------------
// Lexical helpers
// ---------------------------------------------------------------------------

/// Sensor identifiers allow a namespace colon (`alerts:temperature`) in
/// addition to the usual ident characters.
fn ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    if !input.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || c == '_' || c == ':' || c == '.'
    })
    .parse_next(input)
}

fn number_literal(input: &mut &str) -> ModalResult<f64> {
    let integer_part = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let has_dot = opt(literal(".")).parse_next(input)?.is_some();
    if has_dot {
        let frac_part = take_while(1.., |c: char| c.is_ascii_digit())
            .context(StrContext::Expected(StrContextValue::Description(
                "digits after decimal point",
            )))
            .parse_next(input)?;
        let s = format!("{integer_part}.{frac_part}");
        s.parse().map_err(|_| ErrMode::Cut(ContextError::new()))
    } else {
        integer_part
            .parse()
            .map_err(|_| ErrMode::Cut(ContextError::new()))
    }
}

fn ws_skip(input: &mut &str) -> ModalResult<()> {
    let _ = multispace0.parse_next(input)?;
    Ok(())
}

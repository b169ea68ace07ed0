use crate::{
    ast::{
        ast::{Body, Function, Node, Parameter, Signature},
        statements::{Assign, Declare, ElifBranch, If},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{
    expr::parse_expression,
    parser::{Parser, TokenRange},
};

fn unmatched(parser: &Parser, open: usize, opening: TokenKind) -> Error {
    Error::new(
        ErrorImpl::UnmatchedBracket {
            opening,
            expected: opening.closing().unwrap_or(opening),
        },
        parser.span_at(open),
    )
}

/// Parses the statements of a body and its optional tail expression.
///
/// Statements are delimited by `;`. Each parsed statement is held back as
/// pending until the next one arrives; when the body is over, the pending
/// statement becomes the tail unless the body ends with a `;`. An `if`
/// needs no `;` and goes through the same pending slot, so a body ending
/// with an `if` yields it as its tail.
pub fn parse_body(parser: &Parser, range: TokenRange) -> Result<Body, Error> {
    let end = range.end();
    let mut body = Body::default();
    let mut pending: Option<Node> = None;
    let mut p = range.start();

    while p < end {
        if parser.peek(TokenKind::If, p, end) {
            let (node, next) = parse_if(parser, p, end)?;
            if let Some(previous) = pending.replace(Node::If(node)) {
                body.statements.push(previous);
            }
            p = next;
            continue;
        }

        let statement_end = parser
            .find_next(TokenKind::Semicolon, parser.range(p, end))
            .unwrap_or(end);
        let statement = parser.range(p, statement_end);

        let node = if statement.is_empty() {
            None
        } else {
            Some(parse_statement(parser, statement)?)
        };
        if let Some(previous) = std::mem::replace(&mut pending, node) {
            body.statements.push(previous);
        }
        p = statement_end + 1;
    }

    if end > range.start() && parser.peek(TokenKind::Semicolon, end - 1, end) {
        body.statements.extend(pending);
    } else {
        body.tail = pending.map(Box::new);
    }

    Ok(body)
}

/// Classifies one `;`-delimited statement by its leading tokens.
fn parse_statement(parser: &Parser, range: TokenRange) -> Result<Node, Error> {
    let start = range.start();
    let end = range.end();

    let is_declaration = parser.peek(TokenKind::Mut, start, end)
        || (parser.peek(TokenKind::Identifier, start, end)
            && parser.peek(TokenKind::Identifier, start + 1, end));
    if is_declaration {
        return parse_declare(parser, range).map(Node::Declare);
    }

    if parser.peek(TokenKind::Identifier, start, end) && parser.peek(TokenKind::Assign, start + 1, end)
    {
        return parse_assign(parser, range).map(Node::Assign);
    }

    parse_expression(parser, range)
}

/// `[mut] type name [= expr]`
pub fn parse_declare(parser: &Parser, range: TokenRange) -> Result<Declare, Error> {
    let end = range.end();
    let mut p = range.start();

    let mutable = parser.peek(TokenKind::Mut, p, end);
    if mutable {
        p += 1;
    }

    let type_name = parser
        .consume_expect(TokenKind::Identifier, &mut p, end)?
        .value
        .clone();
    let name_token = parser.consume_expect(TokenKind::Identifier, &mut p, end)?;

    let initializer = if parser.peek(TokenKind::Assign, p, end) {
        let value = parse_expression(parser, parser.range(p + 1, end))?;
        Some(Box::new(value))
    } else if p == end {
        None
    } else {
        return Err(Error::new(
            ErrorImpl::ExpectedDeclarationEnd,
            parser.span_at(p - 1),
        ));
    };

    Ok(Declare {
        mutable,
        type_name,
        name: name_token.value.clone(),
        initializer,
        span: name_token.span,
    })
}

/// `name = expr`
pub fn parse_assign(parser: &Parser, range: TokenRange) -> Result<Assign, Error> {
    let end = range.end();
    let mut p = range.start();

    let target = parser.consume_expect(TokenKind::Identifier, &mut p, end)?;
    parser.consume_expect(TokenKind::Assign, &mut p, end)?;
    let value = parse_expression(parser, parser.range(p, end))?;

    Ok(Assign {
        target: target.value.clone(),
        value: Box::new(value),
        span: target.span,
    })
}

/// `( expr )` starting at `p`; returns the condition and the position after `)`.
fn parse_condition(parser: &Parser, p: usize, bound: usize) -> Result<(Node, usize), Error> {
    let mut p = p;
    parser.consume_expect(TokenKind::OpenParen, &mut p, bound)?;
    let close = parser
        .find_matching_bracket(p - 1, bound)
        .ok_or_else(|| unmatched(parser, p - 1, TokenKind::OpenParen))?;

    let condition = parse_expression(parser, parser.range(p, close))?;
    Ok((condition, close + 1))
}

/// `{ body }` starting at `p`; returns the body and the position after `}`.
fn parse_block(parser: &Parser, p: usize, bound: usize) -> Result<(Body, usize), Error> {
    let mut p = p;
    parser.consume_expect(TokenKind::OpenCurly, &mut p, bound)?;
    let close = parser
        .find_matching_bracket(p - 1, bound)
        .ok_or_else(|| unmatched(parser, p - 1, TokenKind::OpenCurly))?;

    let body = parse_body(parser, parser.range(p, close))?;
    Ok((body, close + 1))
}

/// `if ( expr ) { body } [elif ( expr ) { body }]* [else { body }]`
///
/// Brackets are matched no further than `bound`, the end of the enclosing
/// body. Returns the construct and the position after it.
pub fn parse_if(parser: &Parser, start: usize, bound: usize) -> Result<(If, usize), Error> {
    let mut p = start;
    let span = parser.consume_expect(TokenKind::If, &mut p, bound)?.span;

    let (condition, next) = parse_condition(parser, p, bound)?;
    let (then_body, next) = parse_block(parser, next, bound)?;
    p = next;

    let mut elifs = vec![];
    while parser.peek(TokenKind::Elif, p, bound) {
        let (condition, next) = parse_condition(parser, p + 1, bound)?;
        let (body, next) = parse_block(parser, next, bound)?;
        elifs.push(ElifBranch { condition, body });
        p = next;
    }

    let mut else_body = None;
    if parser.peek(TokenKind::Else, p, bound) {
        let (body, next) = parse_block(parser, p + 1, bound)?;
        else_body = Some(body);
        p = next;
    }

    Ok((
        If {
            condition: Box::new(condition),
            then_body,
            elifs,
            else_body,
            span,
        },
        p,
    ))
}

/// `fn name ( [type name [, type name]*] ) [-> type]`
///
/// The return type defaults to `void`. Returns the signature and the
/// position after it.
pub fn parse_signature(
    parser: &Parser,
    start: usize,
    bound: usize,
) -> Result<(Signature, usize), Error> {
    let mut p = start;
    parser.consume_expect(TokenKind::Fn, &mut p, bound)?;
    let name_token = parser.consume_expect(TokenKind::Identifier, &mut p, bound)?;
    parser.consume_expect(TokenKind::OpenParen, &mut p, bound)?;

    let mut parameters = vec![];
    if parser.peek(TokenKind::Identifier, p, bound) {
        loop {
            let type_name = parser
                .consume_expect(TokenKind::Identifier, &mut p, bound)?
                .value
                .clone();
            let param = parser.consume_expect(TokenKind::Identifier, &mut p, bound)?;
            parameters.push(Parameter {
                type_name,
                name: param.value.clone(),
                span: param.span,
            });

            if !parser.peek(TokenKind::Comma, p, bound) {
                break;
            }
            p += 1;
        }
    }

    parser.consume_expect(TokenKind::CloseParen, &mut p, bound)?;

    let return_type = if parser.peek(TokenKind::Arrow, p, bound) {
        p += 1;
        parser
            .consume_expect(TokenKind::Identifier, &mut p, bound)?
            .value
            .clone()
    } else {
        String::from("void")
    };

    Ok((
        Signature {
            return_type,
            name: name_token.value.clone(),
            parameters,
            span: name_token.span,
        },
        p,
    ))
}

/// A signature followed by `{ body }`.
pub fn parse_function(parser: &Parser, start: usize) -> Result<(Function, usize), Error> {
    let (signature, p) = parse_signature(parser, start, parser.len())?;
    let (body, end) = parse_block(parser, p, parser.len())?;

    Ok((Function { signature, body }, end))
}

/// `extern` signature `;`
pub fn parse_extern(parser: &Parser, start: usize) -> Result<(Signature, usize), Error> {
    let mut p = start;
    parser.consume_expect(TokenKind::Extern, &mut p, parser.len())?;

    let semicolon = parser
        .find_next(TokenKind::Semicolon, parser.range(p, parser.len()))
        .ok_or_else(|| Error::new(ErrorImpl::ExpectedExternTerminator, parser.span_at(start)))?;

    let (signature, end) = parse_signature(parser, p, semicolon)?;
    if end != semicolon {
        return Err(Error::new(
            ErrorImpl::UnexpectedToken {
                expected: TokenKind::Semicolon,
                found: parser.token(end).map_or(TokenKind::Semicolon, |token| token.kind),
            },
            parser.span_at(end),
        ));
    }

    Ok((signature, semicolon + 1))
}

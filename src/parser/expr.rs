use crate::{
    ast::{
        ast::Node,
        expressions::{BinaryOp, Call, NumberLiteral, VariableRef},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{
    lookups::operator_priority,
    parser::{Parser, TokenRange},
};

fn unmatched_paren(parser: &Parser, open: usize) -> Error {
    Error::new(
        ErrorImpl::UnmatchedBracket {
            opening: TokenKind::OpenParen,
            expected: TokenKind::CloseParen,
        },
        parser.span_at(open),
    )
}

fn invalid_primary(parser: &Parser, p: usize) -> Error {
    Error::new(
        ErrorImpl::InvalidPrimaryExpression {
            found: parser.describe(p),
        },
        parser.span_at(p),
    )
}

/// Parses the whole range as one expression: a primary, optionally followed
/// by binary operators and further primaries.
pub fn parse_expression(parser: &Parser, range: TokenRange) -> Result<Node, Error> {
    let primary_end = parser
        .find_primary_end(range)
        .ok_or_else(|| unmatched_paren(parser, range.start()))?;

    let lhs = parse_primary(parser, parser.range(range.start(), primary_end))?;
    if primary_end == range.end() {
        return Ok(lhs);
    }

    parse_binary(parser, parser.range(primary_end, range.end()), lhs)
}

/// Resolves `op prim [op prim]*` against an already parsed left operand.
///
/// After each right operand the next operator is peeked: if it has a higher
/// priority, the rest of the range is resolved recursively and becomes the
/// right operand of the current operator. Otherwise the operands fold to the
/// left.
pub fn parse_binary(parser: &Parser, range: TokenRange, lhs: Node) -> Result<Node, Error> {
    let end = range.end();
    let mut lhs = lhs;
    let mut p = range.start();

    while p < end {
        let op_token = parser.consume_expect(TokenKind::BinaryOp, &mut p, end)?;
        let operator = op_token.value.clone();
        let span = op_token.span;
        let priority = operator_priority(&operator);

        let primary_end = parser
            .find_primary_end(parser.range(p, end))
            .unwrap_or(end);
        let rhs = parse_primary(parser, parser.range(p, primary_end))?;
        p = primary_end;

        if p != end {
            let next_priority = parser
                .token(p)
                .map_or(0, |token| operator_priority(&token.value));

            if next_priority > priority {
                let rhs = parse_binary(parser, parser.range(p, end), rhs)?;
                return Ok(Node::Binary(BinaryOp {
                    operator,
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                    span,
                }));
            }
        }

        lhs = Node::Binary(BinaryOp {
            operator,
            left: Box::new(lhs),
            right: Box::new(rhs),
            span,
        });
    }

    Ok(lhs)
}

/// Parses a number, a variable, a parenthesised expression or a call.
///
/// The range must cover exactly the primary, as found by
/// [`Parser::find_primary_end`].
pub fn parse_primary(parser: &Parser, range: TokenRange) -> Result<Node, Error> {
    let start = range.start();
    let end = range.end();

    if range.is_empty() {
        return Err(invalid_primary(parser, start));
    }

    if range.len() == 1 {
        let token = parser.token(start).ok_or_else(|| invalid_primary(parser, start))?;
        return match token.kind {
            TokenKind::Number => Ok(Node::Number(NumberLiteral {
                value: token.value.clone(),
                span: token.span,
            })),
            TokenKind::Identifier => Ok(Node::Variable(VariableRef {
                name: token.value.clone(),
                span: token.span,
            })),
            _ => Err(invalid_primary(parser, start)),
        };
    }

    if parser.peek(TokenKind::OpenParen, start, end) {
        if !parser.peek(TokenKind::CloseParen, end - 1, end) {
            return Err(unmatched_paren(parser, start));
        }
        return parse_expression(parser, parser.range(start + 1, end - 1));
    }

    if parser.peek(TokenKind::Identifier, start, end) {
        return parse_call(parser, range);
    }

    Err(invalid_primary(parser, start))
}

/// `name ( [expr [, expr]*] )`
fn parse_call(parser: &Parser, range: TokenRange) -> Result<Node, Error> {
    let start = range.start();
    let end = range.end();

    if range.len() < 3
        || !parser.peek(TokenKind::OpenParen, start + 1, end)
        || !parser.peek(TokenKind::CloseParen, end - 1, end)
    {
        return Err(Error::new(
            ErrorImpl::ExpectedCallExpression,
            parser.span_at(start),
        ));
    }

    let mut p = start;
    let callee = parser.consume_expect(TokenKind::Identifier, &mut p, end)?;
    p += 1;

    let mut arguments = vec![];
    while p < end - 1 {
        let argument_end = parser
            .find_expr_end(parser.range(p, end))
            .unwrap_or(end - 1);
        arguments.push(parse_expression(parser, parser.range(p, argument_end))?);
        p = argument_end + 1;
    }

    Ok(Node::Call(Call {
        callee: callee.value.clone(),
        arguments,
        span: callee.span,
    }))
}

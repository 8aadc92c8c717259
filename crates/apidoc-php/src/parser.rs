//! Recursive-descent parser for the PHP expressions used in schema methods.
//!
//! Every parse function takes a byte offset into the file text and returns the
//! offset after what it consumed together with the expression it produced, if
//! any. Offsets are absolute so errors can point at a line and column of the
//! source file. Static member access is resolved eagerly through the
//! [`Resolver`] while parsing.

use crate::context::NameResolutionContext;
use crate::expression::{
    ArrayLiteral, ClassMemberCall, Concat, ConstructorCall, EnumCaseRef, EnumFormatRef,
    Expression, MemberRef, USER_ID_TOKEN,
};
use crate::resolver::Resolver;
use crate::source::{line_col, MethodBody};
use apidoc::{ApidocError, Reporter, Result};
use std::path::Path;

/// Outcome of one parse step
pub type Parsed = (usize, Option<Expression>);

/// Member name that renders an enum instead of delegating
const FORMAT_MEMBER: &str = "format";

pub struct ExpressionParser<'a, 'c> {
    src: &'a str,
    start: usize,
    end: usize,
    file: &'a Path,
    ctx: &'a NameResolutionContext,
    resolver: &'a Resolver<'c>,
}

impl<'a, 'c> ExpressionParser<'a, 'c> {
    /// Parser over the whole of `src`
    pub fn new(
        src: &'a str,
        file: &'a Path,
        ctx: &'a NameResolutionContext,
        resolver: &'a Resolver<'c>,
    ) -> Self {
        Self {
            src,
            start: 0,
            end: src.len(),
            file,
            ctx,
            resolver,
        }
    }

    /// Parser restricted to one method body of `src`
    pub fn for_method(
        src: &'a str,
        method: &MethodBody<'_>,
        file: &'a Path,
        ctx: &'a NameResolutionContext,
        resolver: &'a Resolver<'c>,
    ) -> Self {
        let start = method.offset.min(src.len());
        Self {
            src,
            start,
            end: (start + method.body.len()).min(src.len()),
            file,
            ctx,
            resolver,
        }
    }

    /// Run statements until the first `return` and yield its expression
    pub fn parse_body(&self, reporter: &mut Reporter<'_>) -> Result<Expression> {
        let mut pos = self.start;
        loop {
            pos = self.skip_trivia(pos);
            if pos >= self.end {
                return Err(self.error(pos, "missing return statement"));
            }
            match self.parse_statement(pos, reporter)? {
                (_, Some(expr)) => return Ok(expr),
                (next, None) => pos = next,
            }
        }
    }

    /// `global ...;` (skipped) or `return <expr>;`
    pub fn parse_statement(&self, pos: usize, reporter: &mut Reporter<'_>) -> Result<Parsed> {
        let pos = self.skip_trivia(pos);
        let (after, keyword) = self.read_identifier(pos);
        match keyword {
            "global" => match self.src[after..self.end].find(';') {
                Some(semi) => Ok((after + semi + 1, None)),
                None => Err(self.error(after, "unterminated global statement")),
            },
            "return" => {
                let (next, expr) = self.parse_expression(after, reporter)?;
                let Some(expr) = expr else {
                    return Err(self.error(next, "expected an expression after return"));
                };
                let next = self.skip_trivia(next);
                if self.peek(next) != Some(b';') {
                    return Err(self.error(next, "expected ';' after return value"));
                }
                Ok((next + 1, Some(expr)))
            }
            "" => Err(self.error(pos, format!("unexpected {}", self.describe_at(pos)))),
            other => Err(self.error(pos, format!("unknown keyword '{other}'"))),
        }
    }

    /// Parse at most one expression starting at `pos`.
    ///
    /// Returns `None` as the expression if `pos` does not start one.
    pub fn parse_expression(&self, pos: usize, reporter: &mut Reporter<'_>) -> Result<Parsed> {
        let pos = self.skip_trivia(pos);
        let (pos, expr) = match self.peek(pos) {
            Some(b'$') if self.at_user_id(pos) => {
                (pos + USER_ID_TOKEN.len(), Expression::UserIdReference)
            }
            Some(b'$') => return Err(self.unsupported(pos, "variable access")),
            Some(b'[') => self.parse_array(pos, reporter)?,
            Some(b'\'') => self.parse_string(pos)?,
            Some(b'"') => return Err(self.unsupported(pos, "double-quoted string")),
            Some(c) if is_ident_byte(c) => {
                let (after, word) = self.read_identifier(pos);
                let next = self.skip_trivia(after);
                if word == "new" {
                    self.parse_constructor(after, reporter)?
                } else if self.starts_with(next, "::") {
                    self.parse_static_access(word, next + 2, reporter)?
                } else {
                    (after, Expression::constant(word))
                }
            }
            _ => return Ok((pos, None)),
        };

        let next = self.skip_trivia(pos);
        match self.peek(next) {
            Some(b'.') => self.parse_concat(expr, next, reporter),
            Some(b'[') => Err(self.unsupported(next, "array indexing")),
            Some(b'(') => Err(self.unsupported(next, "function call")),
            Some(b'-') if self.starts_with(next, "->") => {
                Err(self.unsupported(next, "property access"))
            }
            _ => Ok((pos, Some(expr))),
        }
    }

    /// `left . <expr>`, right-associative
    fn parse_concat(
        &self,
        left: Expression,
        dot: usize,
        reporter: &mut Reporter<'_>,
    ) -> Result<Parsed> {
        if !left.is_string_kind() {
            return Err(self.error(dot, format!("cannot concatenate a {}", left.kind())));
        }
        let (next, right) = self.parse_expression(dot + 1, reporter)?;
        let Some(right) = right else {
            return Err(self.error(next, "expected an expression after '.'"));
        };

        match Concat::new(left, right) {
            Ok(concat) => Ok((next, Some(Expression::Concat(concat)))),
            Err((_, right)) => Err(self.error(
                dot + 1,
                format!("cannot concatenate a {}", right.kind()),
            )),
        }
    }

    /// `new Name(arg, ...)`, with `pos` right after `new`
    pub fn parse_constructor(
        &self,
        pos: usize,
        reporter: &mut Reporter<'_>,
    ) -> Result<(usize, Expression)> {
        let pos = self.skip_trivia(pos);
        let (after, name) = self.read_identifier(pos);
        if name.is_empty() {
            return Err(self.error(pos, "expected a class name after 'new'"));
        }

        let open = self.skip_trivia(after);
        if self.peek(open) != Some(b'(') {
            return Err(self.error(open, format!("expected '(' after 'new {name}'")));
        }

        let mut arguments = Vec::new();
        let mut pos = self.skip_trivia(open + 1);
        while self.peek(pos) != Some(b')') {
            let (next, arg) = self.parse_expression(pos, reporter)?;
            let Some(arg) = arg else {
                return Err(self.error(next, format!("unexpected {}", self.describe_at(next))));
            };
            arguments.push(arg);

            pos = self.skip_trivia(next);
            match self.peek(pos) {
                Some(b',') => pos = self.skip_trivia(pos + 1),
                Some(b')') => {}
                _ => {
                    return Err(self.error(pos, format!("expected ',' or ')' in arguments of {name}")))
                }
            }
        }

        Ok((pos + 1, Expression::Constructor(ConstructorCall::new(name, arguments))))
    }

    /// `[a, b]` or `['k' => v]`, with `pos` at `[`
    pub fn parse_array(
        &self,
        pos: usize,
        reporter: &mut Reporter<'_>,
    ) -> Result<(usize, Expression)> {
        let mut associative: Option<bool> = None;
        let mut values = Vec::new();
        let mut keys = Vec::new();

        let mut pos = self.skip_trivia(pos + 1);
        while self.peek(pos) != Some(b']') {
            let (next, item) = self.parse_expression(pos, reporter)?;
            let Some(item) = item else {
                return Err(self.error(next, format!("unexpected {} in array", self.describe_at(next))));
            };

            let mut next = self.skip_trivia(next);
            if self.starts_with(next, "=>") {
                if associative == Some(false) {
                    return Err(self.error(next, "array mixes positional and keyed entries"));
                }
                associative = Some(true);
                if !item.is_string_kind() {
                    return Err(self.error(pos, format!("array key must be a string, found a {}", item.kind())));
                }

                let (after, value) = self.parse_expression(next + 2, reporter)?;
                let Some(value) = value else {
                    return Err(self.error(after, "expected a value after '=>'"));
                };
                keys.push(item);
                values.push(value);
                next = self.skip_trivia(after);
            } else {
                if associative == Some(true) {
                    return Err(self.error(pos, "array mixes positional and keyed entries"));
                }
                associative = Some(false);
                values.push(item);
            }

            match self.peek(next) {
                Some(b',') => pos = self.skip_trivia(next + 1),
                Some(b']') => pos = next,
                _ => return Err(self.error(next, "expected ',' or ']' in array")),
            }
        }

        let array = if associative == Some(true) {
            ArrayLiteral::associative(keys.into_iter().zip(values).collect())
        } else {
            ArrayLiteral::positional(values)
        };
        Ok((pos + 1, Expression::Array(array)))
    }

    /// Single-quoted literal, with `pos` at the opening quote
    pub fn parse_string(&self, pos: usize) -> Result<(usize, Expression)> {
        let bytes = self.src.as_bytes();
        let mut out = String::new();
        let mut i = pos + 1;
        let mut segment = i;

        while i < self.end {
            match bytes[i] {
                b'\'' => {
                    out.push_str(&self.src[segment..i]);
                    return Ok((i + 1, Expression::StringLiteral(out)));
                }
                b'\\' => {
                    out.push_str(&self.src[segment..i]);
                    match self.peek(i + 1) {
                        Some(b'\'') => out.push('\''),
                        Some(b'\\') => out.push('\\'),
                        _ => {
                            let escaped = self.src[i + 1..self.end].chars().next().unwrap_or(' ');
                            return Err(self.unsupported(i, format!("escape sequence \\{escaped}")));
                        }
                    }
                    i += 2;
                    segment = i;
                }
                _ => i += 1,
            }
        }

        Err(self.error(pos, "unterminated string literal"))
    }

    /// `Class::member`, `Class::method()` or `Class::format()`, with `pos`
    /// right after `::`
    fn parse_static_access(
        &self,
        class_name: &str,
        pos: usize,
        reporter: &mut Reporter<'_>,
    ) -> Result<(usize, Expression)> {
        let pos = self.skip_trivia(pos);
        if self.peek(pos) == Some(b'$') {
            return Err(self.unsupported(pos, "static property access"));
        }
        let (after, member) = self.read_identifier(pos);
        if member.is_empty() {
            return Err(self.error(pos, format!("expected a member name after {class_name}::")));
        }

        let open = self.skip_trivia(after);
        let file = self
            .resolver
            .find_import(self.ctx, class_name, self.file, reporter);

        if self.peek(open) != Some(b'(') {
            let value = self
                .resolver
                .resolve_enum_case(class_name, member, file.as_deref(), reporter);
            let case = EnumCaseRef {
                class_name: class_name.to_string(),
                case_name: member.to_string(),
                enum_file: file,
                value,
            };
            return Ok((after, Expression::EnumCase(case)));
        }

        let close = self.skip_trivia(open + 1);
        if self.peek(close) != Some(b')') {
            return Err(self.unsupported(close, "static call with arguments"));
        }

        let member_ref = MemberRef::new(class_name, member, file);
        let expr = if member == FORMAT_MEMBER {
            let rendered = self.resolver.resolve_enum_format(&member_ref, reporter);
            Expression::EnumFormat(EnumFormatRef {
                member: member_ref,
                rendered,
            })
        } else {
            Expression::ClassMember(ClassMemberCall { member: member_ref })
        };
        Ok((close + 1, expr))
    }

    /// Skip whitespace and comments
    pub fn skip_trivia(&self, mut pos: usize) -> usize {
        let bytes = self.src.as_bytes();
        while pos < self.end {
            match bytes[pos] {
                b' ' | b'\t' | b'\r' | b'\n' => pos += 1,
                b'#' => pos = self.line_end(pos),
                b'/' if self.peek(pos + 1) == Some(b'/') => pos = self.line_end(pos),
                b'/' if self.peek(pos + 1) == Some(b'*') => {
                    pos = match self.src[pos + 2..self.end].find("*/") {
                        Some(close) => pos + 2 + close + 2,
                        None => self.end,
                    };
                }
                _ => break,
            }
        }
        pos
    }

    fn line_end(&self, pos: usize) -> usize {
        self.src[pos..self.end]
            .find('\n')
            .map_or(self.end, |nl| pos + nl)
    }

    /// Identifier characters, namespace separators included
    fn read_identifier(&self, pos: usize) -> (usize, &'a str) {
        let mut end = pos;
        while self.peek(end).is_some_and(is_ident_byte) {
            end += 1;
        }
        (end, &self.src[pos..end])
    }

    fn at_user_id(&self, pos: usize) -> bool {
        self.starts_with(pos, USER_ID_TOKEN)
            && !self.peek(pos + USER_ID_TOKEN.len()).is_some_and(is_ident_byte)
    }

    fn peek(&self, pos: usize) -> Option<u8> {
        if pos < self.end {
            self.src.as_bytes().get(pos).copied()
        } else {
            None
        }
    }

    fn starts_with(&self, pos: usize, token: &str) -> bool {
        pos <= self.end && self.src[pos..self.end].starts_with(token)
    }

    fn describe_at(&self, pos: usize) -> String {
        match self.src.get(pos..self.end).and_then(|rest| rest.chars().next()) {
            Some(c) => format!("'{c}'"),
            None => "end of method body".to_string(),
        }
    }

    fn error(&self, pos: usize, message: impl Into<String>) -> ApidocError {
        let (line, column) = line_col(self.src, pos);
        ApidocError::parse(self.file, line, column, message)
    }

    fn unsupported(&self, pos: usize, feature: impl Into<String>) -> ApidocError {
        let (line, column) = line_col(self.src, pos);
        ApidocError::unsupported(self.file, line, column, feature)
    }
}

fn is_ident_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'\\'
}

//! Parser: tokens -> [`Program`].
//!
//! Grammar (informal):
//!
//! ```text
//! program := stmt? (';' stmt?)*
//! stmt    := simple (('if' | 'unless') cond)?
//! simple  := SUBST | 'last' | '$_' ('=' | '.=') expr
//! cond    := and ('||' and)*
//! and     := unary ('&&' unary)*
//! unary   := '!' unary | '(' cond ')' | MATCH
//!          | expr (('=~' | '!~') MATCH | cmp expr)?
//! expr    := atom ('.' atom)*
//! atom    := STRING | INT | VAR | IDENT '(' expr ')'
//! ```

use regex::{Regex, RegexBuilder};

use super::ast::{Case, CaseOp, Cond, Expr, Func, NumOp, Part, Program, Stmt, StrOp, Var};
use super::error::{ParseError, ParseResult};
use super::lexer::{Token, TokenKind, tokenize};

/// Parse (and compile the regexes of) one fragment.
pub fn parse(source: &str) -> ParseResult<Program> {
    let tokens = tokenize(source)?;
    Parser { tokens, pos: 0 }.program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // tokenize() always ends with Eof, and we never advance past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        let token = self.advance();
        if token.kind == kind {
            Ok(())
        } else {
            Err(unexpected(&token, &kind.name()))
        }
    }

    fn program(mut self) -> ParseResult<Program> {
        let mut stmts = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::Semi => {
                    self.advance();
                    continue;
                }
                _ => {}
            }

            stmts.push(self.stmt()?);

            let token = self.advance();
            match token.kind {
                TokenKind::Semi => {}
                TokenKind::Eof => break,
                _ => return Err(unexpected(&token, "`;` or end of expression")),
            }
        }
        Ok(Program { stmts })
    }

    fn stmt(&mut self) -> ParseResult<Stmt> {
        let stmt = self.simple()?;
        let negate = match self.peek().kind {
            TokenKind::If => false,
            TokenKind::Unless => true,
            _ => return Ok(stmt),
        };
        self.advance();
        let cond = self.cond()?;
        Ok(Stmt::Guarded {
            stmt: Box::new(stmt),
            cond,
            negate,
        })
    }

    fn simple(&mut self) -> ParseResult<Stmt> {
        let token = self.advance();
        match token.kind {
            TokenKind::Last => Ok(Stmt::Last),
            TokenKind::Subst {
                pattern,
                replacement,
                flags,
            } => {
                let (regex, global) = build_regex(&pattern, &flags, "gimsx", token.column)?;
                let replacement = parse_template(&replacement, token.column, true)?;
                Ok(Stmt::Subst {
                    regex,
                    replacement,
                    global,
                })
            }
            TokenKind::Var(ref name) => {
                let var = resolve_var(name, token.column)?;
                if var != Var::Value {
                    return Err(ParseError::new(
                        format!("`${name}` is read-only; only `$_` can be assigned"),
                        token.column,
                    ));
                }
                let op = self.advance();
                match op.kind {
                    TokenKind::Assign => Ok(Stmt::Assign(self.expr()?)),
                    TokenKind::DotAssign => Ok(Stmt::Append(self.expr()?)),
                    _ => Err(unexpected(&op, "`=` or `.=`")),
                }
            }
            TokenKind::Match { .. } => Err(ParseError::new(
                "a pattern match does nothing on its own; use it as a condition after `if`",
                token.column,
            )),
            _ => Err(unexpected(&token, "statement")),
        }
    }

    fn cond(&mut self) -> ParseResult<Cond> {
        let mut lhs = self.and_cond()?;
        while self.peek().kind == TokenKind::OrOr {
            self.advance();
            let rhs = self.and_cond()?;
            lhs = Cond::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_cond(&mut self) -> ParseResult<Cond> {
        let mut lhs = self.unary_cond()?;
        while self.peek().kind == TokenKind::AndAnd {
            self.advance();
            let rhs = self.unary_cond()?;
            lhs = Cond::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary_cond(&mut self) -> ParseResult<Cond> {
        match self.peek().kind {
            TokenKind::Bang => {
                self.advance();
                Ok(Cond::Not(Box::new(self.unary_cond()?)))
            }
            TokenKind::LParen => {
                self.advance();
                let cond = self.cond()?;
                self.expect(TokenKind::RParen)?;
                Ok(cond)
            }
            TokenKind::Match { .. } => {
                let regex = self.match_regex()?;
                Ok(Cond::Matches {
                    subject: Expr::Var(Var::Value),
                    regex,
                    negate: false,
                })
            }
            _ => self.comparison(),
        }
    }

    fn comparison(&mut self) -> ParseResult<Cond> {
        let lhs = self.expr()?;

        let negate = match self.peek().kind {
            TokenKind::BindMatch => Some(false),
            TokenKind::BindNotMatch => Some(true),
            _ => None,
        };
        if let Some(negate) = negate {
            self.advance();
            let regex = self.match_regex()?;
            return Ok(Cond::Matches {
                subject: lhs,
                regex,
                negate,
            });
        }

        let str_op = match self.peek().kind {
            TokenKind::Eq => Some(StrOp::Eq),
            TokenKind::Ne => Some(StrOp::Ne),
            _ => None,
        };
        if let Some(op) = str_op {
            self.advance();
            let rhs = self.expr()?;
            return Ok(Cond::Str { lhs, op, rhs });
        }

        let num_op = match self.peek().kind {
            TokenKind::NumEq => Some(NumOp::Eq),
            TokenKind::NumNe => Some(NumOp::Ne),
            TokenKind::Lt => Some(NumOp::Lt),
            TokenKind::LtEq => Some(NumOp::LtEq),
            TokenKind::Gt => Some(NumOp::Gt),
            TokenKind::GtEq => Some(NumOp::GtEq),
            _ => None,
        };
        if let Some(op) = num_op {
            self.advance();
            let rhs = self.expr()?;
            return Ok(Cond::Num { lhs, op, rhs });
        }

        Ok(Cond::Truthy(lhs))
    }

    fn match_regex(&mut self) -> ParseResult<Regex> {
        let token = self.advance();
        match token.kind {
            TokenKind::Match { pattern, flags } => {
                let (regex, _) = build_regex(&pattern, &flags, "imsx", token.column)?;
                Ok(regex)
            }
            _ => Err(unexpected(&token, "pattern match")),
        }
    }

    fn expr(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.atom()?;
        while self.peek().kind == TokenKind::Dot {
            self.advance();
            let rhs = self.atom()?;
            lhs = Expr::Concat(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn atom(&mut self) -> ParseResult<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Str(text) => Ok(Expr::Str(text)),
            TokenKind::Interp(raw) => Ok(Expr::Interp(parse_template(&raw, token.column, false)?)),
            TokenKind::Int(n) => Ok(Expr::Int(n)),
            TokenKind::Var(ref name) => Ok(Expr::Var(resolve_var(name, token.column)?)),
            TokenKind::Ident(ref name) => {
                let func = Func::from_name(name).ok_or_else(|| {
                    ParseError::new(format!("unknown function `{name}`"), token.column)
                })?;
                self.expect(TokenKind::LParen)?;
                let arg = self.expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Call(func, Box::new(arg)))
            }
            _ => Err(unexpected(&token, "a value")),
        }
    }
}

fn unexpected(token: &Token, expected: &str) -> ParseError {
    if token.kind == TokenKind::Eof {
        ParseError::unexpected_eof(token.column, expected)
    } else {
        ParseError::unexpected_token(token.column, expected, &token.kind.name())
    }
}

fn resolve_var(name: &str, column: usize) -> ParseResult<Var> {
    Var::from_name(name).ok_or_else(|| {
        ParseError::new(
            format!("unknown variable `${name}` (available: $_, $file, $length, $seconds)"),
            column,
        )
    })
}

/// Build a regex from a pattern body and its trailing flags.
/// Returns the regex and whether `g` was given.
fn build_regex(
    pattern: &str,
    flags: &str,
    allowed: &str,
    column: usize,
) -> ParseResult<(Regex, bool)> {
    let mut builder = RegexBuilder::new(pattern);
    let mut global = false;

    for flag in flags.chars() {
        if !allowed.contains(flag) {
            let message = format!("unknown regex flag `{flag}`");
            return Err(ParseError::new(message, column));
        }
        match flag {
            'g' => global = true,
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            _ => {}
        }
    }

    let regex = builder.build().map_err(|e| {
        ParseError::new(format!("invalid regex `{pattern}`: {e}"), column)
    })?;
    Ok((regex, global))
}

/// Split an interpolating body (double-quoted string or replacement) into parts.
fn parse_template(raw: &str, column: usize, allow_groups: bool) -> ParseResult<Vec<Part>> {
    let chars: Vec<char> = raw.chars().collect();
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;

        if c == '\\' {
            let op = match chars.get(i) {
                Some('n') => {
                    text.push('\n');
                    None
                }
                Some('t') => {
                    text.push('\t');
                    None
                }
                Some('r') => {
                    text.push('\r');
                    None
                }
                Some('u') => Some(CaseOp::Next(Case::Upper)),
                Some('l') => Some(CaseOp::Next(Case::Lower)),
                Some('U') => Some(CaseOp::Span(Case::Upper)),
                Some('L') => Some(CaseOp::Span(Case::Lower)),
                Some('E') => Some(CaseOp::End),
                Some(&other) if other.is_alphanumeric() => {
                    return Err(ParseError::new(
                        format!("unknown escape `\\{other}` in string"),
                        column,
                    ));
                }
                Some(&other) => {
                    text.push(other);
                    None
                }
                None => {
                    text.push('\\');
                    None
                }
            };
            if let Some(op) = op {
                if !text.is_empty() {
                    parts.push(Part::Text(std::mem::take(&mut text)));
                }
                parts.push(Part::Case(op));
            }
            i += 1;
            continue;
        }

        if c != '$' {
            text.push(c);
            continue;
        }

        let part = match chars.get(i) {
            Some('{') => {
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == '}')
                    .ok_or_else(|| ParseError::new("unterminated `${` in string", column))?;
                let name: String = chars[i + 1..i + close].iter().collect();
                i += close + 1;
                Some(reference(&name, column, allow_groups)?)
            }
            Some('&') => {
                i += 1;
                Some(reference("0", column, allow_groups)?)
            }
            Some(&c) if c.is_alphanumeric() || c == '_' => {
                let start = i;
                let digits = c.is_ascii_digit();
                while chars.get(i).is_some_and(|&c| {
                    if digits {
                        c.is_ascii_digit()
                    } else {
                        c.is_alphanumeric() || c == '_'
                    }
                }) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                Some(reference(&name, column, allow_groups)?)
            }
            _ => None,
        };

        match part {
            Some(part) => {
                if !text.is_empty() {
                    parts.push(Part::Text(std::mem::take(&mut text)));
                }
                parts.push(part);
            }
            None => text.push('$'),
        }
    }

    if !text.is_empty() {
        parts.push(Part::Text(text));
    }
    Ok(parts)
}

fn reference(name: &str, column: usize, allow_groups: bool) -> ParseResult<Part> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
        if !allow_groups {
            return Err(ParseError::new(
                format!("`${name}` capture groups are only available in substitutions"),
                column,
            ));
        }
        let group = name.parse::<usize>().map_err(|e| {
            ParseError::new(format!("bad group `${name}`: {e}"), column)
        })?;
        return Ok(Part::Group(group));
    }
    Ok(Part::Var(resolve_var(name, column)?))
}

//! Running a compiled [`Program`] against a value.
//!
//! Evaluation cannot fail: variables and regexes were resolved at compile
//! time, and non-numeric operands of numeric comparisons count as 0.

use std::borrow::Cow;
use std::path::Path;

use regex::Captures;

use super::Context;
use super::ast::{Case, CaseOp, Cond, Expr, Func, NumOp, Part, Program, Stmt, StrOp, Var};

/// What a step tells the pipeline after it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// `last`: keep the value as it is and skip the rest of this field's chain.
    Stop,
}

impl Program {
    /// Run every statement in order against `value`.
    pub fn run(&self, value: &mut String, ctx: &Context) -> Flow {
        for stmt in &self.stmts {
            if exec(stmt, value, ctx) == Flow::Stop {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }
}

fn exec(stmt: &Stmt, value: &mut String, ctx: &Context) -> Flow {
    match stmt {
        Stmt::Subst {
            regex,
            replacement,
            global,
        } => {
            let current = value.as_str();
            let expand = |caps: &Captures<'_>| render(replacement, current, ctx, Some(caps));
            let replaced = if *global {
                regex.replace_all(current, expand)
            } else {
                regex.replace(current, expand)
            };
            if let Cow::Owned(new) = replaced {
                *value = new;
            }
            Flow::Continue
        }
        Stmt::Assign(expr) => {
            *value = eval(expr, value, ctx).into_owned();
            Flow::Continue
        }
        Stmt::Append(expr) => {
            let tail = eval(expr, value, ctx).into_owned();
            value.push_str(&tail);
            Flow::Continue
        }
        Stmt::Last => Flow::Stop,
        Stmt::Guarded { stmt, cond, negate } => {
            if test(cond, value, ctx) != *negate {
                exec(stmt, value, ctx)
            } else {
                Flow::Continue
            }
        }
    }
}

fn eval<'a>(expr: &'a Expr, value: &'a str, ctx: &'a Context) -> Cow<'a, str> {
    match expr {
        Expr::Str(text) => Cow::Borrowed(text.as_str()),
        Expr::Interp(parts) => Cow::Owned(render(parts, value, ctx, None)),
        Expr::Int(n) => Cow::Owned(n.to_string()),
        Expr::Var(var) => lookup(*var, value, ctx),
        Expr::Call(func, arg) => Cow::Owned(call(*func, &eval(arg, value, ctx))),
        Expr::Concat(lhs, rhs) => {
            let mut out = eval(lhs, value, ctx).into_owned();
            out.push_str(&eval(rhs, value, ctx));
            Cow::Owned(out)
        }
    }
}

fn lookup<'a>(var: Var, value: &'a str, ctx: &'a Context) -> Cow<'a, str> {
    match var {
        Var::Value => Cow::Borrowed(value),
        Var::File => Cow::Borrowed(ctx.file()),
        Var::Length => Cow::Borrowed(ctx.length()),
        Var::Seconds => Cow::Owned(ctx.seconds().to_string()),
    }
}

fn render(parts: &[Part], value: &str, ctx: &Context, caps: Option<&Captures<'_>>) -> String {
    let mut out = String::new();
    let mut casing = Casing::default();
    for part in parts {
        match part {
            Part::Text(text) => casing.push(&mut out, text),
            Part::Var(var) => casing.push(&mut out, &lookup(*var, value, ctx)),
            Part::Group(n) => {
                if let Some(m) = caps.and_then(|c| c.get(*n)) {
                    casing.push(&mut out, m.as_str());
                }
            }
            Part::Case(op) => casing.set(*op),
        }
    }
    out
}

/// Pending `\u`/`\l` and open `\U`/`\L` while rendering a template.
#[derive(Debug, Default)]
struct Casing {
    span: Option<Case>,
    next: Option<Case>,
}

impl Casing {
    fn set(&mut self, op: CaseOp) {
        match op {
            CaseOp::Next(case) => self.next = Some(case),
            CaseOp::Span(case) => self.span = Some(case),
            CaseOp::End => self.span = None,
        }
    }

    fn push(&mut self, out: &mut String, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        let chunk = match self.span {
            Some(case) => Cow::Owned(convert(case, chunk)),
            None => Cow::Borrowed(chunk),
        };
        match self.next.take() {
            Some(case) => {
                let first = |c: char| convert(case, c.encode_utf8(&mut [0; 4]));
                out.push_str(&map_first(&chunk, first));
            }
            None => out.push_str(&chunk),
        }
    }
}

fn convert(case: Case, s: &str) -> String {
    match case {
        Case::Upper => s.to_uppercase(),
        Case::Lower => s.to_lowercase(),
    }
}

fn call(func: Func, arg: &str) -> String {
    match func {
        Func::Uc => arg.to_uppercase(),
        Func::Lc => arg.to_lowercase(),
        Func::Ucfirst => map_first(arg, |c| c.to_uppercase().collect()),
        Func::Lcfirst => map_first(arg, |c| c.to_lowercase().collect()),
        Func::Trim => arg.trim().to_string(),
        Func::Basename => Path::new(arg)
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        Func::Stem => Path::new(arg)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

fn map_first(s: &str, f: impl Fn(char) -> String) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => f(first) + chars.as_str(),
        None => String::new(),
    }
}

fn test(cond: &Cond, value: &str, ctx: &Context) -> bool {
    match cond {
        Cond::Matches {
            subject,
            regex,
            negate,
        } => regex.is_match(&eval(subject, value, ctx)) != *negate,
        Cond::Str { lhs, op, rhs } => {
            let equal = eval(lhs, value, ctx) == eval(rhs, value, ctx);
            match op {
                StrOp::Eq => equal,
                StrOp::Ne => !equal,
            }
        }
        Cond::Num { lhs, op, rhs } => {
            let a = number(&eval(lhs, value, ctx));
            let b = number(&eval(rhs, value, ctx));
            match op {
                NumOp::Eq => a == b,
                NumOp::Ne => a != b,
                NumOp::Lt => a < b,
                NumOp::LtEq => a <= b,
                NumOp::Gt => a > b,
                NumOp::GtEq => a >= b,
            }
        }
        Cond::Truthy(expr) => {
            let v = eval(expr, value, ctx);
            !v.is_empty() && v != "0"
        }
        Cond::Not(inner) => !test(inner, value, ctx),
        Cond::And(a, b) => test(a, value, ctx) && test(b, value, ctx),
        Cond::Or(a, b) => test(a, value, ctx) || test(b, value, ctx),
    }
}

fn number(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(0.0)
}

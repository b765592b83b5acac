//! Compiled form of a fragment.
//!
//! Regexes are built while parsing, so a `Program` is ready to run and holds
//! no text that still needs interpreting.

use regex::Regex;

/// The bindings a fragment can read. Only `Value` (`$_`) is writable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Var {
    /// `$_`: the field's current value.
    Value,
    /// `$file`: the path being processed.
    File,
    /// `$length`: duration as `M:SS`.
    Length,
    /// `$seconds`: duration in whole seconds.
    Seconds,
}

impl Var {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "_" => Some(Var::Value),
            "file" => Some(Var::File),
            "length" => Some(Var::Length),
            "seconds" => Some(Var::Seconds),
            _ => None,
        }
    }
}

/// Piece of an interpolated string or substitution replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Var(Var),
    /// Capture group (`$1`, `${2}`, `$&` is group 0). Replacements only.
    Group(usize),
    /// `\u` `\l` `\U` `\L` `\E`: changes the case of what follows.
    Case(CaseOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Upper,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOp {
    /// `\u` / `\l`: next character only.
    Next(Case),
    /// `\U` / `\L`: everything up to `\E` or the end.
    Span(Case),
    /// `\E`
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Uc,
    Lc,
    Ucfirst,
    Lcfirst,
    Trim,
    Basename,
    Stem,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "uc" => Some(Func::Uc),
            "lc" => Some(Func::Lc),
            "ucfirst" => Some(Func::Ucfirst),
            "lcfirst" => Some(Func::Lcfirst),
            "trim" => Some(Func::Trim),
            "basename" => Some(Func::Basename),
            "stem" => Some(Func::Stem),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Str(String),
    Interp(Vec<Part>),
    Int(i64),
    Var(Var),
    Call(Func, Box<Expr>),
    Concat(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumOp {
    Eq,
    Ne,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone)]
pub enum Cond {
    Matches {
        subject: Expr,
        regex: Regex,
        negate: bool,
    },
    Str {
        lhs: Expr,
        op: StrOp,
        rhs: Expr,
    },
    Num {
        lhs: Expr,
        op: NumOp,
        rhs: Expr,
    },
    Truthy(Expr),
    Not(Box<Cond>),
    And(Box<Cond>, Box<Cond>),
    Or(Box<Cond>, Box<Cond>),
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Subst {
        regex: Regex,
        replacement: Vec<Part>,
        global: bool,
    },
    Assign(Expr),
    Append(Expr),
    Last,
    Guarded {
        stmt: Box<Stmt>,
        cond: Cond,
        /// `unless` rather than `if`.
        negate: bool,
    },
}

/// One compiled fragment.
#[derive(Debug, Clone)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

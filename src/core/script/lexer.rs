//! Lexer (tokenizer) for field expressions.
//!
//! Regex-bearing tokens (`s/a/b/g`, `m/a/`, `/a/`) are recognised here rather
//! than in the parser: their bodies are opaque text with their own escaping
//! rules, so they come out of the lexer as single tokens.

use super::error::{ParseError, ParseResult};

/// Token types.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Last,
    If,
    Unless,
    Eq,
    Ne,

    // Literals
    Ident(String),
    /// `$name` or `${name}`.
    Var(String),
    Int(i64),
    /// Single-quoted string, escapes already resolved.
    Str(String),
    /// Double-quoted string body, raw. Interpolated by the parser.
    Interp(String),
    /// `s/pattern/replacement/flags`; bodies raw.
    Subst {
        pattern: String,
        replacement: String,
        flags: String,
    },
    /// `/pattern/flags` or `m/pattern/flags`; body raw.
    Match { pattern: String, flags: String },

    // Symbols
    Semi,         // ;
    LParen,       // (
    RParen,       // )
    Dot,          // .
    Assign,       // =
    DotAssign,    // .=
    Bang,         // !
    AndAnd,       // &&
    OrOr,         // ||
    BindMatch,    // =~
    BindNotMatch, // !~
    NumEq,        // ==
    NumNe,        // !=
    Lt,           // <
    LtEq,         // <=
    Gt,           // >
    GtEq,         // >=

    Eof,
}

impl TokenKind {
    /// Human-readable name for error messages.
    pub fn name(&self) -> String {
        match self {
            TokenKind::Last => "`last`".into(),
            TokenKind::If => "`if`".into(),
            TokenKind::Unless => "`unless`".into(),
            TokenKind::Eq => "`eq`".into(),
            TokenKind::Ne => "`ne`".into(),
            TokenKind::Ident(name) => format!("`{name}`"),
            TokenKind::Var(name) => format!("`${name}`"),
            TokenKind::Int(n) => format!("`{n}`"),
            TokenKind::Str(_) | TokenKind::Interp(_) => "string".into(),
            TokenKind::Subst { .. } => "substitution".into(),
            TokenKind::Match { .. } => "pattern match".into(),
            TokenKind::Semi => "`;`".into(),
            TokenKind::LParen => "`(`".into(),
            TokenKind::RParen => "`)`".into(),
            TokenKind::Dot => "`.`".into(),
            TokenKind::Assign => "`=`".into(),
            TokenKind::DotAssign => "`.=`".into(),
            TokenKind::Bang => "`!`".into(),
            TokenKind::AndAnd => "`&&`".into(),
            TokenKind::OrOr => "`||`".into(),
            TokenKind::BindMatch => "`=~`".into(),
            TokenKind::BindNotMatch => "`!~`".into(),
            TokenKind::NumEq => "`==`".into(),
            TokenKind::NumNe => "`!=`".into(),
            TokenKind::Lt => "`<`".into(),
            TokenKind::LtEq => "`<=`".into(),
            TokenKind::Gt => "`>`".into(),
            TokenKind::GtEq => "`>=`".into(),
            TokenKind::Eof => "end of expression".into(),
        }
    }
}

/// A token and the 1-based column it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub column: usize,
}

/// Tokenize a whole fragment. The last token is always [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> ParseResult<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn column(&self) -> usize {
        self.pos + 1
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_whitespace();
        let column = self.column();

        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                column,
            });
        };

        let kind = match c {
            ';' => self.single(TokenKind::Semi),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '.' => {
                self.pos += 1;
                if self.peek() == Some('=') {
                    self.pos += 1;
                    TokenKind::DotAssign
                } else {
                    TokenKind::Dot
                }
            }
            '=' => {
                self.pos += 1;
                match self.peek() {
                    Some('=') => self.single(TokenKind::NumEq),
                    Some('~') => self.single(TokenKind::BindMatch),
                    _ => TokenKind::Assign,
                }
            }
            '!' => {
                self.pos += 1;
                match self.peek() {
                    Some('=') => self.single(TokenKind::NumNe),
                    Some('~') => self.single(TokenKind::BindNotMatch),
                    _ => TokenKind::Bang,
                }
            }
            '<' => {
                self.pos += 1;
                if self.peek() == Some('=') {
                    self.single(TokenKind::LtEq)
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                self.pos += 1;
                if self.peek() == Some('=') {
                    self.single(TokenKind::GtEq)
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.peek_at(1) != Some('&') {
                    return Err(ParseError::new("expected `&&`", column));
                }
                self.pos += 2;
                TokenKind::AndAnd
            }
            '|' => {
                if self.peek_at(1) != Some('|') {
                    return Err(ParseError::new("expected `||`", column));
                }
                self.pos += 2;
                TokenKind::OrOr
            }
            '$' => self.lex_var()?,
            '\'' => self.lex_single_quoted()?,
            '"' => {
                self.pos += 1;
                TokenKind::Interp(self.read_delimited('"', column)?)
            }
            '/' => {
                self.pos += 1;
                let pattern = self.read_delimited('/', column)?;
                let flags = self.read_flags();
                TokenKind::Match { pattern, flags }
            }
            c if c.is_ascii_digit() => self.lex_int()?,
            c if c.is_alphabetic() || c == '_' => self.lex_word(column)?,
            other => {
                return Err(ParseError::new(
                    format!("unexpected character `{other}`"),
                    column,
                ));
            }
        };

        Ok(Token { kind, column })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn lex_var(&mut self) -> ParseResult<TokenKind> {
        let column = self.column();
        self.pos += 1; // $

        if self.peek() == Some('{') {
            self.pos += 1;
            let name = self.read_ident();
            if self.bump() != Some('}') || name.is_empty() {
                return Err(ParseError::new("malformed `${name}` variable", column));
            }
            return Ok(TokenKind::Var(name));
        }

        let name = self.read_ident();
        if name.is_empty() {
            let message = "expected a variable name after `$`";
            return Err(ParseError::new(message, column));
        }
        Ok(TokenKind::Var(name))
    }

    fn read_ident(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn lex_int(&mut self) -> ParseResult<TokenKind> {
        let column = self.column();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        // `3.5` must not lex as `3 . 5`.
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            return Err(ParseError::new(
                "decimal numbers are not supported; quote the value, e.g. '3.5'",
                column,
            ));
        }
        let n = text.parse::<i64>().map_err(|e| {
            ParseError::new(format!("bad integer `{text}`: {e}"), column)
        })?;
        Ok(TokenKind::Int(n))
    }

    fn lex_word(&mut self, column: usize) -> ParseResult<TokenKind> {
        let word = self.read_ident();

        // `s` and `m` followed by a delimiter start a regex token.
        if word == "s" || word == "m" {
            if let Some(delim) = self.peek().filter(|&c| is_delimiter(c)) {
                self.pos += 1;
                let pattern = self.read_delimited(delim, column)?;
                if word == "m" {
                    let flags = self.read_flags();
                    return Ok(TokenKind::Match { pattern, flags });
                }
                let replacement = self.read_delimited(delim, column)?;
                let flags = self.read_flags();
                return Ok(TokenKind::Subst {
                    pattern,
                    replacement,
                    flags,
                });
            }
            if self.peek().is_some_and(is_bracket) {
                return Err(ParseError::new(
                    "bracketing delimiters are not supported, use e.g. `s/a/b/`",
                    column,
                ));
            }
        }

        Ok(match word.as_str() {
            "last" => TokenKind::Last,
            "if" => TokenKind::If,
            "unless" => TokenKind::Unless,
            "eq" => TokenKind::Eq,
            "ne" => TokenKind::Ne,
            _ => TokenKind::Ident(word),
        })
    }

    fn lex_single_quoted(&mut self) -> ParseResult<TokenKind> {
        let column = self.column();
        self.pos += 1; // '
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::unexpected_eof(column, "closing `'`")),
                Some('\'') => return Ok(TokenKind::Str(out)),
                Some('\\') => match self.peek() {
                    Some(c @ ('\'' | '\\')) => {
                        self.pos += 1;
                        out.push(c);
                    }
                    _ => out.push('\\'),
                },
                Some(c) => out.push(c),
            }
        }
    }

    /// Read up to an unescaped `delim`, consuming it. Escapes are kept verbatim
    /// (the body is interpreted later as a regex or a template).
    fn read_delimited(&mut self, delim: char, column: usize) -> ParseResult<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(ParseError::unexpected_eof(
                        column,
                        &format!("closing `{delim}`"),
                    ));
                }
                Some(c) if c == delim => return Ok(out),
                Some('\\') => {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn read_flags(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }
}

fn is_bracket(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>')
}

fn is_delimiter(c: char) -> bool {
    c.is_ascii_punctuation() && c != '\\' && c != '_' && !is_bracket(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_substitution_token() {
        assert_eq!(
            kinds(r"s/^\s+//g"),
            vec![
                TokenKind::Subst {
                    pattern: r"^\s+".into(),
                    replacement: "".into(),
                    flags: "g".into(),
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_alternate_delimiter_keeps_escapes() {
        assert_eq!(
            kinds(r"s|a\|b|c|"),
            vec![
                TokenKind::Subst {
                    pattern: r"a\|b".into(),
                    replacement: "c".into(),
                    flags: "".into(),
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_guarded_last() {
        assert_eq!(
            kinds("last if /^Podcast/i"),
            vec![
                TokenKind::Last,
                TokenKind::If,
                TokenKind::Match {
                    pattern: "^Podcast".into(),
                    flags: "i".into(),
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("$_ .= $file; $seconds >= 60 && $_ !~ m#x#"),
            vec![
                TokenKind::Var("_".into()),
                TokenKind::DotAssign,
                TokenKind::Var("file".into()),
                TokenKind::Semi,
                TokenKind::Var("seconds".into()),
                TokenKind::GtEq,
                TokenKind::Int(60),
                TokenKind::AndAnd,
                TokenKind::Var("_".into()),
                TokenKind::BindNotMatch,
                TokenKind::Match {
                    pattern: "x".into(),
                    flags: "".into(),
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_identifier_named_s_without_delimiter() {
        assert_eq!(
            kinds("stem($file)"),
            vec![
                TokenKind::Ident("stem".into()),
                TokenKind::LParen,
                TokenKind::Var("file".into()),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_single_quoted_escapes() {
        assert_eq!(
            kinds(r"'it\'s $5'"),
            vec![TokenKind::Str("it's $5".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_substitution() {
        let err = tokenize("s/abc/def").unwrap_err();
        assert_eq!(err.column, 1);
        assert!(err.message.contains("closing `/`"));
    }

    #[test]
    fn test_bracket_delimiter_rejected() {
        let err = tokenize("s{a}{b}").unwrap_err();
        assert!(err.message.contains("bracketing"));
    }

    #[test]
    fn test_decimal_literal_rejected() {
        let err = tokenize("$_ = 3.5").unwrap_err();
        assert_eq!(err.column, 6);
        assert!(err.message.contains("decimal"));

        // Explicit concatenation of two integers is still fine.
        assert_eq!(
            kinds("3 . 5"),
            vec![
                TokenKind::Int(3),
                TokenKind::Dot,
                TokenKind::Int(5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_character_column() {
        let err = tokenize("$_ = 1 @").unwrap_err();
        assert_eq!(err.column, 8);
    }
}

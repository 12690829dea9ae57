use std::fmt;

use super::FilterError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Str(String),
    Number(f64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    True,
    False,
    Null,
    Contains,
    StartsWith,
    EndsWith,
    In,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "{name}"),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Number(n) => write!(f, "{n}"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::LBracket => write!(f, "["),
            Self::RBracket => write!(f, "]"),
            Self::Comma => write!(f, ","),
            Self::Dot => write!(f, "."),
            Self::Eq => write!(f, "=="),
            Self::Ne => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Not => write!(f, "not"),
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Null => write!(f, "null"),
            Self::Contains => write!(f, "contains"),
            Self::StartsWith => write!(f, "startswith"),
            Self::EndsWith => write!(f, "endswith"),
            Self::In => write!(f, "in"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset into the source text.
    pub pos: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, FilterError> {
    let mut lexer = Lexer {
        source,
        chars: source.char_indices().peekable(),
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    tokens: Vec<Token>,
}

impl Lexer<'_> {
    fn run(&mut self) -> Result<(), FilterError> {
        while let Some(&(pos, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
                continue;
            }

            let kind = match ch {
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                ',' => self.single(TokenKind::Comma),
                '.' => self.single(TokenKind::Dot),
                '=' => self.pair('=', TokenKind::Eq, None, pos, ch)?,
                '!' => self.pair('=', TokenKind::Ne, Some(TokenKind::Not), pos, ch)?,
                '<' => self.pair('=', TokenKind::Le, Some(TokenKind::Lt), pos, ch)?,
                '>' => self.pair('=', TokenKind::Ge, Some(TokenKind::Gt), pos, ch)?,
                '&' => self.pair('&', TokenKind::And, None, pos, ch)?,
                '|' => self.pair('|', TokenKind::Or, None, pos, ch)?,
                '"' | '\'' => self.string(pos, ch)?,
                '-' | '0'..='9' => self.number(pos)?,
                c if c.is_alphabetic() || c == '_' => self.word(pos),
                other => return Err(FilterError::UnexpectedChar { ch: other, pos }),
            };

            self.tokens.push(Token { kind, pos });
        }
        Ok(())
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.chars.next();
        kind
    }

    /// Two-character operator `<first><second>`, or `alone` when only the
    /// first character is present.
    fn pair(
        &mut self,
        second: char,
        joined: TokenKind,
        alone: Option<TokenKind>,
        pos: usize,
        first: char,
    ) -> Result<TokenKind, FilterError> {
        self.chars.next();
        if matches!(self.chars.peek(), Some(&(_, c)) if c == second) {
            self.chars.next();
            return Ok(joined);
        }
        alone.ok_or(FilterError::UnexpectedChar { ch: first, pos })
    }

    fn string(&mut self, start: usize, quote: char) -> Result<TokenKind, FilterError> {
        self.chars.next();
        let mut out = String::new();
        loop {
            let Some((pos, ch)) = self.chars.next() else {
                return Err(FilterError::UnterminatedString { pos: start });
            };
            match ch {
                c if c == quote => return Ok(TokenKind::Str(out)),
                '\\' => {
                    let Some((_, escaped)) = self.chars.next() else {
                        return Err(FilterError::UnterminatedString { pos: start });
                    };
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '\\' | '"' | '\'' => out.push(escaped),
                        other => return Err(FilterError::InvalidEscape { ch: other, pos }),
                    }
                }
                c => out.push(c),
            }
        }
    }

    fn number(&mut self, start: usize) -> Result<TokenKind, FilterError> {
        let mut end = start;
        let mut prev = '\0';
        while let Some(&(pos, ch)) = self.chars.peek() {
            let accepted = ch.is_ascii_digit()
                || ch == '.'
                || ch == 'e'
                || ch == 'E'
                || (ch == '-' && (pos == start || prev == 'e' || prev == 'E'))
                || (ch == '+' && (prev == 'e' || prev == 'E'));
            if !accepted {
                break;
            }
            // `a[0].b`: a dot followed by a non-digit ends the number.
            if ch == '.' && !self.source[pos + 1..].starts_with(|c: char| c.is_ascii_digit()) {
                break;
            }
            prev = ch;
            end = pos + ch.len_utf8();
            self.chars.next();
        }

        let text = &self.source[start..end];
        text.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(TokenKind::Number)
            .ok_or_else(|| FilterError::InvalidNumber {
                text: text.to_string(),
                pos: start,
            })
    }

    fn word(&mut self, start: usize) -> TokenKind {
        let mut end = start;
        while let Some(&(pos, ch)) = self.chars.peek() {
            if !(ch.is_alphanumeric() || ch == '_') {
                break;
            }
            end = pos + ch.len_utf8();
            self.chars.next();
        }

        let word = &self.source[start..end];
        match word.to_ascii_lowercase().as_str() {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "contains" => TokenKind::Contains,
            "startswith" => TokenKind::StartsWith,
            "endswith" => TokenKind::EndsWith,
            "in" => TokenKind::In,
            _ => TokenKind::Ident(word.to_string()),
        }
    }
}

//! Tokenizer for pattern text.
//!
//! Keywords are case-sensitive uppercase words; `true` and `false` are
//! recognized in any case. Every token records the byte offset it starts at
//! so that parse errors can point into the source.

use crate::error::PatternError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    And,
    Or,
    Not,
    FollowedBy,
    Like,
    Matches,
    IsSubset,
    IsSuperset,
    In,
    Exists,
    Within,
    Seconds,
    Repeats,
    Times,
    Start,
    Stop,
}

impl Keyword {
    pub(crate) fn from_word(word: &str) -> Option<Keyword> {
        Some(match word {
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "NOT" => Keyword::Not,
            "FOLLOWEDBY" => Keyword::FollowedBy,
            "LIKE" => Keyword::Like,
            "MATCHES" => Keyword::Matches,
            "ISSUBSET" => Keyword::IsSubset,
            "ISSUPERSET" => Keyword::IsSuperset,
            "IN" => Keyword::In,
            "EXISTS" => Keyword::Exists,
            "WITHIN" => Keyword::Within,
            "SECONDS" => Keyword::Seconds,
            "REPEATS" => Keyword::Repeats,
            "TIMES" => Keyword::Times,
            "START" => Keyword::Start,
            "STOP" => Keyword::Stop,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Identifier(String),
    Keyword(Keyword),
    Integer(i64),
    Float(f64),
    /// Unescaped string contents.
    String(String),
    Hex(String),
    Binary(String),
    Timestamp(String),
    Boolean(bool),
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Colon,
    Dot,
    Comma,
    Asterisk,
    Eof,
}

impl TokenKind {
    /// Short description for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier '{}'", name),
            TokenKind::Keyword(k) => format!("keyword {}", format!("{:?}", k).to_uppercase()),
            TokenKind::Integer(i) => format!("integer {}", i),
            TokenKind::Float(x) => format!("float {}", x),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Hex(_) => "hex literal".to_string(),
            TokenKind::Binary(_) => "binary literal".to_string(),
            TokenKind::Timestamp(_) => "timestamp literal".to_string(),
            TokenKind::Boolean(b) => format!("boolean {}", b),
            TokenKind::Eof => "end of pattern".to_string(),
            punct => format!("'{}'", punct.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::Equal => "=",
            TokenKind::NotEqual => "!=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Asterisk => "*",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

/// Splits pattern text into tokens, ending with [`TokenKind::Eof`].
pub(crate) fn tokenize(text: &str) -> Result<Vec<Token>, PatternError> {
    let mut lexer = Lexer { text, pos: 0 };
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

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.text[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, position: usize, message: impl Into<String>) -> PatternError {
        PatternError::Syntax {
            position,
            message: message.into(),
        }
    }

    fn next_token(&mut self) -> Result<Token, PatternError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                position: start,
            });
        };

        let kind = match c {
            '\'' => TokenKind::String(self.quoted(start)?),
            'h' | 'b' | 't' if self.peek_at(1) == Some('\'') => {
                self.bump();
                let body = self.quoted(start)?;
                match c {
                    'h' => TokenKind::Hex(body),
                    'b' => TokenKind::Binary(body),
                    _ => TokenKind::Timestamp(body),
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => self.word(),
            '.' if !self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                self.bump();
                TokenKind::Dot
            }
            c if c.is_ascii_digit() || c == '.' || c == '+' || c == '-' => self.number(start)?,
            _ => {
                self.bump();
                let next = self.peek();
                match (c, next) {
                    ('=', Some('=')) | ('!', Some('=')) | ('<', Some('>')) | ('>', Some('=')) | ('<', Some('=')) => {
                        self.bump();
                        match c {
                            '=' => TokenKind::Equal,
                            '>' => TokenKind::GreaterEqual,
                            '<' if next == Some('=') => TokenKind::LessEqual,
                            _ => TokenKind::NotEqual,
                        }
                    }
                    ('=', _) => TokenKind::Equal,
                    ('>', _) => TokenKind::Greater,
                    ('<', _) => TokenKind::Less,
                    ('[', _) => TokenKind::LeftBracket,
                    (']', _) => TokenKind::RightBracket,
                    ('(', _) => TokenKind::LeftParen,
                    (')', _) => TokenKind::RightParen,
                    (':', _) => TokenKind::Colon,
                    (',', _) => TokenKind::Comma,
                    ('*', _) => TokenKind::Asterisk,
                    _ => return Err(self.error(start, format!("unexpected character '{}'", c))),
                }
            }
        };
        Ok(Token {
            kind,
            position: start,
        })
    }

    /// Reads a single-quoted body. Only `\'` and `\\` are valid escapes.
    fn quoted(&mut self, start: usize) -> Result<String, PatternError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(start, "unterminated string literal")),
                Some('\'') => return Ok(out),
                Some('\\') => {
                    let escape = self.pos - 1;
                    match self.bump() {
                        Some(c @ ('\'' | '\\')) => out.push(c),
                        _ => return Err(self.error(escape, "invalid escape sequence in string literal")),
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// Identifiers may contain hyphens; the parser decides where they are
    /// allowed.
    fn word(&mut self) -> TokenKind {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            self.bump();
        }
        let word = &self.text[start..self.pos];
        if let Some(keyword) = Keyword::from_word(word) {
            return TokenKind::Keyword(keyword);
        }
        match word.to_ascii_lowercase().as_str() {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            _ => TokenKind::Identifier(word.to_string()),
        }
    }

    /// `[+-]?digits` or `[+-]?digits?.digits`
    fn number(&mut self, start: usize) -> Result<TokenKind, PatternError> {
        if matches!(self.peek(), Some('+' | '-')) {
            self.bump();
        }
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        let text = &self.text[start..self.pos];
        if self.pos == digits_start {
            return Err(self.error(start, format!("unexpected character '{}'", text)));
        }
        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| self.error(start, format!("invalid float literal '{}'", text)))
        } else {
            text.trim_start_matches('+')
                .parse::<i64>()
                .map(TokenKind::Integer)
                .map_err(|_| self.error(start, format!("integer literal '{}' out of range", text)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_comparison() {
        assert_eq!(
            kinds("[file:size >= -1024]"),
            vec![
                TokenKind::LeftBracket,
                TokenKind::Identifier("file".into()),
                TokenKind::Colon,
                TokenKind::Identifier("size".into()),
                TokenKind::GreaterEqual,
                TokenKind::Integer(-1024),
                TokenKind::RightBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operator_spellings() {
        assert_eq!(kinds("= == != <> < <= > >=")[..8], [
            TokenKind::Equal,
            TokenKind::Equal,
            TokenKind::NotEqual,
            TokenKind::NotEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
        ]);
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds(r"'it\'s \\ here' h'ffd8' b'AAEC' t'2016-01-01T00:00:00Z' TRUE false 7.5 .5"),
            vec![
                TokenKind::String("it's \\ here".into()),
                TokenKind::Hex("ffd8".into()),
                TokenKind::Binary("AAEC".into()),
                TokenKind::Timestamp("2016-01-01T00:00:00Z".into()),
                TokenKind::Boolean(true),
                TokenKind::Boolean(false),
                TokenKind::Float(7.5),
                TokenKind::Float(0.5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_are_uppercase() {
        assert_eq!(kinds("AND and")[..2], [
            TokenKind::Keyword(Keyword::And),
            TokenKind::Identifier("and".into()),
        ]);
        assert_eq!(kinds("network-traffic")[0], TokenKind::Identifier("network-traffic".into()));
    }

    #[test]
    fn test_lexical_errors() {
        assert!(matches!(tokenize("'open"), Err(PatternError::Syntax { position: 0, .. })));
        assert!(matches!(tokenize(r"'bad \n escape'"), Err(PatternError::Syntax { position: 5, .. })));
        assert!(matches!(tokenize("[a:b = 1] ~"), Err(PatternError::Syntax { position: 10, .. })));
    }
}

//! Lexical analyzer for the Jack language.
//!
//! Keywords are recognized by prefix: a keyword matches when the character
//! after it is not a letter, so `if1` lexes as `if` followed by `1` while
//! `ifX` is an identifier. Block comments do not nest: the first `*/`
//! closes the comment.

use crate::error::{ErrorAccumulator, JackError};
use crate::token::{KEYWORDS, Keyword, Span, SpannedToken, Token, is_symbol};

pub struct JackTokenizer {
    chars: Vec<char>,
    pos: usize,
    byte_offset: usize,
    line: usize,
    column: usize,
    errors: ErrorAccumulator,
}

impl JackTokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            byte_offset: 0,
            line: 1,
            column: 1,
            errors: ErrorAccumulator::new(),
        }
    }

    /// Tokenize the whole input. All lexical errors are collected; any error
    /// fails the run.
    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>, Vec<JackError>> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.skip_whitespace_and_comments();
            if self.is_at_end() {
                break;
            }

            if let Some(token) = self.next_token() {
                tokens.push(token);
            }

            if self.errors.is_full() {
                break;
            }
        }

        if self.errors.has_errors() {
            Err(self.errors.into_errors())
        } else {
            Ok(tokens)
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        self.byte_offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn current_span_from(&self, start: (usize, usize, usize)) -> Span {
        Span::new(start.0, self.byte_offset, start.1, start.2)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while let Some(c) = self.peek() {
                if c.is_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }

            if self.peek() == Some('/') {
                if self.peek_next() == Some('/') {
                    self.advance();
                    self.advance();
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    continue;
                } else if self.peek_next() == Some('*') {
                    let start = (self.byte_offset, self.line, self.column);
                    self.advance();
                    self.advance();

                    let mut closed = false;
                    while !self.is_at_end() {
                        if self.peek() == Some('*') && self.peek_next() == Some('/') {
                            self.advance();
                            self.advance();
                            closed = true;
                            break;
                        }
                        self.advance();
                    }

                    if !closed {
                        self.errors.push(JackError::lexical(
                            self.current_span_from(start),
                            "unterminated block comment",
                        ));
                    }
                    continue;
                }
            }

            break;
        }
    }

    fn next_token(&mut self) -> Option<SpannedToken> {
        let start = (self.byte_offset, self.line, self.column);
        let c = self.peek()?;

        if is_symbol(c) {
            self.advance();
            return Some(SpannedToken::new(
                Token::Symbol(c),
                self.current_span_from(start),
            ));
        }

        if c.is_ascii_digit() {
            return Some(self.read_integer(start));
        }

        if c == '"' {
            return self.read_string(start);
        }

        if c.is_ascii_alphabetic() || c == '_' {
            return Some(self.read_word(start));
        }

        self.advance();
        self.errors.push(JackError::lexical(
            self.current_span_from(start),
            format!("unexpected character '{}'", c),
        ));
        None
    }

    fn read_integer(&mut self, start: (usize, usize, usize)) -> SpannedToken {
        let mut value: u32 = 0;
        let mut overflow = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
                value = value.saturating_mul(10).saturating_add(c.to_digit(10).unwrap());
                if value > 32767 {
                    overflow = true;
                }
            } else {
                break;
            }
        }

        let span = self.current_span_from(start);

        if overflow {
            self.errors.push(JackError::lexical(
                span.clone(),
                format!("integer constant {} exceeds maximum value 32767", value),
            ));
        }

        SpannedToken::new(Token::IntegerConstant(value.min(32767) as u16), span)
    }

    fn read_string(&mut self, start: (usize, usize, usize)) -> Option<SpannedToken> {
        self.advance(); // opening quote

        let mut value = String::new();
        let mut terminated = false;

        while let Some(c) = self.peek() {
            if c == '"' {
                self.advance();
                terminated = true;
                break;
            } else if c == '\n' {
                break;
            } else {
                value.push(c);
                self.advance();
            }
        }

        let span = self.current_span_from(start);

        if !terminated {
            self.errors
                .push(JackError::lexical(span, "unterminated string constant"));
            return None;
        }

        Some(SpannedToken::new(Token::StringConstant(value), span))
    }

    fn read_word(&mut self, start: (usize, usize, usize)) -> SpannedToken {
        if let Some(keyword) = self.match_keyword() {
            for _ in 0..keyword.as_str().len() {
                self.advance();
            }
            return SpannedToken::new(Token::Keyword(keyword), self.current_span_from(start));
        }

        let mut value = String::new();

        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        SpannedToken::new(Token::Identifier(value), self.current_span_from(start))
    }

    /// A keyword matches by prefix, with the constraint that the character
    /// after it is not a letter. Digits and underscores do not break a
    /// match, so `if1` is the keyword `if` followed by an integer constant.
    fn match_keyword(&self) -> Option<Keyword> {
        for &keyword in KEYWORDS {
            let text = keyword.as_str();
            let end = self.pos + text.len();
            if end <= self.chars.len()
                && self.chars[self.pos..end].iter().copied().eq(text.chars())
                && !self.chars.get(end).is_some_and(|c| c.is_ascii_alphabetic())
            {
                return Some(keyword);
            }
        }
        None
    }
}

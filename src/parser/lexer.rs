use crate::error::{ConvertError, Result, Span};
use crate::parser::types::BinOp;

/// Token kinds for the supported Python subset.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals (raw source text, escapes are not interpreted)
    Name(String),
    Int(String),
    Float(String),
    Imaginary(String),
    Str(String),
    FStr(String),
    Bytes(String),

    // Keywords
    Def,
    Return,
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Not,
    And,
    Or,
    Is,
    Break,
    Continue,
    Pass,
    True,
    False,
    None,
    Import,
    From,
    As,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    At,
    Amp,
    Pipe,
    Caret,
    Tilde,
    LShift,
    RShift,
    Assign,
    AugAssign(BinOp),
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Arrow,
    Walrus,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Ellipsis,

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

const TAB_WIDTH: usize = 8;

pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    indents: Vec<usize>,
    /// Open bracket count; newlines inside brackets are joined.
    depth: usize,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            indents: vec![0],
            depth: 0,
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        loop {
            if self.at_line_start && self.depth == 0 {
                if !self.read_indentation()? {
                    break;
                }
                continue;
            }

            self.skip_whitespace();
            let Some(ch) = self.peek() else {
                break;
            };
            let span = self.span();

            match ch {
                '#' => self.skip_comment(),
                '\\' if self.peek_at(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                '\n' => {
                    self.advance();
                    if self.depth == 0 {
                        self.push(TokenKind::Newline, span);
                        self.at_line_start = true;
                    }
                }
                '"' | '\'' => {
                    let raw = self.read_string(span)?;
                    self.push(TokenKind::Str(raw), span);
                }
                c if c.is_ascii_digit()
                    || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) =>
                {
                    let kind = self.read_number();
                    self.push(kind, span);
                }
                c if c.is_alphabetic() || c == '_' => {
                    let kind = self.read_word(span)?;
                    self.push(kind, span);
                }
                _ => {
                    let kind = self.read_operator(span)?;
                    self.push(kind, span);
                }
            }
        }

        let end = self.span();
        if self
            .tokens
            .last()
            .is_some_and(|t| t.kind != TokenKind::Newline)
        {
            self.push(TokenKind::Newline, end);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, end);
        }
        self.push(TokenKind::Eof, end);
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.col)
    }

    fn push(&mut self, kind: TokenKind, span: Span) {
        self.tokens.push(Token { kind, span });
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r' | '\x0c')) {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        while self.peek().is_some_and(|c| c != '\n') {
            self.advance();
        }
    }

    /// Measures the indentation of a logical line and emits INDENT/DEDENT.
    /// Blank and comment-only lines are consumed whole. Returns false at EOF.
    fn read_indentation(&mut self) -> Result<bool> {
        let mut width = 0;
        loop {
            match self.peek() {
                Some(' ') => width += 1,
                Some('\t') => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                Some('\r' | '\x0c') => {}
                _ => break,
            }
            self.advance();
        }

        match self.peek() {
            None => return Ok(false),
            Some('#') => {
                self.skip_comment();
                self.advance();
                return Ok(true);
            }
            Some('\n') => {
                self.advance();
                return Ok(true);
            }
            Some(_) => {}
        }

        let span = self.span();
        let current = self.indents.last().copied().unwrap_or(0);
        if width > current {
            self.indents.push(width);
            self.push(TokenKind::Indent, span);
        } else {
            while self.indents.last().is_some_and(|&w| w > width) {
                self.indents.pop();
                self.push(TokenKind::Dedent, span);
            }
            if self.indents.last().copied().unwrap_or(0) != width {
                return Err(ConvertError::syntax(
                    span,
                    "unindent does not match any outer indentation level",
                ));
            }
        }
        self.at_line_start = false;
        Ok(true)
    }

    /// Reads a quoted literal starting at the current quote and returns its raw body.
    fn read_string(&mut self, span: Span) -> Result<String> {
        let quote = self.advance().unwrap_or('"');
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }

        let mut raw = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(ConvertError::syntax(span, "unterminated string literal"));
            };
            if ch == quote {
                if !triple {
                    self.advance();
                    break;
                }
                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.advance();
                    self.advance();
                    self.advance();
                    break;
                }
            }
            if ch == '\n' && !triple {
                return Err(ConvertError::syntax(span, "unterminated string literal"));
            }
            self.advance();
            raw.push(ch);
            if ch == '\\' {
                if let Some(escaped) = self.advance() {
                    raw.push(escaped);
                }
            }
        }
        Ok(raw)
    }

    fn read_number(&mut self) -> TokenKind {
        let mut text = String::new();
        let mut is_float = false;

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
            while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                text.extend(self.advance());
            }
            return TokenKind::Int(text);
        }

        while let Some(ch) = self.peek() {
            match ch {
                '0'..='9' | '_' => text.extend(self.advance()),
                '.' if !is_float => {
                    is_float = true;
                    text.extend(self.advance());
                }
                'e' | 'E' if self
                    .peek_at(1)
                    .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-') =>
                {
                    is_float = true;
                    text.extend(self.advance());
                    text.extend(self.advance());
                }
                _ => break,
            }
        }

        if matches!(self.peek(), Some('j' | 'J')) {
            text.extend(self.advance());
            return TokenKind::Imaginary(text);
        }
        if is_float {
            TokenKind::Float(text)
        } else {
            TokenKind::Int(text)
        }
    }

    /// Identifier, keyword, or a prefixed string literal such as `f"..."`.
    fn read_word(&mut self, span: Span) -> Result<TokenKind> {
        let mut word = String::new();
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            word.extend(self.advance());
        }

        if matches!(self.peek(), Some('"' | '\'')) {
            let prefix = word.to_ascii_lowercase();
            let is_prefix = matches!(prefix.as_str(), "f" | "r" | "b" | "u" | "rb" | "br" | "fr" | "rf");
            if is_prefix {
                let raw = self.read_string(span)?;
                return Ok(if prefix.contains('f') {
                    TokenKind::FStr(raw)
                } else if prefix.contains('b') {
                    TokenKind::Bytes(raw)
                } else {
                    TokenKind::Str(raw)
                });
            }
        }

        Ok(match word.as_str() {
            "def" => TokenKind::Def,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "not" => TokenKind::Not,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "is" => TokenKind::Is,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "pass" => TokenKind::Pass,
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            "import" => TokenKind::Import,
            "from" => TokenKind::From,
            "as" => TokenKind::As,
            _ => TokenKind::Name(word),
        })
    }

    /// Consumes the second character of a two-character operator.
    fn bump(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn read_operator(&mut self, span: Span) -> Result<TokenKind> {
        let ch = self.advance().unwrap_or('\0');
        let next = self.peek();
        let kind = match (ch, next) {
            ('(', _) => {
                self.depth += 1;
                TokenKind::LParen
            }
            ('[', _) => {
                self.depth += 1;
                TokenKind::LBracket
            }
            ('{', _) => {
                self.depth += 1;
                TokenKind::LBrace
            }
            (')', _) => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::RParen
            }
            (']', _) => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::RBracket
            }
            ('}', _) => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::RBrace
            }
            (',', _) => TokenKind::Comma,
            (';', _) => TokenKind::Semicolon,
            (':', Some('=')) => self.bump(TokenKind::Walrus),
            (':', _) => TokenKind::Colon,
            ('.', Some('.')) if self.peek_at(1) == Some('.') => {
                self.advance();
                self.advance();
                TokenKind::Ellipsis
            }
            ('.', _) => TokenKind::Dot,
            ('+', Some('=')) => self.bump(TokenKind::AugAssign(BinOp::Add)),
            ('+', _) => TokenKind::Plus,
            ('-', Some('=')) => self.bump(TokenKind::AugAssign(BinOp::Sub)),
            ('-', Some('>')) => self.bump(TokenKind::Arrow),
            ('-', _) => TokenKind::Minus,
            ('*', Some('*')) => {
                self.advance();
                if self.peek() == Some('=') {
                    self.bump(TokenKind::AugAssign(BinOp::Pow))
                } else {
                    TokenKind::DoubleStar
                }
            }
            ('*', Some('=')) => self.bump(TokenKind::AugAssign(BinOp::Mult)),
            ('*', _) => TokenKind::Star,
            ('/', Some('/')) => {
                self.advance();
                if self.peek() == Some('=') {
                    self.bump(TokenKind::AugAssign(BinOp::FloorDiv))
                } else {
                    TokenKind::DoubleSlash
                }
            }
            ('/', Some('=')) => self.bump(TokenKind::AugAssign(BinOp::Div)),
            ('/', _) => TokenKind::Slash,
            ('%', Some('=')) => self.bump(TokenKind::AugAssign(BinOp::Mod)),
            ('%', _) => TokenKind::Percent,
            ('@', Some('=')) => self.bump(TokenKind::AugAssign(BinOp::MatMult)),
            ('@', _) => TokenKind::At,
            ('&', Some('=')) => self.bump(TokenKind::AugAssign(BinOp::BitAnd)),
            ('&', _) => TokenKind::Amp,
            ('|', Some('=')) => self.bump(TokenKind::AugAssign(BinOp::BitOr)),
            ('|', _) => TokenKind::Pipe,
            ('^', Some('=')) => self.bump(TokenKind::AugAssign(BinOp::BitXor)),
            ('^', _) => TokenKind::Caret,
            ('~', _) => TokenKind::Tilde,
            ('<', Some('<')) => {
                self.advance();
                if self.peek() == Some('=') {
                    self.bump(TokenKind::AugAssign(BinOp::LShift))
                } else {
                    TokenKind::LShift
                }
            }
            ('<', Some('=')) => self.bump(TokenKind::Le),
            ('<', _) => TokenKind::Lt,
            ('>', Some('>')) => {
                self.advance();
                if self.peek() == Some('=') {
                    self.bump(TokenKind::AugAssign(BinOp::RShift))
                } else {
                    TokenKind::RShift
                }
            }
            ('>', Some('=')) => self.bump(TokenKind::Ge),
            ('>', _) => TokenKind::Gt,
            ('=', Some('=')) => self.bump(TokenKind::EqEq),
            ('=', _) => TokenKind::Assign,
            ('!', Some('=')) => self.bump(TokenKind::NotEq),
            (other, _) => {
                return Err(ConvertError::syntax(
                    span,
                    format!("unexpected character '{}'", other),
                ))
            }
        };
        Ok(kind)
    }
}

/// Tokenize a complete source text.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

use crate::core::{Locator, Token, TokenKind, is_reserved_name, keyword_kind};
use crate::unicode::{is_identifier_part, is_identifier_start, is_line_terminator, is_whitespace};
use std::rc::Rc;

/// Character level scanner. Produces every token including whitespace,
/// comments and line terminators; malformed input becomes an `Invalid` token.
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    filename: Option<Rc<str>>,
}

impl Scanner {
    pub fn new(source: &str, filename: Option<&str>) -> Self {
        Scanner {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            filename: filename.map(Rc::from),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' || c == '\u{2028}' || c == '\u{2029}' || (c == '\r' && self.peek_char() != Some('\n')) {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn locator(&self) -> Locator {
        Locator {
            filename: self.filename.clone(),
            line: self.line,
            column: self.column,
            offset: self.pos,
        }
    }

    fn text_from(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    /// Scan the next token from the source.
    pub fn next_token(&mut self) -> Token {
        let loc = self.locator();
        let start = self.pos;
        let Some(c) = self.peek_char() else {
            return Token::new(TokenKind::Eof, "", loc);
        };

        let kind = if is_whitespace(c) {
            while self.peek_char().is_some_and(is_whitespace) {
                self.advance();
            }
            TokenKind::Space
        } else if is_line_terminator(c) {
            self.advance();
            if c == '\r' {
                self.eat('\n');
            }
            TokenKind::LineTerminator
        } else if c == '"' || c == '\'' {
            self.scan_string(c)
        } else if c.is_ascii_digit() {
            self.scan_number()
        } else if c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
            self.scan_number()
        } else if is_identifier_start(c) || c == '\\' {
            return self.scan_identifier(loc);
        } else if c == '/' {
            match self.peek_at(1) {
                Some('/') => self.scan_line_comment(),
                Some('*') => self.scan_block_comment(),
                _ => {
                    self.advance();
                    if self.eat('=') { TokenKind::DivAssign } else { TokenKind::Div }
                }
            }
        } else {
            self.scan_punctuator()
        };
        Token::new(kind, self.text_from(start), loc)
    }

    fn scan_line_comment(&mut self) -> TokenKind {
        while let Some(c) = self.peek_char() {
            if is_line_terminator(c) {
                break;
            }
            self.advance();
        }
        TokenKind::Comment
    }

    fn scan_block_comment(&mut self) -> TokenKind {
        self.advance();
        self.advance();
        let mut multi_line = false;
        loop {
            match self.advance() {
                None => return TokenKind::Invalid,
                Some('*') if self.peek_char() == Some('/') => {
                    self.advance();
                    break;
                }
                Some(c) if is_line_terminator(c) => multi_line = true,
                Some(_) => {}
            }
        }
        if multi_line {
            TokenKind::MultiLineComment
        } else {
            TokenKind::Comment
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        self.advance();
        loop {
            match self.advance() {
                None => return TokenKind::Invalid,
                Some(c) if c == quote => return TokenKind::String,
                Some('\\') => match self.advance() {
                    None => return TokenKind::Invalid,
                    Some('\r') => {
                        self.eat('\n');
                    }
                    Some(_) => {}
                },
                Some(c) if is_line_terminator(c) => return TokenKind::Invalid,
                Some(_) => {}
            }
        }
    }

    fn scan_digits(&mut self, pred: fn(char) -> bool) -> usize {
        let mut n = 0;
        while self.peek_char().is_some_and(pred) {
            self.advance();
            n += 1;
        }
        n
    }

    fn scan_number(&mut self) -> TokenKind {
        let mut kind = TokenKind::Integer;
        if self.peek_char() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.advance();
            self.advance();
            if self.scan_digits(|c| c.is_ascii_hexdigit()) == 0 {
                return TokenKind::Invalid;
            }
        } else {
            self.scan_digits(|c| c.is_ascii_digit());
            if self.peek_char() == Some('.') {
                self.advance();
                self.scan_digits(|c| c.is_ascii_digit());
                kind = TokenKind::Decimal;
            }
            if matches!(self.peek_char(), Some('e') | Some('E')) {
                self.advance();
                if matches!(self.peek_char(), Some('+') | Some('-')) {
                    self.advance();
                }
                if self.scan_digits(|c| c.is_ascii_digit()) == 0 {
                    return TokenKind::Invalid;
                }
                kind = TokenKind::Decimal;
            }
        }
        // A numeric literal must not be directly followed by an identifier or digit.
        if self.peek_char().is_some_and(|c| is_identifier_start(c) || c.is_ascii_digit() || c == '\\') {
            self.advance();
            return TokenKind::Invalid;
        }
        kind
    }

    fn scan_unicode_escape(&mut self) -> bool {
        // positioned on the backslash
        if self.peek_at(1) != Some('u') {
            return false;
        }
        for i in 2..6 {
            if !self.peek_at(i).is_some_and(|c| c.is_ascii_hexdigit()) {
                return false;
            }
        }
        for _ in 0..6 {
            self.advance();
        }
        true
    }

    fn scan_identifier(&mut self, loc: Locator) -> Token {
        let start = self.pos;
        let mut escaped = false;
        let mut first = true;
        loop {
            match self.peek_char() {
                Some('\\') => {
                    if !self.scan_unicode_escape() {
                        self.advance();
                        let mut tok = Token::new(TokenKind::Invalid, self.text_from(start), loc);
                        tok.escaped = true;
                        return tok;
                    }
                    escaped = true;
                }
                Some(c) if (first && is_identifier_start(c)) || (!first && is_identifier_part(c)) => {
                    self.advance();
                }
                _ => break,
            }
            first = false;
        }
        let text = self.text_from(start);
        let kind = if escaped {
            TokenKind::Identifier
        } else if let Some(k) = keyword_kind(&text) {
            k
        } else if is_reserved_name(&text) {
            TokenKind::Reserved
        } else {
            TokenKind::Identifier
        };
        let mut tok = Token::new(kind, text, loc);
        tok.escaped = escaped;
        tok
    }

    fn scan_punctuator(&mut self) -> TokenKind {
        let Some(c) = self.advance() else {
            return TokenKind::Eof;
        };
        match c {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '~' => TokenKind::BitNot,
            '<' => {
                if self.eat('<') {
                    if self.eat('=') { TokenKind::ShlAssign } else { TokenKind::Shl }
                } else if self.eat('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('>') {
                    if self.eat('>') {
                        if self.eat('=') { TokenKind::ShrAssign } else { TokenKind::Shr }
                    } else if self.eat('=') {
                        TokenKind::SarAssign
                    } else {
                        TokenKind::Sar
                    }
                } else if self.eat('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') { TokenKind::StrictEq } else { TokenKind::Eq }
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') { TokenKind::StrictNe } else { TokenKind::Ne }
                } else {
                    TokenKind::Not
                }
            }
            '+' => {
                if self.eat('+') {
                    TokenKind::Increment
                } else if self.eat('=') {
                    TokenKind::AddAssign
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::Decrement
                } else if self.eat('=') {
                    TokenKind::SubAssign
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('=') { TokenKind::MulAssign } else { TokenKind::Star }
            }
            '%' => {
                if self.eat('=') { TokenKind::ModAssign } else { TokenKind::Percent }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::And
                } else if self.eat('=') {
                    TokenKind::AndAssign
                } else {
                    TokenKind::BitAnd
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::Or
                } else if self.eat('=') {
                    TokenKind::OrAssign
                } else {
                    TokenKind::BitOr
                }
            }
            '^' => {
                if self.eat('=') { TokenKind::XorAssign } else { TokenKind::BitXor }
            }
            _ => TokenKind::Invalid,
        }
    }

    /// Rewind to just after the slash that starts the token at `loc`.
    fn rewind_after_slash(&mut self, loc: &Locator) {
        self.pos = loc.offset + 1;
        self.line = loc.line;
        self.column = loc.column + 1;
    }

    /// Scan a regular expression body. Must be called right after the
    /// opening slash has been consumed; the closing slash is consumed too.
    pub fn scan_regexp(&mut self) -> Option<String> {
        let start = self.pos;
        let mut in_class = false;
        loop {
            match self.peek_char() {
                None => return None,
                Some(c) if is_line_terminator(c) => return None,
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some(c) if !is_line_terminator(c) => {
                            self.advance();
                        }
                        _ => return None,
                    }
                }
                Some('[') => {
                    in_class = true;
                    self.advance();
                }
                Some(']') => {
                    in_class = false;
                    self.advance();
                }
                Some('/') if !in_class => {
                    let body = self.text_from(start);
                    self.advance();
                    return Some(body);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Scan the identifier-part characters that follow a regular expression body.
    pub fn scan_regexp_flags(&mut self) -> String {
        let start = self.pos;
        while self.peek_char().is_some_and(is_identifier_part) {
            self.advance();
        }
        self.text_from(start)
    }
}

/// Token stream used by the parser: filters trivia, keeps one token of
/// lookahead and remembers whether a line terminator preceded it.
pub struct TokenStream {
    scanner: Scanner,
    peeked: Option<Token>,
    newline_before_peeked: bool,
}

impl TokenStream {
    pub fn new(source: &str, filename: Option<&str>) -> Self {
        TokenStream {
            scanner: Scanner::new(source, filename),
            peeked: None,
            newline_before_peeked: false,
        }
    }

    fn fill(&mut self) {
        if self.peeked.is_some() {
            return;
        }
        let mut newline = false;
        loop {
            let tok = self.scanner.next_token();
            match tok.kind {
                TokenKind::LineTerminator | TokenKind::MultiLineComment => newline = true,
                TokenKind::Space | TokenKind::Comment => {}
                _ => {
                    self.newline_before_peeked = newline;
                    self.peeked = Some(tok);
                    return;
                }
            }
        }
    }

    pub fn peek(&mut self) -> TokenKind {
        self.peek_token().kind
    }

    pub fn peek_token(&mut self) -> &Token {
        self.fill();
        match &self.peeked {
            Some(tok) => tok,
            None => unreachable!("token stream fill always buffers a token"),
        }
    }

    pub fn next(&mut self) -> Token {
        self.fill();
        match self.peeked.take() {
            Some(tok) => tok,
            None => unreachable!("token stream fill always buffers a token"),
        }
    }

    pub fn has_line_terminator_before_next(&mut self) -> bool {
        self.fill();
        self.newline_before_peeked
    }

    pub fn source_slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.scanner.chars.len());
        self.scanner.chars[start.min(end)..end].iter().collect()
    }

    /// Re-scan the peeked `/` or `/=` token as a regular expression literal.
    /// Returns a `RegExp` token whose lexeme is the complete `/body/flags`
    /// text, or an `Invalid` token.
    pub fn scan_regexp(&mut self) -> Token {
        self.fill();
        let Some(slash) = self.peeked.take() else {
            unreachable!("token stream fill always buffers a token")
        };
        debug_assert!(matches!(slash.kind, TokenKind::Div | TokenKind::DivAssign));
        self.scanner.rewind_after_slash(&slash.locator);
        let loc = slash.locator.clone();
        match self.scanner.scan_regexp() {
            Some(body) => {
                let flags = self.scanner.scan_regexp_flags();
                Token::new(TokenKind::RegExp, format!("/{body}/{flags}"), loc)
            }
            None => Token::new(TokenKind::Invalid, slash.lexeme, loc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(src: &str) -> (TokenKind, TokenKind) {
        let mut s = Scanner::new(src, None);
        let first = s.next_token().kind;
        let second = s.next_token().kind;
        (first, second)
    }

    #[test]
    fn operators_scan_as_single_tokens() {
        let cases = [
            (">>>=", TokenKind::ShrAssign),
            (">>>", TokenKind::Shr),
            (">>=", TokenKind::SarAssign),
            (">=", TokenKind::Ge),
            ("!==", TokenKind::StrictNe),
            ("&", TokenKind::BitAnd),
            ("&&", TokenKind::And),
            ("|=", TokenKind::OrAssign),
            ("/=", TokenKind::DivAssign),
            ("++", TokenKind::Increment),
        ];
        for (src, kind) in cases {
            assert_eq!(single(src), (kind, TokenKind::Eof), "{src}");
        }
    }

    #[test]
    fn words_and_literals() {
        assert_eq!(single("instanceof"), (TokenKind::InstanceOf, TokenKind::Eof));
        assert_eq!(single("class"), (TokenKind::Reserved, TokenKind::Eof));
        assert_eq!(single("\\u0061bc"), (TokenKind::Identifier, TokenKind::Eof));
        assert_eq!(single("0x1F"), (TokenKind::Integer, TokenKind::Eof));
        assert_eq!(single(".5e-3"), (TokenKind::Decimal, TokenKind::Eof));
        assert_eq!(single("'a\\'b'"), (TokenKind::String, TokenKind::Eof));
        assert_eq!(single("/* x */"), (TokenKind::Comment, TokenKind::Eof));
    }

    #[test]
    fn malformed_input_is_invalid() {
        assert_eq!(single("'abc").0, TokenKind::Invalid);
        assert_eq!(single("'a\nb'").0, TokenKind::Invalid);
        assert_eq!(single("/* never closed").0, TokenKind::Invalid);
        assert_eq!(single("3in").0, TokenKind::Invalid);
        assert_eq!(single("#").0, TokenKind::Invalid);
    }

    #[test]
    fn stream_tracks_line_terminators() {
        let mut ts = TokenStream::new("a\nb /* x\n */ c d", None);
        assert_eq!(ts.next().lexeme, "a");
        assert!(ts.has_line_terminator_before_next());
        assert_eq!(ts.next().lexeme, "b");
        assert!(ts.has_line_terminator_before_next());
        assert_eq!(ts.next().lexeme, "c");
        assert!(!ts.has_line_terminator_before_next());
        assert_eq!(ts.next().line(), 3);
    }

    #[test]
    fn regexp_rescan() {
        let mut ts = TokenStream::new("/a[/]b\\/c/gi.x", None);
        assert_eq!(ts.peek(), TokenKind::Div);
        let tok = ts.scan_regexp();
        assert_eq!(tok.kind, TokenKind::RegExp);
        assert_eq!(tok.lexeme, "/a[/]b\\/c/gi");
        assert_eq!(ts.next().kind, TokenKind::Dot);

        let mut ts = TokenStream::new("/=abc/", None);
        assert_eq!(ts.peek(), TokenKind::DivAssign);
        assert_eq!(ts.scan_regexp().lexeme, "/=abc/");
    }
}

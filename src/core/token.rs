use std::fmt;

/// Position of a token or node in the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locator {
    pub filename: Option<std::rc::Rc<str>>,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filename {
            Some(name) => write!(f, "{}:{}:{}", name, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Invalid,
    Eof,
    Space,
    LineTerminator,
    Comment,
    /// A comment that spans at least one line terminator.
    MultiLineComment,
    Identifier,
    Reserved,

    // keywords
    Break,
    Case,
    Catch,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Finally,
    For,
    Function,
    If,
    In,
    InstanceOf,
    New,
    Return,
    Switch,
    This,
    Throw,
    Try,
    TypeOf,
    Var,
    Void,
    While,
    With,

    // literal words
    True,
    False,
    Null,

    // literals
    String,
    Integer,
    Decimal,
    RegExp,

    // punctuators
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Semicolon,
    Comma,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Plus,
    Minus,
    Star,
    Percent,
    Increment,
    Decrement,
    Shl,
    Sar,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Not,
    BitNot,
    And,
    Or,
    Question,
    Colon,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    ModAssign,
    ShlAssign,
    SarAssign,
    ShrAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    Div,
    DivAssign,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Space | TokenKind::LineTerminator | TokenKind::Comment | TokenKind::MultiLineComment
        )
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::AddAssign
                | TokenKind::SubAssign
                | TokenKind::MulAssign
                | TokenKind::DivAssign
                | TokenKind::ModAssign
                | TokenKind::ShlAssign
                | TokenKind::SarAssign
                | TokenKind::ShrAssign
                | TokenKind::AndAssign
                | TokenKind::OrAssign
                | TokenKind::XorAssign
        )
    }

    /// Keywords and literal words, which may still be used as property names.
    pub fn is_keyword(self) -> bool {
        keyword_text(self).is_some()
    }
}

/// Words that scan as keywords, mapped to their token kind.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("break", TokenKind::Break),
    ("case", TokenKind::Case),
    ("catch", TokenKind::Catch),
    ("continue", TokenKind::Continue),
    ("debugger", TokenKind::Debugger),
    ("default", TokenKind::Default),
    ("delete", TokenKind::Delete),
    ("do", TokenKind::Do),
    ("else", TokenKind::Else),
    ("finally", TokenKind::Finally),
    ("for", TokenKind::For),
    ("function", TokenKind::Function),
    ("if", TokenKind::If),
    ("in", TokenKind::In),
    ("instanceof", TokenKind::InstanceOf),
    ("new", TokenKind::New),
    ("return", TokenKind::Return),
    ("switch", TokenKind::Switch),
    ("this", TokenKind::This),
    ("throw", TokenKind::Throw),
    ("try", TokenKind::Try),
    ("typeof", TokenKind::TypeOf),
    ("var", TokenKind::Var),
    ("void", TokenKind::Void),
    ("while", TokenKind::While),
    ("with", TokenKind::With),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("null", TokenKind::Null),
];

/// Future reserved words. They scan as `Reserved` and are rejected as identifiers.
pub const RESERVED_NAMES: &[&str] = &[
    "abstract",
    "boolean",
    "byte",
    "char",
    "class",
    "const",
    "double",
    "enum",
    "export",
    "extends",
    "final",
    "float",
    "goto",
    "implements",
    "import",
    "int",
    "interface",
    "long",
    "native",
    "package",
    "private",
    "protected",
    "public",
    "short",
    "static",
    "super",
    "synchronized",
    "throws",
    "transient",
    "volatile",
];

pub fn keyword_kind(word: &str) -> Option<TokenKind> {
    KEYWORDS.iter().find(|(w, _)| *w == word).map(|(_, k)| *k)
}

pub fn keyword_text(kind: TokenKind) -> Option<&'static str> {
    KEYWORDS.iter().find(|(_, k)| *k == kind).map(|(w, _)| *w)
}

pub fn is_reserved_name(word: &str) -> bool {
    RESERVED_NAMES.contains(&word)
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub locator: Locator,
    /// Set when the identifier lexeme contained `\u` escapes.
    pub escaped: bool,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, locator: Locator) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            locator,
            escaped: false,
        }
    }

    pub fn line(&self) -> usize {
        self.locator.line
    }

    pub fn column(&self) -> usize {
        self.locator.column
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            _ => write!(f, "{}", self.lexeme),
        }
    }
}

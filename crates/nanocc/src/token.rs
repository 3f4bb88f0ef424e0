//! Token definitions for the C front end
//!
//! The parser consumes a finished, `Eof`-terminated token vector; driving the
//! lexer and handling file input belong to the compiler driver. The token
//! kinds are derived with logos so that the driver (and the tests) can produce
//! the stream straight from source text.

use crate::common::Span;
use logos::Logos;

/// Token with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// All token kinds recognized by the grammar
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f]+")] // Skip whitespace
#[logos(skip r"//[^\n]*")] // Skip line comments
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")] // Skip block comments
pub enum TokenKind {
    // === Keywords ===
    #[token("void")]
    Void,
    #[token("_Bool")]
    Bool,
    #[token("char")]
    Char,
    #[token("int")]
    Int,
    #[token("struct")]
    Struct,
    #[token("typedef")]
    Typedef,
    #[token("extern")]
    Extern,
    #[token("typeof")]
    Typeof,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("sizeof")]
    Sizeof,
    #[token("_Alignof")]
    Alignof,

    // === Identifiers ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // === Literals ===
    // Integer value, already decoded: decimal, hex, or character literal.
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| i64::from_str_radix(&lex.slice()[2..], 16).ok())]
    #[regex(r"'([^'\\]|\\.)'", decode_char_literal)]
    Num(i64),

    // Decoded string bytes, escapes resolved, no NUL terminator.
    #[regex(r#""([^"\\]|\\.)*""#, decode_string_literal)]
    Str(Vec<u8>),

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,

    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,

    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("<<")]
    LtLt,
    #[token(">>")]
    GtGt,

    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("<<=")]
    LtLtEq,
    #[token(">>=")]
    GtGtEq,

    // === Punctuation ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("->")]
    Arrow,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,

    // End-of-input marker; the token vector handed to the parser must end
    // with exactly one of these.
    Eof,
}

impl TokenKind {
    /// Keywords that can begin a declaration without consulting the
    /// typedef table
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Void
                | TokenKind::Bool
                | TokenKind::Char
                | TokenKind::Int
                | TokenKind::Struct
                | TokenKind::Typeof
        )
    }
}

fn decode_char_literal(lex: &mut logos::Lexer<TokenKind>) -> Option<i64> {
    let inner = &lex.slice()[1..lex.slice().len() - 1];
    let bytes = unescape(inner)?;
    if bytes.len() != 1 {
        return None;
    }
    Some(i64::from(bytes[0]))
}

fn decode_string_literal(lex: &mut logos::Lexer<TokenKind>) -> Option<Vec<u8>> {
    let inner = &lex.slice()[1..lex.slice().len() - 1];
    unescape(inner)
}

/// Resolve backslash escapes into raw bytes
fn unescape(s: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let escaped = match chars.next()? {
            'n' => b'\n',
            't' => b'\t',
            'r' => b'\r',
            '0' => b'\0',
            'a' => 0x07,
            'b' => 0x08,
            'f' => 0x0C,
            'v' => 0x0B,
            '\\' => b'\\',
            '\'' => b'\'',
            '"' => b'"',
            '?' => b'?',
            other => u8::try_from(u32::from(other)).ok()?,
        };
        out.push(escaped);
    }
    Some(out)
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TokenKind::Identifier(s) => return write!(f, "identifier '{s}'"),
            TokenKind::Num(v) => return write!(f, "number '{v}'"),
            TokenKind::Str(_) => return write!(f, "string literal"),
            TokenKind::Void => "'void'",
            TokenKind::Bool => "'_Bool'",
            TokenKind::Char => "'char'",
            TokenKind::Int => "'int'",
            TokenKind::Struct => "'struct'",
            TokenKind::Typedef => "'typedef'",
            TokenKind::Extern => "'extern'",
            TokenKind::Typeof => "'typeof'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::For => "'for'",
            TokenKind::While => "'while'",
            TokenKind::Do => "'do'",
            TokenKind::Switch => "'switch'",
            TokenKind::Case => "'case'",
            TokenKind::Break => "'break'",
            TokenKind::Continue => "'continue'",
            TokenKind::Return => "'return'",
            TokenKind::Sizeof => "'sizeof'",
            TokenKind::Alignof => "'_Alignof'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::PlusPlus => "'++'",
            TokenKind::MinusMinus => "'--'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::LtEq => "'<='",
            TokenKind::GtEq => "'>='",
            TokenKind::AmpAmp => "'&&'",
            TokenKind::PipePipe => "'||'",
            TokenKind::Bang => "'!'",
            TokenKind::Amp => "'&'",
            TokenKind::Pipe => "'|'",
            TokenKind::Caret => "'^'",
            TokenKind::Tilde => "'~'",
            TokenKind::LtLt => "'<<'",
            TokenKind::GtGt => "'>>'",
            TokenKind::Eq => "'='",
            TokenKind::PlusEq => "'+='",
            TokenKind::MinusEq => "'-='",
            TokenKind::StarEq => "'*='",
            TokenKind::SlashEq => "'/='",
            TokenKind::PercentEq => "'%='",
            TokenKind::AmpEq => "'&='",
            TokenKind::PipeEq => "'|='",
            TokenKind::CaretEq => "'^='",
            TokenKind::LtLtEq => "'<<='",
            TokenKind::GtGtEq => "'>>='",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Semi => "';'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Arrow => "'->'",
            TokenKind::Colon => "':'",
            TokenKind::Question => "'?'",
            TokenKind::Eof => "end of file",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        TokenKind::lexer(source).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("int foo _Bool typeof bar_2"),
            vec![
                TokenKind::Int,
                TokenKind::Identifier("foo".into()),
                TokenKind::Bool,
                TokenKind::Typeof,
                TokenKind::Identifier("bar_2".into()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("0 42 0x1F 'a' '\\n'"),
            vec![
                TokenKind::Num(0),
                TokenKind::Num(42),
                TokenKind::Num(0x1F),
                TokenKind::Num(i64::from(b'a')),
                TokenKind::Num(10),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""ab\tc\"d""#),
            vec![TokenKind::Str(b"ab\tc\"d".to_vec())]
        );
    }

    #[test]
    fn test_compound_operators() {
        assert_eq!(
            kinds("<<= << <= < -> -- -="),
            vec![
                TokenKind::LtLtEq,
                TokenKind::LtLt,
                TokenKind::LtEq,
                TokenKind::Lt,
                TokenKind::Arrow,
                TokenKind::MinusMinus,
                TokenKind::MinusEq,
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("a // line\nb /* block */ c"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Identifier("b".into()),
                TokenKind::Identifier("c".into()),
            ]
        );
    }
}

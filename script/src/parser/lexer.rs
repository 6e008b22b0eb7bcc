use std::ops::Range;

use crate::comment::{Comment, CommentKind};
use crate::parser::error::ParseError;

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    // Literals
    Number(f64),
    Str(String),
    Ident(String),

    // Keywords
    Var,
    Let,
    Const,
    Function,
    Return,
    If,
    Else,
    While,
    For,
    In,
    Break,
    Continue,
    Throw,
    True,
    False,
    Null,
    Undefined,
    TypeOf,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,   // ++
    MinusMinus, // --
    PlusEq,     // +=
    MinusEq,    // -=
    Eq,         // =
    EqEq,       // ==
    EqEqEq,     // ===
    BangEq,     // !=
    BangEqEq,   // !==
    Gt,
    Lt,
    GtEq,
    LtEq,
    AmpAmp,   // &&
    PipePipe, // ||
    Bang,     // !
    Arrow,    // =>
    Question,
    Colon,
    Comma,
    Semicolon,
    Dot,

    // Grouping
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Eof,
}

impl Token {
    /// The source spelling of a keyword, so keywords can still be used as
    /// property names (`obj.in`, `{ return: 1 }`).
    pub(crate) fn keyword_name(&self) -> Option<&'static str> {
        let name = match self {
            Token::Var => "var",
            Token::Let => "let",
            Token::Const => "const",
            Token::Function => "function",
            Token::Return => "return",
            Token::If => "if",
            Token::Else => "else",
            Token::While => "while",
            Token::For => "for",
            Token::In => "in",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Throw => "throw",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::Undefined => "undefined",
            Token::TypeOf => "typeof",
            _ => return None,
        };
        Some(name)
    }

    /// Human-readable description for error messages.
    pub(crate) fn describe(&self) -> String {
        if let Some(keyword) = self.keyword_name() {
            return format!("keyword `{}`", keyword);
        }
        let symbol = match self {
            Token::Number(n) => return format!("number `{}`", n),
            Token::Str(_) => return "string literal".to_string(),
            Token::Ident(name) => return format!("identifier `{}`", name),
            Token::Eof => return "end of input".to_string(),
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::Eq => "=",
            Token::EqEq => "==",
            Token::EqEqEq => "===",
            Token::BangEq => "!=",
            Token::BangEqEq => "!==",
            Token::Gt => ">",
            Token::Lt => "<",
            Token::GtEq => ">=",
            Token::LtEq => "<=",
            Token::AmpAmp => "&&",
            Token::PipePipe => "||",
            Token::Bang => "!",
            Token::Arrow => "=>",
            Token::Question => "?",
            Token::Colon => ":",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Dot => ".",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            _ => "token",
        };
        format!("`{}`", symbol)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
    /// A line break (possibly inside a comment) separates this token from the previous one.
    pub newline_before: bool,
}

/// Output of the lexer: tokens (always terminated by `Eof`), comments, and errors.
pub(crate) struct Lexed {
    pub tokens: Vec<Spanned>,
    pub comments: Vec<Comment>,
    pub errors: Vec<ParseError>,
}

// ---------------------------------------------------------------------------
// Tokenizer: source text → Token stream + comments
// ---------------------------------------------------------------------------

pub(crate) fn tokenize(source: &str, file_id: usize) -> Lexed {
    let chars: Vec<char> = source.chars().collect();
    let len = chars.len();

    // Map character indices to byte offsets within the source
    let byte_pos: Vec<usize> = {
        let mut bp = Vec::with_capacity(len + 1);
        let mut offset = 0;
        for c in &chars {
            bp.push(offset);
            offset += c.len_utf8();
        }
        bp.push(offset);
        bp
    };

    let at = |k: usize| chars.get(k).copied();

    let mut lexed = Lexed {
        tokens: Vec::new(),
        comments: Vec::new(),
        errors: Vec::new(),
    };
    let mut newline_before = false;
    let mut i = 0;

    while i < len {
        let c = chars[i];
        let start = i;

        let token = match c {
            '\n' => {
                newline_before = true;
                i += 1;
                continue;
            }
            ' ' | '\t' | '\r' => {
                i += 1;
                continue;
            }

            // Line comment
            '/' if at(i + 1) == Some('/') => {
                i += 2;
                let body_start = i;
                while i < len && chars[i] != '\n' {
                    i += 1;
                }
                lexed.comments.push(Comment {
                    kind: CommentKind::Line,
                    text: chars[body_start..i].iter().collect(),
                    span: byte_pos[start]..byte_pos[i],
                });
                continue;
            }

            // Block comment (no nesting)
            '/' if at(i + 1) == Some('*') => {
                i += 2;
                let body_start = i;
                let mut closed = false;
                while i < len {
                    if chars[i] == '*' && at(i + 1) == Some('/') {
                        closed = true;
                        break;
                    }
                    if chars[i] == '\n' {
                        newline_before = true;
                    }
                    i += 1;
                }
                let text: String = chars[body_start..i].iter().collect();
                if closed {
                    i += 2;
                    lexed.comments.push(Comment {
                        kind: CommentKind::Block,
                        text,
                        span: byte_pos[start]..byte_pos[i],
                    });
                } else {
                    lexed.errors.push(
                        ParseError::error(
                            "unterminated block comment",
                            byte_pos[start]..byte_pos[i],
                            file_id,
                        )
                        .with_note("block comments are closed with `*/`"),
                    );
                }
                continue;
            }

            // String literal
            '\'' | '"' => {
                let quote = c;
                i += 1;
                let mut value = String::new();
                let mut closed = false;
                while i < len {
                    let ch = chars[i];
                    if ch == quote {
                        closed = true;
                        i += 1;
                        break;
                    }
                    if ch == '\n' {
                        break;
                    }
                    if ch == '\\' && i + 1 < len {
                        value.push(match chars[i + 1] {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            '0' => '\0',
                            other => other,
                        });
                        i += 2;
                        continue;
                    }
                    value.push(ch);
                    i += 1;
                }
                if !closed {
                    lexed.errors.push(ParseError::error(
                        "unterminated string literal",
                        byte_pos[start]..byte_pos[i],
                        file_id,
                    ));
                    continue;
                }
                Token::Str(value)
            }

            // Numbers
            '0'..='9' => {
                while i < len && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if at(i) == Some('.') && at(i + 1).is_some_and(|d| d.is_ascii_digit()) {
                    i += 1;
                    while i < len && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                if matches!(at(i), Some('e') | Some('E')) {
                    let mut j = i + 1;
                    if matches!(at(j), Some('+') | Some('-')) {
                        j += 1;
                    }
                    if at(j).is_some_and(|d| d.is_ascii_digit()) {
                        i = j;
                        while i < len && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                match text.parse::<f64>() {
                    Ok(n) => Token::Number(n),
                    Err(_) => {
                        lexed.errors.push(ParseError::error(
                            format!("invalid number `{}`", text),
                            byte_pos[start]..byte_pos[i],
                            file_id,
                        ));
                        continue;
                    }
                }
            }

            // Identifiers and keywords
            c if is_ident_start(c) => {
                while i < len && is_ident_continue(chars[i]) {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                keyword(&ident).unwrap_or(Token::Ident(ident))
            }

            // Multi-character operators
            '=' => {
                i += 1;
                match at(i) {
                    Some('=') if at(i + 1) == Some('=') => {
                        i += 2;
                        Token::EqEqEq
                    }
                    Some('=') => {
                        i += 1;
                        Token::EqEq
                    }
                    Some('>') => {
                        i += 1;
                        Token::Arrow
                    }
                    _ => Token::Eq,
                }
            }
            '!' => {
                i += 1;
                match at(i) {
                    Some('=') if at(i + 1) == Some('=') => {
                        i += 2;
                        Token::BangEqEq
                    }
                    Some('=') => {
                        i += 1;
                        Token::BangEq
                    }
                    _ => Token::Bang,
                }
            }
            '<' | '>' => {
                i += 1;
                let or_equal = at(i) == Some('=');
                if or_equal {
                    i += 1;
                }
                match (c, or_equal) {
                    ('<', true) => Token::LtEq,
                    ('<', false) => Token::Lt,
                    (_, true) => Token::GtEq,
                    (_, false) => Token::Gt,
                }
            }
            '+' | '-' => {
                i += 1;
                match (c, at(i)) {
                    ('+', Some('+')) => {
                        i += 1;
                        Token::PlusPlus
                    }
                    ('+', Some('=')) => {
                        i += 1;
                        Token::PlusEq
                    }
                    ('+', _) => Token::Plus,
                    (_, Some('-')) => {
                        i += 1;
                        Token::MinusMinus
                    }
                    (_, Some('=')) => {
                        i += 1;
                        Token::MinusEq
                    }
                    _ => Token::Minus,
                }
            }
            '&' | '|' => {
                i += 1;
                if at(i) != Some(c) {
                    lexed.errors.push(
                        ParseError::error(
                            format!("unexpected character `{}`", c),
                            byte_pos[start]..byte_pos[i],
                            file_id,
                        )
                        .with_note(format!("did you mean `{}{}`?", c, c)),
                    );
                    continue;
                }
                i += 1;
                if c == '&' { Token::AmpAmp } else { Token::PipePipe }
            }

            // Single-character operators
            '*' => { i += 1; Token::Star }
            '/' => { i += 1; Token::Slash }
            '%' => { i += 1; Token::Percent }
            '?' => { i += 1; Token::Question }
            ':' => { i += 1; Token::Colon }
            ',' => { i += 1; Token::Comma }
            ';' => { i += 1; Token::Semicolon }
            '.' => { i += 1; Token::Dot }
            '(' => { i += 1; Token::LParen }
            ')' => { i += 1; Token::RParen }
            '{' => { i += 1; Token::LBrace }
            '}' => { i += 1; Token::RBrace }
            '[' => { i += 1; Token::LBracket }
            ']' => { i += 1; Token::RBracket }

            other => {
                i += 1;
                lexed.errors.push(ParseError::error(
                    format!("unexpected character `{}`", other),
                    byte_pos[start]..byte_pos[i],
                    file_id,
                ));
                continue;
            }
        };

        lexed.tokens.push(Spanned {
            token,
            span: byte_pos[start]..byte_pos[i],
            newline_before,
        });
        newline_before = false;
    }

    lexed.tokens.push(Spanned {
        token: Token::Eof,
        span: source.len()..source.len(),
        newline_before,
    });
    lexed
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn keyword(ident: &str) -> Option<Token> {
    let token = match ident {
        "var" => Token::Var,
        "let" => Token::Let,
        "const" => Token::Const,
        "function" => Token::Function,
        "return" => Token::Return,
        "if" => Token::If,
        "else" => Token::Else,
        "while" => Token::While,
        "for" => Token::For,
        "in" => Token::In,
        "break" => Token::Break,
        "continue" => Token::Continue,
        "throw" => Token::Throw,
        "true" => Token::True,
        "false" => Token::False,
        "null" => Token::Null,
        "undefined" => Token::Undefined,
        "typeof" => Token::TypeOf,
        _ => return None,
    };
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source, 0).tokens.into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn operators_prefer_longest_match() {
        assert_eq!(
            kinds("a === b !== c => d"),
            vec![
                Token::Ident("a".into()),
                Token::EqEqEq,
                Token::Ident("b".into()),
                Token::BangEqEq,
                Token::Ident("c".into()),
                Token::Arrow,
                Token::Ident("d".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_collected_not_tokenized() {
        let lexed = tokenize("/* block */ x // line\ny", 0);
        assert_eq!(lexed.comments.len(), 2);
        assert_eq!(lexed.comments[0].kind, CommentKind::Block);
        assert_eq!(lexed.comments[0].text, " block ");
        assert_eq!(lexed.comments[0].span, 0..11);
        assert_eq!(lexed.comments[1].kind, CommentKind::Line);
        assert_eq!(lexed.comments[1].text, " line");
        assert_eq!(lexed.tokens.len(), 3);
        assert!(lexed.tokens[1].newline_before);
    }

    #[test]
    fn newline_inside_block_comment_counts_as_line_break() {
        let lexed = tokenize("a /*\n*/ b", 0);
        assert!(lexed.tokens[1].newline_before);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\nb""#),
            vec![Token::Str("it's".into()), Token::Str("a\nb".into()), Token::Eof]
        );
    }

    #[test]
    fn numbers_with_fraction_and_exponent() {
        assert_eq!(
            kinds("1 2.5 3e2 4."),
            vec![
                Token::Number(1.0),
                Token::Number(2.5),
                Token::Number(300.0),
                Token::Number(4.0),
                Token::Dot,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        let lexed = tokenize("x /* never closed", 0);
        assert_eq!(lexed.errors.len(), 1);
        assert_eq!(lexed.errors[0].message, "unterminated block comment");
        assert!(lexed.comments.is_empty());
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let lexed = tokenize("'abc\nx", 0);
        assert_eq!(lexed.errors.len(), 1);
        assert_eq!(lexed.errors[0].message, "unterminated string literal");
    }

    #[test]
    fn spans_are_byte_offsets() {
        let lexed = tokenize("'é' x", 0);
        assert_eq!(lexed.tokens[0].span, 0..4);
        assert_eq!(lexed.tokens[1].span, 5..6);
    }
}

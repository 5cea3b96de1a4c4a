//! Lexer for `OpenQASM` 2.

use logos::Logos;

/// Tokens for `OpenQASM` 2.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qreg")]
    Qreg,

    #[token("creg")]
    Creg,

    #[token("if")]
    If,

    #[token("pi")]
    Pi,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    IntLiteral(u64),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len()-1].to_string())
    })]
    StringLiteral(String),

    // Identifiers (gate mnemonics, register names, functions)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("^")]
    Caret,

    #[token("==")]
    EqEq,

    #[token("->")]
    Arrow,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenQasm => write!(f, "OPENQASM"),
            Token::Include => write!(f, "include"),
            Token::Qreg => write!(f, "qreg"),
            Token::Creg => write!(f, "creg"),
            Token::If => write!(f, "if"),
            Token::Pi => write!(f, "pi"),
            Token::FloatLiteral(v) => write!(f, "{v}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::EqEq => write!(f, "=="),
            Token::Arrow => write!(f, "->"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// Tokenize one line of source.
pub fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(token),
            Err(()) => {
                let slice = &source[lexer.span()];
                return Err(format!("Invalid token: '{slice}'"));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_tokens() {
        let tokens = tokenize("OPENQASM 2.0;").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::OpenQasm);
        assert!(matches!(tokens[1], Token::FloatLiteral(v) if (v - 2.0).abs() < 1e-12));
        assert_eq!(tokens[2], Token::Semicolon);
    }

    #[test]
    fn test_register_declaration() {
        let tokens = tokenize("qreg q[4];").unwrap();
        assert_eq!(tokens[0], Token::Qreg);
        assert!(matches!(tokens[1], Token::Identifier(ref s) if s == "q"));
        assert_eq!(tokens[2], Token::LBracket);
        assert_eq!(tokens[3], Token::IntLiteral(4));
        assert_eq!(tokens[4], Token::RBracket);
        assert_eq!(tokens[5], Token::Semicolon);
    }

    #[test]
    fn test_parameterized_gate() {
        let tokens = tokenize("crz(-pi/2) q[1],q[0];").unwrap();
        assert!(matches!(tokens[0], Token::Identifier(ref s) if s == "crz"));
        assert_eq!(tokens[1], Token::LParen);
        assert_eq!(tokens[2], Token::Minus);
        assert_eq!(tokens[3], Token::Pi);
        assert_eq!(tokens[4], Token::Slash);
    }

    #[test]
    fn test_scientific_literal() {
        let tokens = tokenize("rx(1.5e-7) q[0];").unwrap();
        assert!(matches!(tokens[2], Token::FloatLiteral(v) if (v - 1.5e-7).abs() < 1e-20));
        let tokens = tokenize("rx(2e3) q[0];").unwrap();
        assert!(matches!(tokens[2], Token::FloatLiteral(v) if (v - 2000.0).abs() < 1e-9));
    }

    #[test]
    fn test_measure_arrow_and_comment() {
        let tokens = tokenize("measure q[0] -> c[0]; // readout").unwrap();
        assert_eq!(tokens.len(), 11);
        assert_eq!(tokens[5], Token::Arrow);
    }

    #[test]
    fn test_invalid_token() {
        assert!(tokenize("h q[0]; $").is_err());
    }
}

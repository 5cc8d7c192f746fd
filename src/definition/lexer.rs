//! Lexer for block definition messages using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    /// `%N`, a reference to the N-th argument
    #[regex(r"%[0-9]+", |lex| lex.slice()[1..].parse::<usize>().ok())]
    Placeholder(usize),

    /// `%%`, a literal percent sign
    #[token("%%")]
    Percent,

    /// A run of label text
    #[regex(r"[^%\s]+", |lex| lex.slice().to_string())]
    Word(String),

    /// Input the lexer could not classify, such as a lone `%`
    Stray(String),
}

/// Tokenize a message. Unrecognised input becomes a [`Token::Stray`] so the
/// parser can report it with a span.
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .map(move |(tok, span)| match tok {
            Ok(tok) => (tok, span),
            Err(()) => (Token::Stray(input[span.clone()].to_string()), span),
        })
}

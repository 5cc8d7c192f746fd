//! Message parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::MessageError;

use super::lexer::{lex, Token};
use super::message::{Message, MessagePart, Spanned};

/// Parse message source into its text and argument parts
pub fn parse_message(input: &str) -> Result<Message, Vec<MessageError>> {
    let len = input.len();

    let token_iter = lex(input).map(|(tok, span)| (tok, span.into()));

    // Split (Token, SimpleSpan) into token and span parts
    let token_stream = Stream::from_iter(token_iter).map((len..len).into(), |(t, s): (_, _)| (t, s));

    message_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn message_parser<'a, I>() -> impl Parser<'a, I, Message, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let word = select! {
        Token::Word(w) => w,
        Token::Percent => "%".to_string(),
    };

    let text = word
        .repeated()
        .at_least(1)
        .collect::<Vec<String>>()
        .map_with(|words, e| {
            Spanned::new(MessagePart::Text(words.join(" ")), span_range(&e.span()))
        });

    let arg = select! {
        Token::Placeholder(n) => MessagePart::Arg(n),
    }
    .map_with(|part, e| Spanned::new(part, span_range(&e.span())));

    choice((text, arg))
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|parts| Message { parts })
}

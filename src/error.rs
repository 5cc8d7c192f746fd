//! Error types for block definitions

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::definition::lexer::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Problems found in a single definition message
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MessageError {
    #[error("Syntax error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },

    #[error("Argument %{index} is out of range (the block declares {count})")]
    ArgumentOutOfRange {
        index: usize,
        count: usize,
        span: Span,
    },

    #[error("Argument %{index} is referenced more than once")]
    DuplicateArgument { index: usize, span: Span },

    #[error("Argument %{index} is never referenced")]
    UnusedArgument { index: usize },
}

impl MessageError {
    /// Source location of the error, if it points at a token
    pub fn span(&self) -> Option<&Span> {
        match self {
            MessageError::Syntax { span, .. }
            | MessageError::ArgumentOutOfRange { span, .. }
            | MessageError::DuplicateArgument { span, .. } => Some(span),
            MessageError::UnusedArgument { .. } => None,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let span = self.span().cloned().unwrap_or(0..source.len());
        let label = match self {
            MessageError::Syntax {
                message, expected, ..
            } => {
                if expected.is_empty() {
                    message.clone()
                } else {
                    format!("{}\nExpected: {}", message, expected.join(", "))
                }
            }
            other => other.to_string(),
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(label)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for MessageError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of message".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of message".to_string()),
                _ => None,
            })
            .collect();

        MessageError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Word(w) => format!("text '{}'", w),
        Token::Placeholder(n) => format!("argument %{}", n),
        Token::Percent => "'%%'".to_string(),
        Token::Stray(s) => format!("stray '{}'", s),
    }
}

/// Errors raised while loading or validating block definitions
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("block '{block}' has an invalid message: {}", format_message_errors(.errors))]
    InvalidMessage {
        block: String,
        message: String,
        errors: Vec<MessageError>,
    },

    #[error("block '{0}' cannot have both an output and a previous connection")]
    OutputAndPrevious(String),

    #[error("block '{block}' declares input '{input}' more than once")]
    DuplicateInput { block: String, input: String },

    #[error("block '{0}' is defined more than once")]
    Duplicate(String),

    #[error("Failed to read block definitions: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse block definitions TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DefinitionError {
    /// Render the error for a terminal, with ariadne context for message errors
    pub fn report(&self) -> String {
        match self {
            DefinitionError::InvalidMessage {
                block,
                message,
                errors,
            } => errors
                .iter()
                .map(|e| e.format(message, block))
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        }
    }
}

fn format_message_errors(errors: &[MessageError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

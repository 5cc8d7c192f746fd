//! Parsed block messages

use crate::error::MessageError;

pub use super::lexer::Span;

/// Message node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// One piece of a message
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePart {
    /// Label text; adjacent words are joined with single spaces
    Text(String),
    /// One-based reference to an argument
    Arg(usize),
}

/// A parsed message such as `repeat %1 %2`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    pub parts: Vec<Spanned<MessagePart>>,
}

impl Message {
    /// Parse message source text
    pub fn parse(source: &str) -> Result<Self, Vec<MessageError>> {
        super::grammar::parse_message(source)
    }

    /// Check that every argument in `1..=arg_count` is referenced exactly once
    pub fn validate(&self, arg_count: usize) -> Result<(), Vec<MessageError>> {
        let mut seen = vec![false; arg_count];
        let mut errors = Vec::new();

        for part in &self.parts {
            let MessagePart::Arg(index) = part.node else {
                continue;
            };
            if index == 0 || index > arg_count {
                errors.push(MessageError::ArgumentOutOfRange {
                    index,
                    count: arg_count,
                    span: part.span.clone(),
                });
            } else if seen[index - 1] {
                errors.push(MessageError::DuplicateArgument {
                    index,
                    span: part.span.clone(),
                });
            } else {
                seen[index - 1] = true;
            }
        }

        for (i, used) in seen.iter().enumerate() {
            if !used {
                errors.push(MessageError::UnusedArgument { index: i + 1 });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_each_argument_once() {
        let message = Message::parse("if %1 then %2").unwrap();
        assert!(message.validate(2).is_ok());
    }

    #[test]
    fn test_validate_reports_out_of_range() {
        let message = Message::parse("say %3").unwrap();
        let errors = message.validate(1).unwrap_err();
        assert!(errors.contains(&MessageError::ArgumentOutOfRange {
            index: 3,
            count: 1,
            span: 4..6,
        }));
        assert!(errors.contains(&MessageError::UnusedArgument { index: 1 }));
    }

    #[test]
    fn test_validate_reports_duplicates() {
        let message = Message::parse("%1 and %1").unwrap();
        let errors = message.validate(1).unwrap_err();
        assert_eq!(
            errors,
            vec![MessageError::DuplicateArgument {
                index: 1,
                span: 7..9,
            }]
        );
    }

    #[test]
    fn test_zero_is_out_of_range() {
        let message = Message::parse("%0").unwrap();
        let errors = message.validate(0).unwrap_err();
        assert!(matches!(
            errors[0],
            MessageError::ArgumentOutOfRange { index: 0, .. }
        ));
    }
}

//! # Tokenizer
//!
//! Quote-aware splitting of one extraction line into fields, following
//! POSIX shell word rules:
//!
//! - Unquoted whitespace separates fields
//! - `'...'` is taken literally
//! - `"..."` allows only `\"` and `\\` escapes; any other backslash is
//!   kept as written, so `"x\$y"` stays `x\$y`
//! - An unquoted backslash escapes the next character
//! - Adjacent quoted and unquoted parts join into one field
//!
//! The tokenizer knows nothing about directives; the parser assigns meaning.

use thiserror::Error;

/// Reasons a line cannot be split into fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("no closing {0} quotation")]
    UnclosedQuote(char),

    #[error("no character after trailing backslash")]
    TrailingEscape,
}

#[derive(Clone, Copy)]
enum State {
    Between,
    Word,
    Single,
    Double,
}

/// Split `input` into fields.
pub fn tokenize(input: &str) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut state = State::Between;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        state = match (state, c) {
            (State::Between | State::Word, '\'') => State::Single,
            (State::Between | State::Word, '"') => State::Double,
            (State::Between | State::Word, '\\') => {
                current.push(chars.next().ok_or(TokenizeError::TrailingEscape)?);
                State::Word
            }
            (State::Between, c) if c.is_whitespace() => State::Between,
            (State::Word, c) if c.is_whitespace() => {
                tokens.push(std::mem::take(&mut current));
                State::Between
            }
            (State::Between | State::Word, c) => {
                current.push(c);
                State::Word
            }
            (State::Single, '\'') => State::Word,
            (State::Single, c) => {
                current.push(c);
                State::Single
            }
            (State::Double, '"') => State::Word,
            (State::Double, '\\') => {
                match chars.peek().copied() {
                    Some(next @ ('"' | '\\')) => {
                        current.push(next);
                        chars.next();
                    }
                    _ => current.push('\\'),
                }
                State::Double
            }
            (State::Double, c) => {
                current.push(c);
                State::Double
            }
        };
    }

    match state {
        State::Between => {}
        State::Word => tokens.push(current),
        State::Single => return Err(TokenizeError::UnclosedQuote('\'')),
        State::Double => return Err(TokenizeError::UnclosedQuote('"')),
    }
    Ok(tokens)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn split(s: &str) -> Vec<String> {
        tokenize(s).expect("tokenize")
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(split("entity  person:a\tx"), vec!["entity", "person:a", "x"]);
    }

    #[test]
    fn empty_and_blank_lines_have_no_tokens() {
        assert!(split("").is_empty());
        assert!(split("   \t ").is_empty());
    }

    #[test]
    fn double_quotes_group_words() {
        assert_eq!(
            split(r#"property person:x name:x "xawery zulawski""#),
            vec!["property", "person:x", "name:x", "xawery zulawski"]
        );
    }

    #[test]
    fn single_quotes_are_literal() {
        assert_eq!(split(r#"a 'b \"c' d"#), vec!["a", r#"b \"c"#, "d"]);
    }

    #[test]
    fn escapes_inside_double_quotes() {
        assert_eq!(split(r#""say \"hi\"""#), vec![r#"say "hi""#]);
        assert_eq!(split(r#""a\\b""#), vec![r"a\b"]);
        assert_eq!(split(r#""a\nb""#), vec![r"a\nb"]);
    }

    #[test]
    fn dollar_and_backtick_keep_their_backslash_in_double_quotes() {
        assert_eq!(split(r#""x\$y""#), vec![r"x\$y"]);
        assert_eq!(split(r#""run \`ls\`""#), vec![r"run \`ls\`"]);
    }

    #[test]
    fn backslash_escapes_outside_quotes() {
        assert_eq!(split(r"new\ york x"), vec!["new york", "x"]);
    }

    #[test]
    fn adjacent_parts_join() {
        assert_eq!(split(r#"ab"c d"'e'"#), vec!["abc de"]);
    }

    #[test]
    fn empty_quotes_make_empty_token() {
        assert_eq!(split(r#"a "" b"#), vec!["a", "", "b"]);
    }

    #[test]
    fn unicode_passes_through() {
        assert_eq!(split("entity miasto:łódź"), vec!["entity", "miasto:łódź"]);
    }

    #[test]
    fn unclosed_quotes_fail() {
        assert_eq!(tokenize(r#"a "b c"#), Err(TokenizeError::UnclosedQuote('"')));
        assert_eq!(tokenize("a 'b c"), Err(TokenizeError::UnclosedQuote('\'')));
    }

    #[test]
    fn trailing_backslash_fails() {
        assert_eq!(tokenize(r"a b\"), Err(TokenizeError::TrailingEscape));
    }
}

use crate::error::{self, CompileError, ErrorKind};
use crate::lang::source_buffer::{Input, SourceLocation};
use std::fmt::{self, Display, Formatter};

/// A lexeme together with the place it was found.  Tokens are value types; they are compared
/// against string literals throughout the compiler (`token.is("if")`) rather than through a
/// dedicated keyword enumeration, since the set of recognized words is open ended and depends on
/// which state the compiler is in when the token is read.
#[derive(Clone, Debug)]
pub struct Token {
    pub text: String,
    pub location: SourceLocation,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl Token {
    pub fn new(location: SourceLocation, text: String) -> Token {
        Token { location, text }
    }

    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.text.ends_with(suffix)
    }
}

/// Replace `-` with `_` and `?` with `_is_`, turning an arbitrary source identifier into a valid
/// assembler label.  Idempotent: `canon(canon(x)) == canon(x)`, since neither substitution
/// introduces a `-` or a `?` into its output.
pub fn canon(name: &str) -> String {
    name.replace('-', "_").replace('?', "_is_")
}

/// Does this token's text look like a numeric literal?  Anchored at the start: an optional
/// leading `-`, then either decimal digits or `$` followed by hex digits.
pub fn is_number(text: &str) -> bool {
    parse_number(text).is_some()
}

/// Parse a token's text as a number per the grammar in spec.md §4.2.  Returns `None` if the text
/// isn't a valid literal, in which case the caller falls back to dictionary lookup.
pub fn parse_number(text: &str) -> Option<i64> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    if rest.is_empty() {
        return None;
    }

    let value = if let Some(hex) = rest.strip_prefix('$') {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        i64::from_str_radix(hex, 16).ok()?
    } else {
        if !rest.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        rest.parse::<i64>().ok()?
    };

    Some(if negative { -value } else { value })
}

/// Read the next token from the input, skipping whitespace and comments as it goes.  Comments are
/// recognized only at the token level: `\` discards the remainder of the line, and `(` discards
/// tokens up to and including one whose text ends with `)`.  Returns `None` at end of stream.
pub fn next_token(input: &mut Input) -> error::Result<Option<Token>> {
    loop {
        input.skip_whitespace();

        if input.is_end_of_stream() {
            return Ok(None);
        }

        let (location, text) = input.next_raw_token().expect("checked not at end of stream");

        if text == "\\" {
            input.skip_to_end_of_line();
            continue;
        }

        if text.starts_with('(') {
            skip_paren_comment(input, &location)?;
            continue;
        }

        return Ok(Some(Token::new(location, text)));
    }
}

/// Discard tokens until one ending in `)` is found, per the `( ... )` comment form.  The opening
/// token has already been consumed by the caller; it is not required to end in `)` itself, since
/// a form like `( comment )` is itself a single already-closed token caught by the caller before
/// this function is ever reached.
fn skip_paren_comment(input: &mut Input, start: &SourceLocation) -> error::Result<()> {
    if input.peek().is_none() {
        return Ok(());
    }

    loop {
        match input.next_raw_token() {
            Some((_, text)) => {
                if text.ends_with(')') {
                    return Ok(());
                }
            }
            None => {
                return Err(CompileError::new(
                    Some(start.clone()),
                    ErrorKind::UnexpectedEndOfStream,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canon_replaces_dash_and_question_mark() {
        assert_eq!(canon("foo-bar"), "foo_bar");
        assert_eq!(canon("empty?"), "empty_is_");
        assert_eq!(canon("a-b?c"), "a_b_is_c");
    }

    #[test]
    fn canon_is_idempotent() {
        let name = "a-weird?name-";
        assert_eq!(canon(&canon(name)), canon(name));
    }

    #[test]
    fn parses_decimal_and_hex_numbers() {
        assert_eq!(parse_number("123"), Some(123));
        assert_eq!(parse_number("-123"), Some(-123));
        assert_eq!(parse_number("$230"), Some(0x230));
        assert_eq!(parse_number("-$10"), Some(-16));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("$"), None);
    }

    #[test]
    fn tokenizes_skipping_line_comments() {
        let mut input = Input::new("<test>", "foo \\ rest of line is gone\nbar");

        let first = next_token(&mut input).unwrap().unwrap();
        assert_eq!(first.text, "foo");

        let second = next_token(&mut input).unwrap().unwrap();
        assert_eq!(second.text, "bar");

        assert!(next_token(&mut input).unwrap().is_none());
    }

    #[test]
    fn tokenizes_skipping_paren_comments() {
        let mut input = Input::new("<test>", "foo ( this is a comment ) bar");

        let first = next_token(&mut input).unwrap().unwrap();
        assert_eq!(first.text, "foo");

        let second = next_token(&mut input).unwrap().unwrap();
        assert_eq!(second.text, "bar");
    }

    #[test]
    fn unterminated_paren_comment_is_an_error() {
        let mut input = Input::new("<test>", "foo ( unterminated");
        let _ = next_token(&mut input).unwrap();

        let err = next_token(&mut input).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedEndOfStream));
    }

    #[test]
    fn round_trip_through_concatenation() {
        let source = "alpha beta gamma";
        let mut input = Input::new("<test>", source);

        let mut tokens = Vec::new();
        while let Some(tok) = next_token(&mut input).unwrap() {
            tokens.push(tok.text);
        }

        let rejoined = tokens.join(" ");
        let mut reinput = Input::new("<test>", &rejoined);

        let mut retokens = Vec::new();
        while let Some(tok) = next_token(&mut reinput).unwrap() {
            retokens.push(tok.text);
        }

        assert_eq!(tokens, retokens);
    }
}

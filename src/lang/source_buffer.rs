use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

/// The location in the source code where a token, or an error, was found.  Used throughout the
/// compiler for error reporting.
///
/// This is a read-only structure.  Use the field accessor methods to get the values.
#[derive(Clone, PartialEq, PartialOrd, Eq)]
pub struct SourceLocation {
    /// Either the path to the file, or a description such as `<repl>`.
    path: String,

    /// The 1 based line number in the source code.
    line: usize,

    /// The 1 based column number in the source code.
    column: usize,
}

impl Hash for SourceLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.line.hash(state);
        self.column.hash(state);
    }
}

impl Display for SourceLocation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} ({}, {})", self.path, self.line, self.column)
    }
}

impl SourceLocation {
    pub fn new_from_path(path: &str) -> Self {
        SourceLocation {
            path: path.to_owned(),
            line: 1,
            column: 1,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

/// A forward-only cursor over a source file's text.  Tracks line/column as characters are
/// consumed, and supports marking an offset so a verbatim slice of the source can be recovered
/// later — used for quoted-text forms and inline assembly bodies, which are captured character
/// for character rather than tokenized.
///
/// Holds a reference to the original text; the text is expected to outlive the cursor.
pub struct Input<'a> {
    text: &'a str,
    chars: std::str::CharIndices<'a>,
    current: Option<(usize, char)>,
    location: SourceLocation,
    mark_start: usize,
    mark_end: usize,
}

impl<'a> Input<'a> {
    pub fn new(path: &str, text: &'a str) -> Self {
        Input {
            text,
            chars: text.char_indices(),
            current: None,
            location: SourceLocation::new_from_path(path),
            mark_start: 0,
            mark_end: 0,
        }
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn file_name(&self) -> &str {
        &self.location.path
    }

    /// True once every character of the source has been consumed.
    pub fn is_end_of_stream(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Look at the next character without consuming it.
    pub fn peek(&mut self) -> Option<char> {
        if self.current.is_none() {
            self.current = self.chars.next();
        }

        self.current.map(|(_, c)| c)
    }

    /// Consume and return the next character, advancing the line/column location.
    pub fn advance(&mut self) -> Option<char> {
        let next = match self.current.take() {
            Some(pair) => Some(pair),
            None => self.chars.next(),
        };

        if let Some((_, c)) = next {
            if c == '\n' {
                self.location.line += 1;
                self.location.column = 1;
            } else {
                self.location.column += 1;
            }
        }

        next.map(|(_, c)| c)
    }

    /// Byte offset of the next unread character, used for marking verbatim spans.
    fn next_offset(&mut self) -> usize {
        match self.current {
            Some((offset, _)) => offset,
            None => match self.chars.clone().next() {
                Some((offset, _)) => offset,
                None => self.text.len(),
            },
        }
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(next) = self.peek() {
            if !is_whitespace(next) {
                break;
            }

            self.advance();
        }
    }

    /// Discard characters through (and including) the next newline, or end of stream.
    pub fn skip_to_end_of_line(&mut self) {
        while let Some(next) = self.advance() {
            if next == '\n' {
                break;
            }
        }
    }

    /// Record the current position as the start of a verbatim span.
    pub fn mark_start(&mut self) {
        self.mark_start = self.next_offset();
    }

    /// Record the current position as the end of a verbatim span.
    pub fn mark_end(&mut self) {
        self.mark_end = self.next_offset();
    }

    /// The text between the last `mark_start` and `mark_end` calls.
    pub fn marked_slice(&self) -> &'a str {
        &self.text[self.mark_start..self.mark_end]
    }

    /// The byte offset of the next unread character.  Used together with `slice` to recover an
    /// exact verbatim span of source text — e.g. the body of a `[code] ... [end-code]` block, or
    /// a multi-token quoted string — without losing the original whitespace between tokens.
    pub fn mark(&mut self) -> usize {
        self.next_offset()
    }

    /// The source text between two offsets previously returned by `mark`.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[start..end]
    }

    /// Read and return the next maximal run of non-whitespace characters, along with the
    /// location of its first character.  Returns `None` at end of stream.
    pub fn next_raw_token(&mut self) -> Option<(SourceLocation, String)> {
        self.skip_whitespace();

        if self.peek().is_none() {
            return None;
        }

        let location = self.location.clone();
        let mut text = String::new();

        while let Some(next) = self.peek() {
            if is_whitespace(next) {
                break;
            }

            text.push(next);
            self.advance();
        }

        Some((location, text))
    }
}

fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\n'
}

/// Cursor over a single source file's text: line/column tracking, whitespace skipping, and
/// mark/marked-slice support for verbatim spans (quoted text, inline assembly bodies).
pub mod source_buffer;

/// The `Token` type and the free function that turns an `Input` cursor into a stream of tokens,
/// handling the two token-level comment forms along the way.
pub mod token;

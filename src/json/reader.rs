//! Incremental JSON reader.
//!
//! [`JsonTokenizer`] consumes the document as a sequence of text chunks
//! of any size and fires structural and value events at a
//! [`JsonHandler`]. State is a stack of contexts mirroring the writer's
//! plus a pending-token buffer re-evaluated per character, so a chunk
//! boundary can fall anywhere, including mid-token. [`JsonReader`]
//! wraps the tokenizer with a buffered file walk that honors handler
//! cancellation, which is what lets a caller read just the leading
//! metadata block of an arbitrarily large profile.

use super::handler::JsonHandler;
use crate::{Error, Result};
use std::io::Read;
use std::path::Path;

/// Read granularity for file-backed sources.
const READ_CHUNK_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextKind {
    Root,
    Array,
    Object,
}

/// One frame of the reader's context stack.
#[derive(Debug)]
struct ReaderContext {
    kind: ContextKind,
    /// Token text accumulated at this level, quotes included.
    pending: String,
}

impl ReaderContext {
    fn new(kind: ContextKind) -> Self {
        Self {
            kind,
            pending: String::new(),
        }
    }
}

/// Character-driven streaming tokenizer.
///
/// `tokenize` may be called as often as needed to feed the complete
/// document. Events are delivered to the owned handler; call
/// [`JsonTokenizer::into_handler`] to get it back.
pub struct JsonTokenizer<H: JsonHandler> {
    handler: H,
    stack: Vec<ReaderContext>,
    /// Inside a quoted run; structural characters are literal content.
    in_quotes: bool,
    /// The previous character was an unconsumed backslash.
    escaped: bool,
}

impl<H: JsonHandler> JsonTokenizer<H> {
    /// Creates a tokenizer delivering events to `handler`.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            stack: vec![ReaderContext::new(ContextKind::Root)],
            in_quotes: false,
            escaped: false,
        }
    }

    /// Consumes one chunk of document text. The chunk may have any
    /// size; a token or escape sequence may span chunks.
    ///
    /// Cancellation is polled per character, so a handler that cancels
    /// stops the stream promptly but may still see the current token
    /// complete.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedDocument`] for unclassifiable tokens
    /// or structural characters that close past the root, and
    /// propagates handler errors.
    pub fn tokenize(&mut self, chunk: &str) -> Result<()> {
        for c in chunk.chars() {
            if self.handler.should_cancel() {
                return Ok(());
            }
            self.consume(c)?;
        }
        Ok(())
    }

    /// Returns the handler, consuming the tokenizer.
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Gives access to the handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    fn consume(&mut self, c: char) -> Result<()> {
        // Inside a quoted run everything but the closing quote (and the
        // escape introducer) is literal content.
        if self.in_quotes {
            if self.escaped {
                self.escaped = false;
                self.pending().push(c);
            } else {
                match c {
                    '\\' => {
                        self.escaped = true;
                        self.pending().push(c);
                    }
                    '"' => {
                        self.in_quotes = false;
                        self.pending().push(c);
                    }
                    _ => self.pending().push(c),
                }
            }
            return Ok(());
        }

        match c {
            '"' => {
                self.in_quotes = true;
                self.pending().push(c);
            }
            '{' => {
                self.stack.push(ReaderContext::new(ContextKind::Object));
                self.handler.start_object()?;
            }
            '}' => {
                self.flush_pending_value()?;
                self.pop(ContextKind::Object)?;
                self.handler.end_object()?;
            }
            '[' => {
                self.stack.push(ReaderContext::new(ContextKind::Array));
                self.handler.start_array()?;
            }
            ']' => {
                self.flush_pending_value()?;
                self.pop(ContextKind::Array)?;
                self.handler.end_array()?;
            }
            ':' => self.flush_pending_name()?,
            ',' => self.flush_pending_value()?,
            _ => self.pending().push(c),
        }
        Ok(())
    }

    fn pending(&mut self) -> &mut String {
        // The root frame is never popped, so the stack is never empty.
        match self.stack.last_mut() {
            Some(ctx) => &mut ctx.pending,
            None => unreachable!("reader context stack is never empty"),
        }
    }

    fn pop(&mut self, expected: ContextKind) -> Result<()> {
        match self.stack.last().map(|c| c.kind) {
            Some(k) if k == expected => {
                self.stack.pop();
                Ok(())
            }
            Some(ContextKind::Root) | None => Err(Error::MalformedDocument(
                "closing bracket past the document root".to_string(),
            )),
            Some(other) => Err(Error::MalformedDocument(format!(
                "mismatched closing bracket: expected to close {expected:?}, found {other:?}"
            ))),
        }
    }

    /// Flushes the pending token as a field name. Names must be quoted
    /// strings.
    fn flush_pending_name(&mut self) -> Result<()> {
        let token = std::mem::take(self.pending());
        if is_complete_quoted(&token) {
            let name = unescape_string(&token[1..token.len() - 1])?;
            self.handler.name(&name)
        } else {
            Err(Error::MalformedDocument(format!(
                "field name is not a quoted string: {token:?}"
            )))
        }
    }

    /// Flushes the pending token as a value, if any. Empty pending
    /// tokens are normal between structural characters (for example
    /// after a closing brace).
    fn flush_pending_value(&mut self) -> Result<()> {
        let token = std::mem::take(self.pending());
        if token.is_empty() {
            return Ok(());
        }
        if is_complete_quoted(&token) {
            let value = unescape_string(&token[1..token.len() - 1])?;
            return self.handler.string_value(&value);
        }
        match token.as_str() {
            "true" => self.handler.bool_value(true),
            "false" => self.handler.bool_value(false),
            "null" => self.handler.null_value(),
            // Locale-fixed parse: decimal point, never a comma.
            _ => match token.parse::<f64>() {
                Ok(number) => self.handler.number_value(number),
                Err(_) => Err(Error::MalformedDocument(format!(
                    "cannot classify token: {token:?}"
                ))),
            },
        }
    }
}

/// Reads the four hex digits of a `\u` escape.
fn unicode_escape_code(chars: &mut std::str::Chars<'_>) -> Result<u32> {
    let code: String = chars.by_ref().take(4).collect();
    u32::from_str_radix(&code, 16)
        .map_err(|_| Error::MalformedDocument(format!("invalid unicode escape: \\u{code}")))
}

fn is_complete_quoted(token: &str) -> bool {
    token.len() >= 2 && token.starts_with('"') && token.ends_with('"')
}

/// Reverses the writer's escaping for quoted string content.
fn unescape_string(content: &str) -> Result<String> {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let number = unicode_escape_code(&mut chars)?;
                // A high surrogate must be followed by an escaped low
                // surrogate; the pair encodes one supplementary char.
                let decoded = if (0xD800..=0xDBFF).contains(&number) {
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(Error::MalformedDocument(format!(
                            "unpaired surrogate escape: \\u{number:04x}"
                        )));
                    }
                    let low = unicode_escape_code(&mut chars)?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(Error::MalformedDocument(format!(
                            "invalid low surrogate escape: \\u{low:04x}"
                        )));
                    }
                    let combined = 0x10000 + ((number - 0xD800) << 10) + (low - 0xDC00);
                    char::from_u32(combined)
                } else {
                    char::from_u32(number)
                };
                out.push(decoded.ok_or_else(|| {
                    Error::MalformedDocument(format!("invalid unicode escape: \\u{number:04x}"))
                })?);
            }
            other => {
                return Err(Error::MalformedDocument(format!(
                    "invalid escape sequence: \\{}",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}

/// Streaming document sources for the tokenizer.
pub struct JsonReader;

impl JsonReader {
    /// Reads a whole string through a tokenizer.
    ///
    /// # Errors
    ///
    /// Returns tokenizer or handler errors.
    pub fn read_str<H: JsonHandler>(text: &str, handler: H) -> Result<H> {
        let mut tokenizer = JsonTokenizer::new(handler);
        tokenizer.tokenize(text)?;
        Ok(tokenizer.into_handler())
    }

    /// Reads a file in bounded chunks, feeding the tokenizer until the
    /// document ends or the handler cancels.
    ///
    /// Cancellation is checked between chunks (and per character inside
    /// the tokenizer), so reading only the leading metadata block of a
    /// multi-megabyte file touches only its first few kilobytes.
    ///
    /// # Errors
    ///
    /// Returns an error for I/O failures, invalid UTF-8, malformed
    /// documents, or handler failures.
    pub fn read_file<H: JsonHandler>(path: &Path, handler: H) -> Result<H> {
        let mut file =
            std::fs::File::open(path).map_err(|e| Error::operation("open_profile_file", e))?;

        let mut tokenizer = JsonTokenizer::new(handler);
        let mut buffer = [0_u8; READ_CHUNK_SIZE];
        // Bytes of an incomplete UTF-8 sequence carried across chunks.
        let mut carry: Vec<u8> = Vec::new();

        loop {
            if tokenizer.handler().should_cancel() {
                break;
            }
            let read = file
                .read(&mut buffer)
                .map_err(|e| Error::operation("read_profile_file", e))?;
            if read == 0 {
                if carry.is_empty() {
                    break;
                }
                return Err(Error::MalformedDocument(
                    "file ends mid UTF-8 sequence".to_string(),
                ));
            }

            carry.extend_from_slice(&buffer[..read]);
            let valid_len = match std::str::from_utf8(&carry) {
                Ok(_) => carry.len(),
                Err(e) if e.error_len().is_none() => e.valid_up_to(),
                Err(_) => {
                    return Err(Error::MalformedDocument(
                        "file is not valid UTF-8".to_string(),
                    ));
                }
            };

            {
                // Safe to slice: valid_len is a UTF-8 boundary.
                let chunk = std::str::from_utf8(&carry[..valid_len])
                    .map_err(|_| Error::MalformedDocument("file is not valid UTF-8".to_string()))?;
                tokenizer.tokenize(chunk)?;
            }
            carry.drain(..valid_len);
        }

        Ok(tokenizer.into_handler())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::EchoHandler;

    fn round_trip(json: &str) {
        let handler = JsonReader::read_str(json, EchoHandler::new()).unwrap();
        assert_eq!(handler.into_json().unwrap(), json);
    }

    #[test]
    fn test_reads_empty_array() {
        round_trip("[]");
    }

    #[test]
    fn test_reads_array_with_objects() {
        round_trip("[{\"a\":\"bb\"}]");
        round_trip("[{\"a\":\"b\"},{\"c\":\"d\"}]");
    }

    #[test]
    fn test_reads_object_with_two_properties() {
        round_trip("{\"a\":\"b\",\"c\":\"d\"}");
    }

    #[test]
    fn test_reads_bool_and_number_values() {
        round_trip("{\"a\":true,\"c\":23}");
    }

    #[test]
    fn test_reads_epoch_millis_dates() {
        round_trip("{\"a\":1700000000000}");
    }

    #[test]
    fn test_reads_null_values() {
        round_trip("{\"a\":null,\"b\":null,\"c\":null,\"e\":null}");
    }

    #[test]
    fn test_reads_nested_structures() {
        round_trip("{\"a\":[\"a\",\"b\"]}");
        round_trip("{\"a\":{\"d\":42,\"a\":\"b\"}}");
        round_trip("{\"a\":{\"a\":123}}");
        round_trip("{\"a\":{\"a\":true}}");
        round_trip("{\"a\":{\"a\":false}}");
        round_trip("{\"a\":{\"a\":1.6}}");
        round_trip("{\"a\":[\"a\",\"b\",1,6]}");
        round_trip("{\"a\":{\"a\":[\"a\",\"b\"]}}");
        round_trip("{\"a\":{\"a\":[1,6]}}");
        round_trip("[{\"a\":1,\"c\":0},{\"b\":2}]");
    }

    #[test]
    fn test_reads_document_shaped_like_a_profile() {
        round_trip(
            "{\"m\":{\"a\":7,\"b\":\"o\",\"c\":\"1.0.0\",\"d\":\"s\"},\"u\":{\"d\":5},\"x\":{\"f\":6,\"k\":3}}",
        );
        round_trip("{\"a\":{\"b\":\"mi\",\"d\":[{\"u\":\"x\",\"v\":1,\"e\":2,\"s\":3}]}}");
    }

    #[test]
    fn test_structural_characters_inside_strings_are_literal() {
        round_trip("{\"a,:{}[]\":[\"t,:{}[]\"]}");
    }

    #[test]
    fn test_reads_empty_string_values() {
        round_trip("{\"a\":[\"\"]}");
    }

    #[test]
    fn test_reads_escaped_characters() {
        round_trip("{\"a\":[\"say \\\"hi\\\"\"]}");
        round_trip("{\"a\\\"b\":\"c\\\\d\\n\"}");
    }

    #[test]
    fn test_decodes_unicode_escapes() {
        assert_eq!(unescape_string("\\u0041\\u00e9").unwrap(), "Aé");
        // Supplementary characters arrive as surrogate pairs.
        assert_eq!(unescape_string("\\ud83d\\ude00").unwrap(), "\u{1f600}");
        assert_eq!(unescape_string("a\\ud83d\\ude00b").unwrap(), "a\u{1f600}b");
    }

    #[test]
    fn test_unpaired_surrogate_escape_is_malformed() {
        assert!(matches!(
            unescape_string("\\ud83d").unwrap_err(),
            Error::MalformedDocument(_)
        ));
        assert!(matches!(
            unescape_string("\\ud83d\\u0041").unwrap_err(),
            Error::MalformedDocument(_)
        ));
        // A lone low surrogate has no character to decode to.
        assert!(matches!(
            unescape_string("\\ude00").unwrap_err(),
            Error::MalformedDocument(_)
        ));
    }

    #[test]
    fn test_token_split_across_chunks() {
        let mut tokenizer = JsonTokenizer::new(EchoHandler::new());
        for chunk in ["{\"ab", "c\":12", "34,\"d\"", ":true}"] {
            tokenizer.tokenize(chunk).unwrap();
        }
        let json = tokenizer.into_handler().into_json().unwrap();
        assert_eq!(json, "{\"abc\":1234,\"d\":true}");
    }

    #[test]
    fn test_malformed_number_is_fatal() {
        let mut tokenizer = JsonTokenizer::new(EchoHandler::new());
        let err = tokenizer.tokenize("{\"a\":12x4,").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_closing_past_root_is_malformed() {
        let mut tokenizer = JsonTokenizer::new(EchoHandler::new());
        let err = tokenizer.tokenize("{\"a\":1}}").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_cancelling_handler_stops_the_stream() {
        struct CountAndCancel {
            names: usize,
        }
        impl JsonHandler for CountAndCancel {
            fn name(&mut self, _name: &str) -> Result<()> {
                self.names += 1;
                Ok(())
            }
            fn should_cancel(&self) -> bool {
                self.names >= 1
            }
        }

        let handler =
            JsonReader::read_str("{\"a\":1,\"b\":2,\"c\":3}", CountAndCancel { names: 0 }).unwrap();
        assert_eq!(handler.names, 1);
    }
}

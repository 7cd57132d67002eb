//! Hand-rolled streaming JSON codec.
//!
//! The codec is split into an incremental [`JsonWriter`] that emits a
//! document token by token, a character-driven [`JsonTokenizer`] that
//! turns arbitrary-sized text chunks back into structural and value
//! events, and the [`JsonHandler`] protocol those events are delivered
//! to. Writer and reader keep structurally identical context stacks, so
//! feeding the reader's events straight back into a writer reproduces
//! the input byte for byte.
//!
//! This is not a general JSON library: there is no whitespace tolerance
//! and no exponent literals. It exists so profile documents far larger
//! than memory can be produced and inspected as streams.

mod handler;
mod reader;
mod value;
mod writer;

pub use handler::{EchoHandler, JsonHandler};
pub use reader::{JsonReader, JsonTokenizer};
pub use value::{FieldMap, JsonValue, format_number};
pub use writer::JsonWriter;

//! Byte/text destinations for the streaming codec.

mod sink;

pub use sink::{FileSink, MemSink, OutputSink};

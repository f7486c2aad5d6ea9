//! Incremental decoding of `data:` framed reply streams
//!
//! Byte chunks go through a streaming UTF-8 decoder, are split into lines,
//! and each `data:` line is parsed into a [`Fragment`] that the
//! [`StreamConsumer`] folds into the message log.

pub mod consumer;
pub mod decoder;
pub mod frame;

pub use consumer::{ConsumeReport, StreamConsumer, StreamMode};
pub use decoder::{LineSplitter, Utf8StreamDecoder};
pub use frame::{parse_line, Fragment};

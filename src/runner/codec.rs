//! Line-framing codec for subprocess output streams.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] with a maximum line length so a
//! subprocess emitting an unterminated or enormous line cannot exhaust
//! server memory. Used as the codec parameter for
//! [`tokio_util::codec::FramedRead`] over a child's stdout or stderr pipe.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

use crate::{AppError, Result};

/// Maximum output line length accepted from a subprocess: 1 MiB.
///
/// Lines exceeding this limit cause [`OutputLineCodec::decode`] to return
/// [`AppError::Stream`] with `"line too long"` rather than allocating
/// unbounded memory for a single line.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Newline-delimited codec for subprocess output.
///
/// Each `\n`-terminated UTF-8 string is one output line. Oversized lines
/// yield [`AppError::Stream`]; underlying I/O failures map to
/// [`AppError::Io`].
#[derive(Debug)]
pub struct OutputLineCodec(LinesCodec);

impl OutputLineCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self(LinesCodec::new_with_max_length(MAX_LINE_BYTES))
    }
}

impl Default for OutputLineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for OutputLineCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode(src).map_err(map_codec_error)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode_eof(src).map_err(map_codec_error)
    }
}

fn map_codec_error(err: LinesCodecError) -> AppError {
    match err {
        LinesCodecError::MaxLineLengthExceeded => {
            AppError::Stream(format!("line too long: exceeded {MAX_LINE_BYTES} bytes"))
        }
        LinesCodecError::Io(io_err) => AppError::Io(io_err.to_string()),
    }
}

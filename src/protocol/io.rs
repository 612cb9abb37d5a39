use bytes::{Bytes, BytesMut};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec, LengthDelimitedCodecError};

use crate::error::{AppError, AppResult, TransportError};

/// Largest frame body accepted in either direction.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

pub type FrameReader = FramedRead<OwnedReadHalf, LengthDelimitedCodec>;
pub type FrameWriter = FramedWrite<OwnedWriteHalf, LengthDelimitedCodec>;

/// Codec for the master link: a 4-byte big-endian length, then the body.
#[must_use]
pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .big_endian()
        .max_frame_length(MAX_FRAME_BYTES)
        .new_codec()
}

#[must_use]
pub fn split_stream(stream: TcpStream) -> (FrameReader, FrameWriter) {
    let (read_half, write_half) = stream.into_split();
    (
        FramedRead::new(read_half, frame_codec()),
        FramedWrite::new(write_half, frame_codec()),
    )
}

/// Reads the next frame body.
///
/// # Errors
///
/// Returns an error when the connection is closed, the frame exceeds
/// [`MAX_FRAME_BYTES`], or the socket fails.
pub async fn read_frame(reader: &mut FrameReader) -> AppResult<BytesMut> {
    match reader.next().await {
        Some(Ok(frame)) => Ok(frame),
        Some(Err(err)) => Err(AppError::transport(map_frame_error(err, "read frame"))),
        None => Err(AppError::transport(TransportError::ConnectionClosed)),
    }
}

/// Writes one frame body and flushes it.
///
/// # Errors
///
/// Returns an error when the body is too large or the socket fails.
pub async fn write_frame(writer: &mut FrameWriter, body: Vec<u8>) -> AppResult<()> {
    writer
        .send(Bytes::from(body))
        .await
        .map_err(|err| AppError::transport(map_frame_error(err, "write frame")))
}

/// Flushes pending frames and shuts down the write half, so the master sees
/// end of stream.
///
/// # Errors
///
/// Returns an error when the socket fails while flushing or shutting down.
pub async fn close_writer(writer: &mut FrameWriter) -> AppResult<()> {
    SinkExt::<Bytes>::close(writer)
        .await
        .map_err(|err| AppError::transport(map_frame_error(err, "close master connection")))
}

fn map_frame_error(err: std::io::Error, context: &'static str) -> TransportError {
    let too_large = err
        .get_ref()
        .is_some_and(|inner| inner.is::<LengthDelimitedCodecError>());
    if too_large {
        return TransportError::FrameTooLarge {
            max_bytes: MAX_FRAME_BYTES,
        };
    }
    TransportError::Io {
        context,
        source: err,
    }
}

use super::dispatch::PartialDispatcher;
use super::messages::{PartialTranscript, StreamMessage};
use crate::error::{HoundifyError, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Decodes a newline-delimited voice search response.
///
/// Frame markers are skipped, partial transcripts go to the sink as they are
/// read, and the terminal result line is returned. Dropping the decoder
/// mid-stream (e.g. on cancellation) still closes the sink only after the
/// partials already read have been delivered.
pub struct ResponseDecoder {
    dispatcher: PartialDispatcher,
}

impl ResponseDecoder {
    /// Must be called within a tokio runtime; spawns the delivery task
    pub fn new(sink: mpsc::Sender<PartialTranscript>) -> Self {
        Self {
            dispatcher: PartialDispatcher::new(sink),
        }
    }

    /// Read until the terminal result or end of input.
    ///
    /// Without a terminal result line, the last non-blank message line is
    /// returned instead; an empty stream yields an empty body.
    pub async fn decode<R>(mut self, mut reader: R) -> Result<String>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();
        let mut last_line = String::new();

        let result = loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => {
                    debug!("Response stream ended without a terminal result");
                    break Ok(last_line);
                }
                Ok(_) => {}
                Err(e) => break Err(HoundifyError::StreamReadFailure(e)),
            }

            let text = String::from_utf8_lossy(&buf);
            let line = text.trim();
            trace!("{}", line);
            if line.is_empty() {
                continue;
            }

            match StreamMessage::classify(line) {
                StreamMessage::FrameLengthMarker(_) => continue,
                StreamMessage::PartialTranscript(partial) => {
                    self.dispatcher.dispatch(partial);
                }
                StreamMessage::TerminalResult(body) => break Ok(body),
                StreamMessage::Unrecognized => {}
            }
            last_line = line.to_string();
        };

        // Delivery continues after we return; the caller may only start draining then
        self.dispatcher.finish();
        result
    }
}

/// Decode `reader`, sending partial transcripts to `sink`
pub async fn decode_response<R>(reader: R, sink: mpsc::Sender<PartialTranscript>) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    ResponseDecoder::new(sink).decode(reader).await
}

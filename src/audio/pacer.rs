use anyhow::{Context, Result};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Writes audio into a pipe at a fixed pace to simulate live capture
#[derive(Debug, Clone)]
pub struct AudioPacer {
    /// Bytes written per tick
    pub chunk_size: usize,
    /// Delay between chunks
    pub interval: Duration,
}

impl AudioPacer {
    /// One chunk per second of audio
    pub fn real_time(bytes_per_sec: usize) -> Self {
        Self {
            chunk_size: bytes_per_sec.max(1),
            interval: Duration::from_secs(1),
        }
    }

    /// Start writing `audio` in the background.
    ///
    /// Returns the read half of the pipe, to be used as a voice request body,
    /// and a handle resolving to the number of bytes written. Writing stops
    /// at the end of `audio` or once `cancel` fires; either way the write
    /// half is closed so the request body ends.
    pub fn spawn(
        &self,
        audio: Vec<u8>,
        cancel: CancellationToken,
    ) -> (DuplexStream, JoinHandle<Result<usize>>) {
        let chunk_size = self.chunk_size.max(1);
        let interval = self.interval;
        let (mut writer, reader) = tokio::io::duplex(chunk_size);

        let handle = tokio::spawn(async move {
            let mut written = 0;

            for chunk in audio.chunks(chunk_size) {
                if cancel.is_cancelled() {
                    info!("Audio pacing cancelled after {} bytes", written);
                    break;
                }

                tokio::select! {
                    result = writer.write_all(chunk) => {
                        result.context("Failed to write audio chunk")?;
                    }
                    _ = cancel.cancelled() => {
                        info!("Audio pacing cancelled after {} bytes", written);
                        break;
                    }
                }
                written += chunk.len();
                debug!("Wrote {} of {} audio bytes", written, audio.len());

                if written < audio.len() {
                    tokio::select! {
                        _ = tokio::time::sleep(interval) => {}
                        _ = cancel.cancelled() => {}
                    }
                }
            }

            writer.shutdown().await.context("Failed to close audio pipe")?;
            Ok(written)
        });

        (reader, handle)
    }
}

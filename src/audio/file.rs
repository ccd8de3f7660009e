use anyhow::{Context, Result};
use hound::WavReader;
use std::io::Cursor;
use std::path::Path;
use tracing::info;

/// A WAV file loaded for upload, header included
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Raw file contents, sent to Houndify unchanged
    pub bytes: Vec<u8>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read contents of file {}", path.display()))?;

        let (spec, frames) = {
            let reader = WavReader::new(Cursor::new(&bytes))
                .context("Failed to open WAV file")?;
            (reader.spec(), reader.duration())
        };
        let duration_seconds = frames as f64 / spec.sample_rate as f64;

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} bytes",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            bytes.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            bytes,
        })
    }

    /// Bytes of audio per second of playback
    pub fn avg_bytes_per_sec(&self) -> usize {
        self.sample_rate as usize * self.channels as usize * (self.bits_per_sample as usize / 8)
    }
}

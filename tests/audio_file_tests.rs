// Integration tests for WAV loading and paced audio streaming
//
// WAV fixtures are generated into a temp directory with hound.

use anyhow::Result;
use houndify::audio::{AudioFile, AudioPacer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

fn write_test_wav(dir: &Path, sample_rate: u32, channels: u16, frames: u32) -> Result<PathBuf> {
    let path = dir.join("query.wav");
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec)?;
    for i in 0..frames * channels as u32 {
        writer.write_sample((i % 256) as i16)?;
    }
    writer.finalize()?;
    Ok(path)
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_test_wav(dir.path(), 16000, 1, 8000)?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.bits_per_sample, 16);
    assert!((audio.duration_seconds - 0.5).abs() < 1e-9);
    assert!(audio.path.contains("query.wav"));

    // Whole file including the header is kept for upload
    assert_eq!(audio.bytes, std::fs::read(&path)?);
    assert!(audio.bytes.starts_with(b"RIFF"));

    Ok(())
}

#[test]
fn test_audio_file_bytes_per_sec() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_test_wav(dir.path(), 8000, 2, 800)?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.avg_bytes_per_sec(), 8000 * 2 * 2);
    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let result = AudioFile::open("/nonexistent/path/to/audio.wav");
    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[test]
fn test_audio_file_not_wav() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("query.wav");
    std::fs::write(&path, b"definitely not a wav file")?;

    assert!(AudioFile::open(&path).is_err());
    Ok(())
}

#[test]
fn test_real_time_pacer() {
    let pacer = AudioPacer::real_time(32000);
    assert_eq!(pacer.chunk_size, 32000);
    assert_eq!(pacer.interval, Duration::from_secs(1));

    // Never a zero-sized chunk
    assert_eq!(AudioPacer::real_time(0).chunk_size, 1);
}

#[tokio::test]
async fn test_pacer_writes_everything() -> Result<()> {
    let audio: Vec<u8> = (0..=255).collect();
    let pacer = AudioPacer {
        chunk_size: 64,
        interval: Duration::from_millis(1),
    };

    let (mut pipe, handle) = pacer.spawn(audio.clone(), CancellationToken::new());

    let mut received = Vec::new();
    pipe.read_to_end(&mut received).await?;

    assert_eq!(received, audio);
    assert_eq!(handle.await??, audio.len());
    Ok(())
}

#[tokio::test]
async fn test_pacer_stops_on_cancel() -> Result<()> {
    let audio = vec![7u8; 100];
    let pacer = AudioPacer {
        chunk_size: 10,
        interval: Duration::from_secs(60),
    };
    let cancel = CancellationToken::new();

    let (mut pipe, handle) = pacer.spawn(audio, cancel.clone());

    let mut first = [0u8; 10];
    pipe.read_exact(&mut first).await?;
    cancel.cancel();

    // The pipe closes without waiting out the interval
    let mut rest = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), pipe.read_to_end(&mut rest)).await??;

    assert!(rest.is_empty());
    assert_eq!(handle.await??, 10);
    Ok(())
}

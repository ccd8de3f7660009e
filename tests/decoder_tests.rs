// Tests for the streaming voice search response decoder
//
// The decoder reads from any AsyncBufRead, so byte slices and tokio duplex
// pipes stand in for the HTTP response body.

use houndify::stream::{decode_response, PartialTranscript, StreamMessage};
use houndify::HoundifyError;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWriteExt, BufReader, ReadBuf};
use tokio::sync::mpsc;

const PARTIAL_LINE: &str = r#"{"Format":"SoundHoundVoiceSearchParialTranscript","PartialTranscript":"what time","DurationMS":500,"Done":false}"#;
const RESULT_LINE: &str = r#"{"Format":"SoundHoundVoiceSearchResult","Status":"OK","NumToReturn":1,"AllResults":[{"WrittenResponseLong":"It is 3pm."}]}"#;

fn partial_line(text: &str, duration_ms: u64) -> String {
    format!(
        r#"{{"Format":"HoundVoiceQueryPartialTranscript","PartialTranscript":"{}","DurationMS":{},"Done":false}}"#,
        text, duration_ms
    )
}

async fn collect(mut rx: mpsc::Receiver<PartialTranscript>) -> Vec<PartialTranscript> {
    let mut received = Vec::new();
    while let Some(partial) = rx.recv().await {
        received.push(partial);
    }
    received
}

#[tokio::test]
async fn test_partial_then_result() {
    let input = format!("{}\n{}\n", PARTIAL_LINE, RESULT_LINE);
    let (tx, rx) = mpsc::channel(4);

    let body = decode_response(input.as_bytes(), tx).await.unwrap();
    let partials = collect(rx).await;

    assert_eq!(body, RESULT_LINE);
    assert_eq!(
        partials,
        vec![PartialTranscript {
            message: "what time".to_string(),
            duration: Duration::from_millis(500),
            done: false,
            safe_to_stop_audio: None,
        }]
    );
}

#[tokio::test]
async fn test_frame_markers_skipped() {
    let first = partial_line("what", 200);
    let input = format!(
        "{}\n{}\n\n{}\n{}\n",
        first.len(),
        first,
        RESULT_LINE.len(),
        RESULT_LINE
    );
    let (tx, rx) = mpsc::channel(4);

    let body = decode_response(input.as_bytes(), tx).await.unwrap();
    let partials = collect(rx).await;

    assert_eq!(body, RESULT_LINE);
    assert_eq!(partials.len(), 1);
    assert_eq!(partials[0].message, "what");
}

#[tokio::test]
async fn test_many_partials_delivered_in_order() {
    let mut input = String::new();
    for i in 0..50 {
        input.push_str(&partial_line(&format!("word {}", i), i * 10));
        input.push('\n');
    }
    input.push_str(RESULT_LINE);
    input.push('\n');

    // Capacity 1 forces the delivery task to wait on the consumer
    let (tx, rx) = mpsc::channel(1);
    let consumer = tokio::spawn(collect(rx));

    let body = decode_response(input.as_bytes(), tx).await.unwrap();
    let partials = consumer.await.unwrap();

    assert_eq!(body, RESULT_LINE);
    let messages: Vec<String> = partials.into_iter().map(|p| p.message).collect();
    let expected: Vec<String> = (0..50).map(|i| format!("word {}", i)).collect();
    assert_eq!(messages, expected);
}

#[tokio::test]
async fn test_consumer_may_start_after_decode_returns() {
    let mut input = String::new();
    for i in 0..10 {
        input.push_str(&partial_line(&format!("p{}", i), 100));
        input.push('\n');
    }
    input.push_str(RESULT_LINE);

    let (tx, rx) = mpsc::channel(1);
    let body = decode_response(input.as_bytes(), tx).await.unwrap();
    assert_eq!(body, RESULT_LINE);

    assert_eq!(collect(rx).await.len(), 10);
}

#[tokio::test]
async fn test_malformed_line_tolerated() {
    let input = format!(
        "{}\n{{\"Format\": broken\n{}\n{}\n",
        partial_line("first", 100),
        partial_line("second", 200),
        RESULT_LINE
    );
    let (tx, rx) = mpsc::channel(4);

    let body = decode_response(input.as_bytes(), tx).await.unwrap();
    let partials = collect(rx).await;

    assert_eq!(body, RESULT_LINE);
    let messages: Vec<&str> = partials.iter().map(|p| p.message.as_str()).collect();
    assert_eq!(messages, vec!["first", "second"]);
}

#[tokio::test]
async fn test_lines_after_result_ignored() {
    let input = format!("{}\n{}\n", RESULT_LINE, partial_line("late", 100));
    let (tx, rx) = mpsc::channel(4);

    let body = decode_response(input.as_bytes(), tx).await.unwrap();

    assert_eq!(body, RESULT_LINE);
    assert!(collect(rx).await.is_empty());
}

#[tokio::test]
async fn test_last_line_used_without_result_format() {
    let last = r#"{"Status":"OK","NumToReturn":1,"AllResults":[]}"#;
    let input = format!("{}\n{}\n42\n\n", partial_line("hi", 100), last);
    let (tx, rx) = mpsc::channel(4);

    let body = decode_response(input.as_bytes(), tx).await.unwrap();

    assert_eq!(body, last);
    assert_eq!(collect(rx).await.len(), 1);
}

#[tokio::test]
async fn test_final_line_without_newline() {
    let input = format!("{}\n{}", partial_line("hi", 100), RESULT_LINE);
    let (tx, _rx) = mpsc::channel(4);

    let body = decode_response(input.as_bytes(), tx).await.unwrap();
    assert_eq!(body, RESULT_LINE);
}

#[tokio::test]
async fn test_empty_stream() {
    let (tx, rx) = mpsc::channel(4);

    let body = decode_response(&b""[..], tx).await.unwrap();

    assert!(body.is_empty());
    assert!(collect(rx).await.is_empty());
}

#[tokio::test]
async fn test_safe_to_stop_audio_flag() {
    let input = concat!(
        r#"{"Format":"HoundVoiceQueryPartialTranscript","PartialTranscript":"stop","DurationMS":900,"Done":true,"SafeToStopAudio":true}"#,
        "\n"
    );
    let (tx, rx) = mpsc::channel(4);

    decode_response(input.as_bytes(), tx).await.unwrap();
    let partials = collect(rx).await;

    assert_eq!(partials.len(), 1);
    assert!(partials[0].done);
    assert_eq!(partials[0].safe_to_stop_audio, Some(true));
}

#[tokio::test]
async fn test_negative_duration_still_delivered() {
    let input = concat!(
        r#"{"Format":"HoundVoiceQueryPartialTranscript","PartialTranscript":"early","DurationMS":-20,"Done":false}"#,
        "\n"
    );
    let (tx, rx) = mpsc::channel(4);

    decode_response(input.as_bytes(), tx).await.unwrap();
    let partials = collect(rx).await;

    assert_eq!(partials.len(), 1);
    assert_eq!(partials[0].message, "early");
    assert_eq!(partials[0].duration, Duration::ZERO);
}

#[tokio::test]
async fn test_incremental_input() {
    let (mut writer, reader) = tokio::io::duplex(64);
    let (tx, mut rx) = mpsc::channel(4);

    let decoder = tokio::spawn(decode_response(BufReader::new(reader), tx));

    writer
        .write_all(format!("{}\n", partial_line("live", 300)).as_bytes())
        .await
        .unwrap();

    // Delivered while the response is still open
    let first = rx.recv().await.unwrap();
    assert_eq!(first.message, "live");

    // Terminal line split across writes
    let (head, tail) = RESULT_LINE.split_at(20);
    writer.write_all(head.as_bytes()).await.unwrap();
    writer.write_all(format!("{}\n", tail).as_bytes()).await.unwrap();

    let body = decoder.await.unwrap().unwrap();
    assert_eq!(body, RESULT_LINE);
    assert!(rx.recv().await.is_none());
}

struct FailingReader {
    sent: bool,
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if !self.sent {
            self.sent = true;
            buf.put_slice(format!("{}\n", partial_line("before error", 100)).as_bytes());
            Poll::Ready(Ok(()))
        } else {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")))
        }
    }
}

#[tokio::test]
async fn test_read_error_aborts() {
    let (tx, rx) = mpsc::channel(4);

    let result = decode_response(BufReader::new(FailingReader { sent: false }), tx).await;

    assert!(matches!(result, Err(HoundifyError::StreamReadFailure(_))));
    // Partials read before the error are still delivered before close
    assert_eq!(collect(rx).await.len(), 1);
}

#[test]
fn test_classify() {
    assert_eq!(StreamMessage::classify("1234"), StreamMessage::FrameLengthMarker(1234));
    assert_eq!(StreamMessage::classify("not json"), StreamMessage::Unrecognized);
    assert_eq!(
        StreamMessage::classify(r#"{"Format":"SomethingNew"}"#),
        StreamMessage::Unrecognized
    );
    assert_eq!(
        StreamMessage::classify(r#"{"NoFormat":true}"#),
        StreamMessage::Unrecognized
    );
    assert_eq!(
        StreamMessage::classify(RESULT_LINE),
        StreamMessage::TerminalResult(RESULT_LINE.to_string())
    );
    assert!(matches!(
        StreamMessage::classify(&partial_line("x", 1)),
        StreamMessage::PartialTranscript(_)
    ));
}

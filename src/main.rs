use anyhow::{Context, Result};
use clap::Parser;
use houndify::{
    parse_written_response, AudioFile, AudioPacer, Client, Config, HoundifyError, PartialTranscript,
    TextRequest, VoiceRequest,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};

#[derive(Debug, Parser)]
#[command(name = "houndify", about = "Send text and voice queries to Houndify")]
struct Args {
    /// Client ID (overrides HOUNDIFY_CLIENT_ID)
    #[arg(long)]
    id: Option<String>,

    /// Client key (overrides HOUNDIFY_CLIENT_KEY)
    #[arg(long)]
    key: Option<String>,

    /// Optional config file
    #[arg(long)]
    config: Option<String>,

    /// Audio file to use for a voice query
    #[arg(long)]
    voice: Option<String>,

    /// Message to use for a text query
    #[arg(long)]
    text: Option<String>,

    /// Text queries read line by line from stdin
    #[arg(long)]
    stdin: bool,

    /// Stream the audio file in real time, used with --voice
    #[arg(long)]
    stream: bool,

    /// Log raw server data
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::TRACE } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(id) = args.id.clone() {
        cfg.client_id = id;
    }
    if let Some(key) = args.key.clone() {
        cfg.client_key = key;
    }
    let user_id = cfg.user_id.clone();
    let mut client = cfg.into_client()?;

    match (&args.voice, &args.text) {
        (Some(path), _) if args.stream => stream_audio(&mut client, path, &user_id).await,
        (Some(path), _) => voice_query(&mut client, path, &user_id).await,
        (None, Some(query)) => text_query(&mut client, query, &user_id).await,
        (None, None) if args.stdin => stdin_queries(&mut client, &user_id).await,
        _ => anyhow::bail!("must choose either --voice, --text or --stdin"),
    }
}

/// Pseudo-random request ID so every request is signed differently
fn create_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string().to_uppercase()
}

async fn text_query(client: &mut Client, query: &str, user_id: &str) -> Result<()> {
    let request = TextRequest::new(query, user_id, create_request_id());
    let body = client
        .text_search(request)
        .await
        .map_err(with_body)
        .context("failed to make text request")?;
    println!("{}", written_response(&body)?);
    Ok(())
}

async fn voice_query(client: &mut Client, path: &str, user_id: &str) -> Result<()> {
    let audio = AudioFile::open(path)?;
    let request = VoiceRequest::from_bytes(audio.bytes, user_id, create_request_id());

    let (tx, rx) = mpsc::channel(16);
    let printer = print_partials(rx, None);

    let result = client.voice_search(request, tx).await;
    printer.await.context("partial transcript task failed")?;

    let body = result.map_err(with_body).context("failed to make voice request")?;
    println!("{}", written_response(&body)?);
    Ok(())
}

/// Write the file one second of audio per second, stopping early once the
/// server reports it has heard enough
async fn stream_audio(client: &mut Client, path: &str, user_id: &str) -> Result<()> {
    let audio = AudioFile::open(path)?;
    let pacer = AudioPacer::real_time(audio.avg_bytes_per_sec());
    let stop_audio = CancellationToken::new();
    let (pipe, writer) = pacer.spawn(audio.bytes, stop_audio.clone());

    let request = VoiceRequest::from_reader(pipe, user_id, create_request_id());

    let (tx, rx) = mpsc::channel(16);
    let printer = print_partials(rx, Some(stop_audio));

    let result = client.voice_search(request, tx).await;
    printer.await.context("partial transcript task failed")?;
    match writer.await {
        Ok(Ok(written)) => info!("Streamed {} audio bytes", written),
        Ok(Err(e)) => error!("Audio streaming stopped: {:#}", e),
        Err(e) => error!("Audio streaming task failed: {}", e),
    }

    let body = result.map_err(with_body).context("failed to make voice request")?;
    println!("{}", written_response(&body)?);
    Ok(())
}

/// Successive text queries, demonstrating conversation state
async fn stdin_queries(client: &mut Client, user_id: &str) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Enter a text query: ");

    while let Some(query) = lines.next_line().await? {
        let request = TextRequest::new(query, user_id, create_request_id());
        match client.text_search(request).await {
            Ok(body) => println!("{}\n", written_response(&body)?),
            Err(e) => error!("failed to make text request: {:#}", with_body(e)),
        }
        println!("Enter another text query:");
    }
    Ok(())
}

fn print_partials(
    mut rx: mpsc::Receiver<PartialTranscript>,
    stop_audio: Option<CancellationToken>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(partial) = rx.recv().await {
            if partial.safe_to_stop_audio == Some(true) {
                if let Some(token) = stop_audio.as_ref().filter(|t| !t.is_cancelled()) {
                    info!("Safe to stop audio received");
                    token.cancel();
                }
            }
            // Empty partials aren't useful to show
            if !partial.message.is_empty() {
                println!("{}", partial.message);
            }
        }
    })
}

fn written_response(body: &str) -> Result<String> {
    parse_written_response(body)
        .map_err(with_body)
        .context("failed to decode hound response")
}

/// Keep the server's body in the error so its diagnostic text is shown
fn with_body(err: HoundifyError) -> anyhow::Error {
    match err.body().map(str::to_string) {
        Some(body) => anyhow::Error::new(err).context(body),
        None => anyhow::Error::new(err),
    }
}

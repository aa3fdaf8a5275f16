//! Terminal chat UI: reads lines from stdin, relays them and prints the replies.

use anyhow::Context;
use chat_relay::{client::RelayClient, telemetry, transcript::Transcript};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Debug, Parser)]
#[command(name = "chat", about = "Talk to a running chat relay from the terminal")]
struct Args {
    /// Base URL of the relay server.
    #[arg(long, env = "RELAY_URL", default_value = "http://localhost:5000")]
    url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing("warn")?;
    let args = Args::parse();

    let client = RelayClient::new(&args.url).context("failed to build HTTP client")?;
    let mut transcript = Transcript::new();
    let mut stdout = tokio::io::stdout();

    for message in transcript.messages() {
        stdout.write_all(format!("{}\n", message.render()).as_bytes()).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let rendered = transcript.push_user(line.as_str()).render();
        stdout.write_all(format!("{rendered}\n").as_bytes()).await?;
        stdout.write_all(b"AI is thinking...\n").await?;
        stdout.flush().await?;

        let reply = client.send(&line).await;
        let rendered = transcript.push_bot(reply).render();
        stdout.write_all(format!("{rendered}\n").as_bytes()).await?;
    }

    Ok(())
}

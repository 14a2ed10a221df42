//! Sends one prompt to the chat endpoint and prints the streamed reply.
//!
//! Usage: `probe [--base <url>] <prompt>...`

use std::io::{self, Write};

use anyhow::bail;
use gemini_chat::{
    app_settings::ChatSettings,
    llm::{ChatClient, ChatRequest, stream_reply},
    session::ChatSession,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut settings = ChatSettings::default();
    let mut args = std::env::args().skip(1).peekable();
    if args.peek().map(|a| a.as_str()) == Some("--base") {
        args.next();
        let Some(base) = args.next() else {
            bail!("--base needs a URL");
        };
        settings.endpoint.api_base = base;
    }
    let prompt = args.collect::<Vec<_>>().join(" ");

    let mut session = ChatSession::new();
    session.set_input(prompt);
    let Some(request) = session.submit() else {
        bail!("usage: probe [--base <url>] <prompt>...");
    };

    let client = ChatClient::new(settings.endpoint.clone());
    let body = ChatRequest::new(&request.messages, &settings);
    let mut stdout = io::stdout();
    stream_reply(&client, &body, |delta| {
        print!("{delta}");
        let _ = stdout.flush();
    })
    .await?;
    println!();
    Ok(())
}

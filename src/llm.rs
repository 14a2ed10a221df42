//! HTTP transport for the chat endpoint.
//!
//! The endpoint receives the whole conversation on every turn together with
//! the generation and safety settings, and streams the assistant reply back.

use anyhow::{anyhow, bail};
use dioxus::logger::tracing::{debug, warn};
use futures::{
    StreamExt as _,
    stream::{self, LocalBoxStream},
};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::{
    app_settings::{ChatSettings, EndpointSettings, GeneralSettings, SafetySettings, StreamProtocol},
    session::{Message, Role},
};

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RequestMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<RequestMessage>,
    pub general_settings: GeneralSettings,
    pub safety_settings: SafetySettings,
}

impl ChatRequest {
    pub fn new(messages: &[Message], settings: &ChatSettings) -> Self {
        Self {
            messages: messages
                .iter()
                .map(|m| RequestMessage {
                    role: m.role,
                    content: m.content.clone(),
                })
                .collect(),
            general_settings: settings.general.clone(),
            safety_settings: settings.safety.clone(),
        }
    }
}

/// Turns raw body chunks into text deltas.
///
/// Multi-byte characters split across chunks are held back until complete.
/// In [`StreamProtocol::Data`] mode incomplete lines are buffered as well.
#[derive(Debug, Default)]
pub struct TextStreamDecoder {
    protocol: StreamProtocol,
    bytes: Vec<u8>,
    line: String,
}

impl TextStreamDecoder {
    pub fn new(protocol: StreamProtocol) -> Self {
        Self {
            protocol,
            ..Default::default()
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> anyhow::Result<String> {
        self.bytes.extend_from_slice(chunk);
        let cut = incomplete_tail_start(&self.bytes);
        let head: Vec<u8> = self.bytes.drain(..cut).collect();
        let text = String::from_utf8_lossy(&head).into_owned();
        self.decode(text, false)
    }

    pub fn finish(&mut self) -> anyhow::Result<String> {
        let rest = std::mem::take(&mut self.bytes);
        let text = String::from_utf8_lossy(&rest).into_owned();
        self.decode(text, true)
    }

    fn decode(&mut self, text: String, flush: bool) -> anyhow::Result<String> {
        match self.protocol {
            StreamProtocol::Text => Ok(text),
            StreamProtocol::Data => {
                self.line.push_str(&text);
                let mut out = String::new();
                while let Some(pos) = self.line.find('\n') {
                    let line: String = self.line.drain(..=pos).collect();
                    out.push_str(&parse_data_line(line.trim_end())?);
                }
                if flush {
                    let line = std::mem::take(&mut self.line);
                    out.push_str(&parse_data_line(line.trim_end())?);
                }
                Ok(out)
            }
        }
    }
}

/// Index where a truncated trailing UTF-8 sequence starts, or the buffer length.
/// Invalid sequences before it are left for lossy decoding.
fn incomplete_tail_start(bytes: &[u8]) -> usize {
    let mut offset = 0;
    loop {
        match std::str::from_utf8(&bytes[offset..]) {
            Ok(_) => return bytes.len(),
            Err(e) => match e.error_len() {
                Some(len) => offset += e.valid_up_to() + len,
                None => return offset + e.valid_up_to(),
            },
        }
    }
}

fn parse_data_line(line: &str) -> anyhow::Result<String> {
    if line.is_empty() {
        return Ok(String::new());
    }
    let Some((code, payload)) = line.split_once(':') else {
        warn!("Skipping malformed stream line: {line}");
        return Ok(String::new());
    };
    match code {
        "0" => Ok(serde_json::from_str::<String>(payload)?),
        "3" => {
            let msg = match serde_json::from_str::<Value>(payload)? {
                Value::String(s) => s,
                v => v.to_string(),
            };
            bail!("endpoint reported an error: {msg}")
        }
        _ => {
            debug!("Ignoring stream part {code}");
            Ok(String::new())
        }
    }
}

pub struct ChatClient {
    endpoint: EndpointSettings,
    client: Client,
}

impl ChatClient {
    pub fn new(endpoint: EndpointSettings) -> Self {
        Self {
            endpoint,
            client: Client::new(),
        }
    }

    pub fn endpoint_url(&self) -> String {
        let base = self.endpoint.api_base.trim_end_matches('/');
        let path = self.endpoint.api_path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Posts the request and returns the decoded reply as a stream of text deltas.
    pub async fn stream(
        &self,
        request: &ChatRequest,
    ) -> anyhow::Result<LocalBoxStream<'static, anyhow::Result<String>>> {
        let url = self.endpoint_url();
        debug!("POST {url} with {} messages", request.messages.len());
        let res = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("Request failed: {status} - {body}"));
        }

        let decoder = TextStreamDecoder::new(self.endpoint.protocol);
        let body = res.bytes_stream().map(Some).chain(stream::iter([None]));
        let deltas = body
            .scan(decoder, |decoder, item| {
                let out = match item {
                    Some(Ok(chunk)) => decoder.push(&chunk),
                    Some(Err(e)) => Err(e.into()),
                    None => decoder.finish(),
                };
                futures::future::ready(Some(out))
            })
            .filter(|r| futures::future::ready(!matches!(r, Ok(s) if s.is_empty())));
        Ok(deltas.boxed_local())
    }
}

/// Drives a reply stream to completion, handing each text delta to `on_delta`.
pub async fn stream_reply<F>(
    client: &ChatClient,
    request: &ChatRequest,
    mut on_delta: F,
) -> anyhow::Result<()>
where
    F: FnMut(&str),
{
    let mut stream = client.stream(request).await?;
    while let Some(delta) = stream.next().await {
        on_delta(&delta?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        sync::oneshot,
    };

    use super::*;
    use crate::app_settings::HarmBlockThreshold;

    #[test]
    fn request_body_carries_history_and_settings_verbatim() {
        let messages = vec![
            Message {
                id: "msg-0".into(),
                role: Role::User,
                content: "hi".into(),
            },
            Message {
                id: "msg-1".into(),
                role: Role::Assistant,
                content: "hello".into(),
            },
        ];
        let mut settings = ChatSettings::default();
        settings.safety.harassment = HarmBlockThreshold::BlockNone;
        let body = serde_json::to_value(ChatRequest::new(&messages, &settings)).unwrap();

        assert_eq!(
            body["messages"],
            json!([{"role": "user", "content": "hi"}, {"role": "assistant", "content": "hello"}])
        );
        assert_eq!(body["general_settings"], serde_json::to_value(&settings.general).unwrap());
        assert_eq!(body["safety_settings"]["harassment"], "BLOCK_NONE");
    }

    #[test]
    fn endpoint_url_joins_with_single_slash() {
        let mut endpoint = EndpointSettings::default();
        endpoint.api_base = "http://localhost:3000/".into();
        assert_eq!(
            ChatClient::new(endpoint).endpoint_url(),
            "http://localhost:3000/api/gemini-pro"
        );
    }

    #[test]
    fn text_decoder_holds_back_split_characters() {
        let mut d = TextStreamDecoder::new(StreamProtocol::Text);
        let bytes = "né".as_bytes();
        assert_eq!(d.push(&bytes[..2]).unwrap(), "n");
        assert_eq!(d.push(&bytes[2..]).unwrap(), "é");
        assert_eq!(d.finish().unwrap(), "");
    }

    #[test]
    fn text_decoder_replaces_invalid_bytes_without_delaying_the_rest() {
        let mut d = TextStreamDecoder::new(StreamProtocol::Text);
        assert_eq!(d.push(b"a\xFFbc").unwrap(), "a\u{FFFD}bc");
        assert_eq!(d.push(b"x\xFEy\xFFz").unwrap(), "x\u{FFFD}y\u{FFFD}z");
        assert_eq!(d.finish().unwrap(), "");
    }

    #[test]
    fn text_decoder_holds_back_split_character_after_invalid_byte() {
        let mut d = TextStreamDecoder::new(StreamProtocol::Text);
        assert_eq!(d.push(b"a\xFFb\xC3").unwrap(), "a\u{FFFD}b");
        assert_eq!(d.push(b"\xA9").unwrap(), "\u{e9}");
    }

    #[test]
    fn data_decoder_parses_text_parts_across_chunks() {
        let mut d = TextStreamDecoder::new(StreamProtocol::Data);
        assert_eq!(d.push(b"0:\"Hel").unwrap(), "");
        assert_eq!(d.push(b"lo\"\n2:[{}]\n0:\" wor").unwrap(), "Hello");
        assert_eq!(d.push(b"ld\"").unwrap(), "");
        assert_eq!(d.finish().unwrap(), " world");
    }

    #[test]
    fn data_decoder_surfaces_error_parts() {
        let mut d = TextStreamDecoder::new(StreamProtocol::Data);
        let err = d.push(b"3:\"quota exceeded\"\n").unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    /// Serves one canned HTTP response and hands back the raw request it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64 * 1024];
            let mut req = Vec::new();
            loop {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                req.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&req).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let len = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let l = l.to_ascii_lowercase();
                            l.strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if req.len() >= head_end + 4 + len {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: text/plain; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&req).to_string());
        });
        (format!("http://{addr}"), rx)
    }

    fn client_for(base: String, protocol: StreamProtocol) -> ChatClient {
        ChatClient::new(EndpointSettings {
            api_base: base,
            api_path: "/api/gemini-pro".into(),
            protocol,
        })
    }

    fn user_request(text: &str) -> ChatRequest {
        let messages = vec![Message {
            id: "msg-0".into(),
            role: Role::User,
            content: text.into(),
        }];
        ChatRequest::new(&messages, &ChatSettings::default())
    }

    #[tokio::test]
    async fn stream_reply_collects_text_body() {
        let (base, seen) = serve_once("200 OK", "Hello from Gemini").await;
        let client = client_for(base, StreamProtocol::Text);
        let mut reply = String::new();
        stream_reply(&client, &user_request("hi"), |d| reply.push_str(d))
            .await
            .unwrap();
        assert_eq!(reply, "Hello from Gemini");

        let raw = seen.await.unwrap();
        assert!(raw.starts_with("POST /api/gemini-pro "));
        assert!(raw.contains("\"general_settings\""));
        assert!(raw.contains("\"safety_settings\""));
    }

    #[tokio::test]
    async fn stream_reply_decodes_data_protocol() {
        let (base, _seen) = serve_once("200 OK", "0:\"Hi\"\n0:\" there\"\n").await;
        let client = client_for(base, StreamProtocol::Data);
        let mut deltas = Vec::new();
        stream_reply(&client, &user_request("hi"), |d| deltas.push(d.to_string()))
            .await
            .unwrap();
        assert_eq!(deltas.concat(), "Hi there");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (base, _seen) = serve_once("429 Too Many Requests", "slow down").await;
        let client = client_for(base, StreamProtocol::Text);
        let err = stream_reply(&client, &user_request("hi"), |_| {})
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("429"));
        assert!(err.contains("slow down"));
    }
}

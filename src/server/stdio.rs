//! JSON-lines transport for hook scripts and agent hosts
//!
//! Each input line is either a full `MessageEnvelope<ClientMessage>` or a
//! bare request (`{"operation": "read", ...}`). Envelopes are answered with
//! an event envelope echoing the `request_id`; bare requests get the bare
//! `OperationResult`. One output line per input line, in order.

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use mnemo_core::protocol::{ClientMessage, MessageEnvelope, ServerEvent};
use mnemo_core::RequestHandler;

use super::dispatch;

pub async fn serve_stdio<H>(handler: Arc<H>) -> Result<()>
where
    H: RequestHandler + 'static,
{
    info!("mnemo serving on stdio");
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve_lines(stdin, stdout, handler.as_ref()).await
}

pub async fn serve_lines<R, W, H>(mut reader: R, mut writer: W, handler: &H) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    H: RequestHandler + ?Sized,
{
    let mut buf = Vec::new();
    let mut event_id = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let reply = match std::str::from_utf8(&buf) {
            Ok(text) => {
                let line = text.trim();
                if line.is_empty() {
                    continue;
                }
                event_id += 1;
                answer_line(line, handler, event_id).await?
            }
            Err(e) => {
                event_id += 1;
                invalid_message(e.to_string(), event_id)?
            }
        };
        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    debug!("stdin closed after {} messages", event_id);
    Ok(())
}

fn invalid_message(message: String, event_id: u64) -> Result<String> {
    let event = ServerEvent::Error {
        code: "INVALID_MESSAGE".to_string(),
        message,
    };
    Ok(serde_json::to_string(&MessageEnvelope::event(event, None, event_id))?)
}

async fn answer_line<H>(line: &str, handler: &H, event_id: u64) -> Result<String>
where
    H: RequestHandler + ?Sized,
{
    let raw: Value = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(e) => return invalid_message(e.to_string(), event_id),
    };

    if raw.get("payload").is_some() {
        let reply = match serde_json::from_value::<MessageEnvelope<ClientMessage>>(raw) {
            Ok(envelope) => MessageEnvelope::event(
                dispatch(envelope.payload, handler).await,
                envelope.request_id,
                event_id,
            ),
            Err(e) => MessageEnvelope::event(
                ServerEvent::Error {
                    code: "INVALID_MESSAGE".to_string(),
                    message: e.to_string(),
                },
                None,
                event_id,
            ),
        };
        return Ok(serde_json::to_string(&reply)?);
    }

    let result = handler.handle_value(raw).await;
    Ok(serde_json::to_string(&result)?)
}

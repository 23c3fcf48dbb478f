//! WebSocket [`StreamTransport`] built on `tokio-tungstenite`.

use super::{ChannelProtocol, Frame, StreamControl, StreamRequest, StreamSink, StreamTransport};
use crate::error::TransportError;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, warn};

const NORMAL_CLOSE: u16 = 1000;
const ABNORMAL_CLOSE: u16 = 1006;

/// Opens exec streams over WebSocket, one tokio task per stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

struct Shutdown(Arc<Notify>);

impl StreamControl for Shutdown {
    fn close(&self) {
        // notify_one stores a permit, so a close requested before the task
        // starts waiting is not lost
        self.0.notify_one();
    }
}

impl StreamTransport for WebSocketTransport {
    fn open(&self, request: StreamRequest, sink: Arc<dyn StreamSink>) -> Box<dyn StreamControl> {
        let shutdown = Arc::new(Notify::new());
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(run(request, sink, Arc::clone(&shutdown)));
            }
            Err(_) => sink.on_failure(TransportError::other(
                &request.url,
                "no tokio runtime available to drive the stream",
            )),
        }
        Box::new(Shutdown(shutdown))
    }
}

async fn run(request: StreamRequest, sink: Arc<dyn StreamSink>, shutdown: Arc<Notify>) {
    let url = request.url.clone();
    let upgrade = match upgrade_request(&request) {
        Ok(r) => r,
        Err(e) => {
            sink.on_failure(e);
            return;
        }
    };

    debug!("Opening stream {} ({})", url, request.protocol.name());
    let ws = tokio::select! {
        biased;
        _ = shutdown.notified() => {
            sink.on_closed(NORMAL_CLOSE, "closed before handshake".to_string());
            return;
        }
        result = connect_async(upgrade) => match result {
            Ok((ws, _)) => ws,
            Err(e) => {
                sink.on_failure(handshake_error(&url, e));
                return;
            }
        }
    };

    sink.on_open();
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "client closed".into(),
                };
                if let Err(e) = write.send(Message::Close(Some(frame))).await {
                    debug!("Failed to send close frame to {}: {}", url, e);
                }
                sink.on_closed(NORMAL_CLOSE, "client closed".to_string());
                break;
            }
            msg = read.next() => match msg {
                Some(Ok(Message::Binary(data))) => {
                    dispatch(&sink, &url, ChannelProtocol::decode_binary(&data));
                }
                Some(Ok(Message::Text(text))) => {
                    dispatch(&sink, &url, ChannelProtocol::decode_text(&text));
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.to_string()))
                        .unwrap_or((NORMAL_CLOSE, String::new()));
                    sink.on_closed(code, reason);
                    break;
                }
                Some(Ok(_)) => {}
                // peer went away without a close frame
                Some(Err(WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake))) | None => {
                    sink.on_closed(ABNORMAL_CLOSE, "connection dropped".to_string());
                    break;
                }
                Some(Err(e)) => {
                    sink.on_failure(TransportError::other(&url, e.to_string()));
                    break;
                }
            }
        }
    }
    debug!("Stream {} finished", url);
}

fn dispatch(sink: &Arc<dyn StreamSink>, url: &str, frame: Option<Frame>) {
    match frame {
        Some(frame) => sink.on_frame(frame),
        None => warn!("Dropping undecodable frame on {}", url),
    }
}

fn upgrade_request(request: &StreamRequest) -> Result<Request, TransportError> {
    let mut upgrade = request
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| TransportError::other(&request.url, e.to_string()))?;

    let headers = upgrade.headers_mut();
    for (name, value) in &request.headers {
        let name = HeaderName::from_bytes(name.as_str().as_bytes())
            .map_err(|e| TransportError::other(&request.url, e.to_string()))?;
        let mut value = HeaderValue::from_bytes(value.as_bytes())
            .map_err(|e| TransportError::other(&request.url, e.to_string()))?;
        value.set_sensitive(true);
        headers.insert(name, value);
    }
    headers.insert(
        SEC_WEBSOCKET_PROTOCOL,
        HeaderValue::from_static(request.protocol.name()),
    );
    Ok(upgrade)
}

fn handshake_error(url: &str, error: WsError) -> TransportError {
    match error {
        WsError::Http(response) => {
            let body = response
                .body()
                .as_deref()
                .map(String::from_utf8_lossy)
                .unwrap_or_default();
            TransportError::from_status(response.status().as_u16(), url, &body)
        }
        other => TransportError::other(url, other.to_string()),
    }
}

//! Backend socket management

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::commands::{CommandSender, RequestTracker};
use super::protocol::parse_backend_message;
use cwarden_core::events::BackendMessage;
use cwarden_core::prelude::*;

/// Manages the socket to the backend daemon.
///
/// The stream is split on connect: the write half is owned by a writer task fed
/// from an mpsc channel, the read half by a reader task that routes each line.
/// Responses are matched against the shared [`RequestTracker`]; everything else
/// is forwarded to `event_tx` as typed [`BackendMessage`]s.
///
/// When the backend closes the socket the reader task cancels all pending
/// requests and drops `event_tx`, so consumers observe a closed event channel.
pub struct BackendConnection {
    /// Sender for outgoing request lines
    out_tx: mpsc::Sender<String>,
    /// Request tracker shared with the reader task
    tracker: Arc<RequestTracker>,
    /// Reader task handle (finished = connection closed)
    reader_task: JoinHandle<()>,
    /// Writer task handle
    writer_task: JoinHandle<()>,
    /// Address we connected to, for logging
    address: String,
}

impl BackendConnection {
    /// Connect to the backend at `address` (host:port).
    ///
    /// Unsolicited events are sent to `event_tx` for processing by the app loop.
    pub async fn connect(
        address: &str,
        event_tx: mpsc::Sender<BackendMessage>,
    ) -> Result<Self> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| Error::connect(address, e.to_string()))?;

        info!("Connected to backend at {}", address);

        let (read_half, write_half) = stream.into_split();

        let (out_tx, out_rx) = mpsc::channel::<String>(32);
        let writer_task = tokio::spawn(Self::socket_writer(write_half, out_rx));

        let tracker = Arc::new(RequestTracker::default());
        let reader_task = tokio::spawn(Self::socket_reader(
            read_half,
            event_tx,
            Arc::clone(&tracker),
        ));

        Ok(Self {
            out_tx,
            tracker,
            reader_task,
            writer_task,
            address: address.to_string(),
        })
    }

    /// Read lines from the socket and route them.
    ///
    /// Responses go to the tracker; events go to `event_tx`. On EOF all pending
    /// requests are cancelled so callers fail fast instead of hitting timeouts.
    async fn socket_reader(
        read_half: OwnedReadHalf,
        event_tx: mpsc::Sender<BackendMessage>,
        tracker: Arc<RequestTracker>,
    ) {
        let mut reader = BufReader::new(read_half).lines();

        while let Ok(Some(line)) = reader.next_line().await {
            trace!("backend: {}", line);

            match parse_backend_message(&line) {
                Some(BackendMessage::Response { id, result, error }) => {
                    let Some(id) = id.as_u64() else {
                        warn!("Response with non-numeric id: {}", id);
                        continue;
                    };
                    if !tracker.handle_response(id, result, error).await {
                        debug!("Response #{} had no pending request", id);
                    }
                }
                Some(msg) => {
                    if event_tx.send(msg).await.is_err() {
                        debug!("event channel closed");
                        break;
                    }
                }
                None => {
                    debug!("Ignoring unparseable line: {}", line);
                }
            }
        }

        info!("Backend reader finished, connection closed");
        tracker.cancel_all().await;
    }

    /// Write request lines to the socket
    async fn socket_writer(mut write_half: OwnedWriteHalf, mut rx: mpsc::Receiver<String>) {
        while let Some(line) = rx.recv().await {
            debug!("Sending to backend: {}", line);

            if let Err(e) = write_half.write_all(line.as_bytes()).await {
                error!("Failed to write to backend: {}", e);
                break;
            }
            if let Err(e) = write_half.write_all(b"\n").await {
                error!("Failed to write newline: {}", e);
                break;
            }
            if let Err(e) = write_half.flush().await {
                error!("Failed to flush backend socket: {}", e);
                break;
            }
        }

        debug!("backend writer finished");
    }

    /// Check if the connection has closed.
    ///
    /// Non-blocking; true once the reader task has observed EOF.
    pub fn is_closed(&self) -> bool {
        self.reader_task.is_finished()
    }

    /// Get the address this connection targets
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Get the outgoing sender for creating a CommandSender
    pub fn out_sender(&self) -> mpsc::Sender<String> {
        self.out_tx.clone()
    }

    /// Create a command sender for this connection
    pub fn command_sender(&self) -> CommandSender {
        CommandSender::new(self.out_tx.clone(), Arc::clone(&self.tracker))
    }

    /// Close the connection.
    ///
    /// Cancels all pending requests, then stops both socket tasks. Idempotent.
    pub async fn close(&mut self) {
        info!("Closing backend connection to {}", self.address);
        self.tracker.cancel_all().await;
        self.reader_task.abort();
        self.writer_task.abort();
    }
}

impl Drop for BackendConnection {
    fn drop(&mut self) {
        // Tasks hold the socket halves; abort them so the stream is released.
        self.reader_task.abort();
        self.writer_task.abort();
        debug!("BackendConnection dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::BackendCommand;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Bind an ephemeral listener and return it with its address string.
    async fn local_listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        (listener, addr)
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port with no listener
        let (listener, addr) = local_listener().await;
        drop(listener);

        let (tx, _rx) = mpsc::channel(16);
        let result = BackendConnection::connect(&addr, tx).await;
        assert!(matches!(result, Err(Error::Connect { .. })));
    }

    #[tokio::test]
    async fn test_request_response_round_trip() {
        let (listener, addr) = local_listener().await;

        // Fake backend: answer the first request with a version list
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let n = socket.read(&mut buf).await.unwrap();
            let line = String::from_utf8_lossy(&buf[..n]);
            let parsed: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
            assert_eq!(parsed["method"], "get_vanilla_versions");

            let reply = format!(
                "{}\n",
                serde_json::json!({"id": parsed["id"], "result": ["1.21.4", "1.21.3"]})
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
        });

        let (tx, _rx) = mpsc::channel(16);
        let conn = BackendConnection::connect(&addr, tx).await.unwrap();
        let sender = conn.command_sender();

        let value = sender.call(BackendCommand::VanillaVersions).await.unwrap();
        assert_eq!(value, serde_json::json!(["1.21.4", "1.21.3"]));
    }

    #[tokio::test]
    async fn test_event_delivery() {
        let (listener, addr) = local_listener().await;

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // Unmatched response first, then a real event
            socket
                .write_all(b"{\"id\":99999,\"result\":true}\n")
                .await
                .unwrap();
            socket
                .write_all(
                    b"{\"event\":\"instance-log\",\"params\":{\"id\":\"srv-1\",\"line\":\"hi\"}}\n",
                )
                .await
                .unwrap();
        });

        let (tx, mut rx) = mpsc::channel(16);
        let _conn = BackendConnection::connect(&addr, tx).await.unwrap();

        let msg = rx.recv().await.unwrap();
        match msg {
            BackendMessage::InstanceLog(log) => {
                assert_eq!(log.id, "srv-1");
                assert_eq!(log.line, "hi");
            }
            other => panic!("expected InstanceLog, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_close_cancels_pending() {
        let (listener, addr) = local_listener().await;

        // Accept but never respond
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });

        let (tx, _rx) = mpsc::channel(16);
        let mut conn = BackendConnection::connect(&addr, tx).await.unwrap();
        let sender = conn.command_sender();

        let call = tokio::spawn(async move { sender.send(BackendCommand::ListInstances).await });

        // Let the request get registered before closing
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        conn.close().await;

        let response = call.await.unwrap().unwrap();
        assert!(!response.success);
        assert!(response.error.as_ref().unwrap().contains("cancelled"));
    }

    #[tokio::test]
    async fn test_server_disconnect_closes_event_channel() {
        let (listener, addr) = local_listener().await;

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let (tx, mut rx) = mpsc::channel(16);
        let conn = BackendConnection::connect(&addr, tx).await.unwrap();

        // Reader hits EOF and drops event_tx, so the channel closes
        assert!(rx.recv().await.is_none());
        assert!(conn.is_closed());
    }
}

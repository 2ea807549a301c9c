//! A real WebSocket endpoint backed by [`SimulatedHost`].

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use ls_01_link_client::test_utils::SimulatedHost;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Accepts connections on a loopback port and answers every text frame
/// through the simulated host.
pub struct HostServer {
    host: Arc<SimulatedHost>,
    addr: SocketAddr,
    hangup: watch::Sender<u64>,
    task: JoinHandle<()>,
}

impl HostServer {
    pub async fn start(host: Arc<SimulatedHost>) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (hangup, _) = watch::channel(0u64);

        let serve_host = Arc::clone(&host);
        let serve_hangup = hangup.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(
                    stream,
                    Arc::clone(&serve_host),
                    serve_hangup.subscribe(),
                ));
            }
        });

        Ok(Self {
            host,
            addr,
            hangup,
            task,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn host(&self) -> &Arc<SimulatedHost> {
        &self.host
    }

    /// Close every open connection from the server side.
    pub fn hang_up(&self) {
        self.hangup.send_modify(|generation| *generation += 1);
    }
}

impl Drop for HostServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(stream: TcpStream, host: Arc<SimulatedHost>, mut hangup: watch::Receiver<u64>) {
    let Ok(ws) = accept_async(stream).await else {
        return;
    };
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            _ = hangup.changed() => {
                let _ = write.close().await;
                break;
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = host.handle_text(text.as_str()) {
                        if write.send(Message::Text(reply.into())).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

mod message;
mod socket;

pub use message::Message;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch, Mutex};

const MAX_PENDING: usize = 1000;

/// Handles one inbound datagram. Returning `None` drops it silently — no
/// reply is sent, matching the contract that malformed or question-less
/// packets never produce a response.
#[async_trait::async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, message: Message) -> Option<Message>;
}

/// UDP endpoint fanning `pool_size` reader sockets into one bounded queue,
/// drained by `pool_size` worker tasks running `H::handle`. On unix with
/// `pool_size > 1` the sockets share the listen address via `SO_REUSEPORT`
/// so the kernel spreads load across readers instead of a single socket
/// serializing every datagram through one `buffer_unordered` combinator.
pub struct Endpoint<H: Handler> {
    address: SocketAddr,
    pool_size: usize,
    handler: Arc<H>,
}

impl<H: Handler> Endpoint<H> {
    pub fn new(address: SocketAddr, pool_size: usize, handler: H) -> Self {
        Self {
            address,
            pool_size,
            handler: Arc::new(handler),
        }
    }

    /// Runs the endpoint until `shutdown` reports `true`. Resolves once
    /// every reader and worker task has exited.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> std::io::Result<()> {
        let sockets = socket::bind_pool(self.address, self.pool_size)?;
        let sockets: Vec<Arc<UdpSocket>> = sockets.into_iter().map(Arc::new).collect();

        let (tx, rx) = mpsc::channel::<Message>(MAX_PENDING);
        let rx = Arc::new(Mutex::new(rx));

        let mut tasks = Vec::with_capacity(sockets.len() * 2);

        for socket in &sockets {
            tasks.push(tokio::spawn(reader_loop(
                socket.clone(),
                tx.clone(),
                shutdown.clone(),
            )));
        }
        drop(tx);

        for socket in &sockets {
            tasks.push(tokio::spawn(worker_loop(
                socket.clone(),
                rx.clone(),
                self.handler.clone(),
                shutdown.clone(),
            )));
        }

        for task in tasks {
            let _ = task.await;
        }
        Ok(())
    }
}

async fn reader_loop(
    socket: Arc<UdpSocket>,
    tx: mpsc::Sender<Message>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let mut buffer = [0u8; 512];
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
            result = socket.recv_from(&mut buffer) => {
                match result {
                    Ok((size, address)) => {
                        let message = Message { address, buffer, size };
                        if tx.send(message).await.is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        tracing::warn!(%error, "failed to read datagram");
                    }
                }
            }
        }
    }
}

async fn worker_loop<H: Handler>(
    socket: Arc<UdpSocket>,
    rx: Arc<Mutex<mpsc::Receiver<Message>>>,
    handler: Arc<H>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let message = {
            let mut rx = rx.lock().await;
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                    continue;
                }
                message = rx.recv() => message,
            }
        };

        let Some(message) = message else {
            return;
        };

        let address = message.address;
        if let Some(reply) = handler.handle(message).await {
            if let Err(error) = socket.send_to(reply.payload(), address).await {
                tracing::warn!(%error, %address, "failed to send reply");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::UdpSocket as TokioUdpSocket;

    struct Echo;

    #[async_trait::async_trait]
    impl Handler for Echo {
        async fn handle(&self, message: Message) -> Option<Message> {
            Some(message)
        }
    }

    struct DropAll;

    #[async_trait::async_trait]
    impl Handler for DropAll {
        async fn handle(&self, _message: Message) -> Option<Message> {
            None
        }
    }

    #[tokio::test]
    async fn echoes_a_datagram_back_to_the_sender() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let address: SocketAddr = "127.0.0.1:28392".parse().unwrap();
        let endpoint = Endpoint::new(address, 1, Echo);

        let server = tokio::spawn(endpoint.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let client = TokioUdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"ping", address).await.unwrap();

        let mut buf = [0u8; 512];
        let (n, _) = tokio::time::timeout(Duration::from_secs(1), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], b"ping");

        shutdown_tx.send(true).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn dropped_messages_produce_no_reply() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let address: SocketAddr = "127.0.0.1:28393".parse().unwrap();
        let endpoint = Endpoint::new(address, 1, DropAll);

        let server = tokio::spawn(endpoint.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let client = TokioUdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"ping", address).await.unwrap();

        let mut buf = [0u8; 512];
        let result =
            tokio::time::timeout(Duration::from_millis(200), client.recv_from(&mut buf)).await;
        assert!(result.is_err(), "dropped message must not produce a reply");

        shutdown_tx.send(true).unwrap();
        server.await.unwrap().unwrap();
    }
}

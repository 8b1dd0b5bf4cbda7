use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::Mutex;

use sinkdns_proto::{query, BytePacketBuffer, Question, Record};

use crate::{Upstream, UpstreamError};

const READ_TIMEOUT: Duration = Duration::from_secs(10);

struct PooledSocket {
    socket: UdpSocket,
    buffer: BytePacketBuffer,
}

/// Plain UDP upstream client. Maintains a small pool of sockets pre
/// connected to `server`, each with its own reusable receive buffer, and
/// verifies the response's query ID matches the request before trusting it
/// — the source this is grounded on skips that check entirely, which is
/// exploitable cache-poisoning surface on an unconnected shared socket.
#[derive(Debug)]
pub struct UdpUpstream {
    pool: Vec<Mutex<PooledSocket>>,
    next: AtomicUsize,
    next_id: AtomicU16,
}

impl std::fmt::Debug for PooledSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledSocket").finish_non_exhaustive()
    }
}

impl UdpUpstream {
    pub async fn new(server: SocketAddr, pool_size: usize) -> std::io::Result<Self> {
        let mut pool = Vec::with_capacity(pool_size.max(1));
        for _ in 0..pool_size.max(1) {
            let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
            socket.connect(server).await?;
            pool.push(Mutex::new(PooledSocket {
                socket,
                buffer: BytePacketBuffer::default(),
            }));
        }

        Ok(Self {
            pool,
            next: AtomicUsize::new(0),
            next_id: AtomicU16::new(0),
        })
    }

    fn pick(&self) -> &Mutex<PooledSocket> {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.pool.len();
        &self.pool[idx]
    }
}

#[async_trait::async_trait]
impl Upstream for UdpUpstream {
    #[tracing::instrument(skip(self))]
    async fn resolve(&self, question: &Question) -> Result<Record, UpstreamError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut packet = query(&question.name, question.qtype, id);
        let req = packet.create_buffer().map_err(|_| UpstreamError::EmptyAnswer)?;

        let slot = self.pick();
        let mut slot = slot.lock().await;

        slot.socket.send(&req.buf[..req.pos]).await?;

        slot.buffer = BytePacketBuffer::default();
        let size = tokio::time::timeout(READ_TIMEOUT, slot.socket.recv(&mut slot.buffer.buf))
            .await
            .map_err(|_| UpstreamError::Timeout)??;
        let _ = size;

        slot.buffer.pos = 0;
        let response = sinkdns_proto::Packet::from_buffer(&mut slot.buffer)?;

        if response.header.id != id {
            return Err(UpstreamError::IdMismatch);
        }

        response
            .answers
            .into_iter()
            .find(|record| record.qtype() == question.qtype)
            .ok_or(UpstreamError::EmptyAnswer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinkdns_proto::QueryType;
    use std::net::Ipv4Addr;
    use tokio::net::UdpSocket as TokioUdpSocket;

    #[tokio::test]
    async fn resolves_a_record_from_a_fake_server() {
        let server = TokioUdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        let server_task = tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (len, from) = server.recv_from(&mut buf).await.unwrap();
            let mut req_buf = BytePacketBuffer::default();
            req_buf.buf[..len].copy_from_slice(&buf[..len]);
            let request = sinkdns_proto::Packet::from_buffer(&mut req_buf).unwrap();

            let mut response = sinkdns_proto::Packet::response_to(&request).with_answer(
                Record::A {
                    domain: "example.com".into(),
                    addr: Ipv4Addr::new(9, 9, 9, 9),
                    ttl: 30,
                },
            );
            let out = response.create_buffer().unwrap();
            server.send_to(&out.buf[..out.pos], from).await.unwrap();
        });

        let client = UdpUpstream::new(server_addr, 2).await.unwrap();
        let question = Question::new("example.com".into(), QueryType::A);
        let record = client.resolve(&question).await.unwrap();
        assert_eq!(
            record,
            Record::A {
                domain: "example.com".into(),
                addr: Ipv4Addr::new(9, 9, 9, 9),
                ttl: 30,
            }
        );

        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn rejects_mismatched_response_id() {
        let server = TokioUdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        let server_task = tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (_len, from) = server.recv_from(&mut buf).await.unwrap();
            let mut response = query("example.com", QueryType::A, 0xFFFF).with_answer(Record::A {
                domain: "example.com".into(),
                addr: Ipv4Addr::new(1, 1, 1, 1),
                ttl: 30,
            });
            let out = response.create_buffer().unwrap();
            server.send_to(&out.buf[..out.pos], from).await.unwrap();
        });

        let client = UdpUpstream::new(server_addr, 1).await.unwrap();
        let question = Question::new("example.com".into(), QueryType::A);
        let err = client.resolve(&question).await.unwrap_err();
        assert!(matches!(err, UpstreamError::IdMismatch));

        server_task.await.unwrap();
    }
}

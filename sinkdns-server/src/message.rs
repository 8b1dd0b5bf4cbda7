use std::net::SocketAddr;

/// A single datagram in or out, paired with the peer it came from / is
/// going to. `buffer`/`size` rather than a `Vec` so a reader task can reuse
/// the same allocation across `recv_from` calls.
#[derive(Debug, Clone)]
pub struct Message {
    pub address: SocketAddr,
    pub buffer: [u8; 512],
    pub size: usize,
}

impl Message {
    pub fn payload(&self) -> &[u8] {
        &self.buffer[..self.size]
    }
}

use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

/// Largest datagram this endpoint ever reads or writes, matching
/// `sinkdns_proto::MAX_PACKET_SIZE`. Kept as its own constant rather than a
/// dependency on that crate — this module only needs the number, not the
/// codec.
const MAX_DGRAM: usize = 512;

/// Binds one UDP socket for the listen address, sized per spec: a read
/// buffer of `2 * pool_size * MAX_DGRAM` (room for every reader's share of
/// a burst) and a write buffer of `MAX_DGRAM` (replies are sent one
/// datagram at a time). When more than one socket is requested on unix,
/// each is bound with `SO_REUSEPORT` so the kernel load-balances incoming
/// datagrams across them instead of all readers contending on a single
/// queue.
pub fn bind(address: SocketAddr, pool_size: usize, reuseport: bool) -> std::io::Result<UdpSocket> {
    #[cfg(unix)]
    {
        if reuseport {
            return bind_reuseport(address, pool_size);
        }
    }
    #[cfg(not(unix))]
    let _ = reuseport;

    let domain = if address.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    tune(&socket, pool_size)?;
    socket.set_nonblocking(true)?;
    socket.bind(&address.into())?;

    UdpSocket::from_std(socket.into())
}

#[cfg(unix)]
fn bind_reuseport(address: SocketAddr, pool_size: usize) -> std::io::Result<UdpSocket> {
    let domain = if address.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_reuse_port(true)?;
    tune(&socket, pool_size)?;
    socket.set_nonblocking(true)?;
    socket.bind(&address.into())?;

    UdpSocket::from_std(socket.into())
}

/// Sets the kernel-side read/write buffer sizes spec §4.7 point 1 requires.
fn tune(socket: &Socket, pool_size: usize) -> std::io::Result<()> {
    socket.set_recv_buffer_size(2 * pool_size.max(1) * MAX_DGRAM)?;
    socket.set_send_buffer_size(MAX_DGRAM)?;
    Ok(())
}

/// Binds `count` sockets for `address`. A single socket never needs
/// `SO_REUSEPORT`; with more than one, reuseport lets the kernel spread
/// datagrams across readers instead of funneling them through one.
pub fn bind_pool(address: SocketAddr, count: usize) -> std::io::Result<Vec<UdpSocket>> {
    let count = count.max(1);
    let reuseport = count > 1;
    (0..count).map(|_| bind(address, count, reuseport)).collect()
}

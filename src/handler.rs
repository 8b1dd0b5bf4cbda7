use sinkdns_proto::{BytePacketBuffer, Packet};
use sinkdns_resolver::{Chain, Resolve};
use sinkdns_server::Message;
use tokio::sync::RwLock;

use crate::chain::ResolverKind;

/// Smallest a DNS/UDP datagram can be: a bare 12-byte header.
const MIN_PACKET_SIZE: usize = 12;

/// Translates wire `Packet`s into `Question`/`Record` chain calls and back.
/// The chain is held behind an async `RwLock` so a future reconfiguration
/// (new blocklist, new upstream) can swap it without restarting the
/// endpoint — reads during normal serving never contend with each other.
pub struct DnsHandler {
    chain: RwLock<Chain<ResolverKind>>,
}

impl DnsHandler {
    pub fn new(chain: Chain<ResolverKind>) -> Self {
        Self {
            chain: RwLock::new(chain),
        }
    }

    /// Swaps in a freshly built chain, e.g. after a blocklist refresh.
    pub async fn reconfigure(&self, chain: Chain<ResolverKind>) {
        *self.chain.write().await = chain;
    }
}

#[async_trait::async_trait]
impl sinkdns_server::Handler for DnsHandler {
    #[tracing::instrument(skip_all, fields(origin = ?message.address, id = tracing::field::Empty))]
    async fn handle(&self, message: Message) -> Option<Message> {
        let Message {
            address,
            buffer,
            size,
        } = message;

        if !(MIN_PACKET_SIZE..=sinkdns_proto::MAX_PACKET_SIZE).contains(&size) {
            tracing::debug!(size, "datagram outside valid packet size, dropping");
            return None;
        }

        let mut buf = BytePacketBuffer::new();
        buf.buf = buffer;

        let request = match Packet::from_buffer(&mut buf) {
            Ok(packet) => packet,
            Err(error) => {
                tracing::debug!(%error, "unable to parse packet, dropping");
                return None;
            }
        };

        tracing::Span::current().record("id", request.header.id);

        // Inbound requests carrying authority/additional records are
        // rejected outright rather than tolerated: those sections are out
        // of scope and a request using them isn't one this server answers.
        if request.header.authoritative_entries != 0 || request.header.resource_entries != 0 {
            tracing::debug!("request carries authority/additional records, dropping");
            return None;
        }

        let question = match request.first_question() {
            Some(question) => question.clone(),
            None => {
                tracing::debug!("no question in request, dropping");
                return None;
            }
        };

        let answer = self.chain.read().await.resolve(&question).await;

        let mut response = Packet::response_to(&request);
        if let Some(record) = answer {
            response = response.with_answer(record);
        }

        let buffer = match response.create_buffer() {
            Ok(buffer) => buffer,
            Err(error) => {
                tracing::warn!(%error, "unable to serialize response");
                return None;
            }
        };

        Some(Message {
            address,
            buffer: buffer.buf,
            size: buffer.pos,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinkdns_proto::{query, QueryType, Record};
    use sinkdns_resolver::StaticResolver;
    use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

    fn socket_address() -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(127, 1, 0, 1), 42))
    }

    fn to_message(mut packet: Packet) -> Message {
        let buffer = packet.create_buffer().unwrap();
        Message {
            address: socket_address(),
            buffer: buffer.buf,
            size: buffer.pos,
        }
    }

    fn decode(message: Message) -> Packet {
        let mut buf = BytePacketBuffer::new();
        buf.buf = message.buffer;
        Packet::from_buffer(&mut buf).unwrap()
    }

    #[tokio::test]
    async fn answers_a_blocked_question_from_the_chain() {
        let mut block = StaticResolver::new("block", 600);
        block.insert_v4("ads.example", Ipv4Addr::new(0, 0, 0, 0));
        let handler = DnsHandler::new(Chain::new(vec![ResolverKind::Block(block)]));

        let request = query("ads.example", QueryType::A, 7);
        let input = to_message(request);

        let result = handler.handle(input).await.expect("should reply");
        let response = decode(result);

        assert_eq!(response.header.id, 7);
        assert!(response.header.response);
        assert_eq!(
            response.answers,
            vec![Record::A {
                domain: "ads.example".into(),
                addr: Ipv4Addr::new(0, 0, 0, 0),
                ttl: 600,
            }]
        );
    }

    #[tokio::test]
    async fn answers_with_empty_section_when_nothing_resolves() {
        let handler = DnsHandler::new(Chain::new(Vec::<ResolverKind>::new()));
        let request = query("perdu.com", QueryType::A, 7);
        let input = to_message(request);

        let result = handler.handle(input).await.expect("should reply");
        let response = decode(result);

        assert_eq!(response.header.id, 7);
        assert!(response.header.response);
        assert!(response.answers.is_empty());
    }

    #[tokio::test]
    async fn drops_request_with_no_question() {
        let handler = DnsHandler::new(Chain::new(Vec::<ResolverKind>::new()));
        let request = Packet::new();
        let input = to_message(request);
        assert!(handler.handle(input).await.is_none());
    }

    #[tokio::test]
    async fn drops_undersized_datagram() {
        let handler = DnsHandler::new(Chain::new(Vec::<ResolverKind>::new()));
        let message = Message {
            address: socket_address(),
            buffer: [0u8; 512],
            size: 4,
        };
        assert!(handler.handle(message).await.is_none());
    }
}

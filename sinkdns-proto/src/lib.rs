pub mod buffer;
pub mod header;
pub mod packet;
pub mod question;
pub mod record;

pub use buffer::{BytePacketBuffer, ReaderError, WriterError, MAX_PACKET_SIZE};
pub use header::{Header, ResponseCode};
pub use packet::{query, Packet};
pub use question::{DnsClass, QueryType, Question};
pub use record::Record;

/// Errors produced while turning wire bytes into a [`Packet`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Reader(#[from] ReaderError),
    #[error("query/record type is not A or AAAA")]
    UnsupportedType,
    #[error("class is not IN")]
    UnsupportedClass,
    #[error("RDATA length does not match record type")]
    BadRData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn reads_back_a_hand_built_response_packet() {
        let mut packet = query("google.com", QueryType::A, 38005).with_answer(Record::A {
            domain: String::from("google.com"),
            addr: Ipv4Addr::new(172, 217, 20, 206),
            ttl: 8,
        });
        let mut buffer = packet.create_buffer().unwrap();
        buffer.pos = 0;

        let parsed = Packet::from_buffer(&mut buffer).unwrap();
        assert_eq!(parsed.header.id, 38005);
        assert!(parsed.header.recursion_desired);
        assert!(!parsed.header.truncated_message);

        assert_eq!(parsed.questions.len(), 1);
        assert_eq!(parsed.questions[0].name, "google.com");
        assert_eq!(parsed.questions[0].qtype, QueryType::A);

        assert_eq!(parsed.answers.len(), 1);
        assert_eq!(
            parsed.answers[0],
            Record::A {
                domain: String::from("google.com"),
                addr: Ipv4Addr::new(172, 217, 20, 206),
                ttl: 8,
            }
        );
    }

    #[test]
    fn rejects_unsupported_query_type() {
        let mut buffer = BytePacketBuffer::new();
        buffer.write_qname("example.com").unwrap();
        buffer.write_u16(15).unwrap(); // MX, out of scope
        buffer.write_u16(1).unwrap();
        buffer.pos = 0;
        assert_eq!(Question::read(&mut buffer), Err(ParseError::UnsupportedType));
    }
}

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::buffer::{BytePacketBuffer, WriterError};
use crate::question::QueryType;
use crate::ParseError;

/// A resource record. Restricted to the two types this proxy resolves; a
/// TYPE byte on the wire that isn't one of these is a parse error rather than
/// a third variant, since there's no RDATA shape to interpret it with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum Record {
    A { domain: String, addr: Ipv4Addr, ttl: u32 },
    AAAA { domain: String, addr: Ipv6Addr, ttl: u32 },
}

impl Record {
    pub fn domain(&self) -> &str {
        match self {
            Record::A { domain, .. } => domain,
            Record::AAAA { domain, .. } => domain,
        }
    }

    pub fn ttl(&self) -> u32 {
        match self {
            Record::A { ttl, .. } => *ttl,
            Record::AAAA { ttl, .. } => *ttl,
        }
    }

    pub fn qtype(&self) -> QueryType {
        match self {
            Record::A { .. } => QueryType::A,
            Record::AAAA { .. } => QueryType::AAAA,
        }
    }

    pub fn with_ttl(self, ttl: u32) -> Self {
        match self {
            Record::A { domain, addr, .. } => Record::A { domain, addr, ttl },
            Record::AAAA { domain, addr, .. } => Record::AAAA { domain, addr, ttl },
        }
    }

    pub fn read(buffer: &mut BytePacketBuffer) -> Result<Record, ParseError> {
        let mut domain = String::new();
        buffer.read_qname(&mut domain)?;

        let qtype_num = buffer.read_u16()?;
        let qtype = QueryType::from_num(qtype_num).ok_or(ParseError::UnsupportedType)?;

        let class_num = buffer.read_u16()?;
        crate::question::DnsClass::from_num(class_num).ok_or(ParseError::UnsupportedClass)?;

        let ttl = buffer.read_u32()?;
        let data_len = buffer.read_u16()?;

        match qtype {
            QueryType::A => {
                if data_len != 4 {
                    return Err(ParseError::BadRData);
                }
                let raw_addr = buffer.read_u32()?;
                let addr = Ipv4Addr::from(raw_addr);
                Ok(Record::A { domain, addr, ttl })
            }
            QueryType::AAAA => {
                if data_len != 16 {
                    return Err(ParseError::BadRData);
                }
                let raw = [
                    buffer.read_u32()?,
                    buffer.read_u32()?,
                    buffer.read_u32()?,
                    buffer.read_u32()?,
                ];
                let mut octets = [0u8; 16];
                for (chunk, word) in octets.chunks_exact_mut(4).zip(raw.iter()) {
                    chunk.copy_from_slice(&word.to_be_bytes());
                }
                Ok(Record::AAAA {
                    domain,
                    addr: Ipv6Addr::from(octets),
                    ttl,
                })
            }
        }
    }

    pub fn write(&self, buffer: &mut BytePacketBuffer) -> Result<usize, WriterError> {
        let start_pos = buffer.pos();

        match self {
            Record::A { domain, addr, ttl } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::A.to_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;
                buffer.write_u16(4)?;
                for octet in addr.octets() {
                    buffer.write_u8(octet)?;
                }
            }
            Record::AAAA { domain, addr, ttl } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::AAAA.to_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;
                buffer.write_u16(16)?;
                for segment in addr.segments() {
                    buffer.write_u16(segment)?;
                }
            }
        }

        Ok(buffer.pos() - start_pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_a_record() {
        let record = Record::A {
            domain: "example.com".into(),
            addr: Ipv4Addr::new(93, 184, 216, 34),
            ttl: 60,
        };
        let mut buf = BytePacketBuffer::new();
        record.write(&mut buf).unwrap();
        buf.pos = 0;
        assert_eq!(Record::read(&mut buf).unwrap(), record);
    }

    #[test]
    fn rejects_truncated_a_rdata() {
        let mut buf = BytePacketBuffer::new();
        buf.write_qname("x.test").unwrap();
        buf.write_u16(QueryType::A.to_num()).unwrap();
        buf.write_u16(1).unwrap();
        buf.write_u32(60).unwrap();
        buf.write_u16(2).unwrap(); // wrong length for an A record
        buf.write_u16(0).unwrap();
        buf.pos = 0;
        assert_eq!(Record::read(&mut buf), Err(ParseError::BadRData));
    }
}

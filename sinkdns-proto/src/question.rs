use crate::buffer::{BytePacketBuffer, ReaderError, WriterError};

/// Query type. Only A and AAAA are resolvable by this proxy; any other
/// numeric TYPE observed on the wire is an [`crate::ParseError::UnsupportedType`].
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum QueryType {
    A,
    AAAA,
}

impl QueryType {
    pub fn to_num(self) -> u16 {
        match self {
            QueryType::A => 1,
            QueryType::AAAA => 28,
        }
    }

    pub fn from_num(num: u16) -> Option<QueryType> {
        match num {
            1 => Some(QueryType::A),
            28 => Some(QueryType::AAAA),
            _ => None,
        }
    }
}

/// CLASS field. Only IN is in scope; a question or record carrying a
/// different class is rejected by the packet reader.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum DnsClass {
    Internet = 1,
}

impl DnsClass {
    pub fn from_num(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Internet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub qtype: QueryType,
    pub qclass: DnsClass,
}

impl Question {
    pub fn new(name: String, qtype: QueryType) -> Self {
        Self {
            name,
            qtype,
            qclass: DnsClass::Internet,
        }
    }

    pub fn read(buffer: &mut BytePacketBuffer) -> Result<Self, crate::ParseError> {
        let mut name = String::new();
        buffer.read_qname(&mut name)?;
        let qtype =
            QueryType::from_num(buffer.read_u16()?).ok_or(crate::ParseError::UnsupportedType)?;
        let qclass =
            DnsClass::from_num(buffer.read_u16()?).ok_or(crate::ParseError::UnsupportedClass)?;

        Ok(Question {
            name,
            qtype,
            qclass,
        })
    }

    pub fn write(&self, buffer: &mut BytePacketBuffer) -> Result<(), WriterError> {
        buffer.write_qname(&self.name)?;
        buffer.write_u16(self.qtype.to_num())?;
        buffer.write_u16(self.qclass as u16)?;
        Ok(())
    }
}

impl From<ReaderError> for crate::ParseError {
    fn from(value: ReaderError) -> Self {
        crate::ParseError::Reader(value)
    }
}

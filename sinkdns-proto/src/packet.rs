use crate::buffer::{BytePacketBuffer, WriterError};
use crate::header::Header;
use crate::question::{QueryType, Question};
use crate::record::Record;
use crate::ParseError;

#[derive(Debug, Clone, Default)]
pub struct Packet {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<Record>,
}

impl Packet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a response packet copying the request's ID and question,
    /// setting the standard response flags (`QR=1`, `RD`/`RA` mirrored).
    pub fn response_to(request: &Packet) -> Self {
        let mut header = Header {
            id: request.header.id,
            recursion_desired: request.header.recursion_desired,
            response: true,
            recursion_available: true,
            ..Header::default()
        };
        header.questions = request.questions.len() as u16;

        Packet {
            header,
            questions: request.questions.clone(),
            answers: Vec::new(),
        }
    }

    pub fn with_answer(mut self, record: Record) -> Self {
        self.answers.push(record);
        self
    }

    pub fn with_answers(mut self, records: impl IntoIterator<Item = Record>) -> Self {
        self.answers.extend(records);
        self
    }

    pub fn first_question(&self) -> Option<&Question> {
        self.questions.first()
    }

    pub fn from_buffer(buffer: &mut BytePacketBuffer) -> Result<Packet, ParseError> {
        let mut result = Packet::new();
        result.header.read(buffer)?;

        for _ in 0..result.header.questions {
            result.questions.push(Question::read(buffer)?);
        }
        for _ in 0..result.header.answers {
            result.answers.push(Record::read(buffer)?);
        }

        // Authority/additional sections are out of scope; skip their
        // records so later packets on the same buffer still align, then
        // discard them.
        for _ in 0..(result.header.authoritative_entries + result.header.resource_entries) {
            Record::read(buffer)?;
        }

        Ok(result)
    }

    pub fn write(&mut self, buffer: &mut BytePacketBuffer) -> Result<(), WriterError> {
        self.header.questions = self.questions.len() as u16;
        self.header.answers = self.answers.len() as u16;
        self.header.authoritative_entries = 0;
        self.header.resource_entries = 0;

        self.header.write(buffer)?;

        for question in &self.questions {
            question.write(buffer)?;
        }
        for record in &self.answers {
            record.write(buffer)?;
        }

        Ok(())
    }

    pub fn create_buffer(&mut self) -> Result<BytePacketBuffer, WriterError> {
        let mut buffer = BytePacketBuffer::new();
        self.write(&mut buffer)?;
        Ok(buffer)
    }
}

/// Convenience used by resolvers: a single-question query packet for `name`.
pub fn query(name: &str, qtype: QueryType, id: u16) -> Packet {
    let mut header = Header {
        id,
        recursion_desired: true,
        ..Header::default()
    };
    header.questions = 1;
    Packet {
        header,
        questions: vec![Question::new(name.to_string(), qtype)],
        answers: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ResponseCode;
    use std::net::Ipv4Addr;

    #[test]
    fn roundtrips_through_buffer() {
        let mut packet = query("example.com", QueryType::A, 42)
            .with_answer(Record::A {
                domain: "example.com".into(),
                addr: Ipv4Addr::new(93, 184, 216, 34),
                ttl: 60,
            });
        let mut buffer = packet.create_buffer().unwrap();
        buffer.pos = 0;

        let parsed = Packet::from_buffer(&mut buffer).unwrap();
        assert_eq!(parsed.header.id, 42);
        assert_eq!(parsed.questions[0].name, "example.com");
        assert_eq!(parsed.answers.len(), 1);
    }

    #[test]
    fn response_to_mirrors_question_and_id() {
        let request = query("blocked.test", QueryType::A, 7);
        let response = Packet::response_to(&request);
        assert_eq!(response.header.id, 7);
        assert!(response.header.response);
        assert_eq!(response.header.response_code, ResponseCode::NoError);
        assert_eq!(response.questions, request.questions);
    }
}

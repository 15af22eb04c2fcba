use std::fmt;

use rand::Rng;

use super::{Class, ResourceRecord, Type};

/// The kind of query a message carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    StandardQuery,
    InverseQuery,
    ServerStatus,
}

/// The response code of a message
///
/// Successful hops leave this at `NoError`. The resolver only changes it
/// when a resolution fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
}

impl From<Opcode> for u8 {
    fn from(code: Opcode) -> u8 {
        match code {
            Opcode::StandardQuery => 0,
            Opcode::InverseQuery => 1,
            Opcode::ServerStatus => 2,
        }
    }
}

impl From<ResponseCode> for u8 {
    fn from(code: ResponseCode) -> u8 {
        match code {
            ResponseCode::NoError => 0,
            ResponseCode::FormatError => 1,
            ResponseCode::ServerFailure => 2,
            ResponseCode::NameError => 3,
            ResponseCode::NotImplemented => 4,
            ResponseCode::Refused => 5,
        }
    }
}

/// Message header
///
/// `query` is the inverse of the QR bit: it is set while the message travels
/// towards a server and cleared by the server that answers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub query: bool,
    pub opcode: Opcode,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub response_code: ResponseCode,
    pub questions: u16,
    pub answers: u16,
    pub nameservers: u16,
    pub additional: u16,
}

impl Header {
    pub fn new_query(id: u16, recursion: bool) -> Header {
        Header {
            id,
            query: true,
            opcode: Opcode::StandardQuery,
            authoritative: false,
            truncated: false,
            recursion_desired: recursion,
            recursion_available: recursion,
            response_code: ResponseCode::NoError,
            questions: 0,
            answers: 0,
            nameservers: 0,
            additional: 0,
        }
    }
}

/// The question section of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub qname: String,
    pub qtype: Type,
    pub qclass: Class,
}

/// A simulated DNS message, passed from hop to hop and mutated in place
#[derive(Debug, Clone)]
pub struct Message {
    pub header: Header,
    pub question: Question,
    pub answers: Vec<ResourceRecord>,
    /// authority section
    pub nameservers: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    /// Creates an `IN A` query for `qname` with a random id
    pub fn new<R: Rng + ?Sized>(qname: &str, rng: &mut R) -> Message {
        let mut header = Header::new_query(rng.gen(), false);
        header.questions = 1;
        Message {
            header,
            question: Question {
                qname: qname.to_owned(),
                qtype: Type::A,
                qclass: Class::IN,
            },
            answers: Vec::new(),
            nameservers: Vec::new(),
            additional: Vec::new(),
        }
    }

    pub fn qname(&self) -> &str {
        &self.question.qname
    }

    pub fn add_answer(&mut self, rr: ResourceRecord) {
        self.answers.push(rr);
        self.header.answers = self.header.answers.saturating_add(1);
    }

    pub fn add_nameserver(&mut self, rr: ResourceRecord) {
        self.nameservers.push(rr);
        self.header.nameservers = self.header.nameservers.saturating_add(1);
    }

    pub fn last_answer(&self) -> Option<&ResourceRecord> {
        self.answers.last()
    }
}

fn write_section(f: &mut fmt::Formatter, title: &str, rrs: &[ResourceRecord]) -> fmt::Result {
    writeln!(f, ";; {}", title)?;
    for rr in rrs {
        writeln!(f, "{}", rr)?;
    }
    Ok(())
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let h = &self.header;
        writeln!(f, ";; ID={}", h.id)?;
        writeln!(
            f,
            ";; QR={}, OPCODE={}, AA={}, TC={}, RD={}, RA={}, RCODE={}",
            u8::from(!h.query),
            u8::from(h.opcode),
            u8::from(h.authoritative),
            u8::from(h.truncated),
            u8::from(h.recursion_desired),
            u8::from(h.recursion_available),
            u8::from(h.response_code),
        )?;
        writeln!(
            f,
            ";; QDCOUNT={}, ANCOUNT={}, NSCOUNT={}, ARCOUNT={}",
            h.questions, h.answers, h.nameservers, h.additional
        )?;
        writeln!(
            f,
            ";; QNAME={}, QTYPE={}, QCLASS={}",
            self.question.qname, self.question.qtype, self.question.qclass
        )?;
        write_section(f, "ANSWER", &self.answers)?;
        write_section(f, "AUTHORITY", &self.nameservers)?;
        write_section(f, "ADDITIONAL", &self.additional)
    }
}

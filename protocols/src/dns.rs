//! # DNS Messages
//!
//! Builds single-question queries and extracts the records the DNS mode cares
//! about from the answers: addresses and canonical names.

use std::net::IpAddr;

use anyhow::{Context, ensure};
use dns_parser::{Builder, Packet, QueryClass, QueryType, RData, ResponseCode};

pub const DNS_HDR_LEN: usize = 12;
/// Labels must be shorter than this to be encodable.
pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 253;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
}

impl RecordType {
    fn as_query_type(self) -> QueryType {
        match self {
            RecordType::A => QueryType::A,
            RecordType::Aaaa => QueryType::AAAA,
            RecordType::Cname => QueryType::CNAME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rcode {
    NoError,
    /// The name does not exist.
    NxDomain,
    ServFail,
    Refused,
    Other(String),
}

impl Rcode {
    /// Four bit value used on the wire. Codes without a variant of their own
    /// are written as "not implemented".
    pub fn wire_code(&self) -> u8 {
        match self {
            Rcode::NoError => 0,
            Rcode::ServFail => 2,
            Rcode::NxDomain => 3,
            Rcode::Other(_) => 4,
            Rcode::Refused => 5,
        }
    }
}

impl From<ResponseCode> for Rcode {
    fn from(code: ResponseCode) -> Self {
        match code {
            ResponseCode::NoError => Rcode::NoError,
            ResponseCode::NameError => Rcode::NxDomain,
            ResponseCode::ServerFailure => Rcode::ServFail,
            ResponseCode::Refused => Rcode::Refused,
            other => Rcode::Other(format!("{other:?}")),
        }
    }
}

/// The parts of a response the enumeration needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    pub id: u16,
    pub rcode: Rcode,
    pub addresses: Vec<IpAddr>,
    pub cnames: Vec<String>,
}

impl DnsAnswer {
    pub fn is_nxdomain(&self) -> bool {
        self.rcode == Rcode::NxDomain
    }
}

/// The single question carried by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: u16,
    pub name: String,
    /// `None` for record types this crate does not model.
    pub record: Option<RecordType>,
}

/// Encodes a recursive query for `name`.
pub fn create_query(name: &str, record: RecordType, id: u16) -> anyhow::Result<Vec<u8>> {
    let name = name.trim_end_matches('.');
    ensure!(is_encodable(name), "'{name}' is not a valid DNS name");

    let mut builder = Builder::new_query(id, true);
    builder.add_question(name, false, record.as_query_type(), QueryClass::IN);
    builder
        .build()
        .map_err(|_| anyhow::anyhow!("query for '{name}' does not fit a single datagram"))
}

/// Decodes the first question of a query payload.
pub fn parse_question(payload: &[u8]) -> anyhow::Result<Question> {
    ensure!(payload.len() >= DNS_HDR_LEN, "truncated DNS message");
    let packet = Packet::parse(payload).context("Failed to parse DNS packet")?;
    ensure!(packet.header.query, "expected a DNS query, got a response");
    let question = packet.questions.first().context("query without a question")?;

    let record = match question.qtype {
        QueryType::A => Some(RecordType::A),
        QueryType::AAAA => Some(RecordType::Aaaa),
        QueryType::CNAME => Some(RecordType::Cname),
        _ => None,
    };

    Ok(Question {
        id: packet.header.id,
        name: question.qname.to_string(),
        record,
    })
}

/// Decodes a response payload.
pub fn parse_answer(payload: &[u8]) -> anyhow::Result<DnsAnswer> {
    ensure!(payload.len() >= DNS_HDR_LEN, "truncated DNS message");
    let packet = Packet::parse(payload).context("Failed to parse DNS packet")?;
    ensure!(!packet.header.query, "expected a DNS response, got a query");

    let mut addresses: Vec<IpAddr> = Vec::new();
    let mut cnames: Vec<String> = Vec::new();
    for record in &packet.answers {
        match &record.data {
            RData::A(a) => addresses.push(IpAddr::V4(a.0)),
            RData::AAAA(aaaa) => addresses.push(IpAddr::V6(aaaa.0)),
            RData::CNAME(cname) => cnames.push(cname.0.to_string()),
            _ => {}
        }
    }

    Ok(DnsAnswer {
        id: packet.header.id,
        rcode: packet.header.response_code.into(),
        addresses,
        cnames,
    })
}

/// Encodes a response to `query`, echoing its question.
///
/// CNAME records come first, followed by one A/AAAA record per address. Every
/// record owner points back at the question name.
pub fn create_response(
    query: &[u8],
    rcode: &Rcode,
    addresses: &[IpAddr],
    cnames: &[String],
) -> anyhow::Result<Vec<u8>> {
    ensure!(query.len() > DNS_HDR_LEN, "truncated DNS query");
    let answer_count = u16::try_from(addresses.len() + cnames.len()).context("too many records")?;

    let mut out: Vec<u8> = Vec::with_capacity(query.len() + 16 * usize::from(answer_count));
    out.extend_from_slice(&query[..2]);
    out.push(0x80 | (query[2] & 0x01));
    out.push(0x80 | rcode.wire_code());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&answer_count.to_be_bytes());
    out.extend_from_slice(&[0, 0, 0, 0]);
    out.extend_from_slice(&query[DNS_HDR_LEN..]);

    for cname in cnames {
        ensure!(is_encodable(cname.trim_end_matches('.')), "'{cname}' is not a valid DNS name");
        push_record(&mut out, 5, &encode_name(cname));
    }
    for address in addresses {
        match address {
            IpAddr::V4(v4) => push_record(&mut out, 1, &v4.octets()),
            IpAddr::V6(v6) => push_record(&mut out, 28, &v6.octets()),
        }
    }
    Ok(out)
}

fn push_record(out: &mut Vec<u8>, rtype: u16, rdata: &[u8]) {
    out.extend_from_slice(&[0xc0, DNS_HDR_LEN as u8]);
    out.extend_from_slice(&rtype.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&60u32.to_be_bytes());
    out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    out.extend_from_slice(rdata);
}

fn encode_name(name: &str) -> Vec<u8> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    encoded
}

/// Random transaction id for a new query.
pub fn next_transaction_id() -> u16 {
    rand::random::<u16>()
}

fn is_encodable(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .split('.')
            .all(|label| !label.is_empty() && label.len() < MAX_LABEL_LEN)
}

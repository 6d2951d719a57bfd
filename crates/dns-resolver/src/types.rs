use std::fmt;
use std::str::FromStr;

use dns_types::protocol::types::{DomainName, RecordType};

use crate::record::ResponseRecord;

/// The query types accepted as input.  Anything else is rejected
/// before resolution starts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum QueryKind {
    A,
    NS,
    MX,
}

impl QueryKind {
    pub fn rtype(self) -> RecordType {
        match self {
            QueryKind::A => RecordType::A,
            QueryKind::NS => RecordType::NS,
            QueryKind::MX => RecordType::MX,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueryKind::A => write!(f, "A"),
            QueryKind::NS => write!(f, "NS"),
            QueryKind::MX => write!(f, "MX"),
        }
    }
}

impl FromStr for QueryKind {
    type Err = QueryKindFromStr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(QueryKind::A),
            "NS" => Ok(QueryKind::NS),
            "MX" => Ok(QueryKind::MX),
            _ => Err(QueryKindFromStr::Unsupported),
        }
    }
}

/// Errors that can arise when converting a `&str` into a `QueryKind`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum QueryKindFromStr {
    Unsupported,
}

impl fmt::Display for QueryKindFromStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "query type must be one of A, NS, MX")
    }
}

impl std::error::Error for QueryKindFromStr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// A single question to resolve.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Request {
    pub name: DomainName,
    pub qtype: QueryKind,
}

/// Why DNSSEC validation of a lookup failed.  The `Display` form of
/// each variant is the message surfaced to users.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ValidationError {
    /// The response had neither answers nor DS records, so the zone
    /// does not serve DNSSEC material.
    NotSupported,
    /// No candidate authoritative server delivered a DNSKEY response.
    KeyFetchFailed,
    /// The DNSKEY response lacked a key signing key, the DNSKEY
    /// RRset, or its RRSIG.
    NotEnabled,
    /// The DNSKEY RRset did not verify against its own RRSIG.
    DnskeySignatureInvalid,
    /// No DS digest matched any key signing key's computed hash.
    DsMismatch,
    /// A data RRset's signature did not verify against the trusted
    /// keys.
    RrsigVerifyFailed,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationError::NotSupported => write!(f, "DNSSEC not supported"),
            ValidationError::KeyFetchFailed => write!(f, "Could not fetch DNSKEY"),
            ValidationError::NotEnabled => write!(f, "DNSSEC not enabled"),
            ValidationError::DnskeySignatureInvalid => {
                write!(f, "Failed to validate signature of DNSKEY record")
            }
            ValidationError::DsMismatch => write!(f, "DS validation for KSK failed"),
            ValidationError::RrsigVerifyFailed => {
                write!(f, "DNSSEC RRSIG record verification failed")
            }
        }
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// What DNSSEC validation had to say about a response.  `Disabled`
/// is the plain resolver, which does not render a DNSSEC line at
/// all.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DnssecOutcome {
    Disabled,
    Validated,
    Failed(ValidationError),
}

/// The root trust anchor could not be installed at startup.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TrustAnchorError;

impl fmt::Display for TrustAnchorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "could not fetch the root DNSKEY record set")
    }
}

impl std::error::Error for TrustAnchorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// The result of resolving a `Request`.  Resolution is total: dead
/// ends and validation failures come back as a `Response` with empty
/// record lists, never as an error.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Response {
    pub name: DomainName,
    pub qtype: QueryKind,
    pub answer_records: Vec<ResponseRecord>,
    pub authority_records: Vec<ResponseRecord>,
    /// Wall-clock time the whole lookup took.
    pub query_time_ms: u64,
    /// Unix timestamp of when the lookup finished.
    pub when: u64,
    /// Wire size of the final response message; 0 on total failure.
    pub msg_size_rcvd: usize,
    pub dnssec: DnssecOutcome,
}

fn record_list(records: &[ResponseRecord]) -> String {
    records
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Question section - Name: {} Type: {}",
            self.name, self.qtype
        )?;
        writeln!(f, "Answer section - [{}]", record_list(&self.answer_records))?;
        writeln!(
            f,
            "Authority section - [{}]",
            record_list(&self.authority_records)
        )?;
        writeln!(
            f,
            "Metadata - Query time: {}ms When: {} Msg size rcvd: {}",
            self.query_time_ms, self.when, self.msg_size_rcvd
        )?;
        match self.dnssec {
            DnssecOutcome::Disabled => Ok(()),
            DnssecOutcome::Validated => writeln!(f, "DNSSEC error message: None"),
            DnssecOutcome::Failed(error) => writeln!(f, "DNSSEC error message: {error}"),
        }
    }
}

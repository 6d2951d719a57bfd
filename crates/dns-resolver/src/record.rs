//! Conversion of message sections into the normalised records shown
//! to users.

use std::fmt;

use dns_types::protocol::types::{RecordType, RecordTypeWithData, ResourceRecord};

/// A record as reported in a `Response`: the type tag plus a
/// normalised textual value.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ResponseRecord {
    pub rtype: RecordType,
    pub value: String,
}

impl fmt::Display for ResponseRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.rtype, self.value)
    }
}

/// Flatten a message section into `ResponseRecord`s.
///
/// Normalisation:
///
/// - `A`: dotted-quad IPv4 text
/// - `NS` / `CNAME`: fully qualified target name, trailing dot kept
/// - `MX`: preference and exchange name separated by a space
/// - `SOA`: the primary name server and responsible-person mailbox
///   joined by a space
///
/// Records of any other type are dropped, deliberately: unknown
/// types are not surfaced to callers.
pub fn extract_records(section: &[ResourceRecord]) -> Vec<ResponseRecord> {
    let mut results = Vec::with_capacity(section.len());

    for rr in section {
        let value = match &rr.rtype_with_data {
            RecordTypeWithData::A { address } => address.to_string(),
            RecordTypeWithData::NS { nsdname } => nsdname.to_dotted_string(),
            RecordTypeWithData::CNAME { cname } => cname.to_dotted_string(),
            RecordTypeWithData::MX {
                preference,
                exchange,
            } => format!("{preference} {}", exchange.to_dotted_string()),
            RecordTypeWithData::SOA { mname, rname, .. } => {
                format!("{} {}", mname.to_dotted_string(), rname.to_dotted_string())
            }
            _ => continue,
        };
        results.push(ResponseRecord {
            rtype: rr.rtype_with_data.rtype(),
            value,
        });
    }

    results
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use dns_types::protocol::types::test_util::*;

    use super::*;

    #[test]
    fn extracts_and_normalises_known_types() {
        let section = [
            a_record("www.example.com.", Ipv4Addr::new(93, 184, 216, 34)),
            ns_record("example.com.", "a.iana-servers.net."),
            cname_record("www.example.com.", "example.com."),
            mx_record("example.com.", 10, "mail.example.com."),
            soa_record("example.com.", "ns.example.com.", "hostmaster.example.com."),
        ];

        assert_eq!(
            vec![
                ResponseRecord {
                    rtype: RecordType::A,
                    value: "93.184.216.34".to_string(),
                },
                ResponseRecord {
                    rtype: RecordType::NS,
                    value: "a.iana-servers.net.".to_string(),
                },
                ResponseRecord {
                    rtype: RecordType::CNAME,
                    value: "example.com.".to_string(),
                },
                ResponseRecord {
                    rtype: RecordType::MX,
                    value: "10 mail.example.com.".to_string(),
                },
                ResponseRecord {
                    rtype: RecordType::SOA,
                    value: "ns.example.com. hostmaster.example.com.".to_string(),
                },
            ],
            extract_records(&section)
        );
    }

    #[test]
    fn drops_unrecognised_types() {
        let section = [
            aaaa_record("www.example.com.", Ipv6Addr::LOCALHOST),
            dnskey_record("example.com.", 257, 13, &[1, 2, 3]),
            unknown_record("www.example.com.", 100, &[1, 2, 3]),
            a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1)),
        ];

        assert_eq!(
            vec![ResponseRecord {
                rtype: RecordType::A,
                value: "1.1.1.1".to_string(),
            }],
            extract_records(&section)
        );
    }

    #[test]
    fn extraction_is_idempotent_on_equal_input() {
        let section = [
            a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1)),
            mx_record("example.com.", 20, "backup.example.com."),
        ];

        assert_eq!(extract_records(&section), extract_records(&section));
    }

    #[test]
    fn display_is_type_then_value() {
        let record = ResponseRecord {
            rtype: RecordType::MX,
            value: "10 mail.example.com.".to_string(),
        };
        assert_eq!("MX 10 mail.example.com.", record.to_string());
    }
}

//! Deserialisation of DNS messages from the network.  See the `types`
//! module for details of the format.

use bytes::Bytes;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::protocol::types::*;

impl Message {
    /// # Errors
    ///
    /// If the message cannot be parsed.
    pub fn from_octets(octets: &[u8]) -> Result<Self, Error> {
        Self::deserialise(&mut ConsumableBuffer::new(octets))
    }

    /// # Errors
    ///
    /// If the message cannot be parsed.
    pub fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let wire_header = WireHeader::deserialise(buffer)?;
        let mut questions = Vec::with_capacity(wire_header.qdcount.into());
        let mut answers = Vec::with_capacity(wire_header.ancount.into());
        let mut authority = Vec::with_capacity(wire_header.nscount.into());
        let mut additional = Vec::with_capacity(wire_header.arcount.into());

        for _ in 0..wire_header.qdcount {
            questions.push(Question::deserialise(wire_header.header.id, buffer)?);
        }
        for _ in 0..wire_header.ancount {
            answers.push(ResourceRecord::deserialise(wire_header.header.id, buffer)?);
        }
        for _ in 0..wire_header.nscount {
            authority.push(ResourceRecord::deserialise(wire_header.header.id, buffer)?);
        }
        for _ in 0..wire_header.arcount {
            additional.push(ResourceRecord::deserialise(wire_header.header.id, buffer)?);
        }

        Ok(Self {
            header: wire_header.header,
            questions,
            answers,
            authority,
            additional,
        })
    }
}

/// The header plus the section counts, which are not kept in the
/// `Header` type as they can be inferred from the sections themselves.
struct WireHeader {
    header: Header,
    qdcount: u16,
    ancount: u16,
    nscount: u16,
    arcount: u16,
}

impl WireHeader {
    fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let id = buffer.next_u16().ok_or(Error::CompletelyBusted)?;
        let flags1 = buffer.next_u8().ok_or(Error::HeaderTooShort(id))?;
        let flags2 = buffer.next_u8().ok_or(Error::HeaderTooShort(id))?;
        let qdcount = buffer.next_u16().ok_or(Error::HeaderTooShort(id))?;
        let ancount = buffer.next_u16().ok_or(Error::HeaderTooShort(id))?;
        let nscount = buffer.next_u16().ok_or(Error::HeaderTooShort(id))?;
        let arcount = buffer.next_u16().ok_or(Error::HeaderTooShort(id))?;

        Ok(Self {
            header: Header {
                id,
                is_response: flags1 & HEADER_MASK_QR != 0,
                opcode: Opcode::from((flags1 & HEADER_MASK_OPCODE) >> HEADER_OFFSET_OPCODE),
                is_authoritative: flags1 & HEADER_MASK_AA != 0,
                is_truncated: flags1 & HEADER_MASK_TC != 0,
                recursion_desired: flags1 & HEADER_MASK_RD != 0,
                recursion_available: flags2 & HEADER_MASK_RA != 0,
                rcode: Rcode::from(flags2 & HEADER_MASK_RCODE),
            },
            qdcount,
            ancount,
            nscount,
            arcount,
        })
    }
}

impl Question {
    /// # Errors
    ///
    /// If the question cannot be parsed.
    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let name = DomainName::deserialise(id, buffer)?;
        let qtype = buffer
            .next_u16()
            .map(RecordType::from)
            .ok_or(Error::QuestionTooShort(id))?;
        let qclass = buffer
            .next_u16()
            .map(RecordClass::from)
            .ok_or(Error::QuestionTooShort(id))?;

        Ok(Self {
            name,
            qtype,
            qclass,
        })
    }
}

impl ResourceRecord {
    /// # Errors
    ///
    /// If the record cannot be parsed.
    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let name = DomainName::deserialise(id, buffer)?;
        let rtype = buffer
            .next_u16()
            .map(RecordType::from)
            .ok_or(Error::ResourceRecordTooShort(id))?;
        let rclass = buffer
            .next_u16()
            .map(RecordClass::from)
            .ok_or(Error::ResourceRecordTooShort(id))?;
        let ttl = buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?;
        let rdlength = buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?;

        let rdata_start = buffer.position;
        let rdata_stop = rdata_start + rdlength as usize;

        let raw_rdata = |buffer: &mut ConsumableBuffer| {
            if let Some(octets) = buffer.take(rdlength as usize) {
                Ok(Bytes::copy_from_slice(octets))
            } else {
                Err(Error::ResourceRecordTooShort(id))
            }
        };

        // the tail of a DS / RRSIG / DNSKEY record is however much of
        // the RDATA is left after the fixed fields
        let remaining_rdata = |buffer: &mut ConsumableBuffer| {
            let remaining = rdata_stop.checked_sub(buffer.position)?;
            buffer.take(remaining).map(Bytes::copy_from_slice)
        };

        // for records which include domain names, deserialise them to
        // expand pointers.
        let rtype_with_data = match rtype {
            RecordType::A => RecordTypeWithData::A {
                address: Ipv4Addr::from(
                    buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
                ),
            },
            RecordType::NS => RecordTypeWithData::NS {
                nsdname: DomainName::deserialise(id, buffer)?,
            },
            RecordType::CNAME => RecordTypeWithData::CNAME {
                cname: DomainName::deserialise(id, buffer)?,
            },
            RecordType::SOA => RecordTypeWithData::SOA {
                mname: DomainName::deserialise(id, buffer)?,
                rname: DomainName::deserialise(id, buffer)?,
                serial: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
                refresh: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
                retry: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
                expire: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
                minimum: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
            },
            RecordType::MX => RecordTypeWithData::MX {
                preference: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                exchange: DomainName::deserialise(id, buffer)?,
            },
            RecordType::AAAA => RecordTypeWithData::AAAA {
                address: Ipv6Addr::new(
                    buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                    buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                    buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                    buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                    buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                    buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                    buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                    buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                ),
            },
            RecordType::OPT => RecordTypeWithData::OPT {
                octets: raw_rdata(buffer)?,
            },
            RecordType::DS => RecordTypeWithData::DS {
                key_tag: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                algorithm: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                digest_type: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                digest: remaining_rdata(buffer).ok_or(Error::ResourceRecordTooShort(id))?,
            },
            RecordType::RRSIG => RecordTypeWithData::RRSIG {
                type_covered: buffer
                    .next_u16()
                    .map(RecordType::from)
                    .ok_or(Error::ResourceRecordTooShort(id))?,
                algorithm: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                labels: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                original_ttl: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
                expiration: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
                inception: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
                key_tag: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                signer_name: DomainName::deserialise(id, buffer)?,
                signature: remaining_rdata(buffer).ok_or(Error::ResourceRecordTooShort(id))?,
            },
            RecordType::DNSKEY => RecordTypeWithData::DNSKEY {
                flags: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                protocol: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                algorithm: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                public_key: remaining_rdata(buffer).ok_or(Error::ResourceRecordTooShort(id))?,
            },
            RecordType::Unknown(tag) => RecordTypeWithData::Unknown {
                tag,
                octets: raw_rdata(buffer)?,
            },
        };

        if buffer.position == rdata_stop {
            Ok(Self {
                name,
                rtype_with_data,
                rclass,
                ttl,
            })
        } else {
            Err(Error::ResourceRecordInvalid(id))
        }
    }
}

impl DomainName {
    /// # Errors
    ///
    /// If the domain cannot be parsed.
    #[allow(clippy::missing_panics_doc)]
    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let mut len = 0;
        let mut labels = Vec::<Label>::with_capacity(5);
        let start = buffer.position;

        'outer: loop {
            let size = buffer.next_u8().ok_or(Error::DomainTooShort(id))?;

            if usize::from(size) <= LABEL_MAX_LEN {
                len += 1 + usize::from(size);

                if size == 0 {
                    labels.push(Label::new());
                    break 'outer;
                }

                if let Some(os) = buffer.take(size as usize) {
                    // safe because of the bounds check above
                    let label = Label::try_from(os).unwrap();
                    labels.push(label);
                } else {
                    return Err(Error::DomainTooShort(id));
                }

                if len > DOMAINNAME_MAX_LEN {
                    break 'outer;
                }
            } else if size >= 192 {
                // this requires re-parsing the pointed-to domain -
                // not great but works for now.
                let hi = size & 0b0011_1111;
                let lo = buffer.next_u8().ok_or(Error::DomainTooShort(id))?;
                let ptr = u16::from_be_bytes([hi, lo]).into();

                // pointer must be to an earlier record (not merely a
                // different one: an earlier one: RFC 1035 section
                // 4.1.4)
                if ptr >= start {
                    return Err(Error::DomainPointerInvalid(id));
                }

                let mut other = DomainName::deserialise(id, &mut buffer.at_offset(ptr))?;
                len += other.len;
                labels.append(&mut other.labels);
                break 'outer;
            } else {
                return Err(Error::DomainLabelInvalid(id));
            }
        }

        if len <= DOMAINNAME_MAX_LEN {
            Ok(DomainName { labels, len })
        } else {
            Err(Error::DomainTooLong(id))
        }
    }
}

/// Errors encountered when parsing a datagram.  In all the errors
/// which have a `u16` parameter, that is the ID from the header - so
/// that the failure can be linked back to the query.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Error {
    /// The datagram is not even 2 octets long, so it doesn't even
    /// contain a valid ID.
    CompletelyBusted,

    /// The header is missing one or more required fields.
    HeaderTooShort(u16),

    /// A question ends with an incomplete field.
    QuestionTooShort(u16),

    /// A resource record ends with an incomplete field.
    ResourceRecordTooShort(u16),

    /// A resource record's RDATA does not match its RDLENGTH.
    ResourceRecordInvalid(u16),

    /// A domain is incomplete.
    DomainTooShort(u16),

    /// A domain is over 255 octets in size.
    DomainTooLong(u16),

    /// A domain pointer points to or after the current record.
    DomainPointerInvalid(u16),

    /// A domain label is longer than 63 octets, but not a pointer.
    DomainLabelInvalid(u16),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::CompletelyBusted => write!(f, "datagram too short to contain an ID"),
            Error::HeaderTooShort(id) => write!(f, "[{id}] header too short"),
            Error::QuestionTooShort(id) => write!(f, "[{id}] question too short"),
            Error::ResourceRecordTooShort(id) => write!(f, "[{id}] resource record too short"),
            Error::ResourceRecordInvalid(id) => {
                write!(f, "[{id}] resource record RDATA does not match RDLENGTH")
            }
            Error::DomainTooShort(id) => write!(f, "[{id}] domain name too short"),
            Error::DomainTooLong(id) => write!(f, "[{id}] domain name too long"),
            Error::DomainPointerInvalid(id) => write!(f, "[{id}] invalid domain name pointer"),
            Error::DomainLabelInvalid(id) => write!(f, "[{id}] invalid domain name label"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// A buffer which will be consumed by the parsing process.
pub struct ConsumableBuffer<'a> {
    octets: &'a [u8],
    position: usize,
}

impl<'a> ConsumableBuffer<'a> {
    pub fn new(octets: &'a [u8]) -> Self {
        Self {
            octets,
            position: 0,
        }
    }

    pub fn next_u8(&mut self) -> Option<u8> {
        if self.octets.len() > self.position {
            let a = self.octets[self.position];
            self.position += 1;
            Some(a)
        } else {
            None
        }
    }

    pub fn next_u16(&mut self) -> Option<u16> {
        if self.octets.len() > self.position + 1 {
            let a = self.octets[self.position];
            let b = self.octets[self.position + 1];
            self.position += 2;
            Some(u16::from_be_bytes([a, b]))
        } else {
            None
        }
    }

    pub fn next_u32(&mut self) -> Option<u32> {
        if self.octets.len() > self.position + 3 {
            let a = self.octets[self.position];
            let b = self.octets[self.position + 1];
            let c = self.octets[self.position + 2];
            let d = self.octets[self.position + 3];
            self.position += 4;
            Some(u32::from_be_bytes([a, b, c, d]))
        } else {
            None
        }
    }

    pub fn take(&mut self, size: usize) -> Option<&'a [u8]> {
        if self.octets.len() >= self.position + size {
            let slice = &self.octets[self.position..self.position + size];
            self.position += size;
            Some(slice)
        } else {
            None
        }
    }

    pub fn at_offset(&self, position: usize) -> ConsumableBuffer<'a> {
        Self {
            octets: self.octets,
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::test_util::*;
    use std::net::Ipv4Addr;

    fn roundtrip(message: &Message) -> Message {
        let octets = message.to_octets().unwrap();
        Message::from_octets(&octets).unwrap()
    }

    #[test]
    fn roundtrip_query() {
        let mut query = Message::from_question(
            1234,
            Question {
                name: domain("www.example.com."),
                qtype: RecordType::A,
                qclass: RecordClass::IN,
            },
        );
        query.add_dnssec_ok(EDNS_UDP_PAYLOAD_SIZE);

        assert_eq!(query, roundtrip(&query));
    }

    #[test]
    fn roundtrip_referral_response() {
        let request = Message::from_question(
            1234,
            Question {
                name: domain("www.example.com."),
                qtype: RecordType::A,
                qclass: RecordClass::IN,
            },
        );
        let mut response = request.make_response();
        response.authority = vec![
            ns_record("example.com.", "a.iana-servers.net."),
            ns_record("example.com.", "b.iana-servers.net."),
        ];
        response.additional = vec![a_record("a.iana-servers.net.", Ipv4Addr::new(199, 43, 135, 53))];

        assert_eq!(response, roundtrip(&response));
    }

    #[test]
    fn roundtrip_dnssec_records() {
        let request = Message::from_question(
            1234,
            Question {
                name: domain("example.com."),
                qtype: RecordType::DNSKEY,
                qclass: RecordClass::IN,
            },
        );
        let mut response = request.make_response();
        response.answers = vec![
            dnskey_record("example.com.", 257, 13, &[1, 2, 3, 4]),
            rrsig_record(
                "example.com.",
                RecordType::DNSKEY,
                13,
                2,
                300,
                60485,
                "example.com.",
                &[5, 6, 7, 8],
            ),
        ];
        response.authority = vec![ds_record("example.com.", 60485, 13, 2, &[9, 10, 11, 12])];

        assert_eq!(response, roundtrip(&response));
    }

    #[test]
    fn roundtrip_soa_and_mx() {
        let request = Message::from_question(
            1234,
            Question {
                name: domain("example.com."),
                qtype: RecordType::MX,
                qclass: RecordClass::IN,
            },
        );
        let mut response = request.make_response();
        response.answers = vec![mx_record("example.com.", 10, "mail.example.com.")];
        response.authority = vec![soa_record(
            "example.com.",
            "ns.example.com.",
            "hostmaster.example.com.",
        )];

        assert_eq!(response, roundtrip(&response));
    }

    #[test]
    fn deserialise_rejects_forward_pointer() {
        // a question whose name is a pointer to itself
        let mut octets = Vec::new();
        octets.extend_from_slice(&1234u16.to_be_bytes());
        octets.extend_from_slice(&[0, 0]); // flags
        octets.extend_from_slice(&1u16.to_be_bytes()); // qdcount
        octets.extend_from_slice(&0u16.to_be_bytes()); // ancount
        octets.extend_from_slice(&0u16.to_be_bytes()); // nscount
        octets.extend_from_slice(&0u16.to_be_bytes()); // arcount
        octets.extend_from_slice(&[0b1100_0000, 12]); // pointer to itself
        octets.extend_from_slice(&1u16.to_be_bytes()); // qtype
        octets.extend_from_slice(&1u16.to_be_bytes()); // qclass

        assert_eq!(
            Err(Error::DomainPointerInvalid(1234)),
            Message::from_octets(&octets)
        );
    }

    #[test]
    fn deserialise_rejects_mismatched_rdlength() {
        let rr = a_record("www.example.com.", Ipv4Addr::LOCALHOST);
        let request = Message::from_question(
            1234,
            Question {
                name: domain("www.example.com."),
                qtype: RecordType::A,
                qclass: RecordClass::IN,
            },
        );
        let mut response = request.make_response();
        response.answers = vec![rr];

        let mut octets = response.to_octets().unwrap().to_vec();
        // lengthen the A record's RDLENGTH without adding data
        let rdlength_index = octets.len() - 6;
        octets[rdlength_index] = 0;
        octets[rdlength_index + 1] = 5;
        octets.push(0);

        assert_eq!(
            Err(Error::ResourceRecordInvalid(1234)),
            Message::from_octets(&octets)
        );
    }
}

//! Iterative resolution: walk referrals from the root servers down
//! to an authoritative answer.

use async_recursion::async_recursion;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::Instrument;

use dns_types::protocol::types::*;

use crate::keys::KeyStore;
use crate::record::extract_records;
use crate::record::ResponseRecord;
use crate::types::*;
use crate::util::nameserver::query_nameserver;

/// Maximum combined depth of CNAME restarts and nameserver
/// re-resolutions.  This is to protect against maliciously-configured
/// nameservers which return endless CNAME chains or referral loops.
pub const RECURSION_LIMIT: usize = 32;

/// Nameservers are queried on the standard DNS port.
pub const DNS_PORT: u16 = 53;

/// An iterative resolver.  Every lookup starts at the root servers
/// and follows referrals downward; nothing is cached between lookups
/// except, in validating mode, the DNSKEY RRsets in the key store.
pub struct Resolver {
    pub(crate) roots: Vec<Ipv4Addr>,
    pub(crate) dnssec: bool,
    pub(crate) keys: KeyStore,
}

/// The raw result of a lookup, before it is wrapped up with timing
/// metadata into a `Response`.
pub(crate) struct Lookup {
    pub(crate) answers: Vec<ResponseRecord>,
    pub(crate) authority: Vec<ResponseRecord>,
    pub(crate) msg_size: usize,
    pub(crate) dnssec_error: Option<ValidationError>,
}

impl Lookup {
    /// A dead end: no server answered, or a referral could not be
    /// followed.
    fn failed() -> Self {
        Self {
            answers: Vec::new(),
            authority: Vec::new(),
            msg_size: 0,
            dnssec_error: None,
        }
    }

    /// Resolution aborted by a validation failure.
    fn aborted(error: ValidationError) -> Self {
        Self {
            answers: Vec::new(),
            authority: Vec::new(),
            msg_size: 0,
            dnssec_error: Some(error),
        }
    }
}

impl Resolver {
    /// A plain resolver: no DNSSEC material is requested or checked.
    pub fn new(roots: Vec<Ipv4Addr>) -> Self {
        Self {
            roots,
            dnssec: false,
            keys: KeyStore::new(),
        }
    }

    /// A validating resolver.  Fetches the root DNSKEY RRset from the
    /// root servers and installs it as the trust anchor before any
    /// lookup runs.
    ///
    /// # Errors
    ///
    /// If no root server delivers a DNSKEY RRset.
    pub async fn new_validating(roots: Vec<Ipv4Addr>) -> Result<Self, TrustAnchorError> {
        let mut resolver = Self {
            roots,
            dnssec: true,
            keys: KeyStore::new(),
        };
        resolver.install_root_anchor().await?;
        Ok(resolver)
    }

    /// Resolve a request.  This is total: a dead end or a validation
    /// failure comes back as a `Response` with empty record lists,
    /// never as an error.
    pub async fn resolve(&mut self, request: &Request) -> Response {
        let start = Instant::now();

        let question = Question {
            name: request.name.clone(),
            qtype: request.qtype.rtype(),
            qclass: RecordClass::IN,
        };
        let validate = self.dnssec;
        let lookup = self
            .resolve_iterative(question, 0, validate)
            .instrument(tracing::error_span!("resolve", domain = %request.name, qtype = %request.qtype))
            .await;

        let query_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let when = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|since_epoch| since_epoch.as_secs())
            .unwrap_or(0);

        Response {
            name: request.name.clone(),
            qtype: request.qtype,
            answer_records: lookup.answers,
            authority_records: lookup.authority,
            query_time_ms,
            when,
            msg_size_rcvd: lookup.msg_size,
            dnssec: match (self.dnssec, lookup.dnssec_error) {
                (false, _) => DnssecOutcome::Disabled,
                (true, None) => DnssecOutcome::Validated,
                (true, Some(error)) => DnssecOutcome::Failed(error),
            },
        }
    }

    /// The referral-following loop.  `validate` controls whether
    /// queries carry the DNSSEC-OK bit and responses pass through the
    /// validator; the validator's own bootstrap lookups run with it
    /// off.
    #[async_recursion]
    pub(crate) async fn resolve_iterative(
        &mut self,
        question: Question,
        depth: usize,
        validate: bool,
    ) -> Lookup {
        let mut question = question;
        let mut servers = self.roots.clone();
        let mut answers = Vec::new();
        let mut authority = Vec::new();
        let mut hops = depth;

        loop {
            if hops >= RECURSION_LIMIT {
                tracing::debug!(domain = %question.name, "hit recursion limit");
                return Lookup::failed();
            }
            hops += 1;

            let (response, msg_size) = match self.query_servers(&question, &servers, validate).await
            {
                Ok(Some(exchange)) => exchange,
                Ok(None) => {
                    tracing::debug!(domain = %question.name, "no server answered");
                    return Lookup::failed();
                }
                Err(error) => return Lookup::aborted(error),
            };

            match classify_response(&question, &response) {
                Classified::Referral => {
                    servers = match self.referral_servers(&response, hops, validate).await {
                        Ok(servers) if !servers.is_empty() => servers,
                        Ok(_) => {
                            tracing::debug!(domain = %question.name, "referral with no usable servers");
                            return Lookup::failed();
                        }
                        Err(error) => return Lookup::aborted(error),
                    };
                }
                Classified::Negative => {
                    authority.append(&mut extract_records(&response.authority));
                    return Lookup {
                        answers,
                        authority,
                        msg_size,
                        dnssec_error: None,
                    };
                }
                Classified::Answer => {
                    let answer_records = extract_records(&response.answers);
                    let restart = cname_restart_target(&answer_records);

                    answers.extend(answer_records);
                    authority.append(&mut extract_records(&response.authority));

                    if let Some(target) = restart {
                        tracing::trace!(%target, "chasing CNAME from the root");
                        question = Question {
                            name: target,
                            qtype: RecordType::A,
                            qclass: RecordClass::IN,
                        };
                        servers = self.roots.clone();
                    } else {
                        return Lookup {
                            answers,
                            authority,
                            msg_size,
                            dnssec_error: None,
                        };
                    }
                }
            }
        }
    }

    /// Try the candidate servers in order; the first one to produce a
    /// usable response wins.  In validating mode each received
    /// response goes through the validator, and the first validation
    /// error aborts the lookup.
    async fn query_servers(
        &mut self,
        question: &Question,
        servers: &[Ipv4Addr],
        validate: bool,
    ) -> Result<Option<(Message, usize)>, ValidationError> {
        for server in servers {
            let address = SocketAddr::from((*server, DNS_PORT));
            if let Some((response, size)) = query_nameserver(address, question, validate).await {
                if validate {
                    self.validate_message(&response).await?;
                }
                return Ok(Some((response, size)));
            }
        }

        Ok(None)
    }

    /// Compute the next-hop servers from a referral.  Glue A records
    /// in the additional section are used directly; otherwise each NS
    /// name in the authority section is itself resolved from the
    /// root.
    async fn referral_servers(
        &mut self,
        response: &Message,
        depth: usize,
        validate: bool,
    ) -> Result<Vec<Ipv4Addr>, ValidationError> {
        let glue = glue_addresses(response);
        if !glue.is_empty() {
            return Ok(glue);
        }

        let mut servers = Vec::new();
        for ns_name in authority_ns_names(response) {
            let ns_question = Question {
                name: ns_name.clone(),
                qtype: RecordType::A,
                qclass: RecordClass::IN,
            };
            let lookup = self
                .resolve_iterative(ns_question, depth, validate)
                .instrument(tracing::error_span!("resolve_nameserver", domain = %ns_name))
                .await;
            if let Some(error) = lookup.dnssec_error {
                return Err(error);
            }
            for record in &lookup.answers {
                if record.rtype == RecordType::A {
                    if let Ok(address) = record.value.parse() {
                        servers.push(address);
                    }
                }
            }
        }

        Ok(servers)
    }
}

/// How the resolver reacts to a response.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Classified {
    /// No answer, but a delegation to follow.
    Referral,
    /// No answer and an SOA in the authority section: an
    /// authoritative terminal negative (NXDOMAIN or NODATA).
    Negative,
    /// An answer (possibly empty) to report, maybe with a CNAME to
    /// chase.
    Answer,
}

/// Classify a response.
///
/// A response with an empty answer section is a referral when the
/// question is for an A record or the additional section carries
/// real records - unless the authority section holds an SOA, which
/// makes it a terminal negative instead.  Everything else is an
/// answer.
pub(crate) fn classify_response(question: &Question, response: &Message) -> Classified {
    if response.answers.is_empty()
        && (question.qtype == RecordType::A || has_additional_rrs(response))
    {
        let authority_has_soa = response
            .authority
            .iter()
            .any(|rr| rr.rtype_with_data.rtype() == RecordType::SOA);
        if authority_has_soa {
            Classified::Negative
        } else {
            Classified::Referral
        }
    } else {
        Classified::Answer
    }
}

/// Whether the additional section carries anything besides the EDNS
/// OPT pseudo-record.  OPT appears in every response to a query with
/// the DNSSEC-OK bit set and must not be mistaken for glue.
fn has_additional_rrs(response: &Message) -> bool {
    response
        .additional
        .iter()
        .any(|rr| rr.rtype_with_data.rtype() != RecordType::OPT)
}

/// If the extracted answer section is exactly one CNAME record, the
/// resolution restarts from the root with its target.
pub(crate) fn cname_restart_target(records: &[ResponseRecord]) -> Option<DomainName> {
    if let [only] = records {
        if only.rtype == RecordType::CNAME {
            return DomainName::from_dotted_string(&only.value);
        }
    }
    None
}

/// Glue: A records in the additional section, in order.
pub(crate) fn glue_addresses(response: &Message) -> Vec<Ipv4Addr> {
    response
        .additional
        .iter()
        .filter_map(|rr| match rr.rtype_with_data {
            RecordTypeWithData::A { address } => Some(address),
            _ => None,
        })
        .collect()
}

/// The NS names delegated to in the authority section.
pub(crate) fn authority_ns_names(response: &Message) -> Vec<DomainName> {
    response
        .authority
        .iter()
        .filter_map(|rr| match &rr.rtype_with_data {
            RecordTypeWithData::NS { nsdname } => Some(nsdname.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use dns_types::protocol::types::test_util::*;

    use super::*;
    use crate::record::extract_records;

    fn response_to(
        qtype: RecordType,
        answers: &[ResourceRecord],
        authority: &[ResourceRecord],
        additional: &[ResourceRecord],
    ) -> (Question, Message) {
        let question = Question {
            name: domain("www.example.com."),
            qtype,
            qclass: RecordClass::IN,
        };
        let request = Message::from_question(1234, question.clone());
        let mut response = request.make_response();
        response.answers = answers.into();
        response.authority = authority.into();
        response.additional = additional.into();
        (question, response)
    }

    #[test]
    fn classify_referral_with_glue() {
        let (question, response) = response_to(
            RecordType::A,
            &[],
            &[ns_record("com.", "a.gtld-servers.net.")],
            &[a_record("a.gtld-servers.net.", Ipv4Addr::new(192, 5, 6, 30))],
        );

        assert_eq!(Classified::Referral, classify_response(&question, &response));
        assert_eq!(
            vec![Ipv4Addr::new(192, 5, 6, 30)],
            glue_addresses(&response)
        );
    }

    #[test]
    fn classify_referral_without_glue_for_a_query() {
        let (question, response) = response_to(
            RecordType::A,
            &[],
            &[ns_record("example.com.", "ns.example.net.")],
            &[],
        );

        assert_eq!(Classified::Referral, classify_response(&question, &response));
        assert!(glue_addresses(&response).is_empty());
        assert_eq!(
            vec![domain("ns.example.net.")],
            authority_ns_names(&response)
        );
    }

    #[test]
    fn classify_negative_soa() {
        let (question, response) = response_to(
            RecordType::A,
            &[],
            &[soa_record(
                "example.com.",
                "ns.example.com.",
                "hostmaster.example.com.",
            )],
            &[],
        );

        assert_eq!(Classified::Negative, classify_response(&question, &response));
    }

    #[test]
    fn classify_answer() {
        let (question, response) = response_to(
            RecordType::A,
            &[a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1))],
            &[],
            &[],
        );

        assert_eq!(Classified::Answer, classify_response(&question, &response));
    }

    #[test]
    fn classify_empty_ns_response_is_answer() {
        // an NS query with no answer, no additional records, and no
        // SOA has nothing to chase: report what came back
        let (question, response) = response_to(RecordType::NS, &[], &[], &[]);

        assert_eq!(Classified::Answer, classify_response(&question, &response));
    }

    #[test]
    fn classify_ignores_opt_in_additional() {
        // with the DO bit set every response carries an OPT record;
        // it is not glue and must not turn an NS answer into a
        // referral
        let (question, mut response) = response_to(RecordType::NS, &[], &[], &[]);
        let mut opt_query = Message::from_question(1, question.clone());
        opt_query.add_dnssec_ok(EDNS_UDP_PAYLOAD_SIZE);
        response.additional = opt_query.additional;

        assert_eq!(Classified::Answer, classify_response(&question, &response));
        assert!(glue_addresses(&response).is_empty());
    }

    #[test]
    fn cname_restart_on_single_cname() {
        let records = extract_records(&[cname_record("www.example.com.", "www.example.net.")]);

        assert_eq!(
            Some(domain("www.example.net.")),
            cname_restart_target(&records)
        );
    }

    #[test]
    fn no_cname_restart_when_answer_present() {
        let records = extract_records(&[
            cname_record("www.example.com.", "www.example.net."),
            a_record("www.example.net.", Ipv4Addr::new(1, 1, 1, 1)),
        ]);

        assert_eq!(None, cname_restart_target(&records));
    }

    #[test]
    fn no_cname_restart_on_plain_answer() {
        let records = extract_records(&[a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1))]);

        assert_eq!(None, cname_restart_target(&records));
    }

    #[test]
    fn authority_ns_names_skips_other_types() {
        let (_, response) = response_to(
            RecordType::A,
            &[],
            &[
                ns_record("example.com.", "ns1.example.net."),
                soa_record("example.com.", "ns.example.com.", "hostmaster.example.com."),
                ns_record("example.com.", "ns2.example.net."),
            ],
            &[],
        );

        assert_eq!(
            vec![domain("ns1.example.net."), domain("ns2.example.net.")],
            authority_ns_names(&response)
        );
    }
}

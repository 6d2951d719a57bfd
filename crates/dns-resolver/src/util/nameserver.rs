use rand::Rng;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

use dns_types::protocol::types::*;

/// How long to wait for a nameserver to reply before it is skipped.
/// The same timeout applies to DNSKEY fetches.
pub const UDP_TIMEOUT: Duration = Duration::from_secs(1);

/// Largest response accepted over UDP - matches the payload size
/// advertised in the EDNS OPT record.
const RECV_BUFFER_SIZE: usize = EDNS_UDP_PAYLOAD_SIZE as usize;

/// Build a query message for a question.  When `want_dnssec` is set
/// the EDNS OPT record carries the DNSSEC-OK bit, so that servers
/// include RRSIG records in the response.
pub fn build_query(question: &Question, want_dnssec: bool) -> Message {
    let mut request = Message::from_question(rand::thread_rng().gen(), question.clone());
    if want_dnssec {
        request.add_dnssec_ok(EDNS_UDP_PAYLOAD_SIZE);
    }
    request
}

/// Send a question to a remote nameserver over UDP, returning the
/// parsed response and its wire size.
///
/// Any network error, timeout, malformed response, or response which
/// does not match the request yields `None`: the attempt against
/// that server failed and the caller moves on to the next candidate.
/// There are no retries against the same server, and no TCP
/// fallback.
pub async fn query_nameserver(
    address: SocketAddr,
    question: &Question,
    want_dnssec: bool,
) -> Option<(Message, usize)> {
    let request = build_query(question, want_dnssec);

    match request.to_octets() {
        Ok(serialised_request) => {
            tracing::trace!(%question, %address, "sending query");

            match timeout(UDP_TIMEOUT, exchange_udp(address, &serialised_request)).await {
                Ok(Some((response, size))) if response_matches_request(&request, &response) => {
                    Some((response, size))
                }
                Ok(_) => {
                    tracing::debug!(%address, "bad or missing response");
                    None
                }
                Err(_) => {
                    tracing::debug!(%address, "timed out");
                    None
                }
            }
        }
        Err(error) => {
            tracing::warn!(message = ?request, ?error, "could not serialise message");
            None
        }
    }
}

/// Timeout-less single UDP exchange.
async fn exchange_udp(address: SocketAddr, serialised_request: &[u8]) -> Option<(Message, usize)> {
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    let sock = UdpSocket::bind("0.0.0.0:0").await.ok()?;
    sock.connect(address).await.ok()?;
    sock.send(serialised_request).await.ok()?;
    let size = sock.recv(&mut buf).await.ok()?;

    Message::from_octets(&buf[..size])
        .ok()
        .map(|message| (message, size))
}

/// Very basic validation that a nameserver response matches a
/// request:
///
/// - Check the ID, opcode, and questions match the request.
///
/// - Check it is a response.
///
/// - Check the response code is either `NoError` or `NameError`.
///
/// - Check it is not truncated: there is no TCP fallback, so a
///   truncated response is as useless as no response.
pub fn response_matches_request(request: &Message, response: &Message) -> bool {
    if request.header.id != response.header.id {
        return false;
    }
    if !response.header.is_response {
        return false;
    }
    if request.header.opcode != response.header.opcode {
        return false;
    }
    if response.header.is_truncated {
        return false;
    }
    if !(response.header.rcode == Rcode::NoError || response.header.rcode == Rcode::NameError) {
        return false;
    }
    if request.questions != response.questions {
        return false;
    }

    true
}

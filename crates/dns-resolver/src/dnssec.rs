//! Hierarchical DNSSEC validation: fetch zone signing material,
//! verify RRSIGs, and anchor each zone's keys to the DS digests
//! published by its parent.

use bytes::Bytes;
use ring::digest;
use ring::signature;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::Instrument;

use dns_types::protocol::serialise::WritableBuffer;
use dns_types::protocol::types::*;

use crate::iterative::{Resolver, DNS_PORT};
use crate::keys::KeyStore;
use crate::types::{TrustAnchorError, ValidationError};
use crate::util::nameserver::query_nameserver;

/// DNSKEY flags value identifying a key signing key: the zone-key
/// bit plus the secure entry point bit.
pub(crate) const KSK_FLAGS: u16 = 257;

/// An RRset as delivered by a server: the records sharing an owner
/// name and type, treated as one unit for validation.
#[derive(Debug, Clone)]
pub(crate) struct Rrset {
    pub(crate) owner: DomainName,
    pub(crate) rtype: RecordType,
    pub(crate) records: Vec<ResourceRecord>,
}

/// An RRSIG record's fields, pulled out of the record enum.
#[derive(Debug, Clone)]
pub(crate) struct Rrsig {
    pub(crate) owner: DomainName,
    pub(crate) type_covered: RecordType,
    pub(crate) algorithm: u8,
    pub(crate) labels: u8,
    pub(crate) original_ttl: u32,
    pub(crate) expiration: u32,
    pub(crate) inception: u32,
    pub(crate) key_tag: u16,
    pub(crate) signer_name: DomainName,
    pub(crate) signature: Bytes,
}

fn as_rrsig(rr: &ResourceRecord) -> Option<Rrsig> {
    if let RecordTypeWithData::RRSIG {
        type_covered,
        algorithm,
        labels,
        original_ttl,
        expiration,
        inception,
        key_tag,
        signer_name,
        signature,
    } = &rr.rtype_with_data
    {
        Some(Rrsig {
            owner: rr.name.clone(),
            type_covered: *type_covered,
            algorithm: *algorithm,
            labels: *labels,
            original_ttl: *original_ttl,
            expiration: *expiration,
            inception: *inception,
            key_tag: *key_tag,
            signer_name: signer_name.clone(),
            signature: signature.clone(),
        })
    } else {
        None
    }
}

/// The DS digests a response pins for one delegated zone.
#[derive(Debug, Clone)]
pub(crate) struct DsRrset {
    pub(crate) owner: DomainName,
    pub(crate) items: Vec<Ds>,
}

/// One DS digest.
#[derive(Debug, Clone)]
pub(crate) struct Ds {
    pub(crate) algorithm: u8,
    pub(crate) digest: Bytes,
}

impl Resolver {
    /// Fetch the root DNSKEY RRset from the root servers and install
    /// it as the trust anchor.  The root servers are the a priori
    /// trusted bootstrap; everything below them is verified.
    pub(crate) async fn install_root_anchor(&mut self) -> Result<(), TrustAnchorError> {
        let question = Question {
            name: DomainName::root_domain(),
            qtype: RecordType::DNSKEY,
            qclass: RecordClass::IN,
        };

        for root in self.roots.clone() {
            let address = SocketAddr::from((root, DNS_PORT));
            if let Some((response, _)) = query_nameserver(address, &question, true).await {
                let rrset: Vec<ResourceRecord> = response
                    .answers
                    .iter()
                    .filter(|rr| {
                        rr.name.is_root() && rr.rtype_with_data.rtype() == RecordType::DNSKEY
                    })
                    .cloned()
                    .collect();
                if !rrset.is_empty() {
                    tracing::debug!(keys = %rrset.len(), "installed root trust anchor");
                    self.keys.insert(DomainName::root_domain(), rrset);
                    return Ok(());
                }
            }
        }

        Err(TrustAnchorError)
    }

    /// Validate one received response.  The first failure
    /// short-circuits and aborts the lookup that received the
    /// response.
    pub(crate) async fn validate_message(
        &mut self,
        response: &Message,
    ) -> Result<(), ValidationError> {
        let ds_rrsets = delegation_signers(response);

        // no answer and no delegation signer: the zone serves no
        // DNSSEC material at all
        if response.answers.is_empty() && ds_rrsets.is_empty() {
            return Err(ValidationError::NotSupported);
        }

        for ds in &ds_rrsets {
            self.fetch_and_validate_keys(ds)
                .instrument(tracing::error_span!("fetch_and_validate_keys", zone = %ds.owner))
                .await?;
        }

        for (rrset, rrsig) in signed_pairs(response) {
            if !verify_rrset(&self.keys, &rrset, &rrsig) {
                tracing::debug!(owner = %rrset.owner, rtype = %rrset.rtype, "RRSIG did not verify");
                return Err(ValidationError::RrsigVerifyFailed);
            }
        }

        Ok(())
    }

    /// Obtain the DNSKEY RRset of the zone a DS record delegates to,
    /// check its self-signature, and anchor its key signing key to
    /// the DS digest.  On success the zone's keys join the trusted
    /// store.
    ///
    /// The NS and A lookups used to locate the zone's servers are
    /// plain resolutions; see DESIGN.md for the trust gap this
    /// leaves.
    async fn fetch_and_validate_keys(&mut self, ds: &DsRrset) -> Result<(), ValidationError> {
        let zone = ds.owner.clone();

        let ns_question = Question {
            name: zone.clone(),
            qtype: RecordType::NS,
            qclass: RecordClass::IN,
        };
        let ns_lookup = self.resolve_iterative(ns_question, 0, false).await;

        let mut ns_names = Vec::new();
        for record in ns_lookup.answers.iter().chain(ns_lookup.authority.iter()) {
            if record.rtype == RecordType::NS {
                if let Some(ns_name) = DomainName::from_dotted_string(&record.value) {
                    ns_names.push(ns_name);
                }
            }
        }

        let mut candidates = Vec::new();
        for ns_name in ns_names {
            let a_question = Question {
                name: ns_name,
                qtype: RecordType::A,
                qclass: RecordClass::IN,
            };
            let a_lookup = self.resolve_iterative(a_question, 0, false).await;
            for record in &a_lookup.answers {
                if record.rtype == RecordType::A {
                    if let Ok(address) = record.value.parse::<Ipv4Addr>() {
                        candidates.push(address);
                    }
                }
            }
        }

        let key_question = Question {
            name: zone.clone(),
            qtype: RecordType::DNSKEY,
            qclass: RecordClass::IN,
        };
        let mut key_response = None;
        for address in candidates {
            let address = SocketAddr::from((address, DNS_PORT));
            if let Some((response, _)) = query_nameserver(address, &key_question, true).await {
                key_response = Some(response);
                break;
            }
        }
        let Some(key_response) = key_response else {
            return Err(ValidationError::KeyFetchFailed);
        };

        let dnskey_rrset: Vec<ResourceRecord> = key_response
            .answers
            .iter()
            .filter(|rr| rr.name == zone && rr.rtype_with_data.rtype() == RecordType::DNSKEY)
            .cloned()
            .collect();
        let rrsig = key_response
            .answers
            .iter()
            .filter_map(as_rrsig)
            .find(|sig| sig.owner == zone && sig.type_covered == RecordType::DNSKEY);
        let has_ksk = dnskey_rrset.iter().any(|rr| {
            matches!(rr.rtype_with_data, RecordTypeWithData::DNSKEY { flags, .. } if flags == KSK_FLAGS)
        });

        if dnskey_rrset.is_empty() || !has_ksk {
            return Err(ValidationError::NotEnabled);
        }
        let Some(rrsig) = rrsig else {
            return Err(ValidationError::NotEnabled);
        };

        // the self-signature check needs the zone's keys in the store
        // while it runs; rolled back if anything fails
        self.keys.insert(zone.clone(), dnskey_rrset.clone());
        let rrset = Rrset {
            owner: zone.clone(),
            rtype: RecordType::DNSKEY,
            records: dnskey_rrset.clone(),
        };
        if !verify_rrset(&self.keys, &rrset, &rrsig) {
            self.keys.remove(&zone);
            return Err(ValidationError::DnskeySignatureInvalid);
        }

        // anchor a key signing key to the parent's digest; every KSK
        // candidate is tried, so a rollover with two published KSKs
        // still anchors
        for item in &ds.items {
            for key in &dnskey_rrset {
                let RecordTypeWithData::DNSKEY { flags, algorithm, .. } = &key.rtype_with_data
                else {
                    continue;
                };
                if *flags != KSK_FLAGS || *algorithm != item.algorithm {
                    continue;
                }
                let kind = digest_kind(item.algorithm);
                if let Some(computed) = ds_digest(&zone, &key.rtype_with_data, kind) {
                    if computed.as_slice() == item.digest.as_ref() {
                        tracing::trace!(%zone, "anchored zone keys to parent DS");
                        return Ok(());
                    }
                }
            }
        }

        self.keys.remove(&zone);
        Err(ValidationError::DsMismatch)
    }
}

/// Group the DS records of a response by the zone they delegate to,
/// looking in every section.
pub(crate) fn delegation_signers(response: &Message) -> Vec<DsRrset> {
    let mut rrsets: Vec<DsRrset> = Vec::new();

    let records = response
        .answers
        .iter()
        .chain(response.authority.iter())
        .chain(response.additional.iter());
    for rr in records {
        if let RecordTypeWithData::DS {
            algorithm, digest, ..
        } = &rr.rtype_with_data
        {
            let item = Ds {
                algorithm: *algorithm,
                digest: digest.clone(),
            };
            if let Some(existing) = rrsets.iter_mut().find(|set| set.owner == rr.name) {
                existing.items.push(item);
            } else {
                rrsets.push(DsRrset {
                    owner: rr.name.clone(),
                    items: vec![item],
                });
            }
        }
    }

    rrsets
}

/// Pair each RRset with its RRSIG, matching by owner name and the
/// signature's `type_covered` field within each section, so the
/// pairing survives any record ordering a server picks.  RRsets
/// without a signature are not validated; signatures without a
/// matching RRset are ignored.
pub(crate) fn signed_pairs(response: &Message) -> Vec<(Rrset, Rrsig)> {
    let mut pairs = Vec::new();

    for section in [&response.answers, &response.authority, &response.additional] {
        let mut rrsets: Vec<Rrset> = Vec::new();
        let mut rrsigs: Vec<Rrsig> = Vec::new();

        for rr in section.iter() {
            match rr.rtype_with_data.rtype() {
                RecordType::RRSIG => {
                    if let Some(rrsig) = as_rrsig(rr) {
                        rrsigs.push(rrsig);
                    }
                }
                RecordType::OPT => (),
                rtype => {
                    if let Some(existing) = rrsets
                        .iter_mut()
                        .find(|set| set.owner == rr.name && set.rtype == rtype)
                    {
                        existing.records.push(rr.clone());
                    } else {
                        rrsets.push(Rrset {
                            owner: rr.name.clone(),
                            rtype,
                            records: vec![rr.clone()],
                        });
                    }
                }
            }
        }

        for rrsig in rrsigs {
            if let Some(rrset) = rrsets
                .iter()
                .find(|set| set.owner == rrsig.owner && set.rtype == rrsig.type_covered)
            {
                pairs.push((rrset.clone(), rrsig));
            }
        }
    }

    pairs
}

/// Verify an RRset against its RRSIG using the trusted keys of the
/// signing zone.  Keys are matched by algorithm and key tag; the
/// signature must also be inside its validity window.
pub(crate) fn verify_rrset(keys: &KeyStore, rrset: &Rrset, rrsig: &Rrsig) -> bool {
    let now = unix_time();
    if now < rrsig.inception || now > rrsig.expiration {
        tracing::debug!(owner = %rrsig.owner, "signature outside its validity window");
        return false;
    }

    let Some(zone_keys) = keys.get(&rrsig.signer_name) else {
        tracing::debug!(signer = %rrsig.signer_name, "no trusted keys for signing zone");
        return false;
    };

    let data = signed_data(rrset, rrsig);

    for key in zone_keys {
        let RecordTypeWithData::DNSKEY {
            algorithm,
            public_key,
            ..
        } = &key.rtype_with_data
        else {
            continue;
        };
        if *algorithm != rrsig.algorithm {
            continue;
        }
        if key_tag(&rdata_octets(&key.rtype_with_data)) != rrsig.key_tag {
            continue;
        }
        if verify_signature(*algorithm, public_key, &data, &rrsig.signature) {
            return true;
        }
    }

    false
}

/// The data an RRSIG signs: the RRSIG RDATA up to and including the
/// signer's name, followed by the RRset in canonical form with
/// RDATAs sorted.  See section 3.1.8.1 of RFC 4034.
pub(crate) fn signed_data(rrset: &Rrset, rrsig: &Rrsig) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&u16::from(rrsig.type_covered).to_be_bytes());
    data.push(rrsig.algorithm);
    data.push(rrsig.labels);
    data.extend_from_slice(&rrsig.original_ttl.to_be_bytes());
    data.extend_from_slice(&rrsig.expiration.to_be_bytes());
    data.extend_from_slice(&rrsig.inception.to_be_bytes());
    data.extend_from_slice(&rrsig.key_tag.to_be_bytes());
    data.extend_from_slice(&rrsig.signer_name.to_octets());

    let mut rdatas: Vec<Vec<u8>> = rrset
        .records
        .iter()
        .map(|rr| rdata_octets(&rr.rtype_with_data))
        .collect();
    rdatas.sort();

    let owner = rrset.owner.to_octets();
    let rclass = rrset
        .records
        .first()
        .map_or(RecordClass::IN, |rr| rr.rclass);
    for rdata in rdatas {
        let Ok(rdlength) = u16::try_from(rdata.len()) else {
            continue;
        };
        data.extend_from_slice(&owner);
        data.extend_from_slice(&u16::from(rrset.rtype).to_be_bytes());
        data.extend_from_slice(&u16::from(rclass).to_be_bytes());
        data.extend_from_slice(&rrsig.original_ttl.to_be_bytes());
        data.extend_from_slice(&rdlength.to_be_bytes());
        data.extend_from_slice(&rdata);
    }

    data
}

/// Compute the DS digest of a DNSKEY: the digest of the owner name
/// in wire form followed by the DNSKEY RDATA.  See section 5.1.4 of
/// RFC 4034.
pub(crate) fn ds_digest(
    zone: &DomainName,
    dnskey: &RecordTypeWithData,
    kind: DigestKind,
) -> Option<Vec<u8>> {
    let mut data = zone.to_octets();
    data.extend_from_slice(&rdata_octets(dnskey));
    kind.digest(&data)
}

/// The key tag of a DNSKEY RDATA.  See appendix B of RFC 4034.
pub(crate) fn key_tag(rdata: &[u8]) -> u16 {
    let mut acc: u32 = 0;
    for (i, octet) in rdata.iter().enumerate() {
        if i % 2 == 0 {
            acc += u32::from(*octet) << 8;
        } else {
            acc += u32::from(*octet);
        }
    }
    acc += (acc >> 16) & 0xffff;
    (acc & 0xffff) as u16
}

/// Digest family used when hashing a key signing key into a DS
/// digest.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) enum DigestKind {
    Md5,
    Sha1,
    Sha128,
    Sha256,
    Sha512,
}

impl DigestKind {
    /// MD5 has no `ring` implementation and "SHA128" names no real
    /// digest function, so those families can never produce a
    /// matching digest.
    fn digest(self, data: &[u8]) -> Option<Vec<u8>> {
        let algorithm = match self {
            DigestKind::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            DigestKind::Sha256 => &digest::SHA256,
            DigestKind::Sha512 => &digest::SHA512,
            DigestKind::Md5 | DigestKind::Sha128 => return None,
        };
        Some(digest::digest(algorithm, data).as_ref().to_vec())
    }
}

/// Choose the digest family for a DS digest by ordered substring
/// match over the security algorithm's mnemonic; first match wins,
/// and SHA256 is the default when nothing matches.
pub(crate) fn digest_kind(algorithm: u8) -> DigestKind {
    let mnemonic = algorithm_mnemonic(algorithm);
    let candidates = [
        ("MD5", DigestKind::Md5),
        ("SHA1", DigestKind::Sha1),
        ("SHA128", DigestKind::Sha128),
        ("SHA256", DigestKind::Sha256),
        ("SHA512", DigestKind::Sha512),
    ];

    for (needle, kind) in candidates {
        if mnemonic.contains(needle) {
            return kind;
        }
    }

    DigestKind::Sha256
}

/// The registered mnemonic of a DNSSEC security algorithm number.
fn algorithm_mnemonic(algorithm: u8) -> &'static str {
    match algorithm {
        1 => "RSAMD5",
        3 => "DSA",
        5 => "RSASHA1",
        6 => "DSANSEC3SHA1",
        7 => "RSASHA1NSEC3SHA1",
        8 => "RSASHA256",
        10 => "RSASHA512",
        13 => "ECDSAP256SHA256",
        14 => "ECDSAP384SHA384",
        15 => "ED25519",
        16 => "ED448",
        _ => "",
    }
}

/// Verify one signature with the primitive its algorithm number
/// calls for.  RSA/MD5 (1) and DSA (3, 6) have no `ring`
/// implementation and never verify.
fn verify_signature(algorithm: u8, public_key: &[u8], data: &[u8], sig: &[u8]) -> bool {
    match algorithm {
        // RSA/SHA-1, with and without NSEC3
        5 | 7 => rsa_verify(
            &signature::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY,
            public_key,
            data,
            sig,
        ),
        // RSA/SHA-256
        8 => rsa_verify(
            &signature::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY,
            public_key,
            data,
            sig,
        ),
        // RSA/SHA-512
        10 => rsa_verify(
            &signature::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY,
            public_key,
            data,
            sig,
        ),
        // ECDSA P-256/SHA-256: the DNSKEY holds the bare curve point,
        // ring wants it with the uncompressed-point prefix
        13 => {
            let mut point = Vec::with_capacity(public_key.len() + 1);
            point.push(0x04);
            point.extend_from_slice(public_key);
            signature::UnparsedPublicKey::new(&signature::ECDSA_P256_SHA256_FIXED, point)
                .verify(data, sig)
                .is_ok()
        }
        // ECDSA P-384/SHA-384
        14 => {
            let mut point = Vec::with_capacity(public_key.len() + 1);
            point.push(0x04);
            point.extend_from_slice(public_key);
            signature::UnparsedPublicKey::new(&signature::ECDSA_P384_SHA384_FIXED, point)
                .verify(data, sig)
                .is_ok()
        }
        // Ed25519
        15 => signature::UnparsedPublicKey::new(&signature::ED25519, public_key)
            .verify(data, sig)
            .is_ok(),
        _ => false,
    }
}

fn rsa_verify(
    params: &'static signature::RsaParameters,
    public_key: &[u8],
    data: &[u8],
    sig: &[u8],
) -> bool {
    let Some((e, n)) = rsa_exponent_modulus(public_key) else {
        return false;
    };
    signature::RsaPublicKeyComponents { n, e }
        .verify(params, data, sig)
        .is_ok()
}

/// Split an RFC 3110 RSA public key into exponent and modulus: a
/// one-octet exponent length (or zero followed by a two-octet
/// length), the exponent, then the modulus.
fn rsa_exponent_modulus(public_key: &[u8]) -> Option<(&[u8], &[u8])> {
    let (exponent_len, rest) = match *public_key {
        [0, hi, lo, ref rest @ ..] => (usize::from(u16::from_be_bytes([hi, lo])), rest),
        [len, ref rest @ ..] => (usize::from(len), rest),
        [] => return None,
    };

    if exponent_len == 0 || rest.len() <= exponent_len {
        return None;
    }

    Some((&rest[..exponent_len], &rest[exponent_len..]))
}

fn unix_time() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since_epoch| since_epoch.as_secs())
        .map_or(0, |secs| u32::try_from(secs).unwrap_or(u32::MAX))
}

fn rdata_octets(rtype_with_data: &RecordTypeWithData) -> Vec<u8> {
    let mut buffer = WritableBuffer::default();
    rtype_with_data.serialise_rdata(&mut buffer);
    buffer.octets.to_vec()
}

#[cfg(test)]
mod tests {
    use ring::signature::{Ed25519KeyPair, KeyPair};
    use std::net::Ipv4Addr;

    use dns_types::protocol::types::test_util::*;

    use super::*;

    /// DNSSEC algorithm number for Ed25519, the one algorithm we can
    /// also sign with in tests.
    const ED25519: u8 = 15;

    fn test_key_pair() -> Ed25519KeyPair {
        Ed25519KeyPair::from_seed_unchecked(&[7; 32]).unwrap()
    }

    fn signed_a_rrset(key_pair: &Ed25519KeyPair) -> (ResourceRecord, Rrset, Rrsig) {
        let dnskey = dnskey_record("example.com.", 257, ED25519, key_pair.public_key().as_ref());
        let tag = key_tag(&rdata_octets(&dnskey.rtype_with_data));

        let rrset = Rrset {
            owner: domain("www.example.com."),
            rtype: RecordType::A,
            records: vec![a_record("www.example.com.", Ipv4Addr::new(93, 184, 216, 34))],
        };
        let mut rrsig = Rrsig {
            owner: domain("www.example.com."),
            type_covered: RecordType::A,
            algorithm: ED25519,
            labels: 3,
            original_ttl: 300,
            expiration: u32::MAX,
            inception: 0,
            key_tag: tag,
            signer_name: domain("example.com."),
            signature: Bytes::new(),
        };
        let data = signed_data(&rrset, &rrsig);
        rrsig.signature = Bytes::copy_from_slice(key_pair.sign(&data).as_ref());

        (dnskey, rrset, rrsig)
    }

    #[test]
    fn verify_rrset_accepts_valid_signature() {
        let key_pair = test_key_pair();
        let (dnskey, rrset, rrsig) = signed_a_rrset(&key_pair);

        let mut keys = KeyStore::new();
        keys.insert(domain("example.com."), vec![dnskey]);

        assert!(verify_rrset(&keys, &rrset, &rrsig));
    }

    #[test]
    fn verify_rrset_rejects_tampered_records() {
        let key_pair = test_key_pair();
        let (dnskey, _, rrsig) = signed_a_rrset(&key_pair);

        let mut keys = KeyStore::new();
        keys.insert(domain("example.com."), vec![dnskey]);

        let tampered = Rrset {
            owner: domain("www.example.com."),
            rtype: RecordType::A,
            records: vec![a_record("www.example.com.", Ipv4Addr::new(6, 6, 6, 6))],
        };

        assert!(!verify_rrset(&keys, &tampered, &rrsig));
    }

    #[test]
    fn verify_rrset_rejects_unknown_signer() {
        let key_pair = test_key_pair();
        let (_, rrset, rrsig) = signed_a_rrset(&key_pair);

        assert!(!verify_rrset(&KeyStore::new(), &rrset, &rrsig));
    }

    #[test]
    fn verify_rrset_rejects_expired_signature() {
        let key_pair = test_key_pair();
        let (dnskey, rrset, mut rrsig) = signed_a_rrset(&key_pair);
        rrsig.expiration = 1;
        let data = signed_data(&rrset, &rrsig);
        rrsig.signature = Bytes::copy_from_slice(key_pair.sign(&data).as_ref());

        let mut keys = KeyStore::new();
        keys.insert(domain("example.com."), vec![dnskey]);

        assert!(!verify_rrset(&keys, &rrset, &rrsig));
    }

    #[test]
    fn verify_rrset_skips_keys_with_other_algorithms() {
        let key_pair = test_key_pair();
        let (_, rrset, rrsig) = signed_a_rrset(&key_pair);

        // same key material, advertised under a different algorithm
        let mismatched =
            dnskey_record("example.com.", 257, 13, key_pair.public_key().as_ref());
        let mut keys = KeyStore::new();
        keys.insert(domain("example.com."), vec![mismatched]);

        assert!(!verify_rrset(&keys, &rrset, &rrsig));
    }

    #[test]
    fn verify_rrset_handles_self_signed_dnskey() {
        let key_pair = test_key_pair();
        let dnskey = dnskey_record("example.com.", 257, ED25519, key_pair.public_key().as_ref());
        let tag = key_tag(&rdata_octets(&dnskey.rtype_with_data));

        let rrset = Rrset {
            owner: domain("example.com."),
            rtype: RecordType::DNSKEY,
            records: vec![dnskey.clone()],
        };
        let mut rrsig = Rrsig {
            owner: domain("example.com."),
            type_covered: RecordType::DNSKEY,
            algorithm: ED25519,
            labels: 2,
            original_ttl: 300,
            expiration: u32::MAX,
            inception: 0,
            key_tag: tag,
            signer_name: domain("example.com."),
            signature: Bytes::new(),
        };
        let data = signed_data(&rrset, &rrsig);
        rrsig.signature = Bytes::copy_from_slice(key_pair.sign(&data).as_ref());

        let mut keys = KeyStore::new();
        keys.insert(domain("example.com."), vec![dnskey]);

        assert!(verify_rrset(&keys, &rrset, &rrsig));
    }

    #[test]
    fn ds_digest_anchors_matching_key() {
        let key_pair = test_key_pair();
        let dnskey = dnskey_record("example.com.", 257, ED25519, key_pair.public_key().as_ref());

        let kind = digest_kind(ED25519);
        assert_eq!(DigestKind::Sha256, kind);

        let computed = ds_digest(&domain("example.com."), &dnskey.rtype_with_data, kind).unwrap();
        assert_eq!(32, computed.len());

        // deterministic: recomputing matches
        assert_eq!(
            Some(computed.clone()),
            ds_digest(&domain("example.com."), &dnskey.rtype_with_data, kind)
        );

        // different zone or digest family yields a different digest
        assert_ne!(
            Some(computed.clone()),
            ds_digest(&domain("example.net."), &dnskey.rtype_with_data, kind)
        );
        let sha1 = ds_digest(
            &domain("example.com."),
            &dnskey.rtype_with_data,
            DigestKind::Sha1,
        )
        .unwrap();
        assert_eq!(20, sha1.len());
        assert_ne!(computed, sha1);
    }

    #[test]
    fn ds_digest_unsupported_families_produce_nothing() {
        let dnskey = dnskey_record("example.com.", 257, 1, &[1, 2, 3]);
        assert_eq!(
            None,
            ds_digest(
                &domain("example.com."),
                &dnskey.rtype_with_data,
                DigestKind::Md5
            )
        );
        assert_eq!(
            None,
            ds_digest(
                &domain("example.com."),
                &dnskey.rtype_with_data,
                DigestKind::Sha128
            )
        );
    }

    #[test]
    fn digest_kind_substring_mapping() {
        assert_eq!(DigestKind::Md5, digest_kind(1)); // RSAMD5
        assert_eq!(DigestKind::Sha1, digest_kind(5)); // RSASHA1
        assert_eq!(DigestKind::Sha1, digest_kind(6)); // DSANSEC3SHA1
        assert_eq!(DigestKind::Sha1, digest_kind(7)); // RSASHA1NSEC3SHA1
        assert_eq!(DigestKind::Sha256, digest_kind(8)); // RSASHA256
        assert_eq!(DigestKind::Sha512, digest_kind(10)); // RSASHA512
        assert_eq!(DigestKind::Sha256, digest_kind(13)); // ECDSAP256SHA256
    }

    #[test]
    fn digest_kind_defaults_to_sha256() {
        assert_eq!(DigestKind::Sha256, digest_kind(15)); // ED25519: no substring hit
        assert_eq!(DigestKind::Sha256, digest_kind(3)); // DSA
        assert_eq!(DigestKind::Sha256, digest_kind(99)); // unassigned
    }

    #[test]
    fn key_tag_matches_hand_computed_value() {
        // flags 257, protocol 3, algorithm 13, empty key:
        // 0x0101 + 0x030d = 0x040e
        assert_eq!(0x040e, key_tag(&[0x01, 0x01, 0x03, 0x0d]));
    }

    #[test]
    fn key_tag_odd_length() {
        // trailing lone octet contributes its high-shifted value
        assert_eq!(0x0101 + 0x0300, u32::from(key_tag(&[0x01, 0x01, 0x03])));
    }

    #[test]
    fn rsa_exponent_modulus_short_form() {
        // exponent length 3, exponent 65537, modulus 1 2 3 4
        let key = [3, 1, 0, 1, 1, 2, 3, 4];
        let (e, n) = rsa_exponent_modulus(&key).unwrap();
        assert_eq!(&[1, 0, 1], e);
        assert_eq!(&[1, 2, 3, 4], n);
    }

    #[test]
    fn rsa_exponent_modulus_long_form() {
        let mut key = vec![0, 1, 0]; // two-octet length: 256
        key.extend_from_slice(&[7; 256]); // exponent
        key.extend_from_slice(&[1, 2, 3]); // modulus
        let (e, n) = rsa_exponent_modulus(&key).unwrap();
        assert_eq!(256, e.len());
        assert_eq!(&[1, 2, 3], n);
    }

    #[test]
    fn rsa_exponent_modulus_rejects_truncated_keys() {
        assert!(rsa_exponent_modulus(&[]).is_none());
        assert!(rsa_exponent_modulus(&[3, 1, 0]).is_none()); // no modulus
        assert!(rsa_exponent_modulus(&[0, 0, 4, 1]).is_none());
    }

    #[test]
    fn signed_pairs_matches_by_type_covered_in_any_order() {
        let question = Question {
            name: domain("www.example.com."),
            qtype: RecordType::A,
            qclass: RecordClass::IN,
        };
        let request = Message::from_question(1234, question);
        let mut response = request.make_response();
        // signature first, then the records it covers, interleaved
        // with an unrelated NS set
        response.answers = vec![
            rrsig_record(
                "www.example.com.",
                RecordType::A,
                ED25519,
                3,
                300,
                1,
                "example.com.",
                &[1, 2, 3],
            ),
            ns_record("example.com.", "ns1.example.net."),
            a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1)),
            a_record("www.example.com.", Ipv4Addr::new(2, 2, 2, 2)),
        ];

        let pairs = signed_pairs(&response);
        assert_eq!(1, pairs.len());
        let (rrset, rrsig) = &pairs[0];
        assert_eq!(RecordType::A, rrset.rtype);
        assert_eq!(2, rrset.records.len());
        assert_eq!(RecordType::A, rrsig.type_covered);
    }

    #[test]
    fn signed_pairs_does_not_pair_across_sections() {
        let question = Question {
            name: domain("www.example.com."),
            qtype: RecordType::A,
            qclass: RecordClass::IN,
        };
        let request = Message::from_question(1234, question);
        let mut response = request.make_response();
        response.answers = vec![a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1))];
        response.authority = vec![rrsig_record(
            "www.example.com.",
            RecordType::A,
            ED25519,
            3,
            300,
            1,
            "example.com.",
            &[1, 2, 3],
        )];

        assert!(signed_pairs(&response).is_empty());
    }

    #[test]
    fn delegation_signers_groups_by_owner() {
        let question = Question {
            name: domain("www.example.com."),
            qtype: RecordType::A,
            qclass: RecordClass::IN,
        };
        let request = Message::from_question(1234, question);
        let mut response = request.make_response();
        response.authority = vec![
            ds_record("example.com.", 1, 8, 2, &[1, 1]),
            ns_record("example.com.", "ns1.example.net."),
            ds_record("example.com.", 2, 13, 2, &[2, 2]),
            ds_record("example.net.", 3, 13, 2, &[3, 3]),
        ];

        let signers = delegation_signers(&response);
        assert_eq!(2, signers.len());
        assert_eq!(domain("example.com."), signers[0].owner);
        assert_eq!(2, signers[0].items.len());
        assert_eq!(domain("example.net."), signers[1].owner);
        assert_eq!(1, signers[1].items.len());
    }
}

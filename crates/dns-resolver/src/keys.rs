//! The store of DNSKEY RRsets trusted for the lifetime of the
//! process.

use std::collections::HashMap;

use dns_types::protocol::types::{DomainName, ResourceRecord};

/// Map from zone name to the DNSKEY RRset currently trusted for that
/// zone.
///
/// The root entry is installed once at startup from the trust-anchor
/// bootstrap.  Every other entry is added by the validator, and only
/// after the RRset has passed its self-signature check and its key
/// signing key has hashed to a DS digest validated in the parent.
/// The validator's "insert, verify, remove on failure" sequence means
/// an entry may exist briefly before its verification completes;
/// single-threaded use keeps that unobservable.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    entries: HashMap<DomainName, Vec<ResourceRecord>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, zone: DomainName, dnskey_rrset: Vec<ResourceRecord>) {
        self.entries.insert(zone, dnskey_rrset);
    }

    pub fn remove(&mut self, zone: &DomainName) {
        self.entries.remove(zone);
    }

    pub fn get(&self, zone: &DomainName) -> Option<&[ResourceRecord]> {
        self.entries.get(zone).map(Vec::as_slice)
    }

    pub fn contains(&self, zone: &DomainName) -> bool {
        self.entries.contains_key(zone)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

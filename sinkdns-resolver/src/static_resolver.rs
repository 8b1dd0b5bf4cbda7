use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use sinkdns_proto::{QueryType, Question, Record};

use crate::prelude::Resolve;

/// Answers from a fixed, in-process (name -> address) table with a single
/// configured TTL. This one type backs both the blocklist sinkhole (seeded
/// with `0.0.0.0`/`::1` for every blocked domain) and the custom-pin
/// resolver (seeded from user-configured overrides) — the two are the same
/// shape of data, just different sources and TTLs, so there is exactly one
/// implementation.
#[derive(Debug, Default)]
pub struct StaticResolver {
    name: &'static str,
    ttl: u32,
    v4: HashMap<String, Ipv4Addr>,
    v6: HashMap<String, Ipv6Addr>,
}

impl StaticResolver {
    pub fn new(name: &'static str, ttl: u32) -> Self {
        Self {
            name,
            ttl,
            v4: HashMap::new(),
            v6: HashMap::new(),
        }
    }

    pub fn insert_v4(&mut self, name: impl Into<String>, addr: Ipv4Addr) {
        self.v4.insert(name.into().to_lowercase(), addr);
    }

    pub fn insert_v6(&mut self, name: impl Into<String>, addr: Ipv6Addr) {
        self.v6.insert(name.into().to_lowercase(), addr);
    }

    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }
}

#[async_trait::async_trait]
impl Resolve for StaticResolver {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn resolve(&self, question: &Question) -> Option<Record> {
        let key = question.name.to_lowercase();
        match question.qtype {
            QueryType::A => self.v4.get(&key).map(|addr| Record::A {
                domain: question.name.clone(),
                addr: *addr,
                ttl: self.ttl,
            }),
            QueryType::AAAA => self.v6.get(&key).map(|addr| Record::AAAA {
                domain: question.name.clone(),
                addr: *addr,
                ttl: self.ttl,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_seeded_v4_entry() {
        let mut resolver = StaticResolver::new("block", 600);
        resolver.insert_v4("ads.example", Ipv4Addr::new(0, 0, 0, 0));

        let question = Question::new("ads.example".into(), QueryType::A);
        assert_eq!(
            resolver.resolve(&question).await,
            Some(Record::A {
                domain: "ads.example".into(),
                addr: Ipv4Addr::new(0, 0, 0, 0),
                ttl: 600,
            })
        );
    }

    #[tokio::test]
    async fn misses_on_unknown_name() {
        let resolver = StaticResolver::new("custom", 200);
        let question = Question::new("unknown.example".into(), QueryType::A);
        assert!(resolver.resolve(&question).await.is_none());
    }

    #[tokio::test]
    async fn is_case_insensitive() {
        let mut resolver = StaticResolver::new("block", 600);
        resolver.insert_v4("Ads.Example", Ipv4Addr::new(0, 0, 0, 0));
        let question = Question::new("ads.example".into(), QueryType::A);
        assert!(resolver.resolve(&question).await.is_some());
    }
}

use std::net::{Ipv4Addr, Ipv6Addr};

use serde::Deserialize;

use sinkdns_proto::{QueryType, Question, Record};

use crate::{Upstream, UpstreamError};

/// Compression-pointer-style loop guard for CNAME chains: the source this
/// is grounded on follows CNAME answers with no depth limit at all, which a
/// malicious or misconfigured upstream can turn into unbounded recursion.
const MAX_CNAME_HOPS: u8 = 8;

const CNAME_TYPE: u16 = 5;

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status")]
    status: i32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    kind: u16,
    #[serde(rename = "TTL")]
    ttl: u32,
    data: String,
}

/// DNS-over-HTTPS JSON client (the `application/dns-json` API shape served
/// by Cloudflare/Google), not the binary `application/dns-message` form.
#[derive(Debug)]
pub struct DohUpstream {
    client: reqwest::Client,
    endpoint: String,
}

impl DohUpstream {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn query(&self, name: &str, qtype: QueryType) -> Result<DohResponse, UpstreamError> {
        let type_param = match qtype {
            QueryType::A => "A",
            QueryType::AAAA => "AAAA",
        };
        let response = self
            .client
            .get(&self.endpoint)
            .header("accept", "application/dns-json")
            .query(&[("name", name), ("type", type_param)])
            .send()
            .await?
            .json::<DohResponse>()
            .await?;

        if response.status != 0 {
            return Err(UpstreamError::DohStatus(response.status));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Upstream for DohUpstream {
    #[tracing::instrument(skip(self))]
    async fn resolve(&self, question: &Question) -> Result<Record, UpstreamError> {
        let mut current_name = question.name.clone();
        let mut hops = 0u8;

        loop {
            let response = self.query(&current_name, question.qtype).await?;
            let answer = response
                .answer
                .into_iter()
                .next()
                .ok_or(UpstreamError::EmptyAnswer)?;

            if answer.kind != CNAME_TYPE && answer.kind != question.qtype.to_num() {
                return Err(UpstreamError::UnsupportedAnswerType);
            }

            if answer.kind == CNAME_TYPE {
                hops += 1;
                if hops > MAX_CNAME_HOPS {
                    return Err(UpstreamError::TooManyRedirects(MAX_CNAME_HOPS));
                }
                current_name = answer.data;
                continue;
            }

            return to_record(question, &answer.data, answer.ttl);
        }
    }
}

fn to_record(question: &Question, data: &str, ttl: u32) -> Result<Record, UpstreamError> {
    match question.qtype {
        QueryType::A => {
            let addr: Ipv4Addr = data.parse().map_err(|_| UpstreamError::UnsupportedAnswerType)?;
            Ok(Record::A {
                domain: question.name.clone(),
                addr,
                ttl,
            })
        }
        QueryType::AAAA => {
            let addr: Ipv6Addr = data.parse().map_err(|_| UpstreamError::UnsupportedAnswerType)?;
            Ok(Record::AAAA {
                domain: question.name.clone(),
                addr,
                ttl,
            })
        }
    }
}

use std::collections::HashMap;
use std::sync::Mutex;

use sinkdns_proto::{QueryType, Question, Record};

use crate::prelude::Resolve;

/// Test double implementing [`Resolve`] from a fixed stub table, used by
/// this crate's own chain tests and by downstream crates assembling the
/// full resolver chain.
#[derive(Debug)]
pub struct MockResolver {
    name: String,
    responses: Mutex<HashMap<(QueryType, String), Record>>,
}

impl MockResolver {
    pub fn new<I: Into<String>>(name: I) -> Self {
        Self {
            name: name.into(),
            responses: Mutex::new(HashMap::new()),
        }
    }

    pub fn stub(&mut self, qtype: QueryType, hostname: &str, record: Record) {
        self.responses
            .get_mut()
            .unwrap()
            .insert((qtype, hostname.to_string()), record);
    }
}

#[async_trait::async_trait]
impl Resolve for MockResolver {
    fn name(&self) -> &'static str {
        "mock-resolver"
    }

    async fn resolve(&self, question: &Question) -> Option<Record> {
        self.responses
            .lock()
            .unwrap()
            .get(&(question.qtype, question.name.clone()))
            .cloned()
    }
}

//! Mock issue tracker for testing

#![allow(dead_code)]

use async_trait::async_trait;
use release_train::error::{Error, Result};
use release_train::tracker::{IssueTracker, TicketQuery};
use release_train::types::Ticket;
use std::sync::Mutex;

/// Tracker that knows a fixed set of release tickets
///
/// Searches return the configured tickets whose keys appear in the query,
/// standing in for Jira's project/release/status filtering.
pub struct MockTracker {
    tickets: Mutex<Vec<Ticket>>,
    queries: Mutex<Vec<TicketQuery>>,
    error_on_search: Mutex<Option<String>>,
}

impl MockTracker {
    /// Tracker whose release contains `tickets`
    pub fn with_tickets(tickets: Vec<Ticket>) -> Self {
        Self {
            tickets: Mutex::new(tickets),
            queries: Mutex::new(Vec::new()),
            error_on_search: Mutex::new(None),
        }
    }

    /// Make `search_tickets` return an error
    pub fn fail_search(&self, msg: &str) {
        *self.error_on_search.lock().unwrap() = Some(msg.to_string());
    }

    /// Queries received so far
    pub fn get_queries(&self) -> Vec<TicketQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    async fn search_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>> {
        self.queries.lock().unwrap().push(query.clone());

        if let Some(msg) = self.error_on_search.lock().unwrap().as_ref() {
            return Err(Error::JiraApi(msg.clone()));
        }

        let tickets = self.tickets.lock().unwrap();
        Ok(tickets
            .iter()
            .filter(|t| query.keys.contains(&t.key))
            .cloned()
            .collect())
    }
}

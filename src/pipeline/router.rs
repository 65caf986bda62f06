//! Static routing of classified results to output channels

use crate::pipeline::outcome::{Category, ClassifiedResult, OutcomeKind};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A labelled output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SinkId {
    GoodPasswords,
    BadPasswords,
    EmailResults,
    BothResults,
    BadRequests,
}

impl SinkId {
    /// Order in which channels are closed once all workers are done
    pub const CLOSE_ORDER: [SinkId; 5] = [
        SinkId::GoodPasswords,
        SinkId::BadPasswords,
        SinkId::EmailResults,
        SinkId::BothResults,
        SinkId::BadRequests,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            SinkId::GoodPasswords => "good_passwords.txt",
            SinkId::BadPasswords => "bad_passwords.txt",
            SinkId::EmailResults => "email_results.txt",
            SinkId::BothResults => "both_results.txt",
            SinkId::BadRequests => "bad_requests.txt",
        }
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// {input category, outcome kind} -> sink
const ROUTES: &[(Category, OutcomeKind, SinkId)] = &[
    (Category::Passwords, OutcomeKind::Clean, SinkId::GoodPasswords),
    (Category::Passwords, OutcomeKind::Compromised, SinkId::BadPasswords),
    (Category::Passwords, OutcomeKind::Failure, SinkId::BadRequests),
    (Category::Emails, OutcomeKind::Breached, SinkId::EmailResults),
    (Category::Emails, OutcomeKind::Failure, SinkId::BadRequests),
    (Category::Both, OutcomeKind::Clean, SinkId::GoodPasswords),
    (Category::Both, OutcomeKind::Compromised, SinkId::BadPasswords),
    (Category::Both, OutcomeKind::Breached, SinkId::BothResults),
    (Category::Both, OutcomeKind::Failure, SinkId::BadRequests),
];

/// Routing table restricted to the categories that have work
#[derive(Debug, Clone)]
pub struct RoutingTable {
    routes: HashMap<(Category, OutcomeKind), SinkId>,
}

impl RoutingTable {
    pub fn for_categories(active: &[Category]) -> Self {
        let routes = ROUTES
            .iter()
            .filter(|(category, _, _)| active.contains(category))
            .map(|&(category, outcome, sink)| ((category, outcome), sink))
            .collect();
        Self { routes }
    }

    pub fn resolve(&self, category: Category, outcome: OutcomeKind) -> Option<SinkId> {
        self.routes.get(&(category, outcome)).copied()
    }

    /// Sinks that can receive data; the failure sink is always present
    pub fn sinks(&self) -> BTreeSet<SinkId> {
        let mut sinks: BTreeSet<SinkId> = self.routes.values().copied().collect();
        sinks.insert(SinkId::BadRequests);
        sinks
    }
}

/// Receiving halves handed to the writers
pub type ChannelReceivers = Vec<(SinkId, mpsc::Receiver<String>)>;

/// Fans classified results out to per-sink channels
pub struct ResultRouter {
    table: RoutingTable,
    senders: HashMap<SinkId, mpsc::Sender<String>>,
}

impl ResultRouter {
    /// Create one channel per sink in `table`, each able to hold
    /// `capacity` lines so producers never wait on a writer.
    pub fn new(table: RoutingTable, capacity: usize) -> (Self, ChannelReceivers) {
        let capacity = capacity.max(1);
        let mut senders = HashMap::new();
        let mut receivers = Vec::new();

        for sink in table.sinks() {
            let (tx, rx) = mpsc::channel(capacity);
            senders.insert(sink, tx);
            receivers.push((sink, rx));
        }

        (Self { table, senders }, receivers)
    }

    /// Deliver a result; returns the sink it was routed to
    pub async fn route(&self, category: Category, result: &ClassifiedResult) -> Option<SinkId> {
        let outcome = result.outcome();
        let Some(sink) = self.table.resolve(category, outcome) else {
            warn!(?category, ?outcome, "no route for result");
            return None;
        };
        let Some(sender) = self.senders.get(&sink) else {
            warn!(%sink, "no channel for sink");
            return None;
        };

        // Fails only when the writer gave up, which it reports itself
        if sender.send(result.to_line()).await.is_err() {
            debug!(%sink, "writer gone, dropping line");
        }
        Some(sink)
    }

    /// Close every channel in [`SinkId::CLOSE_ORDER`]
    pub fn close(mut self) {
        for sink in SinkId::CLOSE_ORDER {
            if self.senders.remove(&sink).is_some() {
                debug!(%sink, "channel closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::outcome::CredentialKind;

    #[test]
    fn test_password_only_sinks() {
        let table = RoutingTable::for_categories(&[Category::Passwords]);
        let sinks: Vec<_> = table.sinks().into_iter().collect();
        assert_eq!(
            sinks,
            vec![SinkId::GoodPasswords, SinkId::BadPasswords, SinkId::BadRequests]
        );
        assert_eq!(table.resolve(Category::Emails, OutcomeKind::Breached), None);
    }

    #[test]
    fn test_both_routes_to_password_sinks() {
        let table = RoutingTable::for_categories(&[Category::Both]);
        assert_eq!(
            table.resolve(Category::Both, OutcomeKind::Breached),
            Some(SinkId::BothResults)
        );
        assert_eq!(
            table.resolve(Category::Both, OutcomeKind::Compromised),
            Some(SinkId::BadPasswords)
        );
        assert!(table.sinks().contains(&SinkId::GoodPasswords));
        assert!(!table.sinks().contains(&SinkId::EmailResults));
    }

    #[test]
    fn test_failure_sink_always_present() {
        let table = RoutingTable::for_categories(&[]);
        assert_eq!(table.sinks().into_iter().collect::<Vec<_>>(), vec![SinkId::BadRequests]);
    }

    #[tokio::test]
    async fn test_route_and_close() {
        let table = RoutingTable::for_categories(&[Category::Emails]);
        let (router, mut receivers) = ResultRouter::new(table, 4);
        assert_eq!(receivers.len(), 2);

        let breached = ClassifiedResult::BreachedEmail("a@b.c".to_string());
        let failed = ClassifiedResult::status_failure(CredentialKind::Email, "d@e.f", 500);
        assert_eq!(
            router.route(Category::Emails, &breached).await,
            Some(SinkId::EmailResults)
        );
        assert_eq!(
            router.route(Category::Emails, &failed).await,
            Some(SinkId::BadRequests)
        );
        assert_eq!(
            router
                .route(Category::Passwords, &ClassifiedResult::Clean("x".into()))
                .await,
            None
        );
        router.close();

        let (sink, rx) = &mut receivers[0];
        assert_eq!(*sink, SinkId::EmailResults);
        assert_eq!(rx.recv().await.as_deref(), Some("a@b.c : Compromis"));
        assert_eq!(rx.recv().await, None);

        let (_, rx) = &mut receivers[1];
        assert_eq!(rx.recv().await.as_deref(), Some("Email: d@e.f, Status: 500"));
        assert_eq!(rx.recv().await, None);
    }
}

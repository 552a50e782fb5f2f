//! Concurrency-safe ticket storage.
//!
//! Every operation runs inside one short critical section over a single map.
//! Nothing inside the lock performs I/O or draws randomness, so holding a
//! `std::sync::Mutex` from async handlers is fine.

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
    time::SystemTime,
};

use super::{Ticket, TicketClass, TicketFactory};

/// Result of an atomic check-and-consume.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Consumed {
    /// Predicate accepted the ticket and it was removed.
    Taken(Ticket),
    /// Predicate refused the ticket; it is still in the store.
    Rejected(Ticket),
    /// No ticket with that value.
    Missing,
}

/// Keyed container for tickets.
///
/// All operations are total: an unknown value is a normal `None`, never an error.
pub trait TicketStore: Send + Sync {
    /// Allocate a fresh unique value, insert the ticket and return it.
    fn create(&self, class: TicketClass, service: &str, user: &str, renew: bool) -> Ticket;

    fn get(&self, value: &str) -> Option<Ticket>;

    /// Atomic get-and-delete. At most one caller ever receives a given ticket.
    fn consume(&self, value: &str) -> Option<Ticket>;

    /// Atomic check-and-consume: the ticket is removed only when `accept` returns true.
    fn consume_if(&self, value: &str, accept: &dyn Fn(&Ticket) -> bool) -> Consumed;

    fn delete(&self, value: &str);

    /// Remove every ticket of `class` created before `older_than`; returns how many.
    fn sweep(&self, older_than: SystemTime, class: TicketClass) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct MemoryTicketStore {
    factory: TicketFactory,
    tickets: Mutex<HashMap<String, Ticket>>,
}

impl MemoryTicketStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panic elsewhere while holding the lock cannot leave the map half-updated
    // (every mutation is a single HashMap call), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Ticket>> {
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TicketStore for MemoryTicketStore {
    fn create(&self, class: TicketClass, service: &str, user: &str, renew: bool) -> Ticket {
        // Values are drawn from the OS RNG outside the lock; only the insert is serialized.
        loop {
            let value = self.factory.new_value(class);
            if let Entry::Vacant(slot) = self.lock().entry(value) {
                let ticket = Ticket {
                    class,
                    value: slot.key().clone(),
                    user: user.to_string(),
                    service: service.to_string(),
                    created_at: SystemTime::now(),
                    renew,
                };
                slot.insert(ticket.clone());
                return ticket;
            }
        }
    }

    fn get(&self, value: &str) -> Option<Ticket> {
        self.lock().get(value).cloned()
    }

    fn consume(&self, value: &str) -> Option<Ticket> {
        self.lock().remove(value)
    }

    fn consume_if(&self, value: &str, accept: &dyn Fn(&Ticket) -> bool) -> Consumed {
        let mut tickets = self.lock();
        let Some(ticket) = tickets.get(value) else {
            return Consumed::Missing;
        };
        if !accept(ticket) {
            return Consumed::Rejected(ticket.clone());
        }
        tickets
            .remove(value)
            .map_or(Consumed::Missing, Consumed::Taken)
    }

    fn delete(&self, value: &str) {
        self.lock().remove(value);
    }

    fn sweep(&self, older_than: SystemTime, class: TicketClass) -> usize {
        let mut tickets = self.lock();
        let before = tickets.len();
        tickets.retain(|_, ticket| ticket.class != class || !ticket.created_before(older_than));
        before - tickets.len()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::{
        sync::{Arc, Barrier},
        thread,
        time::Duration,
    };

    const SERVICE: &str = "https://svc.example/app";

    #[test]
    fn get_returns_created_ticket() {
        let store = MemoryTicketStore::new();
        let ticket = store.create(TicketClass::Service, SERVICE, "alice", true);
        assert_eq!(store.get(&ticket.value), Some(ticket.clone()));
        assert_eq!(ticket.user, "alice");
        assert_eq!(ticket.service, SERVICE);
        assert!(ticket.renew);
        assert!(ticket.value.starts_with("ST-"));
    }

    #[test]
    fn unknown_values_are_absent() {
        let store = MemoryTicketStore::new();
        assert_eq!(store.get("ST-unknown"), None);
        assert_eq!(store.consume("ST-unknown"), None);
        assert_eq!(store.consume_if("ST-unknown", &|_| true), Consumed::Missing);
        store.delete("ST-unknown");
        assert!(store.is_empty());
    }

    #[test]
    fn consume_is_single_use() {
        let store = MemoryTicketStore::new();
        let ticket = store.create(TicketClass::Service, SERVICE, "alice", false);
        assert_eq!(store.consume(&ticket.value), Some(ticket.clone()));
        assert_eq!(store.consume(&ticket.value), None);
        assert_eq!(store.get(&ticket.value), None);
    }

    #[test]
    fn rejected_consume_keeps_ticket() {
        let store = MemoryTicketStore::new();
        let ticket = store.create(TicketClass::Service, SERVICE, "alice", false);

        let outcome = store.consume_if(&ticket.value, &|t| t.service == "https://other.example/");
        assert_eq!(outcome, Consumed::Rejected(ticket.clone()));
        assert!(store.get(&ticket.value).is_some());

        let outcome = store.consume_if(&ticket.value, &|t| t.service == SERVICE);
        assert_eq!(outcome, Consumed::Taken(ticket.clone()));
        assert!(store.get(&ticket.value).is_none());
    }

    #[test]
    fn delete_removes_ticket() {
        let store = MemoryTicketStore::new();
        let ticket = store.create(TicketClass::Granting, SERVICE, "alice", false);
        store.delete(&ticket.value);
        assert_eq!(store.get(&ticket.value), None);
    }

    #[test]
    fn concurrent_consume_has_exactly_one_winner() {
        const THREADS: usize = 32;

        let store = Arc::new(MemoryTicketStore::new());
        let ticket = store.create(TicketClass::Service, SERVICE, "alice", false);
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let value = ticket.value.clone();
                thread::spawn(move || {
                    barrier.wait();
                    store.consume(&value)
                })
            })
            .collect();

        let results: Vec<Option<Ticket>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_some()).count();
        assert_eq!(winners, 1);
        assert_eq!(results.len() - winners, THREADS - 1);
    }

    #[test]
    fn concurrent_consume_if_has_exactly_one_winner() {
        const THREADS: usize = 16;

        let store = Arc::new(MemoryTicketStore::new());
        let ticket = store.create(TicketClass::Service, SERVICE, "alice", false);
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let value = ticket.value.clone();
                thread::spawn(move || {
                    barrier.wait();
                    store.consume_if(&value, &|t| t.service == SERVICE)
                })
            })
            .collect();

        let taken = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| matches!(outcome, Consumed::Taken(_)))
            .count();
        assert_eq!(taken, 1);
    }

    #[test]
    fn sweep_only_touches_requested_class() {
        let store = MemoryTicketStore::new();
        let st = store.create(TicketClass::Service, SERVICE, "alice", false);
        let lt = store.create(TicketClass::Login, "", "", false);
        let tgt = store.create(TicketClass::Granting, SERVICE, "alice", false);

        let future = SystemTime::now() + Duration::from_secs(3600);
        assert_eq!(store.sweep(future, TicketClass::Service), 1);
        assert!(store.get(&st.value).is_none());
        assert!(store.get(&lt.value).is_some());
        assert!(store.get(&tgt.value).is_some());
    }

    #[test]
    fn sweep_keeps_recent_tickets() {
        let store = MemoryTicketStore::new();
        let st = store.create(TicketClass::Service, SERVICE, "alice", false);

        let past = SystemTime::now() - Duration::from_secs(300);
        assert_eq!(store.sweep(past, TicketClass::Service), 0);
        assert!(store.get(&st.value).is_some());
    }

    #[test]
    fn concurrent_create_yields_distinct_tickets() {
        const THREADS: usize = 16;
        const PER_THREAD: usize = 64;

        let store = Arc::new(MemoryTicketStore::new());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    (0..PER_THREAD)
                        .map(|_| store.create(TicketClass::Service, SERVICE, "alice", false).value)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut values: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(store.len(), THREADS * PER_THREAD);
        values.sort();
        values.dedup();
        assert_eq!(values.len(), THREADS * PER_THREAD);
        assert!(values.iter().all(|value| store.get(value).is_some()));
    }

    #[test]
    fn values_are_unique_across_store() {
        let store = MemoryTicketStore::new();
        for _ in 0..500 {
            store.create(TicketClass::Login, "", "", false);
        }
        assert_eq!(store.len(), 500);
    }
}

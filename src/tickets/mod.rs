//! Ticket lifecycle engine.
//!
//! Tickets are opaque bearer tokens of three classes:
//!
//! - **`LT`** (login ticket): embedded in the login form, consumed when the form is posted.
//! - **`TGT`** (ticket-granting ticket): backs the `CASTGC` browser cookie.
//! - **`ST`** (service ticket): single-use, bound to one service URL.
//!
//! Everything lives in process memory. A restart invalidates every outstanding
//! ticket and logs every browser out.

pub mod factory;
pub mod gc;
pub mod store;

use std::{fmt, time::SystemTime};

pub use factory::TicketFactory;
pub use gc::{TicketTtl, collect, spawn_collector, spawn_periodic};
pub use store::{Consumed, MemoryTicketStore, TicketStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TicketClass {
    Login,
    Granting,
    Service,
}

impl TicketClass {
    /// Wire prefix of the ticket value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "LT",
            Self::Granting => "TGT",
            Self::Service => "ST",
        }
    }

    pub const ALL: [Self; 3] = [Self::Login, Self::Granting, Self::Service];
}

impl fmt::Display for TicketClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub class: TicketClass,
    pub value: String,
    /// Authenticated principal, empty for login tickets.
    pub user: String,
    /// Canonical service URL the ticket is bound to, empty for login tickets.
    pub service: String,
    pub created_at: SystemTime,
    /// Set when the ticket came from an explicit credential check rather than the TGC.
    pub renew: bool,
}

impl Ticket {
    /// True when the ticket was created strictly before `cutoff`.
    #[must_use]
    pub fn created_before(&self, cutoff: SystemTime) -> bool {
        self.created_at < cutoff
    }
}

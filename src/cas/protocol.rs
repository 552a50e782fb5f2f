//! CAS v1 and v2 validation responses.
//!
//! Service matching differs between versions: v1 compares the raw `service`
//! parameter, v2 compares its canonical form (see [`super::service::canonical`]).

use serde::Serialize;
use tracing::error;

use super::service;
use crate::tickets::{Consumed, Ticket, TicketClass, TicketStore};

pub const CAS_NAMESPACE: &str = "http://www.yale.edu/tp/cas";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Version {
    V1,
    V2,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Empty, unknown, already consumed or not a service ticket.
    InvalidTicket(&'static str),
    /// The ticket exists but was issued for another service. It is kept.
    InvalidService,
}

impl ValidationFailure {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidTicket(_) => "INVALID_TICKET",
            Self::InvalidService => "INVALID_SERVICE",
        }
    }

    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::InvalidTicket(message) => *message,
            Self::InvalidService => "Ticket was used for another service than it was generated for",
        }
    }
}

/// Check `ticket` against `service` and consume it on success.
///
/// The service check and the removal happen in one critical section, so
/// concurrent validations of the same ticket yield exactly one success.
pub fn validate(
    store: &dyn TicketStore,
    version: Version,
    service: &str,
    ticket: &str,
) -> Result<Ticket, ValidationFailure> {
    if ticket.is_empty() {
        return Err(ValidationFailure::InvalidTicket("Empty Ticket"));
    }

    let expected = match version {
        Version::V1 => Some(service.to_string()),
        Version::V2 => service::canonical(service),
    };

    let outcome = store.consume_if(ticket, &|candidate| {
        candidate.class == TicketClass::Service
            && expected.as_deref() == Some(candidate.service.as_str())
    });

    match outcome {
        Consumed::Taken(ticket) => Ok(ticket),
        Consumed::Rejected(found) if found.class != TicketClass::Service => {
            Err(ValidationFailure::InvalidTicket("Ticket not recognized"))
        }
        Consumed::Rejected(_) => Err(ValidationFailure::InvalidService),
        Consumed::Missing => Err(ValidationFailure::InvalidTicket("Ticket not recognized")),
    }
}

/// CAS v1 plain-text body.
#[must_use]
pub fn v1_body(result: &Result<Ticket, ValidationFailure>) -> String {
    match result {
        Ok(ticket) => format!("yes\n{}\n", ticket.user),
        Err(_) => "no\n".to_string(),
    }
}

#[derive(Serialize)]
#[serde(rename = "cas:serviceResponse")]
struct ServiceResponse<'a> {
    #[serde(rename = "@xmlns:cas")]
    xmlns: &'static str,
    #[serde(
        rename = "cas:authenticationSuccess",
        skip_serializing_if = "Option::is_none"
    )]
    success: Option<AuthenticationSuccess<'a>>,
    #[serde(
        rename = "cas:authenticationFailure",
        skip_serializing_if = "Option::is_none"
    )]
    failure: Option<AuthenticationFailure<'a>>,
}

#[derive(Serialize)]
struct AuthenticationSuccess<'a> {
    #[serde(rename = "cas:user")]
    user: &'a str,
}

#[derive(Serialize)]
struct AuthenticationFailure<'a> {
    #[serde(rename = "@code")]
    code: &'a str,
    #[serde(rename = "$text")]
    message: &'a str,
}

/// CAS v2 XML body.
#[must_use]
pub fn v2_body(result: &Result<Ticket, ValidationFailure>) -> String {
    let response = match result {
        Ok(ticket) => ServiceResponse {
            xmlns: CAS_NAMESPACE,
            success: Some(AuthenticationSuccess { user: &ticket.user }),
            failure: None,
        },
        Err(failure) => ServiceResponse {
            xmlns: CAS_NAMESPACE,
            success: None,
            failure: Some(AuthenticationFailure {
                code: failure.code(),
                message: failure.message(),
            }),
        },
    };

    quick_xml::se::to_string(&response).unwrap_or_else(|err| {
        error!("Failed to serialize CAS response: {err}");
        format!(
            "<cas:serviceResponse xmlns:cas=\"{CAS_NAMESPACE}\"><cas:authenticationFailure code=\"INTERNAL_ERROR\">Internal error</cas:authenticationFailure></cas:serviceResponse>"
        )
    })
}

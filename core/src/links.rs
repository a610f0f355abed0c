//! Default charge links and the cross-domain request/reply protocol types.
//!
//! When a metering point is created in the neighboring domain, that domain
//! asks this one to create the default charge links configured for the
//! metering point's type. The exchange is a two-party correlated
//! request/reply over the message bus: the requester tags the command with a
//! correlation id and a reply-to destination; the responder sends exactly
//! one reply to that destination carrying the same correlation id.

use crate::error::ChargesError;
use crate::ids::{ChargeId, CorrelationId, MarketParticipantId, MeteringPointId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of a metering point, as far as default linking cares.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum MeteringPointType {
    /// Consumption metering point.
    Consumption,
    /// Production metering point.
    Production,
    /// Exchange metering point.
    Exchange,
    /// Any wire value outside the enumeration.
    Unknown,
}

impl From<String> for MeteringPointType {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl MeteringPointType {
    /// Resolves a type from its stored name; anything else is `Unknown`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "Consumption" => Self::Consumption,
            "Production" => Self::Production,
            "Exchange" => Self::Exchange,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for MeteringPointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consumption => write!(f, "Consumption"),
            Self::Production => write!(f, "Production"),
            Self::Exchange => write!(f, "Exchange"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A metering point as registered in the reference data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeteringPoint {
    /// Metering point identifier.
    pub id: MeteringPointId,
    /// Type of the metering point.
    pub metering_point_type: MeteringPointType,
    /// Grid access provider operating the point's grid area.
    pub grid_access_provider_id: MarketParticipantId,
}

/// A configured default charge link candidate.
///
/// Settings rows describe which charges are linked by default to metering
/// points of a given type, and over which period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultChargeLink {
    /// Charge linked by default.
    pub charge_id: ChargeId,
    /// Metering point type the setting applies to.
    pub metering_point_type: MeteringPointType,
    /// Start of the setting's applicable period.
    pub start: DateTime<Utc>,
    /// End of the setting's applicable period.
    pub end: DateTime<Utc>,
}

impl DefaultChargeLink {
    /// Effective start for a metering point created at `created_at`: the
    /// later of the setting's start and the creation instant.
    #[must_use]
    pub fn start_date_time(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        self.start.max(created_at)
    }

    /// Whether this setting produces a link for the given metering point
    /// type: the applicable period must still be open at the effective
    /// start, and the types must match.
    #[must_use]
    pub fn applicable_for_linking(
        &self,
        created_at: DateTime<Utc>,
        metering_point_type: MeteringPointType,
    ) -> bool {
        self.end > self.start_date_time(created_at)
            && self.metering_point_type == metering_point_type
    }
}

/// Request to create the default charge links for one metering point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDefaultChargeLinksRequest {
    /// Metering point to link.
    pub metering_point_id: MeteringPointId,
}

/// Closed set of failure codes a responder may reply with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkErrorCode {
    /// No more specific code applies.
    Unspecified,
    /// The metering point is not known to the responder.
    MeteringPointUnknown,
}

impl fmt::Display for LinkErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "Unspecified"),
            Self::MeteringPointUnknown => write!(f, "MeteringPointUnknown"),
        }
    }
}

/// Reply to a default charge link request. Exactly one reply is sent per
/// request, carrying the request's correlation id unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreateDefaultChargeLinksReply {
    /// The responder processed the request.
    Succeeded {
        /// Metering point the request named.
        metering_point_id: MeteringPointId,
        /// Whether any links were actually created.
        did_create_links: bool,
    },
    /// The responder could not process the request.
    Failed {
        /// Metering point the request named.
        metering_point_id: MeteringPointId,
        /// Failure code.
        error_code: LinkErrorCode,
    },
}

/// Continuations a reply dispatches into: exactly one is invoked per reply.
#[async_trait::async_trait]
pub trait ReplyHandler: Send + Sync {
    /// The responder succeeded.
    async fn on_success(&self, metering_point_id: MeteringPointId, did_create_links: bool);

    /// The responder failed, or the reply was undeliverable/undecodable.
    async fn on_failure(&self, metering_point_id: MeteringPointId, error_code: LinkErrorCode);
}

/// Sender side of the protocol.
///
/// Implementations send exactly once — no internal retry, since a resend is
/// not guaranteed idempotent on the receiver — and must validate their
/// arguments before any send.
#[async_trait::async_trait]
pub trait DefaultChargeLinkRequester: Send + Sync {
    /// Sends one request tagged with `correlation_id` and a reply-to
    /// destination.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::MissingArgument`] without sending when the
    /// request's metering point id or the correlation id is blank, and
    /// [`ChargesError::Transport`] when the send itself fails.
    async fn request_default_links(
        &self,
        request: &CreateDefaultChargeLinksRequest,
        correlation_id: &CorrelationId,
    ) -> Result<(), ChargesError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn link(start: DateTime<Utc>, end: DateTime<Utc>) -> DefaultChargeLink {
        DefaultChargeLink {
            charge_id: ChargeId::new("TAR-001".to_string()),
            metering_point_type: MeteringPointType::Consumption,
            start,
            end,
        }
    }

    #[test]
    fn effective_start_is_max_of_setting_start_and_creation() {
        let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let link = link(start, end);

        let before = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(link.start_date_time(before), start);

        let after = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(link.start_date_time(after), after);
    }

    #[test]
    fn applicable_requires_open_period_and_matching_type() {
        let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let link = link(start, end);
        let created = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();

        assert!(link.applicable_for_linking(created, MeteringPointType::Consumption));
        assert!(!link.applicable_for_linking(created, MeteringPointType::Production));

        // Created after the period closed.
        let late = Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap();
        assert!(!link.applicable_for_linking(late, MeteringPointType::Consumption));
    }

    #[test]
    fn equal_start_and_end_is_never_applicable() {
        let instant = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let degenerate = link(instant, instant);
        let created = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert!(!degenerate.applicable_for_linking(created, MeteringPointType::Consumption));
    }
}

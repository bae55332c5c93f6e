use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use relieftrack_core::OrganizationId;

use crate::Event;

/// Envelope for a change event, containing organization + entity metadata.
///
/// This is the unit published to observers.
///
/// Notes:
/// - **Multi-tenancy** is carried here via `organization_id`.
/// - `sequence_number` is the entity's record version produced by the write the
///   event describes, so it increases strictly per entity. Observers use it to
///   drop duplicates and to detect reordering.
/// - `payload` is the domain-agnostic event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    organization_id: OrganizationId,

    entity_id: Uuid,
    entity_type: String,

    /// Position of this change in the entity's history.
    sequence_number: u64,

    event_type: String,
    occurred_at: DateTime<Utc>,

    payload: E,
}

impl<E> EventEnvelope<E> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_id: Uuid,
        organization_id: OrganizationId,
        entity_id: Uuid,
        entity_type: impl Into<String>,
        sequence_number: u64,
        event_type: impl Into<String>,
        occurred_at: DateTime<Utc>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            organization_id,
            entity_id,
            entity_type: entity_type.into(),
            sequence_number,
            event_type: event_type.into(),
            occurred_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn entity_id(&self) -> Uuid {
        self.entity_id
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl EventEnvelope<JsonValue> {
    /// Wrap a typed event, serializing its payload to JSON.
    ///
    /// Event name and business time are taken from the event itself.
    pub fn from_event<E>(
        organization_id: OrganizationId,
        entity_id: Uuid,
        entity_type: impl Into<String>,
        sequence_number: u64,
        event: &E,
    ) -> Result<Self, serde_json::Error>
    where
        E: Event + Serialize,
    {
        let payload = serde_json::to_value(event)?;
        Ok(Self::new(
            Uuid::now_v7(),
            organization_id,
            entity_id,
            entity_type,
            sequence_number,
            event.event_type(),
            event.occurred_at(),
            payload,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize)]
    struct Pinged {
        occurred_at: DateTime<Utc>,
    }

    impl Event for Pinged {
        fn event_type(&self) -> &'static str {
            "test.pinged"
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.occurred_at
        }
    }

    #[test]
    fn from_event_copies_event_metadata() {
        let at = Utc::now();
        let org = OrganizationId::new();
        let entity = Uuid::now_v7();

        let env = EventEnvelope::from_event(org, entity, "test.entity", 7, &Pinged { occurred_at: at })
            .unwrap();

        assert_eq!(env.organization_id(), org);
        assert_eq!(env.entity_id(), entity);
        assert_eq!(env.entity_type(), "test.entity");
        assert_eq!(env.sequence_number(), 7);
        assert_eq!(env.event_type(), "test.pinged");
        assert_eq!(env.occurred_at(), at);
        assert!(env.payload().get("occurred_at").is_some());
    }
}

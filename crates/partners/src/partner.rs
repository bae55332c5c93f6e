use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relieftrack_core::contact::{
    check_rating, normalize_email, normalize_phone, optional_text, required_text,
};
use relieftrack_core::{DomainError, OrganizationId, PartnerId, Record};

const ORGANIZATION_MAX: usize = 100;
const CONTACT_MAX: usize = 50;
const NOTES_MAX: usize = 500;

/// Account status shared by partners and transport providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnershipType {
    #[default]
    Logistics,
    Supplier,
    Recipient,
    Financial,
    Technical,
}

impl PartnershipType {
    pub const ALL: [PartnershipType; 5] = [
        PartnershipType::Logistics,
        PartnershipType::Supplier,
        PartnershipType::Recipient,
        PartnershipType::Financial,
        PartnershipType::Technical,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerService {
    Transportation,
    Storage,
    Distribution,
    Funding,
    TechnicalSupport,
    Volunteers,
    Supplies,
}

fn default_rating() -> u8 {
    3
}

/// Editable partner fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerFields {
    /// Name of the partner organization.
    pub organization_name: String,
    pub contact_name: String,
    /// Office of ours that manages the relationship.
    pub address: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub partnership_type: PartnershipType,
    /// Defaults to the creation time.
    #[serde(default)]
    pub partnership_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub partnership_end: Option<DateTime<Utc>>,
    #[serde(default = "default_rating")]
    pub rating: u8,
    #[serde(default)]
    pub services: Vec<PartnerService>,
}

impl PartnerFields {
    fn validated(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        check_rating(self.rating)?;
        let start = self.partnership_start.unwrap_or(now);
        if self.partnership_end.is_some_and(|end| end < start) {
            return Err(DomainError::validation(
                "partnership end date cannot be before start date",
            ));
        }
        let mut services = Vec::with_capacity(self.services.len());
        for service in self.services {
            if !services.contains(&service) {
                services.push(service);
            }
        }

        Ok(Self {
            organization_name: required_text(
                "organization name",
                &self.organization_name,
                Some(ORGANIZATION_MAX),
            )?,
            contact_name: required_text("contact name", &self.contact_name, Some(CONTACT_MAX))?,
            address: required_text("address", &self.address, None)?,
            email: normalize_email(&self.email)?,
            phone: normalize_phone(&self.phone)?,
            notes: optional_text("notes", self.notes, NOTES_MAX)?,
            partnership_start: Some(start),
            services,
            ..self
        })
    }
}

/// Record: Partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partner {
    id: PartnerId,
    organization_id: OrganizationId,
    #[serde(flatten)]
    fields: PartnerFields,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Record for Partner {
    type Id = PartnerId;

    const KIND: &'static str = "partner";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("email", self.fields.email.clone())]
    }
}

impl Partner {
    pub fn create(
        organization_id: OrganizationId,
        id: PartnerId,
        fields: PartnerFields,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            organization_id,
            fields: fields.validated(now)?,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn replace(&self, fields: PartnerFields, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let mut fields = fields;
        if fields.partnership_start.is_none() {
            fields.partnership_start = self.fields.partnership_start;
        }
        let mut next = self.clone();
        next.fields = fields.validated(self.created_at)?;
        next.updated_at = now;
        Ok(next)
    }

    pub fn fields(&self) -> &PartnerFields {
        &self.fields
    }

    pub fn status(&self) -> AccountStatus {
        self.fields.status
    }

    pub fn partnership_type(&self) -> PartnershipType {
        self.fields.partnership_type
    }

    pub fn rating(&self) -> u8 {
        self.fields.rating
    }

    fn partnership_start(&self) -> DateTime<Utc> {
        self.fields.partnership_start.unwrap_or(self.created_at)
    }

    /// Whole days from start to end (or to `now` while open-ended).
    pub fn partnership_duration_days(&self, now: DateTime<Utc>) -> i64 {
        let end = self.fields.partnership_end.unwrap_or(now);
        (end - self.partnership_start()).num_days()
    }

    pub fn is_active_partnership(&self, now: DateTime<Utc>) -> bool {
        self.fields.status == AccountStatus::Active
            && self.fields.partnership_end.is_none_or(|end| end > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn fields() -> PartnerFields {
        PartnerFields {
            organization_name: "Water for All".into(),
            contact_name: "A. Otieno".into(),
            address: "Kisumu Regional Office".into(),
            email: "Contact@WaterForAll.org".into(),
            phone: "0700 111 222".into(),
            notes: None,
            status: AccountStatus::Active,
            partnership_type: PartnershipType::Supplier,
            partnership_start: None,
            partnership_end: None,
            rating: 5,
            services: vec![PartnerService::Supplies, PartnerService::Supplies],
        }
    }

    fn partner(fields: PartnerFields) -> Result<Partner, DomainError> {
        Partner::create(OrganizationId::new(), PartnerId::new(), fields, t0())
    }

    #[test]
    fn start_defaults_to_creation_and_email_is_unique_key() {
        let p = partner(fields()).unwrap();
        assert_eq!(p.fields().partnership_start, Some(t0()));
        assert_eq!(p.fields().services, vec![PartnerService::Supplies]);
        assert_eq!(
            p.unique_keys(),
            vec![("email", "contact@waterforall.org".to_string())]
        );
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut f = fields();
        f.partnership_start = Some(t0());
        f.partnership_end = Some(t0() - Duration::days(1));
        assert!(matches!(partner(f), Err(DomainError::Validation(_))));
    }

    #[test]
    fn contact_name_is_limited_to_fifty_chars() {
        let mut f = fields();
        f.contact_name = "c".repeat(51);
        assert!(partner(f).is_err());
    }

    #[test]
    fn active_partnership_respects_end_date() {
        let mut f = fields();
        f.partnership_end = Some(t0() + Duration::days(30));
        let p = partner(f).unwrap();

        assert!(p.is_active_partnership(t0() + Duration::days(10)));
        assert!(!p.is_active_partnership(t0() + Duration::days(31)));
        assert_eq!(p.partnership_duration_days(t0() + Duration::days(90)), 30);
    }

    #[test]
    fn replace_keeps_original_start() {
        let p = partner(fields()).unwrap();
        let mut f = fields();
        f.rating = 2;
        let next = p.replace(f, t0() + Duration::days(3)).unwrap();
        assert_eq!(next.fields().partnership_start, Some(t0()));
        assert_eq!(next.rating(), 2);
    }
}

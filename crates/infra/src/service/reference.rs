//! Reference data: warehouses, transport providers and partners.
//!
//! Plain validated records. They publish no events; writes are still
//! serialized per entity and version-checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;
use uuid::Uuid;

use relieftrack_core::{
    DomainError, ExpectedVersion, OrganizationId, PartnerId, Record, TransportId, WarehouseId,
};
use relieftrack_events::{EventBus, EventEnvelope};
use relieftrack_partners::{
    AccountStatus, Availability, Partner, PartnerFields, PartnerStatistics, PartnershipType,
    TransportFields, TransportProvider, TransportStatistics, TransportType,
};
use relieftrack_warehouses::{Warehouse, WarehouseFields, WarehouseStatistics};

use super::{LogisticsService, ServiceError, not_found};
use crate::record_store::RecordStore;

/// Upper bound on search results.
const SEARCH_LIMIT: usize = 20;

/// Optional narrowing for transport listings and searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TransportFilter {
    #[serde(rename = "type")]
    pub transport_type: Option<TransportType>,
    pub availability: Option<Availability>,
}

impl TransportFilter {
    fn matches(&self, provider: &TransportProvider) -> bool {
        self.transport_type.is_none_or(|t| provider.transport_type() == t)
            && self.availability.is_none_or(|a| provider.availability() == a)
    }
}

/// Optional narrowing for partner listings and searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PartnerFilter {
    #[serde(rename = "type")]
    pub partnership_type: Option<PartnershipType>,
    pub status: Option<AccountStatus>,
}

impl PartnerFilter {
    fn matches(&self, partner: &Partner) -> bool {
        self.partnership_type.is_none_or(|t| partner.partnership_type() == t)
            && self.status.is_none_or(|s| partner.status() == s)
    }
}

/// Answer to "can this warehouse take `required` more square meters".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityCheck {
    pub warehouse_id: WarehouseId,
    pub required: u64,
    pub capacity: u64,
    pub utilization: u8,
    pub can_accept: bool,
}

/// Lowercased, trimmed search term. Blank terms are rejected.
fn search_term(query: &str) -> Result<String, DomainError> {
    let term = query.trim().to_lowercase();
    if term.is_empty() {
        return Err(DomainError::validation("search query is required"));
    }
    Ok(term)
}

fn contains_term(haystacks: &[&str], term: &str) -> bool {
    haystacks.iter().any(|h| h.to_lowercase().contains(term))
}

impl<B> LogisticsService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    // ---- warehouses ----

    pub fn create_warehouse(
        &self,
        organization_id: OrganizationId,
        fields: WarehouseFields,
        now: DateTime<Utc>,
    ) -> Result<Warehouse, ServiceError> {
        let warehouse = self.checked(
            "create_warehouse",
            Warehouse::create(organization_id, WarehouseId::new(), fields, now),
        )?;
        let stored = self.stores.warehouses.insert(warehouse)?;
        info!(organization_id = %organization_id, warehouse_id = %stored.id(), location = stored.location(), "warehouse created");
        Ok(stored)
    }

    pub fn get_warehouse(
        &self,
        organization_id: OrganizationId,
        warehouse_id: WarehouseId,
    ) -> Result<Warehouse, ServiceError> {
        get_record(&*self.stores.warehouses, organization_id, warehouse_id)
    }

    pub fn list_warehouses(&self, organization_id: OrganizationId) -> Result<Vec<Warehouse>, ServiceError> {
        Ok(self.stores.warehouses.list(organization_id)?)
    }

    /// Replace every editable field. `expected` pins the version the caller saw.
    pub fn replace_warehouse(
        &self,
        organization_id: OrganizationId,
        warehouse_id: WarehouseId,
        fields: WarehouseFields,
        expected: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<Warehouse, ServiceError> {
        let stored = self.replace_record(
            &*self.stores.warehouses,
            organization_id,
            warehouse_id,
            expected,
            "replace_warehouse",
            |current| current.replace(fields.clone(), now),
        )?;
        info!(organization_id = %organization_id, warehouse_id = %warehouse_id, "warehouse updated");
        Ok(stored)
    }

    /// Fails with `InUse` while any inventory item is stored in the warehouse.
    pub fn delete_warehouse(
        &self,
        organization_id: OrganizationId,
        warehouse_id: WarehouseId,
        expected: Option<u64>,
    ) -> Result<(), ServiceError> {
        self.delete_record(
            &*self.stores.warehouses,
            organization_id,
            warehouse_id,
            expected,
            "delete_warehouse",
            || {
                let stocked = self
                    .stores
                    .inventory
                    .find(organization_id, &|item| item.warehouse_id() == warehouse_id)?;
                if !stocked.is_empty() {
                    return Err(DomainError::in_use(format!(
                        "warehouse {warehouse_id} still holds {} inventory item(s)",
                        stocked.len()
                    ))
                    .into());
                }
                Ok(())
            },
        )?;
        info!(organization_id = %organization_id, warehouse_id = %warehouse_id, "warehouse deleted");
        Ok(())
    }

    /// Record a new utilization percentage (0..=100).
    pub fn set_warehouse_utilization(
        &self,
        organization_id: OrganizationId,
        warehouse_id: WarehouseId,
        utilization: u8,
        now: DateTime<Utc>,
    ) -> Result<Warehouse, ServiceError> {
        let stored = self.replace_record(
            &*self.stores.warehouses,
            organization_id,
            warehouse_id,
            None,
            "set_warehouse_utilization",
            |current| {
                let mut fields = current.fields().clone();
                fields.utilization = utilization;
                current.replace(fields, now)
            },
        )?;
        info!(organization_id = %organization_id, warehouse_id = %warehouse_id, utilization, "warehouse utilization updated");
        Ok(stored)
    }

    pub fn warehouse_can_accept(
        &self,
        organization_id: OrganizationId,
        warehouse_id: WarehouseId,
        required: u64,
    ) -> Result<CapacityCheck, ServiceError> {
        let warehouse = self.get_warehouse(organization_id, warehouse_id)?;
        Ok(CapacityCheck {
            warehouse_id,
            required,
            capacity: warehouse.capacity(),
            utilization: warehouse.utilization(),
            can_accept: warehouse.can_accept_items(required),
        })
    }

    pub fn warehouse_statistics(
        &self,
        organization_id: OrganizationId,
    ) -> Result<WarehouseStatistics, ServiceError> {
        let warehouses = self.stores.warehouses.list(organization_id)?;
        Ok(WarehouseStatistics::compute(&warehouses))
    }

    // ---- transport providers ----

    pub fn create_transport(
        &self,
        organization_id: OrganizationId,
        fields: TransportFields,
        now: DateTime<Utc>,
    ) -> Result<TransportProvider, ServiceError> {
        let provider = self.checked(
            "create_transport",
            TransportProvider::create(organization_id, TransportId::new(), fields, now),
        )?;
        let stored = self.stores.transport.insert(provider)?;
        info!(organization_id = %organization_id, transport_id = %stored.id(), "transport provider created");
        Ok(stored)
    }

    pub fn get_transport(
        &self,
        organization_id: OrganizationId,
        transport_id: TransportId,
    ) -> Result<TransportProvider, ServiceError> {
        get_record(&*self.stores.transport, organization_id, transport_id)
    }

    pub fn list_transport(
        &self,
        organization_id: OrganizationId,
        filter: TransportFilter,
    ) -> Result<Vec<TransportProvider>, ServiceError> {
        Ok(self
            .stores
            .transport
            .find(organization_id, &|p| filter.matches(p))?)
    }

    /// Bookable providers of `transport_type` that serve `area`, best rated first.
    pub fn available_transport(
        &self,
        organization_id: OrganizationId,
        transport_type: TransportType,
        area: &str,
    ) -> Result<Vec<TransportProvider>, ServiceError> {
        let area = area.trim();
        let mut providers = self.stores.transport.find(organization_id, &|p| {
            p.is_bookable() && p.transport_type() == transport_type && p.serves_area(area)
        })?;
        providers.sort_by(|a, b| b.rating().cmp(&a.rating()));
        Ok(providers)
    }

    /// Case-insensitive substring match on name, location or email.
    pub fn search_transport(
        &self,
        organization_id: OrganizationId,
        query: &str,
        filter: TransportFilter,
    ) -> Result<Vec<TransportProvider>, ServiceError> {
        let term = self.checked("search_transport", search_term(query))?;
        let mut providers = self.stores.transport.find(organization_id, &|p| {
            let f = p.fields();
            filter.matches(p)
                && contains_term(&[f.name.as_str(), f.location.as_str(), f.email.as_str()], &term)
        })?;
        providers.sort_by(|a, b| a.fields().name.cmp(&b.fields().name));
        providers.truncate(SEARCH_LIMIT);
        Ok(providers)
    }

    pub fn set_transport_availability(
        &self,
        organization_id: OrganizationId,
        transport_id: TransportId,
        availability: Availability,
        now: DateTime<Utc>,
    ) -> Result<TransportProvider, ServiceError> {
        let stored = self.replace_record(
            &*self.stores.transport,
            organization_id,
            transport_id,
            None,
            "set_transport_availability",
            |current| {
                let mut fields = current.fields().clone();
                fields.availability = availability;
                current.replace(fields, now)
            },
        )?;
        info!(organization_id = %organization_id, transport_id = %transport_id, availability = ?availability, "transport availability updated");
        Ok(stored)
    }

    pub fn replace_transport(
        &self,
        organization_id: OrganizationId,
        transport_id: TransportId,
        fields: TransportFields,
        expected: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<TransportProvider, ServiceError> {
        let stored = self.replace_record(
            &*self.stores.transport,
            organization_id,
            transport_id,
            expected,
            "replace_transport",
            |current| current.replace(fields.clone(), now),
        )?;
        info!(organization_id = %organization_id, transport_id = %transport_id, "transport provider updated");
        Ok(stored)
    }

    pub fn delete_transport(
        &self,
        organization_id: OrganizationId,
        transport_id: TransportId,
        expected: Option<u64>,
    ) -> Result<(), ServiceError> {
        self.delete_record(
            &*self.stores.transport,
            organization_id,
            transport_id,
            expected,
            "delete_transport",
            || Ok(()),
        )?;
        info!(organization_id = %organization_id, transport_id = %transport_id, "transport provider deleted");
        Ok(())
    }

    pub fn transport_statistics(
        &self,
        organization_id: OrganizationId,
    ) -> Result<TransportStatistics, ServiceError> {
        let providers = self.stores.transport.list(organization_id)?;
        Ok(TransportStatistics::compute(&providers))
    }

    // ---- partners ----

    pub fn create_partner(
        &self,
        organization_id: OrganizationId,
        fields: PartnerFields,
        now: DateTime<Utc>,
    ) -> Result<Partner, ServiceError> {
        let partner = self.checked(
            "create_partner",
            Partner::create(organization_id, PartnerId::new(), fields, now),
        )?;
        let stored = self.stores.partners.insert(partner)?;
        info!(organization_id = %organization_id, partner_id = %stored.id(), "partner created");
        Ok(stored)
    }

    pub fn get_partner(
        &self,
        organization_id: OrganizationId,
        partner_id: PartnerId,
    ) -> Result<Partner, ServiceError> {
        get_record(&*self.stores.partners, organization_id, partner_id)
    }

    pub fn list_partners(
        &self,
        organization_id: OrganizationId,
        filter: PartnerFilter,
    ) -> Result<Vec<Partner>, ServiceError> {
        let mut partners = self
            .stores
            .partners
            .find(organization_id, &|p| filter.matches(p))?;
        partners.sort_by(|a, b| a.fields().organization_name.cmp(&b.fields().organization_name));
        Ok(partners)
    }

    /// Case-insensitive substring match on organization, contact, address or email.
    pub fn search_partners(
        &self,
        organization_id: OrganizationId,
        query: &str,
        filter: PartnerFilter,
    ) -> Result<Vec<Partner>, ServiceError> {
        let term = self.checked("search_partners", search_term(query))?;
        let mut partners = self.stores.partners.find(organization_id, &|p| {
            let f = p.fields();
            filter.matches(p)
                && contains_term(
                    &[
                        f.organization_name.as_str(),
                        f.contact_name.as_str(),
                        f.address.as_str(),
                        f.email.as_str(),
                    ],
                    &term,
                )
        })?;
        partners.sort_by(|a, b| a.fields().organization_name.cmp(&b.fields().organization_name));
        partners.truncate(SEARCH_LIMIT);
        Ok(partners)
    }

    /// Rate a partner from 1 to 5.
    pub fn set_partner_rating(
        &self,
        organization_id: OrganizationId,
        partner_id: PartnerId,
        rating: u8,
        now: DateTime<Utc>,
    ) -> Result<Partner, ServiceError> {
        let stored = self.replace_record(
            &*self.stores.partners,
            organization_id,
            partner_id,
            None,
            "set_partner_rating",
            |current| {
                let mut fields = current.fields().clone();
                fields.rating = rating;
                current.replace(fields, now)
            },
        )?;
        info!(organization_id = %organization_id, partner_id = %partner_id, rating, "partner rating updated");
        Ok(stored)
    }

    pub fn replace_partner(
        &self,
        organization_id: OrganizationId,
        partner_id: PartnerId,
        fields: PartnerFields,
        expected: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<Partner, ServiceError> {
        let stored = self.replace_record(
            &*self.stores.partners,
            organization_id,
            partner_id,
            expected,
            "replace_partner",
            |current| current.replace(fields.clone(), now),
        )?;
        info!(organization_id = %organization_id, partner_id = %partner_id, "partner updated");
        Ok(stored)
    }

    pub fn delete_partner(
        &self,
        organization_id: OrganizationId,
        partner_id: PartnerId,
        expected: Option<u64>,
    ) -> Result<(), ServiceError> {
        self.delete_record(
            &*self.stores.partners,
            organization_id,
            partner_id,
            expected,
            "delete_partner",
            || Ok(()),
        )?;
        info!(organization_id = %organization_id, partner_id = %partner_id, "partner deleted");
        Ok(())
    }

    pub fn partner_statistics(
        &self,
        organization_id: OrganizationId,
    ) -> Result<PartnerStatistics, ServiceError> {
        let partners = self.stores.partners.list(organization_id)?;
        Ok(PartnerStatistics::compute(&partners))
    }

    // ---- shared ----

    fn replace_record<R>(
        &self,
        store: &dyn RecordStore<R>,
        organization_id: OrganizationId,
        id: R::Id,
        expected: Option<u64>,
        operation: &'static str,
        apply: impl Fn(&R) -> Result<R, DomainError>,
    ) -> Result<R, ServiceError>
    where
        R: Record,
        R::Id: Into<Uuid>,
    {
        let _guard = self.locks.acquire_one(Self::key::<R>(organization_id, id));
        self.with_retries(operation, || {
            let current = get_record(store, organization_id, id)?;
            check_expected::<R>(id, expected, current.version())?;
            let next = apply(&current)?;
            Ok(store.update(next, ExpectedVersion::Exact(current.version()))?)
        })
    }

    fn delete_record<R>(
        &self,
        store: &dyn RecordStore<R>,
        organization_id: OrganizationId,
        id: R::Id,
        expected: Option<u64>,
        operation: &'static str,
        precondition: impl Fn() -> Result<(), ServiceError>,
    ) -> Result<R, ServiceError>
    where
        R: Record,
        R::Id: Into<Uuid>,
    {
        let _guard = self.locks.acquire_one(Self::key::<R>(organization_id, id));
        self.with_retries(operation, || {
            let current = get_record(store, organization_id, id)?;
            check_expected::<R>(id, expected, current.version())?;
            precondition()?;
            Ok(store.delete(organization_id, id, ExpectedVersion::Exact(current.version()))?)
        })
    }
}

fn get_record<R: Record>(
    store: &dyn RecordStore<R>,
    organization_id: OrganizationId,
    id: R::Id,
) -> Result<R, ServiceError> {
    store
        .get(organization_id, id)?
        .ok_or_else(|| not_found(R::KIND, id))
}

/// A caller-pinned version is never retried.
fn check_expected<R: Record>(id: R::Id, expected: Option<u64>, actual: u64) -> Result<(), ServiceError> {
    match expected {
        Some(v) if v != actual => Err(ServiceError::Conflict(format!(
            "{} {id}: expected version {v}, found {actual}",
            R::KIND
        ))),
        _ => Ok(()),
    }
}

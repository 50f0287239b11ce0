/// Persistence for saved locations and alert definitions.
///
/// Every operation is scoped to an owner. A record belonging to somebody else
/// is indistinguishable from a missing one: both come back as
/// `StoreError::NotFound`. The store is also what guarantees that an alert
/// always points at a location owned by the same user.
///
/// Submodules:
/// - `memory`   — in-process store for local development and tests.
/// - `pg`       — PostgreSQL-backed store used by the service.

pub mod memory;
pub mod pg;

pub use self::memory::MemoryStore;
pub use self::pg::PgStore;

use std::collections::HashMap;

use crate::model::{
    AlertDefinition, AlertId, AlertUpdate, AlertWithLocation, Location, LocationId,
    LocationSummary, LocationUpdate, NewAlert, NewLocation, OwnerId, StoreError,
};

/// Owner-scoped access to saved locations.
pub trait LocationStore {
    fn list_locations(&mut self, owner: OwnerId) -> Result<Vec<Location>, StoreError>;

    fn get_location(&mut self, owner: OwnerId, id: LocationId) -> Result<Location, StoreError>;

    fn create_location(&mut self, owner: OwnerId, new: NewLocation) -> Result<Location, StoreError>;

    fn update_location(
        &mut self,
        owner: OwnerId,
        id: LocationId,
        update: LocationUpdate,
    ) -> Result<Location, StoreError>;

    /// Deletes the location and every alert attached to it.
    fn delete_location(&mut self, owner: OwnerId, id: LocationId) -> Result<(), StoreError>;
}

/// Owner-scoped access to alert definitions.
pub trait AlertStore {
    fn list_alerts(&mut self, owner: OwnerId) -> Result<Vec<AlertDefinition>, StoreError>;

    /// Creates an active alert. Fails with `NotFound` if the referenced
    /// location does not belong to `owner`.
    fn create_alert(&mut self, owner: OwnerId, new: NewAlert) -> Result<AlertDefinition, StoreError>;

    fn update_alert(
        &mut self,
        owner: OwnerId,
        id: AlertId,
        update: AlertUpdate,
    ) -> Result<AlertDefinition, StoreError>;

    fn delete_alert(&mut self, owner: OwnerId, id: AlertId) -> Result<(), StoreError>;

    /// Active alerts for one of the owner's locations, oldest first.
    fn active_alerts_for_location(
        &mut self,
        owner: OwnerId,
        location: LocationId,
    ) -> Result<Vec<AlertDefinition>, StoreError>;
}

/// The owner's alerts, each with the name and coordinates of its location,
/// in the order `list_alerts` returns them.
pub fn list_alerts_with_locations<S>(store: &mut S, owner: OwnerId) -> Result<Vec<AlertWithLocation>, StoreError>
where
    S: LocationStore + AlertStore + ?Sized,
{
    let locations: HashMap<LocationId, LocationSummary> = store
        .list_locations(owner)?
        .iter()
        .map(|l| (l.id, LocationSummary::from(l)))
        .collect();

    store
        .list_alerts(owner)?
        .into_iter()
        .map(|alert| {
            let location = locations
                .get(&alert.location_id)
                .cloned()
                .ok_or_else(|| StoreError::Database(format!("alert {} has no location", alert.id)))?;
            Ok(AlertWithLocation { alert, location })
        })
        .collect()
}

pub(crate) fn location_not_found() -> StoreError {
    StoreError::NotFound("Location".to_string())
}

pub(crate) fn alert_not_found() -> StoreError {
    StoreError::NotFound("Alert".to_string())
}

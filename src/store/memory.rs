/// In-process location and alert store.
///
/// Keeps records in insertion order so listings are stable. Used when no
/// database is configured and by the test suites.

use chrono::Utc;
use uuid::Uuid;

use super::{alert_not_found, location_not_found, AlertStore, LocationStore};
use crate::model::{
    AlertDefinition, AlertId, AlertUpdate, Location, LocationId, LocationUpdate, NewAlert,
    NewLocation, OwnerId, StoreError,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    locations: Vec<Location>,
    alerts: Vec<AlertDefinition>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn location_index(&self, owner: OwnerId, id: LocationId) -> Result<usize, StoreError> {
        self.locations
            .iter()
            .position(|l| l.id == id && l.owner_id == owner)
            .ok_or_else(location_not_found)
    }

    fn alert_index(&self, owner: OwnerId, id: AlertId) -> Result<usize, StoreError> {
        self.alerts
            .iter()
            .position(|a| a.id == id && a.owner_id == owner)
            .ok_or_else(alert_not_found)
    }
}

impl LocationStore for MemoryStore {
    fn list_locations(&mut self, owner: OwnerId) -> Result<Vec<Location>, StoreError> {
        Ok(self.locations.iter().filter(|l| l.owner_id == owner).cloned().collect())
    }

    fn get_location(&mut self, owner: OwnerId, id: LocationId) -> Result<Location, StoreError> {
        let idx = self.location_index(owner, id)?;
        Ok(self.locations[idx].clone())
    }

    fn create_location(&mut self, owner: OwnerId, new: NewLocation) -> Result<Location, StoreError> {
        new.validate()?;
        let now = Utc::now();
        let location = Location {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: new.name,
            latitude: new.latitude,
            longitude: new.longitude,
            is_favorite: new.is_favorite,
            created_at: now,
            updated_at: now,
        };
        self.locations.push(location.clone());
        Ok(location)
    }

    fn update_location(
        &mut self,
        owner: OwnerId,
        id: LocationId,
        update: LocationUpdate,
    ) -> Result<Location, StoreError> {
        let idx = self.location_index(owner, id)?;
        let updated = self.locations[idx].with_update(&update, Utc::now())?;
        self.locations[idx] = updated.clone();
        Ok(updated)
    }

    fn delete_location(&mut self, owner: OwnerId, id: LocationId) -> Result<(), StoreError> {
        let idx = self.location_index(owner, id)?;
        self.locations.remove(idx);
        self.alerts.retain(|a| a.location_id != id);
        Ok(())
    }
}

impl AlertStore for MemoryStore {
    fn list_alerts(&mut self, owner: OwnerId) -> Result<Vec<AlertDefinition>, StoreError> {
        Ok(self.alerts.iter().filter(|a| a.owner_id == owner).cloned().collect())
    }

    fn create_alert(&mut self, owner: OwnerId, new: NewAlert) -> Result<AlertDefinition, StoreError> {
        self.location_index(owner, new.location_id)?;
        new.validate()?;
        let now = Utc::now();
        let alert = AlertDefinition {
            id: Uuid::new_v4(),
            owner_id: owner,
            location_id: new.location_id,
            condition: new.condition,
            threshold: new.threshold,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.alerts.push(alert.clone());
        Ok(alert)
    }

    fn update_alert(
        &mut self,
        owner: OwnerId,
        id: AlertId,
        update: AlertUpdate,
    ) -> Result<AlertDefinition, StoreError> {
        let idx = self.alert_index(owner, id)?;
        let updated = self.alerts[idx].with_update(&update, Utc::now())?;
        self.alerts[idx] = updated.clone();
        Ok(updated)
    }

    fn delete_alert(&mut self, owner: OwnerId, id: AlertId) -> Result<(), StoreError> {
        let idx = self.alert_index(owner, id)?;
        self.alerts.remove(idx);
        Ok(())
    }

    fn active_alerts_for_location(
        &mut self,
        owner: OwnerId,
        location: LocationId,
    ) -> Result<Vec<AlertDefinition>, StoreError> {
        self.location_index(owner, location)?;
        Ok(self
            .alerts
            .iter()
            .filter(|a| a.owner_id == owner && a.location_id == location && a.active)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AlertCondition;

    fn peoria() -> NewLocation {
        NewLocation {
            name: "Peoria".to_string(),
            latitude: 40.6936,
            longitude: -89.5890,
            is_favorite: true,
        }
    }

    #[test]
    fn test_locations_are_scoped_to_owner() {
        let mut store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let loc = store.create_location(alice, peoria()).unwrap();
        assert_eq!(store.list_locations(alice).unwrap().len(), 1);
        assert!(store.list_locations(bob).unwrap().is_empty());
        assert_eq!(store.get_location(bob, loc.id), Err(location_not_found()));
        assert_eq!(store.delete_location(bob, loc.id), Err(location_not_found()));
        assert!(store.get_location(alice, loc.id).is_ok(), "bob's delete must not touch alice's data");
    }

    #[test]
    fn test_create_location_rejects_bad_coordinates() {
        let mut store = MemoryStore::new();
        let mut bad = peoria();
        bad.longitude = -200.0;
        let err = store.create_location(Uuid::new_v4(), bad).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn test_alert_on_foreign_location_is_rejected() {
        let mut store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let loc = store.create_location(alice, peoria()).unwrap();

        let err = store
            .create_alert(bob, NewAlert { location_id: loc.id, condition: AlertCondition::Rain, threshold: 0.0 })
            .unwrap_err();
        assert_eq!(err, location_not_found());
        assert!(store.list_alerts(bob).unwrap().is_empty());
    }

    #[test]
    fn test_new_alerts_default_to_active() {
        let mut store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let loc = store.create_location(owner, peoria()).unwrap();
        let alert = store
            .create_alert(owner, NewAlert { location_id: loc.id, condition: AlertCondition::WindAbove, threshold: 8.0 })
            .unwrap();
        assert!(alert.active);
        assert_eq!(alert.owner_id, owner);
        assert_eq!(alert.location_id, loc.id);
    }

    #[test]
    fn test_active_alerts_excludes_toggled_off() {
        let mut store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let loc = store.create_location(owner, peoria()).unwrap();
        let keep = store
            .create_alert(owner, NewAlert { location_id: loc.id, condition: AlertCondition::Snow, threshold: 0.0 })
            .unwrap();
        let mute = store
            .create_alert(owner, NewAlert { location_id: loc.id, condition: AlertCondition::Rain, threshold: 0.0 })
            .unwrap();
        store
            .update_alert(owner, mute.id, AlertUpdate { active: Some(false), ..Default::default() })
            .unwrap();

        let active = store.active_alerts_for_location(owner, loc.id).unwrap();
        assert_eq!(active.iter().map(|a| a.id).collect::<Vec<_>>(), vec![keep.id]);
    }

    #[test]
    fn test_deleting_location_removes_its_alerts() {
        let mut store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let loc = store.create_location(owner, peoria()).unwrap();
        store
            .create_alert(owner, NewAlert { location_id: loc.id, condition: AlertCondition::Snow, threshold: 0.0 })
            .unwrap();

        store.delete_location(owner, loc.id).unwrap();
        assert!(store.list_alerts(owner).unwrap().is_empty());
    }

    #[test]
    fn test_update_and_delete_foreign_alert_is_not_found() {
        let mut store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let loc = store.create_location(owner, peoria()).unwrap();
        let alert = store
            .create_alert(owner, NewAlert { location_id: loc.id, condition: AlertCondition::TemperatureBelow, threshold: 0.0 })
            .unwrap();

        let upd = store.update_alert(intruder, alert.id, AlertUpdate { threshold: Some(5.0), ..Default::default() });
        assert_eq!(upd, Err(alert_not_found()));
        assert_eq!(store.delete_alert(intruder, alert.id), Err(alert_not_found()));
        assert_eq!(store.list_alerts(owner).unwrap()[0].threshold, 0.0);
    }

    #[test]
    fn test_active_alerts_for_foreign_location_is_not_found() {
        let mut store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let loc = store.create_location(owner, peoria()).unwrap();
        store
            .create_alert(owner, NewAlert { location_id: loc.id, condition: AlertCondition::Rain, threshold: 0.0 })
            .unwrap();

        assert_eq!(store.active_alerts_for_location(intruder, loc.id), Err(location_not_found()));
        assert_eq!(store.active_alerts_for_location(owner, Uuid::new_v4()), Err(location_not_found()));
    }

    #[test]
    fn test_alert_listing_carries_location_name_and_coordinates() {
        let mut store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let home = store.create_location(owner, peoria()).unwrap();
        let havana = store
            .create_location(owner, NewLocation { name: "Havana".to_string(), latitude: 40.30, longitude: -90.06, is_favorite: false })
            .unwrap();
        store
            .create_alert(owner, NewAlert { location_id: havana.id, condition: AlertCondition::WindAbove, threshold: 10.0 })
            .unwrap();
        store
            .create_alert(owner, NewAlert { location_id: home.id, condition: AlertCondition::Snow, threshold: 0.0 })
            .unwrap();
        store
            .create_location(Uuid::new_v4(), NewLocation { name: "Elsewhere".to_string(), latitude: 0.0, longitude: 0.0, is_favorite: false })
            .unwrap();

        let listed = crate::store::list_alerts_with_locations(&mut store, owner).unwrap();
        let names: Vec<&str> = listed.iter().map(|a| a.location.name.as_str()).collect();
        assert_eq!(names, vec!["Havana", "Peoria"]);
        assert_eq!(listed[0].location.latitude, 40.30);
        assert_eq!(listed[0].alert.condition, AlertCondition::WindAbove);

        let json = serde_json::to_value(&listed[1]).unwrap();
        assert_eq!(json["condition"], "snow");
        assert_eq!(json["locationId"], home.id.to_string());
        assert_eq!(json["location"]["name"], "Peoria");
        assert_eq!(json["location"]["longitude"], -89.5890);
    }
}

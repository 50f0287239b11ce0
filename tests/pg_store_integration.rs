/// Integration tests for the PostgreSQL location / alert store
///
/// Prerequisites:
/// - A scratch PostgreSQL database
/// - DATABASE_URL set in .env
///
/// Run with: cargo test --test pg_store_integration -- --ignored --test-threads=1

use postgres::{Client, NoTls};
use skywatch_service::model::{AlertCondition, AlertUpdate, LocationUpdate, NewAlert, NewLocation, StoreError};
use skywatch_service::store::{list_alerts_with_locations, AlertStore, LocationStore, PgStore};
use std::env;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn setup_store() -> PgStore {
    dotenv::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let client = Client::connect(&database_url, NoTls).expect("Failed to connect to test database");
    let mut store = PgStore::from_client(client);
    store.ensure_schema().expect("schema creation should succeed");
    store
}

fn chillicothe() -> NewLocation {
    NewLocation {
        name: "Chillicothe".to_string(),
        latitude: 40.92,
        longitude: -89.4854,
        is_favorite: false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn test_location_crud_round_trip() {
    let mut store = setup_store();
    let owner = Uuid::new_v4();

    let created = store.create_location(owner, chillicothe()).unwrap();
    assert_eq!(store.get_location(owner, created.id).unwrap().name, "Chillicothe");

    let updated = store
        .update_location(owner, created.id, LocationUpdate { is_favorite: Some(true), ..Default::default() })
        .unwrap();
    assert!(updated.is_favorite);
    assert_eq!(updated.name, "Chillicothe");
    assert!(updated.updated_at >= created.updated_at);

    store.delete_location(owner, created.id).unwrap();
    assert_eq!(
        store.get_location(owner, created.id),
        Err(StoreError::NotFound("Location".to_string()))
    );
}

#[test]
#[ignore]
fn test_other_owner_cannot_see_or_touch_location() {
    let mut store = setup_store();
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let loc = store.create_location(owner, chillicothe()).unwrap();

    assert!(store.list_locations(intruder).unwrap().is_empty());
    assert!(store.get_location(intruder, loc.id).is_err());
    assert!(store
        .update_location(intruder, loc.id, LocationUpdate { name: Some("Mine".into()), ..Default::default() })
        .is_err());
    assert!(store.delete_location(intruder, loc.id).is_err());
    assert!(store
        .create_alert(intruder, NewAlert { location_id: loc.id, condition: AlertCondition::Rain, threshold: 0.0 })
        .is_err());

    store.delete_location(owner, loc.id).unwrap();
}

#[test]
#[ignore]
fn test_active_alerts_and_cascade_delete() {
    let mut store = setup_store();
    let owner = Uuid::new_v4();
    let loc = store.create_location(owner, chillicothe()).unwrap();

    let first = store
        .create_alert(owner, NewAlert { location_id: loc.id, condition: AlertCondition::TemperatureAbove, threshold: 30.0 })
        .unwrap();
    let second = store
        .create_alert(owner, NewAlert { location_id: loc.id, condition: AlertCondition::WindAbove, threshold: 12.0 })
        .unwrap();
    assert!(first.active && second.active);

    store
        .update_alert(owner, first.id, AlertUpdate { active: Some(false), ..Default::default() })
        .unwrap();
    let active = store.active_alerts_for_location(owner, loc.id).unwrap();
    assert_eq!(active.iter().map(|a| a.id).collect::<Vec<_>>(), vec![second.id]);

    store.delete_location(owner, loc.id).unwrap();
    assert!(store.list_alerts(owner).unwrap().is_empty(), "alerts must be removed with their location");
}

#[test]
#[ignore]
fn test_active_alerts_for_foreign_location_is_not_found() {
    let mut store = setup_store();
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let loc = store.create_location(owner, chillicothe()).unwrap();
    store
        .create_alert(owner, NewAlert { location_id: loc.id, condition: AlertCondition::Snow, threshold: 0.0 })
        .unwrap();

    assert_eq!(
        store.active_alerts_for_location(intruder, loc.id),
        Err(StoreError::NotFound("Location".to_string()))
    );
    assert_eq!(
        store.active_alerts_for_location(owner, Uuid::new_v4()),
        Err(StoreError::NotFound("Location".to_string()))
    );

    store.delete_location(owner, loc.id).unwrap();
}

#[test]
#[ignore]
fn test_alerts_come_back_in_creation_order() {
    let mut store = setup_store();
    let owner = Uuid::new_v4();
    let loc = store.create_location(owner, chillicothe()).unwrap();

    // Created back to back, so several can share a created_at timestamp.
    let created: Vec<Uuid> = AlertCondition::ALL
        .into_iter()
        .map(|condition| {
            store
                .create_alert(owner, NewAlert { location_id: loc.id, condition, threshold: 1.0 })
                .unwrap()
                .id
        })
        .collect();

    let listed: Vec<Uuid> = store.list_alerts(owner).unwrap().iter().map(|a| a.id).collect();
    assert_eq!(listed, created);
    let active: Vec<Uuid> = store.active_alerts_for_location(owner, loc.id).unwrap().iter().map(|a| a.id).collect();
    assert_eq!(active, created);

    let with_locations = list_alerts_with_locations(&mut store, owner).unwrap();
    assert!(with_locations.iter().all(|a| a.location.name == "Chillicothe"));

    store.delete_location(owner, loc.id).unwrap();
}

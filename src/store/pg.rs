/// PostgreSQL-backed location and alert store.
///
/// Uses the synchronous `postgres` client. Ownership is enforced in every
/// `WHERE` clause, and the schema itself ties each alert to a location of the
/// same owner through a composite foreign key, so a mismatched pair cannot be
/// written even by hand.

use chrono::{DateTime, Utc};
use postgres::{Client, NoTls, Row};
use uuid::Uuid;

use super::{alert_not_found, location_not_found, AlertStore, LocationStore};
use crate::logging::{self, DataSource};
use crate::model::{
    AlertCondition, AlertDefinition, AlertId, AlertUpdate, Location, LocationId, LocationUpdate,
    NewAlert, NewLocation, OwnerId, StoreError,
};

/// Tables used by the store. Safe to run repeatedly.
pub const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS locations (
        id          UUID PRIMARY KEY,
        owner_id    UUID NOT NULL,
        name        TEXT NOT NULL CHECK (length(trim(name)) > 0),
        latitude    DOUBLE PRECISION NOT NULL CHECK (latitude BETWEEN -90 AND 90),
        longitude   DOUBLE PRECISION NOT NULL CHECK (longitude BETWEEN -180 AND 180),
        is_favorite BOOLEAN NOT NULL DEFAULT FALSE,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL,
        UNIQUE (id, owner_id)
    );

    CREATE INDEX IF NOT EXISTS locations_owner_idx ON locations (owner_id);

    CREATE TABLE IF NOT EXISTS alerts (
        id          UUID PRIMARY KEY,
        owner_id    UUID NOT NULL,
        location_id UUID NOT NULL,
        condition   TEXT NOT NULL
                    CHECK (condition IN ('temp_above', 'temp_below', 'rain', 'snow', 'wind_above')),
        threshold   DOUBLE PRECISION NOT NULL,
        active      BOOLEAN NOT NULL DEFAULT TRUE,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL,
        FOREIGN KEY (location_id, owner_id)
            REFERENCES locations (id, owner_id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS alerts_location_idx ON alerts (owner_id, location_id) WHERE active;

    ALTER TABLE locations ADD COLUMN IF NOT EXISTS seq BIGSERIAL;
    ALTER TABLE alerts ADD COLUMN IF NOT EXISTS seq BIGSERIAL;
";

/// Insertion order. `created_at` alone can tie within the same microsecond.
const INSERTION_ORDER: &str = "ORDER BY seq";

const LOCATION_COLUMNS: &str =
    "id, owner_id, name, latitude, longitude, is_favorite, created_at, updated_at";

const ALERT_COLUMNS: &str =
    "id, owner_id, location_id, condition, threshold, active, created_at, updated_at";

pub struct PgStore {
    client: Client,
}

impl PgStore {
    /// Connects to `database_url` without TLS.
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        let client = Client::connect(database_url, NoTls)?;
        logging::info(DataSource::Database, None, "Connected to PostgreSQL");
        Ok(Self { client })
    }

    /// Wraps an existing connection.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Creates the tables and indexes if they are missing.
    pub fn ensure_schema(&mut self) -> Result<(), StoreError> {
        self.client.batch_execute(SCHEMA_SQL)?;
        Ok(())
    }
}

fn location_from_row(row: &Row) -> Location {
    Location {
        id: row.get(0),
        owner_id: row.get(1),
        name: row.get(2),
        latitude: row.get(3),
        longitude: row.get(4),
        is_favorite: row.get(5),
        created_at: row.get::<_, DateTime<Utc>>(6),
        updated_at: row.get::<_, DateTime<Utc>>(7),
    }
}

fn alert_from_row(row: &Row) -> Result<AlertDefinition, StoreError> {
    let condition: String = row.get(3);
    let condition = condition
        .parse::<AlertCondition>()
        .map_err(|e| StoreError::Database(format!("corrupt alert row: {}", e)))?;

    Ok(AlertDefinition {
        id: row.get(0),
        owner_id: row.get(1),
        location_id: row.get(2),
        condition,
        threshold: row.get(4),
        active: row.get(5),
        created_at: row.get::<_, DateTime<Utc>>(6),
        updated_at: row.get::<_, DateTime<Utc>>(7),
    })
}

impl LocationStore for PgStore {
    fn list_locations(&mut self, owner: OwnerId) -> Result<Vec<Location>, StoreError> {
        let rows = self.client.query(
            &*format!("SELECT {} FROM locations WHERE owner_id = $1 {}", LOCATION_COLUMNS, INSERTION_ORDER),
            &[&owner],
        )?;
        Ok(rows.iter().map(location_from_row).collect())
    }

    fn get_location(&mut self, owner: OwnerId, id: LocationId) -> Result<Location, StoreError> {
        let row = self.client.query_opt(
            &*format!("SELECT {} FROM locations WHERE id = $1 AND owner_id = $2", LOCATION_COLUMNS),
            &[&id, &owner],
        )?;
        row.as_ref().map(location_from_row).ok_or_else(location_not_found)
    }

    fn create_location(&mut self, owner: OwnerId, new: NewLocation) -> Result<Location, StoreError> {
        new.validate()?;
        let now = Utc::now();
        let row = self.client.query_one(
            &*format!(
                "INSERT INTO locations ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING {}",
                LOCATION_COLUMNS, LOCATION_COLUMNS
            ),
            &[&Uuid::new_v4(), &owner, &new.name, &new.latitude, &new.longitude, &new.is_favorite, &now],
        )?;
        Ok(location_from_row(&row))
    }

    fn update_location(
        &mut self,
        owner: OwnerId,
        id: LocationId,
        update: LocationUpdate,
    ) -> Result<Location, StoreError> {
        let mut tx = self.client.transaction()?;
        let current = tx
            .query_opt(
                &*format!("SELECT {} FROM locations WHERE id = $1 AND owner_id = $2 FOR UPDATE", LOCATION_COLUMNS),
                &[&id, &owner],
            )?
            .as_ref()
            .map(location_from_row)
            .ok_or_else(location_not_found)?;

        let next = current.with_update(&update, Utc::now())?;
        let row = tx.query_one(
            &*format!(
                "UPDATE locations
                 SET name = $3, latitude = $4, longitude = $5, is_favorite = $6, updated_at = $7
                 WHERE id = $1 AND owner_id = $2
                 RETURNING {}",
                LOCATION_COLUMNS
            ),
            &[&id, &owner, &next.name, &next.latitude, &next.longitude, &next.is_favorite, &next.updated_at],
        )?;
        tx.commit()?;
        Ok(location_from_row(&row))
    }

    fn delete_location(&mut self, owner: OwnerId, id: LocationId) -> Result<(), StoreError> {
        // Alerts go with it through ON DELETE CASCADE.
        let deleted = self
            .client
            .execute("DELETE FROM locations WHERE id = $1 AND owner_id = $2", &[&id, &owner])?;
        if deleted == 0 {
            return Err(location_not_found());
        }
        Ok(())
    }
}

impl AlertStore for PgStore {
    fn list_alerts(&mut self, owner: OwnerId) -> Result<Vec<AlertDefinition>, StoreError> {
        let rows = self.client.query(
            &*format!("SELECT {} FROM alerts WHERE owner_id = $1 {}", ALERT_COLUMNS, INSERTION_ORDER),
            &[&owner],
        )?;
        rows.iter().map(alert_from_row).collect()
    }

    fn create_alert(&mut self, owner: OwnerId, new: NewAlert) -> Result<AlertDefinition, StoreError> {
        self.get_location(owner, new.location_id)?;
        new.validate()?;
        let now = Utc::now();
        let row = self.client.query_one(
            &*format!(
                "INSERT INTO alerts ({}) VALUES ($1, $2, $3, $4, $5, TRUE, $6, $6) RETURNING {}",
                ALERT_COLUMNS, ALERT_COLUMNS
            ),
            &[&Uuid::new_v4(), &owner, &new.location_id, &new.condition.as_str(), &new.threshold, &now],
        )?;
        alert_from_row(&row)
    }

    fn update_alert(
        &mut self,
        owner: OwnerId,
        id: AlertId,
        update: AlertUpdate,
    ) -> Result<AlertDefinition, StoreError> {
        let mut tx = self.client.transaction()?;
        let current = match tx.query_opt(
            &*format!("SELECT {} FROM alerts WHERE id = $1 AND owner_id = $2 FOR UPDATE", ALERT_COLUMNS),
            &[&id, &owner],
        )? {
            Some(row) => alert_from_row(&row)?,
            None => return Err(alert_not_found()),
        };

        let next = current.with_update(&update, Utc::now())?;
        let row = tx.query_one(
            &*format!(
                "UPDATE alerts
                 SET condition = $3, threshold = $4, active = $5, updated_at = $6
                 WHERE id = $1 AND owner_id = $2
                 RETURNING {}",
                ALERT_COLUMNS
            ),
            &[&id, &owner, &next.condition.as_str(), &next.threshold, &next.active, &next.updated_at],
        )?;
        tx.commit()?;
        alert_from_row(&row)
    }

    fn delete_alert(&mut self, owner: OwnerId, id: AlertId) -> Result<(), StoreError> {
        let deleted = self
            .client
            .execute("DELETE FROM alerts WHERE id = $1 AND owner_id = $2", &[&id, &owner])?;
        if deleted == 0 {
            return Err(alert_not_found());
        }
        Ok(())
    }

    fn active_alerts_for_location(
        &mut self,
        owner: OwnerId,
        location: LocationId,
    ) -> Result<Vec<AlertDefinition>, StoreError> {
        self.get_location(owner, location)?;
        let rows = self.client.query(
            &*format!(
                "SELECT {} FROM alerts
                 WHERE owner_id = $1 AND location_id = $2 AND active
                 {}",
                ALERT_COLUMNS, INSERTION_ORDER
            ),
            &[&owner, &location],
        )?;
        rows.iter().map(alert_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_condition_check_lists_every_condition() {
        for condition in AlertCondition::ALL {
            assert!(
                SCHEMA_SQL.contains(&*format!("'{}'", condition.as_str())),
                "schema CHECK constraint is missing {}",
                condition
            );
        }
    }

    #[test]
    fn test_listings_order_by_insertion_sequence() {
        assert_eq!(INSERTION_ORDER, "ORDER BY seq");
        assert!(SCHEMA_SQL.contains("ALTER TABLE alerts ADD COLUMN IF NOT EXISTS seq BIGSERIAL"));
        assert!(SCHEMA_SQL.contains("ALTER TABLE locations ADD COLUMN IF NOT EXISTS seq BIGSERIAL"));
    }

    #[test]
    fn test_column_lists_match_row_mappers() {
        assert_eq!(LOCATION_COLUMNS.split(',').count(), 8);
        assert_eq!(ALERT_COLUMNS.split(',').count(), 8);
    }
}

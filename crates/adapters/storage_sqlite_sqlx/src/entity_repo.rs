//! `SQLite` implementation of [`EntityRepository`].

use std::collections::HashMap;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use pockethub_app::ports::EntityRepository;
use pockethub_domain::entity::{AttributeValue, Entity, EntityState};
use pockethub_domain::error::{ConflictError, NotFoundError, PocketError};
use pockethub_domain::id::{EntityId, HubId};
use pockethub_domain::time;

use crate::error::{StorageError, decode};

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Entity);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Entity> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let hub_id: String = row.try_get("hub_id")?;
        let unique_id: String = row.try_get("unique_id")?;
        let entity_id: String = row.try_get("entity_id")?;
        let friendly_name: String = row.try_get("friendly_name")?;
        let state: String = row.try_get("state")?;
        let unit: Option<String> = row.try_get("unit")?;
        let attributes_json: String = row.try_get("attributes")?;
        let last_changed: String = row.try_get("last_changed")?;
        let last_updated: String = row.try_get("last_updated")?;

        let attributes: HashMap<String, AttributeValue> =
            serde_json::from_str(&attributes_json).map_err(decode)?;

        Ok(Self(Entity {
            id: EntityId::from_str(&id).map_err(decode)?,
            hub_id: HubId::from_str(&hub_id).map_err(decode)?,
            unique_id,
            entity_id,
            friendly_name,
            state: EntityState::from_str(&state).map_err(decode)?,
            unit,
            attributes,
            last_changed: time::parse(&last_changed).map_err(decode)?,
            last_updated: time::parse(&last_updated).map_err(decode)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO entities (id, hub_id, unique_id, entity_id, friendly_name, state, unit, attributes, last_changed, last_updated)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM entities WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM entities ORDER BY entity_id";
const SELECT_BY_HUB: &str = "SELECT * FROM entities WHERE hub_id = ? ORDER BY entity_id";
const SELECT_BY_ENTITY_ID: &str = "SELECT * FROM entities WHERE entity_id = ?";

const UPDATE: &str = r"
    UPDATE entities
    SET entity_id = ?, friendly_name = ?, state = ?, unit = ?, attributes = ?,
        last_changed = ?, last_updated = ?
    WHERE id = ?
";

const DELETE_BY_ID: &str = "DELETE FROM entities WHERE id = ?";

/// `SQLite`-backed entity repository.
pub struct SqliteEntityRepository {
    pool: SqlitePool,
}

impl SqliteEntityRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn conflict_or_storage(err: StorageError, entity: &Entity) -> PocketError {
    if err.is_unique_violation() {
        ConflictError {
            entity: "Entity",
            key: entity.entity_id.clone(),
        }
        .into()
    } else {
        err.into()
    }
}

impl EntityRepository for SqliteEntityRepository {
    async fn create(&self, entity: Entity) -> Result<Entity, PocketError> {
        let attributes_json =
            serde_json::to_string(&entity.attributes).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(entity.id.to_string())
            .bind(entity.hub_id.to_string())
            .bind(&entity.unique_id)
            .bind(&entity.entity_id)
            .bind(&entity.friendly_name)
            .bind(entity.state.to_string())
            .bind(entity.unit.as_deref())
            .bind(&attributes_json)
            .bind(time::format(entity.last_changed))
            .bind(time::format(entity.last_updated))
            .execute(&self.pool)
            .await
            .map_err(|err| conflict_or_storage(err.into(), &entity))?;

        Ok(entity)
    }

    async fn get_by_id(&self, id: EntityId) -> Result<Option<Entity>, PocketError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Entity>, PocketError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find_by_hub_id(&self, hub_id: HubId) -> Result<Vec<Entity>, PocketError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_HUB)
            .bind(hub_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find_by_entity_id(&self, entity_id: &str) -> Result<Option<Entity>, PocketError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ENTITY_ID)
            .bind(entity_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn update(&self, entity: Entity) -> Result<Entity, PocketError> {
        let attributes_json =
            serde_json::to_string(&entity.attributes).map_err(StorageError::from)?;

        let done = sqlx::query(UPDATE)
            .bind(&entity.entity_id)
            .bind(&entity.friendly_name)
            .bind(entity.state.to_string())
            .bind(entity.unit.as_deref())
            .bind(&attributes_json)
            .bind(time::format(entity.last_changed))
            .bind(time::format(entity.last_updated))
            .bind(entity.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|err| conflict_or_storage(err.into(), &entity))?;

        if done.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "Entity",
                id: entity.id.to_string(),
            }
            .into());
        }

        Ok(entity)
    }

    async fn delete(&self, id: EntityId) -> Result<(), PocketError> {
        sqlx::query(DELETE_BY_ID)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}

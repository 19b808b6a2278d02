//! `SQLite` implementation of [`HubRepository`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use pockethub_app::ports::HubRepository;
use pockethub_domain::error::{ConflictError, NotFoundError, PocketError};
use pockethub_domain::hub::Hub;
use pockethub_domain::id::HubId;
use pockethub_domain::instrument::TrackedInstrument;
use pockethub_domain::time;

use crate::error::{StorageError, decode};

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Hub);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let instruments_json: String = row.try_get("instruments")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        let instruments: Vec<TrackedInstrument> =
            serde_json::from_str(&instruments_json).map_err(decode)?;

        Ok(Self(Hub {
            id: HubId::from_str(&id).map_err(decode)?,
            name,
            instruments,
            created_at: time::parse(&created_at).map_err(decode)?,
            updated_at: time::parse(&updated_at).map_err(decode)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO hubs (id, name, instruments, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM hubs WHERE id = ?";
const SELECT_BY_NAME: &str = "SELECT * FROM hubs WHERE name = ?";
const SELECT_ALL: &str = "SELECT * FROM hubs ORDER BY name";

const UPDATE: &str = r"
    UPDATE hubs
    SET name = ?, instruments = ?, updated_at = ?
    WHERE id = ?
";

const DELETE_BY_ID: &str = "DELETE FROM hubs WHERE id = ?";

/// `SQLite`-backed hub repository.
///
/// Instruments are stored as a JSON array next to the hub row.
pub struct SqliteHubRepository {
    pool: SqlitePool,
}

impl SqliteHubRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl HubRepository for SqliteHubRepository {
    async fn create(&self, hub: Hub) -> Result<Hub, PocketError> {
        let instruments_json =
            serde_json::to_string(&hub.instruments).map_err(StorageError::from)?;

        let result = sqlx::query(INSERT)
            .bind(hub.id.to_string())
            .bind(&hub.name)
            .bind(&instruments_json)
            .bind(time::format(hub.created_at))
            .bind(time::format(hub.updated_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from);

        match result {
            Ok(_) => Ok(hub),
            Err(err) if err.is_unique_violation() => Err(ConflictError {
                entity: "Hub",
                key: hub.name,
            }
            .into()),
            Err(err) => Err(err.into()),
        }
    }

    async fn get_by_id(&self, id: HubId) -> Result<Option<Hub>, PocketError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Hub>, PocketError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_NAME)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn get_all(&self) -> Result<Vec<Hub>, PocketError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, hub: Hub) -> Result<Hub, PocketError> {
        let instruments_json =
            serde_json::to_string(&hub.instruments).map_err(StorageError::from)?;

        let result = sqlx::query(UPDATE)
            .bind(&hub.name)
            .bind(&instruments_json)
            .bind(time::format(hub.updated_at))
            .bind(hub.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from);

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(NotFoundError {
                entity: "Hub",
                id: hub.id.to_string(),
            }
            .into()),
            Ok(_) => Ok(hub),
            Err(err) if err.is_unique_violation() => Err(ConflictError {
                entity: "Hub",
                key: hub.name,
            }
            .into()),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, id: HubId) -> Result<(), PocketError> {
        sqlx::query(DELETE_BY_ID)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}

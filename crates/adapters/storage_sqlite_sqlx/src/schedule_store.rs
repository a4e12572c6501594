//! `SQLite` implementation of [`ScheduleStore`].

use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use plugsched_app::ports::ScheduleStore;
use plugsched_domain::device::{Device, DeviceRef};
use plugsched_domain::error::{NotFoundError, PlugSchedError};
use plugsched_domain::id::ScheduleId;
use plugsched_domain::schedule::{
    ActiveSchedule, MalformedSchedule, OverridePolicy, SchedulePatch, ScheduleRecord,
    StoredSchedule,
};

use crate::error::StorageError;

fn decode<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

fn optional_u32(row: &SqliteRow, column: &str) -> Result<Option<u32>, sqlx::Error> {
    let value: Option<i64> = row.try_get(column)?;
    value.map(u32::try_from).transpose().map_err(decode)
}

fn record_from_row(row: &SqliteRow) -> Result<ScheduleRecord, sqlx::Error> {
    let id: String = row.try_get("id")?;
    let device_ref: String = row.try_get("device_ref")?;
    let policy: String = row.try_get("override_policy")?;

    Ok(ScheduleRecord {
        id: ScheduleId::from_str(&id).map_err(decode)?,
        name: row.try_get("name")?,
        device_ref: DeviceRef::from_str(&device_ref).map_err(decode)?,
        hour: optional_u32(row, "hour")?,
        minute: optional_u32(row, "minute")?,
        desired_power: row.try_get("desired_power")?,
        active: row.try_get("active")?,
        override_policy: OverridePolicy::from_str(&policy).map_err(decode)?,
    })
}

/// Wrapper for converting database rows into a domain [`ScheduleRecord`].
struct Wrapper(ScheduleRecord);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<ScheduleRecord> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        record_from_row(row).map(Self)
    }
}

/// Decode a schedule row joined with its (optional) device row.
fn active_from_row(row: &SqliteRow) -> Result<ActiveSchedule, sqlx::Error> {
    let record = record_from_row(row)?;
    let joined: Option<String> = row.try_get("device_joined")?;
    let device = match joined {
        Some(_) => Some(Device {
            device_ref: record.device_ref.clone(),
            name: row.try_get("device_name")?,
            room: row.try_get("device_room")?,
            fallback_address: row.try_get("device_fallback_address")?,
        }),
        None => None,
    };
    Ok(ActiveSchedule { record, device })
}

fn stored_from_row(row: &SqliteRow) -> StoredSchedule {
    active_from_row(row).map_err(|err| MalformedSchedule {
        id: row.try_get::<String, _>("id").unwrap_or_default(),
        reason: err.to_string(),
    })
}

struct DeviceWrapper(Device);

impl<'r> FromRow<'r, SqliteRow> for DeviceWrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let device_ref: String = row.try_get("device_ref")?;
        Ok(Self(Device {
            device_ref: DeviceRef::from_str(&device_ref).map_err(decode)?,
            name: row.try_get("name")?,
            room: row.try_get("room")?,
            fallback_address: row.try_get("fallback_address")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO schedules (id, name, device_ref, hour, minute, desired_power, active, override_policy) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM schedules WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM schedules ORDER BY name, id";
const SELECT_ACTIVE: &str = "SELECT s.*, d.device_ref AS device_joined, d.name AS device_name, d.room AS device_room, d.fallback_address AS device_fallback_address \
     FROM schedules s LEFT JOIN devices d ON d.device_ref = s.device_ref \
     WHERE s.active = 1 ORDER BY s.name, s.id";
const UPDATE: &str = "UPDATE schedules SET name = ?, device_ref = ?, hour = ?, minute = ?, desired_power = ?, active = ?, override_policy = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM schedules WHERE id = ?";
const SELECT_DEVICES: &str = "SELECT * FROM devices ORDER BY name, device_ref";
const UPSERT_DEVICE: &str = "INSERT INTO devices (device_ref, name, room, fallback_address) VALUES (?, ?, ?, ?) \
     ON CONFLICT (device_ref) DO UPDATE SET name = excluded.name, room = excluded.room, fallback_address = excluded.fallback_address";

fn not_found(id: ScheduleId) -> PlugSchedError {
    NotFoundError {
        entity: "Schedule",
        id: id.to_string(),
    }
    .into()
}

/// `SQLite`-backed schedule store.
#[derive(Clone)]
pub struct SqliteScheduleStore {
    pool: SqlitePool,
}

impl SqliteScheduleStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ScheduleStore for SqliteScheduleStore {
    fn list_active(
        &self,
    ) -> impl Future<Output = Result<Vec<StoredSchedule>, PlugSchedError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows = sqlx::query(SELECT_ACTIVE)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.iter().map(stored_from_row).collect())
        }
    }

    fn list_all(&self) -> impl Future<Output = Result<Vec<ScheduleRecord>, PlugSchedError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn get_by_id(
        &self,
        id: ScheduleId,
    ) -> impl Future<Output = Result<Option<ScheduleRecord>, PlugSchedError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn create(
        &self,
        record: ScheduleRecord,
    ) -> impl Future<Output = Result<ScheduleRecord, PlugSchedError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(record.id.to_string())
                .bind(&record.name)
                .bind(record.device_ref.to_string())
                .bind(record.hour.map(i64::from))
                .bind(record.minute.map(i64::from))
                .bind(record.desired_power)
                .bind(record.active)
                .bind(record.override_policy.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(record)
        }
    }

    fn update(
        &self,
        id: ScheduleId,
        patch: SchedulePatch,
    ) -> impl Future<Output = Result<ScheduleRecord, PlugSchedError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;

            let current: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            let record = patch.apply(Wrapper::maybe(current).ok_or_else(|| not_found(id))?);

            sqlx::query(UPDATE)
                .bind(&record.name)
                .bind(record.device_ref.to_string())
                .bind(record.hour.map(i64::from))
                .bind(record.minute.map(i64::from))
                .bind(record.desired_power)
                .bind(record.active)
                .bind(record.override_policy.to_string())
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(record)
        }
    }

    fn delete(&self, id: ScheduleId) -> impl Future<Output = Result<(), PlugSchedError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(DELETE_BY_ID)
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 0 {
                return Err(not_found(id));
            }
            Ok(())
        }
    }

    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, PlugSchedError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<DeviceWrapper> = sqlx::query_as(SELECT_DEVICES)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn upsert_device(
        &self,
        device: Device,
    ) -> impl Future<Output = Result<Device, PlugSchedError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPSERT_DEVICE)
                .bind(device.device_ref.to_string())
                .bind(&device.name)
                .bind(&device.room)
                .bind(&device.fallback_address)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(device)
        }
    }
}

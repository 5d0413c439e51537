//! SQLite storage adapter for contracts, market snapshots and alerts.
//!
//! Timestamps are stored as RFC 3339 text, dates as `YYYY-MM-DD`, and enums
//! by their lowercase names. Listings follow rowid, which is insertion order.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, Row};

use crate::domain::alert::{Alert, AlertType};
use crate::domain::contract::{Contract, DeliveryWindow};
use crate::domain::crop::{ContractStatus, ContractType, Crop};
use crate::domain::error::GrainError;
use crate::domain::snapshot::MarketSnapshot;
use crate::ports::alert_port::AlertPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::contract_port::ContractPort;
use crate::ports::snapshot_port::SnapshotPort;

const DATE_FORMAT: &str = "%Y-%m-%d";

const CONTRACT_COLUMNS: &str = "id, crop, contract_type, bushels, futures_price, basis, futures_month,
     elevator, delivery_start, delivery_end, status, crop_year, notes, created_at, updated_at";

const SNAPSHOT_COLUMNS: &str =
    "id, crop, futures_month, futures_price, cash_price, basis, implied_vol, snapshot_at";

const ALERT_COLUMNS: &str =
    "id, crop, alert_type, target_value, futures_month, active, notified, created_at";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> GrainError {
    GrainError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> GrainError {
    GrainError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn date(d: Option<NaiveDate>) -> Option<String> {
    d.map(|d| d.format(DATE_FORMAT).to_string())
}

fn conversion_failure<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
}

fn enum_column<T>(row: &Row<'_>, column: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = GrainError>,
{
    let raw: String = row.get(column)?;
    raw.parse::<T>().map_err(|e| conversion_failure(column, e))
}

fn timestamp_column(row: &Row<'_>, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| conversion_failure(column, e))
}

fn date_column(row: &Row<'_>, column: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion_failure(column, e)))
        .transpose()
}

fn contract_from_row(row: &Row<'_>) -> rusqlite::Result<Contract> {
    Ok(Contract {
        id: row.get(0)?,
        crop: enum_column(row, 1)?,
        contract_type: enum_column::<ContractType>(row, 2)?,
        bushels: row.get(3)?,
        futures_price: row.get(4)?,
        basis: row.get(5)?,
        futures_month: row.get(6)?,
        elevator: row.get(7)?,
        delivery: DeliveryWindow {
            start: date_column(row, 8)?,
            end: date_column(row, 9)?,
        },
        status: enum_column::<ContractStatus>(row, 10)?,
        crop_year: row.get(11)?,
        notes: row.get(12)?,
        created_at: timestamp_column(row, 13)?,
        updated_at: timestamp_column(row, 14)?,
    })
}

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<MarketSnapshot> {
    Ok(MarketSnapshot {
        id: row.get(0)?,
        crop: enum_column(row, 1)?,
        futures_month: row.get(2)?,
        futures_price: row.get(3)?,
        cash_price: row.get(4)?,
        basis: row.get(5)?,
        implied_vol: row.get(6)?,
        snapshot_at: timestamp_column(row, 7)?,
    })
}

fn alert_from_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    Ok(Alert {
        id: row.get(0)?,
        crop: enum_column(row, 1)?,
        alert_type: enum_column::<AlertType>(row, 2)?,
        target_value: row.get(3)?,
        futures_month: row.get(4)?,
        active: row.get(5)?,
        notified: row.get(6)?,
        created_at: timestamp_column(row, 7)?,
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, GrainError> {
        let db_path = config
            .get_string("sqlite", "path")
            .ok_or_else(|| GrainError::ConfigMissing {
                section: "sqlite".into(),
                key: "path".into(),
            })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, GrainError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, GrainError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), GrainError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS contracts (
                id TEXT PRIMARY KEY,
                crop TEXT NOT NULL,
                contract_type TEXT NOT NULL,
                bushels REAL NOT NULL,
                futures_price REAL NOT NULL,
                basis REAL,
                futures_month TEXT,
                elevator TEXT NOT NULL,
                delivery_start TEXT,
                delivery_end TEXT,
                status TEXT NOT NULL DEFAULT 'open',
                crop_year INTEGER,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS market_snapshots (
                id TEXT PRIMARY KEY,
                crop TEXT NOT NULL,
                futures_month TEXT NOT NULL,
                futures_price REAL NOT NULL,
                cash_price REAL NOT NULL,
                basis REAL NOT NULL,
                implied_vol REAL,
                snapshot_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS alerts (
                id TEXT PRIMARY KEY,
                crop TEXT NOT NULL,
                alert_type TEXT NOT NULL,
                target_value REAL NOT NULL,
                futures_month TEXT,
                active INTEGER NOT NULL DEFAULT 1,
                notified INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_contracts_crop ON contracts(crop);
            CREATE INDEX IF NOT EXISTS idx_snapshots_crop ON market_snapshots(crop);",
        )
        .map_err(query_error)?;

        Ok(())
    }

    fn query_all<T>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, GrainError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(query_error)?;
        let rows = stmt.query_map(params, map).map_err(query_error)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(query_error)?);
        }
        Ok(out)
    }

    fn query_one<T>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>, GrainError> {
        Ok(self.query_all(sql, params, map)?.into_iter().next())
    }

    fn execute(&self, sql: &str, params: impl rusqlite::Params) -> Result<usize, GrainError> {
        self.conn()?.execute(sql, params).map_err(query_error)
    }
}

impl ContractPort for SqliteAdapter {
    fn insert_contract(&self, c: &Contract) -> Result<(), GrainError> {
        self.execute(
            &format!(
                "INSERT INTO contracts ({CONTRACT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ),
            params![
                c.id,
                c.crop.as_str(),
                c.contract_type.as_str(),
                c.bushels,
                c.futures_price,
                c.basis,
                c.futures_month,
                c.elevator,
                date(c.delivery.start),
                date(c.delivery.end),
                c.status.as_str(),
                c.crop_year,
                c.notes,
                timestamp(&c.created_at),
                timestamp(&c.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_contract(&self, id: &str) -> Result<Option<Contract>, GrainError> {
        self.query_one(
            &format!("SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = ?1"),
            params![id],
            contract_from_row,
        )
    }

    fn replace_contract(&self, c: &Contract) -> Result<bool, GrainError> {
        let changed = self.execute(
            "UPDATE contracts SET crop = ?2, contract_type = ?3, bushels = ?4, futures_price = ?5,
                 basis = ?6, futures_month = ?7, elevator = ?8, delivery_start = ?9,
                 delivery_end = ?10, status = ?11, crop_year = ?12, notes = ?13,
                 created_at = ?14, updated_at = ?15
             WHERE id = ?1",
            params![
                c.id,
                c.crop.as_str(),
                c.contract_type.as_str(),
                c.bushels,
                c.futures_price,
                c.basis,
                c.futures_month,
                c.elevator,
                date(c.delivery.start),
                date(c.delivery.end),
                c.status.as_str(),
                c.crop_year,
                c.notes,
                timestamp(&c.created_at),
                timestamp(&c.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_contract(&self, id: &str) -> Result<bool, GrainError> {
        Ok(self.execute("DELETE FROM contracts WHERE id = ?1", params![id])? > 0)
    }

    fn list_contracts(&self) -> Result<Vec<Contract>, GrainError> {
        self.query_all(
            &format!("SELECT {CONTRACT_COLUMNS} FROM contracts ORDER BY rowid ASC"),
            [],
            contract_from_row,
        )
    }
}

impl SnapshotPort for SqliteAdapter {
    fn append_snapshot(&self, s: &MarketSnapshot) -> Result<(), GrainError> {
        self.execute(
            &format!(
                "INSERT INTO market_snapshots ({SNAPSHOT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            params![
                s.id,
                s.crop.as_str(),
                s.futures_month,
                s.futures_price,
                s.cash_price,
                s.basis,
                s.implied_vol,
                timestamp(&s.snapshot_at),
            ],
        )?;
        Ok(())
    }

    fn snapshots_for(&self, crop: Crop) -> Result<Vec<MarketSnapshot>, GrainError> {
        self.query_all(
            &format!(
                "SELECT {SNAPSHOT_COLUMNS} FROM market_snapshots WHERE crop = ?1 ORDER BY rowid ASC"
            ),
            params![crop.as_str()],
            snapshot_from_row,
        )
    }
}

impl AlertPort for SqliteAdapter {
    fn insert_alert(&self, a: &Alert) -> Result<(), GrainError> {
        self.execute(
            &format!("INSERT INTO alerts ({ALERT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                a.id,
                a.crop.as_str(),
                a.alert_type.as_str(),
                a.target_value,
                a.futures_month,
                a.active,
                a.notified,
                timestamp(&a.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_alert(&self, id: &str) -> Result<Option<Alert>, GrainError> {
        self.query_one(
            &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"),
            params![id],
            alert_from_row,
        )
    }

    fn replace_alert(&self, a: &Alert) -> Result<bool, GrainError> {
        let changed = self.execute(
            "UPDATE alerts SET crop = ?2, alert_type = ?3, target_value = ?4, futures_month = ?5,
                 active = ?6, notified = ?7, created_at = ?8
             WHERE id = ?1",
            params![
                a.id,
                a.crop.as_str(),
                a.alert_type.as_str(),
                a.target_value,
                a.futures_month,
                a.active,
                a.notified,
                timestamp(&a.created_at),
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_alert(&self, id: &str) -> Result<bool, GrainError> {
        Ok(self.execute("DELETE FROM alerts WHERE id = ?1", params![id])? > 0)
    }

    fn list_alerts(&self) -> Result<Vec<Alert>, GrainError> {
        self.query_all(
            &format!("SELECT {ALERT_COLUMNS} FROM alerts ORDER BY rowid ASC"),
            [],
            alert_from_row,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
        fn sections(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, h, 30, 0).unwrap()
    }

    fn contract(id: &str) -> Contract {
        Contract {
            id: id.into(),
            crop: Crop::Soybeans,
            contract_type: ContractType::Hta,
            bushels: 5000.0,
            futures_price: 10.85,
            basis: None,
            futures_month: Some("Nov26".into()),
            elevator: "ADM".into(),
            delivery: DeliveryWindow {
                start: NaiveDate::from_ymd_opt(2026, 10, 1),
                end: NaiveDate::from_ymd_opt(2026, 11, 30),
            },
            status: ContractStatus::Open,
            crop_year: Some(2026),
            notes: Some("hedge".into()),
            created_at: at(9) + Duration::nanoseconds(123_456_789),
            updated_at: at(9),
        }
    }

    fn snapshot(id: &str, crop: Crop, hour: u32) -> MarketSnapshot {
        MarketSnapshot {
            id: id.into(),
            crop,
            futures_month: "Dec26".into(),
            futures_price: 4.62,
            cash_price: 4.27,
            basis: -35.0,
            implied_vol: Some(0.22),
            snapshot_at: at(hour),
        }
    }

    #[test]
    fn from_config_missing_path() {
        let result = SqliteAdapter::from_config(&EmptyConfig);
        match result {
            Err(GrainError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn initialize_schema_is_idempotent() {
        let adapter = adapter();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn contract_round_trips_every_column() {
        let adapter = adapter();
        let original = contract("c-1");
        adapter.insert_contract(&original).unwrap();

        let fetched = adapter.get_contract("c-1").unwrap().unwrap();
        assert_eq!(fetched, original);
        assert!(adapter.get_contract("missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_contract_id_fails() {
        let adapter = adapter();
        adapter.insert_contract(&contract("c-1")).unwrap();
        let err = adapter.insert_contract(&contract("c-1")).unwrap_err();
        assert!(matches!(err, GrainError::DatabaseQuery { .. }));
    }

    #[test]
    fn replace_keeps_listing_order() {
        let adapter = adapter();
        for id in ["b", "a", "c"] {
            adapter.insert_contract(&contract(id)).unwrap();
        }
        let mut changed = contract("b");
        changed.status = ContractStatus::Delivered;
        changed.basis = Some(-42.5);
        assert!(adapter.replace_contract(&changed).unwrap());
        assert!(!adapter.replace_contract(&contract("zzz")).unwrap());

        let listed = adapter.list_contracts().unwrap();
        let ids: Vec<&str> = listed.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(listed[0].status, ContractStatus::Delivered);
        assert_eq!(listed[0].basis, Some(-42.5));
    }

    #[test]
    fn delete_contract_reports_presence() {
        let adapter = adapter();
        adapter.insert_contract(&contract("c-1")).unwrap();
        assert!(adapter.delete_contract("c-1").unwrap());
        assert!(!adapter.delete_contract("c-1").unwrap());
    }

    #[test]
    fn snapshots_are_filtered_by_crop_in_insertion_order() {
        let adapter = adapter();
        adapter.append_snapshot(&snapshot("s2", Crop::Corn, 14)).unwrap();
        adapter.append_snapshot(&snapshot("s1", Crop::Corn, 9)).unwrap();
        adapter.append_snapshot(&snapshot("s3", Crop::Soybeans, 10)).unwrap();

        let corn = adapter.snapshots_for(Crop::Corn).unwrap();
        assert_eq!(corn.len(), 2);
        assert_eq!(corn[0].id, "s2");
        assert_eq!(corn[1], snapshot("s1", Crop::Corn, 9));
    }

    #[test]
    fn alert_round_trip_and_update() {
        let adapter = adapter();
        let mut alert = Alert {
            id: "a-1".into(),
            crop: Crop::Corn,
            alert_type: AlertType::BasisAbove,
            target_value: -25.0,
            futures_month: Some("Dec26".into()),
            active: true,
            notified: false,
            created_at: at(8),
        };
        adapter.insert_alert(&alert).unwrap();
        assert_eq!(adapter.get_alert("a-1").unwrap(), Some(alert.clone()));

        alert.active = false;
        alert.notified = true;
        assert!(adapter.replace_alert(&alert).unwrap());
        assert_eq!(adapter.list_alerts().unwrap(), vec![alert]);

        assert!(adapter.delete_alert("a-1").unwrap());
        assert!(adapter.list_alerts().unwrap().is_empty());
    }

    #[test]
    fn unknown_enum_text_is_a_query_error() {
        let adapter = adapter();
        adapter.insert_contract(&contract("c-1")).unwrap();
        adapter
            .execute("UPDATE contracts SET crop = 'wheat' WHERE id = 'c-1'", [])
            .unwrap();
        let err = adapter.get_contract("c-1").unwrap_err();
        assert!(matches!(err, GrainError::DatabaseQuery { .. }));
    }
}

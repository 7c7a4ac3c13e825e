//! SQLite repository adapter.
//!
//! Prices, moving averages and signal levels are stored as TEXT so decimal
//! values survive a round trip unchanged. Dates use `%Y-%m-%d`, which sorts
//! lexicographically in date order.

use crate::domain::asset::{AssetClass, SymbolMetadata};
use crate::domain::error::GekkoError;
use crate::domain::price::{PricePoint, TimeseriesRecord};
use crate::domain::signal::{SignalEvent, SignalType, Timeframe};
use crate::ports::config_port::ConfigPort;
use crate::ports::metadata_port::MetadataPort;
use crate::ports::price_port::{MovingAverageUpdate, PricePort};
use crate::ports::signal_port::{Recorded, SignalFilter, SignalPort};
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, Row, params};
use rust_decimal::Decimal;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS price_timeseries (
        symbol TEXT NOT NULL,
        date TEXT NOT NULL,
        open TEXT,
        high TEXT,
        low TEXT,
        close TEXT NOT NULL,
        volume INTEGER,
        ma_short TEXT,
        ma_long TEXT,
        PRIMARY KEY (symbol, date)
    );
    CREATE INDEX IF NOT EXISTS idx_price_timeseries_date ON price_timeseries(date);

    CREATE TABLE IF NOT EXISTS chart_signals (
        symbol TEXT NOT NULL,
        timeframe TEXT NOT NULL,
        signal_date TEXT NOT NULL,
        signal_type TEXT NOT NULL,
        ma_short TEXT NOT NULL,
        ma_long TEXT NOT NULL,
        PRIMARY KEY (symbol, timeframe, signal_date)
    );
    CREATE INDEX IF NOT EXISTS idx_chart_signals_date ON chart_signals(signal_date);

    CREATE TABLE IF NOT EXISTS symbol_metadata (
        symbol TEXT NOT NULL,
        asset_class TEXT NOT NULL,
        name TEXT NOT NULL,
        unit TEXT,
        PRIMARY KEY (symbol, asset_class)
    );";

const RECORD_COLUMNS: &str = "symbol, date, open, high, low, close, volume, ma_short, ma_long";
const SIGNAL_COLUMNS: &str = "symbol, timeframe, signal_date, signal_type, ma_short, ma_long";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, GekkoError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| GekkoError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(db_err)?;

        Ok(Self { pool })
    }

    /// A private in-memory database. The pool holds one connection so every
    /// call sees the same data.
    pub fn in_memory() -> Result<Self, GekkoError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(db_err)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), GekkoError> {
        self.conn()?.execute_batch(SCHEMA).map_err(query_err)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, GekkoError> {
        self.pool.get().map_err(db_err)
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<TimeseriesRecord>, GekkoError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(query_err)?;
        let rows = stmt.query_map(params, record_from_row).map_err(query_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }
}

impl PricePort for SqliteAdapter {
    fn write_series(
        &self,
        symbol: &str,
        points: &[PricePoint],
        averages: &[MovingAverageUpdate],
    ) -> Result<usize, GekkoError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        let mut written = 0;
        {
            let mut upsert = tx
                .prepare(
                    "INSERT INTO price_timeseries (symbol, date, open, high, low, close, volume)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(symbol, date) DO UPDATE SET
                        open = excluded.open,
                        high = excluded.high,
                        low = excluded.low,
                        close = excluded.close,
                        volume = excluded.volume",
                )
                .map_err(query_err)?;
            for p in points {
                written += upsert
                    .execute(params![
                        symbol,
                        format_date(p.date),
                        p.open.map(|d| d.to_string()),
                        p.high.map(|d| d.to_string()),
                        p.low.map(|d| d.to_string()),
                        p.close.to_string(),
                        p.volume,
                    ])
                    .map_err(query_err)?;
            }

            let mut update = tx
                .prepare(
                    "UPDATE price_timeseries SET ma_short = ?3, ma_long = ?4
                     WHERE symbol = ?1 AND date = ?2",
                )
                .map_err(query_err)?;
            for u in averages {
                update
                    .execute(params![
                        symbol,
                        format_date(u.date),
                        u.ma_short.map(|d| d.to_string()),
                        u.ma_long.map(|d| d.to_string()),
                    ])
                    .map_err(query_err)?;
            }
        }

        // Dropping `tx` on an early return rolls both steps back.
        tx.commit().map_err(query_err)?;
        Ok(written)
    }

    fn load_series(&self, symbol: &str) -> Result<Vec<TimeseriesRecord>, GekkoError> {
        self.query_records(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM price_timeseries
                 WHERE symbol = ?1 ORDER BY date ASC"
            ),
            params![symbol],
        )
    }

    fn load_series_since(
        &self,
        symbol: &str,
        start: NaiveDate,
    ) -> Result<Vec<TimeseriesRecord>, GekkoError> {
        self.query_records(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM price_timeseries
                 WHERE symbol = ?1 AND date >= ?2 ORDER BY date ASC"
            ),
            params![symbol, format_date(start)],
        )
    }

    fn get_record(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<TimeseriesRecord>, GekkoError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM price_timeseries
                 WHERE symbol = ?1 AND date = ?2"
            ),
            params![symbol, format_date(date)],
            record_from_row,
        )
        .optional()
        .map_err(query_err)
    }

    fn latest_records(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<TimeseriesRecord>, GekkoError> {
        let mut records = self.query_records(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM price_timeseries
                 WHERE symbol = ?1 ORDER BY date DESC LIMIT ?2"
            ),
            params![symbol, limit as i64],
        )?;
        records.reverse();
        Ok(records)
    }

    fn priced_symbols(&self) -> Result<Vec<String>, GekkoError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM price_timeseries ORDER BY symbol")
            .map_err(query_err)?;
        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_err)?;
        rows.collect::<Result<Vec<String>, _>>().map_err(query_err)
    }
}

impl SignalPort for SqliteAdapter {
    fn find_signal(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        signal_date: NaiveDate,
    ) -> Result<Option<SignalEvent>, GekkoError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {SIGNAL_COLUMNS} FROM chart_signals
                 WHERE symbol = ?1 AND timeframe = ?2 AND signal_date = ?3"
            ),
            params![symbol, timeframe.as_str(), format_date(signal_date)],
            signal_from_row,
        )
        .optional()
        .map_err(query_err)
    }

    fn record_signal(&self, event: &SignalEvent) -> Result<Recorded, GekkoError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        let inserted = tx
            .execute(
                &format!(
                    "INSERT OR IGNORE INTO chart_signals ({SIGNAL_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                ),
                params![
                    event.symbol,
                    event.timeframe.as_str(),
                    format_date(event.signal_date),
                    event.signal_type.as_str(),
                    event.ma_short.to_string(),
                    event.ma_long.to_string(),
                ],
            )
            .map_err(query_err)?;

        let recorded = if inserted == 1 {
            Recorded::Created(event.clone())
        } else {
            let stored = tx
                .query_row(
                    &format!(
                        "SELECT {SIGNAL_COLUMNS} FROM chart_signals
                         WHERE symbol = ?1 AND timeframe = ?2 AND signal_date = ?3"
                    ),
                    params![
                        event.symbol,
                        event.timeframe.as_str(),
                        format_date(event.signal_date)
                    ],
                    signal_from_row,
                )
                .map_err(query_err)?;
            Recorded::Existing(stored)
        };

        tx.commit().map_err(query_err)?;
        Ok(recorded)
    }

    fn signals_since(
        &self,
        since: NaiveDate,
        filter: &SignalFilter,
    ) -> Result<Vec<SignalEvent>, GekkoError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SIGNAL_COLUMNS} FROM chart_signals
                 WHERE signal_date >= ?1
                   AND (?2 IS NULL OR symbol = ?2)
                   AND (?3 IS NULL OR signal_type = ?3)"
            ))
            .map_err(query_err)?;

        let rows = stmt
            .query_map(
                params![
                    format_date(since),
                    filter.symbol,
                    filter.signal_type.map(|t| t.as_str()),
                ],
                signal_from_row,
            )
            .map_err(query_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }
}

impl MetadataPort for SqliteAdapter {
    fn ensure_metadata(&self, metadata: &SymbolMetadata) -> Result<bool, GekkoError> {
        let inserted = self
            .conn()?
            .execute(
                "INSERT OR IGNORE INTO symbol_metadata (symbol, asset_class, name, unit)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    metadata.symbol,
                    metadata.asset_class.as_str(),
                    metadata.name,
                    metadata.unit,
                ],
            )
            .map_err(query_err)?;
        Ok(inserted == 1)
    }

    fn symbols_in_class(&self, asset_class: AssetClass) -> Result<Vec<String>, GekkoError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT symbol FROM symbol_metadata WHERE asset_class = ?1 ORDER BY symbol")
            .map_err(query_err)?;
        let rows = stmt
            .query_map(params![asset_class.as_str()], |row| row.get(0))
            .map_err(query_err)?;
        rows.collect::<Result<Vec<String>, _>>().map_err(query_err)
    }

    fn all_metadata(&self) -> Result<Vec<SymbolMetadata>, GekkoError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT symbol, asset_class, name, unit FROM symbol_metadata")
            .map_err(query_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SymbolMetadata {
                    symbol: row.get(0)?,
                    asset_class: parse_col(row, 1)?,
                    name: row.get(2)?,
                    unit: row.get(3)?,
                })
            })
            .map_err(query_err)?;

        let mut metadata = rows.collect::<Result<Vec<_>, _>>().map_err(query_err)?;
        metadata.sort_by(|a, b| {
            a.asset_class
                .cmp(&b.asset_class)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        Ok(metadata)
    }
}

fn db_err(e: r2d2::Error) -> GekkoError {
    GekkoError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> GekkoError {
    GekkoError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn conversion_err(
    idx: usize,
    e: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
}

fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_err(idx, e))
}

/// Parse a TEXT column through `FromStr`.
fn parse_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_err(idx, e))
}

fn opt_decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| Decimal::from_str(&s).map_err(|e| conversion_err(idx, e)))
        .transpose()
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<TimeseriesRecord> {
    Ok(TimeseriesRecord {
        price: PricePoint {
            symbol: row.get(0)?,
            date: date_col(row, 1)?,
            open: opt_decimal_col(row, 2)?,
            high: opt_decimal_col(row, 3)?,
            low: opt_decimal_col(row, 4)?,
            close: parse_col(row, 5)?,
            volume: row.get(6)?,
        },
        ma_short: opt_decimal_col(row, 7)?,
        ma_long: opt_decimal_col(row, 8)?,
    })
}

fn signal_from_row(row: &Row<'_>) -> rusqlite::Result<SignalEvent> {
    Ok(SignalEvent {
        symbol: row.get(0)?,
        timeframe: parse_col::<Timeframe>(row, 1)?,
        signal_date: date_col(row, 2)?,
        signal_type: parse_col::<SignalType>(row, 3)?,
        ma_short: parse_col(row, 4)?,
        ma_long: parse_col(row, 5)?,
    })
}

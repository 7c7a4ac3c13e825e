//! CSV price feed: one `<SYMBOL>.csv` file per symbol under a base directory.
//!
//! Columns are located by header name (case-insensitive). `date` and `close`
//! are required; `open`, `high`, `low` and `volume` may be missing or blank.

use crate::domain::error::GekkoError;
use crate::domain::price::{PricePoint, parse_optional_price, parse_price};
use crate::ports::feed_port::PriceFeed;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(symbol: &str, headers: &csv::StringRecord) -> Result<Self, GekkoError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| GekkoError::validation(symbol, format!("missing {name} column")))
        };

        Ok(Self {
            date: required("date")?,
            close: required("close")?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            volume: find("volume"),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Symbols with a CSV file in the base directory, sorted.
    pub fn available_symbols(&self) -> Result<Vec<String>, GekkoError> {
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

impl PriceFeed for CsvAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, GekkoError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => GekkoError::NotFound {
                symbol: symbol.to_string(),
                detail: format!("no price file at {}", path.display()),
            },
            _ => GekkoError::Io(e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| GekkoError::validation(symbol, format!("CSV header error: {}", e)))?
            .clone();
        let cols = Columns::from_headers(symbol, &headers)?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result
                .map_err(|e| GekkoError::validation(symbol, format!("CSV parse error: {}", e)))?;

            let date_str = record.get(cols.date).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                GekkoError::validation(symbol, format!("invalid date {date_str:?}: {e}"))
            })?;
            if date < start || date > end {
                continue;
            }

            let field = |idx: Option<usize>| idx.and_then(|i| record.get(i));
            let volume = match field(cols.volume).map(str::trim) {
                None | Some("") => None,
                Some(v) => Some(v.parse::<i64>().map_err(|_| {
                    GekkoError::validation(symbol, format!("non-numeric volume: {v:?}"))
                })?),
            };

            points.push(PricePoint {
                symbol: symbol.to_string(),
                date,
                close: parse_price(symbol, "close", record.get(cols.close).unwrap_or(""))?,
                open: parse_optional_price(symbol, "open", field(cols.open))?,
                high: parse_optional_price(symbol, "high", field(cols.high))?,
                low: parse_optional_price(symbol, "low", field(cols.low))?,
                volume,
            });
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, content: &str) {
        let mut file = File::create(dir.path().join(name)).unwrap();
        write!(file, "{}", content).unwrap();
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn fetch_prices_reads_and_sorts_rows() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "GC=F.csv",
            "date,open,high,low,close,volume\n\
             2024-01-03,2040.5,2050.0,2035.0,2045.25,1500\n\
             2024-01-02,2030.0,2042.0,2028.0,2040.10,1200\n",
        );

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let points = adapter.fetch_prices("GC=F", date(1), date(31)).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date(2));
        assert_eq!(points[0].close, dec!(2040.10));
        assert_eq!(points[1].open, Some(dec!(2040.5)));
        assert_eq!(points[1].volume, Some(1500));
    }

    #[test]
    fn fetch_prices_filters_date_range() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "SI=F.csv",
            "date,close\n2024-01-01,23.1\n2024-01-05,23.4\n2024-01-10,23.9\n",
        );

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let points = adapter.fetch_prices("SI=F", date(2), date(9)).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, date(5));
        assert_eq!(points[0].open, None);
    }

    #[test]
    fn blank_optional_fields_are_absent() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "^TNX.csv", "Date,Open,High,Low,Close,Volume\n2024-01-02,,,,4.02,\n");

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let points = adapter.fetch_prices("^TNX", date(1), date(31)).unwrap();
        assert_eq!(points[0].close, dec!(4.02));
        assert_eq!(points[0].high, None);
        assert_eq!(points[0].volume, None);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_prices("CL=F", date(1), date(31)).unwrap_err();
        assert!(matches!(err, GekkoError::NotFound { .. }));
    }

    #[test]
    fn non_numeric_close_is_validation_error() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "CL=F.csv", "date,close\n2024-01-02,n/a\n");

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_prices("CL=F", date(1), date(31)).unwrap_err();
        assert!(matches!(err, GekkoError::Validation { .. }));
    }

    #[test]
    fn missing_close_column_is_validation_error() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "CL=F.csv", "date,open\n2024-01-02,70\n");

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_prices("CL=F", date(1), date(31)).unwrap_err();
        assert!(matches!(err, GekkoError::Validation { reason, .. } if reason.contains("close")));
    }

    #[test]
    fn available_symbols_lists_csv_stems() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "SI=F.csv", "date,close\n");
        write_csv(&dir, "GC=F.csv", "date,close\n");
        write_csv(&dir, "notes.txt", "ignore me");

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert_eq!(adapter.available_symbols().unwrap(), vec!["GC=F", "SI=F"]);
    }
}

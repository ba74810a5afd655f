use std::time::Duration;

use duckdb::{params, params_from_iter, AccessMode, Connection};
use log::{info, warn};

use crate::{
    etl::load::{Destination, LoadError},
    model::FinalRow,
    utils::lib_duckdb::open_with_retry,
};

#[derive(Clone)]
pub struct DatabankArchive {
    pub duckdb_path: String,
}

impl DatabankArchive {
    /// Open the DuckDB file for loading.  The file lock is held until the
    /// returned destination is dropped.
    pub fn open(&self) -> Result<DuckDbDestination, duckdb::Error> {
        let conn = open_with_retry(
            &self.duckdb_path,
            8,
            Duration::from_millis(25),
            AccessMode::ReadWrite,
        )?;
        Ok(DuckDbDestination::new(conn, &self.duckdb_path))
    }

    /// Get the records, optionally restricted to one country and/or one
    /// indicator, in insertion order.
    pub fn get_records(
        &self,
        conn: &Connection,
        country_code: Option<&str>,
        indicator_code: Option<&str>,
    ) -> Result<Vec<FinalRow>, duckdb::Error> {
        let mut filters: Vec<&str> = Vec::new();
        let mut values: Vec<&str> = Vec::new();
        if let Some(code) = country_code {
            filters.push("country_code = ?");
            values.push(code);
        }
        if let Some(code) = indicator_code {
            filters.push("indicator_code = ?");
            values.push(code);
        }
        let mut query = String::from(
            r#"
SELECT
    country_code,
    country_name,
    capital_city,
    indicator_code,
    indicator_name,
    year,
    value
FROM databank"#,
        );
        if !filters.is_empty() {
            query.push_str("\nWHERE ");
            query.push_str(&filters.join(" AND "));
        }
        query.push_str("\nORDER BY id;");

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(FinalRow {
                country_code: row.get(0)?,
                country_name: row.get(1)?,
                capital_city: row.get(2)?,
                indicator_code: row.get(3)?,
                indicator_name: row.get(4)?,
                year: row.get(5)?,
                value: row.get(6)?,
            })
        })?;
        let records = rows.collect::<Result<Vec<FinalRow>, _>>()?;
        Ok(records)
    }
}

/// The `databank` table in a DuckDB file.  DDL is transactional in DuckDB,
/// so a rollback also brings back the table dropped at the start of the
/// load.
pub struct DuckDbDestination {
    conn: Connection,
    name: String,
    in_transaction: bool,
}

impl DuckDbDestination {
    pub fn new(conn: Connection, name: &str) -> DuckDbDestination {
        DuckDbDestination {
            conn,
            name: name.to_string(),
            in_transaction: false,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Destination for DuckDbDestination {
    fn describe(&self) -> String {
        format!("duckdb {}", self.name)
    }

    fn begin(&mut self) -> Result<(), LoadError> {
        self.conn.execute_batch("BEGIN TRANSACTION;")?;
        self.in_transaction = true;
        Ok(())
    }

    fn drop_or_clear(&mut self) -> Result<(), LoadError> {
        self.conn.execute_batch(
            r"
DROP TABLE IF EXISTS databank;
DROP SEQUENCE IF EXISTS databank_id_seq;
",
        )?;
        Ok(())
    }

    fn create_schema(&mut self) -> Result<(), LoadError> {
        self.conn.execute_batch(
            r"
CREATE SEQUENCE databank_id_seq START 1;
CREATE TABLE databank (
    id INTEGER PRIMARY KEY DEFAULT nextval('databank_id_seq'),
    country_code VARCHAR NOT NULL,
    country_name VARCHAR,
    capital_city VARCHAR,
    indicator_code VARCHAR,
    indicator_name VARCHAR,
    year INTEGER,
    value DOUBLE
);
",
        )?;
        Ok(())
    }

    fn bulk_insert(&mut self, rows: &[FinalRow]) -> Result<usize, LoadError> {
        let mut stmt = self.conn.prepare(
            r"
INSERT INTO databank (
    country_code, country_name, capital_city,
    indicator_code, indicator_name, year, value
) VALUES (?, ?, ?, ?, ?, ?, ?);",
        )?;
        let mut n = 0;
        for row in rows {
            n += stmt.execute(params![
                row.country_code,
                row.country_name,
                row.capital_city,
                row.indicator_code,
                row.indicator_name,
                row.year,
                row.value,
            ])?;
        }
        Ok(n)
    }

    fn commit(&mut self) -> Result<(), LoadError> {
        self.conn.execute_batch("COMMIT;")?;
        self.in_transaction = false;
        info!("Committed {}", self.name);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), LoadError> {
        if self.in_transaction {
            self.in_transaction = false;
            self.conn.execute_batch("ROLLBACK;")?;
        }
        Ok(())
    }
}

impl Drop for DuckDbDestination {
    fn drop(&mut self) {
        if let Err(e) = self.rollback() {
            warn!("Failed to roll back {} on close: {}", self.name, e);
        }
    }
}

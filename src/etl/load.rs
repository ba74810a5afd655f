use log::{error, info, warn};
use thiserror::Error;

use crate::model::FinalRow;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("duckdb: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// A store the final rows can be loaded into.  The steps are called in the
/// order `begin`, `drop_or_clear`, `create_schema`, `bulk_insert`, `commit`;
/// `rollback` is called instead of the remaining steps as soon as one fails.
///
/// Only one loader may run against a given destination at a time, the last
/// one to commit wins.
pub trait Destination {
    /// Name of the destination, for the logs.
    fn describe(&self) -> String;

    fn begin(&mut self) -> Result<(), LoadError>;

    /// Remove the previous load, if any.
    fn drop_or_clear(&mut self) -> Result<(), LoadError>;

    fn create_schema(&mut self) -> Result<(), LoadError>;

    /// Write all the rows, return how many records were written.
    fn bulk_insert(&mut self, rows: &[FinalRow]) -> Result<usize, LoadError>;

    fn commit(&mut self) -> Result<(), LoadError>;

    fn rollback(&mut self) -> Result<(), LoadError>;
}

fn replace_all(dest: &mut dyn Destination, rows: &[FinalRow]) -> Result<usize, LoadError> {
    dest.drop_or_clear()?;
    dest.create_schema()?;
    let n = dest.bulk_insert(rows)?;
    dest.commit()?;
    Ok(n)
}

/// Replace the content of the destination with `rows`, all or nothing.
/// On failure the destination is rolled back and the original error is
/// returned.
pub fn load(dest: &mut dyn Destination, rows: &[FinalRow]) -> Result<usize, LoadError> {
    info!("Loading {} rows into {} ...", rows.len(), dest.describe());
    dest.begin()?;
    match replace_all(dest, rows) {
        Ok(n) => {
            info!("{} records were inserted into {}", n, dest.describe());
            Ok(n)
        }
        Err(e) => {
            error!("Load into {} failed: {}", dest.describe(), e);
            match dest.rollback() {
                Ok(()) => warn!("Rolled back {}", dest.describe()),
                Err(rb) => error!("Rollback of {} failed: {}", dest.describe(), rb),
            }
            Err(e)
        }
    }
}

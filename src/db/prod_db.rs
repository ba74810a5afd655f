use crate::{
    config::Backend,
    db::{databank::DatabankArchive, databank_mongo::MongoDestination},
    etl::load::{Destination, LoadError},
};

pub struct ProdDb {}

impl ProdDb {
    pub fn databank(duckdb_path: &str) -> DatabankArchive {
        DatabankArchive {
            duckdb_path: duckdb_path.to_string(),
        }
    }

    /// Connect to the configured destination.  The connection is released
    /// when the returned value is dropped.
    pub fn destination(backend: &Backend) -> Result<Box<dyn Destination>, LoadError> {
        match backend {
            Backend::DuckDb { path } => Ok(Box::new(ProdDb::databank(path).open()?)),
            Backend::MongoDb(config) => Ok(Box::new(MongoDestination::connect(config)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn duckdb_destination() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("databank.duckdb");
        let backend = Backend::DuckDb {
            path: path.to_str().unwrap().to_string(),
        };
        let dest = ProdDb::destination(&backend)?;
        assert!(dest.describe().starts_with("duckdb "));
        Ok(())
    }
}

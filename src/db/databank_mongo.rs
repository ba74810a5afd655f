// One document per country:
// { country: "USA", indicators: [ { "NY.GDP.MKTP.CD": 2.7e13 }, ... ] }

use itertools::Itertools;
use log::info;
use mongodb::{
    bson::{doc, Bson, Document},
    options::{ClientOptions, Credential, ServerAddress},
    sync::{Client, Collection},
};

use crate::{
    config::MongoConfig,
    etl::load::{Destination, LoadError},
    model::FinalRow,
};

/// Group the rows by country.  Countries without data get an empty list of
/// indicators.  Documents are sorted by country code.
pub fn to_documents(rows: &[FinalRow]) -> Vec<Document> {
    let mut sorted: Vec<&FinalRow> = rows.iter().collect();
    sorted.sort_by(|a, b| a.country_code.cmp(&b.country_code));
    sorted
        .into_iter()
        .chunk_by(|row| row.country_code.clone())
        .into_iter()
        .map(|(country, group)| {
            let indicators: Vec<Document> = group
                .filter_map(|row| {
                    row.indicator_code.as_ref().map(|code| {
                        let mut indicator = Document::new();
                        indicator.insert(code.clone(), row.value.map_or(Bson::Null, Bson::Double));
                        indicator
                    })
                })
                .collect();
            doc! { "country": country, "indicators": indicators }
        })
        .collect()
}

/// A MongoDB collection.  The documents are written to a staging collection
/// which replaces the target with a single `renameCollection` on commit, so
/// the previous load stays visible until then.  Sharded collections can't be
/// renamed, only unsharded deployments are supported.
pub struct MongoDestination {
    client: Client,
    database: String,
    collection: String,
    staging: String,
}

impl MongoDestination {
    pub fn connect(config: &MongoConfig) -> Result<MongoDestination, mongodb::error::Error> {
        let credential = match (&config.user, &config.password) {
            (Some(user), Some(password)) => Some(
                Credential::builder()
                    .username(user.clone())
                    .password(password.clone())
                    .build(),
            ),
            _ => None,
        };
        let options = ClientOptions::builder()
            .hosts(vec![ServerAddress::Tcp {
                host: config.host.clone(),
                port: Some(config.port),
            }])
            .app_name("databank".to_string())
            .credential(credential)
            .build();
        let client = Client::with_options(options)?;
        Ok(MongoDestination {
            client,
            database: config.database.clone(),
            collection: config.collection.clone(),
            staging: format!("{}_staging", config.collection),
        })
    }

    fn staging(&self) -> Collection<Document> {
        self.client
            .database(&self.database)
            .collection::<Document>(&self.staging)
    }
}

impl Destination for MongoDestination {
    fn describe(&self) -> String {
        format!("mongodb {}.{}", self.database, self.collection)
    }

    fn begin(&mut self) -> Result<(), LoadError> {
        info!("Writing to staging collection {}", self.staging);
        Ok(())
    }

    /// Remove what a failed run may have left in the staging collection.
    fn drop_or_clear(&mut self) -> Result<(), LoadError> {
        self.staging().drop().run()?;
        Ok(())
    }

    fn create_schema(&mut self) -> Result<(), LoadError> {
        self.client
            .database(&self.database)
            .create_collection(&self.staging)
            .run()?;
        Ok(())
    }

    fn bulk_insert(&mut self, rows: &[FinalRow]) -> Result<usize, LoadError> {
        let documents = to_documents(rows);
        if documents.is_empty() {
            return Ok(0);
        }
        let result = self.staging().insert_many(documents).run()?;
        Ok(result.inserted_ids.len())
    }

    fn commit(&mut self) -> Result<(), LoadError> {
        self.client
            .database("admin")
            .run_command(doc! {
                "renameCollection": format!("{}.{}", self.database, self.staging),
                "to": format!("{}.{}", self.database, self.collection),
                "dropTarget": true,
            })
            .run()?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), LoadError> {
        self.staging().drop().run()?;
        Ok(())
    }
}

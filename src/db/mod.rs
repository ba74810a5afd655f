pub mod databank;
pub mod databank_mongo;
pub mod prod_db;

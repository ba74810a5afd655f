pub mod lib_duckdb;
pub mod retry;

//! End-to-end tests over persistence and graph maintenance.

mod memory_backend_test;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend_test;

pub mod blob_store;
pub mod container_locator;
pub mod copy_scheduler;
pub mod fs_blob_store;
pub mod insert_batch;
pub mod migration_service;

//! Database entity models.
//!
//! The `session` entity describes the table that backs
//! [`SeaOrmRecordStore`](crate::SeaOrmRecordStore).

pub mod session;

//! Session entity model for Sea-ORM database interaction.
//!
//! Maps to the `user_sessions` table created by the bundled migration.

use sea_orm::entity::prelude::*;

/// Sea-ORM entity model representing one stored session.
///
/// # Database Schema
///
/// | Column      | Type                 | Description                              |
/// |-------------|----------------------|------------------------------------------|
/// | id          | TEXT (Primary Key)   | Internal record id                       |
/// | session_id  | TEXT (Unique)        | Public session id, the cookie value      |
/// | expires_at  | TIMESTAMPTZ          | Absolute expiry                          |
/// | data        | TEXT                 | Serialized session contents              |
/// | user_id     | TEXT NULL            | Owning user, set by the application      |
///
/// This entity is used internally by [`SeaOrmRecordStore`](crate::SeaOrmRecordStore);
/// you typically only touch it to join sessions against your own tables.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_sessions")]
pub struct Model {
    /// Internal primary key, never exposed to clients.
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    #[sea_orm(unique, column_type = "Text")]
    pub session_id: String,

    /// Rows at or past this instant are treated as missing and removed on
    /// the next lookup.
    pub expires_at: DateTimeWithTimeZone,

    #[sea_orm(column_type = "Text")]
    pub data: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub user_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use crate::sqlite_column;
use crate::sqlite_persistence::{SqlType, Table, VersionedSchema};

/// V 0
pub const USERS_TABLE_V_0: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("uid", &SqlType::Text, is_primary_key = true),
        sqlite_column!("username", &SqlType::Text),
        sqlite_column!("last_seen_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
};

pub const SYNC_DATA_TABLE_V_0: Table = Table {
    name: "sync_data",
    columns: &[
        sqlite_column!("uid", &SqlType::Text, is_primary_key = true),
        sqlite_column!("favorites_json", &SqlType::Blob),
        sqlite_column!("fm_favorites_json", &SqlType::Blob),
        sqlite_column!("playlists_json", &SqlType::Blob),
        sqlite_column!(
            "favorites_updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "fm_favorites_updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "playlists_updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[],
};

pub const SYNC_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[USERS_TABLE_V_0, SYNC_DATA_TABLE_V_0],
    migration: None,
}];

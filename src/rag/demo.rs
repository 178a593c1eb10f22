//! Demo music database. This is the only code in the crate that writes to a
//! store, and nothing on the question-answering path calls it.

use crate::core::db;
use crate::core::error::HybridRagError;
use crate::core::store::Store;
use rusqlite::params;
use tracing::info;

pub const MUSIC_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS Artist (
    ArtistId INTEGER PRIMARY KEY,
    Name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS Album (
    AlbumId INTEGER PRIMARY KEY,
    Title TEXT NOT NULL,
    ArtistId INTEGER,
    FOREIGN KEY (ArtistId) REFERENCES Artist(ArtistId)
);
";

pub const ARTISTS: &[(i64, &str)] = &[(1, "Iron Maiden"), (2, "Metallica"), (3, "AC/DC")];

pub const ALBUMS: &[(i64, &str, i64)] = &[
    (1, "The Number of the Beast", 1),
    (2, "Piece of Mind", 1),
    (3, "Master of Puppets", 2),
    (4, "Ride the Lightning", 2),
    (5, "Back in Black", 3),
];

/// Create (or top up) the demo database. Safe to run repeatedly.
pub fn seed_music_db(store: &Store) -> Result<(), HybridRagError> {
    let mut conn = db::open_read_write(store)?;
    let tx = conn.transaction()?;
    tx.execute_batch(MUSIC_SCHEMA)?;
    for (id, name) in ARTISTS {
        tx.execute("INSERT OR IGNORE INTO Artist VALUES (?1, ?2)", params![id, name])?;
    }
    for (id, title, artist_id) in ALBUMS {
        tx.execute(
            "INSERT OR IGNORE INTO Album VALUES (?1, ?2, ?3)",
            params![id, title, artist_id],
        )?;
    }
    tx.commit()?;
    info!(path = %store.path().display(), "demo music database ready");
    Ok(())
}

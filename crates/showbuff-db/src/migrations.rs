use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                email           TEXT NOT NULL UNIQUE,
                display_name    TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE shows (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                tmdb_id         INTEGER NOT NULL,
                media_kind      TEXT NOT NULL CHECK (media_kind IN ('movie', 'series')),
                title           TEXT NOT NULL DEFAULT '',
                poster_path     TEXT,
                release_date    TEXT,
                first_air_date  TEXT,
                UNIQUE(tmdb_id, media_kind)
            );

            CREATE TABLE lists (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                kind        TEXT NOT NULL CHECK (kind IN ('watchlist', 'currently_watching', 'watched')),
                UNIQUE(user_id, kind)
            );

            -- user_id is denormalized from lists so the store itself enforces
            -- one membership per (user, show) across all list kinds.
            CREATE TABLE list_items (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                list_id     INTEGER NOT NULL REFERENCES lists(id),
                user_id     INTEGER NOT NULL REFERENCES users(id),
                show_id     INTEGER NOT NULL REFERENCES shows(id),
                added_at    TEXT NOT NULL,
                UNIQUE(user_id, show_id)
            );

            CREATE INDEX idx_list_items_list
                ON list_items(list_id, added_at);

            CREATE TABLE reviews (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                show_id     INTEGER NOT NULL REFERENCES shows(id),
                media_kind  TEXT NOT NULL,
                rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 10),
                comment     TEXT,
                tags        TEXT NOT NULL DEFAULT '[]',
                rewatch     INTEGER NOT NULL DEFAULT 0,
                spoiler     INTEGER NOT NULL DEFAULT 0,
                visibility  TEXT NOT NULL DEFAULT 'public',
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                UNIQUE(user_id, show_id, media_kind)
            );

            CREATE TABLE friend_requests (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                from_user_id    INTEGER NOT NULL REFERENCES users(id),
                to_user_id      INTEGER NOT NULL REFERENCES users(id),
                status          TEXT NOT NULL CHECK (status IN ('pending', 'accepted', 'rejected')),
                created_at      TEXT NOT NULL,
                responded_at    TEXT,
                UNIQUE(from_user_id, to_user_id)
            );

            CREATE INDEX idx_friend_requests_to
                ON friend_requests(to_user_id, status);

            -- Both directions are stored so lookups are single-sided.
            CREATE TABLE friendships (
                user_id     INTEGER NOT NULL REFERENCES users(id),
                friend_id   INTEGER NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL,
                PRIMARY KEY (user_id, friend_id)
            );

            CREATE TABLE messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_low    INTEGER NOT NULL,
                user_high   INTEGER NOT NULL,
                sender_id   INTEGER NOT NULL REFERENCES users(id),
                receiver_id INTEGER NOT NULL REFERENCES users(id),
                kind        TEXT NOT NULL,
                body        TEXT NOT NULL,
                show_id     INTEGER REFERENCES shows(id),
                created_at  TEXT NOT NULL,
                read_at     TEXT,
                CHECK (user_low <= user_high)
            );

            CREATE INDEX idx_messages_conversation
                ON messages(user_low, user_high, created_at);

            CREATE INDEX idx_messages_unread
                ON messages(receiver_id, read_at);

            CREATE TABLE activities (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                actor_id    INTEGER NOT NULL REFERENCES users(id),
                kind        TEXT NOT NULL CHECK (kind IN ('list_change', 'review', 'post')),
                action      TEXT NOT NULL,
                show_id     INTEGER REFERENCES shows(id),
                rating      INTEGER,
                comment     TEXT,
                visibility  TEXT NOT NULL DEFAULT 'public',
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_activities_actor
                ON activities(actor_id, created_at);

            CREATE INDEX idx_activities_kind
                ON activities(kind, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (list imports)");
        conn.execute_batch(
            "
            CREATE TABLE import_sessions (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id             INTEGER NOT NULL REFERENCES users(id),
                source              TEXT NOT NULL,
                status              TEXT NOT NULL CHECK (status IN ('pending', 'completed')),
                original_filename   TEXT,
                default_list        TEXT CHECK (default_list IN ('watchlist', 'currently_watching', 'watched')),
                total_titles        INTEGER NOT NULL DEFAULT 0,
                matched_count       INTEGER NOT NULL DEFAULT 0,
                unmatched_count     INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE INDEX idx_import_sessions_user
                ON import_sessions(user_id, status, created_at);

            CREATE TABLE extracted_titles (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                import_id           INTEGER NOT NULL REFERENCES import_sessions(id) ON DELETE CASCADE,
                raw_text            TEXT NOT NULL,
                normalized_title    TEXT NOT NULL,
                year                INTEGER
            );

            CREATE INDEX idx_extracted_titles_import
                ON extracted_titles(import_id);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

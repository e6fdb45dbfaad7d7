use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS friend_requests (
            id          TEXT PRIMARY KEY,
            sender_id   TEXT NOT NULL REFERENCES users(id),
            receiver_id TEXT NOT NULL REFERENCES users(id),
            status      TEXT NOT NULL DEFAULT 'sent',
            created_at  TEXT NOT NULL
        );

        -- At most one outstanding request per ordered (sender, receiver)
        -- pair. The partial index makes the duplicate check and the insert
        -- a single constrained write.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_requests_outstanding
            ON friend_requests(sender_id, receiver_id) WHERE status = 'sent';

        CREATE INDEX IF NOT EXISTS idx_requests_receiver
            ON friend_requests(receiver_id, status);

        CREATE INDEX IF NOT EXISTS idx_requests_sender
            ON friend_requests(sender_id, status);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

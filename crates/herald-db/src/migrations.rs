use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        // recipients keeps the implicit rowid so that listing by rowid
        // follows insertion order rather than user id order.
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS recipients (
                user_id     INTEGER NOT NULL UNIQUE,
                name        TEXT NOT NULL,
                joined_at   TEXT NOT NULL,
                blocked     INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_recipients_eligible
                ON recipients(blocked);

            CREATE TABLE IF NOT EXISTS broadcasts (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                message     TEXT NOT NULL,
                sent_at     TEXT NOT NULL,
                success     INTEGER NOT NULL,
                failed      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS action_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                action      TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;

        import_legacy(conn)?;
    }

    info!("Database migrations complete");
    Ok(())
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}

/// Carries rows over from a database written by the earlier bot, which kept
/// recipients in `users`, operator actions in `logs`, and allowed NULLs in
/// `broadcasts`. The legacy tables are left in place.
fn import_legacy(conn: &Connection) -> Result<()> {
    if table_exists(conn, "users")? {
        let copied = conn.execute(
            "INSERT OR IGNORE INTO recipients (user_id, name, joined_at, blocked)
             SELECT user_id,
                    COALESCE(name, ''),
                    COALESCE(joined_at, strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
                    COALESCE(blocked, 0)
             FROM users
             WHERE user_id IS NOT NULL
             ORDER BY rowid",
            [],
        )?;
        info!(copied, "Imported legacy users");
    }

    if table_exists(conn, "logs")? {
        let copied = conn.execute(
            "INSERT INTO action_log (action, created_at)
             SELECT COALESCE(action, ''),
                    COALESCE(created_at, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
             FROM logs
             ORDER BY id",
            [],
        )?;
        info!(copied, "Imported legacy logs");
    }

    // A pre-existing broadcasts table survives CREATE IF NOT EXISTS with its
    // nullable columns.
    conn.execute(
        "UPDATE broadcasts
         SET message = COALESCE(message, ''),
             sent_at = COALESCE(sent_at, strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
             success = COALESCE(success, 0),
             failed  = COALESCE(failed, 0)
         WHERE message IS NULL OR sent_at IS NULL OR success IS NULL OR failed IS NULL",
        [],
    )?;

    Ok(())
}

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password        TEXT NOT NULL,
            role            TEXT NOT NULL,
            company         TEXT,
            phone           TEXT,
            location        TEXT,
            bio             TEXT,
            skills          TEXT NOT NULL DEFAULT '[]',
            reset_token     TEXT,
            reset_expires   TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS jobs (
            id                      TEXT PRIMARY KEY,
            title                   TEXT NOT NULL,
            description             TEXT NOT NULL,
            requirements            TEXT NOT NULL,
            company                 TEXT NOT NULL,
            location                TEXT NOT NULL,
            job_type                TEXT NOT NULL,
            category                TEXT NOT NULL,
            experience              TEXT NOT NULL,
            salary                  TEXT,
            skills                  TEXT NOT NULL DEFAULT '[]',
            application_deadline    TEXT,
            employer_id             TEXT NOT NULL REFERENCES users(id),
            active                  INTEGER NOT NULL DEFAULT 1,
            featured                INTEGER NOT NULL DEFAULT 0,
            created_at              TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_jobs_employer
            ON jobs(employer_id);

        CREATE INDEX IF NOT EXISTS idx_jobs_active_created
            ON jobs(active, created_at);

        CREATE TABLE IF NOT EXISTS applications (
            id              TEXT PRIMARY KEY,
            job_id          TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
            candidate_id    TEXT NOT NULL REFERENCES users(id),
            resume_url      TEXT NOT NULL,
            cover_letter    TEXT,
            status          TEXT NOT NULL DEFAULT 'pending',
            notes           TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(job_id, candidate_id)
        );

        CREATE INDEX IF NOT EXISTS idx_applications_candidate
            ON applications(candidate_id);

        CREATE TABLE IF NOT EXISTS saved_jobs (
            user_id     TEXT NOT NULL REFERENCES users(id),
            job_id      TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, job_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

use crate::Database;
use crate::models::{ApplicationJoinRow, ApplicationRow, JobRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

/// Filters for the public job listing. All string matches are substring
/// LIKEs except category/type/experience, which are exact.
#[derive(Debug, Default)]
pub struct JobFilter {
    pub search: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub job_type: Option<String>,
    pub experience: Option<String>,
    pub limit: u32,
    pub offset: u64,
}

impl Database {
    // -- Users --

    /// Returns false when the email is already registered; the NOCASE unique
    /// column is the guard, so a concurrent registration of the same address
    /// reports a conflict instead of surfacing as a store failure.
    pub fn create_user(
        &self,
        id: &str,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
        company: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let result = conn.execute(
                "INSERT INTO users (id, name, email, password, role, company)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, name, email, password_hash, role, company],
            );
            match result {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _)) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    /// Email lookups are case-insensitive (NOCASE collation on the column).
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", email))
    }

    pub fn update_user_profile(
        &self,
        id: &str,
        name: &str,
        company: Option<&str>,
        phone: Option<&str>,
        location: Option<&str>,
        bio: Option<&str>,
        skills_json: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users
                 SET name = ?2, company = ?3, phone = ?4, location = ?5, bio = ?6, skills = ?7
                 WHERE id = ?1",
                rusqlite::params![id, name, company, phone, location, bio, skills_json],
            )?;
            Ok(())
        })
    }

    pub fn update_user_password(&self, id: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users
                 SET password = ?2, reset_token = NULL, reset_expires = NULL
                 WHERE id = ?1",
                rusqlite::params![id, password_hash],
            )?;
            Ok(())
        })
    }

    pub fn set_reset_token(&self, id: &str, token_digest: &str, expires: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET reset_token = ?2, reset_expires = ?3 WHERE id = ?1",
                rusqlite::params![id, token_digest, expires],
            )?;
            Ok(())
        })
    }

    /// Resolve a user by unexpired reset-token digest.
    pub fn get_user_by_reset_token(&self, token_digest: &str, now: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLS} FROM users WHERE reset_token = ?1 AND reset_expires > ?2"
            ))?;
            stmt.query_row(rusqlite::params![token_digest, now], user_from_row)
                .optional()
        })
    }

    pub fn list_employers(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLS} FROM users WHERE role = 'employer' ORDER BY created_at DESC"
            ))?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Jobs --

    pub fn insert_job(&self, job: &JobRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO jobs (id, title, description, requirements, company, location,
                                   job_type, category, experience, salary, skills,
                                   application_deadline, employer_id, active, featured)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                rusqlite::params![
                    job.id,
                    job.title,
                    job.description,
                    job.requirements,
                    job.company,
                    job.location,
                    job.job_type,
                    job.category,
                    job.experience,
                    job.salary,
                    job.skills,
                    job.application_deadline,
                    job.employer_id,
                    job.active,
                    job.featured,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_job(&self, id: &str) -> Result<Option<JobRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {JOB_COLS} FROM jobs WHERE id = ?1"))?;
            stmt.query_row([id], job_from_row).optional()
        })
    }

    /// Full-row rewrite; the employer column is deliberately absent so
    /// ownership can never change after creation.
    pub fn update_job(&self, job: &JobRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE jobs
                 SET title = ?2, description = ?3, requirements = ?4, company = ?5,
                     location = ?6, job_type = ?7, category = ?8, experience = ?9,
                     salary = ?10, skills = ?11, application_deadline = ?12,
                     active = ?13, featured = ?14
                 WHERE id = ?1",
                rusqlite::params![
                    job.id,
                    job.title,
                    job.description,
                    job.requirements,
                    job.company,
                    job.location,
                    job.job_type,
                    job.category,
                    job.experience,
                    job.salary,
                    job.skills,
                    job.application_deadline,
                    job.active,
                    job.featured,
                ],
            )?;
            Ok(())
        })
    }

    /// Dependent applications and saved-job rows go with it (FK cascade).
    pub fn delete_job(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM jobs WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// Active jobs matching the filter, newest first, plus the total count
    /// for pagination.
    pub fn list_jobs(&self, filter: &JobFilter) -> Result<(Vec<JobRow>, u64)> {
        self.with_conn(|conn| {
            let mut where_clauses = vec!["active = 1".to_string()];
            let mut params: Vec<String> = Vec::new();

            if let Some(search) = &filter.search {
                let n = params.len() + 1;
                where_clauses.push(format!(
                    "(title LIKE ?{n} OR description LIKE ?{n} OR company LIKE ?{n}
                      OR location LIKE ?{n} OR skills LIKE ?{n})"
                ));
                params.push(format!("%{}%", search));
            }
            if let Some(location) = &filter.location {
                where_clauses.push(format!("location LIKE ?{}", params.len() + 1));
                params.push(format!("%{}%", location));
            }
            if let Some(category) = &filter.category {
                where_clauses.push(format!("category = ?{}", params.len() + 1));
                params.push(category.clone());
            }
            if let Some(job_type) = &filter.job_type {
                where_clauses.push(format!("job_type = ?{}", params.len() + 1));
                params.push(job_type.clone());
            }
            if let Some(experience) = &filter.experience {
                where_clauses.push(format!("experience = ?{}", params.len() + 1));
                params.push(experience.clone());
            }

            let where_sql = where_clauses.join(" AND ");

            let total: u64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM jobs WHERE {where_sql}"),
                rusqlite::params_from_iter(params.iter()),
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLS} FROM jobs WHERE {where_sql}
                 ORDER BY created_at DESC
                 LIMIT {} OFFSET {}",
                filter.limit, filter.offset
            ))?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), job_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total))
        })
    }

    // -- Applications --

    /// Insert a new application. Returns false when the UNIQUE(job_id,
    /// candidate_id) index rejects the pair — the authoritative duplicate
    /// guard, which also catches concurrent submissions the read-check in
    /// the lifecycle manager raced past.
    pub fn insert_application(
        &self,
        id: &str,
        job_id: &str,
        candidate_id: &str,
        resume_url: &str,
        cover_letter: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let result = conn.execute(
                "INSERT INTO applications (id, job_id, candidate_id, resume_url, cover_letter)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, job_id, candidate_id, resume_url, cover_letter],
            );
            match result {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _)) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_application(&self, id: &str) -> Result<Option<ApplicationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!("SELECT {APP_COLS} FROM applications WHERE id = ?1"))?;
            stmt.query_row([id], application_from_row).optional()
        })
    }

    pub fn find_application_by_pair(
        &self,
        job_id: &str,
        candidate_id: &str,
    ) -> Result<Option<ApplicationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {APP_COLS} FROM applications WHERE job_id = ?1 AND candidate_id = ?2"
            ))?;
            stmt.query_row([job_id, candidate_id], application_from_row)
                .optional()
        })
    }

    pub fn update_application_status(
        &self,
        id: &str,
        status: &str,
        notes: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE applications SET status = ?2, notes = ?3 WHERE id = ?1",
                rusqlite::params![id, status, notes],
            )?;
            Ok(())
        })
    }

    pub fn delete_application(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM applications WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// A candidate's own submissions, joined with the job summary.
    pub fn list_applications_by_candidate(
        &self,
        candidate_id: &str,
    ) -> Result<Vec<ApplicationJoinRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {APP_JOIN_COLS}, NULL, NULL
                 FROM applications a
                 JOIN jobs j ON a.job_id = j.id
                 WHERE a.candidate_id = ?1
                 ORDER BY a.created_at DESC"
            ))?;
            let rows = stmt
                .query_map([candidate_id], application_join_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Every application across the employer's jobs, with candidate contact
    /// details joined in.
    pub fn list_applications_for_employer(
        &self,
        employer_id: &str,
    ) -> Result<Vec<ApplicationJoinRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {APP_JOIN_COLS}, u.name, u.email
                 FROM applications a
                 JOIN jobs j ON a.job_id = j.id
                 JOIN users u ON a.candidate_id = u.id
                 WHERE j.employer_id = ?1
                 ORDER BY a.created_at DESC"
            ))?;
            let rows = stmt
                .query_map([employer_id], application_join_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Saved jobs --

    /// Returns false when the (user, job) pair is already saved; the table's
    /// primary key is the guard, not a read-then-write check.
    pub fn save_job(&self, user_id: &str, job_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let result = conn.execute(
                "INSERT INTO saved_jobs (user_id, job_id) VALUES (?1, ?2)",
                [user_id, job_id],
            );
            match result {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _)) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Returns false when the pair was not saved in the first place.
    pub fn unsave_job(&self, user_id: &str, job_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM saved_jobs WHERE user_id = ?1 AND job_id = ?2",
                [user_id, job_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Saved jobs for a user. The join drops references whose job has since
    /// been deleted, so stale ids never surface.
    pub fn list_saved_jobs(&self, user_id: &str) -> Result<Vec<JobRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLS_PREFIXED}
                 FROM saved_jobs s
                 JOIN jobs j ON s.job_id = j.id
                 WHERE s.user_id = ?1
                 ORDER BY s.created_at DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], job_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

const USER_COLS: &str = "id, name, email, password, role, company, phone, location, bio, skills, \
                         reset_token, reset_expires, created_at";

const JOB_COLS: &str = "id, title, description, requirements, company, location, job_type, \
                        category, experience, salary, skills, application_deadline, employer_id, \
                        active, featured, created_at";

const JOB_COLS_PREFIXED: &str =
    "j.id, j.title, j.description, j.requirements, j.company, j.location, j.job_type, \
     j.category, j.experience, j.salary, j.skills, j.application_deadline, j.employer_id, \
     j.active, j.featured, j.created_at";

const APP_COLS: &str =
    "id, job_id, candidate_id, resume_url, cover_letter, status, notes, created_at";

const APP_JOIN_COLS: &str =
    "a.id, a.job_id, a.candidate_id, a.resume_url, a.cover_letter, a.status, a.notes, \
     a.created_at, j.title, j.company, j.location, j.job_type";

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        company: row.get(5)?,
        phone: row.get(6)?,
        location: row.get(7)?,
        bio: row.get(8)?,
        skills: row.get(9)?,
        reset_token: row.get(10)?,
        reset_expires: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn job_from_row(row: &rusqlite::Row) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        requirements: row.get(3)?,
        company: row.get(4)?,
        location: row.get(5)?,
        job_type: row.get(6)?,
        category: row.get(7)?,
        experience: row.get(8)?,
        salary: row.get(9)?,
        skills: row.get(10)?,
        application_deadline: row.get(11)?,
        employer_id: row.get(12)?,
        active: row.get(13)?,
        featured: row.get(14)?,
        created_at: row.get(15)?,
    })
}

fn application_from_row(row: &rusqlite::Row) -> rusqlite::Result<ApplicationRow> {
    Ok(ApplicationRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        candidate_id: row.get(2)?,
        resume_url: row.get(3)?,
        cover_letter: row.get(4)?,
        status: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn application_join_from_row(row: &rusqlite::Row) -> rusqlite::Result<ApplicationJoinRow> {
    Ok(ApplicationJoinRow {
        application: application_from_row(row)?,
        job_title: row.get(8)?,
        job_company: row.get(9)?,
        job_location: row.get(10)?,
        job_type: row.get(11)?,
        candidate_name: row.get(12)?,
        candidate_email: row.get(13)?,
    })
}

/// Duplicate-key failures surface as SQLITE_CONSTRAINT_UNIQUE for plain
/// unique indexes and SQLITE_CONSTRAINT_PRIMARYKEY for declared primary
/// keys; both mean "this pair already exists". Foreign-key violations keep
/// their own code and still propagate as errors.
fn is_unique_violation(e: &rusqlite::ffi::Error) -> bool {
    e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
}

fn query_user(conn: &Connection, where_clause: &str, param: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLS} FROM users WHERE {where_clause}"))?;
    stmt.query_row([param], user_from_row).optional()
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    fn seed_pair(db: &Database) -> (String, String) {
        db.create_user("emp-1", "Acme HR", "hr@acme.test", "hash", "employer", Some("Acme"))
            .unwrap();
        db.create_user("cand-1", "Ada", "ada@test.test", "hash", "candidate", None)
            .unwrap();
        let job = crate::models::JobRow {
            id: "job-1".into(),
            title: "Backend Engineer".into(),
            description: "Build services".into(),
            requirements: "Rust".into(),
            company: "Acme".into(),
            location: "Remote".into(),
            job_type: "Remote".into(),
            category: "Engineering".into(),
            experience: "Mid-level".into(),
            salary: None,
            skills: "[\"rust\"]".into(),
            application_deadline: None,
            employer_id: "emp-1".into(),
            active: true,
            featured: false,
            created_at: String::new(),
        };
        db.insert_job(&job).unwrap();
        ("job-1".into(), "cand-1".into())
    }

    #[test]
    fn unique_index_rejects_duplicate_pair() {
        let db = Database::open_in_memory().unwrap();
        let (job, cand) = seed_pair(&db);

        let first = db
            .insert_application("app-1", &job, &cand, "/uploads/r1.pdf", None)
            .unwrap();
        assert!(first);

        // Same pair again, different application id: the index must refuse it.
        let second = db
            .insert_application("app-2", &job, &cand, "/uploads/r2.pdf", None)
            .unwrap();
        assert!(!second);
    }

    #[test]
    fn save_job_pair_is_guarded_by_primary_key() {
        let db = Database::open_in_memory().unwrap();
        let (job, cand) = seed_pair(&db);

        assert!(db.save_job(&cand, &job).unwrap());
        assert!(!db.save_job(&cand, &job).unwrap());
        assert!(db.unsave_job(&cand, &job).unwrap());
        assert!(!db.unsave_job(&cand, &job).unwrap());
    }

    #[test]
    fn duplicate_email_is_a_conflict_not_a_failure() {
        let db = Database::open_in_memory().unwrap();

        assert!(db
            .create_user("u1", "Ada", "ada@test.test", "hash", "candidate", None)
            .unwrap());
        // Same address, different case and id: the NOCASE column refuses it.
        assert!(!db
            .create_user("u2", "Ada B", "ADA@test.test", "hash", "candidate", None)
            .unwrap());
    }

    #[test]
    fn reset_token_lookup_honors_expiry() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "Ada", "ada@test.test", "hash", "candidate", None)
            .unwrap();

        let now = "2026-08-29 12:00:00";

        db.set_reset_token("u1", "digest-1", "2026-08-29 12:10:00").unwrap();
        assert!(db.get_user_by_reset_token("digest-1", now).unwrap().is_some());

        // An expiry at or before `now` no longer matches.
        db.set_reset_token("u1", "digest-1", "2026-08-29 12:00:00").unwrap();
        assert!(db.get_user_by_reset_token("digest-1", now).unwrap().is_none());
        db.set_reset_token("u1", "digest-1", "2026-08-29 11:59:59").unwrap();
        assert!(db.get_user_by_reset_token("digest-1", now).unwrap().is_none());

        // A successful password update clears the pair.
        db.set_reset_token("u1", "digest-1", "2026-08-29 12:10:00").unwrap();
        db.update_user_password("u1", "new-hash").unwrap();
        assert!(db.get_user_by_reset_token("digest-1", now).unwrap().is_none());
    }

    #[test]
    fn deleting_a_job_cascades_to_applications_and_saves() {
        let db = Database::open_in_memory().unwrap();
        let (job, cand) = seed_pair(&db);

        db.insert_application("app-1", &job, &cand, "/uploads/r1.pdf", None)
            .unwrap();
        db.save_job(&cand, &job).unwrap();

        db.delete_job(&job).unwrap();

        assert!(db.get_application("app-1").unwrap().is_none());
        assert!(db.list_saved_jobs(&cand).unwrap().is_empty());
    }
}

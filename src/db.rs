use rusqlite::{Connection, params};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::models::{
    Application, ApplicationStatus, Company, DiscoveredJob, DiscoveredStatus, Importance,
    Interview, Job, JobStatus, NewCompany, NewDiscoveredJob, NewJob, RemoteStatus, Sector, Skill,
};

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

/// Caller-supplied attributes applied when a discovered job is promoted.
#[derive(Debug, Clone, Default)]
pub struct PromotionDetails {
    pub sector: Option<Sector>,
    pub chain_focus: Option<String>,
    pub remote_status: Option<RemoteStatus>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PromotionOutcome {
    pub company_id: i64,
    pub company_created: bool,
    pub job_id: i64,
}

#[derive(Debug, Clone)]
pub struct SkillDemand {
    pub name: String,
    pub category: Option<String>,
    pub total: i64,
    pub required: i64,
    pub nice_to_have: i64,
}

#[derive(Debug, Clone)]
pub struct SqlMatch {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub url: Option<String>,
    pub remote_status: Option<RemoteStatus>,
    pub skills: String,
}

/// Headline totals across the whole search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchSummary {
    pub companies: i64,
    pub jobs: i64,
    pub open_jobs: i64,
    pub applications: i64,
    pub active_applications: i64,
    pub offers: i64,
    pub rejected: i64,
    pub interviews: i64,
    pub pending_interviews: i64,
}

#[derive(Debug, Clone)]
pub struct UnappliedJob {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub date_found: Option<String>,
    pub remote_status: Option<RemoteStatus>,
}

impl Database {
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self { conn, path })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_path() -> Result<PathBuf> {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "chainhunt") {
            Ok(proj_dirs.data_dir().join("chainhunt.db"))
        } else {
            Ok(PathBuf::from("chainhunt.db"))
        }
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                website TEXT,
                sector TEXT CHECK (sector IN ('DeFi', 'NFT', 'Infrastructure', 'Exchange', 'Analytics', 'Other')),
                chain_focus TEXT,
                size TEXT CHECK (size IN ('startup', 'small', 'medium', 'large')),
                notes TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id INTEGER NOT NULL REFERENCES companies(id),
                title TEXT NOT NULL,
                url TEXT UNIQUE,
                salary_min INTEGER,
                salary_max INTEGER,
                remote_status TEXT CHECK (remote_status IN ('remote', 'hybrid', 'onsite')),
                date_posted TEXT,
                date_found TEXT NOT NULL DEFAULT (date('now')),
                closing_date TEXT,
                status TEXT NOT NULL DEFAULT 'open' CHECK (status IN ('open', 'closed', 'expired')),
                source TEXT,
                notes TEXT
            );

            CREATE TABLE IF NOT EXISTS skills (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                category TEXT
            );

            CREATE TABLE IF NOT EXISTS job_skills (
                job_id INTEGER NOT NULL REFERENCES jobs(id),
                skill_id INTEGER NOT NULL REFERENCES skills(id),
                importance TEXT NOT NULL DEFAULT 'required' CHECK (importance IN ('required', 'nice-to-have')),
                PRIMARY KEY (job_id, skill_id)
            );

            CREATE TABLE IF NOT EXISTS applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id INTEGER NOT NULL REFERENCES jobs(id),
                date_applied TEXT,
                resume_version TEXT,
                cover_letter_sent INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'applied' CHECK (status IN ('applied', 'screening', 'interview', 'rejected', 'offer', 'ghosted', 'withdrawn')),
                notes TEXT
            );

            CREATE TABLE IF NOT EXISTS interviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                application_id INTEGER NOT NULL REFERENCES applications(id),
                scheduled_at TEXT,
                type TEXT CHECK (type IN ('recruiter', 'technical', 'sql-challenge', 'culture', 'final')),
                notes TEXT,
                outcome TEXT CHECK (outcome IN ('pending', 'passed', 'failed', 'cancelled'))
            );

            CREATE TABLE IF NOT EXISTS discovered_jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT,
                company_name TEXT,
                url TEXT UNIQUE,
                requirements_raw TEXT,
                source TEXT,
                raw_response TEXT,
                discovered_at TEXT NOT NULL DEFAULT (datetime('now')),
                status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'saved', 'dismissed', 'promoted')),
                promoted_to_job_id INTEGER REFERENCES jobs(id)
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_company ON jobs(company_id);
            CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
            CREATE INDEX IF NOT EXISTS idx_applications_job ON applications(job_id);
            CREATE INDEX IF NOT EXISTS idx_interviews_application ON interviews(application_id);
            CREATE INDEX IF NOT EXISTS idx_discovered_status ON discovered_jobs(status);

            INSERT OR IGNORE INTO skills (name, category) VALUES
                ('SQL', 'SQL'),
                ('PostgreSQL', 'SQL'),
                ('Python', 'Programming'),
                ('dbt', 'Programming'),
                ('ETL', 'Programming'),
                ('Excel', 'BI'),
                ('Tableau', 'BI'),
                ('Looker', 'BI'),
                ('AWS', 'Cloud'),
                ('Dune Analytics', 'Blockchain'),
                ('On-chain Analysis', 'Blockchain'),
                ('Solidity', 'Blockchain');
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='jobs'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(Error::Config(
                "Database not initialized. Run 'chainhunt init' first.".to_string(),
            ));
        }
        Ok(())
    }

    // --- Company operations ---

    pub fn create_company(&self, company: &NewCompany) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO companies (name, website, sector, chain_focus, size, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                company.name,
                company.website,
                company.sector,
                company.chain_focus,
                company.size,
                company.notes
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_company(&self, id: i64) -> Result<Option<Company>> {
        let result = self.conn.query_row(
            "SELECT id, name, website, sector, chain_focus, size, notes, created_at
             FROM companies WHERE id = ?1",
            [id],
            Self::row_to_company,
        );
        match result {
            Ok(company) => Ok(Some(company)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        let result = self.conn.query_row(
            "SELECT id, name, website, sector, chain_focus, size, notes, created_at
             FROM companies WHERE LOWER(name) = LOWER(?1)",
            [name],
            Self::row_to_company,
        );
        match result {
            Ok(company) => Ok(Some(company)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_companies(&self) -> Result<Vec<Company>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, website, sector, chain_focus, size, notes, created_at
             FROM companies ORDER BY name",
        )?;
        let rows = stmt.query_map([], Self::row_to_company)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    pub fn update_company(&self, company: &Company) -> Result<()> {
        self.conn.execute(
            "UPDATE companies
             SET name = ?1, website = ?2, sector = ?3, chain_focus = ?4, size = ?5, notes = ?6
             WHERE id = ?7",
            params![
                company.name,
                company.website,
                company.sector,
                company.chain_focus,
                company.size,
                company.notes,
                company.id
            ],
        )?;
        Ok(())
    }

    fn row_to_company(row: &rusqlite::Row) -> rusqlite::Result<Company> {
        Ok(Company {
            id: row.get(0)?,
            name: row.get(1)?,
            website: row.get(2)?,
            sector: row.get(3)?,
            chain_focus: row.get(4)?,
            size: row.get(5)?,
            notes: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    // --- Job operations ---

    pub fn create_job(&self, job: &NewJob) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO jobs (company_id, title, url, salary_min, salary_max,
                               remote_status, date_posted, closing_date, status, source, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                job.company_id,
                job.title,
                job.url,
                job.salary_min,
                job.salary_max,
                job.remote_status,
                job.date_posted,
                job.closing_date,
                job.status,
                job.source,
                job.notes
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_job(&self, id: i64) -> Result<Option<Job>> {
        let result = self.conn.query_row(
            "SELECT id, company_id, title, url, salary_min, salary_max, remote_status,
                    date_posted, date_found, closing_date, status, source, notes
             FROM jobs WHERE id = ?1",
            [id],
            Self::row_to_job,
        );
        match result {
            Ok(job) => Ok(Some(job)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_jobs(&self, status: Option<JobStatus>) -> Result<Vec<Job>> {
        let sql_base = "SELECT id, company_id, title, url, salary_min, salary_max, remote_status,
                               date_posted, date_found, closing_date, status, source, notes
                        FROM jobs";
        let rows = if let Some(s) = status {
            let mut stmt = self
                .conn
                .prepare(&format!("{} WHERE status = ?1 ORDER BY date_found DESC", sql_base))?;
            let rows = stmt.query_map([s], Self::row_to_job)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
        } else {
            let mut stmt = self
                .conn
                .prepare(&format!("{} ORDER BY date_found DESC", sql_base))?;
            let rows = stmt.query_map([], Self::row_to_job)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
        };
        rows.map_err(Into::into)
    }

    pub fn update_job(&self, job: &Job) -> Result<()> {
        self.conn.execute(
            "UPDATE jobs
             SET company_id = ?1, title = ?2, url = ?3, salary_min = ?4, salary_max = ?5,
                 remote_status = ?6, date_posted = ?7, closing_date = ?8, status = ?9,
                 source = ?10, notes = ?11
             WHERE id = ?12",
            params![
                job.company_id,
                job.title,
                job.url,
                job.salary_min,
                job.salary_max,
                job.remote_status,
                job.date_posted,
                job.closing_date,
                job.status,
                job.source,
                job.notes,
                job.id
            ],
        )?;
        Ok(())
    }

    pub fn job_url_exists(&self, url: &str) -> Result<bool> {
        let result = self
            .conn
            .query_row("SELECT 1 FROM jobs WHERE url = ?1", [url], |row| {
                row.get::<_, i64>(0)
            });
        match result {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<Job> {
        Ok(Job {
            id: row.get(0)?,
            company_id: row.get(1)?,
            title: row.get(2)?,
            url: row.get(3)?,
            salary_min: row.get(4)?,
            salary_max: row.get(5)?,
            remote_status: row.get(6)?,
            date_posted: row.get(7)?,
            date_found: row.get(8)?,
            closing_date: row.get(9)?,
            status: row.get(10)?,
            source: row.get(11)?,
            notes: row.get(12)?,
        })
    }

    // --- Skill operations ---

    pub fn create_skill(&self, name: &str, category: Option<&str>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO skills (name, category) VALUES (?1, ?2)",
            params![name, category],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_skill(&self, id: i64) -> Result<Option<Skill>> {
        let result = self.conn.query_row(
            "SELECT id, name, category FROM skills WHERE id = ?1",
            [id],
            Self::row_to_skill,
        );
        match result {
            Ok(skill) => Ok(Some(skill)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_skill_by_name(&self, name: &str) -> Result<Option<Skill>> {
        let result = self.conn.query_row(
            "SELECT id, name, category FROM skills WHERE LOWER(name) = LOWER(?1)",
            [name],
            Self::row_to_skill,
        );
        match result {
            Ok(skill) => Ok(Some(skill)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_skills(&self, category: Option<&str>) -> Result<Vec<Skill>> {
        let rows = if let Some(cat) = category {
            let mut stmt = self.conn.prepare(
                "SELECT id, name, category FROM skills WHERE category = ?1 ORDER BY name",
            )?;
            let rows = stmt.query_map([cat], Self::row_to_skill)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
        } else {
            let mut stmt = self
                .conn
                .prepare("SELECT id, name, category FROM skills ORDER BY name")?;
            let rows = stmt.query_map([], Self::row_to_skill)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
        };
        rows.map_err(Into::into)
    }

    fn row_to_skill(row: &rusqlite::Row) -> rusqlite::Result<Skill> {
        Ok(Skill {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
        })
    }

    // --- Job skill tagging ---

    /// Upsert: re-tagging an existing pair overwrites the importance.
    pub fn add_skill_to_job(&self, job_id: i64, skill_id: i64, importance: Importance) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO job_skills (job_id, skill_id, importance)
             VALUES (?1, ?2, ?3)",
            params![job_id, skill_id, importance],
        )?;
        Ok(())
    }

    pub fn remove_skill_from_job(&self, job_id: i64, skill_id: i64) -> Result<()> {
        self.conn.execute(
            "DELETE FROM job_skills WHERE job_id = ?1 AND skill_id = ?2",
            params![job_id, skill_id],
        )?;
        Ok(())
    }

    pub fn get_job_skills(&self, job_id: i64) -> Result<Vec<(Skill, Importance)>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.name, s.category, js.importance
             FROM skills s
             JOIN job_skills js ON s.id = js.skill_id
             WHERE js.job_id = ?1
             ORDER BY js.importance, s.name",
        )?;
        let rows = stmt.query_map([job_id], |row| {
            Ok((Self::row_to_skill(row)?, row.get::<_, Importance>(3)?))
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    // --- Application operations ---

    pub fn create_application(&self, application: &Application) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO applications (job_id, date_applied, resume_version,
                                       cover_letter_sent, status, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                application.job_id,
                application.date_applied,
                application.resume_version,
                application.cover_letter_sent,
                application.status,
                application.notes
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_application(&self, id: i64) -> Result<Option<Application>> {
        let result = self.conn.query_row(
            "SELECT id, job_id, date_applied, resume_version, cover_letter_sent, status, notes
             FROM applications WHERE id = ?1",
            [id],
            Self::row_to_application,
        );
        match result {
            Ok(app) => Ok(Some(app)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_applications(&self, status: Option<ApplicationStatus>) -> Result<Vec<Application>> {
        let sql_base = "SELECT id, job_id, date_applied, resume_version, cover_letter_sent, status, notes
                        FROM applications";
        let rows = if let Some(s) = status {
            let mut stmt = self.conn.prepare(&format!(
                "{} WHERE status = ?1 ORDER BY date_applied DESC",
                sql_base
            ))?;
            let rows = stmt.query_map([s], Self::row_to_application)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
        } else {
            let mut stmt = self
                .conn
                .prepare(&format!("{} ORDER BY date_applied DESC", sql_base))?;
            let rows = stmt.query_map([], Self::row_to_application)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
        };
        rows.map_err(Into::into)
    }

    pub fn update_application(&self, application: &Application) -> Result<()> {
        self.conn.execute(
            "UPDATE applications
             SET job_id = ?1, date_applied = ?2, resume_version = ?3,
                 cover_letter_sent = ?4, status = ?5, notes = ?6
             WHERE id = ?7",
            params![
                application.job_id,
                application.date_applied,
                application.resume_version,
                application.cover_letter_sent,
                application.status,
                application.notes,
                application.id
            ],
        )?;
        Ok(())
    }

    fn row_to_application(row: &rusqlite::Row) -> rusqlite::Result<Application> {
        Ok(Application {
            id: row.get(0)?,
            job_id: row.get(1)?,
            date_applied: row.get(2)?,
            resume_version: row.get(3)?,
            cover_letter_sent: row.get(4)?,
            status: row.get(5)?,
            notes: row.get(6)?,
        })
    }

    // --- Interview operations ---

    pub fn create_interview(&self, interview: &Interview) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO interviews (application_id, scheduled_at, type, notes, outcome)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                interview.application_id,
                interview.scheduled_at,
                interview.kind,
                interview.notes,
                interview.outcome
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_interview(&self, id: i64) -> Result<Option<Interview>> {
        let result = self.conn.query_row(
            "SELECT id, application_id, scheduled_at, type, notes, outcome
             FROM interviews WHERE id = ?1",
            [id],
            Self::row_to_interview,
        );
        match result {
            Ok(interview) => Ok(Some(interview)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_interviews(&self, application_id: Option<i64>) -> Result<Vec<Interview>> {
        let sql_base = "SELECT id, application_id, scheduled_at, type, notes, outcome
                        FROM interviews";
        let rows = if let Some(app_id) = application_id {
            let mut stmt = self.conn.prepare(&format!(
                "{} WHERE application_id = ?1 ORDER BY scheduled_at",
                sql_base
            ))?;
            let rows = stmt.query_map([app_id], Self::row_to_interview)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
        } else {
            let mut stmt = self
                .conn
                .prepare(&format!("{} ORDER BY scheduled_at DESC", sql_base))?;
            let rows = stmt.query_map([], Self::row_to_interview)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
        };
        rows.map_err(Into::into)
    }

    pub fn update_interview(&self, interview: &Interview) -> Result<()> {
        self.conn.execute(
            "UPDATE interviews
             SET application_id = ?1, scheduled_at = ?2, type = ?3, notes = ?4, outcome = ?5
             WHERE id = ?6",
            params![
                interview.application_id,
                interview.scheduled_at,
                interview.kind,
                interview.notes,
                interview.outcome,
                interview.id
            ],
        )?;
        Ok(())
    }

    fn row_to_interview(row: &rusqlite::Row) -> rusqlite::Result<Interview> {
        Ok(Interview {
            id: row.get(0)?,
            application_id: row.get(1)?,
            scheduled_at: row.get(2)?,
            kind: row.get(3)?,
            notes: row.get(4)?,
            outcome: row.get(5)?,
        })
    }

    // --- Discovered job operations ---

    pub fn create_discovered_job(&self, job: &NewDiscoveredJob) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO discovered_jobs (title, company_name, url, requirements_raw,
                                          source, raw_response, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                job.title,
                job.company_name,
                job.url,
                job.requirements_raw,
                job.source,
                job.raw_response,
                DiscoveredStatus::Pending
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_discovered_job(&self, id: i64) -> Result<Option<DiscoveredJob>> {
        let result = self.conn.query_row(
            "SELECT id, title, company_name, url, requirements_raw, source, raw_response,
                    discovered_at, status, promoted_to_job_id
             FROM discovered_jobs WHERE id = ?1",
            [id],
            Self::row_to_discovered_job,
        );
        match result {
            Ok(job) => Ok(Some(job)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_discovered_jobs(&self, status: Option<DiscoveredStatus>) -> Result<Vec<DiscoveredJob>> {
        let sql_base = "SELECT id, title, company_name, url, requirements_raw, source, raw_response,
                               discovered_at, status, promoted_to_job_id
                        FROM discovered_jobs";
        let rows = if let Some(s) = status {
            let mut stmt = self.conn.prepare(&format!(
                "{} WHERE status = ?1 ORDER BY discovered_at DESC",
                sql_base
            ))?;
            let rows = stmt.query_map([s], Self::row_to_discovered_job)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
        } else {
            let mut stmt = self
                .conn
                .prepare(&format!("{} ORDER BY discovered_at DESC", sql_base))?;
            let rows = stmt.query_map([], Self::row_to_discovered_job)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
        };
        rows.map_err(Into::into)
    }

    pub fn discovered_job_exists(&self, url: &str) -> Result<bool> {
        let result = self.conn.query_row(
            "SELECT 1 FROM discovered_jobs WHERE url = ?1",
            [url],
            |row| row.get::<_, i64>(0),
        );
        match result {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn row_to_discovered_job(row: &rusqlite::Row) -> rusqlite::Result<DiscoveredJob> {
        Ok(DiscoveredJob {
            id: row.get(0)?,
            title: row.get(1)?,
            company_name: row.get(2)?,
            url: row.get(3)?,
            requirements_raw: row.get(4)?,
            source: row.get(5)?,
            raw_response: row.get(6)?,
            discovered_at: row.get(7)?,
            status: row.get(8)?,
            promoted_to_job_id: row.get(9)?,
        })
    }

    // --- Review / promotion state machine ---

    /// Promote a pending discovered job into a first-class Company/Job pair.
    ///
    /// Company lookup is case-insensitive on name; a missing company is
    /// created from the discovered name plus the supplied details. All three
    /// writes run in one transaction, so any failure leaves the staged
    /// record pending and no orphan rows behind.
    pub fn promote_discovered_job(
        &self,
        id: i64,
        details: &PromotionDetails,
    ) -> Result<PromotionOutcome> {
        let dj = self
            .get_discovered_job(id)?
            .ok_or_else(|| Error::NotFound(format!("Discovered job #{}", id)))?;

        if dj.status != DiscoveredStatus::Pending {
            return Err(Error::AlreadyProcessed(dj.status));
        }

        let company_name = dj
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown");

        let tx = self.conn.unchecked_transaction()?;

        let existing: Option<i64> = match tx.query_row(
            "SELECT id FROM companies WHERE LOWER(name) = LOWER(?1)",
            [company_name],
            |row| row.get(0),
        ) {
            Ok(id) => Some(id),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        let (company_id, company_created) = match existing {
            Some(id) => (id, false),
            None => {
                tx.execute(
                    "INSERT INTO companies (name, sector, chain_focus) VALUES (?1, ?2, ?3)",
                    params![company_name, details.sector, details.chain_focus],
                )?;
                (tx.last_insert_rowid(), true)
            }
        };

        let title = dj
            .title
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown");

        tx.execute(
            "INSERT INTO jobs (company_id, title, url, remote_status, status, source, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                company_id,
                title,
                dj.url,
                details.remote_status,
                JobStatus::Open,
                details.source,
                details.notes
            ],
        )?;
        let job_id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE discovered_jobs SET status = ?1, promoted_to_job_id = ?2 WHERE id = ?3",
            params![DiscoveredStatus::Promoted, job_id, id],
        )?;

        tx.commit()?;

        Ok(PromotionOutcome {
            company_id,
            company_created,
            job_id,
        })
    }

    /// Mark a pending discovered job as dismissed. No other field changes.
    pub fn dismiss_discovered_job(&self, id: i64) -> Result<()> {
        self.transition_discovered_job(id, DiscoveredStatus::Dismissed)
    }

    /// Park a pending discovered job for later review.
    pub fn save_discovered_job(&self, id: i64) -> Result<()> {
        self.transition_discovered_job(id, DiscoveredStatus::Saved)
    }

    fn transition_discovered_job(&self, id: i64, to: DiscoveredStatus) -> Result<()> {
        let dj = self
            .get_discovered_job(id)?
            .ok_or_else(|| Error::NotFound(format!("Discovered job #{}", id)))?;

        if dj.status != DiscoveredStatus::Pending {
            return Err(Error::AlreadyProcessed(dj.status));
        }

        self.conn.execute(
            "UPDATE discovered_jobs SET status = ?1 WHERE id = ?2",
            params![to, id],
        )?;
        Ok(())
    }

    // --- Reports ---

    pub fn application_pipeline(&self) -> Result<Vec<(ApplicationStatus, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT status, COUNT(*) FROM applications
             GROUP BY status
             ORDER BY CASE status
                 WHEN 'applied' THEN 1
                 WHEN 'screening' THEN 2
                 WHEN 'interview' THEN 3
                 WHEN 'offer' THEN 4
                 WHEN 'rejected' THEN 5
                 WHEN 'ghosted' THEN 6
                 WHEN 'withdrawn' THEN 7
             END",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, ApplicationStatus>(0)?, row.get::<_, i64>(1)?))
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    pub fn skill_demand(&self) -> Result<Vec<SkillDemand>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.name, s.category, COUNT(*) as demand,
                    SUM(CASE WHEN js.importance = 'required' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN js.importance = 'nice-to-have' THEN 1 ELSE 0 END)
             FROM skills s
             JOIN job_skills js ON s.id = js.skill_id
             GROUP BY s.id, s.name, s.category
             ORDER BY demand DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SkillDemand {
                name: row.get(0)?,
                category: row.get(1)?,
                total: row.get(2)?,
                required: row.get(3)?,
                nice_to_have: row.get(4)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    pub fn unapplied_jobs(&self) -> Result<Vec<UnappliedJob>> {
        let mut stmt = self.conn.prepare(
            "SELECT j.id, j.title, c.name, j.date_found, j.remote_status
             FROM jobs j
             JOIN companies c ON j.company_id = c.id
             LEFT JOIN applications a ON j.id = a.job_id
             WHERE a.id IS NULL AND j.status = 'open'
             ORDER BY j.date_found DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(UnappliedJob {
                id: row.get(0)?,
                title: row.get(1)?,
                company: row.get(2)?,
                date_found: row.get(3)?,
                remote_status: row.get(4)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Jobs with at least one required SQL-category skill, with the
    /// matching skill names concatenated per job.
    pub fn sql_required_jobs(&self) -> Result<Vec<SqlMatch>> {
        let mut stmt = self.conn.prepare(
            "SELECT j.id, j.title, c.name, j.url, j.remote_status,
                    GROUP_CONCAT(s.name, ', ')
             FROM jobs j
             JOIN companies c ON j.company_id = c.id
             JOIN job_skills js ON j.id = js.job_id
             JOIN skills s ON js.skill_id = s.id
             WHERE s.category = 'SQL' AND js.importance = 'required'
             GROUP BY j.id
             ORDER BY j.date_found DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SqlMatch {
                id: row.get(0)?,
                title: row.get(1)?,
                company: row.get(2)?,
                url: row.get(3)?,
                remote_status: row.get(4)?,
                skills: row.get(5)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Jobs tagged with any SQL-category skill, required or not.
    pub fn list_jobs_with_sql_skills(&self) -> Result<Vec<Job>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT j.id, j.company_id, j.title, j.url, j.salary_min, j.salary_max,
                    j.remote_status, j.date_posted, j.date_found, j.closing_date, j.status,
                    j.source, j.notes
             FROM jobs j
             JOIN job_skills js ON j.id = js.job_id
             JOIN skills s ON js.skill_id = s.id
             WHERE s.category = 'SQL'
             ORDER BY j.date_found DESC",
        )?;
        let rows = stmt.query_map([], Self::row_to_job)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    pub fn search_summary(&self) -> Result<SearchSummary> {
        let count = |sql: &str| -> Result<i64> {
            Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
        };
        Ok(SearchSummary {
            companies: count("SELECT COUNT(*) FROM companies")?,
            jobs: count("SELECT COUNT(*) FROM jobs")?,
            open_jobs: count("SELECT COUNT(*) FROM jobs WHERE status = 'open'")?,
            applications: count("SELECT COUNT(*) FROM applications")?,
            active_applications: count(
                "SELECT COUNT(*) FROM applications
                 WHERE status IN ('applied', 'screening', 'interview')",
            )?,
            offers: count("SELECT COUNT(*) FROM applications WHERE status = 'offer'")?,
            rejected: count("SELECT COUNT(*) FROM applications WHERE status = 'rejected'")?,
            interviews: count("SELECT COUNT(*) FROM interviews")?,
            pending_interviews: count("SELECT COUNT(*) FROM interviews WHERE outcome = 'pending'")?,
        })
    }

    pub fn count_applications(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM applications", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn count_jobs(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        Ok(count)
    }
}

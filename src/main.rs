mod db;
mod discovery;
mod error;
mod models;
mod parser;
mod search;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use db::{Database, PromotionDetails};
use models::{
    Application, ApplicationStatus, DiscoveredStatus, Importance, Interview, InterviewOutcome,
    InterviewType, JobStatus, NewCompany, NewJob, ValidationPolicy, parse_optional,
};

#[derive(Parser)]
#[command(name = "chainhunt")]
#[command(about = "Track crypto/web3 job leads - companies, applications, interviews, and automated discovery")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Automated job discovery via the Perplexity API
    Discover {
        #[command(subcommand)]
        command: DiscoverCommands,
    },

    /// Manage companies
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },

    /// Manage jobs
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Manage the skill catalog
    Skill {
        #[command(subcommand)]
        command: SkillCommands,
    },

    /// Manage applications
    Application {
        #[command(subcommand)]
        command: ApplicationCommands,
    },

    /// Manage interviews
    Interview {
        #[command(subcommand)]
        command: InterviewCommands,
    },

    /// Reports and analytics
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Subcommand)]
enum DiscoverCommands {
    /// Search for new jobs and stage them for review
    Run {
        /// Custom search query
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Review pending discovered jobs
    Review,

    /// Show a discovered job's details
    View {
        /// Discovered job ID
        id: i64,
    },

    /// Promote a discovered job into the main companies/jobs tables
    Promote {
        /// Discovered job ID
        id: i64,

        /// Sector for a newly created company (DeFi/NFT/Infrastructure/Exchange/Analytics/Other)
        #[arg(long)]
        sector: Option<String>,

        /// Chain focus for a newly created company
        #[arg(long)]
        chain_focus: Option<String>,

        /// Remote status for the new job (remote/hybrid/onsite)
        #[arg(long, default_value = "remote")]
        remote_status: String,

        /// Source label for the new job
        #[arg(long, default_value = "perplexity")]
        source: String,

        /// Notes for the new job
        #[arg(long)]
        notes: Option<String>,

        /// Reject unrecognized sector/remote-status values instead of storing null
        #[arg(long)]
        strict: bool,
    },

    /// Dismiss a discovered job (not interested)
    Dismiss {
        /// Discovered job ID
        id: i64,

        /// Skip the confirmation step
        #[arg(short, long)]
        yes: bool,
    },

    /// Save a discovered job for later review
    Save {
        /// Discovered job ID
        id: i64,
    },

    /// List all discovered jobs
    List {
        /// Filter by status (pending, saved, dismissed, promoted)
        #[arg(short, long)]
        status: Option<String>,
    },
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// Add a company
    Add {
        /// Company name
        name: String,

        #[arg(long)]
        website: Option<String>,

        /// DeFi/NFT/Infrastructure/Exchange/Analytics/Other
        #[arg(long)]
        sector: Option<String>,

        #[arg(long)]
        chain_focus: Option<String>,

        /// startup/small/medium/large
        #[arg(long)]
        size: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Reject unrecognized sector/size values instead of storing null
        #[arg(long)]
        strict: bool,
    },

    /// List all companies
    List,

    /// Show company details
    Show {
        /// Company name
        name: String,
    },

    /// Edit a company (only the supplied fields change)
    Edit {
        /// Company name
        name: String,

        #[arg(long)]
        website: Option<String>,

        #[arg(long)]
        sector: Option<String>,

        #[arg(long)]
        chain_focus: Option<String>,

        #[arg(long)]
        size: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum JobCommands {
    /// Add a job posting
    Add {
        /// Company name (created if missing)
        company: String,

        /// Job title
        title: String,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        salary_min: Option<i64>,

        #[arg(long)]
        salary_max: Option<i64>,

        /// remote/hybrid/onsite
        #[arg(long)]
        remote_status: Option<String>,

        #[arg(long)]
        date_posted: Option<String>,

        #[arg(long)]
        closing_date: Option<String>,

        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        strict: bool,
    },

    /// List jobs
    List {
        /// Filter by status (open, closed, expired)
        #[arg(short, long)]
        status: Option<String>,

        /// Only jobs tagged with SQL-category skills
        #[arg(long)]
        sql: bool,
    },

    /// Show job details including tagged skills
    Show {
        /// Job ID
        id: i64,
    },

    /// Set a job's status
    SetStatus {
        /// Job ID
        id: i64,

        /// open/closed/expired
        status: String,
    },

    /// Tag a skill on a job (re-tagging overwrites the importance)
    Tag {
        /// Job ID
        id: i64,

        /// Skill name (created if missing)
        skill: String,

        /// required/nice-to-have
        #[arg(long, default_value = "required")]
        importance: String,

        /// Category when creating a new skill
        #[arg(long)]
        category: Option<String>,
    },

    /// Remove a skill tag from a job
    Untag {
        /// Job ID
        id: i64,

        /// Skill name
        skill: String,
    },
}

#[derive(Subcommand)]
enum SkillCommands {
    /// Add a skill to the catalog
    Add {
        /// Skill name
        name: String,

        /// Category (e.g. SQL, Programming, BI, Blockchain)
        #[arg(long)]
        category: Option<String>,
    },

    /// List skills
    List {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
enum ApplicationCommands {
    /// Record an application for a job
    Add {
        /// Job ID
        job_id: i64,

        /// Date applied (defaults to today)
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        resume_version: Option<String>,

        /// A cover letter was sent
        #[arg(long)]
        cover_letter: bool,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List applications
    List {
        /// Filter by status (applied, screening, interview, rejected, offer, ghosted, withdrawn)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Set an application's status
    SetStatus {
        /// Application ID
        id: i64,

        /// applied/screening/interview/rejected/offer/ghosted/withdrawn
        status: String,
    },
}

#[derive(Subcommand)]
enum InterviewCommands {
    /// Schedule an interview for an application
    Add {
        /// Application ID
        application_id: i64,

        /// Scheduled date/time (ISO 8601)
        #[arg(long)]
        at: Option<String>,

        /// recruiter/technical/sql-challenge/culture/final
        #[arg(long)]
        kind: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List interviews
    List {
        /// Filter by application ID
        #[arg(short, long)]
        application: Option<i64>,
    },

    /// Set an interview's outcome
    SetOutcome {
        /// Interview ID
        id: i64,

        /// pending/passed/failed/cancelled
        outcome: String,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Application pipeline by status
    Pipeline,

    /// Most in-demand skills across tracked jobs
    Skills,

    /// Open jobs with no application yet
    Unapplied,

    /// Jobs requiring SQL skills (best matches)
    SqlMatches,

    /// Overall job-search summary
    Summary,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = Database::open()?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Discover { command } => {
            db.ensure_initialized()?;
            run_discover(&db, command)?;
        }

        Commands::Company { command } => {
            db.ensure_initialized()?;
            run_company(&db, command)?;
        }

        Commands::Job { command } => {
            db.ensure_initialized()?;
            run_job(&db, command)?;
        }

        Commands::Skill { command } => {
            db.ensure_initialized()?;
            run_skill(&db, command)?;
        }

        Commands::Application { command } => {
            db.ensure_initialized()?;
            run_application(&db, command)?;
        }

        Commands::Interview { command } => {
            db.ensure_initialized()?;
            run_interview(&db, command)?;
        }

        Commands::Report { command } => {
            db.ensure_initialized()?;
            run_report(&db, command)?;
        }
    }

    Ok(())
}

fn policy(strict: bool) -> ValidationPolicy {
    if strict {
        ValidationPolicy::Strict
    } else {
        ValidationPolicy::Lenient
    }
}

fn opt_parse<T: std::str::FromStr<Err = error::Error>>(
    input: Option<&str>,
    pol: ValidationPolicy,
) -> Result<Option<T>> {
    match input {
        Some(s) => Ok(parse_optional(s, pol)?),
        None => Ok(None),
    }
}

fn run_discover(db: &Database, command: DiscoverCommands) -> Result<()> {
    match command {
        DiscoverCommands::Run { query } => {
            // Missing credential fails here, before any network call.
            let client = search::PerplexityClient::new()?;

            println!("Searching for crypto/web3 jobs...");
            if let Some(q) = &query {
                println!("Custom query: {}", q);
            }

            let stats = discovery::run_discovery(db, &client, query.as_deref())?;

            println!("\nResults:");
            println!("  New jobs found:  {}", stats.new);
            println!("  Duplicates:      {}", stats.duplicates);
            if stats.errors > 0 {
                println!("  Errors:          {}", stats.errors);
            }
            if stats.new > 0 {
                println!("\nRun 'chainhunt discover review' to review new jobs.");
            }
        }

        DiscoverCommands::Review => {
            let jobs = db.list_discovered_jobs(Some(DiscoveredStatus::Pending))?;
            if jobs.is_empty() {
                println!("No pending jobs to review.");
                return Ok(());
            }

            println!("\nPending Discovered Jobs ({})\n", jobs.len());
            println!("{:<6} {:<30} {:<20} {:<12}", "ID", "TITLE", "COMPANY", "DISCOVERED");
            println!("{}", "-".repeat(70));
            for job in jobs {
                println!(
                    "{:<6} {:<30} {:<20} {:<12}",
                    job.id,
                    truncate(job.title.as_deref().unwrap_or("-"), 28),
                    truncate(job.company_name.as_deref().unwrap_or("-"), 18),
                    job.discovered_at.as_deref().map(|d| &d[..d.len().min(10)]).unwrap_or("-"),
                );
            }
            println!("\nCommands:");
            println!("  discover view <id>     - View job details");
            println!("  discover promote <id>  - Add to main jobs table");
            println!("  discover dismiss <id>  - Mark as dismissed");
        }

        DiscoverCommands::View { id } => {
            let job = db
                .get_discovered_job(id)?
                .ok_or_else(|| anyhow!("Discovered job #{} not found", id))?;

            println!("\nDiscovered Job #{}", job.id);
            println!("{}", "-".repeat(50));
            println!("Title:        {}", job.title.as_deref().unwrap_or("-"));
            println!("Company:      {}", job.company_name.as_deref().unwrap_or("-"));
            println!("URL:          {}", job.url.as_deref().unwrap_or("-"));
            println!("Requirements: {}", job.requirements_raw.as_deref().unwrap_or("-"));
            println!("Source:       {}", job.source.as_deref().unwrap_or("-"));
            println!("Discovered:   {}", job.discovered_at.as_deref().unwrap_or("-"));
            println!("Status:       {}", job.status);
            if let Some(job_id) = job.promoted_to_job_id {
                println!("Promoted to:  job #{}", job_id);
            }

            if job.status == DiscoveredStatus::Pending {
                println!("\nActions:");
                println!("  discover promote {}  - Add to main jobs", job.id);
                println!("  discover dismiss {}  - Dismiss", job.id);
            }
        }

        DiscoverCommands::Promote {
            id,
            sector,
            chain_focus,
            remote_status,
            source,
            notes,
            strict,
        } => {
            let dj = db
                .get_discovered_job(id)?
                .ok_or_else(|| anyhow!("Discovered job #{} not found", id))?;

            println!("Promoting: {}", dj.title.as_deref().unwrap_or("-"));
            println!("Company:   {}", dj.company_name.as_deref().unwrap_or("-"));
            println!("URL:       {}", dj.url.as_deref().unwrap_or("-"));

            let pol = policy(strict);
            let details = PromotionDetails {
                sector: opt_parse(sector.as_deref(), pol)?,
                chain_focus,
                remote_status: parse_optional(&remote_status, pol)?,
                source: Some(source),
                notes,
            };

            let outcome = db.promote_discovered_job(id, &details)?;

            if outcome.company_created {
                println!("\nCreated company with ID {}", outcome.company_id);
            } else {
                println!("\nReusing existing company (ID: {})", outcome.company_id);
            }
            println!("Created job with ID {}", outcome.job_id);
            println!("Marked discovered job as promoted.");
            println!("\nTo tag skills, run: chainhunt job tag {} <skill>", outcome.job_id);
        }

        DiscoverCommands::Dismiss { id, yes } => {
            let dj = db
                .get_discovered_job(id)?
                .ok_or_else(|| anyhow!("Discovered job #{} not found", id))?;

            println!(
                "Dismissing: {} at {}",
                dj.title.as_deref().unwrap_or("-"),
                dj.company_name.as_deref().unwrap_or("-")
            );

            if yes {
                db.dismiss_discovered_job(id)?;
                println!("Job dismissed.");
            } else {
                println!("Re-run with --yes to confirm.");
            }
        }

        DiscoverCommands::Save { id } => {
            db.save_discovered_job(id)?;
            println!("Job #{} saved for later.", id);
        }

        DiscoverCommands::List { status } => {
            let status = match status.as_deref() {
                Some(s) => Some(s.parse::<DiscoveredStatus>()?),
                None => None,
            };
            let jobs = db.list_discovered_jobs(status)?;
            if jobs.is_empty() {
                println!("No discovered jobs found.");
                return Ok(());
            }

            println!("\nDiscovered Jobs ({})\n", jobs.len());
            println!(
                "{:<6} {:<28} {:<18} {:<10} {:<12}",
                "ID", "TITLE", "COMPANY", "STATUS", "DISCOVERED"
            );
            println!("{}", "-".repeat(76));
            for job in jobs {
                println!(
                    "{:<6} {:<28} {:<18} {:<10} {:<12}",
                    job.id,
                    truncate(job.title.as_deref().unwrap_or("-"), 26),
                    truncate(job.company_name.as_deref().unwrap_or("-"), 16),
                    job.status,
                    job.discovered_at.as_deref().map(|d| &d[..d.len().min(10)]).unwrap_or("-"),
                );
            }
        }
    }
    Ok(())
}

fn run_company(db: &Database, command: CompanyCommands) -> Result<()> {
    match command {
        CompanyCommands::Add {
            name,
            website,
            sector,
            chain_focus,
            size,
            notes,
            strict,
        } => {
            let pol = policy(strict);
            let company = NewCompany {
                name: name.clone(),
                website,
                sector: opt_parse(sector.as_deref(), pol)?,
                chain_focus,
                size: opt_parse(size.as_deref(), pol)?,
                notes,
            };
            let id = db.create_company(&company)?;
            println!("Added company '{}' (ID: {})", name, id);
        }

        CompanyCommands::List => {
            let companies = db.list_companies()?;
            if companies.is_empty() {
                println!("No companies found.");
                return Ok(());
            }
            println!("{:<6} {:<25} {:<16} {:<10}", "ID", "NAME", "SECTOR", "SIZE");
            println!("{}", "-".repeat(59));
            for company in companies {
                println!(
                    "{:<6} {:<25} {:<16} {:<10}",
                    company.id,
                    truncate(&company.name, 23),
                    company.sector.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                    company.size.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                );
            }
        }

        CompanyCommands::Show { name } => {
            let company = db
                .get_company_by_name(&name)?
                .ok_or_else(|| anyhow!("Company '{}' not found", name))?;

            println!("Company #{}", company.id);
            println!("Name: {}", company.name);
            if let Some(website) = &company.website {
                println!("Website: {}", website);
            }
            if let Some(sector) = company.sector {
                println!("Sector: {}", sector);
            }
            if let Some(chain) = &company.chain_focus {
                println!("Chain focus: {}", chain);
            }
            if let Some(size) = company.size {
                println!("Size: {}", size);
            }
            if let Some(notes) = &company.notes {
                println!("Notes: {}", notes);
            }
            println!("Created: {}", company.created_at);
        }

        CompanyCommands::Edit {
            name,
            website,
            sector,
            chain_focus,
            size,
            notes,
            strict,
        } => {
            let mut company = db
                .get_company_by_name(&name)?
                .ok_or_else(|| anyhow!("Company '{}' not found", name))?;

            let pol = policy(strict);
            if website.is_some() {
                company.website = website;
            }
            if let Some(s) = sector.as_deref() {
                company.sector = parse_optional(s, pol)?;
            }
            if chain_focus.is_some() {
                company.chain_focus = chain_focus;
            }
            if let Some(s) = size.as_deref() {
                company.size = parse_optional(s, pol)?;
            }
            if notes.is_some() {
                company.notes = notes;
            }
            db.update_company(&company)?;
            println!("Updated company '{}'.", company.name);
        }
    }
    Ok(())
}

fn run_job(db: &Database, command: JobCommands) -> Result<()> {
    match command {
        JobCommands::Add {
            company,
            title,
            url,
            salary_min,
            salary_max,
            remote_status,
            date_posted,
            closing_date,
            source,
            notes,
            strict,
        } => {
            let pol = policy(strict);
            let company_id = match db.get_company_by_name(&company)? {
                Some(existing) => existing.id,
                None => {
                    let id = db.create_company(&NewCompany {
                        name: company.clone(),
                        ..Default::default()
                    })?;
                    println!("Created company '{}' (ID: {})", company, id);
                    id
                }
            };

            let job = NewJob {
                company_id,
                title: title.clone(),
                url,
                salary_min,
                salary_max,
                remote_status: opt_parse(remote_status.as_deref(), pol)?,
                date_posted,
                closing_date,
                status: JobStatus::Open,
                source,
                notes,
            };
            let id = db.create_job(&job)?;
            println!("Added job '{}' (ID: {})", title, id);
        }

        JobCommands::List { status, sql } => {
            let jobs = if sql {
                db.list_jobs_with_sql_skills()?
            } else {
                let status = match status.as_deref() {
                    Some(s) => Some(s.parse::<JobStatus>()?),
                    None => None,
                };
                db.list_jobs(status)?
            };
            if jobs.is_empty() {
                println!("No jobs found.");
                return Ok(());
            }
            println!(
                "{:<6} {:<8} {:<30} {:<12} {:>14}",
                "ID", "STATUS", "TITLE", "FOUND", "SALARY"
            );
            println!("{}", "-".repeat(72));
            for job in jobs {
                let salary = match (job.salary_min, job.salary_max) {
                    (Some(min), Some(max)) => format!("${}k-${}k", min / 1000, max / 1000),
                    (Some(min), None) => format!("${}k+", min / 1000),
                    (None, Some(max)) => format!("<${}k", max / 1000),
                    (None, None) => "-".to_string(),
                };
                println!(
                    "{:<6} {:<8} {:<30} {:<12} {:>14}",
                    job.id,
                    job.status,
                    truncate(&job.title, 28),
                    job.date_found.as_deref().unwrap_or("-"),
                    salary,
                );
            }
        }

        JobCommands::Show { id } => {
            let job = db.get_job(id)?.ok_or_else(|| anyhow!("Job #{} not found", id))?;
            let company = db.get_company(job.company_id)?;

            println!("Job #{}", job.id);
            println!("Title: {}", job.title);
            if let Some(company) = company {
                println!("Company: {}", company.name);
            }
            println!("Status: {}", job.status);
            if let Some(url) = &job.url {
                println!("URL: {}", url);
            }
            if let Some(remote) = job.remote_status {
                println!("Remote: {}", remote);
            }
            match (job.salary_min, job.salary_max) {
                (Some(min), Some(max)) => println!("Salary: ${} - ${}", min, max),
                (Some(min), None) => println!("Salary: ${}+", min),
                (None, Some(max)) => println!("Salary: up to ${}", max),
                (None, None) => {}
            }
            if let Some(date) = &job.date_found {
                println!("Found: {}", date);
            }
            if let Some(source) = &job.source {
                println!("Source: {}", source);
            }
            if let Some(notes) = &job.notes {
                println!("Notes: {}", notes);
            }

            let skills = db.get_job_skills(id)?;
            if !skills.is_empty() {
                println!("\nSkills:");
                for (skill, importance) in skills {
                    println!("  {} ({})", skill.name, importance);
                }
            }
        }

        JobCommands::SetStatus { id, status } => {
            let mut job = db.get_job(id)?.ok_or_else(|| anyhow!("Job #{} not found", id))?;
            job.status = status.parse()?;
            db.update_job(&job)?;
            println!("Job #{} is now {}.", id, job.status);
        }

        JobCommands::Tag {
            id,
            skill,
            importance,
            category,
        } => {
            db.get_job(id)?.ok_or_else(|| anyhow!("Job #{} not found", id))?;
            let importance: Importance = importance.parse()?;

            let skill_id = match db.get_skill_by_name(&skill)? {
                Some(existing) => existing.id,
                None => {
                    let skill_id = db.create_skill(&skill, category.as_deref())?;
                    println!("Created skill '{}'", skill);
                    skill_id
                }
            };

            db.add_skill_to_job(id, skill_id, importance)?;
            println!("Tagged '{}' on job #{} ({})", skill, id, importance);
        }

        JobCommands::Untag { id, skill } => {
            let found = db
                .get_skill_by_name(&skill)?
                .ok_or_else(|| anyhow!("Skill '{}' not found", skill))?;
            db.remove_skill_from_job(id, found.id)?;
            println!("Removed '{}' from job #{}", skill, id);
        }
    }
    Ok(())
}

fn run_skill(db: &Database, command: SkillCommands) -> Result<()> {
    match command {
        SkillCommands::Add { name, category } => {
            let id = db.create_skill(&name, category.as_deref())?;
            println!("Added skill '{}' (ID: {})", name, id);
        }

        SkillCommands::List { category } => {
            let skills = db.list_skills(category.as_deref())?;
            if skills.is_empty() {
                println!("No skills found.");
                return Ok(());
            }
            println!("{:<6} {:<20} {:<15}", "ID", "NAME", "CATEGORY");
            println!("{}", "-".repeat(41));
            for skill in skills {
                println!(
                    "{:<6} {:<20} {:<15}",
                    skill.id,
                    truncate(&skill.name, 18),
                    skill.category.as_deref().unwrap_or("-"),
                );
            }
        }
    }
    Ok(())
}

fn run_application(db: &Database, command: ApplicationCommands) -> Result<()> {
    match command {
        ApplicationCommands::Add {
            job_id,
            date,
            resume_version,
            cover_letter,
            notes,
        } => {
            db.get_job(job_id)?
                .ok_or_else(|| anyhow!("Job #{} not found", job_id))?;

            let date_applied =
                date.unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
            let id = db.create_application(&Application {
                id: 0,
                job_id,
                date_applied: Some(date_applied),
                resume_version,
                cover_letter_sent: cover_letter,
                status: ApplicationStatus::Applied,
                notes,
            })?;
            println!("Recorded application #{} for job #{}", id, job_id);
        }

        ApplicationCommands::List { status } => {
            let status = match status.as_deref() {
                Some(s) => Some(s.parse::<ApplicationStatus>()?),
                None => None,
            };
            let applications = db.list_applications(status)?;
            if applications.is_empty() {
                println!("No applications found.");
                return Ok(());
            }
            println!(
                "{:<6} {:<8} {:<12} {:<12} {:<8}",
                "ID", "JOB", "STATUS", "APPLIED", "LETTER"
            );
            println!("{}", "-".repeat(48));
            for app in applications {
                println!(
                    "{:<6} {:<8} {:<12} {:<12} {:<8}",
                    app.id,
                    app.job_id,
                    app.status,
                    app.date_applied.as_deref().unwrap_or("-"),
                    if app.cover_letter_sent { "yes" } else { "no" },
                );
            }
        }

        ApplicationCommands::SetStatus { id, status } => {
            let mut app = db
                .get_application(id)?
                .ok_or_else(|| anyhow!("Application #{} not found", id))?;
            app.status = status.parse()?;
            db.update_application(&app)?;
            println!("Application #{} is now {}.", id, app.status);
        }
    }
    Ok(())
}

fn run_interview(db: &Database, command: InterviewCommands) -> Result<()> {
    match command {
        InterviewCommands::Add {
            application_id,
            at,
            kind,
            notes,
        } => {
            db.get_application(application_id)?
                .ok_or_else(|| anyhow!("Application #{} not found", application_id))?;

            let kind = match kind.as_deref() {
                Some(s) => Some(s.parse::<InterviewType>()?),
                None => None,
            };
            let id = db.create_interview(&Interview {
                id: 0,
                application_id,
                scheduled_at: at,
                kind,
                notes,
                outcome: Some(InterviewOutcome::Pending),
            })?;
            println!("Scheduled interview #{} for application #{}", id, application_id);
        }

        InterviewCommands::List { application } => {
            let interviews = db.list_interviews(application)?;
            if interviews.is_empty() {
                println!("No interviews found.");
                return Ok(());
            }
            println!(
                "{:<6} {:<6} {:<20} {:<15} {:<10}",
                "ID", "APP", "SCHEDULED", "TYPE", "OUTCOME"
            );
            println!("{}", "-".repeat(59));
            for interview in interviews {
                println!(
                    "{:<6} {:<6} {:<20} {:<15} {:<10}",
                    interview.id,
                    interview.application_id,
                    interview.scheduled_at.as_deref().unwrap_or("-"),
                    interview.kind.map(|k| k.to_string()).unwrap_or_else(|| "-".to_string()),
                    interview
                        .outcome
                        .map(|o| o.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
        }

        InterviewCommands::SetOutcome { id, outcome } => {
            let mut interview = db
                .get_interview(id)?
                .ok_or_else(|| anyhow!("Interview #{} not found", id))?;
            interview.outcome = Some(outcome.parse()?);
            db.update_interview(&interview)?;
            println!(
                "Interview #{} outcome: {}",
                id,
                interview.outcome.map(|o| o.to_string()).unwrap_or_default()
            );
        }
    }
    Ok(())
}

fn run_report(db: &Database, command: ReportCommands) -> Result<()> {
    match command {
        ReportCommands::Pipeline => {
            let total = db.count_applications()?;
            if total == 0 {
                println!("No applications yet.");
                return Ok(());
            }
            let rows = db.application_pipeline()?;

            println!("\nApplication Pipeline ({} total)\n", total);
            println!("{:<12} {:<8} {:<12} BAR", "STATUS", "COUNT", "PERCENT");
            println!("{}", "-".repeat(55));
            for (status, count) in &rows {
                let pct = (*count as f64 / total as f64) * 100.0;
                let bar = "#".repeat((pct / 5.0) as usize);
                println!("{:<12} {:<8} {:>5.1}%       {}", status, count, pct, bar);
            }

            let active_statuses = [
                ApplicationStatus::Applied,
                ApplicationStatus::Screening,
                ApplicationStatus::Interview,
            ];
            let count_of = |wanted: ApplicationStatus| {
                rows.iter()
                    .filter(|(s, _)| *s == wanted)
                    .map(|(_, c)| c)
                    .sum::<i64>()
            };
            let active: i64 = active_statuses.iter().map(|s| count_of(*s)).sum();
            println!("{}", "-".repeat(55));
            println!(
                "Active: {}  |  Offers: {}  |  Rejected: {}",
                active,
                count_of(ApplicationStatus::Offer),
                count_of(ApplicationStatus::Rejected),
            );
        }

        ReportCommands::Skills => {
            let rows = db.skill_demand()?;
            if rows.is_empty() {
                println!("No skills tagged on any jobs yet.");
                return Ok(());
            }
            let total_jobs = db.count_jobs()?;

            println!("\nSkill Demand ({} jobs tracked)\n", total_jobs);
            println!(
                "{:<20} {:<12} {:<8} {:<10} {:<12}",
                "SKILL", "CATEGORY", "TOTAL", "REQUIRED", "NICE-TO-HAVE"
            );
            println!("{}", "-".repeat(64));
            for row in rows {
                println!(
                    "{:<20} {:<12} {:<8} {:<10} {:<12}",
                    truncate(&row.name, 18),
                    row.category.as_deref().unwrap_or("-"),
                    row.total,
                    row.required,
                    row.nice_to_have,
                );
            }
        }

        ReportCommands::Unapplied => {
            let rows = db.unapplied_jobs()?;
            if rows.is_empty() {
                println!("Nothing open and unapplied. Nice.");
                return Ok(());
            }

            println!("\nOpen jobs with no application ({})\n", rows.len());
            println!("{:<6} {:<30} {:<20} {:<12} {:<8}", "ID", "TITLE", "COMPANY", "FOUND", "REMOTE");
            println!("{}", "-".repeat(78));
            for row in rows {
                println!(
                    "{:<6} {:<30} {:<20} {:<12} {:<8}",
                    row.id,
                    truncate(&row.title, 28),
                    truncate(&row.company, 18),
                    row.date_found.as_deref().unwrap_or("-"),
                    row.remote_status
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
        }

        ReportCommands::SqlMatches => {
            let rows = db.sql_required_jobs()?;
            if rows.is_empty() {
                println!("No jobs with required SQL skills found.");
                return Ok(());
            }

            println!("\nSQL-Required Jobs ({})\n", rows.len());
            println!("{:<6} {:<25} {:<18} {:<25}", "ID", "TITLE", "COMPANY", "SQL SKILLS");
            println!("{}", "-".repeat(76));
            for row in rows {
                println!(
                    "{:<6} {:<25} {:<18} {:<25}",
                    row.id,
                    truncate(&row.title, 23),
                    truncate(&row.company, 16),
                    truncate(&row.skills, 23),
                );
            }
        }

        ReportCommands::Summary => {
            let summary = db.search_summary()?;

            println!("\n{}", "=".repeat(40));
            println!("       JOB SEARCH SUMMARY");
            println!("{}", "=".repeat(40));

            println!("\nTracking:");
            println!("  Companies:     {}", summary.companies);
            println!("  Jobs:          {} ({} open)", summary.jobs, summary.open_jobs);

            println!("\nApplications:    {}", summary.applications);
            if summary.applications > 0 {
                println!("  Active:        {}", summary.active_applications);
                println!("  Offers:        {}", summary.offers);
                println!("  Rejected:      {}", summary.rejected);
            }

            println!("\nInterviews:      {}", summary.interviews);
            if summary.interviews > 0 {
                println!("  Pending:       {}", summary.pending_interviews);
            }

            if summary.applications > 0 {
                let offer_rate =
                    (summary.offers as f64 / summary.applications as f64) * 100.0;
                println!("\nOffer Rate:      {:.1}%", offer_rate);
            }
            println!();
        }
    }
    Ok(())
}

// Column text can come straight from the search API, so the cut has to
// land on a char boundary.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn test_truncate_leaves_short_strings_alone() {
        assert_eq!(truncate("DeFi", 10), "DeFi");
        assert_eq!(truncate("exactly ten", 11), "exactly ten");
    }

    #[test]
    fn test_truncate_shortens_with_ellipsis() {
        assert_eq!(truncate("abcdefghijkl", 10), "abcdefg...");
    }

    #[test]
    fn test_truncate_cuts_on_char_boundaries() {
        // The old byte-indexed slice panicked when the cut landed inside
        // a multibyte char.
        assert_eq!(truncate("aaaaaaéxxxx", 10), "aaaaaaé...");
        assert_eq!(truncate("Données analyste on-chain", 10), "Données...");
        assert_eq!(truncate("ünicode ünicode", 8), "ünico...");
    }
}

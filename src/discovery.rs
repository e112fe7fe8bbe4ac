use crate::db::Database;
use crate::error::Result;
use crate::models::NewDiscoveredJob;
use crate::parser::{self, JobCandidate};
use crate::search::{DEFAULT_QUERY, SearchProvider};

pub const DISCOVERY_SOURCE: &str = "perplexity";

/// Tri-counter summary of one discovery cycle. The counters always sum
/// to the number of candidates the parser produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub new: usize,
    pub duplicates: usize,
    pub errors: usize,
}

impl DiscoveryStats {
    pub fn total(&self) -> usize {
        self.new + self.duplicates + self.errors
    }
}

enum Outcome {
    New,
    Duplicate,
    Error,
}

/// Run one discovery cycle: search, parse, dedup, stage.
///
/// Credential and transport failures abort the cycle before anything is
/// written. Per-candidate failures are counted and the loop continues,
/// so one bad candidate never loses the rest of the batch.
pub fn run_discovery(
    db: &Database,
    provider: &dyn SearchProvider,
    query: Option<&str>,
) -> Result<DiscoveryStats> {
    let raw = provider.search(query.unwrap_or(DEFAULT_QUERY))?;
    tracing::debug!(len = raw.len(), "received search response");

    let candidates = parser::parse_jobs(&raw);

    let mut stats = DiscoveryStats::default();
    for candidate in &candidates {
        match stage_candidate(db, candidate, &raw) {
            Outcome::New => stats.new += 1,
            Outcome::Duplicate => stats.duplicates += 1,
            Outcome::Error => stats.errors += 1,
        }
    }

    tracing::info!(
        new = stats.new,
        duplicates = stats.duplicates,
        errors = stats.errors,
        "discovery cycle complete"
    );
    Ok(stats)
}

fn stage_candidate(db: &Database, candidate: &JobCandidate, raw: &str) -> Outcome {
    if candidate.parse_error {
        return Outcome::Error;
    }

    // No url means no dedup key; the candidate is not actionable.
    let Some(url) = candidate.url.as_deref() else {
        return Outcome::Error;
    };

    let already_known = db
        .discovered_job_exists(url)
        .and_then(|found| if found { Ok(true) } else { db.job_url_exists(url) });
    match already_known {
        Ok(true) => return Outcome::Duplicate,
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(url, error = %e, "dedup check failed");
            return Outcome::Error;
        }
    }

    let staged = NewDiscoveredJob {
        title: Some(candidate.title.clone()),
        company_name: Some(candidate.company.clone()),
        url: Some(url.to_string()),
        requirements_raw: Some(candidate.requirements.clone()),
        source: Some(DISCOVERY_SOURCE.to_string()),
        // Full payload retained verbatim for audit
        raw_response: Some(raw.to_string()),
    };

    match db.create_discovered_job(&staged) {
        Ok(_) => Outcome::New,
        Err(e) => {
            tracing::warn!(url, error = %e, "failed to stage candidate");
            Outcome::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{DiscoveredStatus, NewCompany, NewJob};

    struct StubProvider {
        response: String,
    }

    impl SearchProvider for StubProvider {
        fn search(&self, _query: &str) -> Result<String> {
            Ok(self.response.clone())
        }
    }

    struct FailingProvider;

    impl SearchProvider for FailingProvider {
        fn search(&self, _query: &str) -> Result<String> {
            Err(Error::Timeout)
        }
    }

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        db
    }

    #[test]
    fn test_stages_new_candidates_as_pending() {
        let db = test_db();
        let provider = StubProvider {
            response: r#"[{"title":"Data Analyst","company":"Uniswap","url":"https://x.com/1","requirements":"SQL"}]"#.to_string(),
        };

        let stats = run_discovery(&db, &provider, None).unwrap();
        assert_eq!(stats, DiscoveryStats { new: 1, duplicates: 0, errors: 0 });

        let staged = db.list_discovered_jobs(Some(DiscoveredStatus::Pending)).unwrap();
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0].title.as_deref(), Some("Data Analyst"));
        assert_eq!(staged[0].source.as_deref(), Some("perplexity"));
        assert_eq!(staged[0].raw_response.as_deref(), Some(provider.response.as_str()));
    }

    #[test]
    fn test_counters_sum_to_candidate_count() {
        let db = test_db();
        // Four candidates: one good, one bad url (flagged by the parser),
        // one with no url at all, one duplicate of the first.
        let response = r#"[
            {"title":"A","company":"X","url":"https://x.com/a"},
            {"title":"B","company":"Y","url":"ftp://bad"},
            {"title":"C","company":"Z"},
            {"title":"A again","company":"X","url":"https://x.com/a"}
        ]"#;
        let provider = StubProvider { response: response.to_string() };

        let stats = run_discovery(&db, &provider, None).unwrap();
        assert_eq!(stats.total(), parser::parse_jobs(response).len());
        assert_eq!(stats, DiscoveryStats { new: 1, duplicates: 1, errors: 2 });
    }

    #[test]
    fn test_rerun_counts_everything_as_duplicate() {
        let db = test_db();
        let provider = StubProvider {
            response: r#"[
                {"title":"A","company":"X","url":"https://x.com/a"},
                {"title":"B","company":"Y","url":"https://x.com/b"}
            ]"#.to_string(),
        };

        let first = run_discovery(&db, &provider, None).unwrap();
        assert_eq!(first, DiscoveryStats { new: 2, duplicates: 0, errors: 0 });

        let second = run_discovery(&db, &provider, None).unwrap();
        assert_eq!(second, DiscoveryStats { new: 0, duplicates: 2, errors: 0 });
    }

    #[test]
    fn test_dedups_against_tracked_jobs() {
        let db = test_db();
        let company_id = db
            .create_company(&NewCompany {
                name: "Uniswap".to_string(),
                ..Default::default()
            })
            .unwrap();
        db.create_job(&NewJob {
            company_id,
            title: "Analyst".to_string(),
            url: Some("https://x.com/tracked".to_string()),
            ..Default::default()
        })
        .unwrap();

        let provider = StubProvider {
            response: r#"[{"title":"Analyst","company":"Uniswap","url":"https://x.com/tracked"}]"#
                .to_string(),
        };

        let stats = run_discovery(&db, &provider, None).unwrap();
        assert_eq!(stats, DiscoveryStats { new: 0, duplicates: 1, errors: 0 });
        assert!(db.list_discovered_jobs(None).unwrap().is_empty());
    }

    #[test]
    fn test_unparseable_response_counts_one_error() {
        let db = test_db();
        let provider = StubProvider {
            response: "Sorry, I couldn't find any jobs today.".to_string(),
        };

        let stats = run_discovery(&db, &provider, None).unwrap();
        assert_eq!(stats, DiscoveryStats { new: 0, duplicates: 0, errors: 1 });
        assert!(db.list_discovered_jobs(None).unwrap().is_empty());
    }

    #[test]
    fn test_provider_failure_aborts_before_any_write() {
        let db = test_db();
        let err = run_discovery(&db, &FailingProvider, None).unwrap_err();
        assert!(matches!(err, Error::Timeout));
        assert!(db.list_discovered_jobs(None).unwrap().is_empty());
    }
}

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::error::Error;

/// Generates a closed status enum backed by its canonical text form.
///
/// Each enum gets `as_str`, case-insensitive `FromStr`, `Display`, and
/// rusqlite `FromSql`/`ToSql` so values round-trip through the database
/// as plain TEXT while staying typed everywhere else.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(Error::InvalidValue {
                    field: $field,
                    value: s.to_string(),
                })
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }
    };
}

str_enum!(Sector, "sector" {
    DeFi => "DeFi",
    Nft => "NFT",
    Infrastructure => "Infrastructure",
    Exchange => "Exchange",
    Analytics => "Analytics",
    Other => "Other",
});

str_enum!(CompanySize, "size" {
    Startup => "startup",
    Small => "small",
    Medium => "medium",
    Large => "large",
});

str_enum!(RemoteStatus, "remote_status" {
    Remote => "remote",
    Hybrid => "hybrid",
    Onsite => "onsite",
});

str_enum!(JobStatus, "status" {
    Open => "open",
    Closed => "closed",
    Expired => "expired",
});

str_enum!(Importance, "importance" {
    Required => "required",
    NiceToHave => "nice-to-have",
});

str_enum!(ApplicationStatus, "status" {
    Applied => "applied",
    Screening => "screening",
    Interview => "interview",
    Rejected => "rejected",
    Offer => "offer",
    Ghosted => "ghosted",
    Withdrawn => "withdrawn",
});

str_enum!(InterviewType, "type" {
    Recruiter => "recruiter",
    Technical => "technical",
    SqlChallenge => "sql-challenge",
    Culture => "culture",
    Final => "final",
});

str_enum!(InterviewOutcome, "outcome" {
    Pending => "pending",
    Passed => "passed",
    Failed => "failed",
    Cancelled => "cancelled",
});

str_enum!(DiscoveredStatus, "status" {
    Pending => "pending",
    Saved => "saved",
    Dismissed => "dismissed",
    Promoted => "promoted",
});

/// How to treat free-text input that doesn't match a closed enum.
///
/// Lenient stores NULL for unrecognized values (the historical behavior);
/// strict rejects them at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    Lenient,
    Strict,
}

pub fn parse_optional<T: FromStr<Err = Error>>(
    input: &str,
    policy: ValidationPolicy,
) -> Result<Option<T>, Error> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<T>() {
        Ok(value) => Ok(Some(value)),
        Err(_) if policy == ValidationPolicy::Lenient => Ok(None),
        Err(e) => Err(e),
    }
}

// --- Entities ---

#[derive(Debug, Clone)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub website: Option<String>,
    pub sector: Option<Sector>,
    pub chain_focus: Option<String>,
    pub size: Option<CompanySize>,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewCompany {
    pub name: String,
    pub website: Option<String>,
    pub sector: Option<Sector>,
    pub chain_focus: Option<String>,
    pub size: Option<CompanySize>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: i64,
    pub company_id: i64,
    pub title: String,
    pub url: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub remote_status: Option<RemoteStatus>,
    pub date_posted: Option<String>,
    pub date_found: Option<String>,
    pub closing_date: Option<String>,
    pub status: JobStatus,
    pub source: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub company_id: i64,
    pub title: String,
    pub url: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub remote_status: Option<RemoteStatus>,
    pub date_posted: Option<String>,
    pub closing_date: Option<String>,
    pub status: JobStatus,
    pub source: Option<String>,
    pub notes: Option<String>,
}

impl Default for NewJob {
    fn default() -> Self {
        Self {
            company_id: 0,
            title: String::new(),
            url: None,
            salary_min: None,
            salary_max: None,
            remote_status: None,
            date_posted: None,
            closing_date: None,
            status: JobStatus::Open,
            source: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub date_applied: Option<String>,
    pub resume_version: Option<String>,
    pub cover_letter_sent: bool,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Interview {
    pub id: i64,
    pub application_id: i64,
    pub scheduled_at: Option<String>,
    pub kind: Option<InterviewType>,
    pub notes: Option<String>,
    pub outcome: Option<InterviewOutcome>,
}

#[derive(Debug, Clone)]
pub struct DiscoveredJob {
    pub id: i64,
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub url: Option<String>,
    pub requirements_raw: Option<String>,
    pub source: Option<String>,
    pub raw_response: Option<String>,
    pub discovered_at: Option<String>,
    pub status: DiscoveredStatus,
    pub promoted_to_job_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NewDiscoveredJob {
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub url: Option<String>,
    pub requirements_raw: Option<String>,
    pub source: Option<String>,
    pub raw_response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_round_trip() {
        assert_eq!("DeFi".parse::<Sector>().unwrap(), Sector::DeFi);
        assert_eq!(Sector::Nft.as_str(), "NFT");
        assert_eq!(
            "infrastructure".parse::<Sector>().unwrap(),
            Sector::Infrastructure
        );
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("REMOTE".parse::<RemoteStatus>().unwrap(), RemoteStatus::Remote);
        assert_eq!(
            "Nice-To-Have".parse::<Importance>().unwrap(),
            Importance::NiceToHave
        );
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let err = "moon-office".parse::<RemoteStatus>().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidValue { field: "remote_status", .. }
        ));
    }

    #[test]
    fn test_parse_optional_lenient_stores_none() {
        let parsed: Option<Sector> =
            parse_optional("GameFi", ValidationPolicy::Lenient).unwrap();
        assert_eq!(parsed, None);
    }

    #[test]
    fn test_parse_optional_strict_rejects() {
        let result: Result<Option<Sector>, _> =
            parse_optional("GameFi", ValidationPolicy::Strict);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_optional_empty_is_none() {
        let parsed: Option<CompanySize> =
            parse_optional("  ", ValidationPolicy::Strict).unwrap();
        assert_eq!(parsed, None);
    }

    #[test]
    fn test_discovered_status_display() {
        assert_eq!(DiscoveredStatus::Promoted.to_string(), "promoted");
        assert_eq!(DiscoveredStatus::Pending.to_string(), "pending");
    }
}

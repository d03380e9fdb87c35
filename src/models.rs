use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::BoardError;

/// Pipeline stage of an application. Serialized as its lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Wishlist = 0,
    Applied = 1,
    Interviewing = 2,
    Offer = 3,
    Rejected = 4,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Wishlist,
        Status::Applied,
        Status::Interviewing,
        Status::Offer,
        Status::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Wishlist => "wishlist",
            Status::Applied => "applied",
            Status::Interviewing => "interviewing",
            Status::Offer => "offer",
            Status::Rejected => "rejected",
        }
    }

    /// Position of this status in the board's column order.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Option<Status> {
        Status::ALL.get(self.index() + 1).copied()
    }

    pub fn prev(&self) -> Option<Status> {
        self.index().checked_sub(1).map(|i| Status::ALL[i])
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Status {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| BoardError::UnknownStatus(s.to_string()))
    }
}

/// One lane of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusColumn {
    pub id: Status,
    pub title: &'static str,
}

pub const COLUMNS: [StatusColumn; 5] = [
    StatusColumn { id: Status::Wishlist, title: "Wish List" },
    StatusColumn { id: Status::Applied, title: "Applied" },
    StatusColumn { id: Status::Interviewing, title: "Interviewing" },
    StatusColumn { id: Status::Offer, title: "Offer" },
    StatusColumn { id: Status::Rejected, title: "Rejected" },
];

pub fn column_for(status: Status) -> &'static StatusColumn {
    &COLUMNS[status.index()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredApplication")]
pub struct Application {
    pub id: String,
    pub company: String,
    pub position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: Status,
    pub application_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shape of a record as it may appear in storage. Browser-written snapshots
/// keep untouched form fields as "", including a cleared date.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredApplication {
    id: String,
    company: String,
    position: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    location: Option<String>,
    #[serde(default)]
    status: Status,
    #[serde(default, deserialize_with = "blank_date")]
    application_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    job_url: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    salary_range: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StoredApplication> for Application {
    fn from(stored: StoredApplication) -> Self {
        Self {
            application_date: stored
                .application_date
                .unwrap_or_else(|| stored.created_at.date_naive()),
            id: stored.id,
            company: stored.company,
            position: stored.position,
            location: stored.location,
            status: stored.status,
            job_url: stored.job_url,
            salary_range: stored.salary_range,
            notes: stored.notes,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

impl Application {
    /// Card-style date, e.g. `Mar 5, 2025`.
    pub fn display_date(&self) -> String {
        self.application_date.format("%b %-d, %Y").to_string()
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn blank_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match empty_as_none(deserializer)? {
        Some(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(de::Error::custom),
        None => Ok(None),
    }
}

/// What the form hands back on submit. Every text field is raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub company: String,
    pub position: String,
    pub location: String,
    pub status: Status,
    pub application_date: NaiveDate,
    pub job_url: String,
    pub salary_range: String,
    pub notes: String,
}

impl ApplicationDraft {
    /// Blank draft for the "add" button of a column.
    pub fn for_column(status: Status, today: NaiveDate) -> Self {
        Self {
            company: String::new(),
            position: String::new(),
            location: String::new(),
            status,
            application_date: today,
            job_url: String::new(),
            salary_range: String::new(),
            notes: String::new(),
        }
    }

    /// Builds the stored record. Required fields are trimmed, blank optional
    /// fields become `None`.
    pub fn into_application(
        self,
        id: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Application {
        Application {
            id,
            company: self.company.trim().to_string(),
            position: self.position.trim().to_string(),
            location: optional(self.location),
            status: self.status,
            application_date: self.application_date,
            job_url: optional(self.job_url),
            salary_range: optional(self.salary_range),
            notes: optional(self.notes),
            created_at,
            updated_at,
        }
    }
}

impl From<&Application> for ApplicationDraft {
    fn from(app: &Application) -> Self {
        Self {
            company: app.company.clone(),
            position: app.position.clone(),
            location: app.location.clone().unwrap_or_default(),
            status: app.status,
            application_date: app.application_date,
            job_url: app.job_url.clone().unwrap_or_default(),
            salary_range: app.salary_range.clone().unwrap_or_default(),
            notes: app.notes.clone().unwrap_or_default(),
        }
    }
}

fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

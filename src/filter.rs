//! Read-only projections of the application list: search, status, and the
//! per-column board view built from both.

use crate::models::{Application, COLUMNS, Status, StatusColumn};

/// Case-insensitive substring match on company or position. An empty term
/// matches everything.
pub fn matches_search(app: &Application, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    app.company.to_lowercase().contains(&needle) || app.position.to_lowercase().contains(&needle)
}

pub fn filter_by_search<'a>(apps: &'a [Application], term: &str) -> Vec<&'a Application> {
    apps.iter().filter(|a| matches_search(a, term)).collect()
}

pub fn filter_by_status<'a>(apps: &[&'a Application], status: Status) -> Vec<&'a Application> {
    apps.iter().copied().filter(|a| a.status == status).collect()
}

#[derive(Debug)]
pub struct ColumnView<'a> {
    pub column: &'static StatusColumn,
    pub applications: Vec<&'a Application>,
}

impl ColumnView<'_> {
    pub fn count(&self) -> usize {
        self.applications.len()
    }
}

/// Search first, then split into the five columns in board order.
pub fn board_view<'a>(apps: &'a [Application], term: &str) -> Vec<ColumnView<'a>> {
    let matching = filter_by_search(apps, term);
    COLUMNS
        .iter()
        .map(|column| ColumnView {
            column,
            applications: filter_by_status(&matching, column.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use std::collections::HashSet;

    fn app(id: &str, company: &str, position: &str, status: Status) -> Application {
        let now = Utc::now();
        Application {
            id: id.to_string(),
            company: company.to_string(),
            position: position.to_string(),
            location: None,
            status,
            application_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            job_url: None,
            salary_range: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample() -> Vec<Application> {
        vec![
            app("1", "Acme", "Backend Engineer", Status::Wishlist),
            app("2", "Globex", "Site Reliability", Status::Applied),
            app("3", "Initech", "Platform Engineer", Status::Applied),
            app("4", "Hooli", "Data Scientist", Status::Interviewing),
            app("5", "Acme Labs", "Researcher", Status::Offer),
            app("6", "Umbrella", "Security Engineer", Status::Rejected),
            app("7", "Müller GmbH", "Entwickler", Status::Wishlist),
        ]
    }

    #[test]
    fn test_search_is_case_insensitive_on_company_and_position() {
        let apps = sample();
        let ids = |term: &str| -> Vec<String> {
            filter_by_search(&apps, term).iter().map(|a| a.id.clone()).collect()
        };
        assert_eq!(ids("ACME"), ["1", "5"]);
        assert_eq!(ids("engineer"), ["1", "3", "6"]);
        assert_eq!(ids("müller"), ["7"]);
        assert_eq!(ids("MÜLLER"), ["7"]);
        assert!(ids("xyz").is_empty());
        assert_eq!(ids("").len(), apps.len());
    }

    #[test]
    fn test_search_does_not_look_at_other_fields() {
        let mut apps = sample();
        apps[1].notes = Some("acme referral".to_string());
        apps[1].location = Some("Acme City".to_string());
        assert_eq!(filter_by_search(&apps, "acme").len(), 2);
    }

    #[test]
    fn test_filter_by_status_keeps_order() {
        let apps = sample();
        let all: Vec<&Application> = apps.iter().collect();
        let applied: Vec<&str> = filter_by_status(&all, Status::Applied)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(applied, ["2", "3"]);
    }

    #[test]
    fn test_board_view_partitions_matching_records() {
        let apps = sample();
        for term in ["", "acme", "ENGINEER", "e", "zzz", "i"] {
            let view = board_view(&apps, term);
            assert_eq!(view.len(), COLUMNS.len());

            let mut seen = HashSet::new();
            for col in &view {
                for a in &col.applications {
                    assert_eq!(a.status, col.column.id);
                    assert!(seen.insert(a.id.clone()), "{} shown twice for {:?}", a.id, term);
                }
            }
            let expected: HashSet<String> = filter_by_search(&apps, term)
                .iter()
                .map(|a| a.id.clone())
                .collect();
            assert_eq!(seen, expected, "term {:?}", term);
        }
    }

    #[test]
    fn test_board_view_column_order_and_counts() {
        let apps = sample();
        let view = board_view(&apps, "");
        let titles: Vec<&str> = view.iter().map(|c| c.column.title).collect();
        assert_eq!(titles, ["Wish List", "Applied", "Interviewing", "Offer", "Rejected"]);
        let counts: Vec<usize> = view.iter().map(|c| c.count()).collect();
        assert_eq!(counts, [2, 2, 1, 1, 1]);
    }
}

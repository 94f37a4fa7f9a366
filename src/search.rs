use crate::issue::Issue;

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use sqlx::{Executor, Postgres};
use tracing_unwrap::OptionExt;

/// Body of the quick search form: one free text term matched across all text fields.
#[derive(Debug, Deserialize)]
pub(crate) struct QuickSearchForm {
    pub(crate) search: Option<String>
}

/// Query string of the field search: every filter is independently optional.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FieldSearchQuery {
    pub(crate) issue_title: Option<String>,
    pub(crate) issue_text: Option<String>,
    pub(crate) created_by: Option<String>,
    pub(crate) assigned_to: Option<String>,
    pub(crate) status: Option<String>,
    pub(crate) created_on: Option<String>
}

/// A fully resolved store predicate, ready to be rendered into sql and executed.
///
/// Absent filters are already normalized away at construction time: an empty
/// term becomes the `%%` pattern (matches every row) and an absent status or
/// date carries no clause at all, so running a predicate built from zero
/// parameters returns the whole collection.
#[derive(Debug)]
pub(crate) enum IssueQuery {
    Quick {
        pattern: String
    },
    Fields {
        title: String,
        text: String,
        reporter: String,
        assignee: String,
        open: Option<bool>,
        created: Option<(DateTime<Utc>, DateTime<Utc>)>
    }
}

impl IssueQuery {
    /// Case insensitive substring match of one term, or-ed across
    /// `issue_title`, `issue_text`, `created_by` and `assigned_to`.
    pub(crate) fn quick(term: &str) -> IssueQuery {
        IssueQuery::Quick {
            pattern: like_pattern(term)
        }
    }

    /// Per-field filters and-ed together; every absent filter leaves its field
    /// unrestricted, including rows where the field is absent entirely.
    pub(crate) fn fields(query: &FieldSearchQuery) -> IssueQuery {
        IssueQuery::Fields {
            title: like_pattern(query.issue_title.as_deref().unwrap_or_default()),
            text: like_pattern(query.issue_text.as_deref().unwrap_or_default()),
            reporter: like_pattern(query.created_by.as_deref().unwrap_or_default()),
            assignee: like_pattern(query.assigned_to.as_deref().unwrap_or_default()),
            open: status_filter(query.status.as_deref()),
            created: query.created_on.as_deref()
                .filter(|value| !value.is_empty())
                .map(day_window)
        }
    }

    fn sql(&self) -> String {
        match self {
            IssueQuery::Quick { .. } => {
                "select * from issues \
                where issue_title ilike $1 or issue_text ilike $1 or created_by ilike $1 or coalesce(assigned_to, '') ilike $1 \
                order by id".to_owned()
            }
            IssueQuery::Fields { open, created, .. } => {
                let mut sql = String::from(
                    "select * from issues \
                    where issue_title ilike $1 and issue_text ilike $2 and created_by ilike $3 and coalesce(assigned_to, '') ilike $4"
                );
                let mut placeholder = 5;

                if open.is_some() {
                    sql.push_str(format!(" and open = ${}", placeholder).as_str());
                    placeholder += 1;
                }

                if created.is_some() {
                    sql.push_str(format!(" and created_on >= ${} and created_on < ${}", placeholder, placeholder + 1).as_str());
                }

                sql.push_str(" order by id");
                sql
            }
        }
    }

    pub(crate) async fn fetch<'e, E: Executor<'e, Database = Postgres>>(&self, executor: E) -> Result<Vec<Issue>> {
        let sql = self.sql();

        let issues = match self {
            IssueQuery::Quick { pattern } => {
                sqlx::query_as::<_, Issue>(sql.as_str())
                    .bind(pattern)
                    .fetch_all(executor)
                    .await?
            }
            IssueQuery::Fields { title, text, reporter, assignee, open, created } => {
                let mut query = sqlx::query_as::<_, Issue>(sql.as_str())
                    .bind(title)
                    .bind(text)
                    .bind(reporter)
                    .bind(assignee);

                if let Some(open) = open {
                    query = query.bind(open);
                }

                if let Some((start, end)) = created {
                    query = query.bind(start).bind(end);
                }

                query.fetch_all(executor).await?
            }
        };

        Ok(issues)
    }
}

/// Wraps a term into a `%term%` ilike pattern, escaping the wildcard
/// characters so user input always matches literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');

    for character in term.chars() {
        if matches!(character, '\\' | '%' | '_') {
            pattern.push('\\');
        }

        pattern.push(character);
    }

    pattern.push('%');
    pattern
}

/// The literal "open" filters for open issues; every other non-empty literal
/// (including "closed") filters for closed ones.
fn status_filter(value: Option<&str>) -> Option<bool> {
    match value {
        None | Some("") => None,
        Some("open") => Some(true),
        Some(_) => Some(false)
    }
}

/// The half open window `[day start, next day start)` of the calendar day the
/// given value falls into, in Utc.
fn day_window(value: &str) -> (DateTime<Utc>, DateTime<Utc>) {
    // TODO: answer unparseable dates with a field-keyed validation error instead of quietly searching today
    let date_time = parse_timestamp(value).unwrap_or_else(Utc::now);

    let midnight = date_time.date_naive().and_hms_opt(0, 0, 0).unwrap_or_log();
    let start = Utc.from_utc_datetime(&midnight);

    (start, start + Duration::days(1))
}

/// Accepts a full rfc 3339 timestamp or a plain `2019-10-31` style date.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Some(date_time.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    use super::{day_window, like_pattern, parse_timestamp, status_filter, FieldSearchQuery, IssueQuery};

    #[test]
    fn empty_term_matches_everything() {
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn wildcard_characters_are_escaped() {
        assert_eq!(like_pattern("50%_done\\"), "%50\\%\\_done\\\\%");
        assert_eq!(like_pattern("title"), "%title%");
    }

    #[test]
    fn quick_search_ors_the_term_across_all_text_fields() {
        let query = IssueQuery::quick("crash");
        let sql = query.sql();

        assert!(sql.contains("issue_title ilike $1 or issue_text ilike $1"));
        assert!(sql.contains("created_by ilike $1 or coalesce(assigned_to, '') ilike $1"));
        assert_matches!(query, IssueQuery::Quick { pattern } if pattern == "%crash%");
    }

    #[test]
    fn zero_field_parameters_build_the_match_all_predicate() {
        let query = IssueQuery::fields(&FieldSearchQuery::default());

        assert_eq!(
            query.sql(),
            "select * from issues \
            where issue_title ilike $1 and issue_text ilike $2 and created_by ilike $3 and coalesce(assigned_to, '') ilike $4 \
            order by id"
        );

        assert_matches!(query, IssueQuery::Fields { title, text, reporter, assignee, open: None, created: None } => {
            assert_eq!(title, "%%");
            assert_eq!(text, "%%");
            assert_eq!(reporter, "%%");
            assert_eq!(assignee, "%%");
        });
    }

    #[test]
    fn status_literal_restricts_open() {
        assert_eq!(status_filter(None), None);
        assert_eq!(status_filter(Some("")), None);
        assert_eq!(status_filter(Some("open")), Some(true));
        assert_eq!(status_filter(Some("closed")), Some(false));
        assert_eq!(status_filter(Some("anything")), Some(false));
    }

    #[test]
    fn status_clause_is_appended_with_the_next_placeholder() {
        let query = IssueQuery::fields(&FieldSearchQuery {
            status: Some("open".to_owned()),
            ..FieldSearchQuery::default()
        });

        assert!(query.sql().contains(" and open = $5 order by id"));
    }

    #[test]
    fn date_clause_placeholders_shift_behind_the_status_clause() {
        let without_status = IssueQuery::fields(&FieldSearchQuery {
            created_on: Some("2019-10-31".to_owned()),
            ..FieldSearchQuery::default()
        });
        assert!(without_status.sql().contains(" and created_on >= $5 and created_on < $6 order by id"));

        let with_status = IssueQuery::fields(&FieldSearchQuery {
            status: Some("closed".to_owned()),
            created_on: Some("2019-10-31".to_owned()),
            ..FieldSearchQuery::default()
        });
        assert!(with_status.sql().contains(" and open = $5 and created_on >= $6 and created_on < $7 order by id"));
    }

    #[test]
    fn day_window_covers_one_calendar_day() {
        let (start, end) = day_window("2019-10-31");

        assert_eq!(start, Utc.with_ymd_and_hms(2019, 10, 31, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2019, 11, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn timestamps_inside_the_day_stay_in_the_same_window() {
        let (start, end) = day_window("2019-10-31T15:30:00Z");

        assert_eq!(start, Utc.with_ymd_and_hms(2019, 10, 31, 0, 0, 0).unwrap());
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn unparseable_date_degrades_to_today() {
        let (start, _) = day_window("halloween");

        assert_eq!(start.date_naive(), Utc::now().date_naive());
    }

    #[test]
    fn parse_timestamp_accepts_rfc_3339_and_plain_dates() {
        assert_eq!(
            parse_timestamp("2019-10-31T00:00:00.000Z"),
            Some(Utc.with_ymd_and_hms(2019, 10, 31, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2019-10-31"),
            Some(Utc.with_ymd_and_hms(2019, 10, 31, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("not a date"), None);
    }
}

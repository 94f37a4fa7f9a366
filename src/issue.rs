use crate::search::parse_timestamp;

use std::collections::HashMap;
use std::result::Result as StdResult;

use anyhow::Result;
use chrono::serde::ts_seconds;
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Postgres};

/// A single tracked issue as stored in the database.
#[derive(FromRow, Display, Debug, Serialize)]
#[display(fmt = "{}", issue_title)]
pub(crate) struct Issue {
    pub(crate) id: i32,

    pub(crate) issue_title: String,
    pub(crate) issue_text: String,

    pub(crate) created_by: String,
    pub(crate) assigned_to: Option<String>,

    #[serde(with = "ts_seconds")]
    pub(crate) created_on: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub(crate) updated_on: DateTime<Utc>,

    pub(crate) open: bool
}

impl Issue {
    pub(crate) async fn find<'e, E: Executor<'e, Database = Postgres>>(id: i32, executor: E) -> Result<Option<Issue>> {
        Ok(sqlx::query_as::<_, Issue>("select * from issues where id = $1 limit 1")
            .bind(id)
            .fetch_optional(executor)
            .await?)
    }

    pub(crate) async fn all<'e, E: Executor<'e, Database = Postgres>>(executor: E) -> Result<Vec<Issue>> {
        Ok(sqlx::query_as::<_, Issue>("select * from issues order by id desc")
            .fetch_all(executor)
            .await?)
    }

    /// Persists a validated submission and returns the stored row, id and defaults filled in.
    pub(crate) async fn create<'e, E: Executor<'e, Database = Postgres>>(new_issue: NewIssue, executor: E) -> Result<Issue> {
        Ok(sqlx::query_as::<_, Issue>(
            "insert into issues (issue_title, issue_text, created_by, assigned_to, created_on, updated_on, open) \
            values ($1, $2, $3, $4, $5, $6, $7) returning *"
        )
            .bind(new_issue.issue_title)
            .bind(new_issue.issue_text)
            .bind(new_issue.created_by)
            .bind(new_issue.assigned_to)
            .bind(new_issue.created_on)
            .bind(new_issue.updated_on)
            .bind(new_issue.open)
            .fetch_one(executor)
            .await?)
    }

    /// Sets `open` and bumps the modification stamp. Returns false if no issue has this id.
    pub(crate) async fn replace_status<'e, E: Executor<'e, Database = Postgres>>(id: i32, open: bool, executor: E) -> Result<bool> {
        let result = sqlx::query("update issues set open = $1, updated_on = $2 where id = $3")
            .bind(open)
            .bind(Utc::now())
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently removes the issue. Returns false if no issue has this id.
    pub(crate) async fn delete<'e, E: Executor<'e, Database = Postgres>>(id: i32, executor: E) -> Result<bool> {
        let result = sqlx::query("delete from issues where id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Raw creation input as it arrives from the add form or the Json api.
/// Everything is optional here; [validate](IssueSubmission::validate) decides what is acceptable.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct IssueSubmission {
    pub(crate) issue_title: Option<String>,
    pub(crate) issue_text: Option<String>,
    pub(crate) created_by: Option<String>,
    pub(crate) assigned_to: Option<String>,
    pub(crate) created_on: Option<String>,
    pub(crate) updated_on: Option<String>,
    pub(crate) status: Option<String>
}

/// A submission which passed validation and is ready to be inserted.
#[derive(Debug)]
pub(crate) struct NewIssue {
    pub(crate) issue_title: String,
    pub(crate) issue_text: String,
    pub(crate) created_by: String,
    pub(crate) assigned_to: Option<String>,
    pub(crate) created_on: DateTime<Utc>,
    pub(crate) updated_on: DateTime<Utc>,
    pub(crate) open: bool
}

impl IssueSubmission {
    /// Checks the required text fields and fills in defaults for everything else.
    ///
    /// On failure returns one message per offending field, keyed by field name,
    /// and nothing may be persisted.
    pub(crate) fn validate(self) -> StdResult<NewIssue, HashMap<String, String>> {
        let mut errors = HashMap::new();

        for (field, value) in [
            ("issue_title", &self.issue_title),
            ("issue_text", &self.issue_text),
            ("created_by", &self.created_by)
        ] {
            if value.as_deref().map_or(true, str::is_empty) {
                errors.insert(field.to_owned(), format!("{} is required", field));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let now = Utc::now();

        Ok(NewIssue {
            issue_title: self.issue_title.unwrap_or_default(),
            issue_text: self.issue_text.unwrap_or_default(),
            created_by: self.created_by.unwrap_or_default(),
            assigned_to: self.assigned_to.filter(|assignee| !assignee.is_empty()),
            created_on: submitted_timestamp(self.created_on.as_deref()).unwrap_or(now),
            updated_on: submitted_timestamp(self.updated_on.as_deref()).unwrap_or(now),
            open: match self.status.as_deref() {
                None | Some("open") => true,
                Some(_) => false
            }
        })
    }
}

fn submitted_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value.filter(|value| !value.is_empty()).and_then(parse_timestamp)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::IssueSubmission;

    fn filled_submission() -> IssueSubmission {
        IssueSubmission {
            issue_title: Some("Title".to_owned()),
            issue_text: Some("text".to_owned()),
            created_by: Some("Reporter".to_owned()),
            assigned_to: Some("Assignee".to_owned()),
            created_on: Some("2019-10-31T00:00:00.000Z".to_owned()),
            updated_on: Some("2019-10-31T00:00:00.000Z".to_owned()),
            status: Some("open".to_owned())
        }
    }

    #[test]
    fn valid_submission_echoes_every_field() {
        let new_issue = filled_submission().validate().unwrap();

        assert_eq!(new_issue.issue_title, "Title");
        assert_eq!(new_issue.issue_text, "text");
        assert_eq!(new_issue.created_by, "Reporter");
        assert_eq!(new_issue.assigned_to.as_deref(), Some("Assignee"));
        assert_eq!(new_issue.created_on, Utc.with_ymd_and_hms(2019, 10, 31, 0, 0, 0).unwrap());
        assert!(new_issue.open);
    }

    #[test]
    fn missing_required_fields_are_reported_per_field() {
        let errors = IssueSubmission::default().validate().unwrap_err();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("issue_title").map(String::as_str), Some("issue_title is required"));
        assert!(errors.contains_key("issue_text"));
        assert!(errors.contains_key("created_by"));
    }

    #[test]
    fn empty_required_field_counts_as_missing() {
        let submission = IssueSubmission {
            issue_title: Some(String::new()),
            ..filled_submission()
        };

        let errors = submission.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key("issue_title"));
    }

    #[test]
    fn empty_assignee_is_stored_as_absent() {
        let submission = IssueSubmission {
            assigned_to: Some(String::new()),
            ..filled_submission()
        };

        assert_matches!(submission.validate(), Ok(new_issue) if new_issue.assigned_to.is_none());
    }

    #[test]
    fn omitted_timestamps_default_to_creation_time() {
        let submission = IssueSubmission {
            created_on: None,
            updated_on: None,
            ..filled_submission()
        };

        let before = Utc::now();
        let new_issue = submission.validate().unwrap();

        assert!(new_issue.created_on >= before);
        assert_eq!(new_issue.created_on, new_issue.updated_on);
    }

    #[test]
    fn status_literal_controls_open() {
        let closed = IssueSubmission {
            status: Some("closed".to_owned()),
            ..filled_submission()
        };
        assert_matches!(closed.validate(), Ok(new_issue) if !new_issue.open);

        let unspecified = IssueSubmission {
            status: None,
            ..filled_submission()
        };
        assert_matches!(unspecified.validate(), Ok(new_issue) if new_issue.open);
    }
}

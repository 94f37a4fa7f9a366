use crate::issue::Issue;

use anyhow::Result;
use chrono::Utc;
use serde::Deserialize;
use sqlx::{Executor, Postgres};

/// Body of the edit form. The editable fields are enumerated statically;
/// anything else a client submits is dropped at deserialization.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct EditSubmission {
    pub(crate) issue_title: Option<String>,
    pub(crate) issue_text: Option<String>,
    pub(crate) created_by: Option<String>,
    pub(crate) assigned_to: Option<String>
}

/// The fields a partial update will actually write.
///
/// Submitted empty values are dropped, with one exception: an empty
/// `assigned_to` is kept and clears the assignee. An empty changeset means
/// "no fields to update" and must not touch the store at all.
#[derive(Debug, Default, Eq, PartialEq)]
pub(crate) struct Changeset {
    pub(crate) issue_title: Option<String>,
    pub(crate) issue_text: Option<String>,
    pub(crate) created_by: Option<String>,
    pub(crate) assigned_to: Option<String>
}

impl Changeset {
    pub(crate) fn resolve(submission: EditSubmission) -> Changeset {
        Changeset {
            issue_title: submitted(submission.issue_title),
            issue_text: submitted(submission.issue_text),
            created_by: submitted(submission.created_by),
            assigned_to: submission.assigned_to
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self == &Changeset::default()
    }

    fn sql(&self) -> String {
        let mut assignments = Vec::with_capacity(5);
        let mut placeholder = 1;

        for (column, value) in [
            ("issue_title", &self.issue_title),
            ("issue_text", &self.issue_text),
            ("created_by", &self.created_by),
            ("assigned_to", &self.assigned_to)
        ] {
            if value.is_some() {
                assignments.push(format!("{} = ${}", column, placeholder));
                placeholder += 1;
            }
        }

        assignments.push(format!("updated_on = ${}", placeholder));

        format!("update issues set {} where id = ${} returning *", assignments.join(", "), placeholder + 1)
    }

    /// Merges the changeset into the stored record, stamping `updated_on`.
    /// Returns the post-update record, or None if no issue has this id.
    pub(crate) async fn apply<'e, E: Executor<'e, Database = Postgres>>(&self, id: i32, executor: E) -> Result<Option<Issue>> {
        let sql = self.sql();
        let mut query = sqlx::query_as::<_, Issue>(sql.as_str());

        if let Some(title) = &self.issue_title {
            query = query.bind(title);
        }

        if let Some(text) = &self.issue_text {
            query = query.bind(text);
        }

        if let Some(reporter) = &self.created_by {
            query = query.bind(reporter);
        }

        if let Some(assignee) = &self.assigned_to {
            // An empty assignee clears the column
            query = query.bind(if assignee.is_empty() { None } else { Some(assignee.as_str()) });
        }

        Ok(query.bind(Utc::now()).bind(id).fetch_optional(executor).await?)
    }
}

fn submitted(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Changeset, EditSubmission};

    #[test]
    fn empty_submission_resolves_to_the_empty_changeset() {
        let changeset = Changeset::resolve(EditSubmission::default());
        assert!(changeset.is_empty());
    }

    #[test]
    fn blank_values_are_not_updates() {
        let submission = EditSubmission {
            issue_title: Some(String::new()),
            issue_text: Some(String::new()),
            created_by: Some(String::new()),
            assigned_to: None
        };

        assert!(Changeset::resolve(submission).is_empty());
    }

    #[test]
    fn single_field_submission_changes_only_that_field() {
        let submission = EditSubmission {
            issue_title: Some("New title".to_owned()),
            ..EditSubmission::default()
        };

        let changeset = Changeset::resolve(submission);

        assert_eq!(changeset.issue_title.as_deref(), Some("New title"));
        assert_eq!(changeset.issue_text, None);
        assert_eq!(changeset.created_by, None);
        assert_eq!(changeset.assigned_to, None);
    }

    #[test]
    fn blank_assignee_still_counts_as_an_update() {
        let submission = EditSubmission {
            assigned_to: Some(String::new()),
            ..EditSubmission::default()
        };

        let changeset = Changeset::resolve(submission);

        assert!(!changeset.is_empty());
        assert_eq!(changeset.assigned_to.as_deref(), Some(""));
    }

    #[test]
    fn update_sql_numbers_the_submitted_fields() {
        let changeset = Changeset {
            issue_title: Some("New title".to_owned()),
            assigned_to: Some("Assignee".to_owned()),
            ..Changeset::default()
        };

        assert_eq!(
            changeset.sql(),
            "update issues set issue_title = $1, assigned_to = $2, updated_on = $3 where id = $4 returning *"
        );
    }

    #[test]
    fn update_sql_always_stamps_the_modification_time() {
        let changeset = Changeset {
            issue_text: Some("New text".to_owned()),
            ..Changeset::default()
        };

        assert_eq!(
            changeset.sql(),
            "update issues set issue_text = $1, updated_on = $2 where id = $3 returning *"
        );
    }
}

use crate::issue::Issue;

use anyhow::Result;
use tera::Context;

pub(crate) trait ContextExtensions {
    /// Inserts a single [Issue] into the current context. The template can then
    /// access it via the `issue` Tera variable.
    fn insert_issue(&mut self, issue: &Issue) -> Result<()>;

    /// Inserts a list of [Issue]s into the current context, together with its
    /// length, as the `issues` and `count` Tera variables.
    fn insert_issues(&mut self, issues: &[Issue]) -> Result<()>;
}

impl ContextExtensions for Context {
    fn insert_issue(&mut self, issue: &Issue) -> Result<()> {
        self.try_insert("issue", issue)?;

        Ok(())
    }

    fn insert_issues(&mut self, issues: &[Issue]) -> Result<()> {
        self.try_insert("issues", issues)?;
        self.try_insert("count", &issues.len())?;

        Ok(())
    }
}

use std::fmt;

use crate::error::ValidationError;

/// Credentials and coordinates of the target repository.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct RepoAccess {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl RepoAccess {
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
        }
    }

    /// Reject blank credentials or coordinates. Runs before any network call.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing: Vec<&'static str> = [
            ("token", &self.token),
            ("owner", &self.owner),
            ("repo", &self.repo),
            ("branch", &self.branch),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(missing))
        }
    }

    /// `owner/repo`, used in log lines.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Debug for RepoAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoAccess")
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .finish()
    }
}

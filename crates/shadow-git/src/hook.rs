//! Parsing of git `post-receive` hook input

use std::str::FromStr;

use git2::Oid;

use crate::{Error, Result, WORKSPACE_BRANCH_PREFIX};

/// One `<old> <new> <ref>` line from a post-receive hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUpdate {
    pub old: Oid,
    pub new: Oid,
    pub refname: String,
}

impl RefUpdate {
    /// Stream branch named by this update, if it names one.
    pub fn branch(&self) -> Option<&str> {
        self.refname
            .strip_prefix("refs/heads/")
            .filter(|name| !name.starts_with(WORKSPACE_BRANCH_PREFIX))
    }

    pub fn is_create(&self) -> bool {
        self.old.is_zero() && !self.new.is_zero()
    }

    pub fn is_delete(&self) -> bool {
        self.new.is_zero()
    }
}

impl FromStr for RefUpdate {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let malformed = || Error::MalformedHookLine {
            line: line.to_string(),
        };

        let mut parts = line.split_whitespace();
        let (Some(old), Some(new), Some(refname), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        Ok(Self {
            old: Oid::from_str(old).map_err(|_| malformed())?,
            new: Oid::from_str(new).map_err(|_| malformed())?,
            refname: refname.to_string(),
        })
    }
}

/// Parse every non-blank line of post-receive input.
pub fn parse_post_receive(input: &str) -> Result<Vec<RefUpdate>> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::parse)
        .collect()
}

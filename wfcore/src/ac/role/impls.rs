use std::fmt;
use super::*;

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.codename)
    }
}

impl PermissionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn roles(mut self, roles: impl IntoIterator<Item = i64>) -> Self {
        self.roles = Some(roles.into_iter().collect());
        self
    }

    pub fn permissions(mut self, permissions: impl IntoIterator<Item = i64>) -> Self {
        self.permissions = Some(permissions.into_iter().collect());
        self
    }

    /// True when the filter can never match any grant.
    pub fn is_empty_match(&self) -> bool {
        matches!(&self.roles, Some(v) if v.is_empty())
            || matches!(&self.permissions, Some(v) if v.is_empty())
    }
}

use std::{
    fmt,
    str::FromStr,
};
use crate::{
    ac::user::{
        Group,
        User,
    },
    error::ValueError,
};
use super::{
    Principal,
    PrincipalKind,
};

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Principal::User(user)
    }
}

impl From<Group> for Principal {
    fn from(group: Group) -> Self {
        Principal::Group(group)
    }
}

impl Principal {
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::User(_) => PrincipalKind::User,
            Principal::Group(_) => PrincipalKind::Group,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Principal::User(User { id, .. }) => *id,
            Principal::Group(Group { id, .. }) => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Principal::User(User { name, .. }) => name,
            Principal::Group(Group { name, .. }) => name,
        }
    }
}

impl From<PrincipalKind> for &'static str {
    fn from(kind: PrincipalKind) -> &'static str {
        match kind {
            PrincipalKind::User => "user",
            PrincipalKind::Group => "group",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(<&'static str>::from(*self))
    }
}

impl FromStr for PrincipalKind {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(PrincipalKind::User),
            "group" => Ok(PrincipalKind::Group),
            s => Err(ValueError::Unsupported(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;
    use crate::ac::user::Group;
    use super::*;

    #[test]
    fn smoke() -> anyhow::Result<()> {
        assert_eq!(PrincipalKind::User.to_string(), "user");
        assert_eq!(PrincipalKind::Group, PrincipalKind::from_str("group")?);
        assert!(matches!(
            PrincipalKind::from_str("robot")
                .expect_err("should be an error"),
            ValueError::Unsupported(s) if s == "robot",
        ));

        let principal: Principal = Group {
            id: 3,
            name: "editors".to_string(),
            created_ts: 0,
        }.into();
        assert_eq!(principal.kind(), PrincipalKind::Group);
        assert_eq!(principal.id(), 3);
        assert_eq!(principal.name(), "editors");
        Ok(())
    }
}

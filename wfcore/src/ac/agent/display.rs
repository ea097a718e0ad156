use std::fmt::{
    Display,
    Formatter,
    Result,
};

use crate::ac::{
    principal::Principal,
    user::{
        Group,
        User,
    },
};
use super::Agent;

impl Display for Agent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Agent::Anonymous => write!(f, "<Agent:Anonymous>"),
            Agent::User(User { name, .. }) => write!(f, "<User:{name}>"),
        }
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Principal::User(User { name, .. }) => write!(f, "<User:{name}>"),
            Principal::Group(Group { name, .. }) => write!(f, "<Group:{name}>"),
        }
    }
}

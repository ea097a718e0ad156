use crate::ac::user::User;
use super::Agent;

impl From<User> for Agent {
    fn from(user: User) -> Agent {
        Agent::User(user)
    }
}

impl From<&Agent> for Option<i64> {
    fn from(agent: &Agent) -> Self {
        match agent {
            Agent::Anonymous => None,
            Agent::User(User { id, .. }) => Some(*id),
        }
    }
}

impl From<Agent> for Option<String> {
    fn from(agent: Agent) -> Self {
        match agent {
            Agent::Anonymous => None,
            Agent::User(User { name, .. }) => Some(name),
        }
    }
}

impl Agent {
    pub fn user_id(&self) -> Option<i64> {
        self.into()
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Agent::Anonymous => None,
            Agent::User(User { name, .. }) => Some(name.as_str()),
        }
    }
}

use std::ops::{
    Deref,
    DerefMut,
};
use super::*;

impl From<Vec<State>> for States {
    fn from(args: Vec<State>) -> Self {
        Self(args)
    }
}

impl<const N: usize> From<[State; N]> for States {
    fn from(args: [State; N]) -> Self {
        Self(args.into())
    }
}

impl Deref for States {
    type Target = Vec<State>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for States {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl IntoIterator for States {
    type Item = State;
    type IntoIter = std::vec::IntoIter<State>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<Vec<Transition>> for Transitions {
    fn from(args: Vec<Transition>) -> Self {
        Self(args)
    }
}

impl<const N: usize> From<[Transition; N]> for Transitions {
    fn from(args: [Transition; N]) -> Self {
        Self(args.into())
    }
}

impl Deref for Transitions {
    type Target = Vec<Transition>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Transitions {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl IntoIterator for Transitions {
    type Item = Transition;
    type IntoIter = std::vec::IntoIter<Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl State {
    /// The alias if one is set, otherwise the name.
    pub fn label(&self) -> &str {
        self.alias
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.name)
    }
}

impl States {
    pub fn by_name(&self, name: &str) -> Option<&State> {
        self.0.iter().find(|s| s.name == name)
    }

    pub fn by_id(&self, id: i64) -> Option<&State> {
        self.0.iter().find(|s| s.id == id)
    }
}

impl Transitions {
    pub fn by_name(&self, name: &str) -> Option<&Transition> {
        self.0.iter().find(|t| t.name == name)
    }

    pub fn contains_id(&self, id: i64) -> bool {
        self.0.iter().any(|t| t.id == id)
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|t| t.name.as_str()).collect()
    }
}

impl<'a> From<&'a Transition> for TransitionRef<'a> {
    fn from(transition: &'a Transition) -> Self {
        TransitionRef::Transition(transition)
    }
}

impl<'a> From<&'a str> for TransitionRef<'a> {
    fn from(name: &'a str) -> Self {
        TransitionRef::Name(name)
    }
}

impl From<i64> for TransitionRef<'_> {
    fn from(id: i64) -> Self {
        TransitionRef::Id(id)
    }
}

impl TransitionRef<'_> {
    /// Whether the reference names the given transition.
    pub fn matches(&self, transition: &Transition) -> bool {
        match self {
            TransitionRef::Transition(t) => t.id == transition.id,
            TransitionRef::Id(id) => *id == transition.id,
            TransitionRef::Name(name) => *name == transition.name,
        }
    }
}

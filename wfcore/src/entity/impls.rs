use std::fmt;
use crate::ac::{
    principal::Principal,
    user::{
        Group,
        User,
    },
};
use super::*;

impl EntityRef {
    pub fn new(kind: impl Into<String>, id: i64) -> Self {
        Self { kind: kind.into(), id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl From<&dyn WorkflowAware> for EntityRef {
    fn from(entity: &dyn WorkflowAware) -> Self {
        entity.entity_ref()
    }
}

impl From<EntityRef> for BindingTarget {
    fn from(entity: EntityRef) -> Self {
        BindingTarget::Object(entity)
    }
}

impl From<&EntityRef> for BindingTarget {
    fn from(entity: &EntityRef) -> Self {
        BindingTarget::Object(entity.clone())
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Attribute::Null => f.write_str("Null"),
            Attribute::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Attribute::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Attribute::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Attribute::Principal(v) => f.debug_tuple("Principal").field(v).finish(),
            Attribute::List(v) => f.debug_tuple("List").field(v).finish(),
            Attribute::Object(_) => f.write_str("Object(..)"),
            Attribute::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

impl From<User> for Attribute {
    fn from(user: User) -> Self {
        Attribute::Principal(Principal::User(user))
    }
}

impl From<Group> for Attribute {
    fn from(group: Group) -> Self {
        Attribute::Principal(Principal::Group(group))
    }
}

impl<T: Into<Attribute>> From<Option<T>> for Attribute {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Attribute::Null)
    }
}

impl<T: Into<Attribute>> From<Vec<T>> for Attribute {
    fn from(value: Vec<T>) -> Self {
        Attribute::List(value.into_iter().map(Into::into).collect())
    }
}

impl Attribute {
    /// Values that cause a role binding rule to be skipped.
    pub fn is_falsy(&self) -> bool {
        match self {
            Attribute::Null => true,
            Attribute::Bool(v) => !v,
            Attribute::Int(v) => *v == 0,
            Attribute::Text(v) => v.is_empty(),
            Attribute::List(v) => v.is_empty(),
            Attribute::Principal(_)
                | Attribute::Object(_)
                | Attribute::Callable(_) => false,
        }
    }

    /// Invokes the value if it is callable, repeatedly, until a plain
    /// value is produced.
    pub fn evaluate(self) -> Attribute {
        let mut value = self;
        while let Attribute::Callable(f) = value {
            value = f();
        }
        value
    }

    /// A short name for the kind of value held, for error reporting.
    pub fn type_name(&self) -> &'static str {
        match self {
            Attribute::Null => "null",
            Attribute::Bool(_) => "bool",
            Attribute::Int(_) => "int",
            Attribute::Text(_) => "text",
            Attribute::Principal(_) => "principal",
            Attribute::List(_) => "list",
            Attribute::Object(_) => "object",
            Attribute::Callable(_) => "callable",
        }
    }
}

/// Walks a dotted attribute path starting at `source`.
///
/// Returns `None` if a segment is missing or an intermediate value
/// cannot be descended into.  Callable intermediates and the terminal
/// value are invoked before use.
pub fn resolve_path(source: &dyn AttributeSource, path: &str) -> Option<Attribute> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut value = source.attribute(first)?.evaluate();
    for segment in segments {
        value = match value {
            Attribute::Object(next) => next.attribute(segment)?.evaluate(),
            _ => return None,
        };
    }
    Some(value)
}

#[cfg(test)]
mod test {
    use super::*;

    struct Meta;

    impl AttributeSource for Meta {
        fn attribute(&self, name: &str) -> Option<Attribute> {
            match name {
                "creator" => Some(alice().into()),
                _ => None,
            }
        }
    }

    struct Source;

    impl AttributeSource for Source {
        fn attribute(&self, name: &str) -> Option<Attribute> {
            match name {
                "owner" => Some(alice().into()),
                "nobody" => Some(Attribute::Null),
                "count" => Some(Attribute::Int(3)),
                "lazy" => Some(Attribute::Callable(Box::new(|| alice().into()))),
                "meta" => Some(Attribute::Object(Box::new(Meta))),
                _ => None,
            }
        }
    }

    fn alice() -> User {
        User { id: 1, name: "alice".to_string(), created_ts: 0 }
    }

    #[test]
    fn entity_ref_display() {
        assert_eq!(EntityRef::new("publication", 12).to_string(), "publication:12");
    }

    #[test]
    fn falsy() {
        assert!(Attribute::Null.is_falsy());
        assert!(Attribute::Bool(false).is_falsy());
        assert!(Attribute::Int(0).is_falsy());
        assert!(Attribute::Text(String::new()).is_falsy());
        assert!(Attribute::List(vec![]).is_falsy());
        assert!(!Attribute::Int(2).is_falsy());
        assert!(!Attribute::from(alice()).is_falsy());
        assert!(Attribute::from(None::<User>).is_falsy());
    }

    #[test]
    fn path_walk() {
        let source = Source;
        assert!(matches!(
            resolve_path(&source, "owner"),
            Some(Attribute::Principal(Principal::User(u))) if u.name == "alice",
        ));
        assert!(matches!(
            resolve_path(&source, "lazy"),
            Some(Attribute::Principal(Principal::User(u))) if u.id == 1,
        ));
        assert!(matches!(
            resolve_path(&source, "meta.creator"),
            Some(Attribute::Principal(_)),
        ));
        assert!(matches!(resolve_path(&source, "nobody"), Some(Attribute::Null)));
        assert!(resolve_path(&source, "missing").is_none());
        assert!(resolve_path(&source, "meta.missing").is_none());
        assert!(resolve_path(&source, "count.value").is_none());
    }
}

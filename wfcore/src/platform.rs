use crate::{
    ac::traits::{
        PermissionBackend,
        PrincipalBackend,
    },
    history::traits::HistoryBackend,
    workflow::traits::{
        BindingBackend,
        DefinitionBackend,
        TransitionBackend,
    },
};

mod connector;
pub use connector::ConnectorOption;

pub trait PlatformUrl {
    fn url(&self) -> &str;
}

/// WfPlatform - Workflow Platform
///
/// This platform persists workflow definitions, the bindings of entities
/// to workflows and their states, the history ledger, and the role and
/// permission data the workflows project onto.
///
/// This trait is applicable to everything that correctly implements the
/// relevant backends that compose this trait.
pub trait WfPlatform: DefinitionBackend
    + BindingBackend
    + TransitionBackend
    + HistoryBackend
    + PermissionBackend
    + PrincipalBackend

    + PlatformUrl

    + Send
    + Sync
{
    fn as_dyn(&self) -> &dyn WfPlatform;
}

pub trait DefaultWfPlatform: WfPlatform {}

impl<P: DefinitionBackend
    + BindingBackend
    + TransitionBackend
    + HistoryBackend
    + PermissionBackend
    + PrincipalBackend

    + PlatformUrl

    + DefaultWfPlatform

    + Send
    + Sync
> WfPlatform for P {
    fn as_dyn(&self) -> &dyn WfPlatform {
        self
    }
}

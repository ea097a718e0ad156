use parking_lot::RwLock;
use std::sync::Arc;
use wfcore::{
    config::WorkflowConfigs,
    platform::WfPlatform,
};
use wfrbac::Builder as RbacBuilder;

use crate::{
    cache::WorkflowCache,
    error::Error,
};

#[derive(Default)]
pub struct Builder {
    wf_platform: Option<Box<dyn WfPlatform>>,
    rbac_builder: RbacBuilder,
    configs: WorkflowConfigs,
}

/// The workflow engine.
///
/// Ties together the persisted definitions, bindings and history of a
/// `WfPlatform`, the declarative workflow configuration for the entity
/// kinds it knows about, and the enforcer used to answer permission
/// checks.
pub struct Platform {
    wf_platform: Box<dyn WfPlatform>,
    rbac_builder: RbacBuilder,
    configs: RwLock<WorkflowConfigs>,
    cache: WorkflowCache,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wf_platform(mut self, val: impl WfPlatform + 'static) -> Self {
        self.wf_platform = Some(Box::new(val));
        self
    }

    pub fn boxed_wf_platform(mut self, val: Box<dyn WfPlatform>) -> Self {
        self.wf_platform = Some(val);
        self
    }

    pub fn rbac_builder(mut self, val: RbacBuilder) -> Self {
        self.rbac_builder = val;
        self
    }

    pub fn configs(mut self, val: WorkflowConfigs) -> Self {
        self.configs = val;
        self
    }

    pub fn build(self) -> Result<Arc<Platform>, Error> {
        Ok(Arc::new(Platform {
            wf_platform: self.wf_platform
                .ok_or(Error::Builder("wf_platform"))?,
            rbac_builder: self.rbac_builder,
            configs: RwLock::new(self.configs),
            cache: WorkflowCache::default(),
        }))
    }
}

impl Platform {
    pub fn wf_platform(&self) -> &dyn WfPlatform {
        self.wf_platform.as_ref()
    }
}

mod impls;

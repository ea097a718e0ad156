use std::sync::Arc;
use wfctrl::platform::{
    Builder,
    Platform,
};
use wfrbac::Builder as RbacBuilder;

use crate::{
    core::publication_configs,
    sqlite::create_sqlite_backend,
};

/// An engine over an in-memory backend, configured with the
/// publication workflow.
pub async fn create_sqlite_platform() -> anyhow::Result<Arc<Platform>> {
    create_sqlite_platform_with(RbacBuilder::new()).await
}

pub async fn create_sqlite_platform_with(
    rbac_builder: RbacBuilder,
) -> anyhow::Result<Arc<Platform>> {
    Ok(Builder::new()
        .wf_platform(create_sqlite_backend().await?)
        .rbac_builder(rbac_builder)
        .configs(publication_configs())
        .build()?)
}

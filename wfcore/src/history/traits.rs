use async_trait::async_trait;
use crate::{
    entity::EntityRef,
    error::BackendError,
};
use super::{
    History,
    HistoryOrder,
};

#[async_trait]
pub trait HistoryBackend {
    async fn append_history(
        &self,
        entity: &EntityRef,
        state_id: i64,
        transition_id: Option<i64>,
        actor_id: Option<i64>,
        comment: Option<&str>,
    ) -> Result<i64, BackendError>;
    /// Ordered by timestamp, ties broken by insertion order.
    async fn list_history(
        &self,
        entity: &EntityRef,
        order: HistoryOrder,
    ) -> Result<History, BackendError>;
    async fn list_history_for_actor(
        &self,
        entity: &EntityRef,
        actor_id: i64,
        order: HistoryOrder,
    ) -> Result<History, BackendError>;
}

use wfcore::{
    ac::agent::Agent,
    entity::EntityRef,
    history::{
        History,
        HistoryOrder,
    },
    workflow::{
        State,
        Transition,
    },
};

use crate::{
    error::Error,
    platform::Platform,
};

// History ledger
impl Platform {
    pub async fn history_for(
        &self,
        entity: &EntityRef,
        order: HistoryOrder,
    ) -> Result<History, Error> {
        Ok(self.wf_platform.list_history(entity, order).await?)
    }

    /// History entries recorded with the actor.  An anonymous actor
    /// has none.
    pub async fn history_for_actor(
        &self,
        entity: &EntityRef,
        actor: &Agent,
        order: HistoryOrder,
    ) -> Result<History, Error> {
        match actor.user_id() {
            Some(actor_id) => Ok(self.wf_platform
                .list_history_for_actor(entity, actor_id, order)
                .await?),
            None => Ok(History::default()),
        }
    }

    /// Records a state change that was carried out elsewhere.
    pub async fn append_history(
        &self,
        entity: &EntityRef,
        state: &State,
        transition: Option<&Transition>,
        actor: &Agent,
        comment: Option<&str>,
    ) -> Result<i64, Error> {
        Ok(self.wf_platform.append_history(
            entity,
            state.id,
            transition.map(|transition| transition.id),
            actor.user_id(),
            comment,
        ).await?)
    }
}

use serde::{Deserialize, Serialize};

/// An immutable record of a state change for an entity.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct HistoryRecord {
    pub id: i64,
    pub kind: String,
    pub entity_id: i64,
    pub state_id: i64,
    /// `None` for the record of the initial state.
    pub transition_id: Option<i64>,
    pub actor_id: Option<i64>,
    pub created_ts: i64,
    pub comment: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub enum HistoryOrder {
    #[default]
    RecentFirst,
    Chronological,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct History(Vec<HistoryRecord>);

mod impls;
pub mod traits;

use parking_lot::RwLock;
use std::collections::HashMap;
use wfcore::workflow::Workflow;

/// Workflows resolved through the type binding, keyed by entity kind.
///
/// Entries are dropped whenever the type binding for the kind changes.
#[derive(Debug, Default)]
pub(crate) struct WorkflowCache(RwLock<HashMap<String, Workflow>>);

impl WorkflowCache {
    pub(crate) fn get(&self, kind: &str) -> Option<Workflow> {
        self.0.read().get(kind).cloned()
    }

    pub(crate) fn insert(&self, kind: &str, workflow: Workflow) {
        self.0.write().insert(kind.to_string(), workflow);
    }

    pub(crate) fn invalidate(&self, kind: &str) {
        if self.0.write().remove(kind).is_some() {
            log::trace!("invalidated cached workflow for {kind}");
        }
    }

    /// Drops every entry; used when a workflow definition itself changes.
    pub(crate) fn clear(&self) {
        self.0.write().clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_invalidate() {
        let cache = WorkflowCache::default();
        let workflow = Workflow {
            id: 1,
            name: "PUBLICATION_WORKFLOW".to_string(),
            initial_state_id: None,
        };
        assert_eq!(cache.get("app.Publication"), None);
        cache.insert("app.Publication", workflow.clone());
        cache.insert("app.Document", workflow.clone());
        assert_eq!(cache.get("app.Publication"), Some(workflow.clone()));
        cache.invalidate("app.Publication");
        assert_eq!(cache.get("app.Publication"), None);
        assert_eq!(cache.get("app.Document"), Some(workflow));
        cache.clear();
        assert_eq!(cache.get("app.Document"), None);
    }
}

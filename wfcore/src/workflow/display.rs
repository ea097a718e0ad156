use std::fmt::{
    Display,
    Formatter,
    Result,
};
use super::*;

impl Display for Workflow {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(&self.name)
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{} ({})", self.label(), self.workflow_name)
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn state() {
        let mut state = State {
            id: 1,
            name: "private".to_string(),
            alias: Some("Private".to_string()),
            workflow_id: 1,
            workflow_name: "PUBLICATION_WORKFLOW".to_string(),
        };
        assert_eq!(state.to_string(), "Private (PUBLICATION_WORKFLOW)");
        state.alias = None;
        assert_eq!(state.to_string(), "private (PUBLICATION_WORKFLOW)");
    }
}

use mockall::mock;
use serde_json::json;
use wfcore::{
    ac::{
        principal::Principal,
        user::User,
    },
    config::WorkflowConfigs,
    entity::{
        Attribute,
        AttributeSource,
        WorkflowAware,
    },
};

pub const PUBLICATION_KIND: &str = "app.Publication";

mock! {
    pub Source {}

    impl AttributeSource for Source {
        fn attribute(&self, name: &str) -> Option<Attribute>;
    }
}

/// The two state publication workflow: Private (initial) and Public.
pub fn publication_config_json() -> serde_json::Value {
    json!({
        PUBLICATION_KIND: {
            "name": "PUBLICATION_WORKFLOW",
            "roles": ["Anonymous", "Owner"],
            "permissions": [
                {"name": "View", "codename": "view"},
                {"name": "Edit", "codename": "edit"},
            ],
            "initial_state": {
                "name": "Private",
                "state_perm_relation": [
                    {"role": "Owner", "permission": "view"},
                    {"role": "Owner", "permission": "edit"},
                ],
            },
            "states": [
                {
                    "name": "Public",
                    "state_perm_relation": [
                        {"role": "Owner", "permission": "view"},
                    ],
                },
            ],
            "transitions": [
                {
                    "name": "Make public",
                    "destination": "Public",
                    "permission": "edit",
                    "description": "Make Public Transition",
                    "condition": "another_make_public_check",
                },
                {
                    "name": "Make private",
                    "destination": "Private",
                    "permission": "view",
                    "description": "Make Private Transition",
                    "condition": "another_make_private_check",
                },
            ],
            "state_transitions": {
                "Private": ["Make public"],
                "Public": ["Make private"],
            },
            "user_roles": [
                {"user_path": "owner", "role": "Owner"},
            ],
        }
    })
}

pub fn publication_configs() -> WorkflowConfigs {
    WorkflowConfigs::try_from(&publication_config_json())
        .expect("publication config must be valid")
}

/// A sample workflow-aware entity.
#[derive(Debug, Default)]
pub struct Publication {
    pub id: i64,
    pub title: String,
    pub owner: Option<User>,
    pub editors: Vec<Principal>,
    pub state_id: Option<i64>,
}

impl Publication {
    pub fn new(id: i64, title: &str, owner: Option<User>) -> Self {
        Self {
            id,
            title: title.to_string(),
            owner,
            .. Default::default()
        }
    }
}

impl WorkflowAware for Publication {
    fn kind(&self) -> &str {
        PUBLICATION_KIND
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn current_state_id(&self) -> Option<i64> {
        self.state_id
    }

    fn set_current_state_id(&mut self, state_id: Option<i64>) {
        self.state_id = state_id;
    }
}

impl AttributeSource for Publication {
    fn attribute(&self, name: &str) -> Option<Attribute> {
        match name {
            "id" => Some(Attribute::Int(self.id)),
            "title" => Some(Attribute::Text(self.title.clone())),
            "owner" => Some(self.owner.clone().into()),
            "editors" => Some(Attribute::List(
                self.editors
                    .iter()
                    .cloned()
                    .map(Attribute::Principal)
                    .collect()
            )),
            "get_owner" => {
                let owner = self.owner.clone();
                Some(Attribute::Callable(Box::new(move || owner.clone().into())))
            }
            _ => None,
        }
    }
}

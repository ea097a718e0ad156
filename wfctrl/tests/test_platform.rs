use serde_json::json;
use wfcore::{
    ac::{
        agent::Agent,
        principal::Principal,
    },
    config::WorkflowConfigs,
    entity::{
        Attribute,
        AttributeSource,
        BindingTarget,
        EntityRef,
        WorkflowAware,
    },
    error::ConfigurationError,
    history::HistoryOrder,
    workflow::Workflow,
};
use wfctrl::{
    error::Error,
    platform::Platform,
};

use test_wf::{
    core::{
        MockSource,
        PUBLICATION_KIND,
        Publication,
        publication_config_json,
    },
    ctrl::create_sqlite_platform,
};

const NOTE_KIND: &str = "app.Note";

#[derive(Debug, Default)]
struct Note {
    id: i64,
    state_id: Option<i64>,
}

impl WorkflowAware for Note {
    fn kind(&self) -> &str {
        NOTE_KIND
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

impl AttributeSource for Note {
    fn attribute(&self, _: &str) -> Option<Attribute> {
        None
    }
}

/// A publication whose attributes come from a mock.
struct Mocked {
    id: i64,
    state_id: Option<i64>,
    source: MockSource,
}

impl WorkflowAware for Mocked {
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

impl AttributeSource for Mocked {
    fn attribute(&self, name: &str) -> Option<Attribute> {
        self.source.attribute(name)
    }
}

/// Draft -> Done through "Finish", plus "Comment" which stays put.
async fn create_review_workflow(platform: &Platform) -> anyhow::Result<Workflow> {
    let workflow = platform.create_workflow("REVIEW_WORKFLOW").await?;
    let draft = platform.add_state(&workflow, "Draft", None).await?;
    let done = platform.add_state(&workflow, "Done", None).await?;
    let finish = platform.add_transition(
        &workflow, "Finish", Some(&done), None, None, None,
    ).await?;
    let comment = platform.add_transition(
        &workflow, "Comment", None, None, None, Some("Leave a comment"),
    ).await?;
    platform.link_state_transition(&draft, &finish).await?;
    platform.link_state_transition(&draft, &comment).await?;
    Ok(platform.set_workflow_initial_state(&workflow, &draft).await?)
}

#[async_std::test]
async fn publication_lifecycle() -> anyhow::Result<()> {
    let platform = create_sqlite_platform().await?;
    let alice = platform.create_user("alice").await?;
    let bob = platform.create_user("bob").await?;
    let alice_agent: Agent = alice.clone().into();
    let bob_agent: Agent = bob.clone().into();

    let mut publication = Publication::new(1, "Paper", Some(alice.clone()));
    let entity = publication.entity_ref();
    let state = platform.on_create(&mut publication, &alice_agent, Some("created"))
        .await?
        .expect("publication must have an initial state");
    assert_eq!(state.name, "Private");
    assert_eq!(publication.state_id, Some(state.id));
    assert!(platform.is_in_state(&entity, "Private").await?);

    assert_eq!(
        platform.allowed_transitions(&entity, &alice_agent).await?.names(),
        ["Make public"],
    );
    assert!(platform.allowed_transitions(&entity, &bob_agent).await?.is_empty());
    assert!(platform.allowed_transitions(&entity, &Agent::Anonymous).await?.is_empty());
    assert!(platform.has_permission(&entity, &alice_agent, "edit").await?);
    assert!(!platform.has_permission(&entity, &bob_agent, "view").await?);

    // denied attempts leave no trace
    assert!(!platform.attempt_transition(
        &mut publication, "Make public", &bob_agent, None,
    ).await?);
    assert!(!platform.attempt_transition(
        &mut publication, "Make private", &alice_agent, None,
    ).await?);
    assert!(!platform.attempt_transition(
        &mut publication, "No such transition", &alice_agent, None,
    ).await?);
    assert_eq!(publication.state_id, Some(state.id));
    assert_eq!(platform.history_for(&entity, HistoryOrder::default()).await?.len(), 1);

    assert!(platform.attempt_transition(
        &mut publication, "Make public", &alice_agent, Some("ready"),
    ).await?);
    let public = platform.resolve_state(&entity).await?
        .expect("publication still has a state");
    assert_eq!(public.name, "Public");
    assert_eq!(publication.state_id, Some(public.id));
    assert!(!platform.has_permission(&entity, &alice_agent, "edit").await?);
    assert!(platform.has_permission(&entity, &alice_agent, "view").await?);
    assert_eq!(
        platform.allowed_transitions(&entity, &alice_agent).await?.names(),
        ["Make private"],
    );

    let history = platform.history_for(&entity, HistoryOrder::RecentFirst).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].state_id, public.id);
    assert_eq!(history[0].actor_id, Some(alice.id));
    assert_eq!(history[0].comment.as_deref(), Some("ready"));
    assert!(history[0].transition_id.is_some());
    assert_eq!(history[1].state_id, state.id);
    assert_eq!(history[1].transition_id, None);

    let history = platform.history_for(&entity, HistoryOrder::Chronological).await?;
    assert_eq!(history[0].comment.as_deref(), Some("created"));

    Ok(())
}

#[async_std::test]
async fn history_is_per_entity_and_actor() -> anyhow::Result<()> {
    let platform = create_sqlite_platform().await?;
    let alice = platform.create_user("alice").await?;
    let bob = platform.create_user("bob").await?;
    let alice_agent: Agent = alice.clone().into();
    let bob_agent: Agent = bob.clone().into();

    let mut first = Publication::new(1, "First", Some(alice.clone()));
    let mut second = Publication::new(2, "Second", Some(bob.clone()));
    platform.on_create(&mut first, &alice_agent, None).await?;
    platform.on_create(&mut second, &bob_agent, None).await?;
    assert!(platform.attempt_transition(
        &mut first, "Make public", &alice_agent, None,
    ).await?);

    let first_ref = first.entity_ref();
    let second_ref = second.entity_ref();
    assert_eq!(platform.history_for(&first_ref, HistoryOrder::RecentFirst).await?.len(), 2);
    assert_eq!(platform.history_for(&second_ref, HistoryOrder::RecentFirst).await?.len(), 1);
    assert_eq!(
        platform.history_for_actor(&first_ref, &alice_agent, HistoryOrder::RecentFirst)
            .await?
            .len(),
        2,
    );
    assert!(platform.history_for_actor(&first_ref, &bob_agent, HistoryOrder::RecentFirst)
        .await?
        .is_empty());
    assert!(platform.history_for_actor(&first_ref, &Agent::Anonymous, HistoryOrder::RecentFirst)
        .await?
        .is_empty());

    // a forced state change is not recorded
    let workflow = platform.resolve_workflow(&second_ref).await?
        .expect("publication has a workflow");
    let public = platform.state_by_name(&workflow, "Public").await?
        .expect("workflow has a Public state");
    platform.set_state(&mut second, &public).await?;
    assert_eq!(second.state_id, Some(public.id));
    assert!(platform.is_in_state(&second_ref, "Public").await?);
    assert_eq!(platform.history_for(&second_ref, HistoryOrder::RecentFirst).await?.len(), 1);
    assert!(!platform.has_permission(&second_ref, &bob_agent, "edit").await?);

    let initial = platform.set_initial_state(&mut second).await?
        .expect("workflow has an initial state");
    assert_eq!(initial.name, "Private");
    assert!(platform.has_permission(&second_ref, &bob_agent, "edit").await?);
    assert_eq!(platform.history_for(&second_ref, HistoryOrder::RecentFirst).await?.len(), 1);

    let id = platform.append_history(
        &second_ref, &initial, None, &bob_agent, Some("imported"),
    ).await?;
    let history = platform.history_for(&second_ref, HistoryOrder::RecentFirst).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, id);

    Ok(())
}

#[async_std::test]
async fn config_rebuild_is_idempotent() -> anyhow::Result<()> {
    let platform = create_sqlite_platform().await?;
    let config = platform.workflow_config(PUBLICATION_KIND)
        .expect("publication config is loaded");
    let first = platform.create_workflow_from_config(PUBLICATION_KIND, &config).await?;
    let second = platform.create_workflow_from_config(PUBLICATION_KIND, &config).await?;
    assert_eq!(first.id, second.id);
    assert_eq!(platform.workflows().await?.len(), 1);
    assert_eq!(platform.states(&first).await?.len(), 2);
    assert_eq!(platform.workflow_permissions(&first).await?.len(), 2);
    let private = platform.initial_state(&first).await?
        .expect("workflow has an initial state");
    assert_eq!(private.name, "Private");
    assert_eq!(platform.state_transitions(&private).await?.names(), ["Make public"]);

    assert_eq!(
        platform.workflow_for_kind(PUBLICATION_KIND).await?.map(|w| w.id),
        Some(first.id),
    );
    assert_eq!(platform.workflow_for_kind(NOTE_KIND).await?, None);

    assert!(matches!(
        platform.add_state(&first, "Private", Some("Hidden")).await,
        Err(Error::Configuration(ConfigurationError::Conflict { kind: "state", .. }))
    ));
    let public = platform.state_by_name(&first, "Public").await?
        .expect("workflow has a Public state");
    assert!(matches!(
        platform.add_transition(&first, "Make public", Some(&public), None, None, None).await,
        Err(Error::Configuration(ConfigurationError::Conflict { kind: "transition", .. }))
    ));

    let review = create_review_workflow(&platform).await?;
    let done = platform.state_by_name(&review, "Done").await?
        .expect("review has a Done state");
    assert!(matches!(
        platform.add_transition(&first, "Finish", Some(&done), None, None, None).await,
        Err(Error::Configuration(ConfigurationError::CrossWorkflow { .. }))
    ));
    let finish = platform.transition_by_name(&review, "Finish").await?
        .expect("review has a Finish transition");
    assert!(matches!(
        platform.link_state_transition(&private, &finish).await,
        Err(Error::Configuration(ConfigurationError::CrossWorkflow { .. }))
    ));

    Ok(())
}

#[async_std::test]
async fn final_and_active_states() -> anyhow::Result<()> {
    let platform = create_sqlite_platform().await?;
    let review = create_review_workflow(&platform).await?;
    let names = |states: wfcore::workflow::States| states
        .iter()
        .map(|state| state.name.clone())
        .collect::<Vec<_>>();
    assert_eq!(names(platform.states(&review).await?), ["Draft", "Done"]);
    assert_eq!(names(platform.final_states(&review).await?), ["Done"]);
    assert_eq!(names(platform.active_states(&review).await?), ["Draft"]);
    Ok(())
}

#[async_std::test]
async fn object_binding() -> anyhow::Result<()> {
    let platform = create_sqlite_platform().await?;
    let alice = platform.create_user("alice").await?;
    let alice_agent: Agent = alice.clone().into();
    let review = create_review_workflow(&platform).await?;

    assert!(!platform.bind_workflow_by_name(
        EntityRef::new(PUBLICATION_KIND, 1), "NO_SUCH_WORKFLOW",
    ).await?);

    let mut publication = Publication::new(1, "Paper", Some(alice.clone()));
    let entity = publication.entity_ref();
    assert!(platform.bind_workflow_by_name(&entity, "REVIEW_WORKFLOW").await?);
    assert_eq!(
        platform.resolve_workflow(&entity).await?.map(|w| w.id),
        Some(review.id),
    );
    assert!(platform.is_in_state(&entity, "Draft").await?);
    assert_eq!(platform.objects_for_workflow(&review).await?, [entity.clone()]);

    // the state from the binding is kept, and the configured roles are
    // bound even though the configured workflow was never built
    let state = platform.on_create(&mut publication, &alice_agent, None).await?
        .expect("publication has a state");
    assert_eq!(state.name, "Draft");
    assert_eq!(publication.state_id, Some(state.id));
    assert!(platform.role_by_name("Owner").await?.is_some());
    assert_eq!(platform.on_save(&publication).await?, 0);

    // binding again is a no-op
    platform.bind_workflow(&entity, &review).await?;
    assert_eq!(platform.history_for(&entity, HistoryOrder::RecentFirst).await?.len(), 1);

    let mut other = Publication::new(2, "Other", Some(alice.clone()));
    platform.on_create(&mut other, &alice_agent, None).await?;
    assert!(platform.is_in_state(&other.entity_ref(), "Private").await?);
    let publication_workflow = platform.workflow_by_name("PUBLICATION_WORKFLOW").await?
        .expect("publication workflow was built on first use");
    assert_eq!(
        platform.objects_for_workflow(&publication_workflow).await?,
        [other.entity_ref()],
    );

    platform.unbind_workflow(&entity).await?;
    assert_eq!(
        platform.resolve_workflow(&entity).await?.map(|w| w.id),
        Some(publication_workflow.id),
    );
    assert!(platform.is_in_state(&entity, "Private").await?);
    assert!(platform.objects_for_workflow(&review).await?.is_empty());

    Ok(())
}

#[async_std::test]
async fn unbind_kind() -> anyhow::Result<()> {
    let platform = create_sqlite_platform().await?;
    let review = create_review_workflow(&platform).await?;
    let kind = BindingTarget::Kind(NOTE_KIND.to_string());

    let mut note = Note { id: 1, .. Default::default() };
    assert_eq!(platform.on_create(&mut note, &Agent::Anonymous, None).await?, None);
    assert_eq!(note.state_id, None);

    platform.bind_workflow(kind.clone(), &review).await?;
    let state = platform.on_create(&mut note, &Agent::Anonymous, None).await?
        .expect("note now has a workflow");
    assert_eq!(state.name, "Draft");
    assert_eq!(platform.objects_for_workflow(&review).await?, [note.entity_ref()]);

    platform.unbind_workflow(kind).await?;
    assert_eq!(platform.resolve_workflow(&note.entity_ref()).await?, None);
    assert_eq!(platform.resolve_state(&note.entity_ref()).await?, None);
    assert!(platform.objects_for_workflow(&review).await?.is_empty());

    Ok(())
}

#[async_std::test]
async fn transition_without_destination() -> anyhow::Result<()> {
    let platform = create_sqlite_platform().await?;
    let review = create_review_workflow(&platform).await?;
    platform.bind_workflow(BindingTarget::Kind(NOTE_KIND.to_string()), &review).await?;

    let mut note = Note { id: 1, .. Default::default() };
    let entity = note.entity_ref();
    let draft = platform.on_create(&mut note, &Agent::Anonymous, None).await?
        .expect("note has a state");
    assert_eq!(
        platform.allowed_transitions(&entity, &Agent::Anonymous).await?.names(),
        ["Finish", "Comment"],
    );

    assert!(platform.attempt_transition(
        &mut note, "Comment", &Agent::Anonymous, Some("looks fine"),
    ).await?);
    assert_eq!(note.state_id, Some(draft.id));
    let history = platform.history_for(&entity, HistoryOrder::RecentFirst).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].state_id, draft.id);
    assert_eq!(history[0].actor_id, None);

    let finish = platform.transition_by_name(&review, "Finish").await?
        .expect("review has a Finish transition");
    assert!(platform.attempt_transition(
        &mut note, &finish, &Agent::Anonymous, None,
    ).await?);
    assert!(platform.is_in_state(&entity, "Done").await?);
    assert!(platform.allowed_transitions(&entity, &Agent::Anonymous).await?.is_empty());
    assert!(!platform.attempt_transition(
        &mut note, finish.id, &Agent::Anonymous, None,
    ).await?);

    Ok(())
}

#[async_std::test]
async fn guarded_transitions() -> anyhow::Result<()> {
    let platform = create_sqlite_platform().await?;
    let alice = platform.create_user("alice").await?;
    let alice_agent: Agent = alice.clone().into();
    let mut publication = Publication::new(1, "Paper", Some(alice.clone()));
    let entity = publication.entity_ref();
    platform.on_create(&mut publication, &alice_agent, None).await?;

    let failing = |transition: &wfcore::workflow::Transition| {
        transition.condition.as_deref() != Some("another_make_public_check")
    };
    assert!(platform.allowed_transitions_guarded(&entity, &alice_agent, failing)
        .await?
        .is_empty());
    assert!(!platform.attempt_transition_guarded(
        &mut publication, "Make public", &alice_agent, None, failing,
    ).await?);
    assert!(platform.is_in_state(&entity, "Private").await?);

    assert!(platform.attempt_transition_guarded(
        &mut publication, "Make public", &alice_agent, None, |_| true,
    ).await?);
    assert!(platform.is_in_state(&entity, "Public").await?);

    Ok(())
}

#[async_std::test]
async fn group_roles() -> anyhow::Result<()> {
    let platform = create_sqlite_platform().await?;
    let alice = platform.create_user("alice").await?;
    let bob = platform.create_user("bob").await?;
    let bob_agent: Agent = bob.clone().into();
    let editors = platform.create_group("editors").await?;
    assert!(platform.add_user_to_group(&bob, &editors).await?);
    assert!(!platform.add_user_to_group(&bob, &editors).await?);
    assert_eq!(platform.groups_for_user(&bob).await?, [editors.clone()]);

    let mut publication = Publication::new(1, "Paper", Some(alice.clone()));
    let entity = publication.entity_ref();
    platform.on_create(&mut publication, &alice.clone().into(), None).await?;
    assert!(!platform.has_permission(&entity, &bob_agent, "edit").await?);

    let owner = platform.role_by_name("Owner").await?
        .expect("Owner role was registered from config");
    let group = Principal::Group(editors.clone());
    assert!(platform.add_local_role(&entity, &group, &owner).await?);
    assert!(platform.has_permission(&entity, &bob_agent, "edit").await?);
    assert_eq!(
        platform.allowed_transitions(&entity, &bob_agent).await?.names(),
        ["Make public"],
    );
    assert!(platform.remove_local_role(&entity, &group, &owner).await?);
    assert!(!platform.has_permission(&entity, &bob_agent, "edit").await?);

    // a global role applies everywhere
    assert!(platform.add_role(&group, &owner).await?);
    assert!(platform.has_permission(&entity, &bob_agent, "edit").await?);

    platform.reset(&entity).await?;
    assert!(!platform.has_permission(&entity, &alice.into(), "edit").await?);

    Ok(())
}

#[async_std::test]
async fn role_binding() -> anyhow::Result<()> {
    let platform = create_sqlite_platform().await?;
    let alice = platform.create_user("alice").await?;
    let bob = platform.create_user("bob").await?;
    let bob_agent: Agent = bob.clone().into();

    let mut publication = Publication::new(1, "Paper", None);
    let entity = publication.entity_ref();
    platform.on_create(&mut publication, &Agent::Anonymous, None).await?;
    assert!(!platform.has_permission(&entity, &alice.clone().into(), "edit").await?);

    publication.owner = Some(bob.clone());
    assert_eq!(platform.on_save(&publication).await?, 1);
    assert_eq!(platform.on_save(&publication).await?, 0);
    assert!(platform.has_permission(&entity, &bob_agent, "edit").await?);

    let mut source = MockSource::new();
    source.expect_attribute()
        .times(1)
        .returning(|_| Some(Attribute::Text("bob".to_string())));
    let mocked = Mocked { id: 2, state_id: None, source };
    assert!(matches!(
        platform.bind_roles(&mocked).await,
        Err(Error::TypeMismatch { found: "text", .. })
    ));

    let mut source = MockSource::new();
    source.expect_attribute()
        .times(1)
        .returning(|_| Some(Attribute::Null));
    let mocked = Mocked { id: 3, state_id: None, source };
    assert_eq!(platform.bind_roles(&mocked).await?, 0);

    Ok(())
}

#[async_std::test]
async fn role_binding_sequences_and_callables() -> anyhow::Result<()> {
    let platform = create_sqlite_platform().await?;
    let mut config = publication_config_json();
    config[PUBLICATION_KIND]["user_roles"] = json!([
        {"user_path": "editors", "role": "Owner"},
        {"user_path": "get_owner", "role": "Owner"},
    ]);
    platform.load_workflow_config(WorkflowConfigs::try_from(&config)?);

    let alice = platform.create_user("alice").await?;
    let bob = platform.create_user("bob").await?;
    let carol = platform.create_user("carol").await?;
    let dave = platform.create_user("dave").await?;
    let reviewers = platform.create_group("reviewers").await?;
    platform.add_user_to_group(&carol, &reviewers).await?;

    let mut publication = Publication::new(1, "Paper", Some(alice.clone()));
    publication.editors = vec![
        Principal::User(bob.clone()),
        Principal::Group(reviewers.clone()),
    ];
    let entity = publication.entity_ref();
    platform.on_create(&mut publication, &Agent::Anonymous, None).await?;
    for user in [&alice, &bob, &carol] {
        assert!(platform.has_permission(&entity, &user.clone().into(), "edit").await?);
    }
    assert!(!platform.has_permission(&entity, &dave.clone().into(), "edit").await?);
    assert_eq!(platform.on_save(&publication).await?, 0);

    // one bad element rejects the whole sequence
    let mut source = MockSource::new();
    let editor = bob.clone();
    source.expect_attribute()
        .times(1)
        .returning(move |_| Some(Attribute::List(vec![
            Attribute::Principal(Principal::User(editor.clone())),
            Attribute::Int(7),
        ])));
    let mut mocked = Mocked { id: 2, state_id: None, source };
    assert!(matches!(
        platform.on_create(&mut mocked, &Agent::Anonymous, None).await,
        Err(Error::TypeMismatch { found: "int", .. })
    ));
    let mocked_ref = mocked.entity_ref();
    assert!(platform.is_in_state(&mocked_ref, "Private").await?);
    assert!(!platform.has_permission(&mocked_ref, &bob.clone().into(), "edit").await?);

    Ok(())
}

#[async_std::test]
async fn concurrent_attempts() -> anyhow::Result<()> {
    let platform = create_sqlite_platform().await?;
    let alice = platform.create_user("alice").await?;
    let alice_agent: Agent = alice.clone().into();
    let mut publication = Publication::new(1, "Paper", Some(alice.clone()));
    let entity = publication.entity_ref();
    let private = platform.on_create(&mut publication, &alice_agent, None).await?
        .expect("publication has a state");

    let mut taken = 0;
    for _ in 0..20 {
        platform.set_state(&mut publication, &private).await?;
        let mut first = Publication::new(1, "Paper", Some(alice.clone()));
        let mut second = Publication::new(1, "Paper", Some(alice.clone()));
        let (first, second) = futures::join!(
            platform.attempt_transition(&mut first, "Make public", &alice_agent, None),
            platform.attempt_transition(&mut second, "Make public", &alice_agent, None),
        );
        let (first, second) = (first?, second?);
        assert!(!(first && second));
        assert_eq!(platform.is_in_state(&entity, "Public").await?, first || second);
        taken += (first || second) as usize;
    }

    let history = platform.history_for(&entity, HistoryOrder::Chronological).await?;
    assert_eq!(
        history.iter().filter(|record| record.transition_id.is_some()).count(),
        taken,
    );

    Ok(())
}

use pretty_assertions::assert_eq;
use storybook_core::{
    update, AppState, ArtifactRef, Effect, FailureKind, FormSubmission, Msg, SubmissionOutcome,
    Url, ViewState,
};

fn artifact(id: u64) -> ArtifactRef {
    ArtifactRef {
        id,
        url: Url::parse(&format!("file:///tmp/story-{id}.html")).unwrap(),
    }
}

fn submit_and_resolve(state: AppState, outcome: SubmissionOutcome) -> (AppState, Vec<Effect>) {
    let action = Url::parse("http://localhost:8000/create_kids_book/").unwrap();
    let (state, _) = update(state, Msg::FormSubmitted(FormSubmission::new(action)));
    let submission_id = state.in_flight().expect("submission in flight");
    update(
        state,
        Msg::SubmissionResolved {
            submission_id,
            outcome,
        },
    )
}

#[test]
fn new_page_revokes_previous_page() {
    let (state, effects) = submit_and_resolve(AppState::new(), SubmissionOutcome::Page(artifact(1)));
    assert!(effects.is_empty());

    let (state, effects) = submit_and_resolve(state, SubmissionOutcome::Page(artifact(2)));
    assert_eq!(effects, vec![Effect::RevokeArtifact { artifact_id: 1 }]);
    assert_eq!(state.active_artifact(), Some(&artifact(2)));
}

#[test]
fn previous_page_stays_live_while_new_submission_is_processing() {
    let (state, _) = submit_and_resolve(AppState::new(), SubmissionOutcome::Page(artifact(1)));
    let action = Url::parse("http://localhost:8000/create_kids_book/").unwrap();
    let (state, effects) = update(state, Msg::FormSubmitted(FormSubmission::new(action)));

    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::RevokeArtifact { .. })));
    assert_eq!(state.active_artifact(), Some(&artifact(1)));
}

#[test]
fn error_after_page_revokes_it() {
    let (state, _) = submit_and_resolve(AppState::new(), SubmissionOutcome::Page(artifact(3)));
    let (state, effects) =
        submit_and_resolve(state, SubmissionOutcome::Failed(FailureKind::Application));

    assert_eq!(effects, vec![Effect::RevokeArtifact { artifact_id: 3 }]);
    assert_eq!(state.active_artifact(), None);
}

#[test]
fn story_after_page_revokes_it() {
    let (state, _) = submit_and_resolve(AppState::new(), SubmissionOutcome::Page(artifact(5)));
    let (_state, effects) = submit_and_resolve(
        state,
        SubmissionOutcome::Story {
            composite_story: "Once".to_string(),
            illustrations: Vec::new(),
        },
    );

    assert_eq!(effects, vec![Effect::RevokeArtifact { artifact_id: 5 }]);
}

#[test]
fn teardown_revokes_live_artifact_and_hides_panels() {
    let (state, _) = submit_and_resolve(AppState::new(), SubmissionOutcome::Page(artifact(7)));
    let (mut state, effects) = update(state, Msg::TornDown);

    assert_eq!(effects, vec![Effect::RevokeArtifact { artifact_id: 7 }]);
    let view = state.view();
    assert_eq!(view.view_state, ViewState::Idle);
    assert!(!view.processing_visible);
    assert!(!view.results_visible);
    assert!(state.consume_dirty());
}

#[test]
fn teardown_of_idle_state_is_quiet() {
    let (mut state, effects) = update(AppState::new(), Msg::TornDown);

    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
}

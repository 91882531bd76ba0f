use std::sync::Once;

use pretty_assertions::assert_eq;
use storybook_core::{
    update, AppState, ArtifactRef, Effect, FailureKind, FormField, FormSubmission, Msg,
    SubmissionOutcome, Url, ViewState,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(storybook_logging::initialize_for_tests);
}

fn story_form(text: &str) -> FormSubmission {
    let action = Url::parse("http://localhost:8000/create_kids_book/").unwrap();
    FormSubmission::new(action).with_field(FormField::text("story", text))
}

fn artifact(id: u64) -> ArtifactRef {
    ArtifactRef {
        id,
        url: Url::parse(&format!("file:///tmp/story-{id}.html")).unwrap(),
    }
}

#[test]
fn both_panels_hidden_before_first_submit() {
    init_logging();
    let view = AppState::new().view();

    assert_eq!(view.view_state, ViewState::Idle);
    assert!(!view.processing_visible);
    assert!(!view.results_visible);
}

#[test]
fn submit_shows_processing_and_posts_form() {
    init_logging();
    let form = story_form("A dragon learns to bake");
    let (mut state, effects) = update(AppState::new(), Msg::FormSubmitted(form.clone()));
    let view = state.view();

    assert_eq!(view.view_state, ViewState::Processing);
    assert!(view.processing_visible);
    assert!(!view.results_visible);
    assert_eq!(view.in_flight, Some(1));
    assert!(state.consume_dirty());
    assert_eq!(
        effects,
        vec![Effect::PostForm {
            submission_id: 1,
            submission: form,
        }]
    );
}

#[test]
fn submit_never_requests_anything_but_a_background_post() {
    init_logging();
    let (state, first) = update(AppState::new(), Msg::FormSubmitted(story_form("one")));
    let (_state, second) = update(state, Msg::FormSubmitted(story_form("two")));

    for effect in first.iter().chain(second.iter()) {
        assert!(
            matches!(
                effect,
                Effect::PostForm { .. } | Effect::CancelSubmission { .. }
            ),
            "unexpected effect {effect:?}"
        );
    }
}

#[test]
fn second_submit_supersedes_the_first() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::FormSubmitted(story_form("one")));
    let (state, effects) = update(state, Msg::FormSubmitted(story_form("two")));

    assert_eq!(state.in_flight(), Some(2));
    assert_eq!(
        effects,
        vec![
            Effect::CancelSubmission { submission_id: 1 },
            Effect::PostForm {
                submission_id: 2,
                submission: story_form("two"),
            },
        ]
    );
}

#[test]
fn stale_resolution_leaves_view_in_processing() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::FormSubmitted(story_form("one")));
    let (mut state, _) = update(state, Msg::FormSubmitted(story_form("two")));
    assert!(state.consume_dirty());

    let (mut state, effects) = update(
        state,
        Msg::SubmissionResolved {
            submission_id: 1,
            outcome: SubmissionOutcome::Failed(FailureKind::Network),
        },
    );

    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
    assert_eq!(state.view_state(), ViewState::Processing);
    assert_eq!(state.in_flight(), Some(2));
}

#[test]
fn stale_page_resolution_revokes_its_artifact() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::FormSubmitted(story_form("one")));
    let (state, _) = update(state, Msg::FormSubmitted(story_form("two")));

    let (state, effects) = update(
        state,
        Msg::SubmissionResolved {
            submission_id: 1,
            outcome: SubmissionOutcome::Page(artifact(9)),
        },
    );

    assert_eq!(effects, vec![Effect::RevokeArtifact { artifact_id: 9 }]);
    assert_eq!(state.active_artifact(), None);
}

#[test]
fn later_resolution_of_current_submission_wins_regardless_of_order() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::FormSubmitted(story_form("one")));
    let (state, _) = update(state, Msg::FormSubmitted(story_form("two")));

    let (state, _) = update(
        state,
        Msg::SubmissionResolved {
            submission_id: 2,
            outcome: SubmissionOutcome::Story {
                composite_story: "second".to_string(),
                illustrations: Vec::new(),
            },
        },
    );
    let (state, _) = update(
        state,
        Msg::SubmissionResolved {
            submission_id: 1,
            outcome: SubmissionOutcome::Story {
                composite_story: "first".to_string(),
                illustrations: Vec::new(),
            },
        },
    );

    assert_eq!(state.view().story.text(), "second");
    assert_eq!(state.in_flight(), None);
}

#[test]
fn teardown_cancels_in_flight_submission() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::FormSubmitted(story_form("one")));
    let (state, effects) = update(state, Msg::TornDown);

    assert_eq!(effects, vec![Effect::CancelSubmission { submission_id: 1 }]);
    assert_eq!(state.view_state(), ViewState::Idle);
    assert_eq!(state.in_flight(), None);
}

//! Controller behavior against an in-memory repository.

mod support;

use std::sync::Arc;

use post_core::{
    drive_focus, ApiError, DetailContent, Field, FocusAware, FormMode, FormState, ImageRef,
    Navigator, Outcome, PickResult, PostApp, PostDetailController, PostFormController, PostId,
    PostListController, PostPayload, Route, Screen, SkipReason, StackNavigator, ValidationError,
};
use support::{
    post, post_with_image, wait_until, Call, FakeRepository, NavEvent, RecordingNavigator,
    ScriptedPicker,
};

fn list(repo: &Arc<FakeRepository>, nav: &Arc<RecordingNavigator>) -> PostListController {
    PostListController::new(repo.clone(), nav.clone())
}

fn detail(
    id: &str,
    repo: &Arc<FakeRepository>,
    nav: &Arc<RecordingNavigator>,
) -> PostDetailController {
    PostDetailController::new(PostId::new(id), repo.clone(), nav.clone())
}

fn form(
    mode: FormMode,
    repo: &Arc<FakeRepository>,
    nav: &Arc<RecordingNavigator>,
    picker: Arc<ScriptedPicker>,
) -> PostFormController {
    PostFormController::new(mode, repo.clone(), nav.clone(), picker)
}

fn server_error() -> ApiError {
    ApiError::Http {
        status: 500,
        body: "boom".to_string(),
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_load_replaces_posts() {
    let repo = FakeRepository::with_posts(vec![post("1", "First"), post("2", "Second")]);
    let nav = RecordingNavigator::new();
    let controller = list(&repo, &nav);

    assert_eq!(controller.load().await, Outcome::Done(()));
    assert_eq!(controller.snapshot().posts.len(), 2);

    repo.set_posts(vec![post("3", "Third")]);
    controller.refresh().await;
    let titles: Vec<_> = controller.snapshot().posts.into_iter().map(|p| p.title).collect();
    assert_eq!(titles, ["Third"]);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_posts() {
    let repo = FakeRepository::with_posts(vec![post("1", "First")]);
    let nav = RecordingNavigator::new();
    let controller = list(&repo, &nav);
    controller.load().await;

    repo.set_posts(Vec::new());
    repo.fail_next(server_error());
    let outcome = controller.refresh().await;

    assert_eq!(outcome.error().and_then(ApiError::status), Some(500));
    let state = controller.snapshot();
    assert_eq!(state.posts, vec![post("1", "First")]);
    assert!(!state.refreshing);
}

#[tokio::test]
async fn refresh_is_single_flight() {
    let repo = FakeRepository::with_posts(vec![post("1", "First")]);
    let nav = RecordingNavigator::new();
    let controller = Arc::new(list(&repo, &nav));
    let gate = repo.hold();

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.refresh().await }
    });
    wait_until(|| repo.call_count() == 1).await;
    assert!(controller.snapshot().refreshing);

    assert_eq!(controller.refresh().await, Outcome::Skipped(SkipReason::Busy));
    assert_eq!(controller.load().await, Outcome::Skipped(SkipReason::Busy));

    gate.add_permits(1);
    assert_eq!(task.await.unwrap(), Outcome::Done(()));
    assert!(!controller.snapshot().refreshing);
    assert_eq!(repo.calls(), vec![Call::List]);
}

#[tokio::test]
async fn list_result_after_unmount_is_discarded() {
    let repo = FakeRepository::with_posts(vec![post("1", "First")]);
    let nav = RecordingNavigator::new();
    let controller = Arc::new(list(&repo, &nav));
    let gate = repo.hold();

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load().await }
    });
    wait_until(|| repo.call_count() == 1).await;
    controller.lifecycle().unmount();
    gate.add_permits(1);

    assert_eq!(task.await.unwrap(), Outcome::Discarded);
    assert!(controller.snapshot().posts.is_empty());
}

#[tokio::test]
async fn list_reloads_on_each_focus_transition() {
    let repo = FakeRepository::with_posts(vec![post("1", "First")]);
    let nav = RecordingNavigator::new();
    let controller = list(&repo, &nav);

    controller.focus_changed(true).await;
    controller.focus_changed(true).await;
    assert_eq!(repo.call_count(), 1);

    controller.focus_changed(false).await;
    controller.focus_changed(true).await;
    assert_eq!(repo.calls(), vec![Call::List, Call::List]);
}

#[tokio::test]
async fn remounted_list_reloads_on_focus() {
    let repo = FakeRepository::with_posts(vec![post("1", "First")]);
    let nav = RecordingNavigator::new();
    let controller = list(&repo, &nav);

    controller.focus_changed(true).await;
    controller.focus_changed(false).await;
    controller.lifecycle().unmount();
    controller.focus_changed(true).await;
    assert_eq!(repo.call_count(), 1);

    controller.lifecycle().mount();
    controller.focus_changed(true).await;
    assert_eq!(repo.calls(), vec![Call::List, Call::List]);
}

#[tokio::test]
async fn list_navigation() {
    let repo = FakeRepository::new();
    let nav = RecordingNavigator::new();
    let controller = list(&repo, &nav);

    controller.select(&PostId::new("7"));
    controller.add();

    assert_eq!(
        nav.events(),
        vec![
            NavEvent::To(Route::Detail(PostId::new("7"))),
            NavEvent::To(Route::PostForm(FormMode::Create)),
        ]
    );
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

#[tokio::test]
async fn detail_starts_loading() {
    let repo = FakeRepository::new();
    let nav = RecordingNavigator::new();
    let state = detail("1", &repo, &nav).snapshot();

    assert!(state.loading);
    assert_eq!(state.content, DetailContent::Pending);
}

#[tokio::test]
async fn detail_load_shows_post() {
    let repo = FakeRepository::with_posts(vec![post("1", "First")]);
    let nav = RecordingNavigator::new();
    let controller = detail("1", &repo, &nav);

    assert_eq!(controller.load().await, Outcome::Done(post("1", "First")));
    let state = controller.snapshot();
    assert!(!state.loading);
    assert_eq!(state.post(), Some(&post("1", "First")));
    assert_eq!(repo.calls(), vec![Call::Get(PostId::new("1"))]);
}

#[tokio::test]
async fn failed_first_load_is_unavailable() {
    let repo = FakeRepository::new();
    let nav = RecordingNavigator::new();
    let controller = detail("missing", &repo, &nav);

    assert_eq!(controller.load().await, Outcome::Failed(ApiError::NotFound));
    let state = controller.snapshot();
    assert!(!state.loading);
    assert_eq!(state.content, DetailContent::Unavailable);
    assert_eq!(controller.delete().await, Outcome::Skipped(SkipReason::NothingLoaded));
    assert_eq!(controller.edit(), Outcome::Skipped(SkipReason::NothingLoaded));
}

#[tokio::test]
async fn failed_refetch_keeps_post() {
    let repo = FakeRepository::with_posts(vec![post("1", "First")]);
    let nav = RecordingNavigator::new();
    let controller = detail("1", &repo, &nav);
    controller.load().await;

    repo.fail_next(server_error());
    assert!(controller.load().await.error().is_some());
    assert_eq!(controller.snapshot().post(), Some(&post("1", "First")));
}

#[tokio::test]
async fn actions_wait_for_first_load() {
    let repo = FakeRepository::with_posts(vec![post("1", "First")]);
    let nav = RecordingNavigator::new();
    let controller = detail("1", &repo, &nav);

    assert_eq!(controller.delete().await, Outcome::Skipped(SkipReason::Busy));
    assert_eq!(controller.edit(), Outcome::Skipped(SkipReason::Busy));
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn delete_success_returns_home() {
    let repo = FakeRepository::with_posts(vec![post("1", "First")]);
    let nav = RecordingNavigator::new();
    let controller = detail("1", &repo, &nav);
    controller.load().await;

    assert_eq!(controller.delete().await, Outcome::Done(()));
    assert_eq!(nav.events(), vec![NavEvent::To(Route::Home)]);
    assert_eq!(repo.calls().last(), Some(&Call::Delete(PostId::new("1"))));
    assert!(repo.posts().is_empty());
}

#[tokio::test]
async fn delete_failure_stays_on_screen() {
    let repo = FakeRepository::with_posts(vec![post("1", "First")]);
    let nav = RecordingNavigator::new();
    let controller = detail("1", &repo, &nav);
    controller.load().await;

    repo.fail_next(server_error());
    assert!(controller.delete().await.error().is_some());

    let state = controller.snapshot();
    assert!(!state.removing);
    assert_eq!(state.post(), Some(&post("1", "First")));
    assert!(nav.events().is_empty());
}

#[tokio::test]
async fn delete_blocks_other_actions() {
    let repo = FakeRepository::with_posts(vec![post("1", "First")]);
    let nav = RecordingNavigator::new();
    let controller = Arc::new(detail("1", &repo, &nav));
    controller.load().await;
    let gate = repo.hold();

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.delete().await }
    });
    wait_until(|| repo.call_count() == 2).await;

    assert!(controller.snapshot().removing);
    assert_eq!(controller.delete().await, Outcome::Skipped(SkipReason::Busy));
    assert_eq!(controller.load().await, Outcome::Skipped(SkipReason::Busy));
    assert_eq!(controller.edit(), Outcome::Skipped(SkipReason::Busy));

    gate.add_permits(1);
    assert_eq!(task.await.unwrap(), Outcome::Done(()));
    assert_eq!(repo.call_count(), 2);
}

#[tokio::test]
async fn delete_after_unmount_does_not_navigate() {
    let repo = FakeRepository::with_posts(vec![post("1", "First")]);
    let nav = RecordingNavigator::new();
    let controller = Arc::new(detail("1", &repo, &nav));
    controller.load().await;
    let gate = repo.hold();

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.delete().await }
    });
    wait_until(|| repo.call_count() == 2).await;
    controller.lifecycle().unmount();
    gate.add_permits(1);

    assert_eq!(task.await.unwrap(), Outcome::Discarded);
    assert!(nav.events().is_empty());
    assert!(repo.posts().is_empty());
}

#[tokio::test]
async fn edit_opens_seeded_form() {
    let seed = post_with_image("1", "First", "http://fake/uploads/a.jpg");
    let repo = FakeRepository::with_posts(vec![seed.clone()]);
    let nav = RecordingNavigator::new();
    let controller = detail("1", &repo, &nav);
    controller.load().await;

    assert_eq!(controller.edit(), Outcome::Done(()));
    controller.back();
    assert_eq!(
        nav.events(),
        vec![NavEvent::To(Route::PostForm(FormMode::Edit(seed))), NavEvent::Back]
    );
}

#[tokio::test]
async fn detail_reloads_on_focus() {
    let repo = FakeRepository::with_posts(vec![post("1", "First")]);
    let nav = RecordingNavigator::new();
    let controller = detail("1", &repo, &nav);

    controller.focus_changed(true).await;
    assert!(controller.snapshot().post().is_some());

    controller.focus_changed(false).await;
    controller.focus_changed(true).await;
    assert_eq!(repo.call_count(), 2);
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

#[tokio::test]
async fn edit_with_untouched_image_sends_text_only() {
    let seed = post_with_image("1", "Old", "a.jpg");
    let seed = post_core::Post {
        description: "Old desc".to_string(),
        ..seed
    };
    let repo = FakeRepository::with_posts(vec![seed.clone()]);
    let nav = RecordingNavigator::new();
    let controller = form(FormMode::Edit(seed), &repo, &nav, ScriptedPicker::new([]));

    controller.set_title("New");
    assert!(controller.submit().await.is_done());

    assert_eq!(
        repo.calls(),
        vec![Call::Update(
            PostId::new("1"),
            PostPayload {
                title: "New".to_string(),
                description: "Old desc".to_string(),
                image: None,
            }
        )]
    );
    assert_eq!(nav.events(), vec![NavEvent::Back]);
}

#[tokio::test]
async fn short_title_blocks_submit() {
    let repo = FakeRepository::new();
    let nav = RecordingNavigator::new();
    let controller = form(FormMode::Create, &repo, &nav, ScriptedPicker::new([]));

    controller.set_title("Hi");
    controller.set_description("Long enough");
    let outcome = controller.submit().await;

    assert!(matches!(outcome, Outcome::Invalid(_)));
    assert!(repo.calls().is_empty());
    assert!(nav.events().is_empty());
    let state = controller.snapshot();
    assert_eq!(
        state.errors.get(Field::Title),
        Some(&ValidationError::TooShort {
            field: Field::Title,
            min: 3
        })
    );
    assert_eq!(state.title, "Hi");
    assert!(!state.submitting);
}

#[tokio::test]
async fn create_with_picked_image() {
    let repo = FakeRepository::new();
    let nav = RecordingNavigator::new();
    let image = ImageRef::new("file:///cache/ImagePicker/pic.png");
    let picker = ScriptedPicker::new([PickResult::Picked(image.clone())]);
    let controller = form(FormMode::Create, &repo, &nav, picker);

    controller.set_title("Sunset");
    controller.set_description("Over the bay");
    assert!(controller.pick_image().await);
    assert_eq!(controller.snapshot().image, Some(image.clone()));

    let created = controller.submit().await.done().unwrap();
    assert_eq!(created.image_url.as_deref(), Some("http://fake/uploads/pic.png"));
    assert_eq!(
        repo.calls(),
        vec![Call::Create(PostPayload {
            title: "Sunset".to_string(),
            description: "Over the bay".to_string(),
            image: Some(image),
        })]
    );

    let state = controller.snapshot();
    assert!(state.title.is_empty());
    assert!(state.image.is_none());
    assert_eq!(nav.events(), vec![NavEvent::Back]);
}

#[tokio::test]
async fn edit_with_replaced_image_uploads_it() {
    let seed = post_with_image("1", "Old", "http://fake/uploads/a.jpg");
    let repo = FakeRepository::with_posts(vec![seed.clone()]);
    let nav = RecordingNavigator::new();
    let image = ImageRef::new("file:///cache/b.jpg");
    let picker = ScriptedPicker::new([PickResult::Picked(image.clone())]);
    let controller = form(FormMode::Edit(seed), &repo, &nav, picker);

    assert_eq!(controller.snapshot().image, Some(ImageRef::new("http://fake/uploads/a.jpg")));
    controller.pick_image().await;
    let updated = controller.submit().await.done().unwrap();

    assert_eq!(updated.image_url.as_deref(), Some("http://fake/uploads/b.jpg"));
    match &repo.calls()[0] {
        Call::Update(id, payload) => {
            assert_eq!(id, &PostId::new("1"));
            assert_eq!(payload.image, Some(image));
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn cancelled_pick_keeps_selection() {
    let repo = FakeRepository::new();
    let nav = RecordingNavigator::new();
    let picker = ScriptedPicker::new([PickResult::Cancelled]);
    let controller = form(FormMode::Create, &repo, &nav, picker);

    assert!(!controller.pick_image().await);
    assert!(controller.snapshot().image.is_none());
}

#[tokio::test]
async fn failed_submit_still_resets_and_goes_back() {
    let repo = FakeRepository::new();
    let nav = RecordingNavigator::new();
    let controller = form(FormMode::Create, &repo, &nav, ScriptedPicker::new([]));
    repo.fail_next(server_error());

    controller.set_title("Sunset");
    controller.set_description("Over the bay");
    let outcome = controller.submit().await;

    assert_eq!(outcome.error().and_then(ApiError::status), Some(500));
    let state = controller.snapshot();
    assert!(state.title.is_empty());
    assert!(!state.submitting);
    assert_eq!(nav.events(), vec![NavEvent::Back]);
}

#[tokio::test]
async fn submit_is_single_flight() {
    let repo = FakeRepository::new();
    let nav = RecordingNavigator::new();
    let controller = Arc::new(form(FormMode::Create, &repo, &nav, ScriptedPicker::new([])));
    controller.set_title("Sunset");
    controller.set_description("Over the bay");
    let gate = repo.hold();

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit().await }
    });
    wait_until(|| repo.call_count() == 1).await;

    assert!(controller.snapshot().submitting);
    assert_eq!(controller.submit().await, Outcome::Skipped(SkipReason::Busy));
    assert!(!controller.pick_image().await);

    gate.add_permits(1);
    assert!(task.await.unwrap().is_done());
    assert_eq!(repo.call_count(), 1);
}

#[tokio::test]
async fn pick_resolving_after_submit_is_dropped() {
    let repo = FakeRepository::new();
    let nav = RecordingNavigator::new();
    let picker = ScriptedPicker::new([PickResult::Picked(ImageRef::new("file:///late.png"))]);
    let gate = picker.hold();
    let controller = Arc::new(form(FormMode::Create, &repo, &nav, picker.clone()));
    controller.set_title("Sunset");
    controller.set_description("Over the bay");

    let pick = tokio::spawn({
        let controller = controller.clone();
        async move { controller.pick_image().await }
    });
    wait_until(|| picker.requests() == 1).await;

    assert!(controller.submit().await.is_done());
    assert_eq!(nav.events(), vec![NavEvent::Back]);

    gate.add_permits(1);
    assert!(!pick.await.unwrap());
    assert_eq!(controller.snapshot(), FormState::initial(&FormMode::Create));
}

#[tokio::test]
async fn submit_after_unmount_is_discarded() {
    let repo = FakeRepository::new();
    let nav = RecordingNavigator::new();
    let controller = Arc::new(form(FormMode::Create, &repo, &nav, ScriptedPicker::new([])));
    controller.set_title("Sunset");
    controller.set_description("Over the bay");
    let gate = repo.hold();

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit().await }
    });
    wait_until(|| repo.call_count() == 1).await;
    controller.lifecycle().unmount();
    gate.add_permits(1);

    assert_eq!(task.await.unwrap(), Outcome::Discarded);
    assert!(nav.events().is_empty());
    assert_eq!(repo.posts().len(), 1);
}

#[tokio::test]
async fn blur_reports_and_typing_clears_errors() {
    let repo = FakeRepository::new();
    let nav = RecordingNavigator::new();
    let controller = form(FormMode::Create, &repo, &nav, ScriptedPicker::new([]));

    controller.blur(Field::Description);
    assert_eq!(
        controller.snapshot().errors.get(Field::Description),
        Some(&ValidationError::Required {
            field: Field::Description
        })
    );
    assert!(controller.snapshot().errors.get(Field::Title).is_none());

    controller.set_description("ab");
    assert!(matches!(
        controller.snapshot().errors.get(Field::Description),
        Some(ValidationError::TooShort { .. })
    ));

    controller.set_description("abc");
    assert!(controller.snapshot().errors.is_empty());
}

#[tokio::test]
async fn submission_preview_matches_fields() {
    let repo = FakeRepository::new();
    let nav = RecordingNavigator::new();
    let controller = form(FormMode::Create, &repo, &nav, ScriptedPicker::new([]));
    assert!(controller.submission().is_err());

    controller.set_title("  Sunset  ");
    controller.set_description("Over the bay");
    let submission = controller.submission().unwrap();
    assert_eq!(submission.payload.title, "Sunset");
    assert!(repo.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Navigation-driven flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_returns_home_and_list_reloads() {
    let repo = FakeRepository::with_posts(vec![post("1", "First"), post("2", "Second")]);
    let nav = Arc::new(StackNavigator::default());
    let app = PostApp::with_repository(repo.clone());
    let home = Arc::new(app.list_controller(nav.clone()));

    let focus = nav.subscribe_focus(Screen::Home);
    let driver = tokio::spawn({
        let home = home.clone();
        async move { drive_focus(home.as_ref(), focus).await }
    });
    wait_until(|| home.snapshot().posts.len() == 2).await;
    assert_eq!(repo.calls(), vec![Call::List]);

    home.select(&PostId::new("1"));
    assert!(nav.is_focused(Screen::Detail));
    let detail = app.detail_controller(PostId::new("1"), nav.clone());
    detail.load().await;

    assert_eq!(detail.delete().await, Outcome::Done(()));
    assert_eq!(nav.stack(), vec![Route::Home]);

    wait_until(|| home.snapshot().posts.len() == 1).await;
    let lists = repo.calls().iter().filter(|c| **c == Call::List).count();
    assert_eq!(lists, 2);

    driver.abort();
}

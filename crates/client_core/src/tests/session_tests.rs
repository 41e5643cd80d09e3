use super::*;
use crate::{
    orchestrator::RequestStatus,
    presets::PresetBundle,
    test_support::{response, EchoApi, ScriptedApi},
    ResultSource, VisualizeError,
};

fn bundled() -> Arc<PresetCatalog> {
    Arc::new(PresetCatalog::bundled().expect("bundled presets"))
}

fn session_with(api: Arc<dyn VisualizationApi>) -> VisualizationSession {
    VisualizationSession::new(bundled(), api, DEFAULT_EDIT_DEBOUNCE)
}

fn type_samples(session: &mut VisualizationSession, texts: &[&str]) {
    session.clear();
    while session.snapshot().samples.len() < texts.len() {
        session.add_sample();
    }
    for (index, text) in texts.iter().enumerate() {
        session.edit_sample(index, *text);
    }
}

#[tokio::test]
async fn precomputed_preset_displays_without_a_request() {
    let (api, _calls) = ScriptedApi::new();
    let mut session = session_with(api.clone());

    assert!(session.select_preset(&PresetId::new("weatherEmotions")));

    let snapshot = session.snapshot();
    assert_eq!(
        snapshot.provenance(),
        &Provenance::Preset(PresetId::new("weatherEmotions"))
    );
    assert_eq!(snapshot.samples.texts()[0], "It is pouring rain outside");
    let displayed = snapshot.displayed().expect("bundled result");
    assert_eq!(
        displayed.source,
        ResultSource::Preset(PresetId::new("weatherEmotions"))
    );
    assert_eq!(displayed.response.labels(), snapshot.samples.texts());
    assert!(!snapshot.request.is_loading());
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn start_loads_the_first_preset() {
    let session = VisualizationSession::start(bundled(), Arc::new(EchoApi::default()));
    let snapshot = session.snapshot();
    assert_eq!(
        snapshot.provenance().active_preset().map(PresetId::as_str),
        Some("petsFinanceFruitsVehicles")
    );
    assert!(snapshot.displayed().is_some());
}

#[tokio::test]
async fn unknown_preset_is_ignored() {
    let mut session = session_with(Arc::new(EchoApi::default()));
    session.select_preset(&PresetId::new("mixedSentences"));
    let before = session.snapshot();

    assert!(!session.select_preset(&PresetId::new("doesNotExist")));
    let after = session.snapshot();
    assert_eq!(after.samples, before.samples);
    assert_eq!(
        after.displayed().map(|r| r.id),
        before.displayed().map(|r| r.id)
    );
}

fn plain_catalog() -> Arc<PresetCatalog> {
    let catalog = PresetCatalog::from_bundles(vec![PresetBundle {
        id: "plain".to_string(),
        name: "Plain".to_string(),
        texts: vec!["one".into(), "two".into(), "three".into()],
        visualization_data: None,
    }])
    .expect("catalog");
    Arc::new(catalog)
}

#[tokio::test]
async fn preset_without_bundled_result_does_not_submit() {
    let (api, _calls) = ScriptedApi::new();
    let mut session = VisualizationSession::new(plain_catalog(), api.clone(), DEFAULT_EDIT_DEBOUNCE);

    assert!(session.select_preset(&PresetId::new("plain")));
    let snapshot = session.snapshot();
    assert_eq!(snapshot.samples.texts(), vec!["one", "two", "three"]);
    assert!(matches!(snapshot.request.status, RequestStatus::Idle));
    assert!(snapshot.displayed().is_none());
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn submit_sends_samples_in_display_order() {
    let api = Arc::new(EchoApi::default());
    let mut session = session_with(api.clone());
    type_samples(&mut session, &["a cat", "a dog", "a car"]);

    let outcome = session
        .submit()
        .expect("valid samples")
        .await
        .expect("submit task");
    assert!(matches!(outcome, SubmitOutcome::Published(_)));

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0],
        shared::protocol::VisualizeRequest::from_texts(["a cat", "a dog", "a car"])
    );

    let snapshot = session.snapshot();
    let displayed = snapshot.displayed().expect("published result");
    assert_eq!(displayed.len(), 3);
    assert_eq!(displayed.response.labels(), vec!["a cat", "a dog", "a car"]);
    assert!(snapshot.provenance().is_custom());
}

#[tokio::test]
async fn blank_samples_are_left_out_of_the_request() {
    let api = Arc::new(EchoApi::default());
    let mut session = session_with(api.clone());
    type_samples(&mut session, &["a cat", "  ", "a dog", "a car"]);

    session
        .submit()
        .expect("valid samples")
        .await
        .expect("submit task");
    assert_eq!(
        api.requests()[0],
        shared::protocol::VisualizeRequest::from_texts(["a cat", "a dog", "a car"])
    );
}

#[tokio::test]
async fn too_few_samples_never_reach_the_api() {
    let api = Arc::new(EchoApi::default());
    let mut session = session_with(api.clone());
    let mut events = session.subscribe_events();
    type_samples(&mut session, &["a cat", "a dog", ""]);

    let err = session.submit().expect_err("validation error");
    assert_eq!(
        err,
        ValidationError::NotEnoughSamples {
            required: 3,
            actual: 2
        }
    );
    assert!(api.requests().is_empty());
    assert!(!session.snapshot().request.is_loading());

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SessionEvent::ValidationFailed(_)) {
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

#[tokio::test]
async fn failed_request_preserves_samples_and_previous_result() {
    let (api, mut calls) = ScriptedApi::new();
    let mut session = session_with(api);
    session.select_preset(&PresetId::new("emotionsColorsShapes"));
    let shown = session.snapshot().displayed().map(|r| r.id);
    session.add_sample();
    session.edit_sample(9, "a brand new sample");

    let task = session.submit().expect("valid samples");
    let before = session.snapshot().samples;
    let call = calls.recv().await.expect("api call");
    assert_eq!(call.request.len(), 10);
    let _ = call
        .respond
        .send(Err(VisualizeError::api(Some(500), "Internal error")));
    task.await.expect("submit task");

    let after = session.snapshot();
    assert_eq!(after.samples, before);
    assert_eq!(after.samples.texts()[9], "a brand new sample");
    assert!(after.request.error().is_some());
    assert_eq!(after.displayed().map(|r| r.id), shown);
}

#[tokio::test]
async fn submitting_an_untouched_preset_keeps_its_provenance() {
    let api = Arc::new(EchoApi::default());
    let mut session = session_with(api.clone());
    session.select_preset(&PresetId::new("mixedSentences"));

    session
        .submit()
        .expect("valid samples")
        .await
        .expect("submit task");
    let snapshot = session.snapshot();
    assert_eq!(
        snapshot.provenance(),
        &Provenance::Preset(PresetId::new("mixedSentences"))
    );
    assert!(matches!(
        snapshot.displayed().map(|r| &r.source),
        Some(ResultSource::Request(_))
    ));
}

#[tokio::test]
async fn selecting_a_preset_supersedes_a_pending_request() {
    let (api, mut calls) = ScriptedApi::new();
    let mut session = session_with(api);
    type_samples(&mut session, &["a cat", "a dog", "a car"]);

    let task = session.submit().expect("valid samples");
    let call = calls.recv().await.expect("api call");
    session.select_preset(&PresetId::new("weatherEmotions"));
    let _ = call
        .respond
        .send(Ok(response(&[("a cat", 0.0, 0.0), ("a dog", 1.0, 1.0), ("a car", 2.0, 2.0)])));

    assert!(matches!(
        task.await.expect("submit task"),
        SubmitOutcome::Superseded(_)
    ));
    assert_eq!(
        session.snapshot().displayed().map(|r| r.source.clone()),
        Some(ResultSource::Preset(PresetId::new("weatherEmotions")))
    );
}

#[tokio::test]
async fn preset_without_bundled_result_supersedes_a_pending_request() {
    let (api, mut calls) = ScriptedApi::new();
    let mut session = VisualizationSession::new(plain_catalog(), api, DEFAULT_EDIT_DEBOUNCE);
    type_samples(&mut session, &["a cat", "a dog", "a car"]);

    let task = session.submit().expect("valid samples");
    let call = calls.recv().await.expect("api call");
    assert!(session.select_preset(&PresetId::new("plain")));
    assert!(matches!(session.snapshot().request.status, RequestStatus::Idle));

    let _ = call
        .respond
        .send(Ok(response(&[("a cat", 0.0, 0.0), ("a dog", 1.0, 1.0), ("a car", 2.0, 2.0)])));
    assert!(matches!(
        task.await.expect("submit task"),
        SubmitOutcome::Superseded(_)
    ));

    let snapshot = session.snapshot();
    assert!(snapshot.displayed().is_none());
    assert!(matches!(snapshot.request.status, RequestStatus::Idle));
    assert_eq!(snapshot.samples.texts(), vec!["one", "two", "three"]);
    assert_eq!(
        snapshot.provenance(),
        &Provenance::Preset(PresetId::new("plain"))
    );
}

#[tokio::test(start_paused = true)]
async fn watchers_see_a_debounced_edit_once_it_commits() {
    let mut session = session_with(Arc::new(EchoApi::default()));
    session.select_preset(&PresetId::new("weatherEmotions"));
    let mut watch = session.subscribe();

    session.edit_sample(0, "edited");
    assert_eq!(session.next_commit().await, 1);

    let seen = watch.changed().await.expect("session alive");
    assert!(seen.provenance().is_custom());
    assert_eq!(seen.samples.texts()[0], "edited");
}

#[tokio::test(start_paused = true)]
async fn debounced_edit_switches_to_custom_once_committed() {
    let mut session = session_with(Arc::new(EchoApi::default()));
    session.select_preset(&PresetId::new("mixedSentences"));
    let mut watch = session.subscribe();

    session.edit_sample(0, "edited");
    assert_eq!(session.draft(0), Some("edited"));
    assert!(!session.snapshot().provenance().is_custom());

    assert_eq!(session.settle_edits().await, 1);
    let seen = watch.changed().await.expect("session alive");
    assert!(seen.provenance().is_custom());
    assert_eq!(seen.samples.texts()[0], "edited");
}

#[tokio::test(start_paused = true)]
async fn submit_commits_pending_drafts_first() {
    let api = Arc::new(EchoApi::default());
    let mut session = session_with(api.clone());
    session.edit_sample(0, "x");
    session.edit_sample(1, "y");
    session.edit_sample(2, "z");

    session
        .submit()
        .expect("drafts count as samples")
        .await
        .expect("submit task");
    assert_eq!(
        api.requests()[0],
        shared::protocol::VisualizeRequest::from_texts(["x", "y", "z"])
    );
}

#[tokio::test]
async fn remove_is_ignored_at_three_samples() {
    let mut session = session_with(Arc::new(EchoApi::default()));
    session.select_preset(&PresetId::new("mixedSentences"));
    for _ in 0..3 {
        assert!(session.remove_sample(0));
    }
    assert!(!session.remove_sample(0));
    assert_eq!(session.snapshot().samples.len(), 3);
}

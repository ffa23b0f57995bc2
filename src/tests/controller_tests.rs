use std::cell::{Cell, RefCell};
use std::future::{pending, ready, Future};
use std::pin::pin;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};

use super::*;
use crate::error::UiError;
use crate::event::{ChoiceOption, DialogueState, InputRequest, StepRecord};
use crate::interface::INTERFACE_DATA_KEY;
use crate::query::QueryKey;

fn identity(key: &str) -> String {
    key.to_string()
}

/// Engine double that records the `loading` flag seen during each call.
struct RecordingEngine {
    store: Store<InterfaceState>,
    fail: bool,
    calls: Cell<usize>,
    loading_seen: RefCell<Vec<bool>>,
}

impl RecordingEngine {
    fn new(store: Store<InterfaceState>, fail: bool) -> Self {
        Self {
            store,
            fail,
            calls: Cell::new(0),
            loading_seen: RefCell::new(Vec::new()),
        }
    }

    fn call(&self) -> UiResult<()> {
        self.calls.set(self.calls.get() + 1);
        self.loading_seen
            .borrow_mut()
            .push(self.store.read(|state| state.loading));
        if self.fail {
            Err(UiError::Engine("boom".to_string()))
        } else {
            Ok(())
        }
    }
}

impl NarrativeEngine for RecordingEngine {
    fn dialogue(&self) -> Option<DialogueState> {
        None
    }

    fn choice_menu_options(&self) -> Vec<ChoiceOption> {
        Vec::new()
    }

    fn input_request(&self) -> InputRequest {
        InputRequest::default()
    }

    fn can_go_next(&self) -> bool {
        true
    }

    fn can_go_back(&self) -> bool {
        false
    }

    fn current_label_history(&self) -> Vec<StepRecord> {
        Vec::new()
    }

    fn narrative_history(&self) -> Vec<StepRecord> {
        Vec::new()
    }

    fn select_choice(&self, _index: usize) -> impl Future<Output = UiResult<()>> {
        ready(self.call())
    }

    fn go_next(&self) -> impl Future<Output = UiResult<()>> {
        ready(self.call())
    }

    fn submit_input(&self, _value: serde_json::Value) -> impl Future<Output = UiResult<()>> {
        ready(self.call())
    }
}

/// Engine whose choice never resolves, standing in for a slow backend.
struct StalledEngine;

impl NarrativeEngine for StalledEngine {
    fn dialogue(&self) -> Option<DialogueState> {
        None
    }

    fn choice_menu_options(&self) -> Vec<ChoiceOption> {
        Vec::new()
    }

    fn input_request(&self) -> InputRequest {
        InputRequest::default()
    }

    fn can_go_next(&self) -> bool {
        true
    }

    fn can_go_back(&self) -> bool {
        false
    }

    fn current_label_history(&self) -> Vec<StepRecord> {
        Vec::new()
    }

    fn narrative_history(&self) -> Vec<StepRecord> {
        Vec::new()
    }

    fn select_choice(&self, _index: usize) -> impl Future<Output = UiResult<()>> {
        pending()
    }

    fn go_next(&self) -> impl Future<Output = UiResult<()>> {
        ready(Ok(()))
    }

    fn submit_input(&self, _value: serde_json::Value) -> impl Future<Output = UiResult<()>> {
        ready(Ok(()))
    }
}

struct NoopWake;

impl Wake for NoopWake {
    fn wake(self: Arc<Self>) {}
}

fn item() -> MenuItem {
    MenuItem {
        index: 0,
        text: "Go".to_string(),
        is_close: false,
    }
}

#[test]
fn successful_choice_sets_loading_and_invalidates_queries() {
    let store = Store::new(InterfaceState::default());
    let controller = NarrationController::new(store.clone());
    let engine = RecordingEngine::new(store.clone(), false);
    let interface = NarrationInterface::new(identity);
    interface.can_go_back(&engine);

    let outcome = pollster::block_on(controller.select_choice(&engine, &interface, &item()));

    assert_eq!(outcome, ActionOutcome::Applied);
    assert_eq!(*engine.loading_seen.borrow(), vec![true]);
    assert!(!controller.is_loading());
    assert!(interface
        .cache()
        .is_stale(&QueryKey::new([INTERFACE_DATA_KEY, "can_go_back"])));
}

#[test]
fn failed_choice_is_logged_and_loading_resets() {
    let store = Store::new(InterfaceState::default());
    let controller = NarrationController::new(store.clone());
    let engine = RecordingEngine::new(store.clone(), true);
    let interface = NarrationInterface::new(identity);
    interface.can_go_back(&engine);

    let outcome = pollster::block_on(controller.select_choice(&engine, &interface, &item()));

    assert_eq!(outcome, ActionOutcome::Failed);
    assert!(!controller.is_loading());
    assert!(!interface
        .cache()
        .is_stale(&QueryKey::new([INTERFACE_DATA_KEY, "can_go_back"])));

    let retry = pollster::block_on(controller.go_next(&engine, &interface));
    assert_eq!(retry, ActionOutcome::Failed);
    assert_eq!(engine.calls.get(), 2);
}

#[test]
fn busy_controller_does_not_call_engine() {
    let store = Store::new(InterfaceState::default());
    let controller = NarrationController::new(store.clone());
    let engine = RecordingEngine::new(store.clone(), false);
    let interface = NarrationInterface::new(identity);
    store.update(|state| state.loading = true);

    let outcome = pollster::block_on(controller.submit_input(
        &engine,
        &interface,
        serde_json::json!(3),
    ));

    assert_eq!(outcome, ActionOutcome::Busy);
    assert_eq!(engine.calls.get(), 0);
    assert!(controller.is_loading());
}

#[test]
fn menu_hidden_when_store_hides_or_menu_empty() {
    let controller = NarrationController::default();
    assert!(controller.menu_hidden(&[]));
    assert!(!controller.menu_hidden(&[item()]));
    controller.set_hidden(true);
    assert!(controller.menu_hidden(&[item()]));
}

#[test]
fn cancelled_action_releases_loading() {
    let controller = NarrationController::default();
    let interface = NarrationInterface::new(identity);
    let engine = StalledEngine;

    {
        let waker = Waker::from(Arc::new(NoopWake));
        let mut cx = Context::from_waker(&waker);
        let selection = item();
        let mut action = pin!(controller.select_choice(&engine, &interface, &selection));
        assert!(action.as_mut().poll(&mut cx).is_pending());
        assert!(controller.is_loading());
    }

    assert!(!controller.is_loading());
    let outcome = pollster::block_on(controller.go_next(&engine, &interface));
    assert_eq!(outcome, ActionOutcome::Applied);
}

//! Player actions that mutate the narrative engine.

use std::future::Future;

use tracing::{error, info, instrument, warn};

use crate::engine::NarrativeEngine;
use crate::error::UiResult;
use crate::interface::{MenuItem, NarrationInterface};
use crate::localization::Localize;
use crate::store::{InterfaceState, Store};

/// Result of a player action as seen by the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    /// Another action was still in flight; nothing was sent to the engine.
    Busy,
    /// The engine rejected the action; the failure was logged.
    Failed,
}

/// Serializes engine mutations behind the `loading` flag and refreshes the
/// interface queries once a mutation lands.
#[derive(Clone, Debug, Default)]
pub struct NarrationController {
    store: Store<InterfaceState>,
}

impl NarrationController {
    pub fn new(store: Store<InterfaceState>) -> Self {
        Self { store }
    }

    pub fn is_loading(&self) -> bool {
        self.store.read(|state| state.loading)
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.store.update(|state| state.hidden = hidden);
    }

    /// The menu collapses when the UI is hidden or there is nothing to pick.
    pub fn menu_hidden(&self, options: &[MenuItem]) -> bool {
        self.store.read(|state| state.hidden) || options.is_empty()
    }

    #[instrument(skip_all, fields(index = item.index))]
    pub async fn select_choice<E, L>(
        &self,
        engine: &E,
        interface: &NarrationInterface<L>,
        item: &MenuItem,
    ) -> ActionOutcome
    where
        E: NarrativeEngine,
        L: Localize,
    {
        info!(text = %item.text, "choice selected");
        self.run("select choice", interface, || engine.select_choice(item.index))
            .await
    }

    #[instrument(skip_all)]
    pub async fn go_next<E, L>(&self, engine: &E, interface: &NarrationInterface<L>) -> ActionOutcome
    where
        E: NarrativeEngine,
        L: Localize,
    {
        if !interface.can_go_next(engine) {
            warn!("advance requested while the engine cannot advance");
        }
        self.run("advance", interface, || engine.go_next()).await
    }

    #[instrument(skip_all)]
    pub async fn submit_input<E, L>(
        &self,
        engine: &E,
        interface: &NarrationInterface<L>,
        value: serde_json::Value,
    ) -> ActionOutcome
    where
        E: NarrativeEngine,
        L: Localize,
    {
        self.run("submit input", interface, || engine.submit_input(value))
            .await
    }

    /// The engine is only called once the `loading` flag is claimed.
    async fn run<L, C, F>(
        &self,
        action: &'static str,
        interface: &NarrationInterface<L>,
        call: C,
    ) -> ActionOutcome
    where
        L: Localize,
        C: FnOnce() -> F,
        F: Future<Output = UiResult<()>>,
    {
        if self.is_loading() {
            warn!(action, "ignored while another action is in flight");
            return ActionOutcome::Busy;
        }
        let _loading = LoadingGuard::claim(&self.store);
        match call().await {
            Ok(()) => {
                interface.invalidate();
                ActionOutcome::Applied
            }
            Err(err) => {
                error!(action, error = %err, "engine call failed");
                ActionOutcome::Failed
            }
        }
    }
}

/// Holds the `loading` flag; it is released on drop, including when the
/// action future is cancelled mid-flight.
struct LoadingGuard<'a> {
    store: &'a Store<InterfaceState>,
}

impl<'a> LoadingGuard<'a> {
    fn claim(store: &'a Store<InterfaceState>) -> Self {
        store.update(|state| state.loading = true);
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.update(|state| state.loading = false);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;

//! View models derived from engine state, memoized per query key.

use std::rc::Rc;

use serde::Serialize;
use tracing::debug;

use crate::config::InterfaceConfig;
use crate::dialogue::{reconcile, DialogueView};
use crate::engine::NarrativeEngine;
use crate::event::{ChoiceKind, InputRequest, StepRecord};
use crate::history::{filter_history, HistoryEntry};
use crate::localization::Localize;
use crate::query::{QueryCache, QueryKey};
use crate::speaker::SpeakerRegistry;

pub const INTERFACE_DATA_KEY: &str = "interface_data";
const CAN_GO_BACK_KEY: &str = "can_go_back";
const CAN_GO_NEXT_KEY: &str = "can_go_next";
const CHOICE_MENU_OPTIONS_KEY: &str = "choice_menu_options";
const INPUT_VALUE_KEY: &str = "input_value";
const DIALOGUE_KEY: &str = "dialogue";
const CURRENT_LABEL_HISTORY_KEY: &str = "current_label_history";
const NARRATIVE_HISTORY_KEY: &str = "narrative_history";

/// Localized choice menu entry; `index` addresses the engine's option list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub index: usize,
    pub text: String,
    pub is_close: bool,
}

/// Queries backing the narration screen, history screens and choice menu.
#[derive(Debug)]
pub struct NarrationInterface<L> {
    localizer: L,
    speakers: SpeakerRegistry,
    cache: QueryCache,
    root: QueryKey,
    history_limit: Option<usize>,
}

impl<L: Localize> NarrationInterface<L> {
    pub fn new(localizer: L) -> Self {
        Self {
            localizer,
            speakers: SpeakerRegistry::new(),
            cache: QueryCache::new(),
            root: QueryKey::new([INTERFACE_DATA_KEY]),
            history_limit: None,
        }
    }

    pub fn with_config(localizer: L, config: &InterfaceConfig) -> Self {
        Self {
            history_limit: config.history_limit,
            speakers: config.speakers.clone(),
            ..Self::new(localizer)
        }
    }

    pub fn with_speakers(mut self, speakers: SpeakerRegistry) -> Self {
        self.speakers = speakers;
        self
    }

    pub fn speakers(&self) -> &SpeakerRegistry {
        &self.speakers
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Marks every interface query stale after an engine mutation.
    pub fn invalidate(&self) {
        let hit = self.cache.invalidate(&self.root);
        debug!(hit, "interface data invalidated");
    }

    pub fn can_go_back<E: NarrativeEngine>(&self, engine: &E) -> bool {
        *self
            .cache
            .fetch(&self.root.child(CAN_GO_BACK_KEY), || engine.can_go_back())
    }

    /// The player may advance only when no input is pending.
    pub fn can_go_next<E: NarrativeEngine>(&self, engine: &E) -> bool {
        *self.cache.fetch(&self.root.child(CAN_GO_NEXT_KEY), || {
            engine.can_go_next() && !engine.input_request().is_required
        })
    }

    pub fn choice_menu_options<E: NarrativeEngine>(&self, engine: &E) -> Rc<Vec<MenuItem>> {
        self.cache
            .fetch(&self.root.child(CHOICE_MENU_OPTIONS_KEY), || {
                engine
                    .choice_menu_options()
                    .into_iter()
                    .enumerate()
                    .filter(|(_, option)| !option.hidden)
                    .map(|(index, option)| MenuItem {
                        index,
                        text: option.text.flatten(&self.localizer),
                        is_close: option.kind == ChoiceKind::Close,
                    })
                    .collect()
            })
    }

    pub fn input_value<E: NarrativeEngine>(&self, engine: &E) -> Rc<InputRequest> {
        self.cache
            .fetch(&self.root.child(INPUT_VALUE_KEY), || engine.input_request())
    }

    /// Current line split into already-shown and newly revealed text.
    pub fn dialogue<E: NarrativeEngine>(&self, engine: &E) -> Rc<DialogueView> {
        self.cache.fetch_with_previous(
            &self.root.child(DIALOGUE_KEY),
            |previous: Option<Rc<DialogueView>>| {
                let previous = previous.unwrap_or_default();
                let state = engine.dialogue();
                reconcile(state.as_ref(), &previous, &self.speakers, &self.localizer)
            },
        )
    }

    /// History of the current label, without the step on screen and
    /// without steps that had no text.
    pub fn current_label_history<E: NarrativeEngine>(&self, engine: &E) -> Rc<Vec<HistoryEntry>> {
        self.cache
            .fetch(&self.root.child(CURRENT_LABEL_HISTORY_KEY), || {
                let mut steps = engine.current_label_history();
                steps.pop();
                steps
                    .iter()
                    .map(|step| self.history_entry(step))
                    .filter(|entry| !entry.text.is_empty())
                    .collect()
            })
    }

    /// Whole narrative history filtered by `search`.
    pub fn narrative_history<E: NarrativeEngine>(
        &self,
        engine: &E,
        search: Option<&str>,
    ) -> Rc<Vec<HistoryEntry>> {
        let key = self
            .root
            .child(NARRATIVE_HISTORY_KEY)
            .child(search.unwrap_or_default());
        self.cache.fetch(&key, || {
            let steps = engine.narrative_history();
            let skip = self
                .history_limit
                .map_or(0, |limit| steps.len().saturating_sub(limit));
            let entries = steps
                .iter()
                .skip(skip)
                .map(|step| self.history_entry(step))
                .collect();
            filter_history(entries, search)
        })
    }

    fn history_entry(&self, step: &StepRecord) -> HistoryEntry {
        HistoryEntry::from_step(step, &self.speakers, &self.localizer)
    }
}

#[cfg(test)]
#[path = "tests/interface_tests.rs"]
mod tests;

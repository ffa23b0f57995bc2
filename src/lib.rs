mod config;
mod controller;
mod dialogue;
mod engine;
mod error;
mod event;
mod history;
mod interface;
mod localization;
mod query;
mod script;
mod speaker;
mod store;
mod typewriter;

pub use config::{InterfaceConfig, DEFAULT_TYPEWRITER_DELAY_MS};
pub use controller::{ActionOutcome, NarrationController};
pub use dialogue::{reconcile, DialogueView};
pub use engine::{NarrativeEngine, ScriptedNarrative};
pub use error::{UiError, UiResult};
pub use event::{
    flatten_text, ChoiceKind, ChoiceOption, ChoiceRecord, DialogueState, DialogueText,
    InputRequest, StepRecord,
};
pub use history::{filter_history, HistoryChoice, HistoryEntry};
pub use interface::{MenuItem, NarrationInterface, INTERFACE_DATA_KEY};
pub use localization::{
    collect_script_keys, LocalizationCatalog, LocalizationIssue, LocalizationIssueKind, Localize,
    Translator,
};
pub use query::{QueryCache, QueryKey};
pub use script::{InputSpec, NarrativeScript, ScriptStep};
pub use speaker::{Speaker, SpeakerRef, SpeakerRegistry, SpeakerTemplate};
pub use store::{InterfaceState, Store, Subscription, TypewriterState};
pub use typewriter::Typewriter;

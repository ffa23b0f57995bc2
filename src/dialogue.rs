//! Splits the current dialogue line into already-shown and newly revealed text.

use std::rc::Rc;

use serde::Serialize;

use crate::event::{flatten_text, DialogueState};
use crate::localization::Localize;
use crate::speaker::{Speaker, SpeakerRegistry};

/// View model for the dialogue box.
///
/// `stable_text` renders statically, `delta_text` goes through the reveal
/// animation. A fresh value is produced on every update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DialogueView {
    pub stable_text: String,
    pub delta_text: String,
    pub speaker: Option<Speaker>,
}

impl DialogueView {
    pub fn full_text(&self) -> String {
        format!("{}{}", self.stable_text, self.delta_text)
    }

    pub fn is_empty(&self) -> bool {
        self.stable_text.is_empty() && self.delta_text.is_empty()
    }
}

/// Derives the next dialogue view from the engine state and the previous view.
///
/// A line continues while the speaker id is unchanged and the new text
/// extends the previously shown text; only the suffix is animated then. A
/// call that adds no text and resolves to an equal speaker returns `previous`
/// itself.
pub fn reconcile<L: Localize + ?Sized>(
    current: Option<&DialogueState>,
    previous: &Rc<DialogueView>,
    speakers: &SpeakerRegistry,
    localizer: &L,
) -> Rc<DialogueView> {
    let text = flatten_text(current.and_then(|state| state.text.as_ref()), localizer);
    let speaker = current
        .and_then(|state| state.character.as_ref())
        .map(|character| speakers.resolve(character, localizer));

    let old_text = previous.full_text();
    let same_speaker = match (&speaker, &previous.speaker) {
        (Some(current), Some(prior)) => current.id == prior.id,
        _ => false,
    };

    if same_speaker && text.starts_with(old_text.as_str()) {
        let delta_text = text[old_text.len()..].to_string();
        if delta_text.is_empty() && !old_text.is_empty() && speaker == previous.speaker {
            return Rc::clone(previous);
        }
        return Rc::new(DialogueView {
            stable_text: old_text,
            delta_text,
            speaker,
        });
    }

    Rc::new(DialogueView {
        stable_text: String::new(),
        delta_text: text,
        speaker,
    })
}

//! Past dialogue steps prepared for the history screens.

use serde::Serialize;

use crate::event::{flatten_text, StepRecord};
use crate::localization::Localize;
use crate::speaker::SpeakerRegistry;

/// A choice made (or offered) at a past step, localized for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryChoice {
    pub text: String,
    pub hidden: bool,
    pub is_response: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub speaker: Option<String>,
    pub text: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub choices: Option<Vec<HistoryChoice>>,
    pub input_value: Option<serde_json::Value>,
}

impl HistoryEntry {
    pub fn from_step<L: Localize + ?Sized>(
        step: &StepRecord,
        speakers: &SpeakerRegistry,
        localizer: &L,
    ) -> Self {
        let dialogue = step.dialogue.as_ref();
        let speaker = dialogue
            .and_then(|dialogue| dialogue.character.as_ref())
            .map(|character| speakers.resolve(character, localizer));
        let (name, icon, color) = match speaker {
            Some(speaker) if !speaker.name.is_empty() => (
                Some(speaker.display_name()),
                speaker.icon,
                speaker.color,
            ),
            Some(speaker) => (None, speaker.icon, speaker.color),
            None => (None, None, None),
        };
        Self {
            speaker: name,
            text: flatten_text(dialogue.and_then(|d| d.text.as_ref()), localizer),
            icon,
            color,
            choices: step.choices.as_ref().map(|choices| {
                choices
                    .iter()
                    .map(|choice| HistoryChoice {
                        text: choice.text.flatten(localizer),
                        hidden: choice.hidden,
                        is_response: choice.is_response,
                    })
                    .collect()
            }),
            input_value: step.input_value.clone(),
        }
    }

    /// Choices worth showing as chips: hidden ones are skipped.
    pub fn visible_choices(&self) -> impl Iterator<Item = &HistoryChoice> {
        self.choices
            .iter()
            .flatten()
            .filter(|choice| !choice.hidden)
    }

    fn matches(&self, needle: &str) -> bool {
        self.speaker
            .as_deref()
            .is_some_and(|speaker| speaker.to_lowercase().contains(needle))
            || self.text.to_lowercase().contains(needle)
    }
}

/// Keeps entries whose speaker or text contains `search`, ignoring case.
///
/// An absent or empty search passes everything through in order.
pub fn filter_history(entries: Vec<HistoryEntry>, search: Option<&str>) -> Vec<HistoryEntry> {
    let needle = match search {
        Some(search) if !search.is_empty() => search.to_lowercase(),
        _ => return entries,
    };
    entries
        .into_iter()
        .filter(|entry| entry.matches(&needle))
        .collect()
}

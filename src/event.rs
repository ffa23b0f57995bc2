//! Engine-side state consumed by the interface layer.

use serde::{Deserialize, Serialize};

use crate::localization::Localize;
use crate::speaker::SpeakerRef;

/// Dialogue text, either a single string or ordered localizable fragments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DialogueText {
    Single(String),
    Parts(Vec<String>),
}

impl DialogueText {
    /// Localizes every fragment independently and joins them with one space.
    pub fn flatten<L: Localize + ?Sized>(&self, localizer: &L) -> String {
        match self {
            DialogueText::Single(text) => localizer.localize(text),
            DialogueText::Parts(parts) => parts
                .iter()
                .map(|part| localizer.localize(part))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    pub fn fragments(&self) -> &[String] {
        match self {
            DialogueText::Single(text) => std::slice::from_ref(text),
            DialogueText::Parts(parts) => parts,
        }
    }

    /// Appends fragments the way glued engine steps extend the current line.
    pub fn extend(&self, other: &DialogueText) -> DialogueText {
        let mut parts = self.fragments().to_vec();
        parts.extend(other.fragments().iter().cloned());
        DialogueText::Parts(parts)
    }
}

impl From<&str> for DialogueText {
    fn from(text: &str) -> Self {
        DialogueText::Single(text.to_string())
    }
}

impl From<Vec<&str>> for DialogueText {
    fn from(parts: Vec<&str>) -> Self {
        DialogueText::Parts(parts.into_iter().map(str::to_string).collect())
    }
}

/// Flattens optional text, treating absence as the empty string.
pub fn flatten_text<L: Localize + ?Sized>(text: Option<&DialogueText>, localizer: &L) -> String {
    text.map(|text| text.flatten(localizer)).unwrap_or_default()
}

/// The engine's current line of narration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueState {
    #[serde(default)]
    pub text: Option<DialogueText>,
    #[serde(default)]
    pub character: Option<SpeakerRef>,
}

impl DialogueState {
    pub fn new(character: Option<SpeakerRef>, text: impl Into<DialogueText>) -> Self {
        Self {
            text: Some(text.into()),
            character,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChoiceKind {
    Jump { label: String },
    Close,
}

/// A pending choice menu entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: DialogueText,
    #[serde(flatten)]
    pub kind: ChoiceKind,
    #[serde(default)]
    pub hidden: bool,
}

/// Choice menu entry as stored in step history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    pub text: DialogueText,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub is_response: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRequest {
    pub is_required: bool,
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub current_value: Option<serde_json::Value>,
}

/// One visited step of the narration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    #[serde(default)]
    pub dialogue: Option<DialogueState>,
    #[serde(default)]
    pub choices: Option<Vec<ChoiceRecord>>,
    #[serde(default)]
    pub input_value: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(key: &str) -> String {
        key.to_string()
    }

    #[test]
    fn fragments_join_with_single_space() {
        let text = DialogueText::from(vec!["Part one.", "Part two."]);
        assert_eq!(text.flatten(&identity), "Part one. Part two.");
    }

    #[test]
    fn each_fragment_is_localized_independently() {
        let localize = |key: &str| match key {
            "greet" => "Hi".to_string(),
            "name" => "Alice".to_string(),
            other => other.to_string(),
        };
        let text = DialogueText::from(vec!["greet", "name"]);
        assert_eq!(text.flatten(&localize), "Hi Alice");
    }

    #[test]
    fn absent_text_flattens_to_empty() {
        assert_eq!(flatten_text(None, &identity), "");
    }

    #[test]
    fn text_deserializes_from_string_or_list() {
        let state: DialogueState =
            serde_json::from_str(r#"{"text":["a","b"],"character":"alice"}"#).expect("parse");
        assert_eq!(state.text, Some(DialogueText::from(vec!["a", "b"])));
        assert_eq!(state.character, Some(SpeakerRef::from("alice")));

        let state: DialogueState = serde_json::from_str(r#"{"text":"plain"}"#).expect("parse");
        assert_eq!(state.text, Some(DialogueText::from("plain")));
        assert!(state.character.is_none());
    }

    #[test]
    fn choice_option_kinds_parse() {
        let jump: ChoiceOption =
            serde_json::from_str(r#"{"text":"Go","type":"jump","label":"park"}"#).expect("jump");
        assert_eq!(
            jump.kind,
            ChoiceKind::Jump {
                label: "park".to_string()
            }
        );
        let close: ChoiceOption =
            serde_json::from_str(r#"{"text":"Leave","type":"close","hidden":true}"#)
                .expect("close");
        assert_eq!(close.kind, ChoiceKind::Close);
        assert!(close.hidden);
    }
}

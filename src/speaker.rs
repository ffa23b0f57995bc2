//! Speaker identities and their resolution from engine references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::localization::Localize;

/// Display-ready narrator or character identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Speaker {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            surname: None,
            color: None,
            icon: None,
        }
    }

    /// Name shown above the dialogue box, surname appended when present.
    pub fn display_name(&self) -> String {
        match self.surname.as_deref() {
            Some(surname) if !surname.is_empty() => format!("{} {surname}", self.name),
            _ => self.name.clone(),
        }
    }
}

/// Speaker as handed over by the narrative engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeakerRef {
    Unresolved(String),
    Resolved(Speaker),
}

impl From<&str> for SpeakerRef {
    fn from(id: &str) -> Self {
        SpeakerRef::Unresolved(id.to_string())
    }
}

impl From<Speaker> for SpeakerRef {
    fn from(speaker: Speaker) -> Self {
        SpeakerRef::Resolved(speaker)
    }
}

/// Presentation defaults for a known speaker id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerTemplate {
    /// Localization key for the name; the speaker id is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Templates keyed by speaker id, stored as a `[speakers.<id>]` table in
/// the interface config.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeakerRegistry {
    templates: BTreeMap<String, SpeakerTemplate>,
}

impl SpeakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, template: SpeakerTemplate) {
        self.templates.insert(id.into(), template);
    }

    pub fn template(&self, id: &str) -> Option<&SpeakerTemplate> {
        self.templates.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Turns an engine reference into a speaker, localizing the display name.
    pub fn resolve<L: Localize + ?Sized>(&self, speaker: &SpeakerRef, localizer: &L) -> Speaker {
        match speaker {
            SpeakerRef::Resolved(speaker) => speaker.clone(),
            SpeakerRef::Unresolved(id) => match self.templates.get(id) {
                Some(template) => Speaker {
                    id: id.clone(),
                    name: localizer.localize(template.name.as_deref().unwrap_or(id)),
                    surname: template
                        .surname
                        .as_deref()
                        .map(|surname| localizer.localize(surname)),
                    color: template.color.clone(),
                    icon: template.icon.clone(),
                },
                None => Speaker::new(id.clone(), localizer.localize(id)),
            },
        }
    }
}

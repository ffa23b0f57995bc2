use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{UiError, UiResult};
use crate::event::DialogueText;
use crate::script::NarrativeScript;
use crate::speaker::SpeakerRef;

/// Maps a text key (or a literal) to a locale-appropriate string.
pub trait Localize {
    fn localize(&self, key: &str) -> String;
}

impl<F> Localize for F
where
    F: Fn(&str) -> String,
{
    fn localize(&self, key: &str) -> String {
        self(key)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizationCatalog {
    pub default_locale: String,
    #[serde(default)]
    pub locales: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for LocalizationCatalog {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            locales: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalizationIssue {
    pub locale: String,
    pub key: String,
    pub kind: LocalizationIssueKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalizationIssueKind {
    MissingKey,
    OrphanKey,
}

impl LocalizationCatalog {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
            locales: BTreeMap::new(),
        }
    }

    pub fn from_toml_str(input: &str) -> UiResult<Self> {
        toml::from_str(input).map_err(|err| UiError::Config(err.to_string()))
    }

    pub fn load_from(path: &Path) -> UiResult<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn insert_locale_table(
        &mut self,
        locale: impl Into<String>,
        entries: BTreeMap<String, String>,
    ) {
        self.locales.insert(locale.into(), entries);
    }

    pub fn locale_codes(&self) -> Vec<String> {
        self.locales.keys().cloned().collect()
    }

    /// Looks `key` up in `locale`, then in the default locale.
    pub fn resolve<'a>(&'a self, locale: &str, key: &str) -> Option<&'a str> {
        [locale, self.default_locale.as_str()]
            .into_iter()
            .find_map(|code| self.locales.get(code)?.get(key))
            .map(String::as_str)
    }

    /// Falls back to the key itself, which lets literal text pass through.
    pub fn resolve_or_key(&self, locale: &str, key: &str) -> String {
        self.resolve(locale, key).unwrap_or(key).to_string()
    }

    /// Reports, per locale, required keys with no entry and entries no
    /// script uses.
    pub fn validate_keys<'a, I>(&self, required_keys: I) -> Vec<LocalizationIssue>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let required: BTreeSet<&str> = required_keys
            .into_iter()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .collect();
        let required = &required;
        self.locales
            .iter()
            .flat_map(|(locale, table)| {
                let missing = required
                    .iter()
                    .filter(move |key| !table.contains_key(**key))
                    .map(|key| (key.to_string(), LocalizationIssueKind::MissingKey));
                let orphan = table
                    .keys()
                    .filter(move |key| !required.contains(key.as_str()))
                    .map(|key| (key.clone(), LocalizationIssueKind::OrphanKey));
                missing.chain(orphan).map(move |(key, kind)| LocalizationIssue {
                    locale: locale.clone(),
                    key,
                    kind,
                })
            })
            .collect()
    }
}

/// A catalog bound to the locale the player selected.
#[derive(Clone, Debug)]
pub struct Translator {
    catalog: LocalizationCatalog,
    locale: String,
}

impl Translator {
    pub fn new(catalog: LocalizationCatalog, locale: impl Into<String>) -> Self {
        Self {
            catalog,
            locale: locale.into(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
    }
}

impl Localize for Translator {
    fn localize(&self, key: &str) -> String {
        self.catalog.resolve_or_key(&self.locale, key)
    }
}

/// Every string in a script that goes through the localizer when displayed.
pub fn collect_script_keys(script: &NarrativeScript) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let insert_text = |out: &mut BTreeSet<String>, text: &DialogueText| {
        for fragment in text.fragments() {
            if !fragment.trim().is_empty() {
                out.insert(fragment.to_string());
            }
        }
    };

    for steps in script.labels.values() {
        for step in steps {
            if let Some(dialogue) = &step.dialogue {
                if let Some(text) = &dialogue.text {
                    insert_text(&mut out, text);
                }
                if let Some(SpeakerRef::Unresolved(id)) = &dialogue.character {
                    out.insert(id.clone());
                }
            }
            for choice in step.choices.iter().flatten() {
                insert_text(&mut out, &choice.text);
            }
        }
    }

    out
}

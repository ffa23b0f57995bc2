//! JSON narrative scripts played by [`crate::ScriptedNarrative`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{UiError, UiResult};
use crate::event::{ChoiceKind, ChoiceOption, DialogueState};

fn default_start() -> String {
    "start".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NarrativeScript {
    #[serde(default = "default_start")]
    pub start: String,
    pub labels: BTreeMap<String, Vec<ScriptStep>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    #[serde(default)]
    pub dialogue: Option<DialogueState>,
    /// Appends this step's text to the line already on screen.
    #[serde(default)]
    pub glue: bool,
    #[serde(default)]
    pub choices: Option<Vec<ChoiceOption>>,
    #[serde(default)]
    pub input: Option<InputSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(default, rename = "type")]
    pub input_type: Option<String>,
}

impl NarrativeScript {
    pub fn from_json(input: &str) -> UiResult<Self> {
        let script: Self =
            serde_json::from_str(input).map_err(|err| UiError::from_json(input, &err))?;
        script.validate()?;
        Ok(script)
    }

    pub fn steps(&self, label: &str) -> Option<&[ScriptStep]> {
        self.labels.get(label).map(Vec::as_slice)
    }

    pub fn validate(&self) -> UiResult<()> {
        match self.labels.get(&self.start) {
            None => {
                return Err(UiError::InvalidScript(format!(
                    "missing start label '{}'",
                    self.start
                )))
            }
            Some(steps) if steps.is_empty() => {
                return Err(UiError::InvalidScript(format!(
                    "start label '{}' has no steps",
                    self.start
                )))
            }
            Some(_) => {}
        }

        for (label, steps) in &self.labels {
            for (index, step) in steps.iter().enumerate() {
                let Some(choices) = &step.choices else {
                    continue;
                };
                if choices.is_empty() {
                    return Err(UiError::InvalidScript(format!(
                        "step {index} of '{label}' has an empty choice menu"
                    )));
                }
                for choice in choices {
                    if let ChoiceKind::Jump { label: target } = &choice.kind {
                        let reachable = self
                            .labels
                            .get(target)
                            .is_some_and(|steps| !steps.is_empty());
                        if !reachable {
                            return Err(UiError::InvalidScript(format!(
                                "choice target '{target}' not found"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

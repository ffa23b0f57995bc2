//! Narrative engine seam and an in-memory engine that plays JSON scripts.

use std::cell::RefCell;
use std::future::{ready, Future};

use tracing::debug;

use crate::error::{UiError, UiResult};
use crate::event::{
    ChoiceKind, ChoiceOption, ChoiceRecord, DialogueState, InputRequest, StepRecord,
};
use crate::script::{NarrativeScript, ScriptStep};

/// State the interface layer pulls from the narrative engine.
///
/// Reads are synchronous; mutations resolve asynchronously.
pub trait NarrativeEngine {
    fn dialogue(&self) -> Option<DialogueState>;
    fn choice_menu_options(&self) -> Vec<ChoiceOption>;
    fn input_request(&self) -> InputRequest;
    fn can_go_next(&self) -> bool;
    fn can_go_back(&self) -> bool;
    /// Steps visited since the engine entered the current label.
    fn current_label_history(&self) -> Vec<StepRecord>;
    fn narrative_history(&self) -> Vec<StepRecord>;

    /// `index` refers to the position in [`NarrativeEngine::choice_menu_options`].
    fn select_choice(&self, index: usize) -> impl Future<Output = UiResult<()>>;
    fn go_next(&self) -> impl Future<Output = UiResult<()>>;
    fn submit_input(&self, value: serde_json::Value) -> impl Future<Output = UiResult<()>>;
}

#[derive(Clone, Debug)]
struct VisitedStep {
    label: String,
    record: StepRecord,
}

#[derive(Clone, Debug)]
struct Cursor {
    label: String,
    index: usize,
    dialogue: Option<DialogueState>,
    input_value: Option<serde_json::Value>,
    finished: bool,
    history: Vec<VisitedStep>,
}

/// Plays a [`NarrativeScript`] step by step.
#[derive(Debug)]
pub struct ScriptedNarrative {
    script: NarrativeScript,
    cursor: RefCell<Cursor>,
    back_stack: RefCell<Vec<Cursor>>,
}

impl ScriptedNarrative {
    pub fn new(script: NarrativeScript) -> UiResult<Self> {
        script.validate()?;
        let mut cursor = Cursor {
            label: script.start.clone(),
            index: 0,
            dialogue: None,
            input_value: None,
            finished: false,
            history: Vec::new(),
        };
        enter_step(&script, &mut cursor, script.start.clone(), 0)?;
        Ok(Self {
            script,
            cursor: RefCell::new(cursor),
            back_stack: RefCell::new(Vec::new()),
        })
    }

    pub fn from_json(input: &str) -> UiResult<Self> {
        Self::new(NarrativeScript::from_json(input)?)
    }

    pub fn script(&self) -> &NarrativeScript {
        &self.script
    }

    pub fn is_finished(&self) -> bool {
        self.cursor.borrow().finished
    }

    pub fn current_label(&self) -> String {
        self.cursor.borrow().label.clone()
    }

    /// Restores the state before the last transition.
    pub fn go_back(&self) -> UiResult<()> {
        let previous = self
            .back_stack
            .borrow_mut()
            .pop()
            .ok_or_else(|| UiError::Engine("nothing to go back to".to_string()))?;
        debug!(label = %previous.label, index = previous.index, "stepping back");
        *self.cursor.borrow_mut() = previous;
        Ok(())
    }

    fn current_step(&self) -> Option<ScriptStep> {
        let cursor = self.cursor.borrow();
        if cursor.finished {
            return None;
        }
        self.script
            .steps(&cursor.label)
            .and_then(|steps| steps.get(cursor.index))
            .cloned()
    }

    /// Runs `change` on a copy of the cursor and commits it only on success.
    fn transition(&self, change: impl FnOnce(&mut Cursor) -> UiResult<()>) -> UiResult<()> {
        let mut next = self.cursor.borrow().clone();
        change(&mut next)?;
        let previous = std::mem::replace(&mut *self.cursor.borrow_mut(), next);
        self.back_stack.borrow_mut().push(previous);
        Ok(())
    }

    fn advance(&self) -> UiResult<()> {
        let step = self.current_step().ok_or(UiError::EndOfNarrative)?;
        if step.choices.is_some() {
            return Err(UiError::Engine("a choice is pending".to_string()));
        }
        if step.input.is_some() && self.cursor.borrow().input_value.is_none() {
            return Err(UiError::Engine("input is required".to_string()));
        }
        self.transition(|cursor| step_forward(&self.script, cursor))
    }

    fn apply_choice(&self, index: usize) -> UiResult<()> {
        let step = self.current_step().ok_or(UiError::EndOfNarrative)?;
        let options = step.choices.unwrap_or_default();
        let option = options.get(index).ok_or(UiError::InvalidChoice)?.clone();
        self.transition(|cursor| {
            if let Some(visited) = cursor.history.last_mut() {
                visited.record.choices = Some(
                    options
                        .iter()
                        .enumerate()
                        .map(|(position, choice)| ChoiceRecord {
                            text: choice.text.clone(),
                            hidden: choice.hidden,
                            is_response: position == index,
                        })
                        .collect(),
                );
            }
            match &option.kind {
                ChoiceKind::Jump { label } => enter_step(&self.script, cursor, label.clone(), 0),
                ChoiceKind::Close => step_forward(&self.script, cursor),
            }
        })
    }

    fn apply_input(&self, value: serde_json::Value) -> UiResult<()> {
        let step = self.current_step().ok_or(UiError::EndOfNarrative)?;
        if step.input.is_none() || self.cursor.borrow().input_value.is_some() {
            return Err(UiError::InputNotRequired);
        }
        self.transition(|cursor| {
            if let Some(visited) = cursor.history.last_mut() {
                visited.record.input_value = Some(value.clone());
            }
            cursor.input_value = Some(value);
            Ok(())
        })
    }
}

fn step_forward(script: &NarrativeScript, cursor: &mut Cursor) -> UiResult<()> {
    let len = script.steps(&cursor.label).map_or(0, <[ScriptStep]>::len);
    let next = cursor.index + 1;
    if next >= len {
        debug!(label = %cursor.label, "narrative finished");
        cursor.finished = true;
        cursor.dialogue = None;
        cursor.input_value = None;
        return Ok(());
    }
    let label = cursor.label.clone();
    enter_step(script, cursor, label, next)
}

fn enter_step(
    script: &NarrativeScript,
    cursor: &mut Cursor,
    label: String,
    index: usize,
) -> UiResult<()> {
    let step = script
        .steps(&label)
        .and_then(|steps| steps.get(index))
        .ok_or_else(|| UiError::InvalidScript(format!("step {index} of '{label}' not found")))?;
    debug!(%label, index, "entering step");

    let continues_line = step.glue && cursor.dialogue.is_some() && cursor.label == label;
    cursor.label = label.clone();
    cursor.index = index;
    cursor.input_value = None;

    match (&step.dialogue, continues_line) {
        (Some(addition), true) => {
            let mut line = cursor.dialogue.clone().unwrap_or_default();
            line.text = match (&line.text, &addition.text) {
                (Some(current), Some(extra)) => Some(current.extend(extra)),
                (current, extra) => extra.clone().or_else(|| current.clone()),
            };
            if addition.character.is_some() {
                line.character = addition.character.clone();
            }
            cursor.dialogue = Some(line);
            match cursor.history.last_mut() {
                Some(visited) => visited.record.dialogue = cursor.dialogue.clone(),
                None => cursor.history.push(VisitedStep {
                    label,
                    record: StepRecord {
                        dialogue: cursor.dialogue.clone(),
                        ..StepRecord::default()
                    },
                }),
            }
        }
        _ => {
            if step.dialogue.is_some() || step.choices.is_none() {
                cursor.dialogue = step.dialogue.clone();
            }
            cursor.history.push(VisitedStep {
                label,
                record: StepRecord {
                    dialogue: step.dialogue.clone(),
                    ..StepRecord::default()
                },
            });
        }
    }
    cursor.finished = false;
    Ok(())
}

impl NarrativeEngine for ScriptedNarrative {
    fn dialogue(&self) -> Option<DialogueState> {
        self.cursor.borrow().dialogue.clone()
    }

    fn choice_menu_options(&self) -> Vec<ChoiceOption> {
        self.current_step()
            .and_then(|step| step.choices)
            .unwrap_or_default()
    }

    fn input_request(&self) -> InputRequest {
        let input = self.current_step().and_then(|step| step.input);
        let cursor = self.cursor.borrow();
        InputRequest {
            is_required: input.is_some() && cursor.input_value.is_none(),
            input_type: input.and_then(|input| input.input_type),
            current_value: cursor.input_value.clone(),
        }
    }

    fn can_go_next(&self) -> bool {
        self.current_step()
            .is_some_and(|step| step.choices.is_none())
    }

    fn can_go_back(&self) -> bool {
        !self.back_stack.borrow().is_empty()
    }

    fn current_label_history(&self) -> Vec<StepRecord> {
        let cursor = self.cursor.borrow();
        let mut out: Vec<StepRecord> = cursor
            .history
            .iter()
            .rev()
            .take_while(|visited| visited.label == cursor.label)
            .map(|visited| visited.record.clone())
            .collect();
        out.reverse();
        out
    }

    fn narrative_history(&self) -> Vec<StepRecord> {
        self.cursor
            .borrow()
            .history
            .iter()
            .map(|visited| visited.record.clone())
            .collect()
    }

    fn select_choice(&self, index: usize) -> impl Future<Output = UiResult<()>> {
        ready(self.apply_choice(index))
    }

    fn go_next(&self) -> impl Future<Output = UiResult<()>> {
        ready(self.advance())
    }

    fn submit_input(&self, value: serde_json::Value) -> impl Future<Output = UiResult<()>> {
        ready(self.apply_input(value))
    }
}

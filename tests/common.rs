use visual_novel_interface::{
    ActionOutcome, Localize, NarrationController, NarrationInterface, ScriptedNarrative,
};

pub const BRANCHING_SCRIPT: &str = r#"{
    "labels": {
        "start": [
            { "dialogue": { "character": "alice", "text": "Morning." } },
            { "dialogue": { "text": "Coffee?" }, "glue": true },
            { "dialogue": { "character": "bob", "text": "Which one?" },
              "choices": [
                  { "text": "Espresso", "type": "jump", "label": "espresso" },
                  { "text": "None", "type": "close" }
              ] },
            { "dialogue": { "character": "alice", "text": "Suit yourself." } }
        ],
        "espresso": [
            { "dialogue": { "character": "bob", "text": "Strong choice." } },
            { "dialogue": { "character": "alice", "text": "Always." } }
        ]
    }
}"#;

/// Advances through the script, picking menu positions from `picks` in order
/// (position 0 once they run out), and returns the number of actions applied.
pub fn play_through<L: Localize>(
    engine: &ScriptedNarrative,
    interface: &NarrationInterface<L>,
    controller: &NarrationController,
    picks: &[usize],
    max_steps: usize,
) -> usize {
    let mut picks = picks.iter().copied();
    let mut applied = 0;
    for _ in 0..max_steps {
        if engine.is_finished() {
            break;
        }
        interface.dialogue(engine);
        let menu = interface.choice_menu_options(engine);
        let outcome = if menu.is_empty() {
            pollster::block_on(controller.go_next(engine, interface))
        } else {
            let item = &menu[picks.next().unwrap_or(0)];
            pollster::block_on(controller.select_choice(engine, interface, item))
        };
        assert_eq!(outcome, ActionOutcome::Applied);
        applied += 1;
    }
    applied
}

//! Walk a small guard-post dialogue to completion, printing each event.
//!
//! Run with: cargo run --example guard_post

use dialogue_engine::core::context::DialogueContext;
use dialogue_engine::core::cursor::StepEvent;

const GUARD_POST: &str = r#"{
    "version": 1,
    "nodes": [
        { "type": "line", "speaker": "guard", "text": "halt, {name}!", "next": 1 },
        { "type": "choice", "options": [
            { "text": "I come in peace.", "next": 2 },
            { "text": "Take this coin.", "next": 3, "condition": "has_coin" }
        ] },
        { "type": "line", "speaker": "guard", "text": "then be on your way.", "next": 4 },
        { "type": "call", "function": "open_gate", "next": 4 },
        { "type": "end" }
    ]
}"#;

fn main() {
    let mut ctx = DialogueContext::builder()
        .seed(42)
        .build(GUARD_POST)
        .expect("demo document is valid");

    ctx.set_variable_str("name", "traveler");
    ctx.set_variable_bool("has_coin", true);
    ctx.set_all_callbacks(|name| println!("  [event fired: {name}]"));

    loop {
        match ctx.step(0).expect("demo walk stays in contract") {
            StepEvent::Line(line) => println!("{}: {}", line.speaker, line.text),
            StepEvent::Options(options) => {
                for option in &options {
                    println!("  ({}) {}", option.id, option.text);
                }
                // Always bribe if the option is on the table.
                let pick = options.last().expect("choice offers options").id;
                println!("  -> picking {pick}");
                ctx.reply(0, pick).expect("offered id is valid");
            }
            StepEvent::FunctionCalled => {}
            StepEvent::Done => {
                println!("(dialogue over)");
                break;
            }
        }
    }
}

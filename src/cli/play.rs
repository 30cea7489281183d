//! Terminal player - plays one cutscene script, printing directives

use std::io::{self, BufRead, Write};

use crate::application::engine::Engine;
use crate::types::directive::Directive;

const FRAME: f32 = 0.1;

/// Drive a script to completion in the terminal. Dialogue pauses for Enter;
/// typing `s` fast-forwards the rest of the cutscene.
pub fn run_play(src: &str, debug: bool) -> anyhow::Result<()> {
    let mut engine = Engine::from_script(src)?;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let report = engine.tick(FRAME);
        let mut spoke = false;
        for directive in &report.directives {
            spoke |= print_directive(directive);
        }
        if debug {
            println!(
                "  [state={:?} clock={:.1}s vars={}]",
                report.state,
                engine.clock(),
                engine
                    .vars()
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(",")
            );
        }
        if !engine.are_lists_running() {
            break;
        }
        if spoke {
            print!("  [Enter] continue, [s] skip > ");
            io::stdout().flush()?;
            let input = lines.next().transpose()?.unwrap_or_default();
            if input.trim() == "s" {
                for directive in engine.skip_all() {
                    print_directive(&directive);
                }
                engine.tick(FRAME);
                break;
            }
        }
    }

    println!("(end)");
    Ok(())
}

fn print_directive(directive: &Directive) -> bool {
    match directive {
        Directive::Say { speaker, text } => {
            println!("{speaker}: {text}");
            true
        }
        Directive::PlaySound { name } => {
            println!("  *sound: {name}*");
            false
        }
        Directive::PlayMusic { name } => {
            println!("  *music: {name}*");
            false
        }
        Directive::Autosave => {
            println!("  *autosave*");
            false
        }
        Directive::BeginOptions { conversation } => {
            println!("  *options: {conversation}*");
            false
        }
        _ => false,
    }
}

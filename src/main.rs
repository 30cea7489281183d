//! CLI entry point for maku
//!
//! Plays a cutscene script in the terminal.

use std::fs;
use std::path::PathBuf;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "play" => {
            if args.len() < 3 {
                eprintln!("Error: Missing script file path");
                eprintln!();
                print_usage();
                process::exit(1);
            }
            let file_path = PathBuf::from(&args[2]);
            let debug = args.get(3).map(|s| s == "--debug").unwrap_or(false);
            run_play(file_path, debug);
        }
        "--help" | "-h" => {
            print_usage();
        }
        other => {
            eprintln!("Error: Unknown command '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("maku - Cutscene Sequencing Engine");
    println!();
    println!("USAGE:");
    println!("    maku play <script.md> [--debug]");
    println!();
    println!("COMMANDS:");
    println!("    play <file> [--debug]    Play a cutscene script in the terminal");
    println!("    --help, -h               Show this help message");
    println!();
    println!("OPTIONS:");
    println!("    --debug    Show engine state after every frame");
}

fn run_play(file_path: PathBuf, debug: bool) {
    let src = match fs::read_to_string(&file_path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Error: Failed to read file '{}'", file_path.display());
            eprintln!("Reason: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = maku::cli::play::run_play(&src, debug) {
        eprintln!("Error: Player failed");
        eprintln!("Reason: {err}");
        process::exit(1);
    }
}

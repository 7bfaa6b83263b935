//! # Folio CLI
//!
//! Usage:
//!   folio input.json -o layout.json
//!   echo '{ ... }' | folio --pretty
//!
//! Without `-o` the layout tree is written to stdout. Set `RUST_LOG=warn`
//! (or `debug`) to see what the engine had to work around.

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: folio [input.json] [-o output.json] [--pretty]");
        return;
    }

    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1]).unwrap_or_else(|e| fail(&format!("Failed to read {}: {}", args[1], e)))
    } else {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            fail(&format!("Failed to read stdin: {}", e));
        }
        buf
    };

    let output_path = args.windows(2).find(|w| w[0] == "-o").map(|w| w[1].clone());
    let pretty = args.iter().any(|a| a == "--pretty");

    let document = match folio::layout_json(&input) {
        Ok(document) => document,
        Err(e) => fail(&format!("✗ {}", e)),
    };

    let json = if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    };
    let json = json.unwrap_or_else(|e| fail(&format!("✗ Failed to serialize layout: {}", e)));

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &json) {
                fail(&format!("✗ Failed to write {}: {}", path, e));
            }
            eprintln!("✓ Laid out {} pages to {}", document.page_count(), path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{}", json) {
                fail(&format!("✗ Failed to write output: {}", e));
            }
            eprintln!("✓ Laid out {} pages", document.page_count());
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

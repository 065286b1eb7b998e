//! Preview — interactive generation shell for testing prompt trees.
//!
//! Usage: preview --tree <path> [--options <path>] [--seed <n>] [--separator <s>]
//!
//! Commands:
//!   gen [n]        — generate n prompts (default 1)
//!   fragments      — generate once, one fragment per line
//!   seed <n>       — set RNG seed and restart the schedule
//!   reset          — restart the schedule and sequential cursors
//!   tree           — print the tree outline
//!   brackets       — show the emphasis range of every node
//!   help           — list commands
//!   quit           — exit

use prompt_weaver::core::brackets;
use prompt_weaver::core::engine::{GenerationOptions, PromptEngine};
use prompt_weaver::schema::node::{ConfigNode, ContentType};
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut tree_path = None;
    let mut options_path = None;
    let mut seed = None;
    let mut separator = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--tree" if i + 1 < args.len() => {
                i += 1;
                tree_path = Some(args[i].clone());
            }
            "--options" if i + 1 < args.len() => {
                i += 1;
                options_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse::<u64>().ok();
            }
            "--separator" if i + 1 < args.len() => {
                i += 1;
                separator = Some(args[i].clone());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(tree_path) = tree_path else {
        eprintln!("ERROR: --tree is required");
        print_usage();
        std::process::exit(1);
    };

    let tree = match ConfigNode::load_from_ron(Path::new(&tree_path)) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("ERROR: Failed to load tree: {}", e);
            std::process::exit(1);
        }
    };

    let options = match options_path {
        Some(ref path) => match GenerationOptions::load_from_ron(Path::new(path)) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("ERROR: Failed to load options: {}", e);
                std::process::exit(1);
            }
        },
        None => GenerationOptions::default(),
    };
    let separator = separator.unwrap_or(options.separator);
    let seed = seed.or(options.seed).unwrap_or(42);

    let mut engine = match build_engine(tree, &separator, seed) {
        Some(engine) => engine,
        None => std::process::exit(1),
    };

    println!("Loaded tree '{}' ({} nodes)", engine.tree().name, count_nodes(engine.tree()));
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "gen" | "g" => {
                let count = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(1);
                println!();
                for (n, prompt) in engine.generate_variants(count).iter().enumerate() {
                    println!("[{}] {}", n + 1, prompt);
                }
                println!();
            }
            "fragments" | "f" => {
                let fragments = engine.generate_fragments();
                println!("\n--- {} fragments ---", fragments.len());
                for fragment in &fragments {
                    println!("{}", fragment);
                }
                println!("--- End ---\n");
            }
            "seed" => match parts.get(1).and_then(|s| s.parse::<u64>().ok()) {
                Some(new_seed) => {
                    let tree = engine.tree().clone();
                    if let Some(rebuilt) = build_engine(tree, &separator, new_seed) {
                        engine = rebuilt;
                        println!("Seed set to {}", new_seed);
                    }
                }
                None => println!("Usage: seed <n>"),
            },
            "reset" => {
                engine.reset();
                println!("Schedule and cursors reset.");
            }
            "tree" | "t" => {
                print_outline(engine.tree(), 0);
            }
            "brackets" | "b" => {
                print_brackets(engine.tree(), 0);
            }
            _ => {
                println!("Unknown command '{}'. Type 'help' for commands.", cmd);
            }
        }
    }
}

fn build_engine(tree: ConfigNode, separator: &str, seed: u64) -> Option<PromptEngine> {
    match PromptEngine::builder()
        .with_tree(tree)
        .separator(separator)
        .seed(seed)
        .build()
    {
        Ok(engine) => Some(engine),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            None
        }
    }
}

fn count_nodes(node: &ConfigNode) -> usize {
    1 + node
        .nested_configs
        .iter()
        .map(|child| count_nodes(child))
        .sum::<usize>()
}

fn print_outline(node: &ConfigNode, indent: usize) {
    let pad = "  ".repeat(indent);
    let state = if node.enabled { "" } else { " (disabled)" };
    match node.content_type {
        ContentType::String => println!(
            "{}- {} [{}] {} fragments{}",
            pad,
            node.name,
            node.selection_mode.name(),
            node.string_contents.len(),
            state
        ),
        ContentType::Nested => {
            println!(
                "{}+ {} [{}]{}",
                pad,
                node.name,
                node.selection_mode.name(),
                state
            );
            for child in &node.nested_configs {
                print_outline(child, indent + 1);
            }
        }
    }
}

fn print_brackets(node: &ConfigNode, indent: usize) {
    let pad = "  ".repeat(indent);
    println!(
        "{}{}: {}",
        pad,
        node.name,
        brackets::preview(node.bracket_min, node.bracket_max, " / ")
    );
    if node.content_type == ContentType::Nested {
        for child in &node.nested_configs {
            print_brackets(child, indent + 1);
        }
    }
}

fn print_usage() {
    println!("Usage: preview --tree <path> [--options <path>] [--seed <n>] [--separator <s>]");
}

fn print_help() {
    println!("Commands:");
    println!("  gen [n]     — generate n prompts (default 1)");
    println!("  fragments   — generate once, one fragment per line");
    println!("  seed <n>    — set RNG seed and restart the schedule");
    println!("  reset       — restart the schedule and sequential cursors");
    println!("  tree        — print the tree outline");
    println!("  brackets    — show the emphasis range of every node");
    println!("  help        — list commands");
    println!("  quit        — exit");
}

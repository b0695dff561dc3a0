/// Interactive PS2 disc image console

use ps2image::map::draw_region_map;
use ps2image::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

/// Command completer for the REPL
struct CommandCompleter {
    commands: Vec<&'static str>,
}

impl CommandCompleter {
    fn new() -> Self {
        Self {
            commands: vec![
                "boot",
                "build",
                "exit",
                "help",
                "info",
                "layout",
                "map",
                "open",
                "publisher",
                "quit",
                "tree",
                "volume",
            ],
        }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only complete the command name
        let line_to_cursor = &line[..pos];
        if line_to_cursor.contains(' ') {
            return Ok((pos, vec![]));
        }

        let prefix = line_to_cursor.to_lowercase();
        let matches: Vec<Pair> = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(&prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Get the path to the history file
fn history_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".ps2img_history");
        p
    })
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return run_batch(&args);
    }

    run_console();
    ExitCode::SUCCESS
}

/// Pack `<source> <output> [--volume NAME] [--publisher NAME]` without the console
fn run_batch(args: &[String]) -> ExitCode {
    let mut positional = Vec::new();
    let mut spec = VolumeSpec::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            "--volume" | "--publisher" | "--boot" => {
                let Some(value) = iter.next() else {
                    eprintln!("Missing value for {}", arg);
                    return ExitCode::FAILURE;
                };
                spec = match arg.as_str() {
                    "--volume" => spec.with_volume_identifier(value),
                    "--publisher" => spec.with_publisher(value),
                    _ => spec.with_boot_file(value),
                };
            }
            _ => positional.push(arg.as_str()),
        }
    }

    let [source, output] = positional[..] else {
        print_usage();
        return ExitCode::FAILURE;
    };

    let job = match Packer::start(source, output, spec) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    loop {
        let progress = job.poll();
        if progress.new_state {
            println!("{}", progress.state);
        }
        if progress.new_file {
            if let Some(name) = &progress.file_name {
                println!("  [{:>5.1}%] {}", progress.progress * 100.0, name);
            }
        }
        if progress.finished {
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }

    match job.wait() {
        Ok(()) => {
            println!("Wrote {}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_console() {
    println!("=== PS2 Image Builder ===");
    println!("Interactive console for planning and writing PS2 DVD images.");
    println!("Type 'help' for available commands\n");

    let mut rl = Editor::new().expect("Failed to create editor");
    rl.set_helper(Some(CommandCompleter::new()));

    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    let mut image: Option<DiscImage> = None;

    loop {
        let input = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                if let Some(history_path) = history_path() {
                    let _ = rl.save_history(&history_path);
                }
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        let parts = parse_command_line(input);
        if parts.is_empty() {
            continue;
        }
        let command = parts[0].to_lowercase();

        match command.as_str() {
            "help" => print_help(),
            "quit" | "exit" => {
                if let Some(history_path) = history_path() {
                    let _ = rl.save_history(&history_path);
                }
                println!("Goodbye!");
                break;
            }
            "open" => {
                if parts.len() < 2 {
                    println!("Usage: open <directory>");
                    continue;
                }
                match DiscImage::open(&parts[1]) {
                    Ok(img) => {
                        println!(
                            "Opened: {} ({} directories, {} files)",
                            parts[1],
                            img.tree().directory_count(),
                            img.tree().file_count()
                        );
                        image = Some(img);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "volume" | "publisher" | "boot" => {
                let Some(ref mut img) = image else {
                    println!("No directory opened. Use 'open <directory>' first.");
                    continue;
                };
                if parts.len() < 2 {
                    println!("Usage: {} <name>", command);
                    continue;
                }
                let spec = img.spec().clone();
                let spec = match command.as_str() {
                    "volume" => spec.with_volume_identifier(&parts[1]),
                    "publisher" => spec.with_publisher(&parts[1]),
                    _ => spec.with_boot_file(&parts[1]),
                };
                match img.set_spec(spec) {
                    Ok(()) => println!("Set {} to {}", command, parts[1]),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "info" => match image {
                Some(ref img) => print_info(img),
                None => println!("No directory opened. Use 'open <directory>' first."),
            },
            "tree" => match image {
                Some(ref img) => print_tree(img),
                None => println!("No directory opened. Use 'open <directory>' first."),
            },
            "layout" => match image {
                Some(ref img) => print_layout(img),
                None => println!("No directory opened. Use 'open <directory>' first."),
            },
            "map" => match image {
                Some(ref img) => draw_region_map(img),
                None => println!("No directory opened. Use 'open <directory>' first."),
            },
            "build" | "save" => {
                let Some(ref img) = image else {
                    println!("No directory opened. Use 'open <directory>' first.");
                    continue;
                };
                if parts.len() < 2 {
                    println!("Usage: build <path>");
                    continue;
                }
                let progress = SharedProgress::new();
                match img.save(&parts[1], &progress) {
                    Ok(()) => println!("Wrote {} ({} bytes)", parts[1], img.total_bytes()),
                    Err(e) => println!("Error: {}", e),
                }
            }
            _ => println!("Unknown command: {}. Type 'help' for available commands.", command),
        }
    }
}

/// Split a command line on whitespace, keeping quoted runs together
fn parse_command_line(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

fn print_usage() {
    println!("Usage: ps2img [<source-dir> <output.iso> [--volume NAME] [--publisher NAME] [--boot FILE]]");
    println!("Without arguments an interactive console is started.");
}

fn print_help() {
    println!("Available commands:");
    println!("  open <directory>      - Enumerate a directory and plan an image (use quotes for paths with spaces)");
    println!("  info                  - Show volume and size information");
    println!("  tree                  - List directories and files in image order");
    println!("  layout                - Show the sector placement of every directory and file");
    println!("  map                   - Visual region map");
    println!("  volume <name>         - Set the volume identifier");
    println!("  publisher <name>      - Set the publisher identifier");
    println!("  boot <file>           - Set the root file sorted first");
    println!("  build <path>          - Write the image to a file (save)");
    println!("  help                  - Show this help");
    println!("  quit, exit            - Exit");
}

fn print_info(image: &DiscImage) {
    let spec = image.spec();
    let budget = image.budget();
    println!("Volume:          {}", spec.volume_identifier);
    println!("Publisher:       {}", spec.publisher_identifier);
    println!("Boot file:       {}", spec.boot_file);
    println!("Directories:     {}", image.tree().directory_count());
    println!("Files:           {}", image.tree().file_count());
    println!("Data:            {} bytes", image.tree().data_size());
    println!("Path table:      {} bytes", budget.path_table_size);
    println!("Partition start: {}", budget.partition_start);
    println!("Partition size:  {} blocks", budget.partition_len());
    println!("Data start:      {}", budget.data_start);
    println!(
        "Total:           {} sectors ({} bytes, {} padding)",
        budget.total_sectors,
        image.total_bytes(),
        budget.pad_sectors
    );
}

fn print_tree(image: &DiscImage) {
    let tree = image.tree();
    println!("/");
    for id in tree.depth_first() {
        let node = tree.node(id);
        let indent = "  ".repeat(node.depth as usize + 1);
        if node.is_directory() {
            println!("{}{}/", indent, node.name());
        } else {
            println!("{}{} ({} bytes)", indent, node.name(), node.entry.size);
        }
    }
}

fn print_layout(image: &DiscImage) {
    let tree = image.tree();
    let allocation = image.allocation();
    println!("{:<40} {:>8} {:>8} {:>8} {:>8} {:>6}", "Path", "Sector", "LBA", "Local", "Sectors", "UID");
    for id in tree.sorted_directories().into_iter().chain(tree.files()) {
        let Some(loc) = allocation.get(id) else {
            continue;
        };
        println!(
            "{:<40} {:>8} {:>8} {:>8} {:>8} {:>6X}",
            tree.display_path(id),
            loc.global_sector,
            loc.lba,
            loc.local_sector,
            loc.sectors,
            loc.unique_id
        );
    }
}

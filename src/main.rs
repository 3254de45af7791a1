//! Command-line interface for the PICO-8 to TIC-80 cartridge converter
//!
//! Usage: pico2tic <input> [output]

use std::env;
use std::path::Path;
use std::process;

use pico2tic::config::VERSION;
use pico2tic::convert_cart::{default_output_name, ConvertCart};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.contains(&"--help".to_string()) || args.contains(&"-h".to_string()) {
        print_usage(args.first().map(String::as_str).unwrap_or("pico2tic"));
        process::exit(
            if args.len() == 2 && (args[1] == "--help" || args[1] == "-h") {
                0
            } else {
                1
            },
        );
    }

    let input_path = &args[1];
    let output_path = match args.get(2) {
        Some(p) => p.clone(),
        None => default_output_name(input_path),
    };

    if !Path::new(input_path).exists() {
        eprintln!("Error: Input file not found: {}", input_path);
        eprintln!();
        print_usage(&args[0]);
        process::exit(1);
    }

    println!("pico2tic v{}", VERSION);
    println!();
    println!("Input:  {}", input_path);
    println!("Output: {}", output_path);
    println!();
    println!("Converting...");

    let converter = ConvertCart::new();
    match converter.convert(input_path, &output_path) {
        Ok(()) => {
            println!();
            println!("✓ Success!");
            println!("  Cartridge written to: {}", output_path);
            println!();
            process::exit(0);
        }
        Err(e) => {
            eprintln!();
            eprintln!("✗ Conversion failed:");
            eprintln!("  {}", e);
            eprintln!();
            process::exit(1);
        }
    }
}

fn print_usage(program_name: &str) {
    let name = Path::new(program_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("pico2tic");

    println!("pico2tic v{}", VERSION);
    println!();
    println!("USAGE:");
    println!("  {} <input> [output]", name);
    println!();
    println!("DESCRIPTION:");
    println!("  Converts PICO-8 cartridges (.p8 text or .p8.png image) into TIC-80");
    println!("  .tic cartridges, and wraps .tic cartridges into TIC-80 PNG files.");
    println!();
    println!("  When no output is given the name is derived from the input:");
    println!("  .p8 and .p8.png become .tic, .tic becomes .tic.png.");
    println!();
    println!("  The output file will be overwritten without prompting if it exists.");
    println!();
    println!("ARGUMENTS:");
    println!("  <input>    PICO-8 cartridge (.p8, .p8.png), TIC-80 PNG, or .tic file");
    println!("  [output]   Output file name (optional)");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help    Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("  {} game.p8", name);
    println!("  {} game.p8.png carts/game.tic", name);
    println!("  {} game.tic", name);
    println!();
}

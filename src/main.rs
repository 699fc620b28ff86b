// Sable front end: dump the token stream or the AST of a source file

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use sable::parser::Token;
use sable::{parse_module, tokenize};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("sable");

    let dump_tokens = args.iter().skip(1).any(|a| a == "--tokens");
    let Some(input) = args.iter().skip(1).find(|a| a.as_str() != "--tokens") else {
        eprintln!("Error: No input file provided");
        eprintln!();
        eprintln!("Usage: {} <file.sbl> [--tokens]", program_name);
        eprintln!();
        eprintln!("  <file.sbl>   source file to parse, or '-' for stdin");
        eprintln!("  --tokens     print the token stream instead of the AST");
        std::process::exit(1);
    };

    let source = if input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        if !Path::new(input).exists() {
            eprintln!("Error: File '{}' not found", input);
            std::process::exit(1);
        }
        fs::read_to_string(input)?
    };

    let tokens = match tokenize(&source) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("Lexer error: {}", e);
            std::process::exit(1);
        }
    };

    if dump_tokens {
        print_tokens(&tokens);
        return Ok(());
    }

    let module = match parse_module(&tokens) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("Parser error: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", module.to_json_pretty()?);
    Ok(())
}

fn print_tokens(tokens: &[Token]) {
    for token in tokens {
        println!("{:>4}:{:<4} {}", token.line, token.column, token);
    }
}

use colored::Colorize;
use serde_json::Value;

pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{}: JSON serialization failed: {}", "error".red().bold(), e),
    }
}

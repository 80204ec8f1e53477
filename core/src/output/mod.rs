//! Output formatting module
//!
//! Handles display of operation results and store information on the
//! terminal using colored output.

use console::Style;
use std::path::Path;

use crate::memory::Category;
use crate::protocol::{OperationDescriptor, OperationResult};

/// Output formatter for CLI results
pub struct OutputFormatter {
    // Styles
    blue: Style,
    green: Style,
    yellow: Style,
    red: Style,
    bold: Style,
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self {
            blue: Style::new().blue(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            bold: Style::new().bold(),
        }
    }
}

impl OutputFormatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Print an operation result, as JSON when `json` is set
    pub fn print_result(&self, result: &OperationResult, json: bool) {
        if json {
            match serde_json::to_string_pretty(result) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("{}", self.red.apply_to(format!("Error: {}", e))),
            }
            return;
        }

        match result {
            OperationResult::Success { output, .. } => {
                if matches!(result.status(), Some("pending_confirmation" | "preview")) {
                    println!("{}", self.yellow.apply_to(output));
                } else {
                    println!("{}", output);
                }
            }
            OperationResult::Error { message, code, .. } => {
                eprintln!(
                    "{} {}",
                    self.red.apply_to(format!("[{}]", code)),
                    message
                );
            }
        }
    }

    /// Print the operation listing
    pub fn print_operations(&self, operations: &[OperationDescriptor]) {
        println!("{}", self.bold.apply_to("Operations:"));
        for op in operations {
            println!("{}", op.format_for_prompt());
        }
    }

    /// Print where each category lives on disk
    pub fn print_paths(&self, base_dir: &Path, config_file: Option<&Path>) {
        println!();
        println!("{}", self.bold.apply_to("Memory Store:"));
        println!("Base directory: {}", self.green.apply_to(base_dir.display()));
        match config_file {
            Some(path) => println!("Config: {}", self.blue.apply_to(path.display())),
            None => println!("Config: {}", self.yellow.apply_to("defaults")),
        }
        println!();
        for category in Category::ALL {
            let path = base_dir.join(category.file_name());
            let marker = if path.exists() {
                self.green.apply_to("present")
            } else {
                self.yellow.apply_to("absent")
            };
            let suffix = if category.is_read_only() { " (read-only)" } else { "" };
            println!("- {}{}: {} [{}]", category, suffix, path.display(), marker);
        }
    }
}

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;

use crate::chain::pipeline::ExecutionResult;

pub const CUISINE_KEY: &str = "cuisine";
pub const RESTAURANT_NAME_KEY: &str = "restaurant_name";
pub const MENU_ITEMS_KEY: &str = "menu_items";

const REPORT_TITLE: &str = "Restaurant Generator Output";
const FILE_PREFIX: &str = "restaurant_output_";

/// Where an execution result gets written.
#[derive(Debug, Clone)]
pub enum Destination {
    Console,
    /// Directory that receives a timestamped report file.
    File(PathBuf),
}

/// Writes the result to the destination. Returns the report path when a
/// file was written. A failed file write is reported on stderr and
/// otherwise ignored; the result itself is never lost.
pub fn emit(result: &ExecutionResult, destination: &Destination) -> Option<PathBuf> {
    match destination {
        Destination::Console => {
            print_console(result);
            None
        }
        Destination::File(dir) => {
            // One timestamp per emit, so the header and the filename agree.
            let now = Local::now();
            let path = dir.join(report_filename(&now));
            match fs::write(&path, render_report(result, &now)) {
                Ok(()) => {
                    println!("{} {}", "Saved report to".green(), path.display());
                    Some(path)
                }
                Err(err) => {
                    eprintln!("{} {}: {err}", "Failed to write report".red(), path.display());
                    None
                }
            }
        }
    }
}

fn print_console(result: &ExecutionResult) {
    println!();
    println!(
        "{} {}",
        "Restaurant:".bold(),
        result.get(RESTAURANT_NAME_KEY).unwrap_or("")
    );
    println!(
        "{} {}",
        "Menu:".bold(),
        result.get(MENU_ITEMS_KEY).unwrap_or("")
    );
}

pub fn report_filename(timestamp: &DateTime<Local>) -> String {
    format!("{FILE_PREFIX}{}.txt", timestamp.format("%Y%m%d_%H%M%S"))
}

pub fn render_report(result: &ExecutionResult, timestamp: &DateTime<Local>) -> String {
    format!(
        "=== {REPORT_TITLE} ===\n\
         Generated on: {}\n\
         Cuisine Type: {}\n\
         {}\n\
         Restaurant Name: {}\n\
         Menu Items: {}\n\
         {}\n",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        result.input(CUISINE_KEY).unwrap_or(""),
        "-".repeat(50),
        result.get(RESTAURANT_NAME_KEY).unwrap_or(""),
        result.get(MENU_ITEMS_KEY).unwrap_or(""),
        "=".repeat(50),
    )
}

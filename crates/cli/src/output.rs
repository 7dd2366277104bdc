//! Console output for the CLI

use colored::Colorize;

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✅".green(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "❌".red(), message.red());
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{}  {}", "⚠️".yellow(), message.yellow());
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{}  {}", "ℹ️".blue(), message);
}

/// Print a script between rulers
pub fn print_script(code: &str) {
    let ruler = "─".repeat(60).dimmed();
    println!("{}", ruler);
    print!("{}", code);
    if !code.ends_with('\n') {
        println!();
    }
    println!("{}", ruler);
}

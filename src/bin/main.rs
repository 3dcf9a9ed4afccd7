#![forbid(unsafe_code)]

use colored::*;

fn main() {
    println!("{}", "AuditChain CLI".bright_cyan().bold());
    println!("{}", "--------------".bright_cyan());
    println!();
    println!(
        "{}",
        "This is the main entry point, but most functionality is in separate binaries.".yellow()
    );
    println!(
        "{}",
        "Use 'cargo run --bin <binary_name>' to run a specific command.".yellow()
    );
    println!();
    println!("{}", "Available binaries:".bright_green().underline());
    println!(
        "  - {}  {}",
        "auditchain-dashboard".bright_white(),
        "dataset summary and sample hash chain".dimmed()
    );
    println!(
        "  - {}      {}",
        "auditchain-build".bright_white(),
        "build and verify a chain from any CSV".dimmed()
    );
    println!(
        "  - {}   {}",
        "auditchain-simulate".bright_white(),
        "classify a transaction and record it in the chain".dimmed()
    );
    println!();
    println!("{}", "Example:".bright_green().underline());
    println!(
        "{}",
        "  cargo run --bin auditchain-build -- covid.csv --schema covid".italic()
    );
}

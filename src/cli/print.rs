//! `sadl print` - pretty-print a program.

use crate::cli::load_program_arg;

/// Runs the print command.
pub fn execute(source: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ast = load_program_arg(source)?;
    println!("{ast}");
    Ok(())
}

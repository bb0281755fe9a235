//! `sadl validate` - parse and compile a SADL file.

use std::path::Path;

use sadl::program::compile;

/// Runs the validate command.
pub fn execute(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(file)?;
    let ast = sadl::lang::parse_program(&text)?;
    let program = compile(&ast)?;

    println!("{}: ok", file.display());
    println!("  name:               {}", program.name());
    println!("  defines:            {}", program.defaults().len());
    println!("  selection:          {} statement(s)", program.selection().len());
    println!("  evaluation:         {} statement(s)", program.evaluation().len());
    println!("  backpropagation:    {} statement(s)", program.backpropagation().len());
    match program.final_move_selection() {
        Some(stmts) => println!("  final move:         {} statement(s)", stmts.len()),
        None => println!("  final move:         (falls back to selection)"),
    }
    Ok(())
}

//! CLI command implementations.

pub mod compare;
pub mod evolve;
pub mod print;
pub mod validate;

use sadl::lang::{parse_program, Ast};
use sadl::gp::ProgramLibrary;

/// Loads a program argument: a path to a `.sadl` file, or the name of an
/// embedded reference program.
pub fn load_program_arg(arg: &str) -> Result<Ast, Box<dyn std::error::Error>> {
    let path = std::path::Path::new(arg);
    if path.exists() {
        let text = std::fs::read_to_string(path)?;
        return Ok(parse_program(&text)?);
    }
    if ProgramLibrary::names().contains(&arg) {
        return Ok(ProgramLibrary::embedded_only().load(arg));
    }
    Err(format!("`{arg}` is neither a file nor a reference program").into())
}

pub use assemble::{assemble, Program};
pub use error::AssembleError;

pub mod assemble;
pub mod error;
pub mod output;
pub mod parser;
pub mod symbols;

/// Assemble a MIA program from text and render the memory-dump file.
///
/// # Errors
///
/// If there's an error in the assembly code
pub fn assemble_program(program_text: &str) -> Result<String, AssembleError> {
    let program = assemble(program_text)?;

    Ok(output::render_dump(&program))
}

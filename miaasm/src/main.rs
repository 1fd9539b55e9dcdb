use anyhow::Result;
use miaasm::assemble_program;
use std::io::Read;
use std::{env, fs, fs::File};

fn main() -> Result<()> {
    let filename: String = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::Error::msg("Need an input filename"))?;
    let output_name: String = env::args()
        .nth(2)
        .ok_or_else(|| anyhow::Error::msg("Need an output filename"))?;
    let mut file = File::open(filename)?;
    let mut program_text = String::new();
    file.read_to_string(&mut program_text)?;

    let dump = assemble_program(&program_text)?;

    fs::write(output_name, dump)?;

    Ok(())
}

use thiserror::Error;

/// Everything that can stop an assembly run. The first error aborts the whole
/// run; no partial output survives. Line numbers are 1-based.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssembleError {
    #[error("line {line}: malformed numeric literal {token:?}")]
    LiteralParse { token: String, line: usize },

    #[error("line {line}: variable declared before the VAR_ADDRESS setting")]
    VariableAddressUnset { line: usize },

    #[error("line {line}: unknown assembly setting {key:?}")]
    UnknownSetting { key: String, line: usize },

    #[error("line {line}: operand {token:?} matches no addressing form")]
    UnknownOperandSyntax { token: String, line: usize },

    #[error("line {line}: unknown instruction or wrong operand count")]
    UnknownInstruction { line: usize },

    #[error("word {word_index}: unresolved symbol {symbol:?}")]
    UnresolvedSymbol { symbol: String, word_index: usize },

    #[error("line {line}: malformed declaration")]
    MalformedDeclaration { line: usize },

    #[error("line {line}: symbol {name:?} is already declared")]
    DuplicateSymbol { name: String, line: usize },

    #[error("line {line}: STORE cannot use indirect addressing")]
    IndirectStore { line: usize },

    #[error("line {line}: register {value} out of range (0-3)")]
    RegisterOutOfRange { value: u16, line: usize },

    #[error("line {line}: shift count {value} out of range (1-16)")]
    ShiftCountOutOfRange { value: u16, line: usize },

    #[error(
        "instruction region ({instructions} words) overlaps the variable region \
         down to {variable_floor:#04x}"
    )]
    RegionOverlap {
        instructions: usize,
        variable_floor: u8,
    },

    #[error("program occupies {words} words but memory holds 256")]
    ProgramTooLarge { words: usize },
}

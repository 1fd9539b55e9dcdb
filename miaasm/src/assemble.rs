use libmia::op::{AddressMode, BranchOp, RegMemOp, HALT};
use libmia::word::{pack, Word, WordExt};

use crate::error::AssembleError;
use crate::parser::{parse_line, Instruction, Operand, SourceLine, Token};
use crate::symbols::SymbolTable;

pub const MEM_SIZE: usize = 256;

/// A word already emitted whose low byte still waits for a symbol address.
/// The stored low byte is combined with the resolved address mod 256, so a
/// branch can seed it with `-(n)-1` and end up with a correct PC-relative
/// displacement no matter in which order patches resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPatch {
    pub word_index: usize,
    pub symbol: String,
}

/// The result of a successful assembly run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub instruction_words: Vec<u16>,
    pub variable_values: Vec<u16>,
    pub variable_base_address: Option<u8>,
}

struct Assembler {
    words: Vec<Word>,
    patches: Vec<PendingPatch>,
    symbols: SymbolTable,
}

impl Assembler {
    fn new() -> Self {
        Assembler {
            words: Vec::new(),
            patches: Vec::new(),
            symbols: SymbolTable::new(),
        }
    }

    fn dispatch(&mut self, line: SourceLine, line_no: usize) -> Result<(), AssembleError> {
        match line {
            SourceLine::Comment => {}
            SourceLine::Setting { key, value } => {
                if key == "VAR_ADDRESS" {
                    let base = self.symbols.resolve_token(&value, line_no)?;
                    self.symbols.set_base(base as u8);
                } else {
                    return Err(AssembleError::UnknownSetting { key, line: line_no });
                }
            }
            SourceLine::Variable { name, value } => {
                let value = self.symbols.resolve_token(&value, line_no)?;
                self.symbols.declare_variable(&name, value, line_no)?;
            }
            SourceLine::Label(name) => {
                self.symbols.declare_label(&name, self.words.len(), line_no)?;
            }
            SourceLine::Instruction(instruction) => match instruction {
                Instruction::RegMem { op, reg, operand } => {
                    let reg = self.register(&reg, line_no)?;
                    self.encode_reg_mem(op, reg, &operand, line_no)?;
                }
                Instruction::Shift { op, reg, count } => {
                    let reg = self.register(&reg, line_no)?;
                    let count = self.symbols.resolve_token(&count, line_no)?;
                    if !(1..=16).contains(&count) {
                        return Err(AssembleError::ShiftCountOutOfRange {
                            value: count,
                            line: line_no,
                        });
                    }
                    self.words.push(pack(op as u8, reg, 0, count as u8));
                }
                Instruction::Branch { op, target } => self.encode_branch(op, &target),
                Instruction::Halt => self.words.push(pack(HALT, 0, 0, 0)),
            },
        }

        Ok(())
    }

    fn register(&self, token: &Token, line_no: usize) -> Result<u8, AssembleError> {
        let value = self.symbols.resolve_token(token, line_no)?;
        if value > 3 {
            return Err(AssembleError::RegisterOutOfRange {
                value,
                line: line_no,
            });
        }
        Ok(value as u8)
    }

    fn encode_reg_mem(
        &mut self,
        op: RegMemOp,
        reg: u8,
        operand: &Operand,
        line_no: usize,
    ) -> Result<(), AssembleError> {
        match operand {
            Operand::Immediate(token) => {
                let value = self.symbols.resolve_token(token, line_no)?;
                self.words
                    .push(pack(op as u8, reg, AddressMode::Immediate as u8, 0));
                // The operand word follows raw, unmasked.
                self.words.push(value);
            }
            Operand::Indirect(token) => {
                if op == RegMemOp::STORE {
                    return Err(AssembleError::IndirectStore { line: line_no });
                }
                let addr = self.symbols.resolve_token(token, line_no)? as u8;
                self.words
                    .push(pack(op as u8, reg, AddressMode::Indirect as u8, addr));
            }
            Operand::Indexed(token) => {
                let addr = self.symbols.resolve_token(token, line_no)? as u8;
                self.words
                    .push(pack(op as u8, reg, AddressMode::Indexed as u8, addr));
            }
            Operand::Direct(token) => {
                let addr = self.symbols.resolve_token(token, line_no)? as u8;
                self.words
                    .push(pack(op as u8, reg, AddressMode::Direct as u8, addr));
            }
            Operand::Symbol(name) => {
                let addr = self.symbols.variable_address(name).ok_or_else(|| {
                    AssembleError::UnknownOperandSyntax {
                        token: name.clone(),
                        line: line_no,
                    }
                })?;
                self.words
                    .push(pack(op as u8, reg, AddressMode::Direct as u8, addr));
            }
            Operand::LabelRef(name) => {
                self.patches.push(PendingPatch {
                    word_index: self.words.len(),
                    symbol: name.clone(),
                });
                self.words
                    .push(pack(op as u8, reg, AddressMode::Direct as u8, 0));
            }
        }

        Ok(())
    }

    /// Seed the address field with `-(n)-1` where `n` is this word's index.
    /// After backpatching adds the label's word index `L`, the field holds
    /// `L - n - 1`: exactly the displacement the machine adds to the
    /// already-incremented PC.
    fn encode_branch(&mut self, op: BranchOp, target: &str) {
        let n = self.words.len();
        let seed = (n as u8).wrapping_add(1).wrapping_neg();
        self.patches.push(PendingPatch {
            word_index: n,
            symbol: target.to_owned(),
        });
        self.words
            .push(pack(op as u8, 0, AddressMode::Direct as u8, seed));
    }

    fn finish(mut self) -> Result<Program, AssembleError> {
        // The symbol table is frozen now; patches resolve in any order
        // because each one only touches its own word.
        for patch in &self.patches {
            let address =
                self.symbols
                    .resolve(&patch.symbol)
                    .ok_or_else(|| AssembleError::UnresolvedSymbol {
                        symbol: patch.symbol.clone(),
                        word_index: patch.word_index,
                    })?;
            let word = self.words[patch.word_index];
            self.words[patch.word_index] =
                word.high_byte() | u16::from(word.addr().wrapping_add(address));
        }

        if self.words.len() > MEM_SIZE {
            return Err(AssembleError::ProgramTooLarge {
                words: self.words.len(),
            });
        }

        if let Some(base) = self.symbols.base() {
            let count = self.symbols.variable_values().len();
            if count > 0 {
                let floor = base.wrapping_sub((count - 1) as u8);
                if count > base as usize + 1 || self.words.len() > usize::from(floor) {
                    return Err(AssembleError::RegionOverlap {
                        instructions: self.words.len(),
                        variable_floor: floor,
                    });
                }
            }
        }

        Ok(Program {
            instruction_words: self.words,
            variable_values: self.symbols.variable_values().to_vec(),
            variable_base_address: self.symbols.base(),
        })
    }
}

/// Assemble a MIA program: one forward scan over the source lines, then one
/// resolution pass over the pending patches.
///
/// # Errors
///
/// If there's an error in the assembly code
pub fn assemble(source: &str) -> Result<Program, AssembleError> {
    let mut asm = Assembler::new();

    for (idx, text) in source.lines().enumerate() {
        let line = parse_line(text, idx + 1)?;
        asm.dispatch(line, idx + 1)?;
    }

    asm.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(source: &str) -> Vec<u16> {
        assemble(source).unwrap().instruction_words
    }

    #[test]
    fn immediate_emits_two_words() {
        assert_eq!(words("LOAD 0 #5\nHALT"), vec![0x0100, 0x0005, 0x8000]);
    }

    #[test]
    fn direct_numeric_address() {
        // opcode 1, reg 2, mode 00, addr 0x10
        assert_eq!(words("STORE 2 [16]"), vec![0x1810]);
    }

    #[test]
    fn indirect_and_indexed() {
        assert_eq!(words("LOAD 2 [[0x10]]"), vec![0x0A10]);
        assert_eq!(words("ADD 3 [4,]"), vec![0x2F04]);
    }

    #[test]
    fn address_fields_mask_to_eight_bits() {
        assert_eq!(words("LOAD 0 [0x1FF]"), vec![0x00FF]);
        // immediate values stay 16-bit
        assert_eq!(words("LOAD 0 #0x1FF"), vec![0x0100, 0x01FF]);
    }

    #[test]
    fn bare_variable_and_bracketed_variable() {
        let source = "@VAR_ADDRESS=0xFF\n:a = 7\nLOAD 1 a\nAND 1 [a]\nHALT";
        assert_eq!(words(source), vec![0x04FF, 0x44FF, 0x8000]);
    }

    #[test]
    fn shift_count_in_address_field() {
        assert_eq!(words("LSR 1 #4"), vec![0x5404]);
        assert_eq!(words("LSR 0 #16"), vec![0x5010]);
    }

    #[test]
    fn forward_branch_resolves_through_patch() {
        let program = assemble("BRA %end\nHALT\n%end\nHALT").unwrap();
        // word 0 branches to word 2: PC after fetch is 1, displacement 1
        assert_eq!(program.instruction_words, vec![0x6001, 0x8000, 0x8000]);
    }

    #[test]
    fn backward_branch_needs_no_patch_value() {
        let program = assemble("%start\nLOAD 0 #1\nBRA %start\nHALT").unwrap();
        // BRA occupies word 2; PC after fetch is 3, target 0, displacement -3
        assert_eq!(
            program.instruction_words,
            vec![0x0100, 0x0001, 0x60FD, 0x8000]
        );
    }

    #[test]
    fn branch_to_self_is_minus_one() {
        assert_eq!(words("%here\nBRA %here"), vec![0x60FF]);
    }

    #[test]
    fn label_operand_in_addressing_position() {
        let program = assemble("LOAD 0 %data\nHALT\n%data\nHALT").unwrap();
        // direct mode, field patched from 0 to the label's word index
        assert_eq!(program.instruction_words, vec![0x0002, 0x8000, 0x8000]);
    }

    #[test]
    fn long_forward_displacement_wraps_silently() {
        let mut source = String::from("BRA %far\n");
        for _ in 0..200 {
            source.push_str("HALT\n");
        }
        source.push_str("%far\nHALT\n");

        let program = assemble(&source).unwrap();
        // target word 201, stored seed -1: field (201 - 1) mod 256
        assert_eq!(program.instruction_words[0], 0x6000 | 200);
    }

    #[test]
    fn variable_placement() {
        let program =
            assemble("@VAR_ADDRESS=0xFF\n:a = 1\n:b = 2\n:c = 3\nHALT").unwrap();
        assert_eq!(program.variable_values, vec![1, 2, 3]);
        assert_eq!(program.variable_base_address, Some(0xFF));
    }

    #[test]
    fn variable_before_base_is_an_error() {
        assert_eq!(
            assemble(":a = 1"),
            Err(AssembleError::VariableAddressUnset { line: 1 })
        );
    }

    #[test]
    fn unknown_setting_is_an_error() {
        assert_eq!(
            assemble("@CODE_ADDRESS=0"),
            Err(AssembleError::UnknownSetting {
                key: "CODE_ADDRESS".into(),
                line: 1,
            })
        );
    }

    #[test]
    fn unresolved_branch_target_is_an_error() {
        assert_eq!(
            assemble("BRA %missing\nHALT"),
            Err(AssembleError::UnresolvedSymbol {
                symbol: "missing".into(),
                word_index: 0,
            })
        );
    }

    #[test]
    fn indirect_store_is_rejected() {
        assert_eq!(
            assemble("STORE 0 [[0x10]]"),
            Err(AssembleError::IndirectStore { line: 1 })
        );
    }

    #[test]
    fn register_out_of_range() {
        assert_eq!(
            assemble("LOAD 4 #1"),
            Err(AssembleError::RegisterOutOfRange { value: 4, line: 1 })
        );
    }

    #[test]
    fn shift_count_out_of_range() {
        assert_eq!(
            assemble("LSR 0 #0"),
            Err(AssembleError::ShiftCountOutOfRange { value: 0, line: 1 })
        );
        assert_eq!(
            assemble("LSR 0 #17"),
            Err(AssembleError::ShiftCountOutOfRange { value: 17, line: 1 })
        );
    }

    #[test]
    fn duplicate_symbol_is_an_error() {
        assert_eq!(
            assemble("%x\n%x"),
            Err(AssembleError::DuplicateSymbol {
                name: "x".into(),
                line: 2,
            })
        );
    }

    #[test]
    fn regions_must_not_overlap() {
        // four instruction words reach address 3, the variable sits at 2
        let source = "@VAR_ADDRESS=2\n:a = 1\nLOAD 0 #1\nHALT\nHALT";
        assert_eq!(
            assemble(source),
            Err(AssembleError::RegionOverlap {
                instructions: 4,
                variable_floor: 2,
            })
        );
    }

    #[test]
    fn variables_must_not_run_below_address_zero() {
        // three variables counting down from base 1 fall off the bottom
        let source = "@VAR_ADDRESS=1\n:a = 1\n:b = 2\n:c = 3\nHALT";
        assert_eq!(
            assemble(source),
            Err(AssembleError::RegionOverlap {
                instructions: 1,
                variable_floor: 0xFF,
            })
        );
    }

    #[test]
    fn program_larger_than_memory_is_an_error() {
        let source = "HALT\n".repeat(257);
        assert_eq!(
            assemble(&source),
            Err(AssembleError::ProgramTooLarge { words: 257 })
        );
    }

    #[test]
    fn deterministic() {
        let source = "@VAR_ADDRESS=0xFF\n:a = 1\n%l\nADD 0 a\nBNE %l\nHALT";
        assert_eq!(assemble(source), assemble(source));
    }
}

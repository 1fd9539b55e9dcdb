use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{digit1, space0},
    combinator::{all_consuming, map, recognize},
    error::ErrorKind,
    sequence::{delimited, pair, preceded, separated_pair, terminated},
    IResult,
};

use libmia::op::{BranchOp, RegMemOp, ShiftOp};

use crate::error::AssembleError;

/// A numeric token: either a literal or a symbol name that resolves to a
/// variable's address once the symbol table knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Number(u16),
    Name(String),
}

/// One operand in addressing-mode position, still unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `#value` - the following word holds the 16-bit operand.
    Immediate(Token),
    /// `[[addr]]` - addr holds a pointer to the operand.
    Indirect(Token),
    /// `[addr,]` - operand at addr plus the contents of GR3.
    Indexed(Token),
    /// `[addr]` - operand at addr.
    Direct(Token),
    /// `%label` - direct, with the address filled in by backpatching.
    LabelRef(String),
    /// A bare variable name, direct at the variable's address.
    Symbol(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    RegMem(RegMemOp),
    Shift(ShiftOp),
    Branch(BranchOp),
    Halt,
}

impl Mnemonic {
    pub fn from_mnemonic(i: &str) -> Option<Mnemonic> {
        if let Ok(regmem) = RegMemOp::from_str(i) {
            Some(Mnemonic::RegMem(regmem))
        } else if let Ok(shift) = ShiftOp::from_str(i) {
            Some(Mnemonic::Shift(shift))
        } else if let Ok(branch) = BranchOp::from_str(i) {
            Some(Mnemonic::Branch(branch))
        } else if i == "HALT" {
            Some(Mnemonic::Halt)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    RegMem {
        op: RegMemOp,
        reg: Token,
        operand: Operand,
    },
    Shift {
        op: ShiftOp,
        reg: Token,
        count: Token,
    },
    Branch {
        op: BranchOp,
        target: String,
    },
    Halt,
}

/// A source line after classification. Classification is purely syntactic:
/// the leading character decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLine {
    Comment,
    Setting { key: String, value: Token },
    Variable { name: String, value: Token },
    Label(String),
    Instruction(Instruction),
}

fn name(i: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        )),
        String::from,
    )(i)
}

fn numeric_span(i: &str) -> IResult<&str, &str> {
    alt((
        recognize(preceded(
            tag("0x"),
            take_while1(|c: char| c.is_ascii_hexdigit()),
        )),
        recognize(preceded(tag("0b"), take_while1(|c| c == '0' || c == '1'))),
        digit1,
    ))(i)
}

fn numeric_value(span: &str) -> Option<u16> {
    if let Some(hex) = span.strip_prefix("0x") {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = span.strip_prefix("0b") {
        u16::from_str_radix(bin, 2).ok()
    } else {
        span.parse().ok()
    }
}

/// A token that looks numeric but doesn't fit a 16-bit word is malformed, not
/// a different kind of token, so conversion failure aborts the whole
/// alternative chain instead of backtracking.
pub fn number(i: &str) -> IResult<&str, u16> {
    let (rest, span) = numeric_span(i)?;
    match numeric_value(span) {
        Some(value) => Ok((rest, value)),
        None => Err(nom::Err::Failure(nom::error::Error::new(
            span,
            ErrorKind::MapRes,
        ))),
    }
}

pub fn token(i: &str) -> IResult<&str, Token> {
    alt((map(number, Token::Number), map(name, Token::Name)))(i)
}

/// The addressing-mode dispatch table, in priority order. `[[` must be tried
/// before `[`, and `[a,]` before `[a]`.
pub fn operand(i: &str) -> IResult<&str, Operand> {
    alt((
        map(preceded(tag("#"), token), Operand::Immediate),
        map(delimited(tag("[["), token, tag("]]")), Operand::Indirect),
        map(
            delimited(tag("["), terminated(token, tag(",")), tag("]")),
            Operand::Indexed,
        ),
        map(delimited(tag("["), token, tag("]")), Operand::Direct),
        map(preceded(tag("%"), name), Operand::LabelRef),
        map(name, Operand::Symbol),
    ))(i)
}

fn assignment(i: &str) -> IResult<&str, (String, Token)> {
    separated_pair(name, delimited(space0, tag("="), space0), token)(i)
}

fn parse_token(i: &str, line_no: usize) -> Result<Token, AssembleError> {
    all_consuming(token)(i)
        .map(|(_, t)| t)
        .map_err(|_| AssembleError::LiteralParse {
            token: i.to_owned(),
            line: line_no,
        })
}

fn parse_operand(i: &str, line_no: usize) -> Result<Operand, AssembleError> {
    all_consuming(operand)(i)
        .map(|(_, o)| o)
        .map_err(|e| match e {
            nom::Err::Failure(err) => AssembleError::LiteralParse {
                token: err.input.to_owned(),
                line: line_no,
            },
            _ => AssembleError::UnknownOperandSyntax {
                token: i.to_owned(),
                line: line_no,
            },
        })
}

fn parse_instruction(line: &str, line_no: usize) -> Result<Instruction, AssembleError> {
    let parts = line.split_whitespace().collect::<Vec<_>>();
    let mnemonic = Mnemonic::from_mnemonic(parts[0])
        .ok_or(AssembleError::UnknownInstruction { line: line_no })?;

    match (mnemonic, parts.as_slice()) {
        (Mnemonic::RegMem(op), [_, reg, operand]) => Ok(Instruction::RegMem {
            op,
            reg: parse_token(reg, line_no)?,
            operand: parse_operand(operand, line_no)?,
        }),
        (Mnemonic::Shift(op), [_, reg, count]) => {
            let count = count
                .strip_prefix('#')
                .ok_or_else(|| AssembleError::UnknownOperandSyntax {
                    token: (*count).to_owned(),
                    line: line_no,
                })?;
            Ok(Instruction::Shift {
                op,
                reg: parse_token(reg, line_no)?,
                count: parse_token(count, line_no)?,
            })
        }
        (Mnemonic::Branch(op), [_, target]) => {
            let target = target.strip_prefix('%').ok_or_else(|| {
                AssembleError::UnknownOperandSyntax {
                    token: (*target).to_owned(),
                    line: line_no,
                }
            })?;
            Ok(Instruction::Branch {
                op,
                target: target.to_owned(),
            })
        }
        (Mnemonic::Halt, [_]) => Ok(Instruction::Halt),
        _ => Err(AssembleError::UnknownInstruction { line: line_no }),
    }
}

fn declaration_error(e: nom::Err<nom::error::Error<&str>>, line_no: usize) -> AssembleError {
    match e {
        nom::Err::Failure(err) => AssembleError::LiteralParse {
            token: err.input.to_owned(),
            line: line_no,
        },
        _ => AssembleError::MalformedDeclaration { line: line_no },
    }
}

pub fn parse_line(line: &str, line_no: usize) -> Result<SourceLine, AssembleError> {
    let line = line.trim();

    if line.is_empty() || line.starts_with(';') {
        Ok(SourceLine::Comment)
    } else if let Some(rest) = line.strip_prefix('@') {
        let (_, (key, value)) = all_consuming(assignment)(rest)
            .map_err(|e| declaration_error(e, line_no))?;
        Ok(SourceLine::Setting { key, value })
    } else if let Some(rest) = line.strip_prefix(':') {
        let (_, (name, value)) = all_consuming(preceded(space0, assignment))(rest)
            .map_err(|e| declaration_error(e, line_no))?;
        Ok(SourceLine::Variable { name, value })
    } else if let Some(rest) = line.strip_prefix('%') {
        let (_, name) = all_consuming(name)(rest)
            .map_err(|_| AssembleError::MalformedDeclaration { line: line_no })?;
        Ok(SourceLine::Label(name))
    } else {
        Ok(SourceLine::Instruction(parse_instruction(line, line_no)?))
    }
}

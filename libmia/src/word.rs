/// One 16-bit MIA program-memory word.
///
/// Layout, most significant bit first: 4-bit opcode, 2-bit general-register
/// selector, 2-bit addressing mode, 8-bit address/displacement/count field.
pub type Word = u16;

pub const OPCODE_SHIFT: u16 = 12;
pub const REG_SHIFT: u16 = 10;
pub const MODE_SHIFT: u16 = 8;
pub const ADDR_MASK: u16 = 0x00FF;

pub trait WordExt {
    fn opcode(&self) -> u8;
    fn reg(&self) -> u8;
    fn mode_bits(&self) -> u8;
    fn addr(&self) -> u8;
    fn high_byte(&self) -> u16;
}

impl WordExt for Word {
    fn opcode(&self) -> u8 {
        (self >> OPCODE_SHIFT) as u8
    }

    fn reg(&self) -> u8 {
        ((self >> REG_SHIFT) & 0b11) as u8
    }

    fn mode_bits(&self) -> u8 {
        ((self >> MODE_SHIFT) & 0b11) as u8
    }

    fn addr(&self) -> u8 {
        (self & ADDR_MASK) as u8
    }

    fn high_byte(&self) -> u16 {
        self & !ADDR_MASK
    }
}

pub fn pack(opcode: u8, reg: u8, mode: u8, addr: u8) -> Word {
    (u16::from(opcode) << OPCODE_SHIFT)
        | (u16::from(reg) << REG_SHIFT)
        | (u16::from(mode) << MODE_SHIFT)
        | u16::from(addr)
}

//! Shared erase-block selection logic used by both the standalone
//! operation functions in [`super::operations`] and [`super::spi_device`].

use crate::chip::EraseBlock;

/// Select the best erase block size for an operation covering `len` bytes
/// starting at `addr`: the largest block both the address and length are
/// aligned to.
pub(super) fn select_erase_block(
    erase_blocks: &[EraseBlock],
    addr: u32,
    len: u32,
) -> Option<EraseBlock> {
    erase_blocks
        .iter()
        .filter(|eb| eb.size <= len)
        .filter(|eb| eb.size != 0 && addr % eb.size == 0 && len % eb.size == 0)
        .max_by_key(|eb| eb.size)
        .copied()
}

/// Map a 3-byte erase opcode to its 4-byte equivalent
pub(super) fn map_to_4byte_erase_opcode(opcode: u8) -> u8 {
    use crate::spi::opcodes;
    match opcode {
        opcodes::SE_20 => opcodes::SE_21,
        opcodes::BE_52 => opcodes::BE_5C,
        opcodes::BE_D8 => opcodes::BE_DC,
        _ => opcode, // Chip erase doesn't need address
    }
}

//! SPI flash device adapter
//!
//! This module provides `SpiFlashDevice`, an adapter that implements
//! `FlashDevice` for SPI-based programmers.

use crate::chip::{EraseBlock, WpProtocolTag, WriteGranularity};
use crate::error::{Error, Result};
use crate::flash::context::{AddressMode, FlashContext};
use crate::flash::device::FlashDevice;
use crate::flash::erase_select::{map_to_4byte_erase_opcode, select_erase_block};
use crate::programmer::SpiMaster;
use crate::protocol;
use crate::wp::{
    self, RangeDecoder, WpConfig, WpError, WpMode, WpRange, WpRegBitMap, WpResult, WriteOptions,
};

/// Flash device adapter for SPI-based programmers
///
/// This wraps a `SpiMaster` implementation along with the `FlashContext`
/// (chip metadata from JEDEC probing) to provide the unified `FlashDevice`
/// interface.
///
/// # Example
///
/// ```ignore
/// use rflasher_core::flash::{SpiFlashDevice, probe};
/// use rflasher_core::chip::ChipDatabase;
///
/// fn read_flash<M: SpiMaster>(master: &mut M, db: &ChipDatabase) {
///     let ctx = probe(master, db).unwrap();
///     let mut device = SpiFlashDevice::new(master, ctx);
///
///     let mut buf = [0u8; 4096];
///     device.read(0, &mut buf).unwrap();
/// }
/// ```
/// Either a borrowed or an owned SPI master
///
/// Lets `SpiFlashDevice` be built either from a short-lived `&mut M` (when
/// the caller keeps the master around) or by taking ownership of it (when
/// the device needs to outlive the scope it was opened in, e.g. stored in a
/// `Box<dyn FlashDevice>`).
enum MasterSlot<'a, M: SpiMaster + ?Sized> {
    Borrowed(&'a mut M),
    Owned(alloc::boxed::Box<M>),
}

impl<M: SpiMaster + ?Sized> MasterSlot<'_, M> {
    fn get_mut(&mut self) -> &mut M {
        match self {
            MasterSlot::Borrowed(m) => m,
            MasterSlot::Owned(m) => m.as_mut(),
        }
    }
}

pub struct SpiFlashDevice<'a, M: SpiMaster + ?Sized> {
    master: MasterSlot<'a, M>,
    ctx: FlashContext,
}

impl<'a, M: SpiMaster + ?Sized> SpiFlashDevice<'a, M> {
    /// Create a new SPI flash device adapter borrowing its master
    ///
    /// # Arguments
    /// * `master` - The SPI master to use for communication
    /// * `ctx` - Flash context with chip metadata (from probing)
    pub fn new(master: &'a mut M, ctx: FlashContext) -> Self {
        Self {
            master: MasterSlot::Borrowed(master),
            ctx,
        }
    }

    /// Get a reference to the underlying SPI master
    pub fn master(&mut self) -> &mut M {
        self.master.get_mut()
    }

    /// Get a reference to the flash context
    pub fn context(&self) -> &FlashContext {
        &self.ctx
    }

    /// Get a mutable reference to the flash context
    pub fn context_mut(&mut self) -> &mut FlashContext {
        &mut self.ctx
    }

    /// Consume the adapter and return the flash context
    pub fn into_context(self) -> FlashContext {
        self.ctx
    }
}

impl<M: SpiMaster + Sized> SpiFlashDevice<'static, M> {
    /// Create a new SPI flash device adapter that owns its master
    ///
    /// Use this when the adapter needs to outlive the scope the master was
    /// opened in, e.g. when boxing it as `Box<dyn FlashDevice>`.
    pub fn new_owned(master: M, ctx: FlashContext) -> Self {
        Self {
            master: MasterSlot::Owned(alloc::boxed::Box::new(master)),
            ctx,
        }
    }
}

impl<M: SpiMaster + ?Sized> FlashDevice for SpiFlashDevice<'_, M> {
    fn size(&self) -> u32 {
        self.ctx.total_size() as u32
    }

    fn erase_granularity(&self) -> u32 {
        self.ctx.chip.min_erase_size().unwrap_or(4096) // Default to 4KB if no erase blocks defined
    }

    fn write_granularity(&self) -> WriteGranularity {
        self.ctx.chip.write_granularity
    }

    fn erase_blocks(&self) -> alloc::vec::Vec<EraseBlock> {
        self.ctx.chip.erase_block_kinds()
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        if !self.ctx.is_valid_range(addr, buf.len()) {
            return Err(Error::AddressOutOfBounds);
        }

        match self.ctx.address_mode {
            AddressMode::ThreeByte => protocol::read_3b(self.master.get_mut(), addr, buf),
            AddressMode::FourByte => {
                if self.ctx.use_native_4byte {
                    protocol::read_4b(self.master.get_mut(), addr, buf)
                } else {
                    // Enter 4-byte mode, read, exit
                    protocol::enter_4byte_mode(self.master.get_mut())?;
                    let result = protocol::read_3b(self.master.get_mut(), addr, buf);
                    let _ = protocol::exit_4byte_mode(self.master.get_mut());
                    result
                }
            }
        }
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        if !self.ctx.is_valid_range(addr, data.len()) {
            return Err(Error::AddressOutOfBounds);
        }

        let page_size = self.ctx.page_size();
        let use_4byte = self.ctx.address_mode == AddressMode::FourByte;
        let use_native = self.ctx.use_native_4byte;

        // Get the master's maximum write length - some controllers have limits
        // smaller than a full page (e.g., Intel swseq is limited to 64 bytes)
        let max_write = self.master.get_mut().max_write_len();

        // Enter 4-byte mode if needed and not using native commands
        if use_4byte && !use_native {
            protocol::enter_4byte_mode(self.master.get_mut())?;
        }

        let mut offset = 0usize;
        let mut current_addr = addr;

        while offset < data.len() {
            // Calculate how many bytes until the next page boundary
            let page_offset = (current_addr as usize) % page_size;
            let bytes_to_page_end = page_size - page_offset;
            let remaining = data.len() - offset;
            // Respect both page boundaries and the master's maximum write length
            let chunk_size = core::cmp::min(core::cmp::min(bytes_to_page_end, remaining), max_write);

            let chunk = &data[offset..offset + chunk_size];

            // Program timeout: typical page program time is 0.7-3ms
            let timeout_us = 10_000; // 10ms

            let result = if use_4byte && use_native {
                protocol::program_page_4b(self.master.get_mut(), current_addr, chunk, timeout_us)
            } else {
                protocol::program_page_3b(self.master.get_mut(), current_addr, chunk, timeout_us)
            };

            if result.is_err() {
                // Try to exit 4-byte mode before returning error
                if use_4byte && !use_native {
                    let _ = protocol::exit_4byte_mode(self.master.get_mut());
                }
                return result;
            }

            offset += chunk_size;
            current_addr += chunk_size as u32;
        }

        // Exit 4-byte mode if we entered it
        if use_4byte && !use_native {
            protocol::exit_4byte_mode(self.master.get_mut())?;
        }

        Ok(())
    }

    fn erase(&mut self, addr: u32, len: u32) -> Result<()> {
        if !self.ctx.is_valid_range(addr, len as usize) {
            return Err(Error::AddressOutOfBounds);
        }

        // Find the best erase block size for this operation
        let kinds = self.ctx.chip.erase_block_kinds();
        let erase_block = select_erase_block(&kinds, addr, len).ok_or(Error::InvalidAlignment)?;

        let use_4byte = self.ctx.address_mode == AddressMode::FourByte;
        let use_native = self.ctx.use_native_4byte;

        // Map 3-byte opcode to 4-byte opcode if needed
        let opcode = if use_4byte && use_native {
            map_to_4byte_erase_opcode(erase_block.opcode)
        } else {
            erase_block.opcode
        };

        // Enter 4-byte mode if needed
        if use_4byte && !use_native {
            protocol::enter_4byte_mode(self.master.get_mut())?;
        }

        let mut current_addr = addr;
        let end_addr = addr + len;

        // Erase timeout depends on block size
        let timeout_us = match erase_block.size {
            s if s <= 4096 => 500_000,    // 4KB: 500ms
            s if s <= 32768 => 1_000_000, // 32KB: 1s
            s if s <= 65536 => 2_000_000, // 64KB: 2s
            _ => 60_000_000,              // Chip erase: 60s
        };

        while current_addr < end_addr {
            let result = protocol::erase_block(
                self.master.get_mut(),
                opcode,
                current_addr,
                use_4byte && use_native,
                timeout_us,
            );

            if result.is_err() {
                if use_4byte && !use_native {
                    let _ = protocol::exit_4byte_mode(self.master.get_mut());
                }
                return result;
            }

            // Verify the block was erased
            if let Err(e) = self.check_erased_range(current_addr, erase_block.size) {
                if use_4byte && !use_native {
                    let _ = protocol::exit_4byte_mode(self.master.get_mut());
                }
                return Err(e);
            }

            current_addr += erase_block.size;
        }

        // Exit 4-byte mode
        if use_4byte && !use_native {
            protocol::exit_4byte_mode(self.master.get_mut())?;
        }

        Ok(())
    }

    fn wp_supported(&self) -> bool {
        self.wp_bit_map_and_decoder().is_ok()
    }

    fn read_wp_config(&mut self) -> WpResult<WpConfig> {
        let (bit_map, decoder) = self.wp_bit_map_and_decoder()?;
        let total_size = self.ctx.total_size() as u32;
        wp::read_wp_config(self.master.get_mut(), &bit_map, total_size, decoder)
    }

    fn write_wp_config(&mut self, config: &WpConfig, options: WriteOptions) -> WpResult<()> {
        let (bit_map, decoder) = self.wp_bit_map_and_decoder()?;
        let total_size = self.ctx.total_size() as u32;
        wp::write_wp_config(
            self.master.get_mut(),
            config,
            &bit_map,
            total_size,
            decoder,
            options,
        )
    }

    fn set_wp_mode(&mut self, mode: WpMode, options: WriteOptions) -> WpResult<()> {
        let (bit_map, _decoder) = self.wp_bit_map_and_decoder()?;
        wp::set_wp_mode(self.master.get_mut(), mode, &bit_map, options)
    }

    fn set_wp_range(&mut self, range: &WpRange, options: WriteOptions) -> WpResult<()> {
        let (bit_map, decoder) = self.wp_bit_map_and_decoder()?;
        let total_size = self.ctx.total_size() as u32;
        wp::set_wp_range(
            self.master.get_mut(),
            range,
            &bit_map,
            total_size,
            decoder,
            options,
        )
    }

    fn disable_wp(&mut self, options: WriteOptions) -> WpResult<()> {
        let (bit_map, _decoder) = self.wp_bit_map_and_decoder()?;
        wp::disable_wp(self.master.get_mut(), &bit_map, options)
    }

    fn get_available_wp_ranges(&self) -> alloc::vec::Vec<WpRange> {
        match self.wp_bit_map_and_decoder() {
            Ok((bit_map, decoder)) => {
                let total_size = self.ctx.total_size() as u32;
                wp::get_available_ranges(&bit_map, total_size, decoder)
            }
            Err(_) => alloc::vec::Vec::new(),
        }
    }
}

impl<M: SpiMaster + ?Sized> SpiFlashDevice<'_, M> {
    /// Resolve this chip's write-protect bit layout and range-decoding
    /// algorithm from its catalog `wp_protocol` tag.
    ///
    /// There is no per-chip-family `WpRangeTable` data in `ChipDescriptor`
    /// yet, only the protocol tag; `w25`/`w25q`/`generic` all share the
    /// standard 3-bit-BP Winbond register layout, while `w25q_large` adds
    /// the fourth BP bit (chips ≥ 32 MiB) and switches to the doubled
    /// block-size decoder.
    fn wp_bit_map_and_decoder(&self) -> WpResult<(WpRegBitMap, RangeDecoder)> {
        match self.ctx.chip.wp_protocol.ok_or(WpError::ChipUnsupported)? {
            WpProtocolTag::W25 | WpProtocolTag::W25q | WpProtocolTag::Generic => {
                Ok((WpRegBitMap::winbond_standard(), RangeDecoder::Spi25))
            }
            WpProtocolTag::W25qLarge => Ok((
                WpRegBitMap::winbond_with_bp3(),
                RangeDecoder::Spi25_2xBlock,
            )),
        }
    }
}

impl<M: SpiMaster + ?Sized> SpiFlashDevice<'_, M> {
    /// Check that a range of flash has been erased (all bytes are 0xFF)
    fn check_erased_range(&mut self, addr: u32, len: u32) -> Result<()> {
        const ERASED_VALUE: u8 = 0xFF;
        const CHUNK_SIZE: usize = 4096;
        let mut buf = [0u8; CHUNK_SIZE];

        let mut offset = 0u32;
        while offset < len {
            let chunk_len = core::cmp::min(CHUNK_SIZE as u32, len - offset) as usize;
            let chunk_buf = &mut buf[..chunk_len];

            self.read(addr + offset, chunk_buf)?;

            for &byte in chunk_buf.iter() {
                if byte != ERASED_VALUE {
                    return Err(Error::EraseError);
                }
            }

            offset += chunk_len as u32;
        }

        Ok(())
    }
}

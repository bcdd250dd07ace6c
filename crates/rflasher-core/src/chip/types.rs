//! Flash chip catalog entry types
//!
//! `ChipDescriptor` is the immutable catalog record described in the data
//! model: identity, bus types, capability flags, erase layouts, and the
//! handful of tagged dispatch selectors (probe routine, WRSR convention, WP
//! protocol family) that stand in for the function-pointer tables a C
//! implementation would carry in the struct literal itself.

#[cfg(feature = "alloc")]
use alloc::{string::String, vec::Vec};

use super::features::{Features, WriteProtocol};

bitflags::bitflags! {
    /// Bus types a chip can be attached through.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "std", serde(transparent))]
    pub struct BusType: u8 {
        /// Parallel (x8/x16 memory-mapped) flash
        const PARALLEL = 1 << 0;
        /// LPC (Low Pin Count) bus
        const LPC       = 1 << 1;
        /// Firmware Hub bus
        const FWH       = 1 << 2;
        /// SPI (the only bus this implementation's protocol layer drives)
        const SPI       = 1 << 3;
        /// Opaque programmer (hardware sequencer, no direct SPI access)
        const OPAQUE    = 1 << 4;
    }
}

/// Selects which probe routine disambiguates a catalog entry.
///
/// Most SPI chips are identified uniquely by `(manufacturer_id, model_id)`
/// via plain RDID; the remaining tags cover "evil twin" families that share
/// an ID and must be told apart by an extra read (`spec.md` §4.1, §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ProbeTag {
    /// RDID match is sufficient on its own
    #[default]
    Jedec,
    /// Disambiguate by reading SFDP and comparing against the catalog entry
    JedecSfdp,
    /// Disambiguate by reading status register 2 / config register bits
    JedecStatusRegister,
    /// Disambiguate by reading back the erase-block pattern (size probing)
    JedecEraseProbe,
}

/// Probe timing hint, in microseconds, or one of the sentinel values a
/// flashrom-derived catalog uses when no useful number is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ProbeTiming {
    /// No delay needed
    #[default]
    Zero,
    /// Timing is not meaningful for this probe tag
    Ignored,
    /// Known-wrong/unverified value carried over from the source data
    Fixme,
    /// A concrete timing value
    Micros(u32),
}

/// Which write-protect protocol handler a chip family uses (`spec.md` §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum WpProtocolTag {
    /// Classic Winbond-style SR1-only BP0..BP2 + TB + SRP0
    W25,
    /// W25Q-style SR1+SR2 with CMP, SRP0/SRP1
    W25q,
    /// W25Q "large" variant: 4-bit BP field, TB may be replaced by QE
    W25qLarge,
    /// Generic fallback driven purely by the chip's `WpRangeTable`
    Generic,
}

/// A single erase opcode paired with the block size it erases.
///
/// This is the flattened, device-facing view of a chip's erase
/// capability: [`ChipDescriptor::erase_block_kinds`] and the
/// `FlashDevice::erase_blocks` trait method both deal in these rather
/// than in the richer [`EraserProfile`]/[`EraseRun`] catalog model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraseBlock {
    /// Erase opcode for a block of this size
    pub opcode: u8,
    /// Block size in bytes
    pub size: u32,
}

impl EraseBlock {
    /// Construct a new erase block descriptor
    pub const fn new(opcode: u8, size: u32) -> Self {
        Self { opcode, size }
    }
}

/// A single equal-size run within an [`EraserProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct EraseRun {
    /// Size of each block in this run, in bytes
    pub blocksize: u32,
    /// Number of blocks in this run
    pub blockcount: u32,
}

impl EraseRun {
    /// Total bytes spanned by this run
    pub const fn span(&self) -> u64 {
        self.blocksize as u64 * self.blockcount as u64
    }
}

/// An erase-block layout: an ordered partition of the chip's address space
/// into runs of equal-size blocks, plus the opcode used to erase a block of
/// this profile (`spec.md` §3 `EraserProfile`).
///
/// Blocks are laid out starting at offset 0 in declaration order: the first
/// run covers `[0, run0.span())`, the second covers
/// `[run0.span(), run0.span() + run1.span())`, and so on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg(feature = "alloc")]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct EraserProfile {
    /// Erase opcode for every block in this profile
    pub opcode: u8,
    /// Runs of equal-size blocks, in address order
    pub runs: Vec<EraseRun>,
    /// True if this profile represents a whole-chip erase ("all-ones")
    pub chip_erase: bool,
}

#[cfg(feature = "alloc")]
impl EraserProfile {
    /// Total size spanned by this profile, in bytes
    pub fn total_size(&self) -> u64 {
        self.runs.iter().map(EraseRun::span).sum()
    }

    /// The smallest block size in this profile (its alignment granularity)
    pub fn min_block_size(&self) -> Option<u32> {
        self.runs.iter().map(|r| r.blocksize).min()
    }

    /// The largest block size in this profile
    pub fn max_block_size(&self) -> Option<u32> {
        self.runs.iter().map(|r| r.blocksize).max()
    }

    /// Whether `(addr, len)` is a single whole block boundary in this
    /// profile, i.e. starts at a block start and exactly covers one block.
    pub fn find_block_at(&self, addr: u64) -> Option<u32> {
        let mut cursor = 0u64;
        for run in &self.runs {
            let run_span = run.span();
            if addr >= cursor && addr < cursor + run_span {
                let offset_in_run = addr - cursor;
                if run.blocksize != 0 && offset_in_run % run.blocksize as u64 == 0 {
                    return Some(run.blocksize);
                }
                return None;
            }
            cursor += run_span;
        }
        None
    }
}

/// Write granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum WriteGranularity {
    /// Can write individual bits (1->0 only)
    Bit,
    /// Can write individual bytes
    Byte,
    /// Must write full pages
    #[default]
    Page,
}

/// Test status for a single chip operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum TestStatus {
    /// Not tested
    #[default]
    Untested,
    /// Tested and working
    Ok,
    /// Tested but has issues
    Bad,
    /// Probe confirmed working, read/erase/write untested or unverified
    OkProbe,
    /// Probe, read, erase and write all confirmed working
    OkPreReadEraseWrite,
}

/// Per-operation test results for a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ChipTestStatus {
    /// Probe/identification
    pub probe: TestStatus,
    /// Read operation
    pub read: TestStatus,
    /// Erase operation
    pub erase: TestStatus,
    /// Write/program operation
    pub write: TestStatus,
    /// Write protection
    pub wp: TestStatus,
}

/// An operating-voltage range, in millivolts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct VoltageRange {
    /// Minimum operating voltage, millivolts
    pub min_mv: u16,
    /// Maximum operating voltage, millivolts
    pub max_mv: u16,
}

impl Default for VoltageRange {
    fn default() -> Self {
        Self {
            min_mv: 2700,
            max_mv: 3600,
        }
    }
}

/// Catalog entry describing one flash chip model (`spec.md` §3
/// `ChipDescriptor`).
///
/// Entries are immutable and the catalog is read-only after load; a
/// `ChipDescriptor` is shared (never copied) by every `FlashContext` that
/// selects it.
#[derive(Debug, Clone)]
#[cfg(feature = "alloc")]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ChipDescriptor {
    /// Vendor name (e.g., "Winbond")
    pub vendor: String,
    /// Chip model name (e.g., "W25Q128FV")
    pub name: String,
    /// Bus types this chip can be attached through
    pub bus_types: BusType,
    /// 32-bit manufacturer ID (JEDEC 8-bit manufacturer ID, zero-extended)
    pub manufacturer_id: u32,
    /// 32-bit model ID (JEDEC 16-bit device ID, zero-extended)
    pub model_id: u32,
    /// Total flash size, in binary KiB
    pub total_size_kib: u32,
    /// Page size in bytes (for programming)
    pub page_size: u16,
    /// Capability/behavior feature flags
    #[cfg_attr(feature = "std", serde(default))]
    pub features: Features,
    /// WRSR prefix convention
    #[cfg_attr(feature = "std", serde(default))]
    pub write_protocol: WriteProtocol,
    /// Operating voltage range
    #[cfg_attr(feature = "std", serde(default))]
    pub voltage: VoltageRange,
    /// Write granularity
    #[cfg_attr(feature = "std", serde(default))]
    pub write_granularity: WriteGranularity,
    /// Probe routine selector
    #[cfg_attr(feature = "std", serde(default))]
    pub probe_tag: ProbeTag,
    /// Probe timing hint
    #[cfg_attr(feature = "std", serde(default))]
    pub probe_timing: ProbeTiming,
    /// Write-protect protocol handler, if this chip supports WP at all
    pub wp_protocol: Option<WpProtocolTag>,
    /// Available erase-block layouts (at least one in practice)
    pub erasers: Vec<EraserProfile>,
    /// Test status
    #[cfg_attr(feature = "std", serde(default))]
    pub tested: ChipTestStatus,
}

impl ChipDescriptor {
    /// Total size in bytes
    pub fn total_size(&self) -> u32 {
        self.total_size_kib * 1024
    }

    /// Check if this chip matches the given (widened) JEDEC ID
    pub fn matches_jedec_id(&self, manufacturer: u8, device: u16) -> bool {
        self.manufacturer_id == manufacturer as u32 && self.model_id == device as u32
    }

    /// Check if this chip requires 4-byte addressing
    pub fn requires_4byte_addr(&self) -> bool {
        self.total_size() > 16 * 1024 * 1024
    }

    /// The smallest erase block size across every profile (the chip's
    /// overall erase granularity, used for read/verify alignment).
    pub fn min_erase_size(&self) -> Option<u32> {
        self.erasers
            .iter()
            .filter(|p| !p.chip_erase)
            .filter_map(EraserProfile::min_block_size)
            .min()
    }

    /// The largest non-chip-erase block size across every profile
    pub fn max_erase_size(&self) -> Option<u32> {
        self.erasers
            .iter()
            .filter(|p| !p.chip_erase)
            .filter_map(EraserProfile::max_block_size)
            .max()
    }

    /// Check if a given address/length are aligned to the chip's erase
    /// granularity (`min_erase_size`).
    pub fn is_erase_aligned(&self, addr: u32, len: u32) -> bool {
        match self.min_erase_size() {
            Some(g) if g != 0 => addr % g == 0 && len % g == 0,
            _ => false,
        }
    }

    /// Flatten every non-chip-erase run across all eraser profiles into a
    /// single `(opcode, block size)` list, deduplicated by size (smallest
    /// opcode wins ties) and sorted smallest-first.
    ///
    /// This is the view the block-selection logic in [`crate::flash`]
    /// actually needs: which opcode to issue for a given block size,
    /// independent of which profile that run came from.
    pub fn erase_block_kinds(&self) -> alloc::vec::Vec<EraseBlock> {
        let mut kinds: alloc::vec::Vec<EraseBlock> = self
            .erasers
            .iter()
            .filter(|p| !p.chip_erase)
            .flat_map(|p| {
                p.runs
                    .iter()
                    .map(move |r| EraseBlock::new(p.opcode, r.blocksize))
            })
            .collect();
        kinds.sort_by_key(|eb| (eb.size, eb.opcode));
        kinds.dedup_by_key(|eb| eb.size);
        kinds
    }

    /// The opcode used for a whole-chip erase, if this chip supports one.
    pub fn chip_erase_opcode(&self) -> Option<u8> {
        self.erasers.iter().find(|p| p.chip_erase).map(|p| p.opcode)
    }
}

/// JEDEC manufacturer IDs (8-bit RDID manufacturer byte)
pub mod manufacturer {
    /// AMD/Spansion
    pub const AMD: u8 = 0x01;
    /// Atmel
    pub const ATMEL: u8 = 0x1F;
    /// EON
    pub const EON: u8 = 0x1C;
    /// Fujitsu
    pub const FUJITSU: u8 = 0x04;
    /// GigaDevice
    pub const GIGADEVICE: u8 = 0xC8;
    /// Intel
    pub const INTEL: u8 = 0x89;
    /// ISSI
    pub const ISSI: u8 = 0x9D;
    /// Macronix
    pub const MACRONIX: u8 = 0xC2;
    /// Micron/ST
    pub const MICRON: u8 = 0x20;
    /// Sanyo
    pub const SANYO: u8 = 0x62;
    /// SST
    pub const SST: u8 = 0xBF;
    /// Winbond
    pub const WINBOND: u8 = 0xEF;
    /// XMC
    pub const XMC: u8 = 0x20;
}

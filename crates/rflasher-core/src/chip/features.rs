//! Flash chip feature flags

use bitflags::bitflags;

bitflags! {
    /// Feature flags for flash chips
    ///
    /// These flags describe behavioral quirks and optional capabilities of a
    /// chip family that the probe/erase/write/WP engines branch on. They are
    /// orthogonal to [`crate::chip::WriteProtocol`] (which selects the WRSR
    /// prefix convention) and to the erase opcodes carried by each
    /// [`crate::chip::EraserProfile`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "std", serde(transparent))]
    pub struct Features: u32 {
        // Reset sequence quirks (parallel/LPC/FWH heritage, some SPI parts too)
        /// Chip accepts a short reset pulse
        const SHORT_RESET     = 1 << 0;
        /// Chip accepts either a short or long reset pulse
        const EITHER_RESET    = 1 << 1;
        /// Chip requires a long reset pulse
        const LONG_RESET      = 1 << 2;

        // Unlock-sequence address quirks (parallel flash heritage)
        /// Unlock sequence addresses 0x2AA
        const ADDR_2AA        = 1 << 3;
        /// Unlock sequence addresses 0xAAA
        const ADDR_AAA        = 1 << 4;
        /// Unlock sequence addresses are bit-shifted for x16 bus width
        const ADDR_SHIFTED    = 1 << 5;
        /// Chip exposes a register map distinct from its data array
        const REGISTER_MAP    = 1 << 6;

        // Read capabilities
        /// Supports Fast Read (0x0B)
        const FAST_READ       = 1 << 7;
        /// Supports Dual I/O read commands
        const DUAL_IO         = 1 << 8;
        /// Supports Quad I/O read commands
        const QUAD_IO         = 1 << 9;

        // 4-byte addressing
        /// Supports 4-byte address mode
        const FOUR_BYTE_ADDR  = 1 << 10;
        /// Must explicitly enter 4BA mode with EN4B (0xB7) before use
        const FOUR_BYTE_ADDR_ENTER_REQUIRED = 1 << 11;
        /// Has native 4BA commands (0x13, 0x12, etc.), no mode switch needed
        const FOUR_BYTE_NATIVE = 1 << 12;
        /// Supports extended address register
        const EXT_ADDR_REG    = 1 << 13;

        // Special features
        /// Has OTP (One-Time Programmable) area
        const OTP             = 1 << 14;
        /// Supports QPI mode (4-4-4)
        const QPI             = 1 << 15;
        /// Has security registers
        const SECURITY_REG    = 1 << 16;
        /// Supports SFDP (Serial Flash Discoverable Parameters)
        const SFDP            = 1 << 17;

        // Write/erase behavior
        /// Byte-granularity writes (can write single bytes)
        const WRITE_BYTE      = 1 << 18;
        /// Supports AAI (Auto Address Increment) word program
        const AAI_WORD        = 1 << 19;
        /// Erased state reads back as all-zero instead of all-0xFF
        const ERASE_TO_ZERO   = 1 << 20;

        // Status register features
        /// Has status register 2
        const STATUS_REG_2    = 1 << 21;
        /// Has status register 3
        const STATUS_REG_3    = 1 << 22;
        /// Quad Enable bit is in SR2
        const QE_SR2          = 1 << 23;

        // Power management
        /// Supports deep power down
        const DEEP_POWER_DOWN = 1 << 24;

        // Write protection
        /// Top/Bottom protect bit available
        const WP_TB           = 1 << 25;
        /// Sector/Block protect bit available
        const WP_SEC          = 1 << 26;
        /// Complement (CMP) bit available
        const WP_CMP          = 1 << 27;
        /// Has Status Register Lock (SRL) bit
        const WP_SRL          = 1 << 28;
        /// Supports volatile status register writes (EWSR)
        const WP_VOLATILE     = 1 << 29;
        /// Has BP3 (4th block protect bit)
        const WP_BP3          = 1 << 30;
        /// Has Write Protect Selection (WPS) for per-sector mode
        const WP_WPS          = 1 << 31;
    }
}

impl Default for Features {
    fn default() -> Self {
        Features::empty()
    }
}

/// Which WRSR (Write Status Register) prefix convention a chip requires.
///
/// flashrom-derived catalogs model this as three mutually exclusive feature
/// bits; `spec.md` phrases it as an explicit choice ("WRSR-WREN vs
/// WRSR-EWSR vs WRSR-either"), so it is represented here as an enum rather
/// than bitflags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum WriteProtocol {
    /// WREN (0x06) must precede WRSR
    #[default]
    Wren,
    /// EWSR (0x50) must precede WRSR (legacy SST parts)
    Ewsr,
    /// Either WREN or EWSR works
    Either,
}

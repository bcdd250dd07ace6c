//! Chip database for runtime loading and lookup
//!
//! This module provides the `ChipDatabase` type for loading chip definitions
//! from RON files at runtime. The RON catalog is both the source format and
//! the runtime format: there is no separate build-time code generator, only
//! a `once_cell`-backed static load of the bundled catalog.

use alloc::{string::String, string::ToString, vec::Vec};
use std::fs;
use std::io;
use std::path::Path;

use once_cell::sync::OnceCell;

use super::types::{
    BusType, ChipDescriptor, ChipTestStatus, EraseRun, EraserProfile, ProbeTag, ProbeTiming,
    TestStatus, VoltageRange, WpProtocolTag, WriteGranularity,
};
use super::{Features, WriteProtocol};

/// Error type for chip database operations
#[derive(Debug, thiserror::Error)]
pub enum ChipDbError {
    /// I/O error reading files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// RON parsing error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

// ============================================================================
// RON deserialization types (intermediate format)
// ============================================================================

/// Size specification with human-readable units (for RON parsing)
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub enum Size {
    /// Size in bytes
    B(u32),
    /// Size in kibibytes (1024 bytes)
    KiB(u32),
    /// Size in mebibytes (1024 * 1024 bytes)
    MiB(u32),
}

impl Size {
    /// Convert to bytes
    pub fn to_bytes(self) -> u32 {
        match self {
            Size::B(n) => n,
            Size::KiB(n) => n * 1024,
            Size::MiB(n) => n * 1024 * 1024,
        }
    }
}

/// Feature flags for flash chips (RON format)
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
#[serde(default)]
struct FeaturesDef {
    short_reset: bool,
    either_reset: bool,
    long_reset: bool,
    addr_2aa: bool,
    addr_aaa: bool,
    addr_shifted: bool,
    register_map: bool,
    fast_read: bool,
    dual_io: bool,
    quad_io: bool,
    four_byte_addr: bool,
    four_byte_enter_required: bool,
    four_byte_native: bool,
    ext_addr_reg: bool,
    otp: bool,
    qpi: bool,
    security_reg: bool,
    sfdp: bool,
    write_byte: bool,
    aai_word: bool,
    erase_to_zero: bool,
    status_reg_2: bool,
    status_reg_3: bool,
    qe_sr2: bool,
    deep_power_down: bool,
    wp_tb: bool,
    wp_sec: bool,
    wp_cmp: bool,
    wp_srl: bool,
    wp_volatile: bool,
    wp_bp3: bool,
    wp_wps: bool,
}

impl From<FeaturesDef> for Features {
    fn from(def: FeaturesDef) -> Self {
        [
            (def.short_reset, Features::SHORT_RESET),
            (def.either_reset, Features::EITHER_RESET),
            (def.long_reset, Features::LONG_RESET),
            (def.addr_2aa, Features::ADDR_2AA),
            (def.addr_aaa, Features::ADDR_AAA),
            (def.addr_shifted, Features::ADDR_SHIFTED),
            (def.register_map, Features::REGISTER_MAP),
            (def.fast_read, Features::FAST_READ),
            (def.dual_io, Features::DUAL_IO),
            (def.quad_io, Features::QUAD_IO),
            (def.four_byte_addr, Features::FOUR_BYTE_ADDR),
            (
                def.four_byte_enter_required,
                Features::FOUR_BYTE_ADDR_ENTER_REQUIRED,
            ),
            (def.four_byte_native, Features::FOUR_BYTE_NATIVE),
            (def.ext_addr_reg, Features::EXT_ADDR_REG),
            (def.otp, Features::OTP),
            (def.qpi, Features::QPI),
            (def.security_reg, Features::SECURITY_REG),
            (def.sfdp, Features::SFDP),
            (def.write_byte, Features::WRITE_BYTE),
            (def.aai_word, Features::AAI_WORD),
            (def.erase_to_zero, Features::ERASE_TO_ZERO),
            (def.status_reg_2, Features::STATUS_REG_2),
            (def.status_reg_3, Features::STATUS_REG_3),
            (def.qe_sr2, Features::QE_SR2),
            (def.deep_power_down, Features::DEEP_POWER_DOWN),
            (def.wp_tb, Features::WP_TB),
            (def.wp_sec, Features::WP_SEC),
            (def.wp_cmp, Features::WP_CMP),
            (def.wp_srl, Features::WP_SRL),
            (def.wp_volatile, Features::WP_VOLATILE),
            (def.wp_bp3, Features::WP_BP3),
            (def.wp_wps, Features::WP_WPS),
        ]
        .into_iter()
        .fold(Features::empty(), |acc, (enabled, flag)| {
            if enabled {
                acc | flag
            } else {
                acc
            }
        })
    }
}

/// Write protocol (RON format)
#[derive(Debug, Clone, Copy, serde::Deserialize, Default)]
enum WriteProtocolDef {
    #[default]
    Wren,
    Ewsr,
    Either,
}

impl From<WriteProtocolDef> for WriteProtocol {
    fn from(def: WriteProtocolDef) -> Self {
        match def {
            WriteProtocolDef::Wren => WriteProtocol::Wren,
            WriteProtocolDef::Ewsr => WriteProtocol::Ewsr,
            WriteProtocolDef::Either => WriteProtocol::Either,
        }
    }
}

/// Bus types (RON format)
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
#[serde(default)]
struct BusTypesDef {
    parallel: bool,
    lpc: bool,
    fwh: bool,
    spi: bool,
    opaque: bool,
}

impl From<BusTypesDef> for BusType {
    fn from(def: BusTypesDef) -> Self {
        let mut bus = BusType::empty();
        if def.parallel {
            bus |= BusType::PARALLEL;
        }
        if def.lpc {
            bus |= BusType::LPC;
        }
        if def.fwh {
            bus |= BusType::FWH;
        }
        if def.spi {
            bus |= BusType::SPI;
        }
        if def.opaque {
            bus |= BusType::OPAQUE;
        }
        if bus.is_empty() {
            bus = BusType::SPI;
        }
        bus
    }
}

/// A single erase run in RON format
#[derive(Debug, Clone, serde::Deserialize)]
struct EraseRunDef {
    size: Size,
    count: u32,
}

/// An eraser profile in RON format
#[derive(Debug, Clone, serde::Deserialize)]
struct EraserProfileDef {
    opcode: u8,
    runs: Vec<EraseRunDef>,
    #[serde(default)]
    chip_erase: bool,
}

/// Voltage range in millivolts
#[derive(Debug, Clone, serde::Deserialize)]
struct VoltageDef {
    min: u16,
    max: u16,
}

impl Default for VoltageDef {
    fn default() -> Self {
        Self {
            min: 2700,
            max: 3600,
        }
    }
}

impl From<VoltageDef> for VoltageRange {
    fn from(def: VoltageDef) -> Self {
        VoltageRange {
            min_mv: def.min,
            max_mv: def.max,
        }
    }
}

/// Test status (RON format)
#[derive(Debug, Clone, Copy, serde::Deserialize, Default)]
enum TestStatusDef {
    #[default]
    Untested,
    Ok,
    Bad,
    OkProbe,
    OkPreReadEraseWrite,
}

impl From<TestStatusDef> for TestStatus {
    fn from(def: TestStatusDef) -> Self {
        match def {
            TestStatusDef::Untested => TestStatus::Untested,
            TestStatusDef::Ok => TestStatus::Ok,
            TestStatusDef::Bad => TestStatus::Bad,
            TestStatusDef::OkProbe => TestStatus::OkProbe,
            TestStatusDef::OkPreReadEraseWrite => TestStatus::OkPreReadEraseWrite,
        }
    }
}

/// Test results (RON format)
#[derive(Debug, Clone, serde::Deserialize, Default)]
#[serde(default)]
struct TestStatusesDef {
    probe: TestStatusDef,
    read: TestStatusDef,
    erase: TestStatusDef,
    write: TestStatusDef,
    wp: TestStatusDef,
}

impl From<TestStatusesDef> for ChipTestStatus {
    fn from(def: TestStatusesDef) -> Self {
        ChipTestStatus {
            probe: def.probe.into(),
            read: def.read.into(),
            erase: def.erase.into(),
            write: def.write.into(),
            wp: def.wp.into(),
        }
    }
}

/// Write granularity (RON format)
#[derive(Debug, Clone, Copy, serde::Deserialize, Default)]
enum WriteGranularityDef {
    Bit,
    Byte,
    #[default]
    Page,
}

impl From<WriteGranularityDef> for WriteGranularity {
    fn from(def: WriteGranularityDef) -> Self {
        match def {
            WriteGranularityDef::Bit => WriteGranularity::Bit,
            WriteGranularityDef::Byte => WriteGranularity::Byte,
            WriteGranularityDef::Page => WriteGranularity::Page,
        }
    }
}

/// Probe tag (RON format)
#[derive(Debug, Clone, Copy, serde::Deserialize, Default)]
enum ProbeTagDef {
    #[default]
    Jedec,
    JedecSfdp,
    JedecStatusRegister,
    JedecEraseProbe,
}

impl From<ProbeTagDef> for ProbeTag {
    fn from(def: ProbeTagDef) -> Self {
        match def {
            ProbeTagDef::Jedec => ProbeTag::Jedec,
            ProbeTagDef::JedecSfdp => ProbeTag::JedecSfdp,
            ProbeTagDef::JedecStatusRegister => ProbeTag::JedecStatusRegister,
            ProbeTagDef::JedecEraseProbe => ProbeTag::JedecEraseProbe,
        }
    }
}

/// Write-protect protocol tag (RON format)
#[derive(Debug, Clone, Copy, serde::Deserialize)]
enum WpProtocolDef {
    W25,
    W25q,
    W25qLarge,
    Generic,
}

impl From<WpProtocolDef> for WpProtocolTag {
    fn from(def: WpProtocolDef) -> Self {
        match def {
            WpProtocolDef::W25 => WpProtocolTag::W25,
            WpProtocolDef::W25q => WpProtocolTag::W25q,
            WpProtocolDef::W25qLarge => WpProtocolTag::W25qLarge,
            WpProtocolDef::Generic => WpProtocolTag::Generic,
        }
    }
}

/// Single chip definition in RON format
#[derive(Debug, Clone, serde::Deserialize)]
struct ChipDef {
    name: String,
    device_id: u16,
    total_size: Size,
    #[serde(default = "default_page_size")]
    page_size: u16,
    #[serde(default)]
    bus_types: BusTypesDef,
    #[serde(default)]
    features: FeaturesDef,
    #[serde(default)]
    write_protocol: WriteProtocolDef,
    #[serde(default)]
    voltage: VoltageDef,
    #[serde(default)]
    write_granularity: WriteGranularityDef,
    #[serde(default)]
    probe_tag: ProbeTagDef,
    #[serde(default)]
    probe_timing_us: Option<u32>,
    wp_protocol: Option<WpProtocolDef>,
    erasers: Vec<EraserProfileDef>,
    #[serde(default)]
    tested: TestStatusesDef,
}

fn default_page_size() -> u16 {
    256
}

/// Vendor definition containing multiple chips
#[derive(Debug, Clone, serde::Deserialize)]
struct VendorDef {
    vendor: String,
    manufacturer_id: u8,
    chips: Vec<ChipDef>,
}

fn probe_timing_from(us: Option<u32>) -> ProbeTiming {
    match us {
        None => ProbeTiming::Zero,
        Some(0) => ProbeTiming::Zero,
        Some(us) => ProbeTiming::Micros(us),
    }
}

fn eraser_from_def(def: EraserProfileDef) -> EraserProfile {
    EraserProfile {
        opcode: def.opcode,
        chip_erase: def.chip_erase,
        runs: def
            .runs
            .into_iter()
            .map(|r| EraseRun {
                blocksize: r.size.to_bytes(),
                blockcount: r.count,
            })
            .collect(),
    }
}

// ============================================================================
// Chip database
// ============================================================================

/// The catalog shipped with this crate, embedded at compile time and parsed
/// exactly once on first use.
static BUILTIN_CATALOG: &str = include_str!("catalog.ron");

static BUILTIN_DB: OnceCell<ChipDatabase> = OnceCell::new();

/// Runtime chip database
///
/// Holds a collection of flash chip definitions that can be loaded from RON
/// documents, either the bundled catalog or user-supplied files.
#[derive(Debug, Clone, Default)]
pub struct ChipDatabase {
    chips: Vec<ChipDescriptor>,
}

impl ChipDatabase {
    /// Returns the statically initialized catalog bundled with this crate,
    /// parsed once on first access.
    pub fn builtin() -> &'static ChipDatabase {
        BUILTIN_DB.get_or_init(|| {
            let mut db = ChipDatabase::empty();
            // A malformed bundled catalog is a programming error, not a
            // runtime condition callers should handle.
            db.load_ron(BUILTIN_CATALOG)
                .expect("bundled chip catalog failed to parse");
            db
        })
    }

    /// Create an empty chip database
    pub fn empty() -> Self {
        Self { chips: Vec::new() }
    }

    /// Create an empty chip database (alias kept for call-site clarity)
    pub fn new() -> Self {
        Self::empty()
    }

    /// Load chip definitions from a single RON file
    pub fn load_file(&mut self, path: &Path) -> Result<usize, ChipDbError> {
        let content = fs::read_to_string(path)?;
        self.load_ron(&content)
    }

    /// Load chip definitions from a RON string
    pub fn load_ron(&mut self, content: &str) -> Result<usize, ChipDbError> {
        let vendors: Vec<VendorDef> = match ron::from_str::<VendorDef>(content) {
            Ok(single) => alloc::vec![single],
            Err(_) => ron::from_str::<Vec<VendorDef>>(content)?,
        };

        let mut count = 0;
        for vendor_def in vendors {
            for chip_def in vendor_def.chips {
                let erasers: Vec<EraserProfile> = chip_def
                    .erasers
                    .into_iter()
                    .map(eraser_from_def)
                    .collect();
                if erasers.is_empty() {
                    return Err(ChipDbError::Validation(alloc::format!(
                        "chip {} has no eraser profiles",
                        chip_def.name
                    )));
                }

                let chip = ChipDescriptor {
                    vendor: vendor_def.vendor.clone(),
                    name: chip_def.name,
                    bus_types: chip_def.bus_types.into(),
                    manufacturer_id: vendor_def.manufacturer_id as u32,
                    model_id: chip_def.device_id as u32,
                    total_size_kib: chip_def.total_size.to_bytes() / 1024,
                    page_size: chip_def.page_size,
                    features: chip_def.features.into(),
                    write_protocol: chip_def.write_protocol.into(),
                    voltage: chip_def.voltage.into(),
                    write_granularity: chip_def.write_granularity.into(),
                    probe_tag: chip_def.probe_tag.into(),
                    probe_timing: probe_timing_from(chip_def.probe_timing_us),
                    wp_protocol: chip_def.wp_protocol.map(Into::into),
                    erasers,
                    tested: chip_def.tested.into(),
                };
                self.chips.push(chip);
                count += 1;
            }
        }

        Ok(count)
    }

    /// Load all RON files from a directory
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, ChipDbError> {
        let mut total = 0;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "ron") {
                total += self.load_file(&path)?;
            }
        }

        Ok(total)
    }

    /// Merge another database's entries into this one (used to layer a
    /// user catalog on top of the builtin one).
    pub fn merge(&mut self, other: &ChipDatabase) {
        self.chips.extend(other.chips.iter().cloned());
    }

    /// Get all chips in the database
    pub fn chips(&self) -> &[ChipDescriptor] {
        &self.chips
    }

    /// Get the number of chips in the database
    pub fn len(&self) -> usize {
        self.chips.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    /// Find every chip descriptor matching a JEDEC ID.
    ///
    /// Several chip families share an ID ("evil twins"); callers that need
    /// to disambiguate should iterate the returned set and try each
    /// candidate's `probe_tag` in turn, accepting the first success
    /// (`spec.md` §4.1, §9).
    pub fn find_all_by_jedec_id(
        &self,
        manufacturer: u8,
        device: u16,
    ) -> impl Iterator<Item = &ChipDescriptor> {
        self.chips
            .iter()
            .filter(move |c| c.matches_jedec_id(manufacturer, device))
    }

    /// Find a single chip by its JEDEC ID (the first catalog match; prefer
    /// [`ChipDatabase::find_all_by_jedec_id`] when evil twins matter).
    pub fn find_by_jedec_id(&self, manufacturer: u8, device: u16) -> Option<&ChipDescriptor> {
        self.find_all_by_jedec_id(manufacturer, device).next()
    }

    /// Find chips by name (case-insensitive partial match)
    pub fn find_by_name(&self, name: &str) -> Vec<&ChipDescriptor> {
        let name_lower = name.to_lowercase();
        self.chips
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&name_lower))
            .collect()
    }

    /// Find chips by vendor (case-insensitive partial match)
    pub fn find_by_vendor(&self, vendor: &str) -> Vec<&ChipDescriptor> {
        let vendor_lower = vendor.to_lowercase();
        self.chips
            .iter()
            .filter(|c| c.vendor.to_lowercase().contains(&vendor_lower))
            .collect()
    }

    /// Iterate over all chips
    pub fn iter(&self) -> impl Iterator<Item = &ChipDescriptor> {
        self.chips.iter()
    }

    /// The distinct operating-voltage ranges supported by chips on a given
    /// bus, sorted and deduplicated (`spec.md` §4.1).
    pub fn voltage_ranges_for_bus(&self, bus: BusType) -> Vec<VoltageRange> {
        let mut ranges: Vec<VoltageRange> = self
            .chips
            .iter()
            .filter(|c| c.bus_types.contains(bus))
            .map(|c| c.voltage)
            .collect();
        ranges.sort();
        ranges.dedup();
        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ron() -> &'static str {
        r#"
        (
            vendor: "Winbond",
            manufacturer_id: 0xEF,
            chips: [
                (
                    name: "W25Q128FV",
                    device_id: 0x4018,
                    total_size: MiB(16),
                    page_size: 256,
                    bus_types: (spi: true),
                    features: (
                        fast_read: true,
                        dual_io: true,
                        quad_io: true,
                        wp_tb: true,
                        wp_sec: true,
                        wp_cmp: true,
                    ),
                    write_protocol: Wren,
                    wp_protocol: Some(W25q),
                    voltage: (min: 2700, max: 3600),
                    erasers: [
                        (opcode: 0x20, runs: [(size: KiB(4), count: 4096)]),
                        (opcode: 0x52, runs: [(size: KiB(32), count: 512)]),
                        (opcode: 0xD8, runs: [(size: KiB(64), count: 256)]),
                        (opcode: 0xC7, runs: [(size: MiB(16), count: 1)], chip_erase: true),
                    ],
                    tested: (probe: Ok, read: Ok, erase: Ok, write: Ok),
                ),
            ],
        )
        "#
    }

    #[test]
    fn test_load_ron() {
        let mut db = ChipDatabase::empty();
        let count = db.load_ron(sample_ron()).unwrap();

        assert_eq!(count, 1);
        assert_eq!(db.len(), 1);

        let chip = db.find_by_jedec_id(0xEF, 0x4018).unwrap();
        assert_eq!(chip.name, "W25Q128FV");
        assert_eq!(chip.vendor, "Winbond");
        assert_eq!(chip.total_size(), 16 * 1024 * 1024);
        assert!(chip.features.contains(Features::FAST_READ));
        assert_eq!(chip.wp_protocol, Some(WpProtocolTag::W25q));
        assert_eq!(chip.erasers.len(), 4);
        assert!(chip.erasers.iter().any(|e| e.chip_erase));
    }

    #[test]
    fn test_evil_twins_iterator() {
        let ron = r#"
        [
            (
                vendor: "Foo",
                manufacturer_id: 0x01,
                chips: [
                    (name: "Foo1", device_id: 0x1234, total_size: KiB(512), probe_tag: Jedec,
                     erasers: [(opcode: 0x20, runs: [(size: KiB(4), count: 128)])]),
                ],
            ),
            (
                vendor: "Bar",
                manufacturer_id: 0x01,
                chips: [
                    (name: "Bar1", device_id: 0x1234, total_size: KiB(512), probe_tag: JedecSfdp,
                     erasers: [(opcode: 0x20, runs: [(size: KiB(4), count: 128)])]),
                ],
            ),
        ]
        "#;

        let mut db = ChipDatabase::empty();
        db.load_ron(ron).unwrap();

        let matches: Vec<_> = db.find_all_by_jedec_id(0x01, 0x1234).collect();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_size_conversion() {
        assert_eq!(Size::B(256).to_bytes(), 256);
        assert_eq!(Size::KiB(4).to_bytes(), 4096);
        assert_eq!(Size::KiB(64).to_bytes(), 65536);
        assert_eq!(Size::MiB(1).to_bytes(), 1048576);
        assert_eq!(Size::MiB(16).to_bytes(), 16777216);
    }
}

//! FMAP (Flash Map) parsing and discovery
//!
//! FMAP is a self-describing region table used primarily by Chromebook
//! firmware to describe flash regions. The structure can be embedded
//! anywhere in a flash image or live device and is located by signature
//! scan (see `search_fmap`).
//!
//! Reference: https://chromium.googlesource.com/chromiumos/platform/flashmap

use std::format;
use std::string::{String, ToString};
use std::vec::Vec;

use super::{Layout, LayoutError, LayoutSource, Region};

/// FMAP signature: "__FMAP__"
const FMAP_SIGNATURE: &[u8; 8] = b"__FMAP__";

/// Maximum supported FMAP major version
const FMAP_VER_MAJOR: u8 = 1;

/// Size of the FMAP header: 8 (signature) + 1 (major) + 1 (minor) +
/// 8 (base) + 4 (image size) + 64 (name) + 2 (nareas) = 88 bytes.
const FMAP_HEADER_SIZE: usize = 88;

/// Size of one FMAP area record: 4 (offset) + 4 (size) + 64 (name) +
/// 2 (flags) = 74 bytes.
const FMAP_AREA_SIZE: usize = 74;

/// FMAP area flags
pub mod flags {
    /// Area is static (read-only)
    pub const STATIC: u16 = 1 << 0;
    /// Area is compressed
    #[allow(dead_code)]
    pub const COMPRESSED: u16 = 1 << 1;
    /// Area is read-only
    pub const RO: u16 = 1 << 2;
}

/// Validate an FMAP structure at the start of `data`.
fn validate_fmap(data: &[u8]) -> Result<(), LayoutError> {
    if data.len() < FMAP_HEADER_SIZE {
        return Err(LayoutError::InvalidFmapSignature);
    }

    if &data[0..8] != FMAP_SIGNATURE {
        return Err(LayoutError::InvalidFmapSignature);
    }

    let ver_major = data[8];
    if ver_major > FMAP_VER_MAJOR {
        return Err(LayoutError::UnsupportedFmapVersion);
    }

    // Name field (bytes 22..86) must contain a terminating NUL somewhere
    // and be printable up to that point.
    let name_bytes = &data[22..86];
    let nul_pos = name_bytes.iter().position(|&b| b == 0);
    match nul_pos {
        Some(pos) => {
            if !name_bytes[..pos].iter().all(|&b| (0x20..0x7f).contains(&b)) {
                return Err(LayoutError::InvalidFmapSignature);
            }
        }
        None => return Err(LayoutError::InvalidFmapSignature),
    }

    let nareas = u16::from_le_bytes([data[86], data[87]]) as usize;
    let required_size = FMAP_HEADER_SIZE + nareas * FMAP_AREA_SIZE;
    if data.len() < required_size {
        return Err(LayoutError::InvalidFmapSignature);
    }

    Ok(())
}

/// Search for an FMAP signature anywhere in `data`, byte by byte, and
/// return the offset of the first candidate that validates.
///
/// Per the spec: no hidden backtracking, no power-of-two probing — a
/// straight left-to-right scan with validation of each candidate.
fn find_fmap(data: &[u8]) -> Option<usize> {
    if data.len() < FMAP_HEADER_SIZE {
        return None;
    }

    for offset in 0..=(data.len() - FMAP_HEADER_SIZE) {
        if &data[offset..offset + 8] == FMAP_SIGNATURE && validate_fmap(&data[offset..]).is_ok() {
            return Some(offset);
        }
    }

    None
}

/// Parse FMAP from raw data (signature scan, then parse the first valid
/// candidate).
pub fn parse_fmap(data: &[u8]) -> Result<Layout, LayoutError> {
    let offset = find_fmap(data).ok_or(LayoutError::InvalidFmapSignature)?;
    parse_fmap_at(data, offset)
}

/// Parse FMAP from a specific offset, without scanning.
pub fn parse_fmap_at(data: &[u8], offset: usize) -> Result<Layout, LayoutError> {
    let fmap_data = &data[offset..];
    validate_fmap(fmap_data)?;

    let ver_major = fmap_data[8];
    let ver_minor = fmap_data[9];
    let _base = u64::from_le_bytes(fmap_data[10..18].try_into().unwrap());
    let _size = u32::from_le_bytes(fmap_data[18..22].try_into().unwrap());
    let name_bytes = &fmap_data[22..86];
    let nareas = u16::from_le_bytes([fmap_data[86], fmap_data[87]]) as usize;

    let name = parse_fmap_string(name_bytes);

    let mut layout = Layout::with_source(LayoutSource::Fmap);
    layout.name = Some(format!("FMAP: {} (v{}.{})", name, ver_major, ver_minor));

    for i in 0..nareas {
        let area_offset = FMAP_HEADER_SIZE + i * FMAP_AREA_SIZE;
        let area_data = &fmap_data[area_offset..area_offset + FMAP_AREA_SIZE];

        let area_start = u32::from_le_bytes(area_data[0..4].try_into().unwrap());
        let area_size = u32::from_le_bytes(area_data[4..8].try_into().unwrap());
        let area_name_bytes = &area_data[8..72];
        let area_flags = u16::from_le_bytes([area_data[72], area_data[73]]);

        let area_name = parse_fmap_string(area_name_bytes);
        let end = if area_size == 0 {
            area_start
        } else {
            area_start + area_size - 1
        };

        let mut region = Region::new(area_name, area_start, end);
        region.readonly = (area_flags & flags::STATIC) != 0 || (area_flags & flags::RO) != 0;

        layout.add_region(region);
    }

    layout.sort_by_address();
    Ok(layout)
}

/// Parse a null-terminated FMAP string
fn parse_fmap_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).to_string()
}

/// Check if data appears to contain an FMAP
pub fn has_fmap(data: &[u8]) -> bool {
    find_fmap(data).is_some()
}

/// Find the offset of FMAP in data
pub fn fmap_offset(data: &[u8]) -> Option<usize> {
    find_fmap(data)
}

impl Layout {
    /// Parse layout from FMAP in raw data
    pub fn from_fmap(data: &[u8]) -> Result<Self, LayoutError> {
        parse_fmap(data)
    }

    /// Parse layout from FMAP in a file
    pub fn from_fmap_file(path: impl AsRef<std::path::Path>) -> Result<Self, LayoutError> {
        let data = std::fs::read(path).map_err(|_| LayoutError::IoError)?;
        parse_fmap(&data)
    }
}

/// A byte-addressable FMAP scan source: either a file buffer or a live
/// flash device. `search_fmap` is generic over this so the same scan
/// procedure works whether the candidate bytes come from a file already
/// in memory or from chip reads issued one chunk at a time.
pub trait FmapSearchable {
    /// Total size of the source in bytes.
    fn size(&self) -> u32;
    /// Read `buf.len()` bytes starting at `offset`.
    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), LayoutError>;
}

impl FmapSearchable for &[u8] {
    fn size(&self) -> u32 {
        (*self).len() as u32
    }

    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), LayoutError> {
        let start = offset as usize;
        let end = start.checked_add(buf.len()).ok_or(LayoutError::IoError)?;
        let slice = self.get(start..end).ok_or(LayoutError::IoError)?;
        buf.copy_from_slice(slice);
        Ok(())
    }
}

/// Scan a source byte-by-byte for a valid FMAP header, reading the
/// header and area table only once a candidate signature validates.
///
/// This is the spec's "no hidden backtracking" discovery procedure:
/// read a byte-wide signature-sized window at every offset, and the
/// first window whose header validates wins; the full area table is
/// then read starting at that offset.
pub fn search_fmap<S: FmapSearchable>(source: &mut S) -> Result<Layout, LayoutError> {
    let size = source.size();
    if (size as usize) < FMAP_HEADER_SIZE {
        return Err(LayoutError::InvalidFmapSignature);
    }

    let scan_limit = size as usize - FMAP_HEADER_SIZE;
    let mut window = [0u8; FMAP_HEADER_SIZE];

    for offset in 0..=scan_limit {
        source.read_at(offset as u32, &mut window[..8])?;
        if &window[..8] != FMAP_SIGNATURE {
            continue;
        }

        source.read_at(offset as u32, &mut window)?;
        if validate_fmap(&window).is_err() {
            continue;
        }

        let nareas = u16::from_le_bytes([window[86], window[87]]) as usize;
        let total_len = FMAP_HEADER_SIZE + nareas * FMAP_AREA_SIZE;
        if offset + total_len > size as usize {
            continue;
        }

        let mut full = std::vec![0u8; total_len];
        source.read_at(offset as u32, &mut full)?;
        if let Ok(layout) = parse_fmap_at(&full, 0) {
            return Ok(layout);
        }
    }

    Err(LayoutError::InvalidFmapSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec;
    use std::vec::Vec;

    fn make_test_fmap() -> Vec<u8> {
        let mut data = vec![0xFF; 0x1000];

        let offset = 0x100;

        data[offset..offset + 8].copy_from_slice(FMAP_SIGNATURE);
        data[offset + 8] = 1; // ver_major
        data[offset + 9] = 0; // ver_minor
        data[offset + 10..offset + 18].copy_from_slice(&0u64.to_le_bytes());
        data[offset + 18..offset + 22].copy_from_slice(&0x1000u32.to_le_bytes());

        let name = b"TEST_FMAP\0";
        // clear the name field first (it was 0xFF from the fill above)
        for b in &mut data[offset + 22..offset + 86] {
            *b = 0;
        }
        data[offset + 22..offset + 22 + name.len()].copy_from_slice(name);

        data[offset + 86..offset + 88].copy_from_slice(&2u16.to_le_bytes());

        let area0_offset = offset + FMAP_HEADER_SIZE;
        data[area0_offset..area0_offset + 4].copy_from_slice(&0u32.to_le_bytes());
        data[area0_offset + 4..area0_offset + 8].copy_from_slice(&0x200u32.to_le_bytes());
        for b in &mut data[area0_offset + 8..area0_offset + 72] {
            *b = 0;
        }
        let area0_name = b"RO_SECTION\0";
        data[area0_offset + 8..area0_offset + 8 + area0_name.len()].copy_from_slice(area0_name);
        data[area0_offset + 72..area0_offset + 74].copy_from_slice(&flags::STATIC.to_le_bytes());

        let area1_offset = area0_offset + FMAP_AREA_SIZE;
        data[area1_offset..area1_offset + 4].copy_from_slice(&0x200u32.to_le_bytes());
        data[area1_offset + 4..area1_offset + 8].copy_from_slice(&0xE00u32.to_le_bytes());
        for b in &mut data[area1_offset + 8..area1_offset + 72] {
            *b = 0;
        }
        let area1_name = b"RW_SECTION\0";
        data[area1_offset + 8..area1_offset + 8 + area1_name.len()].copy_from_slice(area1_name);
        data[area1_offset + 72..area1_offset + 74].copy_from_slice(&0u16.to_le_bytes());

        data
    }

    #[test]
    fn test_has_fmap() {
        let data = make_test_fmap();
        assert!(has_fmap(&data));
        assert!(!has_fmap(&[0xFF; 0x1000]));
    }

    #[test]
    fn test_fmap_offset() {
        let data = make_test_fmap();
        assert_eq!(fmap_offset(&data), Some(0x100));
    }

    #[test]
    fn test_parse_fmap() {
        let data = make_test_fmap();
        let layout = parse_fmap(&data).unwrap();

        assert!(layout.name.as_ref().unwrap().contains("TEST_FMAP"));
        assert_eq!(layout.regions.len(), 2);

        assert_eq!(layout.regions[0].name, "RO_SECTION");
        assert_eq!(layout.regions[0].start, 0x000);
        assert_eq!(layout.regions[0].end, 0x1FF);
        assert!(layout.regions[0].readonly);

        assert_eq!(layout.regions[1].name, "RW_SECTION");
        assert_eq!(layout.regions[1].start, 0x200);
        assert_eq!(layout.regions[1].end, 0xFFF);
        assert!(!layout.regions[1].readonly);
    }

    #[test]
    fn test_search_fmap_over_slice() {
        let data = make_test_fmap();
        let mut src: &[u8] = &data;
        let layout = search_fmap(&mut src).unwrap();
        assert_eq!(layout.regions.len(), 2);
    }

    #[test]
    fn test_search_fmap_ignores_corrupted_candidate() {
        let mut data = make_test_fmap();
        // Append a near-match with a bad version byte before the real one.
        let mut corrupt = vec![0xFFu8; 0x100];
        corrupt[0..8].copy_from_slice(FMAP_SIGNATURE);
        corrupt[8] = 0xFF; // invalid major version
        let mut combined = corrupt;
        combined.append(&mut data);

        let mut src: &[u8] = &combined;
        let layout = search_fmap(&mut src).unwrap();
        assert_eq!(layout.regions.len(), 2);
    }
}

//! Write protection range decoding and solving
//!
//! `decode_spi25_wp` is the concrete, register-level entry point (it reads
//! raw SR1/SR2 bytes); `decode_range`/`find_bits_for_range`/`get_all_ranges`
//! operate one level up, on the already-decoded [`WpBits`] a chip's
//! [`super::types::WpRegBitMap`] produces, and are shared by every
//! `RangeDecoder` variant.

use super::types::{Care, RangeDecoder, WpBits, WpRange};

/// Protected size for a given BP value under the standard variable-size
/// scheme (BP=0 means unprotected, BP>=7 means whole chip).
fn spi25_size(bp: u8, sec: bool) -> Option<u32> {
    match bp {
        0 => Some(0),
        1 => Some(if sec { 4 * 1024 } else { 64 * 1024 }),
        2 => Some(if sec { 8 * 1024 } else { 128 * 1024 }),
        3 => Some(if sec { 16 * 1024 } else { 256 * 1024 }),
        4 => Some(if sec { 32 * 1024 } else { 512 * 1024 }),
        5 => Some(if sec { 64 * 1024 } else { 1024 * 1024 }),
        6 => Some(if sec { 128 * 1024 } else { 2 * 1024 * 1024 }),
        _ => None,
    }
}

/// Protected size under the fixed-64K-block scheme: BP=0 unprotected,
/// each increment doubles the block count (1, 2, 4, ... blocks of 64K).
fn spi25_64k_size(bp: u8) -> Option<u32> {
    if bp == 0 {
        Some(0)
    } else {
        1u32.checked_shl((bp - 1) as u32).map(|n| n * 64 * 1024)
    }
}

/// Anchor a protected size at the top or bottom of the chip, then apply the
/// CMP inversion if set.
fn anchor_and_invert(protected_size: u32, tb: bool, cmp: bool, total_size: u32) -> WpRange {
    let protected_size = core::cmp::min(protected_size, total_size);

    let (start, end) = if tb {
        (0, protected_size)
    } else {
        (total_size.saturating_sub(protected_size), total_size)
    };

    let (start, end) = if cmp {
        if start == 0 && end == 0 {
            (0, total_size)
        } else if start == 0 {
            (end, total_size)
        } else {
            (0, start)
        }
    } else {
        (start, end)
    };

    WpRange::new(start, end.saturating_sub(start))
}

/// Decode write protection status for the standard BP0-BP2 + TB + SEC + CMP
/// scheme, operating directly on raw status register bytes.
///
/// This is the most common write protection scheme used by Winbond,
/// GigaDevice, and many other manufacturers.
pub fn decode_spi25_wp(
    sr1: u8,
    sr2: u8,
    total_size: u32,
    has_tb: bool,
    has_sec: bool,
    has_cmp: bool,
) -> WpRange {
    use crate::spi::opcodes::{SR1_BP0, SR1_BP1, SR1_BP2, SR1_SEC, SR1_TB};

    let bp = ((sr1 & SR1_BP0) >> 2) | ((sr1 & SR1_BP1) >> 2) | ((sr1 & SR1_BP2) >> 2);
    let tb = has_tb && (sr1 & SR1_TB) != 0;
    let sec = has_sec && (sr1 & SR1_SEC) != 0;
    let cmp = has_cmp && (sr2 & 0x40) != 0;

    let protected_size = spi25_size(bp, sec).unwrap_or(total_size);
    anchor_and_invert(protected_size, tb, cmp, total_size)
}

/// Decode a [`WpBits`] snapshot into a protected [`WpRange`] using the
/// algorithm named by `decoder`.
pub fn decode_range(bits: &WpBits, total_size: u32, decoder: RangeDecoder) -> WpRange {
    let bp = bits.bp_value();
    let tb = bits.tb.unwrap_or(0) != 0;
    let sec = bits.sec.unwrap_or(0) != 0;
    let cmp = bits.cmp.unwrap_or(0) != 0;

    match decoder {
        RangeDecoder::Spi25 => {
            let size = spi25_size(bp, sec).unwrap_or(total_size);
            anchor_and_invert(size, tb, cmp, total_size)
        }
        RangeDecoder::Spi25_64kBlock => {
            let size = spi25_64k_size(bp).unwrap_or(total_size);
            anchor_and_invert(size, tb, cmp, total_size)
        }
        RangeDecoder::Spi25BitCmp => {
            let bp_mask = if bits.bp_count == 0 {
                0
            } else {
                (1u8 << bits.bp_count) - 1
            };
            let effective_bp = if cmp { bp ^ bp_mask } else { bp };
            let size = spi25_size(effective_bp, sec).unwrap_or(total_size);
            anchor_and_invert(size, tb, false, total_size)
        }
        RangeDecoder::Spi25_2xBlock => {
            let size = spi25_size(bp, sec).unwrap_or(total_size).saturating_mul(2);
            anchor_and_invert(size, tb, cmp, total_size)
        }
    }
}

/// Iterate the bit combinations a chip's register map can produce: every
/// BP value `0..2^bp_count`, crossed with the candidate TB/SEC/CMP values
/// allowed by the caller's [`Care`] constraints.
fn candidate_bits<'a>(
    bp_count: usize,
    tb_present: bool,
    sec_present: bool,
    cmp_present: bool,
    tb: Care,
    sec: Care,
    cmp: Care,
) -> impl Iterator<Item = WpBits> + 'a {
    let bp_range = 0u16..(1u16 << bp_count);
    let tb_candidates: &[bool] = if tb_present { tb.candidates() } else { &[false] };
    let sec_candidates: &[bool] = if sec_present { sec.candidates() } else { &[false] };
    let cmp_candidates: &[bool] = if cmp_present { cmp.candidates() } else { &[false] };

    bp_range.flat_map(move |bp| {
        tb_candidates.iter().flat_map(move |&tb_v| {
            sec_candidates.iter().flat_map(move |&sec_v| {
                cmp_candidates.iter().map(move |&cmp_v| {
                    let mut bits = WpBits::empty();
                    bits.set_bp_value(bp as u8, bp_count);
                    if tb_present {
                        bits.tb = Some(tb_v as u8);
                    }
                    if sec_present {
                        bits.sec = Some(sec_v as u8);
                    }
                    if cmp_present {
                        bits.cmp = Some(cmp_v as u8);
                    }
                    bits
                })
            })
        })
    })
}

/// Find a bit combination that decodes to exactly `range`, honoring the
/// per-modifier [`Care`] constraints.
///
/// Returns the first match in BP-then-TB-then-SEC-then-CMP enumeration
/// order; chips rarely have more than one combination per range, so there
/// is no meaningful "best" choice to prefer among ties.
pub fn find_bits_for_range(
    range: &WpRange,
    total_size: u32,
    bp_count: usize,
    tb_present: bool,
    sec_present: bool,
    cmp_present: bool,
    tb: Care,
    sec: Care,
    cmp: Care,
    decoder: RangeDecoder,
) -> Option<WpBits> {
    candidate_bits(
        bp_count,
        tb_present,
        sec_present,
        cmp_present,
        tb,
        sec,
        cmp,
    )
    .find(|bits| decode_range(bits, total_size, decoder) == *range)
}

/// Enumerate every distinct protected range a chip's register map can
/// express, in enumeration order with duplicates removed.
#[cfg(feature = "alloc")]
pub fn get_all_ranges(
    total_size: u32,
    bp_count: usize,
    tb_present: bool,
    sec_present: bool,
    cmp_present: bool,
    decoder: RangeDecoder,
) -> alloc::vec::Vec<WpRange> {
    let mut ranges: alloc::vec::Vec<WpRange> = candidate_bits(
        bp_count,
        tb_present,
        sec_present,
        cmp_present,
        Care::Any,
        Care::Any,
        Care::Any,
    )
    .map(|bits| decode_range(&bits, total_size, decoder))
    .collect();

    ranges.sort_by_key(|r| (r.start, r.len));
    ranges.dedup();
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_spi25_matches_direct_bits() {
        // bp=1 (BP0 set), no TB/SEC/CMP: 64K from the top
        let sr1 = crate::spi::opcodes::SR1_BP0;
        let range = decode_spi25_wp(sr1, 0, 16 * 1024 * 1024, true, true, true);
        assert_eq!(range.start, 16 * 1024 * 1024 - 64 * 1024);
        assert_eq!(range.len, 64 * 1024);
    }

    #[test]
    fn find_bits_for_range_roundtrip() {
        let total = 16 * 1024 * 1024;
        let target = WpRange::new(total - 64 * 1024, 64 * 1024);

        let found = find_bits_for_range(
            &target,
            total,
            3,
            true,
            true,
            false,
            Care::Set(false),
            Care::Any,
            Care::Any,
            RangeDecoder::Spi25,
        )
        .expect("a bit combination should exist for a 64K top block");

        let decoded = decode_range(&found, total, RangeDecoder::Spi25);
        assert_eq!(decoded, target);
    }

    #[test]
    fn get_all_ranges_includes_none_and_full() {
        let total = 1024 * 1024;
        let ranges = get_all_ranges(total, 3, true, true, false, RangeDecoder::Spi25);
        assert!(ranges.contains(&WpRange::none()));
        assert!(ranges.iter().any(|r| r.len == total));
    }
}

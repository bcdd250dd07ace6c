//! Plain-text layout file parsing
//!
//! Grammar: one entry per line, `start:end name`, numbers in hex (`0x`
//! prefix accepted), name whitespace-terminated up to 255 chars. Blank
//! lines are ignored.

use std::string::{String, ToString};

use super::{Layout, LayoutError, LayoutSource, Region};

/// Maximum region name length accepted by the grammar.
const MAX_NAME_LEN: usize = 255;

fn parse_hex_field(field: &str) -> Result<u32, LayoutError> {
    let field = field.trim();
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u32::from_str_radix(digits, 16).map_err(|_| LayoutError::ParseError)
}

fn parse_line(line: &str) -> Result<Region, LayoutError> {
    let (addrs, rest) = line.split_once(char::is_whitespace).ok_or(LayoutError::ParseError)?;
    let (start_str, end_str) = addrs.split_once(':').ok_or(LayoutError::ParseError)?;

    let start = parse_hex_field(start_str)?;
    let end = parse_hex_field(end_str)?;

    let name = rest.trim_start();
    let name = name.split_whitespace().next().ok_or(LayoutError::ParseError)?;
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(LayoutError::ParseError);
    }

    if start > end {
        return Err(LayoutError::InvalidRegion);
    }

    Ok(Region::new(name.to_string(), start, end))
}

/// Parse a text layout from a string.
pub fn parse_text(contents: &str) -> Result<Layout, LayoutError> {
    let mut layout = Layout::with_source(LayoutSource::Text);
    layout.name = Some("text layout".to_string());

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        layout.add_region(parse_line(line)?);
    }

    layout.sort_by_address();
    Ok(layout)
}

impl Layout {
    /// Parse a plain-text `start:end name` layout from a string.
    pub fn from_text(contents: &str) -> Result<Self, LayoutError> {
        parse_text(contents)
    }

    /// Parse a plain-text `start:end name` layout file.
    pub fn from_text_file(path: impl AsRef<std::path::Path>) -> Result<Self, LayoutError> {
        let contents = std::fs::read_to_string(path).map_err(|_| LayoutError::IoError)?;
        parse_text(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_layout() {
        let text = "0x000000:0x000FFF BOOT\n0x001000:0x1FFFFF RW_SECTION\n";
        let layout = parse_text(text).unwrap();
        assert_eq!(layout.regions.len(), 2);
        assert_eq!(layout.regions[0].name, "BOOT");
        assert_eq!(layout.regions[0].start, 0);
        assert_eq!(layout.regions[0].end, 0x0FFF);
        assert_eq!(layout.regions[1].name, "RW_SECTION");
    }

    #[test]
    fn ignores_blank_lines() {
        let text = "\n0x0:0xFFF BOOT\n\n   \n0x1000:0x1FFF RW\n";
        let layout = parse_text(text).unwrap();
        assert_eq!(layout.regions.len(), 2);
    }

    #[test]
    fn accepts_decimal_style_hex_without_prefix() {
        let text = "0:fff BOOT\n";
        let layout = parse_text(text).unwrap();
        assert_eq!(layout.regions[0].end, 0xfff);
    }

    #[test]
    fn rejects_start_after_end() {
        let text = "0x1000:0x0 BOOT\n";
        assert_eq!(parse_text(text), Err(LayoutError::InvalidRegion));
    }

    #[test]
    fn rejects_missing_name() {
        let text = "0x0:0xFFF\n";
        assert_eq!(parse_text(text), Err(LayoutError::ParseError));
    }

    #[test]
    fn rejects_overlong_name() {
        let long_name = "a".repeat(300);
        let text = std::format!("0x0:0xFFF {}\n", long_name);
        assert_eq!(parse_text(&text), Err(LayoutError::ParseError));
    }
}

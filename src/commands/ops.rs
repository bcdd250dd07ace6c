//! Read/write/verify/erase/extract/info command implementations
//!
//! These operate on a `Session`'s open `FlashHandle`, following the
//! pipeline described for read/write/verify/erase: probe already happened
//! when the session was opened; what's left is layout resolution (done by
//! the caller), then the actual data movement.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rflasher_core::flash::{
    smart_write, smart_write_by_layout, FlashDeviceExt, WriteProgress, WriteStats,
};
use rflasher_core::layout::Layout;
use rflasher_flash::{Session, SessionError, SessionResult};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

const STDIO: &str = "-";

fn read_input(path: &Path) -> SessionResult<Vec<u8>> {
    let mut data = Vec::new();
    if path.as_os_str() == STDIO {
        std::io::stdin()
            .read_to_end(&mut data)
            .map_err(|e| SessionError::argument(format!("failed to read stdin: {}", e)))?;
    } else {
        File::open(path)
            .and_then(|mut f| f.read_to_end(&mut data))
            .map_err(|e| {
                SessionError::argument(format!("failed to read {}: {}", path.display(), e))
            })?;
    }
    Ok(data)
}

fn write_output(path: &Path, data: &[u8]) -> SessionResult<()> {
    if path.as_os_str() == STDIO {
        std::io::stdout()
            .write_all(data)
            .map_err(|e| SessionError::environment(format!("failed to write stdout: {}", e)))?;
    } else {
        File::create(path)
            .and_then(|mut f| f.write_all(data))
            .map_err(|e| {
                SessionError::environment(format!("failed to write {}: {}", path.display(), e))
            })?;
    }
    Ok(())
}

/// Progress reporter used for write/verify pipelines.
struct IndicatifProgress {
    multi: MultiProgress,
    current_bar: Option<ProgressBar>,
}

impl IndicatifProgress {
    fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            current_bar: None,
        }
    }

    fn create_bar(&mut self, total: u64, phase: &'static str) {
        let pb = self.multi.add(ProgressBar::new(total));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                    phase
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.current_bar = Some(pb);
    }

    fn create_spinner(&mut self, message: String) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        self.current_bar = Some(pb);
    }

    fn finish(&mut self, message: &str) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl WriteProgress for IndicatifProgress {
    fn reading(&mut self, total_bytes: usize) {
        self.create_bar(total_bytes as u64, "Reading");
    }

    fn read_progress(&mut self, bytes_read: usize) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(bytes_read as u64);
        }
    }

    fn erasing(&mut self, blocks_to_erase: usize, bytes_to_erase: usize) {
        self.finish("Read complete");
        self.create_spinner(format!(
            "Erasing {} block(s) ({} bytes)...",
            blocks_to_erase, bytes_to_erase
        ));
    }

    fn erase_progress(&mut self, blocks_erased: usize, _bytes_erased: usize) {
        if let Some(pb) = &self.current_bar {
            pb.set_message(format!("Erased {} block(s)...", blocks_erased));
        }
    }

    fn writing(&mut self, bytes_to_write: usize) {
        self.finish("Erase complete");
        self.create_bar(bytes_to_write as u64, "Writing");
    }

    fn write_progress(&mut self, bytes_written: usize) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(bytes_written as u64);
        }
    }

    fn complete(&mut self, stats: &WriteStats) {
        self.finish("Write complete");
        if !stats.flash_modified {
            println!("Flash already contains the desired data - no changes needed");
        } else {
            println!(
                "{} byte(s) changed, {} block(s) erased ({} bytes), {} bytes written",
                stats.bytes_changed, stats.erases_performed, stats.bytes_erased, stats.bytes_written
            );
        }
    }
}

fn underscored(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// `flash-name`: print the detected chip's vendor and name.
pub fn cmd_flash_name(session: &Session) -> SessionResult<()> {
    let info = session
        .handle
        .chip_info()
        .ok_or_else(|| SessionError::not_found("no chip detected"))?;
    println!("{} {}", info.vendor, info.name);
    Ok(())
}

/// `flash-size`: print the detected chip's size in bytes.
pub fn cmd_flash_size(session: &Session) -> SessionResult<()> {
    println!("{}", session.handle.size());
    Ok(())
}

/// `read`: read the chip (or its included regions) to `file`.
pub fn cmd_read(session: &mut Session, file: &Path) -> SessionResult<()> {
    let total_size = session.handle.size() as usize;

    match &session.layout {
        Some(layout) if layout.has_included_regions() => {
            let included: Vec<_> = layout.included_regions().cloned().collect();
            println!("Reading {} region(s):", included.len());
            for region in &included {
                println!(
                    "  {} (0x{:08X}-0x{:08X}, {} bytes)",
                    region.name,
                    region.start,
                    region.end,
                    region.size()
                );
            }

            let mut data = vec![0xFFu8; total_size];
            for region in &included {
                let start = region.start as usize;
                let end = region.end as usize + 1;
                session
                    .handle
                    .read(region.start, &mut data[start..end])
                    .map_err(|e| SessionError::TransportError(e.to_string()))?;
            }
            write_output(file, &data)?;
            println!("Wrote {} bytes to {:?}", data.len(), file);
        }
        _ => {
            let mut data = vec![0u8; total_size];
            session
                .handle
                .read(0, &mut data)
                .map_err(|e| SessionError::TransportError(e.to_string()))?;
            write_output(file, &data)?;
            println!("Wrote {} bytes to {:?}", data.len(), file);
        }
    }

    Ok(())
}

/// Build the image to program, following the planner's merge policy: bytes
/// outside included regions come from `old_contents`; bytes inside an
/// included region come from the region's own file if one was given,
/// otherwise from `new_contents`.
fn build_new_image(
    session: &Session,
    layout: &Layout,
    old_contents: &[u8],
    new_contents: &[u8],
) -> SessionResult<Vec<u8>> {
    let mut image = old_contents.to_vec();
    for region in layout.included_regions() {
        let start = region.start as usize;
        let end = region.end as usize + 1;
        if let Some(file) = session.include_file(&region.name) {
            let region_data = read_input(Path::new(file))?;
            let take = region_data.len().min(end - start);
            image[start..start + take].copy_from_slice(&region_data[..take]);
        } else if new_contents.len() >= end {
            image[start..end].copy_from_slice(&new_contents[start..end]);
        }
    }
    Ok(image)
}

/// `write`: program `file`'s contents to the chip (or its included
/// regions), verifying afterward unless suppressed.
pub fn cmd_write(
    session: &mut Session,
    file: &Path,
    do_not_diff: bool,
    noverify: bool,
) -> SessionResult<()> {
    let total_size = session.handle.size() as usize;
    let new_contents = read_input(file)?;

    if new_contents.len() > total_size {
        return Err(SessionError::argument(format!(
            "file size ({} bytes) exceeds chip size ({} bytes)",
            new_contents.len(),
            total_size
        )));
    }
    let mut new_contents = new_contents;
    if new_contents.len() < total_size {
        new_contents.resize(total_size, 0xFF);
    }

    session.validate_includes()?;

    let has_includes = session
        .layout
        .as_ref()
        .is_some_and(|l| l.has_included_regions());

    let image = if has_includes {
        let old_contents = if do_not_diff {
            vec![0xFFu8; total_size]
        } else {
            let mut buf = vec![0u8; total_size];
            session
                .handle
                .read(0, &mut buf)
                .map_err(|e| SessionError::TransportError(e.to_string()))?;
            buf
        };
        let layout = session.layout.clone().unwrap();
        build_new_image(session, &layout, &old_contents, &new_contents)?
    } else {
        new_contents
    };

    let mut progress = IndicatifProgress::new();
    let stats = if let Some(layout) = session.layout.clone().filter(|l| l.has_included_regions()) {
        smart_write_by_layout(session.handle.as_device_mut(), &layout, &image, &mut progress)
            .map_err(|e| SessionError::TransportError(e.to_string()))?
    } else {
        smart_write(session.handle.as_device_mut(), &image, &mut progress)
            .map_err(|e| SessionError::TransportError(e.to_string()))?
    };
    let _ = stats;

    if !noverify {
        verify_against(session, &image)?;
        println!("Verification passed!");
    }

    println!("Write complete!");
    Ok(())
}

fn verify_against(session: &mut Session, expected: &[u8]) -> SessionResult<()> {
    const CHUNK: usize = 4096;
    let ranges: Vec<(u32, u32)> = match &session.layout {
        Some(layout) if layout.has_included_regions() => layout
            .included_regions()
            .map(|r| (r.start, r.size()))
            .collect(),
        _ => vec![(0, expected.len() as u32)],
    };

    let mut buf = vec![0u8; CHUNK];
    for (start, len) in ranges {
        let mut offset = 0u32;
        while offset < len {
            let chunk_len = CHUNK.min((len - offset) as usize);
            let chunk = &mut buf[..chunk_len];
            session
                .handle
                .read(start + offset, chunk)
                .map_err(|e| SessionError::TransportError(e.to_string()))?;

            let expected_chunk =
                &expected[(start + offset) as usize..(start + offset) as usize + chunk_len];
            for (i, (actual, want)) in chunk.iter().zip(expected_chunk.iter()).enumerate() {
                if actual != want {
                    return Err(SessionError::mismatch(format!(
                        "verification failed at offset 0x{:08X}: expected 0x{:02X}, got 0x{:02X}",
                        start + offset + i as u32,
                        want,
                        actual
                    )));
                }
            }
            offset += chunk_len as u32;
        }
    }
    Ok(())
}

/// `verify`: compare the chip (or its included regions) against `file`.
pub fn cmd_verify(session: &mut Session, file: &Path) -> SessionResult<()> {
    let total_size = session.handle.size() as usize;
    let mut expected = read_input(file)?;
    if expected.len() > total_size {
        return Err(SessionError::argument(format!(
            "file size ({} bytes) exceeds chip size ({} bytes)",
            expected.len(),
            total_size
        )));
    }
    if expected.len() < total_size {
        expected.resize(total_size, 0xFF);
    }

    verify_against(session, &expected)?;
    println!("Verification passed!");
    Ok(())
}

/// `erase`: erase the whole chip, or the included regions.
pub fn cmd_erase(session: &mut Session) -> SessionResult<()> {
    session.validate_includes()?;

    let readonly_hit = session
        .layout
        .as_ref()
        .map(|l| !l.readonly_included().is_empty())
        .unwrap_or(false);
    if readonly_hit {
        return Err(SessionError::argument(
            "cannot erase a read-only included region",
        ));
    }

    match session.layout.clone().filter(|l| l.has_included_regions()) {
        Some(layout) => {
            for region in layout.included_regions() {
                session
                    .handle
                    .erase(region.start, region.size())
                    .map_err(|e| SessionError::TransportError(e.to_string()))?;
                println!("Erased region '{}' ({} bytes)", region.name, region.size());
            }
        }
        None => {
            let total_size = session.handle.size();
            session
                .handle
                .as_device_mut()
                .erase_all()
                .map_err(|e| SessionError::TransportError(e.to_string()))?;
            println!("Erased {} bytes", total_size);
        }
    }
    Ok(())
}

/// `extract`: read the full chip, then write each layout region to its own
/// file (spaces in the name replaced with underscores).
pub fn cmd_extract(session: &mut Session) -> SessionResult<()> {
    let layout = session
        .layout
        .clone()
        .ok_or_else(|| SessionError::not_found("no layout loaded to extract regions from"))?;
    if layout.is_empty() {
        return Err(SessionError::not_found("layout has no regions"));
    }

    let total_size = session.handle.size() as usize;
    let mut data = vec![0u8; total_size];
    session
        .handle
        .read(0, &mut data)
        .map_err(|e| SessionError::TransportError(e.to_string()))?;

    for region in &layout.regions {
        let start = region.start as usize;
        let end = region.end as usize + 1;
        let path = format!("{}.bin", underscored(&region.name));
        write_output(Path::new(&path), &data[start..end])?;
        println!("Wrote region '{}' to {}", region.name, path);
    }
    Ok(())
}

/// `list-supported`: list every supported programmer and chip vendor.
pub fn cmd_list_supported(db: &rflasher_core::chip::ChipDatabase) {
    println!("Supported programmers:");
    for info in rflasher_flash::available_programmers() {
        println!("  {:<12} {}", info.name, info.description);
    }

    println!();
    let mut vendors: Vec<&str> = db.iter().map(|c| c.vendor.as_str()).collect();
    vendors.sort_unstable();
    vendors.dedup();
    println!("Supported chip vendors ({} chips total):", db.len());
    for vendor in vendors {
        println!("  {}", vendor);
    }
}

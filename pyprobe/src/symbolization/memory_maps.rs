//! Memory mapping utilities for process address space analysis
//!
//! This module parses /proc/pid/maps to find where the Python interpreter
//! image is loaded in the target, which is needed to relocate the
//! thread-state symbol of a position-independent image.

use anyhow::{bail, Context, Result};
use log::info;
use std::fs;

use crate::domain::Pid;

/// Memory range of a loaded binary in a process's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    pub start: u64,
    pub end: u64,
}

impl MemoryRange {
    /// Check if an address falls within this memory range
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// The file holding the interpreter, as the target sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedImage {
    pub path: String,
    pub range: MemoryRange,
}

/// Find the interpreter image mapped into `pid`
///
/// # Errors
/// Returns an error if /proc/pid/maps cannot be read or maps no interpreter
pub fn find_interpreter_image(pid: Pid) -> Result<MappedImage> {
    let maps_path = format!("/proc/{pid}/maps");
    let maps = fs::read_to_string(&maps_path).context(format!("Failed to read {maps_path}"))?;
    let image = interpreter_image_from_maps(&maps)
        .with_context(|| format!("Process {pid} does not look like a Python process"))?;

    info!(
        "Interpreter image {}: 0x{:x} - 0x{:x} (size: {} KB)",
        image.path,
        image.range.start,
        image.range.end,
        (image.range.end - image.range.start) / 1024
    );
    Ok(image)
}

/// Pick the interpreter out of a maps listing
///
/// A shared `libpython*` wins over the executable: when it is present the
/// interpreter state lives there, not in the (thin) `python` launcher.
///
/// # Errors
/// Returns an error if no mapping looks like a Python interpreter
pub fn interpreter_image_from_maps(maps: &str) -> Result<MappedImage> {
    let paths: Vec<&str> =
        maps.lines().filter_map(|line| parse_map_line(line).map(|m| m.1)).collect();

    let path = paths
        .iter()
        .find(|p| basename(p).starts_with("libpython"))
        .or_else(|| paths.iter().find(|p| basename(p).starts_with("python")))
        .copied();

    let Some(path) = path else {
        bail!("No libpython or python executable mapping found");
    };

    let range = image_range(maps, path)?;
    Ok(MappedImage { path: path.to_string(), range })
}

/// Full range spanned by every mapping of `binary_path`
///
/// # Errors
/// Returns an error if `binary_path` is not mapped
pub fn image_range(maps: &str, binary_path: &str) -> Result<MemoryRange> {
    let mut start_addr = None;
    let mut end_addr = None;

    // Find ALL mappings of the target binary to get the full range
    for (range, path) in maps.lines().filter_map(parse_map_line) {
        if path != binary_path {
            continue;
        }
        start_addr = Some(start_addr.map_or(range.start, |s: u64| s.min(range.start)));
        end_addr = Some(end_addr.map_or(range.end, |e: u64| e.max(range.end)));
    }

    match (start_addr, end_addr) {
        (Some(start), Some(end)) => Ok(MemoryRange { start, end }),
        _ => Err(anyhow::anyhow!("Could not find memory range for {binary_path}")),
    }
}

/// Parse the line: "start-end perms offset dev inode pathname"
///
/// Anonymous mappings and pseudo-paths (`[heap]`, `[vdso]`) yield `None`.
fn parse_map_line(line: &str) -> Option<(MemoryRange, &str)> {
    let mut fields = line.splitn(6, char::is_whitespace);
    let range = fields.next()?;
    // perms, offset, dev, inode
    for _ in 0..4 {
        fields.next()?;
    }
    let path = fields.next()?.trim();
    if !path.starts_with('/') {
        return None;
    }

    let (start, end) = range.split_once('-')?;
    let start = u64::from_str_radix(start, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;
    Some((MemoryRange { start, end }, path))
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATIC_PYTHON: &str = "\
00400000-006ea000 r-xp 00000000 08:01 1835042                            /usr/bin/python2.7
008e9000-008ea000 r--p 002e9000 08:01 1835042                            /usr/bin/python2.7
008ea000-00963000 rw-p 002ea000 08:01 1835042                            /usr/bin/python2.7
00963000-0097a000 rw-p 00000000 00:00 0
01d5b000-01e4e000 rw-p 00000000 00:00 0                                  [heap]
7f1c2c000000-7f1c2c021000 rw-p 00000000 00:00 0
7f1c3a2d7000-7f1c3a497000 r-xp 00000000 08:01 1049090                    /lib/x86_64-linux-gnu/libc-2.23.so
7ffd0b9d4000-7ffd0b9f5000 rw-p 00000000 00:00 0                          [stack]
";

    const SHARED_PYTHON: &str = "\
55d0c7a00000-55d0c7a01000 r-xp 00000000 fd:00 393220                     /usr/bin/python2.7
7f8a10000000-7f8a10300000 r-xp 00000000 fd:00 393301                     /usr/lib/libpython2.7.so.1.0
7f8a10500000-7f8a10540000 rw-p 00300000 fd:00 393301                     /usr/lib/libpython2.7.so.1.0
";

    #[test]
    fn test_memory_range_contains() {
        let range = MemoryRange { start: 0x1000, end: 0x2000 };

        assert!(range.contains(0x1000));
        assert!(range.contains(0x1500));
        assert!(range.contains(0x1FFF));
        assert!(!range.contains(0x0FFF));
        assert!(!range.contains(0x2000));
        assert!(!range.contains(0x2001));
    }

    #[test]
    fn test_static_interpreter_spans_all_mappings() {
        let image = interpreter_image_from_maps(STATIC_PYTHON).unwrap();
        assert_eq!(image.path, "/usr/bin/python2.7");
        assert_eq!(image.range, MemoryRange { start: 0x40_0000, end: 0x96_3000 });
    }

    #[test]
    fn test_shared_libpython_preferred() {
        let image = interpreter_image_from_maps(SHARED_PYTHON).unwrap();
        assert_eq!(image.path, "/usr/lib/libpython2.7.so.1.0");
        assert_eq!(image.range.start, 0x7f8a_1000_0000);
        assert_eq!(image.range.end, 0x7f8a_1054_0000);
    }

    #[test]
    fn test_not_python() {
        let maps = "7f1c3a2d7000-7f1c3a497000 r-xp 00000000 08:01 1 /lib/libc.so.6\n";
        assert!(interpreter_image_from_maps(maps).is_err());
    }

    #[test]
    fn test_pseudo_paths_ignored() {
        let stack = "7ffd0b9d4000-7ffd0b9f5000 rw-p 00000000 00:00 0 [stack]";
        assert!(parse_map_line(stack).is_none());
        assert!(parse_map_line("00963000-0097a000 rw-p 00000000 00:00 0").is_none());
    }

    #[test]
    fn test_find_interpreter_image_from_file() {
        // Reading a live maps file must work even if we are not a Python process
        let pid = Pid(std::process::id().try_into().unwrap());
        let result = find_interpreter_image(pid);
        if let Err(e) = result {
            assert!(format!("{e:#}").contains("Python"));
        }
    }
}

//! ELF symbol lookup for the interpreter image

use anyhow::{Context, Result};
use log::{debug, info, warn};
use object::{Object, ObjectKind, ObjectSegment, ObjectSymbol};
use std::path::Path;

use super::memory_maps::MappedImage;
use crate::domain::RemoteAddr;

/// Global holding the running thread's `PyThreadState *`
pub const THREAD_STATE_SYMBOL: &str = "_PyThreadState_Current";

/// Runtime address of `name` inside the mapped `image`
///
/// `path` is where *we* can open the image (see
/// [`NamespaceContext::host_path`](crate::target::NamespaceContext::host_path)).
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or lacks the symbol
pub fn resolve_symbol(path: &Path, name: &str, image: &MappedImage) -> Result<RemoteAddr> {
    let file_data =
        std::fs::read(path).with_context(|| format!("Failed to read binary: {}", path.display()))?;
    let obj = object::File::parse(&*file_data)
        .with_context(|| format!("Failed to parse ELF: {}", path.display()))?;

    let value = symbol_value(&obj, name)
        .with_context(|| format!("Symbol {name} not found in {}", path.display()))?;
    let bias = load_bias(&obj, image.range.start);
    let addr = RemoteAddr(value.wrapping_add(bias));
    if !image.range.contains(addr.0) {
        warn!(
            "{name} at {addr} lies outside {} (0x{:x} - 0x{:x}); wrong image or load bias?",
            image.path, image.range.start, image.range.end
        );
    }

    info!("{name} at {addr} (symbol value 0x{value:x}, load bias 0x{bias:x})");
    Ok(addr)
}

/// Link-time value of `name`, from the dynamic table first, then `.symtab`
#[must_use]
pub fn symbol_value(obj: &object::File<'_>, name: &str) -> Option<u64> {
    obj.dynamic_symbols()
        .chain(obj.symbols())
        .find(|sym| sym.name().is_ok_and(|n| n == name) && sym.address() != 0)
        .map(|sym| sym.address())
}

/// Difference between where the image was linked and where it was loaded
///
/// Fixed-address executables are loaded where they were linked. Shared
/// objects and PIE executables are loaded with their lowest segment at the
/// start of the first mapping.
fn load_bias(obj: &object::File<'_>, map_start: u64) -> u64 {
    if obj.kind() != ObjectKind::Dynamic {
        return 0;
    }
    let lowest = obj.segments().map(|seg| seg.address()).min().unwrap_or(0) & !0xfff;
    debug!("Relocatable image, lowest segment 0x{lowest:x}, mapped at 0x{map_start:x}");
    map_start.wrapping_sub(lowest)
}

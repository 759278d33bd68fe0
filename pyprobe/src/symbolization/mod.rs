//! # Locating the Interpreter Inside the Target
//!
//! Before any stack can be read we need one address: the global variable in
//! which CPython keeps a pointer to the currently running thread state
//! (`_PyThreadState_Current`). This module finds it.
//!
//! ## The Problem
//!
//! The symbol table of the interpreter image records a **link-time** value
//! for the variable (e.g. `0x3a6ba8`), but the target loaded the image at a
//! randomized base (ASLR), so the live variable sits somewhere like
//! `0x7f8a103a6ba8`. We must translate:
//!
//! ```text
//! Runtime Address = Link-time Value + Load Bias
//! Load Bias       = First Mapping Start - Lowest Segment Address
//! ```
//!
//! Fixed-address executables (`ET_EXEC`, common for older distro builds of
//! `python2.7`) have a bias of zero.
//!
//! ## Resolution Steps
//!
//! ```text
//! 1. Read /proc/<pid>/maps and pick the interpreter image
//!    libpython2.7.so.1.0 if mapped, otherwise /usr/bin/python2.7
//!    Image loaded at: 0x7f8a10000000 - 0x7f8a10540000
//!
//! 2. Open the image through the target's mount namespace
//!    /usr/lib/libpython2.7.so.1.0 → /proc/<pid>/root/usr/lib/libpython2.7.so.1.0
//!
//! 3. Look up the symbol (.dynsym, then .symtab)
//!    _PyThreadState_Current = 0x3a6ba8
//!
//! 4. Relocate
//!    0x7f8a10000000 + 0x3a6ba8 = 0x7f8a103a6ba8
//! ```
//!
//! ## Module Structure
//!
//! - **`memory_maps`**: Process memory map parsing
//!   - Parses `/proc/<pid>/maps`
//!   - Picks the interpreter image and its full load range
//!
//! - **`symbols`**: ELF symbol lookup with the `object` crate
//!   - Finds the thread-state symbol
//!   - Applies the load bias for shared objects and PIE executables
//!
//! ## References
//!
//! - [Linux `/proc/pid/maps` format](https://man7.org/linux/man-pages/man5/proc.5.html)
//! - [PIE and ASLR](https://en.wikipedia.org/wiki/Address_space_layout_randomization)

pub mod memory_maps;
pub mod symbols;

pub use memory_maps::{find_interpreter_image, MappedImage, MemoryRange};
pub use symbols::{resolve_symbol, THREAD_STATE_SYMBOL};

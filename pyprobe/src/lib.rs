//! # pyprobe - ptrace Sampling Profiler for Python
//!
//! pyprobe attaches to a running CPython 2.7 process, periodically reads its
//! interpreter call stack straight out of the target's memory, and prints
//! either folded stacks (for flamegraphs) or a timestamped trace. The
//! target needs no instrumentation, restart, or cooperation.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Target Python Process                        │
//! │            (_PyThreadState_Current → frame chain)               │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ PTRACE_ATTACH / PEEKDATA / DETACH
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    pyprobe (This Crate)                         │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐       │
//! │  │    Target    │◀──│   Sampling   │──▶│   Analysis   │       │
//! │  │   (ptrace)   │   │    Engine    │   │ (aggregator) │       │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘       │
//! │         │                   │                  │               │
//! │         ▼                   │ timestamped      ▼ folded        │
//! │  ┌──────────────┐           │           ┌──────────────┐       │
//! │  │Symbolization │           └──────────▶│    Export    │       │
//! │  │ (maps, ELF)  │                       │   (stdout)   │       │
//! │  └──────────────┘                       └──────────────┘       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`profiling`]: the sampling engine and its run outcomes
//! - [`target`]: the process-attachment boundary
//!   - `ptrace`: attach/detach and word reads
//!   - `namespace`: reading a containerized target's files
//!   - `frames`: CPython frame-chain walk
//! - [`symbolization`]: finding the interpreter image and its thread-state symbol
//! - [`analysis`]: stack aggregation for folded output
//! - [`export`]: folded and timestamped text output
//! - [`cli`] / [`config`]: command line and the immutable run configuration
//! - [`domain`]: core types (Pid, Frame, Sample, ...) and errors
//! - [`preflight`]: checks run before the first attach
//!
//! ## Low Intrusiveness
//!
//! The target is stopped only while one stack is read. The engine detaches
//! before every sleep and re-attaches afterwards, so a 1 kHz run stops the
//! target for the duration of ~1000 short memory walks per second, never
//! for the waits in between.
//!
//! ## Typical Usage
//!
//! ```bash
//! # Folded stacks for one second, rendered as a flamegraph
//! sudo pyprobe 1234 | flamegraph.pl > profile.svg
//!
//! # Ten seconds at 100 Hz, without idle time
//! sudo pyprobe -s 10 -r 0.01 -x 1234
//!
//! # Timestamped trace
//! sudo pyprobe -t 1234
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod domain;
pub mod export;
pub mod preflight;
pub mod profiling;
pub mod symbolization;
pub mod target;

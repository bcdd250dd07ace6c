//! High-level flash operations
//!
//! This module provides high-level operations for reading, writing,
//! and erasing flash chips.
//!
//! Two API layers live here: the functions in [`operations`] work directly
//! against a `SpiMaster` and a [`FlashContext`], while [`unified`] builds a
//! device-agnostic layer on top of the [`FlashDevice`] trait (shared by SPI
//! and opaque programmers via [`SpiFlashDevice`]/[`OpaqueFlashDevice`]).
//! Several operation names exist at both layers (`erase_region`,
//! `verify`, ...); reach for the unified ones through `flash::unified::*`
//! when working with a `FlashDevice`.

mod context;
mod device;
mod erase_select;
mod opaque_device;
mod operations;
mod spi_device;
pub mod unified;

pub use context::FlashContext;
pub use device::{FlashDevice, FlashDeviceExt};
pub use opaque_device::OpaqueFlashDevice;
pub use operations::*;
pub use spi_device::SpiFlashDevice;
pub use unified::{
    get_all_write_ranges, need_erase, need_write, read_with_progress, smart_write,
    smart_write_by_layout, smart_write_region, NoProgress, WriteProgress, WriteRange, WriteStats,
};

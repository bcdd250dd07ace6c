//! rflasher-ftdi - FTDI MPSSE programmer support
//!
//! This crate provides support for FTDI-based SPI programmers using
//! the MPSSE engine (FT2232H, FT4232H, FT232H, etc.).

#![cfg_attr(not(feature = "std"), no_std)]

// TODO: Implement FTDI MPSSE support
// Reference: flashprog/ft2232_spi.c

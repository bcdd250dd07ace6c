//! rflasher-internal - Intel chipset internal flash programmer
//!
//! This crate provides support for the Intel ICH/PCH internal SPI controller.

#![cfg_attr(not(feature = "std"), no_std)]

// TODO: Implement Intel internal programmer
// Reference: flashprog/ichspi.c, flashprog/ich_descriptors.c

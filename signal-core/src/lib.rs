#![no_std]

// Shared logic for the push-button traffic-light controller.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library and exposing abstractions the other crates can adopt.

pub mod controller;
pub mod debounce;
pub mod repl;
pub mod signals;
pub mod telemetry;
pub mod timing;

// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Implementation of various structures used in the `neighbors_rs` library.

pub mod cellgrid;
pub mod particle;
pub mod simbox;
pub mod vector3d;

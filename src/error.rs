// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Meshmend Team

//! Error types for mesh preconditions

use thiserror::Error;

/// Precondition failures detected before a pass starts stepping
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("triangle index array length {0} is not a multiple of 3")]
    RaggedIndexArray(usize),

    #[error("triangle index {index} out of bounds for mesh with {vertex_count} vertices")]
    IndexOutOfBounds { index: usize, vertex_count: usize },

    #[error("weld remap has {got} entries, expected one per vertex ({expected})")]
    WeldLengthMismatch { expected: usize, got: usize },
}

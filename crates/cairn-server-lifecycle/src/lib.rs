// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Soft-delete lifecycle for Cairn entities.

pub mod error;
pub mod manager;

pub use error::{LifecycleError, LifecycleResult};
pub use manager::{HardDeleteOutcome, LifecycleManager, ScopeFilter};

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan module: the per-page enhancement pipeline and corner flood-fill.

pub mod enhance;
pub mod flood;

pub use enhance::ScanEnhancer;

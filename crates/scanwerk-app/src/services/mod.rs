// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend services for the command-line front end.

pub mod config_store;
pub mod data_dir;
pub mod export;
pub mod pump;

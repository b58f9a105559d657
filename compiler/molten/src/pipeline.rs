// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! The front half of the pipeline: parse then validate.
//!
//! Shared by the initial build and by every reload pass; the two differ
//! only in what they do with the diagnostics (fatal vs. warn-and-keep).

use molten_validate::Program;

/// Parse and validate a source text into a [`Program`].
///
/// On failure returns the full diagnostic list, each formatted with its
/// `line:col` location.
pub fn analyze(source: &str) -> Result<Program, Vec<String>> {
    let (file, parse_errors) = molten_parser::parse(source);
    if !parse_errors.is_empty() {
        return Err(parse_errors
            .iter()
            .map(|e| e.format_with_source(source))
            .collect());
    }

    molten_validate::validate(file).map_err(|errors| {
        errors
            .iter()
            .map(|e| e.format_with_source(source))
            .collect()
    })
}

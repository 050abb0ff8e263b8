// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use beltplan_model::{error::ModelError, index::LineId};

/// Failures of the heuristic solving path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PresolveError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("{line} admits no valid sequence of pieces")]
    LineInfeasible { line: LineId },

    #[error("failed to find a solution after {iterations} iterations ({conflicts} conflicts left)")]
    NonConvergence { iterations: usize, conflicts: usize },

    #[error("conflict resolution aborted after {iterations} iterations: {reason}")]
    Aborted { reason: String, iterations: usize },

    #[error("invalid resolver setting `{field}` = {value}: expected {expected}")]
    InvalidConfig {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

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

//! # Resolver Monitors
//!
//! Observers of the conflict resolution loop. The resolver reports each
//! conflict scan to its monitor and asks it, between iterations, whether to
//! go on. A `SearchCommand::Terminate` ends the run with
//! `PresolveError::Aborted`.
//!
//! * **`resolver_monitor`**: The `ResolverMonitor` trait and `SearchCommand`.
//! * **`composite`**: Fans every hook out to a list of monitors.
//! * **`interrupt`**: Stops when an external flag is raised.
//! * **`time_limit`**: Stops once a wall-clock budget is spent.
//! * **`log`**: Reports progress through `tracing`.
//! * **`no_op`**: Observes nothing, never stops.

pub mod composite;
pub mod interrupt;
pub mod log;
pub mod no_op;
pub mod resolver_monitor;
pub mod time_limit;

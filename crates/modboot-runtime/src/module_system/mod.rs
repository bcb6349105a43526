// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module bookkeeping: records, the store that owns them, and the ordered
//! completion buffer that decides when each one may run.

pub mod completion;
pub mod record;
pub mod store;

pub use completion::{FailurePolicy, Flush, OrderedCompletion};
pub use record::{FailureCause, ModuleRecord, ModuleSpec, ModuleState, Payload};
pub use store::ModuleStore;

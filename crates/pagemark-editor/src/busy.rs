// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-resource busy flag.
//
// Import, OCR and export each own one. A second request while the first is
// still in flight is rejected with `PagemarkError::Busy` instead of being
// queued.

use std::sync::atomic::{AtomicBool, Ordering};

use pagemark_core::error::{PagemarkError, Result};
use tracing::warn;

/// Marks a resource as having an async operation in flight.
#[derive(Debug)]
pub struct BusyFlag {
    resource: &'static str,
    busy: AtomicBool,
}

impl BusyFlag {
    pub const fn new(resource: &'static str) -> Self {
        Self {
            resource,
            busy: AtomicBool::new(false),
        }
    }

    /// Claim the resource. The claim is released when the guard drops,
    /// including on early return through `?`.
    pub fn try_acquire(&self) -> Result<BusyGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(resource = self.resource, "Overlapping request rejected");
            return Err(PagemarkError::Busy(self.resource));
        }
        Ok(BusyGuard { flag: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases its [`BusyFlag`] on drop.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    flag: &'a BusyFlag,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.busy.store(false, Ordering::Release);
    }
}

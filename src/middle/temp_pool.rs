//! Temporary Pool
//!
//! One index space per function, partitioned into three contiguous ranges:
//! parameters, then locals, then true temporaries. Temporaries are never
//! reused, so a kind can only be requested while no later kind has been
//! handed out.

use log::trace;

use crate::middle::ir::{TempKind, Temporary};
use crate::types::Type;
use crate::utils::{Error, Result};

/// JVM local-slot limit
pub const MAX_TEMPORARIES: usize = 65_535;

/// Temporary pool without reuse
#[derive(Debug, Clone)]
pub struct TempPool {
    temps: Vec<Temporary>,
    group: TempKind,
    param_count: u32,
    local_count: u32,
    true_count: u32,
}

impl TempPool {
    pub fn new() -> Self {
        Self {
            temps: Vec::new(),
            group: TempKind::Parameter,
            param_count: 0,
            local_count: 0,
            true_count: 0,
        }
    }

    /// Next parameter temporary
    pub fn acquire_param(&mut self, ty: Type, source_name: &str) -> Result<Temporary> {
        self.advance_group(TempKind::Parameter)?;
        let temp = Temporary {
            kind: TempKind::Parameter,
            local_index: self.param_count,
            group_offset: 0,
            ty,
            alias: Some(source_name.to_string()),
        };
        self.param_count += 1;
        Ok(self.record(temp))
    }

    /// Next local-variable temporary
    pub fn acquire_local(&mut self, ty: Type, source_name: &str) -> Result<Temporary> {
        self.advance_group(TempKind::Local)?;
        let temp = Temporary {
            kind: TempKind::Local,
            local_index: self.local_count,
            group_offset: self.param_count,
            ty,
            alias: Some(source_name.to_string()),
        };
        self.local_count += 1;
        Ok(self.record(temp))
    }

    /// Next compiler-generated temporary
    pub fn acquire_temp(&mut self, ty: Type) -> Result<Temporary> {
        self.advance_group(TempKind::True)?;
        let temp = Temporary {
            kind: TempKind::True,
            local_index: self.true_count,
            group_offset: self.param_count + self.local_count,
            ty,
            alias: None,
        };
        self.true_count += 1;
        Ok(self.record(temp))
    }

    /// Reuse is not supported, so this does nothing.
    pub fn release(&mut self, _temp: &Temporary) {}

    /// Forget every temporary and return to the parameter group
    pub fn clear(&mut self) {
        self.temps.clear();
        self.group = TempKind::Parameter;
        self.param_count = 0;
        self.local_count = 0;
        self.true_count = 0;
    }

    /// All temporaries in acquisition order
    pub fn temps(&self) -> &[Temporary] {
        &self.temps
    }

    pub fn len(&self) -> usize {
        self.temps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temps.is_empty()
    }

    /// Panics on a request for an earlier kind; that is a lowering bug, not
    /// a property of the input program.
    fn advance_group(&mut self, requested: TempKind) -> Result<()> {
        assert!(
            self.group <= requested,
            "cannot acquire a {:?} temporary after a {:?} temporary",
            requested,
            self.group
        );
        if self.temps.len() >= MAX_TEMPORARIES {
            return Err(Error::TemporaryOverflow { span: None });
        }
        self.group = requested;
        Ok(())
    }

    fn record(&mut self, temp: Temporary) -> Temporary {
        trace!("acquired {} ({:?}, {})", temp, temp.kind, temp.ty);
        self.temps.push(temp.clone());
        temp
    }
}

impl Default for TempPool {
    fn default() -> Self {
        Self::new()
    }
}

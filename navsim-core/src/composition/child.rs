//! Shareable child algorithm handle.

use super::CompositionError;
use crate::algorithm::Algorithm;
use crate::data::BarProvider;
use crate::domain::{AssetId, InstanceId};
use crate::engine::{run_simulation_in, DateRange, RunResult};
use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::debug;

thread_local! {
    /// Children currently being simulated on this thread, innermost last.
    static ACTIVE: RefCell<Vec<InstanceId>> = const { RefCell::new(Vec::new()) };
}

/// Marks an instance as in-simulation on this thread until dropped.
struct ActiveGuard(InstanceId);

impl ActiveGuard {
    fn enter(id: InstanceId) -> Option<Self> {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&id) {
                None
            } else {
                active.push(id);
                Some(Self(id))
            }
        })
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(pos) = active.iter().rposition(|id| *id == self.0) {
                active.remove(pos);
            }
        });
    }
}

/// A strategy that can be traded as an asset by other strategies.
///
/// Cloning the handle shares the underlying instance and its identity; two
/// separately constructed handles are distinct assets even when configured
/// identically.
///
/// Cycle detection is per thread. Re-entering a handle that is already being
/// simulated on the current thread yields `CompositionError::Cycle`; a handle
/// busy on another thread is waited for. Two handles that reference each
/// other must therefore not be simulated from separate threads at once.
#[derive(Clone)]
pub struct ChildAlgorithm {
    id: InstanceId,
    name: String,
    inner: Arc<Mutex<Box<dyn Algorithm>>>,
}

impl ChildAlgorithm {
    pub fn new(algorithm: impl Algorithm + 'static) -> Self {
        Self::from_boxed(Box::new(algorithm))
    }

    pub fn from_boxed(algorithm: Box<dyn Algorithm>) -> Self {
        Self {
            id: InstanceId::next(),
            name: algorithm.name().to_string(),
            inner: Arc::new(Mutex::new(algorithm)),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Asset id under which the child's NAV curve is traded.
    pub fn asset_id(&self) -> AssetId {
        AssetId::Algorithm {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// Run the child's full simulation, filling unset range bounds from
    /// `parent_range`. A run that halts early is reported as `ChildFailed`.
    pub fn simulate(
        &self,
        provider: &dyn BarProvider,
        parent_range: &DateRange,
    ) -> Result<RunResult, CompositionError> {
        let Some(_active) = ActiveGuard::enter(self.id) else {
            return Err(CompositionError::Cycle {
                name: self.name.clone(),
            });
        };
        let mut algorithm = self.inner.lock().map_err(|_| CompositionError::Poisoned {
            name: self.name.clone(),
        })?;

        debug!(child = %self.name, id = %self.id, "simulating child algorithm");
        let mut result = run_simulation_in(algorithm.as_mut(), provider, parent_range).map_err(
            |e| CompositionError::ChildFailed {
                name: self.name.clone(),
                error: Box::new(e),
            },
        )?;
        match result.halt.take() {
            Some(e) => Err(CompositionError::ChildFailed {
                name: self.name.clone(),
                error: Box::new(e),
            }),
            None => Ok(result),
        }
    }
}

impl fmt::Debug for ChildAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildAlgorithm")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

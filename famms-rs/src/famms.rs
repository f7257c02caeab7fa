//! Method of manufactured solutions front-end.
//!
//! [`Famms`] takes a [`Solution`] and an [`Equation`], derives the source
//! term `b = F(u)` and the gradient of `u`, and hands them to a
//! [`Simulator`] as [`CallbackFunctor`]s under named callback slots.

use std::fmt;
use std::rc::Rc;

use crate::callback::{Callable, CallbackFunctor};
use crate::equation::Equation;
use crate::error::{FammsError, SimulatorError};
use crate::functor::Functor;
use crate::solution::Solution;

pub const DEFAULT_V_FUNC: &str = "set_v_func";
pub const DEFAULT_B_FUNC: &str = "set_b_func";
pub const DEFAULT_TIME: &str = "t";

// ── Simulator ─────────────────────────────────────────────────────────────────

/// Something that accepts functors under named callback slots.
pub trait Simulator {
    fn set_callback(&mut self, name: &str, functor: Box<dyn Functor>) -> Result<(), SimulatorError>;
}

/// A [`Simulator`] that only records the functors it is given.
///
/// [`CallbackTable::new`] accepts any slot name; [`CallbackTable::with_slots`]
/// rejects names outside the given list.
#[derive(Default)]
pub struct CallbackTable {
    slots: Option<Vec<String>>,
    entries: Vec<(String, Box<dyn Functor>)>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots<I, S>(slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CallbackTable {
            slots: Some(slots.into_iter().map(Into::into).collect()),
            entries: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Functor> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f.as_ref())
    }

    /// Slot names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackTable")
            .field("slots", &self.slots)
            .field("entries", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl Simulator for CallbackTable {
    fn set_callback(&mut self, name: &str, functor: Box<dyn Functor>) -> Result<(), SimulatorError> {
        if let Some(slots) = &self.slots {
            if !slots.iter().any(|s| s == name) {
                return Err(SimulatorError::UnknownSlot(name.to_owned()));
            }
        }
        // Replace in place so insertion order is stable.
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = functor;
        } else {
            self.entries.push((name.to_owned(), functor));
        }
        Ok(())
    }
}

// ── Famms ─────────────────────────────────────────────────────────────────────

struct Assigned {
    solution: Solution,
    source: Solution,
    gradient: Option<Solution>,
    v_func: CallbackFunctor,
    b_func: CallbackFunctor,
}

/// A single manufactured-solution problem.
pub struct Famms {
    space: Vec<String>,
    time: Option<String>,
    v_name: String,
    b_name: String,
    extra: Vec<(String, Solution)>,
    assigned: Option<Assigned>,
}

impl fmt::Debug for Famms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Famms")
            .field("space", &self.space)
            .field("time", &self.time)
            .field("v_name", &self.v_name)
            .field("b_name", &self.b_name)
            .field("assigned", &self.assigned.is_some())
            .finish()
    }
}

/// `x_0 … x_{n-1}`
pub fn space_symbols(nsd: usize) -> Vec<String> {
    (0..nsd).map(|i| format!("x_{i}")).collect()
}

impl Famms {
    /// `nsd` space dimensions named `x_0 … x_{nsd-1}`, no time symbol.
    pub fn new(nsd: usize) -> Self {
        Famms {
            space: space_symbols(nsd),
            time: None,
            v_name: DEFAULT_V_FUNC.to_owned(),
            b_name: DEFAULT_B_FUNC.to_owned(),
            extra: Vec::new(),
            assigned: None,
        }
    }

    /// Declare the time symbol `t`.
    pub fn with_time(self) -> Self {
        self.with_time_symbol(DEFAULT_TIME)
    }

    pub fn with_time_symbol(mut self, name: &str) -> Self {
        self.time = Some(name.to_owned());
        self
    }

    /// Replace the space symbols; the dimension becomes `space.len()`.
    pub fn with_space_symbols(mut self, space: Vec<String>) -> Self {
        self.space = space;
        self
    }

    /// An additional callback inserted as `set_<name>` by
    /// [`Famms::insert_extra_callbacks`].
    pub fn with_extra_callback(mut self, name: &str, value: Solution) -> Self {
        self.extra.push((name.to_owned(), value));
        self
    }

    pub fn set_callback_names(&mut self, v_name: &str, b_name: &str) {
        self.v_name = v_name.to_owned();
        self.b_name = b_name.to_owned();
    }

    pub fn nsd(&self) -> usize {
        self.space.len()
    }

    pub fn space(&self) -> &[String] {
        &self.space
    }

    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    pub fn callback_names(&self) -> (&str, &str) {
        (&self.v_name, &self.b_name)
    }

    /// Names of the extra callbacks, without the `set_` prefix.
    pub fn extra_names(&self) -> impl Iterator<Item = &str> {
        self.extra.iter().map(|(n, _)| n.as_str())
    }

    fn functor(&self, s: &Solution) -> Rc<dyn Callable> {
        Rc::new(s.callable(&self.space, self.time.as_deref()))
    }

    /// Build the callbacks for `solution` under `equation` and, when a
    /// simulator is given, insert them.
    ///
    /// The equation sees `couple_list` when given and `[solution]`
    /// otherwise; it is responsible for picking out the fields it needs.
    /// On error the previous assignment is kept, though a simulator may
    /// already hold the callbacks inserted before the failing slot.
    pub fn assign(
        &mut self,
        equation: &Equation,
        mut solution: Solution,
        simulator: Option<&mut dyn Simulator>,
        couple_list: Option<&[Solution]>,
    ) -> Result<(), FammsError> {
        solution.set_spatial_symbols(&self.space);
        solution.set_time_symbol(self.time.as_deref());

        let source = match couple_list {
            Some(list) => equation(list)?,
            None => equation(std::slice::from_ref(&solution))?,
        }
        .simplify();

        let gradient = if solution.is_scalar() {
            Some(solution.grad()?.simplify())
        } else {
            None
        };

        let nsd = self.nsd();
        let v_func = match &gradient {
            Some(g) => CallbackFunctor::attach_with_gradient(self.functor(&solution), self.functor(g)),
            None => CallbackFunctor::attach(self.functor(&solution)),
        }
        .with_nsd(nsd);
        let b_func = CallbackFunctor::attach(self.functor(&source)).with_nsd(nsd);

        tracing::debug!(
            v_name = %self.v_name,
            b_name = %self.b_name,
            solution = %solution,
            source = %source,
            "assign"
        );

        let assigned = Assigned {
            solution,
            source,
            gradient,
            v_func,
            b_func,
        };
        if let Some(sim) = simulator {
            self.insert_pair(&assigned, sim)?;
            if !self.extra.is_empty() {
                self.insert_extra_callbacks(sim)?;
            }
        }
        self.assigned = Some(assigned);
        Ok(())
    }

    /// Insert the `v_func` / `b_func` pair into `sim`.
    ///
    /// Does nothing before [`Famms::assign`].
    pub fn insert_callbacks(&self, sim: &mut dyn Simulator) -> Result<(), FammsError> {
        match &self.assigned {
            Some(a) => self.insert_pair(a, sim),
            None => Ok(()),
        }
    }

    fn insert_pair(&self, a: &Assigned, sim: &mut dyn Simulator) -> Result<(), FammsError> {
        let attach_err = |source| FammsError::Attach {
            v_name: self.v_name.clone(),
            b_name: self.b_name.clone(),
            source,
        };
        sim.set_callback(&self.v_name, Box::new(a.v_func.clone()))
            .map_err(attach_err)?;
        sim.set_callback(&self.b_name, Box::new(a.b_func.clone()))
            .map_err(attach_err)?;
        Ok(())
    }

    /// Insert every extra callback as `set_<name>`.
    pub fn insert_extra_callbacks(&self, sim: &mut dyn Simulator) -> Result<(), FammsError> {
        let nsd = self.nsd();
        for (name, value) in &self.extra {
            let mut value = value.clone();
            value.set_spatial_symbols(&self.space);
            value.set_time_symbol(self.time.as_deref());
            let functor = CallbackFunctor::attach(self.functor(&value)).with_nsd(nsd);
            let slot = format!("set_{name}");
            sim.set_callback(&slot, Box::new(functor))
                .map_err(|source| FammsError::AttachExtra {
                    name: slot.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// The (`v_func`, `b_func`) pair; `v_func` carries the gradient of a
    /// scalar solution.
    pub fn callbacks(&self) -> Option<(&CallbackFunctor, &CallbackFunctor)> {
        self.assigned.as_ref().map(|a| (&a.v_func, &a.b_func))
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.assigned.as_ref().map(|a| &a.solution)
    }

    pub fn source(&self) -> Option<&Solution> {
        self.assigned.as_ref().map(|a| &a.source)
    }

    pub fn gradient(&self) -> Option<&Solution> {
        self.assigned.as_ref().and_then(|a| a.gradient.as_ref())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Coupled systems of manufactured-solution problems.
//!
//! Each problem gets its own [`Famms`]; every equation sees the full list of
//! solutions so source terms can couple the fields.

use crate::equation::Equation;
use crate::error::FammsError;
use crate::famms::{space_symbols, Famms, Simulator, DEFAULT_B_FUNC, DEFAULT_V_FUNC};
use crate::solution::Solution;

/// Space dimension of each problem.
#[derive(Debug, Clone, PartialEq)]
pub enum Dimensions {
    /// Every problem uses the same dimension.
    Same(usize),
    /// One dimension per problem.
    PerProblem(Vec<usize>),
}

#[derive(Debug)]
pub struct SystemFamms {
    nproblems: usize,
    space: Vec<String>,
    time: Option<String>,
    v_names: Vec<String>,
    b_names: Vec<String>,
    problems: Vec<Famms>,
}

impl SystemFamms {
    /// `nproblems` problems over at most `max_nsd` space dimensions.
    pub fn new(nproblems: usize, max_nsd: usize, time: Option<&str>) -> Self {
        SystemFamms {
            nproblems,
            space: space_symbols(max_nsd),
            time: time.map(str::to_owned),
            v_names: vec![DEFAULT_V_FUNC.to_owned(); nproblems],
            b_names: vec![DEFAULT_B_FUNC.to_owned(); nproblems],
            problems: Vec::new(),
        }
    }

    pub fn nproblems(&self) -> usize {
        self.nproblems
    }

    pub fn max_nsd(&self) -> usize {
        self.space.len()
    }

    fn check_count(&self, what: &'static str, got: usize) -> Result<(), FammsError> {
        if got != self.nproblems {
            return Err(FammsError::Count {
                what,
                expected: self.nproblems,
                got,
            });
        }
        Ok(())
    }

    /// Per-problem callback slot names.
    pub fn assign_callback_names(
        &mut self,
        v_names: &[&str],
        b_names: &[&str],
    ) -> Result<(), FammsError> {
        self.check_count("v_func names", v_names.len())?;
        self.check_count("b_func names", b_names.len())?;
        self.v_names = v_names.iter().map(|s| s.to_string()).collect();
        self.b_names = b_names.iter().map(|s| s.to_string()).collect();
        Ok(())
    }

    /// Assign problem `i` the solution `solutions[i]`, the equation
    /// `equations[i]` and the simulator `simulators[i]`.
    ///
    /// Solution `i` is expressed in the first `nsd_i` space symbols.  Without
    /// `nsds` every problem uses all `max_nsd` symbols.
    ///
    /// Every problem is built before any simulator is touched.  If an
    /// insertion fails, [`SystemFamms::problems`] keeps the previous run and
    /// the simulators before the failing one already hold the new callbacks.
    pub fn assign(
        &mut self,
        simulators: &mut [&mut dyn Simulator],
        solutions: Vec<Solution>,
        equations: Vec<Equation>,
        nsds: Option<Dimensions>,
    ) -> Result<(), FammsError> {
        self.check_count("simulators", simulators.len())?;
        self.check_count("solutions", solutions.len())?;
        self.check_count("equations", equations.len())?;

        let nsds = match nsds {
            None => vec![self.max_nsd(); self.nproblems],
            Some(Dimensions::Same(n)) => vec![n; self.nproblems],
            Some(Dimensions::PerProblem(v)) => {
                self.check_count("dimensions", v.len())?;
                v
            }
        };
        if let Some(&nsd) = nsds.iter().find(|&&n| n > self.max_nsd()) {
            return Err(FammsError::Dimension {
                nsd,
                max: self.max_nsd(),
            });
        }

        let mut solutions = solutions;
        for (u, &nsd) in solutions.iter_mut().zip(&nsds) {
            u.set_spatial_symbols(&self.space[..nsd]);
            u.set_time_symbol(self.time.as_deref());
        }

        let mut problems = Vec::with_capacity(self.nproblems);
        for (i, equation) in equations.iter().enumerate() {
            let mut famms = Famms::new(0).with_space_symbols(self.space[..nsds[i]].to_vec());
            if let Some(t) = &self.time {
                famms = famms.with_time_symbol(t);
            }
            famms.set_callback_names(&self.v_names[i], &self.b_names[i]);
            famms.assign(equation, solutions[i].clone(), None, Some(&solutions))?;
            problems.push(famms);
        }
        for (famms, sim) in problems.iter().zip(simulators.iter_mut()) {
            famms.insert_callbacks(&mut **sim)?;
        }
        self.problems = problems;
        Ok(())
    }

    /// The per-problem fronts built by the last [`SystemFamms::assign`].
    pub fn problems(&self) -> &[Famms] {
        &self.problems
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equation;
    use crate::famms::CallbackTable;

    fn scalar(src: &str) -> Solution {
        Solution::parse_scalar(src).unwrap()
    }

    /// -Δu_i + u_j for the other field j.
    fn coupled(i: usize) -> Equation {
        Box::new(move |sols| sols[i].laplace().neg().add(&sols[1 - i]))
    }

    #[test]
    fn coupled_pair() {
        let mut a = CallbackTable::new();
        let mut b = CallbackTable::new();
        let mut sys = SystemFamms::new(2, 2, None);
        let mut sims: [&mut dyn Simulator; 2] = [&mut a, &mut b];
        sys.assign(
            &mut sims,
            vec![scalar("x_0^2"), scalar("x_0 + x_1")],
            vec![coupled(0), coupled(1)],
            None,
        )
        .unwrap();
        drop(sims);

        // b_0 = -2 + x_0 + x_1, b_1 = 0 + x_0^2
        let b0 = a.get("set_b_func").unwrap();
        let b1 = b.get("set_b_func").unwrap();
        assert_eq!(b0.eval(&[1.0, 2.0], 0.0), 1.0);
        assert_eq!(b1.eval(&[3.0, 2.0], 0.0), 9.0);
        assert_eq!(sys.problems().len(), 2);
    }

    #[test]
    fn per_problem_dimensions_and_names() {
        let mut a = CallbackTable::new();
        let mut b = CallbackTable::new();
        let mut sys = SystemFamms::new(2, 3, Some("t"));
        sys.assign_callback_names(&["set_u", "set_p"], &["set_fu", "set_fp"])
            .unwrap();
        let mut sims: [&mut dyn Simulator; 2] = [&mut a, &mut b];
        sys.assign(
            &mut sims,
            vec![scalar("x_0*t"), scalar("x_0*x_1")],
            vec![equation::identity(), equation::identity()],
            Some(Dimensions::PerProblem(vec![1, 2])),
        )
        .unwrap();
        drop(sims);

        assert_eq!(sys.problems()[0].nsd(), 1);
        assert_eq!(sys.problems()[1].nsd(), 2);
        assert_eq!(a.get("set_u").unwrap().eval(&[2.0, 9.0, 9.0], 3.0), 6.0);
        assert_eq!(b.get("set_fp").unwrap().eval(&[2.0, 5.0, 9.0], 0.0), 10.0);
        assert!(a.get("set_v_func").is_none());
    }

    #[test]
    fn failed_equation_leaves_simulators_alone() {
        let mut a = CallbackTable::new();
        let mut b = CallbackTable::new();
        let mut sys = SystemFamms::new(2, 1, None);
        let mut sims: [&mut dyn Simulator; 2] = [&mut a, &mut b];
        // The heat equation needs a time symbol, so problem 1 fails.
        let err = sys
            .assign(
                &mut sims,
                vec![scalar("x_0"), scalar("x_0")],
                vec![equation::identity(), equation::heat()],
                None,
            )
            .unwrap_err();
        drop(sims);
        assert!(matches!(err, FammsError::NoTimeSymbol));
        assert!(a.is_empty());
        assert!(b.is_empty());
        assert!(sys.problems().is_empty());
    }

    #[test]
    fn failed_insert_keeps_previous_problems() {
        let mut a = CallbackTable::new();
        let mut b = CallbackTable::new();
        let mut sys = SystemFamms::new(2, 1, None);
        let mut sims: [&mut dyn Simulator; 2] = [&mut a, &mut b];
        sys.assign(
            &mut sims,
            vec![scalar("x_0"), scalar("x_0")],
            vec![equation::identity(), equation::identity()],
            None,
        )
        .unwrap();
        drop(sims);

        let mut c = CallbackTable::new();
        let mut d = CallbackTable::with_slots(["set_other"]);
        let mut sims: [&mut dyn Simulator; 2] = [&mut c, &mut d];
        let err = sys
            .assign(
                &mut sims,
                vec![scalar("2*x_0"), scalar("2*x_0")],
                vec![equation::identity(), equation::identity()],
                None,
            )
            .unwrap_err();
        drop(sims);
        assert!(matches!(err, FammsError::Attach { .. }));
        assert_eq!(c.len(), 2);
        assert_eq!(sys.problems()[0].solution().unwrap().to_string(), "x_0");
    }

    #[test]
    fn count_mismatch() {
        let mut a = CallbackTable::new();
        let mut sys = SystemFamms::new(2, 2, None);
        let mut sims: [&mut dyn Simulator; 1] = [&mut a];
        let err = sys
            .assign(
                &mut sims,
                vec![scalar("x_0"), scalar("x_1")],
                vec![equation::identity(), equation::identity()],
                None,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            FammsError::Count { what: "simulators", expected: 2, got: 1 }
        ));
        assert!(sys.assign_callback_names(&["a"], &["b", "c"]).is_err());
    }

    #[test]
    fn dimension_above_max() {
        let mut a = CallbackTable::new();
        let mut sys = SystemFamms::new(1, 2, None);
        let mut sims: [&mut dyn Simulator; 1] = [&mut a];
        let err = sys
            .assign(
                &mut sims,
                vec![scalar("x_0")],
                vec![equation::identity()],
                Some(Dimensions::Same(3)),
            )
            .unwrap_err();
        assert!(matches!(err, FammsError::Dimension { nsd: 3, max: 2 }));
    }
}

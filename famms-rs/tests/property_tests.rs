use std::rc::Rc;

use famms::script::{Bindings, Expr};
use famms::{BaseFunctor, CallbackFunctor, FnCallable, Functor, Returned};
use proptest::prelude::*;

fn point() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e3..1.0e3f64, 0..8)
}

/// Polynomial sources over `x` and `y`, fully parenthesised.
fn polynomial() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("x".to_owned()),
        Just("y".to_owned()),
        (-2i32..=2).prop_map(|n| n.to_string()),
    ];
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a} + {b})")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a} - {b})")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a} * {b})")),
            inner.clone().prop_map(|a| format!("({a})^2")),
            inner.prop_map(|a| format!("-{a}")),
        ]
    })
}

fn eval_at(e: &Expr, x: f64, y: f64) -> f64 {
    let names = ["x".to_owned(), "y".to_owned()];
    e.eval(&Bindings {
        names: &names,
        values: &[x, y],
    })
    .unwrap()
}

proptest! {
    /// The base functor's scalar form is the sum of squares.
    #[test]
    fn base_scalar_is_sum_of_squares(p in point()) {
        let got = BaseFunctor.eval(&p, 0.0);
        let want: f64 = p.iter().map(|x| x * x).sum();
        prop_assert!(got >= 0.0);
        prop_assert!((got - want).abs() <= 1e-9 * (1.0 + want));
    }

    /// The vector form squares elementwise and writes exactly `point.len()` values.
    #[test]
    fn base_vector_squares(p in point(), t in -10.0..10.0f64) {
        let mut rets = vec![f64::NAN; p.len() + 1];
        BaseFunctor.eval_vector(&p, &mut rets[..p.len()], t);
        for (r, x) in rets.iter().zip(&p) {
            prop_assert_eq!(*r, x * x);
        }
        prop_assert!(rets[p.len()].is_nan());
    }

    /// Vector callbacks write the shorter of the result and the buffer.
    #[test]
    fn callback_vector_writes_min_len(n_ret in 0usize..6, n_buf in 0usize..6) {
        let f = CallbackFunctor::attach(Rc::new(FnCallable::new(move |_: &[f64], _| {
            Ok(Returned::Sequence((1..=n_ret).map(|i| i as f64).collect()))
        })));
        let mut rets = vec![-1.0; n_buf];
        let written = f.try_eval_vector(&[], &mut rets, 0.0).unwrap();
        prop_assert_eq!(written, n_ret.min(n_buf));
        for (i, r) in rets.iter().enumerate() {
            let want = if i < written { (i + 1) as f64 } else { -1.0 };
            prop_assert_eq!(*r, want);
        }
    }

    /// The expression parser never panics.
    #[test]
    fn parser_does_not_panic(s in "\\PC*") {
        let _ = Expr::parse(&s);
    }

    /// Printing and re-parsing preserves the value.
    #[test]
    fn display_reparses(src in polynomial(), x in -1.5..1.5f64, y in -1.5..1.5f64) {
        let e = Expr::parse(&src).unwrap();
        let again = Expr::parse(&e.to_string()).unwrap();
        let (a, b) = (eval_at(&e, x, y), eval_at(&again, x, y));
        prop_assert!((a - b).abs() <= 1e-9 * (1.0 + a.abs()), "{src} -> {e}: {a} vs {b}");
    }

    /// Symbolic derivatives agree with a central difference.
    #[test]
    fn derivative_matches_finite_difference(src in polynomial(), x in -1.5..1.5f64, y in -1.5..1.5f64) {
        let e = Expr::parse(&src).unwrap();
        let d = e.diff("x");
        let h = 1e-4;
        let fd = (eval_at(&e, x + h, y) - eval_at(&e, x - h, y)) / (2.0 * h);
        let exact = eval_at(&d, x, y);
        let scale = 1.0 + exact.abs() + eval_at(&e, x, y).abs();
        prop_assert!((fd - exact).abs() <= 1e-4 * scale, "d/dx {src} = {d}: {exact} vs {fd}");
    }

    /// Simplification never changes the value.
    #[test]
    fn simplify_preserves_value(src in polynomial(), x in -1.5..1.5f64, y in -1.5..1.5f64) {
        let e = Expr::parse(&src).unwrap();
        let (a, b) = (eval_at(&e, x, y), eval_at(&e.simplify(), x, y));
        prop_assert!((a - b).abs() <= 1e-9 * (1.0 + a.abs()), "{src}: {a} vs {b}");
    }
}

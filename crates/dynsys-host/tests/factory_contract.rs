//! Integration test: the factory contract for the reference modules.
//!
//! Schemas are reported verbatim, host-side validation rejects bad input
//! before the module is called, and construction-time domain checks
//! surface as `CreateError::Construction`.

use dynsys_core::{ArgKind, ArgValue, ArgumentError, CreateError, Role};
use dynsys_models::{Dopri5, Linear, Portrait, Rk4};
use dynsys_test_utils::{job_factory, ode_factory, solver_factory, supplied};

// ── Schemas ──────────────────────────────────────────────────────────

#[test]
fn rk4_schema_is_single_real() {
    let factory = solver_factory::<Rk4>();
    assert_eq!(factory.name(), "rk4");
    assert_eq!(factory.role(), Role::Solver);
    let json = serde_json::to_value(factory.schema()).unwrap();
    assert_eq!(json, serde_json::json!([{"name": "h_max", "type": "real"}]));
}

#[test]
fn portrait_schema_keeps_declared_order() {
    let factory = job_factory::<Portrait>();
    let names: Vec<_> = factory.schema().specs().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["t_step", "t_end", "file"]);
    let kinds: Vec<_> = factory.schema().specs().iter().map(|s| s.kind).collect();
    assert_eq!(kinds, [ArgKind::Real, ArgKind::Real, ArgKind::Text]);
}

#[test]
fn dopri5_schema_lists_both_arguments() {
    let json = serde_json::to_value(solver_factory::<Dopri5>().schema()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"name": "h_max", "type": "real"},
            {"name": "eps", "type": "real"},
        ])
    );
}

// ── Host-side validation ─────────────────────────────────────────────

#[test]
fn missing_argument_is_named() {
    let err = solver_factory::<Rk4>()
        .create(Vec::<(String, ArgValue)>::new())
        .unwrap_err();
    assert_eq!(
        err,
        CreateError::Argument(ArgumentError::Missing {
            names: vec!["h_max".into()]
        })
    );
}

#[test]
fn unexpected_argument_is_named() {
    let err = solver_factory::<Rk4>()
        .create(supplied([
            ("h_max", ArgValue::Real(0.01)),
            ("order", ArgValue::Integer(4)),
        ]))
        .unwrap_err();
    assert_eq!(
        err,
        CreateError::Argument(ArgumentError::Unexpected {
            names: vec!["order".into()]
        })
    );
}

#[test]
fn text_is_not_a_real() {
    let err = solver_factory::<Rk4>()
        .create([("h_max", ArgValue::from("0.5"))])
        .unwrap_err();
    assert_eq!(
        err,
        CreateError::Argument(ArgumentError::Type {
            name: "h_max".into(),
            expected: ArgKind::Real,
            actual: ArgKind::Text,
        })
    );
}

#[test]
fn integer_is_not_widened_to_real() {
    let err = solver_factory::<Rk4>()
        .create([("h_max", ArgValue::Integer(0))])
        .unwrap_err();
    assert!(matches!(
        err,
        CreateError::Argument(ArgumentError::Type { .. })
    ));
}

#[test]
fn textual_input_parses_exactly() {
    let solver = solver_factory::<Rk4>()
        .create_from_text([("h_max", "0.5")])
        .unwrap();
    assert_eq!(solver.arguments().get("h_max"), Some(&ArgValue::Real(0.5)));

    for bad in ["0.5 ", "0,5", "0.5s", "inf", ""] {
        let err = solver_factory::<Rk4>()
            .create_from_text([("h_max", bad)])
            .unwrap_err();
        assert!(
            matches!(err, CreateError::Argument(ArgumentError::Parse { .. })),
            "{bad:?}: {err}"
        );
    }
}

// ── Construction domain ──────────────────────────────────────────────

#[test]
fn domain_rejection_names_the_module() {
    let err = solver_factory::<Rk4>()
        .create([("h_max", ArgValue::Real(1.0))])
        .unwrap_err();
    let CreateError::Construction(e) = err else {
        panic!("expected construction error, got {err:?}");
    };
    assert_eq!(e.module, "rk4");
    assert_eq!(e.reason, "h_max must satisfy: 0 < h_max < 1");
}

#[test]
fn linear_rejects_zero_dimension() {
    let err = ode_factory::<Linear>()
        .create([("n", ArgValue::Integer(0))])
        .unwrap_err();
    let CreateError::Construction(e) = err else {
        panic!("expected construction error, got {err:?}");
    };
    assert_eq!(e.reason, "n must be positive");
}

// ── Argument echo ────────────────────────────────────────────────────

#[test]
fn arguments_echo_in_schema_order_and_rebuild() {
    let factory = job_factory::<Portrait>();
    let job = factory
        .create(supplied([
            ("file", ArgValue::from("out.dat")),
            ("t_end", ArgValue::Real(2.0)),
            ("t_step", ArgValue::Real(0.5)),
        ]))
        .unwrap();
    let names: Vec<_> = job.arguments().iter().map(|(n, _)| n).collect();
    assert_eq!(names, ["t_step", "t_end", "file"]);

    let again = factory.create(job.arguments().to_pairs()).unwrap();
    assert_eq!(again.arguments(), job.arguments());
}

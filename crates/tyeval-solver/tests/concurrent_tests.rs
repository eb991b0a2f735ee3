//! Concurrent evaluation over one shared definition table.
//!
//! The table is populated up front and only read afterwards; each worker
//! owns its evaluator.

use super::*;
use rayon::prelude::*;

fn numbers(count: usize) -> TypeValue {
    TypeValue::tuple((0..count).map(|n| TypeValue::literal_number(n as f64)).collect())
}

#[test]
fn test_parallel_evaluations_share_definitions() {
    let store = DefinitionStore::new();
    register_prelude(&store);

    let results: Vec<(usize, TypeValue)> = (0..64usize)
        .into_par_iter()
        .map(|len| {
            let env = Environment::new(&store);
            let expr = Expression::apply(
                "Length",
                vec![Expression::apply("Reverse", vec![Expression::lit(numbers(len % 16))])],
            );
            let value = TypeEvaluator::new().evaluate(&expr, &env).unwrap();
            (len, value)
        })
        .collect();

    for (len, value) in results {
        assert_eq!(value, TypeValue::literal_number((len % 16) as f64));
    }
}

#[test]
fn test_parallel_results_match_sequential() {
    let store = DefinitionStore::new();
    register_prelude(&store);
    let keys = ["a", "b", "c", "d"];
    let exprs: Vec<Expression> = (1..=keys.len())
        .map(|n| {
            let union = TypeValue::union(keys[..n].iter().map(|k| TypeValue::literal_string(k)));
            Expression::apply("Permutation", vec![Expression::lit(union)])
        })
        .collect();

    let sequential: Vec<TypeValue> = exprs
        .iter()
        .map(|expr| evaluate(expr, &Environment::new(&store)).unwrap())
        .collect();
    let parallel: Vec<TypeValue> = exprs
        .par_iter()
        .map(|expr| evaluate(expr, &Environment::new(&store)).unwrap())
        .collect();
    assert_eq!(parallel, sequential);
}

#[test]
fn test_environment_is_shareable_across_threads() {
    let store = DefinitionStore::new();
    register_prelude(&store);
    let env = Environment::new(&store).with_binding(
        "Todo",
        TypeValue::record([("title", TypeValue::STRING), ("done", TypeValue::BOOLEAN)]),
    );

    let outcomes: Vec<EvalResult<TypeValue>> = ["Partial", "Required", "Readonly", "Missing"]
        .par_iter()
        .map(|name| {
            TypeEvaluator::new().evaluate(
                &Expression::apply(name, vec![Expression::reference("Todo")]),
                &env,
            )
        })
        .collect();

    assert!(outcomes[..3].iter().all(Result::is_ok));
    assert_eq!(
        outcomes[3],
        Err(EvaluationError::UnboundReference {
            name: Name::from("Missing")
        })
    );
}

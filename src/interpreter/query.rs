//! Evaluation of `from` expressions.
//!
//! The semantics are the nested-comprehension reading: the cartesian
//! product of the sources produces one environment per combination of
//! bound rows, the steps transform the environment stream in declared
//! order, and the yield expression maps each surviving environment to an
//! output element. Evaluation materialises every intermediate stage.

use std::collections::BTreeMap;

use log::debug;

use crate::ast::expression::Direction;
use crate::core::Pat;
use crate::error::{CompileError, Error};

use super::code::{apply_value, bind_pat, Code};
use super::env::EvalEnv;
use super::value::Value;

#[derive(Debug)]
pub struct FromCode {
    pub sources: Vec<(Pat, Code)>,
    pub steps: Vec<StepCode>,
    pub yield_code: Code,
}

#[derive(Debug)]
pub enum StepCode {
    Where(Code),
    Group {
        /// Key fields in canonical label order.
        keys: Vec<(String, Code)>,
        /// Aggregate name, function code, per-row argument code.
        aggregates: Vec<(String, Code, Code)>,
    },
    Order(Vec<(Code, Direction)>),
}

pub fn eval_from(from: &FromCode, env: &EvalEnv) -> Result<Value, Error> {
    // Cartesian product. Later sources are evaluated under the bindings of
    // earlier ones; rows whose pattern does not match are filtered out.
    let mut rows = vec![env.clone()];
    for (pat, code) in &from.sources {
        let mut next = Vec::new();
        for row in &rows {
            let list = match code.eval(row)? {
                Value::List(list) => list,
                other => {
                    return Err(Error::Compile(CompileError::Invariant(format!(
                        "from source evaluated to a non-list {:?}",
                        other
                    ))))
                }
            };
            for value in list {
                if let Some(bound) = bind_pat(row, pat, &value) {
                    next.push(bound);
                }
            }
        }
        rows = next;
    }
    debug!("from: {} rows after sources", rows.len());

    for step in &from.steps {
        rows = match step {
            StepCode::Where(code) => {
                let mut kept = Vec::new();
                for row in rows {
                    match code.eval(&row)? {
                        Value::Bool(true) => kept.push(row),
                        Value::Bool(false) => {}
                        other => {
                            return Err(Error::Compile(CompileError::Invariant(format!(
                                "where evaluated to a non-bool {:?}",
                                other
                            ))))
                        }
                    }
                }
                kept
            }

            StepCode::Group { keys, aggregates } => {
                // Partition on the evaluated key tuple. The ordered map
                // makes group output deterministic: ascending by key.
                let mut groups: BTreeMap<Vec<Value>, Vec<EvalEnv>> = BTreeMap::new();
                for row in rows {
                    let key = keys
                        .iter()
                        .map(|(_, code)| code.eval(&row))
                        .collect::<Result<Vec<_>, _>>()?;
                    groups.entry(key).or_default().push(row);
                }
                let mut next = Vec::new();
                for (key, members) in groups {
                    // A group step resets the binding set: group keys and
                    // aggregate results only.
                    let mut out = env.clone();
                    for ((name, _), value) in keys.iter().zip(key) {
                        out = out.bind(name.clone(), value);
                    }
                    for (name, func, argument) in aggregates {
                        let func = func.eval(&out)?;
                        let args = members
                            .iter()
                            .map(|m| argument.eval(m))
                            .collect::<Result<Vec<_>, _>>()?;
                        let value = apply_value(&func, Value::List(args))?;
                        out = out.bind(name.clone(), value);
                    }
                    next.push(out);
                }
                next
            }

            StepCode::Order(items) => {
                let mut decorated = Vec::with_capacity(rows.len());
                for row in rows {
                    let key = items
                        .iter()
                        .map(|(code, _)| code.eval(&row))
                        .collect::<Result<Vec<_>, _>>()?;
                    decorated.push((key, row));
                }
                // Stable sort: ties keep their input order.
                decorated.sort_by(|(a, _), (b, _)| {
                    for (i, (_, direction)) in items.iter().enumerate() {
                        let ord = a[i].compare(&b[i]);
                        let ord = match direction {
                            Direction::Asc => ord,
                            Direction::Desc => ord.reverse(),
                        };
                        if ord != std::cmp::Ordering::Equal {
                            return ord;
                        }
                    }
                    std::cmp::Ordering::Equal
                });
                decorated.into_iter().map(|(_, row)| row).collect()
            }
        };
    }

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        out.push(from.yield_code.eval(row)?);
    }
    Ok(Value::List(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IdPat;
    use crate::interpreter::builtins::BuiltIn;
    use crate::types::ty::INT;

    fn id_pat(name: &str) -> Pat {
        Pat::Id(IdPat {
            name: name.to_string(),
            ty: INT,
        })
    }

    fn int_list(values: &[i64]) -> Code {
        Code::Constant(Value::List(values.iter().map(|i| Value::Int(*i)).collect()))
    }

    #[test]
    fn test_cartesian_product_order() {
        // from x in [1,2], y in [10,20] yield (x, y)
        let from = FromCode {
            sources: vec![
                (id_pat("x"), int_list(&[1, 2])),
                (id_pat("y"), int_list(&[10, 20])),
            ],
            steps: vec![],
            yield_code: Code::MakeTuple(vec![Code::Get("x".into()), Code::Get("y".into())]),
        };
        let result = eval_from(&from, &EvalEnv::empty()).unwrap();
        let expected = Value::List(vec![
            Value::Tuple(vec![Value::Int(1), Value::Int(10)]),
            Value::Tuple(vec![Value::Int(1), Value::Int(20)]),
            Value::Tuple(vec![Value::Int(2), Value::Int(10)]),
            Value::Tuple(vec![Value::Int(2), Value::Int(20)]),
        ]);
        assert_eq!(result, expected);
    }

    #[test]
    fn test_where_filters() {
        // from x in [1,2,3,4] where x > 2 yield x
        let from = FromCode {
            sources: vec![(id_pat("x"), int_list(&[1, 2, 3, 4]))],
            steps: vec![StepCode::Where(Code::Apply {
                func: Box::new(Code::Constant(Value::BuiltIn(BuiltIn::OpGt))),
                arg: Box::new(Code::MakeTuple(vec![
                    Code::Get("x".into()),
                    Code::Constant(Value::Int(2)),
                ])),
            })],
            yield_code: Code::Get("x".into()),
        };
        let result = eval_from(&from, &EvalEnv::empty()).unwrap();
        assert_eq!(result, Value::List(vec![Value::Int(3), Value::Int(4)]));
    }

    #[test]
    fn test_group_partitions_and_sorts_keys() {
        // from x in [3,1,3,1,1] group x compute c = count yield (x, c)
        let from = FromCode {
            sources: vec![(id_pat("x"), int_list(&[3, 1, 3, 1, 1]))],
            steps: vec![StepCode::Group {
                keys: vec![("x".to_string(), Code::Get("x".into()))],
                aggregates: vec![(
                    "c".to_string(),
                    Code::Constant(Value::BuiltIn(BuiltIn::Count)),
                    Code::Get("x".into()),
                )],
            }],
            yield_code: Code::MakeTuple(vec![Code::Get("x".into()), Code::Get("c".into())]),
        };
        let result = eval_from(&from, &EvalEnv::empty()).unwrap();
        let expected = Value::List(vec![
            Value::Tuple(vec![Value::Int(1), Value::Int(3)]),
            Value::Tuple(vec![Value::Int(3), Value::Int(2)]),
        ]);
        assert_eq!(result, expected);
    }

    #[test]
    fn test_order_descending_and_stability() {
        let from = FromCode {
            sources: vec![(id_pat("x"), int_list(&[2, 1, 3, 1]))],
            steps: vec![StepCode::Order(vec![(
                Code::Get("x".into()),
                Direction::Desc,
            )])],
            yield_code: Code::Get("x".into()),
        };
        let result = eval_from(&from, &EvalEnv::empty()).unwrap();
        assert_eq!(
            result,
            Value::List(vec![
                Value::Int(3),
                Value::Int(2),
                Value::Int(1),
                Value::Int(1)
            ])
        );
    }

    #[test]
    fn test_non_matching_source_rows_are_filtered() {
        // from (x :: xs) in [[1,2],[],[3]] yield x
        use crate::core::{ConPat, TuplePat, CONS_NAME};
        use crate::types::Type;
        let pat = Pat::Con(ConPat {
            name: CONS_NAME.to_string(),
            arg: Box::new(Pat::Tuple(TuplePat {
                args: vec![id_pat("x"), id_pat("xs")],
                ty: Type::Tuple(vec![INT, Type::list(INT)]),
            })),
            ty: Type::list(INT),
        });
        let lists = Code::Constant(Value::List(vec![
            Value::List(vec![Value::Int(1), Value::Int(2)]),
            Value::List(vec![]),
            Value::List(vec![Value::Int(3)]),
        ]));
        let from = FromCode {
            sources: vec![(pat, lists)],
            steps: vec![],
            yield_code: Code::Get("x".into()),
        };
        let result = eval_from(&from, &EvalEnv::empty()).unwrap();
        assert_eq!(result, Value::List(vec![Value::Int(1), Value::Int(3)]));
    }
}

//! Predicate compiler.
//!
//! Translates a [`QueryPredicate`] into the backend filter grammar:
//!
//! - leaf: `{"field": {"operator": literal}}`
//! - `and` / `or`: `{"and": [child, ...]}` in declared order
//! - `not`: `{"not": child}`
//! - match-all: no filter at all
//!
//! Literals are passed through untouched. Whether an operator makes sense
//! for the field's type is left to the backend to reject.

use crate::{error::Result, Error, GroupType, QueryOperator, QueryPredicate};
use serde_json::{Map, Value};

/// A compiled filter expression.
pub type Filter = Map<String, Value>;

/// Compile a predicate. Returns `None` for the match-all predicate.
pub fn compile(predicate: &QueryPredicate) -> Result<Option<Filter>> {
    match predicate {
        QueryPredicate::All => Ok(None),
        other => compile_node(other).map(Some),
    }
}

fn compile_node(predicate: &QueryPredicate) -> Result<Filter> {
    match predicate {
        QueryPredicate::All => Err(Error::InvalidPredicate(
            "match-all predicate cannot be nested inside a group".into(),
        )),
        QueryPredicate::Operation { field, operator } => {
            let mut condition = Map::with_capacity(1);
            condition.insert(operator.name().to_string(), operand(operator));

            let mut filter = Map::with_capacity(1);
            filter.insert(field.clone(), Value::Object(condition));
            Ok(filter)
        }
        QueryPredicate::Group {
            group: GroupType::Not,
            predicates,
        } => {
            let [child] = predicates.as_slice() else {
                return Err(Error::InvalidPredicate(format!(
                    "not requires exactly one child, got {}",
                    predicates.len()
                )));
            };

            let mut filter = Map::with_capacity(1);
            filter.insert("not".to_string(), Value::Object(compile_node(child)?));
            Ok(filter)
        }
        QueryPredicate::Group { group, predicates } => {
            let children = predicates
                .iter()
                .map(|p| compile_node(p).map(Value::Object))
                .collect::<Result<Vec<_>>>()?;

            let mut filter = Map::with_capacity(1);
            filter.insert(group.name().to_string(), Value::Array(children));
            Ok(filter)
        }
    }
}

fn operand(operator: &QueryOperator) -> Value {
    match operator {
        QueryOperator::Eq(v)
        | QueryOperator::Ne(v)
        | QueryOperator::Gt(v)
        | QueryOperator::Ge(v)
        | QueryOperator::Lt(v)
        | QueryOperator::Le(v)
        | QueryOperator::Contains(v)
        | QueryOperator::NotContains(v)
        | QueryOperator::BeginsWith(v) => v.clone(),
        QueryOperator::Between(start, end) => Value::Array(vec![start.clone(), end.clone()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryField;
    use proptest::prelude::*;
    use serde_json::json;

    fn compiled(predicate: &QueryPredicate) -> Value {
        Value::Object(compile(predicate).unwrap().unwrap())
    }

    #[test]
    fn match_all_compiles_to_nothing() {
        assert_eq!(compile(&QueryPredicate::all()).unwrap(), None);
    }

    #[test]
    fn leaf() {
        let p = QueryField::new("name").eq("Test Dummy");
        assert_eq!(compiled(&p), json!({"name": {"eq": "Test Dummy"}}));
    }

    #[test]
    fn literals_keep_their_type() {
        assert_eq!(
            compiled(&QueryField::new("age").gt(40)),
            json!({"age": {"gt": 40}})
        );
        assert_eq!(
            compiled(&QueryField::new("rating").le(4.5)),
            json!({"rating": {"le": 4.5}})
        );
        assert_eq!(
            compiled(&QueryField::new("done").ne(true)),
            json!({"done": {"ne": true}})
        );
        assert_eq!(
            compiled(&QueryField::new("age").eq("40")),
            json!({"age": {"eq": "40"}})
        );
    }

    #[test]
    fn between() {
        let p = QueryField::new("createdAt").between(100, 200);
        assert_eq!(compiled(&p), json!({"createdAt": {"between": [100, 200]}}));
    }

    #[test]
    fn and_group() {
        let p = QueryField::new("name")
            .begins_with("A day in the life of a...")
            .and(QueryField::new("owner").eq("DUMMY_OWNER_ID"));
        assert_eq!(
            compiled(&p),
            json!({"and": [
                {"name": {"beginsWith": "A day in the life of a..."}},
                {"owner": {"eq": "DUMMY_OWNER_ID"}}
            ]})
        );
    }

    #[test]
    fn nested_not_and_or() {
        let p = QueryPredicate::not(
            QueryField::new("a")
                .eq(1)
                .or(QueryField::new("b").not_contains("x")),
        );
        assert_eq!(
            compiled(&p),
            json!({"not": {"or": [
                {"a": {"eq": 1}},
                {"b": {"notContains": "x"}}
            ]}})
        );
    }

    #[test]
    fn duplicates_are_kept() {
        let leaf = QueryField::new("a").eq(1);
        let p = QueryPredicate::or_of(vec![leaf.clone(), leaf]);
        assert_eq!(
            compiled(&p),
            json!({"or": [{"a": {"eq": 1}}, {"a": {"eq": 1}}]})
        );
    }

    #[test]
    fn not_with_two_children_is_invalid() {
        let p = QueryPredicate::Group {
            group: GroupType::Not,
            predicates: vec![QueryField::new("a").eq(1), QueryField::new("b").eq(2)],
        };
        assert!(matches!(compile(&p), Err(Error::InvalidPredicate(_))));
    }

    #[test]
    fn nested_match_all_is_invalid() {
        let p = QueryPredicate::and_of(vec![QueryField::new("a").eq(1), QueryPredicate::all()]);
        assert!(matches!(compile(&p), Err(Error::InvalidPredicate(_))));
    }

    #[test]
    fn operator_type_mismatch_passes_through() {
        let p = QueryField::new("age").contains("4");
        assert_eq!(compiled(&p), json!({"age": {"contains": "4"}}));
    }

    proptest! {
        #[test]
        fn and_preserves_child_order(values in prop::collection::vec(any::<i64>(), 1..16)) {
            let children: Vec<_> = values
                .iter()
                .enumerate()
                .map(|(i, v)| QueryField::new(format!("f{}", i)).eq(*v))
                .collect();
            let filter = compile(&QueryPredicate::and_of(children)).unwrap().unwrap();

            let compiled = filter["and"].as_array().unwrap();
            prop_assert_eq!(compiled.len(), values.len());
            for (i, (entry, v)) in compiled.iter().zip(&values).enumerate() {
                prop_assert_eq!(entry, &json!({ format!("f{}", i): {"eq": v} }));
            }
        }
    }
}

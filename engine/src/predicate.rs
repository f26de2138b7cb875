//! Query predicates.
//!
//! A predicate is an immutable tree: leaves bind a field to an operator and
//! a literal, groups combine children with `and`, `or` or `not`. The
//! distinguished [`QueryPredicate::All`] means "no filter".

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison applied to a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryOperator {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Ge(Value),
    Lt(Value),
    Le(Value),
    Contains(Value),
    NotContains(Value),
    BeginsWith(Value),
    Between(Value, Value),
}

impl QueryOperator {
    /// Operator name in the filter grammar.
    pub fn name(&self) -> &'static str {
        match self {
            QueryOperator::Eq(_) => "eq",
            QueryOperator::Ne(_) => "ne",
            QueryOperator::Gt(_) => "gt",
            QueryOperator::Ge(_) => "ge",
            QueryOperator::Lt(_) => "lt",
            QueryOperator::Le(_) => "le",
            QueryOperator::Contains(_) => "contains",
            QueryOperator::NotContains(_) => "notContains",
            QueryOperator::BeginsWith(_) => "beginsWith",
            QueryOperator::Between(_, _) => "between",
        }
    }
}

/// How a group combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    And,
    Or,
    Not,
}

impl GroupType {
    pub fn name(&self) -> &'static str {
        match self {
            GroupType::And => "and",
            GroupType::Or => "or",
            GroupType::Not => "not",
        }
    }
}

/// A predicate expression tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QueryPredicate {
    /// Matches everything; compiles to no filter.
    #[default]
    All,
    /// A single field comparison.
    Operation {
        field: String,
        operator: QueryOperator,
    },
    /// Children combined by `and`, `or` or `not`.
    Group {
        group: GroupType,
        predicates: Vec<QueryPredicate>,
    },
}

impl QueryPredicate {
    pub fn all() -> Self {
        QueryPredicate::All
    }

    pub fn is_all(&self) -> bool {
        matches!(self, QueryPredicate::All)
    }

    pub fn and_of(predicates: Vec<QueryPredicate>) -> Self {
        QueryPredicate::Group {
            group: GroupType::And,
            predicates,
        }
    }

    pub fn or_of(predicates: Vec<QueryPredicate>) -> Self {
        QueryPredicate::Group {
            group: GroupType::Or,
            predicates,
        }
    }

    pub fn not(predicate: QueryPredicate) -> Self {
        !predicate
    }

    /// Combine with `and`. An existing `and` group gets `other` appended.
    pub fn and(self, other: QueryPredicate) -> Self {
        self.combine(GroupType::And, other)
    }

    /// Combine with `or`. An existing `or` group gets `other` appended.
    pub fn or(self, other: QueryPredicate) -> Self {
        self.combine(GroupType::Or, other)
    }

    fn combine(self, kind: GroupType, other: QueryPredicate) -> Self {
        match self {
            QueryPredicate::Group {
                group,
                mut predicates,
            } if group == kind => {
                predicates.push(other);
                QueryPredicate::Group { group, predicates }
            }
            lhs => QueryPredicate::Group {
                group: kind,
                predicates: vec![lhs, other],
            },
        }
    }
}

/// Entry point for building leaf predicates on a named field.
///
/// ```rust
/// use syncql_engine::QueryField;
///
/// let adults = QueryField::new("age").ge(18);
/// let named = QueryField::new("name").begins_with("A");
/// let both = adults.and(named);
/// ```
#[derive(Debug, Clone)]
pub struct QueryField {
    name: String,
}

impl QueryField {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn op(&self, operator: QueryOperator) -> QueryPredicate {
        QueryPredicate::Operation {
            field: self.name.clone(),
            operator,
        }
    }

    pub fn eq(&self, value: impl Into<Value>) -> QueryPredicate {
        self.op(QueryOperator::Eq(value.into()))
    }

    pub fn ne(&self, value: impl Into<Value>) -> QueryPredicate {
        self.op(QueryOperator::Ne(value.into()))
    }

    pub fn gt(&self, value: impl Into<Value>) -> QueryPredicate {
        self.op(QueryOperator::Gt(value.into()))
    }

    pub fn ge(&self, value: impl Into<Value>) -> QueryPredicate {
        self.op(QueryOperator::Ge(value.into()))
    }

    pub fn lt(&self, value: impl Into<Value>) -> QueryPredicate {
        self.op(QueryOperator::Lt(value.into()))
    }

    pub fn le(&self, value: impl Into<Value>) -> QueryPredicate {
        self.op(QueryOperator::Le(value.into()))
    }

    pub fn contains(&self, value: impl Into<Value>) -> QueryPredicate {
        self.op(QueryOperator::Contains(value.into()))
    }

    pub fn not_contains(&self, value: impl Into<Value>) -> QueryPredicate {
        self.op(QueryOperator::NotContains(value.into()))
    }

    pub fn begins_with(&self, value: impl Into<Value>) -> QueryPredicate {
        self.op(QueryOperator::BeginsWith(value.into()))
    }

    pub fn between(&self, start: impl Into<Value>, end: impl Into<Value>) -> QueryPredicate {
        self.op(QueryOperator::Between(start.into(), end.into()))
    }
}

impl std::ops::Not for QueryPredicate {
    type Output = QueryPredicate;

    fn not(self) -> Self::Output {
        QueryPredicate::Group {
            group: GroupType::Not,
            predicates: vec![self],
        }
    }
}

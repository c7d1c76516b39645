/// Decomposed form of a flat `SELECT <cols> FROM <tables> [WHERE <pred>]`.
///
/// Produced once per incoming query by the decomposer and consumed by the
/// federator (FROM-list routing) and the merge engine (projection and
/// filtering). Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryComponents {
    pub select: SelectList,
    pub from: Vec<String>,
    pub predicate: Option<Predicate>,
}

/// SELECT-list: either the `*` wildcard or an ordered column list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectList {
    Wildcard,
    Columns(Vec<String>),
}

impl SelectList {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, SelectList::Wildcard)
    }
}

/// Restricted WHERE grammar: comparisons of a column reference against a
/// literal, combined with AND/OR. Evaluated by the merge engine's
/// interpreter; predicate text is never executed.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        op: CompareOp,
        literal: Literal,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// Scalar literal on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Literal {
    /// Numeric view used for cross-type integer/float comparison.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Integer(i) => Some(*i as f64),
            Literal::Float(f) => Some(*f),
            _ => None,
        }
    }
}

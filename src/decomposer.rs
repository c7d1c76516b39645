use crate::error::FederationError;
use crate::models::{CompareOp, Literal, Predicate, QueryComponents, SelectList};
use sqlparser::ast::{
    BinaryOperator, Expr, GroupByExpr, ObjectName, ObjectNamePart, Query, Select, SelectItem,
    SetExpr, Statement, TableFactor, UnaryOperator, Value,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Decomposes a flat `SELECT <cols> FROM <tables> [WHERE <predicate>]` into
/// its components without executing it.
///
/// The supported grammar is deliberately closed: no joins, subqueries,
/// aggregates, set operations, GROUP BY, ORDER BY or LIMIT. Anything
/// outside it fails parsing loudly instead of partially matching.
pub struct QueryDecomposer;

impl QueryDecomposer {
    pub fn decompose(sql: &str) -> Result<QueryComponents, FederationError> {
        let dialect = GenericDialect {};
        let statements = Parser::new(&dialect)
            .try_with_sql(sql)
            .map_err(|e| FederationError::Parse(format!("SQL parsing error: {}", e)))?
            .parse_statements()
            .map_err(|e| FederationError::Parse(format!("SQL parsing error: {}", e)))?;

        if statements.is_empty() {
            return Err(FederationError::Parse("empty SQL query".to_string()));
        }
        if statements.len() > 1 {
            return Err(FederationError::Parse(
                "exactly one statement expected".to_string(),
            ));
        }

        match &statements[0] {
            Statement::Query(query) => Self::decompose_query(query),
            other => Err(FederationError::Parse(format!(
                "only SELECT statements are supported, found: {}",
                other
            ))),
        }
    }

    fn decompose_query(query: &Query) -> Result<QueryComponents, FederationError> {
        if query.with.is_some() {
            return Err(FederationError::Parse("WITH clauses are not supported".to_string()));
        }
        if query.order_by.is_some() {
            return Err(FederationError::Parse("ORDER BY is not supported".to_string()));
        }
        if query.limit_clause.is_some() {
            return Err(FederationError::Parse("LIMIT is not supported".to_string()));
        }

        let select = match query.body.as_ref() {
            SetExpr::Select(select) => select,
            _ => {
                return Err(FederationError::Parse(
                    "set operations and subqueries are not supported".to_string(),
                ))
            }
        };

        Self::decompose_select(select)
    }

    fn decompose_select(select: &Select) -> Result<QueryComponents, FederationError> {
        if select.distinct.is_some() {
            return Err(FederationError::Parse("DISTINCT is not supported".to_string()));
        }
        if select.having.is_some() {
            return Err(FederationError::Parse("HAVING is not supported".to_string()));
        }
        match &select.group_by {
            GroupByExpr::Expressions(exprs, _) if exprs.is_empty() => {}
            _ => {
                return Err(FederationError::Parse("GROUP BY is not supported".to_string()));
            }
        }

        let from = Self::from_tables(select)?;
        let select_list = Self::select_list(&select.projection)?;
        let predicate = select
            .selection
            .as_ref()
            .map(Self::predicate_from_expr)
            .transpose()?;

        Ok(QueryComponents {
            select: select_list,
            from,
            predicate,
        })
    }

    fn from_tables(select: &Select) -> Result<Vec<String>, FederationError> {
        if select.from.is_empty() {
            return Err(FederationError::Parse(
                "query has no FROM clause".to_string(),
            ));
        }

        let mut tables = Vec::new();
        for table_with_joins in &select.from {
            if !table_with_joins.joins.is_empty() {
                return Err(FederationError::Parse(
                    "explicit JOIN syntax is not supported".to_string(),
                ));
            }
            match &table_with_joins.relation {
                TableFactor::Table { name, .. } => tables.push(Self::table_name(name)?),
                other => {
                    return Err(FederationError::Parse(format!(
                        "unsupported FROM item: {}",
                        other
                    )))
                }
            }
        }
        Ok(tables)
    }

    fn table_name(name: &ObjectName) -> Result<String, FederationError> {
        name.0
            .last()
            .and_then(|part| match part {
                ObjectNamePart::Identifier(ident) => Some(ident.value.clone()),
                _ => None,
            })
            .ok_or_else(|| {
                FederationError::Parse(format!("unsupported table reference: {}", name))
            })
    }

    fn select_list(projection: &[SelectItem]) -> Result<SelectList, FederationError> {
        if projection.len() == 1 {
            if let SelectItem::Wildcard(_) = projection[0] {
                return Ok(SelectList::Wildcard);
            }
        }

        let mut columns = Vec::new();
        for item in projection {
            match item {
                SelectItem::UnnamedExpr(expr) => columns.push(Self::column_ref(expr)?),
                SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {
                    return Err(FederationError::Parse(
                        "wildcard cannot be mixed with explicit columns".to_string(),
                    ))
                }
                other => {
                    return Err(FederationError::Parse(format!(
                        "unsupported SELECT item: {}",
                        other
                    )))
                }
            }
        }
        Ok(SelectList::Columns(columns))
    }

    fn column_ref(expr: &Expr) -> Result<String, FederationError> {
        match expr {
            Expr::Identifier(ident) => Ok(ident.value.clone()),
            // Qualified references keep only the column part; table routing
            // already happened via the FROM list.
            Expr::CompoundIdentifier(parts) => parts
                .last()
                .map(|ident| ident.value.clone())
                .ok_or_else(|| FederationError::Parse("empty column reference".to_string())),
            other => Err(FederationError::Parse(format!(
                "unsupported column expression: {}",
                other
            ))),
        }
    }

    /// Lower a WHERE clause into the restricted predicate AST: column
    /// compared against a literal, combined with AND/OR.
    fn predicate_from_expr(expr: &Expr) -> Result<Predicate, FederationError> {
        match expr {
            Expr::Nested(inner) => Self::predicate_from_expr(inner),
            Expr::BinaryOp { left, op, right } => match op {
                BinaryOperator::And => Ok(Predicate::And(
                    Box::new(Self::predicate_from_expr(left)?),
                    Box::new(Self::predicate_from_expr(right)?),
                )),
                BinaryOperator::Or => Ok(Predicate::Or(
                    Box::new(Self::predicate_from_expr(left)?),
                    Box::new(Self::predicate_from_expr(right)?),
                )),
                _ => {
                    let op = Self::compare_op(op)?;
                    let column = Self::column_ref(left)?;
                    let literal = Self::literal(right)?;
                    Ok(Predicate::Compare {
                        column,
                        op,
                        literal,
                    })
                }
            },
            other => Err(FederationError::Parse(format!(
                "unsupported WHERE expression: {}",
                other
            ))),
        }
    }

    fn compare_op(op: &BinaryOperator) -> Result<CompareOp, FederationError> {
        match op {
            BinaryOperator::Eq => Ok(CompareOp::Eq),
            BinaryOperator::NotEq => Ok(CompareOp::NotEq),
            BinaryOperator::Lt => Ok(CompareOp::Lt),
            BinaryOperator::LtEq => Ok(CompareOp::LtEq),
            BinaryOperator::Gt => Ok(CompareOp::Gt),
            BinaryOperator::GtEq => Ok(CompareOp::GtEq),
            other => Err(FederationError::Parse(format!(
                "unsupported comparison operator: {}",
                other
            ))),
        }
    }

    fn literal(expr: &Expr) -> Result<Literal, FederationError> {
        match expr {
            Expr::Value(value) => Self::literal_value(&value.value),
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr,
            } => match Self::literal(expr)? {
                Literal::Integer(i) => Ok(Literal::Integer(-i)),
                Literal::Float(f) => Ok(Literal::Float(-f)),
                other => Err(FederationError::Parse(format!(
                    "cannot negate literal {:?}",
                    other
                ))),
            },
            other => Err(FederationError::Parse(format!(
                "comparison right-hand side must be a literal, found: {}",
                other
            ))),
        }
    }

    fn literal_value(value: &Value) -> Result<Literal, FederationError> {
        match value {
            Value::Number(repr, _) => {
                if let Ok(i) = repr.parse::<i64>() {
                    Ok(Literal::Integer(i))
                } else {
                    repr.parse::<f64>().map(Literal::Float).map_err(|_| {
                        FederationError::Parse(format!("malformed numeric literal: {}", repr))
                    })
                }
            }
            Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => {
                Ok(Literal::Text(s.clone()))
            }
            Value::Boolean(b) => Ok(Literal::Bool(*b)),
            Value::Null => Ok(Literal::Null),
            other => Err(FederationError::Parse(format!(
                "unsupported literal: {}",
                other
            ))),
        }
    }
}

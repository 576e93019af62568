//! SQL parsing and classification logic.
//!
//! Uses sqlparser-rs with the PostgreSQL dialect, which also accepts the
//! double-quoted identifiers and `LIMIT` clauses of the SQLite catalog.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use super::{Access, Classification, StatementKind};

/// SQL classifier that parses SQL and decides whether it only reads.
#[derive(Debug)]
pub struct SqlClassifier {
    dialect: PostgreSqlDialect,
}

impl Default for SqlClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlClassifier {
    pub fn new() -> Self {
        Self {
            dialect: PostgreSqlDialect {},
        }
    }

    /// Classifies a SQL string.
    ///
    /// SQL that cannot be parsed, or is empty, is classified as mutating.
    pub fn classify(&self, sql: &str) -> Classification {
        let statements = match Parser::parse_sql(&self.dialect, sql) {
            Ok(statements) => statements,
            Err(e) => {
                return Classification::with_note(
                    Access::Mutating,
                    StatementKind::Unknown,
                    format!("Could not parse SQL: {e}"),
                )
            }
        };

        match statements.as_slice() {
            [] => Classification::with_note(
                Access::Mutating,
                StatementKind::Unknown,
                "Empty SQL statement",
            ),
            [single] => {
                let (access, kind) = classify_statement(single);
                Classification::new(access, kind)
            }
            many => {
                let classified: Vec<_> = many.iter().map(classify_statement).collect();
                let (access, kind) = classified
                    .iter()
                    .find(|(access, _)| *access == Access::Mutating)
                    .or_else(|| classified.first())
                    .cloned()
                    .unwrap_or((Access::Mutating, StatementKind::Unknown));
                Classification::new(access, StatementKind::Multiple(Box::new(kind)))
            }
        }
    }
}

/// Convenience function to classify SQL without creating a classifier instance.
pub fn classify_sql(sql: &str) -> Classification {
    SqlClassifier::new().classify(sql)
}

type Verdict = (Access, StatementKind);

/// Keeps the first mutating verdict.
fn worst(current: Verdict, next: Verdict) -> Verdict {
    if current.0 == Access::Mutating {
        current
    } else if next.0 == Access::Mutating {
        next
    } else {
        current
    }
}

fn read(kind: StatementKind) -> Verdict {
    (Access::ReadOnly, kind)
}

fn write(kind: StatementKind) -> Verdict {
    (Access::Mutating, kind)
}

fn classify_statement(statement: &Statement) -> Verdict {
    match statement {
        Statement::Query(query) => classify_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            // EXPLAIN ANALYZE runs the statement
            if *analyze {
                let (access, _) = classify_statement(statement);
                (access, StatementKind::Explain)
            } else {
                read(StatementKind::Explain)
            }
        }
        Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. } => read(StatementKind::Show),

        Statement::Insert(_) => write(StatementKind::Insert),
        Statement::Update { .. } => write(StatementKind::Update),
        Statement::Delete(_) => write(StatementKind::Delete),
        Statement::Merge { .. } => write(StatementKind::Merge),

        Statement::Drop { .. }
        | Statement::Truncate { .. }
        | Statement::AlterTable { .. }
        | Statement::AlterIndex { .. }
        | Statement::AlterView { .. }
        | Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. } => write(StatementKind::Ddl),

        Statement::Grant { .. } | Statement::Revoke { .. } => write(StatementKind::Privilege),

        _ => write(StatementKind::Unknown),
    }
}

/// Classifies a query, including its CTEs.
fn classify_query(query: &Query) -> Verdict {
    let mut verdict = read(StatementKind::Select);

    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            verdict = worst(verdict, classify_query(&cte.query));
        }
    }

    worst(verdict, classify_set_expr(&query.body))
}

fn classify_set_expr(set_expr: &SetExpr) -> Verdict {
    match set_expr {
        SetExpr::Select(select) => classify_select(select),
        SetExpr::Query(query) => classify_query(query),
        SetExpr::SetOperation { left, right, .. } => {
            worst(classify_set_expr(left), classify_set_expr(right))
        }
        SetExpr::Values(_) | SetExpr::Table(_) => read(StatementKind::Select),
        SetExpr::Insert(stmt) | SetExpr::Update(stmt) => classify_statement(stmt),
        #[allow(unreachable_patterns)]
        _ => write(StatementKind::Unknown),
    }
}

/// Checks the FROM clause for derived tables.
fn classify_select(select: &Select) -> Verdict {
    select
        .from
        .iter()
        .map(classify_table_with_joins)
        .fold(read(StatementKind::Select), worst)
}

fn classify_table_with_joins(twj: &TableWithJoins) -> Verdict {
    twj.joins
        .iter()
        .map(|join| classify_table_factor(&join.relation))
        .fold(classify_table_factor(&twj.relation), worst)
}

fn classify_table_factor(factor: &TableFactor) -> Verdict {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => read(StatementKind::Select),
    }
}

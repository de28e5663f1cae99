//! Read-only queries on the evolution-request reporting database
//!
//! The view `GDE_FEE_Details` lists, per evolution request (`No DE`), the
//! customers, programs, applications and items it affects. Queries use bound
//! parameters; the optional filters are only added when non-empty.

use crate::error::Result;
use serde::Serialize;

const VIEW: &str = "GDE_FEE_Details";

/// A parameterised SQL statement (`?` placeholders)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<String>,
}

/// Connection able to run a [`Statement`]
///
/// Each row is returned as its column values, `None` for SQL `NULL`.
#[cfg_attr(test, mockall::automock)]
pub trait ReportingConnection {
    fn query(&self, statement: &Statement) -> Result<Vec<Vec<Option<String>>>>;
}

/// One affected item of an evolution request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRow {
    pub article: Option<String>,
    pub finished_part_number: Option<String>,
    pub amendment: Option<String>,
}

#[derive(Debug, Default)]
struct QueryBuilder {
    clauses: Vec<String>,
    params: Vec<String>,
}

impl QueryBuilder {
    fn with_ref(evolution_ref: &str) -> Self {
        let mut builder = Self::default();
        builder.bind("[No DE]", evolution_ref);
        builder
    }

    fn bind(&mut self, column: &str, value: &str) {
        self.clauses.push(format!("{column} = ?"));
        self.params.push(value.to_string());
    }

    fn bind_optional(&mut self, column: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.bind(column, value);
        }
    }

    fn not_null(&mut self, column: &str) {
        self.clauses.push(format!("{column} IS NOT NULL"));
    }

    fn select(self, columns: &str, order_by: &str) -> Statement {
        let mut sql = format!("SELECT DISTINCT {columns} FROM {VIEW}");
        if !self.clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(order_by);
        Statement {
            sql,
            params: self.params,
        }
    }
}

/// Queries on the reporting view
#[derive(Debug)]
pub struct ReportingView<C: ReportingConnection> {
    connection: C,
}

impl<C: ReportingConnection> ReportingView<C> {
    pub const fn new(connection: C) -> Self {
        Self { connection }
    }

    fn first_column(&self, statement: &Statement) -> Result<Vec<String>> {
        tracing::debug!("Reporting query: {}", statement.sql);
        Ok(self
            .connection
            .query(statement)?
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .collect())
    }

    /// All evolution request references, newest first
    pub fn evolution_refs(&self) -> Result<Vec<String>> {
        self.first_column(&QueryBuilder::default().select("[No DE]", "[No DE] DESC"))
    }

    pub fn customers(&self, evolution_ref: &str) -> Result<Vec<String>> {
        let mut query = QueryBuilder::with_ref(evolution_ref);
        query.not_null("[Client]");
        self.first_column(&query.select("[Client]", "[Client] ASC"))
    }

    pub fn programs(&self, evolution_ref: &str, customer: Option<&str>) -> Result<Vec<String>> {
        let mut query = QueryBuilder::with_ref(evolution_ref);
        query.not_null("[Programme]");
        query.bind_optional("[Client]", customer);
        self.first_column(&query.select("[Programme]", "[Programme] ASC"))
    }

    pub fn applications(
        &self,
        evolution_ref: &str,
        customer: Option<&str>,
        program: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut query = QueryBuilder::with_ref(evolution_ref);
        query.not_null("[Application]");
        query.bind_optional("[Client]", customer);
        query.bind_optional("[Programme]", program);
        self.first_column(&query.select("[Application]", "[Application] ASC"))
    }

    pub fn items(
        &self,
        evolution_ref: &str,
        customer: Option<&str>,
        program: Option<&str>,
        application: Option<&str>,
    ) -> Result<Vec<ItemRow>> {
        let mut query = QueryBuilder::with_ref(evolution_ref);
        query.bind_optional("[Client]", customer);
        query.bind_optional("[Programme]", program);
        query.bind_optional("[Application]", application);
        let statement = query.select("[Article],[PN_produit_fini],[Amdt]", "[Article] ASC");

        tracing::debug!("Reporting query: {}", statement.sql);
        Ok(self
            .connection
            .query(&statement)?
            .into_iter()
            .map(|row| {
                let mut columns = row.into_iter();
                ItemRow {
                    article: columns.next().flatten(),
                    finished_part_number: columns.next().flatten(),
                    amendment: columns.next().flatten(),
                }
            })
            .collect())
    }
}

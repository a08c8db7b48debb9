//! Explicit SQL statements.
//!
//! A statement is a plain value that is built up front and only reaches the database through
//! one of its terminal methods. Table and column names are `&'static str`, so they always come
//! from code; every value is sent as a bind parameter.

use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, postgres::PgRow};

pub type StatementBuilder = QueryBuilder<'static, Postgres>;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Value {
    BigInt(i64),
    Text(String),
}

impl Value {
    fn push_bind(&self, builder: &mut StatementBuilder) {
        match self {
            Value::BigInt(value) => builder.push_bind(*value),
            Value::Text(value) => builder.push_bind(value.clone()),
        };
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::BigInt(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
struct Filter {
    column: &'static str,
    value: Value,
}

/// Pushes `WHERE a = $n AND b = $m`, or nothing if there are no filters.
fn push_filters(builder: &mut StatementBuilder, filters: &[Filter]) {
    for (index, filter) in filters.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        builder.push(filter.column).push(" = ");
        filter.value.push_bind(builder);
    }
}

/// Like [`push_filters`], but an empty filter list matches no rows at all.
fn push_guarded_filters(builder: &mut StatementBuilder, filters: &[Filter]) {
    if filters.is_empty() {
        builder.push(" WHERE 1=0");
    } else {
        push_filters(builder, filters);
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Select {
    table: &'static str,
    columns: Vec<&'static str>,
    filters: Vec<Filter>,
    order_by: Option<&'static str>,
    limit: Option<i64>,
}

impl Select {
    #[must_use]
    pub fn from(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Selects only the given columns instead of `*`.
    #[must_use]
    pub fn columns(mut self, columns: &[&'static str]) -> Self {
        self.columns = columns.to_vec();
        self
    }

    #[must_use]
    pub fn filter(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column,
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: &'static str) -> Self {
        self.order_by = Some(column);
        self
    }

    #[must_use]
    fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn query_builder(&self) -> StatementBuilder {
        let mut builder = StatementBuilder::new("SELECT ");
        if self.columns.is_empty() {
            builder.push("*");
        } else {
            builder.push(self.columns.join(", "));
        }
        builder.push(" FROM ").push(self.table);

        push_filters(&mut builder, &self.filters);

        if let Some(column) = self.order_by {
            builder.push(" ORDER BY ").push(column);
        }
        if let Some(limit) = self.limit {
            builder.push(" LIMIT ").push(limit);
        }

        builder
    }

    #[must_use]
    pub fn sql(&self) -> String {
        self.query_builder().sql().to_owned()
    }

    pub async fn fetch_all<T>(&self, pool: &PgPool) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut builder = self.query_builder();
        builder.build_query_as::<T>().fetch_all(pool).await
    }

    /// Fetches the first matching row, if there is one.
    pub async fn fetch_first<T>(&self, pool: &PgPool) -> Result<Option<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut builder = self.clone().limit(1).query_builder();
        builder.build_query_as::<T>().fetch_optional(pool).await
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Insert {
    table: &'static str,
    values: Vec<(&'static str, Value)>,
    returning: Option<&'static str>,
}

impl Insert {
    #[must_use]
    pub fn into(table: &'static str) -> Self {
        Self {
            table,
            values: Vec::new(),
            returning: None,
        }
    }

    #[must_use]
    pub fn value(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.values.push((column, value.into()));
        self
    }

    /// Like [`Insert::value`], but `None` leaves the column to its default.
    #[must_use]
    pub fn value_opt(self, column: &'static str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.value(column, value),
            None => self,
        }
    }

    #[must_use]
    pub fn returning(mut self, column: &'static str) -> Self {
        self.returning = Some(column);
        self
    }

    #[must_use]
    pub fn query_builder(&self) -> StatementBuilder {
        let mut builder = StatementBuilder::new("INSERT INTO ");
        builder.push(self.table);

        if self.values.is_empty() {
            builder.push(" DEFAULT VALUES");
        } else {
            let columns: Vec<_> = self.values.iter().map(|(column, _)| *column).collect();
            builder.push(" (").push(columns.join(", ")).push(") VALUES (");
            for (index, (_, value)) in self.values.iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                value.push_bind(&mut builder);
            }
            builder.push(")");
        }

        if let Some(column) = self.returning {
            builder.push(" RETURNING ").push(column);
        }

        builder
    }

    #[must_use]
    pub fn sql(&self) -> String {
        self.query_builder().sql().to_owned()
    }

    /// Runs the insert and decodes the single `RETURNING` column.
    ///
    /// Fails with [`sqlx::Error::RowNotFound`] if no `RETURNING` column was set.
    pub async fn fetch_returning_id(&self, pool: &PgPool) -> Result<i64, sqlx::Error> {
        let mut builder = self.query_builder();
        builder.build_query_scalar::<i64>().fetch_one(pool).await
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Update {
    table: &'static str,
    assignments: Vec<(&'static str, Value)>,
    filters: Vec<Filter>,
}

impl Update {
    #[must_use]
    pub fn table(table: &'static str) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            filters: Vec::new(),
        }
    }

    #[must_use]
    pub fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.assignments.push((column, value.into()));
        self
    }

    /// Like [`Update::set`], but `None` leaves the column untouched.
    #[must_use]
    pub fn set_opt(self, column: &'static str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.set(column, value),
            None => self,
        }
    }

    #[must_use]
    pub fn filter(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column,
            value: value.into(),
        });
        self
    }

    /// Renders the statement. Without any filter, the update matches no rows.
    #[must_use]
    pub fn query_builder(&self) -> StatementBuilder {
        let mut builder = StatementBuilder::new("UPDATE ");
        builder.push(self.table).push(" SET ");

        for (index, (column, value)) in self.assignments.iter().enumerate() {
            if index > 0 {
                builder.push(", ");
            }
            builder.push(*column).push(" = ");
            value.push_bind(&mut builder);
        }

        push_guarded_filters(&mut builder, &self.filters);

        builder
    }

    #[must_use]
    pub fn sql(&self) -> String {
        self.query_builder().sql().to_owned()
    }

    /// Returns the number of updated rows.
    pub async fn execute(&self, pool: &PgPool) -> Result<u64, sqlx::Error> {
        if self.assignments.is_empty() {
            return Ok(0);
        }

        let mut builder = self.query_builder();
        let result = builder.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Delete {
    table: &'static str,
    filters: Vec<Filter>,
}

impl Delete {
    #[must_use]
    pub fn from(table: &'static str) -> Self {
        Self {
            table,
            filters: Vec::new(),
        }
    }

    #[must_use]
    pub fn filter(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column,
            value: value.into(),
        });
        self
    }

    /// Renders the statement. Without any filter, the delete matches no rows.
    #[must_use]
    pub fn query_builder(&self) -> StatementBuilder {
        let mut builder = StatementBuilder::new("DELETE FROM ");
        builder.push(self.table);

        push_guarded_filters(&mut builder, &self.filters);

        builder
    }

    #[must_use]
    pub fn sql(&self) -> String {
        self.query_builder().sql().to_owned()
    }

    /// Returns the number of deleted rows.
    pub async fn execute(&self, pool: &PgPool) -> Result<u64, sqlx::Error> {
        let mut builder = self.query_builder();
        let result = builder.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}

//! Per-column query construction.
//!
//! A [`QuerySpec`] describes one column search independently of the backend:
//! the column, the predicate and the value to bind. [`Dialect`] renders it
//! into the count and sample statements a given database understands. The
//! search value is always bound as a parameter and never spliced into SQL.

use crate::config::{SearchConfig, WildcardMode};
use crate::models::{ColumnRef, DatabaseType, TableRef};
use crate::search::like::{LIKE_ESCAPE, contains_pattern, like_to_glob};

/// SQL flavour used to render a [`QuerySpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    SqlServer,
    PostgreSql,
    MySql,
    Sqlite,
}

impl From<DatabaseType> for Dialect {
    fn from(database_type: DatabaseType) -> Self {
        match database_type {
            DatabaseType::SqlServer => Dialect::SqlServer,
            DatabaseType::PostgreSQL => Dialect::PostgreSql,
            DatabaseType::MySQL => Dialect::MySql,
            DatabaseType::SQLite => Dialect::Sqlite,
        }
    }
}

impl Dialect {
    /// Quotes an identifier, doubling any embedded closing quote.
    pub fn quote_ident(self, ident: &str) -> String {
        match self {
            Dialect::SqlServer => format!("[{}]", ident.replace(']', "]]")),
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
            Dialect::PostgreSql | Dialect::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Schema-qualified, quoted table name.
    pub fn qualified_table(self, table: &TableRef) -> String {
        if table.schema.is_empty() {
            self.quote_ident(&table.name)
        } else {
            format!(
                "{}.{}",
                self.quote_ident(&table.schema),
                self.quote_ident(&table.name)
            )
        }
    }

    /// The column cast to the dialect's character type.
    pub fn projection(self, column: &str) -> String {
        let quoted = self.quote_ident(column);
        match self {
            Dialect::SqlServer => format!("CAST({} AS NVARCHAR(MAX))", quoted),
            Dialect::MySql => format!("CAST({} AS CHAR)", quoted),
            Dialect::PostgreSql | Dialect::Sqlite => format!("CAST({} AS TEXT)", quoted),
        }
    }

    /// Placeholder for the single bound parameter.
    pub fn placeholder(self) -> &'static str {
        match self {
            Dialect::SqlServer => "@P1",
            Dialect::PostgreSql => "$1",
            Dialect::MySql | Dialect::Sqlite => "?",
        }
    }

    /// `ESCAPE` clause as a string literal in this dialect.
    fn escape_clause(self, escape: char) -> String {
        match (self, escape) {
            // MySQL string literals treat backslash as an escape character
            (Dialect::MySql, '\\') => " ESCAPE '\\\\'".to_string(),
            (_, '\'') => " ESCAPE ''''".to_string(),
            (_, c) => format!(" ESCAPE '{}'", c),
        }
    }
}

/// Whether letter case matters when comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    Sensitive,
    Insensitive,
}

impl CaseMode {
    pub fn from_flag(case_sensitive: bool) -> Self {
        if case_sensitive {
            CaseMode::Sensitive
        } else {
            CaseMode::Insensitive
        }
    }
}

/// Comparison applied to the projected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Equals { case: CaseMode },
    /// `escape` is `None` when the pattern carries raw wildcards
    Like { case: CaseMode, escape: Option<char> },
}

/// Backend-neutral description of one column search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub column: ColumnRef,
    pub predicate: Predicate,
    /// Target value (exact) or wildcard-wrapped pattern (partial)
    pub parameter: String,
    pub sample_limit: usize,
}

impl QuerySpec {
    /// Builds the query for `column` from the run configuration.
    pub fn build(column: &ColumnRef, config: &SearchConfig) -> Self {
        let case = CaseMode::from_flag(config.case_sensitive);
        let (predicate, parameter) = if config.exact {
            (Predicate::Equals { case }, config.search_value.clone())
        } else {
            let escape = match config.wildcards {
                WildcardMode::Escaped => Some(LIKE_ESCAPE),
                WildcardMode::Raw => None,
            };
            (
                Predicate::Like { case, escape },
                contains_pattern(&config.search_value, config.wildcards),
            )
        };

        Self {
            column: column.clone(),
            predicate,
            parameter,
            sample_limit: config.sample_limit,
        }
    }

    /// `WHERE` condition, without the keyword.
    pub fn condition(&self, dialect: Dialect) -> String {
        let proj = dialect.projection(&self.column.name);
        let ph = dialect.placeholder();

        match (dialect, self.predicate) {
            (Dialect::SqlServer, Predicate::Equals { case }) => match case {
                CaseMode::Sensitive => format!("{proj} COLLATE Latin1_General_BIN2 = {ph}"),
                CaseMode::Insensitive => format!("{proj} COLLATE Latin1_General_CI_AS = {ph}"),
            },
            (Dialect::SqlServer, Predicate::Like { case, escape }) => {
                let collation = match case {
                    CaseMode::Sensitive => "Latin1_General_CS_AS",
                    CaseMode::Insensitive => "Latin1_General_CI_AS",
                };
                format!(
                    "{proj} COLLATE {collation} LIKE {ph}{}",
                    escape.map(|e| dialect.escape_clause(e)).unwrap_or_default()
                )
            }

            (Dialect::PostgreSql, Predicate::Equals { case }) => match case {
                CaseMode::Sensitive => format!("{proj} = {ph}"),
                CaseMode::Insensitive => format!("LOWER({proj}) = LOWER({ph})"),
            },
            (Dialect::PostgreSql, Predicate::Like { case, escape }) => {
                let op = match case {
                    CaseMode::Sensitive => "LIKE",
                    CaseMode::Insensitive => "ILIKE",
                };
                format!(
                    "{proj} {op} {ph}{}",
                    escape.map(|e| dialect.escape_clause(e)).unwrap_or_default()
                )
            }

            (Dialect::MySql, Predicate::Equals { case }) => match case {
                CaseMode::Sensitive => format!("{proj} COLLATE utf8mb4_bin = {ph}"),
                CaseMode::Insensitive => format!("LOWER({proj}) = LOWER({ph})"),
            },
            (Dialect::MySql, Predicate::Like { case, escape }) => {
                let escape = escape.map(|e| dialect.escape_clause(e)).unwrap_or_default();
                match case {
                    CaseMode::Sensitive => {
                        format!("{proj} COLLATE utf8mb4_bin LIKE {ph}{escape}")
                    }
                    CaseMode::Insensitive => format!("LOWER({proj}) LIKE LOWER({ph}){escape}"),
                }
            }

            (Dialect::Sqlite, Predicate::Equals { case }) => match case {
                CaseMode::Sensitive => format!("{proj} = {ph}"),
                CaseMode::Insensitive => format!("{proj} COLLATE NOCASE = {ph}"),
            },
            (Dialect::Sqlite, Predicate::Like { case, escape }) => match case {
                CaseMode::Sensitive => format!("{proj} GLOB {ph}"),
                CaseMode::Insensitive => format!(
                    "{proj} LIKE {ph}{}",
                    escape.map(|e| dialect.escape_clause(e)).unwrap_or_default()
                ),
            },
        }
    }

    /// Value to bind for the placeholder in this dialect.
    ///
    /// Identical to [`QuerySpec::parameter`] except for case-sensitive
    /// partial matches on SQLite, which are rendered with `GLOB`.
    pub fn bound_parameter(&self, dialect: Dialect) -> String {
        match (dialect, self.predicate) {
            (
                Dialect::Sqlite,
                Predicate::Like {
                    case: CaseMode::Sensitive,
                    escape,
                },
            ) => like_to_glob(&self.parameter, escape),
            _ => self.parameter.clone(),
        }
    }

    /// Statement returning the number of matching rows.
    pub fn count_sql(&self, dialect: Dialect) -> String {
        let count = match dialect {
            Dialect::SqlServer => "COUNT_BIG(*)",
            _ => "COUNT(*)",
        };
        format!(
            "SELECT {count} FROM {} WHERE {}",
            dialect.qualified_table(&self.column.table),
            self.condition(dialect)
        )
    }

    /// Statement returning at most `sample_limit` projected values.
    pub fn sample_sql(&self, dialect: Dialect) -> String {
        let proj = dialect.projection(&self.column.name);
        let table = dialect.qualified_table(&self.column.table);
        let condition = self.condition(dialect);
        match dialect {
            Dialect::SqlServer => format!(
                "SELECT TOP {} {proj} FROM {table} WHERE {condition}",
                self.sample_limit
            ),
            _ => format!(
                "SELECT {proj} FROM {table} WHERE {condition} LIMIT {}",
                self.sample_limit
            ),
        }
    }
}

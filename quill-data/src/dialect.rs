use std::borrow::Cow;

/// Target SQL dialect.
///
/// Statements are built once in a canonical form (`?` placeholders,
/// backtick-quoted identifiers) and rewritten for the driver right before
/// execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// MySQL: `?` placeholders with backtick quoting (the canonical form).
    MySql,
    /// SQLite accepts the canonical form as is.
    Sqlite,
    /// Postgres-style `$1, $2, ...` placeholders and `"` quoting.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::Postgres => '"',
            Dialect::MySql | Dialect::Sqlite => '`',
        }
    }

    /// Column type to declare for a field whose DDL is `sql_type`.
    ///
    /// SQLite reports columns declared `boolean` with a type the `Any`
    /// driver cannot decode, so they are declared `integer` there.
    pub fn column_type(self, sql_type: &str) -> &str {
        match self {
            Dialect::Sqlite
                if sql_type.eq_ignore_ascii_case("boolean")
                    || sql_type.eq_ignore_ascii_case("bool") =>
            {
                "integer"
            }
            _ => sql_type,
        }
    }

    /// Rewrite a canonical statement for this dialect in a single pass.
    ///
    /// Text inside single-quoted literals is copied verbatim.
    pub fn prepare(self, sql: &str) -> Cow<'_, str> {
        if matches!(self, Dialect::MySql | Dialect::Sqlite) {
            return Cow::Borrowed(sql);
        }
        let mut out = String::with_capacity(sql.len() + 8);
        let mut index = 0usize;
        let mut in_literal = false;
        for c in sql.chars() {
            match c {
                '\'' => {
                    in_literal = !in_literal;
                    out.push(c);
                }
                '?' if !in_literal => {
                    index += 1;
                    out.push_str(&self.placeholder(index));
                }
                '`' if !in_literal => out.push(self.quote_char()),
                _ => out.push(c),
            }
        }
        Cow::Owned(out)
    }
}

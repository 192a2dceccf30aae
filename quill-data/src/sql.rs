//! Pure SQL assembly over entity metadata.
//!
//! Everything here returns canonical SQL: `?` placeholders and
//! backtick-quoted identifiers. Values never enter the SQL text; callers
//! pass them as a separate parameter list and the executor rewrites the
//! statement for its [`Dialect`](crate::dialect::Dialect).

use crate::dialect::Dialect;
use crate::entity::EntityMetadata;
use crate::error::DataError;
use crate::field::FieldDescriptor;
use crate::model::Limit;
use crate::value::SqlValue;

/// Quote an identifier with backticks.
pub fn quote(ident: &str) -> String {
    format!("`{ident}`")
}

/// Column reference for a SELECT list, aliased to the attribute if renamed.
fn select_column(field: &FieldDescriptor) -> String {
    if field.is_renamed() {
        format!("{} AS {}", quote(field.column_name()), quote(field.attribute()))
    } else {
        quote(field.column_name())
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

pub fn select_template(table: &str, pk: &FieldDescriptor, fields: &[FieldDescriptor]) -> String {
    let columns: Vec<String> = std::iter::once(pk)
        .chain(fields.iter())
        .map(select_column)
        .collect();
    format!("SELECT {} FROM {}", columns.join(", "), quote(table))
}

/// Field columns first, primary key last; the argument list follows the same order.
pub fn insert_template(table: &str, pk: &FieldDescriptor, fields: &[FieldDescriptor]) -> String {
    let columns: Vec<String> = fields
        .iter()
        .chain(std::iter::once(pk))
        .map(|f| quote(f.column_name()))
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(table),
        columns.join(", "),
        placeholders(columns.len())
    )
}

pub fn update_template(table: &str, pk: &FieldDescriptor, fields: &[FieldDescriptor]) -> String {
    let sets: Vec<String> = fields
        .iter()
        .map(|f| format!("{}=?", quote(f.column_name())))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {}=?",
        quote(table),
        sets.join(", "),
        quote(pk.column_name())
    )
}

pub fn delete_template(table: &str, pk: &FieldDescriptor) -> String {
    format!("DELETE FROM {} WHERE {}=?", quote(table), quote(pk.column_name()))
}

/// SELECT by primary key.
pub fn find_by_pk(meta: &EntityMetadata) -> String {
    format!(
        "{} WHERE {}=?",
        meta.select_sql(),
        quote(meta.primary_key().column_name())
    )
}

/// Assemble a `find_all` statement on top of the select template.
///
/// `where_clause` and `order_by` are caller-written SQL fragments with
/// their own `?` placeholders; the limit values are appended to `args`.
pub fn find_all(
    meta: &EntityMetadata,
    where_clause: Option<&str>,
    order_by: Option<&str>,
    limit: Option<Limit>,
    args: &mut Vec<SqlValue>,
) -> String {
    let mut sql = meta.select_sql().to_string();
    if let Some(clause) = where_clause.filter(|c| !c.trim().is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
    if let Some(order) = order_by.filter(|o| !o.trim().is_empty()) {
        sql.push_str(" ORDER BY ");
        sql.push_str(order);
    }
    match limit {
        Some(Limit::Count(count)) => {
            sql.push_str(" LIMIT ?");
            args.push(limit_arg(count));
        }
        Some(Limit::Range { offset, count }) => {
            sql.push_str(" LIMIT ? OFFSET ?");
            args.push(limit_arg(count));
            args.push(limit_arg(offset));
        }
        None => {}
    }
    sql
}

/// Row counts beyond `i64::MAX` saturate instead of wrapping negative.
fn limit_arg(n: u64) -> SqlValue {
    SqlValue::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

/// `SELECT <expr> AS _num_ FROM <table> [WHERE ...]`.
pub fn find_number(meta: &EntityMetadata, expr: &str, where_clause: Option<&str>) -> String {
    let mut sql = format!("SELECT {expr} AS _num_ FROM {}", quote(meta.table()));
    if let Some(clause) = where_clause.filter(|c| !c.trim().is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
    sql
}

/// `CREATE TABLE IF NOT EXISTS` DDL from the field descriptors, with
/// column types adjusted for `dialect`.
pub fn create_table(meta: &EntityMetadata, dialect: Dialect) -> String {
    let pk = meta.primary_key();
    let mut columns = vec![format!(
        "{} {} NOT NULL PRIMARY KEY",
        quote(pk.column_name()),
        dialect.column_type(pk.sql_type())
    )];
    for field in meta.fields() {
        columns.push(format!(
            "{} {}",
            quote(field.column_name()),
            dialect.column_type(field.sql_type())
        ));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote(meta.table()),
        columns.join(", ")
    )
}

pub(crate) fn check_identifier(ident: &str, kind: &'static str) -> Result<(), DataError> {
    if is_valid_identifier(ident) {
        Ok(())
    } else {
        Err(DataError::configuration(format!(
            "invalid {kind} identifier: {ident:?}"
        )))
    }
}

fn is_valid_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ModelDef;

    fn users() -> EntityMetadata {
        let def = ModelDef::new("users")
            .field(FieldDescriptor::string("id").primary_key().ddl("varchar(50)"))
            .field(FieldDescriptor::string("email").ddl("varchar(50)"))
            .field(FieldDescriptor::boolean("admin"))
            .field(FieldDescriptor::float("created_at").column("create_at"));
        EntityMetadata::compile("User", def).unwrap()
    }

    #[test]
    fn templates() {
        let meta = users();
        assert_eq!(
            meta.select_sql(),
            "SELECT `id`, `email`, `admin`, `create_at` AS `created_at` FROM `users`"
        );
        assert_eq!(
            meta.insert_sql(),
            "INSERT INTO `users` (`email`, `admin`, `create_at`, `id`) VALUES (?, ?, ?, ?)"
        );
        assert_eq!(
            meta.update_sql(),
            "UPDATE `users` SET `email`=?, `admin`=?, `create_at`=? WHERE `id`=?"
        );
        assert_eq!(meta.delete_sql(), "DELETE FROM `users` WHERE `id`=?");
    }

    #[test]
    fn find_all_with_range_limit() {
        let meta = users();
        let mut args = vec![SqlValue::from("a@b.com")];
        let sql = find_all(
            &meta,
            Some("`email`=?"),
            Some("`create_at` desc"),
            Some(Limit::Range { offset: 10, count: 5 }),
            &mut args,
        );
        assert!(sql.ends_with("WHERE `email`=? ORDER BY `create_at` desc LIMIT ? OFFSET ?"));
        assert_eq!(
            args,
            vec![SqlValue::from("a@b.com"), SqlValue::Int(5), SqlValue::Int(10)]
        );
    }

    #[test]
    fn find_all_blank_clauses_are_ignored() {
        let meta = users();
        let mut args = Vec::new();
        let sql = find_all(&meta, Some("  "), None, Some(Limit::Count(3)), &mut args);
        assert_eq!(sql, format!("{} LIMIT ?", meta.select_sql()));
        assert_eq!(args, vec![SqlValue::Int(3)]);
    }

    #[test]
    fn huge_limits_saturate() {
        let meta = users();
        let mut args = Vec::new();
        find_all(
            &meta,
            None,
            None,
            Some(Limit::Range { offset: u64::MAX, count: 10 }),
            &mut args,
        );
        assert_eq!(args, vec![SqlValue::Int(10), SqlValue::Int(i64::MAX)]);

        let mut args = Vec::new();
        find_all(&meta, None, None, Some(Limit::Count(u64::MAX)), &mut args);
        assert_eq!(args, vec![SqlValue::Int(i64::MAX)]);
    }

    #[test]
    fn find_number_statement() {
        let meta = users();
        assert_eq!(
            find_number(&meta, "count(`id`)", Some("`admin`=?")),
            "SELECT count(`id`) AS _num_ FROM `users` WHERE `admin`=?"
        );
    }

    #[test]
    fn ddl() {
        assert_eq!(
            create_table(&users(), Dialect::MySql),
            "CREATE TABLE IF NOT EXISTS `users` (`id` varchar(50) NOT NULL PRIMARY KEY, \
             `email` varchar(50), `admin` boolean, `create_at` real)"
        );
        assert!(create_table(&users(), Dialect::Sqlite).contains("`admin` integer,"));
    }

    #[test]
    fn identifiers() {
        assert!(is_valid_identifier("created_at"));
        assert!(is_valid_identifier("_x1"));
        assert!(!is_valid_identifier("1x"));
        assert!(!is_valid_identifier("users;drop"));
        assert!(!is_valid_identifier(""));
    }
}

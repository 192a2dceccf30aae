use std::sync::{Arc, Mutex};

use quill_data::prelude::*;
use quill_data::{Executor, FieldKind, Row};

#[derive(Debug, Default, Clone, PartialEq)]
struct User {
    id: Option<String>,
    email: Option<String>,
    admin: Option<bool>,
    created_at: Option<f64>,
}

impl Model for User {
    fn definition() -> ModelDef {
        ModelDef::new("users")
            .field(
                FieldDescriptor::string("id")
                    .primary_key()
                    .ddl("varchar(50)")
                    .default_with(|| next_id().into()),
            )
            .field(FieldDescriptor::string("email").ddl("varchar(50)"))
            .field(FieldDescriptor::boolean("admin"))
            .field(FieldDescriptor::float("created_at").default_with(|| timestamp().into()))
    }

    quill_data::model_fields!(id, email, admin, created_at);
}

#[derive(Debug, Default)]
struct Unregistered {
    id: Option<i64>,
}

impl Model for Unregistered {
    fn definition() -> ModelDef {
        ModelDef::new("unregistered").field(FieldDescriptor::integer("id").primary_key())
    }

    quill_data::model_fields!(id);
}

type Call = (String, Vec<SqlValue>, Option<usize>);

/// Records statements and answers queries with canned rows.
#[derive(Clone, Default)]
struct Recording {
    calls: Arc<Mutex<Vec<Call>>>,
    rows: Arc<Mutex<Vec<Row>>>,
    affected: u64,
}

impl Recording {
    fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
            affected: 1,
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executor for Recording {
    async fn query(
        &self,
        sql: &str,
        args: &[SqlValue],
        limit: Option<usize>,
    ) -> Result<Vec<Row>, DataError> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec(), limit));
        let rows = self.rows.lock().unwrap().clone();
        Ok(match limit {
            Some(n) => rows.into_iter().take(n).collect(),
            None => rows,
        })
    }

    async fn execute(
        &self,
        sql: &str,
        args: &[SqlValue],
        _autocommit: bool,
    ) -> Result<u64, DataError> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec(), None));
        Ok(self.affected)
    }
}

fn orm(executor: Recording) -> Orm<Recording> {
    let registry = Registry::builder().register::<User>().unwrap().build();
    Orm::new(executor, registry)
}

fn user_row(id: &str, email: &str) -> Row {
    [
        ("id", SqlValue::from(id)),
        ("email", SqlValue::from(email)),
        ("admin", SqlValue::Int(1)),
        ("created_at", SqlValue::Float(1.5)),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_register_twice_fails() {
    let err = Registry::builder()
        .register::<User>()
        .unwrap()
        .register::<User>()
        .unwrap_err();
    assert!(matches!(err, DataError::Configuration(_)));
}

#[tokio::test]
async fn test_unregistered_model_is_configuration_error() {
    let orm = orm(Recording::default());
    let err = orm.find::<Unregistered>(1i64).await.unwrap_err();
    assert!(err.to_string().contains("not registered"));
}

#[tokio::test]
async fn test_save_resolves_defaults_in_insert_order() {
    let exec = Recording::with_rows(vec![]);
    let orm = orm(exec.clone());
    let mut user = User {
        email: Some("a@b.com".into()),
        ..Default::default()
    };

    let rows = user.save(&orm).await.unwrap();
    assert_eq!(rows, 1);

    // defaults are cached on the instance
    let id = user.id.clone().unwrap();
    assert_eq!(id.len(), 50);
    assert_eq!(user.admin, Some(false));
    assert!(user.created_at.unwrap() > 0.0);

    let calls = exec.calls();
    assert_eq!(calls.len(), 1);
    let (sql, args, _) = &calls[0];
    assert_eq!(
        sql,
        "INSERT INTO `users` (`email`, `admin`, `created_at`, `id`) VALUES (?, ?, ?, ?)"
    );
    assert_eq!(args[0], SqlValue::from("a@b.com"));
    assert_eq!(args[1], SqlValue::Bool(false));
    assert_eq!(args[3], SqlValue::from(id));
}

#[tokio::test]
async fn test_save_twice_keeps_generated_id() {
    let orm = orm(Recording::with_rows(vec![]));
    let mut user = User::default();
    user.save(&orm).await.unwrap();
    let first = user.id.clone();
    user.save(&orm).await.unwrap();
    assert_eq!(user.id, first);
}

#[tokio::test]
async fn test_save_reports_unexpected_row_count() {
    let exec = Recording {
        affected: 0,
        ..Default::default()
    };
    let orm = orm(exec);
    let mut user = User::default();
    assert_eq!(user.save(&orm).await.unwrap(), 0);
}

#[tokio::test]
async fn test_find_builds_instance_from_row() {
    let exec = Recording::with_rows(vec![user_row("u1", "a@b.com")]);
    let orm = orm(exec.clone());

    let user = User::find(&orm, "u1").await.unwrap().unwrap();
    assert_eq!(user.id.as_deref(), Some("u1"));
    assert_eq!(user.admin, Some(true));
    assert_eq!(user.created_at, Some(1.5));

    let (sql, args, limit) = &exec.calls()[0];
    assert!(sql.ends_with("FROM `users` WHERE `id`=?"));
    assert_eq!(args, &vec![SqlValue::from("u1")]);
    assert_eq!(*limit, Some(1));
}

#[tokio::test]
async fn test_find_missing_returns_none() {
    let orm = orm(Recording::with_rows(vec![]));
    assert!(User::find(&orm, "nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_all_with_filter_order_and_limit() {
    let exec = Recording::with_rows(vec![user_row("u1", "a@b.com"), user_row("u2", "c@d.com")]);
    let orm = orm(exec.clone());

    let users = User::find_all(
        &orm,
        FindAll::new()
            .filter("`admin`=?", [true])
            .order_by("`created_at` desc")
            .limit((5u64, 10u64)),
    )
    .await
    .unwrap();
    assert_eq!(users.len(), 2);

    let (sql, args, _) = &exec.calls()[0];
    assert!(sql.ends_with("WHERE `admin`=? ORDER BY `created_at` desc LIMIT ? OFFSET ?"));
    assert_eq!(
        args,
        &vec![SqlValue::Bool(true), SqlValue::Int(10), SqlValue::Int(5)]
    );
}

#[tokio::test]
async fn test_find_number() {
    let row: Row = [("_num_", SqlValue::Int(42))].into_iter().collect();
    let exec = Recording::with_rows(vec![row]);
    let orm = orm(exec.clone());

    let n = User::find_number(&orm, "count(`id`)", None, &[]).await.unwrap();
    assert_eq!(n.and_then(|v| v.as_i64()), Some(42));
    assert_eq!(exec.calls()[0].0, "SELECT count(`id`) AS _num_ FROM `users`");
}

#[tokio::test]
async fn test_find_number_null_is_none() {
    let row: Row = [("_num_", SqlValue::Null)].into_iter().collect();
    let orm = orm(Recording::with_rows(vec![row]));
    let n = User::find_number(&orm, "max(`created_at`)", None, &[])
        .await
        .unwrap();
    assert!(n.is_none());
}

#[tokio::test]
async fn test_update_uses_current_values_without_defaults() {
    let exec = Recording::with_rows(vec![]);
    let orm = orm(exec.clone());
    let user = User {
        id: Some("u1".into()),
        email: Some("new@b.com".into()),
        ..Default::default()
    };
    user.update(&orm).await.unwrap();

    let (sql, args, _) = &exec.calls()[0];
    assert_eq!(
        sql,
        "UPDATE `users` SET `email`=?, `admin`=?, `created_at`=? WHERE `id`=?"
    );
    assert_eq!(
        args,
        &vec![
            SqlValue::from("new@b.com"),
            SqlValue::TypedNull(FieldKind::Boolean),
            SqlValue::TypedNull(FieldKind::Float),
            SqlValue::from("u1"),
        ]
    );
}

#[tokio::test]
async fn test_update_without_primary_key_fails() {
    let orm = orm(Recording::default());
    let err = User::default().update(&orm).await.unwrap_err();
    assert!(matches!(err, DataError::Validation { ref field, .. } if field == "id"));
}

#[tokio::test]
async fn test_remove_by_primary_key() {
    let exec = Recording::with_rows(vec![]);
    let orm = orm(exec.clone());
    let user = User {
        id: Some("u1".into()),
        ..Default::default()
    };
    user.remove(&orm).await.unwrap();

    let (sql, args, _) = &exec.calls()[0];
    assert_eq!(sql, "DELETE FROM `users` WHERE `id`=?");
    assert_eq!(args, &vec![SqlValue::from("u1")]);
}

#[test]
fn test_set_unknown_attribute_fails() {
    let mut user = User::default();
    assert!(user.set("nickname", SqlValue::from("x")).is_err());
    assert!(user.set("admin", SqlValue::from("yes")).is_err());
    user.set("admin", SqlValue::Null).unwrap();
    assert_eq!(user.admin, None);
}

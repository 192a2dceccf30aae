#![cfg(feature = "sqlite")]

use quill_data::prelude::*;
use quill_data_sqlx::{Pool, PoolConfig};
use tempfile::TempDir;

#[derive(Debug, Default, Clone, PartialEq)]
struct Blog {
    id: Option<String>,
    name: Option<String>,
    summary: Option<String>,
    published: Option<bool>,
    created_at: Option<f64>,
}

impl Model for Blog {
    fn definition() -> ModelDef {
        ModelDef::new("blogs")
            .field(
                FieldDescriptor::string("id")
                    .primary_key()
                    .ddl("varchar(50)")
                    .default_with(|| next_id().into()),
            )
            .field(FieldDescriptor::string("name").ddl("varchar(50)"))
            .field(FieldDescriptor::string("summary").ddl("varchar(200)"))
            .field(FieldDescriptor::boolean("published").default_value(false))
            .field(FieldDescriptor::float("created_at").default_with(|| timestamp().into()))
    }

    quill_data::model_fields!(id, name, summary, published, created_at);
}

async fn sqlite_pool(dir: &TempDir) -> Pool {
    let path = dir.path().join("blog.db");
    Pool::initialize(PoolConfig::sqlite(path.to_string_lossy()).size(1, 4))
        .await
        .unwrap()
}

async fn orm(dir: &TempDir) -> Orm<Pool> {
    let registry = Registry::builder().register::<Blog>().unwrap().build();
    let orm = Orm::new(sqlite_pool(dir).await, registry);
    orm.create_table::<Blog>().await.unwrap();
    orm
}

fn blog(name: &str) -> Blog {
    Blog {
        name: Some(name.into()),
        summary: Some(format!("about {name}")),
        ..Default::default()
    }
}

async fn count(pool: &Pool) -> i64 {
    let rows = pool
        .query("SELECT count(*) AS `n` FROM `blogs`", &[], None)
        .await
        .unwrap();
    rows[0].get_as("n").unwrap()
}

#[tokio::test]
async fn test_initialize_rejects_bad_sizes() {
    let dir = TempDir::new().unwrap();
    let config = PoolConfig::sqlite(dir.path().join("x.db").to_string_lossy()).size(3, 2);
    assert!(matches!(
        Pool::initialize(config).await,
        Err(DataError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_initialize_opens_min_connections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blog.db");
    let pool = Pool::initialize(PoolConfig::sqlite(path.to_string_lossy()).size(2, 4))
        .await
        .unwrap();
    assert!(pool.size() >= 2);
    pool.close().await;
    assert!(pool.is_closed());
}

#[tokio::test]
async fn test_save_then_find() {
    let dir = TempDir::new().unwrap();
    let orm = orm(&dir).await;

    let mut b = blog("first");
    assert_eq!(orm.save(&mut b).await.unwrap(), 1);
    let id = b.id.clone().unwrap();
    assert_eq!(id.len(), 50);

    let found: Blog = orm.find(id.as_str()).await.unwrap().unwrap();
    assert_eq!(found.name.as_deref(), Some("first"));
    assert_eq!(found.published, Some(false));
    assert!(found.created_at.unwrap() > 0.0);

    assert!(orm.find::<Blog>("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_all_with_filter_order_and_limit() {
    let dir = TempDir::new().unwrap();
    let orm = orm(&dir).await;
    for (i, name) in ["a", "b", "c", "d"].into_iter().enumerate() {
        let mut b = blog(name);
        b.created_at = Some(i as f64);
        orm.save(&mut b).await.unwrap();
    }

    let page: Vec<Blog> = orm
        .find_all(FindAll::new().order_by("`created_at` desc").limit((1u64, 2u64)))
        .await
        .unwrap();
    let names: Vec<_> = page.iter().filter_map(|b| b.name.as_deref()).collect();
    assert_eq!(names, ["c", "b"]);

    let only: Vec<Blog> = orm
        .find_all(FindAll::new().filter("`name`=?", ["d"]))
        .await
        .unwrap();
    assert_eq!(only.len(), 1);
}

#[tokio::test]
async fn test_find_number() {
    let dir = TempDir::new().unwrap();
    let orm = orm(&dir).await;
    assert_eq!(
        orm.find_number::<Blog>("count(`id`)", None, &[]).await.unwrap(),
        Some(SqlValue::Int(0))
    );
    orm.save(&mut blog("x")).await.unwrap();
    orm.save(&mut blog("y")).await.unwrap();
    let n = orm
        .find_number::<Blog>("count(`id`)", Some("`name`=?"), &["x".into()])
        .await
        .unwrap();
    assert_eq!(n, Some(SqlValue::Int(1)));
    let none = orm
        .find_number::<Blog>("max(`created_at`)", Some("`name`=?"), &["zzz".into()])
        .await
        .unwrap();
    assert_eq!(none, None);
}

#[tokio::test]
async fn test_update_and_remove() {
    let dir = TempDir::new().unwrap();
    let orm = orm(&dir).await;
    let mut b = blog("draft");
    orm.save(&mut b).await.unwrap();

    b.published = Some(true);
    b.name = Some("final".into());
    assert_eq!(orm.update(&b).await.unwrap(), 1);
    let found: Blog = orm.find(b.id.clone()).await.unwrap().unwrap();
    assert_eq!(found.name.as_deref(), Some("final"));
    assert_eq!(found.published, Some(true));

    assert_eq!(orm.remove(found).await.unwrap(), 1);
    assert_eq!(orm.remove(b).await.unwrap(), 0);
    assert_eq!(count(orm.executor()).await, 0);
}

#[tokio::test]
async fn test_query_limit_caps_rows() {
    let dir = TempDir::new().unwrap();
    let orm = orm(&dir).await;
    for name in ["a", "b", "c"] {
        orm.save(&mut blog(name)).await.unwrap();
    }
    let pool = orm.executor();
    assert_eq!(pool.query("SELECT * FROM `blogs`", &[], Some(2)).await.unwrap().len(), 2);
    assert_eq!(pool.query("SELECT * FROM `blogs`", &[], None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_execute_without_autocommit_rolls_back_on_error() {
    let dir = TempDir::new().unwrap();
    let orm = orm(&dir).await;
    let mut b = blog("dup");
    orm.save(&mut b).await.unwrap();
    let pool = orm.executor();

    let insert = "INSERT INTO `blogs` (`id`, `name`) VALUES (?, ?)";
    let err = pool
        .execute(insert, &[b.id.clone().into(), "again".into()], false)
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::Database(_)));

    assert_eq!(
        pool.execute(insert, &["other".into(), "ok".into()], false)
            .await
            .unwrap(),
        1
    );
    assert_eq!(count(pool).await, 2);
}

#[tokio::test]
async fn test_transaction_commits_or_rolls_back() {
    let dir = TempDir::new().unwrap();
    let orm = orm(&dir).await;
    let pool = orm.executor();

    pool.transaction(|mut conn| {
        Box::pin(async move {
            conn.execute("INSERT INTO `blogs` (`id`, `name`) VALUES (?, ?)", &["t1".into(), "one".into()])
                .await?;
            conn.execute("INSERT INTO `blogs` (`id`, `name`) VALUES (?, ?)", &["t2".into(), "two".into()])
                .await?;
            Ok(())
        })
    })
    .await
    .unwrap();
    assert_eq!(count(pool).await, 2);

    let result: Result<(), DataError> = pool
        .transaction(|mut conn| {
            Box::pin(async move {
                conn.execute("INSERT INTO `blogs` (`id`, `name`) VALUES (?, ?)", &["t3".into(), "three".into()])
                    .await?;
                conn.execute("INSERT INTO `blogs` (`id`, `name`) VALUES (?, ?)", &["t1".into(), "dup".into()])
                    .await?;
                Ok(())
            })
        })
        .await;
    assert!(result.is_err());
    assert_eq!(count(pool).await, 2);
}

#[tokio::test]
async fn test_with_connection_returns_connection_to_pool() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blog.db");
    let pool = Pool::initialize(PoolConfig::sqlite(path.to_string_lossy()).size(1, 1))
        .await
        .unwrap();

    for _ in 0..3 {
        let rows = pool
            .with_connection(|mut conn| {
                Box::pin(async move { conn.query("SELECT 1 AS `one`", &[], None).await })
            })
            .await
            .unwrap();
        assert_eq!(rows[0].get_as::<i64>("one").unwrap(), 1);
    }

    let failed: Result<Vec<quill_data::Row>, DataError> = pool
        .with_connection(|mut conn| {
            Box::pin(async move { conn.query("SELECT * FROM `nope`", &[], None).await })
        })
        .await;
    assert!(failed.is_err());
    assert!(pool.query("SELECT 1 AS `one`", &[], None).await.is_ok());
}

#[tokio::test]
async fn test_boolean_field_reads_back() {
    let dir = TempDir::new().unwrap();
    let orm = orm(&dir).await;
    let mut b = blog("flagged");
    b.published = Some(true);
    orm.save(&mut b).await.unwrap();

    let found: Blog = orm.find(b.id.clone()).await.unwrap().unwrap();
    assert_eq!(found.published, Some(true));
    let all: Vec<Blog> = orm.find_all(FindAll::new()).await.unwrap();
    assert_eq!(all, vec![found]);
}

#[tokio::test]
async fn test_update_writes_nulls_for_unset_fields() {
    let dir = TempDir::new().unwrap();
    let orm = orm(&dir).await;
    let mut b = blog("draft");
    b.published = Some(true);
    orm.save(&mut b).await.unwrap();

    b.summary = None;
    b.published = None;
    b.created_at = None;
    assert_eq!(orm.update(&b).await.unwrap(), 1);

    let found: Blog = orm.find(b.id.clone()).await.unwrap().unwrap();
    assert_eq!(found.name.as_deref(), Some("draft"));
    assert_eq!(found.summary, None);
    assert_eq!(found.published, None);
    assert_eq!(found.created_at, None);
}

#[tokio::test]
async fn test_offset_past_i64_skips_everything() {
    let dir = TempDir::new().unwrap();
    let orm = orm(&dir).await;
    for name in ["a", "b", "c"] {
        orm.save(&mut blog(name)).await.unwrap();
    }
    let rows: Vec<Blog> = orm
        .find_all(FindAll::new().limit((u64::MAX, 10u64)))
        .await
        .unwrap();
    assert!(rows.is_empty());
    let rows: Vec<Blog> = orm.find_all(FindAll::new().limit(u64::MAX)).await.unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn test_exhausted_pool_times_out() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blog.db");
    let pool = Pool::initialize(
        PoolConfig::sqlite(path.to_string_lossy())
            .size(1, 1)
            .acquire_timeout(std::time::Duration::from_millis(200)),
    )
    .await
    .unwrap();

    let other = pool.clone();
    let waited = pool
        .with_connection(move |_conn| {
            Box::pin(async move { Ok(other.query("SELECT 1 AS `one`", &[], None).await) })
        })
        .await
        .unwrap();
    assert!(matches!(waited, Err(DataError::Database(_))));

    // the held connection went back once the closure finished
    assert!(pool.query("SELECT 1 AS `one`", &[], None).await.is_ok());
}

use quill_core::QuillConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    quill_core::init_tracing();

    let config = QuillConfig::load("dev")?;
    let addr = config.get_or("server.addr", "0.0.0.0:9000".to_string());

    let pool = quill_data_sqlx::global::init(quill_data_sqlx::PoolConfig::from_config(&config)?)
        .await?
        .clone();
    let state = quill_blog::state(pool, &config)?;

    quill_blog::app(state)?
        .with_config(config)
        .on_stop(|| async {
            quill_data_sqlx::global::close().await;
        })
        .serve(&addr)
        .await
}

use std::future::Future;
use std::pin::Pin;

use tracing::info;

use crate::config::QuillConfig;
use crate::http::Router;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type LayerFn = Box<dyn FnOnce(Router) -> Router + Send>;
type StartupHook<T> =
    Box<dyn FnOnce(T) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>> + Send>;
type ShutdownHook = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// Marker for a builder that has no application state yet.
#[derive(Clone)]
pub struct NoState;

/// Builder for assembling a Quill application.
///
/// Collects state, dispatcher routes, and router transformations, then
/// produces an `axum::Router` (or starts serving directly) with everything
/// wired together.
pub struct AppBuilder<T: Clone + Send + Sync + 'static = NoState> {
    state: T,
    config: Option<QuillConfig>,
    routes: Vec<Router<T>>,
    layers: Vec<LayerFn>,
    startup_hooks: Vec<StartupHook<T>>,
    shutdown_hooks: Vec<ShutdownHook>,
}

impl AppBuilder<NoState> {
    pub fn new() -> Self {
        Self {
            state: NoState,
            config: None,
            routes: Vec::new(),
            layers: Vec::new(),
            startup_hooks: Vec::new(),
            shutdown_hooks: Vec::new(),
        }
    }

    /// Provide the application state handed to every handler.
    ///
    /// Layers and the config set so far are kept; routes and hooks are
    /// registered after this call.
    pub fn with_state<S: Clone + Send + Sync + 'static>(self, state: S) -> AppBuilder<S> {
        AppBuilder {
            state,
            config: self.config,
            routes: Vec::new(),
            layers: self.layers,
            startup_hooks: Vec::new(),
            shutdown_hooks: self.shutdown_hooks,
        }
    }
}

impl Default for AppBuilder<NoState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> AppBuilder<T> {
    /// Keep the loaded configuration; `serve` logs its active profile.
    pub fn with_config(mut self, config: QuillConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config(&self) -> Option<&QuillConfig> {
        self.config.as_ref()
    }

    /// Apply a custom transformation to the finished router.
    ///
    /// Transformations run in registration order during `build()`.
    ///
    /// ```ignore
    /// AppBuilder::new()
    ///     .with_layer_fn(|router| router.layer(some_layer))
    /// ```
    pub fn with_layer_fn<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.layers.push(Box::new(f));
        self
    }

    /// Add tower-http request/response tracing.
    pub fn with_tracing(self) -> Self {
        self.with_layer_fn(|router| router.layer(crate::layers::default_trace()))
    }

    /// Convert handler panics into JSON 500 responses.
    pub fn with_catch_panic(self) -> Self {
        self.with_layer_fn(|router| router.layer(crate::layers::catch_panic_layer()))
    }

    /// Register a startup hook that runs before the server starts listening.
    ///
    /// ```ignore
    /// AppBuilder::new()
    ///     .with_state(state)
    ///     .on_start(|state| async move {
    ///         state.orm.create_table::<User>().await?;
    ///         Ok(())
    ///     })
    /// ```
    pub fn on_start<F, Fut>(mut self, hook: F) -> Self
    where
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.startup_hooks
            .push(Box::new(move |state| Box::pin(hook(state))));
        self
    }

    /// Register a shutdown hook that runs after the server stops.
    ///
    /// ```ignore
    /// AppBuilder::new()
    ///     .on_stop(|| async { quill_data_sqlx::global::close().await })
    /// ```
    pub fn on_stop<F, Fut>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.shutdown_hooks.push(Box::new(move || Box::pin(hook())));
        self
    }

    /// Register a router fragment, typically `Dispatcher::into_router()`.
    pub fn register_routes(mut self, router: Router<T>) -> Self {
        self.routes.push(router);
        self
    }

    /// Build the application router.
    pub fn build(self) -> Router {
        self.build_inner().0
    }

    fn build_inner(self) -> (Router, Vec<StartupHook<T>>, Vec<ShutdownHook>, T) {
        let mut router = Router::new();
        for r in self.routes {
            router = router.merge(r);
        }
        let mut app = router.with_state(self.state.clone());
        for layer_fn in self.layers {
            app = layer_fn(app);
        }
        (app, self.startup_hooks, self.shutdown_hooks, self.state)
    }

    /// Build the application and start serving on the given address.
    ///
    /// Runs startup hooks before listening, and shutdown hooks after
    /// graceful shutdown completes.
    pub async fn serve(self, addr: &str) -> Result<(), BoxError> {
        if let Some(config) = &self.config {
            info!(profile = config.profile(), "starting with profile");
        }
        let (app, startup_hooks, shutdown_hooks, state) = self.build_inner();

        for hook in startup_hooks {
            hook(state.clone()).await?;
        }

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, "Quill server listening");
        crate::http::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        for hook in shutdown_hooks {
            hook().await;
        }

        info!("Quill server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

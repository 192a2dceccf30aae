//! Route table and request-to-arguments binding.
//!
//! Each route pairs a handler with its declared [`Signature`]. Per request
//! the dispatcher binds keyword arguments from the body or query string,
//! merges path parameters, checks required names, calls the handler and
//! normalizes its [`Reply`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::{FromRequestParts, RawPathParams, State};
use axum::http::header::{CONTENT_TYPE, COOKIE, REFERER};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, MethodRouter};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{HttpError, RouteError};
use crate::http::{Request, Router};
use crate::kwargs::Kwargs;
use crate::reply::{Reply, TemplateRenderer};
use crate::signature::{Classification, Signature};

/// Largest request body the dispatcher will buffer.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
type HandlerFn<S> = Arc<dyn Fn(S, Call) -> BoxFuture<Result<Reply, HttpError>> + Send + Sync>;

/// Request data handed to handlers that declare a request parameter.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: Vec<(String, String)>,
    cookies: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(parts: &Parts, path_params: Vec<(String, String)>) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            cookies: parse_cookies(&parts.headers),
            headers: parts.headers.clone(),
            path_params,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn referer(&self) -> Option<&str> {
        self.headers.get(REFERER).and_then(|v| v.to_str().ok())
    }
}

fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for header in headers.get_all(COOKIE) {
        let Ok(header) = header.to_str() else { continue };
        for pair in header.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                cookies
                    .entry(name.trim().to_string())
                    .or_insert_with(|| value.trim().to_string());
            }
        }
    }
    cookies
}

/// Arguments of one handler invocation.
#[derive(Debug, Clone, Default)]
pub struct Call {
    kwargs: Kwargs,
    request: Option<RequestContext>,
}

impl Call {
    pub fn new(kwargs: Kwargs, request: Option<RequestContext>) -> Self {
        Self { kwargs, request }
    }

    pub fn kwargs(&self) -> &Kwargs {
        &self.kwargs
    }

    /// The request context; only present when the signature declares it.
    pub fn request(&self) -> Result<&RequestContext, HttpError> {
        self.request
            .as_ref()
            .ok_or_else(|| HttpError::Internal("handler did not declare a request parameter".into()))
    }

    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, HttpError> {
        self.kwargs.get(name)
    }

    pub fn require<T: DeserializeOwned>(&self, name: &str) -> Result<T, HttpError> {
        self.kwargs.require(name)
    }

    pub fn get_or<T: DeserializeOwned>(&self, name: &str, default: T) -> Result<T, HttpError> {
        self.kwargs.get_or(name, default)
    }

    pub fn into_parts(self) -> (Kwargs, Option<RequestContext>) {
        (self.kwargs, self.request)
    }
}

/// One registered route.
pub struct Endpoint<S> {
    method: Method,
    filter: MethodFilter,
    path: String,
    name: String,
    signature: Signature,
    classification: Classification,
    handler: HandlerFn<S>,
}

impl<S> Endpoint<S> {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }
}

/// Route table with declared handler signatures.
///
/// ```ignore
/// let routes = Dispatcher::new()
///     .get("/api/blogs/{id}", "api_get_blog", Signature::new().required("id"), get_blog)?
///     .post("/api/users", "api_register_user", Signature::new().required("email"), register)?;
/// let app = AppBuilder::new().with_state(state).register_routes(routes.into_router());
/// ```
pub struct Dispatcher<S = ()> {
    endpoints: Vec<Endpoint<S>>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
}

impl<S: Clone + Send + Sync + 'static> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Send + Sync + 'static> Dispatcher<S> {
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
            renderer: None,
        }
    }

    /// Renderer used for mapping replies that carry `__template__`.
    pub fn with_renderer(mut self, renderer: impl TemplateRenderer) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Register `handler` for `method` and `path`.
    ///
    /// The signature is analyzed here; a malformed signature or a
    /// duplicate method/path fails registration.
    pub fn route<F, Fut, R>(
        mut self,
        method: Method,
        path: &str,
        name: &str,
        signature: Signature,
        handler: F,
    ) -> Result<Self, RouteError>
    where
        F: Fn(S, Call) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HttpError>> + Send + 'static,
        R: Into<Reply> + 'static,
    {
        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| RouteError::UnsupportedMethod(method.to_string()))?;
        if self
            .endpoints
            .iter()
            .any(|ep| ep.path == path && ep.method == method)
        {
            return Err(RouteError::DuplicateRoute {
                method: method.to_string(),
                path: path.to_string(),
            });
        }
        let classification = signature.analyze(name)?;
        info!("add route {} {} => {}({})", method, path, name, signature);

        let handler: HandlerFn<S> = Arc::new(move |state: S, call: Call| -> BoxFuture<Result<Reply, HttpError>> {
            let fut = handler(state, call);
            Box::pin(async move { fut.await.map(Into::into) })
        });
        self.endpoints.push(Endpoint {
            method,
            filter,
            path: path.to_string(),
            name: name.to_string(),
            signature,
            classification,
            handler,
        });
        Ok(self)
    }

    pub fn get<F, Fut, R>(self, path: &str, name: &str, signature: Signature, handler: F) -> Result<Self, RouteError>
    where
        F: Fn(S, Call) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HttpError>> + Send + 'static,
        R: Into<Reply> + 'static,
    {
        self.route(Method::GET, path, name, signature, handler)
    }

    pub fn post<F, Fut, R>(self, path: &str, name: &str, signature: Signature, handler: F) -> Result<Self, RouteError>
    where
        F: Fn(S, Call) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HttpError>> + Send + 'static,
        R: Into<Reply> + 'static,
    {
        self.route(Method::POST, path, name, signature, handler)
    }

    pub fn endpoints(&self) -> &[Endpoint<S>] {
        &self.endpoints
    }

    /// Build the axum router. Routes sharing a path share one method router.
    pub fn into_router(self) -> Router<S> {
        let mut groups: Vec<(String, Vec<Endpoint<S>>)> = Vec::new();
        for endpoint in self.endpoints {
            match groups.iter_mut().find(|(path, _)| *path == endpoint.path) {
                Some((_, group)) => group.push(endpoint),
                None => groups.push((endpoint.path.clone(), vec![endpoint])),
            }
        }

        let mut router = Router::new();
        for (path, group) in groups {
            let mut method_router: Option<MethodRouter<S>> = None;
            for endpoint in group {
                let filter = endpoint.filter;
                let endpoint = Arc::new(endpoint);
                let renderer = self.renderer.clone();
                let handler = move |State(state): State<S>, req: Request| {
                    let endpoint = endpoint.clone();
                    let renderer = renderer.clone();
                    async move { dispatch(&endpoint, renderer.as_deref(), state, req).await }
                };
                method_router = Some(match method_router {
                    None => axum::routing::on(filter, handler),
                    Some(mr) => mr.on(filter, handler),
                });
            }
            if let Some(mr) = method_router {
                router = router.route(&path, mr);
            }
        }
        router
    }
}

async fn dispatch<S: Send + Sync>(
    endpoint: &Endpoint<S>,
    renderer: Option<&dyn TemplateRenderer>,
    state: S,
    req: Request,
) -> Response {
    let (mut parts, body) = req.into_parts();
    info!(method = %parts.method, path = %parts.uri.path(), "request");

    let path_params: Vec<(String, String)> =
        match RawPathParams::from_request_parts(&mut parts, &state).await {
            Ok(params) => params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            Err(_) => Vec::new(),
        };

    let class = &endpoint.classification;
    let body = if class.accepts_keywords() && parts.method == Method::POST {
        match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => Some(bytes),
            Err(e) => return HttpError::BadRequest(format!("Failed to read body: {e}")).into_response(),
        }
    } else {
        None
    };

    let kwargs = match bind_arguments(
        class,
        &parts.method,
        &parts.headers,
        parts.uri.query(),
        body.as_deref(),
        &path_params,
    ) {
        Ok(kwargs) => kwargs,
        Err(e) => return e.into_response(),
    };
    debug!(handler = %endpoint.name, args = ?kwargs.names().collect::<Vec<_>>(), "call with args");

    let request = class
        .has_request
        .then(|| RequestContext::new(&parts, path_params));
    match (endpoint.handler)(state, Call::new(kwargs, request)).await {
        Ok(reply) => reply.into_response_with(renderer),
        Err(e) => {
            if e.status().is_server_error() {
                error!(handler = %endpoint.name, error = %e, "handler failed");
            } else {
                debug!(handler = %endpoint.name, error = %e, "handler rejected request");
            }
            e.into_response()
        }
    }
}

/// Bind keyword arguments for one request.
///
/// 1. POST with a non-empty body, when the handler takes keywords: JSON
///    object or urlencoded form; anything else is a 400.
/// 2. GET with a query string, when the handler takes keywords: query pairs.
/// 3. Otherwise no mapping, and only path parameters are bound.
///
/// A mapping is pruned to the declared keyword names unless the handler
/// takes arbitrary keywords, then path parameters are merged over it.
/// Repeated keys keep their first value. Finally every required name must
/// be bound; the first missing one, in declaration order, is reported.
pub fn bind_arguments(
    class: &Classification,
    method: &Method,
    headers: &HeaderMap,
    query: Option<&str>,
    body: Option<&[u8]>,
    path_params: &[(String, String)],
) -> Result<Kwargs, HttpError> {
    let mut mapping = None;
    if class.accepts_keywords() {
        if *method == Method::POST {
            if let Some(body) = body.filter(|b| !b.is_empty()) {
                mapping = Some(parse_body(headers, body)?);
            }
        } else if *method == Method::GET {
            if let Some(query) = query.filter(|q| !q.is_empty()) {
                mapping = Some(parse_pairs(query.as_bytes()));
            }
        }
    }

    let kwargs = match mapping {
        None => {
            let mut kwargs = Kwargs::new();
            for (name, value) in path_params {
                kwargs.insert(name.as_str(), value.as_str());
            }
            kwargs
        }
        Some(mut kwargs) => {
            if !class.has_var_keyword && class.has_named_keywords() {
                kwargs.retain(|name| class.is_named(name));
            }
            for (name, value) in path_params {
                if kwargs.contains(name) {
                    warn!("Duplicate arg name in named arg and kw args: {name}");
                }
                kwargs.insert(name.as_str(), value.as_str());
            }
            kwargs
        }
    };

    if let Some(missing) = class.required.iter().find(|name| !kwargs.contains(name)) {
        return Err(HttpError::validation(
            missing.as_str(),
            format!("Missing argument: {missing}"),
        ));
    }
    Ok(kwargs)
}

fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<Kwargs, HttpError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| HttpError::BadRequest("Missing Content-Type.".into()))?;

    if content_type.starts_with("application/json") {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| HttpError::BadRequest(format!("Invalid JSON body: {e}")))?;
        match value {
            Value::Object(map) => Ok(Kwargs::from_map(map)),
            _ => Err(HttpError::BadRequest("JSON body must be object.".into())),
        }
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        Ok(parse_pairs(body))
    } else {
        Err(HttpError::BadRequest(format!(
            "Unsupported Content-Type: {content_type}"
        )))
    }
}

/// `a=1&b=&a=2` → `{a: "1", b: ""}`.
fn parse_pairs(input: &[u8]) -> Kwargs {
    let mut kwargs = Kwargs::new();
    for (name, value) in form_urlencoded::parse(input) {
        kwargs.insert_first(name.into_owned(), value.into_owned());
    }
    kwargs
}

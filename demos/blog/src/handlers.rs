//! JSON API of the blog.

use quill_core::prelude::*;
use quill_data::prelude::*;
use quill_security::{clear_session_cookie, session_cookie, session_user, SessionSigner};
use serde_json::{json, Value};
use tracing::info;

use crate::models::{Blog, Comment, User};
use crate::password;
use crate::state::AppState;

/// All routes of the blog API.
pub fn routes() -> Result<Dispatcher<AppState>, RouteError> {
    Dispatcher::new()
        .get("/api/users", "api_get_users", Signature::new().optional("page"), api_get_users)?
        .post(
            "/api/users",
            "api_register_user",
            Signature::new().required("email").required("name").required("passwd"),
            api_register_user,
        )?
        .post(
            "/api/authenticate",
            "authenticate",
            Signature::new().required("email").required("passwd"),
            authenticate,
        )?
        .get("/signout", "signout", Signature::new().request(), signout)?
        .get("/api/blogs", "api_blogs", Signature::new().optional("page"), api_blogs)?
        .get("/api/blogs/{id}", "api_get_blog", Signature::new().required("id"), api_get_blog)?
        .post(
            "/api/blogs",
            "api_create_blog",
            Signature::new().request().required("name").required("summary").required("content"),
            api_create_blog,
        )?
        .post(
            "/api/blogs/{id}",
            "api_update_blog",
            Signature::new()
                .request()
                .required("id")
                .required("name")
                .required("summary")
                .required("content"),
            api_update_blog,
        )?
        .post(
            "/api/blogs/{id}/delete",
            "api_delete_blog",
            Signature::new().request().required("id"),
            api_delete_blog,
        )?
        .get(
            "/api/blogs/{id}/comments",
            "api_blog_comments",
            Signature::new().required("id"),
            api_blog_comments,
        )?
        .post(
            "/api/blogs/{id}/comments",
            "api_create_comment",
            Signature::new().request().required("id").required("content"),
            api_create_comment,
        )?
        .post(
            "/api/comments/{id}/delete",
            "api_delete_comment",
            Signature::new().request().required("id"),
            api_delete_comment,
        )
}

/// 1-based page index; anything unparsable or below 1 is page 1.
fn page_index(call: &Call) -> u64 {
    call.get::<u64>("page").ok().flatten().unwrap_or(1).max(1)
}

fn non_empty(call: &Call, name: &str) -> Result<String, HttpError> {
    let value: String = call.require(name)?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::value_invalid(name, format!("{name} cannot be empty.")).into());
    }
    Ok(value.to_string())
}

/// The signed-in user, if the session cookie is valid and the user exists.
async fn current_user(state: &AppState, call: &Call) -> Result<Option<User>, HttpError> {
    let Some(user_id) = session_user(call.request()?, &state.session, state.signer.as_ref()) else {
        return Ok(None);
    };
    Ok(state.orm.find::<User>(user_id).await?)
}

async fn require_user(state: &AppState, call: &Call) -> Result<User, HttpError> {
    current_user(state, call)
        .await?
        .ok_or_else(|| ApiError::permission_forbidden("Please sign in first.").into())
}

async fn require_admin(state: &AppState, call: &Call) -> Result<User, HttpError> {
    let user = require_user(state, call).await?;
    if !user.is_admin() {
        return Err(ApiError::permission_forbidden("Administrator only.").into());
    }
    Ok(user)
}

fn signed_in(state: &AppState, user: &User, reply: Reply) -> Result<Reply, HttpError> {
    let id = user
        .id
        .as_deref()
        .ok_or_else(|| HttpError::Internal("user has no id".into()))?;
    let max_age = state.session.max_age_secs;
    let token = state.signer.issue(id, max_age);
    Ok(reply.with_cookie(session_cookie(&state.session.cookie_name, &token, max_age)))
}

/// Count with `find_number`, then fetch one page with `find_all`.
async fn paged<T: Model + serde::Serialize>(
    state: &AppState,
    index: u64,
    query: FindAll,
    filter: Option<(&str, Vec<SqlValue>)>,
) -> Result<Paged<T>, HttpError> {
    let (where_clause, args): (Option<&str>, &[SqlValue]) = match &filter {
        Some((clause, args)) => (Some(*clause), args),
        None => (None, &[]),
    };
    let count = state
        .orm
        .find_number::<T>("count(`id`)", where_clause, args)
        .await?
        .and_then(|v| v.as_i64())
        .unwrap_or(0);
    let page = Page::new(count.max(0) as u64, index, Page::DEFAULT_SIZE);
    if page.is_empty() {
        return Ok(Paged::empty(page));
    }
    let mut query = query.limit(page.to_limit());
    if let Some((clause, args)) = filter {
        query = query.filter(clause, args);
    }
    let items = state.orm.find_all::<T>(query).await?;
    Ok(Paged::new(page, items))
}

async fn api_get_users(state: AppState, call: Call) -> Result<Reply, HttpError> {
    let paged = paged::<User>(
        &state,
        page_index(&call),
        FindAll::new().order_by("`created_at` desc"),
        None,
    )
    .await?;
    let users: Vec<User> = paged.items.iter().map(User::public).collect();
    Reply::json(json!({ "page": paged.page, "users": users }))
}

async fn api_register_user(state: AppState, call: Call) -> Result<Reply, HttpError> {
    let name = non_empty(&call, "name")?;
    let email = non_empty(&call, "email")?.to_lowercase();
    let passwd = non_empty(&call, "passwd")?;
    if !looks_like_email(&email) {
        return Err(ApiError::value_invalid("email", "Invalid email.").into());
    }
    let existing: Vec<User> = state
        .orm
        .find_all(FindAll::new().filter("`email`=?", [email.as_str()]))
        .await?;
    if !existing.is_empty() {
        return Err(ApiError::new("register:failed", "email", "Email is already in use.").into());
    }

    let mut user = User {
        passwd: Some(password::hash(&passwd).await?),
        id: Some(next_id()),
        email: Some(email),
        name: Some(name),
        image: Some("about:blank".to_string()),
        ..Default::default()
    };
    state.orm.save(&mut user).await?;
    info!(email = ?user.email, "user registered");
    signed_in(&state, &user, Reply::json(user.public())?)
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    }
}

async fn authenticate(state: AppState, call: Call) -> Result<Reply, HttpError> {
    let email = non_empty(&call, "email")?.to_lowercase();
    let passwd = non_empty(&call, "passwd")?;
    let users: Vec<User> = state
        .orm
        .find_all(FindAll::new().filter("`email`=?", [email.as_str()]).limit(1u64))
        .await?;
    let Some(user) = users.into_iter().next() else {
        return Err(ApiError::value_invalid("email", "Email not exist.").into());
    };
    let stored = user.passwd.as_deref().unwrap_or_default();
    if !password::verify(stored, &passwd).await {
        return Err(ApiError::value_invalid("passwd", "Invalid password.").into());
    }
    signed_in(&state, &user, Reply::json(user.public())?)
}

async fn signout(state: AppState, call: Call) -> Result<Reply, HttpError> {
    let back = call.request()?.referer().unwrap_or("/").to_string();
    Ok(Reply::redirect(back).with_cookie(clear_session_cookie(&state.session.cookie_name)))
}

async fn api_blogs(state: AppState, call: Call) -> Result<Reply, HttpError> {
    let paged = paged::<Blog>(
        &state,
        page_index(&call),
        FindAll::new().order_by("`created_at` desc"),
        None,
    )
    .await?;
    Reply::json(json!({ "page": paged.page, "blogs": paged.items }))
}

async fn find_blog(state: &AppState, id: String) -> Result<Blog, HttpError> {
    state
        .orm
        .find::<Blog>(id)
        .await?
        .ok_or_else(|| ApiError::value_not_found("Blog", "Blog not found.").into())
}

async fn api_get_blog(state: AppState, call: Call) -> Result<Reply, HttpError> {
    let blog = find_blog(&state, call.require("id")?).await?;
    Reply::json(blog)
}

async fn api_create_blog(state: AppState, call: Call) -> Result<Reply, HttpError> {
    let user = require_admin(&state, &call).await?;
    let mut blog = Blog {
        user_id: user.id.clone(),
        user_name: user.name.clone(),
        user_image: user.image.clone(),
        name: Some(non_empty(&call, "name")?),
        summary: Some(non_empty(&call, "summary")?),
        content: Some(non_empty(&call, "content")?),
        ..Default::default()
    };
    state.orm.save(&mut blog).await?;
    Reply::json(blog)
}

async fn api_update_blog(state: AppState, call: Call) -> Result<Reply, HttpError> {
    require_admin(&state, &call).await?;
    let mut blog = find_blog(&state, call.require("id")?).await?;
    blog.name = Some(non_empty(&call, "name")?);
    blog.summary = Some(non_empty(&call, "summary")?);
    blog.content = Some(non_empty(&call, "content")?);
    state.orm.update(&blog).await?;
    Reply::json(blog)
}

async fn api_delete_blog(state: AppState, call: Call) -> Result<Reply, HttpError> {
    require_admin(&state, &call).await?;
    let blog = find_blog(&state, call.require("id")?).await?;
    let id = blog.id.clone();
    state.orm.remove(blog).await?;
    Ok(Reply::Mapping(object(json!({ "id": id }))))
}

async fn api_blog_comments(state: AppState, call: Call) -> Result<Reply, HttpError> {
    let blog_id: String = call.require("id")?;
    let comments: Vec<Comment> = state
        .orm
        .find_all(
            FindAll::new()
                .filter("`blog_id`=?", [blog_id])
                .order_by("`created_at` desc"),
        )
        .await?;
    Reply::json(json!({ "comments": comments }))
}

async fn api_create_comment(state: AppState, call: Call) -> Result<Reply, HttpError> {
    let user = require_user(&state, &call).await?;
    let blog = find_blog(&state, call.require("id")?).await?;
    let mut comment = Comment {
        blog_id: blog.id,
        user_id: user.id,
        user_name: user.name,
        user_image: user.image,
        content: Some(non_empty(&call, "content")?),
        ..Default::default()
    };
    state.orm.save(&mut comment).await?;
    Reply::json(comment)
}

async fn api_delete_comment(state: AppState, call: Call) -> Result<Reply, HttpError> {
    require_admin(&state, &call).await?;
    let id: String = call.require("id")?;
    let comment = state
        .orm
        .find::<Comment>(id.as_str())
        .await?
        .ok_or_else(|| HttpError::from(ApiError::value_not_found("Comment", "Comment not found.")))?;
    state.orm.remove(comment).await?;
    Ok(Reply::Mapping(object(json!({ "id": id }))))
}

fn object(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

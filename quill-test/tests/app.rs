use quill_core::prelude::*;
use quill_test::{json_at, TestApp};
use serde_json::{json, Map, Value};

#[test]
fn test_json_at_fields_and_indexes() {
    let v = json!({"page": {"page_index": 2}, "blogs": [{"name": "a", "tags": ["x", "y"]}]});
    assert_eq!(json_at(&v, "page.page_index"), json!(2));
    assert_eq!(json_at(&v, "blogs[0].name"), json!("a"));
    assert_eq!(json_at(&v, "blogs[0].tags[1]"), json!("y"));
    assert_eq!(json_at(&v, "blogs[3].name"), Value::Null);
    assert_eq!(json_at(&v, "missing.deeper"), Value::Null);
}

#[test]
fn test_json_at_len() {
    let v = json!({"blogs": [1, 2, 3], "page": {"a": 1}, "name": "abc"});
    assert_eq!(json_at(&v, "blogs.len()"), json!(3));
    assert_eq!(json_at(&v, "page.len()"), json!(2));
    assert_eq!(json_at(&v, "name.len()"), json!(3));
}

async fn echo(_: (), call: Call) -> Result<Reply, HttpError> {
    Ok(Reply::Mapping(call.kwargs().clone().into_map()))
}

async fn signin(_: (), call: Call) -> Result<Reply, HttpError> {
    let email: String = call.require("email")?;
    if email != "a@b.com" {
        return Err(ApiError::value_invalid("email", "Invalid email.").into());
    }
    let back = call.request()?.referer().unwrap_or("/").to_string();
    Ok(Reply::redirect(back).with_cookie("session=tok; Path=/; HttpOnly"))
}

async fn whoami(_: (), call: Call) -> Result<Reply, HttpError> {
    let mut map = Map::new();
    let session = call.request()?.cookie("session").map(str::to_string);
    map.insert("session".into(), Value::from(session));
    Ok(Reply::Mapping(map))
}

fn app() -> TestApp {
    let routes = Dispatcher::new()
        .post("/echo", "echo", Signature::new().var_keyword("kw"), echo)
        .unwrap()
        .post(
            "/api/authenticate",
            "signin",
            Signature::new().request().required("email"),
            signin,
        )
        .unwrap()
        .get("/whoami", "whoami", Signature::new().request(), whoami)
        .unwrap();
    TestApp::from_builder(AppBuilder::new().with_state(()).register_routes(routes.into_router()))
}

#[tokio::test]
async fn test_form_body_is_encoded() {
    app()
        .post("/echo")
        .form(&[("name", "Test Blog"), ("summary", "a&b")])
        .send()
        .await
        .assert_ok()
        .assert_content_type("application/json")
        .assert_json_path("name", "Test Blog")
        .assert_json_path("summary", "a&b");
}

#[tokio::test]
async fn test_json_body() {
    let resp = app()
        .post("/echo")
        .json(&json!({"page": 3}))
        .send()
        .await
        .assert_ok();
    let page: u64 = resp.json_path("page");
    assert_eq!(page, 3);
}

#[tokio::test]
async fn test_redirect_and_set_cookie() {
    let resp = app()
        .post("/api/authenticate")
        .referer("/blog/1")
        .form(&[("email", "a@b.com")])
        .send()
        .await
        .assert_redirect("/blog/1");
    assert_eq!(resp.set_cookie("session").as_deref(), Some("tok"));
    assert_eq!(resp.set_cookie("other"), None);
}

#[tokio::test]
async fn test_api_error_shape() {
    app()
        .post("/api/authenticate")
        .form(&[("email", "x@y.com")])
        .send()
        .await
        .assert_bad_request()
        .assert_api_error("value:invalid", "email")
        .assert_json_path("message", "Invalid email.");
}

#[tokio::test]
async fn test_cookies_are_sent() {
    app()
        .get("/whoami")
        .cookie("theme", "dark")
        .cookie("session", "abc")
        .send()
        .await
        .assert_ok()
        .assert_json_path("session", "abc");
}

use quill_core::{QuillConfig, RequestContext};
use quill_security::{
    session_cookie, session_user, HmacSessionSigner, SessionConfig, SessionSigner,
};

fn request_with_cookie(cookie: Option<&str>) -> RequestContext {
    let mut builder = http::Request::builder().uri("/manage/blogs");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    let (parts, _) = builder.body(()).unwrap().into_parts();
    RequestContext::new(&parts, Vec::new())
}

fn config() -> SessionConfig {
    SessionConfig::new("awesome").with_cookie_name("awesession")
}

#[test]
fn signed_in_user_is_read_from_cookie() {
    let config = config();
    let signer = HmacSessionSigner::from_config(&config).unwrap();
    let token = signer.issue("001492", config.max_age_secs);
    let request = request_with_cookie(Some(&format!("theme=dark; awesession={token}")));
    assert_eq!(
        session_user(&request, &config, &signer).as_deref(),
        Some("001492")
    );
}

#[test]
fn missing_or_forged_cookie_is_anonymous() {
    let config = config();
    let signer = HmacSessionSigner::from_config(&config).unwrap();
    assert_eq!(session_user(&request_with_cookie(None), &config, &signer), None);

    let forged = HmacSessionSigner::new("guess").unwrap().issue("001492", 60);
    let request = request_with_cookie(Some(&format!("awesession={forged}")));
    assert_eq!(session_user(&request, &config, &signer), None);
}

#[test]
fn cookie_round_trips_through_header_value() {
    let signer = HmacSessionSigner::new("awesome").unwrap();
    let token = signer.issue("001492", 3600);
    let cookie = session_cookie("awesession", &token, 3600);
    assert!(cookie.contains("HttpOnly"));
    let pair = cookie.split(';').next().unwrap();
    let request = request_with_cookie(Some(pair));
    assert_eq!(
        session_user(&request, &config(), &signer).as_deref(),
        Some("001492")
    );
}

#[test]
fn config_from_yaml() {
    let app = QuillConfig::from_yaml_str(
        "security:\n  session:\n    secret: s3cret\n    max_age_secs: 600\n",
        "test",
    )
    .unwrap();
    let session = SessionConfig::from_config(&app).unwrap();
    assert_eq!(session.secret, "s3cret");
    assert_eq!(session.max_age_secs, 600);
    assert_eq!(session.cookie_name, SessionConfig::DEFAULT_COOKIE_NAME);
    assert!(!format!("{session:?}").contains("s3cret"));
}

#[test]
fn config_requires_secret() {
    assert!(SessionConfig::from_config(&QuillConfig::empty()).is_err());
}

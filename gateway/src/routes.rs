//! HTTP route handlers: signup/login/check, `/home`, and the authenticated `/user_news`
//! CRUD surface.
//!
//! Grounded on `original_source/back/app/apiService/internal/server/handler/{authHandlers,
//! newsHandlers,routes}.go`: every status code below (204/205/206/208/403/405/...) is
//! transcribed from that file's `switch errors.Is(...)` ladders, not invented here. Transport
//! status always stays at Rocket's default 200 — see `envelope.rs`'s module doc for why.

use std::future::Future;
use std::time::Duration;

use common::{AppError, ErrorKind};
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, routes, Route, State};
use serde::Deserialize;
use tracing::debug;

use crate::envelope::{self, Envelope};
use crate::identity::{refresh_cookie, Identity, OptionalIdentity, RequestHost};
use crate::models::Article;
use crate::state::AppState;

/// Give every handler its own per-request deadline context, mirroring
/// `context.WithTimeout(context.Background(), timeout)` at the top of each original Go handler.
/// A timed-out call collapses into the same generic `Internal` error every handler below already
/// falls back to on an unrecognized `AppError` kind.
async fn with_deadline<T, F>(timeout: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .unwrap_or_else(|_| Err(AppError::new(ErrorKind::Internal, "request deadline exceeded")))
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    name: String,
    email: String,
    password: String,
}

#[post("/signup", data = "<body>")]
async fn signup(state: &State<AppState>, body: Json<SignupRequest>) -> Envelope {
    match with_deadline(state.request_timeout, state.auth.save_user(&body.name, &body.email, &body.password)).await {
        Ok(_) => envelope::created(),
        Err(e) if e.kind == ErrorKind::UserExists => envelope::error(204, "User already exists"),
        Err(e) if e.kind == ErrorKind::InvalidValue => envelope::error(400, "Invalid value"),
        Err(e) => {
            debug!(%e, "signup failed");
            envelope::error(500, "Internal error")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[post("/login", data = "<body>")]
async fn login(
    state: &State<AppState>,
    body: Json<LoginRequest>,
    host: RequestHost,
    cookies: &rocket::http::CookieJar<'_>,
) -> Envelope {
    match with_deadline(state.request_timeout, state.auth.login_user(&body.email, &body.password)).await {
        Ok(logged_in) => {
            cookies.add(refresh_cookie(logged_in.refresh_token, state.refresh_ttl, host.0));
            envelope::login_success(logged_in.access_token)
        }
        Err(e) if e.kind == ErrorKind::UserDoesntExists => envelope::error(204, "Wrong e-mail or password"),
        Err(e) if e.kind == ErrorKind::InvalidValue => envelope::error(400, "Invalid value"),
        Err(e) => {
            debug!(%e, "login failed");
            envelope::error(500, "Internal error")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckEmailRequest {
    email: String,
}

#[post("/check/email", data = "<body>")]
async fn check_email(state: &State<AppState>, body: Json<CheckEmailRequest>) -> Envelope {
    match with_deadline(state.request_timeout, state.auth.check_email(&body.email)).await {
        Ok(exists) => envelope::exists(200, exists),
        Err(e) => {
            debug!(%e, "check_email failed");
            envelope::error(500, "Internal error")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckUserNameRequest {
    user_name: String,
}

#[post("/check/user_name", data = "<body>")]
async fn check_user_name(state: &State<AppState>, body: Json<CheckUserNameRequest>) -> Envelope {
    match with_deadline(state.request_timeout, state.auth.check_user_name(&body.user_name)).await {
        Ok(exists) => envelope::exists(200, exists),
        Err(e) => {
            debug!(%e, "check_user_name failed");
            envelope::error(500, "Internal error")
        }
    }
}

/// `GET /home?page=N`. Personalizes the response with whatever identity the `refresh` fairing
/// already attached, but never requires one — matching `home()`'s `getInfoFromCtx` call, which
/// tolerates a zero user id.
#[get("/home?<page>")]
async fn home(state: &State<AppState>, identity: OptionalIdentity, page: Option<i64>) -> Envelope {
    let Some(page) = page else {
        return envelope::error_with_identity(400, &identity, "Bad request");
    };

    match with_deadline(state.request_timeout, state.feed_fetcher.fetch_articles_on_page(page)).await {
        Ok(articles) => envelope::articles(200, &identity, articles),
        Err(e) if e.kind == ErrorKind::NoPublishedArticles => {
            envelope::error_with_identity(204, &identity, "There are no articles")
        }
        Err(e) => {
            debug!(%e, "home: fetch failed");
            envelope::error_with_identity(500, &identity, "Internal server error")
        }
    }
}

/// `GET /user_news`: the caller's own un-posted articles, newest first.
#[get("/user_news")]
async fn user_articles(state: &State<AppState>, identity: Identity) -> Envelope {
    let articles = match with_deadline(state.request_timeout, state.news.get_articles_by_uid(identity.user_id)).await {
        Ok(articles) => articles,
        Err(e) => {
            debug!(%e, "user_articles: fetch failed");
            Vec::new()
        }
    };

    let status = if articles.is_empty() { 204 } else { 200 };
    envelope::authenticated_articles(status, &identity, articles)
}

#[derive(Debug, Deserialize)]
pub struct AddArticleRequest {
    link: String,
    #[allow(dead_code)]
    #[serde(default)]
    content: String,
}

/// `POST /user_news`: submit a link for extraction, synchronously, via news-service.
#[post("/user_news", data = "<body>")]
async fn add_article(state: &State<AppState>, identity: Identity, body: Json<AddArticleRequest>) -> Envelope {
    match with_deadline(state.request_timeout, state.news.save_article(identity.user_id, &body.link)).await {
        Ok(articles) => status_and_articles(articles, 201, 205, &identity),
        Err(e) => match e.kind {
            ErrorKind::ArticleSkipped => envelope::authenticated_articles(204, &identity, Vec::new()),
            ErrorKind::ArticleExists => envelope::authenticated_articles(206, &identity, Vec::new()),
            ErrorKind::NoOfferedArticles => envelope::authenticated_articles(205, &identity, Vec::new()),
            ErrorKind::InvalidUrl => envelope::authenticated_articles(405, &identity, Vec::new()),
            _ => {
                debug!(%e, "add_article failed");
                envelope::authenticated_articles(500, &identity, Vec::new())
            }
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateArticleRequest {
    article_id: i64,
    link: String,
}

/// `PUT /user_news`: replace the link of one of the caller's own un-posted articles.
#[put("/user_news", data = "<body>")]
async fn update_article(state: &State<AppState>, identity: Identity, body: Json<UpdateArticleRequest>) -> Envelope {
    match with_deadline(
        state.request_timeout,
        state.news.update_article(identity.user_id, body.article_id, &body.link),
    )
    .await
    {
        Ok(articles) => status_and_articles(articles, 202, 205, &identity),
        Err(e) => match e.kind {
            ErrorKind::ArticleSkipped => envelope::authenticated_articles(204, &identity, Vec::new()),
            ErrorKind::ArticleExists => envelope::authenticated_articles(206, &identity, Vec::new()),
            ErrorKind::NoOfferedArticles => envelope::authenticated_articles(205, &identity, Vec::new()),
            ErrorKind::ArticleNotAvailable => envelope::authenticated_articles(403, &identity, Vec::new()),
            ErrorKind::InvalidUrl => envelope::authenticated_articles(405, &identity, Vec::new()),
            _ => {
                debug!(%e, "update_article failed");
                envelope::authenticated_articles(500, &identity, Vec::new())
            }
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteArticleRequest {
    article_id: i64,
}

/// `DELETE /user_news`: remove one of the caller's own un-posted articles.
#[delete("/user_news", data = "<body>")]
async fn delete_article(state: &State<AppState>, identity: Identity, body: Json<DeleteArticleRequest>) -> Envelope {
    match with_deadline(state.request_timeout, state.news.delete_article(identity.user_id, body.article_id)).await {
        Ok(articles) => status_and_articles(articles, 200, 205, &identity),
        Err(e) => match e.kind {
            ErrorKind::NoOfferedArticles => envelope::authenticated_articles(204, &identity, Vec::new()),
            ErrorKind::ArticleNotAvailable => envelope::authenticated_articles(208, &identity, Vec::new()),
            _ => {
                debug!(%e, "delete_article failed");
                envelope::error_with_identity(205, &OptionalIdentity(Some(identity)), "Internal error")
            }
        },
    }
}

/// Shared "success, but the caller's list came back empty" fallback used by every mutation
/// route: an empty article list on the success path is itself reported as `empty_status`,
/// mirroring each Go handler's trailing `if len(arts) == 0 { ... }` check.
fn status_and_articles(articles: Vec<Article>, ok_status: u16, empty_status: u16, identity: &Identity) -> Envelope {
    if articles.is_empty() {
        envelope::authenticated_articles(empty_status, identity, articles)
    } else {
        envelope::authenticated_articles(ok_status, identity, articles)
    }
}

/// 404 catcher: the `Identity` guard rejects with 404 when `Authorization` is entirely absent,
/// matching `authenticate()`'s "Empty Authorization" branch.
#[rocket::catch(404)]
fn missing_authorization(req: &rocket::Request) -> Envelope {
    let message = crate::identity::take_error(req)
        .map(|e| e.message)
        .unwrap_or_else(|| "Not found".to_string());
    envelope::error(404, message)
}

/// 401 catcher: the `Identity` guard rejects with 401 when the bearer token fails to parse,
/// matching `authenticate()`'s "Authorization expired" branch.
#[rocket::catch(401)]
fn authorization_expired(req: &rocket::Request) -> Envelope {
    let message = crate::identity::take_error(req)
        .map(|e| e.message)
        .unwrap_or_else(|| "Authorization expired".to_string());
    envelope::error(401, message)
}

#[rocket::catch(500)]
fn internal_error() -> Envelope {
    envelope::error(500, "Internal server error")
}

pub fn routes() -> Vec<Route> {
    routes![
        signup,
        login,
        check_email,
        check_user_name,
        home,
        user_articles,
        add_article,
        update_article,
        delete_article,
    ]
}

pub fn catchers() -> Vec<rocket::Catcher> {
    rocket::catchers![missing_authorization, authorization_expired, internal_error]
}

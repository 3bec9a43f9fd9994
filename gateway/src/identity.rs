//! Request-scoped identity, attached by the outer `refresh` fairing and consumed by the
//! `authenticate` request guard — the re-architected replacement for the reference
//! implementation's `r.Header.Set("uid", ...)` identity-bag pattern (see SPEC_FULL.md §9).
//!
//! Grounded on `original_source/back/app/apiService/internal/server/handler/middleware.go`'s
//! two-layer `refresh`/`authenticate` shape, re-targeted at Rocket's request-local cache and
//! fairing/guard machinery instead of header mutation.

use std::cell::RefCell;
use std::time::Duration;

use common::{AppError, ErrorKind};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Cookie, SameSite, Status};
use rocket::request::{FromRequest, Outcome};
use rocket::time::{Duration as TimeDuration, OffsetDateTime};
use rocket::{Data, Request};
use tracing::debug;

use crate::state::AppState;

/// The user identity a request is acting as, once `refresh` or `authenticate` has recovered it
/// from a bearer token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i64,
    pub user_name: String,
    pub access_token: String,
}

/// Split an `Authorization` header into its bearer token, rejecting anything that isn't
/// exactly `"Bearer <token>"` — the one validation step that used to live inside
/// `AuthCore::parse` on the monolith's single-process header, now performed at the HTTP
/// boundary since the gRPC `Parse` call takes the raw token, not the header.
fn bearer_token(header: &str) -> Result<&str, AppError> {
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default();
    if scheme != "Bearer" || token.is_empty() {
        return Err(AppError::new(ErrorKind::InvalidToken, "invalid Authorization header"));
    }
    Ok(token)
}

fn attach_identity(req: &Request<'_>, identity: Identity) {
    req.local_cache(|| RefCell::new(None::<Identity>)).replace(Some(identity));
}

fn read_identity(req: &Request<'_>) -> Option<Identity> {
    req.local_cache(|| RefCell::new(None::<Identity>)).borrow().clone()
}

/// Stashed by a failing `authenticate` guard so the 404/401 catchers can still report the
/// specific reason, even though Rocket catchers don't receive the guard's `Error` payload.
pub fn attach_error(req: &Request<'_>, err: AppError) {
    req.local_cache(|| RefCell::new(None::<AppError>)).replace(Some(err));
}

pub fn take_error(req: &Request<'_>) -> Option<AppError> {
    req.local_cache(|| RefCell::new(None::<AppError>)).borrow().clone()
}

/// The request's `Host` header, exposed as its own guard so both the `refresh` fairing and the
/// `/login` route can set the refresh cookie's `Domain` attribute identically.
pub struct RequestHost(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequestHost {
    type Error = std::convert::Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(RequestHost(req.host().map(|h| h.to_string())))
    }
}

pub fn refresh_cookie(refresh_token: String, ttl: Duration, domain: Option<String>) -> Cookie<'static> {
    let mut cookie = Cookie::new("refresh_token", refresh_token);
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    if let Some(domain) = domain {
        cookie.set_domain(domain);
    }
    cookie.set_expires(OffsetDateTime::now_utc() + TimeDuration::seconds(ttl.as_secs() as i64));
    cookie
}

/// The outer, never-blocking middleware layer. Runs on every request; if the `Authorization`
/// header carries an expired access token and a valid `refresh_token` cookie is present, it
/// transparently mints a fresh pair and attaches the refreshed identity, so that a route-local
/// `authenticate` guard running afterwards sees a live session without the client round-tripping
/// through `/login`.
pub struct RefreshFairing;

#[rocket::async_trait]
impl Fairing for RefreshFairing {
    fn info(&self) -> Info {
        Info {
            name: "refresh token middleware",
            kind: Kind::Request,
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let Some(state) = req.rocket().state::<AppState>() else {
            return;
        };

        let Some(header) = req.headers().get_one("Authorization").map(|h| h.to_string()) else {
            debug!("refresh middleware: no Authorization header, passing through");
            return;
        };

        let token = match bearer_token(&header) {
            Ok(t) => t.to_string(),
            Err(_) => return,
        };

        match state.auth.parse(&token).await {
            Ok((user_id, user_name)) => {
                attach_identity(
                    req,
                    Identity {
                        user_id,
                        user_name,
                        access_token: token,
                    },
                );
            }
            Err(e) if e.kind == ErrorKind::TokenExpired => {
                let Some(refresh_token) = req.cookies().get("refresh_token").map(|c| c.value().to_string()) else {
                    debug!("refresh middleware: access token expired, no refresh cookie");
                    return;
                };

                match state.auth.refresh(&refresh_token).await {
                    Ok(logged_in) => {
                        let domain = req.host().map(|h| h.to_string());
                        req.cookies()
                            .add(refresh_cookie(logged_in.refresh_token, state.refresh_ttl, domain));
                        attach_identity(
                            req,
                            Identity {
                                user_id: logged_in.user_id,
                                user_name: logged_in.user_name,
                                access_token: logged_in.access_token,
                            },
                        );
                    }
                    Err(e) => debug!(%e, "refresh middleware: refresh attempt failed"),
                }
            }
            Err(e) => debug!(%e, "refresh middleware: token not refreshable"),
        }
    }
}

/// Whatever identity the `refresh` fairing managed to attach, or none — used by `/home`, which
/// personalizes its response when a caller happens to carry a valid session but never requires
/// one.
pub struct OptionalIdentity(pub Option<Identity>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for OptionalIdentity {
    type Error = std::convert::Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(OptionalIdentity(read_identity(req)))
    }
}

/// The route-local, blocking layer: requires an identity already attached by `refresh`, or
/// parses the `Authorization` header directly if the fairing hasn't run or didn't attach one.
/// Absence of any usable header is a 404 ("Empty Authorization"); a header that fails to parse
/// is a 401 ("Authorization expired") — both mirroring
/// `original_source/.../middleware.go`'s `authenticate` responses exactly, just carried via a
/// stashed `AppError` instead of a direct response write.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for Identity {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        if let Some(identity) = read_identity(req) {
            return Outcome::Success(identity);
        }

        let Some(state) = req.rocket().state::<AppState>() else {
            attach_error(req, AppError::new(ErrorKind::Internal, "gateway state unavailable"));
            return Outcome::Error((Status::InternalServerError, ()));
        };

        let Some(header) = req.headers().get_one("Authorization") else {
            attach_error(req, AppError::new(ErrorKind::InvalidToken, "Empty Authorization"));
            return Outcome::Error((Status::NotFound, ()));
        };

        let token = match bearer_token(header) {
            Ok(t) => t,
            Err(e) => {
                attach_error(req, e);
                return Outcome::Error((Status::Unauthorized, ()));
            }
        };

        match state.auth.parse(token).await {
            Ok((user_id, user_name)) => {
                let identity = Identity {
                    user_id,
                    user_name,
                    access_token: token.to_string(),
                };
                attach_identity(req, identity.clone());
                Outcome::Success(identity)
            }
            Err(e) => {
                attach_error(req, e);
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

//! The JSON response envelope shared by every HTTP endpoint: `{"status": <code>, "body": {...}}`.
//!
//! Grounded on `original_source/back/app/apiService/internal/server/handler/response.go`: the
//! reference never calls the transport status-setter on the success or soft-error paths, so the
//! transport-level HTTP status stays at its default (200) while the semantic result code rides
//! in `body.status`. `rocket::serde::json::Json`'s default `Responder` already answers with 200
//! unless wrapped in a `(Status, _)` tuple, so simply returning `Json<Envelope>` reproduces that
//! behavior for free — see DESIGN.md's Open Question decision on this.

use rocket::serde::json::Json;
use serde::Serialize;

use crate::identity::{Identity, OptionalIdentity};
use crate::models::Article;

#[derive(Debug, Default, Serialize)]
pub struct Body {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub articles: Option<Vec<Article>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
}

impl Body {
    fn with_identity(identity: Option<&Identity>) -> Self {
        Self {
            uid: identity.map(|i| i.user_id),
            user_name: identity.map(|i| i.user_name.clone()),
            access_token: identity.map(|i| i.access_token.clone()),
            ..Default::default()
        }
    }
}

pub type Envelope = Json<EnvelopeBody>;

#[derive(Debug, Serialize)]
pub struct EnvelopeBody {
    pub status: u16,
    pub body: Body,
}

/// Build a success envelope carrying a list of articles, optionally annotated with whatever
/// identity the `refresh` middleware attached to the request (zero values if none).
pub fn articles(status: u16, identity: &OptionalIdentity, articles: Vec<Article>) -> Envelope {
    let mut body = Body::with_identity(identity.0.as_ref());
    body.articles = non_empty(articles);
    Json(EnvelopeBody { status, body })
}

/// `None` for an empty list, mirroring the reference's `omitempty` slice tag — an empty
/// `"articles":[]` and a missing `articles` key mean the same thing to every client, so we
/// drop the key rather than serialize a list nobody needed the shape of.
fn non_empty(articles: Vec<Article>) -> Option<Vec<Article>> {
    if articles.is_empty() {
        None
    } else {
        Some(articles)
    }
}

/// Build an envelope carrying only identity fields (no articles), used by `/home` error paths
/// and the user-article mutation endpoints when there is nothing else to report.
pub fn identity_only(status: u16, identity: &OptionalIdentity) -> Envelope {
    Json(EnvelopeBody {
        status,
        body: Body::with_identity(identity.0.as_ref()),
    })
}

/// Build an envelope carrying an authenticated identity plus its updated article list.
pub fn authenticated_articles(status: u16, identity: &Identity, articles: Vec<Article>) -> Envelope {
    let mut body = Body::with_identity(Some(identity));
    body.articles = non_empty(articles);
    Json(EnvelopeBody { status, body })
}

/// Build a bare error envelope: no identity, just a message (signup/login/check endpoints).
pub fn error(status: u16, message: impl Into<String>) -> Envelope {
    Json(EnvelopeBody {
        status,
        body: Body {
            error: Some(message.into()),
            ..Default::default()
        },
    })
}

/// Build an error envelope that still carries whatever identity was attached, mirroring the
/// reference's `responseJSONError(w, status, id, acsToken, msg)` call shape.
pub fn error_with_identity(status: u16, identity: &OptionalIdentity, message: impl Into<String>) -> Envelope {
    let mut body = Body::with_identity(identity.0.as_ref());
    body.error = Some(message.into());
    Json(EnvelopeBody { status, body })
}

/// Success envelope carrying just an access token (login) or nothing at all (signup).
pub fn login_success(access_token: String) -> Envelope {
    Json(EnvelopeBody {
        status: 202,
        body: Body {
            access_token: Some(access_token),
            ..Default::default()
        },
    })
}

pub fn created() -> Envelope {
    Json(EnvelopeBody {
        status: 201,
        body: Body::default(),
    })
}

pub fn exists(status: u16, exists: bool) -> Envelope {
    Json(EnvelopeBody {
        status,
        body: Body {
            exists: Some(exists),
            ..Default::default()
        },
    })
}

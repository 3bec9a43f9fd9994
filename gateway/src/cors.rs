//! CORS fairing, grounded on
//! `original_source/back/app/apiService/internal/server/handler/middleware.go`'s
//! `corsSettings()` (`go-chi/cors`), re-expressed as a plain Rocket response fairing — no CORS
//! crate in this workspace's dependency stack is compatible with Rocket 0.5, and the policy
//! itself is a handful of fixed headers, not worth a dependency.

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Method, Status};
use rocket::{Request, Response};

pub struct Cors {
    pub allowed_origins: Vec<String>,
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let origin = req.headers().get_one("Origin").map(|o| o.to_string());
        if let Some(origin) = origin {
            if self.allowed_origins.iter().any(|allowed| allowed == &origin) {
                res.set_header(Header::new("Access-Control-Allow-Origin", origin));
                res.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
            }
        }
        res.set_header(Header::new("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS"));
        res.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Set-Cookie, Authorization, id",
        ));
        res.set_header(Header::new(
            "Access-Control-Expose-Headers",
            "Content-Type, Set-Cookie, Authorization, id",
        ));

        if req.method() == Method::Options {
            res.set_status(Status::NoContent);
        }
    }
}

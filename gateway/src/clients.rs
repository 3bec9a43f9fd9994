//! Thin gRPC client wrappers over the generated `tonic` stubs, translating every `tonic::Status`
//! back into a `common::AppError` via `kind_from_status` so handlers never see raw `Status`.

use std::time::Duration;

use common::{kind_from_status, AppError, ErrorKind, GrpcEndpointConfig};
use tonic::transport::Channel;
use tonic::{Request, Status};

use crate::models::{self, Article};
use crate::proto::auth::auth_client::AuthClient as RawAuthClient;
use crate::proto::auth::{
    CheckEmailRequest, CheckUserNameRequest, LoginUserRequest, ParseRequest, RefreshRequest, SaveUserRequest,
};
use crate::proto::news::news_client::NewsClient as RawNewsClient;
use crate::proto::news::{
    DeleteArticleRequest, GetArticlesByPageRequest, GetArticlesByUidRequest, GetArticlesRequest,
    GetNewestArticleRequest, SaveArticleRequest, UpdateArticleRequest,
};

fn status_to_app_error(status: Status) -> AppError {
    AppError::new(kind_from_status(&status), status.message().to_string())
}

fn dial(cfg: &GrpcEndpointConfig) -> Result<Channel, AppError> {
    let channel = Channel::from_shared(cfg.dial_address())
        .map_err(|e| AppError::new(ErrorKind::Internal, format!("bad gRPC endpoint: {e}")))?
        .connect_lazy();
    Ok(channel)
}

pub struct LoggedIn {
    pub user_id: i64,
    pub user_name: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct AuthClient {
    inner: RawAuthClient<Channel>,
    timeout: Duration,
}

impl AuthClient {
    pub fn connect(cfg: &GrpcEndpointConfig) -> Result<Self, AppError> {
        Ok(Self {
            inner: RawAuthClient::new(dial(cfg)?),
            timeout: Duration::from_secs(cfg.timeout_secs),
        })
    }

    async fn call<Req, Resp, F, Fut>(&self, req: Req, f: F) -> Result<Resp, AppError>
    where
        F: FnOnce(RawAuthClient<Channel>, Request<Req>) -> Fut,
        Fut: std::future::Future<Output = Result<tonic::Response<Resp>, Status>>,
    {
        let client = self.inner.clone();
        tokio::time::timeout(self.timeout, f(client, Request::new(req)))
            .await
            .map_err(|_| AppError::new(ErrorKind::Internal, "auth-service request timed out"))?
            .map(|resp| resp.into_inner())
            .map_err(status_to_app_error)
    }

    pub async fn save_user(&self, user_name: &str, email: &str, password: &str) -> Result<i64, AppError> {
        let req = SaveUserRequest {
            user_name: user_name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp = self.call(req, |mut c, r| async move { c.save_user(r).await }).await?;
        Ok(resp.user_id)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<LoggedIn, AppError> {
        let req = LoginUserRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp = self.call(req, |mut c, r| async move { c.login_user(r).await }).await?;
        Ok(LoggedIn {
            user_id: resp.user_id,
            user_name: resp.user_name,
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
        })
    }

    pub async fn parse(&self, access_token: &str) -> Result<(i64, String), AppError> {
        let req = ParseRequest {
            access_token: access_token.to_string(),
        };
        let resp = self.call(req, |mut c, r| async move { c.parse(r).await }).await?;
        Ok((resp.user_id, resp.user_name))
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<LoggedIn, AppError> {
        let req = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let resp = self.call(req, |mut c, r| async move { c.refresh(r).await }).await?;
        Ok(LoggedIn {
            user_id: resp.user_id,
            user_name: resp.user_name,
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
        })
    }

    pub async fn check_email(&self, email: &str) -> Result<bool, AppError> {
        let req = CheckEmailRequest {
            email: email.to_string(),
        };
        let resp = self
            .call(req, |mut c, r| async move { c.check_email(r).await })
            .await?;
        Ok(resp.exists)
    }

    pub async fn check_user_name(&self, user_name: &str) -> Result<bool, AppError> {
        let req = CheckUserNameRequest {
            user_name: user_name.to_string(),
        };
        let resp = self
            .call(req, |mut c, r| async move { c.check_user_name(r).await })
            .await?;
        Ok(resp.exists)
    }
}

#[derive(Clone)]
pub struct NewsClient {
    inner: RawNewsClient<Channel>,
    timeout: Duration,
}

impl NewsClient {
    pub fn connect(cfg: &GrpcEndpointConfig) -> Result<Self, AppError> {
        Ok(Self {
            inner: RawNewsClient::new(dial(cfg)?),
            timeout: Duration::from_secs(cfg.timeout_secs),
        })
    }

    async fn call<Req, Resp, F, Fut>(&self, req: Req, f: F) -> Result<Resp, AppError>
    where
        F: FnOnce(RawNewsClient<Channel>, Request<Req>) -> Fut,
        Fut: std::future::Future<Output = Result<tonic::Response<Resp>, Status>>,
    {
        let client = self.inner.clone();
        tokio::time::timeout(self.timeout, f(client, Request::new(req)))
            .await
            .map_err(|_| AppError::new(ErrorKind::Internal, "news-service request timed out"))?
            .map(|resp| resp.into_inner())
            .map_err(status_to_app_error)
    }

    pub async fn get_articles_by_uid(&self, user_id: i64) -> Result<Vec<Article>, AppError> {
        let req = GetArticlesByUidRequest { user_id };
        let resp = self
            .call(req, |mut c, r| async move { c.get_articles_by_uid(r).await })
            .await?;
        Ok(models::from_proto_list(resp.articles))
    }

    pub async fn save_article(&self, user_id: i64, link: &str) -> Result<Vec<Article>, AppError> {
        let req = SaveArticleRequest {
            user_id,
            link: link.to_string(),
        };
        let resp = self.call(req, |mut c, r| async move { c.save_article(r).await }).await?;
        Ok(models::from_proto_list(resp.articles))
    }

    pub async fn update_article(&self, user_id: i64, article_id: i64, link: &str) -> Result<Vec<Article>, AppError> {
        let req = UpdateArticleRequest {
            user_id,
            article_id,
            link: link.to_string(),
        };
        let resp = self
            .call(req, |mut c, r| async move { c.update_article(r).await })
            .await?;
        Ok(models::from_proto_list(resp.articles))
    }

    pub async fn delete_article(&self, user_id: i64, article_id: i64) -> Result<Vec<Article>, AppError> {
        let req = DeleteArticleRequest { user_id, article_id };
        let resp = self
            .call(req, |mut c, r| async move { c.delete_article(r).await })
            .await?;
        Ok(models::from_proto_list(resp.articles))
    }

    pub async fn get_newest_article(&self) -> Result<Article, AppError> {
        let resp = self
            .call(GetNewestArticleRequest {}, |mut c, r| async move {
                c.get_newest_article(r).await
            })
            .await?;
        Ok(Article::from(resp))
    }

    pub async fn get_articles(&self) -> Result<Vec<Article>, AppError> {
        let resp = self
            .call(GetArticlesRequest {}, |mut c, r| async move { c.get_articles(r).await })
            .await?;
        Ok(models::from_proto_list(resp.articles))
    }

    pub async fn get_articles_by_page(&self, page: i64) -> Result<Vec<Article>, AppError> {
        let req = GetArticlesByPageRequest { page };
        let resp = self
            .call(req, |mut c, r| async move { c.get_articles_by_page(r).await })
            .await?;
        Ok(models::from_proto_list(resp.articles))
    }
}

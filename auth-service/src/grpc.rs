//! tonic transport adapter: translates `auth.proto` requests into `AuthCore` calls and
//! `AppError`s into `tonic::Status` (via `common`'s shared `From<AppError> for Status`).

use tonic::{Request, Response, Status};

use crate::proto::auth_server::Auth;
use crate::proto::{
    CheckEmailRequest, CheckResponse, CheckUserNameRequest, LoginUserRequest, LoginUserResponse,
    ParseRequest, ParseResponse, RefreshRequest, RefreshResponse, SaveUserRequest, SaveUserResponse,
};
use crate::service::AuthCore;
use crate::storage::RegistrationIndex;
use std::sync::Arc;

pub struct AuthService {
    core: AuthCore,
    registration_index: Arc<RegistrationIndex>,
}

impl AuthService {
    pub fn new(core: AuthCore, registration_index: Arc<RegistrationIndex>) -> Self {
        Self {
            core,
            registration_index,
        }
    }
}

#[tonic::async_trait]
impl Auth for AuthService {
    async fn save_user(
        &self,
        request: Request<SaveUserRequest>,
    ) -> Result<Response<SaveUserResponse>, Status> {
        let req = request.into_inner();
        let user_id = self
            .core
            .save_user(&req.user_name, &req.email, &req.password)
            .await?;
        Ok(Response::new(SaveUserResponse { user_id }))
    }

    async fn login_user(
        &self,
        request: Request<LoginUserRequest>,
    ) -> Result<Response<LoginUserResponse>, Status> {
        let req = request.into_inner();
        let logged_in = self.core.login_user(&req.email, &req.password).await?;
        Ok(Response::new(LoginUserResponse {
            user_id: logged_in.user_id,
            user_name: logged_in.user_name,
            access_token: logged_in.access_token,
            refresh_token: logged_in.refresh_token,
        }))
    }

    async fn parse(&self, request: Request<ParseRequest>) -> Result<Response<ParseResponse>, Status> {
        let req = request.into_inner();
        let bearer = format!("Bearer {}", req.access_token);
        let (user_id, user_name) = self.core.parse(&bearer)?;
        Ok(Response::new(ParseResponse { user_id, user_name }))
    }

    async fn refresh(
        &self,
        request: Request<RefreshRequest>,
    ) -> Result<Response<RefreshResponse>, Status> {
        let req = request.into_inner();
        let logged_in = self.core.refresh(&req.refresh_token).await?;
        Ok(Response::new(RefreshResponse {
            user_id: logged_in.user_id,
            user_name: logged_in.user_name,
            access_token: logged_in.access_token,
            refresh_token: logged_in.refresh_token,
        }))
    }

    async fn check_email(
        &self,
        request: Request<CheckEmailRequest>,
    ) -> Result<Response<CheckResponse>, Status> {
        let req = request.into_inner();
        let exists = self.registration_index.check_email(&req.email).await?;
        Ok(Response::new(CheckResponse { exists }))
    }

    async fn check_user_name(
        &self,
        request: Request<CheckUserNameRequest>,
    ) -> Result<Response<CheckResponse>, Status> {
        let req = request.into_inner();
        let exists = self
            .registration_index
            .check_user_name(&req.user_name)
            .await?;
        Ok(Response::new(CheckResponse { exists }))
    }
}

//! JWT validation interceptor for gRPC requests.

use std::sync::Arc;

use tonic::{Request, Status};

use crate::auth::claims::Claims;
use crate::auth::jwt::JwtManager;

/// Extract and validate JWT from the authorization metadata header.
pub fn jwt_interceptor(
    jwt: Arc<JwtManager>,
) -> impl Fn(Request<()>) -> Result<Request<()>, Status> + Clone {
    move |mut req: Request<()>| {
        let token = req
            .metadata()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| Status::unauthenticated("Missing authorization header"))?;

        let claims = jwt
            .validate(token)
            .map_err(|_| Status::unauthenticated("Invalid token"))?;

        req.extensions_mut().insert(claims);
        Ok(req)
    }
}

/// Extract claims from a request that has passed through the interceptor.
#[allow(clippy::result_large_err)]
pub fn extract_claims<T>(req: &Request<T>) -> Result<&Claims, Status> {
    req.extensions()
        .get::<Claims>()
        .ok_or_else(|| Status::unauthenticated("Missing authentication claims"))
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn manager() -> Arc<JwtManager> {
        Arc::new(JwtManager::new(b"interceptor-test-secret", 3600))
    }

    #[test]
    fn valid_token_inserts_claims() {
        let jwt = manager();
        let (token, _) = jwt.issue_access_token("user-7").unwrap();

        let mut req = Request::new(());
        req.metadata_mut().insert(
            "authorization",
            format!("Bearer {token}").parse().unwrap(),
        );

        let check = jwt_interceptor(jwt);
        let req = check(req).unwrap();
        assert_eq!(extract_claims(&req).unwrap().sub, "user-7");
    }

    #[test]
    fn missing_header_is_unauthenticated() {
        let check = jwt_interceptor(manager());
        let err = check(Request::new(())).unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
    }

    #[test]
    fn garbage_token_is_unauthenticated() {
        let mut req = Request::new(());
        req.metadata_mut()
            .insert("authorization", "Bearer not-a-jwt".parse().unwrap());

        let check = jwt_interceptor(manager());
        let err = check(req).unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
    }

    #[test]
    fn extract_without_interceptor_fails() {
        let req = Request::new(());
        let err = extract_claims(&req).unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
    }
}

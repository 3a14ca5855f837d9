use actix_service::{forward_ready, Service};
use actix_web::body::EitherBody;
use actix_web::dev::{ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, ResponseError};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::error::ApiError;

pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// Lets a request through only when `x-admin-secret` matches the configured
/// secret. With no secret configured every request is refused.
pub struct AdminSecretGate {
    secret: Option<Rc<str>>,
}

impl AdminSecretGate {
    pub fn new(secret: Option<String>) -> Self {
        AdminSecretGate {
            secret: secret.map(Rc::from),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminSecretGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AdminSecretGateMiddleware<S>;
    type InitError = ();

    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AdminSecretGateMiddleware {
            service: Rc::new(service),
            secret: self.secret.clone(),
        })
    }
}

pub struct AdminSecretGateMiddleware<S> {
    service: Rc<S>,
    secret: Option<Rc<str>>,
}

impl<S, B> Service<ServiceRequest> for AdminSecretGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let allowed = match (&self.secret, req.headers().get(ADMIN_SECRET_HEADER)) {
            (Some(secret), Some(given)) => given.as_bytes() == secret.as_bytes(),
            _ => false,
        };
        let service = self.service.clone();

        Box::pin(async move {
            if allowed {
                service.call(req).await.map(ServiceResponse::map_into_left_body)
            } else {
                log::info!("Admin: Attempt failed : NO SECRET");
                let err = ApiError::Forbidden(format!("Invalid header: {}", ADMIN_SECRET_HEADER));
                Ok(req.into_response(err.error_response()).map_into_right_body())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    async fn secret_area() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    macro_rules! gated_app {
        ($secret:expr) => {
            test::init_service(
                App::new().service(
                    web::resource("/gated")
                        .wrap(AdminSecretGate::new($secret))
                        .route(web::post().to(secret_area)),
                ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn matching_header_passes() {
        let app = gated_app!(Some("s3cret".to_string()));
        let req = test::TestRequest::post()
            .uri("/gated")
            .insert_header((ADMIN_SECRET_HEADER, "s3cret"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn missing_or_wrong_header_is_forbidden() {
        let app = gated_app!(Some("s3cret".to_string()));

        let req = test::TestRequest::post().uri("/gated").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], 0);
        assert_eq!(body["message"], "Invalid header: x-admin-secret");

        let req = test::TestRequest::post()
            .uri("/gated")
            .insert_header((ADMIN_SECRET_HEADER, "guess"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn unconfigured_secret_refuses_everyone() {
        let app = gated_app!(None);
        let req = test::TestRequest::post()
            .uri("/gated")
            .insert_header((ADMIN_SECRET_HEADER, ""))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use log::{info, warn};
use std::rc::Rc;
use std::time::Instant;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// 요청마다 부여되는 고유 ID
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// 핸들러에서 현재 요청 ID를 꺼냅니다.
pub fn request_id(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<RequestId>().map(|id| id.0.clone())
}

/// 커스텀 Logger 미들웨어
/// 요청마다 ID를 부여하고 응답 헤더로 돌려주며, 처리 시간을 로깅합니다.
/// 쿠키와 Authorization 헤더는 기록하지 않습니다.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let request_id = uuid::Uuid::new_v4().to_string();

        req.extensions_mut().insert(RequestId(request_id.clone()));
        info!("Request started: {} {} [{}]", method, path, request_id);

        let service = self.service.clone();

        Box::pin(async move {
            let mut res = match service.call(req).await {
                Ok(res) => res,
                Err(e) => {
                    warn!(
                        "Request failed: {} {} - {} ({}ms) [{}]",
                        method,
                        path,
                        e,
                        start_time.elapsed().as_millis(),
                        request_id
                    );
                    return Err(e);
                }
            };

            if let Ok(value) = HeaderValue::from_str(&request_id) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            // 응답 정보 로깅
            info!(
                "Request completed: {} {} - Status: {} ({}ms) [{}]",
                method,
                path,
                res.status().as_u16(),
                start_time.elapsed().as_millis(),
                request_id
            );

            Ok(res)
        })
    }
}

use actix_web::HttpResponse;

/// `GET /health_check`
///
/// Liveness probe for the load balancer. Does not touch the mail server.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }

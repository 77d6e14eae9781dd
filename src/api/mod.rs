
pub mod routes;

use actix_web::web;

/// Configure toutes les routes de l'API
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(routes::users::me)
            .service(routes::chat::chat)
            .service(routes::image::submit_image)
            .service(routes::image::image_result)
            .service(routes::video::submit_video)
            .service(routes::video::video_result),
    );

    // Webhook Telegram (hors du scope /api, comme enregistré côté Telegram)
    cfg.service(routes::webhook::telegram_webhook);

    // Endpoint de santé
    cfg.service(web::resource("/health").route(web::get().to(health_check)));
}

/// Endpoint de santé pour monitoring
async fn health_check() -> impl actix_web::Responder {
    actix_web::HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use serde_json::Value;

    #[actix_web::test]
    async fn health_reports_version() {
        let app = test::init_service(App::new().configure(|cfg| {
            cfg.service(
                actix_web::web::resource("/health")
                    .route(actix_web::web::get().to(super::health_check)),
            );
        }))
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}

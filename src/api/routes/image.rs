

use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::core::generation::{GenerationService, ImageRequest};
use crate::infrastructure::error::{AppError, AppResult};

/// Requête de soumission d'image du mini-app
#[derive(Debug, Deserialize, Validate)]
pub struct ImageSubmitPayload {
    pub tg_id: i64,
    #[serde(flatten)]
    #[validate]
    pub request: ImageRequest,
}

/// Endpoint de soumission d'un job image.
///
/// La réponse du fournisseur est retournée telle quelle: le mini-app
/// pilote lui-même le polling via l'endpoint de résultat.
#[post("/image/submit")]
pub async fn submit_image(
    payload: web::Json<ImageSubmitPayload>,
    generation: web::Data<GenerationService>,
) -> AppResult<HttpResponse> {
    payload.validate()?;
    if payload.tg_id <= 0 {
        return Err(AppError::BadRequest("tg_id requis".to_string()));
    }

    let raw = generation
        .submit_image(payload.tg_id, &payload.request)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "ok": true, "apifree": raw })))
}

/// Endpoint de lecture du résultat d'un job image
#[get("/image/result/{request_id}")]
pub async fn image_result(
    path: web::Path<String>,
    generation: web::Data<GenerationService>,
) -> AppResult<HttpResponse> {
    let request_id = path.into_inner();
    let raw = generation.image_result(&request_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "ok": true, "apifree": raw })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::{test, App};
    use assert_json_diff::assert_json_include;
    use serde_json::Value;
    use wiremock::matchers::{body_partial_json, method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::core::gate::CreditGate;
    use crate::core::generation::GenerationSettings;
    use crate::core::poll::PollConfig;
    use crate::infrastructure::provider::ApiFreeClient;
    use crate::infrastructure::storage::Storage;

    async fn test_service(server: &MockServer) -> (Storage, GenerationService) {
        let storage = Storage::connect_in_memory().await.unwrap();
        storage.init().await.unwrap();

        let client =
            Arc::new(ApiFreeClient::new(&server.uri(), "test-key", Duration::from_secs(5)).unwrap());
        let gate = CreditGate::new(storage.clone(), Default::default());
        let settings = GenerationSettings {
            chat_model: "test/chat".to_string(),
            image_model: "test/image".to_string(),
            video_model: "test/video".to_string(),
            image_poll: PollConfig::new(Duration::from_millis(1), 5),
            video_poll: PollConfig::new(Duration::from_millis(1), 5),
        };

        (storage.clone(), GenerationService::new(client, gate, settings))
    }

    #[actix_web::test]
    async fn submit_passes_provider_response_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(url_path("/v1/image/submit"))
            .and(body_partial_json(serde_json::json!({
                "model": "test/image",
                "prompt": "un phare breton",
                "num_images": 2
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "resp_data": {"request_id": "img-42"}
            })))
            .mount(&server)
            .await;

        let (storage, generation) = test_service(&server).await;
        storage.ensure_user(21, 1).await.unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(generation))
                .service(submit_image)
                .service(image_result),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/image/submit")
            .set_json(serde_json::json!({
                "tg_id": 21,
                "prompt": "un phare breton",
                "num_images": 2
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: Value = test::read_body_json(resp).await;
        assert_json_include!(
            actual: body,
            expected: serde_json::json!({
                "ok": true,
                "apifree": {"resp_data": {"request_id": "img-42"}}
            })
        );
    }

    #[actix_web::test]
    async fn result_endpoint_is_raw_passthrough() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/v1/image/img-42/result"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "resp_data": {"status": "success", "image_list": ["http://x/a.png"]}
            })))
            .mount(&server)
            .await;

        let (_storage, generation) = test_service(&server).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(generation))
                .service(image_result),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/image/result/img-42")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["apifree"]["resp_data"]["image_list"][0], "http://x/a.png");
    }

    #[actix_web::test]
    async fn submit_without_credits_returns_402() {
        let server = MockServer::start().await;
        let (storage, generation) = test_service(&server).await;
        storage.ensure_user(22, 0).await.unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(generation))
                .service(submit_image),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/image/submit")
            .set_json(serde_json::json!({"tg_id": 22, "prompt": "un volcan"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 402);
        assert_eq!(server.received_requests().await.unwrap().len(), 0);
    }
}



use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::core::generation::{GenerationService, VideoRequest};
use crate::infrastructure::error::{AppError, AppResult};

/// Requête de soumission de vidéo du mini-app
#[derive(Debug, Deserialize, Validate)]
pub struct VideoSubmitPayload {
    pub tg_id: i64,
    #[serde(flatten)]
    #[validate]
    pub request: VideoRequest,
}

/// Endpoint de soumission d'un job vidéo, symétrique de l'image
#[post("/video/submit")]
pub async fn submit_video(
    payload: web::Json<VideoSubmitPayload>,
    generation: web::Data<GenerationService>,
) -> AppResult<HttpResponse> {
    payload.validate()?;
    if payload.tg_id <= 0 {
        return Err(AppError::BadRequest("tg_id requis".to_string()));
    }

    let raw = generation
        .submit_video(payload.tg_id, &payload.request)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "ok": true, "apifree": raw })))
}

/// Endpoint de lecture du résultat d'un job vidéo
#[get("/video/result/{request_id}")]
pub async fn video_result(
    path: web::Path<String>,
    generation: web::Data<GenerationService>,
) -> AppResult<HttpResponse> {
    let request_id = path.into_inner();
    let raw = generation.video_result(&request_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "ok": true, "apifree": raw })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::{test, App};
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
    async fn submit_forwards_video_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(url_path("/v1/video/submit"))
            .and(body_partial_json(serde_json::json!({
                "model": "test/video",
                "prompt": "une mer agitée",
                "duration": 5,
                "fps": 24
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"task_id": "vid-7"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (storage, generation) = test_service(&server).await;
        storage.ensure_user(31, 1).await.unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(generation))
                .service(submit_video),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/video/submit")
            .set_json(serde_json::json!({
                "tg_id": 31,
                "prompt": "une mer agitée",
                "duration": 5,
                "fps": 24
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["apifree"]["task_id"], "vid-7");
    }

    #[actix_web::test]
    async fn result_endpoint_is_raw_passthrough() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/v1/video/vid-7/result"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "resp_data": {"status": "pending"}
            })))
            .mount(&server)
            .await;

        let (_storage, generation) = test_service(&server).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(generation))
                .service(video_result),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/video/result/vid-7")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["apifree"]["resp_data"]["status"], "pending");
    }
}

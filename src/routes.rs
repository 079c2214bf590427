use actix_files::Files;
use actix_multipart::form::MultipartForm;
use actix_multipart::form::bytes::Bytes;
use actix_multipart::form::text::Text;
use actix_web::{HttpResponse, web};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use log::{error, info};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

use crate::db::feedback_repository::FeedbackRepository;
use crate::db::model::FeedbackRecord;
use crate::model::{Classifier, InferenceError};
use crate::storage::storage_service::StorageService;

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    kind: &'static str,
    error: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: PathBuf) {
    cfg.service(web::resource("/predict").route(web::post().to(handle_predict)))
        .service(web::resource("/feedback").route(web::post().to(submit_feedback)))
        .service(web::resource("/feedback/all").route(web::get().to(list_feedback)))
        .service(
            web::resource("/feedback/image/{image_name}")
                .route(web::get().to(feedback_image_url)),
        )
        .service(Files::new("/", static_dir).index_file("index.html"));
}

#[derive(MultipartForm)]
struct PredictForm {
    file: Bytes,
}

#[derive(MultipartForm)]
struct FeedbackForm {
    prediction: Text<String>,
    decision: Text<String>,
    comment: Text<String>,
    file: Bytes,
}

async fn handle_predict(
    classifier: web::Data<dyn Classifier>,
    MultipartForm(form): MultipartForm<PredictForm>,
) -> HttpResponse {
    let image_bytes = form.file.data.to_vec();
    let echoed_image = BASE64.encode(&image_bytes);

    // The forward pass is CPU-bound; keep it off the executor threads.
    let classifier = classifier.into_inner();
    let result = web::block(move || classifier.predict(&image_bytes)).await;

    match result {
        Ok(Ok(label)) => HttpResponse::Ok().json(json!({
            "prediction": label,
            "image": echoed_image,
        })),
        Ok(Err(e @ InferenceError::Decode(_))) => {
            info!("rejected upload: {e}");
            HttpResponse::BadRequest().json(ErrorResponse {
                kind: "decode",
                error: e.to_string(),
            })
        }
        Ok(Err(e @ InferenceError::ShapeMismatch { .. })) => {
            error!("inference failed: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                kind: "shape_mismatch",
                error: "embedding does not match the classifier".to_string(),
            })
        }
        Ok(Err(e)) => {
            error!("inference failed: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                kind: "model",
                error: "model evaluation failed".to_string(),
            })
        }
        Err(e) => {
            error!("inference task failed to run: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                kind: "model",
                error: "model evaluation failed".to_string(),
            })
        }
    }
}

async fn submit_feedback(
    storage: web::Data<StorageService>,
    feedback_repo: web::Data<FeedbackRepository>,
    MultipartForm(form): MultipartForm<FeedbackForm>,
) -> HttpResponse {
    let record = FeedbackRecord::new(
        form.prediction.into_inner(),
        form.decision.into_inner(),
        form.comment.into_inner(),
    );

    if let Err(e) = storage
        .upload_image(&record.image_filename, form.file.data.to_vec())
        .await
    {
        error!("image upload failed for feedback {}: {e}", record.id);
        return HttpResponse::InternalServerError().json(MessageResponse {
            message: "Image upload failed".to_string(),
        });
    }

    // A failed insert after a successful upload leaves the blob orphaned;
    // there is no compensating delete.
    if let Err(e) = feedback_repo.insert(&record).await {
        error!("feedback insert failed for {}: {e}", record.id);
        return HttpResponse::InternalServerError().json(MessageResponse {
            message: "Failed to save feedback to database".to_string(),
        });
    }

    info!("stored feedback {} ({})", record.id, record.decision);
    HttpResponse::Ok().json(MessageResponse {
        message: "Feedback submitted successfully".to_string(),
    })
}

async fn list_feedback(feedback_repo: web::Data<FeedbackRepository>) -> HttpResponse {
    match feedback_repo.list_all().await {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => {
            error!("failed to list feedback: {e}");
            HttpResponse::InternalServerError().json(MessageResponse {
                message: "Failed to fetch feedback".to_string(),
            })
        }
    }
}

async fn feedback_image_url(
    storage: web::Data<StorageService>,
    path: web::Path<String>,
) -> HttpResponse {
    let image_name = path.into_inner();
    HttpResponse::Ok().json(json!({
        "image_url": storage.public_url(&image_name),
    }))
}

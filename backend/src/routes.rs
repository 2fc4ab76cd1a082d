use crate::error::PipelineError;
use crate::notify::{ActuatorChannel, EmailChannel};
use crate::pipeline::Pipeline;
use crate::storage::image_store::StoreError;
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures_util::{StreamExt, TryStreamExt};
use log::error;
use serde::Deserialize;

/// Production pipeline wiring used by the HTTP layer.
pub type AppPipeline = Pipeline<EmailChannel, ActuatorChannel>;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(upload_form))
            .route(web::post().to(handle_upload)),
    )
    .service(web::resource("/success").route(web::get().to(success)));
}

async fn upload_form() -> HttpResponse {
    html(HttpResponse::Ok(), render_form(None))
}

async fn handle_upload(pipeline: web::Data<AppPipeline>, mut payload: Multipart) -> HttpResponse {
    let mut file_bytes: Vec<u8> = Vec::new();
    let mut filename: Option<String> = None;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let field_filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(bytes) => data.extend_from_slice(&bytes),
                Err(e) => {
                    error!("failed to read upload stream: {e}");
                    return html(
                        HttpResponse::BadRequest(),
                        render_form(Some("The upload was interrupted. Please try again.")),
                    );
                }
            }
        }

        // keep the last file field; plain form fields carry no filename
        if let Some(name) = field_filename {
            file_bytes = data;
            filename = Some(name);
        }
    }

    let Some(filename) = filename else {
        return html(
            HttpResponse::BadRequest(),
            render_form(Some("Choose an image file to upload.")),
        );
    };

    match pipeline.handle(&file_bytes, &filename).await {
        Ok(outcome) => {
            let location = format!(
                "/success?classification={}",
                urlencoding::encode(&outcome.display)
            );
            HttpResponse::SeeOther()
                .insert_header(("Location", location))
                .finish()
        }
        Err(e @ PipelineError::Store(StoreError::Io { .. }))
        | Err(e @ PipelineError::Inference(_)) => {
            // internals stay out of the response
            error!("request failed at {} stage: {e}", e.stage());
            html(
                HttpResponse::InternalServerError(),
                render_form(Some("Classification failed. Please try again later.")),
            )
        }
        Err(PipelineError::Store(validation)) => html(
            HttpResponse::BadRequest(),
            render_form(Some(&validation.to_string())),
        ),
        Err(PipelineError::Decode(_)) => html(
            HttpResponse::BadRequest(),
            render_form(Some("The file could not be read as an image.")),
        ),
    }
}

#[derive(Deserialize)]
struct SuccessQuery {
    classification: Option<String>,
}

async fn success(query: web::Query<SuccessQuery>) -> HttpResponse {
    let classification = query.classification.as_deref().unwrap_or("unknown");
    html(HttpResponse::Ok(), render_success(classification))
}

fn html(mut response: actix_web::HttpResponseBuilder, body: String) -> HttpResponse {
    response.content_type("text/html; charset=utf-8").body(body)
}

fn render_form(error: Option<&str>) -> String {
    let notice = error
        .map(|e| format!("<p class=\"error\">{}</p>", escape_html(e)))
        .unwrap_or_default();
    format!(
        "<!doctype html>\n<html>\n<head><title>Elephant Sentry</title></head>\n<body>\n\
         <h1>Upload an image</h1>\n{notice}\
         <form method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"image\" accept=\".jpg,.jpeg,.png\" required>\n\
         <button type=\"submit\">Classify</button>\n\
         </form>\n</body>\n</html>\n"
    )
}

fn render_success(classification: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head><title>Elephant Sentry</title></head>\n<body>\n\
         <h1>Classification result</h1>\n\
         <p>{}</p>\n\
         <p><a href=\"/\">Upload another image</a></p>\n</body>\n</html>\n",
        escape_html(classification)
    )
}

fn escape_html(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#x27;".to_string(),
            other => other.to_string(),
        })
        .collect()
}

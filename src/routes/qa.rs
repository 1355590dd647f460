use crate::{
    error::ApiError,
    models::{prompt::PromptContext, requests::QuestionRequest, responses::AnswerResponse},
    state::AppState,
};
use actix_web::{web, HttpResponse};

/*
    /api/qa
*/
pub async fn answer(
    state: web::Data<AppState>,
    body: web::Json<QuestionRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    request.validate()?;

    let prompt = PromptContext::question(&request.itinerary, &request.question).render();
    let answer = state.completion.complete(&prompt).await?;

    Ok(HttpResponse::Ok().json(AnswerResponse { answer }))
}

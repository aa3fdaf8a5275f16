use axum::{Json, extract::State, extract::rejection::JsonRejection};

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse},
    state::SharedState,
};

pub async fn message_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    // An unreadable body is treated like a body without a message.
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            tracing::debug!(%rejection, "rejecting undecodable chat request");
            ChatRequest::default()
        }
    };

    let message = payload
        .non_empty_message()
        .ok_or_else(AppError::message_required)?;

    tracing::info!(%message, "received message");

    let Some(client) = state.completion.as_ref() else {
        tracing::error!("GROQ_API_KEY not found in environment variables");
        return Err(AppError::MissingApiKey);
    };

    let reply = client.reply(message).await;

    Ok(Json(ChatResponse::new(reply)))
}

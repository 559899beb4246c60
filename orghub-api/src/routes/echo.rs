/// Echo endpoint
///
/// ```text
/// POST /api/echo
/// {"message": "hello"}
/// ```
///
/// Response: `{"echo": "hello"}`. The message is returned exactly as sent.

use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct EchoRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EchoResponse {
    pub echo: String,
}

pub async fn echo(payload: Result<Json<EchoRequest>, JsonRejection>) -> ApiResult<Json<EchoResponse>> {
    let Json(req) = payload?;

    Ok(Json(EchoResponse { echo: req.message }))
}

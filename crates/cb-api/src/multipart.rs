//! Reads the post-creation form out of a `multipart/form-data` body.

use actix_multipart::Multipart;
use bytes::BytesMut;
use cb_core::{PostForm, Upload};
use futures_util::StreamExt;

use crate::error::ApiError;

/// Fields of a post submission, plus the `board` field when sent in the body.
#[derive(Debug, Default)]
pub struct PostSubmission {
    pub board: Option<String>,
    pub form: PostForm,
}

/// Collects the known fields; unknown fields are skipped.
///
/// The whole body is capped at `max_bytes`. An empty file input (no filename,
/// no bytes) is treated as "no photo".
pub async fn read_post_submission(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<PostSubmission, ApiError> {
    let mut submission = PostSubmission::default();
    let mut total = 0usize;

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| ApiError::invalid(format!("multipart error: {e}")))?;

        let disposition = field.content_disposition().clone();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);

        let mut data = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| ApiError::invalid(format!("multipart read error: {e}")))?;
            total += chunk.len();
            if total > max_bytes {
                return Err(ApiError::invalid(format!(
                    "request body exceeds {max_bytes} bytes"
                )));
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "board" => submission.board = Some(text_field(&name, data)?),
            "name" => submission.form.name = Some(text_field(&name, data)?),
            "message" => submission.form.message = Some(text_field(&name, data)?),
            "photo" => {
                let filename = filename.filter(|f| !f.is_empty());
                if filename.is_none() && data.is_empty() {
                    continue;
                }
                if submission.form.photo.is_some() {
                    return Err(ApiError::invalid("only one photo may be attached"));
                }
                submission.form.photo = Some(Upload {
                    filename: filename.unwrap_or_else(|| "photo".to_string()),
                    data: data.freeze(),
                });
            }
            other => log::debug!("ignoring multipart field {other:?}"),
        }
    }

    Ok(submission)
}

fn text_field(name: &str, data: BytesMut) -> Result<String, ApiError> {
    String::from_utf8(data.to_vec())
        .map_err(|_| ApiError::invalid(format!("field {name:?} is not valid UTF-8")))
}

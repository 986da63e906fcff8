//! # cb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and `BoardService`.

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use askama::Template;
use cb_core::{AppError, BoardService};
use cb_ui::BoardShellTemplate;
use serde::Deserialize;

use crate::error::ApiError;
use crate::multipart::read_post_submission;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub service: BoardService,
    /// Cap on a post-creation request body.
    pub max_upload_bytes: usize,
    /// Where the shell page loads the client bundle from, if anywhere.
    pub client_assets: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    pub board: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    pub board: Option<String>,
    pub index: Option<String>,
    pub amount: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .ok_or_else(|| ApiError::invalid(format!("missing parameter {name:?}")))
}

fn parse_count(raw: &str, name: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::invalid(format!("parameter {name:?} must be an integer, got {raw:?}")))
}

/// GET /api/board/details?board=<uuid>
pub async fn board_details(
    data: web::Data<AppState>,
    query: web::Query<BoardQuery>,
) -> Result<HttpResponse, ApiError> {
    let board = required(&query.board, "board")?;
    let details = data.service.get_board_details(board).await?;
    Ok(HttpResponse::Ok().json(details))
}

/// GET /api/board/posts/get?board=<uuid>&index=<int>&amount=<int>
pub async fn get_posts(
    data: web::Data<AppState>,
    query: web::Query<PostsQuery>,
) -> Result<HttpResponse, ApiError> {
    let board = required(&query.board, "board")?;
    let index = parse_count(required(&query.index, "index")?, "index")?;
    let amount = parse_count(required(&query.amount, "amount")?, "amount")?;

    let posts = data.service.get_posts(board, index, amount).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// POST /api/board/posts/create (multipart: board, name?, message?, photo?)
///
/// `board` may also be given in the query string.
pub async fn create_post(
    data: web::Data<AppState>,
    query: web::Query<BoardQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let submission = read_post_submission(payload, data.max_upload_bytes).await?;
    let board = submission.board.or_else(|| query.into_inner().board);
    let board = required(&board, "board")?;

    let post = data.service.create_post(board, submission.form).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// GET /api/board/images/{image}
pub async fn get_image(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let image = data.service.get_image(&path.into_inner()).await?;

    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", header_safe(&image.name)),
        ))
        .body(image.data))
}

/// GET / and GET /{board}/
pub async fn board_page(
    data: web::Data<AppState>,
    path: Option<web::Path<String>>,
) -> Result<HttpResponse, ApiError> {
    let key = path.map(|p| p.into_inner()).unwrap_or_default();
    let html = BoardShellTemplate {
        title: "corkboard",
        board_key: &key,
        api_base: "/api/board",
        assets_base: data.client_assets.as_deref().map(|s| s.trim_end_matches('/')),
    }
    .render()
    .map_err(|e| ApiError(AppError::Internal(format!("template rendering failed: {e}"))))?;

    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}

/// Keeps printable ASCII so the filename fits in a quoted header parameter.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_safe_replaces_quotes_and_non_ascii() {
        assert_eq!(header_safe("cat.png"), "cat.png");
        assert_eq!(header_safe("a\"b\\c.png"), "a_b_c.png");
        assert_eq!(header_safe("кот.png"), "___.png");
    }

    #[test]
    fn parse_count_rejects_non_numbers() {
        assert_eq!(parse_count(" 42 ", "index").unwrap(), 42);
        assert_eq!(parse_count("-3", "index").unwrap(), -3);
        assert!(parse_count("ten", "amount").is_err());
        assert!(parse_count("", "amount").is_err());
    }
}

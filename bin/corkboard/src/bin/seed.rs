//! # seed
//!
//! Operator tool for boards, which have no HTTP surface.
//!
//! ```text
//! seed create <title> [description] [background-image]
//! seed list
//! seed delete <board-id>
//! ```

use bytes::Bytes;
use cb_core::{BoardForm, Upload};
use corkboard::settings::Settings;

const USAGE: &str = "usage: seed create <title> [description] [background-image] | seed list | seed delete <board-id>";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = Settings::load()?;
    let service = corkboard::build_service(&settings).await?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["create", title, rest @ ..] => {
            let description = rest.first().copied().unwrap_or_default().to_string();
            let background = match rest.get(1) {
                Some(path) => Some(Upload {
                    filename: std::path::Path::new(path)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.to_string()),
                    data: Bytes::from(tokio::fs::read(path).await?),
                }),
                None => None,
            };
            let board = service
                .create_board(BoardForm {
                    title: title.to_string(),
                    description,
                    background,
                })
                .await?;
            println!("{}  /{}/", board.id, board.id);
        }
        ["list"] => {
            for board in service.list_boards().await? {
                println!("{}  {}", board.id, board.title);
            }
        }
        ["delete", id] => {
            service.delete_board(id).await?;
            println!("deleted {id}");
        }
        _ => anyhow::bail!(USAGE),
    }
    Ok(())
}

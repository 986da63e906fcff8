use askama::Template;

/// The page the single-page client boots from. The client reads `board_key`
/// and fetches everything else through the JSON API.
///
/// The client bundle is hosted elsewhere; without `assets_base` the page
/// links no assets.
#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardShellTemplate<'a> {
    pub title: &'a str,
    pub board_key: &'a str,
    pub api_base: &'a str,
    pub assets_base: Option<&'a str>,
}

//! corkboard/crates/cb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for corkboard.

pub mod error;
pub mod models;
pub mod services;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use services::*;
pub use traits::*;
pub use validation::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use bytes::Bytes;

    #[test]
    fn identical_uploads_get_distinct_ids() {
        let a = Image::new("same.png", Bytes::from_static(b"abc"));
        let b = Image::new("same.png", Bytes::from_static(b"abc"));
        assert_ne!(a.id, b.id);
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn post_view_without_photo_serialises_null() {
        let view = PostView {
            name: String::new(),
            message: "hello".into(),
            photo: None,
        };
        assert_eq!(
            serde_json::to_value(view).unwrap(),
            serde_json::json!({ "name": "", "message": "hello", "photo": null })
        );
    }
}

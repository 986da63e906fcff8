//! # Form Validation
//!
//! Input checks for new posts and boards. Storage accepts any row; these
//! checks are the only place the "message or photo" rule is enforced.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;

use bytes::Bytes;
use image::{ImageReader, Limits};
use serde::Serialize;

pub const NAME_MAX_CHARS: usize = 50;
pub const MESSAGE_MAX_CHARS: usize = 500;
pub const BOARD_TITLE_MAX_CHARS: usize = 100;
pub const BOARD_DESCRIPTION_MAX_CHARS: usize = 200;

/// Largest width or height accepted for an uploaded image.
pub const IMAGE_MAX_DIMENSION: u32 = 8192;
/// Upper bound on memory a single image decode may allocate.
pub const IMAGE_MAX_DECODE_BYTES: u64 = 128 * 1024 * 1024;

pub const MISSING_CONTENT: &str = "At least one photo or message must exist.";
pub const NOT_AN_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Per-field error messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// An uploaded file as received from the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub filename: String,
    pub data: Bytes,
}

/// Raw post submission. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostForm {
    pub name: Option<String>,
    pub message: Option<String>,
    pub photo: Option<Upload>,
}

/// A post submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanPost {
    pub name: String,
    pub message: String,
    pub photo: Option<Upload>,
}

impl PostForm {
    /// Checks field limits and the message-or-photo rule.
    ///
    /// Text fields are trimmed; a whitespace-only message counts as absent.
    /// When both message and photo are missing, both fields carry the error.
    pub fn validate(self) -> Result<CleanPost, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = clean_text(self.name);
        check_length(&mut errors, "name", &name, NAME_MAX_CHARS);

        let message = clean_text(self.message);
        check_length(&mut errors, "message", &message, MESSAGE_MAX_CHARS);

        if let Some(photo) = &self.photo {
            if !is_image(&photo.data) {
                errors.add("photo", NOT_AN_IMAGE);
            }
        }

        if message.is_empty() && self.photo.is_none() {
            errors.add("message", MISSING_CONTENT);
            errors.add("photo", MISSING_CONTENT);
        }

        errors.into_result(CleanPost {
            name,
            message,
            photo: self.photo,
        })
    }
}

/// Raw board submission from the operator tooling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardForm {
    pub title: String,
    pub description: String,
    pub background: Option<Upload>,
}

impl BoardForm {
    pub fn validate(self) -> Result<BoardForm, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = self.title.trim().to_string();
        if title.is_empty() {
            errors.add("title", "This field is required.");
        }
        check_length(&mut errors, "title", &title, BOARD_TITLE_MAX_CHARS);

        let description = self.description.trim().to_string();
        check_length(&mut errors, "description", &description, BOARD_DESCRIPTION_MAX_CHARS);

        if let Some(bg) = &self.background {
            if !is_image(&bg.data) {
                errors.add("background", NOT_AN_IMAGE);
            }
        }

        errors.into_result(BoardForm {
            title,
            description,
            background: self.background,
        })
    }
}

/// Returns true when the payload decodes as an image in a known format.
///
/// Decoding is CPU bound; async callers should run this off the executor.
/// Images over the dimension or allocation limits are not accepted.
pub fn is_image(data: &[u8]) -> bool {
    if data.is_empty() {
        return false;
    }
    let mut reader = match ImageReader::new(Cursor::new(data)).with_guessed_format() {
        Ok(reader) => reader,
        Err(_) => return false,
    };
    if reader.format().is_none() {
        return false;
    }
    reader.limits(decode_limits());
    reader.decode().is_ok()
}

fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(IMAGE_MAX_DIMENSION);
    limits.max_image_height = Some(IMAGE_MAX_DIMENSION);
    limits.max_alloc = Some(IMAGE_MAX_DECODE_BYTES);
    limits
}

fn clean_text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn check_length(errors: &mut ValidationErrors, field: &'static str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

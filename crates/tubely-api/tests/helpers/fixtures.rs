use axum_test::multipart::{MultipartForm, Part};

/// A few bytes that look like the start of an MP4 file.
pub fn sample_mp4() -> Vec<u8> {
    let mut data = b"\x00\x00\x00\x18ftypmp42\x00\x00\x00\x00mp42isom".to_vec();
    data.extend(std::iter::repeat(0xAB).take(4096));
    data
}

/// PNG signature followed by filler; thumbnails are stored as-is, never decoded.
pub fn sample_png() -> Vec<u8> {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    data.extend(std::iter::repeat(0x00).take(64));
    data
}

/// Single-part multipart form.
pub fn file_form(field: &str, data: Vec<u8>, file_name: &str, mime_type: &str) -> MultipartForm {
    let part = Part::bytes(data).file_name(file_name).mime_type(mime_type);
    MultipartForm::new().add_part(field.to_string(), part)
}

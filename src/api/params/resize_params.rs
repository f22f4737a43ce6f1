use crate::{core::algorithm::ResizeMode, error::ApiError};

use super::FormData;

pub struct ImageResizeParams {
    pub blob: Vec<u8>,
    pub file_name: Option<String>,
    pub width: u32,
    pub height: u32,
    pub mode: ResizeMode,
}

impl ImageResizeParams {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.blob.is_empty() {
            return Err(ApiError::bad_request("upload image is empty"));
        }

        if self.width == 0 || self.height == 0 {
            return Err(ApiError::bad_request("width and height must be positive"));
        }

        Ok(())
    }

    pub fn from_form(mut form: FormData) -> Result<ImageResizeParams, ApiError> {
        let Some(file) = form.take_file("file") else {
            return Err(ApiError::bad_request("file is required"));
        };

        // checked before anything tries to decode the bytes
        let is_image = file
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"));
        if !is_image {
            return Err(ApiError::bad_request("File must be an image"));
        }

        let mode = if form.flag("maintain_aspect", false)? {
            ResizeMode::Fit
        } else {
            ResizeMode::Exact
        };

        let params = ImageResizeParams {
            blob: file.data,
            file_name: file.file_name,
            width: form.parse_required("width")?,
            height: form.parse_required("height")?,
            mode,
        };
        params.validate()?;

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{form, with_file};
    use super::*;

    #[test]
    fn reads_fields() {
        let f = with_file(
            form(&[("width", "100"), ("height", "50"), ("maintain_aspect", "true")]),
            "file",
            "image/png",
            vec![1, 2, 3],
        );
        let p = ImageResizeParams::from_form(f).unwrap();
        assert_eq!((p.width, p.height), (100, 50));
        assert_eq!(p.mode, ResizeMode::Fit);
        assert_eq!(p.blob, vec![1, 2, 3]);
    }

    #[test]
    fn aspect_defaults_to_exact() {
        let f = with_file(
            form(&[("width", "10"), ("height", "10")]),
            "file",
            "image/jpeg",
            vec![0],
        );
        assert_eq!(ImageResizeParams::from_form(f).unwrap().mode, ResizeMode::Exact);
    }

    #[test]
    fn rejects_non_images_and_bad_sizes() {
        let fields = [("width", "10"), ("height", "10")];

        let text = with_file(form(&fields), "file", "text/plain", vec![0]);
        let err = ImageResizeParams::from_form(text).err().unwrap();
        assert_eq!(err.to_string(), "File must be an image");

        assert!(ImageResizeParams::from_form(form(&fields)).is_err());

        let zero = with_file(form(&[("width", "0"), ("height", "10")]), "file", "image/png", vec![0]);
        assert!(ImageResizeParams::from_form(zero).is_err());

        let missing = with_file(form(&[("width", "10")]), "file", "image/png", vec![0]);
        assert!(ImageResizeParams::from_form(missing).is_err());

        let empty = with_file(form(&fields), "file", "image/png", vec![]);
        assert!(ImageResizeParams::from_form(empty).is_err());
    }
}

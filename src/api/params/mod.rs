use std::{collections::HashMap, str::FromStr};

use poem::{
    web::{Form, Multipart},
    FromRequest, Request, RequestBody,
};

use crate::error::ApiError;

pub mod qr_params;
pub mod resize_params;
pub mod video_params;

pub struct UploadedFile {
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// Submitted form split into text fields and uploaded files. Accepts
/// `multipart/form-data` and `application/x-www-form-urlencoded`; a multipart
/// part with a file name is a file, anything else is text. Later duplicates
/// win.
#[derive(Default)]
pub struct FormData {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl<'a> FromRequest<'a> for FormData {
    async fn from_request(req: &'a Request, body: &mut RequestBody) -> poem::Result<Self> {
        let content_type = req
            .content_type()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, body)
                .await
                .map_err(|e| ApiError::bad_request(format!("malformed form data: {e}")))?;
            Ok(Self::from_multipart(multipart).await?)
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(texts) = Form::<HashMap<String, String>>::from_request(req, body)
                .await
                .map_err(|e| ApiError::bad_request(format!("malformed form data: {e}")))?;
            Ok(FormData {
                texts,
                files: HashMap::new(),
            })
        } else if content_type.is_empty() {
            // nothing submitted, required fields report themselves
            Ok(FormData::default())
        } else {
            Err(ApiError::bad_request(format!("unsupported content type: {content_type}")).into())
        }
    }
}

impl FormData {
    async fn from_multipart(mut multipart: Multipart) -> Result<FormData, ApiError> {
        let mut form = FormData::default();

        loop {
            let field = multipart
                .next_field()
                .await
                .map_err(|e| ApiError::bad_request(format!("malformed form data: {e}")))?;
            let Some(field) = field else {
                break;
            };

            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            if field.file_name().is_some() {
                let content_type = field.content_type().map(ToString::to_string);
                let file_name = field.file_name().map(ToString::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("cannot read {name}: {e}")))?;
                form.files.insert(
                    name,
                    UploadedFile {
                        content_type,
                        file_name,
                        data,
                    },
                );
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("cannot read {name}: {e}")))?;
                form.texts.insert(name, text);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    /// Missing and empty values are both rejected.
    pub fn required(&self, name: &str) -> Result<&str, ApiError> {
        match self.text(name) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(ApiError::bad_request(format!("{name} is required"))),
        }
    }

    pub fn parse_required<T: FromStr>(&self, name: &str) -> Result<T, ApiError> {
        let raw = self.required(name)?;
        parse_field(name, raw)
    }

    pub fn parse_or<T: FromStr>(&self, name: &str, default: T) -> Result<T, ApiError> {
        match self.text(name) {
            Some(raw) if !raw.trim().is_empty() => parse_field(name, raw),
            _ => Ok(default),
        }
    }

    pub fn flag(&self, name: &str, default: bool) -> Result<bool, ApiError> {
        match self.text(name).map(str::trim) {
            None | Some("") => Ok(default),
            Some(raw) => parse_bool(raw)
                .ok_or_else(|| ApiError::bad_request(format!("{name} must be a boolean"))),
        }
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

fn parse_field<T: FromStr>(name: &str, raw: &str) -> Result<T, ApiError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ApiError::bad_request(format!("{name} has an invalid value: {raw:?}")))
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData {
            texts: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }

    pub(crate) fn with_file(mut form: FormData, name: &str, content_type: &str, data: Vec<u8>) -> FormData {
        form.files.insert(
            name.to_string(),
            UploadedFile {
                content_type: Some(content_type.to_string()),
                file_name: Some("upload".to_string()),
                data,
            },
        );
        form
    }

    #[test]
    fn bools_accept_common_spellings() {
        for raw in ["true", "True", "1", "yes", "on"] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["false", "FALSE", "0", "no", "off"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn defaults_and_errors() {
        let f = form(&[("size", "12"), ("border", " "), ("bad", "x"), ("empty", "")]);

        assert_eq!(f.parse_or("size", 10u32).unwrap(), 12);
        assert_eq!(f.parse_or("border", 4u32).unwrap(), 4);
        assert_eq!(f.parse_or("absent", 4u32).unwrap(), 4);
        assert!(f.parse_or("bad", 4u32).is_err());
        assert!(f.required("empty").is_err());
        assert!(f.required("absent").is_err());
        assert!(f.flag("absent", false).is_ok_and(|v| !v));
        assert!(f.flag("bad", false).is_err());
    }
}

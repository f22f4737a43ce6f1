use crate::error::ApiError;

use super::FormData;

pub struct QrParams {
    pub text: String,

    // pixels per module
    pub size: u32,

    // quiet zone, in modules
    pub border: u32,
}

impl QrParams {
    pub fn from_form(form: &FormData) -> Result<QrParams, ApiError> {
        let params = QrParams {
            text: form.required("text")?.to_string(),
            size: form.parse_or("size", 10)?,
            border: form.parse_or("border", 4)?,
        };

        if params.size == 0 {
            return Err(ApiError::bad_request("size must be at least 1"));
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::form;
    use super::*;

    #[test]
    fn applies_defaults() {
        let p = QrParams::from_form(&form(&[("text", "hello")])).unwrap();
        assert_eq!(p.text, "hello");
        assert_eq!((p.size, p.border), (10, 4));
    }

    #[test]
    fn validates_fields() {
        assert!(QrParams::from_form(&form(&[])).is_err());
        assert!(QrParams::from_form(&form(&[("text", "a"), ("size", "0")])).is_err());
        assert!(QrParams::from_form(&form(&[("text", "a"), ("border", "-1")])).is_err());

        let p = QrParams::from_form(&form(&[("text", "a"), ("size", "3"), ("border", "0")]))
            .unwrap();
        assert_eq!((p.size, p.border), (3, 0));
    }
}

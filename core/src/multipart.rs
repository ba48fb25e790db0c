//! `multipart/form-data` payloads for requests that carry audio.
//!
//! A `Form` only describes its parts. Encoding (boundary, header escaping)
//! is left to `reqwest` when the transport sends the request, so a built
//! request can still be inspected part by part.

use reqwest::blocking::multipart;

use crate::error::{ApiError, Result};

/// One field of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

impl Part {
    pub fn name(&self) -> &str {
        match self {
            Part::Text { name, .. } | Part::File { name, .. } => name,
        }
    }
}

/// A form under construction. Parts are sent in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    parts: Vec<Part>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.parts.push(Part::Text {
            name: name.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(Part::File {
            name: name.into(),
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        });
        self
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Value of the first text part called `name`.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            Part::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Content of the first file part called `name`.
    pub fn file_bytes(&self, name: &str) -> Option<&[u8]> {
        self.parts.iter().find_map(|part| match part {
            Part::File { name: n, bytes, .. } if n == name => Some(bytes.as_slice()),
            _ => None,
        })
    }

    /// Hands the parts over to `reqwest` for encoding.
    pub fn into_reqwest(self) -> Result<multipart::Form> {
        self.parts
            .into_iter()
            .try_fold(multipart::Form::new(), |form, part| match part {
                Part::Text { name, value } => Ok(form.text(name, value)),
                Part::File {
                    name,
                    filename,
                    content_type,
                    bytes,
                } => {
                    let file = multipart::Part::bytes(bytes)
                        .file_name(filename)
                        .mime_str(&content_type)
                        .map_err(|e| {
                            ApiError::InvalidInput(format!("content type {content_type:?}: {e}"))
                        })?;
                    Ok(form.part(name, file))
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> Form {
        Form::new()
            .file("audio", "audio", "audio/wav", b"RIFF".to_vec())
            .text("channel", 2)
            .text("calibration", "telephone-channel")
    }

    #[test]
    fn keeps_parts_in_insertion_order() {
        let form = form();
        let names: Vec<&str> = form.parts().iter().map(Part::name).collect();
        assert_eq!(names, ["audio", "channel", "calibration"]);
    }

    #[test]
    fn looks_up_parts_by_name() {
        let form = form();
        assert_eq!(form.text_value("channel"), Some("2"));
        assert_eq!(form.file_bytes("audio"), Some(&b"RIFF"[..]));
        assert_eq!(form.text_value("audio"), None);
        assert_eq!(form.file_bytes("missing"), None);
    }

    #[test]
    fn converts_names_that_need_escaping() {
        let form = Form::new()
            .text("quoted \"name\"", "v")
            .file("line\r\nbreak", "a\"b.wav", "audio/wav", Vec::new());
        let encoded = form.into_reqwest().unwrap();
        assert!(!encoded.boundary().is_empty());
    }

    #[test]
    fn rejects_malformed_content_type() {
        let err = Form::new()
            .file("audio", "audio", "not a mime type", b"RIFF".to_vec())
            .into_reqwest()
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}

//! Multipart form reader for the admin create/edit routes.

use crate::error::ApiResult;
use axum::extract::Multipart;
use mtg_core::{ImageUpload, ShopError, ShopResult};
use std::collections::HashMap;
use std::str::FromStr;

/// Text fields and files of one multipart body
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<ImageUpload>,
}

impl FormData {
    /// Drain a multipart body. Parts with a file name are files, the rest text.
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    if file_name.is_empty() && bytes.is_empty() {
                        // browsers send an empty part for an untouched file input
                        continue;
                    }
                    form.files
                        .push(ImageUpload::new(name, file_name, content_type, bytes.to_vec()));
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Non-blank text field
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn required(&self, name: &str) -> ShopResult<String> {
        self.text(name)
            .ok_or_else(|| ShopError::InvalidRequest(format!("{} is required", name)))
    }

    /// Parse an optional field, rejecting values that don't parse
    pub fn parse<T: FromStr>(&self, name: &str) -> ShopResult<Option<T>> {
        match self.text(name) {
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                ShopError::InvalidRequest(format!("invalid value for {}: {}", name, raw))
            }),
            None => Ok(None),
        }
    }

    /// Take the file sent under `name`, if any
    pub fn take_file(&mut self, name: &str) -> Option<ImageUpload> {
        let index = self.files.iter().position(|f| f.field == name)?;
        Some(self.files.remove(index))
    }
}

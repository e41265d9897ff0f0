use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use client_core::{Attachment, ItemFields};
use serde_json::Value;

/// `key=value` sends a string, `key:=json` sends the value as JSON.
pub fn parse_field(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value or key:=json, got '{raw}'"))?;
    if let Some(key) = key.strip_suffix(':') {
        let key = checked_key(key, raw)?;
        let value = serde_json::from_str(value)
            .with_context(|| format!("field '{key}' is not valid JSON: {value}"))?;
        return Ok((key, value));
    }
    Ok((checked_key(key, raw)?, Value::String(value.to_string())))
}

fn checked_key(key: &str, raw: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() {
        bail!("missing field name in '{raw}'");
    }
    Ok(key.to_string())
}

/// `field=path/to/file`.
pub async fn load_attachment(raw: &str) -> Result<Attachment> {
    let (field, path) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected field=path, got '{raw}'"))?;
    let path = Path::new(path);
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("could not read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("attachment.bin")
        .to_string();
    let mime_type = mime_guess::from_path(path).first_raw().map(str::to_string);
    Ok(Attachment {
        field: checked_key(field, raw)?,
        filename,
        mime_type,
        bytes,
    })
}

pub async fn build_fields(fields: &[String], attachments: &[String]) -> Result<ItemFields> {
    let mut item = ItemFields::new();
    for raw in fields {
        let (key, value) = parse_field(raw)?;
        item = item.with(key, value);
    }
    for raw in attachments {
        item = item.attach(load_attachment(raw).await?);
    }
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_stay_strings() {
        let (key, value) = parse_field("phone=5551234").expect("field");
        assert_eq!(key, "phone");
        assert_eq!(value, Value::String("5551234".into()));

        let (_, value) = parse_field("url=https://uni.mx/?a=b").expect("field");
        assert_eq!(value, Value::String("https://uni.mx/?a=b".into()));
    }

    #[test]
    fn json_values_are_decoded() {
        let (key, value) = parse_field("required:=true").expect("field");
        assert_eq!(key, "required");
        assert_eq!(value, Value::Bool(true));

        assert!(parse_field("required:=yes").is_err());
    }

    #[test]
    fn malformed_fields_are_rejected() {
        assert!(parse_field("name").is_err());
        assert!(parse_field("=Becas").is_err());
    }

    #[tokio::test]
    async fn attachment_mime_comes_from_extension() {
        let dir = std::env::temp_dir().join(format!("dashboard-admin-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.expect("dir");
        let path = dir.join("plan.pdf");
        tokio::fs::write(&path, b"%PDF-1.4").await.expect("write");

        let attachment = load_attachment(&format!("file={}", path.display()))
            .await
            .expect("attachment");

        assert_eq!(attachment.field, "file");
        assert_eq!(attachment.filename, "plan.pdf");
        assert_eq!(attachment.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(attachment.bytes, b"%PDF-1.4");
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}

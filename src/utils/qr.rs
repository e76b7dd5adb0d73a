use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use qrcode::QrCode;
use qrcode::render::svg;

use crate::errors::{CondensrError, Result};

/// Render `content` as an SVG QR code wrapped in a `data:` URI
pub fn qr_data_uri(content: &str, min_size: u32) -> Result<String> {
    let code = QrCode::new(content.as_bytes())
        .map_err(|e| CondensrError::validation(format!("QR code generation error: {}", e)))?;

    let image = code
        .render::<svg::Color>()
        .min_dimensions(min_size, min_size)
        .quiet_zone(true)
        .build();

    Ok(format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(image.as_bytes())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_data_uri() {
        let uri = qr_data_uri("https://cdsr.io/abc123", 200).unwrap();
        let encoded = uri.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        assert!(decoded.contains("<svg"));
    }
}

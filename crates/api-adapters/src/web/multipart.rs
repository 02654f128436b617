//! Product form parsing (`multipart/form-data`).
//!
//! Text parts `name` and `description`, optional file part `image`. Unknown
//! parts are skipped; a file part without bytes counts as no file.

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use domains::{NewProduct, ProductPatch, Upload};
use mime::Mime;

use super::error::{body_error, ApiError};

#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<Upload>,
}

impl From<ProductForm> for NewProduct {
    fn from(form: ProductForm) -> Self {
        NewProduct {
            name: form.name,
            description: form.description,
            image: form.image,
        }
    }
}

impl From<ProductForm> for ProductPatch {
    fn from(form: ProductForm) -> Self {
        ProductPatch {
            name: form.name,
            description: form.description,
            image: form.image,
        }
    }
}

fn malformed(err: MultipartError) -> ApiError {
    body_error(err.status(), format!("malformed form data: {}", err.body_text()))
}

pub async fn read_product_form(mut multipart: Multipart) -> Result<ProductForm, ApiError> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("name") => form.name = Some(field.text().await.map_err(malformed)?),
            Some("description") => form.description = Some(field.text().await.map_err(malformed)?),
            Some("image") => {
                let filename = field.file_name().map(str::to_owned);
                let declared = field.content_type().and_then(|c| c.parse::<Mime>().ok());
                let data = field.bytes().await.map_err(malformed)?;
                if data.is_empty() {
                    continue;
                }
                form.image = Some(Upload {
                    content_type: content_type(declared, filename.as_deref()),
                    filename,
                    data,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

/// The declared type wins unless it is missing or the generic
/// `application/octet-stream`, in which case the file name is consulted.
fn content_type(declared: Option<Mime>, filename: Option<&str>) -> Mime {
    declared
        .filter(|m| *m != mime::APPLICATION_OCTET_STREAM)
        .or_else(|| filename.and_then(|f| mime_guess::from_path(f).first()))
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_type_preferred_over_extension() {
        assert_eq!(
            content_type(Some(mime::IMAGE_JPEG), Some("photo.png")),
            mime::IMAGE_JPEG
        );
    }

    #[test]
    fn octet_stream_falls_back_to_extension() {
        assert_eq!(
            content_type(Some(mime::APPLICATION_OCTET_STREAM), Some("photo.png")),
            mime::IMAGE_PNG
        );
        assert_eq!(content_type(None, None), mime::APPLICATION_OCTET_STREAM);
    }
}

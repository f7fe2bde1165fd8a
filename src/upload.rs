//! Multipart upload handling for product creation
//!
//! Reads the create form, enforcing the image field's type and size limits
//! before anything leaves the process.

use crate::api::ApiError;
use crate::media::mime::{is_image_mime, sniff_image_mime};
use crate::media::ImageFile;
use crate::validation::ProductFields;
use axum::async_trait;
use axum::body::Bytes;
use axum::extract::multipart::Field;
use axum::extract::{FromRequest, Multipart, Request};
use tracing::{debug, warn};

/// Name of the file field carrying the product image.
pub const IMAGE_FIELD: &str = "image";

/// Largest accepted image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Request body limit for the create form: the image plus room for text fields.
pub const MAX_FORM_BYTES: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// A parsed create form. The image is optional here; the route decides
/// whether it is required.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub fields: ProductFields,
    pub image: Option<ImageFile>,
}

#[async_trait]
impl<S> FromRequest<S> for ProductForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Multipart::from_request(req, state).await {
            Ok(multipart) => read_form(multipart).await,
            Err(rejection) => {
                // Bodies that are not multipart carry no file.
                debug!("Create request is not multipart: {}", rejection);
                Ok(Self::default())
            }
        }
    }
}

async fn read_form(mut multipart: Multipart) -> Result<ProductForm, ApiError> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() {
            if name != IMAGE_FIELD || form.image.is_some() {
                return Err(ApiError::UnexpectedField(name));
            }
            form.image = Some(read_image(field).await?);
        } else if name == IMAGE_FIELD {
            // The image field must carry a file, not text.
            return Err(ApiError::UnexpectedField(name));
        } else {
            let value = field.text().await?;
            if !form.fields.set(&name, value) {
                debug!("Ignoring unknown form field '{}'", name);
            }
        }
    }

    Ok(form)
}

async fn read_image(mut field: Field<'_>) -> Result<ImageFile, ApiError> {
    let declared = field.content_type().map(str::to_string);
    if let Some(content_type) = &declared {
        if !is_image_mime(content_type) {
            warn!("Rejected upload with content type '{}'", content_type);
            return Err(ApiError::InvalidFileType);
        }
    }

    let file_name = field.file_name().map(str::to_string);
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if data.len() + chunk.len() > MAX_IMAGE_BYTES {
            warn!(
                "Rejected upload over {} bytes ({:?})",
                MAX_IMAGE_BYTES, file_name
            );
            return Err(ApiError::FileTooLarge);
        }
        data.extend_from_slice(&chunk);
    }

    let content_type = match declared {
        Some(content_type) => content_type,
        None => sniff_image_mime(&data)
            .ok_or(ApiError::InvalidFileType)?
            .to_string(),
    };

    debug!(
        "Received image {:?} ({}, {} bytes)",
        file_name,
        content_type,
        data.len()
    );

    Ok(ImageFile {
        file_name,
        content_type,
        data: Bytes::from(data),
    })
}

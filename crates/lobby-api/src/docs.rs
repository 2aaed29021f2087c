//! Document upload for the retrieval index

use std::path::Path;

use reqwest::multipart::{Form, Part};

use crate::client::ApiClient;
use crate::error::{Error, Result};
use crate::types::UploadReceipt;

impl ApiClient {
    /// Upload documents as a multipart request, one `files` part per path
    pub async fn upload_docs(&self, paths: &[&Path]) -> Result<UploadReceipt> {
        let mut form = Form::new();
        for path in paths {
            let bytes = tokio::fs::read(path).await.map_err(Error::Io)?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.bin".to_string());
            form = form.part("files", Part::bytes(bytes).file_name(filename));
        }

        let response = self
            .authorize(self.http.post(self.url("/docs/upload")).multipart(form))
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }
}

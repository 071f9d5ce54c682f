//! Document text extraction through S3 and Textract.
//!
//! The upload is staged under `uploads/` in the configured bucket, an
//! asynchronous text detection job is started against it and polled until it
//! settles, then the object is removed again. The whole sequence runs on its
//! own task, so a caller dropped by the request timeout still removes the
//! object.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_textract::error::DisplayErrorContext;
use aws_sdk_textract::types::{Block, BlockType, DocumentLocation, JobStatus, S3Object};

use crate::config::{AwsSettings, S3_UPLOAD_PREFIX, TEXTRACT_MAX_POLLS, TEXTRACT_POLL_INTERVAL_SECS};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Turns an uploaded document into plain text.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// `Ok(None)` when the document was processed but yielded no text.
    async fn extract_text(&self, bytes: Vec<u8>, file_name: &str) -> AppResult<Option<String>>;
}

#[derive(Clone)]
pub struct TextractExtractor {
    s3: aws_sdk_s3::Client,
    textract: aws_sdk_textract::Client,
    bucket: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl TextractExtractor {
    /// Build S3 and Textract clients from the static credentials in config.
    pub async fn connect(settings: &AwsSettings) -> Self {
        let credentials = Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key().to_string(),
            None,
            None,
            "environment",
        );

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        tracing::info!(
            region = %settings.region,
            bucket = %settings.bucket,
            "Initialized S3 and Textract clients"
        );

        Self {
            s3: aws_sdk_s3::Client::new(&shared),
            textract: aws_sdk_textract::Client::new(&shared),
            bucket: settings.bucket.clone(),
            poll_interval: Duration::from_secs(TEXTRACT_POLL_INTERVAL_SECS),
            max_polls: TEXTRACT_MAX_POLLS,
        }
    }

    async fn upload(&self, key: &str, bytes: Vec<u8>) -> AppResult<()> {
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| aws_error("S3 upload", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn remove(&self, key: &str) {
        if let Err(e) = self
            .s3
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            tracing::warn!(key = %key, "Failed to delete staged upload: {}", DisplayErrorContext(&e));
        }
    }

    async fn detect(&self, key: &str) -> AppResult<Option<String>> {
        let location = DocumentLocation::builder()
            .s3_object(S3Object::builder().bucket(&self.bucket).name(key).build())
            .build();

        let started = self
            .textract
            .start_document_text_detection()
            .document_location(location)
            .send()
            .await
            .map_err(|e| aws_error("Textract start", DisplayErrorContext(&e)))?;

        let job_id = started
            .job_id()
            .ok_or_else(|| AppError::upstream("Textract returned no job id"))?
            .to_string();
        tracing::info!(job_id = %job_id, "Textract job started");

        for _ in 0..self.max_polls {
            let first = self.page(&job_id, None).await?;

            match first.job_status() {
                Some(JobStatus::Succeeded) | Some(JobStatus::PartialSuccess) => {
                    let mut lines = line_texts(first.blocks());
                    let mut next = first.next_token().map(str::to_owned);

                    while let Some(token) = next {
                        let page = self.page(&job_id, Some(token)).await?;
                        lines.extend(line_texts(page.blocks()));
                        next = page.next_token().map(str::to_owned);
                    }

                    tracing::info!(job_id = %job_id, lines = lines.len(), "Textract job finished");
                    return Ok(join_lines(lines));
                }
                Some(JobStatus::Failed) => {
                    tracing::error!(
                        job_id = %job_id,
                        reason = first.status_message().unwrap_or_default(),
                        "Document analysis failed"
                    );
                    return Ok(None);
                }
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }

        tracing::error!(job_id = %job_id, "Textract job did not finish in time");
        Err(AppError::Timeout)
    }

    async fn page(
        &self,
        job_id: &str,
        next_token: Option<String>,
    ) -> AppResult<aws_sdk_textract::operation::get_document_text_detection::GetDocumentTextDetectionOutput>
    {
        self.textract
            .get_document_text_detection()
            .job_id(job_id)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| aws_error("Textract poll", DisplayErrorContext(&e)))
    }
}

#[async_trait]
impl TextExtractor for TextractExtractor {
    async fn extract_text(&self, bytes: Vec<u8>, file_name: &str) -> AppResult<Option<String>> {
        let this = self.clone();
        let key = upload_key(file_name);

        detached(async move {
            this.upload(&key, bytes).await?;

            let result = this.detect(&key).await;
            this.remove(&key).await;
            result
        })
        .await
    }
}

/// Run `job` to completion on its own task, even if the caller is dropped.
async fn detached<T, F>(job: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(job)
        .await
        .map_err(|e| AppError::internal(format!("Extraction task failed: {}", e)))?
}

fn aws_error(operation: &str, error: impl std::fmt::Display) -> AppError {
    AppError::upstream(format!("{} failed: {}", operation, error))
}

/// `uploads/{file_name}`, keeping only the final path component.
pub fn upload_key(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("upload");
    format!("{}{}", S3_UPLOAD_PREFIX, base)
}

fn line_texts(blocks: &[Block]) -> Vec<String> {
    blocks
        .iter()
        .filter(|b| b.block_type() == Some(&BlockType::Line))
        .filter_map(|b| b.text().map(str::to_owned))
        .collect()
}

fn join_lines(lines: Vec<String>) -> Option<String> {
    let text = lines.join(" ");
    (!text.trim().is_empty()).then_some(text)
}

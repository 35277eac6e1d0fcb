//! AWS S3 object store.
//!
//! Forwards every store operation to a real S3 bucket.  Object history is
//! provided by the bucket's own versioning; when versioning is disabled on
//! the bucket, `list_versions` reports only what S3 retains.
//!
//! Key mapping: `{prefix}{key}`.  Credentials are resolved via the standard
//! AWS credential chain (env vars, `~/.aws/credentials`, IAM role, etc.)
//! unless explicit keys are configured.

use aws_sdk_s3::Client;
use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info};

use super::store::{ObjectStore, StoreError, StoreResult};

/// Object store backed by AWS S3.
pub struct AwsStore {
    /// AWS S3 SDK client.
    client: Client,
    /// The backing S3 bucket name.
    bucket: String,
    /// Key prefix for all objects in the backing bucket.
    prefix: String,
}

impl AwsStore {
    /// Create a new S3-backed store.
    ///
    /// Loads AWS credentials from the default credential chain and
    /// initializes the S3 client for the specified region.  An explicit
    /// endpoint URL and path-style addressing support S3-compatible
    /// services like MinIO and LocalStack.
    pub async fn new(
        bucket: String,
        region: String,
        prefix: String,
        endpoint_url: Option<String>,
        use_path_style: bool,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
    ) -> anyhow::Result<Self> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region));

        if let Some(ref endpoint) = endpoint_url {
            config_loader = config_loader.endpoint_url(endpoint);
        }

        // If explicit credentials are provided, inject them as static credentials.
        if let (Some(ref ak), Some(ref sk)) = (&access_key_id, &secret_access_key) {
            let creds = aws_sdk_s3::config::Credentials::new(
                ak,
                sk,
                None, // session_token
                None, // expiry
                "waypost-config",
            );
            config_loader = config_loader.credentials_provider(creds);
        }

        let sdk_config = config_loader.load().await;

        let s3_config_builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(use_path_style);

        let client = Client::from_conf(s3_config_builder.build());

        info!(
            "AWS store initialized: bucket={} prefix='{}'",
            bucket, prefix
        );

        Ok(Self {
            client,
            bucket,
            prefix,
        })
    }

    /// Map a logical key to the backing S3 key.
    fn s3_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Map a backing S3 key back to a logical key.
    fn logical_key<'a>(&self, s3_key: &'a str) -> &'a str {
        s3_key.strip_prefix(&self.prefix).unwrap_or(s3_key)
    }

    /// Map an AWS SDK error to a store error with context.
    fn map_sdk_error(context: &str, err: impl std::fmt::Display) -> StoreError {
        StoreError::Backend(anyhow::anyhow!("AWS S3 {context}: {err}"))
    }

    /// Continuation token for the next listing page.  `None` ends the loop;
    /// a truncated response without a token also ends it rather than
    /// repeating the same page.
    fn next_page_token(is_truncated: Option<bool>, token: Option<&str>) -> Option<String> {
        if is_truncated == Some(true) {
            token.map(|s| s.to_string())
        } else {
            None
        }
    }

    /// Marker pair for the next version-listing page.  `None` ends the loop;
    /// a truncated response without either marker also ends it.
    fn next_version_markers(
        is_truncated: Option<bool>,
        key_marker: Option<&str>,
        version_id_marker: Option<&str>,
    ) -> Option<(Option<String>, Option<String>)> {
        if is_truncated != Some(true) {
            return None;
        }
        if key_marker.is_none() && version_id_marker.is_none() {
            return None;
        }
        Some((
            key_marker.map(|s| s.to_string()),
            version_id_marker.map(|s| s.to_string()),
        ))
    }
}

impl ObjectStore for AwsStore {
    fn list_keys(&self) -> Pin<Box<dyn Future<Output = StoreResult<Vec<String>>> + Send + '_>> {
        Box::pin(async move {
            debug!("AWS list_objects_v2: bucket={}", self.bucket);

            let mut keys = Vec::new();
            let mut continuation_token: Option<String> = None;

            loop {
                let mut req = self
                    .client
                    .list_objects_v2()
                    .bucket(&self.bucket)
                    .prefix(&self.prefix);

                if let Some(ref token) = continuation_token {
                    req = req.continuation_token(token);
                }

                let resp = req
                    .send()
                    .await
                    .map_err(|e| Self::map_sdk_error("list_objects_v2", e))?;

                for obj in resp.contents() {
                    if let Some(key) = obj.key() {
                        keys.push(self.logical_key(key).to_string());
                    }
                }

                match Self::next_page_token(resp.is_truncated(), resp.next_continuation_token())
                {
                    Some(token) => continuation_token = Some(token),
                    None => break,
                }
            }

            Ok(keys)
        })
    }

    fn put(
        &self,
        key: &str,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = StoreResult<()>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let s3_key = self.s3_key(&key);

            debug!("AWS put_object: bucket={} key={}", self.bucket, s3_key);

            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&s3_key)
                .body(aws_sdk_s3::primitives::ByteStream::from(body))
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("put_object", e))?;

            Ok(())
        })
    }

    fn get(&self, key: &str) -> Pin<Box<dyn Future<Output = StoreResult<Bytes>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let s3_key = self.s3_key(&key);

            debug!("AWS get_object: bucket={} key={}", self.bucket, s3_key);

            let resp = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(&s3_key)
                .send()
                .await
                .map_err(|e| {
                    let service_err = e.into_service_error();
                    if service_err.is_no_such_key() {
                        StoreError::NotFound { key: key.clone() }
                    } else {
                        Self::map_sdk_error("get_object", service_err)
                    }
                })?;

            let body_bytes = resp
                .body
                .collect()
                .await
                .map_err(|e| Self::map_sdk_error("get_object body", e))?
                .into_bytes();

            Ok(Bytes::from(body_bytes.to_vec()))
        })
    }

    fn get_version(
        &self,
        key: &str,
        version_id: &str,
    ) -> Pin<Box<dyn Future<Output = StoreResult<Bytes>> + Send + '_>> {
        let key = key.to_string();
        let version_id = version_id.to_string();
        Box::pin(async move {
            let s3_key = self.s3_key(&key);

            debug!(
                "AWS get_object: bucket={} key={} version={}",
                self.bucket, s3_key, version_id
            );

            let resp = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(&s3_key)
                .version_id(&version_id)
                .send()
                .await
                .map_err(|e| {
                    let service_err = e.into_service_error();
                    let code = service_err.meta().code().unwrap_or("");
                    if service_err.is_no_such_key() || code == "NoSuchVersion" {
                        StoreError::NotFound { key: key.clone() }
                    } else {
                        Self::map_sdk_error("get_object (versioned)", service_err)
                    }
                })?;

            let body_bytes = resp
                .body
                .collect()
                .await
                .map_err(|e| Self::map_sdk_error("get_object body", e))?
                .into_bytes();

            Ok(Bytes::from(body_bytes.to_vec()))
        })
    }

    fn list_versions(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = StoreResult<Vec<String>>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let s3_key = self.s3_key(&key);

            debug!(
                "AWS list_object_versions: bucket={} prefix={}",
                self.bucket, s3_key
            );

            let mut version_ids = Vec::new();
            let mut key_marker: Option<String> = None;
            let mut version_id_marker: Option<String> = None;

            loop {
                let mut req = self
                    .client
                    .list_object_versions()
                    .bucket(&self.bucket)
                    .prefix(&s3_key);

                if let Some(ref marker) = key_marker {
                    req = req.key_marker(marker);
                }
                if let Some(ref marker) = version_id_marker {
                    req = req.version_id_marker(marker);
                }

                let resp = req
                    .send()
                    .await
                    .map_err(|e| Self::map_sdk_error("list_object_versions", e))?;

                // The prefix listing can match longer keys; keep exact matches only.
                for version in resp.versions() {
                    if version.key() == Some(s3_key.as_str()) {
                        if let Some(id) = version.version_id() {
                            version_ids.push(id.to_string());
                        }
                    }
                }

                match Self::next_version_markers(
                    resp.is_truncated(),
                    resp.next_key_marker(),
                    resp.next_version_id_marker(),
                ) {
                    Some((next_key, next_version)) => {
                        key_marker = next_key;
                        version_id_marker = next_version;
                    }
                    None => break,
                }
            }

            Ok(version_ids)
        })
    }
}

// -- Tests -------------------------------------------------------------------

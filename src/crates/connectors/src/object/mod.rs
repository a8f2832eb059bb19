//! Object store adapter.

#[cfg(feature = "s3")]
pub mod s3;
#[cfg(feature = "s3")]
pub mod sigv4;

#[cfg(feature = "s3")]
pub use s3::{S3Client, S3Connector};

use crate::cache::{ConnectionCache, Connector};
use crate::config::ConnectionConfig;
use crate::error::Result;
use std::path::Path;
use tooling::fs::create_dir_if_missing;
use tracing::info;

/// Anonymous read access to a bucket and its objects. `{bucket}` is
/// replaced by the bucket name.
pub const PUBLIC_READ_POLICY: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"AWS":["*"]},"Action":["s3:GetBucketLocation","s3:ListBucket"],"Resource":["arn:aws:s3:::{bucket}"]},{"Effect":"Allow","Principal":{"AWS":["*"]},"Action":["s3:GetObject"],"Resource":["arn:aws:s3:::{bucket}/*"]}]}"#;

/// [`PUBLIC_READ_POLICY`] for `bucket`.
pub fn public_read_policy(bucket: &str) -> String {
    PUBLIC_READ_POLICY.replace("{bucket}", bucket)
}

/// Operations an object-store connection supports.
pub trait ObjectSession {
    fn bucket_exists(&mut self, bucket: &str) -> Result<bool>;

    fn make_bucket(&mut self, bucket: &str) -> Result<()>;

    /// Replace the bucket policy with `policy` (JSON).
    fn set_bucket_policy(&mut self, bucket: &str, policy: &str) -> Result<()>;

    /// Upload the file at `source` as `name`.
    fn put_object(&mut self, bucket: &str, name: &str, source: &Path) -> Result<()>;

    /// Download `name` into the file at `target`.
    fn get_object(&mut self, bucket: &str, name: &str, target: &Path) -> Result<()>;
}

/// Cached object-store connection.
pub struct ObjectStore<C: Connector> {
    cache: ConnectionCache<C>,
}

impl<C> ObjectStore<C>
where
    C: Connector,
    C::Connection: ObjectSession,
{
    pub fn new(connector: C) -> Self {
        Self {
            cache: ConnectionCache::new(connector),
        }
    }

    /// Upload a local file and return its download URL,
    /// `{http|https}://{endpoint}/{bucket}/{name}`.
    pub fn upload(
        &self,
        config: &ConnectionConfig,
        bucket: &str,
        local_path: impl AsRef<Path>,
        name: &str,
    ) -> Result<String> {
        let scheme = if config.flag_or("secure", false)? { "https" } else { "http" };
        let endpoint = config.require("endpoint")?;

        self.cache
            .ensure(config)?
            .put_object(bucket, name, local_path.as_ref())?;
        Ok(format!("{}://{}/{}/{}", scheme, endpoint, bucket, name))
    }

    pub fn bucket_exists(&self, config: &ConnectionConfig, bucket: &str) -> Result<bool> {
        self.cache.ensure(config)?.bucket_exists(bucket)
    }

    /// Create `bucket` unless it exists, optionally granting public read.
    ///
    /// Returns `false` and changes nothing when the bucket already exists.
    pub fn create_bucket(&self, config: &ConnectionConfig, bucket: &str, public_read: bool) -> Result<bool> {
        let mut conn = self.cache.ensure(config)?;
        if conn.bucket_exists(bucket)? {
            return Ok(false);
        }
        conn.make_bucket(bucket)?;
        if public_read {
            conn.set_bucket_policy(bucket, &public_read_policy(bucket))?;
        }
        info!(bucket, public_read, "Bucket created");
        Ok(true)
    }

    /// Download `name` to `local_path`, creating parent directories.
    pub fn download(
        &self,
        config: &ConnectionConfig,
        bucket: &str,
        local_path: impl AsRef<Path>,
        name: &str,
    ) -> Result<()> {
        let local_path = local_path.as_ref();
        if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_if_missing(parent)?;
        }
        self.cache.ensure(config)?.get_object(bucket, name, local_path)
    }

    pub fn cache(&self) -> &ConnectionCache<C> {
        &self.cache
    }
}

#[cfg(feature = "s3")]
impl ObjectStore<S3Connector> {
    /// Store backed by an S3-compatible endpoint.
    pub fn s3() -> Self {
        Self::new(S3Connector)
    }
}

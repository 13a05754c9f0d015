use super::{InventoryProvider, ResourceInventory, RolePage};
use crate::config::ImporterConfig;
use crate::error::{ImportError, ImportResult};
use anyhow::{Result, anyhow};
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_config::profile::ProfileFileRegionProvider;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Region used when neither the command line nor the profile names one
pub const FALLBACK_REGION: &str = "us-east-1";

/// AWS-backed inventory: S3 `ListBuckets` and paginated IAM `ListRoles`.
///
/// The importer is synchronous, so the inventory owns a current-thread
/// runtime and blocks on each SDK call.
pub struct AwsInventory {
    runtime: Runtime,
    s3: aws_sdk_s3::Client,
    iam: aws_sdk_iam::Client,
}

impl AwsInventory {
    /// Open a session for `config.profile`.
    ///
    /// Fails when the profile's credentials cannot be resolved.
    pub fn connect(config: &ImporterConfig) -> ImportResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let sdk_config = runtime.block_on(load_sdk_config(
            &config.profile,
            config.region.as_deref(),
        ))?;

        tracing::debug!(
            profile = %config.profile,
            region = ?sdk_config.region(),
            "AWS session ready"
        );

        Ok(Self {
            s3: aws_sdk_s3::Client::new(&sdk_config),
            iam: aws_sdk_iam::Client::new(&sdk_config),
            runtime,
        })
    }
}

/// Connects an [`AwsInventory`] using the run's profile and region
pub struct AwsInventoryProvider;

impl InventoryProvider for AwsInventoryProvider {
    fn connect(&self, config: &ImporterConfig) -> ImportResult<Arc<dyn ResourceInventory>> {
        Ok(Arc::new(AwsInventory::connect(config)?))
    }
}

async fn load_sdk_config(
    profile: &str,
    region: Option<&str>,
) -> ImportResult<aws_config::SdkConfig> {
    let region_provider = RegionProviderChain::first_try(region.map(|r| Region::new(r.to_string())))
        .or_else(
            ProfileFileRegionProvider::builder()
                .profile_name(profile)
                .build(),
        )
        .or_else(Region::from_static(FALLBACK_REGION));

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .profile_name(profile)
        .region(region_provider)
        .load()
        .await;

    let credentials = sdk_config
        .credentials_provider()
        .ok_or_else(|| ImportError::Credentials {
            profile: profile.to_string(),
            message: "no credentials provider configured".to_string(),
        })?;

    credentials
        .provide_credentials()
        .await
        .map_err(|e| ImportError::Credentials {
            profile: profile.to_string(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

    Ok(sdk_config)
}

impl ResourceInventory for AwsInventory {
    fn list_buckets(&self) -> Result<Vec<String>> {
        let response = self
            .runtime
            .block_on(self.s3.list_buckets().send())
            .map_err(|e| anyhow!("ListBuckets failed: {}", DisplayErrorContext(&e)))?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }

    fn list_roles(&self, marker: Option<&str>) -> Result<RolePage> {
        let request = self.iam.list_roles().set_marker(marker.map(str::to_string));

        let response = self
            .runtime
            .block_on(request.send())
            .map_err(|e| anyhow!("ListRoles failed: {}", DisplayErrorContext(&e)))?;

        let names = response
            .roles()
            .iter()
            .map(|role| role.role_name().to_string())
            .collect();

        let next_marker = if response.is_truncated() {
            response.marker().map(str::to_string)
        } else {
            None
        };

        Ok(RolePage { names, next_marker })
    }
}

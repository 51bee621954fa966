//! AWS CodeArtifact generic-package store.

use async_trait::async_trait;
use aws_sdk_codeartifact as codeartifact;
use bytes::Bytes;
use codeartifact::error::{DisplayErrorContext, SdkError};
use codeartifact::primitives::ByteStream;
use codeartifact::types::{PackageFormat, PackageVersionStatus};

use crate::repository::naming::{AssetKey, PackageKey};
use crate::repository::store::{PackageStore, StoreError, VersionPage, LIST_PAGE_SIZE};

/// CodeArtifact client bound to the generic package format.
#[derive(Debug, Clone)]
pub struct CodeArtifactStore {
    client: codeartifact::Client,
}

impl CodeArtifactStore {
    /// Load AWS credentials from the default provider chain.
    pub async fn connect(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(codeartifact::config::Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;

        tracing::debug!(
            region = ?sdk_config.region().map(ToString::to_string),
            "CodeArtifact session initialized"
        );

        Self {
            client: codeartifact::Client::new(&sdk_config),
        }
    }
}

/// Classify an SDK error, keeping "resource not found" distinct.
fn classify<E, R>(err: SdkError<E, R>, is_not_found: impl Fn(&E) -> bool) -> StoreError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let not_found = err.as_service_error().is_some_and(is_not_found);
    let message = DisplayErrorContext(&err).to_string();
    if not_found {
        StoreError::NotFound(message)
    } else {
        StoreError::Service(message)
    }
}

#[async_trait]
impl PackageStore for CodeArtifactStore {
    async fn list_published_versions(
        &self,
        package: &PackageKey,
        next_token: Option<String>,
    ) -> Result<VersionPage, StoreError> {
        let location = &package.location;
        let output = self
            .client
            .list_package_versions()
            .domain(&location.domain)
            .set_domain_owner(location.domain_owner.clone())
            .repository(&location.repository)
            .format(PackageFormat::Generic)
            .namespace(&location.namespace)
            .package(&package.package)
            .status(PackageVersionStatus::Published)
            .max_results(LIST_PAGE_SIZE)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| classify(e, |e| e.is_resource_not_found_exception()))?;

        Ok(VersionPage {
            versions: output
                .versions()
                .iter()
                .map(|summary| summary.version().to_string())
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn get_asset(&self, asset: &AssetKey) -> Result<Bytes, StoreError> {
        let location = &asset.package.location;
        let output = self
            .client
            .get_package_version_asset()
            .domain(&location.domain)
            .set_domain_owner(location.domain_owner.clone())
            .repository(&location.repository)
            .format(PackageFormat::Generic)
            .namespace(&location.namespace)
            .package(&asset.package.package)
            .package_version(&asset.version)
            .asset(asset.asset_name())
            .send()
            .await
            .map_err(|e| classify(e, |e| e.is_resource_not_found_exception()))?;

        let body = output
            .asset
            .collect()
            .await
            .map_err(|e| StoreError::Service(format!("error reading asset body: {e}")))?;
        Ok(body.into_bytes())
    }

    async fn publish_asset(
        &self,
        asset: &AssetKey,
        content: Bytes,
        sha256: &str,
        unfinished: bool,
    ) -> Result<(), StoreError> {
        let location = &asset.package.location;
        self.client
            .publish_package_version()
            .domain(&location.domain)
            .set_domain_owner(location.domain_owner.clone())
            .repository(&location.repository)
            .format(PackageFormat::Generic)
            .namespace(&location.namespace)
            .package(&asset.package.package)
            .package_version(&asset.version)
            .asset_name(asset.asset_name())
            .asset_sha256(sha256)
            .asset_content(ByteStream::from(content))
            .unfinished(unfinished)
            .send()
            .await
            .map_err(|e| classify(e, |e| e.is_resource_not_found_exception()))?;
        Ok(())
    }
}

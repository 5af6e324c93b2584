use aws_config::meta::region::RegionProviderChain;
use aws_types::region::Region;

/// Region to pin into the AWS provider block.
///
/// An explicit region always wins. With `lookup` the AWS default chain is
/// consulted (environment, shared profile, IMDS). Otherwise nothing is
/// pinned and the provider resolves the region itself at apply time.
pub async fn resolve(explicit: Option<String>, lookup: bool) -> Option<String> {
    if !lookup {
        return explicit;
    }

    let region = RegionProviderChain::first_try(explicit.map(Region::new))
        .or_default_provider()
        .region()
        .await;

    return match region {
        Some(region) => {
            tracing::debug!(region = %region.as_ref(), "Resolved AWS region");
            Some(region.as_ref().to_string())
        }
        None => {
            tracing::warn!("No AWS region found in the default provider chain");
            None
        }
    };
}

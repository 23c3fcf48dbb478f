//! Print pod logs.

use anyhow::{Result, anyhow};
use osc_core::capability::PodLogs;
use osc_core::resource::Pod;

use super::connect;
use crate::config::Config;

pub async fn execute(pod: &str, container: Option<&str>, config: &Config) -> Result<()> {
    let client = connect(config).await?;
    let pod: Pod = client.get_typed(pod, None).await?;

    let logs = pod
        .capability::<PodLogs>()
        .await
        .ok_or_else(|| anyhow!("Server does not serve logs for {}", pod.identity()))?;
    print!("{}", logs.fetch(container).await?);
    Ok(())
}

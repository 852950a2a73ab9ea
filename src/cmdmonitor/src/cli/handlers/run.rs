use anyhow::Result;

use crate::config::Config;
use crate::daemon::Application;

pub async fn run(config: Config) -> Result<()> {
    Application::initialize(config).await?.run().await
}

//! Step content loading: each step's UI fragment plus its behaviour module.

use async_trait::async_trait;
use domain::StepId;
use reqwest::Client;
use tracing::info;

use crate::config::ClientConfig;
use crate::error::{Result, WizardError};
use crate::gateway::check;

/// Deterministic path of a step's behaviour module.
pub fn behaviour_module_path(step: StepId) -> String {
    format!("/static/js/create_prescription/steps/{}.js", step.as_str())
}

#[async_trait]
pub trait StepContentLoader: Send + Sync {
    /// Fetch and mount the step's fragment. On error nothing is mounted.
    async fn mount(&self, step: StepId, prescription_id: Option<&str>) -> Result<()>;
}

/// Receives fetched fragments.
pub trait FragmentSink: Send + Sync {
    fn mount(&self, step: StepId, html: &str, behaviour_module: &str);
}

/// Fetches fragments from the portal. Pass the gateway's client
/// ([`crate::HttpGateway::client`]) so fragment requests carry its cookies.
pub struct HttpContentLoader<S> {
    client: Client,
    config: ClientConfig,
    sink: S,
}

impl<S: FragmentSink> HttpContentLoader<S> {
    pub fn new(client: Client, config: ClientConfig, sink: S) -> Self {
        Self {
            client,
            config,
            sink,
        }
    }
}

#[async_trait]
impl<S: FragmentSink> StepContentLoader for HttpContentLoader<S> {
    async fn mount(&self, step: StepId, prescription_id: Option<&str>) -> Result<()> {
        let url = self.config.step_content_url(step.as_str());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(WizardError::network)?;
        let html = check(response)
            .await?
            .text()
            .await
            .map_err(WizardError::network)?;

        let module = behaviour_module_path(step);
        info!(
            "Mounted {} ({} bytes, module {}) for prescription {:?}",
            step,
            html.len(),
            module,
            prescription_id
        );
        self.sink.mount(step, &html, &module);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behaviour_modules_are_keyed_by_step_id() {
        assert_eq!(
            behaviour_module_path(StepId::Intrinsic),
            "/static/js/create_prescription/steps/intrinsic.js"
        );
    }
}

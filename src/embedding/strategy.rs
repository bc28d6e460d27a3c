//! Navigation versus form submission, and realizing the chosen plan on a surface.

use crate::embedding::params::{query_pairs, resolve_navigation_url, take_params};
use crate::embedding::{EmbeddingConfig, HostContext, StatePersistence};
use crate::error::EmbedError;
use crate::frame::{Frame, FrameCell, FrameSlot, FrameSpec, FrameSurface, HiddenForm};
use crate::types::{ApplicationType, ContainerId, FormPostPolicy};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// What the host wants embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRequest {
    pub app_type: ApplicationType,
    pub url: Url,
    /// The host is able to post forms into frames
    pub form_post_supported: bool,
    pub host: HostContext,
}

impl EmbedRequest {
    pub fn new(app_type: ApplicationType, url: Url) -> Self {
        Self {
            app_type,
            url,
            form_post_supported: true,
            host: HostContext::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum EmbeddingPlan {
    /// Create the frame with `url` as its source
    Navigate { url: Url },
    /// Create an empty frame and post `form` into it once attached
    FormPost { form: HiddenForm },
}

impl EmbeddingPlan {
    /// Address the frame ends up at.
    pub fn target(&self) -> &Url {
        match self {
            EmbeddingPlan::Navigate { url } => url,
            EmbeddingPlan::FormPost { form } => &form.action,
        }
    }
}

pub struct EmbeddingStrategy {
    config: EmbeddingConfig,
    state: Arc<dyn StatePersistence>,
}

impl EmbeddingStrategy {
    pub fn new(config: EmbeddingConfig, state: Arc<dyn StatePersistence>) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Whether `request` must be delivered by form submission.
    pub fn uses_form_post(&self, request: &EmbedRequest) -> bool {
        if !request.form_post_supported {
            return false;
        }
        match request.app_type.form_post_policy() {
            FormPostPolicy::Never => false,
            FormPostPolicy::Always => true,
            FormPostPolicy::WhenBodyParams => {
                self.has_body_params(&request.url)
                    || request.url.as_str().len() > self.config.max_url_length
            }
        }
    }

    fn has_body_params(&self, url: &Url) -> bool {
        query_pairs(url)
            .iter()
            .any(|(k, _)| self.config.state_params.contains(k))
    }

    pub async fn plan(
        &self,
        container: &ContainerId,
        request: &EmbedRequest,
    ) -> Result<EmbeddingPlan, EmbedError> {
        let resolved = resolve_navigation_url(&request.url, &self.config, &request.host);
        if !self.uses_form_post(request) {
            debug!(container = %container, app_type = %request.app_type, "Embedding by navigation");
            return Ok(EmbeddingPlan::Navigate { url: resolved });
        }

        let mut action = resolved;
        let state_params = take_params(&mut action, &self.config.state_params);
        let remaining = query_pairs(&action);
        action.set_query(None);

        let mut form = HiddenForm::post(format!("{}-form", container), container.as_str(), action);
        for (name, value) in remaining {
            form.push(name, value);
        }
        for (name, key) in state_params {
            let payload = match self.state.resolve(&key).await {
                Ok(Some(payload)) => payload,
                Ok(None) => {
                    debug!(param = %name, key = %key, "No stored state for key");
                    String::new()
                }
                Err(e) => {
                    warn!(param = %name, key = %key, error = %e, "State lookup failed; sending empty payload");
                    String::new()
                }
            };
            form.push(name.clone(), key);
            form.push(format!("{}-data", name), payload);
        }
        let context = json!({
            "sap-flp-url": request.host.host_url.clone().unwrap_or_default(),
            "system-alias": request.host.system_alias.clone().unwrap_or_default(),
        });
        form.push(self.config.context_field.clone(), context.to_string());

        debug!(
            container = %container,
            app_type = %request.app_type,
            fields = form.fields.len(),
            "Embedding by form submission"
        );
        Ok(EmbeddingPlan::FormPost { form })
    }

    /// Replace the container's frame according to `plan`.
    ///
    /// The previous frame is destroyed before the new one is created.
    pub async fn realize(
        &self,
        surface: &dyn FrameSurface,
        container: &ContainerId,
        cell: &FrameCell,
        plan: &EmbeddingPlan,
    ) -> Result<Arc<dyn Frame>, EmbedError> {
        if let Some(previous) = cell.take().resolve() {
            debug!(container = %container, frame = %previous.id(), "Destroying previous frame");
            surface.destroy_frame(container, previous.as_ref());
        }

        match plan {
            EmbeddingPlan::Navigate { url } => {
                let frame = surface.create_frame(
                    container,
                    &FrameSpec {
                        id: container.to_string(),
                        name: container.to_string(),
                        src: Some(url.clone()),
                    },
                )?;
                cell.replace(FrameSlot::Direct(frame.clone()));
                info!(container = %container, url = %url, "Frame navigated");
                Ok(frame)
            }
            EmbeddingPlan::FormPost { form } => {
                let frame = surface.create_frame(
                    container,
                    &FrameSpec {
                        id: container.to_string(),
                        name: form.target.clone(),
                        src: None,
                    },
                )?;
                cell.replace(FrameSlot::Wrapper {
                    wrapper_id: container.to_string(),
                    child: Some(frame.clone()),
                });

                let original_id = frame.id();
                let submitted = match surface.set_frame_id(frame.as_ref(), &format!("{}-iframe", original_id)) {
                    Ok(()) => {
                        let submitted = Self::submit_after_attach(surface, container, form).await;
                        submitted.and(surface.set_frame_id(frame.as_ref(), &original_id))
                    }
                    Err(e) => Err(e),
                };
                if let Err(e) = submitted {
                    warn!(container = %container, error = %e, "Form submission failed; discarding empty frame");
                    cell.take();
                    surface.destroy_frame(container, frame.as_ref());
                    return Err(e);
                }

                info!(container = %container, action = %form.action, "Form posted into frame");
                Ok(frame)
            }
        }
    }

    async fn submit_after_attach(
        surface: &dyn FrameSurface,
        container: &ContainerId,
        form: &HiddenForm,
    ) -> Result<(), EmbedError> {
        surface.attached(container).await?;
        surface.submit_form(container, form)
    }
}

//! Remote-first message generation with a local fallback.
//!
//! The policy is a two-state machine. It starts in [`PolicyState::RemoteAttempt`]
//! when a remote generator is configured and in [`PolicyState::LocalFallback`]
//! otherwise. The only transition is `RemoteAttempt -> LocalFallback`, taken on
//! any remote failure (including the bounded wait expiring). The local state
//! always produces a message, so generation as a whole never fails.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde::Serialize;

use crate::generator::TemplateGenerator;
use crate::remote::{GenerationError, RemoteGenerator};
use crate::types::GenerationOptions;

/// Which path produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Remote,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyState {
    RemoteAttempt,
    LocalFallback,
}

impl PolicyState {
    pub fn on_remote_failure(self) -> Self {
        PolicyState::LocalFallback
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub message: String,
    pub provider: Provider,
}

pub struct FallbackPolicy {
    remote: Option<Arc<dyn RemoteGenerator>>,
    local: TemplateGenerator,
    remote_timeout: Duration,
}

impl FallbackPolicy {
    pub fn new(
        remote: Option<Arc<dyn RemoteGenerator>>,
        local: TemplateGenerator,
        remote_timeout: Duration,
    ) -> Self {
        Self {
            remote,
            local,
            remote_timeout,
        }
    }

    pub fn local_only(local: TemplateGenerator) -> Self {
        Self::new(None, local, Duration::ZERO)
    }

    pub fn remote_configured(&self) -> bool {
        self.remote.is_some()
    }

    pub fn initial_state(&self) -> PolicyState {
        if self.remote.is_some() {
            PolicyState::RemoteAttempt
        } else {
            PolicyState::LocalFallback
        }
    }

    pub async fn generate(&self, options: &GenerationOptions) -> Generated {
        let mut state = self.initial_state();
        loop {
            match (state, &self.remote) {
                (PolicyState::RemoteAttempt, Some(remote)) => {
                    match self.attempt_remote(remote.as_ref(), options).await {
                        Ok(message) => {
                            return Generated {
                                message,
                                provider: Provider::Remote,
                            }
                        }
                        Err(err) => {
                            warn!("Remote generation failed, falling back to templates: {}", err);
                            state = state.on_remote_failure();
                        }
                    }
                }
                _ => {
                    let message = self.local.generate(options).await;
                    info!("Generated {} message from templates", options.category);
                    return Generated {
                        message,
                        provider: Provider::Local,
                    };
                }
            }
        }
    }

    async fn attempt_remote(
        &self,
        remote: &dyn RemoteGenerator,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        match tokio::time::timeout(self.remote_timeout, remote.generate(options)).await {
            Ok(Ok(message)) if !message.trim().is_empty() => Ok(message),
            Ok(Ok(_)) => Err(GenerationError::EmptyResponse),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(GenerationError::Timeout(self.remote_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Reply(&'static str),
        Fail,
        Hang,
        Empty,
    }

    struct FakeRemote {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl FakeRemote {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RemoteGenerator for FakeRemote {
        async fn generate(&self, _options: &GenerationOptions) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Reply(text) => Ok(text.to_string()),
                Behaviour::Fail => Err(GenerationError::Status {
                    status: 401,
                    body: "invalid api key".into(),
                }),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("too late".into())
                }
                Behaviour::Empty => Ok("   ".into()),
            }
        }
    }

    fn policy_with(remote: Arc<FakeRemote>) -> FallbackPolicy {
        FallbackPolicy::new(
            Some(remote),
            TemplateGenerator::instant(),
            Duration::from_millis(50),
        )
    }

    #[test]
    fn initial_state_follows_remote_availability() {
        let local = FallbackPolicy::local_only(TemplateGenerator::instant());
        assert_eq!(local.initial_state(), PolicyState::LocalFallback);
        assert!(!local.remote_configured());

        let remote = policy_with(FakeRemote::new(Behaviour::Fail));
        assert_eq!(remote.initial_state(), PolicyState::RemoteAttempt);
        assert_eq!(
            PolicyState::RemoteAttempt.on_remote_failure(),
            PolicyState::LocalFallback
        );
    }

    #[tokio::test]
    async fn remote_success_is_tagged_remote() {
        let remote = FakeRemote::new(Behaviour::Reply("Morning, starlight."));
        let out = policy_with(remote.clone())
            .generate(&GenerationOptions::new(Category::Sweet))
            .await;

        assert_eq!(out.provider, Provider::Remote);
        assert_eq!(out.message, "Morning, starlight.");
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn every_remote_failure_mode_falls_back_locally() {
        for behaviour in [Behaviour::Fail, Behaviour::Hang, Behaviour::Empty] {
            let remote = FakeRemote::new(behaviour);
            let out = policy_with(remote.clone())
                .generate(&GenerationOptions::new(Category::Poetic))
                .await;

            assert_eq!(out.provider, Provider::Local);
            assert!(!out.message.trim().is_empty());
            assert_eq!(remote.calls.load(Ordering::SeqCst), 1, "no internal retry");
        }
    }

    #[tokio::test]
    async fn without_remote_goes_straight_to_templates() {
        let out = FallbackPolicy::local_only(TemplateGenerator::instant())
            .generate(&GenerationOptions::new(Category::Romantic))
            .await;
        assert_eq!(out.provider, Provider::Local);
        assert!(!out.message.is_empty());
    }
}

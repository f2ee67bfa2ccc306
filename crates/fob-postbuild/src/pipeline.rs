//! Ordered build-end hook execution.
//!
//! Hooks run one after another in registration order. That ordering is the
//! only concurrency boundary between stages: a stage finishes all of its
//! writes before the next one starts.

use crate::{BuildContext, BuildResult, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// A stage that runs once when the host finishes a build.
///
/// Returning `Err` is a hard fault: the remaining stages are skipped and the
/// error reaches the caller. Recoverable problems are appended to the
/// [`BuildResult`] instead.
#[async_trait]
pub trait BuildEndHook: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    async fn on_build_end(&self, ctx: &BuildContext, result: &mut BuildResult) -> Result<()>;
}

/// Build-end hooks in registration order.
#[derive(Debug, Default, Clone)]
pub struct PostBuild {
    hooks: Vec<Arc<dyn BuildEndHook>>,
}

impl PostBuild {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook. It runs after every hook registered before it.
    pub fn hook<H: BuildEndHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn add(&mut self, hook: Arc<dyn BuildEndHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    /// Run every hook sequentially against one build's context and result.
    pub async fn run(&self, ctx: &BuildContext, result: &mut BuildResult) -> Result<()> {
        for hook in &self.hooks {
            debug!("[fob-postbuild] running build-end hook {}", hook.name());
            hook.on_build_end(ctx, result).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BuildMessage, BuildOptions, Error};
    use parking_lot::Mutex;

    #[derive(Debug)]
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    #[async_trait]
    impl BuildEndHook for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn on_build_end(&self, _ctx: &BuildContext, result: &mut BuildResult) -> Result<()> {
            self.log.lock().push(self.name);
            if self.fail {
                return Err(Error::InvalidConfig(format!("{} failed", self.name)));
            }
            result.push_warning(BuildMessage::new("seen", self.name, "ran"));
            Ok(())
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>, fail: bool) -> Recorder {
        Recorder {
            name,
            log: Arc::clone(log),
            fail,
        }
    }

    #[tokio::test]
    async fn test_hooks_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = PostBuild::new()
            .hook(recorder("first", &log, false))
            .hook(recorder("second", &log, false));

        let ctx = BuildContext::new(BuildOptions::new("dist"));
        let mut result = BuildResult::new();
        pipeline.run(&ctx, &mut result).await.unwrap();

        assert_eq!(*log.lock(), vec!["first", "second"]);
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(pipeline.names(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_hard_fault_stops_pipeline() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = PostBuild::new()
            .hook(recorder("broken", &log, true))
            .hook(recorder("never", &log, false));

        let ctx = BuildContext::new(BuildOptions::new("dist"));
        let mut result = BuildResult::new();
        let err = pipeline.run(&ctx, &mut result).await.unwrap_err();

        assert!(err.to_string().contains("broken failed"));
        assert_eq!(*log.lock(), vec!["broken"]);
    }
}

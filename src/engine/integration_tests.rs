// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use crate::backends::long_running::{FETCHING_PROGRESS, MISSING_VIDEO_REFERENCE};
use crate::backends::stub::{GatedVideoGateway, PanickingGateway};
use crate::backends::ScriptedGateway;
use crate::config::consts::{DEFAULT_TOPIC, VIDEO_INITIAL_PROGRESS};
use crate::config::EngineSettings;
use crate::engine::WorkflowEngine;
use crate::errors::ExecutionError;
use crate::model::{RunStatus, StepId, StepOutput, StepStatus, WorkflowRun};
use crate::traits::GenerationGateway;

/// End-to-end runs against in-memory gateways
#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(gateway: Arc<dyn GenerationGateway>) -> WorkflowEngine {
        WorkflowEngine::new(gateway, EngineSettings::default())
    }

    async fn wait_until<F>(engine: &WorkflowEngine, predicate: F) -> WorkflowRun
    where
        F: Fn(&WorkflowRun) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let run = engine.snapshot().await;
                if predicate(&run) {
                    return run;
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("condition not reached in time")
    }

    fn statuses(run: &WorkflowRun) -> Vec<StepStatus> {
        run.steps().iter().map(|s| s.status()).collect()
    }

    #[tokio::test]
    async fn test_successful_run_publishes_bundle_from_step_results() {
        let gateway = Arc::new(ScriptedGateway::new());
        let engine = engine_with(gateway.clone());

        let status = engine.start_run("Dividend stocks").await.wait().await.unwrap();
        assert_eq!(status, RunStatus::Succeeded);

        let run = engine.snapshot().await;
        assert_eq!(run.status(), RunStatus::Succeeded);
        assert!(run.steps().iter().all(|s| s.status() == StepStatus::Completed));
        assert!(run.failure().is_none());

        let bundle = run.asset_bundle().expect("bundle published");
        assert_eq!(
            run.step(StepId::Script).result(),
            Some(&StepOutput::Script(bundle.script().to_string()))
        );
        assert_eq!(
            run.step(StepId::Video).result(),
            Some(&StepOutput::Video(bundle.video().clone()))
        );
        assert_eq!(
            run.step(StepId::Thumbnail).result(),
            Some(&StepOutput::Thumbnail(bundle.thumbnail().clone()))
        );
        assert_eq!(
            run.step(StepId::Seo).result(),
            Some(&StepOutput::Seo(bundle.seo().clone()))
        );
    }

    #[tokio::test]
    async fn test_script_completes_before_dependents_start() {
        let gateway = Arc::new(ScriptedGateway::new().delayed(StepId::Script, Duration::from_millis(20)));
        let engine = engine_with(gateway);

        engine.start_run("   ").await.wait().await.unwrap();

        let run = engine.snapshot().await;
        let script_done = run.step(StepId::Script).finished_seq().unwrap();
        for step in StepId::FAN_OUT {
            let started = run.step(step).started_seq().unwrap();
            assert!(
                script_done < started,
                "{} started at {} before script finished at {}",
                step,
                started,
                script_done
            );
        }
    }

    #[tokio::test]
    async fn test_step_inputs_follow_the_dependency_contract() {
        let gateway = Arc::new(ScriptedGateway::new().with_script("THE SCRIPT"));
        let engine = engine_with(gateway.clone());

        engine.start_run("rental property").await.wait().await.unwrap();

        assert_eq!(gateway.inputs_for(StepId::Script).await, vec!["rental property"]);
        assert_eq!(
            gateway.inputs_for(StepId::Thumbnail).await,
            vec!["How to earn passive income with rental property"]
        );
        assert_eq!(gateway.inputs_for(StepId::Seo).await, vec!["THE SCRIPT"]);
        assert_eq!(gateway.inputs_for(StepId::Video).await, vec!["THE SCRIPT"]);
    }

    #[tokio::test]
    async fn test_empty_topic_uses_default() {
        let gateway = Arc::new(ScriptedGateway::new());
        let engine = engine_with(gateway.clone());

        engine.start_run("").await.wait().await.unwrap();

        assert_eq!(engine.snapshot().await.topic(), DEFAULT_TOPIC);
        assert_eq!(gateway.inputs_for(StepId::Script).await, vec![DEFAULT_TOPIC]);
        assert_eq!(
            gateway.inputs_for(StepId::Thumbnail).await,
            vec![format!("How to earn passive income with {}", DEFAULT_TOPIC)]
        );
    }

    #[tokio::test]
    async fn test_script_failure_leaves_dependents_pending() {
        let gateway = Arc::new(ScriptedGateway::new().failing(StepId::Script, "model overloaded"));
        let engine = engine_with(gateway.clone());

        let status = engine.start_run("topic").await.wait().await.unwrap();
        assert_eq!(status, RunStatus::Failed);

        let run = engine.snapshot().await;
        assert_eq!(
            statuses(&run),
            vec![
                StepStatus::Error,
                StepStatus::Pending,
                StepStatus::Pending,
                StepStatus::Pending
            ]
        );
        assert_eq!(run.step(StepId::Script).error(), Some("model overloaded"));
        assert!(run.step(StepId::Script).result().is_none());
        assert!(run.asset_bundle().is_none());
        assert_eq!(run.failure().unwrap().failed_steps, vec![StepId::Script]);
        assert_eq!(run.failure().unwrap().fault, None);
        assert_eq!(gateway.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_single_fan_out_failure_is_fail_soft() {
        for failing in StepId::FAN_OUT {
            let gateway = Arc::new(ScriptedGateway::new().failing(failing, "backend said no"));
            let engine = engine_with(gateway);

            let status = engine.start_run("topic").await.wait().await.unwrap();
            assert_eq!(status, RunStatus::Failed, "failing step {}", failing);

            let run = engine.snapshot().await;
            assert!(run.asset_bundle().is_none());
            assert_eq!(run.failed_steps(), vec![failing]);
            assert_eq!(run.step(failing).error(), Some("backend said no"));
            assert!(run.step(failing).result().is_none());
            for sibling in StepId::FAN_OUT.iter().filter(|s| **s != failing) {
                assert_eq!(
                    run.step(*sibling).status(),
                    StepStatus::Completed,
                    "{} should complete while {} fails",
                    sibling,
                    failing
                );
            }
        }
    }

    #[tokio::test]
    async fn test_fast_failure_does_not_cut_slow_siblings_short() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .failing(StepId::Seo, "rejected")
                .delayed(StepId::Thumbnail, Duration::from_millis(50)),
        );
        let engine = engine_with(gateway);

        engine.start_run("topic").await.wait().await.unwrap();

        let run = engine.snapshot().await;
        assert_eq!(run.step(StepId::Thumbnail).status(), StepStatus::Completed);
        assert_eq!(run.step(StepId::Video).status(), StepStatus::Completed);
        assert!(
            run.step(StepId::Seo).finished_seq() < run.step(StepId::Thumbnail).finished_seq()
        );
    }

    #[tokio::test]
    async fn test_malformed_seo_payload_fails_the_seo_step() {
        let gateway = Arc::new(ScriptedGateway::new().with_seo_json("not json at all"));
        let engine = engine_with(gateway);

        engine.start_run("topic").await.wait().await.unwrap();

        let run = engine.snapshot().await;
        assert_eq!(run.step(StepId::Seo).status(), StepStatus::Error);
        assert!(run
            .step(StepId::Seo)
            .error()
            .unwrap()
            .starts_with("Malformed payload"));
        assert!(run.asset_bundle().is_none());
    }

    #[tokio::test]
    async fn test_video_without_reference_fails_the_video_step() {
        let gateway = Arc::new(ScriptedGateway::new().with_video_missing_reference());
        let engine = engine_with(gateway);

        engine.start_run("topic").await.wait().await.unwrap();

        let run = engine.snapshot().await;
        assert_eq!(run.step(StepId::Video).error(), Some(MISSING_VIDEO_REFERENCE));
        assert_eq!(run.failed_steps(), vec![StepId::Video]);
    }

    #[tokio::test]
    async fn test_video_download_failure_fails_the_video_step() {
        let gateway = Arc::new(ScriptedGateway::new().with_video_download_failure("Forbidden"));
        let engine = engine_with(gateway);

        let status = engine.start_run("topic").await.wait().await.unwrap();
        assert_eq!(status, RunStatus::Failed);

        let run = engine.snapshot().await;
        let video = run.step(StepId::Video);
        assert_eq!(video.status(), StepStatus::Error);
        assert_eq!(
            video.error(),
            Some("Failed to download video file. Status: Forbidden")
        );
        assert_eq!(video.progress_message(), Some(FETCHING_PROGRESS));
        assert_eq!(run.failed_steps(), vec![StepId::Video]);
        assert!(run.asset_bundle().is_none());
    }

    #[tokio::test]
    async fn test_step_timeout_is_a_step_failure() {
        let gateway = Arc::new(ScriptedGateway::new().delayed(StepId::Seo, Duration::from_secs(30)));
        let settings = EngineSettings::default().with_timeout(StepId::Seo, Duration::from_millis(20));
        let engine = WorkflowEngine::new(gateway, settings);

        let status = engine.start_run("topic").await.wait().await.unwrap();
        assert_eq!(status, RunStatus::Failed);

        let run = engine.snapshot().await;
        assert_eq!(
            run.step(StepId::Seo).error(),
            Some("seo generation timed out after 20ms")
        );
        assert_eq!(run.step(StepId::Video).status(), StepStatus::Completed);
        assert_eq!(run.step(StepId::Thumbnail).status(), StepStatus::Completed);
    }

    #[tokio::test]
    async fn test_video_progress_is_recorded_and_kept() {
        let gateway = Arc::new(ScriptedGateway::new());
        let engine = engine_with(gateway);
        let mut updates = engine.subscribe().await;

        engine.start_run("topic").await.wait().await.unwrap();

        let mut seen = Vec::new();
        while let Ok(run) = updates.try_recv() {
            if let Some(message) = run.step(StepId::Video).progress_message() {
                if seen.last().map(String::as_str) != Some(message) {
                    seen.push(message.to_string());
                }
            }
        }
        assert_eq!(seen.first().map(String::as_str), Some(VIDEO_INITIAL_PROGRESS));
        assert!(seen.iter().any(|m| m.starts_with("Rendering in progress...")));
        assert_eq!(
            engine.snapshot().await.step(StepId::Video).progress_message(),
            Some(FETCHING_PROGRESS)
        );
    }

    #[tokio::test]
    async fn test_progress_is_latest_wins() {
        let gateway = Arc::new(GatedVideoGateway::new(&["M1", "M2"]));
        let engine = engine_with(gateway.clone());

        let handle = engine.start_run("topic").await;
        gateway.reported.notified().await;

        let run = wait_until(&engine, |run| {
            run.step(StepId::Video).progress_message() == Some("M2")
        })
        .await;
        assert_eq!(run.step(StepId::Video).status(), StepStatus::Running);

        // Nothing else is reported until release, so M1 can never reappear
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(
            engine.snapshot().await.step(StepId::Video).progress_message(),
            Some("M2")
        );

        gateway.release.notify_one();
        assert_eq!(handle.wait().await.unwrap(), RunStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_stale_run_results_are_discarded() {
        let gateway = Arc::new(GatedVideoGateway::new(&["first run rendering"]));
        let engine = engine_with(gateway.clone());

        let run_a = engine.start_run("first topic").await;
        gateway.reported.notified().await;

        let run_b = engine.start_run("second topic").await;
        assert_eq!(run_b.wait().await.unwrap(), RunStatus::Succeeded);
        let after_b = engine.snapshot().await;
        assert_eq!(after_b.topic(), "second topic");
        assert_eq!(
            after_b.asset_bundle().unwrap().video(),
            &gateway.later_reference
        );

        gateway.release.notify_one();
        assert_eq!(
            run_a.wait().await,
            Err(ExecutionError::Superseded(crate::model::RunId::new(1)))
        );

        assert_eq!(engine.snapshot().await, after_b);
    }

    #[tokio::test]
    async fn test_reset_supersedes_in_flight_run() {
        let gateway = Arc::new(ScriptedGateway::new().delayed(StepId::Script, Duration::from_millis(50)));
        let engine = engine_with(gateway);

        let handle = engine.start_run("topic").await;
        wait_until(&engine, |run| {
            run.step(StepId::Script).status() == StepStatus::Running
        })
        .await;
        engine.reset_run().await;

        assert!(matches!(handle.wait().await, Err(ExecutionError::Superseded(_))));

        let run = engine.snapshot().await;
        assert_eq!(run.status(), RunStatus::Idle);
        assert_eq!(run.topic(), "");
        assert!(run.steps().iter().all(|s| s.status() == StepStatus::Pending));
        assert!(run.steps().iter().all(|s| s.result().is_none()));
    }

    #[tokio::test]
    async fn test_edit_script_after_success_does_not_cascade() {
        let gateway = Arc::new(ScriptedGateway::new());
        let engine = engine_with(gateway.clone());
        engine.start_run("topic").await.wait().await.unwrap();
        let before = engine.snapshot().await;

        engine.edit_script("My own script").await.unwrap();

        let after = engine.snapshot().await;
        let script = after.step(StepId::Script);
        assert_eq!(
            script.result(),
            Some(&StepOutput::Script("My own script".to_string()))
        );
        assert_eq!(script.status(), StepStatus::Completed);
        for step in StepId::FAN_OUT {
            assert_eq!(after.step(step), before.step(step));
        }
        assert_eq!(after.asset_bundle(), before.asset_bundle());
        // No re-generation happened
        assert_eq!(gateway.calls().await.len(), 4);
    }

    #[tokio::test]
    async fn test_edit_errored_step_keeps_error_status() {
        let gateway = Arc::new(ScriptedGateway::new().failing(StepId::Script, "boom"));
        let engine = engine_with(gateway);
        engine.start_run("topic").await.wait().await.unwrap();

        engine.edit_script("rescued").await.unwrap();

        let run = engine.snapshot().await;
        let script = run.step(StepId::Script);
        assert_eq!(script.status(), StepStatus::Error);
        assert_eq!(script.error(), Some("boom"));
        assert_eq!(
            script.result(),
            Some(&StepOutput::Script("rescued".to_string()))
        );
        assert_eq!(run.step(StepId::Video).status(), StepStatus::Pending);
    }

    #[tokio::test]
    async fn test_panic_during_script_is_attributed_to_script() {
        let engine = engine_with(Arc::new(PanickingGateway::new(StepId::Script)));

        let status = engine.start_run("topic").await.wait().await.unwrap();
        assert_eq!(status, RunStatus::Failed);

        let run = engine.snapshot().await;
        assert_eq!(run.failed_steps(), vec![StepId::Script]);
        let error = run.step(StepId::Script).error().unwrap();
        assert!(error.contains("script backend exploded"), "{}", error);
        for step in StepId::FAN_OUT {
            assert_eq!(run.step(step).status(), StepStatus::Pending);
        }
        assert!(run.failure().unwrap().fault.is_some());
        assert!(run.running_steps().is_empty());
    }

    #[tokio::test]
    async fn test_panic_in_one_branch_is_attributed_to_that_branch() {
        let engine = engine_with(Arc::new(PanickingGateway::new(StepId::Thumbnail)));

        let status = engine.start_run("topic").await.wait().await.unwrap();
        assert_eq!(status, RunStatus::Failed);

        let run = engine.snapshot().await;
        assert_eq!(run.failed_steps(), vec![StepId::Thumbnail]);
        assert!(run
            .step(StepId::Thumbnail)
            .error()
            .unwrap()
            .contains("thumbnail backend exploded"));
        assert_eq!(run.step(StepId::Video).status(), StepStatus::Completed);
        assert_eq!(run.step(StepId::Seo).status(), StepStatus::Completed);
        assert!(run.asset_bundle().is_none());
        assert_eq!(
            run.failure().unwrap().fault,
            run.step(StepId::Thumbnail).error().map(str::to_string)
        );
    }

    #[tokio::test]
    async fn test_new_run_starts_from_clean_state() {
        let gateway = Arc::new(ScriptedGateway::new());
        let engine = engine_with(gateway);
        engine.start_run("first").await.wait().await.unwrap();
        engine.edit_script("edited").await.unwrap();

        let handle = engine.start_run("second").await;
        let fresh = engine.snapshot().await;
        assert_eq!(fresh.topic(), "second");
        assert!(fresh.asset_bundle().is_none());
        assert_ne!(
            fresh.step(StepId::Script).result(),
            Some(&StepOutput::Script("edited".to_string()))
        );

        assert_eq!(handle.wait().await.unwrap(), RunStatus::Succeeded);
    }

    /// Records each event's message and whether it was emitted inside a `run` span
    #[derive(Clone, Default)]
    struct RunSpanCapture {
        events: Arc<std::sync::Mutex<Vec<(String, bool)>>>,
    }

    struct MessageField(String);

    impl tracing::field::Visit for MessageField {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S> tracing_subscriber::Layer<S> for RunSpanCapture
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let in_run = ctx
                .event_scope(event)
                .map(|mut scope| scope.any(|span| span.name() == "run"))
                .unwrap_or(false);
            let mut message = MessageField(String::new());
            event.record(&mut message);
            self.events.lock().unwrap().push((message.0, in_run));
        }
    }

    #[tokio::test]
    async fn test_run_events_are_logged_inside_the_run_span() {
        use tracing_subscriber::layer::SubscriberExt;

        let capture = RunSpanCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let engine = engine_with(Arc::new(ScriptedGateway::new()));
        let status = engine.start_run("topic").await.wait().await.unwrap();
        assert_eq!(status, RunStatus::Succeeded);

        let events = capture.events.lock().unwrap().clone();
        let (started, rest) = events.split_first().expect("events captured");
        assert!(started.0.starts_with("Starting run-"), "first event: {}", started.0);
        assert!(rest.len() > 5);
        for (message, in_run) in rest {
            assert!(in_run, "logged outside the run span: {}", message);
        }
        assert!(rest.iter().any(|(m, _)| m.contains("Step 'video' started")));
        assert!(rest.iter().any(|(m, _)| m.contains("asset bundle published")));
    }
}

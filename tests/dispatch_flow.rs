use std::collections::VecDeque;
use std::time::Duration;

use image::{DynamicImage, RgbImage};

use gestctl::config::Settings;
use gestctl::gesture::{ActionCommand, ActionResult, Gesture, SuppressReason};
use gestctl::utils::{FrameSource, LoopMode};
use gestctl::{Detection, ExecutorError, GestureClassifier, GestureController, PlayerExecutor, StopReason};

/// 按顺序返回预设结果的分类器
struct ScriptedClassifier {
    script: VecDeque<(&'static str, f32)>,
}

impl ScriptedClassifier {
    fn new(script: &[(&'static str, f32)]) -> Self {
        Self {
            script: script.iter().copied().collect(),
        }
    }
}

impl GestureClassifier for ScriptedClassifier {
    fn classify(&mut self, _roi: &DynamicImage) -> gestctl::Result<Detection> {
        let (label, confidence) = self.script.pop_front().unwrap_or(("nothing", 0.0));
        Ok(Detection::new(label, confidence))
    }
}

#[derive(Default)]
struct MockPlayer {
    sent: Vec<ActionCommand>,
}

impl PlayerExecutor for MockPlayer {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn execute(&mut self, command: &ActionCommand) -> Result<(), ExecutorError> {
        self.sent.push(*command);
        Ok(())
    }
}

struct BlankFrames(usize);

impl FrameSource for BlankFrames {
    fn next_frame(&mut self) -> gestctl::Result<Option<DynamicImage>> {
        if self.0 == 0 {
            return Ok(None);
        }
        self.0 -= 1;
        Ok(Some(DynamicImage::ImageRgb8(RgbImage::new(64, 64))))
    }
}

fn settings(yaml: &str) -> Settings {
    Settings::from_yaml(yaml).unwrap()
}

fn frame() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::new(64, 64))
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[tokio::test]
async fn play_fires_once_after_hold() {
    let settings = settings(
        "gesture: { confidence_threshold: 90, hold_time_secs: 0.5 }\n\
         dispatch: { initially_playing: false }\n",
    );
    let classifier = ScriptedClassifier::new(&[("play", 95.0); 5]);
    let mut controller = GestureController::from_settings(classifier, MockPlayer::default(), &settings);

    let mut results = Vec::new();
    for t in [0, 200, 400, 600, 1000] {
        results.push(controller.process_frame(&frame(), ms(t)).await.unwrap().result);
    }

    assert!(results[..3].iter().all(|r| *r == ActionResult::Skipped));
    assert!(results[3].is_executed());
    assert_eq!(
        results[4],
        ActionResult::Suppressed {
            gesture: Gesture::Play,
            reason: SuppressReason::NoStateChange
        }
    );
    assert_eq!(controller.dispatcher().executor().sent, vec![ActionCommand::Play]);
    assert!(controller.dispatcher().state().is_playing);
}

#[tokio::test]
async fn forward_obeys_cooldown() {
    let settings = settings(
        "gesture: { hold_time_secs: 0.0 }\n\
         dispatch: { cooldown_secs: 0.5 }\n",
    );
    // 第一帧建立候选，之后每帧都稳定
    let classifier = ScriptedClassifier::new(&[("forward", 99.0); 4]);
    let mut controller = GestureController::from_settings(classifier, MockPlayer::default(), &settings);

    let first = controller.process_frame(&frame(), ms(0)).await.unwrap();
    assert_eq!(first.result, ActionResult::Skipped);

    assert!(controller.process_frame(&frame(), ms(100)).await.unwrap().result.is_executed());
    assert_eq!(
        controller.process_frame(&frame(), ms(400)).await.unwrap().result,
        ActionResult::Suppressed {
            gesture: Gesture::Forward,
            reason: SuppressReason::Cooldown { remaining: ms(200) }
        }
    );
    assert!(controller.process_frame(&frame(), ms(700)).await.unwrap().result.is_executed());
    assert_eq!(
        controller.dispatcher().executor().sent,
        vec![ActionCommand::Seek(10), ActionCommand::Seek(10)]
    );
}

#[tokio::test]
async fn low_confidence_and_unknown_labels_never_fire() {
    let settings = settings("gesture: { hold_time_secs: 0.0 }\n");
    let classifier = ScriptedClassifier::new(&[
        ("volume_up", 89.9),
        ("volume_up", 50.0),
        ("thumbs_up", 99.0),
        ("thumbs_up", 99.0),
    ]);
    let mut controller = GestureController::from_settings(classifier, MockPlayer::default(), &settings);

    for t in 0..4 {
        let report = controller.process_frame(&frame(), ms(t * 100)).await.unwrap();
        assert!(report.stable.is_none());
        assert_eq!(report.result, ActionResult::Skipped);
    }
    assert!(controller.dispatcher().executor().sent.is_empty());
}

#[tokio::test]
async fn switching_labels_restarts_hold() {
    let settings = settings("gesture: { hold_time_secs: 0.5 }\n");
    let classifier = ScriptedClassifier::new(&[
        ("volume_up", 95.0),
        ("volume_up", 95.0),
        ("reverse", 95.0),
        ("reverse", 95.0),
        ("reverse", 95.0),
    ]);
    let mut controller = GestureController::from_settings(classifier, MockPlayer::default(), &settings);

    let mut executed = Vec::new();
    for t in [0, 400, 450, 800, 950] {
        let report = controller.process_frame(&frame(), ms(t)).await.unwrap();
        executed.push(report.result.is_executed());
    }
    // reverse 从 450ms 开始保持，950ms 才满 0.5s
    assert_eq!(executed, vec![false, false, false, false, true]);
    assert_eq!(controller.dispatcher().executor().sent, vec![ActionCommand::Seek(-10)]);
}

#[tokio::test]
async fn configured_mapping_overrides_default() {
    let settings = settings(
        "gesture: { hold_time_secs: 0.0 }\n\
         actions:\n  \
           forward:\n    \
             class: { kind: rate_limited }\n    \
             command: { kind: seek, amount: 30 }\n",
    );
    let classifier = ScriptedClassifier::new(&[("forward", 95.0); 2]);
    let mut controller = GestureController::from_settings(classifier, MockPlayer::default(), &settings);

    controller.process_frame(&frame(), ms(0)).await.unwrap();
    controller.process_frame(&frame(), ms(100)).await.unwrap();
    assert_eq!(controller.dispatcher().executor().sent, vec![ActionCommand::Seek(30)]);
}

#[tokio::test(start_paused = true)]
async fn run_loop_drives_volume_at_interval() {
    let settings = settings(
        "gesture: { hold_time_secs: 0.0 }\n\
         dispatch: { volume_interval_secs: 0.5 }\n\
         capture: { frame_interval_secs: 0.1 }\n",
    );
    let classifier = ScriptedClassifier::new(&[("volume_up", 97.0); 12]);
    let mut controller = GestureController::from_settings(classifier, MockPlayer::default(), &settings);

    let summary = controller
        .run(&mut BlankFrames(12), LoopMode::Continuous, std::future::pending())
        .await
        .unwrap();

    // 帧时间 0..1100ms，第二帧 100ms 起稳定：100、600、1100 各执行一次
    assert_eq!(summary.stop, StopReason::EndOfFrames);
    assert_eq!(summary.frames, 12);
    assert_eq!(summary.executed, 3);
    assert_eq!(controller.dispatcher().executor().sent, vec![ActionCommand::Volume(5); 3]);
}

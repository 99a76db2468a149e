//! Subject tracking across frames with framing scores and real-time advice.
//!
//! An update is computed against a snapshot of the current state, then any
//! composition advice is awaited, and only then is the new state committed.
//! Dropping the future mid-update leaves the tracker untouched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::advisor::{AdvisoryGenerator, ReasoningService, Unconfigured};
use crate::history::RingBuffer;
use crate::models::{CameraAngle, Detection, Position, TrackedSubject, TrackingStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub frame_width: f64,
    pub frame_height: f64,
    /// Framing quality below this raises a framing message
    pub framing_threshold: f64,
    /// Framing quality below this asks the advisor for composition help
    pub composition_threshold: f64,
    pub lost_timeout: Duration,
    /// Minimum overlap for matching an unlabeled detection to a live subject
    pub iou_threshold: f64,
    pub history_capacity: usize,
    pub advice_capacity: usize,
    /// Lost ids remembered for reacquisition; the oldest are forgotten first
    pub lost_capacity: usize,
    pub composition_max_chars: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            frame_width: 1920.0,
            frame_height: 1080.0,
            framing_threshold: 0.7,
            composition_threshold: 0.6,
            lost_timeout: Duration::from_secs(2),
            iou_threshold: 0.3,
            history_capacity: 2048,
            advice_capacity: 512,
            lost_capacity: 512,
            composition_max_chars: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceTopic {
    Framing,
    Movement,
    Lighting,
    Composition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagePriority {
    Low,
    Medium,
    High,
}

/// Real-time message for the camera operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryMessage {
    pub advice_type: AdviceTopic,
    pub subject_id: String,
    pub message: String,
    pub priority: MessagePriority,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectStatus {
    pub subject_id: String,
    pub label: String,
    pub tracking_status: TrackingStatus,
    pub framing_quality: f64,
    pub camera_angle: CameraAngle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSummary {
    pub active_tracks: usize,
    pub total_tracked: usize,
    pub advice_count: usize,
    pub ai_enabled: bool,
    pub subjects: Vec<SubjectStatus>,
}

/// Tracks subjects for one camera.
pub struct SubjectTracker<S = Unconfigured> {
    config: TrackerConfig,
    advisor: Option<Arc<AdvisoryGenerator<S>>>,
    live: HashMap<String, TrackedSubject>,
    lost_ids: HashSet<String>,
    lost_order: RingBuffer<String>,
    history: RingBuffer<TrackedSubject>,
    advice: RingBuffer<AdvisoryMessage>,
    minted: u64,
}

impl SubjectTracker<Unconfigured> {
    /// Tracker without an advisor; no composition messages are produced.
    pub fn offline(config: TrackerConfig) -> Self {
        Self::new(config, None)
    }
}

impl<S: ReasoningService> SubjectTracker<S> {
    pub fn new(config: TrackerConfig, advisor: Option<Arc<AdvisoryGenerator<S>>>) -> Self {
        let history = RingBuffer::new(config.history_capacity);
        let advice = RingBuffer::new(config.advice_capacity);
        let lost_order = RingBuffer::new(config.lost_capacity);
        Self {
            config,
            advisor,
            live: HashMap::new(),
            lost_ids: HashSet::new(),
            lost_order,
            history,
            advice,
            minted: 0,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn ai_enabled(&self) -> bool {
        self.advisor.as_ref().is_some_and(|advisor| advisor.is_ai_enabled())
    }

    pub async fn update_tracking(
        &mut self,
        detections: &[Detection],
        frame_number: u64,
        camera_position: Option<Position>,
    ) -> Vec<TrackedSubject> {
        self.update_tracking_at(detections, frame_number, camera_position, Utc::now())
            .await
    }

    /// Apply one frame of detections observed at `now`.
    pub async fn update_tracking_at(
        &mut self,
        detections: &[Detection],
        frame_number: u64,
        camera_position: Option<Position>,
        now: DateTime<Utc>,
    ) -> Vec<TrackedSubject> {
        let mut minted = self.minted;
        let mut claimed: HashSet<String> = HashSet::new();
        let mut updated: Vec<TrackedSubject> = Vec::with_capacity(detections.len());

        for detection in detections {
            let label = if detection.label.trim().is_empty() {
                "subject".to_string()
            } else {
                detection.label.trim().to_string()
            };
            let subject_id = match detection
                .subject_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
            {
                Some(id) => id.to_string(),
                None => self
                    .associate(&label, &detection.bbox, &claimed)
                    .unwrap_or_else(|| {
                        let id = format!("{label}_{minted}");
                        minted += 1;
                        id
                    }),
            };
            claimed.insert(subject_id.clone());

            let previous = self.live.get(&subject_id);
            let tracking_status = if previous.is_none() && self.lost_ids.contains(&subject_id) {
                TrackingStatus::Reacquired
            } else {
                TrackingStatus::Tracking
            };
            let position = camera_position
                .or_else(|| previous.map(|p| p.position))
                .unwrap_or_default();

            updated.push(TrackedSubject {
                subject_id,
                label,
                position,
                bbox: detection.bbox,
                confidence: sanitize_unit(detection.confidence),
                frame_number,
                timestamp: now,
                camera_angle: camera_angle(&detection.bbox, self.config.frame_height),
                framing_quality: framing_quality(
                    &detection.bbox,
                    detection.confidence,
                    self.config.frame_width,
                    self.config.frame_height,
                ),
                tracking_status,
            });
        }

        let lost: Vec<TrackedSubject> = self
            .live
            .values()
            .filter(|subject| !claimed.contains(&subject.subject_id))
            .filter(|subject| {
                (now - subject.timestamp)
                    .to_std()
                    .is_ok_and(|elapsed| elapsed > self.config.lost_timeout)
            })
            .map(|subject| TrackedSubject {
                tracking_status: TrackingStatus::Lost,
                ..subject.clone()
            })
            .collect();

        let mut messages = Vec::new();
        for subject in &updated {
            if subject.framing_quality < self.config.framing_threshold {
                messages.push(AdvisoryMessage {
                    advice_type: AdviceTopic::Framing,
                    subject_id: subject.subject_id.clone(),
                    message: format!(
                        "Subject {} framing quality low ({:.2}). Adjust camera position to center subject.",
                        subject.subject_id, subject.framing_quality
                    ),
                    priority: MessagePriority::Medium,
                    timestamp: now,
                });
            }
        }
        for subject in &lost {
            messages.push(AdvisoryMessage {
                advice_type: AdviceTopic::Movement,
                subject_id: subject.subject_id.clone(),
                message: format!(
                    "Subject {} lost. Attempting to reacquire...",
                    subject.subject_id
                ),
                priority: MessagePriority::High,
                timestamp: now,
            });
        }

        if self.ai_enabled() {
            if let Some(advisor) = self.advisor.clone() {
                for subject in updated
                    .iter()
                    .filter(|s| s.framing_quality < self.config.composition_threshold)
                {
                    let question = format!(
                        "How should I improve framing for subject at camera angle {}?",
                        subject.camera_angle
                    );
                    let context = json!({
                        "framing_quality": subject.framing_quality,
                        "camera_angle": subject.camera_angle,
                        "bbox": subject.bbox,
                    });
                    let advised = advisor
                        .request_general_advice(&question, Some(&context), None)
                        .await;
                    if advised.is_fallback() {
                        tracing::debug!(
                            subject_id = %subject.subject_id,
                            "no composition advice available"
                        );
                        continue;
                    }
                    messages.push(AdvisoryMessage {
                        advice_type: AdviceTopic::Composition,
                        subject_id: subject.subject_id.clone(),
                        message: truncate_chars(
                            &advised.into_inner(),
                            self.config.composition_max_chars,
                        ),
                        priority: MessagePriority::Low,
                        timestamp: now,
                    });
                }
            }
        }

        // Commit.
        self.minted = minted;
        for subject in &lost {
            self.live.remove(&subject.subject_id);
            self.remember_lost(&subject.subject_id);
            tracing::debug!(subject_id = %subject.subject_id, "subject lost");
        }
        for subject in &updated {
            if subject.tracking_status == TrackingStatus::Reacquired {
                tracing::debug!(subject_id = %subject.subject_id, "subject reacquired");
            }
            self.lost_ids.remove(&subject.subject_id);
            self.live.insert(subject.subject_id.clone(), subject.clone());
        }
        self.history.extend(updated.iter().cloned());
        self.history.extend(lost);
        self.advice.extend(messages);

        updated
    }

    fn remember_lost(&mut self, subject_id: &str) {
        if !self.lost_ids.insert(subject_id.to_string()) {
            return;
        }
        if let Some(evicted) = self.lost_order.push(subject_id.to_string()) {
            // A reacquired id leaves a stale entry behind; keep it if it was lost again since.
            if !self.lost_order.iter().any(|id| *id == evicted) {
                self.lost_ids.remove(&evicted);
            }
        }
    }

    /// Best-overlapping unclaimed live subject with the same label.
    fn associate(&self, label: &str, bbox: &[f64; 4], claimed: &HashSet<String>) -> Option<String> {
        self.live
            .values()
            .filter(|subject| subject.label == label && !claimed.contains(&subject.subject_id))
            .map(|subject| (iou(&subject.bbox, bbox), subject))
            .filter(|(overlap, _)| *overlap >= self.config.iou_threshold)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, subject)| subject.subject_id.clone())
    }

    /// Live subjects ordered by id.
    pub fn active_subjects(&self) -> Vec<TrackedSubject> {
        let mut subjects: Vec<TrackedSubject> = self.live.values().cloned().collect();
        subjects.sort_by(|a, b| a.subject_id.cmp(&b.subject_id));
        subjects
    }

    pub fn tracking_history(&self) -> Vec<TrackedSubject> {
        self.history.iter().cloned().collect()
    }

    pub fn recent_advice(&self, count: usize) -> Vec<AdvisoryMessage> {
        self.advice.recent(count)
    }

    pub fn tracking_status(&self) -> TrackingSummary {
        let subjects = self
            .active_subjects()
            .into_iter()
            .map(|subject| SubjectStatus {
                subject_id: subject.subject_id,
                label: subject.label,
                tracking_status: subject.tracking_status,
                framing_quality: subject.framing_quality,
                camera_angle: subject.camera_angle,
            })
            .collect();
        TrackingSummary {
            active_tracks: self.live.len(),
            total_tracked: self.history.len(),
            advice_count: self.advice.len(),
            ai_enabled: self.ai_enabled(),
            subjects,
        }
    }

    /// Drop live subjects and all history.
    pub fn clear_history(&mut self) {
        self.live.clear();
        self.lost_ids.clear();
        self.lost_order.clear();
        self.history.clear();
        self.advice.clear();
        tracing::info!("tracking history cleared");
    }
}

/// Composition score in `[0, 1]`: horizontal centering, size band and confidence.
pub fn framing_quality(bbox: &[f64; 4], confidence: f64, frame_width: f64, frame_height: f64) -> f64 {
    let [x1, y1, x2, y2] = *bbox;
    let half_width = frame_width / 2.0;
    let center_x = (x1 + x2) / 2.0;
    let centering = if half_width > 0.0 {
        (1.0 - (center_x - half_width).abs() / half_width).max(0.0)
    } else {
        0.0
    };

    let frame_area = frame_width * frame_height;
    let area = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let ratio = if frame_area > 0.0 { area / frame_area } else { 0.0 };
    let size = if (0.1..=0.5).contains(&ratio) {
        1.0
    } else if ratio < 0.05 {
        0.3
    } else if ratio > 0.7 {
        0.5
    } else {
        0.7
    };

    let quality = 0.4 * centering + 0.4 * size + 0.2 * sanitize_unit(confidence);
    if quality.is_finite() {
        quality.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Camera angle from the vertical thirds of the frame.
pub fn camera_angle(bbox: &[f64; 4], frame_height: f64) -> CameraAngle {
    let center_y = (bbox[1] + bbox[3]) / 2.0;
    if center_y < frame_height / 3.0 {
        CameraAngle::Overhead
    } else if center_y < frame_height * 2.0 / 3.0 {
        CameraAngle::Side
    } else {
        CameraAngle::LowAngle
    }
}

/// Intersection over union of two `[x1, y1, x2, y2]` boxes.
pub fn iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);
    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - intersection;
    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

fn sanitize_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::testing::ScriptedService;
    use chrono::TimeZone;

    /// Centered, 30% of a 1080p frame.
    const IDEAL: [f64; 4] = [480.0, 216.0, 1440.0, 864.0];
    /// Tiny and in the corner.
    const POOR: [f64; 4] = [0.0, 0.0, 100.0, 100.0];

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 4, 10, 0, 0).unwrap()
    }

    fn secs(s: i64) -> DateTime<Utc> {
        t0() + chrono::Duration::seconds(s)
    }

    #[test]
    fn centered_well_sized_confident_box_scores_one() {
        let quality = framing_quality(&IDEAL, 1.0, 1920.0, 1080.0);
        assert!((quality - 1.0).abs() < 1e-9);
    }

    #[test]
    fn size_bands() {
        // 0.6 of the frame: between the good and oversized bands.
        let wide = [0.0, 0.0, 1920.0, 648.0];
        let quality = framing_quality(&wide, 0.0, 1920.0, 1080.0);
        assert!((quality - (0.4 + 0.4 * 0.7)).abs() < 1e-9);

        let tiny_centered = [950.0, 530.0, 970.0, 550.0];
        let quality = framing_quality(&tiny_centered, 0.0, 1920.0, 1080.0);
        assert!((quality - (0.4 + 0.4 * 0.3)).abs() < 1e-9);
    }

    #[test]
    fn camera_angle_uses_vertical_thirds() {
        assert_eq!(camera_angle(&[0.0, 0.0, 10.0, 100.0], 1080.0), CameraAngle::Overhead);
        assert_eq!(camera_angle(&IDEAL, 1080.0), CameraAngle::Side);
        assert_eq!(camera_angle(&[0.0, 900.0, 10.0, 1000.0], 1080.0), CameraAngle::LowAngle);
    }

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        assert!((iou(&IDEAL, &IDEAL) - 1.0).abs() < 1e-12);
        assert_eq!(iou(&POOR, &IDEAL), 0.0);
        assert_eq!(iou(&[0.0; 4], &[0.0; 4]), 0.0);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 200), "short");
    }

    #[tokio::test]
    async fn new_subjects_are_tracked_with_supplied_ids() {
        let mut tracker = SubjectTracker::offline(TrackerConfig::default());
        let position = Position { lat: 1.0, lon: 2.0, alt: 30.0 };
        let updated = tracker
            .update_tracking_at(
                &[Detection::new("person", 0.9, IDEAL).with_subject_id("bride")],
                1,
                Some(position),
                t0(),
            )
            .await;

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].subject_id, "bride");
        assert_eq!(updated[0].tracking_status, TrackingStatus::Tracking);
        assert_eq!(updated[0].position, position);
        assert_eq!(tracker.active_subjects().len(), 1);
        assert!(tracker.recent_advice(10).is_empty());
    }

    #[tokio::test]
    async fn unlabeled_detections_follow_overlapping_subjects() {
        let mut tracker = SubjectTracker::offline(TrackerConfig::default());
        let first = tracker
            .update_tracking_at(&[Detection::new("dog", 0.8, IDEAL)], 1, None, t0())
            .await;
        let shifted = [500.0, 230.0, 1460.0, 878.0];
        let second = tracker
            .update_tracking_at(
                &[Detection::new("dog", 0.8, shifted), Detection::new("dog", 0.8, POOR)],
                2,
                None,
                secs(1),
            )
            .await;

        assert_eq!(first[0].subject_id, "dog_0");
        assert_eq!(second[0].subject_id, "dog_0");
        assert_eq!(second[1].subject_id, "dog_1");
        assert_eq!(tracker.active_subjects().len(), 2);
    }

    #[tokio::test]
    async fn stale_subjects_are_lost_and_recorded() {
        let mut tracker = SubjectTracker::offline(TrackerConfig::default());
        tracker
            .update_tracking_at(
                &[
                    Detection::new("person", 0.9, IDEAL).with_subject_id("a"),
                    Detection::new("person", 0.9, IDEAL).with_subject_id("b"),
                ],
                1,
                None,
                t0(),
            )
            .await;
        tracker
            .update_tracking_at(
                &[Detection::new("person", 0.9, IDEAL).with_subject_id("a")],
                80,
                None,
                secs(3),
            )
            .await;

        let active: Vec<String> = tracker
            .active_subjects()
            .into_iter()
            .map(|s| s.subject_id)
            .collect();
        assert_eq!(active, ["a"]);

        let history = tracker.tracking_history();
        let lost = history.last().unwrap();
        assert_eq!(lost.subject_id, "b");
        assert_eq!(lost.tracking_status, TrackingStatus::Lost);

        let advice = tracker.recent_advice(1);
        assert_eq!(advice[0].advice_type, AdviceTopic::Movement);
        assert_eq!(advice[0].priority, MessagePriority::High);
    }

    #[tokio::test]
    async fn subjects_within_timeout_are_kept() {
        let mut tracker = SubjectTracker::offline(TrackerConfig::default());
        tracker
            .update_tracking_at(
                &[Detection::new("person", 0.9, IDEAL).with_subject_id("a")],
                1,
                None,
                t0(),
            )
            .await;
        tracker.update_tracking_at(&[], 2, None, secs(2)).await;
        assert_eq!(tracker.active_subjects().len(), 1);
    }

    #[tokio::test]
    async fn lost_subject_comes_back_reacquired_then_tracking() {
        let mut tracker = SubjectTracker::offline(TrackerConfig::default());
        let detection = Detection::new("horse", 0.9, IDEAL).with_subject_id("h1");
        tracker.update_tracking_at(&[detection.clone()], 1, None, t0()).await;
        tracker.update_tracking_at(&[], 2, None, secs(5)).await;
        assert!(tracker.active_subjects().is_empty());

        let back = tracker.update_tracking_at(&[detection.clone()], 3, None, secs(6)).await;
        assert_eq!(back[0].tracking_status, TrackingStatus::Reacquired);
        let next = tracker.update_tracking_at(&[detection], 4, None, secs(7)).await;
        assert_eq!(next[0].tracking_status, TrackingStatus::Tracking);
    }

    #[tokio::test]
    async fn oldest_lost_ids_are_forgotten() {
        let mut tracker = SubjectTracker::offline(TrackerConfig {
            lost_capacity: 2,
            ..TrackerConfig::default()
        });
        let seen = |id: &str| Detection::new("cow", 0.9, IDEAL).with_subject_id(id);
        tracker.update_tracking_at(&[seen("a")], 1, None, t0()).await;
        tracker.update_tracking_at(&[seen("b")], 2, None, secs(5)).await;
        tracker.update_tracking_at(&[seen("c")], 3, None, secs(10)).await;
        tracker.update_tracking_at(&[], 4, None, secs(15)).await;
        assert_eq!(tracker.lost_ids.len(), 2);
        assert!(!tracker.lost_ids.contains("a"));

        let back = tracker
            .update_tracking_at(&[seen("a"), seen("c")], 5, None, secs(16))
            .await;
        assert_eq!(back[0].tracking_status, TrackingStatus::Tracking);
        assert_eq!(back[1].tracking_status, TrackingStatus::Reacquired);
    }

    #[tokio::test]
    async fn relost_id_survives_eviction_of_its_stale_entry() {
        let mut tracker = SubjectTracker::offline(TrackerConfig {
            lost_capacity: 2,
            ..TrackerConfig::default()
        });
        let seen = |id: &str| Detection::new("cow", 0.9, IDEAL).with_subject_id(id);
        tracker.update_tracking_at(&[seen("a")], 1, None, t0()).await;
        tracker.update_tracking_at(&[], 2, None, secs(5)).await;
        tracker.update_tracking_at(&[seen("a")], 3, None, secs(6)).await;
        tracker.update_tracking_at(&[seen("b")], 4, None, secs(10)).await;
        // "a" lost a second time; its first entry is the one evicted.
        assert!(tracker.lost_ids.contains("a"));
        tracker.update_tracking_at(&[], 5, None, secs(20)).await;
        assert!(tracker.lost_ids.contains("a"));
        assert!(tracker.lost_ids.contains("b"));
    }

    #[tokio::test]
    async fn poor_framing_raises_medium_message() {
        let mut tracker = SubjectTracker::offline(TrackerConfig::default());
        tracker
            .update_tracking_at(&[Detection::new("car", 0.5, POOR)], 1, None, t0())
            .await;

        let advice = tracker.recent_advice(10);
        assert_eq!(advice.len(), 1);
        assert_eq!(advice[0].advice_type, AdviceTopic::Framing);
        assert_eq!(advice[0].priority, MessagePriority::Medium);
        assert_eq!(advice[0].subject_id, "car_0");
    }

    #[tokio::test]
    async fn composition_advice_is_truncated() {
        let advisor = Arc::new(AdvisoryGenerator::with_service(ScriptedService::replying(
            &"Move left. ".repeat(50),
        )));
        let mut tracker = SubjectTracker::new(TrackerConfig::default(), Some(advisor));
        tracker
            .update_tracking_at(&[Detection::new("car", 0.5, POOR)], 1, None, t0())
            .await;

        let composition: Vec<AdvisoryMessage> = tracker
            .recent_advice(10)
            .into_iter()
            .filter(|m| m.advice_type == AdviceTopic::Composition)
            .collect();
        assert_eq!(composition.len(), 1);
        assert_eq!(composition[0].message.chars().count(), 200);
        assert_eq!(composition[0].priority, MessagePriority::Low);
        assert!(tracker.tracking_status().ai_enabled);
    }

    #[tokio::test]
    async fn fallback_advice_is_not_relayed() {
        let advisor = Arc::new(AdvisoryGenerator::with_service(ScriptedService::failing(
            crate::error::ReasoningError::ServiceUnavailable,
        )));
        let mut tracker = SubjectTracker::new(TrackerConfig::default(), Some(advisor));
        tracker
            .update_tracking_at(&[Detection::new("car", 0.5, POOR)], 1, None, t0())
            .await;
        assert!(tracker
            .recent_advice(10)
            .iter()
            .all(|m| m.advice_type != AdviceTopic::Composition));
    }

    #[tokio::test]
    async fn clear_history_resets_everything() {
        let mut tracker = SubjectTracker::offline(TrackerConfig::default());
        tracker
            .update_tracking_at(&[Detection::new("car", 0.5, POOR)], 1, None, t0())
            .await;
        tracker.clear_history();

        let status = tracker.tracking_status();
        assert_eq!(status.active_tracks, 0);
        assert_eq!(status.total_tracked, 0);
        assert_eq!(status.advice_count, 0);
    }
}

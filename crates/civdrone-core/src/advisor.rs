//! Advisory generation with deterministic fallback.
//!
//! Advice is requested from a [`ReasoningService`] as a strict JSON document.
//! Whenever the service is missing, not ready, slow, or answers with something
//! that cannot be used, the deterministic default for the operation is served
//! instead. Callers always get a fully populated value.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::advice::{
    extract_json_object, FilmingAdvice, PartialFilmingAdvice, PartialRouteAdvice, RouteAdvice,
};
use crate::error::{FallbackReason, ReasoningError};
use crate::models::{GeoPoint, OperationType, SubjectInfo, TerrainInfo, Weather};

/// Text returned by general advice when no generated answer is available.
pub const GENERAL_ADVICE_UNAVAILABLE: &str =
    "AI advice is currently unavailable. Please consult your operation manual.";

const FILMING_SYSTEM_PROMPT: &str = r#"You are an expert drone cinematographer with years of experience in wedding, advertisement and event filming.
Consider camera angles and movements, altitude and speed for smooth footage, shot sequences that tell a story, lighting, weather, framing and subject tracking.

Respond with a single JSON object and nothing else, using exactly this structure:
{
    "recommended_altitude_m": <number in meters>,
    "recommended_speed_mps": <number in m/s>,
    "camera_angles": ["angle1", "angle2"],
    "shot_sequence": [
        {"shot_type": "...", "description": "...", "duration_s": <seconds>}
    ],
    "lighting_advice": "...",
    "weather_considerations": "...",
    "framing_tips": ["tip1", "tip2"],
    "tracking_strategy": "..."
}"#;

const MUSTERING_SYSTEM_PROMPT: &str = r#"You are an expert in livestock management and drone-assisted mustering.
You understand herd behaviour, low-stress stock handling, terrain and safety for animals and operators.
Never recommend flying lower than 20 meters above the herd.

Respond with a single JSON object and nothing else, using exactly this structure:
{
    "waypoints": [
        {"position": [<lat>, <lon>, <altitude_m>], "altitude_m": <meters>, "description": "..."}
    ],
    "recommended_path": "...",
    "timing_advice": "...",
    "safety_considerations": ["..."],
    "optimization_tips": ["..."]
}"#;

const HUNTING_SYSTEM_PROMPT: &str = r#"You are an expert in ethical hunting and wildlife management.
You understand animal movement, wind and scent management, terrain cover, and legal and ethical practice.
Emphasise legal compliance and animal welfare.

Respond with a single JSON object and nothing else, using exactly this structure:
{
    "waypoints": [
        {"position": [<lat>, <lon>, <altitude_m>], "altitude_m": <meters>, "description": "..."}
    ],
    "recommended_path": "...",
    "timing_advice": "...",
    "safety_considerations": ["..."],
    "optimization_tips": ["..."]
}"#;

/// External natural-language reasoning capability.
pub trait ReasoningService: Send + Sync {
    /// Whether the service is configured and accepting requests.
    fn is_ready(&self) -> bool;

    /// Ask the service a question with structured context.
    fn generate_advice(
        &self,
        question: &str,
        context: &Value,
        system_prompt: Option<&str>,
    ) -> impl Future<Output = Result<String, ReasoningError>> + Send;
}

/// Stand-in for "no reasoning service configured".
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl ReasoningService for Unconfigured {
    fn is_ready(&self) -> bool {
        false
    }

    async fn generate_advice(
        &self,
        _question: &str,
        _context: &Value,
        _system_prompt: Option<&str>,
    ) -> Result<String, ReasoningError> {
        Err(ReasoningError::ServiceUnavailable)
    }
}

/// Result of an advice request: generated, or a default with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Advised<T> {
    Generated { advice: T },
    Fallback { advice: T, reason: FallbackReason },
}

impl<T> Advised<T> {
    pub fn into_inner(self) -> T {
        match self {
            Advised::Generated { advice } | Advised::Fallback { advice, .. } => advice,
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Advised::Generated { advice } | Advised::Fallback { advice, .. } => advice,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Advised<U> {
        match self {
            Advised::Generated { advice } => Advised::Generated { advice: f(advice) },
            Advised::Fallback { advice, reason } => Advised::Fallback {
                advice: f(advice),
                reason,
            },
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Advised::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            Advised::Generated { .. } => None,
            Advised::Fallback { reason, .. } => Some(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// Upper bound on a single reasoning-service call
    pub timeout: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdvisorStats {
    pub ai_enabled: bool,
    pub generated: u64,
    pub fallbacks: u64,
}

impl AdvisorStats {
    /// Share of answers served from defaults, as a percentage.
    pub fn fallback_rate_pct(&self) -> f64 {
        let total = self.generated + self.fallbacks;
        if total == 0 {
            0.0
        } else {
            self.fallbacks as f64 * 100.0 / total as f64
        }
    }
}

/// Produces filming, mustering, hunting and general advice.
pub struct AdvisoryGenerator<S = Unconfigured> {
    service: Option<S>,
    config: AdvisorConfig,
    generated: AtomicU64,
    fallbacks: AtomicU64,
}

impl AdvisoryGenerator<Unconfigured> {
    /// Generator that always serves deterministic defaults.
    pub fn offline() -> Self {
        Self::new(None, AdvisorConfig::default())
    }
}

impl<S: ReasoningService> AdvisoryGenerator<S> {
    pub fn new(service: Option<S>, config: AdvisorConfig) -> Self {
        tracing::info!(
            ai_configured = service.is_some(),
            timeout_s = config.timeout.as_secs_f64(),
            "advisory generator initialized"
        );
        Self {
            service,
            config,
            generated: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        }
    }

    pub fn with_service(service: S) -> Self {
        Self::new(Some(service), AdvisorConfig::default())
    }

    /// True when a configured service reports ready.
    pub fn is_ai_enabled(&self) -> bool {
        self.service.as_ref().is_some_and(|service| service.is_ready())
    }

    pub fn stats(&self) -> AdvisorStats {
        AdvisorStats {
            ai_enabled: self.is_ai_enabled(),
            generated: self.generated.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }

    pub fn service(&self) -> Option<&S> {
        self.service.as_ref()
    }

    pub async fn get_filming_advice(
        &self,
        operation: OperationType,
        location: &GeoPoint,
        subject_info: Option<&SubjectInfo>,
        weather: Option<&Weather>,
    ) -> FilmingAdvice {
        self.request_filming_advice(operation, location, subject_info, weather)
            .await
            .into_inner()
    }

    pub async fn request_filming_advice(
        &self,
        operation: OperationType,
        location: &GeoPoint,
        subject_info: Option<&SubjectInfo>,
        weather: Option<&Weather>,
    ) -> Advised<FilmingAdvice> {
        let fallback = FilmingAdvice::default_for(operation);
        let question = format!(
            "Provide expert filming advice for a {} operation at this location.",
            operation
        );
        let context = json!({
            "operation_type": operation,
            "location": location,
            "subject_info": subject_info.cloned().unwrap_or_default(),
            "weather": weather.cloned().unwrap_or_default(),
        });

        match self
            .structured::<PartialFilmingAdvice>(&question, &context, FILMING_SYSTEM_PROMPT)
            .await
        {
            Ok(partial) => self.generated(FilmingAdvice::repair(partial, fallback)),
            Err(reason) => self.fallback("filming", fallback, reason),
        }
    }

    pub async fn get_mustering_advice(
        &self,
        herd_location: &GeoPoint,
        destination: &GeoPoint,
        herd_size: Option<u32>,
        terrain: Option<&TerrainInfo>,
    ) -> RouteAdvice {
        self.request_mustering_advice(herd_location, destination, herd_size, terrain)
            .await
            .into_inner()
    }

    pub async fn request_mustering_advice(
        &self,
        herd_location: &GeoPoint,
        destination: &GeoPoint,
        herd_size: Option<u32>,
        terrain: Option<&TerrainInfo>,
    ) -> Advised<RouteAdvice> {
        let fallback = RouteAdvice::mustering_default(herd_location, destination);
        let herd = herd_size
            .map(|size| size.to_string())
            .unwrap_or_else(|| "unknown size".to_string());
        let question = format!(
            "Provide expert mustering advice for moving a herd of {} from the current location to the destination.",
            herd
        );
        let context = json!({
            "herd_location": herd_location,
            "destination": destination,
            "herd_size": herd_size,
            "terrain": terrain.cloned().unwrap_or_default(),
        });

        match self
            .structured::<PartialRouteAdvice>(&question, &context, MUSTERING_SYSTEM_PROMPT)
            .await
        {
            Ok(partial) => self.generated(RouteAdvice::repair(partial, fallback)),
            Err(reason) => self.fallback("mustering", fallback, reason),
        }
    }

    pub async fn get_hunting_advice(
        &self,
        target: &GeoPoint,
        animal_type: &str,
        terrain: Option<&TerrainInfo>,
        weather: Option<&Weather>,
    ) -> RouteAdvice {
        self.request_hunting_advice(target, animal_type, terrain, weather)
            .await
            .into_inner()
    }

    pub async fn request_hunting_advice(
        &self,
        target: &GeoPoint,
        animal_type: &str,
        terrain: Option<&TerrainInfo>,
        weather: Option<&Weather>,
    ) -> Advised<RouteAdvice> {
        let wind = weather.and_then(|w| w.wind_direction_deg);
        let fallback = RouteAdvice::hunting_default(target, wind);
        let question = format!(
            "Provide expert hunting advice for locating and approaching {} at the target location.",
            animal_type
        );
        let context = json!({
            "target_location": target,
            "animal_type": animal_type,
            "terrain": terrain.cloned().unwrap_or_default(),
            "weather": weather.cloned().unwrap_or_default(),
        });

        match self
            .structured::<PartialRouteAdvice>(&question, &context, HUNTING_SYSTEM_PROMPT)
            .await
        {
            Ok(partial) => self.generated(RouteAdvice::repair(partial, fallback)),
            Err(reason) => self.fallback("hunting", fallback, reason),
        }
    }

    pub async fn get_general_advice(&self, question: &str, context: Option<&Value>) -> String {
        self.request_general_advice(question, context, None)
            .await
            .into_inner()
    }

    /// Free-text advice; an optional system prompt overrides the service default.
    pub async fn request_general_advice(
        &self,
        question: &str,
        context: Option<&Value>,
        system_prompt: Option<&str>,
    ) -> Advised<String> {
        let empty = json!({});
        let context = context.unwrap_or(&empty);
        match self.call(question, context, system_prompt).await {
            Ok(text) if !text.trim().is_empty() => self.generated(text),
            Ok(_) => self.fallback(
                "general",
                GENERAL_ADVICE_UNAVAILABLE.to_string(),
                FallbackReason::MalformedResponse("empty response".to_string()),
            ),
            Err(reason) => self.fallback("general", GENERAL_ADVICE_UNAVAILABLE.to_string(), reason),
        }
    }

    async fn structured<T: DeserializeOwned>(
        &self,
        question: &str,
        context: &Value,
        system_prompt: &str,
    ) -> Result<T, FallbackReason> {
        let text = self.call(question, context, Some(system_prompt)).await?;
        let document = extract_json_object(&text).ok_or_else(|| {
            FallbackReason::MalformedResponse("no JSON object in response".to_string())
        })?;
        serde_json::from_str(document)
            .map_err(|err| FallbackReason::MalformedResponse(err.to_string()))
    }

    async fn call(
        &self,
        question: &str,
        context: &Value,
        system_prompt: Option<&str>,
    ) -> Result<String, FallbackReason> {
        let service = self
            .service
            .as_ref()
            .ok_or(FallbackReason::ServiceNotConfigured)?;
        if !service.is_ready() {
            return Err(FallbackReason::ServiceUnavailable);
        }

        match tokio::time::timeout(
            self.config.timeout,
            service.generate_advice(question, context, system_prompt),
        )
        .await
        {
            Ok(result) => result.map_err(FallbackReason::from),
            Err(_) => Err(FallbackReason::Timeout),
        }
    }

    fn generated<T>(&self, advice: T) -> Advised<T> {
        self.generated.fetch_add(1, Ordering::Relaxed);
        Advised::Generated { advice }
    }

    fn fallback<T>(&self, kind: &str, advice: T, reason: FallbackReason) -> Advised<T> {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        match &reason {
            FallbackReason::ServiceNotConfigured | FallbackReason::ServiceUnavailable => {
                tracing::debug!(kind, %reason, "serving default advice");
            }
            _ => {
                tracing::warn!(kind, %reason, "advice generation failed, serving default advice");
            }
        }
        Advised::Fallback { advice, reason }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedService;
    use super::*;

    fn venue() -> GeoPoint {
        GeoPoint::new(-33.86, 151.21)
    }

    #[tokio::test]
    async fn offline_generator_serves_wedding_default() {
        let advisor = AdvisoryGenerator::offline();
        let advice = advisor
            .get_filming_advice(OperationType::FilmingWedding, &venue(), None, None)
            .await;

        assert_eq!(advice.recommended_altitude_m, 25.0);
        assert_eq!(advice.recommended_speed_mps, 2.0);
        assert_eq!(advice.shot_sequence.len(), 4);
        assert!(!advisor.is_ai_enabled());
    }

    #[tokio::test]
    async fn unparsable_reply_falls_back_to_same_default() {
        let advisor = AdvisoryGenerator::with_service(ScriptedService::replying(
            "Fly low and slow, keep the couple in frame.",
        ));
        let advised = advisor
            .request_filming_advice(OperationType::FilmingWedding, &venue(), None, None)
            .await;

        assert!(advised.is_fallback());
        assert!(matches!(
            advised.fallback_reason(),
            Some(FallbackReason::MalformedResponse(_))
        ));
        assert_eq!(
            advised.into_inner(),
            FilmingAdvice::default_for(OperationType::FilmingWedding)
        );
    }

    #[tokio::test]
    async fn schema_violation_falls_back() {
        let advisor = AdvisoryGenerator::with_service(ScriptedService::replying(
            r#"{"recommended_altitude_m": "high", "camera_angles": "overhead"}"#,
        ));
        let advised = advisor
            .request_filming_advice(OperationType::FilmingAdvertisement, &venue(), None, None)
            .await;

        assert!(advised.is_fallback());
        assert_eq!(advised.value().recommended_altitude_m, 40.0);
    }

    #[tokio::test]
    async fn generated_advice_fills_missing_fields_from_default() {
        let reply = "```json\n{\"recommended_altitude_m\": 35, \"camera_angles\": [\"orbit\"]}\n```";
        let advisor = AdvisoryGenerator::with_service(ScriptedService::replying(reply));
        let advised = advisor
            .request_filming_advice(OperationType::FilmingWedding, &venue(), None, None)
            .await;

        assert!(!advised.is_fallback());
        let advice = advised.into_inner();
        let default = FilmingAdvice::default_for(OperationType::FilmingWedding);
        assert_eq!(advice.recommended_altitude_m, 35.0);
        assert_eq!(advice.camera_angles, ["orbit"]);
        assert_eq!(advice.recommended_speed_mps, default.recommended_speed_mps);
        assert_eq!(advice.shot_sequence, default.shot_sequence);
        assert_eq!(advisor.stats().generated, 1);
    }

    #[tokio::test]
    async fn service_errors_never_escape() {
        let advisor = AdvisoryGenerator::with_service(ScriptedService::failing(
            ReasoningError::Transport("connection refused".to_string()),
        ));
        let herd = GeoPoint::new(-25.0, 135.0);
        let destination = GeoPoint::new(-25.01, 135.0);
        let advice = advisor
            .get_mustering_advice(&herd, &destination, Some(120), None)
            .await;

        assert_eq!(advice, RouteAdvice::mustering_default(&herd, &destination));
        let stats = advisor.stats();
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.fallback_rate_pct(), 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_service_times_out_to_default() {
        let mut service = ScriptedService::replying(r#"{"timing_advice": "noon"}"#);
        service.delay = Some(Duration::from_secs(120));
        let advisor = AdvisoryGenerator::new(
            Some(service),
            AdvisorConfig {
                timeout: Duration::from_secs(30),
            },
        );
        let target = GeoPoint::new(46.0, -112.0);
        let advised = advisor
            .request_hunting_advice(&target, "elk", None, None)
            .await;

        assert_eq!(advised.fallback_reason(), Some(&FallbackReason::Timeout));
        assert_eq!(advised.value().waypoints.len(), 3);
    }

    #[tokio::test]
    async fn not_ready_service_is_not_called() {
        let mut service = ScriptedService::replying("{}");
        service.ready = false;
        let advisor = AdvisoryGenerator::with_service(service);
        let text = advisor.get_general_advice("How high?", None).await;

        assert_eq!(text, GENERAL_ADVICE_UNAVAILABLE);
        let questions = advisor
            .service()
            .map(|s| s.questions.lock().unwrap().len())
            .unwrap_or_default();
        assert_eq!(questions, 0);
    }

    #[tokio::test]
    async fn general_advice_passes_text_through() {
        let advisor =
            AdvisoryGenerator::with_service(ScriptedService::replying("Climb to 40m and pan left."));
        let context = json!({"framing_quality": 0.4});
        let text = advisor
            .get_general_advice("How should I improve framing?", Some(&context))
            .await;
        assert_eq!(text, "Climb to 40m and pan left.");
    }
}

//! Shared types for the scriptcast pipeline.
//!
//! Used by scriptcast-lib, scriptcast-cli, and anything else that wants to
//! segment a script without pulling in tokio or reqwest.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─── Voice registry ────────────────────────────────────────────────────────

/// One `(label substring, voice id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceEntry {
    pub label: String,
    pub voice: String,
}

/// Ordered speaker-label → voice mapping with a mandatory default.
///
/// A label resolves to the first entry whose key is a substring of the
/// normalized label. Entry order is the tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRegistry", into = "RawRegistry")]
pub struct VoiceRegistry {
    entries: Vec<VoiceEntry>,
    default: String,
}

#[derive(Serialize, Deserialize)]
struct RawRegistry {
    default: String,
    #[serde(default)]
    voices: Vec<VoiceEntry>,
}

impl TryFrom<RawRegistry> for VoiceRegistry {
    type Error = String;

    fn try_from(raw: RawRegistry) -> Result<Self, Self::Error> {
        let mut registry = VoiceRegistry::new(raw.default)?;
        for entry in raw.voices {
            registry.push(entry.label, entry.voice)?;
        }
        Ok(registry)
    }
}

impl From<VoiceRegistry> for RawRegistry {
    fn from(registry: VoiceRegistry) -> Self {
        Self {
            default: registry.default,
            voices: registry.entries,
        }
    }
}

impl VoiceRegistry {
    /// Empty registry that resolves every label to `default`.
    pub fn new(default: impl Into<String>) -> Result<Self, String> {
        let default = default.into().trim().to_string();
        if default.is_empty() {
            return Err("voice registry needs a non-empty default voice".into());
        }
        Ok(Self {
            entries: Vec::new(),
            default,
        })
    }

    /// Append an entry. Keys are trimmed and lower-cased; an empty key would
    /// match every label and is rejected.
    pub fn push(&mut self, label: impl AsRef<str>, voice: impl Into<String>) -> Result<(), String> {
        let label = label.as_ref().trim().to_lowercase();
        if label.is_empty() {
            return Err("voice registry label must not be empty".into());
        }
        let voice = voice.into().trim().to_string();
        if voice.is_empty() {
            return Err(format!("voice registry entry '{label}' has an empty voice id"));
        }
        self.entries.push(VoiceEntry { label, voice });
        Ok(())
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, label: impl AsRef<str>, voice: impl Into<String>) -> Result<Self, String> {
        self.push(label, voice)?;
        Ok(self)
    }

    /// Resolve an already-normalized speaker label to a voice id.
    pub fn resolve(&self, label: &str) -> &str {
        self.entries
            .iter()
            .find(|e| label.contains(e.label.as_str()))
            .map(|e| e.voice.as_str())
            .unwrap_or(&self.default)
    }

    /// Stock registry whose voice ids belong to `provider`'s catalogue.
    pub fn for_provider(provider: ProviderKind) -> Self {
        match provider {
            ProviderKind::ElevenLabs => Self::default(),
            // Speechify ids are catalogue names; one voice reads every part.
            ProviderKind::Speechify => Self {
                entries: Vec::new(),
                default: SPEECHIFY_HENRY.to_string(),
            },
        }
    }

    pub fn default_voice(&self) -> &str {
        &self.default
    }

    pub fn entries(&self) -> &[VoiceEntry] {
        &self.entries
    }
}

const SPEECHIFY_HENRY: &str = "henry";

impl Default for VoiceRegistry {
    /// The stock ElevenLabs catalogue: Rachel for female roles, Arnold for male.
    fn default() -> Self {
        const RACHEL: &str = "21m00Tcm4TlvDq8ikWAM";
        const ARNOLD: &str = "VR6AewLTigWG4xSOukaG";
        let pairs = [
            ("host 1", RACHEL),
            ("host 2", ARNOLD),
            ("narrator", RACHEL),
            ("interviewer", ARNOLD),
            ("expert", RACHEL),
        ];
        Self {
            entries: pairs
                .iter()
                .map(|(label, voice)| VoiceEntry {
                    label: label.to_string(),
                    voice: voice.to_string(),
                })
                .collect(),
            default: RACHEL.to_string(),
        }
    }
}

// ─── Segments ──────────────────────────────────────────────────────────────

/// One voice-tagged unit of speech extracted from a script line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub voice_id: String,
    pub text: String,
    /// 1-based line number in the source script.
    pub line: usize,
}

/// How emphasis markers inside an utterance are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleaningPolicy {
    /// Every `*...*`, `**...**` and `[...]` span is a cue and gets removed.
    #[default]
    Strict,
    /// `[...]` is removed, `**bold**` is unwrapped, and `*...*` is removed
    /// only when it reads like a cue (multi-word or a known action word).
    Selective,
}

impl std::str::FromStr for CleaningPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "selective" => Ok(Self::Selective),
            other => Err(format!(
                "invalid cleaning policy '{other}'; valid policies: strict, selective"
            )),
        }
    }
}

impl std::fmt::Display for CleaningPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Strict => "strict",
            Self::Selective => "selective",
        })
    }
}

// ─── Pipeline config ──────────────────────────────────────────────────────

/// Which speech-synthesis provider renders segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Per-segment voice via `/v1/text-to-speech/{voice}`.
    #[default]
    ElevenLabs,
    /// Single-call JSON API returning base64 audio.
    Speechify,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "elevenlabs" => Ok(Self::ElevenLabs),
            "speechify" => Ok(Self::Speechify),
            other => Err(format!(
                "invalid provider '{other}'; valid providers: elevenlabs, speechify"
            )),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ElevenLabs => "elevenlabs",
            Self::Speechify => "speechify",
        })
    }
}

/// Default deadline for one generate-audio request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Everything a synthesis request needs besides the script and credential.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub provider: ProviderKind,
    /// Override for the provider's API base URL.
    pub base_url: Option<String>,
    pub policy: CleaningPolicy,
    pub request_timeout: Duration,
    pub registry: VoiceRegistry,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            policy: CleaningPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            registry: VoiceRegistry::for_provider(ProviderKind::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> VoiceRegistry {
        VoiceRegistry::new("V0")
            .and_then(|r| r.with("host 1", "V1"))
            .and_then(|r| r.with("host", "V2"))
            .unwrap()
    }

    // ── VoiceRegistry ───────────────────────────────────────────────

    #[test]
    fn resolves_substring_match() {
        assert_eq!(registry().resolve("host 1 (intro)"), "V1");
    }

    #[test]
    fn first_entry_wins_on_overlap() {
        // "host" also matches, but "host 1" was inserted first
        assert_eq!(registry().resolve("host 1"), "V1");
        assert_eq!(registry().resolve("co-host"), "V2");
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(registry().resolve("guest"), "V0");
    }

    #[test]
    fn keys_are_normalized() {
        let r = VoiceRegistry::new("V0").unwrap().with("  Narrator ", "V3").unwrap();
        assert_eq!(r.entries()[0].label, "narrator");
        assert_eq!(r.resolve("the narrator"), "V3");
    }

    #[test]
    fn rejects_empty_default_and_keys() {
        assert!(VoiceRegistry::new("  ").is_err());
        assert!(VoiceRegistry::new("V0").unwrap().with("", "V1").is_err());
        assert!(VoiceRegistry::new("V0").unwrap().with("host", " ").is_err());
    }

    #[test]
    fn stock_registry_matches_hosts() {
        let r = VoiceRegistry::default();
        assert_eq!(r.resolve("host 2"), "VR6AewLTigWG4xSOukaG");
        assert_eq!(r.resolve("somebody"), r.default_voice());
    }

    #[test]
    fn stock_registry_follows_provider() {
        let eleven = VoiceRegistry::for_provider(ProviderKind::ElevenLabs);
        assert_eq!(eleven, VoiceRegistry::default());

        let speechify = VoiceRegistry::for_provider(ProviderKind::Speechify);
        assert_eq!(speechify.default_voice(), "henry");
        for label in ["host 1", "host 2", "narrator", "expert", "guest"] {
            assert_eq!(speechify.resolve(label), "henry", "{label}");
        }
    }

    #[test]
    fn registry_from_json_keeps_order() {
        let json = r#"{"default":"V0","voices":[{"label":"Host","voice":"V2"},{"label":"host 1","voice":"V1"}]}"#;
        let r: VoiceRegistry = serde_json::from_str(json).unwrap();
        assert_eq!(r.resolve("host 1"), "V2");
        assert_eq!(r.default_voice(), "V0");
    }

    #[test]
    fn registry_json_rejects_missing_default() {
        let json = r#"{"default":"","voices":[]}"#;
        assert!(serde_json::from_str::<VoiceRegistry>(json).is_err());
    }

    // ── CleaningPolicy ──────────────────────────────────────────────

    #[test]
    fn policy_parses_names() {
        assert_eq!("strict".parse::<CleaningPolicy>(), Ok(CleaningPolicy::Strict));
        assert_eq!("Selective".parse::<CleaningPolicy>(), Ok(CleaningPolicy::Selective));
        assert!("loose".parse::<CleaningPolicy>().is_err());
        assert_eq!(CleaningPolicy::default().to_string(), "strict");
    }

    #[test]
    fn provider_parses_names() {
        assert_eq!("ElevenLabs".parse::<ProviderKind>(), Ok(ProviderKind::ElevenLabs));
        assert_eq!("speechify".parse::<ProviderKind>(), Ok(ProviderKind::Speechify));
        assert!("polly".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn pipeline_defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.provider, ProviderKind::ElevenLabs);
        assert_eq!(c.policy, CleaningPolicy::Strict);
        assert_eq!(c.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert!(c.base_url.is_none());
        assert_eq!(c.registry, VoiceRegistry::for_provider(c.provider));
    }

    #[test]
    fn segment_serializes_camel_case() {
        let s = Segment {
            voice_id: "V1".into(),
            text: "Hi".into(),
            line: 3,
        };
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"voiceId":"V1","text":"Hi","line":3}"#);
    }
}

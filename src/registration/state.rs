//! Registration state machine. Tracks which step a user is on and validates
//! each answer before the profile moves forward.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::groups::Group;
use crate::store::CatcherRecord;

/// Maximum self-intro length, counted in Unicode scalar values.
pub const MAX_INTRO_CHARS: usize = 50;

/// Typing this instead of an intro selects [`INTRO_PLACEHOLDER`].
pub const INTRO_SENTINEL: &str = "52~~";

/// Intro stored when the user sends [`INTRO_SENTINEL`].
pub const INTRO_PLACEHOLDER: &str = "我愛蛇哥";

/// Legacy plates: four digits, dash, two alphanumerics (`1234-AB`).
static LEGACY_PLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[A-Za-z0-9]{2}$").expect("legacy plate regex"));

/// Current plates: three letters, dash, four digits (`ABC-1234`).
static CURRENT_PLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{3}-[0-9]{4}$").expect("current plate regex"));

/// The steps of a catcher registration.
///
/// Progresses linearly: AwaitingPlate → AwaitingPlaces → AwaitingIntro →
/// AwaitingCover. Completion removes the state entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStep {
    AwaitingPlate,
    AwaitingPlaces,
    AwaitingIntro,
    AwaitingCover,
}

impl RegistrationStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: RegistrationStep) -> bool {
        use RegistrationStep::*;
        matches!(
            (self, target),
            (AwaitingPlate, AwaitingPlaces)
                | (AwaitingPlaces, AwaitingIntro)
                | (AwaitingIntro, AwaitingCover)
        )
    }

    /// Get the next step, or `None` from the last one.
    pub fn next(&self) -> Option<RegistrationStep> {
        use RegistrationStep::*;
        match self {
            AwaitingPlate => Some(AwaitingPlaces),
            AwaitingPlaces => Some(AwaitingIntro),
            AwaitingIntro => Some(AwaitingCover),
            AwaitingCover => None,
        }
    }
}

impl std::fmt::Display for RegistrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingPlate => "awaiting_plate",
            Self::AwaitingPlaces => "awaiting_places",
            Self::AwaitingIntro => "awaiting_intro",
            Self::AwaitingCover => "awaiting_cover",
        };
        write!(f, "{s}")
    }
}

/// Why an answer was not accepted. The step stays where it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("plate number does not match NNNN-XX or AAA-NNNN")]
    InvalidPlate,

    #[error("self intro is {chars} characters, limit is {MAX_INTRO_CHARS}")]
    IntroTooLong { chars: usize },
}

/// What happened to a text answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOutcome {
    /// Accepted; the state now sits at the contained step.
    Advanced(RegistrationStep),
    /// Rejected; nothing changed.
    Rejected(InputError),
    /// The current step does not take text.
    Ignored,
}

/// A catcher profile being filled in across turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatcherProfile {
    pub plate_number: String,
    pub user_id: String,
    pub user_name: String,
    pub haunted_places: String,
    pub self_intro: String,
    pub cover_url: String,
    group_ids: Vec<String>,
    group_names: Vec<String>,
}

impl CatcherProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn group_ids(&self) -> &[String] {
        &self.group_ids
    }

    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    /// Record the groups the user belongs to, keeping ids and names aligned.
    pub fn set_memberships(&mut self, groups: &[Group]) {
        self.group_ids = groups.iter().map(|g| g.id.clone()).collect();
        self.group_names = groups.iter().map(|g| g.name.clone()).collect();
    }

    /// One record per group membership.
    pub fn fan_out(&self) -> Vec<CatcherRecord> {
        self.group_ids
            .iter()
            .zip(&self.group_names)
            .map(|(group_id, group_name)| CatcherRecord {
                plate_number: self.plate_number.clone(),
                user_id: self.user_id.clone(),
                user_name: self.user_name.clone(),
                self_intro: self.self_intro.clone(),
                haunted_places: self.haunted_places.clone(),
                cover_url: self.cover_url.clone(),
                group_id: group_id.clone(),
                group_name: group_name.clone(),
            })
            .collect()
    }
}

/// A user's in-progress registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub step: RegistrationStep,
    pub profile: CatcherProfile,
}

impl ConversationState {
    /// Fresh state right after the trigger phrase.
    pub fn start(user_id: impl Into<String>) -> Self {
        Self {
            step: RegistrationStep::AwaitingPlate,
            profile: CatcherProfile::new(user_id),
        }
    }

    /// Apply a text answer to the current step.
    pub fn apply_text(&mut self, text: &str) -> TextOutcome {
        let accepted = match self.step {
            RegistrationStep::AwaitingPlate => {
                normalize_plate(text).map(|plate| self.profile.plate_number = plate)
            }
            RegistrationStep::AwaitingPlaces => {
                self.profile.haunted_places = text.to_string();
                Ok(())
            }
            RegistrationStep::AwaitingIntro => {
                normalize_intro(text).map(|intro| self.profile.self_intro = intro)
            }
            RegistrationStep::AwaitingCover => return TextOutcome::Ignored,
        };

        match accepted {
            Ok(()) => match self.advance() {
                Some(step) => TextOutcome::Advanced(step),
                None => TextOutcome::Ignored,
            },
            Err(e) => TextOutcome::Rejected(e),
        }
    }

    fn advance(&mut self) -> Option<RegistrationStep> {
        let next = self.step.next()?;
        if !self.step.can_transition_to(next) {
            return None;
        }
        self.step = next;
        Some(next)
    }
}

/// Validate a plate number and return its upper-cased form.
pub fn normalize_plate(text: &str) -> Result<String, InputError> {
    if CURRENT_PLATE.is_match(text) || LEGACY_PLATE.is_match(text) {
        Ok(text.to_uppercase())
    } else {
        Err(InputError::InvalidPlate)
    }
}

/// Validate a self intro, substituting the placeholder for the sentinel.
pub fn normalize_intro(text: &str) -> Result<String, InputError> {
    let chars = text.chars().count();
    if chars > MAX_INTRO_CHARS {
        return Err(InputError::IntroTooLong { chars });
    }
    if text == INTRO_SENTINEL {
        return Ok(INTRO_PLACEHOLDER.to_string());
    }
    Ok(text.to_string())
}

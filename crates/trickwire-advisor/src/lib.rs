//! The advisory-oracle seam.
//!
//! Trickwire never decides what to bid or play. An external advisor — a
//! heuristic engine, an LLM wrapper, a human in a terminal — implements
//! the [`Advisor`] trait, and the session machine is its sole caller.
//!
//! Whatever the advisor returns is *advisory*: before anything reaches
//! the server it is vetted against the server-provided allowed set. A
//! suggestion outside that set is discarded and replaced with a safe
//! default — the first allowed call, or no automatic play at all.

use trickwire_protocol::{
    Call, Card, Contract, PositionCall, Seat, TrickPlay, TrickRecord,
};

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

/// How suggestions are used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PilotMode {
    /// The advisor is never consulted.
    #[default]
    Off,
    /// Suggestions are surfaced to the user as informational text.
    Copilot,
    /// Vetted suggestions are submitted automatically.
    Autopilot,
}

impl PilotMode {
    /// Whether this mode consults the advisor at all.
    pub fn consults(self) -> bool {
        !matches!(self, PilotMode::Off)
    }
}

// ---------------------------------------------------------------------------
// Queries and suggestions
// ---------------------------------------------------------------------------

/// Everything the advisor may consider when proposing a call.
#[derive(Debug, Clone)]
pub struct CallQuery<'a> {
    pub seat: Seat,
    pub hand: &'a [Card],
    pub allowed: &'a [Call],
    pub bid_history: &'a [PositionCall],
}

/// Everything the advisor may consider when proposing a card.
#[derive(Debug, Clone)]
pub struct CardQuery<'a> {
    pub seat: Seat,
    pub hand: &'a [Card],
    /// The publicly revealed hand, where one exists.
    pub dummy: &'a [Card],
    /// True when the declarer is playing from the dummy's cards.
    pub from_dummy: bool,
    pub current_trick: &'a [TrickPlay],
    pub allowed: &'a [Card],
    pub declarer: Option<Seat>,
    pub contract: Option<Contract>,
    pub bid_history: &'a [PositionCall],
    pub trick_history: &'a [TrickRecord],
}

/// A proposed call with the oracle's reasoning.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSuggestion {
    /// Absent when the oracle produced rationale but no parsable action.
    pub call: Option<Call>,
    pub rationale: String,
}

/// A proposed card with the oracle's reasoning.
#[derive(Debug, Clone, PartialEq)]
pub struct CardSuggestion {
    pub card: Option<Card>,
    pub rationale: String,
}

// ---------------------------------------------------------------------------
// The trait
// ---------------------------------------------------------------------------

/// The external suggestion engine. Consumed, never implemented, by the
/// session core — everything here is best-effort and failure is
/// recoverable.
pub trait Advisor: Send {
    /// Proposes a call during the auction.
    ///
    /// # Errors
    /// Returns [`AdvisorError`] when the oracle is unreachable or its
    /// output is unusable. The caller falls back to a safe default.
    fn suggest_call(
        &mut self,
        query: &CallQuery<'_>,
    ) -> Result<CallSuggestion, AdvisorError>;

    /// Proposes a card during play.
    ///
    /// # Errors
    /// As [`Advisor::suggest_call`].
    fn suggest_card(
        &mut self,
        query: &CardQuery<'_>,
    ) -> Result<CardSuggestion, AdvisorError>;
}

/// Failures of the advisory oracle. Never fatal to the session.
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    /// The oracle could not be reached at all.
    #[error("advisor unavailable: {0}")]
    Unavailable(String),

    /// The oracle answered, but not in a form that parses to an action.
    #[error("advisor output unusable: {0}")]
    Unusable(String),
}

// ---------------------------------------------------------------------------
// Vetting
// ---------------------------------------------------------------------------

/// Checks a suggested call against the server-allowed set.
///
/// Out-of-set (or absent) suggestions fall back to the first allowed
/// call; with nothing allowed there is nothing to do.
pub fn vet_call(suggested: Option<&Call>, allowed: &[Call]) -> Option<Call> {
    match suggested {
        Some(call) if allowed.contains(call) => Some(call.clone()),
        Some(call) => {
            tracing::warn!(?call, "suggested call not allowed, using default");
            allowed.first().cloned()
        }
        None => allowed.first().cloned(),
    }
}

/// Checks a suggested card against the server-allowed set.
///
/// Unlike calls there is no harmless default play, so a bad suggestion
/// yields no automatic action.
pub fn vet_card(suggested: Option<&Card>, allowed: &[Card]) -> Option<Card> {
    match suggested {
        Some(card) if allowed.contains(card) => Some(*card),
        Some(card) => {
            tracing::warn!(%card, "suggested card not allowed, withholding play");
            None
        }
        None => None,
    }
}

// ---------------------------------------------------------------------------
// Built-in advisors
// ---------------------------------------------------------------------------

/// The trivial oracle: always proposes the first allowed action. Useful
/// as a stand-in until a real engine is plugged in.
#[derive(Debug, Default)]
pub struct FirstAllowed;

impl Advisor for FirstAllowed {
    fn suggest_call(
        &mut self,
        query: &CallQuery<'_>,
    ) -> Result<CallSuggestion, AdvisorError> {
        Ok(CallSuggestion {
            call: query.allowed.first().cloned(),
            rationale: "first allowed call".into(),
        })
    }

    fn suggest_card(
        &mut self,
        query: &CardQuery<'_>,
    ) -> Result<CardSuggestion, AdvisorError> {
        Ok(CardSuggestion {
            card: query.allowed.first().copied(),
            rationale: "first allowed card".into(),
        })
    }
}

/// A scripted oracle for test suites: pops pre-loaded suggestions in
/// order, and errors once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedAdvisor {
    calls: std::collections::VecDeque<CallSuggestion>,
    cards: std::collections::VecDeque<CardSuggestion>,
}

impl ScriptedAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_call(&mut self, suggestion: CallSuggestion) {
        self.calls.push_back(suggestion);
    }

    pub fn push_card(&mut self, suggestion: CardSuggestion) {
        self.cards.push_back(suggestion);
    }
}

impl Advisor for ScriptedAdvisor {
    fn suggest_call(
        &mut self,
        _query: &CallQuery<'_>,
    ) -> Result<CallSuggestion, AdvisorError> {
        self.calls
            .pop_front()
            .ok_or_else(|| AdvisorError::Unavailable("script exhausted".into()))
    }

    fn suggest_card(
        &mut self,
        _query: &CardQuery<'_>,
    ) -> Result<CardSuggestion, AdvisorError> {
        self.cards
            .pop_front()
            .ok_or_else(|| AdvisorError::Unavailable("script exhausted".into()))
    }
}

// =========================================================================
// Tests
// =========================================================================

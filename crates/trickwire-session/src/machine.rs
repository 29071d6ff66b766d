//! The session machine: handshake, reply and event application, and the
//! advisory hooks.
//!
//! The machine owns the session, the table mirror, and both channels. It
//! never blocks: [`SessionMachine::poll`] drains whatever has arrived and
//! applies it, and the caller decides when to poll (on a timer, on link
//! readiness, or both).

use std::collections::VecDeque;

use trickwire_advisor::{
    vet_call, vet_card, Advisor, CallQuery, CardQuery, PilotMode,
};
use trickwire_model::{MergeOutcome, TableState};
use trickwire_protocol::{
    Call, Card, Command, Event, EventFrame, GameId, Reply, ReplyFrame,
    ReplyStatus, Scope, Seat, StateUpdate,
};
use trickwire_transport::{ControlLink, EventLink};

use crate::channel::{EventChannel, RequestChannel};
use crate::session::{Phase, Session};
use crate::SessionError;

/// The protocol version this client speaks.
const PROTOCOL_VERSION: &str = "0.1";

/// Something the operator should see. Drained via
/// [`SessionMachine::take_notices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The session cannot continue.
    Fatal(String),
    /// Informational, e.g. an advisor's rationale.
    Advisory(String),
    /// The server rejected a call or play as against the rules. The
    /// action is abandoned, the session continues.
    RuleViolation(String),
}

/// Drives one client session over a control link and an event link.
pub struct SessionMachine<C: ControlLink, E: EventLink> {
    session: Session,
    table: TableState,
    control: RequestChannel<C>,
    events: EventChannel<E>,
    advisor: Option<Box<dyn Advisor>>,
    pilot: PilotMode,
    notices: VecDeque<Notice>,
    fault_surfaced: bool,
}

impl<C: ControlLink, E: EventLink> SessionMachine<C, E> {
    pub fn new(
        session: Session,
        control: C,
        events: E,
        advisor: Option<Box<dyn Advisor>>,
        pilot: PilotMode,
    ) -> Self {
        Self {
            session,
            table: TableState::new(),
            control: RequestChannel::new(control),
            events: EventChannel::new(events),
            advisor,
            pilot,
            notices: VecDeque::new(),
            fault_surfaced: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn table(&self) -> &TableState {
        &self.table
    }

    /// Whether the session can still make progress.
    pub fn healthy(&self) -> bool {
        self.session.phase() != Phase::Terminated && self.control.healthy()
    }

    /// Notices accumulated since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn control_notifier(&self) -> std::sync::Arc<tokio::sync::Notify> {
        self.control.notifier()
    }

    pub fn event_notifier(&self) -> std::sync::Arc<tokio::sync::Notify> {
        self.events.notifier()
    }

    // -----------------------------------------------------------------------
    // Handshake
    // -----------------------------------------------------------------------

    /// Opens the handshake.
    ///
    /// # Errors
    /// Fails if the hello command cannot be sent.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.control.send(&Command::Hello {
            version: PROTOCOL_VERSION.to_owned(),
            role: "client".to_owned(),
        })?;
        self.session.set_phase(Phase::Handshaking);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Polling
    // -----------------------------------------------------------------------

    /// Drains and applies everything queued on both channels. Never
    /// blocks. Channel faults terminate the session and surface as one
    /// [`Notice::Fatal`].
    pub fn poll(&mut self) {
        if self.session.phase() == Phase::Terminated {
            return;
        }
        let (replies, fault) = self.control.drain();
        for reply in replies {
            self.apply_reply(reply);
        }
        if let Some(fault) = fault {
            self.fail(format!("control channel failed: {fault}"));
        }

        if self.session.phase() == Phase::Terminated {
            return;
        }
        let (events, fault) = self.events.drain();
        for event in events {
            self.apply_event(event);
        }
        if let Some(fault) = fault {
            self.fail(format!("event channel failed: {fault}"));
        }
    }

    fn fail(&mut self, reason: String) {
        tracing::error!(%reason, "session terminated");
        if !self.fault_surfaced {
            self.fault_surfaced = true;
            self.notices.push_back(Notice::Fatal(reason));
        }
        self.session.set_phase(Phase::Terminated);
    }

    // -----------------------------------------------------------------------
    // Replies
    // -----------------------------------------------------------------------

    fn apply_reply(&mut self, frame: ReplyFrame) {
        if frame.status == ReplyStatus::Failure {
            match frame.reply {
                // Rejected actions are abandoned, never retried. The
                // server remains authoritative about what was legal.
                Reply::Call | Reply::Play => {
                    tracing::warn!(tag = frame.reply.tag(), "action rejected");
                    self.notices.push_back(Notice::RuleViolation(format!(
                        "the server rejected the {}",
                        frame.reply.tag()
                    )));
                }
                _ => {
                    self.fail(format!(
                        "command {} failed during handshake",
                        frame.reply.tag()
                    ));
                }
            }
            return;
        }

        match frame.reply {
            Reply::Hello => self.on_hello(),
            Reply::Game { game } => self.on_game_created(game),
            Reply::Join { game } => self.on_joined(game),
            Reply::Get { state, counter } => self.on_state(state, counter),
            Reply::Call | Reply::Play => {
                tracing::debug!(tag = frame.reply.tag(), "action accepted");
            }
        }
    }

    fn on_hello(&mut self) {
        if self.session.creates_game() {
            let game = self.session.requested_game().cloned();
            if self.send_or_fail(&Command::Game { game }) {
                self.session.set_phase(Phase::AwaitingGameId);
            }
        } else {
            self.send_join();
        }
    }

    fn on_game_created(&mut self, game: Option<GameId>) {
        if let Some(game) = game {
            self.session.set_requested_game(game);
        }
        self.send_join();
    }

    fn send_join(&mut self) {
        let cmd = Command::Join {
            player: self.session.player().clone(),
            position: self.session.preferred_position(),
            game: self.session.requested_game().cloned(),
        };
        if self.send_or_fail(&cmd) {
            self.session.set_phase(Phase::Joining);
        }
    }

    fn on_joined(&mut self, game: Option<GameId>) {
        let Some(game) = game else {
            self.fail("join reply carried no game id".to_owned());
            return;
        };
        self.session.set_game(game.clone());
        if let Err(err) = self.events.subscribe(&game) {
            self.fail(format!("event subscription failed: {err}"));
            return;
        }
        self.session.set_phase(Phase::Joined);
        // The combined initial fetch: every scope at once.
        self.request_state(Scope::ALL.to_vec());
    }

    fn on_state(&mut self, state: StateUpdate, counter: Option<u64>) {
        if counter.is_none() {
            tracing::warn!("state reply without counter");
        }
        self.session.observe_counter(counter);
        let outcome = self.table.merge(state);
        if let Some(seat) = outcome.position {
            self.session.assign_position(seat);
        }
        self.consult_advisor(&outcome);
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    fn apply_event(&mut self, frame: EventFrame) {
        if self.session.game() != Some(&frame.game) {
            tracing::debug!(game = %frame.game, "event for another game dropped");
            return;
        }
        let counter = frame.event.counter();
        if self.session.is_stale(counter) {
            tracing::debug!(
                tag = frame.event.tag(),
                ?counter,
                "stale event dropped"
            );
            return;
        }
        if counter.is_none() && !matches!(frame.event, Event::Player { .. }) {
            tracing::warn!(tag = frame.event.tag(), "event without counter");
        }
        self.session.observe_counter(counter);

        match frame.event {
            Event::Deal {
                opener,
                vulnerability,
                ..
            } => {
                self.table.begin_deal(opener, vulnerability);
                self.session.set_phase(Phase::InDeal);
                self.request_state(vec![Scope::Pubstate, Scope::Privstate]);
            }
            Event::Turn { position, .. } => {
                self.table.set_turn(position);
                if Some(position) == self.session.assigned_position() {
                    self.request_state(vec![Scope::Own]);
                } else {
                    self.table.clear_own_choices();
                }
            }
            Event::Call { position, call, .. } => {
                self.table.record_call(position, call);
            }
            Event::Bidding {
                declarer, contract, ..
            } => {
                self.table.fix_contract(declarer, contract);
            }
            Event::Play { position, card, .. } => {
                self.table.apply_play(position, card);
            }
            Event::Dummy {
                position, cards, ..
            } => {
                self.table.reveal_hand(position, cards);
            }
            Event::Trick { winner, .. } => {
                self.table.complete_trick(winner);
            }
            Event::DealEnd { result, .. } => {
                self.table.finish_deal(result);
                self.session.set_phase(Phase::Joined);
            }
            Event::Player { player, position } => {
                tracing::info!(%player, %position, "seat taken");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Submits a call. The local allowed set is cleared immediately; the
    /// server's reply and events settle the outcome.
    ///
    /// # Errors
    /// [`SessionError::NotJoined`] before a game is joined, or a channel
    /// error if sending fails.
    pub fn submit_call(&mut self, call: Call) -> Result<(), SessionError> {
        let game = self.session.game().cloned().ok_or(SessionError::NotJoined)?;
        self.control.send(&Command::Call {
            game,
            player: self.session.player().clone(),
            call,
        })?;
        self.table.clear_own_choices();
        Ok(())
    }

    /// Plays a card. See [`SessionMachine::submit_call`].
    ///
    /// # Errors
    /// As [`SessionMachine::submit_call`].
    pub fn submit_card(&mut self, card: Card) -> Result<(), SessionError> {
        let game = self.session.game().cloned().ok_or(SessionError::NotJoined)?;
        self.control.send(&Command::Play {
            game,
            player: self.session.player().clone(),
            card,
        })?;
        self.table.clear_own_choices();
        Ok(())
    }

    fn request_state(&mut self, scopes: Vec<Scope>) {
        let Some(game) = self.session.game().cloned() else {
            return;
        };
        let cmd = Command::Get {
            game,
            player: self.session.player().clone(),
            scopes,
        };
        self.send_or_fail(&cmd);
    }

    fn send_or_fail(&mut self, cmd: &Command) -> bool {
        match self.control.send(cmd) {
            Ok(()) => true,
            Err(err) => {
                self.fail(format!("sending {} failed: {err}", cmd.tag()));
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Advisory
    // -----------------------------------------------------------------------

    fn consult_advisor(&mut self, outcome: &MergeOutcome) {
        if !self.pilot.consults() {
            return;
        }
        let Some(seat) = self.session.assigned_position() else {
            return;
        };
        if self.table.position_in_turn() != Some(seat) {
            return;
        }
        if outcome.allowed_calls_updated && !self.table.allowed_calls().is_empty()
        {
            self.consult_for_call(seat);
        } else if outcome.allowed_cards_updated
            && !self.table.allowed_cards().is_empty()
        {
            self.consult_for_card(seat);
        }
    }

    fn consult_for_call(&mut self, seat: Seat) {
        let allowed = self.table.allowed_calls().to_vec();

        // A forced call needs no oracle.
        if self.pilot == PilotMode::Autopilot && allowed.len() == 1 {
            let call = allowed[0].clone();
            tracing::info!(?call, "only one call allowed, submitting");
            if let Err(err) = self.submit_call(call) {
                self.fail(format!("submitting forced call failed: {err}"));
            }
            return;
        }

        let suggested = match self.advisor.as_mut() {
            Some(advisor) => {
                let query = CallQuery {
                    seat,
                    hand: self.table.hand(seat),
                    allowed: &allowed,
                    bid_history: self.table.calls(),
                };
                match advisor.suggest_call(&query) {
                    Ok(suggestion) => {
                        self.notices
                            .push_back(Notice::Advisory(suggestion.rationale));
                        suggestion.call
                    }
                    Err(err) => {
                        tracing::warn!(%err, "call advisor failed");
                        self.notices.push_back(Notice::Advisory(format!(
                            "advisor failed: {err}"
                        )));
                        None
                    }
                }
            }
            None => None,
        };

        if self.pilot == PilotMode::Autopilot {
            if let Some(call) = vet_call(suggested.as_ref(), &allowed) {
                if let Err(err) = self.submit_call(call) {
                    self.fail(format!("submitting call failed: {err}"));
                }
            }
        }
    }

    fn consult_for_card(&mut self, seat: Seat) {
        let allowed = self.table.allowed_cards().to_vec();
        let dummy_seat = self.table.declarer().map(Seat::partner);
        let from_dummy = self.table.declarer() == Some(seat)
            && self.table.position_in_turn() == dummy_seat;

        let suggested = match self.advisor.as_mut() {
            Some(advisor) => {
                let query = CardQuery {
                    seat,
                    hand: self.table.hand(seat),
                    dummy: dummy_seat
                        .map(|s| self.table.hand(s))
                        .unwrap_or(&[]),
                    from_dummy,
                    current_trick: self.table.current_trick(),
                    allowed: &allowed,
                    declarer: self.table.declarer(),
                    contract: self.table.contract(),
                    bid_history: self.table.calls(),
                    trick_history: self.table.trick_history(),
                };
                match advisor.suggest_card(&query) {
                    Ok(suggestion) => {
                        self.notices
                            .push_back(Notice::Advisory(suggestion.rationale));
                        suggestion.card
                    }
                    Err(err) => {
                        tracing::warn!(%err, "card advisor failed");
                        self.notices.push_back(Notice::Advisory(format!(
                            "advisor failed: {err}"
                        )));
                        None
                    }
                }
            }
            None => None,
        };

        // No safe default play exists, so a vetoed suggestion leaves the
        // turn to the operator.
        if self.pilot == PilotMode::Autopilot {
            if let Some(card) = vet_card(suggested.as_ref(), &allowed) {
                if let Err(err) = self.submit_card(card) {
                    self.fail(format!("submitting card failed: {err}"));
                }
            }
        }
    }
}

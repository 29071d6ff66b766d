//! The client: link wiring, the driver loop, and the frontend surface.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use trickwire_advisor::Advisor;
use trickwire_protocol::{
    Call, Card, Contract, DealResult, Partnership, PositionCall, Seat,
    TrickPlay, TrickRecord,
};
use trickwire_session::{Notice, Phase, SessionMachine};
use trickwire_transport::{
    ControlLink, EventLink, WsControlLink, WsEventLink,
};

use crate::{ClientConfig, ClientError};

/// How often the driver polls regardless of link activity. Link readiness
/// wakes it sooner; the timer bounds the gap when a wakeup is lost.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A client over WebSocket links, the usual deployment.
pub type WsClient = Client<WsControlLink, WsEventLink>;

/// One table-server session: two links, one session machine, one task.
///
/// All state lives inside this value. Nothing is shared: a frontend polls
/// the accessors between [`Client::run`] wakeups or drives
/// [`Client::poll`] from its own loop.
pub struct Client<C: ControlLink, E: EventLink> {
    machine: SessionMachine<C, E>,
}

impl WsClient {
    /// Connects both links and assembles a client. The handshake itself
    /// starts when [`Client::run`] (or [`Client::start`]) is called.
    ///
    /// # Errors
    /// Fails if either WebSocket connection cannot be established.
    pub async fn connect(
        config: ClientConfig,
        advisor: Option<Box<dyn Advisor>>,
    ) -> Result<Self, ClientError> {
        let control =
            WsControlLink::connect(&config.control_endpoint, &config.security)
                .await?;
        let events =
            WsEventLink::connect(&config.event_endpoint, &config.security)
                .await?;
        Ok(Self::from_parts(&config, control, events, advisor))
    }
}

impl<C: ControlLink, E: EventLink> Client<C, E> {
    /// Assembles a client over already-built links. Test suites use this
    /// with the in-memory transport.
    pub fn from_parts(
        config: &ClientConfig,
        control: C,
        events: E,
        advisor: Option<Box<dyn Advisor>>,
    ) -> Self {
        Self {
            machine: SessionMachine::new(
                config.session(),
                control,
                events,
                advisor,
                config.pilot,
            ),
        }
    }

    /// Opens the handshake without entering the driver loop.
    ///
    /// # Errors
    /// Fails if the hello command cannot be sent.
    pub fn start(&mut self) -> Result<(), ClientError> {
        self.machine.start()?;
        Ok(())
    }

    /// Drains and applies everything pending on both channels. Never
    /// blocks.
    pub fn poll(&mut self) {
        self.machine.poll();
    }

    /// Runs the session to completion: starts the handshake, then wakes
    /// on link readiness or on a fixed timer, polls both channels, and
    /// hands accumulated notices to `on_notice`. Returns when the
    /// session terminates.
    ///
    /// # Errors
    /// Fails only if the handshake cannot be opened; everything after
    /// that surfaces through notices.
    pub async fn run<F>(&mut self, mut on_notice: F) -> Result<(), ClientError>
    where
        F: FnMut(Notice),
    {
        self.start()?;

        let control_ready = self.machine.control_notifier();
        let event_ready = self.machine.event_notifier();
        let mut tick = tokio::time::interval(POLL_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.machine.healthy() {
            tokio::select! {
                _ = tick.tick() => {}
                _ = control_ready.notified() => {}
                _ = event_ready.notified() => {}
            }
            self.machine.poll();
            for notice in self.machine.take_notices() {
                on_notice(notice);
            }
        }
        tracing::info!("session over");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Frontend surface
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.machine.session().phase()
    }

    /// The seat the server assigned to this client, once known.
    pub fn assigned_seat(&self) -> Option<Seat> {
        self.machine.session().assigned_position()
    }

    pub fn seat_to_act(&self) -> Option<Seat> {
        self.machine.table().position_in_turn()
    }

    /// The known cards of one hand. Empty for hands the server has not
    /// revealed to this client.
    pub fn hand(&self, seat: Seat) -> &[Card] {
        self.machine.table().hand(seat)
    }

    /// The auction so far, in call order.
    pub fn calls(&self) -> &[PositionCall] {
        self.machine.table().calls()
    }

    pub fn contract(&self) -> Option<Contract> {
        self.machine.table().contract()
    }

    pub fn declarer(&self) -> Option<Seat> {
        self.machine.table().declarer()
    }

    /// The declaring partnership, once bidding has concluded.
    pub fn declaring_side(&self) -> Option<Partnership> {
        self.machine.table().declaring_side()
    }

    /// The trick currently on the table.
    pub fn current_trick(&self) -> &[TrickPlay] {
        self.machine.table().current_trick()
    }

    /// Completed tricks of the current deal.
    pub fn tricks(&self) -> &[TrickRecord] {
        self.machine.table().trick_history()
    }

    pub fn tricks_won(&self, partnership: Partnership) -> usize {
        self.machine.table().tricks_won(partnership)
    }

    /// Per-deal results, oldest first.
    pub fn scores(&self) -> &[DealResult] {
        self.machine.table().results()
    }

    /// Calls the server currently allows from this client. Empty when it
    /// is not our turn to call.
    pub fn allowed_calls(&self) -> &[Call] {
        self.machine.table().allowed_calls()
    }

    /// Cards the server currently allows from this client. Empty when it
    /// is not our turn to play.
    pub fn allowed_cards(&self) -> &[Card] {
        self.machine.table().allowed_cards()
    }

    /// Notices accumulated since the last drain. [`Client::run`] drains
    /// them itself; frontends driving [`Client::poll`] call this.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.machine.take_notices()
    }

    /// Submits a call in the auction.
    ///
    /// # Errors
    /// Fails before a game is joined or when the control link is down.
    pub fn submit_call(&mut self, call: Call) -> Result<(), ClientError> {
        self.machine.submit_call(call)?;
        Ok(())
    }

    /// Plays a card.
    ///
    /// # Errors
    /// As [`Client::submit_call`].
    pub fn submit_card(&mut self, card: Card) -> Result<(), ClientError> {
        self.machine.submit_card(card)?;
        Ok(())
    }
}

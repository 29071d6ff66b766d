//! The table aggregate and its transitions.

use std::collections::HashMap;

use trickwire_protocol::{
    Call, Card, Contract, DealResult, Partnership, PositionCall, Seat,
    StateUpdate, TrickPlay, TrickRecord, Vulnerability,
};

/// What a [`TableState::merge`] changed — the parts the session machine
/// reacts to (seat assignment, freshly allowed actions).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// A seat assignment was present in the update.
    pub position: Option<Seat>,
    /// The update carried an allowed-calls list (possibly empty).
    pub allowed_calls_updated: bool,
    /// The update carried an allowed-cards list (possibly empty).
    pub allowed_cards_updated: bool,
}

/// The authoritative local mirror of one table.
#[derive(Debug, Default, Clone)]
pub struct TableState {
    /// Known cards per seat: own hand (private fetch) and public reveals.
    hands: HashMap<Seat, Vec<Card>>,
    /// The bid ledger. Only grows within a deal.
    calls: Vec<PositionCall>,
    declarer: Option<Seat>,
    contract: Option<Contract>,
    /// Plays of the trick in progress, at most four.
    current_trick: Vec<TrickPlay>,
    /// Completed tricks with winners, in completion order.
    trick_history: Vec<TrickRecord>,
    vulnerability: Vulnerability,
    position_in_turn: Option<Seat>,
    /// What this client may submit right now. Empty unless it is our turn.
    allowed_calls: Vec<Call>,
    allowed_cards: Vec<Card>,
    /// Results of completed deals, oldest first.
    results: Vec<DealResult>,
}

impl TableState {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------
    // Read accessors (the GUI-facing surface)
    // -----------------------------------------------------------------

    /// The known cards of one seat. Unknown hands are empty, not errors.
    pub fn hand(&self, seat: Seat) -> &[Card] {
        self.hands.get(&seat).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn calls(&self) -> &[PositionCall] {
        &self.calls
    }

    pub fn declarer(&self) -> Option<Seat> {
        self.declarer
    }

    pub fn contract(&self) -> Option<Contract> {
        self.contract
    }

    /// The declaring partnership, once bidding has concluded.
    pub fn declaring_side(&self) -> Option<Partnership> {
        self.declarer.map(Seat::partnership)
    }

    pub fn current_trick(&self) -> &[TrickPlay] {
        &self.current_trick
    }

    pub fn trick_history(&self) -> &[TrickRecord] {
        &self.trick_history
    }

    /// Completed tricks won by the given partnership this deal.
    pub fn tricks_won(&self, partnership: Partnership) -> usize {
        self.trick_history
            .iter()
            .filter_map(|trick| trick.winner)
            .filter(|winner| winner.partnership() == partnership)
            .count()
    }

    pub fn vulnerability(&self) -> Vulnerability {
        self.vulnerability
    }

    pub fn position_in_turn(&self) -> Option<Seat> {
        self.position_in_turn
    }

    pub fn allowed_calls(&self) -> &[Call] {
        &self.allowed_calls
    }

    pub fn allowed_cards(&self) -> &[Card] {
        &self.allowed_cards
    }

    pub fn results(&self) -> &[DealResult] {
        &self.results
    }

    // -----------------------------------------------------------------
    // Event transitions (driven by the session machine)
    // -----------------------------------------------------------------

    /// A new deal: the opener is on turn, vulnerability is fixed, and the
    /// previous deal's bidding result is cleared. Everything else is
    /// refreshed by the state fetch the machine issues alongside.
    pub fn begin_deal(&mut self, opener: Seat, vulnerability: Vulnerability) {
        self.position_in_turn = Some(opener);
        self.vulnerability = vulnerability;
        self.declarer = None;
        self.contract = None;
        self.calls.clear();
        self.current_trick.clear();
        self.trick_history.clear();
        self.hands.clear();
        self.allowed_calls.clear();
        self.allowed_cards.clear();
    }

    pub fn set_turn(&mut self, seat: Seat) {
        self.position_in_turn = Some(seat);
    }

    /// It is not our turn: nothing is allowed until the server says so.
    pub fn clear_own_choices(&mut self) {
        self.allowed_calls.clear();
        self.allowed_cards.clear();
    }

    /// Appends to the bid ledger.
    pub fn record_call(&mut self, seat: Seat, call: Call) {
        self.calls.push(PositionCall {
            position: seat,
            call,
        });
    }

    /// Bidding concluded: declarer and contract are fixed for the deal.
    pub fn fix_contract(&mut self, declarer: Seat, contract: Contract) {
        if self.contract.is_some() {
            tracing::warn!(%declarer, "contract fixed twice within a deal");
        }
        self.declarer = Some(declarer);
        self.contract = Some(contract);
        tracing::info!(%declarer, ?contract, "bidding concluded");
    }

    /// Moves a card from the acting seat's known hand into the current
    /// trick. Hidden hands simply have nothing to remove.
    pub fn apply_play(&mut self, seat: Seat, card: Card) {
        if self
            .current_trick
            .iter()
            .any(|play| play.card == card)
        {
            tracing::warn!(%seat, %card, "duplicate card in trick ignored");
            return;
        }
        if let Some(hand) = self.hands.get_mut(&seat) {
            hand.retain(|held| *held != card);
        }
        self.current_trick.push(TrickPlay {
            position: seat,
            card,
        });
    }

    /// A seat's full hand became public (the dummy). The server's list
    /// replaces whatever we knew for that seat; a card belongs to at most
    /// one hand, so it also leaves any other seat it was guessed into.
    pub fn reveal_hand(&mut self, seat: Seat, cards: Vec<Card>) {
        for (other, hand) in self.hands.iter_mut() {
            if *other != seat {
                hand.retain(|held| !cards.contains(held));
            }
        }
        self.hands.insert(seat, cards);
    }

    /// The current trick is complete: record it with its winner and start
    /// the next one empty.
    pub fn complete_trick(&mut self, winner: Seat) {
        let cards = std::mem::take(&mut self.current_trick);
        self.trick_history.push(TrickRecord {
            cards,
            winner: Some(winner),
        });
    }

    /// The deal is over: keep the score, clear the displayed calls.
    pub fn finish_deal(&mut self, result: DealResult) {
        self.results.push(result);
        self.calls.clear();
    }

    // -----------------------------------------------------------------
    // Structural merge (get replies)
    // -----------------------------------------------------------------

    /// Applies a `get` reply payload.
    ///
    /// Mentioned fields are replaced with the server's values; absent
    /// fields stay untouched. Public cards land before private ones, so
    /// on a conflict the private view wins.
    pub fn merge(&mut self, update: StateUpdate) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        if let Some(pubstate) = update.pubstate {
            if let Some(calls) = pubstate.calls {
                self.calls = calls;
            }
            match (pubstate.declarer, pubstate.contract) {
                (Some(declarer), Some(contract)) => {
                    self.declarer = Some(declarer);
                    self.contract = Some(contract);
                }
                _ => {}
            }
            if let Some(cards) = pubstate.cards {
                for (seat, hand) in cards {
                    self.hands.insert(seat, hand);
                }
            }
            if let Some(tricks) = pubstate.tricks {
                self.set_tricks(tricks);
            }
            if let Some(vulnerability) = pubstate.vulnerability {
                self.vulnerability = vulnerability;
            }
        }

        if let Some(privstate) = update.privstate {
            if let Some(cards) = privstate.cards {
                for (seat, hand) in cards {
                    self.hands.insert(seat, hand);
                }
            }
        }

        if let Some(own) = update.own {
            if let Some(position) = own.position {
                outcome.position = Some(position);
            }
            if let Some(seat) = own.position_in_turn {
                self.position_in_turn = Some(seat);
            }
            if let Some(allowed) = own.allowed_calls {
                self.allowed_calls = allowed;
                outcome.allowed_calls_updated = true;
            }
            if let Some(allowed) = own.allowed_cards {
                self.allowed_cards = allowed;
                outcome.allowed_cards_updated = true;
            }
        }

        outcome
    }

    /// Replaces the trick view from a full server list: completed tricks
    /// go to history, a trailing winnerless trick is the one in progress.
    fn set_tricks(&mut self, tricks: Vec<TrickRecord>) {
        self.current_trick.clear();
        self.trick_history.clear();
        for trick in tricks {
            if trick.winner.is_some() {
                self.trick_history.push(trick);
            } else {
                self.current_trick = trick.cards;
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use trickwire_protocol::{OwnState, PrivState, PubState, Rank, Suit};

    fn card(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    fn own_hand() -> Vec<Card> {
        vec![
            card(Rank::Ace, Suit::Spades),
            card(Rank::King, Suit::Hearts),
            card(Rank::Two, Suit::Clubs),
        ]
    }

    #[test]
    fn test_merge_of_allowed_calls_touches_nothing_else() {
        let mut table = TableState::new();
        table.reveal_hand(Seat::North, own_hand());
        table.record_call(Seat::East, Call::Pass);
        let before_hand = table.hand(Seat::North).to_vec();
        let before_calls = table.calls().to_vec();

        let outcome = table.merge(StateUpdate {
            own: Some(OwnState {
                allowed_calls: Some(vec![Call::Pass, Call::Double]),
                ..Default::default()
            }),
            ..Default::default()
        });

        assert!(outcome.allowed_calls_updated);
        assert!(!outcome.allowed_cards_updated);
        assert_eq!(table.allowed_calls().len(), 2);
        assert_eq!(table.hand(Seat::North), before_hand.as_slice());
        assert_eq!(table.calls(), before_calls.as_slice());
        assert!(table.trick_history().is_empty());
    }

    #[test]
    fn test_merge_private_cards_win_over_public() {
        let mut table = TableState::new();
        let pub_view = vec![card(Rank::Two, Suit::Clubs)];
        let priv_view = own_hand();

        table.merge(StateUpdate {
            pubstate: Some(PubState {
                cards: Some(HashMap::from([(Seat::North, pub_view)])),
                ..Default::default()
            }),
            privstate: Some(PrivState {
                cards: Some(HashMap::from([(
                    Seat::North,
                    priv_view.clone(),
                )])),
            }),
            own: None,
        });

        assert_eq!(table.hand(Seat::North), priv_view.as_slice());
    }

    #[test]
    fn test_merge_absent_scope_means_unchanged() {
        let mut table = TableState::new();
        table.reveal_hand(Seat::South, own_hand());

        let outcome = table.merge(StateUpdate::default());

        assert_eq!(outcome, MergeOutcome::default());
        assert_eq!(table.hand(Seat::South), own_hand().as_slice());
    }

    #[test]
    fn test_play_moves_card_from_hand_to_trick() {
        let mut table = TableState::new();
        table.reveal_hand(Seat::North, own_hand());
        let played = card(Rank::Ace, Suit::Spades);

        table.apply_play(Seat::North, played);

        assert!(!table.hand(Seat::North).contains(&played));
        assert_eq!(table.current_trick().len(), 1);
        assert_eq!(table.current_trick()[0].card, played);
    }

    #[test]
    fn test_card_conservation_across_a_trick() {
        let mut table = TableState::new();
        table.reveal_hand(Seat::North, own_hand());
        table.reveal_hand(Seat::East, vec![card(Rank::Three, Suit::Clubs)]);

        table.apply_play(Seat::North, card(Rank::Two, Suit::Clubs));
        table.apply_play(Seat::East, card(Rank::Three, Suit::Clubs));
        table.complete_trick(Seat::East);

        // Every card exists exactly once across hands, the current trick,
        // and completed tricks.
        let mut seen = Vec::new();
        for seat in Seat::ALL {
            seen.extend_from_slice(table.hand(seat));
        }
        seen.extend(table.current_trick().iter().map(|p| p.card));
        for trick in table.trick_history() {
            seen.extend(trick.cards.iter().map(|p| p.card));
        }
        let mut deduped = seen.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(seen.len(), deduped.len());
    }

    #[test]
    fn test_duplicate_play_is_ignored() {
        let mut table = TableState::new();
        table.apply_play(Seat::North, card(Rank::Ace, Suit::Spades));
        table.apply_play(Seat::East, card(Rank::Ace, Suit::Spades));
        assert_eq!(table.current_trick().len(), 1);
    }

    #[test]
    fn test_dummy_reveal_replaces_and_deduplicates() {
        let mut table = TableState::new();
        let shared = card(Rank::Queen, Suit::Diamonds);
        table.reveal_hand(Seat::West, vec![shared]);

        table.reveal_hand(Seat::East, vec![shared, card(Rank::Jack, Suit::Diamonds)]);

        assert_eq!(table.hand(Seat::East).len(), 2);
        assert!(table.hand(Seat::West).is_empty());
    }

    #[test]
    fn test_trick_accounting() {
        let mut table = TableState::new();
        for winner in [Seat::North, Seat::East, Seat::South] {
            table.apply_play(winner, card(Rank::Two, Suit::Clubs));
            table.complete_trick(winner);
        }

        assert_eq!(table.tricks_won(Partnership::NorthSouth), 2);
        assert_eq!(table.tricks_won(Partnership::EastWest), 1);
        assert_eq!(table.trick_history().len(), 3);
        assert!(table.current_trick().is_empty());
    }

    #[test]
    fn test_begin_deal_resets_the_deal_scope() {
        let mut table = TableState::new();
        table.record_call(Seat::North, Call::Pass);
        table.fix_contract(
            Seat::North,
            Contract {
                bid: trickwire_protocol::Bid {
                    level: 3,
                    strain: trickwire_protocol::Strain::NoTrump,
                },
                doubling: trickwire_protocol::Doubling::Undoubled,
            },
        );
        assert_eq!(table.declaring_side(), Some(Partnership::NorthSouth));
        table.finish_deal(DealResult {
            partnership: Some(Partnership::NorthSouth),
            score: 400,
        });

        table.begin_deal(
            Seat::East,
            Vulnerability {
                north_south: true,
                east_west: false,
            },
        );

        assert_eq!(table.position_in_turn(), Some(Seat::East));
        assert!(table.contract().is_none());
        assert!(table.declarer().is_none());
        assert!(table.declaring_side().is_none());
        assert!(table.calls().is_empty());
        // Scores survive across deals.
        assert_eq!(table.results().len(), 1);
    }

    #[test]
    fn test_merge_tricks_splits_open_trick_from_history() {
        let mut table = TableState::new();
        table.merge(StateUpdate {
            pubstate: Some(PubState {
                tricks: Some(vec![
                    TrickRecord {
                        cards: vec![],
                        winner: Some(Seat::West),
                    },
                    TrickRecord {
                        cards: vec![TrickPlay {
                            position: Seat::North,
                            card: card(Rank::Five, Suit::Hearts),
                        }],
                        winner: None,
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        });

        assert_eq!(table.trick_history().len(), 1);
        assert_eq!(table.current_trick().len(), 1);
        assert_eq!(table.tricks_won(Partnership::EastWest), 1);
    }
}

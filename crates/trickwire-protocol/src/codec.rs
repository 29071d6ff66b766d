//! Frame codec: commands out, replies and events in.
//!
//! A frame is an ordered list of parts (see
//! [`trickwire_transport::Frame`]). The layouts:
//!
//! ```text
//! command:  [tag]    [key] [JSON] [key] [JSON] …
//! reply:    [status] [tag] [key] [JSON] …
//! event:    [<gameID>:<tag>] [key] [JSON] …
//! ```
//!
//! Keyword arguments appear in call order. Optional arguments are simply
//! omitted. Decoding validates structure only — what a message *means* is
//! the session layer's business.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use trickwire_transport::Frame;

use crate::frames::{Command, Event, EventFrame, Reply, ReplyFrame, ReplyStatus};
use crate::types::{GameId, StateUpdate};
use crate::ProtocolError;

const STATUS_SUCCESS: &str = "success";
const STATUS_FAILURE: &str = "failure";

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serializes a command into a control-channel frame.
///
/// # Errors
/// Returns [`ProtocolError::Encode`] if an argument fails to serialize.
pub fn encode_command(cmd: &Command) -> Result<Frame, ProtocolError> {
    let mut frame: Frame = vec![cmd.tag().to_owned()];
    match cmd {
        Command::Hello { version, role } => {
            push_arg(&mut frame, "version", version)?;
            push_arg(&mut frame, "role", role)?;
        }
        Command::Game { game } => {
            push_opt(&mut frame, "game", game.as_ref())?;
        }
        Command::Join {
            player,
            position,
            game,
        } => {
            push_arg(&mut frame, "player", player)?;
            push_opt(&mut frame, "position", position.as_ref())?;
            push_opt(&mut frame, "game", game.as_ref())?;
        }
        Command::Get {
            game,
            player,
            scopes,
        } => {
            push_arg(&mut frame, "game", game)?;
            push_arg(&mut frame, "player", player)?;
            push_arg(&mut frame, "get", scopes)?;
        }
        Command::Call { game, player, call } => {
            push_arg(&mut frame, "game", game)?;
            push_arg(&mut frame, "player", player)?;
            push_arg(&mut frame, "call", call)?;
        }
        Command::Play { game, player, card } => {
            push_arg(&mut frame, "game", game)?;
            push_arg(&mut frame, "player", player)?;
            push_arg(&mut frame, "card", card)?;
        }
    }
    Ok(frame)
}

fn push_arg<T: Serialize>(
    frame: &mut Frame,
    key: &str,
    value: &T,
) -> Result<(), ProtocolError> {
    let doc = serde_json::to_string(value).map_err(ProtocolError::Encode)?;
    frame.push(key.to_owned());
    frame.push(doc);
    Ok(())
}

fn push_opt<T: Serialize>(
    frame: &mut Frame,
    key: &str,
    value: Option<&T>,
) -> Result<(), ProtocolError> {
    match value {
        Some(value) => push_arg(frame, key, value),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Decoding — replies
// ---------------------------------------------------------------------------

/// Parses a control-channel reply frame.
///
/// # Errors
/// Fails on a missing or unknown tag, an argument that violates its
/// schema, or a status that is neither `success` nor `failure` (the
/// latter marks a transport-level error).
pub fn decode_reply(frame: &Frame) -> Result<ReplyFrame, ProtocolError> {
    let [status, tag, args @ ..] = frame.as_slice() else {
        return Err(ProtocolError::MissingTag);
    };
    let status = match status.as_str() {
        STATUS_SUCCESS => ReplyStatus::Success,
        STATUS_FAILURE => ReplyStatus::Failure,
        other => return Err(ProtocolError::BadStatus(other.to_owned())),
    };
    let mut kwargs = collect_kwargs(args)?;

    let reply = match tag.as_str() {
        "bridgehlo" => Reply::Hello,
        "game" => Reply::Game {
            game: take_opt(&mut kwargs, "game")?,
        },
        "join" => Reply::Join {
            game: take_opt(&mut kwargs, "game")?,
        },
        "get" => Reply::Get {
            state: take_opt::<StateUpdate>(&mut kwargs, "get")?
                .unwrap_or_default(),
            counter: take_opt(&mut kwargs, "counter")?,
        },
        "call" => Reply::Call,
        "play" => Reply::Play,
        other => return Err(ProtocolError::UnknownTag(other.to_owned())),
    };
    Ok(ReplyFrame { status, reply })
}

// ---------------------------------------------------------------------------
// Decoding — events
// ---------------------------------------------------------------------------

/// Parses an event-channel frame. The topic part carries both the game id
/// and the event tag.
///
/// # Errors
/// Fails on a malformed topic, an unknown tag, or an argument that
/// violates its schema.
pub fn decode_event(frame: &Frame) -> Result<EventFrame, ProtocolError> {
    let [topic, args @ ..] = frame.as_slice() else {
        return Err(ProtocolError::MissingTag);
    };
    let Some((game, tag)) = topic.split_once(':') else {
        return Err(ProtocolError::BadTopic(topic.clone()));
    };
    let mut kwargs = collect_kwargs(args)?;

    let event = match tag {
        "deal" => Event::Deal {
            opener: take(&mut kwargs, "opener")?,
            vulnerability: take(&mut kwargs, "vulnerability")?,
            counter: take_opt(&mut kwargs, "counter")?,
        },
        "turn" => Event::Turn {
            position: take(&mut kwargs, "position")?,
            counter: take_opt(&mut kwargs, "counter")?,
        },
        "call" => Event::Call {
            position: take(&mut kwargs, "position")?,
            call: take(&mut kwargs, "call")?,
            counter: take_opt(&mut kwargs, "counter")?,
        },
        "bidding" => Event::Bidding {
            declarer: take(&mut kwargs, "declarer")?,
            contract: take(&mut kwargs, "contract")?,
            counter: take_opt(&mut kwargs, "counter")?,
        },
        "play" => Event::Play {
            position: take(&mut kwargs, "position")?,
            card: take(&mut kwargs, "card")?,
            counter: take_opt(&mut kwargs, "counter")?,
        },
        "dummy" => Event::Dummy {
            position: take(&mut kwargs, "position")?,
            cards: take(&mut kwargs, "cards")?,
            counter: take_opt(&mut kwargs, "counter")?,
        },
        "trick" => Event::Trick {
            winner: take(&mut kwargs, "winner")?,
            counter: take_opt(&mut kwargs, "counter")?,
        },
        "dealend" => Event::DealEnd {
            result: take(&mut kwargs, "result")?,
            counter: take_opt(&mut kwargs, "counter")?,
        },
        "player" => Event::Player {
            player: take(&mut kwargs, "player")?,
            position: take(&mut kwargs, "position")?,
        },
        other => return Err(ProtocolError::UnknownTag(other.to_owned())),
    };
    Ok(EventFrame {
        game: GameId(game.to_owned()),
        event,
    })
}

// ---------------------------------------------------------------------------
// Keyword-argument helpers
// ---------------------------------------------------------------------------

fn collect_kwargs(args: &[String]) -> Result<Map<String, Value>, ProtocolError> {
    if args.len() % 2 != 0 {
        // Safe to index: a non-empty odd-length slice has a last element.
        return Err(ProtocolError::DanglingKey(
            args[args.len() - 1].clone(),
        ));
    }
    let mut map = Map::with_capacity(args.len() / 2);
    for pair in args.chunks_exact(2) {
        let value = serde_json::from_str(&pair[1])
            .map_err(ProtocolError::Decode)?;
        map.insert(pair[0].clone(), value);
    }
    Ok(map)
}

/// Removes and deserializes a required argument. Explicit null counts as
/// missing, matching the backend's convention.
fn take<T: DeserializeOwned>(
    kwargs: &mut Map<String, Value>,
    key: &'static str,
) -> Result<T, ProtocolError> {
    take_opt(kwargs, key)?.ok_or(ProtocolError::MissingField(key))
}

fn take_opt<T: DeserializeOwned>(
    kwargs: &mut Map<String, Value>,
    key: &'static str,
) -> Result<Option<T>, ProtocolError> {
    match kwargs.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(ProtocolError::Decode),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Bid, Call, Card, PlayerId, Rank, Scope, Seat, Strain, Suit,
    };
    use serde_json::json;

    fn frame(parts: &[&str]) -> Frame {
        parts.iter().map(|p| p.to_string()).collect()
    }

    // -- encoding --

    #[test]
    fn test_encode_hello_layout() {
        let cmd = Command::Hello {
            version: "0.1".into(),
            role: "client".into(),
        };
        assert_eq!(
            encode_command(&cmd).unwrap(),
            frame(&["bridgehlo", "version", "\"0.1\"", "role", "\"client\""])
        );
    }

    #[test]
    fn test_encode_join_omits_absent_options() {
        let cmd = Command::Join {
            player: PlayerId("p1".into()),
            position: None,
            game: None,
        };
        assert_eq!(
            encode_command(&cmd).unwrap(),
            frame(&["join", "player", "\"p1\""])
        );
    }

    #[test]
    fn test_encode_join_with_preferred_position() {
        let cmd = Command::Join {
            player: PlayerId("p1".into()),
            position: Some(Seat::East),
            game: Some(GameId("g1".into())),
        };
        assert_eq!(
            encode_command(&cmd).unwrap(),
            frame(&[
                "join", "player", "\"p1\"", "position", "\"east\"", "game",
                "\"g1\""
            ])
        );
    }

    #[test]
    fn test_encode_get_scope_list() {
        let cmd = Command::Get {
            game: GameId("g1".into()),
            player: PlayerId("p1".into()),
            scopes: vec![Scope::Pubstate, Scope::Privstate],
        };
        let encoded = encode_command(&cmd).unwrap();
        assert_eq!(encoded[5], "get");
        assert_eq!(
            serde_json::from_str::<Value>(&encoded[6]).unwrap(),
            json!(["pubstate", "privstate"])
        );
    }

    #[test]
    fn test_encode_combined_fetch_names_every_scope() {
        let cmd = Command::Get {
            game: GameId("g1".into()),
            player: PlayerId("p1".into()),
            scopes: Scope::ALL.to_vec(),
        };
        assert_eq!(
            encode_command(&cmd).unwrap(),
            frame(&[
                "get",
                "game",
                "\"g1\"",
                "player",
                "\"p1\"",
                "get",
                "[\"pubstate\",\"privstate\",\"self\"]",
            ])
        );
    }

    #[test]
    fn test_encode_play_card_document() {
        let cmd = Command::Play {
            game: GameId("g1".into()),
            player: PlayerId("p1".into()),
            card: Card {
                rank: Rank::Ace,
                suit: Suit::Spades,
            },
        };
        let encoded = encode_command(&cmd).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(encoded.last().unwrap()).unwrap(),
            json!({"rank": "ace", "suit": "spades"})
        );
    }

    // -- replies --

    #[test]
    fn test_decode_get_reply_with_counter() {
        let reply = decode_reply(&frame(&[
            "success",
            "get",
            "get",
            r#"{"self": {"allowedCalls": [{"type": "pass"}]}}"#,
            "counter",
            "7",
        ]))
        .unwrap();
        assert_eq!(reply.status, ReplyStatus::Success);
        let Reply::Get { state, counter } = reply.reply else {
            panic!("wrong reply variant");
        };
        assert_eq!(counter, Some(7));
        assert_eq!(
            state.own.unwrap().allowed_calls,
            Some(vec![Call::Pass])
        );
    }

    #[test]
    fn test_decode_reply_without_counter() {
        let reply =
            decode_reply(&frame(&["success", "get", "get", "{}"])).unwrap();
        let Reply::Get { counter, .. } = reply.reply else {
            panic!("wrong reply variant");
        };
        assert_eq!(counter, None);
    }

    #[test]
    fn test_decode_failure_status_is_game_level() {
        // A rule violation comes back as "failure" — valid, not an error.
        let reply = decode_reply(&frame(&["failure", "play"])).unwrap();
        assert_eq!(reply.status, ReplyStatus::Failure);
        assert_eq!(reply.reply, Reply::Play);
    }

    #[test]
    fn test_decode_transport_level_status_fails() {
        let result = decode_reply(&frame(&["ERR:internal", "get"]));
        assert!(matches!(result, Err(ProtocolError::BadStatus(_))));
    }

    #[test]
    fn test_decode_unknown_tag_fails() {
        let result = decode_reply(&frame(&["success", "teleport"]));
        assert!(matches!(result, Err(ProtocolError::UnknownTag(_))));
    }

    #[test]
    fn test_decode_dangling_key_fails() {
        let result = decode_reply(&frame(&["success", "game", "game"]));
        assert!(matches!(result, Err(ProtocolError::DanglingKey(_))));
    }

    #[test]
    fn test_decode_garbage_argument_fails() {
        let result =
            decode_reply(&frame(&["success", "get", "get", "not json"]));
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_join_reply_without_game() {
        let reply = decode_reply(&frame(&["success", "join"])).unwrap();
        assert_eq!(reply.reply, Reply::Join { game: None });
    }

    // -- events --

    #[test]
    fn test_decode_deal_event() {
        let event = decode_event(&frame(&[
            "g1:deal",
            "opener",
            "\"north\"",
            "vulnerability",
            r#"{"northSouth": false, "eastWest": true}"#,
            "counter",
            "1",
        ]))
        .unwrap();
        assert_eq!(event.game, GameId("g1".into()));
        let Event::Deal {
            opener,
            vulnerability,
            counter,
        } = event.event
        else {
            panic!("wrong event variant");
        };
        assert_eq!(opener, Seat::North);
        assert!(vulnerability.east_west);
        assert_eq!(counter, Some(1));
    }

    #[test]
    fn test_decode_call_event() {
        let event = decode_event(&frame(&[
            "g1:call",
            "position",
            "\"east\"",
            "call",
            r#"{"type": "bid", "bid": {"level": 1, "strain": "notrump"}}"#,
            "counter",
            "3",
        ]))
        .unwrap();
        let Event::Call { position, call, .. } = event.event else {
            panic!("wrong event variant");
        };
        assert_eq!(position, Seat::East);
        assert_eq!(
            call,
            Call::Bid {
                bid: Bid {
                    level: 1,
                    strain: Strain::NoTrump
                }
            }
        );
    }

    #[test]
    fn test_decode_player_event_has_no_counter() {
        let event = decode_event(&frame(&[
            "g1:player",
            "player",
            "\"p2\"",
            "position",
            "\"south\"",
        ]))
        .unwrap();
        assert_eq!(event.event.counter(), None);
        assert_eq!(event.event.tag(), "player");
    }

    #[test]
    fn test_decode_event_missing_required_field_fails() {
        let result = decode_event(&frame(&["g1:turn", "counter", "2"]));
        assert!(matches!(
            result,
            Err(ProtocolError::MissingField("position"))
        ));
    }

    #[test]
    fn test_decode_event_bad_topic_fails() {
        let result = decode_event(&frame(&["no-separator"]));
        assert!(matches!(result, Err(ProtocolError::BadTopic(_))));
    }

    #[test]
    fn test_decode_event_null_counter_treated_as_absent() {
        let event = decode_event(&frame(&[
            "g1:turn",
            "position",
            "\"north\"",
            "counter",
            "null",
        ]))
        .unwrap();
        assert_eq!(event.event.counter(), None);
    }
}

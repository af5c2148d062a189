//! End-to-end pipeline tests.
//!
//! A synthetic 8-player 4v4 replay is written out as section files and run
//! through [`ReplayParser`] with a [`DirectoryExtractor`], covering the
//! assembled summary, the progress event order and the failure paths.

mod common;

use std::fs;
use std::path::{Path, PathBuf};

use sc2_replay_parser::config::ParserConfig;
use sc2_replay_parser::error::ParserError;
use sc2_replay_parser::events::GameEventKind;
use sc2_replay_parser::format::{GameSpeed, GameVersion};
use sc2_replay_parser::pipeline::{DirectoryExtractor, PipelineEvent, ReplayParser};
use sc2_replay_parser::replay::Outcome;
use sc2_replay_parser::sections::{ChatChannel, MESSAGES_SECTION};
use tempfile::TempDir;

use common::{four_vs_four, Fixture, FIXTURE_GAME_EVENTS, FIXTURE_MESSAGES};

struct Setup {
    source: TempDir,
    work_root: TempDir,
    replay: PathBuf,
}

impl Setup {
    fn new(fixture: &Fixture) -> Self {
        let source = tempfile::tempdir().unwrap();
        let work_root = tempfile::tempdir().unwrap();
        fixture.write_to(source.path());
        let replay = source.path().join("game.SC2Replay");
        fs::write(&replay, b"archive").unwrap();
        Self {
            source,
            work_root,
            replay,
        }
    }

    fn config(&self) -> ParserConfig {
        ParserConfig {
            work_root: Some(self.work_root.path().to_path_buf()),
            ..ParserConfig::default()
        }
    }

    fn parser(&self, config: ParserConfig) -> ReplayParser<DirectoryExtractor> {
        ReplayParser::new(config, DirectoryExtractor::new(self.source.path())).unwrap()
    }

    fn work_root_is_empty(&self) -> bool {
        fs::read_dir(self.work_root.path()).unwrap().next().is_none()
    }
}

fn collect_events(
    parser: &ReplayParser<DirectoryExtractor>,
    replay: &Path,
) -> (Result<sc2_replay_parser::Replay, ParserError>, Vec<PipelineEvent>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let result = parser.parse_with_events(replay, &tx);
    drop(tx);
    (result, rx.iter().collect())
}

fn position(events: &[PipelineEvent], pred: impl Fn(&PipelineEvent) -> bool) -> usize {
    events
        .iter()
        .position(pred)
        .unwrap_or_else(|| panic!("event not found in {events:?}"))
}

// ============================================================================
// Summary
// ============================================================================

#[test]
fn test_full_parse_summary() {
    let setup = Setup::new(&four_vs_four());
    let replay = setup.parser(setup.config()).parse(&setup.replay).unwrap();

    let info = &replay.info;
    assert_eq!(info.version, GameVersion::new(1, 4, 1, 19776));
    assert_eq!(info.game_length, 14419);
    assert_eq!(info.speed, Some(GameSpeed::Faster));
    assert_eq!(info.game_length_seconds, 653);
    assert_eq!(info.format.as_deref(), Some("4v4"));
    assert_eq!(info.game_type.as_deref(), Some("AutoMM"));
    assert_eq!(info.region.as_deref(), Some("US"));
    assert_eq!(info.date.unix, 1_318_302_653);
    assert_eq!(info.date.timezone_offset, -14_400);
    assert_eq!(info.num_players, 8);
    assert_eq!(info.teams, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]]);

    assert_eq!(replay.map.name.as_deref(), Some("Megaton"));
    assert_eq!(replay.map.minimap.as_deref(), Some("Minimap.tga"));
    assert_eq!(replay.map.files.len(), 1);
    assert_eq!(replay.map.files[0].filename, "deadbeef");
}

#[test]
fn test_full_parse_players() {
    let setup = Setup::new(&four_vs_four());
    let replay = setup.parser(setup.config()).parse(&setup.replay).unwrap();

    assert_eq!(replay.players.len(), 8);
    let slots: Vec<u8> = replay.players.iter().map(|p| p.slot).collect();
    assert_eq!(slots, (0..8).collect::<Vec<u8>>());

    let first = replay.player(0).unwrap();
    assert_eq!(first.name.as_deref(), Some("Alpha"));
    assert_eq!(first.bnet_id, Some(1000));
    assert_eq!(first.race.as_deref(), Some("Terran"));
    assert_eq!(first.color.name.as_deref(), Some("Red"));
    assert_eq!(first.color.argb, Some(0xFFB4_141E));
    assert_eq!(first.player_type.as_deref(), Some("Human"));
    assert_eq!(first.handicap, Some(100));

    assert_eq!(replay.player(3).unwrap().race.as_deref(), Some("Random"));
    assert_eq!(replay.player(6).unwrap().color.name.as_deref(), Some("Green"));

    // The winner in details carries the whole team
    for player in &replay.players {
        let expected = if player.slot < 4 {
            Outcome::Win
        } else {
            Outcome::Loss
        };
        assert_eq!(player.outcome, expected, "slot {}", player.slot);
        assert_eq!(player.team, Some(u8::from(player.slot >= 4)));
    }
}

#[test]
fn test_full_parse_messages_and_recorder() {
    let setup = Setup::new(&four_vs_four());
    let replay = setup.parser(setup.config()).parse(&setup.replay).unwrap();

    assert_eq!(replay.info.recorded_by, Some(2));
    assert_eq!(replay.recorder().unwrap().name.as_deref(), Some("Charlie"));

    assert_eq!(replay.messages.len(), 2);
    let first = &replay.messages[0];
    assert_eq!(first.player, Some(0));
    assert_eq!(first.channel, ChatChannel::All);
    assert_eq!(first.frame, 10);
    assert_eq!(first.text, "gl hf");

    let second = &replay.messages[1];
    assert_eq!(second.player, Some(4));
    assert_eq!(second.channel, ChatChannel::Allies);
    assert_eq!(second.frame, 53);
}

#[test]
fn test_full_parse_game_events() {
    let setup = Setup::new(&four_vs_four());
    let replay = setup.parser(setup.config()).parse(&setup.replay).unwrap();

    assert_eq!(replay.events.len(), FIXTURE_GAME_EVENTS);
    let joins = replay
        .events
        .iter()
        .filter(|e| e.kind == GameEventKind::Join)
        .count();
    assert_eq!(joins, 8);
    assert!(replay
        .events
        .iter()
        .any(|e| e.kind == GameEventKind::Ability { ability_code: 0x02_0F00 }));
    assert!(replay.events.iter().any(|e| matches!(
        e.kind,
        GameEventKind::ResourceRequest {
            minerals: 0x92,
            gas: 0
        }
    )));

    let last = replay.events.last().unwrap();
    assert_eq!(last.kind, GameEventKind::Leave);
    assert_eq!(last.player_id(), 8);
    assert_eq!(last.frame(), 59);
}

#[test]
fn test_summary_serializes_to_json() {
    let setup = Setup::new(&four_vs_four());
    let replay = setup.parser(setup.config()).parse(&setup.replay).unwrap();

    let json = serde_json::to_value(&replay).unwrap();
    assert_eq!(json["info"]["game_length_seconds"], 653);
    assert_eq!(json["players"].as_array().unwrap().len(), 8);
    assert_eq!(json["messages"][0]["text"], "gl hf");
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_small_chunks_give_same_result() {
    let setup = Setup::new(&four_vs_four());
    let baseline = setup.parser(setup.config()).parse(&setup.replay).unwrap();

    for chunk_size in [1, 3, 7] {
        let config = ParserConfig {
            chunk_size,
            ..setup.config()
        };
        let replay = setup.parser(config).parse(&setup.replay).unwrap();
        assert_eq!(replay.events, baseline.events, "chunk size {chunk_size}");
        assert_eq!(replay.messages, baseline.messages, "chunk size {chunk_size}");
        assert_eq!(replay.info.recorded_by, baseline.info.recorded_by);
    }
}

#[test]
fn test_game_events_not_kept() {
    let setup = Setup::new(&four_vs_four());
    let config = ParserConfig {
        keep_game_events: false,
        ..setup.config()
    };
    let parser = setup.parser(config);
    let (result, events) = collect_events(&parser, &setup.replay);

    let replay = result.unwrap();
    assert!(replay.events.is_empty());

    // Batches are still reported to listeners
    let streamed: usize = events
        .iter()
        .map(|e| match e {
            PipelineEvent::GameEvents(batch) => batch.len(),
            _ => 0,
        })
        .sum();
    assert_eq!(streamed, FIXTURE_GAME_EVENTS);
}

#[test]
fn test_delete_input() {
    let setup = Setup::new(&four_vs_four());
    let config = ParserConfig {
        delete_input: true,
        ..setup.config()
    };
    setup.parser(config).parse(&setup.replay).unwrap();
    assert!(!setup.replay.exists());
}

#[test]
fn test_input_kept_by_default() {
    let setup = Setup::new(&four_vs_four());
    setup.parser(setup.config()).parse(&setup.replay).unwrap();
    assert!(setup.replay.exists());
    assert!(setup.work_root_is_empty());
}

// ============================================================================
// Progress events
// ============================================================================

#[test]
fn test_event_order() {
    let setup = Setup::new(&four_vs_four());
    let parser = setup.parser(ParserConfig {
        chunk_size: 5,
        ..setup.config()
    });
    let (result, events) = collect_events(&parser, &setup.replay);
    result.unwrap();

    assert!(matches!(events[0], PipelineEvent::Header(_)));
    assert!(matches!(events.last(), Some(PipelineEvent::Done)));
    assert!(!events.iter().any(|e| matches!(e, PipelineEvent::Error { .. })));

    let details = position(&events, |e| matches!(e, PipelineEvent::Details(_)));
    let attributes = position(&events, |e| matches!(e, PipelineEvent::Attributes(_)));
    let partial = position(&events, |e| matches!(e, PipelineEvent::Partial(_)));
    let first_messages = position(&events, |e| matches!(e, PipelineEvent::Messages(_)));
    let first_events = position(&events, |e| matches!(e, PipelineEvent::GameEvents(_)));
    let messages_done = position(&events, |e| matches!(e, PipelineEvent::MessagesDone));
    let events_done = position(&events, |e| matches!(e, PipelineEvent::GameEventsDone));

    assert!(details < partial && attributes < partial);
    assert!(partial < first_messages && partial < first_events);
    assert!(first_messages < messages_done);
    assert!(first_events < events_done);

    let messages: usize = events
        .iter()
        .map(|e| match e {
            PipelineEvent::Messages(batch) => batch.len(),
            _ => 0,
        })
        .sum();
    assert_eq!(messages, FIXTURE_MESSAGES);

    let partial_replay = match &events[partial] {
        PipelineEvent::Partial(replay) => replay,
        _ => unreachable!(),
    };
    assert_eq!(partial_replay.players.len(), 8);
    assert!(partial_replay.messages.is_empty());
    assert_eq!(partial_replay.info.recorded_by, None);
}

// ============================================================================
// Failures
// ============================================================================

fn assert_single_error_last(events: &[PipelineEvent]) {
    let errors = events
        .iter()
        .filter(|e| matches!(e, PipelineEvent::Error { .. }))
        .count();
    assert_eq!(errors, 1, "events: {events:?}");
    assert!(matches!(events.last(), Some(PipelineEvent::Error { .. })));
    assert!(!events.iter().any(|e| matches!(e, PipelineEvent::Done)));
}

#[test]
fn test_missing_section_file() {
    let setup = Setup::new(&four_vs_four());
    fs::remove_file(setup.source.path().join(MESSAGES_SECTION)).unwrap();

    let parser = setup.parser(setup.config());
    let (result, events) = collect_events(&parser, &setup.replay);

    match result {
        Err(ParserError::ExtractionFailed { reason }) => {
            assert!(reason.contains(MESSAGES_SECTION));
        }
        other => panic!("Expected ExtractionFailed, got {other:?}"),
    }
    assert_eq!(events.len(), 1);
    assert_single_error_last(&events);
    assert!(setup.work_root_is_empty());
}

#[test]
fn test_corrupt_header() {
    let mut fixture = four_vs_four();
    fixture.header = vec![0x09, 0x02];
    let setup = Setup::new(&fixture);

    let parser = setup.parser(setup.config());
    let (result, events) = collect_events(&parser, &setup.replay);

    assert!(matches!(result, Err(ParserError::TypeMismatch { .. })));
    assert_eq!(events.len(), 1);
    assert_single_error_last(&events);
}

#[test]
fn test_truncated_header() {
    let mut fixture = four_vs_four();
    fixture.header.pop();
    let setup = Setup::new(&fixture);

    let parser = setup.parser(setup.config());
    let (result, events) = collect_events(&parser, &setup.replay);

    let err = result.unwrap_err();
    assert!(!err.is_insufficient_data(), "got {err:?}");
    match &err {
        ParserError::MalformedLength { field, .. } => assert_eq!(field, "header"),
        other => panic!("Expected MalformedLength, got {other:?}"),
    }
    assert_eq!(events.len(), 1);
    assert_single_error_last(&events);
    match &events[0] {
        PipelineEvent::Error { message } => assert!(!message.contains("Not enough data")),
        other => panic!("Expected Error event, got {other:?}"),
    }
    assert!(setup.work_root_is_empty());
}

#[test]
fn test_truncated_details() {
    let mut fixture = four_vs_four();
    let keep = fixture.details.len() - 3;
    fixture.details.truncate(keep);
    let setup = Setup::new(&fixture);

    let parser = setup.parser(setup.config());
    let (result, events) = collect_events(&parser, &setup.replay);

    let err = result.unwrap_err();
    assert!(!err.is_insufficient_data(), "got {err:?}");
    assert_single_error_last(&events);
    assert!(setup.work_root_is_empty());
}

#[test]
fn test_unrecognized_opcode_stops_the_run() {
    let mut fixture = four_vs_four();
    // type 5, code 0x01 has no table entry
    fixture.game_events.extend(common::game_event(1, 1, 5, 0x01, &[]));
    let setup = Setup::new(&fixture);

    let parser = setup.parser(setup.config());
    let (result, events) = collect_events(&parser, &setup.replay);

    assert!(matches!(
        result,
        Err(ParserError::UnrecognizedOpcode { .. })
    ));
    assert_single_error_last(&events);
    assert!(events.iter().any(|e| matches!(e, PipelineEvent::Partial(_))));
    assert!(setup.work_root_is_empty());
}

#[test]
fn test_truncated_messages() {
    let mut fixture = four_vs_four();
    fixture.messages.extend([0x04, 0x01]);
    let setup = Setup::new(&fixture);

    let parser = setup.parser(setup.config());
    let (result, events) = collect_events(&parser, &setup.replay);

    match result {
        Err(ParserError::LeftoverData { section, bytes, .. }) => {
            assert_eq!(section, MESSAGES_SECTION);
            assert_eq!(bytes, 2);
        }
        other => panic!("Expected LeftoverData, got {other:?}"),
    }
    assert_single_error_last(&events);
}

#[test]
fn test_parse_without_listener_reports_error() {
    let mut fixture = four_vs_four();
    fixture.attributes = vec![0, 0, 0, 0, 0, 1, 0, 0, 0, 0xAA];
    let setup = Setup::new(&fixture);

    let result = setup.parser(setup.config()).parse(&setup.replay);
    assert!(result.is_err());
    assert!(setup.work_root_is_empty());
}

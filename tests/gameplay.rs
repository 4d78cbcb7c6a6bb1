//! End-to-end scenarios driven through the public API

use glam::Vec2;

use clown_suika::consts::{PLAYER_NAME_KEY, SIM_DT, TUNING_KEY};
use clown_suika::leaderboard::{Leaderboard, LeaderboardEntry, LeaderboardPanel, MemoryLeaderboard};
use clown_suika::persistence::MemoryStore;
use clown_suika::sim::{ArcadeWorld, GameEvent, GamePhase, GameSession, TickInput, tick};
use clown_suika::{TIERS, Tuning};

fn session_with_gravity(gravity: f32) -> GameSession<ArcadeWorld> {
    let tuning = Tuning::default();
    let physics = ArcadeWorld::new(tuning.play_area, gravity);
    GameSession::new(physics, Box::new(MemoryStore::new()), tuning, 7)
}

fn drop_at(x: f32) -> TickInput {
    TickInput {
        aim_x: Some(x),
        drop: true,
    }
}

#[test]
fn two_smallest_clowns_merge_on_contact() {
    let mut s = session_with_gravity(Tuning::default().gravity);
    s.start("Ann").unwrap();

    s.begin_aim(0).unwrap();
    tick(&mut s, &drop_at(100.0), SIM_DT);
    assert_eq!(s.bodies().len(), 1);

    let mut waited = 0;
    while s.preview().is_none() {
        tick(&mut s, &TickInput::default(), SIM_DT);
        waited += 1;
        assert!(waited <= 40, "preview never came back");
    }

    s.begin_aim(0).unwrap();
    tick(&mut s, &drop_at(105.0), SIM_DT);
    assert_eq!(s.bodies().len(), 2);

    let mut merged = None;
    for _ in 0..600 {
        tick(&mut s, &TickInput::default(), SIM_DT);
        merged = s.drain_events().into_iter().find_map(|e| match e {
            GameEvent::Merged { tier, points, .. } => Some((tier, points)),
            _ => None,
        });
        if merged.is_some() {
            break;
        }
    }

    assert_eq!(merged, Some((1, TIERS[1].score_value)));
    assert_eq!(s.score(), TIERS[1].score_value);
    assert_eq!(s.best_score(), TIERS[1].score_value);
    assert_eq!(s.bodies().len(), 1);
    assert_eq!(s.bodies().count_tier(1), 1);
    assert_eq!(s.phase(), GamePhase::Playing);
}

#[test]
fn stagnant_clown_above_danger_line_ends_game() {
    let mut s = session_with_gravity(0.0);
    s.start("Ann").unwrap();
    s.insert_body(3, Vec2::new(200.0, 80.0), Vec2::ZERO).unwrap();

    for _ in 0..120 {
        tick(&mut s, &TickInput::default(), SIM_DT);
    }
    assert_eq!(s.phase(), GamePhase::Playing);

    tick(&mut s, &TickInput::default(), SIM_DT);
    assert!(s.is_game_over());
    assert!(s.preview().is_none());
    // Bodies stay on the board until restart
    assert_eq!(s.bodies().len(), 1);

    let overs = s
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::GameOver { score: 0 }))
        .count();
    assert_eq!(overs, 1);

    assert!(s.restart());
    assert!(s.bodies().is_empty());
    assert_eq!(s.score(), 0);
}

#[test]
fn finished_game_is_ranked_on_leaderboard() {
    let mut s = session_with_gravity(0.0);
    s.start("Ann").unwrap();
    s.insert_body(3, Vec2::new(200.0, 80.0), Vec2::ZERO).unwrap();
    while !s.is_game_over() {
        tick(&mut s, &TickInput::default(), SIM_DT);
    }

    let (player, score) = s.final_result().unwrap();
    assert_eq!(player.as_str(), "Ann");

    let board = Leaderboard::new(MemoryLeaderboard::with_entries([("Bob", 100), ("Cid", 40)]));
    let result = pollster::block_on(board.submit(player, score)).unwrap();
    // Zero sorts last
    assert_eq!(result.rank, Some(3));
    assert_eq!(result.total, 3);

    let result = pollster::block_on(board.submit(player, 50)).unwrap();
    assert_eq!(result.rank, Some(2));
    assert_eq!(result.total, 4);
    assert_eq!(result.top_entries[1].name, "Ann");
}

#[test]
fn oversized_spawn_cap_never_yields_unknown_tier() {
    let store = MemoryStore::new().with(TUNING_KEY, r#"{"max_spawn_tier": 40}"#);
    let tuning = Tuning::load(&store);

    for seed in 0..50 {
        let physics = ArcadeWorld::new(tuning.play_area, tuning.gravity);
        let mut s = GameSession::new(physics, Box::new(store.clone()), tuning.clone(), seed);
        assert!(s.next_tier() < TIERS.len());

        s.start("Ann").unwrap();
        tick(&mut s, &drop_at(200.0), SIM_DT);
        assert!(s.next_tier() < TIERS.len());
        for event in s.drain_events() {
            if let GameEvent::NextTier { tier } | GameEvent::PreviewSpawned { tier } = event {
                assert!(tier < TIERS.len());
            }
        }
    }
}

#[test]
fn remembered_player_is_highlighted_before_starting() {
    let tuning = Tuning::default();
    let physics = ArcadeWorld::new(tuning.play_area, tuning.gravity);
    let store = MemoryStore::new().with(PLAYER_NAME_KEY, "Ann");
    let s = GameSession::new(physics, Box::new(store), tuning, 7);
    assert_eq!(s.phase(), GamePhase::AwaitingName);

    let mut panel = LeaderboardPanel::new();
    let entry = |name: &str, score| LeaderboardEntry {
        name: name.to_string(),
        score,
        submitted_at: None,
    };
    panel.apply(Ok(vec![entry("Bob", 100), entry("Ann", 50)]));

    let remembered = s.remembered_name().map(|p| p.to_string());
    let flagged: Vec<_> = panel
        .rows(remembered.as_deref())
        .iter()
        .map(|r| r.highlight)
        .collect();
    assert_eq!(flagged, vec![false, true]);
}

mod support;

use arena_server::game::entity::Entity;
use arena_server::game::{BossConfig, BossController, StepOutcome, Team, TeamTally};
use arena_server::mirror::Replica;
use arena_server::ws::{Action, Key, Message};
use tokio_test::assert_ok;

#[test]
fn mirror_tracks_the_authoritative_table() {
    let (mut game, clock, mut rx) = support::manual_game(5);
    let mut replica = Replica::new(*game.tuning()).with_clock(clock.clone());

    let id = assert_ok!(game.join(false));
    game.on_message(id, &Message::keydown(Key::ArrowUp));
    game.on_message(id, &Message::keydown(Key::ArrowLeft));

    for text in support::encode_all(&support::drain(&mut rx)) {
        assert_ok!(replica.on_text(&text));
    }

    clock.advance(250);
    assert_ok!(game.step());
    assert_ok!(replica.step());

    let server = game.get(id).map(Entity::body).cloned();
    let mirrored = replica.get(id).map(Entity::body).cloned();
    assert_eq!(server, mirrored);
    assert_eq!(replica.len(), game.len());
}

#[test]
fn late_joiner_sees_everyone_before_deltas() {
    let (mut game, _clock, mut rx) = support::manual_game(9);
    let first = assert_ok!(game.join(false));
    let boss = assert_ok!(game.join(true));
    support::drain(&mut rx);

    let late = assert_ok!(game.join(false));
    game.on_message(first, &Message::keydown(Key::ArrowDown));

    let messages = support::drain(&mut rx);
    assert_eq!(messages[0].action, Action::Join);
    let snapshot: Vec<_> = messages[1..4]
        .iter()
        .filter_map(|m| m.object.as_entity().map(Entity::id))
        .collect();
    assert_eq!(snapshot, vec![first, boss, late]);
    assert_eq!(messages.len(), 5);
}

#[test]
fn players_score_for_the_other_team_when_leaving() {
    let (mut game, _clock, _rx) = support::manual_game(1);
    let red = assert_ok!(game.join(false));
    let blue = assert_ok!(game.join(false));
    assert_eq!(game.get(red).and_then(Entity::team), Some(Team::Red));
    assert_eq!(game.get(blue).and_then(Entity::team), Some(Team::Blue));

    game.quit(red);
    game.quit(blue);
    assert_eq!(game.scores(), TeamTally { blue: 1, red: 1 });
    assert_eq!(game.populations(), TeamTally::default());
    assert!(game.is_empty());
}

#[test]
fn boss_hunts_and_fires_through_the_input_surface() {
    let (mut game, clock, mut rx) = support::manual_game(2);
    assert_eq!(assert_ok!(game.step()), StepOutcome::NeedsBoss);

    let mut boss = assert_ok!(BossController::spawn(&mut game, BossConfig::default()));
    let player = assert_ok!(game.join(false));
    support::drain(&mut rx);

    let mut fired = false;
    for _ in 0..300 {
        clock.advance(10);
        assert_ok!(boss.tick(&mut game));
        assert_ok!(game.step());
        fired |= game.projectiles().count() > 0;
    }

    assert_eq!(boss.target(), Some(player));
    assert!(fired, "boss should have fired at least one burst");
    let sets = support::drain(&mut rx)
        .into_iter()
        .filter(|m| m.action == Action::Set)
        .count();
    assert!(sets > 0);
}

//! Basic demonstration of the arena survival simulation.
//!
//! Run with: cargo run --example basic_demo
//! Set RUST_LOG=info (or debug) to see session events.

use arena_sim::{MemoryRecordStore, SimConfig, SimNotification, SimWorld};
use std::cell::RefCell;
use std::rc::Rc;

fn main() {
    env_logger::init();
    println!("=== Arena Survival - Simulation Demo ===\n");

    let config = SimConfig {
        seed: 2024,
        ..SimConfig::default()
    };
    let mut sim = SimWorld::with_config(config);

    let events: Rc<RefCell<Vec<SimNotification>>> = Rc::default();
    let sink = Rc::clone(&events);
    sim.add_listener(move |note| sink.borrow_mut().push(note.clone()));

    // Circle the arena for three minutes of game time at 60 frames per second,
    // always taking the first upgrade offered.
    for frame in 0..(60 * 180) {
        let angle = frame as f32 / 240.0;
        sim.set_player_input(angle.cos(), angle.sin());
        sim.step(1.0 / 60.0);

        if let Some(&first) = sim.pending_offer().first() {
            println!("  offer {:?} -> taking {}", sim.pending_offer(), first.name());
            sim.choose_upgrade(first);
        }

        for note in events.borrow_mut().drain(..) {
            match note {
                SimNotification::LevelUp { level } => println!("Level up! now level {}", level),
                SimNotification::GameOver {
                    survival_time,
                    level,
                } => println!("Game over at level {} after {:.1}s", level, survival_time),
            }
        }

        if (frame + 1) % 600 == 0 {
            print_snapshot(&mut sim);
        }
        if sim.is_game_over() {
            break;
        }
    }

    let mut store = MemoryRecordStore::new();
    match sim.end_session(&mut store) {
        Ok(true) => println!("\nNew best: level {}, {:.1}s", sim.level(), sim.survival_time()),
        Ok(false) => println!("\nNo new record"),
        Err(err) => eprintln!("\nFailed to save record: {err}"),
    }

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("snapshot failed: {err}"),
    }
}

fn print_snapshot(sim: &mut SimWorld) {
    let snapshot = sim.snapshot();
    println!(
        "--- t={:.1}s tick={} difficulty={:.2} ---",
        snapshot.time, snapshot.tick, snapshot.difficulty
    );
    if let Some(player) = &snapshot.player {
        println!(
            "  player: pos=({:.1}, {:.1}) hp={:.0}/{:.0} level={} xp={:.1}/{:.1}",
            player.x, player.y, player.health, player.health_max, player.level, player.xp, player.xp_to_next
        );
    }
    println!(
        "  enemies={} projectiles={} orbs={} spells={:?}",
        snapshot.enemies.len(),
        snapshot.projectiles.len(),
        snapshot.orbs.len(),
        snapshot.spells.iter().map(|s| s.kind.name()).collect::<Vec<_>>()
    );
}

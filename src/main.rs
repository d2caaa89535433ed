//! Arena Champions headless runner
//!
//! Plays a bot-vs-bot match to completion and prints the result.
//!
//! Usage: `arena-champions [settings.json] [archetype] [archetype]`

#[cfg(not(target_arch = "wasm32"))]
use arena_champions::{
    MatchSettings,
    consts::{SIM_DT, TICK_MS},
    net::{MemoryTransport, NetSession, Packet, RoomSnapshot},
    sim::{GameEvent, MatchPhase, MatchState, TickInput, tick},
};

/// Give up on a match after this much simulated time
#[cfg(not(target_arch = "wasm32"))]
const MAX_MATCH_MS: u64 = 10 * 60 * 1000;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Arena Champions (headless) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = match args.first().filter(|a| a.ends_with(".json")) {
        Some(path) => match MatchSettings::load(std::path::Path::new(path)) {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("{}", err);
                std::process::exit(1);
            }
        },
        None => MatchSettings::default(),
    };
    let names: Vec<&str> = args
        .iter()
        .filter(|a| !a.ends_with(".json"))
        .map(String::as_str)
        .collect();
    let roster = [
        names.first().copied().unwrap_or("Vanguard"),
        names.get(1).copied().unwrap_or("Mage"),
    ];

    let mut state = match MatchState::from_names(settings, roster) {
        Ok(state) => state,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    };
    let ids: Vec<u32> = state.champions.iter().map(|c| c.id).collect();
    for &id in &ids {
        state.add_bot(id);
    }

    // Champion 1's client, fed its own room document as the authority
    let mut session = NetSession::new(
        "local",
        ids[0],
        state.settings.network.clone(),
        MemoryTransport::new(),
    );
    let inbox = session.inbox_handle();
    let input = TickInput::default();
    let mut damage_dealt = vec![0.0_f32; ids.len()];

    log::info!("Simulating at {} ms ticks ({:.3} s)", TICK_MS, SIM_DT);
    while !state.is_over() && state.now < MAX_MATCH_MS {
        tick(&mut state, &input, TICK_MS);
        // Echo the room as the server would, timed to land on a publish
        if session.is_due(state.now)
            && state.phase == MatchPhase::Active
            && let Err(err) = inbox.push(state.now, Packet::State(RoomSnapshot::capture(&state)))
        {
            log::warn!("{}", err);
        }
        session.sync(&mut state);

        for event in state.drain_events() {
            match event {
                GameEvent::Damage {
                    source: Some(source),
                    amount,
                    ..
                } => {
                    if let Some(i) = ids.iter().position(|&id| id == source) {
                        damage_dealt[i] += amount;
                    }
                }
                GameEvent::RoundEnded { round, winner } => match winner {
                    Some(id) => println!("Round {}: champion {} wins", round, id),
                    None => println!("Round {}: draw", round),
                },
                _ => {}
            }
        }
    }

    let MatchPhase::MatchOver { winner } = state.phase else {
        println!("No result after {} s", MAX_MATCH_MS / 1000);
        return;
    };
    for (champion, dealt) in state.champions.iter().zip(&damage_dealt) {
        println!(
            "{} (champion {}): {} rounds, {:.0} damage dealt",
            champion.archetype.as_str(),
            champion.id,
            state.scores.get(&champion.id).copied().unwrap_or(0),
            dealt
        );
    }
    match winner {
        Some(id) => println!(
            "Champion {} takes the match in {:.1} s",
            id,
            state.now as f32 / 1000.0
        ),
        None => println!("Match drawn"),
    }
    println!("{} state packets published", session.transport().sent.len());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No headless runner on the web
}

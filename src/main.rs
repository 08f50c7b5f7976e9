use jrpg_battle::{
    Battle, BattleEvent, BattleRunner, CombatantRef, ContentPack, Narrator, RandomAi, RunOutcome,
};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Prints each narrated event as it happens.
struct ConsoleNarrator;

impl Narrator for ConsoleNarrator {
    fn record(&mut self, event: BattleEvent) {
        if let Some(text) = event.format() {
            println!("{}", text);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let data_path = Path::new("data");
    let pack = match ContentPack::load(data_path) {
        Ok(pack) => pack,
        Err(e) => {
            println!("Error loading content from {}: {}", data_path.display(), e);
            return;
        }
    };

    // Heroes against a goblin raiding party, all AI-driven.
    let roster: [&[(u32, u32)]; 2] = [&[(1, 5), (2, 5)], &[(3, 4), (3, 3), (4, 4), (5, 4)]];
    let mut teams: Vec<Vec<CombatantRef>> = Vec::new();
    for members in roster {
        let mut team = Vec::new();
        for &(template_id, level) in members {
            match pack.create(template_id, level, RandomAi::shared()) {
                Ok(combatant) => team.push(combatant),
                Err(e) => {
                    println!("Error creating combatant {}: {}", template_id, e);
                    return;
                }
            }
        }
        teams.push(team);
    }

    for (index, team) in teams.iter().enumerate() {
        let members: Vec<String> = team
            .iter()
            .map(|c| format!("{} Lv{} ({}/{} HP)", c.name(), c.level(), c.hp(), c.max_hp()))
            .collect();
        println!("Team {}: {}", index, members.join(", "));
    }
    println!();

    let battle = match Battle::new(teams, pack.config.clone()) {
        Ok(battle) => battle,
        Err(e) => {
            println!("Error setting up battle: {}", e);
            return;
        }
    };

    let (ended_tx, ended_rx) = crossbeam_channel::bounded(1);
    let handle = match BattleRunner::new(battle)
        .with_narrator(ConsoleNarrator)
        .spawn_displayed_to(ended_tx)
    {
        Ok(handle) => handle,
        Err(e) => {
            println!("Error starting battle thread: {}", e);
            return;
        }
    };

    if let Ok(ended) = ended_rx.recv() {
        println!();
        println!("Battle over after {} turns.", ended.turns);
    }

    match handle.join() {
        Ok((RunOutcome::Completed, battle)) => {
            for survivor in battle.winning_team().unwrap_or_default() {
                println!(
                    "  {} survived with {}/{} HP",
                    survivor.name(),
                    survivor.hp(),
                    survivor.max_hp()
                );
            }
        }
        Ok((RunOutcome::Canceled, _)) => println!("Battle was canceled."),
        Err(_) => println!("Battle thread panicked."),
    }
}

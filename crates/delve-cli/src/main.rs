//! Delve terminal front end.
//!
//! All simulation happens in `delve-core`; this binary only reads input
//! lines, renders the board, and narrates turn events. EOF or a read error
//! anywhere is a graceful quit with the score flushed, never a crash.
//!
//! Usage:
//!   cargo run -p delve-cli
//!   cargo run -p delve-cli -- --seed 42

use std::io::{self, BufRead, Write};
use std::path::Path;

use delve_core::highscore;
use delve_core::session::{Session, TurnEvent, TurnOutcome};
use delve_logic::difficulty::Difficulty;
use delve_logic::grid::{Direction, Point};

const HIGH_SCORE_FILE: &str = "highscore.txt";

enum Input {
    Move(Direction),
    Quit,
}

fn main() {
    env_logger::init();
    let seed = seed_from_args().unwrap_or_else(rand::random);

    print_header();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    print!("Choose difficulty: 1) Easy  2) Normal  3) Hard  : ");
    flush();
    let difficulty = match next_line(&mut lines) {
        Some(line) => Difficulty::from_selection(line.trim().parse().unwrap_or(0)),
        None => return, // EOF before the run even started
    };

    let best = highscore::load(Path::new(HIGH_SCORE_FILE));
    let mut session = Session::new(difficulty, seed, best);
    let mut messages: Vec<String> = Vec::new();

    loop {
        render(&session, best, &messages);
        messages.clear();

        if session.game_over() {
            println!(
                "You died! Final score: {}   Turns: {}",
                session.player.score, session.player.turns
            );
            conclude(session.player.score, best);
            break;
        }

        print!("Enter move (w/a/s/d) or q to quit: ");
        flush();
        let Some(line) = next_line(&mut lines) else {
            // EOF mid-run: quit path without death messaging.
            conclude(session.player.score, best);
            break;
        };
        match parse_input(line.trim()) {
            None => {
                println!("Unknown input. Use w/a/s/d.");
            }
            Some(Input::Quit) => {
                println!("Quitting. Final score: {}", session.player.score);
                conclude(session.player.score, best);
                break;
            }
            Some(Input::Move(dir)) => match session.resolve_turn(dir) {
                TurnOutcome::OutOfBounds => {
                    messages.push("Cannot move out of bounds.".to_string());
                }
                TurnOutcome::Advanced(events) => {
                    messages.extend(events.iter().map(describe));
                }
            },
        }
    }

    println!("Thanks for playing!");
}

/// `--seed N` pins the RNG stream for a replayable run.
fn seed_from_args() -> Option<u64> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--seed" {
            return args.next().and_then(|v| v.parse().ok());
        }
    }
    None
}

fn next_line(lines: &mut impl Iterator<Item = io::Result<String>>) -> Option<String> {
    lines.next()?.ok()
}

fn flush() {
    let _ = io::stdout().flush();
}

fn parse_input(text: &str) -> Option<Input> {
    match text.chars().next()? {
        'w' | 'W' => Some(Input::Move(Direction::Up)),
        's' | 'S' => Some(Input::Move(Direction::Down)),
        'a' | 'A' => Some(Input::Move(Direction::Left)),
        'd' | 'D' => Some(Input::Move(Direction::Right)),
        'q' | 'Q' => Some(Input::Quit),
        _ => None,
    }
}

fn print_header() {
    println!("=== Delve ===");
    println!("Controls: w=up a=left s=down d=right    q=quit");
    println!("Objective: survive, kill enemies (score +10 per kill), pick potions '!' to heal.");
    println!("High score saved in {}\n", HIGH_SCORE_FILE);
}

fn render(session: &Session, best: u32, messages: &[String]) {
    print_header();
    let player = &session.player;
    println!(
        "Diff: {}    HP: {}/{}    Score: {}    Turns: {}    High: {}\n",
        session.difficulty.name(),
        player.hp,
        player.max_hp,
        player.score,
        player.turns,
        best
    );

    let mut rows: Vec<Vec<char>> = (0..session.grid.height())
        .map(|y| {
            (0..session.grid.width())
                .map(|x| {
                    if session.grid.is_floor(Point::new(x, y)) {
                        '.'
                    } else {
                        '#'
                    }
                })
                .collect()
        })
        .collect();
    // Overlay order: potions under monsters under the player.
    for cell in session.potion_cells() {
        rows[cell.y as usize][cell.x as usize] = '!';
    }
    for cell in session.monster_cells() {
        rows[cell.y as usize][cell.x as usize] = 'E';
    }
    rows[player.pos.y as usize][player.pos.x as usize] = '@';

    for row in rows {
        println!("{}", row.into_iter().collect::<String>());
    }
    println!();
    for message in messages {
        println!("{}", message);
    }
}

fn describe(event: &TurnEvent) -> String {
    match event {
        TurnEvent::BumpedWall => "Bumped into a wall.".to_string(),
        TurnEvent::HitMonster {
            damage,
            remaining_hp,
        } => format!(
            "You attack the enemy for {} damage! Enemy HP left: {}",
            damage, remaining_hp
        ),
        TurnEvent::SlewMonster { score_awarded } => {
            format!("Enemy defeated! +{} score.", score_awarded)
        }
        TurnEvent::DrankPotion { roll, healed } => format!(
            "Picked up a potion! Healed {} HP (+{} roll, capped).",
            healed, roll
        ),
        TurnEvent::TookHit { damage } => {
            format!("An enemy attacks you for {} damage!", damage)
        }
    }
}

/// Compare the finished run against the stored best and persist a win.
fn conclude(score: u32, best: u32) {
    let new_best = highscore::record(Path::new(HIGH_SCORE_FILE), score, best);
    if new_best > best {
        println!("New high score!");
    } else {
        println!("High score: {}", best);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_moves() {
        assert!(matches!(parse_input("w"), Some(Input::Move(Direction::Up))));
        assert!(matches!(parse_input("S"), Some(Input::Move(Direction::Down))));
        assert!(matches!(parse_input("a"), Some(Input::Move(Direction::Left))));
        assert!(matches!(parse_input("D"), Some(Input::Move(Direction::Right))));
        assert!(matches!(parse_input("q"), Some(Input::Quit)));
    }

    #[test]
    fn test_parse_rejects_noise() {
        assert!(parse_input("").is_none());
        assert!(parse_input("x").is_none());
        assert!(parse_input("help").is_none());
    }

    #[test]
    fn test_event_messages_read_naturally() {
        let text = describe(&TurnEvent::HitMonster {
            damage: 4,
            remaining_hp: 2,
        });
        assert!(text.contains("4 damage"));
        assert!(text.contains("HP left: 2"));
    }
}

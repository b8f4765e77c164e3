// Four Bars CLI entry point.
//
// Runs one or more refreshes of a four-bar phrase and writes each result to
// the session's MIDI folder. Between refreshes, bars listed in `--hold` are
// kept as they are and the rest are regenerated, the same way a front end
// would toggle bars off.
//
// Usage:
//   cargo run -p four_bars_music -- [--chords C,Am,F,G] [--scale NAME]
//     [--rhythm NAME] [--notes N] [--grid 8|16] [--threshold 0.0-1.0]
//     [--seed N] [--refresh N] [--hold 1,3] [--app-dir DIR] [--list]
//
// Chords are comma-separated; `-` leaves a bar without a chord.
// Console logging is controlled with RUST_LOG (default
// `four_bars_music=info`). Errors are also appended to `error.log` in the
// app directory regardless of RUST_LOG.

use four_bars_music::chord::chord_wheel;
use four_bars_music::{
    AppPaths, BarState, FourBars, GenerationRequest, GenerationSettings, Grid, Triad,
};
use four_bars_prng::Xoshiro;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let paths = match parse_flag::<String>(&args, "--app-dir") {
        Some(dir) => AppPaths::under(dir),
        None => AppPaths::user_default(),
    };
    init_logging(&paths);

    let mut session = match FourBars::init(paths) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start session: {e}");
            std::process::exit(1);
        }
    };

    if args.iter().any(|a| a == "--list") {
        print_lists(&session);
        return;
    }

    let grid = parse_flag::<usize>(&args, "--grid")
        .map(|size| {
            Grid::from_size(size).unwrap_or_else(|| {
                eprintln!("--grid must be 8 or 16");
                std::process::exit(1);
            })
        })
        .unwrap_or(Grid::Eighths);

    let defaults = GenerationSettings::for_grid(grid);
    let settings = GenerationSettings {
        scale_name: parse_flag(&args, "--scale")
            .or_else(|| session.scale_names().into_iter().next())
            .unwrap_or_default(),
        note_count: parse_flag(&args, "--notes").unwrap_or(defaults.note_count),
        grid,
        chord_tone_threshold: parse_flag(&args, "--threshold")
            .unwrap_or(defaults.chord_tone_threshold),
        rhythm_name: parse_flag(&args, "--rhythm")
            .or_else(|| session.rhythm_names().into_iter().next()),
    };

    let chord_list: String =
        parse_flag(&args, "--chords").unwrap_or_else(|| "C,Am,F,G".to_string());
    let chords = parse_chords(&chord_list);
    let refreshes: usize = parse_flag(&args, "--refresh").unwrap_or(1).max(1);
    let held = parse_holds(&args);

    let mut rng = match parse_flag::<u64>(&args, "--seed") {
        Some(seed) => Xoshiro::new(seed),
        None => Xoshiro::from_time(),
    };

    println!("=== Four Bars ===");
    println!("Scale: {}", settings.scale_name);
    println!(
        "Rhythm: {}",
        settings.rhythm_name.as_deref().unwrap_or("(none)")
    );
    println!(
        "Grid: {} steps, {} notes per bar, chord tones {:.0}%",
        grid.size(),
        settings.note_count,
        settings.chord_tone_threshold * 100.0
    );
    println!();

    let mut request = GenerationRequest {
        bars: chords.map(|chord| BarState::new(chord, &settings)),
        settings,
    };

    for pass in 1..=refreshes {
        let response = match session.refresh(&request, &mut rng) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Refresh {pass} failed: {e}");
                std::process::exit(1);
            }
        };

        println!("[{pass}/{refreshes}] {}", response.path.display());
        for (i, (bar, melody)) in request.bars.iter_mut().zip(response.bars).enumerate() {
            let chord = bar.chord.as_ref().map(Triad::name).unwrap_or("-");
            let marker = if bar.active { ' ' } else { '*' };
            println!("  {}{} {:<4} {}", i + 1, marker, chord, melody.summary());
            bar.melody = melody;
            bar.active = !held.contains(&(i + 1));
        }
        println!();
    }

    println!("Bars marked * were held from the previous pass.");
}

/// Console output filtered by RUST_LOG, plus every error appended to the
/// app directory's error log.
fn init_logging(paths: &AppPaths) {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("four_bars_music=info"));

    let error_log = match paths.open_error_log() {
        Ok(file) => Some(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(LevelFilter::ERROR),
        ),
        Err(e) => {
            eprintln!("Cannot open {}: {e}", paths.error_log.display());
            None
        }
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(console_filter))
        .with(error_log)
        .init();
}

fn print_lists(session: &FourBars) {
    println!("Scales:");
    for name in session.scale_names() {
        println!("  {name}");
    }
    println!("Rhythms:");
    for name in session.rhythm_names() {
        println!("  {name}");
    }
    let (majors, minors) = chord_wheel();
    println!("Chords (major): {}", majors.join(" "));
    println!("Chords (minor): {}", minors.join(" "));
}

/// Four chord slots from a comma-separated list. Missing slots and `-` are
/// bars without a chord; an unparseable name is fatal.
fn parse_chords(list: &str) -> [Option<Triad>; 4] {
    let names: Vec<&str> = list.split(',').map(str::trim).collect();
    std::array::from_fn(|i| match names.get(i) {
        None | Some(&"") | Some(&"-") => None,
        Some(name) => match Triad::build(name) {
            Ok(triad) => Some(triad),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
    })
}

/// 1-based bar numbers to hold after the first pass.
fn parse_holds(args: &[String]) -> Vec<usize> {
    parse_flag::<String>(args, "--hold")
        .map(|list| {
            list.split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

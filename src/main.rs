mod config;
mod external;
mod logging;
mod render;
mod sim;

use std::io::{self, BufWriter, Write};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, terminal,
};
use glam::DVec2;
use rand::RngExt;
use tracing::{info, warn};

use external::ExternalParams;
use render::{Canvas, ColorMode, RenderMode};
use sim::settings::requested_count;
use sim::{Settings, Simulation};

#[derive(Parser)]
#[command(name = "flowfield", about = "Particles drifting through an animated Perlin noise flow field")]
struct Cli {
    /// Render mode
    #[arg(short, long, value_enum)]
    render: Option<RenderMode>,

    /// Color mode
    #[arg(short, long, value_enum)]
    color: Option<ColorMode>,

    /// Target FPS (1-120)
    #[arg(short, long)]
    fps: Option<u32>,

    /// Flow field rows (1-50)
    #[arg(long)]
    rows: Option<usize>,

    /// Flow field columns (1-50)
    #[arg(long)]
    columns: Option<usize>,

    /// Noise octaves (1-10)
    #[arg(long)]
    octaves: Option<usize>,

    /// Noise falloff per octave (0-1)
    #[arg(long)]
    falloff: Option<f64>,

    /// Noise step between neighbouring cells (0-0.2)
    #[arg(long)]
    xy_increment: Option<f64>,

    /// Noise step per frame (0-0.05)
    #[arg(long)]
    z_increment: Option<f64>,

    /// Number of particles
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Noise seed (random if omitted)
    #[arg(long)]
    seed: Option<u32>,

    /// Draw the flow field direction lines
    #[arg(long)]
    show_field: bool,

    /// Start paused
    #[arg(long)]
    paused: bool,

    /// Hide the status bar
    #[arg(long)]
    clean: bool,

    /// Read live parameter updates (JSON lines) from a file, or "-" for stdin
    #[arg(long, value_name = "FILE")]
    params: Option<String>,

    /// Print the config file path and exit
    #[arg(long)]
    show_config: bool,

    /// Write a commented default config file and exit
    #[arg(long)]
    init_config: bool,

    /// Log filter (RUST_LOG overrides)
    #[arg(long)]
    log_level: Option<String>,
}

/// Display options resolved from CLI, config and defaults
struct DisplayOptions {
    render_mode: RenderMode,
    color_mode: ColorMode,
    color_quant: u8,
    hide_status: bool,
    frame_dur: Duration,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        match config::config_path() {
            Some(p) => println!("{}", p.display()),
            None => println!("No config directory available on this platform"),
        }
        return Ok(());
    }
    if cli.init_config {
        let path = config::init_config()?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let (config, config_problem) = match config::load_config() {
        Ok(c) => (c, None),
        Err(e) => (config::Config::default(), Some(e)),
    };
    let level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    let log_file = logging::init(&level);
    if let Some(problem) = config_problem {
        eprintln!("Warning: {}", problem);
        warn!("{}", problem);
    }
    if let Some(path) = &log_file {
        info!("logging to {}", path.display());
    }

    let settings = resolve_settings(&cli, &config);
    let display = DisplayOptions {
        render_mode: cli.render.or(config.render.map(Into::into)).unwrap_or(RenderMode::Braille),
        color_mode: cli.color.or(config.color.map(Into::into)).unwrap_or(ColorMode::TrueColor),
        color_quant: config.color_quant.unwrap_or(0),
        hide_status: cli.clean || config.clean.unwrap_or(false),
        frame_dur: Duration::from_secs_f64(1.0 / cli.fps.or(config.fps).unwrap_or(30).clamp(1, 120) as f64),
    };
    let params_rx = cli
        .params
        .as_deref()
        .map(|arg| external::spawn_reader(external::ParamsSource::from_arg(arg)));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide, EnableMouseCapture)?;

    let mut writer = BufWriter::with_capacity(256 * 1024, stdout);
    let result = run_loop(&mut writer, settings, display, params_rx.as_ref());

    execute!(writer, DisableMouseCapture, cursor::Show, terminal::LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    if let Err(e) = &result {
        warn!("exiting with error: {}", e);
    }
    result
}

/// Defaults, then config file, then CLI flags; clamped into range.
fn resolve_settings(cli: &Cli, config: &config::Config) -> Settings {
    let mut s = config.apply_to(Settings::default());
    if config.seed.is_none() {
        s.seed = rand::rng().random_range(0..u32::MAX);
    }
    macro_rules! flag {
        ($($field:ident),*) => {
            $(if let Some(v) = cli.$field {
                s.$field = v;
            })*
        };
    }
    flag!(rows, columns, octaves, falloff, xy_increment, z_increment, count, seed);
    s.count = requested_count(s.count);
    s.draw_field |= cli.show_field;
    s.animate = !cli.paused;
    s
}

const RENDER_MODES: [RenderMode; 3] = [RenderMode::Braille, RenderMode::HalfBlock, RenderMode::Ascii];
const COLOR_MODES: [ColorMode; 4] = [ColorMode::TrueColor, ColorMode::Ansi256, ColorMode::Ansi16, ColorMode::Mono];

fn next_of<T: Copy + PartialEq>(all: &[T], current: T) -> T {
    let idx = all.iter().position(|&m| m == current).unwrap_or(0);
    all[(idx + 1) % all.len()]
}

fn make_canvas(cols: u16, rows: u16, display: &DisplayOptions) -> Canvas {
    let rows = if display.hide_status { rows as usize } else { (rows as usize).saturating_sub(1) };
    let mut canvas = Canvas::new(cols as usize, rows, display.render_mode, display.color_mode);
    canvas.color_quant = display.color_quant;
    canvas
}

fn run_loop(
    stdout: &mut BufWriter<io::Stdout>,
    mut settings: Settings,
    mut display: DisplayOptions,
    params_rx: Option<&Receiver<ExternalParams>>,
) -> io::Result<()> {
    let (mut cols, mut rows) = terminal::size()?;
    let mut canvas = make_canvas(cols, rows, &display);
    settings.width = canvas.width as f64;
    settings.height = canvas.height as f64;
    let mut sim = Simulation::initialize(settings)?;

    let mut rebuild_canvas = false;
    let mut frame_count: u64 = 0;
    let mut actual_fps: f64 = 0.0;
    let mut fps_update = Instant::now();

    loop {
        let mut step_once = false;

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Resize(w, h) => {
                    if w >= 10 && h >= 5 {
                        cols = w;
                        rows = h;
                        rebuild_canvas = true;
                    }
                }
                Event::Mouse(MouseEvent {
                    kind: MouseEventKind::Drag(MouseButton::Left),
                    column,
                    row,
                    ..
                }) => {
                    let (x, y) = canvas.cell_to_pixel(column, row);
                    sim.spawn(DVec2::new(x, y));
                }
                Event::Key(KeyEvent {
                    code,
                    kind: KeyEventKind::Press,
                    ..
                }) => match code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        info!(particles = sim.particle_count(), "quit");
                        return Ok(());
                    }
                    KeyCode::Char('a') => {
                        sim.toggle_animate();
                    }
                    KeyCode::Char('f') => {
                        sim.toggle_field();
                    }
                    KeyCode::Char('d') => {
                        sim.toggle_diagnostics();
                    }
                    KeyCode::Char(' ') => step_once = true,
                    KeyCode::Char('h') => {
                        display.hide_status = !display.hide_status;
                        rebuild_canvas = true;
                    }
                    KeyCode::Char('r') => {
                        display.render_mode = next_of(&RENDER_MODES, display.render_mode);
                        rebuild_canvas = true;
                    }
                    KeyCode::Char('c') => {
                        display.color_mode = next_of(&COLOR_MODES, display.color_mode);
                        canvas.color_mode = display.color_mode;
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        if let Some(rx) = params_rx {
            let update = external::drain(rx);
            if !update.is_empty() {
                sim.apply(&update.settings_update());
                if let Some(name) = &update.render {
                    match RenderMode::from_str(name, true) {
                        Ok(mode) => {
                            display.render_mode = mode;
                            rebuild_canvas = true;
                        }
                        Err(_) => warn!("unknown render mode {:?}", name),
                    }
                }
                if let Some(name) = &update.color {
                    match ColorMode::from_str(name, true) {
                        Ok(mode) => {
                            display.color_mode = mode;
                            canvas.color_mode = mode;
                        }
                        Err(_) => warn!("unknown color mode {:?}", name),
                    }
                }
            }
        }

        if rebuild_canvas {
            let (settled_cols, settled_rows) = terminal::size()?;
            if settled_cols >= 10 && settled_rows >= 5 {
                cols = settled_cols;
                rows = settled_rows;
            }
            canvas = make_canvas(cols, rows, &display);
            sim.resize(canvas.width as f64, canvas.height as f64);
            write!(stdout, "\x1b[2J\x1b[H")?;
            stdout.flush()?;
            rebuild_canvas = false;
        }

        let frame_start = Instant::now();
        if sim.settings().animate || step_once {
            sim.step();
        }
        canvas.fade(sim.settings().fade);
        sim.render(&mut canvas);
        let frame = canvas.render();

        // Skip the frame if the terminal changed size under us
        let (check_cols, check_rows) = terminal::size()?;
        if check_cols != cols || check_rows != rows {
            cols = check_cols;
            rows = check_rows;
            rebuild_canvas = true;
            std::thread::sleep(Duration::from_millis(50));
            continue;
        }

        stdout.write_all(b"\x1b[H")?;
        stdout.write_all(frame.as_bytes())?;

        frame_count += 1;
        if fps_update.elapsed() >= Duration::from_secs(1) {
            actual_fps = frame_count as f64 / fps_update.elapsed().as_secs_f64();
            frame_count = 0;
            fps_update = Instant::now();
        }
        if !display.hide_status {
            let status = status_line(&sim, &display, actual_fps);
            let w = cols as usize;
            let truncated: String = status.chars().take(w).collect();
            write!(stdout, "\x1b[{};1H\x1b[7m{:<width$}\x1b[0m", rows, truncated, width = w)?;
        }
        stdout.flush()?;

        let elapsed = frame_start.elapsed();
        if elapsed < display.frame_dur {
            std::thread::sleep(display.frame_dur - elapsed);
        }
    }
}

fn status_line(sim: &Simulation, display: &DisplayOptions, fps: f64) -> String {
    let s = sim.settings();
    let state = if s.animate { "running" } else { "paused" };
    let keys = "[a] anim  [f] field  [d] diag  [space] step  [r] render  [c] color  [h] hide  [q] quit";
    if s.show_diagnostics {
        format!(
            " flowfield | {} | {:.0} fps | {} particles | {}x{} grid | {:?} | {:?} | {} ",
            state,
            fps,
            sim.particle_count(),
            s.columns,
            s.rows,
            display.render_mode,
            display.color_mode,
            keys,
        )
    } else {
        format!(" flowfield | {} | {} ", state, keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::parse_from(["flowfield", "--rows", "9", "--falloff", "0.2", "--seed", "5", "--paused"]);
        let config = config::parse_config("rows = 3\ncolumns = 4\nseed = 1").unwrap();
        let s = resolve_settings(&cli, &config);
        assert_eq!(s.rows, 9);
        assert_eq!(s.columns, 4);
        assert_eq!(s.falloff, 0.2);
        assert_eq!(s.seed, 5);
        assert!(!s.animate);
    }

    #[test]
    fn cli_count_is_capped_before_allocating() {
        let cli = Cli::parse_from(["flowfield", "-n", "200000"]);
        let mut s = resolve_settings(&cli, &config::Config::default());
        assert_eq!(s.count, sim::settings::MAX_COUNT);
        s.width = 80.0;
        s.height = 40.0;
        let simulation = Simulation::initialize(s).unwrap();
        assert_eq!(simulation.particle_count(), sim::settings::MAX_COUNT);
    }

    #[test]
    fn config_seed_is_kept_without_flag() {
        let cli = Cli::parse_from(["flowfield"]);
        let config = config::parse_config("seed = 77").unwrap();
        assert_eq!(resolve_settings(&cli, &config).seed, 77);
    }

    #[test]
    fn mode_cycling_wraps() {
        assert_eq!(next_of(&RENDER_MODES, RenderMode::Ascii), RenderMode::Braille);
        assert_eq!(next_of(&COLOR_MODES, ColorMode::TrueColor), ColorMode::Ansi256);
    }

    #[test]
    fn status_hides_counts_without_diagnostics() {
        let mut sim = Simulation::initialize(Settings {
            width: 100.0,
            height: 50.0,
            count: 12,
            ..Settings::default()
        })
        .unwrap();
        let display = DisplayOptions {
            render_mode: RenderMode::Braille,
            color_mode: ColorMode::Mono,
            color_quant: 0,
            hide_status: false,
            frame_dur: Duration::from_millis(33),
        };
        assert!(status_line(&sim, &display, 30.0).contains("12 particles"));
        sim.toggle_diagnostics();
        assert!(!status_line(&sim, &display, 30.0).contains("particles"));
    }
}

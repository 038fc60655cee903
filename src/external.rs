//! Live parameter updates from outside the frame loop.
//!
//! Each update is one JSON object per line, read from stdin or from the last
//! non-empty line of a watched file. Every key is optional; unknown keys are ignored.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, warn};

use crate::sim::SettingsUpdate;

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct ExternalParams {
    pub rows: Option<usize>,
    pub columns: Option<usize>,
    pub octaves: Option<usize>,
    pub falloff: Option<f64>,
    pub xy_increment: Option<f64>,
    pub z_increment: Option<f64>,
    pub count: Option<usize>,
    pub fade: Option<f64>,
    pub animate: Option<bool>,
    pub draw_field: Option<bool>,
    pub show_diagnostics: Option<bool>,
    pub render: Option<String>,
    pub color: Option<String>,
}

impl ExternalParams {
    /// Fold a newer update into this one; keys present in `newer` win.
    pub fn merge(&mut self, newer: ExternalParams) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if newer.$field.is_some() {
                    self.$field = newer.$field;
                })*
            };
        }
        take!(
            rows,
            columns,
            octaves,
            falloff,
            xy_increment,
            z_increment,
            count,
            fade,
            animate,
            draw_field,
            show_diagnostics,
            render,
            color
        );
    }

    /// The simulation half of this update; render and color are display-only.
    pub fn settings_update(&self) -> SettingsUpdate {
        SettingsUpdate {
            rows: self.rows,
            columns: self.columns,
            octaves: self.octaves,
            falloff: self.falloff,
            xy_increment: self.xy_increment,
            z_increment: self.z_increment,
            count: self.count,
            fade: self.fade,
            animate: self.animate,
            draw_field: self.draw_field,
            show_diagnostics: self.show_diagnostics,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ExternalParams::default()
    }

    pub fn parse(line: &str) -> Option<ExternalParams> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str(line) {
            Ok(params) => Some(params),
            Err(e) => {
                warn!("skipping malformed parameter line: {}", e);
                None
            }
        }
    }
}

/// Drain everything queued since the last frame into one update.
pub fn drain(rx: &Receiver<ExternalParams>) -> ExternalParams {
    let mut merged = ExternalParams::default();
    while let Ok(p) = rx.try_recv() {
        merged.merge(p);
    }
    merged
}

pub enum ParamsSource {
    Stdin,
    File(PathBuf),
}

impl ParamsSource {
    /// `-` means stdin, anything else is a file path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            ParamsSource::Stdin
        } else {
            ParamsSource::File(PathBuf::from(arg))
        }
    }
}

pub fn spawn_reader(source: ParamsSource) -> Receiver<ExternalParams> {
    let (tx, rx) = mpsc::channel::<ExternalParams>();

    match source {
        ParamsSource::Stdin => {
            std::thread::spawn(move || {
                use std::io::BufRead;
                let stdin = std::io::BufReader::new(std::io::stdin());
                for line in stdin.lines() {
                    let Ok(line) = line else { break };
                    if let Some(params) = ExternalParams::parse(&line)
                        && tx.send(params).is_err()
                    {
                        break;
                    }
                }
                debug!("stdin parameter stream closed");
            });
        }
        ParamsSource::File(path) => {
            std::thread::spawn(move || watch_file(path, tx));
        }
    }

    rx
}

fn send_last_line(path: &PathBuf, tx: &Sender<ExternalParams>) -> bool {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return true;
    };
    match contents
        .lines()
        .rfind(|l| !l.trim().is_empty())
        .and_then(ExternalParams::parse)
    {
        Some(params) => tx.send(params).is_ok(),
        None => true,
    }
}

fn watch_file(path: PathBuf, tx: Sender<ExternalParams>) {
    if !send_last_line(&path, &tx) {
        return;
    }

    let (file_tx, file_rx) = mpsc::channel();
    let mut watcher = match notify::recommended_watcher(move |res| {
        let _ = file_tx.send(res);
    }) {
        Ok(w) => w,
        Err(e) => {
            warn!("cannot create watcher for {}: {}", path.display(), e);
            return;
        }
    };
    if let Err(e) =
        notify::Watcher::watch(&mut watcher, &path, notify::RecursiveMode::NonRecursive)
    {
        warn!("cannot watch {}: {}", path.display(), e);
        return;
    }

    while let Ok(Ok(_event)) = file_rx.recv() {
        if !send_last_line(&path, &tx) {
            break;
        }
    }
}

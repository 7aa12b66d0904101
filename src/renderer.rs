use egui::Color32;
use regex::Regex;

use crate::config::ColorPalette;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
    Trace,
    Unknown,
}

impl LogLevel {
    fn from_token(token: &str) -> Self {
        match token.to_uppercase().as_str() {
            "INFO" => LogLevel::Info,
            "WARN" | "WARNING" => LogLevel::Warn,
            "ERROR" => LogLevel::Error,
            "DEBUG" => LogLevel::Debug,
            "TRACE" => LogLevel::Trace,
            _ => LogLevel::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub text: String,
    pub color: Color32,
}

/// Turns one raw log line into styled runs.
pub trait LineRenderer {
    fn render(&self, line: &str) -> Vec<StyledRun>;
}

/// Colors a line by the first log level token it contains.
pub struct LevelLineRenderer {
    palette: ColorPalette,
    level_regex: Regex,
}

impl LevelLineRenderer {
    pub fn new(palette: ColorPalette) -> Self {
        // Bare tokens ("INFO", "warning") and starred ones ("*ERROR*")
        let level_pattern = r"(?i)\*?\b(TRACE|DEBUG|INFO|WARNING|WARN|ERROR)\b\*?";

        Self {
            palette,
            level_regex: Regex::new(level_pattern).expect("level pattern is valid"),
        }
    }

    pub fn detect_level(&self, line: &str) -> LogLevel {
        self.level_regex
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| LogLevel::from_token(m.as_str()))
            .unwrap_or(LogLevel::Unknown)
    }

    pub fn color_for_level(&self, level: LogLevel) -> Color32 {
        match level {
            LogLevel::Info => self.palette.info,
            LogLevel::Warn => self.palette.warn,
            LogLevel::Error => self.palette.error,
            LogLevel::Debug => self.palette.debug,
            LogLevel::Trace => self.palette.trace,
            LogLevel::Unknown => self.palette.default,
        }
    }
}

impl LineRenderer for LevelLineRenderer {
    fn render(&self, line: &str) -> Vec<StyledRun> {
        let Some(caps) = self.level_regex.captures(line) else {
            return vec![StyledRun {
                text: line.to_string(),
                color: self.palette.default,
            }];
        };

        let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) else {
            return vec![StyledRun {
                text: line.to_string(),
                color: self.palette.default,
            }];
        };

        let color = self.color_for_level(LogLevel::from_token(token.as_str()));
        let mut runs = Vec::with_capacity(2);
        if whole.start() > 0 {
            runs.push(StyledRun {
                text: line[..whole.start()].to_string(),
                color: self.palette.default,
            });
        }
        runs.push(StyledRun {
            text: line[whole.start()..].to_string(),
            color,
        });
        runs
    }
}

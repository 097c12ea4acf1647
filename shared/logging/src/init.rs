use slog::{Drain, Level};
use slog_scope::GlobalLoggerGuard;

pub struct LoggerBuilder {
    level: Level,
}

pub struct Logger(Level, GlobalLoggerGuard);

#[derive(Debug)]
pub enum LogError {
    BadLevel(String),
}

impl LoggerBuilder {
    pub fn with_env() -> Result<Self, LogError> {
        let mut builder = Self::default();

        if let Ok(env) = std::env::var("PLACEMENT_LOG") {
            let level = env.parse().map_err(|_| LogError::BadLevel(env.clone()))?;
            builder = builder.level(level)
        }

        Ok(builder)
    }

    pub fn level(mut self, s: Level) -> Self {
        self.level = s;
        self
    }

    pub fn init(self) -> Result<Logger, LogError> {
        let decorator = slog_term::TermDecorator::new()
            .stdout()
            .force_color()
            .build();
        let drain = slog_term::CompactFormat::new(decorator).build().fuse();
        let drain = drain.filter_level(self.level).fuse();
        let drain = slog_async::Async::new(drain)
            .thread_name("logging".to_owned())
            .chan_size(1024)
            .build_no_guard()
            .fuse();
        let logger = slog::Logger::root(drain, slog::o!());

        let global = slog_scope::set_global_logger(logger);
        Ok(Logger(self.level, global))
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self { level: Level::Info }
    }
}

impl Logger {
    pub fn level(&self) -> Level {
        self.0
    }
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogError::BadLevel(s) => write!(f, "invalid log level {:?}", s),
        }
    }
}

impl std::error::Error for LogError {}

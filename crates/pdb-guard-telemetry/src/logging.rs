//! Console and rolling file log outputs.
//!
//! [`TelemetryOptions`] are turned into [`LogOutputs`], which are installed as
//! the global [`Subscriber`](tracing::Subscriber) by [`LogOutputs::install`].
//! [`Tracing::init`] does both in one go.
use std::path::PathBuf;

use snafu::{ResultExt as _, Snafu};
use tracing::{level_filters::LevelFilter, subscriber::SetGlobalDefaultError};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to create rolling log file in {directory:?}"))]
    CreateLogFile {
        source: InitError,
        directory: PathBuf,
    },

    #[snafu(display("failed to install the global log subscriber"))]
    InstallSubscriber { source: SetGlobalDefaultError },
}

/// The level filter of one log output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelConfig {
    /// Environment variable which, if set, replaces [`Self::default_level`].
    /// Accepts the full `RUST_LOG` directive syntax.
    pub env_var: &'static str,
    pub default_level: LevelFilter,
}

impl LevelConfig {
    /// Quiet unless something is off.
    pub const CONSOLE: Self = Self {
        env_var: "CONSOLE_LOG_LEVEL",
        default_level: LevelFilter::WARN,
    };
    pub const FILE: Self = Self {
        env_var: "FILE_LOG_LEVEL",
        default_level: LevelFilter::INFO,
    };

    fn env_filter(self) -> EnvFilter {
        EnvFilter::builder()
            .with_env_var(self.env_var)
            .with_default_directive(self.default_level.into())
            .from_env_lossy()
    }
}

/// Location and rotation of the JSON log files.
///
/// Files are named `<prefix>.<date>.tracing-rs.json`, the date part depends on
/// the rotation period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFiles {
    pub directory: PathBuf,
    pub prefix: &'static str,
    pub rotation: RotationPeriod,
}

impl LogFiles {
    pub const SUFFIX: &str = "tracing-rs.json";

    fn appender(&self) -> Result<RollingFileAppender> {
        RollingFileAppender::builder()
            .rotation(self.rotation.into())
            .filename_prefix(self.prefix)
            .filename_suffix(Self::SUFFIX)
            .build(&self.directory)
            .context(CreateLogFileSnafu {
                directory: &self.directory,
            })
    }
}

/// The log outputs a run of the binary writes to. [`None`] disables an
/// output.
#[derive(Debug, PartialEq, Eq)]
pub struct LogOutputs {
    pub console: Option<LevelConfig>,
    pub files: Option<LogFiles>,
}

impl LogOutputs {
    /// Console logs are on unless disabled, file logs only if a directory is
    /// given. Log files are prefixed with `service_name`.
    pub fn new(service_name: &'static str, options: TelemetryOptions) -> Self {
        let TelemetryOptions {
            console_log_disabled,
            file_log_directory,
            file_log_rotation_period,
        } = options;

        Self {
            console: (!console_log_disabled).then_some(LevelConfig::CONSOLE),
            files: file_log_directory.map(|directory| LogFiles {
                directory,
                prefix: service_name,
                rotation: file_log_rotation_period.unwrap_or_default(),
            }),
        }
    }

    /// Installs the enabled outputs as the global subscriber. Nothing is
    /// installed if every output is disabled.
    pub fn install(self) -> Result<Tracing> {
        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

        if let Some(level) = self.console {
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_filter(level.env_filter())
                    .boxed(),
            );
        }

        if let Some(files) = &self.files {
            layers.push(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(files.appender()?)
                    .with_filter(LevelConfig::FILE.env_filter())
                    .boxed(),
            );
        }

        if !layers.is_empty() {
            tracing::subscriber::set_global_default(tracing_subscriber::registry().with(layers))
                .context(InstallSubscriberSnafu)?;
        }

        Ok(Tracing { outputs: self })
    }
}

/// Logging as installed for the lifetime of the process.
///
/// ```
/// use pdb_guard_telemetry::{TelemetryOptions, Tracing};
///
/// let _tracing = Tracing::init("pdb-guard", TelemetryOptions::default()).unwrap();
/// tracing::warn!("shown on stderr");
/// ```
#[derive(Debug)]
pub struct Tracing {
    outputs: LogOutputs,
}

impl Tracing {
    pub fn init(service_name: &'static str, options: TelemetryOptions) -> Result<Self> {
        LogOutputs::new(service_name, options).install()
    }

    /// Returns `true` if log files are being written.
    pub fn writes_files(&self) -> bool {
        self.outputs.files.is_some()
    }
}

/// Logging related CLI arguments.
///
/// Deriving [`clap::Args`] requires the `clap` feature.
#[cfg_attr(feature = "clap", derive(clap::Args, PartialEq, Eq))]
#[cfg_attr(feature = "clap", command(next_help_heading = "Logging Options"))]
#[derive(Debug, Default)]
pub struct TelemetryOptions {
    /// Disable console logs.
    #[cfg_attr(feature = "clap", arg(long, env))]
    pub console_log_disabled: bool,

    /// Write JSON logs to files in DIRECTORY.
    #[cfg_attr(
        feature = "clap",
        arg(long, env, value_name = "DIRECTORY", group = "file_log")
    )]
    pub file_log_directory: Option<PathBuf>,

    /// Time PERIOD after which a new log file is started.
    #[cfg_attr(
        feature = "clap",
        arg(long, env, value_name = "PERIOD", requires = "file_log")
    )]
    pub file_log_rotation_period: Option<RotationPeriod>,
}

#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "PascalCase")]
pub enum RotationPeriod {
    Minutely,
    Hourly,
    Daily,

    #[default]
    Never,
}

impl From<RotationPeriod> for Rotation {
    fn from(value: RotationPeriod) -> Self {
        match value {
            RotationPeriod::Minutely => Self::MINUTELY,
            RotationPeriod::Hourly => Self::HOURLY,
            RotationPeriod::Daily => Self::DAILY,
            RotationPeriod::Never => Self::NEVER,
        }
    }
}

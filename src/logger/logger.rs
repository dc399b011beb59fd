use anyhow::{Result, anyhow};
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::{Identity, Layered};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

const DEFAULT_LEVEL: &str = "info";

pub const APP_LOG_FILE: &str = "app.json";
pub const ERROR_LOG_FILE: &str = "error.json";

type Filtered = Layered<reload::Layer<EnvFilter, Registry>, Registry>;
type FileSink = Box<dyn Layer<Filtered> + Send + Sync>;

pub struct LogConfig {
    pub filter: String,
    /// Directory for the JSON log files; stdout only when unset.
    pub dir: Option<String>,
}

impl LogConfig {
    /// Bare level names pass through lowercased, directive lists pass through
    /// as written, and anything else falls back to `info`.
    pub fn directive(&self) -> String {
        let raw = self.filter.trim();
        let level = raw.to_ascii_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => level,
            _ if raw.contains('=') || raw.contains(',') => raw.to_string(),
            _ => DEFAULT_LEVEL.to_string(),
        }
    }
}

pub struct Logger {
    reload_handle: reload::Handle<EnvFilter, Registry>,
    file_handle: reload::Handle<FileSink, Filtered>,
}

impl Logger {
    pub fn new_bootstrap() -> Self {
        let filter = EnvFilter::new(DEFAULT_LEVEL);
        let (filter, reload_handle) = reload::Layer::new(filter);
        let no_files: FileSink = Identity::new().boxed();
        let (files, file_handle) = reload::Layer::new(no_files);

        tracing_subscriber::registry()
            .with(filter)
            .with(files)
            .with(fmt::layer())
            .init();

        Self {
            reload_handle,
            file_handle,
        }
    }

    pub fn reload_from_config(&self, config: &LogConfig) -> Result<()> {
        let filter = EnvFilter::try_new(config.directive()).map_err(|e| anyhow!(e))?;
        self.reload_handle.reload(filter).map_err(|e| anyhow!(e))?;

        if let Some(dir) = &config.dir {
            let files: FileSink = json_file_layer::<Filtered>(Path::new(dir))?.boxed();
            self.file_handle.reload(files).map_err(|e| anyhow!(e))?;
        }
        Ok(())
    }
}

fn open_append(path: &Path) -> Result<Arc<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow!("open log file {}: {}", path.display(), e))?;
    Ok(Arc::new(file))
}

/// JSON lines for every event into `app.json`, and errors again into `error.json`.
fn json_file_layer<S>(dir: &Path) -> Result<impl Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fs::create_dir_all(dir).map_err(|e| anyhow!("create log dir {}: {}", dir.display(), e))?;
    let app = open_append(&dir.join(APP_LOG_FILE))?;
    let errors = open_append(&dir.join(ERROR_LOG_FILE))?;

    Ok(fmt::layer()
        .json()
        .with_writer(app.and(errors.with_max_level(Level::ERROR))))
}

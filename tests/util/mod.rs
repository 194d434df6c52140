use limoka_search::model::types::Module;
use tempfile::TempDir;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Assert that the captured log output contains the provided substring.
    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }
}

struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// The single-module catalog used throughout the resolution examples.
#[allow(dead_code)]
pub fn weather_catalog() -> Vec<Module> {
    vec![Module::new(1, "weather", "shows forecast").with_command("wget", "get weather")]
}

/// A small mixed catalog with overlapping vocabulary.
#[allow(dead_code)]
pub fn mixed_catalog() -> Vec<Module> {
    vec![
        Module::new(1, "weather", "shows forecast").with_command("wget", "get weather"),
        Module::new(2, "Translator", "Translate text between languages")
            .with_command("tr", "translate replied message")
            .with_developer("linguist"),
        Module::new(3, "MusicDL", "Download music from streaming services")
            .with_command("mdl", "download a track")
            .with_command("msearch", "search for a track"),
        Module::new(4, "AutoReply", "Answer messages while you are away")
            .with_command("afk", "enable away mode"),
    ]
}

/// Catalog file written to a temp dir, in the catalog service's wire shape.
#[allow(dead_code)]
pub struct CatalogFile {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl CatalogFile {
    pub fn write(json: &str) -> Self {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("catalog.json"), json).expect("write catalog");
        Self { dir }
    }

    pub fn path(&self) -> std::path::PathBuf {
        self.dir.path().join("catalog.json")
    }
}

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

fn write_lines(path: &Path, lines: impl Iterator<Item = String>) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    for line in lines {
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
    }
    Ok(())
}

fn read_number<T: std::str::FromStr>(path: &Path) -> Option<T> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Records how the binary was invoked to files next to it, then exits as configured.
///
/// Reads `sleep-ms` to wait before exiting and `exit-status` for the exit code.
pub fn test_binary_main() {
    let dir = match std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_owned))
    {
        Some(dir) => dir,
        None => std::process::exit(101),
    };
    let _ = write_lines(&dir.join("args"), std::env::args().skip(1));
    let _ = write_lines(
        &dir.join("env"),
        std::env::vars().map(|(key, value)| format!("{}={}", key, value)),
    );
    let _ = write_lines(
        &dir.join("cwd"),
        std::env::current_dir()
            .map(|cwd| cwd.display().to_string())
            .into_iter(),
    );

    if let Some(sleep_ms) = read_number(&dir.join("sleep-ms")) {
        std::thread::sleep(Duration::from_millis(sleep_ms));
    }
    std::process::exit(read_number(&dir.join("exit-status")).unwrap_or(0));
}

fn exe_name(name: &str) -> String {
    format!("{}{}", name, std::env::consts::EXE_SUFFIX)
}

/// A temporary directory holding a private copy of the test binary and what it recorded.
pub struct Workdir {
    dir: tempfile::TempDir,
}

impl Workdir {
    const TARGET_BINARY_NAME: &'static str = "test-binary";

    pub fn new(test_binary: &Path) -> std::io::Result<Self> {
        let dir = tempfile::TempDir::new()?;
        std::fs::copy(
            test_binary,
            dir.path().join(exe_name(Self::TARGET_BINARY_NAME)),
        )?;
        Ok(Self { dir })
    }

    pub fn with_exit_status(self, exit_status: i32) -> std::io::Result<Self> {
        std::fs::write(self.path().join("exit-status"), exit_status.to_string())?;
        Ok(self)
    }

    pub fn with_sleep(self, duration: Duration) -> std::io::Result<Self> {
        std::fs::write(
            self.path().join("sleep-ms"),
            duration.as_millis().to_string(),
        )?;
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn bin(&self) -> PathBuf {
        self.dir.path().join(exe_name(Self::TARGET_BINARY_NAME))
    }

    pub fn was_run(&self) -> bool {
        self.path().join("args").exists()
    }

    pub fn args(&self) -> std::io::Result<Vec<String>> {
        Ok(std::fs::read_to_string(self.path().join("args"))?
            .lines()
            .map(|s| s.to_owned())
            .collect())
    }

    pub fn env(&self) -> std::io::Result<Vec<(String, String)>> {
        let mut env: Vec<_> = std::fs::read_to_string(self.path().join("env"))?
            .lines()
            .filter_map(|s| s.split_once('='))
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        env.sort();
        Ok(env)
    }

    pub fn cwd(&self) -> std::io::Result<PathBuf> {
        Ok(PathBuf::from(
            std::fs::read_to_string(self.path().join("cwd"))?.trim_end(),
        ))
    }
}

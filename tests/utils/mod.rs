// Shared fixture builders for harness integration tests
//
// All fixtures are hermetic: shell scripts stand in for instrumented and
// reference binaries, and a fake compiler script stands in for gcc so the
// safe-path recompilation is exercised without a real toolchain.
#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub fn write_script(path: &Path, body: &str) {
    let mut file = fs::File::create(path).unwrap();
    writeln!(file, "#!/bin/sh").unwrap();
    writeln!(file, "{body}").unwrap();
    drop(file);
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// A differential-test tree: `src/`, `bin/`, `catalog.toml`.
pub struct TestTree {
    root: tempfile::TempDir,
}

impl TestTree {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("src")).unwrap();
        fs::create_dir(root.path().join("bin")).unwrap();
        Self { root }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn add_source(&self, name: &str) {
        fs::write(
            self.path().join("src").join(format!("{name}.c")),
            "int main(void) { return 0; }\n",
        )
        .unwrap();
    }

    /// Install `bin/<name>` as a shell script with the given body.
    pub fn add_binary(&self, name: &str, body: &str) {
        write_script(&self.path().join("bin").join(name), body);
    }

    pub fn write_catalog(&self, fault: &[&str], safe: &[&str]) -> PathBuf {
        let text = format!(
            "fault = [{}]\nsafe = [{}]\n",
            quote_list(fault),
            quote_list(safe)
        );
        let path = self.path().join("catalog.toml");
        fs::write(&path, text).unwrap();
        path
    }

    /// Fake reference compiler: invoked as `fakecc <src> -o <out>`, it writes
    /// a script to `<out>` that prints `output` and exits 0.
    pub fn fake_compiler(&self, output: &str) -> PathBuf {
        let path = self.path().join("fakecc");
        let body = format!(
            "out=\"$3\"\n{{\n  echo '#!/bin/sh'\n  echo 'echo {output}'\n}} > \"$out\"\nchmod +x \"$out\""
        );
        write_script(&path, &body);
        path
    }

    /// Fake compiler that always fails, for compilation-failure paths.
    pub fn failing_compiler(&self) -> PathBuf {
        let path = self.path().join("fakecc");
        write_script(&path, "echo 'fatal error: boom' >&2\nexit 1");
        path
    }
}

/// A benchmark tree: `bin/benchmark` and `bin/benchmark.orig`.
pub struct BenchTree {
    root: tempfile::TempDir,
}

impl BenchTree {
    pub fn new(orig_body: &str, new_body: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let bin = root.path().join("bin");
        fs::create_dir(&bin).unwrap();
        write_script(&bin.join("benchmark.orig"), orig_body);
        write_script(&bin.join("benchmark"), new_body);
        Self { root }
    }

    /// Both builds run the same deterministic workload.
    pub fn deterministic() -> Self {
        let body = "sleep 0.05\necho \"out $1 $2\"";
        Self::new(body, body)
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }
}

fn quote_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("\"{item}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

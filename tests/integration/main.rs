//! Integration tests for secache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn secache() -> Command {
        let mut cmd = cargo_bin_cmd!("secache");
        cmd.env_remove("SECACHE_DEVICE")
            .env_remove("SECACHE_ORACLE")
            .env_remove("SECACHE_DIR")
            .env_remove("SECACHE_DEBUG");
        cmd
    }

    #[test]
    fn help_displays() {
        secache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("memoized secure element queries"));
    }

    #[test]
    fn version_displays() {
        secache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("secache"));
    }

    #[test]
    fn unsupported_device() {
        let tmp = tempfile::tempdir().unwrap();
        secache()
            .args(["--device", "tpm2", "serial"])
            .arg("--cache-dir")
            .arg(tmp.path())
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("Unsupported device"));
    }

    #[test]
    fn non_hex_hash_is_rejected_before_touching_disk() {
        let tmp = tempfile::tempdir().unwrap();
        secache()
            .args(["sign-hash", &"zz".repeat(64)])
            .arg("--cache-dir")
            .arg(tmp.path())
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("Invalid input"));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn clear_cache_on_empty_cache() {
        let tmp = tempfile::tempdir().unwrap();
        for _ in 0..2 {
            secache()
                .arg("clear-cache")
                .arg("--cache-dir")
                .arg(tmp.path())
                .assert()
                .success();
        }
    }

    #[cfg(unix)]
    mod with_oracle {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;

        struct Fixture {
            dir: tempfile::TempDir,
            oracle: PathBuf,
            log: PathBuf,
        }

        impl Fixture {
            fn new(body: &str) -> Self {
                let dir = tempfile::tempdir().unwrap();
                let log = dir.path().join("calls.log");
                let oracle = dir.path().join("oracle");
                let script = format!(
                    "#!/bin/sh\necho \"$*\" >> '{}'\n{}\n",
                    log.display(),
                    body
                );
                std::fs::write(&oracle, script).unwrap();
                std::fs::set_permissions(&oracle, std::fs::Permissions::from_mode(0o755))
                    .unwrap();
                Fixture { dir, oracle, log }
            }

            fn cmd(&self) -> Command {
                let mut cmd = secache();
                cmd.env("SECACHE_ORACLE", &self.oracle)
                    .env("SECACHE_DIR", self.dir.path());
                cmd
            }

            fn calls(&self) -> usize {
                std::fs::read_to_string(&self.log)
                    .map(|s| s.lines().count())
                    .unwrap_or(0)
            }

            fn cache_files(&self) -> usize {
                let root = std::fs::read_dir(self.dir.path())
                    .unwrap()
                    .map(|e| e.unwrap().path())
                    .find(|p| {
                        p.file_name()
                            .unwrap()
                            .to_string_lossy()
                            .starts_with("secache-")
                    });
                match root {
                    Some(root) => std::fs::read_dir(root).unwrap().count(),
                    None => 0,
                }
            }
        }

        const ECHO: &str = r#"case "$1" in
  serial) echo 0123EE ;;
  mac) echo 04:91:62:aa:bb:cc ;;
  sign-hash) echo "sig-$2" ;;
  sign-file) echo "sig-$(cat "$2")" ;;
esac"#;

        #[test]
        fn serial_hits_hardware_once() {
            let fx = Fixture::new(ECHO);
            for _ in 0..3 {
                fx.cmd()
                    .arg("serial")
                    .assert()
                    .success()
                    .stdout("0123EE\n");
            }
            assert_eq!(fx.calls(), 1);
        }

        #[test]
        fn sign_hash_memoized_per_hash() {
            let fx = Fixture::new(ECHO);
            let a = "0a".repeat(32);
            let b = "0b".repeat(32);
            fx.cmd()
                .args(["sign-hash", &a])
                .assert()
                .success()
                .stdout(format!("sig-{}\n", a));
            fx.cmd().args(["sign-hash", &b]).assert().success();
            fx.cmd().args(["sign-hash", &a]).assert().success();
            assert_eq!(fx.calls(), 2);
        }

        #[test]
        fn sign_file() {
            let fx = Fixture::new(ECHO);
            let input = fx.dir.path().join("image.bin");
            std::fs::write(&input, "firmware").unwrap();
            for _ in 0..2 {
                fx.cmd()
                    .arg("sign-file")
                    .arg(&input)
                    .assert()
                    .success()
                    .stdout("sig-firmware\n");
            }
            assert_eq!(fx.calls(), 1);

            fx.cmd()
                .arg("sign-file")
                .arg(fx.dir.path().join("missing.bin"))
                .assert()
                .failure()
                .stderr(predicate::str::contains("Invalid input"));
        }

        #[test]
        fn failure_is_reported_and_not_cached() {
            let fx = Fixture::new("echo garbage; exit 1");
            for _ in 0..2 {
                fx.cmd()
                    .arg("mac")
                    .assert()
                    .failure()
                    .stdout(predicate::str::is_empty())
                    .stderr(predicate::str::contains("failed"));
            }
            assert_eq!(fx.calls(), 2);
            assert_eq!(fx.cache_files(), 0);
        }

        #[test]
        fn clear_cache_forces_requery() {
            let fx = Fixture::new(ECHO);
            fx.cmd().arg("serial").assert().success();
            fx.cmd().arg("clear-cache").assert().success();
            fx.cmd().arg("clear-cache").assert().success();
            fx.cmd().arg("serial").assert().success().stdout("0123EE\n");
            assert_eq!(fx.calls(), 2);
        }

        #[test]
        fn ls_and_verify() {
            let fx = Fixture::new(ECHO);
            fx.cmd().arg("serial").assert().success();
            fx.cmd().arg("mac").assert().success();
            fx.cmd()
                .args(["ls", "--json"])
                .assert()
                .success()
                .stdout(predicate::str::contains("\"valid\": true"));
            fx.cmd()
                .arg("verify")
                .assert()
                .success()
                .stdout("checked 2 entries, removed 0\n");
        }

        #[test]
        fn debug_traces_go_to_stderr() {
            let fx = Fixture::new(ECHO);
            fx.cmd()
                .env("SECACHE_DEBUG", "1")
                .arg("serial")
                .assert()
                .success()
                .stdout("0123EE\n")
                .stderr(predicate::str::contains("Cache miss"));
            fx.cmd()
                .env("SECACHE_DEBUG", "1")
                .arg("serial")
                .assert()
                .success()
                .stdout("0123EE\n")
                .stderr(predicate::str::contains("Cache hit"));
        }
    }
}

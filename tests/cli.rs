use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::{
    fs,
    io::{self, BufRead, BufReader},
    net::TcpListener,
    path::Path,
    process::Command,
    thread,
};
use tempfile::tempdir;

fn macros_nx(config: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("macros-nx"));
    cmd.arg("--config").arg(config);
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn check_lists_steps() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("jump.txt");
    fs::write(&file, "Button:a, Wait:200\n%0,32767").unwrap();

    macros_nx(&tmp.path().join("config.toml"))
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Press A"))
        .stdout(predicate::str::contains("Wait 200 ms"))
        .stdout(predicate::str::contains("Move left stick to (0, 32767)"))
        .stdout(predicate::str::contains("3 steps OK"));
}

#[test]
fn check_reports_unknown_button_position() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("bad.txt");
    fs::write(&file, "Button:A\nButton:Q").unwrap();

    macros_nx(&tmp.path().join("config.toml"))
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2, column 1: unknown button \"Q\""));
}

#[test]
fn fmt_inline_from_stdin() {
    let tmp = tempdir().unwrap();

    assert_cmd::Command::from_std(macros_nx(&tmp.path().join("config.toml")))
        .args(["fmt", "--inline", "-"])
        .write_stdin("hold:zl\nwait:10\nrelease:zl\n")
        .assert()
        .success()
        .stdout("Hold:ZL,Wait:10,Release:ZL\n");
}

#[test]
fn dry_run_completes() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("m.txt");
    fs::write(&file, "Hold:A\nWait:10\nRelease:A").unwrap();

    macros_nx(&tmp.path().join("config.toml"))
        .arg("run")
        .arg(&file)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Macro sent!"));
}

#[test]
fn run_sends_to_configured_console() {
    let tmp = tempdir().unwrap();
    let config = tmp.path().join("config.toml");
    let file = tmp.path().join("m.txt");
    fs::write(&file, "Button:B\n&0,-32767").unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        BufReader::new(stream)
            .lines()
            .map_while(Result::ok)
            .collect::<Vec<_>>()
    });

    macros_nx(&config)
        .args(["config", "set", "--host", "127.0.0.1", "--settle-ms", "0"])
        .arg("--port")
        .arg(port.to_string())
        .assert()
        .success();

    macros_nx(&config)
        .arg("run")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Connected to 127.0.0.1"));

    assert_eq!(
        server.join().unwrap(),
        vec!["click B", "setStick RIGHT 0 -32767"]
    );
}

#[test]
fn run_fails_when_console_unreachable() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("m.txt");
    fs::write(&file, "Button:A").unwrap();
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    macros_nx(&tmp.path().join("config.toml"))
        .arg("run")
        .arg(&file)
        .args(["--host", "127.0.0.1", "--port"])
        .arg(port.to_string())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not connect"));
}

#[test]
fn invalid_macro_never_connects() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("bad.txt");
    fs::write(&file, "Hold:A\nButton:Q").unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let port = listener.local_addr().unwrap().port();

    macros_nx(&tmp.path().join("config.toml"))
        .arg("run")
        .arg(&file)
        .args(["--host", "127.0.0.1", "--port"])
        .arg(port.to_string())
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2, column 1"));

    let err = listener.accept().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
}

#[test]
fn library_add_list_show_and_run() {
    let tmp = tempdir().unwrap();
    let config = tmp.path().join("config.toml");
    let library = tmp.path().join("macros.json");
    let file = tmp.path().join("dash.txt");
    fs::write(&file, "Hold:B,%0,32767,Wait:5,%0,0,Release:B").unwrap();

    macros_nx(&config)
        .args(["library", "add"])
        .arg(&file)
        .args(["--name", "Dash", "--trigger", "!dash", "--library"])
        .arg(&library)
        .assert()
        .success();

    let saved = fs::read_to_string(&library).unwrap();
    assert!(saved.contains("\"chat_command\": \"!dash\""), "{saved}");

    macros_nx(&config)
        .args(["config", "set", "--library"])
        .arg(&library)
        .assert()
        .success();

    macros_nx(&config)
        .args(["library", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dash  (!dash, 5 steps)"));

    macros_nx(&config)
        .args(["library", "show", "!DASH"])
        .assert()
        .success()
        .stdout("Hold:B\n%0,32767\nWait:5\n%0,0\nRelease:B\n");

    macros_nx(&config)
        .args(["run", "--name", "dash", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Running 'Dash' (5 steps)"));
}

#[test]
fn library_import_accepts_single_object() {
    let tmp = tempdir().unwrap();
    let library = tmp.path().join("macros.json");
    let export = tmp.path().join("shared.json");
    fs::write(
        &export,
        r#"{"name":"Menu","chat_command":"!menu","steps":["Button:PLUS"]}"#,
    )
    .unwrap();

    macros_nx(&tmp.path().join("config.toml"))
        .args(["library", "import"])
        .arg(&export)
        .arg("--library")
        .arg(&library)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 macros"));

    macros_nx(&tmp.path().join("config.toml"))
        .args(["library", "show", "menu", "--library"])
        .arg(&library)
        .assert()
        .success()
        .stdout("Button:PLUS\n");
}

#[test]
fn config_set_rejects_unknown_level() {
    let tmp = tempdir().unwrap();
    let config = tmp.path().join("config.toml");

    macros_nx(&config)
        .args(["config", "set", "--log-level", "loud"])
        .assert()
        .failure();
    assert!(!config.exists());

    macros_nx(&config)
        .args(["config", "set", "--port", "6100"])
        .assert()
        .success();
    macros_nx(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("switch_port = 6100"));
}

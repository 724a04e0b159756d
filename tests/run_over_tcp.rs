use macros_nx::{
    executor::{RunOutcome, RunState},
    macro_worker::MacroWorker,
    network::SysBotSink,
    parser::MacroSeq,
};
use std::{
    io::{BufRead, BufReader},
    net::TcpListener,
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

/// Accepts one connection and forwards every received line with its arrival time.
fn fake_sysbot() -> (u16, mpsc::Receiver<(Instant, String)>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            if tx.send((Instant::now(), line)).is_err() {
                break;
            }
        }
    });

    (port, rx)
}

fn connect(port: u16) -> SysBotSink {
    SysBotSink::connect("127.0.0.1", port, Duration::from_secs(2))
        .unwrap()
        .with_settle(Duration::ZERO)
}

fn drain(rx: &mpsc::Receiver<(Instant, String)>, count: usize) -> Vec<(Instant, String)> {
    (0..count)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
        .collect()
}

#[test]
fn macro_reaches_the_console_in_order() {
    let (port, rx) = fake_sysbot();
    let seq: MacroSeq = "Hold:ZL\n%0,32767,Wait:300\n%0,0, Release:zl\nButton:a\n&-32767,0"
        .parse()
        .unwrap();

    let finished = MacroWorker::new(connect(port), seq.steps)
        .spawn()
        .join()
        .unwrap();
    assert_eq!(finished.result.unwrap(), RunOutcome::Completed);

    let received = drain(&rx, 6);
    let lines: Vec<&str> = received.iter().map(|(_, l)| l.as_str()).collect();
    assert_eq!(
        lines,
        vec![
            "press ZL",
            "setStick LEFT 0 32767",
            "setStick LEFT 0 0",
            "release ZL",
            "click A",
            "setStick RIGHT -32767 0",
        ]
    );

    let waited = received[2].0 - received[1].0;
    assert!(waited >= Duration::from_millis(300), "{waited:?}");
}

#[test]
fn cancel_mid_wait_releases_over_the_wire() {
    let (port, rx) = fake_sysbot();
    let seq: MacroSeq = "Hold:A\nHold:B\nWait:10000\nRelease:A\nRelease:B".parse().unwrap();

    let handle = MacroWorker::new(connect(port), seq.steps).spawn();

    let first = drain(&rx, 2);
    assert_eq!(first[0].1, "press A");
    assert_eq!(first[1].1, "press B");

    let deadline = Instant::now() + Duration::from_secs(5);
    while handle.status().step != Some(2) {
        assert!(Instant::now() < deadline);
        thread::sleep(Duration::from_millis(5));
    }
    handle.cancel();

    let finished = handle.join().unwrap();
    assert_eq!(
        finished.result.unwrap(),
        RunOutcome::Cancelled { completed: 2 }
    );

    let cleanup: Vec<String> = drain(&rx, 2).into_iter().map(|(_, l)| l).collect();
    assert_eq!(cleanup, vec!["release A", "release B"]);
}

#[test]
fn status_reports_completion() {
    let (port, _rx) = fake_sysbot();
    let seq: MacroSeq = "Hold:R".parse().unwrap();
    let handle = MacroWorker::new(connect(port), seq.steps).spawn();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !handle.is_finished() {
        assert!(Instant::now() < deadline);
        thread::sleep(Duration::from_millis(5));
    }
    let status = handle.status();
    assert_eq!(status.state, RunState::Completed);
    assert!(status.pad.is_held(macros_nx::step::Button::R));
    handle.join().unwrap();
}

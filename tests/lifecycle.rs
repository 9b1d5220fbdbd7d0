// tests/lifecycle.rs
//
// End-to-end lifecycle against a shell-script node.

#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use nodevisor::errors::{ExecutionFailure, StartupExit};
use nodevisor::logging::SilentLogger;
use nodevisor::{LifecycleState, NodeError, NodeSupervisor, StopOptions};
use nodevisor_test_utils::builders::RawNodeConfigBuilder;
use nodevisor_test_utils::fake_node::{Behaviour, FakeNode, console_log};
use nodevisor_test_utils::recording_executor::RecordingExecutor;
use nodevisor_test_utils::with_timeout;

use common::supervisor;

#[tokio::test]
async fn caller_datadir_keeps_account_across_restarts() {
    let node = FakeNode::new(Behaviour::Healthy);
    let dir = tempfile::tempdir().unwrap();
    let datadir = dir.path().join("chain");
    let (sup, _log) = supervisor(
        RawNodeConfigBuilder::new()
            .binary(node.path())
            .datadir(&datadir)
            .build(),
    );

    with_timeout(sup.start()).await.unwrap();
    let first = sup.account().expect("account after start");
    assert!(datadir.join("chaindata").is_dir());
    with_timeout(sup.stop(StopOptions::graceful())).await.unwrap();
    assert!(datadir.is_dir(), "caller directory must survive stop");

    with_timeout(sup.start()).await.unwrap();
    assert_eq!(sup.account().as_deref(), Some(first.as_str()));
    with_timeout(sup.stop(StopOptions::graceful())).await.unwrap();
    assert!(datadir.join("genesis.json").is_file());
}

#[tokio::test]
async fn temporary_datadir_is_removed_on_stop() {
    let node = FakeNode::new(Behaviour::Healthy);
    let (sup, _log) = supervisor(RawNodeConfigBuilder::new().binary(node.path()).build());

    with_timeout(sup.start()).await.unwrap();
    let datadir = sup.data_dir().expect("temporary datadir allocated");
    assert!(datadir.is_dir());
    assert!(sup.genesis_file_path().unwrap().is_file());

    let outcome = with_timeout(sup.stop(StopOptions::graceful())).await.unwrap();
    assert_eq!(outcome.exit_code, Some(0));
    assert!(!datadir.exists(), "temporary datadir must be deleted");
    assert!(!sup.is_running());
}

#[tokio::test]
async fn start_twice_and_stop_before_start_are_rejected() {
    let node = FakeNode::new(Behaviour::Healthy);
    let (sup, _log) = supervisor(RawNodeConfigBuilder::new().binary(node.path()).build());

    let err = sup.stop(StopOptions::graceful()).await.unwrap_err();
    assert!(matches!(err, NodeError::NotStarted), "got {err:?}");

    with_timeout(sup.start()).await.unwrap();
    let err = sup.start().await.unwrap_err();
    assert!(matches!(err, NodeError::AlreadyRunning), "got {err:?}");
    assert!(sup.is_running());

    with_timeout(sup.stop(StopOptions::graceful())).await.unwrap();
    let err = sup.stop(StopOptions::graceful()).await.unwrap_err();
    assert!(matches!(err, NodeError::NotStarted), "got {err:?}");
}

#[tokio::test]
async fn fatal_output_fails_start_and_keeps_datadir() {
    let node = FakeNode::new(Behaviour::Fatal);
    let (sup, log) = supervisor(RawNodeConfigBuilder::new().binary(node.path()).build());

    let err = with_timeout(sup.start()).await.unwrap_err();
    match err {
        NodeError::Startup { output, exit } => {
            assert_eq!(exit, StartupExit::FatalOutput);
            assert!(output.contains("address already in use"), "output: {output}");
        }
        other => panic!("expected Startup error, got {other:?}"),
    }
    assert!(!sup.is_running());
    assert_eq!(sup.state(), LifecycleState::Idle);
    assert!(sup.pid().is_none());
    assert!(!log.errors().is_empty());

    let datadir = sup.data_dir().expect("datadir recorded before launch");
    assert!(datadir.is_dir(), "failed start must preserve the datadir");
    std::fs::remove_dir_all(datadir).unwrap();
}

#[tokio::test]
async fn early_exit_fails_start() {
    let node = FakeNode::new(Behaviour::ExitsEarly);
    let dir = tempfile::tempdir().unwrap();
    let (sup, _log) = supervisor(
        RawNodeConfigBuilder::new()
            .binary(node.path())
            .datadir(dir.path())
            .build(),
    );

    let err = with_timeout(sup.start()).await.unwrap_err();
    match err {
        NodeError::Startup {
            exit: StartupExit::Exited(info),
            output,
        } => {
            assert_eq!(info.code, Some(1));
            assert!(output.contains("could not open database"), "output: {output}");
        }
        other => panic!("expected early-exit Startup error, got {other:?}"),
    }
    assert!(!sup.is_running());

    // A failed start leaves the supervisor ready for another attempt.
    let err = with_timeout(sup.start()).await.unwrap_err();
    assert!(matches!(err, NodeError::Startup { .. }), "got {err:?}");
}

#[tokio::test]
async fn unresolvable_binary_fails_before_touching_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let datadir = dir.path().join("never-created");
    let (sup, _log) = supervisor(
        RawNodeConfigBuilder::new()
            .binary("nodevisor-definitely-not-installed")
            .datadir(&datadir)
            .build(),
    );

    let err = sup.start().await.unwrap_err();
    assert!(matches!(err, NodeError::BinaryNotFound(_)), "got {err:?}");
    assert!(!datadir.exists());
    assert!(sup.data_dir().is_none());
    assert!(!sup.is_running());
}

#[tokio::test]
async fn missing_binary_path_is_an_execution_failure() {
    let dir = tempfile::tempdir().unwrap();
    let (sup, _log) = supervisor(
        RawNodeConfigBuilder::new()
            .binary(dir.path().join("no-such-geth"))
            .datadir(dir.path().join("chain"))
            .build(),
    );

    let err = with_timeout(sup.start()).await.unwrap_err();
    assert!(
        matches!(err, NodeError::Execution(ExecutionFailure::Spawn { .. })),
        "got {err:?}"
    );
    assert!(!sup.is_running());
}

#[tokio::test]
async fn console_exec_before_start_spawns_nothing() {
    let executor = Arc::new(RecordingExecutor::new("ignored"));
    let sup = NodeSupervisor::with_executor(
        RawNodeConfigBuilder::new().build(),
        Arc::new(SilentLogger),
        executor.clone(),
    );

    let err = sup.exec_in_console("eth.blockNumber").await.unwrap_err();
    assert!(matches!(err, NodeError::NotStarted), "got {err:?}");
    assert!(executor.invocations().is_empty());
}

#[tokio::test]
async fn console_exec_round_trips_through_attach() {
    let node = FakeNode::new(Behaviour::Healthy);
    let dir = tempfile::tempdir().unwrap();
    let (sup, _log) = supervisor(
        RawNodeConfigBuilder::new()
            .binary(node.path())
            .datadir(dir.path())
            .build(),
    );

    with_timeout(sup.start()).await.unwrap();
    let reply = with_timeout(sup.exec_in_console("admin.nodeInfo"))
        .await
        .unwrap();
    assert_eq!(reply, "admin.nodeInfo");
    assert_eq!(
        with_timeout(sup.exec_in_console("eth.mining")).await.unwrap(),
        "false"
    );
    with_timeout(sup.stop(StopOptions::graceful())).await.unwrap();

    assert_eq!(console_log(dir.path()), vec!["admin.nodeInfo", "eth.mining"]);
    let err = sup.exec_in_console("eth.mining").await.unwrap_err();
    assert!(matches!(err, NodeError::NotStarted));
}

#[tokio::test]
async fn paths_with_spaces_are_passed_through() {
    let root = tempfile::tempdir().unwrap();
    let bin_dir = root.path().join("node bin");
    std::fs::create_dir(&bin_dir).unwrap();
    let node = FakeNode::install(&bin_dir, "fake geth", Behaviour::Healthy);
    let datadir = root.path().join("chain data");

    let (sup, _log) = supervisor(
        RawNodeConfigBuilder::new()
            .binary(node.path())
            .datadir(&datadir)
            .network_option("identity", "node with spaces")
            .build(),
    );

    with_timeout(sup.start()).await.unwrap();
    assert!(datadir.join("keystore").join("account").is_file());
    assert_eq!(
        with_timeout(sup.exec_in_console("1 + 1")).await.unwrap(),
        "1 + 1"
    );
    with_timeout(sup.stop(StopOptions::graceful())).await.unwrap();
}

#[tokio::test]
async fn relative_datadir_resolves_against_cwd() {
    let node = FakeNode::new(Behaviour::Healthy);
    let name = format!("nodevisor-rel-{}", std::process::id());
    let (sup, _log) = supervisor(
        RawNodeConfigBuilder::new()
            .binary(node.path())
            .datadir(&name)
            .build(),
    );

    with_timeout(sup.start()).await.unwrap();
    let resolved = sup.data_dir().unwrap();
    assert!(resolved.is_absolute());
    assert_eq!(resolved, std::env::current_dir().unwrap().join(&name));
    with_timeout(sup.stop(StopOptions::graceful())).await.unwrap();

    assert!(resolved.is_dir());
    std::fs::remove_dir_all(resolved).unwrap();
}

#[tokio::test]
async fn forced_stop_reports_the_kill_signal() {
    let node = FakeNode::new(Behaviour::IgnoresTerm);
    let (sup, _log) = supervisor(RawNodeConfigBuilder::new().binary(node.path()).build());

    with_timeout(sup.start()).await.unwrap();
    let outcome = with_timeout(sup.stop(StopOptions::kill())).await.unwrap();
    assert_eq!(outcome.exit_code, None);
    assert_eq!(outcome.exit_signal, Some(libc::SIGKILL));
}

#[tokio::test]
async fn graceful_stop_escalates_after_timeout() {
    let node = FakeNode::new(Behaviour::IgnoresTerm);
    let (sup, log) = supervisor(
        RawNodeConfigBuilder::new()
            .binary(node.path())
            .stop_timeout_ms(300)
            .build(),
    );

    with_timeout(sup.start()).await.unwrap();
    let outcome = with_timeout(sup.stop(StopOptions::graceful())).await.unwrap();
    assert_eq!(outcome.exit_signal, Some(libc::SIGKILL));
    assert!(log.contains("did not exit"));
    assert!(!sup.is_running());
}

#[tokio::test]
async fn unexpected_exit_returns_to_idle() {
    let node = FakeNode::new(Behaviour::DiesAfterStartup);
    let (sup, log) = supervisor(
        RawNodeConfigBuilder::new()
            .binary(node.path())
            .target_balance(100.0)
            .build(),
    );

    with_timeout(sup.start()).await.unwrap();
    assert!(sup.is_running());

    with_timeout(async {
        while sup.is_running() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;

    assert_eq!(sup.state(), LifecycleState::Idle);
    assert!(log.contains("exited unexpectedly"));
    let err = sup.stop(StopOptions::graceful()).await.unwrap_err();
    assert!(matches!(err, NodeError::NotStarted));

    let datadir = sup.data_dir().unwrap();
    assert!(datadir.is_dir(), "unexpected exit must not delete the datadir");
    assert_eq!(sup.cleanup().await.unwrap(), 1);
    assert!(!datadir.exists());
}

#[tokio::test]
async fn repeated_crashes_leave_no_temporary_directories() {
    let node = FakeNode::new(Behaviour::DiesAfterStartup);
    let (sup, _log) = supervisor(RawNodeConfigBuilder::new().binary(node.path()).build());

    let mut dirs = Vec::new();
    for _ in 0..2 {
        with_timeout(sup.start()).await.unwrap();
        dirs.push(sup.data_dir().unwrap());
        with_timeout(async {
            while sup.is_running() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await;
    }
    assert_ne!(dirs[0], dirs[1]);
    assert!(dirs.iter().all(|d| d.is_dir()));

    assert_eq!(sup.cleanup().await.unwrap(), 2);
    assert!(dirs.iter().all(|d| !d.exists()));
}

#[tokio::test]
async fn cleanup_is_rejected_while_running_and_spares_caller_dirs() {
    let node = FakeNode::new(Behaviour::Healthy);
    let dir = tempfile::tempdir().unwrap();
    let (sup, _log) = supervisor(
        RawNodeConfigBuilder::new()
            .binary(node.path())
            .datadir(dir.path())
            .build(),
    );

    with_timeout(sup.start()).await.unwrap();
    assert!(matches!(
        sup.cleanup().await,
        Err(NodeError::AlreadyRunning)
    ));
    with_timeout(sup.stop(StopOptions::graceful())).await.unwrap();

    assert_eq!(sup.cleanup().await.unwrap(), 0);
    assert!(dir.path().is_dir());
}

#[tokio::test]
async fn failed_first_setup_does_not_wedge_the_datadir() {
    let dir = tempfile::tempdir().unwrap();
    let datadir = dir.path().join("chain");

    let (broken, _log) = supervisor(
        RawNodeConfigBuilder::new()
            .binary(dir.path().join("no-such-geth"))
            .datadir(&datadir)
            .build(),
    );
    let err = with_timeout(broken.start()).await.unwrap_err();
    assert!(
        matches!(err, NodeError::Execution(ExecutionFailure::Spawn { .. })),
        "got {err:?}"
    );
    assert!(datadir.join("genesis.json").is_file());

    let node = FakeNode::new(Behaviour::Healthy);
    let (sup, _log) = supervisor(
        RawNodeConfigBuilder::new()
            .binary(node.path())
            .datadir(&datadir)
            .build(),
    );
    with_timeout(sup.start()).await.unwrap();
    let account = sup.account().expect("account created on retry");
    assert!(datadir.join("keystore").join("account").is_file());
    with_timeout(sup.stop(StopOptions::graceful())).await.unwrap();

    with_timeout(sup.start()).await.unwrap();
    assert_eq!(sup.account(), Some(account));
    with_timeout(sup.stop(StopOptions::graceful())).await.unwrap();
}

#[tokio::test]
async fn target_balance_mines_until_reached() {
    let node = FakeNode::new(Behaviour::Healthy);
    let dir = tempfile::tempdir().unwrap();
    let (sup, log) = supervisor(
        RawNodeConfigBuilder::new()
            .binary(node.path())
            .datadir(dir.path())
            .target_balance(10.0)
            .build(),
    );

    with_timeout(sup.start()).await.unwrap();

    // The fake node's balance grows by 5 per query while mining.
    with_timeout(async {
        while !console_log(dir.path()).iter().any(|c| c == "miner.stop()") {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;

    with_timeout(sup.stop(StopOptions::graceful())).await.unwrap();

    let commands = console_log(dir.path());
    let starts = commands.iter().filter(|c| *c == "miner.start()").count();
    let stops = commands.iter().filter(|c| *c == "miner.stop()").count();
    assert_eq!((starts, stops), (1, 1), "commands: {commands:?}");
    assert!(log.contains("is >= limit (10)"));
}

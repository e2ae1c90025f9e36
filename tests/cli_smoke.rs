use assert_cmd::Command;

#[test]
fn run_completes_a_simple_task() {
    Command::cargo_bin("agentcore")
        .unwrap()
        .args(["run", "go to https://example.com"])
        .assert()
        .success();
}

#[test]
fn replay_reruns_the_persisted_history() {
    Command::cargo_bin("agentcore")
        .unwrap()
        .args(["replay", "go to https://example.com"])
        .assert()
        .success();
}

#[test]
fn missing_task_argument_is_rejected() {
    Command::cargo_bin("agentcore")
        .unwrap()
        .arg("run")
        .assert()
        .failure();
}

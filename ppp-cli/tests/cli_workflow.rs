#![allow(missing_docs, clippy::unwrap_used)]

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const PASSPHRASE: &str = "correct horse battery staple";

fn pppauth() -> Command {
    let mut cmd = Command::cargo_bin("pppauth").unwrap();
    cmd.env_remove("PPP_KEY_DIR").env_remove("RUST_LOG");
    cmd
}

fn mpitool() -> Command {
    let mut cmd = Command::cargo_bin("mpitool").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn passphrase_card_matches_known_passcodes() {
    pppauth()
        .args(["--passphrase", PASSPHRASE, "--name", "example.org", "text", "--card", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("example.org"))
        .stdout(predicate::str::contains("[1]\n    A    B    C    D    E    F    G\n"))
        .stdout(predicate::str::contains(" 1: E6Cw Txid UbeV B3PE x?aX HoaZ hgFe\n"));
}

#[test]
fn single_passcodes_by_id() {
    pppauth()
        .args(["--passphrase", PASSPHRASE, "text", "--passcode", "1A"])
        .assert()
        .failure();
    pppauth()
        .args(["--passphrase", PASSPHRASE, "text", "--passcode", "1A[2]"])
        .assert()
        .success()
        .stdout("LaqU\n");
    pppauth()
        .args(["--passphrase", PASSPHRASE, "--use-version", "1", "text", "--passcode", "1b1"])
        .assert()
        .success()
        .stdout("EgG?\n");
}

#[test]
fn passphrase_next_needs_a_starting_card() {
    pppauth()
        .args(["--passphrase", PASSPHRASE, "text", "--next", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs --card"));
    pppauth()
        .args(["--passphrase", PASSPHRASE, "text", "--next", "2", "--card", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(" 1: LaqU LkAy VZLT ksmu fRBh kHbF +#pX"));
}

#[test]
fn next_is_limited_to_a_hundred_cards() {
    for n in ["0", "101", "4000000000"] {
        pppauth()
            .args(["--passphrase", PASSPHRASE, "text", "--next", n, "--card", "1"])
            .assert()
            .failure();
    }
    pppauth()
        .args(["--passphrase", PASSPHRASE, "text", "--next", "100", "--card", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[100]\n"));
}

#[test]
fn use_version_requires_a_passphrase() {
    let dir = tempdir().unwrap();
    pppauth()
        .arg("--dir")
        .arg(dir.path())
        .args(["--use-version", "1", "status"])
        .assert()
        .failure();
}

#[test]
fn passphrase_login() {
    pppauth()
        .args(["--passphrase", PASSPHRASE, "login"])
        .write_stdin("E6Cw\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Passcode 1A [1]: "));
    pppauth()
        .args(["--passphrase", PASSPHRASE, "login"])
        .write_stdin("E6Cx\n")
        .assert()
        .failure();
}

#[test]
fn html_page_written_to_file() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("cards.html");
    pppauth()
        .args(["--passphrase", PASSPHRASE, "--name", "example.org", "html", "--card", "1", "--output"])
        .arg(&out)
        .assert()
        .success();
    let page = fs::read_to_string(&out).unwrap();
    assert!(page.contains("<div class=\"passcard\">"));
    assert!(page.contains("E6Cw&nbsp;Txid"));
    assert!(page.contains("example.org"));
}

#[test]
fn stored_key_workflow() {
    let dir = tempdir().unwrap();
    let keys = dir.path().join("keys");

    pppauth().arg("--dir").arg(&keys).arg("status").assert().failure();

    pppauth()
        .arg("--dir")
        .arg(&keys)
        .arg("key")
        .assert()
        .success()
        .stdout(predicate::str::contains("New sequence key saved"));
    assert!(keys.join("private_key").exists());
    assert!(keys.join("private_cnt").exists());
    assert!(keys.join("private_gen").exists());

    pppauth()
        .arg("--dir")
        .arg(&keys)
        .arg("key")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    // Nothing printed yet: the user is warned.
    pppauth()
        .arg("--dir")
        .arg(&keys)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Last card printed:      none"))
        .stderr(predicate::str::contains("OUT OF PASSCODES"));

    pppauth()
        .arg("--dir")
        .arg(&keys)
        .args(["--name", "host", "text", "--next", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[1]\n"))
        .stdout(predicate::str::contains("[2]\n"));

    pppauth()
        .arg("--dir")
        .arg(&keys)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Printed passcodes left: 140"))
        .stdout(predicate::str::contains("Last card printed:      2"));

    // Log in with the passcode the key expects.
    let output = pppauth()
        .arg("--dir")
        .arg(&keys)
        .args(["text", "--passcode", "current"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let code = String::from_utf8(output.stdout).unwrap();
    pppauth()
        .arg("--dir")
        .arg(&keys)
        .arg("login")
        .write_stdin(code)
        .assert()
        .success();
    pppauth()
        .arg("--dir")
        .arg(&keys)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Next passcode:          1B [1]"));

    pppauth()
        .arg("--dir")
        .arg(&keys)
        .args(["skip", "--card", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Next passcode is 1A [2]"));
    pppauth()
        .arg("--dir")
        .arg(&keys)
        .args(["skip", "--passcode", "1A[1]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("skip forward"));
}

#[test]
fn failed_login_burns_the_passcode() {
    let dir = tempdir().unwrap();
    pppauth().arg("--dir").arg(dir.path()).arg("key").assert().success();
    pppauth()
        .arg("--dir")
        .arg(dir.path())
        .arg("login")
        .write_stdin("????\n")
        .assert()
        .failure();
    pppauth()
        .arg("--dir")
        .arg(dir.path())
        .arg("status")
        .assert()
        .stdout(predicate::str::contains("Next passcode:          1B [1]"));
}

#[test]
fn dont_skip_keeps_the_passcode() {
    let dir = tempdir().unwrap();
    pppauth()
        .arg("--dir")
        .arg(dir.path())
        .args(["key", "--dont-skip"])
        .assert()
        .success();
    pppauth()
        .arg("--dir")
        .arg(dir.path())
        .arg("login")
        .write_stdin("????\n")
        .assert()
        .failure();
    pppauth()
        .arg("--dir")
        .arg(dir.path())
        .arg("status")
        .assert()
        .stdout(predicate::str::contains("Next passcode:          1A [1]"))
        .stdout(predicate::str::contains("Skip on failed login:   no"));
}

#[test]
fn mpitool_arithmetic() {
    mpitool().args(["exptmod", "4", "13", "497"]).assert().success().stdout("445\n");
    mpitool().args(["invmod", "3", "11"]).assert().success().stdout("4\n");
    mpitool().args(["invmod", "2", "4"]).assert().failure();
    mpitool().args(["gcd", "462", "1071"]).assert().success().stdout("21\n");
    mpitool()
        .args(["--radix", "16", "mul", "0xff", "2"])
        .assert()
        .success()
        .stdout("1FE\n");
    mpitool().args(["mul", "12x", "2"]).assert().failure();
}

#[test]
fn mpitool_primes() {
    mpitool().args(["is-prime", "97"]).assert().success().stdout("probably prime\n");
    mpitool().args(["is-prime", "561"]).assert().success().stdout("composite\n");
    mpitool().args(["make-prime", "90"]).assert().success().stdout("97\n");
    mpitool().args(["make-prime", "20", "--strong"]).assert().success().stdout("23\n");
    mpitool()
        .args(["--radix", "2", "prime-gen", "64", "--count", "2"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^(1[01]{63}\n){2}$").unwrap());
}

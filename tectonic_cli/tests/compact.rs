#![allow(missing_docs)]

use assert_cmd::Command;
use assert_fs::TempDir;
use num_bigint::BigUint;
use tectonic::base::Base;
use tectonic::stream::BinaryWriter;

#[test]
fn aggregates_per_width() {
    let directory = TempDir::new().unwrap();
    let path = directory.path().join("h01l02m03.log");

    // one segment per code
    let mut writer = BinaryWriter::create(&path, Base::new(1, 2, 3).unwrap(), 1).unwrap();
    for value in [5_u32, 300, 300, 5] {
        writer.add(&BigUint::from(value)).unwrap();
    }
    writer.close().unwrap();

    Command::cargo_bin("tectonic")
        .unwrap()
        .arg("compact")
        .arg(&path)
        .assert()
        .success();

    let compacted = directory.path().join("h01l02m03.log.out");
    assert!(compacted.is_file());

    Command::cargo_bin("tectonic")
        .unwrap()
        .args(["read", "--codes"])
        .arg(&compacted)
        .assert()
        .success()
        .stdout("5\n5\n300\n300\n");
}

#[test]
fn explicit_output_path() {
    let directory = TempDir::new().unwrap();
    let path = directory.path().join("h01l02m03.log");
    let output = directory.path().join("tight.log");

    let mut writer = BinaryWriter::create(&path, Base::new(1, 2, 3).unwrap(), 0).unwrap();
    writer.add(&BigUint::from(5_u32)).unwrap();
    writer.close().unwrap();

    Command::cargo_bin("tectonic")
        .unwrap()
        .arg("compact")
        .arg(&path)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    assert!(output.is_file());
}

#[test]
fn refuses_text_streams() {
    let directory = TempDir::new().unwrap();
    let path = directory.path().join("h01l02m03.log");
    std::fs::write(&path, "TECTONIC\x00\n1\n2\n3\n0         \n-1\n").unwrap();

    Command::cargo_bin("tectonic")
        .unwrap()
        .arg("compact")
        .arg(&path)
        .assert()
        .failure();
}

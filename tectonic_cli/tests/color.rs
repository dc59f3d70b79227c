#![allow(missing_docs)]

use assert_cmd::Command;
use assert_fs::TempDir;
use tectonic::base::Base;
use tectonic::codec;
use tectonic::grid::Grid;
use tectonic::stream::BinaryWriter;

fn complete_grid() -> Grid {
    let mut grid = Grid::new(Base::new(2, 2, 4).unwrap());
    for (cell, (value, region)) in grid.cells.iter_mut().zip([(1, 0), (2, 0), (3, 0), (4, 0)]) {
        cell.value = value;
        cell.region = region;
    }
    grid
}

#[test]
fn colorable_codes_stay_silent() {
    let code = codec::encode(&complete_grid()).unwrap();

    Command::cargo_bin("tectonic")
        .unwrap()
        .arg("color")
        .arg(code.to_string())
        .assert()
        .success()
        .stdout("");
}

#[test]
fn streams_are_checked_too() {
    let directory = TempDir::new().unwrap();
    let path = directory.path().join("h02l02m04.log");

    let mut writer = BinaryWriter::create(&path, Base::new(2, 2, 4).unwrap(), 0).unwrap();
    writer.add(&codec::encode(&complete_grid()).unwrap()).unwrap();
    writer.close().unwrap();

    Command::cargo_bin("tectonic")
        .unwrap()
        .args(["color", "--file"])
        .arg(&path)
        .assert()
        .success()
        .stdout("");
}

#[test]
fn unreadable_codes_fail() {
    Command::cargo_bin("tectonic")
        .unwrap()
        .args(["color", "not-a-number"])
        .assert()
        .failure();
}

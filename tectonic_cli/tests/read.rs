#![allow(missing_docs)]

use assert_cmd::Command;
use assert_fs::TempDir;
use num_bigint::BigUint;
use predicates::prelude::*;
use std::path::PathBuf;
use tectonic::base::Base;
use tectonic::codec;
use tectonic::grid::Grid;
use tectonic::stream::BinaryWriter;

fn stream_of(codes: &[BigUint]) -> (TempDir, PathBuf) {
    let directory = TempDir::new().unwrap();
    let path = directory.path().join("h01l02m03.log");

    let mut writer = BinaryWriter::create(&path, Base::new(1, 2, 3).unwrap(), 0).unwrap();
    for code in codes {
        writer.add(code).unwrap();
    }
    writer.close().unwrap();

    (directory, path)
}

fn grid(values_regions: &[(u8, i32)]) -> Grid {
    let mut grid = Grid::new(Base::new(1, 2, 3).unwrap());
    for (cell, &(value, region)) in grid.cells.iter_mut().zip(values_regions) {
        cell.value = value;
        cell.region = region;
    }
    grid
}

#[test]
fn summary() {
    let (_directory, path) = stream_of(&[BigUint::from(5_u32), BigUint::from(300_u32)]);

    Command::cargo_bin("tectonic")
        .unwrap()
        .arg("read")
        .arg(&path)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("height")
                .and(predicate::str::contains("maximum"))
                .and(predicate::str::contains("codes")),
        );
}

#[test]
fn codes() {
    let (_directory, path) = stream_of(&[BigUint::from(5_u32), BigUint::from(300_u32)]);

    Command::cargo_bin("tectonic")
        .unwrap()
        .args(["read", "--codes"])
        .arg(&path)
        .assert()
        .success()
        .stdout("5\n300\n");
}

#[test]
fn blocks() {
    let (_directory, path) = stream_of(&[BigUint::from(5_u32), BigUint::from(300_u32)]);

    Command::cargo_bin("tectonic")
        .unwrap()
        .args(["read", "--blocks"])
        .arg(&path)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("segment")
                .and(predicate::str::contains("0x00000010")),
        );
}

#[test]
fn grids() {
    let complete = grid(&[(1, 0), (2, 0)]);
    let (_directory, path) = stream_of(&[codec::encode(&complete).unwrap()]);

    Command::cargo_bin("tectonic")
        .unwrap()
        .args(["read", "--grids"])
        .arg(&path)
        .assert()
        .success()
        .stdout("+-+-+\n|1 2|\n+-+-+\n\n");
}

#[test]
fn normal() {
    let normal = grid(&[(1, 0), (2, 1)]);
    let swapped = grid(&[(1, 1), (2, 0)]);
    let codes = [
        codec::encode(&normal).unwrap(),
        codec::encode(&swapped).unwrap(),
    ];
    let (_directory, path) = stream_of(&codes);

    Command::cargo_bin("tectonic")
        .unwrap()
        .args(["read", "--normal"])
        .arg(&path)
        .assert()
        .success()
        .stdout(format!("{}\n", codes[1]));
}

#[test]
fn exclusive_flags() {
    let (_directory, path) = stream_of(&[]);

    Command::cargo_bin("tectonic")
        .unwrap()
        .args(["read", "--codes", "--grids"])
        .arg(&path)
        .assert()
        .failure();
}

#[test]
fn missing_file_fails() {
    Command::cargo_bin("tectonic")
        .unwrap()
        .args(["read", "no-such-file.log"])
        .assert()
        .failure();
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use citymodel_height::{BatchRunner, HeightChangeOptions, HeightMode, StreamingPipeline};
use citymodel_jsonl::JsonlFormat;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

fn write(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn header(lower_z: f64, upper_z: f64) -> String {
    format!(
        r#"{{"type":"CityModel","version":"3.0","srsName":"EPSG:25833","boundedBy":{{"lowerCorner":[0.0,0.0,{lower_z:.1}],"upperCorner":[100.0,100.0,{upper_z:.1}]}}}}"#
    )
}

/// Building with one part and a wall surface nested inside the part
fn nested_building(id: &str, z: f64) -> String {
    format!(
        r#"{{"type":"Building","id":"{id}","function":"residential","geometry":[{{"type":"MultiSurface","lod":"2","rings":[[[0.0,0.0,{z:.1}],[1.0,0.0,{z:.1}],[1.0,1.0,{top:.1}]]]}}],"children":[{{"type":"BuildingPart","id":"{id}-p","geometry":[{{"type":"Solid","rings":[[[2.0,2.0,{z:.1}]]]}}],"children":[{{"type":"WallSurface","id":"{id}-w","geometry":[{{"type":"MultiSurface","rings":[[[3.0,3.0,{top:.1}]]]}}]}}]}}]}}"#,
        top = z + 10.0
    )
}

fn z_values(value: &Value, out: &mut Vec<f64>) {
    if let Some(geometry) = value["geometry"].as_array() {
        for g in geometry {
            for ring in g["rings"].as_array().into_iter().flatten() {
                for coord in ring.as_array().into_iter().flatten() {
                    out.push(coord[2].as_f64().unwrap());
                }
            }
        }
    }
    if let Some(children) = value["children"].as_array() {
        for child in children {
            z_values(child, out);
        }
    }
}

fn read(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn relative_shift_applies_once_to_every_nested_coordinate() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(
        dir.path(),
        "district.jsonl",
        &[header(12.5, 40.0), nested_building("b1", 12.5), nested_building("b2", 20.0)],
    );
    let output = dir.path().join("out.jsonl");

    let format = JsonlFormat::new();
    let summary = StreamingPipeline::new(&format, HeightChangeOptions::new(-2.25))
        .run(&input, &output)
        .unwrap();
    assert_eq!(summary.features_changed, 2);
    assert_eq!(summary.coordinates, 10);

    let before = read(&input);
    let after = read(&output);
    assert_eq!(before.len(), after.len());

    for (b, a) in before.iter().zip(&after).skip(1) {
        let (mut zb, mut za) = (Vec::new(), Vec::new());
        z_values(b, &mut zb);
        z_values(a, &mut za);
        assert_eq!(zb.len(), za.len());
        for (zb, za) in zb.iter().zip(&za) {
            assert_relative_eq!(*za, zb - 2.25);
        }
        // Attributes survive untouched
        assert_eq!(a["function"], b["function"]);
    }

    assert_eq!(after[0]["srsName"], "EPSG:25833");
    assert_relative_eq!(after[0]["boundedBy"]["lowerCorner"][2].as_f64().unwrap(), 10.25);
    assert_relative_eq!(after[0]["boundedBy"]["upperCorner"][2].as_f64().unwrap(), 37.75);
}

#[test]
fn absolute_with_original_lower_height_is_identity() {
    let dir = tempfile::tempdir().unwrap();
    let lines = [header(33.0, 60.0), nested_building("b1", 33.0)];
    let input = write(dir.path(), "tile.cityjsonl", &lines);

    let format = JsonlFormat::new();
    let options = HeightChangeOptions::new(33.0).with_mode(HeightMode::Absolute);
    let report = BatchRunner::new(&format, options).run(&[input.clone()]);
    assert_eq!(report.exit_code(), 0);

    let output = dir.path().join("tile_adapted-height.cityjsonl");
    let after = read(&output);
    assert_eq!(after, read(&input));
}

#[test]
fn output_dir_receives_results() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "tile.jsonl", &[header(0.0, 1.0), nested_building("b1", 0.0)]);

    let format = JsonlFormat::new();
    let options = HeightChangeOptions::new(1.0).with_output_dir(Some(out_dir.path().to_path_buf()));
    let report = BatchRunner::new(&format, options).run(&[input]);

    assert!(!report.has_failures());
    assert!(out_dir.path().join("tile_adapted-height.jsonl").exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

/// Feature whose only geometry sits `levels` child levels below the root
fn deep_feature(id: &str, levels: usize, z: f64) -> String {
    let mut feature = format!(
        r#"{{"id":"{id}-leaf","type":"BuildingPart","geometry":[{{"type":"Solid","rings":[[[0.0,0.0,{z:.1}]]]}}]}}"#
    );
    for level in (0..levels).rev() {
        feature = format!(r#"{{"id":"{id}-{level}","type":"BuildingPart","children":[{feature}]}}"#);
    }
    feature
}

#[test]
fn deeply_nested_features_do_not_fail_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let too_deep_to_decode = deep_feature("d70", 70, 1.0);
    let beyond_depth_limit = deep_feature("d50", 50, 1.0);
    let input = write(
        dir.path(),
        "deep.jsonl",
        &[
            header(0.0, 10.0),
            too_deep_to_decode.clone(),
            beyond_depth_limit.clone(),
            nested_building("b2", 5.0),
        ],
    );
    let output = dir.path().join("out.jsonl");

    let format = JsonlFormat::new();
    let summary = StreamingPipeline::new(&format, HeightChangeOptions::new(1.0))
        .run(&input, &output)
        .unwrap();
    assert_eq!(summary.features_passed_through, 2);
    assert_eq!(summary.features_changed, 1);

    let text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1], too_deep_to_decode);

    let unchanged: Value = serde_json::from_str(lines[2]).unwrap();
    assert_eq!(unchanged, serde_json::from_str::<Value>(&beyond_depth_limit).unwrap());

    let b2: Value = serde_json::from_str(lines[3]).unwrap();
    let mut zs = Vec::new();
    z_values(&b2, &mut zs);
    assert_eq!(zs, vec![6.0, 6.0, 16.0, 6.0, 16.0]);
}

#[test]
fn malformed_implicit_geometry_passes_through_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let malformed = r#"{"id":"t1","type":"SolitaryVegetationObject","geometry":[{"type":"ImplicitGeometry","template":"oak","referencePoint":[1.0,2.0,3.0],"transformationMatrix":[1,0,0,0,0,1,0,0,0,0,1,0]}]}"#;
    let input = write(
        dir.path(),
        "trees.jsonl",
        &[header(0.0, 10.0), malformed.to_string(), nested_building("b1", 1.0)],
    );
    let output = dir.path().join("out.jsonl");

    let format = JsonlFormat::new();
    let summary = StreamingPipeline::new(&format, HeightChangeOptions::new(10.0))
        .run(&input, &output)
        .unwrap();
    assert_eq!(summary.features_passed_through, 1);
    assert_eq!(summary.features_changed, 1);
    assert_eq!(summary.implicit_geometries, 0);

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(text.lines().nth(1), Some(malformed));
}

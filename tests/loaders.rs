use std::fs;

use rusty_fold::data::{load_file, write_parquet, Cell, Column, Extension, HeaderValue};
use rusty_fold::{EffectiveArea, ResponseError, ResponseMatrix, Spectrum};
use tempfile::tempdir;

const RMF_JSON: &str = r#"{
  "extensions": [
    {
      "name": "SPECRESP MATRIX",
      "header": { "DETCHANS": 6, "TLMIN4": 1, "CHANTYPE": "PI" },
      "columns": [
        { "name": "ENERG_LO", "unit": "keV", "data": [1.0, 2.0, 3.0] },
        { "name": "ENERG_HI", "unit": "keV", "data": [2.0, 3.0, 4.0] },
        { "name": "N_GRP", "data": [1, 2, 0] },
        { "name": "F_CHAN", "data": [1, [2, 5], []] },
        { "name": "N_CHAN", "data": [2, [1, 2], []] },
        { "name": "MATRIX", "data": [[0.5, 0.5], [0.2, 0.3, 0.5], []] }
      ]
    },
    {
      "name": "EBOUNDS",
      "columns": [
        { "name": "E_MIN", "unit": "keV", "data": [0.5, 1.0, 1.5, 2.0, 2.5, 3.0] },
        { "name": "E_MAX", "unit": "keV", "data": [1.0, 1.5, 2.0, 2.5, 3.0, 3.5] }
      ]
    }
  ]
}"#;

#[test]
fn json_matrix_with_legacy_name_decodes_and_folds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("resp.json");
    fs::write(&path, RMF_JSON).unwrap();

    let rmf = ResponseMatrix::from_table(&load_file(&path).unwrap()).unwrap();
    assert_eq!(rmf.groups_per_bin(), &[1, 2, 0]);
    assert_eq!(rmf.group_first_channel(), &[1, 2, 5]);
    assert_eq!(rmf.group_channel_count(), &[2, 1, 2]);
    assert_eq!(rmf.detector_channels(), 6);
    assert!(rmf.channel_bounds().is_some());

    let counts = rmf.apply_rmf(&[2.0, 10.0, 7.0]).unwrap();
    assert_eq!(counts, vec![1.0, 3.0, 0.0, 0.0, 3.0, 5.0]);
}

#[test]
fn csv_effective_area_reads_cards_and_units() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("arf.csv");
    fs::write(
        &path,
        "# EXTNAME = SPECRESP\n\
         # EXPOSURE = 1e4\n\
         ENERG_LO [keV],ENERG_HI [keV],SPECRESP [cm**2]\n\
         0.3,0.4,12.5\n\
         0.4,0.5,14.0\n",
    )
    .unwrap();

    let arf = EffectiveArea::from_table(&load_file(&path).unwrap()).unwrap();
    assert_eq!(arf.energy_unit.as_deref(), Some("keV"));
    assert_eq!(arf.exposure_seconds, Some(1e4));
    assert_eq!(arf.response_values, vec![12.5, 14.0]);
    assert_eq!(
        arf.apply_arf(&[1.0, 2.0], None).unwrap(),
        vec![125_000.0, 280_000.0]
    );
}

#[test]
fn csv_matrix_with_semicolon_groups() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rmf.csv");
    fs::write(
        &path,
        "# EXTNAME = MATRIX\n\
         # DETCHANS = 4\n\
         # TLMIN4 = 0\n\
         ENERG_LO [keV],ENERG_HI [keV],N_GRP,F_CHAN,N_CHAN,MATRIX\n\
         1.0,2.0,1,0,2,0.5;0.5\n\
         2.0,3.0,2,0;3,1;1,0.25;0.75\n",
    )
    .unwrap();

    let rmf = ResponseMatrix::from_table(&load_file(&path).unwrap()).unwrap();
    assert_eq!(rmf.channel_offset(), 0);
    assert_eq!(rmf.apply_rmf(&[2.0, 4.0]).unwrap(), vec![2.0, 1.0, 0.0, 3.0]);
}

#[test]
fn parquet_round_trip_keeps_header_units_and_groups() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rmf.parquet");

    let ext = Extension::new("MATRIX")
        .with_keyword("DETCHANS", HeaderValue::Integer(6))
        .with_keyword("TLMIN4", HeaderValue::Integer(1))
        .with_column(Column::scalars("ENERG_LO", Some("keV"), &[1.0, 2.0]))
        .with_column(Column::scalars("ENERG_HI", Some("keV"), &[2.0, 3.0]))
        .with_column(Column::scalars("N_GRP", None, &[1.0, 2.0]))
        .with_column(Column::new(
            "F_CHAN",
            None,
            vec![Cell::Array(vec![1.0]), Cell::Array(vec![3.0, 6.0])],
        ))
        .with_column(Column::new(
            "N_CHAN",
            None,
            vec![Cell::Array(vec![2.0]), Cell::Array(vec![2.0, 1.0])],
        ))
        .with_column(Column::new(
            "MATRIX",
            None,
            vec![
                Cell::Array(vec![0.5, 0.5]),
                Cell::Array(vec![0.4, 0.4, 0.2]),
            ],
        ));
    write_parquet(&path, &ext).unwrap();

    let file = load_file(&path).unwrap();
    let loaded = file.extension("MATRIX").unwrap();
    assert_eq!(loaded.keyword_i64("DETCHANS").unwrap(), 6);
    assert_eq!(loaded.column("ENERG_LO").unwrap().unit.as_deref(), Some("keV"));

    let rmf = ResponseMatrix::from_table(&file).unwrap();
    assert_eq!(rmf.energy_unit(), Some("keV"));
    assert_eq!(
        rmf.apply_rmf(&[2.0, 5.0]).unwrap(),
        vec![1.0, 1.0, 2.0, 2.0, 0.0, 1.0]
    );
}

#[test]
fn spectrum_falls_back_to_first_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("src.json");
    fs::write(
        &path,
        r#"{"extensions": [{
            "name": "",
            "header": { "EXPOSURE": 500.0, "RESPFILE": "a.rmf" },
            "columns": [
                { "name": "BIN_LO", "unit": "angs", "data": [1.0, 2.0] },
                { "name": "BIN_HI", "unit": "angs", "data": [2.0, 3.0] },
                { "name": "COUNTS", "data": [4, 9] }
            ]
        }]}"#,
    )
    .unwrap();

    let spec = Spectrum::from_table(&load_file(&path).unwrap()).unwrap();
    assert_eq!(spec.exposure_seconds, 500.0);
    assert_eq!(spec.respfile.as_deref(), Some("a.rmf"));
    assert_eq!(spec.ancrfile, None);
    assert_eq!(spec.counts, vec![4.0, 9.0]);
}

#[test]
fn missing_matrix_extension_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("arf.json");
    fs::write(&path, r#"{"extensions": [{"name": "SPECRESP"}]}"#).unwrap();

    let err = ResponseMatrix::from_table(&load_file(&path).unwrap()).unwrap_err();
    assert_eq!(
        err,
        ResponseError::MissingExtension {
            tried: vec!["MATRIX".into(), "SPECRESP MATRIX".into()]
        }
    );
}

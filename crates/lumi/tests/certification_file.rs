use std::io::Write;
use tnp_lumi::{read_certification_file, LumiMask, LumiRange, MalformedCertification};


#[test]
fn load_mask_from_golden_json() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, r#"{{"360390": [[1, 5], [8, 12]], "360391": [[1, 100]]}}"#)?;

    let doc = read_certification_file(file.path())?;
    assert_eq!(doc[&360390], vec![LumiRange::new(1, 5), LumiRange::new(8, 12)]);

    let mask = LumiMask::from_json_file(file.path())?;
    assert_eq!(mask.runs(), vec![360390, 360391]);
    assert_eq!(
        mask.classify(&[360390, 360390, 360391, 360392], &[6, 8, 100, 1])?,
        vec![false, true, true, false]
    );
    Ok(())
}


#[test]
fn malformed_file_names_run_and_pair() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, r#"{{"360390": [[1, 5], [12, 8]]}}"#)?;

    let err = LumiMask::from_json_file(file.path()).unwrap_err();
    let malformed = err.downcast_ref::<MalformedCertification>().unwrap();
    assert_eq!(malformed.run, 360390);
    assert_eq!((malformed.first, malformed.last), (12, 8));
    Ok(())
}


#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = LumiMask::from_json_file(dir.path().join("golden.json")).unwrap_err();
    assert!(err.to_string().contains("failed to open certification file"));
}

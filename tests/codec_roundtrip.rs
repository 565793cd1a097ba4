use wavesculpt::{create_new_file, open_file, write_file_as};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn temp_path(name: &str) -> std::path::PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("wavesculpt_test_{}_{}.wav", std::process::id(), name));
    p
}

#[test]
fn new_file_round_trips_through_write_and_open() {
    init();
    let (info, mut editor) = create_new_file(1, 44_100, 2).expect("CreateNewFile");
    let path = temp_path("roundtrip");

    write_file_as(&info, &path, &mut editor).expect("WriteFileAs");

    let ((reopened, _reopened_editor), warnings) = open_file(&path).expect("OpenFile");
    assert_eq!(reopened.format.sample_rate, 44_100);
    assert_eq!(reopened.format.channel_count, 1);
    assert_eq!(reopened.format.bits_per_sample, 16);
    assert_eq!(reopened.sample_length, 44_100);
    assert!(warnings.is_empty());

    std::fs::remove_file(&path).ok();
}

#[test]
fn mono_new_file_has_single_editable_channel() {
    let (info, editor) = create_new_file(1, 8_000, 1).expect("CreateNewFile");
    assert_eq!(info.format.channel_count, 1);
    let names = editor.channel_names();
    assert_eq!(names, vec![("mono".to_string(), true)]);
}

#[test]
fn create_new_file_rejects_bit_depth_out_of_range() {
    assert!(create_new_file(1, 44_100, 0).is_err());
}

#[test]
fn write_then_reopen_preserves_cue_free_layout() {
    let (info, mut editor) = create_new_file(1, 48_000, 1).expect("CreateNewFile");
    let path = temp_path("cuefree");
    write_file_as(&info, &path, &mut editor).expect("WriteFileAs");

    let ((reopened, _), _) = open_file(&path).expect("OpenFile");
    assert!(reopened.cues.is_empty());

    std::fs::remove_file(&path).ok();
}

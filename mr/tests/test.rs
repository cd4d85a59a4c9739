use std::collections::HashMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use mr::codec::read_shard;
use mr::hash::{ihash, shard_for};
use mr::naming::{DirectoryNaming, ShardNaming};
use mr::{KeyValue, KeyValues, MapError, MapTask, OutputMode, Worker};
use rand::{distributions::Alphanumeric, Rng};

fn n(v: usize) -> NonZeroUsize {
    NonZeroUsize::new(v).unwrap()
}

fn word_count(_name: &str, contents: &str) -> anyhow::Result<Vec<KeyValue>> {
    Ok(contents
        .split_whitespace()
        .map(|word| KeyValue::new(word, "1"))
        .collect())
}

// key: line no, value: line content
fn lines(_name: &str, contents: &str) -> anyhow::Result<Vec<KeyValue>> {
    Ok(contents
        .lines()
        .enumerate()
        .map(|(i, line)| KeyValue::new((i + 1).to_string(), line))
        .collect())
}

fn failing(name: &str, _contents: &str) -> anyhow::Result<Vec<KeyValue>> {
    anyhow::bail!("cannot parse {}", name)
}

fn load(path: &Path) -> Vec<KeyValue> {
    read_shard(path)
        .unwrap()
        .collect::<std::io::Result<Vec<_>>>()
        .unwrap()
}

fn write_input(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("input.txt");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_word_count_example() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "a b a");
    let naming = DirectoryNaming::new(dir.path());
    let worker = Worker::new(word_count).with_naming(naming.clone());

    let output = worker.do_map(&MapTask::new("job1", 0, &input, n(2))).unwrap();
    assert_eq!(output.files.len(), 2);
    assert_eq!(output.files[0], dir.path().join("mrtmp.job1-0-0"));
    assert_eq!(output.files[1], dir.path().join("mrtmp.job1-0-1"));
    assert_eq!(output.total_records(), 3);

    let shard_a = shard_for("a", n(2));
    let shard_b = shard_for("b", n(2));
    assert_eq!((shard_a, shard_b), (0, 1));

    let a_shard = load(&naming.name_for("job1", 0, shard_a));
    assert_eq!(a_shard, vec![KeyValue::new("a", "1"), KeyValue::new("a", "1")]);
    let b_shard = load(&naming.name_for("job1", 0, shard_b));
    assert_eq!(b_shard, vec![KeyValue::new("b", "1")]);
}

#[test]
fn test_every_record_lands_in_its_shard_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = rand::thread_rng();
    let mut text = String::new();
    for _ in 0..500 {
        let len = rng.gen_range(1..6);
        let word: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect();
        text.push_str(&word);
        text.push(' ');
    }
    let input = write_input(dir.path(), &text);
    let worker = Worker::new(word_count).with_naming(DirectoryNaming::new(dir.path()));

    let output = worker.do_map(&MapTask::new("rand", 7, &input, n(5))).unwrap();

    let mut expected: HashMap<String, usize> = HashMap::new();
    for word in text.split_whitespace() {
        *expected.entry(word.to_string()).or_default() += 1;
    }
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (shard, file) in output.files.iter().enumerate() {
        let records = load(file);
        assert_eq!(records.len(), output.records[shard]);
        for kv in records {
            assert_eq!(shard_for(&kv.key, n(5)), shard);
            assert_eq!(kv.value, "1");
            *seen.entry(kv.key).or_default() += 1;
        }
    }
    assert_eq!(seen, expected);
}

#[test]
fn test_colliding_keys_share_a_shard() {
    let dir = tempfile::tempdir().unwrap();
    // "hello" and "world" hash to the same shard mod 3
    assert_eq!(ihash("hello") % 3, ihash("world") % 3);
    let input = write_input(dir.path(), "hello world");
    let worker = Worker::new(word_count).with_naming(DirectoryNaming::new(dir.path()));

    let output = worker.do_map(&MapTask::new("c", 0, &input, n(3))).unwrap();
    let shard = shard_for("hello", n(3));
    assert_eq!(
        load(&output.files[shard]),
        vec![KeyValue::new("hello", "1"), KeyValue::new("world", "1")]
    );
}

#[test]
fn test_single_reduce_shard_gets_everything() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "first line\nsecond line\n\nfourth \"quoted\" line");
    let worker = Worker::new(lines).with_naming(DirectoryNaming::new(dir.path()));

    let output = worker.do_map(&MapTask::new("one", 0, &input, n(1))).unwrap();
    assert_eq!(output.files.len(), 1);
    assert_eq!(
        load(&output.files[0]),
        vec![
            KeyValue::new("1", "first line"),
            KeyValue::new("2", "second line"),
            KeyValue::new("3", ""),
            KeyValue::new("4", "fourth \"quoted\" line"),
        ]
    );
}

#[test]
fn test_empty_input_still_creates_every_shard() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "");
    let naming = DirectoryNaming::new(dir.path().join("out"));
    let worker = Worker::new(word_count).with_naming(naming.clone());

    let output = worker.do_map(&MapTask::new("empty", 3, &input, n(4))).unwrap();
    assert_eq!(output.records, vec![0, 0, 0, 0]);
    for shard in 0..4 {
        let path = naming.name_for("empty", 3, shard);
        assert!(path.is_file());
        assert!(load(&path).is_empty());
    }
}

#[test]
fn test_grouped_mode() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "b a c a b a");
    let worker = Worker::new(word_count)
        .with_naming(DirectoryNaming::new(dir.path()))
        .with_output_mode(OutputMode::Grouped);

    let output = worker.do_map(&MapTask::new("g", 0, &input, n(1))).unwrap();
    assert_eq!(output.records, vec![3]);
    let groups: Vec<KeyValues> = read_shard(&output.files[0])
        .unwrap()
        .collect::<std::io::Result<_>>()
        .unwrap();
    assert_eq!(
        groups,
        vec![
            KeyValues {
                key: "a".to_string(),
                values: vec!["1".to_string(); 3],
            },
            KeyValues {
                key: "b".to_string(),
                values: vec!["1".to_string(); 2],
            },
            KeyValues {
                key: "c".to_string(),
                values: vec!["1".to_string()],
            },
        ]
    );
}

#[test]
fn test_grouped_mode_with_key_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "a b c a");
    let worker = Worker::new(word_count)
        .with_naming(DirectoryNaming::new(dir.path()))
        .with_output_mode(OutputMode::Grouped)
        .with_key_order(|a, b| b.cmp(a));

    let output = worker.do_map(&MapTask::new("g", 1, &input, n(1))).unwrap();
    let keys: Vec<String> = read_shard::<KeyValues>(&output.files[0])
        .unwrap()
        .map(|g| g.unwrap().key)
        .collect();
    assert_eq!(keys, vec!["c", "b", "a"]);
}

#[test]
fn test_missing_input_is_input_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let worker = Worker::new(word_count).with_naming(DirectoryNaming::new(dir.path()));

    let err = worker
        .do_map(&MapTask::new("job", 0, dir.path().join("nope.txt"), n(2)))
        .unwrap_err();
    assert!(matches!(err, MapError::InputRead { .. }));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_map_function_failure_is_propagated() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "a b");
    let worker = Worker::new(failing).with_naming(DirectoryNaming::new(dir.path().join("out")));

    let err = worker.do_map(&MapTask::new("job", 0, &input, n(2))).unwrap_err();
    match err {
        MapError::MapFunction { input: path, source } => {
            assert_eq!(path, input);
            assert!(source.to_string().starts_with("cannot parse"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_unwritable_output_is_output_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "a b");
    // a regular file where the output directory should be
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let worker = Worker::new(word_count).with_naming(DirectoryNaming::new(blocker.join("out")));

    let err = worker.do_map(&MapTask::new("job", 0, &input, n(2))).unwrap_err();
    assert!(matches!(err, MapError::OutputWrite { .. }));
}

#[test]
fn test_rerun_replaces_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let naming = DirectoryNaming::new(dir.path().join("out"));
    let worker = Worker::new(word_count).with_naming(naming.clone());

    let input = write_input(dir.path(), "a a a a");
    worker.do_map(&MapTask::new("job", 0, &input, n(1))).unwrap();
    let input = write_input(dir.path(), "b");
    worker.do_map(&MapTask::new("job", 0, &input, n(1))).unwrap();

    assert_eq!(
        load(&naming.name_for("job", 0, 0)),
        vec![KeyValue::new("b", "1")]
    );
}

#[test]
fn test_rename_failure_fails_the_task() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "a b a");
    let out = dir.path().join("out");
    let naming = DirectoryNaming::new(&out);
    // shard 1's final name is taken by a non-empty directory, so its rename fails
    let blocked = naming.name_for("job", 0, 1);
    fs::create_dir_all(&blocked).unwrap();
    fs::write(blocked.join("keep"), "").unwrap();
    let worker = Worker::new(word_count).with_naming(naming.clone());

    let err = worker.do_map(&MapTask::new("job", 0, &input, n(2))).unwrap_err();
    match err {
        MapError::OutputWrite { path, .. } => assert_eq!(path, blocked),
        other => panic!("unexpected error: {:?}", other),
    }

    // no staged file survives the failed task
    let leftovers: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty(), "staged files left: {:?}", leftovers);

    // shards renamed before the failure stay in place; the task as a whole
    // is only complete once do_map returns Ok
    assert_eq!(
        load(&naming.name_for("job", 0, 0)),
        vec![KeyValue::new("a", "1"), KeyValue::new("a", "1")]
    );
    assert!(blocked.join("keep").is_file());
}

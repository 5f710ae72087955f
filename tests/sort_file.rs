use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use rstest::*;

use line_sort::{LineSorterBuilder, SortError};

#[fixture]
fn tmp_dir() -> tempfile::TempDir {
    tempfile::tempdir_in("./").unwrap()
}

fn random_lines(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    let alphabet: Vec<char> = "abcxyzABC019 ёжЯ".chars().collect();

    (0..count)
        .map(|_| {
            let len = rng.gen_range(0..12);
            (0..len).map(|_| *alphabet.choose(&mut rng).unwrap()).collect()
        })
        .collect()
}

fn count_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for line in lines {
        *counts.entry(line).or_insert(0) += 1;
    }
    counts
}

fn work_dir_entries(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

#[rstest]
#[case(16, false)]
#[case(256, false)]
#[case(4096, true)]
#[case(1 << 20, true)]
fn test_sorted_permutation(tmp_dir: tempfile::TempDir, #[case] chunk_size: u64, #[case] dedup: bool) {
    let work_root = tmp_dir.path().join("work");
    fs::create_dir(&work_root).unwrap();
    let input = tmp_dir.path().join("input.txt");
    let output = tmp_dir.path().join("output.txt");

    let lines = random_lines(2000);
    fs::write(&input, lines.join("\n") + "\n").unwrap();

    let sorter = LineSorterBuilder::new()
        .with_tmp_dir(&work_root)
        .with_chunk_size(chunk_size)
        .with_rw_buf_size(512)
        .with_flush_threshold(1024)
        .with_dedup(dedup)
        .build();
    let stats = sorter.sort_file(&input, &output).unwrap();

    let content = fs::read_to_string(&output).unwrap();
    let sorted: Vec<&str> = content.lines().collect();

    assert!(sorted.windows(2).all(|pair| pair[0] <= pair[1]));
    if dedup {
        assert!(sorted.windows(2).all(|pair| pair[0] != pair[1]));
    }

    let expected = count_lines(lines.iter().map(String::as_str).filter(|line| !line.trim().is_empty()));
    let actual = count_lines(sorted.iter().copied());
    if dedup {
        let mut expected_keys: Vec<&str> = expected.keys().copied().collect();
        expected_keys.sort();
        assert_eq!(sorted, expected_keys);
    } else {
        assert_eq!(actual, expected);
    }

    assert_eq!(stats.lines_read, 2000);
    assert_eq!(stats.lines_written, sorted.len() as u64);
    assert_eq!(work_dir_entries(&work_root), 0);
}

#[rstest]
fn test_empty_file(tmp_dir: tempfile::TempDir) {
    let input = tmp_dir.path().join("input.txt");
    let output = tmp_dir.path().join("output.txt");
    fs::write(&input, "").unwrap();

    let stats = LineSorterBuilder::new()
        .with_tmp_dir(tmp_dir.path())
        .build()
        .sort_file(&input, &output)
        .unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "");
    assert_eq!(stats.chunks, 0);
    assert_eq!(stats.lines_written, 0);
}

#[rstest]
fn test_failure_keeps_destination(tmp_dir: tempfile::TempDir) {
    let work_root = tmp_dir.path().join("work");
    fs::create_dir(&work_root).unwrap();
    let input = tmp_dir.path().join("input.txt");
    let output = tmp_dir.path().join("output.txt");

    let mut data = b"zeta\nalpha\nomega\n".to_vec();
    data.extend_from_slice(b"\xc3\x28\n");
    fs::write(&input, &data).unwrap();
    fs::write(&output, "previous\n").unwrap();

    let result = LineSorterBuilder::new()
        .with_tmp_dir(&work_root)
        .with_chunk_size(5)
        .build()
        .sort_file(&input, &output);

    assert!(matches!(result, Err(SortError::Input(_))));
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous\n");
    assert_eq!(work_dir_entries(&work_root), 0);
    assert_eq!(work_dir_entries(tmp_dir.path()), 3);
}

#[rstest]
fn test_missing_input(tmp_dir: tempfile::TempDir) {
    let input = tmp_dir.path().join("absent.txt");
    let output = tmp_dir.path().join("output.txt");

    let err = LineSorterBuilder::new()
        .with_tmp_dir(tmp_dir.path())
        .build()
        .sort_file(&input, &output)
        .unwrap_err();

    assert!(matches!(err, SortError::InputMissing(_)));
    assert!(err.to_string().contains("absent.txt"));
    assert_eq!(work_dir_entries(tmp_dir.path()), 0);
}

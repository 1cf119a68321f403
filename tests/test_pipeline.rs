use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wordfreq::{batch, discover, FrequencyTable, PipelineBuilder, RankedEntry, WordDistribution};

fn write_files(dir: &TempDir, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, content)| {
            let path = dir.path().join(name);
            fs::write(&path, content).expect("write fixture");
            path
        })
        .collect()
}

fn run(paths: &[PathBuf]) -> WordDistribution {
    PipelineBuilder::new()
        .build()
        .expect("Pipeline build failed")
        .run(paths)
        .expect("Pipeline run failed")
}

fn assert_consistent(table: &FrequencyTable) {
    let sum: u64 = table.iter().map(|(_, count)| count).sum();
    assert_eq!(sum, table.total());
}

#[test]
fn test_two_file_scenario() {
    let dir = TempDir::new().unwrap();
    write_files(&dir, &[("a.txt", "cat dog\n"), ("b.txt", "cat\n")]);

    let dist = run(&discover::txt_files(dir.path()));

    assert_eq!(dist.total(), 3);
    assert_eq!(dist.table.distinct(), 2);
    assert_eq!(
        dist.ranked,
        vec![
            RankedEntry {
                word: "CAT".into(),
                count: 2
            },
            RankedEntry {
                word: "DOG".into(),
                count: 1
            },
        ]
    );
}

#[test]
fn test_empty_directory_terminates() {
    let dir = TempDir::new().unwrap();
    let paths = discover::txt_files(dir.path());
    assert!(paths.is_empty());

    let dist = run(&paths);
    assert_eq!(dist.total(), 0);
    assert!(dist.table.is_empty());
    assert!(wordfreq::chart_values(&dist.ranked, dist.total(), 21).is_empty());
}

#[test]
fn test_punctuation_and_case() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[("greeting.txt", "Hello, world!\nHELLO   hello.\n   \n\n")]);

    let dist = run(&paths);
    assert_eq!(dist.table.get("HELLO"), Some(3));
    assert_eq!(dist.table.get("WORLD"), Some(1));
    assert_eq!(dist.total(), 4);
}

#[test]
fn test_many_files_with_tiny_queues() {
    let dir = TempDir::new().unwrap();
    let files: Vec<(String, String)> = (0..32)
        .map(|i| {
            let body = (0..200).map(|n| format!("w{} shared\n", n % 7)).collect::<String>();
            (format!("book{i:02}.txt"), body)
        })
        .collect();
    let refs: Vec<(&str, &str)> = files.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();
    let paths = write_files(&dir, &refs);

    // Capacity 1 on both queues forces every hand-off through backpressure.
    let dist = PipelineBuilder::new()
        .line_capacity(1)
        .token_capacity(1)
        .build()
        .unwrap()
        .run(&paths)
        .unwrap();

    assert_eq!(dist.total(), 32 * 200 * 2);
    assert_eq!(dist.table.get("SHARED"), Some(32 * 200));
    assert_eq!(dist.files.read, 32);
    assert_consistent(&dist.table);
    assert_eq!(dist.stages[0].metrics.emitted, 32 * 200);
}

#[test]
fn test_hundreds_of_sources_on_single_slot_queues_finish_quickly() {
    let dir = TempDir::new().unwrap();
    let files: Vec<(String, String)> = (0..500)
        .map(|i| (format!("book{i:03}.txt"), format!("alpha beta{}\n", i % 3)))
        .collect();
    let refs: Vec<(&str, &str)> = files.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();
    let paths = write_files(&dir, &refs);

    // Every source parks on the one free slot at once.
    let started = Instant::now();
    let dist = PipelineBuilder::new()
        .line_capacity(1)
        .token_capacity(1)
        .build()
        .unwrap()
        .run(&paths)
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(dist.total(), 1000);
    assert_eq!(dist.table.get("ALPHA"), Some(500));
    assert_eq!(dist.files.read, 500);
    assert_eq!(dist.table, batch::count_word_dist(&paths).table);
    assert!(
        elapsed < Duration::from_secs(10),
        "500 sources at capacity 1 took {elapsed:?}"
    );
}

#[test]
fn test_repeated_runs_agree() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(
        &dir,
        &[
            ("a.txt", "the quick brown fox\njumps over the lazy dog\n"),
            ("b.txt", "The dog sleeps; the fox runs!\n"),
            ("c.txt", "no trailing newline here"),
        ],
    );

    let first = run(&paths);
    for _ in 0..5 {
        let again = run(&paths);
        assert_eq!(again.table, first.table);
        assert_eq!(again.total(), first.total());
    }
}

#[test]
fn test_pipeline_matches_batch() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(
        &dir,
        &[
            ("a.txt", "It's a truth, universally acknowledged.\r\nA truth!\r\n"),
            ("b.txt", "a b c\n\nA B C\n"),
        ],
    );

    let pipelined = run(&paths);
    let sequential = batch::count_word_dist(&paths);
    assert_eq!(pipelined.table, sequential.table);
    assert_eq!(pipelined.table.get("ITS"), Some(1));
    assert_eq!(pipelined.table.get("A"), Some(4));
}

#[test]
fn test_unreadable_entries_are_skipped() {
    let dir = TempDir::new().unwrap();
    write_files(&dir, &[("real.txt", "word word\n")]);
    fs::create_dir(dir.path().join("folder.txt")).unwrap();

    let paths = discover::txt_files(dir.path());
    assert_eq!(paths.len(), 2);

    let dist = run(&paths);
    assert_eq!(dist.total(), 2);
    assert_eq!(dist.files.read + dist.files.skipped + dist.files.truncated, 2);
}

#[test]
fn test_ranked_is_sorted() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[("a.txt", "a a a b b c d d d d e\n")]);
    let dist = run(&paths);
    assert!(dist.ranked.windows(2).all(|w| w[0].count >= w[1].count));
    assert_eq!(dist.ranked[0].word, "D");
}

/*!
 * Caption optimization from file to file
 */

use anyhow::Result;
use vidslides::segmentation::{MergeStrategy, SubtitleOptimizer, optimize_srt_file};
use vidslides::subtitle_processor::SubtitleCollection;

use crate::common::{HUMAN_SRT, auto_srt, create_temp_dir, create_test_file, squash};

#[test]
fn test_optimize_srt_file_withAutoCaptions_shouldWriteMergedSibling() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "vid.en.srt", &auto_srt())?;

    let optimizer = SubtitleOptimizer::default();
    let (output, outcome) = optimize_srt_file(&optimizer, &input, None, Some("en"))?;

    assert_eq!(output, temp_dir.path().join("vid.en.optimized.srt"));
    assert_eq!(outcome.strategy, MergeStrategy::Heuristic);
    assert_eq!(outcome.original_count, 12);
    assert_eq!(outcome.optimized_count, 2);
    assert!(outcome.exceeds_reduction(30.0));

    let written = SubtitleCollection::from_srt_file(&output, None)?;
    assert_eq!(written.entries.len(), 2);
    assert_eq!(written.entries[0].start_time, 0.0);
    assert_eq!(written.entries[1].end_time, 12.0);
    assert!(written.entries.iter().all(|e| e.text.chars().count() <= 150));

    let original = SubtitleCollection::from_srt_file(&input, None)?;
    assert_eq!(
        squash(written.entries.iter().map(|e| e.text.as_str())),
        squash(original.entries.iter().map(|e| e.text.as_str()))
    );
    Ok(())
}

#[test]
fn test_optimize_srt_file_withSentenceCaptions_shouldChangeLittle() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "talk.en.srt", HUMAN_SRT)?;
    let output = temp_dir.path().join("out").join("talk.srt");

    let (written_to, outcome) = optimize_srt_file(&SubtitleOptimizer::default(), &input, Some(&output), None)?;

    assert_eq!(written_to, output);
    assert_eq!(outcome.strategy, MergeStrategy::Punctuation);
    assert_eq!(outcome.optimized_count, 3);
    assert!(!outcome.exceeds_reduction(30.0));
    assert!(output.exists());
    Ok(())
}

#[test]
fn test_optimize_srt_file_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let result = optimize_srt_file(
        &SubtitleOptimizer::default(),
        &temp_dir.path().join("nope.srt"),
        None,
        None,
    );

    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_optimize_srt_file_withPunctuatedFragments_shouldAlignSentences() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let content = "1\n00:00:00,000 --> 00:00:02,000\nthis is the first\n\n\
                   2\n00:00:02,000 --> 00:00:04,000\nsentence. and this\n\n\
                   3\n00:00:04,000 --> 00:00:06,000\nis the second one.\n";
    let input = create_test_file(temp_dir.path(), "frag.srt", content)?;

    let (output, outcome) = optimize_srt_file(&SubtitleOptimizer::default(), &input, None, None)?;
    let written = SubtitleCollection::from_srt_file(&output, None)?;

    assert_eq!(outcome.strategy, MergeStrategy::Punctuation);
    let texts: Vec<&str> = written.entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["this is the first sentence.", "and this is the second one."]);
    assert_eq!(written.entries[0].end_time, 4.0);
    assert_eq!(written.entries[1].start_time, 4.0);
    assert_eq!(written.entries[1].end_time, 6.0);
    Ok(())
}

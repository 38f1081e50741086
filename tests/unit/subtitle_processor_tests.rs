/*!
 * Tests for SRT parsing and writing
 */

use std::fs;

use anyhow::Result;
use vidslides::subtitle_processor::{SubtitleCollection, SubtitleSegment, to_srt_string, write_srt};

use crate::common::{HUMAN_SRT, create_temp_dir, create_test_file};

#[test]
fn test_parse_srt_string_withValidContent_shouldParseEntries() {
    let entries = SubtitleCollection::parse_srt_string(HUMAN_SRT);

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].text, "Welcome to the talk.");
    assert_eq!(entries[1].start_time, 5.0);
    assert_eq!(entries[2].end_time, 14.0);
}

#[test]
fn test_parse_srt_string_withCrlfAndBom_shouldNormalize() {
    let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,500\r\nHello\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nWorld\r\n";
    let entries = SubtitleCollection::parse_srt_string(content);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].end_time, 2.5);
    assert_eq!(entries[1].text, "World");
}

#[test]
fn test_parse_srt_string_withBrokenBlocks_shouldSkipThem() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nKept\n\n\
                   x\n00:00:02,000 --> 00:00:03,000\nBad index\n\n\
                   3\nnot a timing line\nBad timing\n\n\
                   4\n00:00:09,000 --> 00:00:08,000\nReversed\n\n\
                   5\n00:00:10,000 --> 00:00:11,000\nAlso kept\n";
    let entries = SubtitleCollection::parse_srt_string(content);

    let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Kept", "Also kept"]);
    assert_eq!(entries[1].index, 2);
}

#[test]
fn test_parse_srt_string_withUnorderedBlocks_shouldSortByStart() {
    let content = "1\n00:00:05,000 --> 00:00:06,000\nlater\n\n2\n00:00:01,000 --> 00:00:02,000\nearlier\n";
    let entries = SubtitleCollection::parse_srt_string(content);

    assert_eq!(entries[0].text, "earlier");
    assert_eq!(entries[0].index, 1);
}

#[test]
fn test_parse_srt_string_withMultilineText_shouldJoinLines() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nfirst line\nsecond line\n";
    let entries = SubtitleCollection::parse_srt_string(content);

    assert_eq!(entries[0].text, "first line\nsecond line");
}

#[test]
fn test_parse_timestamp_withInvalidInput_shouldFail() {
    assert!(SubtitleSegment::parse_timestamp("00:61:00,000").is_err());
    assert!(SubtitleSegment::parse_timestamp("1:2").is_err());
    assert!(SubtitleSegment::parse_timestamp("aa:bb:cc,ddd").is_err());
}

#[test]
fn test_to_srt_string_shouldRenumberFromOne() {
    let segments = vec![
        SubtitleSegment::new(7, 0.0, 1.5, "one"),
        SubtitleSegment::new(9, 2.0, 3.0, "two"),
    ];
    let srt = to_srt_string(&segments);

    assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,500\none\n\n2\n"));
}

#[test]
fn test_write_srt_thenRead_shouldPreserveTimingAndText() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("out.srt");
    let segments = vec![
        SubtitleSegment::new(1, 1.25, 2.5, "alpha"),
        SubtitleSegment::new(2, 3.0, 4.75, "beta"),
    ];

    write_srt(&path, &segments)?;
    let collection = SubtitleCollection::from_srt_file(&path, Some("en".to_string()))?;

    assert_eq!(collection.entries, segments);
    assert_eq!(collection.language.as_deref(), Some("en"));
    Ok(())
}

#[test]
fn test_from_srt_file_withMissingFile_shouldFail() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let result = SubtitleCollection::from_srt_file(temp_dir.path().join("missing.srt"), None);

    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_from_srt_file_withEmptyFile_shouldReturnNoEntries() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let path = create_test_file(temp_dir.path(), "empty.srt", "")?;
    let collection = SubtitleCollection::from_srt_file(&path, None)?;

    assert!(collection.entries.is_empty());
    assert!(fs::metadata(&path)?.is_file());
    Ok(())
}

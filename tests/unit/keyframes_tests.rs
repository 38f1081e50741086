/*!
 * Tests for screenshot timestamp selection
 */

use vidslides::keyframes::{ScreenshotPosition, select_timestamps, text_at};
use vidslides::subtitle_processor::SubtitleSegment;

fn segments() -> Vec<SubtitleSegment> {
    vec![
        SubtitleSegment::new(1, 10.0, 12.0, "first"),
        SubtitleSegment::new(2, 12.0, 15.0, "second"),
        SubtitleSegment::new(3, 20.0, 21.0, "third"),
    ]
}

#[test]
fn test_select_timestamps_withEachPosition_shouldPickSegmentPoint() {
    let segments = segments();

    assert_eq!(select_timestamps(&segments, ScreenshotPosition::Start, 0.0), vec![10.0, 12.0, 20.0]);
    assert_eq!(select_timestamps(&segments, ScreenshotPosition::Middle, 0.0), vec![11.0, 13.5, 20.5]);
    assert_eq!(select_timestamps(&segments, ScreenshotPosition::End, 0.0), vec![12.0, 15.0, 21.0]);
}

#[test]
fn test_select_timestamps_withOffset_shouldShiftAndClamp() {
    let mut segments = segments();
    segments.insert(0, SubtitleSegment::new(0, 0.2, 0.4, "intro"));

    let stamps = select_timestamps(&segments, ScreenshotPosition::Start, -0.5);
    assert_eq!(stamps, vec![0.0, 9.5, 11.5, 19.5]);

    let stamps = select_timestamps(&segments, ScreenshotPosition::End, 1.0);
    assert_eq!(stamps[3], 22.0);
}

#[test]
fn test_select_timestamps_withNoSegments_shouldReturnEmpty() {
    assert!(select_timestamps(&[], ScreenshotPosition::Middle, 0.0).is_empty());
}

#[test]
fn test_text_at_shouldUseHalfOpenIntervals() {
    let segments = segments();

    assert_eq!(text_at(10.0, &segments), "first");
    assert_eq!(text_at(12.0, &segments), "second");
    assert_eq!(text_at(17.0, &segments), "");
    assert_eq!(text_at(21.0, &segments), "third");
    assert_eq!(text_at(5.0, &[]), "");
}

#[test]
fn test_select_timestamps_withMiddle_shouldResolveToOwnText() {
    let segments = segments();
    let texts: Vec<String> = select_timestamps(&segments, ScreenshotPosition::Middle, 0.0)
        .into_iter()
        .map(|t| text_at(t, &segments))
        .collect();

    assert_eq!(texts, vec!["first", "second", "third"]);
}
